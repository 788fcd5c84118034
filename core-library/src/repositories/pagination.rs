//! Pagination helper types for catalog queries

use serde::{Deserialize, Serialize};

/// Pagination request parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Current page number (0-indexed)
    pub page: u32,
    /// Number of items per page
    pub page_size: u32,
    /// Rows skipped before the first item
    #[serde(default)]
    pub offset: u32,
}

/// Largest page a caller may request; bigger requests are clamped
pub const MAX_PAGE_SIZE: u32 = 200;

impl PageRequest {
    /// Create a new page request
    ///
    /// # Examples
    ///
    /// ```
    /// use core_library::repositories::PageRequest;
    ///
    /// let request = PageRequest::new(0, 20);
    /// assert_eq!(request.page, 0);
    /// assert_eq!(request.page_size, 20);
    /// ```
    pub fn new(page: u32, page_size: u32) -> Self {
        let page_size = page_size.min(MAX_PAGE_SIZE);
        Self {
            page,
            page_size,
            offset: page.saturating_mul(page_size),
        }
    }

    /// Build a request from a raw limit/offset pair.
    ///
    /// The offset is kept exactly; `page` only reports the page the first
    /// row falls on.
    pub fn from_limit_offset(limit: u32, offset: u32) -> Self {
        let page_size = limit.min(MAX_PAGE_SIZE);
        let page = if page_size == 0 { 0 } else { offset / page_size };
        Self {
            page,
            page_size,
            offset,
        }
    }

    /// Calculate the SQL OFFSET value
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Get the LIMIT value (same as page_size)
    pub fn limit(&self) -> u32 {
        self.page_size
    }

    /// LIMIT/OFFSET as SQLite integers
    pub(crate) fn sql_bounds(&self) -> (i64, i64) {
        (i64::from(self.limit()), i64::from(self.offset))
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: 50,
            offset: 0,
        }
    }
}

/// Paginated response containing items and metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: u64,
    /// Current page number
    pub page: u32,
    /// Total number of pages
    pub total_pages: u32,
    /// Number of items per page
    pub page_size: u32,
}

impl<T> Page<T> {
    /// Create a new paginated response
    ///
    /// # Examples
    ///
    /// ```
    /// use core_library::repositories::{Page, PageRequest};
    ///
    /// let items = vec![1, 2, 3];
    /// let request = PageRequest::new(0, 10);
    /// let page = Page::new(items, 25, request);
    ///
    /// assert_eq!(page.items.len(), 3);
    /// assert_eq!(page.total, 25);
    /// assert_eq!(page.page, 0);
    /// assert_eq!(page.total_pages, 3);
    /// ```
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        let total_pages = if request.page_size == 0 {
            0
        } else {
            ((total as f64) / (request.page_size as f64)).ceil() as u32
        };

        Self {
            items,
            total,
            page: request.page,
            total_pages,
            page_size: request.page_size,
        }
    }

    /// Check if there are more pages after the current one
    pub fn has_next(&self) -> bool {
        self.page + 1 < self.total_pages
    }

    /// Check if there are pages before the current one
    pub fn has_previous(&self) -> bool {
        self.page > 0
    }

    /// Map the items to a different type
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            total_pages: self.total_pages,
            page_size: self.page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_default() {
        let request = PageRequest::default();
        assert_eq!(request.page, 0);
        assert_eq!(request.page_size, 50);
    }

    #[test]
    fn test_page_request_offset() {
        let request = PageRequest::new(0, 20);
        assert_eq!(request.offset(), 0);

        let request = PageRequest::new(2, 20);
        assert_eq!(request.offset(), 40);
    }

    #[test]
    fn test_page_request_limit() {
        let request = PageRequest::new(0, 20);
        assert_eq!(request.limit(), 20);
    }

    #[test]
    fn test_page_new() {
        let items = vec![1, 2, 3];
        let request = PageRequest::new(0, 10);
        let page = Page::new(items, 25, request);

        assert_eq!(page.items.len(), 3);
        assert_eq!(page.total, 25);
        assert_eq!(page.page, 0);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page_size, 10);
    }

    #[test]
    fn test_page_has_next() {
        let page = Page::new(vec![1, 2, 3], 25, PageRequest::new(0, 10));
        assert!(page.has_next());

        let page = Page::new(vec![1, 2, 3], 25, PageRequest::new(2, 10));
        assert!(!page.has_next());
    }

    #[test]
    fn test_page_has_previous() {
        let page = Page::new(vec![1, 2, 3], 25, PageRequest::new(0, 10));
        assert!(!page.has_previous());

        let page = Page::new(vec![1, 2, 3], 25, PageRequest::new(1, 10));
        assert!(page.has_previous());
    }

    #[test]
    fn test_page_map() {
        let page = Page::new(vec![1, 2, 3], 25, PageRequest::new(0, 10));
        let mapped = page.map(|x| x * 2);

        assert_eq!(mapped.items, vec![2, 4, 6]);
        assert_eq!(mapped.total, 25);
        assert_eq!(mapped.page, 0);
    }

    #[test]
    fn test_page_request_clamps_size() {
        assert_eq!(PageRequest::new(0, 10_000).page_size, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_page_request_from_limit_offset() {
        let request = PageRequest::from_limit_offset(20, 40);
        assert_eq!(request.page, 2);
        assert_eq!(request.offset(), 40);

        let request = PageRequest::from_limit_offset(20, 45);
        assert_eq!(request.page, 2);
        assert_eq!(request.offset(), 45);
        assert_eq!(request.sql_bounds(), (20, 45));

        let request = PageRequest::from_limit_offset(0, 45);
        assert_eq!(request.page, 0);
        assert_eq!(request.sql_bounds(), (0, 45));
    }

    #[test]
    fn test_page_request_clamps_limit_but_keeps_offset() {
        let request = PageRequest::from_limit_offset(10_000, 7);
        assert_eq!(request.sql_bounds(), (i64::from(MAX_PAGE_SIZE), 7));
    }

    #[test]
    fn test_page_zero_page_size() {
        let page = Page::new(vec![1, 2, 3], 25, PageRequest::new(0, 0));
        assert_eq!(page.total_pages, 0);
    }
}
