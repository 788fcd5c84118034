//! Cache key scheme
//!
//! Every key starts with the configured prefix. Segments taken from ids or
//! labels are URL-encoded so a `:` inside an id cannot forge another key.
//!
//! | Key | Holds |
//! |-----|-------|
//! | `{p}:{kind}:{id}` | JSON [`CachedEntry`](crate::models::CachedEntry) of one entity |
//! | `{p}:label:{label}:{kinds}` | set of entity ids |
//! | `{p}:search:label:{label}` | JSON cached label search |
//! | `{p}:popularity:{track}` | sorted set of popularity samples |

use bridge_traits::catalog::EntityKind;
use uuid::Uuid;

fn encode_key_segment(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeys {
    prefix: String,
}

impl CacheKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into().trim_end_matches(':').to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn entity(&self, kind: EntityKind, id: &str) -> String {
        format!("{}:{}:{}", self.prefix, kind.as_str(), encode_key_segment(id))
    }

    pub fn label_index(&self, label_id: &str, kind: EntityKind) -> String {
        format!(
            "{}:label:{}:{}",
            self.prefix,
            encode_key_segment(label_id),
            kind.plural()
        )
    }

    /// Unique scratch key next to `live_key`, used to build a replacement index
    pub fn staging(&self, live_key: &str) -> String {
        format!("{}:staging:{}", live_key, Uuid::new_v4().simple())
    }

    pub fn search(&self, label_id: &str) -> String {
        format!("{}:search:label:{}", self.prefix, encode_key_segment(label_id))
    }

    pub fn popularity(&self, track_id: &str) -> String {
        format!("{}:popularity:{}", self.prefix, encode_key_segment(track_id))
    }

    /// Glob matching every key under the prefix
    pub fn everything(&self) -> String {
        format!("{}:*", self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let keys = CacheKeys::new("catalog:");
        assert_eq!(keys.entity(EntityKind::Track, "abc"), "catalog:track:abc");
        assert_eq!(
            keys.label_index("buildit-tech", EntityKind::Track),
            "catalog:label:buildit-tech:tracks"
        );
        assert_eq!(keys.search("buildit-tech"), "catalog:search:label:buildit-tech");
        assert_eq!(keys.popularity("t1"), "catalog:popularity:t1");
        assert_eq!(keys.everything(), "catalog:*");
    }

    #[test]
    fn test_segments_are_encoded() {
        let keys = CacheKeys::new("catalog");
        assert_eq!(keys.entity(EntityKind::Album, "a:b"), "catalog:album:a%3Ab");
    }

    #[test]
    fn test_staging_keys_are_unique() {
        let keys = CacheKeys::new("catalog");
        let live = keys.label_index("x", EntityKind::Artist);
        let a = keys.staging(&live);
        let b = keys.staging(&live);
        assert_ne!(a, b);
        assert!(a.starts_with("catalog:label:x:artists:staging:"));
    }
}
