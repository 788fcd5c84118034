//! Label attribution
//!
//! Decides which artists belong to a label's roster. An artist is
//! attributed to a label when any of four predicates holds:
//!
//! 1. [`DirectlyAssigned`](AttributionPredicate::DirectlyAssigned): the
//!    artist row carries the label id.
//! 2. [`EligiblePrimary`](AttributionPredicate::EligiblePrimary): a primary
//!    (or unspecified) credit on a non-compilation release of the label,
//!    either on the release itself or on one of its tracks.
//! 3. [`RemixerWithPrimaryElsewhere`](AttributionPredicate::RemixerWithPrimaryElsewhere):
//!    a remixer credit on a release of the label, provided the artist is a
//!    primary artist on at least one other release.
//! 4. [`EligibleOnCompilation`](AttributionPredicate::EligibleOnCompilation):
//!    a track-level primary (or unspecified) credit on a compilation of the
//!    label. Release-level credits on compilations never count.
//!
//! Each predicate is a SQL fragment over an `artists a` row with the label
//! id bound as `?1`, so the roster query and the per-predicate checks share
//! the same text.

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::labels;
use crate::models::{Artist, Release};
use crate::repositories::{LabelRepository, Page, PageRequest, SqliteLabelRepository};

#[derive(Error, Debug)]
pub enum AttributionError {
    #[error("Invalid label identifier: '{0}'")]
    InvalidLabel(String),

    #[error("Attribution query failed: {0}")]
    Query(#[from] sqlx::Error),
}

impl From<crate::error::LibraryError> for AttributionError {
    fn from(err: crate::error::LibraryError) -> Self {
        match err {
            crate::error::LibraryError::Database(e) => AttributionError::Query(e),
            other => AttributionError::Query(sqlx::Error::Protocol(other.to_string())),
        }
    }
}

pub type Result<T> = std::result::Result<T, AttributionError>;

const IS_DIRECTLY_ASSIGNED: &str = "a.label_id = ?1";

const IS_ELIGIBLE_PRIMARY: &str = r#"
    EXISTS (
        SELECT 1 FROM releases r
        WHERE r.label_id = ?1
          AND r.release_type <> 'compilation'
          AND (
              EXISTS (
                  SELECT 1 FROM release_artists ra
                  WHERE ra.release_id = r.id
                    AND ra.artist_id = a.id
                    AND COALESCE(ra.role, 'primary') = 'primary'
              )
              OR EXISTS (
                  SELECT 1 FROM track_artists ta
                  JOIN tracks t ON t.id = ta.track_id
                  WHERE t.release_id = r.id
                    AND ta.artist_id = a.id
                    AND COALESCE(ta.role, 'primary') = 'primary'
              )
          )
    )"#;

const IS_REMIXER_WITH_PRIMARY_ELSEWHERE: &str = r#"
    EXISTS (
        SELECT 1 FROM releases r
        WHERE r.label_id = ?1
          AND (
              EXISTS (
                  SELECT 1 FROM release_artists ra
                  WHERE ra.release_id = r.id
                    AND ra.artist_id = a.id
                    AND ra.role = 'remixer'
              )
              OR EXISTS (
                  SELECT 1 FROM track_artists ta
                  JOIN tracks t ON t.id = ta.track_id
                  WHERE t.release_id = r.id
                    AND ta.artist_id = a.id
                    AND ta.role = 'remixer'
              )
          )
          AND (
              EXISTS (
                  SELECT 1 FROM release_artists ra2
                  WHERE ra2.artist_id = a.id
                    AND ra2.release_id <> r.id
                    AND COALESCE(ra2.role, 'primary') = 'primary'
              )
              OR EXISTS (
                  SELECT 1 FROM track_artists ta2
                  JOIN tracks t2 ON t2.id = ta2.track_id
                  WHERE ta2.artist_id = a.id
                    AND t2.release_id <> r.id
                    AND COALESCE(ta2.role, 'primary') = 'primary'
              )
          )
    )"#;

const IS_ELIGIBLE_ON_COMPILATION: &str = r#"
    EXISTS (
        SELECT 1 FROM track_artists ta
        JOIN tracks t ON t.id = ta.track_id
        JOIN releases r ON r.id = t.release_id
        WHERE r.label_id = ?1
          AND r.release_type = 'compilation'
          AND ta.artist_id = a.id
          AND COALESCE(ta.role, 'primary') = 'primary'
    )"#;

/// One of the attribution rules, usable on its own for probing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributionPredicate {
    DirectlyAssigned,
    EligiblePrimary,
    RemixerWithPrimaryElsewhere,
    EligibleOnCompilation,
}

impl AttributionPredicate {
    pub const ALL: [AttributionPredicate; 4] = [
        AttributionPredicate::DirectlyAssigned,
        AttributionPredicate::EligiblePrimary,
        AttributionPredicate::RemixerWithPrimaryElsewhere,
        AttributionPredicate::EligibleOnCompilation,
    ];

    pub fn sql(&self) -> &'static str {
        match self {
            AttributionPredicate::DirectlyAssigned => IS_DIRECTLY_ASSIGNED,
            AttributionPredicate::EligiblePrimary => IS_ELIGIBLE_PRIMARY,
            AttributionPredicate::RemixerWithPrimaryElsewhere => IS_REMIXER_WITH_PRIMARY_ELSEWHERE,
            AttributionPredicate::EligibleOnCompilation => IS_ELIGIBLE_ON_COMPILATION,
        }
    }
}

/// The full attribution condition: any predicate holds
fn attribution_clause() -> String {
    AttributionPredicate::ALL
        .iter()
        .map(|p| format!("({})", p.sql()))
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// Resolves label rosters and release lists from the relational store
pub struct AttributionResolver {
    pool: SqlitePool,
    labels: SqliteLabelRepository,
}

impl AttributionResolver {
    pub fn new(pool: SqlitePool) -> Self {
        let labels = SqliteLabelRepository::new(pool.clone());
        Self { pool, labels }
    }

    /// Map user input onto a label id the store recognises.
    ///
    /// Known aliases resolve through [`labels::normalize`]; otherwise the
    /// raw input (then its normalized form) must name an existing label row.
    pub async fn resolve_label(&self, input: &str) -> Result<String> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(AttributionError::InvalidLabel(input.to_string()));
        }

        let canonical = labels::normalize(trimmed);
        if labels::is_known(&canonical) {
            return Ok(canonical);
        }
        if self.labels.exists(trimmed).await? {
            return Ok(trimmed.to_string());
        }
        if self.labels.exists(&canonical).await? {
            return Ok(canonical);
        }

        Err(AttributionError::InvalidLabel(input.to_string()))
    }

    /// Artists attributed to `label`, distinct, ordered by name ascending
    #[instrument(skip(self, page))]
    pub async fn artists_for_label(&self, label: &str, page: PageRequest) -> Result<Page<Artist>> {
        let label_id = self.resolve_label(label).await?;
        let clause = attribution_clause();
        let (limit, offset) = page.sql_bounds();

        let total: (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(DISTINCT a.id) FROM artists a WHERE {clause}"
        ))
        .bind(&label_id)
        .fetch_one(&self.pool)
        .await?;

        let artists = sqlx::query_as::<_, Artist>(&format!(
            "SELECT DISTINCT a.* FROM artists a WHERE {clause} \
             ORDER BY a.name ASC, a.id ASC LIMIT ?2 OFFSET ?3"
        ))
        .bind(&label_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        debug!(
            label_id = %label_id,
            total = total.0,
            returned = artists.len(),
            "resolved label roster"
        );
        Ok(Page::new(artists, total.0.max(0) as u64, page))
    }

    /// Releases of `label`, newest release date first
    #[instrument(skip(self, page))]
    pub async fn releases_for_label(&self, label: &str, page: PageRequest) -> Result<Page<Release>> {
        let label_id = self.resolve_label(label).await?;
        let (limit, offset) = page.sql_bounds();

        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM releases WHERE label_id = ?1")
            .bind(&label_id)
            .fetch_one(&self.pool)
            .await?;

        let releases = sqlx::query_as::<_, Release>(
            r#"
            SELECT * FROM releases
            WHERE label_id = ?1
            ORDER BY release_date IS NULL, release_date DESC, title ASC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(&label_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(releases, total.0.max(0) as u64, page))
    }

    /// Whether a single predicate holds for an artist on a label
    pub async fn check(
        &self,
        predicate: AttributionPredicate,
        label: &str,
        artist_id: &str,
    ) -> Result<bool> {
        let label_id = self.resolve_label(label).await?;
        self.holds(predicate.sql(), &label_id, artist_id).await
    }

    /// Whether the artist is on the label's roster by any rule
    pub async fn is_attributed(&self, label: &str, artist_id: &str) -> Result<bool> {
        let label_id = self.resolve_label(label).await?;
        self.holds(&attribution_clause(), &label_id, artist_id).await
    }

    async fn holds(&self, clause: &str, label_id: &str, artist_id: &str) -> Result<bool> {
        let found: (bool,) = sqlx::query_as(&format!(
            "SELECT EXISTS(SELECT 1 FROM artists a WHERE a.id = ?2 AND ({clause}))"
        ))
        .bind(label_id)
        .bind(artist_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(found.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::models::{ArtistRole, Label, ReleaseType, Track};
    use crate::writer::CatalogWriter;

    struct Fixture {
        pool: SqlitePool,
    }

    impl Fixture {
        async fn new() -> Self {
            let pool = create_test_pool().await.unwrap();
            SqliteLabelRepository::new(pool.clone())
                .seed_known()
                .await
                .unwrap();
            Self { pool }
        }

        async fn artist(&self, name: &str) -> Artist {
            let mut conn = self.pool.acquire().await.unwrap();
            CatalogWriter::new(&mut conn)
                .find_or_create_artist(&Artist::new(name).with_spotify_id(format!("sp-{name}")))
                .await
                .unwrap()
                .row
        }

        async fn release(&self, title: &str, kind: ReleaseType, label: Option<&str>, date: &str) -> Release {
            let mut release = Release::new(title, kind)
                .with_spotify_id(format!("sp-{title}"))
                .with_release_date(date);
            release.label_id = label.map(str::to_string);
            let mut conn = self.pool.acquire().await.unwrap();
            CatalogWriter::new(&mut conn)
                .find_or_create_release(&release)
                .await
                .unwrap()
                .row
        }

        /// Add a track to `release` crediting `artist` with `role`
        async fn credit_track(&self, release: &Release, artist: &Artist, role: Option<ArtistRole>) {
            let mut conn = self.pool.acquire().await.unwrap();
            let mut writer = CatalogWriter::new(&mut conn);
            let track = writer
                .find_or_create_track(
                    &Track::new(format!("{} / {}", release.title, artist.name))
                        .with_spotify_id(format!("sp-{}-{}", release.id, artist.id))
                        .with_release(&release.id),
                )
                .await
                .unwrap()
                .row;
            writer.link_track_artist(&track.id, &artist.id, role).await.unwrap();
        }

        async fn credit_release(&self, release: &Release, artist: &Artist, role: Option<ArtistRole>) {
            let mut conn = self.pool.acquire().await.unwrap();
            CatalogWriter::new(&mut conn)
                .link_release_artist(&release.id, &artist.id, role)
                .await
                .unwrap();
        }

        fn resolver(&self) -> AttributionResolver {
            AttributionResolver::new(self.pool.clone())
        }
    }

    fn names(page: &Page<Artist>) -> Vec<&str> {
        page.items.iter().map(|a| a.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_pure_remixer_is_excluded() {
        let fx = Fixture::new().await;
        let x = fx.artist("X").await;
        let y = fx.artist("Y").await;
        let r1 = fx.release("R1", ReleaseType::Single, Some("buildit-tech"), "2023-01-01").await;
        let r2 = fx.release("R2", ReleaseType::Single, Some("buildit-tech"), "2023-02-01").await;
        fx.credit_track(&r1, &x, Some(ArtistRole::Primary)).await;
        fx.credit_track(&r2, &y, Some(ArtistRole::Remixer)).await;

        let page = fx
            .resolver()
            .artists_for_label("buildit-tech", PageRequest::default())
            .await
            .unwrap();
        assert_eq!(names(&page), vec!["X"]);
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_remixer_with_primary_elsewhere_is_included() {
        let fx = Fixture::new().await;
        let x = fx.artist("X").await;
        let y = fx.artist("Y").await;
        let r1 = fx.release("R1", ReleaseType::Single, Some("buildit-tech"), "2023-01-01").await;
        let r2 = fx.release("R2", ReleaseType::Single, Some("buildit-tech"), "2023-02-01").await;
        let r3 = fx.release("R3", ReleaseType::Album, None, "2022-01-01").await;
        fx.credit_track(&r1, &x, Some(ArtistRole::Primary)).await;
        fx.credit_track(&r2, &y, Some(ArtistRole::Remixer)).await;
        fx.credit_release(&r3, &y, Some(ArtistRole::Primary)).await;

        let resolver = fx.resolver();
        let page = resolver
            .artists_for_label("Build It Tech", PageRequest::default())
            .await
            .unwrap();
        assert_eq!(names(&page), vec!["X", "Y"]);

        assert!(resolver
            .check(AttributionPredicate::RemixerWithPrimaryElsewhere, "bit", &y.id)
            .await
            .unwrap());
        assert!(!resolver
            .check(AttributionPredicate::EligiblePrimary, "bit", &y.id)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_compilation_requires_track_level_primary() {
        let fx = Fixture::new().await;
        let a = fx.artist("A").await;
        let b = fx.artist("B").await;
        let various = fx.artist("Various Artists").await;
        let comp = fx
            .release("Comp", ReleaseType::Compilation, Some("buildit-deep"), "2024-01-01")
            .await;
        fx.credit_release(&comp, &various, None).await;
        fx.credit_track(&comp, &a, None).await;
        fx.credit_track(&comp, &b, Some(ArtistRole::Remixer)).await;

        let resolver = fx.resolver();
        let page = resolver
            .artists_for_label("buildit-deep", PageRequest::default())
            .await
            .unwrap();
        assert_eq!(names(&page), vec!["A"]);

        assert!(resolver
            .check(AttributionPredicate::EligibleOnCompilation, "buildit-deep", &a.id)
            .await
            .unwrap());
        assert!(!resolver.is_attributed("buildit-deep", &various.id).await.unwrap());
        assert!(!resolver.is_attributed("buildit-deep", &b.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_direct_assignment_and_distinct_ordering() {
        let fx = Fixture::new().await;
        let zed = fx.artist("Zed").await;
        let amy = fx.artist("Amy").await;
        let r1 = fx.release("R1", ReleaseType::Album, Some("buildit-records"), "2020-01-01").await;
        let r2 = fx.release("R2", ReleaseType::Ep, Some("buildit-records"), "2021-01-01").await;
        fx.credit_track(&r1, &zed, None).await;
        fx.credit_track(&r2, &zed, Some(ArtistRole::Primary)).await;
        fx.credit_release(&r1, &zed, Some(ArtistRole::Primary)).await;

        sqlx::query("UPDATE artists SET label_id = 'buildit-records' WHERE id = ?")
            .bind(&amy.id)
            .execute(&fx.pool)
            .await
            .unwrap();

        let resolver = fx.resolver();
        let page = resolver
            .artists_for_label("BIR", PageRequest::default())
            .await
            .unwrap();
        assert_eq!(names(&page), vec!["Amy", "Zed"]);
        assert_eq!(page.total, 2);

        let second = resolver
            .artists_for_label("BIR", PageRequest::from_limit_offset(1, 1))
            .await
            .unwrap();
        assert_eq!(names(&second), vec!["Zed"]);
        assert!(resolver
            .check(AttributionPredicate::DirectlyAssigned, "BIR", &amy.id)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_compilation_remixer_with_primary_elsewhere_is_included() {
        let fx = Fixture::new().await;
        let a = fx.artist("A").await;
        let b = fx.artist("B").await;
        let comp = fx
            .release("Comp", ReleaseType::Compilation, Some("buildit-deep"), "2024-01-01")
            .await;
        let own = fx.release("Own", ReleaseType::Single, Some("buildit-tech"), "2023-06-01").await;
        fx.credit_track(&comp, &a, Some(ArtistRole::Primary)).await;
        fx.credit_track(&comp, &b, Some(ArtistRole::Remixer)).await;
        fx.credit_track(&own, &b, Some(ArtistRole::Primary)).await;

        let resolver = fx.resolver();
        let page = resolver
            .artists_for_label("buildit-deep", PageRequest::default())
            .await
            .unwrap();
        assert_eq!(names(&page), vec!["A", "B"]);

        assert!(resolver
            .check(AttributionPredicate::RemixerWithPrimaryElsewhere, "buildit-deep", &b.id)
            .await
            .unwrap());
        assert!(!resolver
            .check(AttributionPredicate::EligibleOnCompilation, "buildit-deep", &b.id)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_featured_only_artist_is_excluded() {
        let fx = Fixture::new().await;
        let x = fx.artist("X").await;
        let guest = fx.artist("Guest").await;
        let single = fx.release("R1", ReleaseType::Single, Some("buildit-tech"), "2023-01-01").await;
        let comp = fx
            .release("Comp", ReleaseType::Compilation, Some("buildit-tech"), "2024-01-01")
            .await;
        fx.credit_track(&single, &x, Some(ArtistRole::Primary)).await;
        fx.credit_track(&single, &guest, Some(ArtistRole::Featured)).await;
        fx.credit_track(&comp, &guest, Some(ArtistRole::Featured)).await;

        let resolver = fx.resolver();
        let page = resolver
            .artists_for_label("buildit-tech", PageRequest::default())
            .await
            .unwrap();
        assert_eq!(names(&page), vec!["X"]);
        assert_eq!(page.total, 1);

        for predicate in AttributionPredicate::ALL {
            assert!(!resolver
                .check(predicate, "buildit-tech", &guest.id)
                .await
                .unwrap());
        }
        assert!(resolver
            .check(AttributionPredicate::EligiblePrimary, "buildit-tech", &x.id)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_roster_honours_unaligned_offset() {
        let fx = Fixture::new().await;
        let release = fx.release("R1", ReleaseType::Album, Some("buildit-tech"), "2023-01-01").await;
        for name in ["A", "B", "C", "D", "E"] {
            let artist = fx.artist(name).await;
            fx.credit_track(&release, &artist, Some(ArtistRole::Primary)).await;
        }

        let page = fx
            .resolver()
            .artists_for_label("buildit-tech", PageRequest::from_limit_offset(2, 3))
            .await
            .unwrap();
        assert_eq!(names(&page), vec!["D", "E"]);
        assert_eq!(page.total, 5);
    }

    #[tokio::test]
    async fn test_other_labels_do_not_leak() {
        let fx = Fixture::new().await;
        let a = fx.artist("A").await;
        let r = fx.release("R", ReleaseType::Single, Some("buildit-deep"), "2020-01-01").await;
        fx.credit_track(&r, &a, None).await;

        let page = fx
            .resolver()
            .artists_for_label("buildit-tech", PageRequest::default())
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_releases_newest_first() {
        let fx = Fixture::new().await;
        fx.release("Old", ReleaseType::Single, Some("buildit-tech"), "2019-05-01").await;
        fx.release("New", ReleaseType::Single, Some("buildit-tech"), "2024-03-01").await;
        fx.release("Mid", ReleaseType::Album, Some("buildit-tech"), "2021").await;
        fx.release("Elsewhere", ReleaseType::Album, Some("buildit-deep"), "2025-01-01").await;

        let page = fx
            .resolver()
            .releases_for_label("buildit-tech", PageRequest::default())
            .await
            .unwrap();
        let titles: Vec<_> = page.items.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["New", "Mid", "Old"]);
        assert_eq!(page.total, 3);
    }

    #[tokio::test]
    async fn test_invalid_label_is_rejected() {
        let fx = Fixture::new().await;
        let resolver = fx.resolver();

        let err = resolver
            .artists_for_label("nobody-knows-this", PageRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AttributionError::InvalidLabel(_)));

        let err = resolver
            .releases_for_label("   ", PageRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AttributionError::InvalidLabel(_)));
    }

    #[tokio::test]
    async fn test_registered_raw_label_is_accepted() {
        let fx = Fixture::new().await;
        SqliteLabelRepository::new(fx.pool.clone())
            .ensure(&Label::new("indie-label", "Indie Label"))
            .await
            .unwrap();

        let resolver = fx.resolver();
        assert_eq!(resolver.resolve_label("indie-label").await.unwrap(), "indie-label");
        assert_eq!(resolver.resolve_label("Indie Label").await.unwrap(), "indie-label");
    }
}
