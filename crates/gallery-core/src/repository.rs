//! Artwork repository facade over the record table and image storage.

use std::time::Duration;

use chrono::Utc;

use crate::backend::{ArtworkQuery, ArtworkStore, BearerSource, ObjectStore};
use crate::config::DEFAULT_REQUEST_TIMEOUT;
use crate::ingest::ImageIngestor;
use crate::models::{sort_for_display, Artwork, ArtworkId, ArtworkPatch, NewArtwork};
use crate::util::with_deadline;
use crate::{Error, Result};

/// Typed access to the artwork catalog.
///
/// Every backend call is bounded by the request timeout. Listings are
/// re-sorted client-side so display order never depends on the backend.
pub struct ArtworkRepository<S, O> {
    records: S,
    images: ImageIngestor<O>,
    bearer: BearerSource,
    timeout: Duration,
}

impl<S: ArtworkStore, O: ObjectStore> ArtworkRepository<S, O> {
    pub fn new(records: S, objects: O, bearer: BearerSource) -> Self {
        Self {
            records,
            images: ImageIngestor::new(objects, bearer.clone()),
            bearer,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.images = self.images.with_timeout(timeout);
        self
    }

    pub const fn images(&self) -> &ImageIngestor<O> {
        &self.images
    }

    /// Public gallery listing: visible artworks in display order.
    pub async fn list_visible(&self) -> Result<Vec<Artwork>> {
        self.list(ArtworkQuery::visible()).await
    }

    /// Admin listing: every artwork in display order.
    pub async fn list_all(&self) -> Result<Vec<Artwork>> {
        self.list(ArtworkQuery::all()).await
    }

    pub async fn get(&self, id: &ArtworkId) -> Result<Option<Artwork>> {
        let token = self.bearer.token();
        with_deadline(self.timeout, self.records.fetch(id, token.as_deref())).await
    }

    pub async fn create(&self, record: NewArtwork) -> Result<Artwork> {
        let record = record.normalized();
        record.validate()?;

        let token = self.bearer.token();
        let created =
            with_deadline(self.timeout, self.records.insert(&record, token.as_deref())).await?;
        tracing::info!(id = %created.id, title = %created.title, "Created artwork");
        Ok(created)
    }

    /// Apply `patch`, refreshing `updated_at`.
    pub async fn update(&self, id: &ArtworkId, patch: ArtworkPatch) -> Result<Artwork> {
        let mut patch = patch.normalized();
        patch.validate()?;
        patch.updated_at = Some(Utc::now());

        let token = self.bearer.token();
        let updated = with_deadline(
            self.timeout,
            self.records.update(id, &patch, token.as_deref()),
        )
        .await?
        .ok_or_else(|| Error::NotFound(id.to_string()))?;
        tracing::info!(id = %updated.id, "Updated artwork");
        Ok(updated)
    }

    /// Remove an artwork and its stored image.
    ///
    /// The image is released first; if that fails the record is kept.
    pub async fn delete(&self, id: &ArtworkId) -> Result<Artwork> {
        let existing = self
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        self.images.release(&existing.image_path).await?;

        let token = self.bearer.token();
        let removed = with_deadline(self.timeout, self.records.delete(id, token.as_deref()))
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        tracing::info!(id = %removed.id, "Deleted artwork");
        Ok(removed)
    }

    pub fn resolve_image_url(&self, path: &str) -> Option<String> {
        self.images.public_url(path)
    }

    async fn list(&self, query: ArtworkQuery) -> Result<Vec<Artwork>> {
        let token = self.bearer.token();
        let mut artworks =
            with_deadline(self.timeout, self.records.select(query, token.as_deref())).await?;
        if query.visible_only {
            artworks.retain(|art| art.is_visible);
        }
        sort_for_display(&mut artworks);
        Ok(artworks)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::auth::SessionGuard;
    use crate::backend::memory::{Fault, MemoryBackend};
    use crate::models::{Orientation, StagedImage};

    struct Fixture {
        backend: MemoryBackend,
        guard: SessionGuard<MemoryBackend>,
        repo: ArtworkRepository<MemoryBackend, MemoryBackend>,
    }

    async fn fixture() -> Fixture {
        let backend = MemoryBackend::new().with_user("artist@example.com", "secret");
        let guard = SessionGuard::new(backend.clone());
        guard.sign_in("artist@example.com", "secret").await.unwrap();
        let repo = ArtworkRepository::new(
            backend.clone(),
            backend.clone(),
            BearerSource::from_session(guard.subscribe()),
        );
        Fixture {
            backend,
            guard,
            repo,
        }
    }

    fn draft(title: &str, path: &str) -> NewArtwork {
        NewArtwork::new(
            title,
            StagedImage {
                path: path.to_string(),
                orientation: Orientation::Landscape,
            },
        )
    }

    #[tokio::test]
    async fn visible_listing_hides_hidden_and_orders() {
        let fx = fixture().await;
        let mut later = draft("Second slot", "scans/b.png");
        later.sort_order = 1;
        fx.backend.seed(later);
        let mut hidden = draft("Hidden", "scans/h.png");
        hidden.is_visible = false;
        fx.backend.seed(hidden);
        fx.backend.seed(draft("Older", "scans/o.png"));
        fx.backend.seed(draft("Newest", "scans/n.png"));

        let titles: Vec<String> = fx
            .repo
            .list_visible()
            .await
            .unwrap()
            .into_iter()
            .map(|art| art.title)
            .collect();
        assert_eq!(titles, vec!["Newest", "Older", "Second slot"]);

        let all = fx.repo.list_all().await.unwrap();
        assert_eq!(all.len(), 4);
        assert!(all.iter().any(|art| !art.is_visible));
    }

    #[tokio::test]
    async fn create_normalizes_optional_fields() {
        let fx = fixture().await;
        let mut record = draft("  Tide  ", "scans/t.png");
        record.medium = Some("   ".to_string());
        record.year = Some(" 2024 ".to_string());

        let created = fx.repo.create(record).await.unwrap();
        assert_eq!(created.title, "Tide");
        assert_eq!(created.medium, None);
        assert_eq!(created.year.as_deref(), Some("2024"));
        assert!(created.is_visible);
        assert_eq!(created.sort_order, 0);
    }

    #[tokio::test]
    async fn create_with_blank_title_writes_nothing() {
        let fx = fixture().await;
        let result = fx.repo.create(draft("   ", "scans/t.png")).await;
        assert!(matches!(result, Err(Error::Validation(_))));
        assert!(fx.backend.rows().is_empty());
    }

    #[tokio::test]
    async fn update_merges_patch_and_touches_updated_at() {
        let fx = fixture().await;
        let created = fx.backend.seed(draft("Dusk", "scans/d.png"));

        let updated = fx
            .repo
            .update(
                &created.id,
                ArtworkPatch {
                    price: Some(Some("$300".to_string())),
                    ..ArtworkPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Dusk");
        assert_eq!(updated.price.as_deref(), Some("$300"));
        assert!(updated.updated_at.is_some());
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let fx = fixture().await;
        let result = fx
            .repo
            .update(&ArtworkId::new("missing"), ArtworkPatch::visibility(false))
            .await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn update_cannot_blank_the_title() {
        let fx = fixture().await;
        let created = fx.backend.seed(draft("Dusk", "scans/d.png"));
        let result = fx
            .repo
            .update(
                &created.id,
                ArtworkPatch {
                    title: Some("  ".to_string()),
                    ..ArtworkPatch::default()
                },
            )
            .await;
        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(fx.backend.rows()[0].title, "Dusk");
    }

    #[tokio::test]
    async fn delete_releases_image_then_record() {
        let fx = fixture().await;
        fx.backend.seed_object("scans/d.png", vec![0; 8]);
        let created = fx.backend.seed(draft("Dusk", "scans/d.png"));

        fx.repo.delete(&created.id).await.unwrap();

        assert!(fx.backend.rows().is_empty());
        assert!(fx.backend.object("scans/d.png").is_none());
        assert!(fx.repo.get(&created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_keeps_record_when_release_fails() {
        let fx = fixture().await;
        fx.backend.seed_object("scans/d.png", vec![0; 8]);
        let created = fx.backend.seed(draft("Dusk", "scans/d.png"));
        fx.backend.inject(Fault::Remove);

        let result = fx.repo.delete(&created.id).await;

        assert!(matches!(result, Err(Error::Storage(_))));
        assert_eq!(fx.backend.rows().len(), 1);
    }

    #[tokio::test]
    async fn delete_unknown_id_is_not_found() {
        let fx = fixture().await;
        let result = fx.repo.delete(&ArtworkId::new("nope")).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn mutations_without_session_are_refused_server_side() {
        let fx = fixture().await;
        fx.guard.sign_out().await.unwrap();

        let result = fx.repo.create(draft("Dusk", "scans/d.png")).await;
        assert!(matches!(result, Err(Error::Auth(_))));
        assert!(fx.backend.rows().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_backend_times_out() {
        let fx = fixture().await;
        let repo = fx.repo.with_timeout(Duration::from_secs(30));
        fx.backend.set_latency(Duration::from_secs(120));

        let result = repo.list_visible().await;
        assert!(matches!(result, Err(Error::Timeout(_))));
    }

    #[tokio::test]
    async fn resolve_image_url_rejects_blank_paths() {
        let fx = fixture().await;
        assert_eq!(fx.repo.resolve_image_url(""), None);
        assert_eq!(
            fx.repo.resolve_image_url("scans/a.png").as_deref(),
            Some("memory://artwork/scans/a.png")
        );
    }
}
