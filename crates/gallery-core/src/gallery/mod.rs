//! Headless model of the public gallery: carousel cards and the lightbox.

use std::fmt;

use crate::backend::{ArtworkStore, ObjectStore};
use crate::models::{join_caption, Artwork, ArtworkId, Orientation};
use crate::repository::ArtworkRepository;
use crate::Error;

pub const EMPTY_GALLERY_LABEL: &str = "Gallery coming soon...";

/// In-page sections of the public site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Gallery,
    About,
    Contact,
}

impl Section {
    pub const ALL: [Self; 3] = [Self::Gallery, Self::About, Self::Contact];

    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Gallery => "gallery",
            Self::About => "about",
            Self::Contact => "contact",
        }
    }

    #[must_use]
    pub fn anchor(self) -> String {
        format!("#{}", self.id())
    }

    #[must_use]
    pub fn from_anchor(anchor: &str) -> Option<Self> {
        let id = anchor.trim().trim_start_matches('#');
        Self::ALL.into_iter().find(|section| section.id() == id)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Left,
    Right,
}

/// One carousel card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryCard {
    pub id: ArtworkId,
    pub title: String,
    pub caption: String,
    pub price: Option<String>,
    pub image_url: Option<String>,
    pub orientation: Orientation,
}

impl GalleryCard {
    /// `(width, height)` aspect ratio of the card frame.
    #[must_use]
    pub const fn aspect_ratio(&self) -> (u32, u32) {
        self.orientation.aspect_ratio()
    }
}

/// Full-size view of one artwork.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lightbox {
    pub title: String,
    pub caption: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Default)]
pub struct GalleryView {
    artworks: Vec<Artwork>,
    focus: usize,
    open: Option<ArtworkId>,
    load_error: Option<Error>,
}

impl GalleryView {
    #[must_use]
    pub fn new(artworks: Vec<Artwork>) -> Self {
        Self {
            artworks,
            ..Self::default()
        }
    }

    /// Load the visible collection. A failure leaves the gallery empty.
    pub async fn load<S: ArtworkStore, O: ObjectStore>(
        &mut self,
        repo: &ArtworkRepository<S, O>,
    ) {
        match repo.list_visible().await {
            Ok(artworks) => {
                tracing::debug!(count = artworks.len(), "Loaded gallery");
                *self = Self::new(artworks);
            }
            Err(error) => {
                tracing::error!("Failed to load gallery: {}", error);
                *self = Self {
                    load_error: Some(error),
                    ..Self::default()
                };
            }
        }
    }

    pub fn artworks(&self) -> &[Artwork] {
        &self.artworks
    }

    pub const fn load_error(&self) -> Option<&Error> {
        self.load_error.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.artworks.is_empty()
    }

    /// Label shown in place of the carousel when there is nothing to show.
    pub fn empty_label(&self) -> Option<&'static str> {
        self.is_empty().then_some(EMPTY_GALLERY_LABEL)
    }

    pub fn cards(&self, resolve: impl Fn(&str) -> Option<String>) -> Vec<GalleryCard> {
        self.artworks
            .iter()
            .map(|art| GalleryCard {
                id: art.id.clone(),
                title: art.title.clone(),
                caption: art.card_caption(),
                price: art.price.clone(),
                image_url: resolve(&art.image_path),
                orientation: art.orientation,
            })
            .collect()
    }

    /// Index of the card the carousel is scrolled to.
    pub const fn focus(&self) -> usize {
        self.focus
    }

    /// Move focus by one card, clamped to the ends.
    pub fn scroll(&mut self, direction: ScrollDirection) -> usize {
        let last = self.artworks.len().saturating_sub(1);
        self.focus = match direction {
            ScrollDirection::Left => self.focus.saturating_sub(1),
            ScrollDirection::Right => (self.focus + 1).min(last),
        };
        self.focus
    }

    /// Open the lightbox for `id`. Unknown ids leave it closed.
    pub fn open(&mut self, id: &ArtworkId) -> bool {
        let known = self.artworks.iter().any(|art| &art.id == id);
        self.open = known.then(|| id.clone());
        known
    }

    pub fn close(&mut self) {
        self.open = None;
    }

    pub fn lightbox(&self, resolve: impl Fn(&str) -> Option<String>) -> Option<Lightbox> {
        let id = self.open.as_ref()?;
        let art = self.artworks.iter().find(|art| &art.id == id)?;
        Some(Lightbox {
            title: art.title.clone(),
            caption: join_caption(art.medium.as_deref().unwrap_or_default(), art.year.as_deref()),
            description: art.description.clone(),
            image_url: resolve(&art.image_path),
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::backend::memory::{Fault, MemoryBackend};
    use crate::backend::BearerSource;
    use crate::models::{NewArtwork, StagedImage};

    fn repo(backend: &MemoryBackend) -> ArtworkRepository<MemoryBackend, MemoryBackend> {
        ArtworkRepository::new(backend.clone(), backend.clone(), BearerSource::anonymous())
    }

    fn seed(backend: &MemoryBackend, title: &str, orientation: Orientation) -> Artwork {
        backend.seed(NewArtwork::new(
            title,
            StagedImage {
                path: format!("scans/{}.png", title.to_lowercase()),
                orientation,
            },
        ))
    }

    #[tokio::test]
    async fn load_lists_visible_artworks_as_cards() {
        let backend = MemoryBackend::new();
        let mut hidden = NewArtwork::new(
            "Hidden",
            StagedImage {
                path: "scans/hidden.png".to_string(),
                orientation: Orientation::Portrait,
            },
        );
        hidden.is_visible = false;
        backend.seed(hidden);
        let mut priced = NewArtwork::new(
            "Dusk",
            StagedImage {
                path: "scans/dusk.png".to_string(),
                orientation: Orientation::Landscape,
            },
        );
        priced.year = Some("2024".to_string());
        priced.price = Some("$450".to_string());
        backend.seed(priced);

        let repo = repo(&backend);
        let mut view = GalleryView::default();
        view.load(&repo).await;

        let cards = view.cards(|path| repo.resolve_image_url(path));
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].title, "Dusk");
        assert_eq!(cards[0].caption, "Mixed media · 2024");
        assert_eq!(cards[0].price.as_deref(), Some("$450"));
        assert_eq!(cards[0].aspect_ratio(), (4, 3));
        assert_eq!(
            cards[0].image_url.as_deref(),
            Some("memory://artwork/scans/dusk.png")
        );
        assert_eq!(view.empty_label(), None);
    }

    #[tokio::test]
    async fn load_failure_shows_empty_gallery() {
        let backend = MemoryBackend::new();
        seed(&backend, "Dusk", Orientation::Portrait);
        backend.inject(Fault::Select);

        let mut view = GalleryView::default();
        view.load(&repo(&backend)).await;

        assert!(view.is_empty());
        assert!(view.load_error().is_some());
        assert_eq!(view.empty_label(), Some(EMPTY_GALLERY_LABEL));
    }

    #[test]
    fn scroll_clamps_at_both_ends() {
        let backend = MemoryBackend::new();
        let artworks = vec![
            seed(&backend, "A", Orientation::Portrait),
            seed(&backend, "B", Orientation::Portrait),
            seed(&backend, "C", Orientation::Portrait),
        ];
        let mut view = GalleryView::new(artworks);

        assert_eq!(view.scroll(ScrollDirection::Left), 0);
        assert_eq!(view.scroll(ScrollDirection::Right), 1);
        assert_eq!(view.scroll(ScrollDirection::Right), 2);
        assert_eq!(view.scroll(ScrollDirection::Right), 2);

        let mut empty = GalleryView::default();
        assert_eq!(empty.scroll(ScrollDirection::Right), 0);
    }

    #[test]
    fn lightbox_uses_medium_without_default_label() {
        let backend = MemoryBackend::new();
        let mut art = seed(&backend, "Dusk", Orientation::Portrait);
        art.year = Some("2024".to_string());
        art.description = Some("Evening light over the bay.".to_string());
        let mut view = GalleryView::new(vec![art.clone()]);

        assert!(view.lightbox(|_| None).is_none());
        assert!(view.open(&art.id));

        let lightbox = view.lightbox(|path| Some(format!("https://cdn/{path}"))).unwrap();
        assert_eq!(lightbox.caption, "2024");
        assert_eq!(
            lightbox.description.as_deref(),
            Some("Evening light over the bay.")
        );
        assert_eq!(lightbox.image_url.as_deref(), Some("https://cdn/scans/dusk.png"));

        view.close();
        assert!(view.lightbox(|_| None).is_none());
        assert!(!view.open(&ArtworkId::new("unknown")));
    }

    #[test]
    fn sections_round_trip_through_anchors() {
        assert_eq!(Section::Gallery.anchor(), "#gallery");
        assert_eq!(Section::from_anchor("#contact"), Some(Section::Contact));
        assert_eq!(Section::from_anchor("about"), Some(Section::About));
        assert_eq!(Section::from_anchor("#admin"), None);
    }
}
