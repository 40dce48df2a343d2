//! Draft state behind the admin artwork form and the login form.

use crate::ingest::{render_preview, LocalImage, PreviewImage};
use crate::models::{Artwork, ArtworkPatch, NewArtwork, StagedImage};
use crate::util::normalize_text_option;
use crate::{Error, Result};

pub const MISSING_IMAGE_MESSAGE: &str = "Please select an image first";

/// What the form shows next to the file picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPreview {
    /// Thumbnail of a file staged locally but not uploaded yet.
    Local(PreviewImage),
    /// Public URL of the image currently stored for the record being edited.
    Remote(String),
}

/// Editable artwork fields as typed by the admin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtworkForm {
    pub title: String,
    pub medium: String,
    pub year: String,
    pub price: String,
    pub description: String,
    pub staged_file: Option<LocalImage>,
    pub preview: Option<FormPreview>,
    /// Stored image of the record being edited.
    pub current_image_path: Option<String>,
}

impl ArtworkForm {
    /// Pre-populate from an existing record. No file is staged.
    #[must_use]
    pub fn from_artwork(artwork: &Artwork, preview_url: Option<String>) -> Self {
        Self {
            title: artwork.title.clone(),
            medium: artwork.medium.clone().unwrap_or_default(),
            year: artwork.year.clone().unwrap_or_default(),
            price: artwork.price.clone().unwrap_or_default(),
            description: artwork.description.clone().unwrap_or_default(),
            staged_file: None,
            preview: preview_url.map(FormPreview::Remote),
            current_image_path: Some(artwork.image_path.clone()),
        }
    }

    /// Stage `image` for the next submit and render its preview.
    pub fn stage_file(&mut self, image: LocalImage) {
        self.preview = match render_preview(&image.bytes) {
            Ok(preview) => Some(FormPreview::Local(preview)),
            Err(error) => {
                tracing::warn!(file = %image.file_name, "No preview for staged file: {}", error);
                None
            }
        };
        self.staged_file = Some(image);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn require_title(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation("Title is required".to_string()));
        }
        Ok(())
    }

    /// A create needs a staged file and a title.
    pub(crate) fn validate_for_create(&self) -> Result<()> {
        if self.staged_file.is_none() {
            return Err(Error::Validation(MISSING_IMAGE_MESSAGE.to_string()));
        }
        self.require_title()
    }

    pub(crate) fn to_new_artwork(&self, image: StagedImage) -> NewArtwork {
        NewArtwork {
            medium: normalize_text_option(Some(self.medium.clone())),
            year: normalize_text_option(Some(self.year.clone())),
            price: normalize_text_option(Some(self.price.clone())),
            description: normalize_text_option(Some(self.description.clone())),
            ..NewArtwork::new(self.title.trim(), image)
        }
    }

    /// Patch carrying every text field; blanks clear the stored value.
    pub(crate) fn to_patch(&self) -> ArtworkPatch {
        ArtworkPatch {
            title: Some(self.title.trim().to_string()),
            medium: Some(normalize_text_option(Some(self.medium.clone()))),
            year: Some(normalize_text_option(Some(self.year.clone()))),
            price: Some(normalize_text_option(Some(self.price.clone()))),
            description: Some(normalize_text_option(Some(self.description.clone()))),
            ..ArtworkPatch::default()
        }
    }
}

/// Login form draft. The email survives a failed attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ingest::tests::png_fixture;
    use crate::models::{ArtworkId, Orientation};

    fn stored() -> Artwork {
        Artwork {
            id: ArtworkId::new("9"),
            title: "Harbour".to_string(),
            medium: Some("Watercolour".to_string()),
            year: None,
            price: Some("$120".to_string()),
            description: None,
            image_path: "scans/harbour.png".to_string(),
            orientation: Orientation::Landscape,
            is_visible: true,
            sort_order: 0,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn from_artwork_fills_every_editable_field() {
        let form = ArtworkForm::from_artwork(&stored(), Some("https://cdn/harbour.png".into()));
        assert_eq!(form.title, "Harbour");
        assert_eq!(form.medium, "Watercolour");
        assert_eq!(form.year, "");
        assert_eq!(form.price, "$120");
        assert_eq!(form.staged_file, None);
        assert_eq!(
            form.preview,
            Some(FormPreview::Remote("https://cdn/harbour.png".to_string()))
        );
        assert_eq!(form.current_image_path.as_deref(), Some("scans/harbour.png"));
    }

    #[test]
    fn create_requires_file_before_title() {
        let mut form = ArtworkForm::default();
        let missing_file = form.validate_for_create().unwrap_err();
        assert_eq!(missing_file.to_string(), MISSING_IMAGE_MESSAGE);

        form.stage_file(LocalImage::new("a.png", png_fixture(8, 6)));
        let missing_title = form.validate_for_create().unwrap_err();
        assert_eq!(missing_title.to_string(), "Title is required");

        form.title = "Dusk".to_string();
        assert!(form.validate_for_create().is_ok());
    }

    #[test]
    fn staging_a_file_renders_local_preview() {
        let mut form = ArtworkForm::default();
        form.stage_file(LocalImage::new("a.png", png_fixture(500, 100)));
        match &form.preview {
            Some(FormPreview::Local(preview)) => assert_eq!(preview.width, 250),
            other => panic!("unexpected preview: {other:?}"),
        }

        form.stage_file(LocalImage::new("b.bin", b"???".to_vec()));
        assert_eq!(form.preview, None);
        assert!(form.staged_file.is_some());
    }

    #[test]
    fn patch_clears_blank_fields_and_leaves_image_alone() {
        let mut form = ArtworkForm::from_artwork(&stored(), None);
        form.medium = "  ".to_string();
        let patch = form.to_patch();

        assert_eq!(patch.medium, Some(None));
        assert_eq!(patch.price, Some(Some("$120".to_string())));
        assert!(!patch.replaces_image());
        assert_eq!(patch.is_visible, None);
    }
}
