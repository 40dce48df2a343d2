//! Artwork model

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};
use crate::util::normalize_text_option;

/// Label shown on gallery cards when an artwork has no medium.
pub const DEFAULT_MEDIUM_LABEL: &str = "Mixed media";

/// Server-assigned artwork identifier.
///
/// Opaque to the client: the backend may hand out UUIDs or integers, both are
/// kept in their textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ArtworkId(String);

impl ArtworkId {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ArtworkId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(value) => Self(value),
            RawId::Number(value) => Self(value.to_string()),
        })
    }
}

/// How an artwork's image is framed, derived from its pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Landscape,
    #[default]
    Portrait,
}

impl Orientation {
    /// Wider than tall is landscape; square and taller images are portrait.
    #[must_use]
    pub const fn from_dimensions(width: u32, height: u32) -> Self {
        if width > height {
            Self::Landscape
        } else {
            Self::Portrait
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Landscape => "landscape",
            Self::Portrait => "portrait",
        }
    }

    /// Card aspect ratio as `(width, height)`.
    #[must_use]
    pub const fn aspect_ratio(self) -> (u32, u32) {
        match self {
            Self::Landscape => (4, 3),
            Self::Portrait => (3, 4),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An uploaded image ready to be referenced by an artwork record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedImage {
    /// Storage path inside the artwork bucket.
    pub path: String,
    /// Orientation probed from the uploaded bytes.
    pub orientation: Orientation,
}

/// A catalog record for one piece of art.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artwork {
    pub id: ArtworkId,
    pub title: String,
    #[serde(default)]
    pub medium: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    /// Display-only price text, never parsed.
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub image_path: String,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default = "default_visible")]
    pub is_visible: bool,
    #[serde(default)]
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

const fn default_visible() -> bool {
    true
}

impl Artwork {
    /// Gallery ordering: manual sort order first, newest first within a slot.
    #[must_use]
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        self.sort_order
            .cmp(&other.sort_order)
            .then_with(|| other.created_at.cmp(&self.created_at))
    }

    /// Medium text, falling back to the default label.
    #[must_use]
    pub fn medium_label(&self) -> &str {
        self.medium.as_deref().unwrap_or(DEFAULT_MEDIUM_LABEL)
    }

    /// `"<medium> · <year>"` with the default medium label.
    #[must_use]
    pub fn card_caption(&self) -> String {
        join_caption(self.medium_label(), self.year.as_deref())
    }
}

/// Stable sort into gallery display order.
pub fn sort_for_display(artworks: &mut [Artwork]) {
    artworks.sort_by(Artwork::display_cmp);
}

pub(crate) fn join_caption(medium: &str, year: Option<&str>) -> String {
    match year {
        Some(year) if medium.is_empty() => year.to_string(),
        Some(year) => format!("{medium} · {year}"),
        None => medium.to_string(),
    }
}

/// Fields for a new artwork record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewArtwork {
    pub title: String,
    pub medium: Option<String>,
    pub year: Option<String>,
    pub price: Option<String>,
    pub description: Option<String>,
    pub image_path: String,
    pub orientation: Orientation,
    pub is_visible: bool,
    pub sort_order: i32,
}

impl NewArtwork {
    /// A visible artwork with default sort order referencing `image`.
    #[must_use]
    pub fn new(title: impl Into<String>, image: StagedImage) -> Self {
        Self {
            title: title.into(),
            medium: None,
            year: None,
            price: None,
            description: None,
            image_path: image.path,
            orientation: image.orientation,
            is_visible: true,
            sort_order: 0,
        }
    }

    /// Trim every text field and drop blank optionals.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            medium: normalize_text_option(self.medium),
            year: normalize_text_option(self.year),
            price: normalize_text_option(self.price),
            description: normalize_text_option(self.description),
            image_path: self.image_path.trim().to_string(),
            ..self
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation("Title is required".to_string()));
        }
        if self.image_path.trim().is_empty() {
            return Err(Error::Validation("Please select an image first".to_string()));
        }
        Ok(())
    }
}

/// Partial update for an artwork record.
///
/// Outer `None` leaves a field untouched. For optional text fields,
/// `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArtworkPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medium: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ArtworkPatch {
    #[must_use]
    pub fn visibility(is_visible: bool) -> Self {
        Self {
            is_visible: Some(is_visible),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn sort_order(sort_order: i32) -> Self {
        Self {
            sort_order: Some(sort_order),
            ..Self::default()
        }
    }

    /// Replace the image reference, recomputing orientation alongside it.
    #[must_use]
    pub fn with_image(mut self, image: StagedImage) -> Self {
        self.image_path = Some(image.path);
        self.orientation = Some(image.orientation);
        self
    }

    #[must_use]
    pub fn replaces_image(&self) -> bool {
        self.image_path.is_some()
    }

    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.map(|title| title.trim().to_string()),
            medium: self.medium.map(normalize_text_option),
            year: self.year.map(normalize_text_option),
            price: self.price.map(normalize_text_option),
            description: self.description.map(normalize_text_option),
            image_path: self.image_path.map(|path| path.trim().to_string()),
            ..self
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.as_deref().is_some_and(|title| title.trim().is_empty()) {
            return Err(Error::Validation("Title is required".to_string()));
        }
        if self
            .image_path
            .as_deref()
            .is_some_and(|path| path.trim().is_empty())
        {
            return Err(Error::Validation(
                "Image reference must not be blank".to_string(),
            ));
        }
        Ok(())
    }

    /// Merge this patch over `artwork` the way the backend does.
    pub fn apply_to(&self, artwork: &mut Artwork) {
        if let Some(title) = &self.title {
            artwork.title.clone_from(title);
        }
        if let Some(medium) = &self.medium {
            artwork.medium.clone_from(medium);
        }
        if let Some(year) = &self.year {
            artwork.year.clone_from(year);
        }
        if let Some(price) = &self.price {
            artwork.price.clone_from(price);
        }
        if let Some(description) = &self.description {
            artwork.description.clone_from(description);
        }
        if let Some(image_path) = &self.image_path {
            artwork.image_path.clone_from(image_path);
        }
        if let Some(orientation) = self.orientation {
            artwork.orientation = orientation;
        }
        if let Some(is_visible) = self.is_visible {
            artwork.is_visible = is_visible;
        }
        if let Some(sort_order) = self.sort_order {
            artwork.sort_order = sort_order;
        }
        artwork.updated_at = Some(self.updated_at.unwrap_or_else(Utc::now));
    }
}
