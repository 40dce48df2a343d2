//! Data models for the gallery

mod artwork;

pub use artwork::{
    sort_for_display, Artwork, ArtworkId, ArtworkPatch, NewArtwork, Orientation, StagedImage,
    DEFAULT_MEDIUM_LABEL,
};
pub(crate) use artwork::join_caption;
