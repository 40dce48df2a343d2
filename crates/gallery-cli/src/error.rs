use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] gallery_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Artwork ID cannot be empty")]
    EmptyArtworkId,
    #[error("Artwork not found for id/prefix: {0}")]
    ArtworkNotFound(String),
    #[error("{0}")]
    AmbiguousArtworkId(String),
    #[error("Image path cannot be empty")]
    EmptyImagePath,
    #[error("Failed to load gallery: {0}")]
    GalleryUnavailable(String),
    #[error("Nothing to change. Pass --file, a field flag, or --sort-order")]
    NothingToEdit,
    #[error("Deletion cancelled")]
    Cancelled,
    #[error("Another action is still in progress")]
    Busy,
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error(
        "Gallery backend is not configured. Run `gallery config init`, \
         or set SUPABASE_URL and SUPABASE_ANON_KEY."
    )]
    NotConfigured,
}
