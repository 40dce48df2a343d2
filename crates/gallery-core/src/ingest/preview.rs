//! Bounded previews for images staged in the admin form.

use std::io::Cursor;

use image::{GenericImageView, ImageFormat};

use crate::{Error, Result};

/// Largest edge of a form preview, in pixels.
pub const PREVIEW_MAX_EDGE: u32 = 250;

/// PNG-encoded preview of a staged image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl PreviewImage {
    #[must_use]
    pub const fn content_type(&self) -> &'static str {
        "image/png"
    }
}

/// Render `source_bytes` to fit within [`PREVIEW_MAX_EDGE`] on both axes.
///
/// Aspect ratio is preserved and small images are never upscaled.
pub fn render_preview(source_bytes: &[u8]) -> Result<PreviewImage> {
    render_preview_within(source_bytes, PREVIEW_MAX_EDGE)
}

pub(crate) fn render_preview_within(source_bytes: &[u8], max_edge: u32) -> Result<PreviewImage> {
    if source_bytes.is_empty() {
        return Err(Error::InvalidInput(
            "Preview source bytes cannot be empty".to_string(),
        ));
    }
    if max_edge == 0 {
        return Err(Error::InvalidInput(
            "Preview bound must be greater than zero".to_string(),
        ));
    }

    let source = image::load_from_memory(source_bytes).map_err(|error| {
        Error::InvalidInput(format!("Failed to decode image for preview: {error}"))
    })?;

    let (source_width, source_height) = source.dimensions();
    let scaled = if source_width <= max_edge && source_height <= max_edge {
        source
    } else {
        source.thumbnail(max_edge, max_edge)
    };
    let (width, height) = scaled.dimensions();

    let mut cursor = Cursor::new(Vec::new());
    scaled
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|error| Error::InvalidInput(format!("Failed to encode preview: {error}")))?;

    Ok(PreviewImage {
        bytes: cursor.into_inner(),
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::tests::png_fixture;

    #[test]
    fn preview_fits_landscape_within_bound() {
        let preview = render_preview(&png_fixture(1000, 500)).unwrap();
        assert_eq!(preview.width, 250);
        assert_eq!(preview.height, 125);
        assert_eq!(
            image::guess_format(&preview.bytes).unwrap(),
            ImageFormat::Png
        );
    }

    #[test]
    fn preview_keeps_small_images() {
        let preview = render_preview(&png_fixture(120, 90)).unwrap();
        assert_eq!((preview.width, preview.height), (120, 90));
    }

    #[test]
    fn preview_rejects_undecodable_bytes() {
        let err = render_preview(b"definitely not pixels").unwrap_err();
        assert!(err.to_string().contains("decode"));
    }
}
