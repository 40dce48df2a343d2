//! Image ingestion: staging scans into object storage.
//!
//! Staging uploads the bytes under a fresh collision-resistant path and probes
//! the pixel dimensions to decide orientation. It never touches artwork
//! records; callers put the returned [`StagedImage`] into a create or update.

mod preview;

use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use image::{ImageFormat, ImageReader};
use thiserror::Error;
use uuid::Uuid;

use crate::backend::{BearerSource, ObjectStore};
use crate::config::DEFAULT_REQUEST_TIMEOUT;
use crate::models::{Orientation, StagedImage};
use crate::util::{sanitize_token, with_deadline};
use crate::{Error, Result};

pub use preview::{render_preview, PreviewImage, PREVIEW_MAX_EDGE};

/// Folder inside the bucket that holds every uploaded scan.
pub const SCAN_FOLDER: &str = "scans";
const RANDOM_SUFFIX_LEN: usize = 12;
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// A user-selected image file, not yet uploaded.
#[derive(Clone, PartialEq, Eq)]
pub struct LocalImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl LocalImage {
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read an image file from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { file_name, bytes })
    }

    /// Storage extension: the original one when usable, otherwise the sniffed
    /// format's canonical one.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        let from_name = self
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| sanitize_token(ext))
            .filter(|ext| !ext.is_empty());
        from_name.or_else(|| {
            self.sniffed_format()
                .and_then(|format| format.extensions_str().first())
                .map(|ext| (*ext).to_string())
        })
    }

    /// MIME type of the bytes; the extension only decides when the format
    /// cannot be sniffed.
    #[must_use]
    pub fn content_type(&self) -> String {
        self.sniffed_format()
            .or_else(|| {
                self.extension()
                    .and_then(|ext| ImageFormat::from_extension(&ext))
            })
            .map_or_else(
                || FALLBACK_CONTENT_TYPE.to_string(),
                |format| format.to_mime_type().to_string(),
            )
    }

    fn sniffed_format(&self) -> Option<ImageFormat> {
        image::guess_format(&self.bytes).ok()
    }
}

impl std::fmt::Debug for LocalImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalImage")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    #[must_use]
    pub const fn orientation(self) -> Orientation {
        Orientation::from_dimensions(self.width, self.height)
    }
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("image is empty")]
    Empty,
    #[error("unrecognized image format")]
    UnknownFormat,
    #[error("failed to read image header: {0}")]
    Decode(String),
}

/// Read pixel dimensions from an encoded image's header.
pub fn probe_dimensions(bytes: &[u8]) -> std::result::Result<Dimensions, ProbeError> {
    if bytes.is_empty() {
        return Err(ProbeError::Empty);
    }
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|error| ProbeError::Decode(error.to_string()))?;
    if reader.format().is_none() {
        return Err(ProbeError::UnknownFormat);
    }
    let (width, height) = reader
        .into_dimensions()
        .map_err(|error| ProbeError::Decode(error.to_string()))?;
    Ok(Dimensions { width, height })
}

/// Orientation for `bytes`, defaulting to portrait when they cannot be probed.
pub fn detect_orientation(bytes: &[u8]) -> Orientation {
    match probe_dimensions(bytes) {
        Ok(dimensions) => dimensions.orientation(),
        Err(error) => {
            tracing::warn!("Could not probe image dimensions, assuming portrait: {}", error);
            Orientation::Portrait
        }
    }
}

/// `scans/{unix_millis}-{random}[.ext]`
pub fn build_scan_path(extension: Option<&str>) -> String {
    let millis = Utc::now().timestamp_millis();
    let mut random = Uuid::new_v4().simple().to_string();
    random.truncate(RANDOM_SUFFIX_LEN);
    match extension {
        Some(ext) if !ext.is_empty() => format!("{SCAN_FOLDER}/{millis}-{random}.{ext}"),
        _ => format!("{SCAN_FOLDER}/{millis}-{random}"),
    }
}

/// Uploads and releases artwork images.
#[derive(Clone)]
pub struct ImageIngestor<O> {
    objects: O,
    bearer: BearerSource,
    timeout: Duration,
}

impl<O: ObjectStore> ImageIngestor<O> {
    pub const fn new(objects: O, bearer: BearerSource) -> Self {
        Self {
            objects,
            bearer,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Upload `image` under a fresh path and report where it landed.
    ///
    /// A rejected upload fails with [`Error::Upload`]; nothing else is written.
    /// When no response arrives the path is released, since the object may
    /// have been stored anyway.
    pub async fn stage_upload(&self, image: &LocalImage) -> Result<StagedImage> {
        if image.bytes.is_empty() {
            return Err(Error::Upload("Selected image file is empty".to_string()));
        }

        let orientation = detect_orientation(&image.bytes);
        let path = build_scan_path(image.extension().as_deref());
        let content_type = image.content_type();
        let token = self.bearer.token();

        let uploaded = with_deadline(
            self.timeout,
            self.objects
                .upload(&path, &image.bytes, &content_type, token.as_deref()),
        )
        .await;
        if let Err(error) = uploaded {
            if matches!(error, Error::Timeout(_) | Error::Network(_)) {
                if let Err(cleanup) = self.release(&path).await {
                    tracing::warn!(%path, "Failed to release unconfirmed upload: {}", cleanup);
                }
            }
            return Err(error);
        }

        tracing::info!(%path, %orientation, "Staged image upload");
        Ok(StagedImage { path, orientation })
    }

    /// Delete a stored image. A missing object counts as released.
    pub async fn release(&self, path: &str) -> Result<()> {
        let path = path.trim();
        if path.is_empty() {
            return Ok(());
        }
        let token = self.bearer.token();
        with_deadline(self.timeout, self.objects.remove(path, token.as_deref())).await?;
        tracing::debug!(path, "Released stored image");
        Ok(())
    }

    /// Public URL for a stored image, `None` for a blank path.
    pub fn public_url(&self, path: &str) -> Option<String> {
        let path = path.trim();
        if path.is_empty() {
            None
        } else {
            Some(self.objects.public_url(path))
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use image::{ImageBuffer, Rgba};

    use super::*;
    use crate::auth::SessionGuard;
    use crate::backend::memory::{Fault, MemoryBackend};

    pub(crate) fn png_fixture(width: u32, height: u32) -> Vec<u8> {
        let canvas = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_fn(width, height, |x, y| {
            Rgba([(x % 255) as u8, (y % 255) as u8, 180, 255])
        });
        let mut cursor = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(canvas)
            .write_to(&mut cursor, ImageFormat::Png)
            .unwrap();
        cursor.into_inner()
    }

    async fn signed_in_ingestor() -> (MemoryBackend, ImageIngestor<MemoryBackend>) {
        let backend = MemoryBackend::new().with_user("artist@example.com", "secret");
        let guard = SessionGuard::new(backend.clone());
        guard.sign_in("artist@example.com", "secret").await.unwrap();
        let ingestor = ImageIngestor::new(
            backend.clone(),
            BearerSource::from_session(guard.subscribe()),
        );
        (backend, ingestor)
    }

    #[test]
    fn probe_reports_dimensions() {
        let dims = probe_dimensions(&png_fixture(40, 30)).unwrap();
        assert_eq!(dims, Dimensions { width: 40, height: 30 });
        assert_eq!(dims.orientation(), Orientation::Landscape);
    }

    #[test]
    fn probe_failure_falls_back_to_portrait() {
        assert!(matches!(probe_dimensions(&[]), Err(ProbeError::Empty)));
        assert!(probe_dimensions(b"plain text, not an image").is_err());
        assert_eq!(detect_orientation(b"garbage"), Orientation::Portrait);
    }

    #[test]
    fn extension_prefers_file_name_but_content_type_follows_bytes() {
        let misnamed = LocalImage::new("Sunset Study.JPG", png_fixture(2, 2));
        assert_eq!(misnamed.extension().as_deref(), Some("jpg"));
        assert_eq!(misnamed.content_type(), "image/png");

        let unreadable = LocalImage::new("draft.jpeg", b"not decoded".to_vec());
        assert_eq!(unreadable.content_type(), "image/jpeg");

        let unnamed = LocalImage::new("scan", png_fixture(2, 2));
        assert_eq!(unnamed.extension().as_deref(), Some("png"));
        assert_eq!(unnamed.content_type(), "image/png");

        let opaque = LocalImage::new("notes", b"plain".to_vec());
        assert_eq!(opaque.extension(), None);
        assert_eq!(opaque.content_type(), FALLBACK_CONTENT_TYPE);
    }

    #[test]
    fn scan_paths_are_unique_and_shaped() {
        let first = build_scan_path(Some("png"));
        let second = build_scan_path(Some("png"));
        assert_ne!(first, second);
        assert!(first.starts_with("scans/"));
        assert!(first.ends_with(".png"));

        let bare = build_scan_path(None);
        let name = bare.trim_start_matches("scans/");
        let (millis, random) = name.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(random.len(), RANDOM_SUFFIX_LEN);
    }

    #[test]
    fn local_image_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dusk.png");
        std::fs::write(&path, png_fixture(3, 5)).unwrap();

        let image = LocalImage::from_path(&path).unwrap();
        assert_eq!(image.file_name, "dusk.png");
        assert_eq!(detect_orientation(&image.bytes), Orientation::Portrait);
    }

    #[tokio::test]
    async fn stage_upload_stores_bytes_and_orientation() {
        let (backend, ingestor) = signed_in_ingestor().await;
        let image = LocalImage::new("wide.png", png_fixture(64, 32));

        let staged = ingestor.stage_upload(&image).await.unwrap();

        assert_eq!(staged.orientation, Orientation::Landscape);
        let stored = backend.object(&staged.path).unwrap();
        assert_eq!(stored.bytes, image.bytes);
        assert_eq!(stored.content_type, "image/png");
        assert!(backend.rows().is_empty());
    }

    #[tokio::test]
    async fn stage_upload_of_unprobeable_bytes_is_portrait() {
        let (_backend, ingestor) = signed_in_ingestor().await;
        let image = LocalImage::new("mystery.bin", b"not decodable".to_vec());

        let staged = ingestor.stage_upload(&image).await.unwrap();
        assert_eq!(staged.orientation, Orientation::Portrait);
        assert!(staged.path.ends_with(".bin"));
    }

    #[tokio::test]
    async fn rejected_upload_is_upload_error() {
        let (backend, ingestor) = signed_in_ingestor().await;
        backend.inject(Fault::Upload);

        let result = ingestor
            .stage_upload(&LocalImage::new("a.png", png_fixture(4, 4)))
            .await;
        assert!(matches!(result, Err(Error::Upload(_))));
        assert!(backend.object_paths().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_upload_is_released_after_timeout() {
        let (backend, ingestor) = signed_in_ingestor().await;
        let ingestor = ingestor.with_timeout(Duration::from_secs(1));
        backend.delay_upload_responses(Duration::from_secs(60));

        let result = ingestor
            .stage_upload(&LocalImage::new("a.png", png_fixture(4, 4)))
            .await;

        assert!(matches!(result, Err(Error::Timeout(_))));
        assert!(backend.object_paths().is_empty());
    }

    #[tokio::test]
    async fn anonymous_upload_is_refused_by_backend() {
        let backend = MemoryBackend::new();
        let ingestor = ImageIngestor::new(backend.clone(), BearerSource::anonymous());

        let result = ingestor
            .stage_upload(&LocalImage::new("a.png", png_fixture(4, 4)))
            .await;
        assert!(matches!(result, Err(Error::Auth(_))));
    }

    #[tokio::test]
    async fn release_tolerates_missing_objects_and_reports_failures() {
        let (backend, ingestor) = signed_in_ingestor().await;
        ingestor.release("scans/never-existed.png").await.unwrap();

        backend.seed_object("scans/kept.png", vec![1, 2, 3]);
        backend.inject(Fault::Remove);
        let result = ingestor.release("scans/kept.png").await;
        assert!(matches!(result, Err(Error::Storage(_))));
        assert!(backend.object("scans/kept.png").is_some());
    }

    #[test]
    fn public_url_is_none_for_blank_path() {
        let ingestor = ImageIngestor::new(MemoryBackend::new(), BearerSource::anonymous());
        assert_eq!(ingestor.public_url("  "), None);
        assert_eq!(
            ingestor.public_url("scans/a.png").as_deref(),
            Some("memory://artwork/scans/a.png")
        );
    }
}
