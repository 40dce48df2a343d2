use std::path::{Path, PathBuf};

use chrono::Utc;
use gallery_core::auth::AuthProvider;
use gallery_core::backend::{ArtworkStore, ObjectStore};
use gallery_core::export::{render_catalog_export, suggested_export_file_name};
use gallery_core::AdminController;

use crate::cli::ExportFormat;
use crate::commands::common::{proceed, write_output};
use crate::error::CliError;

/// Export the full catalog when signed in, otherwise the public listing.
pub async fn run_export<P, S, O>(
    controller: &AdminController<P, S, O>,
    format: ExportFormat,
    output_path: Option<&Path>,
) -> Result<(), CliError>
where
    P: AuthProvider,
    S: ArtworkStore,
    O: ObjectStore,
{
    let repo = controller.repository();
    let artworks = if controller.guard().is_signed_in() {
        proceed(controller.refresh().await)?;
        controller.artworks()
    } else {
        tracing::warn!("Not signed in; exporting visible artworks only");
        repo.list_visible().await?
    };

    let format = format.into();
    let mut rendered =
        render_catalog_export(&artworks, format, |path| repo.resolve_image_url(path))?;
    if !rendered.ends_with('\n') {
        rendered.push('\n');
    }

    let target = output_path.map(|path| export_target(path, format));
    write_output(rendered.as_bytes(), target.as_deref())
}

/// A directory target gets a timestamped file name inside it.
pub fn export_target(path: &Path, format: gallery_core::export::ExportFormat) -> PathBuf {
    if path.is_dir() {
        path.join(suggested_export_file_name(
            format,
            Utc::now().timestamp_millis(),
        ))
    } else {
        path.to_path_buf()
    }
}
