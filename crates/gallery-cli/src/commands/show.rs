use gallery_core::auth::AuthProvider;
use gallery_core::backend::{ArtworkStore, ObjectStore};
use gallery_core::gallery::{GalleryView, Lightbox};
use gallery_core::AdminController;

use crate::commands::common::resolve_artwork;
use crate::error::CliError;

/// Print one artwork as the lightbox presents it.
///
/// Signed-in admins can open hidden artworks as well.
pub async fn run_show<P, S, O>(
    controller: &AdminController<P, S, O>,
    id: &str,
) -> Result<(), CliError>
where
    P: AuthProvider,
    S: ArtworkStore,
    O: ObjectStore,
{
    let repo = controller.repository();
    let mut view = if controller.guard().is_signed_in() {
        GalleryView::new(controller.artworks())
    } else {
        let mut view = GalleryView::default();
        view.load(repo).await;
        if let Some(error) = view.load_error() {
            return Err(CliError::GalleryUnavailable(error.to_string()));
        }
        view
    };

    let artwork = resolve_artwork(id, view.artworks())?;
    view.open(&artwork.id);
    let lightbox = view
        .lightbox(|path| repo.resolve_image_url(path))
        .ok_or_else(|| CliError::ArtworkNotFound(id.to_string()))?;

    for line in format_lightbox(&lightbox) {
        println!("{line}");
    }
    Ok(())
}

pub fn format_lightbox(lightbox: &Lightbox) -> Vec<String> {
    let mut lines = vec![lightbox.title.clone()];
    if !lightbox.caption.is_empty() {
        lines.push(lightbox.caption.clone());
    }
    if let Some(description) = &lightbox.description {
        lines.push(String::new());
        lines.push(description.clone());
    }
    if let Some(url) = &lightbox.image_url {
        lines.push(String::new());
        lines.push(url.clone());
    }
    lines
}
