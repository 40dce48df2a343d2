use std::path::Path;

use gallery_core::auth::AuthProvider;
use gallery_core::backend::{ArtworkStore, ObjectStore};
use gallery_core::ingest::LocalImage;
use gallery_core::AdminController;

use crate::cli::ArtworkFields;
use crate::commands::common::{apply_fields, finish, proceed, require_signed_in, resolve_artwork};
use crate::error::CliError;

/// Update fields and/or the image through the edit form, then move the
/// artwork to `sort_order` when one is given.
pub async fn run_edit<P, S, O>(
    controller: &AdminController<P, S, O>,
    id: &str,
    file: Option<&Path>,
    fields: &ArtworkFields,
    sort_order: Option<i32>,
) -> Result<(), CliError>
where
    P: AuthProvider,
    S: ArtworkStore,
    O: ObjectStore,
{
    require_signed_in(controller)?;
    let edits_form = file.is_some() || !fields.is_empty();
    if !edits_form && sort_order.is_none() {
        return Err(CliError::NothingToEdit);
    }

    let artwork = resolve_artwork(id, &controller.artworks())?;

    if edits_form {
        let image = file.map(LocalImage::from_path).transpose()?;
        proceed(controller.select_for_edit(&artwork))?;
        if let Some(image) = image {
            proceed(controller.stage_file(image))?;
        }
        proceed(controller.edit_form(|form| apply_fields(form, fields)))?;
        finish(controller, controller.submit().await)?;
    }

    if let Some(sort_order) = sort_order {
        finish(
            controller,
            controller.set_sort_order(&artwork.id, sort_order).await,
        )?;
    }
    Ok(())
}
