use std::path::Path;

use gallery_core::auth::AuthProvider;
use gallery_core::backend::{ArtworkStore, ObjectStore};
use gallery_core::ingest::LocalImage;
use gallery_core::AdminController;

use crate::cli::ArtworkFields;
use crate::commands::common::{apply_fields, finish, proceed, require_signed_in};
use crate::error::CliError;

pub async fn run_add<P, S, O>(
    controller: &AdminController<P, S, O>,
    file: &Path,
    fields: &ArtworkFields,
) -> Result<(), CliError>
where
    P: AuthProvider,
    S: ArtworkStore,
    O: ObjectStore,
{
    require_signed_in(controller)?;
    let image = LocalImage::from_path(file)?;

    proceed(controller.cancel_edit())?;
    proceed(controller.stage_file(image))?;
    proceed(controller.edit_form(|form| apply_fields(form, fields)))?;
    finish(controller, controller.submit().await)
}
