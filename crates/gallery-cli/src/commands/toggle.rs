use gallery_core::auth::AuthProvider;
use gallery_core::backend::{ArtworkStore, ObjectStore};
use gallery_core::AdminController;

use crate::commands::common::{finish, require_signed_in, resolve_artwork};
use crate::error::CliError;

pub async fn run_toggle<P, S, O>(
    controller: &AdminController<P, S, O>,
    id: &str,
) -> Result<(), CliError>
where
    P: AuthProvider,
    S: ArtworkStore,
    O: ObjectStore,
{
    require_signed_in(controller)?;
    let artwork = resolve_artwork(id, &controller.artworks())?;
    finish(controller, controller.toggle_visibility(&artwork.id).await)
}
