use std::io::BufRead;

use gallery_core::auth::AuthProvider;
use gallery_core::backend::{ArtworkStore, ObjectStore};
use gallery_core::AdminController;

use crate::commands::common::{confirm, finish, require_signed_in, resolve_artwork};
use crate::error::CliError;

/// Delete an artwork after confirming on `input`, unless `force` is set.
pub async fn run_delete<P, S, O>(
    controller: &AdminController<P, S, O>,
    id: &str,
    force: bool,
    input: impl BufRead,
) -> Result<(), CliError>
where
    P: AuthProvider,
    S: ArtworkStore,
    O: ObjectStore,
{
    require_signed_in(controller)?;
    let artwork = resolve_artwork(id, &controller.artworks())?;

    if !force && !confirm(&format!("Delete '{}'?", artwork.title), input)? {
        return Err(CliError::Cancelled);
    }

    finish(controller, controller.delete(&artwork.id).await)?;
    println!("{}", artwork.id);
    Ok(())
}
