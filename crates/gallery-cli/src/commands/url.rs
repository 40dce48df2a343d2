use gallery_core::auth::AuthProvider;
use gallery_core::backend::{ArtworkStore, ObjectStore};
use gallery_core::AdminController;

use crate::error::CliError;

pub fn run_url<P, S, O>(controller: &AdminController<P, S, O>, path: &str) -> Result<(), CliError>
where
    P: AuthProvider,
    S: ArtworkStore,
    O: ObjectStore,
{
    let url = controller
        .repository()
        .resolve_image_url(path)
        .ok_or(CliError::EmptyImagePath)?;
    println!("{url}");
    Ok(())
}
