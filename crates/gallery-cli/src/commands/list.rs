use gallery_core::auth::AuthProvider;
use gallery_core::backend::{ArtworkStore, ObjectStore};
use gallery_core::export::{artwork_to_export_item, ExportArtwork};
use gallery_core::gallery::{GalleryCard, GalleryView};
use gallery_core::{AdminController, Artwork};

use crate::commands::common::{format_artwork_lines, proceed, require_signed_in, short_id, truncate};
use crate::error::CliError;

/// Public listing by default; `all` lists hidden artworks too and needs a session.
pub async fn run_list<P, S, O>(
    controller: &AdminController<P, S, O>,
    all: bool,
    as_json: bool,
) -> Result<(), CliError>
where
    P: AuthProvider,
    S: ArtworkStore,
    O: ObjectStore,
{
    let repo = controller.repository();
    let resolve = |path: &str| repo.resolve_image_url(path);

    if all {
        require_signed_in(controller)?;
        proceed(controller.refresh().await)?;
        let artworks = controller.artworks();
        if as_json {
            print_json(&artworks, resolve)?;
        } else if artworks.is_empty() {
            println!("No artworks yet.");
        } else {
            for line in format_artwork_lines(&artworks) {
                println!("{line}");
            }
        }
        return Ok(());
    }

    let mut view = GalleryView::default();
    view.load(repo).await;
    if let Some(error) = view.load_error() {
        return Err(CliError::GalleryUnavailable(error.to_string()));
    }

    if as_json {
        print_json(view.artworks(), resolve)?;
    } else if let Some(label) = view.empty_label() {
        println!("{label}");
    } else {
        for line in format_card_lines(&view.cards(resolve)) {
            println!("{line}");
        }
    }
    Ok(())
}

/// Public listing: one line per carousel card.
pub fn format_card_lines(cards: &[GalleryCard]) -> Vec<String> {
    cards
        .iter()
        .map(|card| {
            let id = short_id(card.id.as_str());
            let title = truncate(&card.title, 32);
            let caption = truncate(&card.caption, 28);
            match &card.price {
                Some(price) => format!("{id:<8}  {title:<32}  {caption:<28}  {price}"),
                None => format!("{id:<8}  {title:<32}  {caption}"),
            }
        })
        .collect()
}

fn print_json(
    artworks: &[Artwork],
    resolve: impl Fn(&str) -> Option<String>,
) -> Result<(), CliError> {
    let items = artworks
        .iter()
        .map(|art| artwork_to_export_item(art, resolve(&art.image_path)))
        .collect::<Vec<ExportArtwork>>();
    println!("{}", serde_json::to_string_pretty(&items)?);
    Ok(())
}
