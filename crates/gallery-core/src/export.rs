//! Catalog export for admin backups.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::models::{Artwork, Orientation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
        }
    }
}

/// Flattened artwork record with its resolved public image URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportArtwork {
    pub id: String,
    pub title: String,
    pub medium: Option<String>,
    pub year: Option<String>,
    pub price: Option<String>,
    pub description: Option<String>,
    pub image_path: String,
    pub image_url: Option<String>,
    pub orientation: Orientation,
    pub is_visible: bool,
    pub sort_order: i32,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[must_use]
pub fn artwork_to_export_item(artwork: &Artwork, image_url: Option<String>) -> ExportArtwork {
    ExportArtwork {
        id: artwork.id.to_string(),
        title: artwork.title.clone(),
        medium: artwork.medium.clone(),
        year: artwork.year.clone(),
        price: artwork.price.clone(),
        description: artwork.description.clone(),
        image_path: artwork.image_path.clone(),
        image_url,
        orientation: artwork.orientation,
        is_visible: artwork.is_visible,
        sort_order: artwork.sort_order,
        created_at: artwork.created_at.to_rfc3339(),
        updated_at: artwork.updated_at.map(|at| at.to_rfc3339()),
    }
}

fn export_items(
    artworks: &[Artwork],
    resolve: impl Fn(&str) -> Option<String>,
) -> Vec<ExportArtwork> {
    artworks
        .iter()
        .map(|art| artwork_to_export_item(art, resolve(&art.image_path)))
        .collect()
}

pub fn render_json_export(
    artworks: &[Artwork],
    resolve: impl Fn(&str) -> Option<String>,
) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&export_items(artworks, resolve))
}

/// One frontmatter block per artwork; the description becomes the body.
#[must_use]
pub fn render_markdown_export(
    artworks: &[Artwork],
    resolve: impl Fn(&str) -> Option<String>,
) -> String {
    let mut output = String::new();

    for (index, item) in export_items(artworks, resolve).into_iter().enumerate() {
        if index > 0 {
            output.push('\n');
        }

        let _ = writeln!(output, "---");
        let _ = writeln!(output, "id: {}", item.id);
        let _ = writeln!(output, "title: {}", item.title);
        for (key, value) in [
            ("medium", &item.medium),
            ("year", &item.year),
            ("price", &item.price),
        ] {
            if let Some(value) = value {
                let _ = writeln!(output, "{key}: {value}");
            }
        }
        let _ = writeln!(output, "orientation: {}", item.orientation);
        let _ = writeln!(output, "visible: {}", item.is_visible);
        let _ = writeln!(output, "sort_order: {}", item.sort_order);
        let _ = writeln!(output, "image_path: {}", item.image_path);
        if let Some(url) = &item.image_url {
            let _ = writeln!(output, "image_url: {url}");
        }
        let _ = writeln!(output, "created_at: {}", item.created_at);
        let _ = writeln!(output, "---");
        if let Some(description) = &item.description {
            let _ = writeln!(output);
            output.push_str(description);
            output.push('\n');
        }
    }

    output
}

pub fn render_catalog_export(
    artworks: &[Artwork],
    format: ExportFormat,
    resolve: impl Fn(&str) -> Option<String>,
) -> serde_json::Result<String> {
    match format {
        ExportFormat::Json => render_json_export(artworks, resolve),
        ExportFormat::Markdown => Ok(render_markdown_export(artworks, resolve)),
    }
}

#[must_use]
pub fn suggested_export_file_name(format: ExportFormat, timestamp_ms: i64) -> String {
    format!("gallery-export-{timestamp_ms}.{}", format.extension())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::models::ArtworkId;

    fn artwork() -> Artwork {
        Artwork {
            id: ArtworkId::new("12"),
            title: "Salt Marsh".to_string(),
            medium: Some("Oil on linen".to_string()),
            year: None,
            price: Some("$900".to_string()),
            description: Some("Low tide, late October.".to_string()),
            image_path: "scans/marsh.jpg".to_string(),
            orientation: Orientation::Landscape,
            is_visible: false,
            sort_order: 3,
            created_at: Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap(),
            updated_at: None,
        }
    }

    #[test]
    fn markdown_export_includes_frontmatter_and_description() {
        let rendered = render_markdown_export(&[artwork()], |path| {
            Some(format!("https://cdn.example/{path}"))
        });

        assert!(rendered.starts_with("---\nid: 12\ntitle: Salt Marsh\n"));
        assert!(rendered.contains("medium: Oil on linen\n"));
        assert!(!rendered.contains("year:"));
        assert!(rendered.contains("visible: false\n"));
        assert!(rendered.contains("image_url: https://cdn.example/scans/marsh.jpg\n"));
        assert!(rendered.ends_with("---\n\nLow tide, late October.\n"));
    }

    #[test]
    fn json_export_carries_resolved_urls() {
        let rendered = render_json_export(&[artwork()], |_| None).unwrap();
        let parsed: Vec<ExportArtwork> = serde_json::from_str(&rendered).unwrap();

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].image_url, None);
        assert_eq!(parsed[0].orientation, Orientation::Landscape);
        assert_eq!(parsed[0].created_at, "2025-01-02T03:04:05+00:00");
    }

    #[test]
    fn suggested_export_file_name_uses_format_extension() {
        assert_eq!(
            suggested_export_file_name(ExportFormat::Markdown, 456),
            "gallery-export-456.md"
        );
    }
}
