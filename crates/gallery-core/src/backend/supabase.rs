//! Supabase `PostgREST` and Storage clients.

use reqwest::{Client, RequestBuilder, Response, StatusCode};

use super::{ArtworkQuery, ArtworkStore, ObjectStore};
use crate::auth::{parse_api_error, AuthError};
use crate::config::GalleryConfig;
use crate::models::{Artwork, ArtworkId, ArtworkPatch, NewArtwork};
use crate::{Error, Result};

const DISPLAY_ORDER: &str = "sort_order.asc,created_at.desc";
const UPLOAD_CACHE_CONTROL: &str = "3600";

fn build_client(config: &GalleryConfig) -> Result<Client> {
    Client::builder()
        .timeout(config.request_timeout)
        .build()
        .map_err(|error| Error::Network(format!("Failed to construct HTTP client: {error}")))
}

fn authorize(request: RequestBuilder, anon_key: &str, bearer: Option<&str>) -> RequestBuilder {
    request
        .header("apikey", anon_key)
        .bearer_auth(bearer.unwrap_or(anon_key))
}

/// Map a non-success response to the error taxonomy. `fallback` builds the
/// error used for statuses without a dedicated mapping.
async fn reject(response: Response, fallback: impl FnOnce(String) -> Error) -> Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = parse_api_error(status, &body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::Auth(AuthError::Api(message))
        }
        _ => fallback(message),
    }
}

/// Artwork table served by `PostgREST`.
#[derive(Debug, Clone)]
pub struct SupabaseRecords {
    table_url: String,
    anon_key: String,
    client: Client,
}

impl SupabaseRecords {
    pub fn new(config: &GalleryConfig) -> Result<Self> {
        Ok(Self {
            table_url: config.table_url(),
            anon_key: config.supabase_anon_key.clone(),
            client: build_client(config)?,
        })
    }

    fn id_filter(id: &ArtworkId) -> [(&'static str, String); 1] {
        [("id", format!("eq.{}", id.as_str()))]
    }

    async fn rows(&self, request: RequestBuilder, bearer: Option<&str>) -> Result<Vec<Artwork>> {
        let response = authorize(request, &self.anon_key, bearer)
            .header("Accept", "application/json")
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(reject(response, Error::Backend).await);
        }
        Ok(response.json::<Vec<Artwork>>().await?)
    }
}

impl ArtworkStore for SupabaseRecords {
    async fn select(&self, query: ArtworkQuery, bearer: Option<&str>) -> Result<Vec<Artwork>> {
        let mut params = vec![("select", "*"), ("order", DISPLAY_ORDER)];
        if query.visible_only {
            params.push(("is_visible", "eq.true"));
        }
        tracing::debug!(visible_only = query.visible_only, "Selecting artworks");
        self.rows(self.client.get(&self.table_url).query(&params), bearer)
            .await
    }

    async fn fetch(&self, id: &ArtworkId, bearer: Option<&str>) -> Result<Option<Artwork>> {
        let request = self
            .client
            .get(&self.table_url)
            .query(&[("select", "*")])
            .query(&Self::id_filter(id));
        Ok(self.rows(request, bearer).await?.into_iter().next())
    }

    async fn insert(&self, record: &NewArtwork, bearer: Option<&str>) -> Result<Artwork> {
        let request = self
            .client
            .post(&self.table_url)
            .header("Prefer", "return=representation")
            .json(record);
        self.rows(request, bearer)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Backend("Insert did not return the created row".to_string()))
    }

    async fn update(
        &self,
        id: &ArtworkId,
        patch: &ArtworkPatch,
        bearer: Option<&str>,
    ) -> Result<Option<Artwork>> {
        let request = self
            .client
            .patch(&self.table_url)
            .query(&Self::id_filter(id))
            .header("Prefer", "return=representation")
            .json(patch);
        Ok(self.rows(request, bearer).await?.into_iter().next())
    }

    async fn delete(&self, id: &ArtworkId, bearer: Option<&str>) -> Result<Option<Artwork>> {
        let request = self
            .client
            .delete(&self.table_url)
            .query(&Self::id_filter(id))
            .header("Prefer", "return=representation");
        Ok(self.rows(request, bearer).await?.into_iter().next())
    }
}

/// Artwork bucket served by Supabase Storage.
#[derive(Debug, Clone)]
pub struct SupabaseObjects {
    object_url: String,
    public_url: String,
    anon_key: String,
    client: Client,
}

impl SupabaseObjects {
    pub fn new(config: &GalleryConfig) -> Result<Self> {
        Ok(Self {
            object_url: config.storage_url(),
            public_url: config.public_storage_url(),
            anon_key: config.supabase_anon_key.clone(),
            client: build_client(config)?,
        })
    }
}

impl ObjectStore for SupabaseObjects {
    async fn upload(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
        bearer: Option<&str>,
    ) -> Result<()> {
        let request = self
            .client
            .post(format!("{}/{}", self.object_url, encode_path(path)))
            .header("x-upsert", "false")
            .header("cache-control", UPLOAD_CACHE_CONTROL)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes.to_vec());

        let response = authorize(request, &self.anon_key, bearer).send().await?;
        if !response.status().is_success() {
            return Err(reject(response, Error::Upload).await);
        }
        tracing::debug!(path, size = bytes.len(), "Uploaded object");
        Ok(())
    }

    async fn remove(&self, path: &str, bearer: Option<&str>) -> Result<()> {
        let request = self.client.delete(&self.object_url).json(&serde_json::json!({
            "prefixes": [path],
        }));

        let response = authorize(request, &self.anon_key, bearer).send().await?;
        if !response.status().is_success() {
            return Err(reject(response, Error::Storage).await);
        }
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.public_url, encode_path(path))
    }
}

/// Percent-encode each path segment, keeping the separators.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GalleryConfig {
        GalleryConfig::new("https://demo.supabase.co", "anon").unwrap()
    }

    #[test]
    fn public_url_keeps_separators_and_encodes_segments() {
        let objects = SupabaseObjects::new(&config()).unwrap();
        assert_eq!(
            objects.public_url("scans/1700000000000-ab12 cd.png"),
            "https://demo.supabase.co/storage/v1/object/public/artwork/scans/1700000000000-ab12%20cd.png"
        );
    }

    #[test]
    fn id_filter_uses_equality_operator() {
        let filter = SupabaseRecords::id_filter(&ArtworkId::new("42"));
        assert_eq!(filter[0].0, "id");
        assert_eq!(filter[0].1, "eq.42");
    }

    /// Requires SUPABASE_URL and SUPABASE_ANON_KEY in the environment or `.env`.
    #[tokio::test]
    #[ignore = "requires a live Supabase project"]
    async fn live_select_visible_returns_ordered_rows() {
        dotenvy::dotenv().ok();
        let Some(config) = GalleryConfig::from_env().unwrap() else {
            return;
        };
        let records = SupabaseRecords::new(&config).unwrap();
        let rows = records.select(ArtworkQuery::visible(), None).await.unwrap();

        assert!(rows.iter().all(|art| art.is_visible));
        assert!(rows
            .windows(2)
            .all(|pair| pair[0].display_cmp(&pair[1]).is_le()));
    }
}
