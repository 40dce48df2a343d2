//! Runtime configuration for the hosted gallery backend.
//!
//! `GalleryConfig` carries the public Supabase endpoint/key plus the names of
//! the artwork table and storage bucket. The anon key is safe to ship; the
//! backend's row-level policies are what actually guard mutations.

use std::env;
use std::fmt;
use std::time::Duration;

use crate::util::{is_http_url, normalize_text_option};
use crate::{Error, Result};

const ENV_SUPABASE_URL: &str = "SUPABASE_URL";
const ENV_SUPABASE_ANON_KEY: &str = "SUPABASE_ANON_KEY";
const ENV_STORAGE_BUCKET: &str = "GALLERY_STORAGE_BUCKET";
const ENV_TABLE: &str = "GALLERY_TABLE";
const ENV_REQUEST_TIMEOUT_SECS: &str = "GALLERY_REQUEST_TIMEOUT_SECS";

pub const DEFAULT_STORAGE_BUCKET: &str = "artwork";
pub const DEFAULT_TABLE: &str = "artworks";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_NOTIFICATION_DURATION: Duration = Duration::from_secs(3);

/// Backend endpoints and client-side policies.
#[derive(Clone, PartialEq, Eq)]
pub struct GalleryConfig {
    /// Supabase project URL, without trailing slash.
    pub supabase_url: String,
    /// Public anon key sent as `apikey` on every request.
    pub supabase_anon_key: String,
    /// Object storage bucket holding artwork scans.
    pub storage_bucket: String,
    /// Table holding artwork records.
    pub table: String,
    /// Deadline applied to every backend call.
    pub request_timeout: Duration,
    /// How long a notification stays visible.
    pub notification_duration: Duration,
}

impl GalleryConfig {
    /// Build a config with default bucket, table and timeouts.
    pub fn new(supabase_url: &str, supabase_anon_key: &str) -> Result<Self> {
        let supabase_url = normalize_base_url(supabase_url)?;
        let supabase_anon_key = supabase_anon_key.trim().to_string();
        if supabase_anon_key.is_empty() {
            return Err(Error::InvalidInput(
                "Supabase anon key must not be empty".to_string(),
            ));
        }

        Ok(Self {
            supabase_url,
            supabase_anon_key,
            storage_bucket: DEFAULT_STORAGE_BUCKET.to_string(),
            table: DEFAULT_TABLE.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            notification_duration: DEFAULT_NOTIFICATION_DURATION,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Returns `Ok(None)` when none of the backend variables are set.
    /// Returns an error when only a partial configuration is provided.
    pub fn from_env() -> Result<Option<Self>> {
        parse_config(|key| env::var(key).ok())
    }

    #[must_use]
    pub fn with_storage_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.storage_bucket = bucket.into();
        self
    }

    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Base URL of the auth (`GoTrue`) API.
    #[must_use]
    pub fn auth_url(&self) -> String {
        format!("{}/auth/v1", self.supabase_url)
    }

    /// Base URL of the record (`PostgREST`) API for the artwork table.
    #[must_use]
    pub fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.supabase_url, self.table)
    }

    /// Base URL of the storage object API for the artwork bucket.
    #[must_use]
    pub fn storage_url(&self) -> String {
        format!("{}/storage/v1/object/{}", self.supabase_url, self.storage_bucket)
    }

    /// Base URL under which public objects of the bucket are served.
    #[must_use]
    pub fn public_storage_url(&self) -> String {
        format!(
            "{}/storage/v1/object/public/{}",
            self.supabase_url, self.storage_bucket
        )
    }
}

impl fmt::Debug for GalleryConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("GalleryConfig")
            .field("supabase_url", &self.supabase_url)
            .field("supabase_anon_key", &"[REDACTED]")
            .field("storage_bucket", &self.storage_bucket)
            .field("table", &self.table)
            .field("request_timeout", &self.request_timeout)
            .field("notification_duration", &self.notification_duration)
            .finish()
    }
}

fn parse_config(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<GalleryConfig>> {
    let supabase_url = normalize_text_option(lookup(ENV_SUPABASE_URL));
    let anon_key = normalize_text_option(lookup(ENV_SUPABASE_ANON_KEY));
    let bucket = normalize_text_option(lookup(ENV_STORAGE_BUCKET));
    let table = normalize_text_option(lookup(ENV_TABLE));
    let timeout = normalize_text_option(lookup(ENV_REQUEST_TIMEOUT_SECS));

    let any_present = supabase_url.is_some()
        || anon_key.is_some()
        || bucket.is_some()
        || table.is_some()
        || timeout.is_some();
    if !any_present {
        return Ok(None);
    }

    let mut missing = Vec::new();
    if supabase_url.is_none() {
        missing.push(ENV_SUPABASE_URL);
    }
    if anon_key.is_none() {
        missing.push(ENV_SUPABASE_ANON_KEY);
    }
    let (Some(supabase_url), Some(anon_key)) = (supabase_url, anon_key) else {
        return Err(Error::InvalidInput(format!(
            "Gallery configuration is incomplete. Missing: {}",
            missing.join(", ")
        )));
    };

    let mut config = GalleryConfig::new(&supabase_url, &anon_key)?;
    if let Some(bucket) = bucket {
        config.storage_bucket = bucket;
    }
    if let Some(table) = table {
        config.table = table;
    }
    if let Some(raw) = timeout {
        let secs = raw.parse::<u64>().map_err(|_| {
            Error::InvalidInput(format!(
                "{ENV_REQUEST_TIMEOUT_SECS} must be a whole number of seconds"
            ))
        })?;
        if secs == 0 {
            return Err(Error::InvalidInput(format!(
                "{ENV_REQUEST_TIMEOUT_SECS} must be greater than zero"
            )));
        }
        config.request_timeout = Duration::from_secs(secs);
    }

    Ok(Some(config))
}

fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(
            "Supabase URL must not be empty".to_string(),
        ));
    }
    if !is_http_url(trimmed) {
        return Err(Error::InvalidInput(
            "Supabase URL must include http:// or https://".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn parse_from_map(map: &HashMap<&str, &str>) -> Result<Option<GalleryConfig>> {
        parse_config(|key| map.get(key).map(|value| (*value).to_string()))
    }

    #[test]
    fn parse_config_none_returns_none() {
        let map = HashMap::new();
        assert!(parse_from_map(&map).unwrap().is_none());
    }

    #[test]
    fn parse_config_requires_url_and_key() {
        let mut map = HashMap::new();
        map.insert(ENV_STORAGE_BUCKET, "scans");

        let err = parse_from_map(&map).unwrap_err();
        match err {
            Error::InvalidInput(message) => {
                assert!(message.contains(ENV_SUPABASE_URL));
                assert!(message.contains(ENV_SUPABASE_ANON_KEY));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_config_applies_overrides_and_normalizes_url() {
        let mut map = HashMap::new();
        map.insert(ENV_SUPABASE_URL, "https://demo.supabase.co/");
        map.insert(ENV_SUPABASE_ANON_KEY, " anon ");
        map.insert(ENV_STORAGE_BUCKET, "scans");
        map.insert(ENV_REQUEST_TIMEOUT_SECS, "12");

        let config = parse_from_map(&map).unwrap().unwrap();
        assert_eq!(config.supabase_url, "https://demo.supabase.co");
        assert_eq!(config.supabase_anon_key, "anon");
        assert_eq!(config.storage_bucket, "scans");
        assert_eq!(config.table, DEFAULT_TABLE);
        assert_eq!(config.request_timeout, Duration::from_secs(12));
        assert_eq!(
            config.public_storage_url(),
            "https://demo.supabase.co/storage/v1/object/public/scans"
        );
    }

    #[test]
    fn parse_config_rejects_zero_timeout() {
        let mut map = HashMap::new();
        map.insert(ENV_SUPABASE_URL, "https://demo.supabase.co");
        map.insert(ENV_SUPABASE_ANON_KEY, "anon");
        map.insert(ENV_REQUEST_TIMEOUT_SECS, "0");

        assert!(parse_from_map(&map).is_err());
    }

    #[test]
    fn new_rejects_url_without_scheme() {
        let err = GalleryConfig::new("demo.supabase.co", "anon").unwrap_err();
        assert!(err.to_string().contains("http://"));
    }

    #[test]
    fn debug_redacts_anon_key() {
        let config = GalleryConfig::new("https://demo.supabase.co", "anon-secret").unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("anon-secret"));
    }

    #[test]
    fn endpoint_urls_are_derived_from_base() {
        let config = GalleryConfig::new("https://demo.supabase.co", "anon").unwrap();
        assert_eq!(config.auth_url(), "https://demo.supabase.co/auth/v1");
        assert_eq!(
            config.table_url(),
            "https://demo.supabase.co/rest/v1/artworks"
        );
        assert_eq!(
            config.storage_url(),
            "https://demo.supabase.co/storage/v1/object/artwork"
        );
    }
}
