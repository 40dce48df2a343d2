//! Hosted backend collaborators.
//!
//! The gallery talks to three services: identity ([`crate::auth::AuthProvider`]),
//! the artwork table ([`ArtworkStore`]) and image storage ([`ObjectStore`]).
//! Every call carries the caller's bearer token when one exists so the backend
//! can enforce its own authorization independently of the client-side guard.

pub mod memory;
mod supabase;

use std::future::Future;

use crate::auth::SessionWatch;
use crate::models::{Artwork, ArtworkId, ArtworkPatch, NewArtwork};
use crate::Result;

pub use supabase::{SupabaseObjects, SupabaseRecords};

/// Record query. Results are ordered by `sort_order` ascending, then
/// `created_at` descending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArtworkQuery {
    /// Restrict to rows with `is_visible = true`.
    pub visible_only: bool,
}

impl ArtworkQuery {
    #[must_use]
    pub const fn visible() -> Self {
        Self { visible_only: true }
    }

    #[must_use]
    pub const fn all() -> Self {
        Self {
            visible_only: false,
        }
    }
}

/// Table of artwork records.
pub trait ArtworkStore: Send + Sync {
    fn select(
        &self,
        query: ArtworkQuery,
        bearer: Option<&str>,
    ) -> impl Future<Output = Result<Vec<Artwork>>> + Send;

    fn fetch(
        &self,
        id: &ArtworkId,
        bearer: Option<&str>,
    ) -> impl Future<Output = Result<Option<Artwork>>> + Send;

    fn insert(
        &self,
        record: &NewArtwork,
        bearer: Option<&str>,
    ) -> impl Future<Output = Result<Artwork>> + Send;

    /// Returns `None` when no row matched `id`.
    fn update(
        &self,
        id: &ArtworkId,
        patch: &ArtworkPatch,
        bearer: Option<&str>,
    ) -> impl Future<Output = Result<Option<Artwork>>> + Send;

    /// Returns the removed row, or `None` when no row matched `id`.
    fn delete(
        &self,
        id: &ArtworkId,
        bearer: Option<&str>,
    ) -> impl Future<Output = Result<Option<Artwork>>> + Send;
}

/// Bucket of publicly readable image objects.
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` at `path`. Never overwrites an existing object.
    fn upload(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
        bearer: Option<&str>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Remove the object at `path`. Removing a missing object succeeds.
    fn remove(&self, path: &str, bearer: Option<&str>) -> impl Future<Output = Result<()>> + Send;

    fn public_url(&self, path: &str) -> String;
}

/// Source of the bearer token attached to backend calls.
#[derive(Debug, Clone, Default)]
pub struct BearerSource {
    session: Option<SessionWatch>,
}

impl BearerSource {
    /// Anonymous access only.
    #[must_use]
    pub const fn anonymous() -> Self {
        Self { session: None }
    }

    #[must_use]
    pub const fn from_session(session: SessionWatch) -> Self {
        Self {
            session: Some(session),
        }
    }

    /// Access token of the current unexpired session, if any.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        let session = self.session.as_ref()?;
        let current = session.borrow();
        current
            .as_ref()
            .filter(|session| !session.is_expired())
            .map(|session| session.access_token.clone())
    }
}
