//! In-process backend for tests and offline demos.
//!
//! Mirrors the server-side rules of the hosted backend: mutations need a live
//! bearer token, uploads never overwrite, ids are server-assigned and rows are
//! returned in display order.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::Notify;

use super::{ArtworkQuery, ArtworkStore, ObjectStore};
use crate::auth::{
    unix_timestamp_now, AuthError, AuthProvider, AuthResult, AuthSession, AuthUser,
};
use crate::models::{sort_for_display, Artwork, ArtworkId, ArtworkPatch, NewArtwork};
use crate::{Error, Result};

const SESSION_LIFETIME_SECONDS: i64 = 3600;
const PUBLIC_URL_BASE: &str = "memory://artwork";

/// Backend operation that can be forced to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    Select,
    Insert,
    Update,
    Delete,
    Upload,
    Remove,
}

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Default)]
struct MemoryState {
    users: HashMap<String, (String, AuthUser)>,
    tokens: HashMap<String, i64>,
    rows: Vec<Artwork>,
    objects: HashMap<String, StoredObject>,
    next_id: u64,
    last_created: Option<DateTime<Utc>>,
    faults: HashSet<Fault>,
    latency: Option<Duration>,
    upload_ack_delay: Option<Duration>,
    session_lifetime: Option<i64>,
    upload_gate: Option<Arc<Notify>>,
}

/// Shared in-memory backend. Clones observe the same state.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account that can sign in.
    #[must_use]
    pub fn with_user(self, email: &str, password: &str) -> Self {
        {
            let mut state = self.lock();
            let user = AuthUser {
                id: format!("user-{}", state.users.len() + 1),
                email: Some(email.to_string()),
            };
            state
                .users
                .insert(email.to_ascii_lowercase(), (password.to_string(), user));
        }
        self
    }

    /// Make every subsequent `fault` operation fail.
    pub fn inject(&self, fault: Fault) {
        self.lock().faults.insert(fault);
    }

    /// Delay every record and object call.
    pub fn set_latency(&self, latency: Duration) {
        self.lock().latency = Some(latency);
    }

    /// Store uploads right away but hold back the response by `delay`.
    pub fn delay_upload_responses(&self, delay: Duration) {
        self.lock().upload_ack_delay = Some(delay);
    }

    /// Lifetime in seconds of sessions issued from now on.
    pub fn set_session_lifetime(&self, seconds: i64) {
        self.lock().session_lifetime = Some(seconds);
    }

    /// Block uploads until the returned handle is notified.
    pub fn hold_uploads(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.lock().upload_gate = Some(Arc::clone(&gate));
        gate
    }

    /// Invalidate every issued token, as if sessions expired server-side.
    pub fn revoke_sessions(&self) {
        self.lock().tokens.clear();
    }

    /// Insert a row directly, bypassing authorization.
    pub fn seed(&self, record: NewArtwork) -> Artwork {
        self.lock().insert_row(record)
    }

    /// Store an object directly, bypassing authorization.
    pub fn seed_object(&self, path: &str, bytes: Vec<u8>) {
        self.lock().objects.insert(
            path.to_string(),
            StoredObject {
                bytes,
                content_type: "application/octet-stream".to_string(),
            },
        );
    }

    #[must_use]
    pub fn rows(&self) -> Vec<Artwork> {
        self.lock().rows.clone()
    }

    #[must_use]
    pub fn object(&self, path: &str) -> Option<StoredObject> {
        self.lock().objects.get(path).cloned()
    }

    #[must_use]
    pub fn object_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.lock().objects.keys().cloned().collect();
        paths.sort();
        paths
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    async fn simulate_latency(&self) {
        let latency = self.lock().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn check(&self, fault: Fault, bearer: Option<&str>, mutation: bool) -> Result<()> {
        let state = self.lock();
        if mutation && !state.authorized(bearer) {
            return Err(Error::Auth(AuthError::Api(
                "new row violates row-level security policy (401)".to_string(),
            )));
        }
        if state.faults.contains(&fault) {
            return Err(match fault {
                Fault::Upload => Error::Upload("Injected upload failure".to_string()),
                Fault::Remove => Error::Storage("Injected storage failure".to_string()),
                _ => Error::Backend(format!("Injected {fault:?} failure")),
            });
        }
        Ok(())
    }
}

impl MemoryState {
    fn authorized(&self, bearer: Option<&str>) -> bool {
        bearer
            .and_then(|token| self.tokens.get(token))
            .is_some_and(|expires_at| *expires_at > unix_timestamp_now())
    }

    fn next_created_at(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let created_at = match self.last_created {
            Some(last) if now <= last => last + TimeDelta::milliseconds(1),
            _ => now,
        };
        self.last_created = Some(created_at);
        created_at
    }

    fn insert_row(&mut self, record: NewArtwork) -> Artwork {
        self.next_id += 1;
        let artwork = Artwork {
            id: ArtworkId::new(self.next_id.to_string()),
            title: record.title,
            medium: record.medium,
            year: record.year,
            price: record.price,
            description: record.description,
            image_path: record.image_path,
            orientation: record.orientation,
            is_visible: record.is_visible,
            sort_order: record.sort_order,
            created_at: self.next_created_at(),
            updated_at: None,
        };
        self.rows.push(artwork.clone());
        artwork
    }

    fn issue_session(&mut self, user: AuthUser) -> AuthSession {
        let access_token = uuid::Uuid::new_v4().simple().to_string();
        let lifetime = self.session_lifetime.unwrap_or(SESSION_LIFETIME_SECONDS);
        let expires_at = unix_timestamp_now() + lifetime;
        self.tokens.insert(access_token.clone(), expires_at);
        AuthSession {
            access_token,
            refresh_token: uuid::Uuid::new_v4().simple().to_string(),
            expires_at,
            user,
        }
    }
}

impl AuthProvider for MemoryBackend {
    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        let mut state = self.lock();
        let user = match state.users.get(&email.trim().to_ascii_lowercase()) {
            Some((expected, user)) if expected == password => user.clone(),
            _ => {
                return Err(AuthError::InvalidCredentials(
                    "Invalid login credentials".to_string(),
                ))
            }
        };
        Ok(state.issue_session(user))
    }

    async fn sign_out(&self, session: &AuthSession) -> AuthResult<()> {
        self.lock().tokens.remove(&session.access_token);
        Ok(())
    }

    async fn refresh(&self, session: &AuthSession) -> AuthResult<AuthSession> {
        let mut state = self.lock();
        if state.tokens.remove(&session.access_token).is_none() {
            return Err(AuthError::Api("Invalid Refresh Token (400)".to_string()));
        }
        Ok(state.issue_session(session.user.clone()))
    }

    async fn restore(&self) -> AuthResult<Option<AuthSession>> {
        Ok(None)
    }
}

impl ArtworkStore for MemoryBackend {
    async fn select(&self, query: ArtworkQuery, bearer: Option<&str>) -> Result<Vec<Artwork>> {
        self.simulate_latency().await;
        self.check(Fault::Select, bearer, false)?;
        let mut rows: Vec<Artwork> = self
            .lock()
            .rows
            .iter()
            .filter(|art| !query.visible_only || art.is_visible)
            .cloned()
            .collect();
        sort_for_display(&mut rows);
        Ok(rows)
    }

    async fn fetch(&self, id: &ArtworkId, bearer: Option<&str>) -> Result<Option<Artwork>> {
        self.simulate_latency().await;
        self.check(Fault::Select, bearer, false)?;
        Ok(self.lock().rows.iter().find(|art| &art.id == id).cloned())
    }

    async fn insert(&self, record: &NewArtwork, bearer: Option<&str>) -> Result<Artwork> {
        self.simulate_latency().await;
        self.check(Fault::Insert, bearer, true)?;
        Ok(self.lock().insert_row(record.clone()))
    }

    async fn update(
        &self,
        id: &ArtworkId,
        patch: &ArtworkPatch,
        bearer: Option<&str>,
    ) -> Result<Option<Artwork>> {
        self.simulate_latency().await;
        self.check(Fault::Update, bearer, true)?;
        let mut state = self.lock();
        Ok(state.rows.iter_mut().find(|art| &art.id == id).map(|art| {
            patch.apply_to(art);
            art.clone()
        }))
    }

    async fn delete(&self, id: &ArtworkId, bearer: Option<&str>) -> Result<Option<Artwork>> {
        self.simulate_latency().await;
        self.check(Fault::Delete, bearer, true)?;
        let mut state = self.lock();
        let position = state.rows.iter().position(|art| &art.id == id);
        Ok(position.map(|index| state.rows.remove(index)))
    }
}

impl ObjectStore for MemoryBackend {
    async fn upload(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
        bearer: Option<&str>,
    ) -> Result<()> {
        let gate = self.lock().upload_gate.clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.simulate_latency().await;
        self.check(Fault::Upload, bearer, true)?;

        let ack_delay = {
            let mut state = self.lock();
            if state.objects.contains_key(path) {
                return Err(Error::Upload("The resource already exists".to_string()));
            }
            state.objects.insert(
                path.to_string(),
                StoredObject {
                    bytes: bytes.to_vec(),
                    content_type: content_type.to_string(),
                },
            );
            state.upload_ack_delay
        };
        if let Some(delay) = ack_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    async fn remove(&self, path: &str, bearer: Option<&str>) -> Result<()> {
        self.simulate_latency().await;
        self.check(Fault::Remove, bearer, true)?;
        self.lock().objects.remove(path);
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{PUBLIC_URL_BASE}/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Orientation, StagedImage};

    fn draft(title: &str, sort_order: i32, visible: bool) -> NewArtwork {
        let mut record = NewArtwork::new(
            title,
            StagedImage {
                path: format!("scans/{title}.png"),
                orientation: Orientation::Portrait,
            },
        );
        record.sort_order = sort_order;
        record.is_visible = visible;
        record
    }

    #[tokio::test]
    async fn mutations_require_a_live_token() {
        let backend = MemoryBackend::new().with_user("artist@example.com", "secret");

        let anonymous = backend.insert(&draft("a", 0, true), None).await;
        assert!(matches!(anonymous, Err(Error::Auth(_))));
        assert!(backend.rows().is_empty());

        let session = AuthProvider::sign_in(&backend, "artist@example.com", "secret")
            .await
            .unwrap();
        backend
            .insert(&draft("a", 0, true), Some(&session.access_token))
            .await
            .unwrap();
        assert_eq!(backend.rows().len(), 1);

        backend.revoke_sessions();
        let revoked = backend
            .insert(&draft("b", 0, true), Some(&session.access_token))
            .await;
        assert!(matches!(revoked, Err(Error::Auth(_))));
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let backend = MemoryBackend::new().with_user("artist@example.com", "secret");
        let result = AuthProvider::sign_in(&backend, "artist@example.com", "nope").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials(_))));
    }

    #[tokio::test]
    async fn select_filters_and_orders() {
        let backend = MemoryBackend::new();
        backend.seed(draft("late", 2, true));
        backend.seed(draft("hidden", 0, false));
        backend.seed(draft("first", 0, true));

        let visible = backend.select(ArtworkQuery::visible(), None).await.unwrap();
        let titles: Vec<&str> = visible.iter().map(|art| art.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "late"]);

        let all = backend.select(ArtworkQuery::all(), None).await.unwrap();
        let titles: Vec<&str> = all.iter().map(|art| art.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "hidden", "late"]);
    }

    #[tokio::test]
    async fn upload_never_overwrites() {
        let backend = MemoryBackend::new().with_user("artist@example.com", "secret");
        let session = AuthProvider::sign_in(&backend, "artist@example.com", "secret")
            .await
            .unwrap();
        let token = Some(session.access_token.as_str());

        backend
            .upload("scans/a.png", b"one", "image/png", token)
            .await
            .unwrap();
        let second = backend.upload("scans/a.png", b"two", "image/png", token).await;

        assert!(matches!(second, Err(Error::Upload(_))));
        assert_eq!(backend.object("scans/a.png").unwrap().bytes, b"one".to_vec());
    }

    #[tokio::test]
    async fn removing_missing_object_succeeds() {
        let backend = MemoryBackend::new().with_user("artist@example.com", "secret");
        let session = AuthProvider::sign_in(&backend, "artist@example.com", "secret")
            .await
            .unwrap();
        backend
            .remove("scans/missing.png", Some(&session.access_token))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn update_of_unknown_id_matches_nothing() {
        let backend = MemoryBackend::new().with_user("artist@example.com", "secret");
        let session = AuthProvider::sign_in(&backend, "artist@example.com", "secret")
            .await
            .unwrap();
        let result = backend
            .update(
                &ArtworkId::new("404"),
                &ArtworkPatch::visibility(false),
                Some(&session.access_token),
            )
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
