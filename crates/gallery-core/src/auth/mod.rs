//! Supabase auth client and the session guard built on top of it.

mod guard;

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::GalleryConfig;

pub use guard::{AuthProvider, SessionGuard, SessionWatch};

const EXPIRY_SKEW_SECONDS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
    pub user: AuthUser,
}

impl AuthSession {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= unix_timestamp_now() + EXPIRY_SKEW_SECONDS
    }

    #[must_use]
    pub fn email_label(&self) -> &str {
        self.user.email.as_deref().unwrap_or("(no email)")
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid auth configuration: {0}")]
    InvalidConfiguration(&'static str),
    #[error("{0}")]
    InvalidCredentials(String),
    #[error("Sign in to manage the gallery")]
    SignInRequired,
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to parse JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Auth API error: {0}")]
    Api(String),
    #[error("Secure storage error: {0}")]
    SecureStorage(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Where a signed-in session survives between runs.
pub trait SessionPersistence: Clone + Send + Sync + 'static {
    fn load_session(&self) -> AuthResult<Option<AuthSession>>;
    fn save_session(&self, session: &AuthSession) -> AuthResult<()>;
    fn clear_session(&self) -> AuthResult<()>;
}

/// Process-local session store; nothing outlives the process.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    slot: Arc<Mutex<Option<AuthSession>>>,
}

impl SessionPersistence for MemorySessionStore {
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        let guard = self
            .slot
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        Ok(guard.clone())
    }

    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        let mut guard = self
            .slot
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        *guard = Some(session.clone());
        Ok(())
    }

    fn clear_session(&self) -> AuthResult<()> {
        let mut guard = self
            .slot
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        *guard = None;
        Ok(())
    }
}

/// Password sign-in, token refresh and logout against the Supabase auth API.
///
/// Every session the API hands out is written to `store`, so a later
/// [`restore_session`](Self::restore_session) resumes it.
#[derive(Clone)]
pub struct SupabaseAuthClient<S: SessionPersistence> {
    auth_url: String,
    anon_key: String,
    client: Client,
    store: S,
}

impl<S: SessionPersistence> SupabaseAuthClient<S> {
    pub fn new(url: impl AsRef<str>, anon_key: impl Into<String>, store: S) -> AuthResult<Self> {
        Self::build(url.as_ref(), anon_key.into(), store, None)
    }

    /// Build a client from gallery config, bounding each call by its timeout.
    pub fn from_config(config: &GalleryConfig, store: S) -> AuthResult<Self> {
        Self::build(
            &config.supabase_url,
            config.supabase_anon_key.clone(),
            store,
            Some(config.request_timeout),
        )
    }

    fn build(
        url: &str,
        anon_key: String,
        store: S,
        timeout: Option<Duration>,
    ) -> AuthResult<Self> {
        let anon_key = anon_key.trim().to_string();
        if anon_key.is_empty() {
            return Err(AuthError::InvalidConfiguration(
                "Supabase anon key must not be empty",
            ));
        }

        let client = timeout
            .map_or_else(Client::builder, |timeout| Client::builder().timeout(timeout))
            .build()?;

        Ok(Self {
            auth_url: normalize_auth_url(url)?,
            anon_key,
            client,
            store,
        })
    }

    /// Resume the persisted session, refreshing it once if it has expired.
    ///
    /// A session that cannot be refreshed is dropped from the store.
    pub async fn restore_session(&self) -> AuthResult<Option<AuthSession>> {
        let Some(stored) = self.store.load_session()? else {
            return Ok(None);
        };
        if !stored.is_expired() {
            return Ok(Some(stored));
        }

        match self.refresh_session(&stored.refresh_token).await {
            Ok(refreshed) => Ok(Some(refreshed)),
            Err(error) => {
                tracing::warn!("Dropping persisted session that failed to refresh: {}", error);
                self.store.clear_session()?;
                Ok(None)
            }
        }
    }

    /// Rejected credentials surface as [`AuthError::InvalidCredentials`] with
    /// the backend's message.
    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        validate_credentials(email, password)?;
        let payload = serde_json::json!({ "email": email.trim(), "password": password });

        match self.grant("password", &payload).await {
            Err(GrantError::Rejected(status, body))
                if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED =>
            {
                Err(AuthError::InvalidCredentials(
                    parse_api_message(&body)
                        .unwrap_or_else(|| "Invalid login credentials".to_string()),
                ))
            }
            other => other.map_err(AuthError::from),
        }
    }

    pub async fn refresh_session(&self, refresh_token: &str) -> AuthResult<AuthSession> {
        if refresh_token.trim().is_empty() {
            return Err(AuthError::InvalidConfiguration(
                "Refresh token must not be empty",
            ));
        }
        let payload = serde_json::json!({ "refresh_token": refresh_token });
        self.grant("refresh_token", &payload)
            .await
            .map_err(AuthError::from)
    }

    /// Revoke `access_token` and forget the stored session. An already
    /// invalid token counts as signed out.
    pub async fn sign_out(&self, access_token: &str) -> AuthResult<()> {
        let response = self
            .client
            .post(format!("{}/logout", self.auth_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() && status != StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Api(parse_api_error(status, &body)));
        }

        self.store.clear_session()
    }

    /// Drop the persisted session without contacting the backend.
    pub fn forget_session(&self) -> AuthResult<()> {
        self.store.clear_session()
    }

    /// Exchange `payload` for a session at the token endpoint and persist it.
    async fn grant(
        &self,
        grant_type: &str,
        payload: &serde_json::Value,
    ) -> Result<AuthSession, GrantError> {
        let response = self
            .client
            .post(format!("{}/token", self.auth_url))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .json(payload)
            .send()
            .await
            .map_err(AuthError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GrantError::Rejected(status, body));
        }

        let grant = response.json::<TokenGrant>().await.map_err(AuthError::from)?;
        let session = grant.into_session()?;
        self.store.save_session(&session)?;
        Ok(session)
    }
}

/// Token endpoint failure, keeping the raw status so callers can classify it.
enum GrantError {
    Rejected(StatusCode, String),
    Auth(AuthError),
}

impl From<AuthError> for GrantError {
    fn from(error: AuthError) -> Self {
        Self::Auth(error)
    }
}

impl From<GrantError> for AuthError {
    fn from(error: GrantError) -> Self {
        match error {
            GrantError::Rejected(status, body) => Self::Api(parse_api_error(status, &body)),
            GrantError::Auth(error) => error,
        }
    }
}

pub fn normalize_auth_url(url: &str) -> AuthResult<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(AuthError::InvalidConfiguration(
            "Supabase URL must not be empty",
        ));
    }
    if !crate::util::is_http_url(trimmed) {
        return Err(AuthError::InvalidConfiguration(
            "Supabase URL must include http:// or https://",
        ));
    }
    Ok(if trimmed.ends_with("/auth/v1") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/auth/v1")
    })
}

pub(crate) fn validate_credentials(email: &str, password: &str) -> AuthResult<()> {
    if email.trim().is_empty() {
        return Err(AuthError::InvalidCredentials("Email is required".to_string()));
    }
    if password.trim().is_empty() {
        return Err(AuthError::InvalidCredentials(
            "Password is required".to_string(),
        ));
    }
    Ok(())
}

/// Body of a successful token grant.
#[derive(Debug, Deserialize)]
struct TokenGrant {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
    expires_in: Option<i64>,
    user: Option<AuthUser>,
}

impl TokenGrant {
    fn into_session(self) -> AuthResult<AuthSession> {
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|secs| unix_timestamp_now().saturating_add(secs)));

        let (Some(access_token), Some(refresh_token), Some(expires_at), Some(user)) =
            (self.access_token, self.refresh_token, expires_at, self.user)
        else {
            return Err(AuthError::Api(
                "Auth response did not include a usable session; is the account confirmed?"
                    .to_string(),
            ));
        };

        Ok(AuthSession {
            access_token,
            refresh_token,
            expires_at,
            user,
        })
    }
}

/// The auth, record and storage APIs each name the message field differently.
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

fn parse_api_message(body: &str) -> Option<String> {
    let payload = serde_json::from_str::<ApiErrorBody>(body).ok()?;
    [
        payload.message,
        payload.msg,
        payload.error_description,
        payload.error,
    ]
    .into_iter()
    .flatten()
    .map(|message| message.trim().to_string())
    .find(|message| !message.is_empty())
}

/// `"<message> (<status>)"`, falling back to the compacted raw body.
pub(crate) fn parse_api_error(status: StatusCode, body: &str) -> String {
    let code = status.as_u16();
    match parse_api_message(body) {
        Some(message) => format!("{message} ({code})"),
        None if body.trim().is_empty() => format!("HTTP {code}"),
        None => format!("{} ({code})", crate::util::compact_text(body.trim())),
    }
}

pub(crate) fn unix_timestamp_now() -> i64 {
    chrono::Utc::now().timestamp()
}
