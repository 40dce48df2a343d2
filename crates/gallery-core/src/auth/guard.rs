use std::future::Future;

use tokio::sync::watch;

use super::{
    validate_credentials, AuthError, AuthResult, AuthSession, SessionPersistence,
    SupabaseAuthClient,
};

/// Receiving half of the session channel. `None` means signed out.
pub type SessionWatch = watch::Receiver<Option<AuthSession>>;

/// Credential-based sign-in against some identity backend.
pub trait AuthProvider: Send + Sync {
    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = AuthResult<AuthSession>> + Send;

    fn sign_out(&self, session: &AuthSession) -> impl Future<Output = AuthResult<()>> + Send;

    fn refresh(&self, session: &AuthSession)
        -> impl Future<Output = AuthResult<AuthSession>> + Send;

    /// Load a session persisted by an earlier run, if any.
    fn restore(&self) -> impl Future<Output = AuthResult<Option<AuthSession>>> + Send;
}

impl<S: SessionPersistence> AuthProvider for SupabaseAuthClient<S> {
    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        Self::sign_in(self, email, password).await
    }

    async fn sign_out(&self, session: &AuthSession) -> AuthResult<()> {
        Self::sign_out(self, &session.access_token).await
    }

    async fn refresh(&self, session: &AuthSession) -> AuthResult<AuthSession> {
        self.refresh_session(&session.refresh_token).await
    }

    async fn restore(&self) -> AuthResult<Option<AuthSession>> {
        self.restore_session().await
    }
}

/// Tracks whether an authenticated session exists and broadcasts every
/// transition to subscribers.
///
/// The guard only gates the UI. Backends attach the current bearer token and
/// enforce authorization on their own side.
pub struct SessionGuard<P> {
    provider: P,
    state: watch::Sender<Option<AuthSession>>,
}

impl<P: AuthProvider> SessionGuard<P> {
    pub fn new(provider: P) -> Self {
        let (state, _) = watch::channel(None);
        Self { provider, state }
    }

    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// The live session; an expired one counts as absent.
    pub fn current_session(&self) -> Option<AuthSession> {
        self.state
            .borrow()
            .as_ref()
            .filter(|session| !session.is_expired())
            .cloned()
    }

    pub fn is_signed_in(&self) -> bool {
        self.current_session().is_some()
    }

    /// Whether a session is held at all, expired or not.
    pub fn holds_session(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// Session for a mutation, or [`AuthError::SignInRequired`].
    pub fn require_session(&self) -> AuthResult<AuthSession> {
        self.current_session().ok_or(AuthError::SignInRequired)
    }

    /// Change feed. The receiver starts at the current value.
    pub fn subscribe(&self) -> SessionWatch {
        self.state.subscribe()
    }

    pub async fn restore(&self) -> AuthResult<Option<AuthSession>> {
        let restored = self.provider.restore().await?;
        if let Some(session) = &restored {
            tracing::debug!(user = %session.user.id, "Restored persisted session");
        }
        self.publish(restored.clone());
        Ok(restored)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        validate_credentials(email, password)?;
        let session = self.provider.sign_in(email.trim(), password).await?;
        tracing::info!(user = %session.user.id, "Signed in");
        self.publish(Some(session.clone()));
        Ok(session)
    }

    /// Clear the session. The local state is cleared even when the remote
    /// logout fails; that failure is still returned.
    pub async fn sign_out(&self) -> AuthResult<()> {
        let previous = self.state.borrow().as_ref().cloned();
        let Some(session) = previous else {
            return Ok(());
        };

        let remote = self.provider.sign_out(&session).await;
        self.publish(None);
        if let Err(error) = &remote {
            tracing::warn!("Remote sign-out failed: {}", error);
        } else {
            tracing::info!(user = %session.user.id, "Signed out");
        }
        remote
    }

    /// Detect an externally expired session, refreshing it when possible.
    ///
    /// Emits a transition to signed-out when the refresh fails.
    pub async fn expire_if_stale(&self) -> Option<AuthSession> {
        let stored = self.state.borrow().as_ref().cloned()?;
        if !stored.is_expired() {
            return Some(stored);
        }

        match self.provider.refresh(&stored).await {
            Ok(refreshed) => {
                self.publish(Some(refreshed.clone()));
                Some(refreshed)
            }
            Err(error) => {
                tracing::warn!("Session expired and could not be refreshed: {}", error);
                self.publish(None);
                None
            }
        }
    }

    fn publish(&self, next: Option<AuthSession>) {
        self.state.send_replace(next);
    }
}
