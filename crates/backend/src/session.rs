//! Process-wide session context.
//!
//! Owns the signed-in identity, keeps the [`BackendClient`]'s access token
//! in step with it, and broadcasts auth transitions so orchestrators can
//! react without polling.

use std::sync::{Arc, RwLock};

use tokio::sync::broadcast;

use lutspace_core::config::BackendConfig;
use lutspace_core::types::EntityId;

use crate::auth::{AuthApi, AuthError, AuthSession, SignupOutcome};
use crate::client::BackendClient;

/// Buffered auth events per subscriber. Transitions are rare, so a lagging
/// subscriber losing one only happens if it stopped polling entirely.
const EVENT_CAPACITY: usize = 16;

/// Auth state transitions, broadcast to every subscriber.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    SignedIn(SessionUser),
    SignedOut,
    /// The access token was rotated; identity is unchanged.
    TokenRefreshed,
}

/// The signed-in identity as the rest of the workspace sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionUser {
    pub id: EntityId,
    pub email: String,
    pub display_name: String,
}

#[derive(Default)]
struct SessionState {
    user: Option<SessionUser>,
    access_token: Option<String>,
    refresh_token: Option<String>,
    /// True between construction and the end of [`SessionContext::initialize`].
    loading: bool,
}

/// Owns auth state for the process.
///
/// All methods take `&self`; the context is made to sit in an `Arc` and be
/// shared across orchestrators.
pub struct SessionContext {
    auth: AuthApi,
    backend: Arc<BackendClient>,
    state: RwLock<SessionState>,
    events: broadcast::Sender<AuthEvent>,
    site_url: String,
}

impl SessionContext {
    /// Create a not-yet-initialized context. No network I/O happens here.
    pub fn new(config: &BackendConfig, backend: Arc<BackendClient>, site_url: &str) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            auth: AuthApi::new(&config.project_url, &config.anon_key),
            backend,
            state: RwLock::new(SessionState {
                loading: true,
                ..SessionState::default()
            }),
            events,
            site_url: site_url.trim_end_matches('/').to_string(),
        }
    }

    /// Restore a previous session from a stored refresh token, if any.
    ///
    /// Infallible: a missing, expired, or revoked token just leaves the
    /// context signed out. Always ends the loading phase.
    pub async fn initialize(&self, stored_refresh_token: Option<&str>) {
        if let Some(token) = stored_refresh_token {
            match self.auth.refresh(token).await {
                Ok(session) => {
                    self.install_session(session);
                }
                Err(error) => {
                    tracing::info!(error = %error, "Stored session could not be restored");
                }
            }
        }
        self.state.write().expect("session lock").loading = false;
    }

    /// Register a new account. Installs the session immediately when the
    /// project has email confirmation disabled.
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<SignupOutcome, AuthError> {
        let outcome = self
            .auth
            .sign_up(email, password, display_name, &self.site_url)
            .await?;
        if let SignupOutcome::SignedIn(session) = &outcome {
            self.install_session(session.clone());
        }
        Ok(outcome)
    }

    /// Sign in with email/password credentials.
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionUser, AuthError> {
        let session = self.auth.sign_in(email, password).await?;
        let user = self.install_session(session);
        Ok(user)
    }

    /// Re-send the signup confirmation email.
    pub async fn resend_confirmation(&self, email: &str) -> Result<(), AuthError> {
        self.auth.resend_confirmation(email, &self.site_url).await
    }

    /// Rotate the access token using the current refresh token.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let token = self
            .state
            .read()
            .expect("session lock")
            .refresh_token
            .clone();
        let Some(token) = token else {
            return Ok(());
        };
        let session = self.auth.refresh(&token).await?;
        self.install_session(session);
        let _ = self.events.send(AuthEvent::TokenRefreshed);
        Ok(())
    }

    /// Sign out.
    ///
    /// Local state clears and `SignedOut` fires before the server
    /// round-trip, so the process ends up signed out even when the
    /// revocation fails; that failure is still propagated for the caller
    /// to surface.
    pub async fn logout(&self) -> Result<(), AuthError> {
        let access_token = {
            let mut state = self.state.write().expect("session lock");
            state.user = None;
            state.refresh_token = None;
            state.access_token.take()
        };
        self.backend.set_access_token(None);
        let _ = self.events.send(AuthEvent::SignedOut);
        match access_token {
            Some(token) => self.auth.sign_out(&token).await,
            None => Ok(()),
        }
    }

    /// The signed-in user, `None` when signed out.
    pub fn current_user(&self) -> Option<SessionUser> {
        self.state.read().expect("session lock").user.clone()
    }

    /// True until [`Self::initialize`] completes.
    pub fn is_loading(&self) -> bool {
        self.state.read().expect("session lock").loading
    }

    /// The current refresh token, for the caller to persist across runs.
    pub fn refresh_token(&self) -> Option<String> {
        self.state
            .read()
            .expect("session lock")
            .refresh_token
            .clone()
    }

    /// Subscribe to auth transitions.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    fn install_session(&self, session: AuthSession) -> SessionUser {
        let user = SessionUser {
            id: session.user.id,
            email: session.user.email.clone(),
            display_name: session.user.display_name(),
        };
        {
            let mut state = self.state.write().expect("session lock");
            state.user = Some(user.clone());
            state.refresh_token = Some(session.refresh_token);
            state.access_token = Some(session.access_token.clone());
        }
        self.backend.set_access_token(Some(session.access_token));
        let _ = self.events.send(AuthEvent::SignedIn(user.clone()));
        user
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthUser;
    use serde_json::json;

    fn context() -> SessionContext {
        // Unroutable address so the best-effort sign-out in `logout`
        // fails fast instead of waiting on a real connection.
        let config = BackendConfig {
            project_url: "http://127.0.0.1:9".into(),
            anon_key: "anon".into(),
        };
        let backend = Arc::new(BackendClient::new(&config));
        SessionContext::new(&config, backend, "http://localhost:5173/")
    }

    fn session(refresh: &str) -> AuthSession {
        AuthSession {
            access_token: "jwt".into(),
            refresh_token: refresh.into(),
            user: AuthUser {
                id: uuid::Uuid::nil(),
                email: "pat@example.com".into(),
                user_metadata: json!({ "display_name": "Pat" }),
            },
        }
    }

    #[tokio::test]
    async fn starts_loading_and_signed_out() {
        let ctx = context();
        assert!(ctx.is_loading());
        assert!(ctx.current_user().is_none());
    }

    #[tokio::test]
    async fn initialize_without_stored_token_ends_loading() {
        let ctx = context();
        ctx.initialize(None).await;
        assert!(!ctx.is_loading());
        assert!(ctx.current_user().is_none());
    }

    #[tokio::test]
    async fn install_session_updates_state_and_broadcasts() {
        let ctx = context();
        let mut events = ctx.subscribe();

        let user = ctx.install_session(session("r1"));
        assert_eq!(user.display_name, "Pat");
        assert_eq!(ctx.current_user(), Some(user.clone()));
        assert_eq!(ctx.refresh_token().as_deref(), Some("r1"));

        match events.try_recv() {
            Ok(AuthEvent::SignedIn(u)) => assert_eq!(u, user),
            other => panic!("expected SignedIn, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn logout_clears_state_and_broadcasts_before_revocation() {
        let ctx = context();
        ctx.install_session(session("r1"));
        let mut events = ctx.subscribe();

        // The unroutable auth service makes the revocation fail; local
        // state must already be gone and the error must surface.
        let result = ctx.logout().await;
        assert!(matches!(result, Err(AuthError::Request(_))));
        assert!(ctx.current_user().is_none());
        assert!(ctx.refresh_token().is_none());
        assert!(matches!(events.try_recv(), Ok(AuthEvent::SignedOut)));
    }

    #[tokio::test]
    async fn logout_without_a_session_is_ok() {
        let ctx = context();
        assert!(ctx.logout().await.is_ok());
    }
}
