//! Auth service - login, logout, identity and password reset
//!
//! Login persists the bearer token and a role marker, then updates the
//! session store. Identity checks that fail are treated as an expired
//! session: credentials and session are wiped and `None` is returned.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::client::ApiClient;
use crate::credentials::{CredentialStore, ROLE_COOKIE, TOKEN_COOKIE};
use crate::envelope::unwrap_record;
use crate::error::{ApiError, ApiResult};
use crate::notifications::NotificationStore;
use crate::session::{BackendIdentity, SessionStore, SessionUser};

pub const DEFAULT_COOKIE_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Where the page must navigate after logout. Always a full reload so no
/// in-memory state survives.
pub const LOGOUT_REDIRECT: &str = "/";

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: SessionUser,
}

#[derive(Debug, Deserialize)]
struct RawLoginResponse {
    #[serde(default, alias = "access_token")]
    token: Option<String>,
    user: BackendIdentity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogoutOutcome {
    pub redirect_to: &'static str,
}

#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
    session: SessionStore,
    notifications: NotificationStore,
    cookie_ttl: Duration,
}

impl AuthService {
    pub fn new(client: ApiClient, session: SessionStore, notifications: NotificationStore) -> Self {
        Self {
            client,
            session,
            notifications,
            cookie_ttl: DEFAULT_COOKIE_TTL,
        }
    }

    pub fn with_cookie_ttl(mut self, ttl: Duration) -> Self {
        self.cookie_ttl = ttl;
        self
    }

    fn credentials(&self) -> &Arc<dyn CredentialStore> {
        self.client.credentials()
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn token(&self) -> Option<String> {
        self.credentials().token()
    }

    /// Post credentials. Errors propagate untouched and leave the token,
    /// role marker and session exactly as they were.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<LoginResponse> {
        let raw = self
            .client
            .post("/auth/login", &json!({ "email": email, "password": password }))
            .await?;
        let parsed: RawLoginResponse = serde_json::from_value(raw)?;
        let token = parsed
            .token
            .filter(|t| !t.is_empty())
            .ok_or(ApiError::MissingToken)?;
        let user = SessionUser::from(parsed.user);

        let credentials = self.credentials();
        credentials.set(TOKEN_COOKIE, &token, self.cookie_ttl);
        credentials.set(ROLE_COOKIE, user.role.as_str(), self.cookie_ttl);
        self.session.set_user(Some(user.clone())).await;

        info!("Signed in user {} ({})", user.id, user.role);
        self.notifications
            .info(format!("Signed in as {}", display_name(&user)))
            .await;

        Ok(LoginResponse { token, user })
    }

    /// Drop credentials and session. The caller must perform a full-page
    /// navigation to [`LogoutOutcome::redirect_to`].
    pub async fn logout(&self) -> LogoutOutcome {
        self.end_session().await;
        self.notifications.info("Signed out").await;
        LogoutOutcome {
            redirect_to: LOGOUT_REDIRECT,
        }
    }

    async fn end_session(&self) {
        let credentials = self.credentials();
        credentials.remove(TOKEN_COOKIE);
        credentials.remove(ROLE_COOKIE);
        self.session.clear_user().await;
    }

    /// Fetch the identity behind the persisted token.
    ///
    /// No token: `None` without touching the network. Any failure: implicit
    /// logout, then `None`.
    pub async fn current_user(&self) -> Option<SessionUser> {
        self.token()?;

        match self.fetch_identity().await {
            Ok(user) => {
                self.session.set_user(Some(user.clone())).await;
                Some(user)
            }
            Err(e) => {
                warn!("Identity check failed, ending session: {}", e);
                self.end_session().await;
                None
            }
        }
    }

    async fn fetch_identity(&self) -> ApiResult<SessionUser> {
        let raw = self.client.get("/auth/me").await?;
        let identity: BackendIdentity = serde_json::from_value(unwrap_record(raw, &["user"]))?;
        Ok(SessionUser::from(identity))
    }

    pub async fn forgot_password(&self, email: &str) -> ApiResult<()> {
        self.client
            .post("/auth/forgot-password", &json!({ "email": email }))
            .await?;
        Ok(())
    }

    /// Never errors: anything but a 2xx means the token is unusable
    pub async fn validate_reset_token(&self, token: &str) -> bool {
        match self
            .client
            .post("/auth/validate-reset-token", &json!({ "token": token }))
            .await
        {
            Ok(_) => true,
            Err(e) => {
                debug!("Reset token rejected: {}", e);
                false
            }
        }
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> ApiResult<Value> {
        self.client
            .post(
                "/auth/reset-password",
                &json!({ "token": token, "new_password": new_password }),
            )
            .await
    }
}

fn display_name(user: &SessionUser) -> &str {
    if user.name.is_empty() {
        &user.email
    } else {
        &user.name
    }
}

/// Client-side check before a reset request is sent
pub fn validate_new_password(password: &str, confirmation: &str) -> ApiResult<()> {
    if password.is_empty() {
        return Err(ApiError::Validation("Password is required".into()));
    }
    if password != confirmation {
        return Err(ApiError::Validation("Passwords do not match".into()));
    }
    Ok(())
}
