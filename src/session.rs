//! Session store - the signed-in user's identity and role
//!
//! One instance per browser tab (or per request in the console). Holds no
//! authority of its own: the bearer token authorizes backend calls, the
//! role here only gates UI.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::credentials::CredentialStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    /// Normalize whatever the backend sent: numeric code `1`, the string
    /// `"1"` or `"admin"` mean admin; anything else is a plain user.
    pub fn from_backend(raw: &Value) -> Self {
        match raw {
            Value::Number(n) if n.as_i64() == Some(1) => Role::Admin,
            Value::String(s) if s.trim() == "1" || s.trim().eq_ignore_ascii_case("admin") => {
                Role::Admin
            }
            _ => Role::User,
        }
    }

    /// Parse the persisted role marker
    pub fn from_marker(marker: &str) -> Self {
        if marker == "admin" {
            Role::Admin
        } else {
            Role::User
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl SessionUser {
    /// Placeholder rebuilt from the role marker alone (UI gating only)
    pub fn from_marker(role: Role) -> Self {
        Self {
            id: 0,
            email: String::new(),
            name: String::new(),
            role,
        }
    }
}

/// User object as the backend sends it (`/auth/login`, `/auth/me`)
#[derive(Debug, Clone, Deserialize)]
pub struct BackendIdentity {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "username")]
    pub name: String,
    #[serde(default)]
    pub role: Value,
}

impl From<BackendIdentity> for SessionUser {
    fn from(raw: BackendIdentity) -> Self {
        Self {
            id: raw.id,
            email: raw.email,
            name: raw.name,
            role: Role::from_backend(&raw.role),
        }
    }
}

#[derive(Clone, Default)]
pub struct SessionStore {
    user: Arc<RwLock<Option<SessionUser>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user(&self) -> Option<SessionUser> {
        self.user.read().await.clone()
    }

    pub async fn set_user(&self, user: Option<SessionUser>) {
        *self.user.write().await = user;
    }

    pub async fn clear_user(&self) {
        self.set_user(None).await;
    }

    /// If nothing is in memory, rebuild a minimal session from the role
    /// marker so role-gated UI renders. Never used to authorize calls.
    pub async fn hydrate(&self, credentials: &dyn CredentialStore) -> Option<SessionUser> {
        let mut user = self.user.write().await;
        if user.is_none() {
            if let Some(marker) = credentials.role_marker() {
                *user = Some(SessionUser::from_marker(Role::from_marker(&marker)));
            }
        }
        user.clone()
    }
}
