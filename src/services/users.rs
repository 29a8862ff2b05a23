//! User management service (`/users/`)

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};

use super::{or_log, EditOutcome};
use crate::client::ApiClient;
use crate::envelope::{decode_page, decode_record, Page, PageQuery};
use crate::error::ApiResult;

/// Numeric role code the backend expects on writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    User = 0,
    Admin = 1,
}

impl UserRole {
    /// Map a display label ("Admin"/"User") back to the wire code
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(UserRole::Admin),
            "user" => Some(UserRole::User),
            _ => None,
        }
    }
}

impl Serialize for UserRole {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Display label: "Admin", "User", or whatever the backend sent
    pub role: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
struct BackendUser {
    id: i64,
    #[serde(default, alias = "name")]
    username: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    role: Value,
    #[serde(default)]
    status: Option<String>,
}

fn role_label(raw: &Value) -> String {
    match raw {
        Value::Number(n) if n.as_i64() == Some(1) => "Admin".to_string(),
        Value::Number(n) if n.as_i64() == Some(2) => "User".to_string(),
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl From<BackendUser> for User {
    fn from(raw: BackendUser) -> Self {
        Self {
            id: raw.id,
            name: raw.username,
            email: raw.email,
            role: role_label(&raw.role),
            status: raw
                .status
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "Active".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateUserDto {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateUserDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Values from the edit dialog
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserForm {
    pub name: String,
    pub email: String,
    pub role: String,
    pub status: String,
    /// Empty leaves the password alone
    #[serde(default)]
    pub password: String,
}

impl UserForm {
    pub fn from_user(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            status: user.status.clone(),
            password: String::new(),
        }
    }
}

impl UpdateUserDto {
    /// Only the fields the form actually changed
    pub fn diff(original: &User, form: &UserForm) -> Self {
        let changed = |before: &str, after: &str| (before != after).then(|| after.to_string());
        Self {
            username: changed(&original.name, &form.name),
            email: changed(&original.email, &form.email),
            password: (!form.password.is_empty()).then(|| form.password.clone()),
            role: if original.role.eq_ignore_ascii_case(&form.role) {
                None
            } else {
                UserRole::from_label(&form.role)
            },
            status: changed(&original.status, &form.status),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Clone)]
pub struct UserService {
    client: ApiClient,
}

impl UserService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: Option<PageQuery>) -> Page<User> {
        let result = async {
            let raw = match query {
                Some(q) => self.client.get_query("/users/", &q).await?,
                None => self.client.get("/users/").await?,
            };
            decode_page::<BackendUser>(raw, &["users"])
        }
        .await;
        or_log(result, "fetch users")
            .map(|page| page.map(User::from))
            .unwrap_or_default()
    }

    pub async fn get(&self, id: i64) -> Option<User> {
        let result = async {
            let raw = self.client.get(&format!("/users/{}", id)).await?;
            decode_record::<BackendUser>(raw, &["user"])
        }
        .await;
        or_log(result, "fetch user").map(User::from)
    }

    pub async fn create(&self, dto: &CreateUserDto) -> Option<User> {
        let result = async {
            let raw = self.client.post("/users/", dto).await?;
            decode_record::<BackendUser>(raw, &["user"])
        }
        .await;
        or_log(result, "create user").map(User::from)
    }

    pub async fn update(&self, id: i64, dto: &UpdateUserDto) -> Option<User> {
        let raw = or_log(
            self.client.put(&format!("/users/{}", id), dto).await,
            "update user",
        )?;
        match decode_record::<BackendUser>(raw, &["user"]) {
            Ok(user) => Some(User::from(user)),
            // Accepted, but the body is not a user; read it back
            Err(_) => self.get(id).await,
        }
    }

    /// Diff `form` against `original` and send only what changed
    pub async fn edit(&self, original: &User, form: &UserForm) -> EditOutcome<User> {
        let dto = UpdateUserDto::diff(original, form);
        if dto.is_empty() {
            return EditOutcome::Unchanged;
        }
        match self.update(original.id, &dto).await {
            Some(user) => EditOutcome::Updated(user),
            None => EditOutcome::Failed,
        }
    }

    pub async fn delete(&self, id: i64) -> bool {
        or_log(
            self.client.delete(&format!("/users/{}", id)).await,
            "delete user",
        )
        .is_some()
    }

    /// Change the signed-in user's own password. Errors are returned so the
    /// form can show the backend's message.
    pub async fn reset_own_password(&self, current: &str, new_password: &str) -> ApiResult<()> {
        self.client
            .post(
                "/users/me/reset-password",
                &json!({ "current_password": current, "new_password": new_password }),
            )
            .await?;
        Ok(())
    }
}
