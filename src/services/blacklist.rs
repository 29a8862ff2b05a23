//! Plate blacklist service (`/blacklist/`)

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{or_log, EditOutcome};
use crate::client::ApiClient;
use crate::envelope::{decode_page, decode_record, Page, PageQuery};

const RECORD_KEYS: &[&str] = &["blacklist"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlacklistUser {
    pub id: i64,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlacklistEntry {
    pub id: i64,
    pub plate_number: String,
    pub added_by: Option<BlacklistUser>,
    pub create_at: Option<String>,
    pub reason: Option<String>,
    /// Always capitalized ("Active", "Inactive", ...)
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    id: i64,
    #[serde(default)]
    plate_number: String,
    #[serde(default)]
    added_by: Option<BlacklistUser>,
    #[serde(default)]
    create_at: Option<String>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    status: Value,
}

/// "inactive" -> "Inactive"; missing, empty or non-string -> "Active"
pub fn normalize_status(raw: &Value) -> String {
    match raw.as_str().map(str::trim).filter(|s| !s.is_empty()) {
        Some(status) => {
            let mut chars = status.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => "Active".to_string(),
            }
        }
        None => "Active".to_string(),
    }
}

impl From<RawEntry> for BlacklistEntry {
    fn from(raw: RawEntry) -> Self {
        Self {
            id: raw.id,
            plate_number: raw.plate_number,
            added_by: raw.added_by,
            create_at: raw.create_at,
            reason: raw.reason,
            status: normalize_status(&raw.status),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlacklistDto {
    pub plate_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBlacklistDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plate_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Values from the add/edit dialog
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlacklistForm {
    pub plate_number: String,
    #[serde(default)]
    pub reason: String,
    pub status: String,
}

impl BlacklistForm {
    pub fn from_entry(entry: &BlacklistEntry) -> Self {
        Self {
            plate_number: entry.plate_number.clone(),
            reason: entry.reason.clone().unwrap_or_default(),
            status: entry.status.clone(),
        }
    }

    pub fn into_create(self) -> CreateBlacklistDto {
        CreateBlacklistDto {
            plate_number: self.plate_number.trim().to_string(),
            reason: Some(self.reason).filter(|r| !r.trim().is_empty()),
            status: Some(self.status).filter(|s| !s.is_empty()),
        }
    }
}

impl UpdateBlacklistDto {
    /// Only the fields the form actually changed. A missing reason on the
    /// original compares equal to an empty reason in the form.
    pub fn diff(original: &BlacklistEntry, form: &BlacklistForm) -> Self {
        let changed = |before: &str, after: &str| (before != after).then(|| after.to_string());
        Self {
            plate_number: changed(&original.plate_number, &form.plate_number),
            reason: changed(original.reason.as_deref().unwrap_or(""), &form.reason),
            status: changed(&original.status, &form.status),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Clone)]
pub struct BlacklistService {
    client: ApiClient,
}

impl BlacklistService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, query: Option<PageQuery>) -> Page<BlacklistEntry> {
        let result = async {
            let raw = match query {
                Some(q) => self.client.get_query("/blacklist/", &q).await?,
                None => self.client.get("/blacklist/").await?,
            };
            decode_page::<RawEntry>(raw, &[])
        }
        .await;
        or_log(result, "fetch blacklists")
            .map(|page| page.map(BlacklistEntry::from))
            .unwrap_or_default()
    }

    pub async fn get(&self, id: i64) -> Option<BlacklistEntry> {
        let result = async {
            let raw = self.client.get(&format!("/blacklist/{}", id)).await?;
            decode_record::<RawEntry>(raw, RECORD_KEYS)
        }
        .await;
        or_log(result, "fetch blacklist entry").map(BlacklistEntry::from)
    }

    pub async fn create(&self, dto: &CreateBlacklistDto) -> Option<BlacklistEntry> {
        let result = async {
            let raw = self.client.post("/blacklist/", dto).await?;
            decode_record::<RawEntry>(raw, RECORD_KEYS)
        }
        .await;
        or_log(result, "create blacklist entry").map(BlacklistEntry::from)
    }

    pub async fn update(&self, id: i64, dto: &UpdateBlacklistDto) -> Option<BlacklistEntry> {
        let raw = or_log(
            self.client.put(&format!("/blacklist/{}", id), dto).await,
            "update blacklist entry",
        )?;
        match decode_record::<RawEntry>(raw, RECORD_KEYS) {
            Ok(entry) => Some(BlacklistEntry::from(entry)),
            Err(_) => self.get(id).await,
        }
    }

    /// Diff `form` against `original`; an untouched form sends nothing
    pub async fn edit(&self, original: &BlacklistEntry, form: &BlacklistForm) -> EditOutcome<BlacklistEntry> {
        let dto = UpdateBlacklistDto::diff(original, form);
        if dto.is_empty() {
            tracing::debug!("Blacklist entry {} unchanged, skipping update", original.id);
            return EditOutcome::Unchanged;
        }
        match self.update(original.id, &dto).await {
            Some(entry) => EditOutcome::Updated(entry),
            None => EditOutcome::Failed,
        }
    }

    pub async fn delete(&self, id: i64) -> bool {
        or_log(
            self.client.delete(&format!("/blacklist/{}", id)).await,
            "delete blacklist entry",
        )
        .is_some()
    }
}
