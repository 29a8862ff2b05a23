//! Response-envelope normalization
//!
//! Backend list endpoints answer in one of three shapes:
//!
//! ```text
//! [ ... ]                                  bare array
//! { "data": [ ... ] }                      wrapped, no paging metadata
//! { "data": [ ... ], "pagination": {..} }  paginated
//! ```
//!
//! plus resource-specific keys such as `{ "users": [ ... ] }`. Single-record
//! endpoints may wrap the record in `data` or a resource key. All shape
//! sniffing lives here; services hand in the raw JSON and get typed values.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

/// `page` / `limit` forwarded verbatim as query parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: u32,
    pub limit: u32,
}

impl PageQuery {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub pages: u32,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub limit: u32,
}

/// A normalized list response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Present only when the backend sent paging metadata
    pub pagination: Option<Pagination>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            pagination: None,
        }
    }
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

/// Split a list payload into its raw items and optional pagination.
///
/// `keys` are resource-specific array keys tried after `data`.
pub fn split_list(value: Value, keys: &[&str]) -> ApiResult<(Vec<Value>, Option<Pagination>)> {
    let mut object = match value {
        Value::Array(items) => return Ok((items, None)),
        Value::Object(object) => object,
        Value::Null => return Ok((Vec::new(), None)),
        other => {
            return Err(ApiError::Decode(format!(
                "expected a list envelope, got {}",
                json_kind(&other)
            )))
        }
    };

    let pagination = match object.remove("pagination") {
        Some(Value::Null) | None => None,
        Some(raw) => Some(serde_json::from_value(raw)?),
    };

    let items = std::iter::once("data")
        .chain(keys.iter().copied())
        .find_map(|key| match object.remove(key) {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        })
        .unwrap_or_default();

    Ok((items, pagination))
}

/// Decode a list payload, skipping items that do not fit `T`
pub fn decode_page<T: DeserializeOwned>(value: Value, keys: &[&str]) -> ApiResult<Page<T>> {
    let (raw, pagination) = split_list(value, keys)?;
    let mut items = Vec::with_capacity(raw.len());
    for item in raw {
        match serde_json::from_value(item) {
            Ok(decoded) => items.push(decoded),
            Err(e) => tracing::warn!("Skipping malformed list item: {}", e),
        }
    }
    Ok(Page { items, pagination })
}

/// Unwrap a single record from `data`, one of `keys`, or the payload itself
pub fn unwrap_record(value: Value, keys: &[&str]) -> Value {
    let Value::Object(mut object) = value else {
        return value;
    };
    for key in std::iter::once("data").chain(keys.iter().copied()) {
        if let Some(inner @ Value::Object(_)) = object.remove(key) {
            return inner;
        }
    }
    Value::Object(object)
}

pub fn decode_record<T: DeserializeOwned>(value: Value, keys: &[&str]) -> ApiResult<T> {
    match unwrap_record(value, keys) {
        Value::Null => Err(ApiError::Decode("empty record".into())),
        record => Ok(serde_json::from_value(record)?),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
