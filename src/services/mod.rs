//! Resource services
//!
//! One adapter per backend resource. Apart from the auth flows, services
//! never return errors: failures are logged and turned into a fallback
//! (`None`, `false`, an empty page) so the caller always gets something
//! it can render and the action stays retryable.

pub mod auth;
pub mod blacklist;
pub mod listings;
pub mod users;
pub mod video;

pub use auth::AuthService;
pub use blacklist::BlacklistService;
pub use listings::ListingService;
pub use users::UserService;
pub use video::VideoService;

use crate::error::ApiResult;

/// Result of submitting an edit form against the record it was opened from
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome<T> {
    /// Nothing changed; no request was sent
    Unchanged,
    Updated(T),
    Failed,
}

impl<T> EditOutcome<T> {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, EditOutcome::Unchanged)
    }
}

/// Log a failed call as "Failed to <what>" and drop the error
pub(crate) fn or_log<T>(result: ApiResult<T>, what: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::error!("Failed to {}: {}", what, e);
            None
        }
    }
}
