//! Persisted client credentials
//!
//! Two cookies survive between page loads: `token` (opaque bearer string)
//! and `role` (`"admin"`/`"user"`, only used to gate UI). Both are written
//! with an absolute expiry, `Path=/` and `SameSite=Strict`, rendered and
//! parsed with the `cookie` crate.
//!
//! [`CookieJar`] is the in-process store: seeded from a request `Cookie`
//! header, mutated by the auth flow, and drained into `Set-Cookie` headers.

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};
use cookie::time::OffsetDateTime;
use cookie::{Cookie, SameSite};
use std::collections::HashMap;
use std::sync::{Mutex, RwLock};
use std::time::Duration;

pub const TOKEN_COOKIE: &str = "token";
pub const ROLE_COOKIE: &str = "role";

/// Storage for the credential cookies.
///
/// Writes are last-writer-wins; nothing here validates the token.
pub trait CredentialStore: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&self, name: &str, value: &str, ttl: Duration);
    fn remove(&self, name: &str);

    fn token(&self) -> Option<String> {
        self.get(TOKEN_COOKIE).filter(|t| !t.is_empty())
    }

    fn role_marker(&self) -> Option<String> {
        self.get(ROLE_COOKIE).filter(|r| !r.is_empty())
    }
}

#[derive(Debug, Clone)]
struct StoredCookie {
    value: String,
    /// None for cookies that arrived on a request (the browser already
    /// enforces their expiry)
    expires: Option<DateTime<Utc>>,
}

/// A change that still has to reach the browser
#[derive(Debug, Clone, PartialEq)]
pub enum CookieChange {
    Set {
        name: String,
        value: String,
        expires: DateTime<Utc>,
    },
    Remove {
        name: String,
    },
}

impl CookieChange {
    pub fn to_cookie(&self, secure: bool) -> Cookie<'static> {
        match self {
            CookieChange::Set {
                name,
                value,
                expires,
            } => Cookie::build((name.clone(), value.clone()))
                .expires(offset_date_time(expires))
                .path("/")
                .same_site(SameSite::Strict)
                .secure(secure)
                .build(),
            CookieChange::Remove { name } => Cookie::build((name.clone(), String::new()))
                .expires(OffsetDateTime::UNIX_EPOCH)
                .path("/")
                .secure(secure)
                .build(),
        }
    }

    /// Render as a `Set-Cookie` header value (value percent-encoded)
    pub fn to_header(&self, secure: bool) -> String {
        self.to_cookie(secure).encoded().to_string()
    }
}

fn offset_date_time(at: &DateTime<Utc>) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(at.timestamp()).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

/// Parse a request `Cookie` header into name/value pairs. Values are
/// percent-decoded and stripped of surrounding quotes; later duplicates win.
pub fn parse_cookie_header(header: &str) -> HashMap<String, String> {
    Cookie::split_parse_encoded(header)
        .filter_map(|cookie| match cookie {
            Ok(cookie) => Some((
                cookie.name().to_string(),
                cookie.value_trimmed().to_string(),
            )),
            Err(e) => {
                tracing::trace!("Skipping malformed cookie: {}", e);
                None
            }
        })
        .collect()
}

/// Cookies from every `Cookie` header on a request
pub fn request_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(parse_cookie_header)
        .collect()
}

#[derive(Default)]
pub struct CookieJar {
    cookies: RwLock<HashMap<String, StoredCookie>>,
    pending: Mutex<Vec<CookieChange>>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from the cookies a request carried
    pub fn from_cookie_header(header: &str) -> Self {
        Self::seeded(parse_cookie_header(header))
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self::seeded(request_cookies(headers))
    }

    fn seeded(cookies: HashMap<String, String>) -> Self {
        let cookies = cookies
            .into_iter()
            .map(|(name, value)| {
                (
                    name,
                    StoredCookie {
                        value,
                        expires: None,
                    },
                )
            })
            .collect();
        Self {
            cookies: RwLock::new(cookies),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Expiry recorded for a cookie written through this jar
    pub fn expires_at(&self, name: &str) -> Option<DateTime<Utc>> {
        let cookies = self.cookies.read().ok()?;
        cookies.get(name).and_then(|c| c.expires)
    }

    /// Drain changes made since the jar was created (or last drained)
    pub fn take_changes(&self) -> Vec<CookieChange> {
        match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(_) => Vec::new(),
        }
    }

    pub fn take_set_cookie_headers(&self, secure: bool) -> Vec<String> {
        self.take_changes()
            .iter()
            .map(|c| c.to_header(secure))
            .collect()
    }

    fn record(&self, change: CookieChange) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.push(change);
        }
    }
}

impl CredentialStore for CookieJar {
    fn get(&self, name: &str) -> Option<String> {
        let cookies = self.cookies.read().ok()?;
        let cookie = cookies.get(name)?;
        match cookie.expires {
            Some(expires) if expires <= Utc::now() => None,
            _ => Some(cookie.value.clone()),
        }
    }

    fn set(&self, name: &str, value: &str, ttl: Duration) {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::zero());
        let expires = Utc::now() + ttl;
        if let Ok(mut cookies) = self.cookies.write() {
            cookies.insert(
                name.to_string(),
                StoredCookie {
                    value: value.to_string(),
                    expires: Some(expires),
                },
            );
        }
        self.record(CookieChange::Set {
            name: name.to_string(),
            value: value.to_string(),
            expires,
        });
    }

    fn remove(&self, name: &str) {
        if let Ok(mut cookies) = self.cookies.write() {
            cookies.remove(name);
        }
        self.record(CookieChange::Remove {
            name: name.to_string(),
        });
    }
}
