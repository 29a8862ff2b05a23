//! Console front end
//!
//! A thin axum app over the services. Every request gets its own cookie jar
//! (seeded from the `Cookie` header), session and notification queue; any
//! credential change made while handling it leaves as `Set-Cookie` headers.
//! Notifications raised before a redirect ride along in a short-lived
//! `flash` cookie and are shown by the next page.
//!
//! Routes:
//! - GET / - landing
//! - GET|POST /signin - sign-in form
//! - GET|POST /reset-password - forgot/reset password
//! - POST /logout
//! - GET /dashboard - tabbed listings (`tab`, `page`, `limit`)
//! - GET /users - user table
//! - GET|POST /black-lists - blacklist table, add entry
//! - POST /black-lists/{id} - edit entry
//! - POST /black-lists/{id}/delete

pub mod pages;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    middleware,
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::client::ApiClient;
use crate::config::Config;
use crate::credentials::{CookieJar, CredentialStore};
use crate::envelope::PageQuery;
use crate::error::ApiResult;
use crate::guard::{self, route_guard};
use crate::notifications::{NotificationKind, NotificationStore};
use crate::services::auth::validate_new_password;
use crate::services::blacklist::BlacklistForm;
use crate::services::listings::Tab;
use crate::services::{
    AuthService, BlacklistService, EditOutcome, ListingService, UserService,
};
use crate::session::{SessionStore, SessionUser};
use pages::Layout;

const FLASH_COOKIE: &str = "flash";
const FLASH_TTL: Duration = Duration::from_secs(60);

const FORGOT_PASSWORD_SENT: &str =
    "If an account exists with this email, you will receive password reset instructions.";

#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    /// Shared connection pool for all per-request clients
    http: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.api.timeout())
            .build()?;
        Ok(Self {
            config: Arc::new(config),
            http,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[derive(Serialize, Deserialize)]
struct Flash {
    #[serde(rename = "type")]
    kind: NotificationKind,
    message: String,
}

/// Everything one request needs: its credentials, session and services
struct RequestContext {
    state: AppState,
    jar: Arc<CookieJar>,
    client: ApiClient,
    session: SessionStore,
    notifications: NotificationStore,
}

impl RequestContext {
    async fn new(state: &AppState, headers: &HeaderMap) -> Self {
        let jar = Arc::new(CookieJar::from_headers(headers));
        let credentials: Arc<dyn CredentialStore> = jar.clone();
        let client = ApiClient::with_client(
            state.http.clone(),
            &state.config.api.base_url,
            credentials,
        );
        // A role marker without a token is a leftover, not a session
        let session = SessionStore::new();
        if jar.token().is_some() {
            session.hydrate(&*jar).await;
        }

        let ctx = Self {
            state: state.clone(),
            jar,
            client,
            session,
            // The page renders once; the browser handles the display window
            notifications: NotificationStore::without_expiry(),
        };
        ctx.take_flash().await;
        ctx
    }

    /// Re-queue notifications carried over from the previous redirect
    async fn take_flash(&self) {
        let Some(raw) = self.jar.get(FLASH_COOKIE) else {
            return;
        };
        self.jar.remove(FLASH_COOKIE);
        match serde_json::from_str::<Vec<Flash>>(&raw) {
            Ok(flashes) => {
                for flash in flashes {
                    self.notifications.add(flash.kind, flash.message).await;
                }
            }
            Err(e) => tracing::debug!("Dropping unreadable flash cookie: {}", e),
        }
    }

    fn auth(&self) -> AuthService {
        AuthService::new(
            self.client.clone(),
            self.session.clone(),
            self.notifications.clone(),
        )
        .with_cookie_ttl(self.state.config.session.cookie_ttl())
    }

    fn users(&self) -> UserService {
        UserService::new(self.client.clone())
    }

    fn blacklist(&self) -> BlacklistService {
        BlacklistService::new(self.client.clone())
    }

    fn listings(&self) -> ListingService {
        ListingService::new(self.client.clone())
    }

    /// Attach pending credential changes to `response`
    fn finish(&self, response: impl IntoResponse) -> Response {
        let cookies = self
            .jar
            .take_set_cookie_headers(self.state.config.session.secure_cookies);
        (
            AppendHeaders(cookies.into_iter().map(|c| (header::SET_COOKIE, c))),
            response,
        )
            .into_response()
    }

    async fn page(&self, title: &str, content: &str) -> Response {
        let user = self.session.user().await;
        let notifications = self.notifications.list().await;
        let layout = Layout {
            title,
            user: user.as_ref(),
            notifications: &notifications,
            display_ms: self.state.config.notifications.display_ms,
        };
        self.finish(Html(layout.render(content)))
    }

    /// See-other after a form post; pending notifications go along as flash
    async fn redirect(&self, to: &str) -> Response {
        let flashes: Vec<Flash> = self
            .notifications
            .list()
            .await
            .into_iter()
            .map(|n| Flash {
                kind: n.kind,
                message: n.message,
            })
            .collect();
        if !flashes.is_empty() {
            match serde_json::to_string(&flashes) {
                Ok(json) => self.jar.set(FLASH_COOKIE, &json, FLASH_TTL),
                Err(e) => tracing::warn!("Could not carry notifications: {}", e),
            }
        }
        self.finish(Redirect::to(to))
    }

    /// Confirm the token with the backend; a rejected token ends the session
    async fn signed_in(&self) -> Option<SessionUser> {
        self.auth().current_user().await
    }
}

// =============================================================================
// Router
// =============================================================================

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing_page))
        .route("/signin", get(sign_in_page).post(sign_in_handler))
        .route("/reset-password", get(reset_password_page).post(reset_password_handler))
        .route("/logout", post(logout_handler))
        .route("/dashboard", get(dashboard_page))
        .route("/users", get(users_page))
        .route("/black-lists", get(blacklist_page).post(blacklist_create_handler))
        .route("/black-lists/{id}", post(blacklist_update_handler))
        .route("/black-lists/{id}/delete", post(blacklist_delete_handler))
        .layer(middleware::from_fn(route_guard))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Auth pages
// =============================================================================

async fn landing_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let ctx = RequestContext::new(&state, &headers).await;
    ctx.page("Welcome", &pages::landing()).await
}

async fn sign_in_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let ctx = RequestContext::new(&state, &headers).await;
    ctx.page("Sign in", &pages::sign_in_form("", None)).await
}

#[derive(Deserialize)]
struct SignInForm {
    email: String,
    password: String,
}

async fn sign_in_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<SignInForm>,
) -> Response {
    let ctx = RequestContext::new(&state, &headers).await;
    match ctx.auth().login(form.email.trim(), &form.password).await {
        Ok(_) => ctx.redirect(guard::DASHBOARD).await,
        Err(e) => {
            tracing::warn!("Sign-in failed for {}: {}", form.email, e);
            let message = e.user_message("Failed to sign in");
            ctx.page("Sign in", &pages::sign_in_form(&form.email, Some(&message)))
                .await
        }
    }
}

async fn logout_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let ctx = RequestContext::new(&state, &headers).await;
    let outcome = ctx.auth().logout().await;
    ctx.redirect(outcome.redirect_to).await
}

#[derive(Deserialize)]
struct ResetQuery {
    token: Option<String>,
}

async fn reset_password_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ResetQuery>,
) -> Response {
    let ctx = RequestContext::new(&state, &headers).await;
    let content = match query.token.filter(|t| !t.is_empty()) {
        Some(token) => {
            if ctx.auth().validate_reset_token(&token).await {
                pages::new_password_form(&token, None)
            } else {
                pages::forgot_password_form(
                    None,
                    Some("This reset link is invalid or has expired."),
                )
            }
        }
        None => pages::forgot_password_form(None, None),
    };
    ctx.page("Reset password", &content).await
}

#[derive(Deserialize)]
struct ResetForm {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    password: String,
    #[serde(default)]
    confirm: String,
}

async fn reset_password_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<ResetForm>,
) -> Response {
    let ctx = RequestContext::new(&state, &headers).await;
    let auth = ctx.auth();

    let content = match form.token.filter(|t| !t.is_empty()) {
        Some(token) => {
            let result = match validate_new_password(&form.password, &form.confirm) {
                Ok(()) => auth.reset_password(&token, &form.password).await.map(|_| ()),
                Err(e) => Err(e),
            };
            match result {
                Ok(()) => {
                    ctx.notifications.success("Password has been reset").await;
                    pages::reset_done()
                }
                Err(e) => {
                    pages::new_password_form(&token, Some(&e.user_message("Something went wrong")))
                }
            }
        }
        None => {
            let email = form.email.unwrap_or_default();
            match auth.forgot_password(email.trim()).await {
                Ok(()) => pages::forgot_password_form(Some(FORGOT_PASSWORD_SENT), None),
                Err(e) => pages::forgot_password_form(
                    None,
                    Some(&e.user_message("Something went wrong")),
                ),
            }
        }
    };
    ctx.page("Reset password", &content).await
}

// =============================================================================
// Protected pages
// =============================================================================

#[derive(Deserialize, Default)]
struct ListQuery {
    tab: Option<String>,
    page: Option<u32>,
    limit: Option<u32>,
}

impl ListQuery {
    /// Paging is only forwarded when the caller asked for it
    fn page_query(&self) -> Option<PageQuery> {
        if self.page.is_none() && self.limit.is_none() {
            return None;
        }
        Some(PageQuery::new(self.page.unwrap_or(1), self.limit.unwrap_or(10)))
    }
}

async fn dashboard_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response {
    let ctx = RequestContext::new(&state, &headers).await;
    if ctx.signed_in().await.is_none() {
        return ctx.redirect(guard::HOME).await;
    }
    let tab = query
        .tab
        .as_deref()
        .and_then(Tab::from_slug)
        .unwrap_or_default();
    let rows = ctx.listings().tab_rows(tab, query.page_query()).await;
    ctx.page("Dashboard", &pages::dashboard(tab, &rows)).await
}

async fn users_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response {
    let ctx = RequestContext::new(&state, &headers).await;
    if ctx.signed_in().await.is_none() {
        return ctx.redirect(guard::HOME).await;
    }
    let users = ctx.users().list(query.page_query()).await;
    ctx.page("Users", &pages::users(&users)).await
}

async fn blacklist_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response {
    let ctx = RequestContext::new(&state, &headers).await;
    if ctx.signed_in().await.is_none() {
        return ctx.redirect(guard::HOME).await;
    }
    render_blacklist(&ctx, query.page_query()).await
}

async fn render_blacklist(ctx: &RequestContext, query: Option<PageQuery>) -> Response {
    let entries = ctx.blacklist().list(query).await;
    ctx.page("Blacklist", &pages::blacklist(&entries)).await
}

async fn blacklist_create_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<BlacklistForm>,
) -> Response {
    let ctx = RequestContext::new(&state, &headers).await;
    let plate = form.plate_number.trim().to_string();
    match ctx.blacklist().create(&form.into_create()).await {
        Some(entry) => {
            ctx.notifications
                .success(format!("{} added to the blacklist", entry.plate_number))
                .await;
        }
        None => {
            ctx.notifications
                .error(format!("Failed to add {} to the blacklist", plate))
                .await;
        }
    }
    render_blacklist(&ctx, None).await
}

async fn blacklist_update_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Form(form): Form<BlacklistForm>,
) -> Response {
    let ctx = RequestContext::new(&state, &headers).await;
    let service = ctx.blacklist();
    match service.get(id).await {
        Some(original) => match service.edit(&original, &form).await {
            EditOutcome::Unchanged => {
                ctx.notifications.info("No changes to save").await;
            }
            EditOutcome::Updated(entry) => {
                ctx.notifications
                    .success(format!("{} updated", entry.plate_number))
                    .await;
            }
            EditOutcome::Failed => {
                ctx.notifications
                    .error("Failed to update blacklist entry")
                    .await;
            }
        },
        None => {
            ctx.notifications.error("Blacklist entry not found").await;
        }
    }
    render_blacklist(&ctx, None).await
}

async fn blacklist_delete_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let ctx = RequestContext::new(&state, &headers).await;
    if ctx.blacklist().delete(id).await {
        ctx.notifications.success("Blacklist entry deleted").await;
    } else {
        ctx.notifications
            .error("Failed to delete blacklist entry")
            .await;
    }
    render_blacklist(&ctx, None).await
}
