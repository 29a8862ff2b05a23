//! Resource service integration tests
//!
//! User, blacklist, listing and video services against the mock backend:
//! paging passthrough, envelope tolerance, diff-based edits, bearer headers
//! and the fallback values returned on failure.

mod mock_servers;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use lpr_console::client::ApiClient;
use lpr_console::credentials::{CookieJar, CredentialStore};
use lpr_console::envelope::{PageQuery, Pagination};
use lpr_console::services::blacklist::{BlacklistForm, UpdateBlacklistDto};
use lpr_console::services::users::{UserForm, UserRole, CreateUserDto};
use lpr_console::services::{
    BlacklistService, EditOutcome, ListingService, UserService, VideoService,
};
use mock_servers::MockBackend;

fn client(backend: &MockBackend, token: Option<&str>) -> ApiClient {
    let jar = match token {
        Some(t) => CookieJar::from_cookie_header(&format!("token={}; role=admin", t)),
        None => CookieJar::new(),
    };
    let credentials: Arc<dyn CredentialStore> = Arc::new(jar);
    ApiClient::new(&backend.base_url(), Duration::from_secs(5), credentials).unwrap()
}

fn stolen_entry() -> serde_json::Value {
    json!({
        "id": 1,
        "plateNumber": "242-565-14",
        "addedBy": {"id": 1, "username": "admin"},
        "createAt": "Tue, 13 May 2025 05:56:15 GMT",
        "reason": "Stolen vehicle",
        "status": "active"
    })
}

// =============================================================================
// Listings
// =============================================================================

#[tokio::test]
async fn paging_is_passed_through_and_reflected() {
    let backend = MockBackend::start().await;
    backend
        .respond(
            "GET",
            "/events",
            200,
            json!({
                "data": [{"id": 11, "type": "entry"}, {"id": 12, "type": "exit"}],
                "pagination": {"page": 2, "pages": 5, "total": 48, "limit": 10}
            }),
        )
        .await;
    let listings = ListingService::new(client(&backend, Some("jwt")));

    let page = listings.events(Some(PageQuery::new(2, 10))).await;
    assert_eq!(page.len(), 2);
    assert_eq!(
        page.pagination,
        Some(Pagination {
            page: 2,
            pages: 5,
            total: 48,
            limit: 10
        })
    );

    let sent = backend.requests_to("GET", "/events").await;
    assert_eq!(sent[0].query.as_deref(), Some("page=2&limit=10"));
    assert_eq!(sent[0].authorization.as_deref(), Some("Bearer jwt"));

    backend.stop().await;
}

#[tokio::test]
async fn every_envelope_shape_is_tolerated() {
    let backend = MockBackend::start().await;
    backend
        .respond("GET", "/license-plates", 200, json!({"data": [{"id": 1, "plateNumber": "A-1"}]}))
        .await;
    backend
        .respond("GET", "/vehicles", 200, json!([{"id": 2, "make": "Toyota"}]))
        .await;
    backend
        .respond(
            "GET",
            "/cameras",
            200,
            json!({"data": [{"id": 3, "name": "Gate"}], "pagination": {"page": 1, "pages": 1, "total": 1, "limit": 10}}),
        )
        .await;
    let listings = ListingService::new(client(&backend, Some("jwt")));

    let plates = listings.license_plates(None).await;
    assert_eq!(plates.items[0].plate_number.as_deref(), Some("A-1"));
    assert!(plates.pagination.is_none());

    let vehicles = listings.vehicles(None).await;
    assert_eq!(vehicles.items[0].make.as_deref(), Some("Toyota"));

    let cameras = listings.cameras(None).await;
    assert_eq!(cameras.items[0].name.as_deref(), Some("Gate"));
    assert!(cameras.pagination.is_some());

    // no paging requested, none forwarded
    let sent = backend.requests_to("GET", "/vehicles").await;
    assert!(sent[0].query.is_none());

    backend.stop().await;
}

#[tokio::test]
async fn listing_failure_yields_empty_page() {
    let backend = MockBackend::start().await;
    backend
        .respond("GET", "/drivers", 500, json!({"message": "boom"}))
        .await;
    let listings = ListingService::new(client(&backend, Some("jwt")));

    let drivers = listings.drivers(None).await;
    assert!(drivers.is_empty());
    assert!(drivers.pagination.is_none());

    backend.stop().await;
}

// =============================================================================
// Users
// =============================================================================

#[tokio::test]
async fn users_are_normalized() {
    let backend = MockBackend::start().await;
    backend
        .respond(
            "GET",
            "/users/",
            200,
            json!({"users": [
                {"id": 1, "username": "admin", "email": "admin@example.com", "role": 1, "status": "Active"},
                {"id": 2, "username": "officer", "email": "o@example.com", "role": 2}
            ]}),
        )
        .await;
    let users = UserService::new(client(&backend, Some("jwt")));

    let page = users.list(None).await;
    assert_eq!(page.len(), 2);
    assert_eq!(page.items[0].role, "Admin");
    assert_eq!(page.items[1].name, "officer");
    assert_eq!(page.items[1].role, "User");
    assert_eq!(page.items[1].status, "Active");

    backend.stop().await;
}

#[tokio::test]
async fn user_edit_sends_only_changed_fields() {
    let backend = MockBackend::start().await;
    backend
        .respond(
            "PUT",
            "/users/2",
            200,
            json!({"data": {"id": 2, "username": "officer", "email": "new@example.com", "role": 2}}),
        )
        .await;
    let users = UserService::new(client(&backend, Some("jwt")));

    let original = lpr_console::services::users::User {
        id: 2,
        name: "officer".into(),
        email: "o@example.com".into(),
        role: "User".into(),
        status: "Active".into(),
    };

    let unchanged = users.edit(&original, &UserForm::from_user(&original)).await;
    assert!(unchanged.is_unchanged());
    assert_eq!(backend.request_count().await, 0);

    let mut form = UserForm::from_user(&original);
    form.email = "new@example.com".into();
    match users.edit(&original, &form).await {
        EditOutcome::Updated(user) => assert_eq!(user.email, "new@example.com"),
        other => panic!("unexpected {:?}", other),
    }
    let sent = backend.requests_to("PUT", "/users/2").await;
    assert_eq!(sent[0].json(), json!({"email": "new@example.com"}));

    backend.stop().await;
}

#[tokio::test]
async fn user_create_and_delete_fallbacks() {
    let backend = MockBackend::start().await;
    backend
        .respond("POST", "/users/", 400, json!({"message": "Email already exists"}))
        .await;
    backend.respond("DELETE", "/users/9", 200, json!(null)).await;
    let users = UserService::new(client(&backend, Some("jwt")));

    let dto = CreateUserDto {
        username: "dup".into(),
        email: "dup@example.com".into(),
        password: "pw".into(),
        role: Some(UserRole::User),
        status: None,
    };
    assert!(users.create(&dto).await.is_none());
    assert_eq!(
        backend.requests_to("POST", "/users/").await[0].json()["role"],
        json!(0)
    );

    assert!(users.delete(9).await);
    assert!(!users.delete(10).await);

    backend.stop().await;
}

#[tokio::test]
async fn own_password_reset_surfaces_message() {
    let backend = MockBackend::start().await;
    backend
        .respond(
            "POST",
            "/users/me/reset-password",
            400,
            json!({"message": "Current password is incorrect"}),
        )
        .await;
    let users = UserService::new(client(&backend, Some("jwt")));

    let err = users.reset_own_password("old", "new").await.unwrap_err();
    assert_eq!(
        err.user_message("Something went wrong"),
        "Current password is incorrect"
    );

    backend.stop().await;
}

// =============================================================================
// Blacklist
// =============================================================================

#[tokio::test]
async fn blacklist_list_capitalizes_status() {
    let backend = MockBackend::start().await;
    backend
        .respond(
            "GET",
            "/blacklist/",
            200,
            json!({"data": [stolen_entry(), {"id": 2, "plateNumber": "123-456-78"}]}),
        )
        .await;
    let blacklist = BlacklistService::new(client(&backend, Some("jwt")));

    let page = blacklist.list(None).await;
    assert_eq!(page.items[0].status, "Active");
    assert_eq!(page.items[1].status, "Active");
    assert_eq!(
        page.items[0].added_by.as_ref().map(|u| u.username.as_str()),
        Some("admin")
    );

    backend.stop().await;
}

#[tokio::test]
async fn unchanged_blacklist_edit_sends_nothing() {
    let backend = MockBackend::start().await;
    backend
        .respond("GET", "/blacklist/1", 200, json!({"blacklist": stolen_entry()}))
        .await;
    let blacklist = BlacklistService::new(client(&backend, Some("jwt")));

    let original = blacklist.get(1).await.unwrap();
    let before = backend.request_count().await;

    let outcome = blacklist
        .edit(&original, &BlacklistForm::from_entry(&original))
        .await;
    assert_eq!(outcome, EditOutcome::Unchanged);
    assert_eq!(backend.request_count().await, before);

    backend.stop().await;
}

#[tokio::test]
async fn blacklist_edit_reads_back_when_body_is_not_a_record() {
    let backend = MockBackend::start().await;
    backend
        .respond("GET", "/blacklist/1", 200, json!({"data": stolen_entry()}))
        .await;
    backend
        .respond("PUT", "/blacklist/1", 200, json!(null))
        .await;
    let blacklist = BlacklistService::new(client(&backend, Some("jwt")));

    let original = blacklist.get(1).await.unwrap();
    let form = BlacklistForm {
        status: "Inactive".into(),
        ..BlacklistForm::from_entry(&original)
    };
    assert_eq!(
        UpdateBlacklistDto::diff(&original, &form).status.as_deref(),
        Some("Inactive")
    );

    let outcome = blacklist.edit(&original, &form).await;
    assert!(matches!(outcome, EditOutcome::Updated(_)));

    let put = backend.requests_to("PUT", "/blacklist/1").await;
    assert_eq!(put[0].json(), json!({"status": "Inactive"}));
    assert_eq!(put[0].authorization.as_deref(), Some("Bearer jwt"));
    assert_eq!(backend.requests_to("GET", "/blacklist/1").await.len(), 2);

    backend.stop().await;
}

#[tokio::test]
async fn blacklist_failures_fall_back() {
    let backend = MockBackend::start().await;
    let blacklist = BlacklistService::new(client(&backend, None));

    assert!(blacklist.list(None).await.is_empty());
    assert!(blacklist.get(42).await.is_none());
    assert!(!blacklist.delete(42).await);

    // no token, no header
    let sent = backend.requests().await;
    assert_eq!(sent.len(), 3);
    assert!(sent.iter().all(|r| r.authorization.is_none()));

    backend.stop().await;
}

// =============================================================================
// Video
// =============================================================================

#[tokio::test]
async fn upload_uses_multipart_field_and_process_encodes_filename() {
    let backend = MockBackend::start().await;
    backend
        .respond(
            "POST",
            "/video/upload",
            200,
            json!({"filename": "gate cam.mp4", "thumbnail": "/thumbs/gate.jpg"}),
        )
        .await;
    backend
        .respond(
            "POST",
            "/video/process/gate%20cam.mp4",
            200,
            json!({"filename": "gate cam.mp4", "image": "/results/gate.jpg"}),
        )
        .await;
    let video = VideoService::new(client(&backend, Some("jwt")));

    let uploaded = video
        .upload_video("gate cam.mp4", b"fake-mp4".to_vec())
        .await
        .unwrap();
    assert_eq!(uploaded.thumbnail.as_deref(), Some("/thumbs/gate.jpg"));

    let upload = backend.requests_to("POST", "/video/upload").await;
    assert!(upload[0]
        .content_type
        .as_deref()
        .unwrap_or_default()
        .starts_with("multipart/form-data"));
    assert!(upload[0].body_text().contains(r#"name="video""#));

    let processed = video
        .process_video(uploaded.filename.as_deref().unwrap())
        .await
        .unwrap();
    assert_eq!(processed.image.as_deref(), Some("/results/gate.jpg"));

    // unknown image: fallback
    assert!(video.process_image("missing.jpg").await.is_none());

    backend.stop().await;
}
