use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use useradmin::api::AppState;
use useradmin::config::{Config, SecurityConfig};

/// admin:admin
const ADMIN_AUTH: &str = "Basic YWRtaW46YWRtaW4=";

/// admin:wrong
const WRONG_AUTH: &str = "Basic YWRtaW46d3Jvbmc=";

fn test_config() -> Config {
    let db_path = std::env::temp_dir().join(format!(
        "useradmin-api-test-{}.db",
        uuid::Uuid::new_v4()
    ));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.security = SecurityConfig {
        argon2_memory_cost_kib: 1024,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
    };
    config
}

async fn spawn_app() -> (Arc<AppState>, Router) {
    let state = useradmin::api::create_app_state(&test_config(), None)
        .await
        .expect("Failed to create app state");
    let router = useradmin::api::router(state.clone());
    (state, router)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

fn json_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

#[tokio::test]
async fn test_end_to_end_scenario() {
    let (_state, app) = spawn_app().await;
    let alice = json!({"username": "alice", "password": "p1"});

    let (status, body) = send(&app, "POST", "/users", Some(ADMIN_AUTH), Some(alice.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json_body(&body), json!({"id": 1, "username": "alice"}));

    let (status, _) = send(&app, "POST", "/users", Some(ADMIN_AUTH), Some(alice)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, "GET", "/users", Some(ADMIN_AUTH), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body), json!([{"id": 1, "username": "alice"}]));

    let (status, body) = send(
        &app,
        "PUT",
        "/users/1",
        Some(ADMIN_AUTH),
        Some(json!({"username": "bob"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body), json!({"id": 1, "username": "bob"}));

    let (status, body) = send(&app, "DELETE", "/users/1", Some(ADMIN_AUTH), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());

    let (status, _) = send(&app, "DELETE", "/users/1", Some(ADMIN_AUTH), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_protected_routes_require_basic_auth() {
    let (state, app) = spawn_app().await;

    let routes = [
        ("POST", "/users", Some(json!({"username": "eve", "password": "x"}))),
        ("GET", "/users", None),
        ("PUT", "/users/1", Some(json!({"username": "eve"}))),
        ("DELETE", "/users/1", None),
    ];

    for (method, uri, body) in routes {
        for auth in [None, Some(WRONG_AUTH), Some("Bearer abc")] {
            let (status, _) = send(&app, method, uri, auth, body.clone()).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri} with {auth:?}");
        }
    }

    assert!(state.store().list_users().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unauthorized_response_has_challenge() {
    let (_state, app) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/users")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let challenge = response.headers().get(header::WWW_AUTHENTICATE).unwrap();
    assert!(challenge.to_str().unwrap().starts_with("Basic realm="));
}

#[tokio::test]
async fn test_create_requires_username_and_password() {
    let (state, app) = spawn_app().await;

    for body in [
        json!({"username": "alice"}),
        json!({"password": "p1"}),
        json!({}),
        json!({"username": null, "password": "p1"}),
    ] {
        let (status, bytes) = send(&app, "POST", "/users", Some(ADMIN_AUTH), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json_body(&bytes)["error"].is_string());
    }

    assert!(state.store().list_users().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let (state, app) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/users")
                .header(header::AUTHORIZATION, ADMIN_AUTH)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(state.store().list_users().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_duplicate_create_leaves_state_unchanged() {
    let (state, app) = spawn_app().await;

    send(
        &app,
        "POST",
        "/users",
        Some(ADMIN_AUTH),
        Some(json!({"username": "alice", "password": "p1"})),
    )
    .await;

    let (status, _) = send(
        &app,
        "POST",
        "/users",
        Some(ADMIN_AUTH),
        Some(json!({"username": "alice", "password": "other"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let users = state.store().list_users().await.unwrap();
    assert_eq!(users.len(), 1);
    assert!(state.store().verify_user_password("alice", "p1").await.unwrap());
    assert!(!state.store().verify_user_password("alice", "other").await.unwrap());
}

#[tokio::test]
async fn test_ids_increase_and_are_never_reused() {
    let (_state, app) = spawn_app().await;

    let mut ids = Vec::new();
    for name in ["a", "b", "c"] {
        let (_, body) = send(
            &app,
            "POST",
            "/users",
            Some(ADMIN_AUTH),
            Some(json!({"username": name, "password": "x"})),
        )
        .await;
        ids.push(json_body(&body)["id"].as_i64().unwrap());
    }
    assert!(ids.windows(2).all(|w| w[0] < w[1]));

    let last = ids[2];
    let (status, _) = send(&app, "DELETE", &format!("/users/{last}"), Some(ADMIN_AUTH), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(
        &app,
        "POST",
        "/users",
        Some(ADMIN_AUTH),
        Some(json!({"username": "d", "password": "x"})),
    )
    .await;
    assert!(json_body(&body)["id"].as_i64().unwrap() > last);
}

#[tokio::test]
async fn test_list_empty_and_never_exposes_hash() {
    let (_state, app) = spawn_app().await;

    let (status, body) = send(&app, "GET", "/users", Some(ADMIN_AUTH), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body), json!([]));

    send(
        &app,
        "POST",
        "/users",
        Some(ADMIN_AUTH),
        Some(json!({"username": "alice", "password": "p1"})),
    )
    .await;

    let (_, body) = send(&app, "GET", "/users", Some(ADMIN_AUTH), None).await;
    let text = String::from_utf8(body).unwrap();
    assert!(!text.contains("password"));
    assert!(!text.contains("$argon2"));
}

#[tokio::test]
async fn test_password_only_update_rotates_hash() {
    let (state, app) = spawn_app().await;

    let (_, body) = send(
        &app,
        "POST",
        "/users",
        Some(ADMIN_AUTH),
        Some(json!({"username": "alice", "password": "old"})),
    )
    .await;
    let id = json_body(&body)["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/users/{id}"),
        Some(ADMIN_AUTH),
        Some(json!({"password": "new"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body), json!({"id": id, "username": "alice"}));

    assert!(!state.store().verify_user_password("alice", "old").await.unwrap());
    assert!(state.store().verify_user_password("alice", "new").await.unwrap());
}

#[tokio::test]
async fn test_empty_strings_are_present_values() {
    let (state, app) = spawn_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/users",
        Some(ADMIN_AUTH),
        Some(json!({"username": "bob", "password": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = json_body(&body)["id"].as_i64().unwrap();
    assert!(state.store().verify_user_password("bob", "").await.unwrap());

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/users/{id}"),
        Some(ADMIN_AUTH),
        Some(json!({"username": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body), json!({"id": id, "username": ""}));
}

#[tokio::test]
async fn test_update_username_and_password_together() {
    let (state, app) = spawn_app().await;

    let (_, body) = send(
        &app,
        "POST",
        "/users",
        Some(ADMIN_AUTH),
        Some(json!({"username": "alice", "password": "old"})),
    )
    .await;
    let id = json_body(&body)["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/users/{id}"),
        Some(ADMIN_AUTH),
        Some(json!({"username": "carol", "password": "new"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body), json!({"id": id, "username": "carol"}));

    let store = state.store();
    assert!(store.get_user_by_username("alice").await.unwrap().is_none());
    assert!(!store.verify_user_password("carol", "old").await.unwrap());
    assert!(store.verify_user_password("carol", "new").await.unwrap());
}

#[tokio::test]
async fn test_empty_update_leaves_record_unchanged() {
    let (state, app) = spawn_app().await;

    let (_, body) = send(
        &app,
        "POST",
        "/users",
        Some(ADMIN_AUTH),
        Some(json!({"username": "alice", "password": "p1"})),
    )
    .await;
    let id = json_body(&body)["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/users/{id}"),
        Some(ADMIN_AUTH),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body), json!({"id": id, "username": "alice"}));

    let (_, body) = send(&app, "GET", "/users", Some(ADMIN_AUTH), None).await;
    assert_eq!(json_body(&body), json!([{"id": id, "username": "alice"}]));
    assert!(state.store().verify_user_password("alice", "p1").await.unwrap());
}

#[tokio::test]
async fn test_update_and_delete_unknown_id() {
    let (state, app) = spawn_app().await;

    send(
        &app,
        "POST",
        "/users",
        Some(ADMIN_AUTH),
        Some(json!({"username": "alice", "password": "p1"})),
    )
    .await;

    for id in ["999", "0", "-1"] {
        let (status, _) = send(
            &app,
            "PUT",
            &format!("/users/{id}"),
            Some(ADMIN_AUTH),
            Some(json!({"username": "mallory"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "DELETE", &format!("/users/{id}"), Some(ADMIN_AUTH), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    let users = state.store().list_users().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].username, "alice");
}

#[tokio::test]
async fn test_non_numeric_id_is_bad_request() {
    let (_state, app) = spawn_app().await;

    let (status, _) = send(&app, "DELETE", "/users/abc", Some(ADMIN_AUTH), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_deleted_user_disappears_from_listing() {
    let (_state, app) = spawn_app().await;

    for name in ["alice", "bob"] {
        send(
            &app,
            "POST",
            "/users",
            Some(ADMIN_AUTH),
            Some(json!({"username": name, "password": "x"})),
        )
        .await;
    }

    let (status, _) = send(&app, "DELETE", "/users/1", Some(ADMIN_AUTH), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, "GET", "/users", Some(ADMIN_AUTH), None).await;
    assert_eq!(json_body(&body), json!([{"id": 2, "username": "bob"}]));
}

#[tokio::test]
async fn test_rename_onto_existing_username_is_rejected_by_store() {
    let (state, app) = spawn_app().await;

    for name in ["alice", "bob"] {
        send(
            &app,
            "POST",
            "/users",
            Some(ADMIN_AUTH),
            Some(json!({"username": name, "password": "x"})),
        )
        .await;
    }

    // No application-level uniqueness check on update; the unique index refuses it.
    let (status, body) = send(
        &app,
        "PUT",
        "/users/2",
        Some(ADMIN_AUTH),
        Some(json!({"username": "alice"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(&body)["error"], "An internal error occurred");

    let user = state.store().get_user(2).await.unwrap().unwrap();
    assert_eq!(user.username, "bob");
}

#[tokio::test]
async fn test_metrics_disabled_and_health() {
    let (_state, app) = spawn_app().await;

    let (status, _) = send(&app, "GET", "/metrics", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["status"], "ok");
}
