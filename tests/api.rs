//! HTTP API tests. Each test drives the router in-process against its own
//! temporary database.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header::CONTENT_TYPE};
use segmenter::server::{AppState, create_router};
use segmenter::store::{SqliteStore, Store};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt; // for oneshot

struct TestApp {
    _temp_dir: TempDir,
    store: Arc<SqliteStore>,
    router: Router,
}

impl TestApp {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let store = SqliteStore::new(temp_dir.path().join("test.db")).expect("open store");
        store.initialize().expect("initialize store");
        let store = Arc::new(store);

        let router = create_router(Arc::new(AppState::new(store.clone())));

        Self {
            _temp_dir: temp_dir,
            store,
            router,
        }
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send_request(request).await
    }

    async fn send_request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(body)).await
    }

    async fn delete(&self, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, body).await
    }
}

#[tokio::test]
async fn health_ok() {
    let app = TestApp::new();

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn membership_lifecycle() {
    let app = TestApp::new();

    let (status, user) = app
        .post("/users", json!({"name": "A", "email": "a@x.com"}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["id"], 1);

    let (status, segment) = app.post("/segments", json!({"slug": "vip"})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(segment["id"], 1);

    let (status, echoed) = app
        .post("/users/1/segments", json!([{"slug": "vip"}]))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(echoed, json!([{"slug": "vip"}]));

    let (status, segments) = app.get("/users/1/segments").await;
    assert_eq!(status, StatusCode::OK);
    let segments = segments.as_array().unwrap();
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0]["id"], 1);
    assert_eq!(segments[0]["slug"], "vip");

    let (status, _) = app
        .delete("/users/1/segments", Some(json!([{"slug": "vip"}])))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, segments) = app.get("/users/1/segments").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(segments, json!([]));
}

#[tokio::test]
async fn unknown_slug_is_rejected_without_writes() {
    let app = TestApp::new();
    app.post("/users", json!({"name": "A", "email": "a@x.com"}))
        .await;
    app.post("/segments", json!({"slug": "vip"})).await;

    let (status, body) = app
        .post("/users/1/segments", json!([{"slug": "vip"}, {"slug": "ghost"}]))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("ghost"));

    assert!(app.store.list_membership_history(1).unwrap().is_empty());

    let (status, _) = app
        .delete("/users/1/segments", Some(json!([{"slug": "ghost"}])))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn repeated_add_and_readd_keep_history() {
    let app = TestApp::new();
    app.post("/users", json!({"name": "A", "email": "a@x.com"}))
        .await;
    app.post("/segments", json!({"slug": "vip"})).await;

    for _ in 0..2 {
        let (status, _) = app
            .post("/users/1/segments", json!([{"slug": "vip"}]))
            .await;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(app.store.list_membership_history(1).unwrap().len(), 1);

    app.delete("/users/1/segments", Some(json!([{"slug": "vip"}])))
        .await;
    let (status, _) = app
        .delete("/users/1/segments", Some(json!([{"slug": "vip"}])))
        .await;
    assert_eq!(status, StatusCode::OK);

    app.post("/users/1/segments", json!([{"slug": "vip"}]))
        .await;

    let history = app.store.list_membership_history(1).unwrap();
    assert_eq!(history.len(), 2);
    assert!(!history[0].is_active());
    assert!(history[1].is_active());
}

#[tokio::test]
async fn membership_of_missing_user_is_not_found() {
    let app = TestApp::new();
    app.post("/segments", json!({"slug": "vip"})).await;

    let (status, body) = app
        .post("/users/9/segments", json!([{"slug": "vip"}]))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");
}

#[tokio::test]
async fn user_crud() {
    let app = TestApp::new();

    let (_, created) = app
        .post("/users", json!({"name": "A", "email": "a@x.com"}))
        .await;
    let id = created["id"].as_i64().unwrap();

    let (status, fetched) = app.get(&format!("/users/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["email"], "a@x.com");

    let (status, updated) = app
        .put(
            &format!("/users/{id}"),
            json!({"name": "B", "email": "b@x.com"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "B");
    assert_eq!(updated["email"], "b@x.com");

    let (status, users) = app.get("/users").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 1);

    let (status, body) = app.delete(&format!("/users/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User deleted");

    let (status, _) = app.get(&format!("/users/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, users) = app.get("/users").await;
    assert_eq!(users, json!([]));

    let (status, _) = app.delete(&format!("/users/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let app = TestApp::new();
    app.post("/users", json!({"name": "A", "email": "a@x.com"}))
        .await;

    let (status, body) = app
        .post("/users", json!({"name": "Other", "email": "a@x.com"}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn update_missing_user_is_not_found() {
    let app = TestApp::new();

    let (status, body) = app
        .put("/users/42", json!({"name": "A", "email": "a@x.com"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");
}

#[tokio::test]
async fn segment_crud() {
    let app = TestApp::new();

    let (_, created) = app.post("/segments", json!({"slug": "vip"})).await;
    let id = created["id"].as_i64().unwrap();

    let (status, _) = app.post("/segments", json!({"slug": "vip"})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, updated) = app
        .put(&format!("/segments/{id}"), json!({"slug": "gold"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["slug"], "gold");

    let (status, _) = app.put("/segments/99", json!({"slug": "x"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.delete(&format!("/segments/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Segment deleted");

    let (status, _) = app.get(&format!("/segments/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, segments) = app.get("/segments").await;
    assert_eq!(segments, json!([]));

    // The row is soft-deleted, not removed.
    let count: i64 = app
        .store
        .connection()
        .query_row("SELECT COUNT(*) FROM segments", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn deleted_segment_leaves_user_segments() {
    let app = TestApp::new();
    app.post("/users", json!({"name": "A", "email": "a@x.com"}))
        .await;
    app.post("/segments", json!({"slug": "vip"})).await;
    app.post("/segments", json!({"slug": "beta"})).await;
    app.post(
        "/users/1/segments",
        json!([{"slug": "vip"}, {"slug": "beta"}]),
    )
    .await;

    app.delete("/segments/1", None).await;

    let (_, segments) = app.get("/users/1/segments").await;
    let slugs: Vec<_> = segments
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["slug"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(slugs, vec!["beta"]);
}

#[tokio::test]
async fn malformed_requests_are_bad_requests() {
    let app = TestApp::new();

    let (status, body) = app.post("/users", json!({"name": "A"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = app
        .post("/users", json!({"name": "A", "email": "not-an-email"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.post("/segments", json!({"slug": "has space"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.post("/users/1/segments", json!({"slug": "vip"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.get("/users/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let without_content_type = Request::post("/users")
        .body(Body::from(r#"{"name":"A","email":"a@x.com"}"#))
        .unwrap();
    let (status, body) = app.send_request(without_content_type).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Content-Type"));
}

#[tokio::test]
async fn unsupported_method_is_labelled_json() {
    let app = TestApp::new();

    let (status, _) = app.put("/users/1/segments", json!([{"slug": "vip"}])).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn unknown_route_is_json_not_found() {
    let app = TestApp::new();

    let (status, body) = app.get("/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Route not found");
}
