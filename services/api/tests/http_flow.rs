//! End-to-end tests that drive the real router over the in-memory adapter.

use api_lib::{
    adapters::MemoryAdapter,
    config::Config,
    web::{build_router, protocol::LibraryEvent, state::AppState, EventHub},
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use reading_tracker_core::{
    ports::{PortResult, ResetNotifier},
    PasswordResetToken,
};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;
use uuid::Uuid;

#[derive(Default)]
struct RecordingNotifier {
    tokens: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    fn last_token(&self) -> Option<String> {
        self.tokens.lock().unwrap().last().map(|(_, token)| token.clone())
    }
}

#[async_trait]
impl ResetNotifier for RecordingNotifier {
    async fn send_reset_token(&self, username: &str, token: &PasswordResetToken) -> PortResult<()> {
        self.tokens
            .lock()
            .unwrap()
            .push((username.to_string(), token.token.clone()));
        Ok(())
    }
}

struct TestApp {
    router: Router,
    state: Arc<AppState>,
    notifier: Arc<RecordingNotifier>,
}

impl TestApp {
    fn new() -> Self {
        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("memory".to_string()),
            _ => None,
        })
        .unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let state = Arc::new(AppState {
            db: Arc::new(MemoryAdapter::new()),
            config: Arc::new(config),
            notifier: notifier.clone(),
            events: EventHub::new(),
        });
        Self {
            router: build_router(state.clone()),
            state,
            notifier,
        }
    }

    async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn post(&self, uri: &str, form: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(form.to_string())).unwrap()).await
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn register(&self, username: &str, password: &str) -> Uuid {
        let response = self
            .post("/register", &format!("username={}&password={}", username, password), None)
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json(response).await;
        body["user_id"].as_str().unwrap().parse().unwrap()
    }

    /// Logs in and returns the `Cookie` header value to send back.
    async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .post("/login", &format!("username={}&password={}", username, password), None)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        session_cookie(&response)
    }

    async fn signed_up(&self, username: &str) -> (Uuid, String) {
        let user_id = self.register(username, "pw").await;
        let cookie = self.login(username, "pw").await;
        (user_id, cookie)
    }

    async fn add_book(&self, cookie: &str, form: &str) -> Value {
        let response = self.post("/add_book", form, Some(cookie)).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        json(response).await
    }

    async fn dashboard(&self, cookie: &str) -> Value {
        let response = self.get("/", Some(cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        json(response).await
    }
}

fn session_cookie(response: &Response<Body>) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login sets a cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

async fn json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn book_id(book: &Value) -> Uuid {
    book["id"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn register_rejects_duplicates_and_login_returns_the_same_identity() {
    let app = TestApp::new();
    let user_id = app.register("ayse", "s3cret").await;

    let duplicate = app.post("/register", "username=ayse&password=other", None).await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);
    assert_eq!(json(duplicate).await["error"], "User already exists.");

    let response = app.post("/login", "username=ayse&password=s3cret", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);
    assert!(cookie.starts_with("session="));
    let body = json(response).await;
    assert_eq!(body["user_id"], user_id.to_string());

    let dashboard = app.dashboard(&cookie).await;
    assert_eq!(dashboard["authenticated"], true);
    assert_eq!(dashboard["user_id"], user_id.to_string());
    assert_eq!(dashboard["username"], "ayse");
}

#[tokio::test]
async fn bad_credentials_are_rejected_without_a_session() {
    let app = TestApp::new();
    app.register("ayse", "s3cret").await;

    for form in ["username=ayse&password=wrong", "username=nobody&password=s3cret"] {
        let response = app.post("/login", form, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert_eq!(json(response).await["error"], "Invalid username or password.");
    }

    let empty = app.post("/register", "username=&password=x", None).await;
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn protected_routes_redirect_without_a_session() {
    let app = TestApp::new();

    let response = app.post("/add_book", "name=Dune", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");

    let stale = app.post("/add_book", "name=Dune", Some("session=not-a-session")).await;
    assert_eq!(stale.status(), StatusCode::SEE_OTHER);

    let index = json(app.get("/", None).await).await;
    assert_eq!(index["authenticated"], false);
}

#[tokio::test]
async fn dashboard_aggregates_readings_per_book() {
    let app = TestApp::new();
    let (_, cookie) = app.signed_up("ayse").await;
    let dune = book_id(&app.add_book(&cookie, "name=Dune&total_pages=412").await);
    let emma = book_id(&app.add_book(&cookie, "name=Emma").await);

    for (date, start, end) in [("2024-05-01", 1, 40), ("2024-05-02", 41, 75), ("2024-05-03", 10, 12)] {
        let form = format!("book_id={}&read_date={}&start={}&end={}", dune, date, start, end);
        let response = app.post("/add_reading", &form, Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let dashboard = app.dashboard(&cookie).await;
    let books = dashboard["books"].as_array().unwrap();
    assert_eq!(books.len(), 2);
    assert_eq!(books[0]["id"], dune.to_string());
    assert_eq!(books[0]["total_pages_read"], 40 + 35 + 3);
    assert_eq!(books[0]["last_page"], 75);
    assert_eq!(books[1]["id"], emma.to_string());
    assert_eq!(books[1]["total_pages_read"], 0);
    assert_eq!(books[1]["last_page"], 0);

    let readings = dashboard["readings"].as_array().unwrap();
    assert_eq!(readings.len(), 3);
    assert_eq!(readings[0]["read_date"], "2024-05-03");
    assert_eq!(readings[0]["book_name"], "Dune");
}

#[tokio::test]
async fn reading_with_start_after_end_creates_nothing() {
    let app = TestApp::new();
    let (user_id, cookie) = app.signed_up("ayse").await;
    let dune = book_id(&app.add_book(&cookie, "name=Dune").await);

    let form = format!("book_id={}&read_date=2024-05-01&start=50&end=10", dune);
    let response = app.post("/add_reading", &form, Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json(response).await["error"],
        "End page must not be before the start page."
    );

    let readings = app.state.db.readings_for_book(user_id, dune).await.unwrap();
    assert!(readings.is_empty());
}

#[tokio::test]
async fn reading_date_defaults_to_today_and_book_is_required() {
    let app = TestApp::new();
    let (_, cookie) = app.signed_up("ayse").await;
    let dune = book_id(&app.add_book(&cookie, "name=Dune").await);

    let response = app
        .post("/add_reading", &format!("book_id={}&start=1&end=9", dune), Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let reading = json(response).await;
    assert_eq!(reading["pages_read"], 9);
    assert_eq!(
        reading["read_date"],
        chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string()
    );

    let response = app.post("/add_reading", "book_id=&start=1&end=9", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(response).await["error"], "Please select a book.");
}

#[tokio::test]
async fn deleting_a_book_removes_its_readings() {
    let app = TestApp::new();
    let (user_id, cookie) = app.signed_up("ayse").await;
    let dune = book_id(&app.add_book(&cookie, "name=Dune").await);
    for (start, end) in [(1, 10), (11, 20)] {
        let form = format!("book_id={}&start={}&end={}", dune, start, end);
        app.post("/add_reading", &form, Some(&cookie)).await;
    }

    let response = app.post(&format!("/delete_book/{}", dune), "", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert!(app.state.db.readings_for_book(user_id, dune).await.unwrap().is_empty());
    let dashboard = app.dashboard(&cookie).await;
    assert!(dashboard["books"].as_array().unwrap().is_empty());
    assert!(dashboard["readings"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn deleting_a_single_reading_keeps_the_rest() {
    let app = TestApp::new();
    let (_, cookie) = app.signed_up("ayse").await;
    let dune = book_id(&app.add_book(&cookie, "name=Dune").await);
    let first = json(
        app.post("/add_reading", &format!("book_id={}&start=1&end=10", dune), Some(&cookie))
            .await,
    )
    .await;
    app.post("/add_reading", &format!("book_id={}&start=11&end=30", dune), Some(&cookie))
        .await;

    let uri = format!("/delete_reading/{}", first["id"].as_str().unwrap());
    assert_eq!(app.post(&uri, "", Some(&cookie)).await.status(), StatusCode::NO_CONTENT);

    let dashboard = app.dashboard(&cookie).await;
    assert_eq!(dashboard["books"][0]["total_pages_read"], 20);
    assert_eq!(dashboard["books"][0]["last_page"], 30);
}

#[tokio::test]
async fn other_users_rows_are_left_alone() {
    let app = TestApp::new();
    let (owner_id, owner) = app.signed_up("owner").await;
    let (_, intruder) = app.signed_up("intruder").await;
    let dune = book_id(&app.add_book(&owner, "name=Dune").await);
    let reading = json(
        app.post("/add_reading", &format!("book_id={}&start=1&end=5", dune), Some(&owner))
            .await,
    )
    .await;

    let response = app.post(&format!("/delete_book/{}", dune), "", Some(&intruder)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let uri = format!("/delete_reading/{}", reading["id"].as_str().unwrap());
    assert_eq!(app.post(&uri, "", Some(&intruder)).await.status(), StatusCode::NO_CONTENT);

    let response = app
        .post("/add_reading", &format!("book_id={}&start=6&end=9", dune), Some(&intruder))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .post(&format!("/update_pages/{}", dune), "pages_today=10", Some(&intruder))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert_eq!(app.state.db.readings_for_book(owner_id, dune).await.unwrap().len(), 1);
    let dashboard = app.dashboard(&owner).await;
    assert_eq!(dashboard["books"][0]["total_pages_read"], 5);
    assert_eq!(dashboard["books"][0]["pages_read"], 0);
    assert!(app.dashboard(&intruder).await["books"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn page_counter_clamps_last_page_but_flags_overshoot() {
    let app = TestApp::new();
    let (_, cookie) = app.signed_up("ayse").await;
    let dune = book_id(&app.add_book(&cookie, "name=Dune&total_pages=200").await);
    let uri = format!("/update_pages/{}", dune);

    let body = json(app.post(&uri, "pages_today=120", Some(&cookie)).await).await;
    assert_eq!(body["pages_read"], 120);

    let body = json(app.post(&uri, "pages_today=30", Some(&cookie)).await).await;
    assert_eq!(body["pages_read"], 150);
    assert_eq!(body["last_page_read"], 150);
    assert_eq!(body["overshoot"], Value::Null);

    let body = json(app.post(&uri, "pages_today=40", Some(&cookie)).await).await;
    assert_eq!(body["pages_read"], 190);

    let body = json(app.post(&uri, "pages_today=30", Some(&cookie)).await).await;
    assert_eq!(body["pages_read"], 220);
    assert_eq!(body["last_page_read"], 200);
    assert_eq!(body["overshoot"], 20);

    let dashboard = app.dashboard(&cookie).await;
    assert_eq!(dashboard["books"][0]["pages_read"], 220);
    assert_eq!(dashboard["books"][0]["last_page_read"], 200);
}

#[tokio::test]
async fn page_counter_rejects_bad_input() {
    let app = TestApp::new();
    let (_, cookie) = app.signed_up("ayse").await;
    let dune = book_id(&app.add_book(&cookie, "name=Dune&total_pages=200").await);
    let uri = format!("/update_pages/{}", dune);

    let response = app.post(&uri, "pages_today=-5", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(response).await["error"], "Pages read today cannot be negative.");

    let response = app.post(&uri, "pages_today=lots", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let dashboard = app.dashboard(&cookie).await;
    assert_eq!(dashboard["books"][0]["pages_read"], 0);
}

#[tokio::test]
async fn malformed_ids_get_a_json_error() {
    let app = TestApp::new();
    let (_, cookie) = app.signed_up("ayse").await;
    app.add_book(&cookie, "name=Dune").await;

    for uri in ["/delete_book/3", "/delete_reading/not-an-id", "/update_pages/42"] {
        let response = app.post(uri, "pages_today=5", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        assert!(json(response).await["error"].is_string(), "{}", uri);
    }

    let dashboard = app.dashboard(&cookie).await;
    assert_eq!(dashboard["books"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn forms_without_a_content_type_get_a_json_error() {
    let app = TestApp::new();
    let (_, cookie) = app.signed_up("ayse").await;

    let request = Request::builder()
        .method("POST")
        .uri("/add_book")
        .header(header::COOKIE, &cookie)
        .body(Body::from("name=Dune"))
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body = json(response).await;
    assert!(body["error"].as_str().unwrap().contains("Content-Type"));

    let request = Request::builder()
        .method("POST")
        .uri("/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"username":"bob","password":"pw"}"#))
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(json(response).await["error"].is_string());

    let dashboard = app.dashboard(&cookie).await;
    assert!(dashboard["books"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn add_book_validates_presence_and_positivity() {
    let app = TestApp::new();
    let (_, cookie) = app.signed_up("ayse").await;

    let response = app.post("/add_book", "name=%20%20", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.post("/add_book", "name=Dune&total_pages=0", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let book = app.add_book(&cookie, "name=%20Dune%20&total_pages=").await;
    assert_eq!(book["name"], "Dune");
    assert_eq!(book["total_pages"], Value::Null);
}

#[tokio::test]
async fn forgot_never_leaks_the_hash_and_reset_rotates_the_password() {
    let app = TestApp::new();
    let (_, old_cookie) = app.signed_up("ayse").await;

    let unknown = app.post("/forgot", "username=nobody", None).await;
    assert_eq!(unknown.status(), StatusCode::OK);
    let unknown_body = json(unknown).await;
    assert!(app.notifier.last_token().is_none());

    let response = app.post("/forgot", "username=ayse", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json(response).await;
    assert_eq!(body, unknown_body);
    assert!(!body.to_string().contains("argon2"));

    let token = app.notifier.last_token().expect("token issued");
    let form = format!("token={}&password=n3w", token);
    assert_eq!(app.post("/reset", &form, None).await.status(), StatusCode::OK);

    // Single use.
    assert_eq!(app.post("/reset", &form, None).await.status(), StatusCode::UNAUTHORIZED);

    let old_login = app.post("/login", "username=ayse&password=pw", None).await;
    assert_eq!(old_login.status(), StatusCode::UNAUTHORIZED);
    app.login("ayse", "n3w").await;

    let dashboard = json(app.get("/", Some(&old_cookie)).await).await;
    assert_eq!(dashboard["authenticated"], false);
}

#[tokio::test]
async fn logout_clears_the_session() {
    let app = TestApp::new();
    let (_, cookie) = app.signed_up("ayse").await;

    let response = app.get("/logout", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cleared = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cleared.contains("Max-Age=0"));

    let index = json(app.get("/", Some(&cookie)).await).await;
    assert_eq!(index["authenticated"], false);
}

#[tokio::test]
async fn mutations_are_published_to_the_owner() {
    let app = TestApp::new();
    let (user_id, cookie) = app.signed_up("ayse").await;
    let mut events = app.state.events.subscribe(user_id);

    let dune = book_id(&app.add_book(&cookie, "name=Dune&total_pages=300").await);
    app.post(&format!("/update_pages/{}", dune), "pages_today=12", Some(&cookie))
        .await;
    app.post(&format!("/delete_book/{}", dune), "", Some(&cookie)).await;

    assert_eq!(
        events.recv().await.unwrap(),
        LibraryEvent::BookAdded {
            book_id: dune,
            name: "Dune".to_string(),
            total_pages: Some(300),
        }
    );
    assert_eq!(
        events.recv().await.unwrap(),
        LibraryEvent::CounterUpdated {
            book_id: dune,
            pages_read: 12,
            last_page_read: 12,
        }
    );
    assert_eq!(
        events.recv().await.unwrap(),
        LibraryEvent::BookDeleted { book_id: dune }
    );
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::new();
    let response = app.get("/api-docs/openapi.json", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let doc = json(response).await;
    assert!(doc["paths"]["/add_reading"].is_object());

    let health = json(app.get("/health", None).await).await;
    assert_eq!(health["status"], "ok");
}
