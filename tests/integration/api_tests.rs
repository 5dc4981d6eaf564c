//! API integration tests
//!
//! Each test drives the full router in-process against a fresh in-memory
//! SQLite database, carrying cookies between requests like a browser.

use std::collections::HashMap;

use axum::{
    body::Body,
    http::{
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        Method, Request, StatusCode,
    },
    response::Response,
    Router,
};
use serde_json::Value;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tower::ServiceExt;

use bookshelf_server::{api, config::AppConfig, repository::Repository, services::Services, AppState};

/// Build the application over an empty in-memory database
async fn test_app() -> (Router, SqlitePool) {
    // A single connection that never expires keeps the in-memory database alive
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    let repository = Repository::new(pool.clone());
    repository.init_schema().await.expect("Failed to create schema");

    let state = AppState::new(AppConfig::default(), Services::new(repository));
    (api::router(state), pool)
}

/// Minimal browser: remembers cookies set by the server
struct TestClient {
    app: Router,
    cookies: HashMap<String, String>,
}

impl TestClient {
    fn new(app: Router) -> Self {
        Self {
            app,
            cookies: HashMap::new(),
        }
    }

    async fn get(&mut self, uri: &str) -> Response {
        let request = self.request(Method::GET, uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    async fn post_form(&mut self, uri: &str, form: &str) -> Response {
        let request = self
            .request(Method::POST, uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();
        self.send(request).await
    }

    fn request(&self, method: Method, uri: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(uri);
        if self.cookies.is_empty() {
            return builder;
        }

        let cookie_header = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ");
        builder.header(COOKIE, cookie_header)
    }

    async fn send(&mut self, request: Request<Body>) -> Response {
        let response = self.app.clone().oneshot(request).await.unwrap();

        for header in response.headers().get_all(SET_COOKIE) {
            let header = header.to_str().unwrap();
            let pair = header.split(';').next().unwrap();
            let (name, value) = pair.split_once('=').unwrap();
            let removed = value.is_empty() || header.to_ascii_lowercase().contains("max-age=0");
            if removed {
                self.cookies.remove(name);
            } else {
                self.cookies.insert(name.to_string(), value.to_string());
            }
        }

        response
    }

    fn has_session(&self) -> bool {
        self.cookies.contains_key("session")
    }

    async fn register(&mut self, username: &str, email: &str, password: &str) -> Response {
        let form = format!("username={}&email={}&password={}", username, email, password);
        self.post_form("/register", &form).await
    }

    async fn login(&mut self, username: &str, password: &str) -> Response {
        let form = format!("username={}&password={}", username, password);
        self.post_form("/login", &form).await
    }

    /// Register and log in `ana`
    async fn sign_in(&mut self) {
        self.register("ana", "a%40x.com", "pw1").await;
        let response = self.login("ana", "pw1").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8")
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(LOCATION)
        .expect("No Location header")
        .to_str()
        .unwrap()
}

async fn count(pool: &SqlitePool, sql: &str, value: &str) -> i64 {
    sqlx::query_scalar(sql).bind(value).fetch_one(pool).await.unwrap()
}

async fn book_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM books").fetch_one(pool).await.unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let (app, _pool) = test_app().await;
    let mut client = TestClient::new(app);

    let response = client.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["status"], "healthy");

    let response = client.get("/ready").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_openapi_document_served() {
    let (app, _pool) = test_app().await;
    let mut client = TestClient::new(app);

    let response = client.get("/api-docs/openapi.json").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert!(body["paths"]["/jogo/{title}"].is_object());
}

#[tokio::test]
async fn test_register_login_and_empty_catalog() {
    let (app, pool) = test_app().await;
    let mut client = TestClient::new(app);

    let response = client.register("ana", "a%40x.com", "pw1").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let stored: String = sqlx::query_scalar("SELECT password FROM users WHERE username = 'ana'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_ne!(stored, "pw1");
    assert!(stored.starts_with("$argon2id$"));

    let email: String = sqlx::query_scalar("SELECT email FROM users WHERE username = 'ana'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(email, "a@x.com");

    // The registration notice shows up once on the login page
    let page = body_text(client.get("/login").await).await;
    assert!(page.contains("Registration successful!"));
    let page = body_text(client.get("/login").await).await;
    assert!(!page.contains("Registration successful!"));

    let response = client.login("ana", "pw1").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert!(client.has_session());

    let response = client.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("Signed in as ana"));
    assert!(page.contains("Logged in successfully!"));
    assert!(page.contains("No books yet."));
    assert_eq!(page.matches(r#"class="book""#).count(), 0);
}

#[tokio::test]
async fn test_duplicate_username_rejected() {
    let (app, pool) = test_app().await;
    let mut client = TestClient::new(app);

    let response = client.register("ana", "a%40x.com", "pw1").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = client.register("ana", "other%40x.com", "pw2").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let page = body_text(response).await;
    assert!(page.contains("Username or email is already registered"));

    assert_eq!(count(&pool, "SELECT COUNT(*) FROM users WHERE username = ?", "ana").await, 1);
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    let (app, pool) = test_app().await;
    let mut client = TestClient::new(app);

    client.register("ana", "a%40x.com", "pw1").await;
    let response = client.register("bia", "a%40x.com", "pw2").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    assert_eq!(count(&pool, "SELECT COUNT(*) FROM users WHERE email = ?", "a@x.com").await, 1);
}

#[tokio::test]
async fn test_register_with_oversized_username() {
    let (app, pool) = test_app().await;
    let mut client = TestClient::new(app);

    let response = client.register(&"u".repeat(51), "a%40x.com", "pw1").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let page = body_text(response).await;
    assert!(page.contains("Invalid value for: username"));

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users").fetch_one(&pool).await.unwrap();
    assert_eq!(users, 0);
}

#[tokio::test]
async fn test_login_wrong_password() {
    let (app, _pool) = test_app().await;
    let mut client = TestClient::new(app);
    client.register("ana", "a%40x.com", "pw1").await;

    for password in ["pw2", "PW1", ""] {
        let response = client.login("ana", password).await;
        assert_eq!(response.status(), StatusCode::OK);
        let page = body_text(response).await;
        assert!(page.contains("Invalid credentials. Please try again."));
        assert!(!client.has_session());
    }

    let response = client.get("/").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_login_unknown_user() {
    let (app, _pool) = test_app().await;
    let mut client = TestClient::new(app);

    let response = client.login("ghost", "pw1").await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("Invalid credentials. Please try again."));
    assert!(!client.has_session());
}

#[tokio::test]
async fn test_catalog_requires_session() {
    let (app, _pool) = test_app().await;
    let mut client = TestClient::new(app);

    let response = client.get("/").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/register");

    let response = client.post_form("/", "title=Chess").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/register");
}

#[tokio::test]
async fn test_forged_session_cookie_rejected() {
    let (app, _pool) = test_app().await;
    let mut client = TestClient::new(app);
    client
        .cookies
        .insert("session".to_string(), "eyJ1c2VyX2lkIjoxLCJ1c2VybmFtZSI6ImFuYSJ9".to_string());

    let response = client.get("/").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/register");
}

#[tokio::test]
async fn test_logout_closes_catalog() {
    let (app, _pool) = test_app().await;
    let mut client = TestClient::new(app);
    client.sign_in().await;
    assert_eq!(client.get("/").await.status(), StatusCode::OK);

    let response = client.get("/logout").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    assert!(!client.has_session());

    let page = body_text(client.get("/login").await).await;
    assert!(page.contains("You have been logged out."));

    let response = client.get("/").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/register");
}

#[tokio::test]
async fn test_logout_without_session() {
    let (app, _pool) = test_app().await;
    let mut client = TestClient::new(app);

    let response = client.get("/logout").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_add_book_once() {
    let (app, pool) = test_app().await;
    let mut client = TestClient::new(app);
    client.sign_in().await;

    let response = client.post_form("/", "title=Chess").await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert_eq!(page.matches(r#"<a href="/jogo/Chess">Chess</a>"#).count(), 1);

    let response = client.post_form("/", "title=Chess").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let page = body_text(response).await;
    assert!(page.contains("already exists"));
    assert_eq!(page.matches(r#"<a href="/jogo/Chess">Chess</a>"#).count(), 1);

    assert_eq!(count(&pool, "SELECT COUNT(*) FROM books WHERE title = ?", "Chess").await, 1);

    let page = body_text(client.get("/").await).await;
    assert_eq!(page.matches(r#"class="book""#).count(), 1);
}

#[tokio::test]
async fn test_add_without_title_lists_books() {
    let (app, pool) = test_app().await;
    let mut client = TestClient::new(app);
    client.sign_in().await;

    let response = client.post_form("/", "").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(book_count(&pool).await, 0);

    let response = client.post_form("/", "title=").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(book_count(&pool).await, 0);
}

#[tokio::test]
async fn test_rename_book() {
    let (app, _pool) = test_app().await;
    let mut client = TestClient::new(app);
    client.sign_in().await;
    client.post_form("/", "title=Chess").await;

    let response = client.post_form("/update", "oldtitle=Chess&newtitle=Checkers").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let response = client.get("/jogo/Checkers").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(r#"<h1 class="book-title">Checkers</h1>"#));

    let response = client.get("/jogo/Chess").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, "Book not found");
}

#[tokio::test]
async fn test_rename_keeps_identity() {
    let (app, pool) = test_app().await;
    let mut client = TestClient::new(app);
    client.sign_in().await;
    client.post_form("/", "title=Chess").await;

    let before: i64 = sqlx::query_scalar("SELECT id FROM books WHERE title = 'Chess'")
        .fetch_one(&pool)
        .await
        .unwrap();
    client.post_form("/update", "oldtitle=Chess&newtitle=Checkers").await;
    let after: i64 = sqlx::query_scalar("SELECT id FROM books WHERE title = 'Checkers'")
        .fetch_one(&pool)
        .await
        .unwrap();

    assert_eq!(before, after);
    assert_eq!(book_count(&pool).await, 1);
}

#[tokio::test]
async fn test_rename_onto_existing_title() {
    let (app, pool) = test_app().await;
    let mut client = TestClient::new(app);
    client.sign_in().await;
    client.post_form("/", "title=Chess").await;
    client.post_form("/", "title=Go").await;

    let response = client.post_form("/update", "oldtitle=Chess&newtitle=Go").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    assert_eq!(book_count(&pool).await, 2);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM books WHERE title = ?", "Chess").await, 1);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM books WHERE title = ?", "Go").await, 1);

    let page = body_text(client.get("/").await).await;
    assert!(page.contains("flash-danger"));
}

#[tokio::test]
async fn test_rename_missing_book() {
    let (app, pool) = test_app().await;
    let mut client = TestClient::new(app);
    client.sign_in().await;

    let response = client.post_form("/update", "oldtitle=Nope&newtitle=Still%20nope").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert_eq!(book_count(&pool).await, 0);

    let page = body_text(client.get("/").await).await;
    assert!(page.contains("flash-warning"));
    assert!(page.contains("not found"));
}

#[tokio::test]
async fn test_rename_to_same_title() {
    let (app, pool) = test_app().await;
    let mut client = TestClient::new(app);
    client.sign_in().await;
    client.post_form("/", "title=Chess").await;
    let id: i64 = sqlx::query_scalar("SELECT id FROM books WHERE title = 'Chess'")
        .fetch_one(&pool)
        .await
        .unwrap();

    let response = client.post_form("/update", "oldtitle=Chess&newtitle=Chess").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let page = body_text(client.get("/").await).await;
    assert!(page.contains(r#"<li class="flash flash-success">Renamed to &quot;Chess&quot;.</li>"#));
    assert!(!page.contains("flash-danger"));

    let after: i64 = sqlx::query_scalar("SELECT id FROM books WHERE title = 'Chess'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(after, id);
    assert_eq!(book_count(&pool).await, 1);
}

#[tokio::test]
async fn test_rename_invalid_new_title() {
    let (app, pool) = test_app().await;
    let mut client = TestClient::new(app);
    client.sign_in().await;
    client.post_form("/", "title=Chess").await;

    let too_long = "t".repeat(81);
    for form in ["oldtitle=Chess&newtitle=".to_string(), format!("oldtitle=Chess&newtitle={}", too_long)] {
        let response = client.post_form("/update", &form).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");

        let page = body_text(client.get("/").await).await;
        assert!(page.contains(r#"<li class="flash flash-danger">Invalid value for: title</li>"#));
        assert!(!page.contains("flash-success"));

        assert_eq!(book_count(&pool).await, 1);
        assert_eq!(count(&pool, "SELECT COUNT(*) FROM books WHERE title = ?", "Chess").await, 1);
    }
}

#[tokio::test]
async fn test_detail_page_shows_session_nav() {
    let (app, _pool) = test_app().await;
    let mut client = TestClient::new(app);
    client.sign_in().await;
    client.post_form("/", "title=Chess").await;

    let page = body_text(client.get("/jogo/Chess").await).await;
    assert!(page.contains(r#"<a href="/logout">Log out</a>"#));

    client.get("/logout").await;
    let page = body_text(client.get("/jogo/Chess").await).await;
    assert!(page.contains(r#"<a href="/login">Log in</a>"#));
}

#[tokio::test]
async fn test_delete_book() {
    let (app, pool) = test_app().await;
    let mut client = TestClient::new(app);
    client.sign_in().await;
    client.post_form("/", "title=Chess").await;
    client.post_form("/", "title=Go").await;

    let response = client.post_form("/delete", "title=Chess").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    assert_eq!(book_count(&pool).await, 1);
    assert_eq!(client.get("/jogo/Chess").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(client.get("/jogo/Go").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_delete_missing_book() {
    let (app, pool) = test_app().await;
    let mut client = TestClient::new(app);
    client.sign_in().await;
    client.post_form("/", "title=Chess").await;

    let response = client.post_form("/delete", "title=Nope").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert_eq!(book_count(&pool).await, 1);

    let page = body_text(client.get("/").await).await;
    assert!(page.contains(r#"<li class="flash flash-warning">Book &quot;Nope&quot; not found</li>"#));
}

#[tokio::test]
async fn test_detail_with_encoded_title() {
    let (app, _pool) = test_app().await;
    let mut client = TestClient::new(app);
    client.sign_in().await;
    client.post_form("/", "title=War+and+Peace").await;

    let response = client.get("/jogo/War%20and%20Peace").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("War and Peace"));
}
