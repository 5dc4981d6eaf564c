//! HTTP handlers for Bookshelf pages

pub mod auth;
pub mod books;
pub mod health;
pub mod openapi;
pub mod session;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::Redirect,
    routing::{get, post},
    Router,
};
use axum_extra::extract::SignedCookieJar;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::AppState;
use session::SessionUser;

/// Where anonymous visitors of a gated page are sent
pub const ANONYMOUS_REDIRECT: &str = "/register";

/// Extractor for the user of a signed session.
/// Without one the request is redirected to the registration page.
pub struct AuthenticatedUser(pub SessionUser);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = SignedCookieJar::from_headers(&parts.headers, state.cookie_key.clone());

        session::current_user(&jar)
            .map(AuthenticatedUser)
            .ok_or_else(|| Redirect::to(ANONYMOUS_REDIRECT))
    }
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    Router::new()
        // Catalog
        .route("/", get(books::list_books).post(books::add_book))
        .route("/update", post(books::update_book))
        .route("/delete", post(books::delete_book))
        .route("/jogo/:title", get(books::book_detail))
        // Accounts
        .route("/register", get(auth::register_form).post(auth::register))
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/logout", get(auth::logout))
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .with_state(state)
        .merge(openapi::create_openapi_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}
