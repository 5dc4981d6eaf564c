//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, health};
use crate::models::{
    book::{AddBook, DeleteBook, RenameBook},
    user::{LoginCredentials, RegisterUser},
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bookshelf",
        version = "0.1.0",
        description = "Book catalog web application. Pages are HTML; form bodies are URL-encoded."
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Accounts
        auth::register_form,
        auth::register,
        auth::login_form,
        auth::login,
        auth::logout,
        // Books
        books::list_books,
        books::add_book,
        books::update_book,
        books::delete_book,
        books::book_detail,
    ),
    components(
        schemas(
            health::HealthResponse,
            RegisterUser,
            LoginCredentials,
            AddBook,
            RenameBook,
            DeleteBook,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration and session management"),
        (name = "books", description = "Book catalog")
    )
)]
pub struct ApiDoc;

/// Create router for OpenAPI documentation
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
