//! Catalog pages: list, add, rename, delete and detail

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::SignedCookieJar;

use crate::{
    error::{AppError, AppResult},
    models::book::{AddBook, DeleteBook, RenameBook},
    views, AppState,
};

use super::{
    session::{self, Flash},
    AuthenticatedUser,
};

/// List all books
#[utoipa::path(
    get,
    path = "/",
    tag = "books",
    responses(
        (status = 200, description = "Catalog page (HTML)"),
        (status = 303, description = "No session, redirect to /register")
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    jar: SignedCookieJar,
) -> AppResult<(SignedCookieJar, Html<String>)> {
    let (jar, flashes) = session::take_flashes(jar);
    let books = state.services.catalog.list_books().await?;
    Ok((jar, views::index_page(&user.username, &books, &flashes)))
}

/// Add a book, then render the catalog
#[utoipa::path(
    post,
    path = "/",
    tag = "books",
    request_body(content = AddBook, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Book added (or no title given), catalog rendered"),
        (status = 303, description = "No session, redirect to /register"),
        (status = 400, description = "Invalid title, catalog rendered unchanged"),
        (status = 409, description = "Title already exists, catalog rendered unchanged")
    )
)]
pub async fn add_book(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    jar: SignedCookieJar,
    Form(form): Form<AddBook>,
) -> AppResult<Response> {
    let (jar, mut flashes) = session::take_flashes(jar);
    let mut status = StatusCode::OK;

    if let Some(title) = form.title {
        match state.services.catalog.add_book(&title).await {
            Ok(book) => flashes.push(Flash::success(format!("\"{}\" added to the catalog.", book.title))),
            Err(err @ (AppError::Conflict(_) | AppError::Validation(_))) => {
                tracing::warn!("Failed to add book: {}", err);
                status = err.status_code();
                flashes.push(Flash::danger(err.user_message()));
            }
            Err(err) => return Err(err),
        }
    }

    let books = state.services.catalog.list_books().await?;
    Ok((status, jar, views::index_page(&user.username, &books, &flashes)).into_response())
}

/// Rename a book
#[utoipa::path(
    post,
    path = "/update",
    tag = "books",
    request_body(content = RenameBook, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect to / with the outcome as a notification")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<RenameBook>,
) -> AppResult<(SignedCookieJar, Redirect)> {
    let flash = match state.services.catalog.rename_book(&form.oldtitle, &form.newtitle).await {
        Ok(book) => Flash::success(format!("Renamed to \"{}\".", book.title)),
        Err(err @ AppError::NotFound(_)) => {
            tracing::warn!("Failed to rename book: {}", err);
            Flash::warning(err.user_message())
        }
        Err(err @ (AppError::Conflict(_) | AppError::Validation(_))) => {
            tracing::warn!("Failed to rename book: {}", err);
            Flash::danger(err.user_message())
        }
        Err(err) => return Err(err),
    };

    let jar = session::push_flash(jar, &state.config.session, flash)?;
    Ok((jar, Redirect::to("/")))
}

/// Delete a book
#[utoipa::path(
    post,
    path = "/delete",
    tag = "books",
    request_body(content = DeleteBook, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect to / with the outcome as a notification")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<DeleteBook>,
) -> AppResult<(SignedCookieJar, Redirect)> {
    let flash = match state.services.catalog.delete_book(&form.title).await {
        Ok(()) => Flash::success(format!("\"{}\" deleted.", form.title)),
        Err(err @ AppError::NotFound(_)) => {
            tracing::warn!("Failed to delete book: {}", err);
            Flash::warning(err.user_message())
        }
        Err(err) => return Err(err),
    };

    let jar = session::push_flash(jar, &state.config.session, flash)?;
    Ok((jar, Redirect::to("/")))
}

/// Book detail page
#[utoipa::path(
    get,
    path = "/jogo/{title}",
    tag = "books",
    params(
        ("title" = String, Path, description = "Exact book title")
    ),
    responses(
        (status = 200, description = "Book detail (HTML)"),
        (status = 404, description = "Book not found (plain text)")
    )
)]
pub async fn book_detail(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Path(title): Path<String>,
) -> Response {
    let user = session::current_user(&jar);
    match state.services.catalog.get_book(&title).await {
        Ok(book) => views::book_page(&book, user.as_ref()).into_response(),
        Err(AppError::NotFound(_)) => (StatusCode::NOT_FOUND, "Book not found").into_response(),
        Err(err) => err.into_response(),
    }
}
