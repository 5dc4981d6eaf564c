//! Registration, login and logout pages

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::SignedCookieJar;

use crate::{
    error::{AppError, AppResult},
    models::user::{LoginCredentials, RegisterUser},
    views, AppState,
};

use super::session::{self, Flash, SessionUser};

/// Registration form
#[utoipa::path(
    get,
    path = "/register",
    tag = "auth",
    responses(
        (status = 200, description = "Registration form (HTML)")
    )
)]
pub async fn register_form(jar: SignedCookieJar) -> (SignedCookieJar, Html<String>) {
    let (jar, flashes) = session::take_flashes(jar);
    (jar, views::register_page(&flashes))
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/register",
    tag = "auth",
    request_body(content = RegisterUser, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Registered, redirect to /login"),
        (status = 400, description = "Invalid field lengths, form re-rendered"),
        (status = 409, description = "Username or email already registered, form re-rendered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<RegisterUser>,
) -> AppResult<Response> {
    match state.services.users.register(form).await {
        Ok(_) => {
            let jar = session::push_flash(
                jar,
                &state.config.session,
                Flash::success("Registration successful! Please log in."),
            )?;
            Ok((jar, Redirect::to("/login")).into_response())
        }
        Err(err @ (AppError::Conflict(_) | AppError::Validation(_))) => {
            tracing::warn!("Registration rejected: {}", err);
            let (jar, mut flashes) = session::take_flashes(jar);
            flashes.push(Flash::danger(err.user_message()));
            Ok((err.status_code(), jar, views::register_page(&flashes)).into_response())
        }
        Err(err) => Err(err),
    }
}

/// Login form
#[utoipa::path(
    get,
    path = "/login",
    tag = "auth",
    responses(
        (status = 200, description = "Login form (HTML)")
    )
)]
pub async fn login_form(jar: SignedCookieJar) -> (SignedCookieJar, Html<String>) {
    let (jar, flashes) = session::take_flashes(jar);
    (jar, views::login_page(&flashes))
}

/// Authenticate and open a session
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body(content = LoginCredentials, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Session established, redirect to /"),
        (status = 200, description = "Invalid credentials, form re-rendered")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(credentials): Form<LoginCredentials>,
) -> AppResult<Response> {
    match state.services.users.authenticate(&credentials).await {
        Ok(user) => {
            tracing::info!(user_id = user.id, username = %user.username, "User logged in");
            let jar = session::sign_in(jar, &state.config.session, SessionUser::from(&user))?;
            let jar = session::push_flash(jar, &state.config.session, Flash::success("Logged in successfully!"))?;
            Ok((jar, Redirect::to("/")).into_response())
        }
        Err(AppError::Authentication(message)) => {
            let (jar, mut flashes) = session::take_flashes(jar);
            flashes.push(Flash::danger(message));
            Ok((StatusCode::OK, jar, views::login_page(&flashes)).into_response())
        }
        Err(err) => Err(err),
    }
}

/// Clear the session
#[utoipa::path(
    get,
    path = "/logout",
    tag = "auth",
    responses(
        (status = 303, description = "Session cleared, redirect to /login")
    )
)]
pub async fn logout(State(state): State<AppState>, jar: SignedCookieJar) -> AppResult<(SignedCookieJar, Redirect)> {
    let jar = session::sign_out(jar);
    let jar = session::push_flash(jar, &state.config.session, Flash::success("You have been logged out."))?;
    Ok((jar, Redirect::to("/login")))
}
