//! Signed-cookie session and one-time flash notifications
//!
//! Both cookies hold base64url-encoded JSON and are signed with the
//! per-process [`Key`](axum_extra::extract::cookie::Key) held in `AppState`.
//! A cookie with a bad signature reads as absent.

use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    config::SessionConfig,
    error::{AppError, AppResult},
    models::User,
};

pub const SESSION_COOKIE: &str = "session";
pub const FLASH_COOKIE: &str = "flash";

/// Pending notifications kept per visitor; older ones are dropped first
pub const MAX_PENDING_FLASHES: usize = 5;

/// Identity carried by an authenticated session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub user_id: i64,
    pub username: String,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashCategory {
    Success,
    Warning,
    Danger,
}

impl FlashCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashCategory::Success => "success",
            FlashCategory::Warning => "warning",
            FlashCategory::Danger => "danger",
        }
    }
}

/// Notification shown once on the next rendered page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub category: FlashCategory,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            category: FlashCategory::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            category: FlashCategory::Warning,
            message: message.into(),
        }
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self {
            category: FlashCategory::Danger,
            message: message.into(),
        }
    }
}

/// User stored in the session cookie, if any
pub fn current_user(jar: &SignedCookieJar) -> Option<SessionUser> {
    jar.get(SESSION_COOKIE).and_then(|cookie| decode(cookie.value()))
}

/// Start an authenticated session
pub fn sign_in(jar: SignedCookieJar, config: &SessionConfig, user: SessionUser) -> AppResult<SignedCookieJar> {
    let value = encode(&user)?;
    Ok(jar.add(build_cookie(SESSION_COOKIE, value, config)))
}

/// Drop the session, whether or not one existed
pub fn sign_out(jar: SignedCookieJar) -> SignedCookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

/// Queue a notification for the next rendered page
pub fn push_flash(jar: SignedCookieJar, config: &SessionConfig, flash: Flash) -> AppResult<SignedCookieJar> {
    let mut pending = pending_flashes(&jar);
    pending.push(flash);
    if pending.len() > MAX_PENDING_FLASHES {
        pending.drain(..pending.len() - MAX_PENDING_FLASHES);
    }
    let value = encode(&pending)?;
    Ok(jar.add(build_cookie(FLASH_COOKIE, value, config)))
}

/// Consume pending notifications
pub fn take_flashes(jar: SignedCookieJar) -> (SignedCookieJar, Vec<Flash>) {
    if jar.get(FLASH_COOKIE).is_none() {
        return (jar, Vec::new());
    }

    let flashes = pending_flashes(&jar);
    (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), flashes)
}

fn pending_flashes(jar: &SignedCookieJar) -> Vec<Flash> {
    jar.get(FLASH_COOKIE)
        .and_then(|cookie| decode(cookie.value()))
        .unwrap_or_default()
}

fn build_cookie(name: &'static str, value: String, config: &SessionConfig) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies)
        .build()
}

fn encode<T: Serialize>(value: &T) -> AppResult<String> {
    let json = serde_json::to_vec(value)
        .map_err(|e| AppError::Internal(format!("Failed to encode cookie: {}", e)))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode<T: DeserializeOwned>(value: &str) -> Option<T> {
    let bytes = URL_SAFE_NO_PAD.decode(value).ok()?;
    serde_json::from_slice(&bytes).ok()
}
