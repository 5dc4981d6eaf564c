//! Registration and authentication service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use once_cell::sync::Lazy;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::user::{LoginCredentials, NewUser, RegisterUser, User},
    repository::Repository,
};

const INVALID_CREDENTIALS: &str = "Invalid credentials. Please try again.";

/// Verified against when the username is unknown, so both failure paths
/// spend the same Argon2 time.
static DUMMY_HASH: Lazy<Option<String>> = Lazy::new(|| hash_password("bookshelf-dummy-password").ok());

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Register a new user, storing a salted hash of the password
    pub async fn register(&self, form: RegisterUser) -> AppResult<User> {
        form.validate()?;

        let password_hash = hash_password(&form.password)?;
        let user = self
            .repository
            .users
            .create(&NewUser {
                username: form.username,
                email: form.email,
                password_hash,
            })
            .await?;

        tracing::info!(user_id = user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Check a username/password pair.
    /// Every failure is reported with the same generic message.
    pub async fn authenticate(&self, credentials: &LoginCredentials) -> AppResult<User> {
        let Some(user) = self
            .repository
            .users
            .get_by_username(&credentials.username)
            .await?
        else {
            if let Some(hash) = DUMMY_HASH.as_deref() {
                verify_password(&credentials.password, hash)?;
            }
            return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
        };

        if !verify_password(&credentials.password, &user.password)? {
            tracing::info!(username = %user.username, "Rejected login: wrong password");
            return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
        }

        Ok(user)
    }
}

/// Hash a plaintext password with Argon2id and a random salt (PHC string)
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verify a plaintext password against a stored PHC hash
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AppError::Internal(format!("Failed to verify password: {}", e))),
    }
}
