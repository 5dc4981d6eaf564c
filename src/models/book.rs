//! Book model and catalog form types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Catalog entry. `id` is the stable identity, `title` is unique.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// Title accepted for a new or renamed book
#[derive(Debug, Clone, Validate)]
pub struct BookTitle {
    #[validate(length(min = 1, max = 80))]
    pub title: String,
}

impl BookTitle {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
        }
    }
}

/// Form submitted to `POST /`
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AddBook {
    pub title: Option<String>,
}

/// Form submitted to `POST /update`
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RenameBook {
    #[serde(default)]
    pub oldtitle: String,
    #[serde(default)]
    pub newtitle: String,
}

/// Form submitted to `POST /delete`
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DeleteBook {
    #[serde(default)]
    pub title: String,
}
