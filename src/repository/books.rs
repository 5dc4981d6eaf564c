//! Books repository for database operations

use chrono::Utc;
use sqlx::{Pool, Sqlite};

use crate::{error::AppResult, models::book::Book};

use super::conflict_on_unique;

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Sqlite>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// All books in insertion order
    pub async fn list(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>("SELECT id, title, created_at FROM books ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(books)
    }

    pub async fn get_by_title(&self, title: &str) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT id, title, created_at FROM books WHERE title = ?")
            .bind(title)
            .fetch_optional(&self.pool)
            .await?;

        Ok(book)
    }

    /// Insert a book. Fails with `Conflict` when the title is taken.
    pub async fn create(&self, title: &str) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, created_at)
            VALUES (?, ?)
            RETURNING id, title, created_at
            "#,
        )
        .bind(title)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, format!("A book titled \"{}\" already exists", title)))
    }

    /// Rename the book currently titled `old_title`.
    /// Returns `None` when no such book exists. The row keeps its id.
    pub async fn rename(&self, old_title: &str, new_title: &str) -> AppResult<Option<Book>> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET title = ?
            WHERE title = ?
            RETURNING id, title, created_at
            "#,
        )
        .bind(new_title)
        .bind(old_title)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, format!("A book titled \"{}\" already exists", new_title)))
    }

    /// Delete by title. Returns whether a row was removed.
    pub async fn delete_by_title(&self, title: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE title = ?")
            .bind(title)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
