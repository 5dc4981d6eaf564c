//! Catalog management service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookTitle},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Full catalog, no pagination
    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list().await
    }

    /// Exact-title lookup
    pub async fn get_book(&self, title: &str) -> AppResult<Book> {
        self.repository
            .books
            .get_by_title(title)
            .await?
            .ok_or_else(|| not_found(title))
    }

    pub async fn add_book(&self, title: &str) -> AppResult<Book> {
        BookTitle::new(title).validate()?;

        let book = self.repository.books.create(title).await?;
        tracing::info!(book_id = book.id, title = %book.title, "Book added");
        Ok(book)
    }

    /// Rename a book in place. Renaming onto another book's title is a
    /// `Conflict` and leaves both rows untouched.
    pub async fn rename_book(&self, old_title: &str, new_title: &str) -> AppResult<Book> {
        BookTitle::new(new_title).validate()?;

        let book = self
            .repository
            .books
            .rename(old_title, new_title)
            .await?
            .ok_or_else(|| not_found(old_title))?;

        tracing::info!(book_id = book.id, from = %old_title, to = %book.title, "Book renamed");
        Ok(book)
    }

    pub async fn delete_book(&self, title: &str) -> AppResult<()> {
        if !self.repository.books.delete_by_title(title).await? {
            return Err(not_found(title));
        }

        tracing::info!(title = %title, "Book deleted");
        Ok(())
    }
}

fn not_found(title: &str) -> AppError {
    AppError::NotFound(format!("Book \"{}\" not found", title))
}
