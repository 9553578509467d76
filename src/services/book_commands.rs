//! Book mutations: create, wholesale update, delete

use uuid::Uuid;

use crate::{
    error::AppResult,
    models::book::{Book, BookPayload},
    repository::Repository,
};

#[derive(Clone)]
pub struct BookCommandService {
    repository: Repository,
}

impl BookCommandService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Validate and insert a new book
    pub async fn create_book(&self, payload: BookPayload) -> AppResult<Book> {
        let book = payload.into_new_book()?;
        let created = self.repository.books.create(&book).await?;
        tracing::info!(book_id = %created.id, "Book created");
        Ok(created)
    }

    /// Validate and replace all fields of an existing book.
    ///
    /// Validation happens first, so an invalid payload against an unknown id
    /// reports the validation failure.
    pub async fn update_book(&self, id: Uuid, payload: BookPayload) -> AppResult<Book> {
        let book = payload.into_new_book()?;
        let updated = self.repository.books.update(id, &book).await?;
        tracing::info!(book_id = %id, "Book updated");
        Ok(updated)
    }

    pub async fn delete_book(&self, id: Uuid) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!(book_id = %id, "Book deleted");
        Ok(())
    }
}
