//! Repository layer: the book store behind a data-access trait

pub mod books;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::book::{Book, BookFilter, NewBook},
};

pub use books::PgBookStore;
pub use memory::MemoryBookStore;

/// Data-access interface for book records.
///
/// Implementations report "no row matched" on update/delete as
/// `AppError::NotFound` and any storage failure as `AppError::Database`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Matching books ordered newest first, skipping `skip` and taking at most `take`
    async fn find_many(&self, filter: &BookFilter, skip: i64, take: i64) -> AppResult<Vec<Book>>;

    /// Count of all books matching the filter
    async fn count(&self, filter: &BookFilter) -> AppResult<i64>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Book>>;

    async fn create(&self, book: &NewBook) -> AppResult<Book>;

    /// Replace all user fields of an existing book
    async fn update(&self, id: Uuid, book: &NewBook) -> AppResult<Book>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Cheap connectivity check used by the readiness endpoint
    async fn ping(&self) -> AppResult<()>;
}

/// Main repository struct holding the configured book store
#[derive(Clone)]
pub struct Repository {
    pub books: Arc<dyn BookStore>,
}

impl Repository {
    pub fn new(books: Arc<dyn BookStore>) -> Self {
        Self { books }
    }

    /// Repository backed by PostgreSQL
    pub fn postgres(pool: Pool<Postgres>) -> Self {
        Self::new(Arc::new(PgBookStore::new(pool)))
    }

    /// Repository backed by a process-local store
    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryBookStore::new()))
    }
}
