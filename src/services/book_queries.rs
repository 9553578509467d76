//! Book listing and lookup

use uuid::Uuid;

use crate::{
    config::PaginationConfig,
    error::{AppError, AppResult},
    models::book::{Book, BookFilter, BookPage, BookQuery},
    repository::Repository,
};

#[derive(Clone)]
pub struct BookQueryService {
    repository: Repository,
    pagination: PaginationConfig,
}

impl BookQueryService {
    pub fn new(repository: Repository, pagination: PaginationConfig) -> Self {
        Self {
            repository,
            pagination,
        }
    }

    /// Resolve `(page, limit)`: values below 1 fall back to defaults and
    /// `limit` is capped at the configured maximum.
    fn page_and_limit(&self, query: &BookQuery) -> (i64, i64) {
        let page = query.page.filter(|p| *p >= 1).unwrap_or(1);
        let limit = query
            .limit
            .filter(|l| *l >= 1)
            .unwrap_or(self.pagination.default_limit)
            .min(self.pagination.max_limit);
        (page, limit)
    }

    /// List one page of books matching the query filters, newest first.
    ///
    /// The page and the total count are two independent reads issued
    /// concurrently; a concurrent write may shift a page boundary by one.
    pub async fn list_books(&self, query: &BookQuery) -> AppResult<BookPage> {
        let (page, limit) = self.page_and_limit(query);
        let filter = BookFilter::from_query(query)?;
        let skip = (page - 1).saturating_mul(limit);

        let books = &self.repository.books;
        let (data, total) = tokio::try_join!(
            books.find_many(&filter, skip, limit),
            books.count(&filter)
        )?;

        tracing::debug!(page, limit, total, "Listed books");
        Ok(BookPage::new(data, total, page, limit))
    }

    pub async fn get_book(&self, id: Uuid) -> AppResult<Book> {
        self.repository
            .books
            .find_by_id(id)
            .await?
            .ok_or_else(AppError::book_not_found)
    }

    /// Readiness probe against the book store
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.books.ping().await
    }
}
