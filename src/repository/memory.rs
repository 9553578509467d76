//! Process-local book store

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::BookStore;
use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookFilter, NewBook},
};

/// Books kept in insertion order; ties on `created_at` resolve newest insert first
#[derive(Default)]
pub struct MemoryBookStore {
    rows: RwLock<Vec<Book>>,
}

impl MemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn find_many(&self, filter: &BookFilter, skip: i64, take: i64) -> AppResult<Vec<Book>> {
        let rows = self.rows.read().await;

        let mut matching: Vec<(usize, &Book)> = rows
            .iter()
            .enumerate()
            .filter(|(_, book)| filter.matches(book))
            .collect();
        matching.sort_by(|(ia, a), (ib, b)| b.created_at.cmp(&a.created_at).then(ib.cmp(ia)));

        let skip = usize::try_from(skip.max(0)).unwrap_or(usize::MAX);
        let take = usize::try_from(take.max(0)).unwrap_or(usize::MAX);

        Ok(matching
            .into_iter()
            .skip(skip)
            .take(take)
            .map(|(_, book)| book.clone())
            .collect())
    }

    async fn count(&self, filter: &BookFilter) -> AppResult<i64> {
        let rows = self.rows.read().await;
        Ok(rows.iter().filter(|book| filter.matches(book)).count() as i64)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Book>> {
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|book| book.id == id).cloned())
    }

    async fn create(&self, book: &NewBook) -> AppResult<Book> {
        let now = Utc::now();
        let created = Book {
            id: Uuid::new_v4(),
            title: book.title.clone(),
            author: book.author.clone(),
            genre: book.genre.clone(),
            published_year: book.published_year,
            status: book.status,
            created_at: now,
            updated_at: now,
        };

        self.rows.write().await.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: Uuid, book: &NewBook) -> AppResult<Book> {
        let mut rows = self.rows.write().await;
        let row = rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or_else(AppError::book_not_found)?;

        row.title = book.title.clone();
        row.author = book.author.clone();
        row.genre = book.genre.clone();
        row.published_year = book.published_year;
        row.status = book.status;
        row.updated_at = Utc::now();

        Ok(row.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut rows = self.rows.write().await;
        let position = rows
            .iter()
            .position(|row| row.id == id)
            .ok_or_else(AppError::book_not_found)?;
        rows.remove(position);
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
