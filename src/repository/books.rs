//! Books repository for PostgreSQL

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::BookStore;
use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookFilter, NewBook},
};

const BOOK_COLUMNS: &str =
    "id, title, author, genre, published_year, status, created_at, updated_at";

/// Escape LIKE wildcards so the search text matches literally
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Build the WHERE clause for a filter. Placeholders are numbered in the
/// same order `bind_filter!` binds values.
fn where_clause(filter: &BookFilter) -> String {
    let mut conditions = Vec::new();
    let mut idx = 1;

    if filter.search.is_some() {
        conditions.push(format!("(title ILIKE ${0} OR author ILIKE ${0})", idx));
        idx += 1;
    }
    if filter.genre.is_some() {
        conditions.push(format!("genre = ${}", idx));
        idx += 1;
    }
    if filter.status.is_some() {
        conditions.push(format!("status = ${}", idx));
    }

    if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    }
}

macro_rules! bind_filter {
    ($builder:expr, $filter:expr) => {{
        let mut builder = $builder;
        if let Some(ref search) = $filter.search {
            builder = builder.bind(like_pattern(search));
        }
        if let Some(ref genre) = $filter.genre {
            builder = builder.bind(genre.clone());
        }
        if let Some(status) = $filter.status {
            builder = builder.bind(status);
        }
        builder
    }};
}

#[derive(Clone)]
pub struct PgBookStore {
    pool: Pool<Postgres>,
}

impl PgBookStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for PgBookStore {
    async fn find_many(&self, filter: &BookFilter, skip: i64, take: i64) -> AppResult<Vec<Book>> {
        let query = format!(
            "SELECT {} FROM books {} ORDER BY created_at DESC LIMIT {} OFFSET {}",
            BOOK_COLUMNS,
            where_clause(filter),
            take,
            skip
        );

        let rows = bind_filter!(sqlx::query_as::<_, Book>(&query), filter)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn count(&self, filter: &BookFilter) -> AppResult<i64> {
        let query = format!("SELECT COUNT(*) FROM books {}", where_clause(filter));

        let total = bind_filter!(sqlx::query_scalar::<_, i64>(&query), filter)
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Book>> {
        let query = format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS);
        let book = sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn create(&self, book: &NewBook) -> AppResult<Book> {
        let query = format!(
            r#"
            INSERT INTO books (title, author, genre, published_year, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        );

        let row = sqlx::query_as::<_, Book>(&query)
            .bind(&book.title)
            .bind(&book.author)
            .bind(&book.genre)
            .bind(book.published_year)
            .bind(book.status)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update(&self, id: Uuid, book: &NewBook) -> AppResult<Book> {
        let query = format!(
            r#"
            UPDATE books
            SET title = $2, author = $3, genre = $4, published_year = $5, status = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            BOOK_COLUMNS
        );

        sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .bind(&book.title)
            .bind(&book.author)
            .bind(&book.genre)
            .bind(book.published_year)
            .bind(book.status)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(AppError::book_not_found)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::book_not_found());
        }
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
