//! REST client for the book endpoints

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use uuid::Uuid;

use super::{sync::BookListKey, ClientConfig, ClientError};
use crate::models::book::{Book, BookPage, BookPayload};

/// Remote operations the data-sync layer needs
#[async_trait]
pub trait BookGateway: Send + Sync {
    async fn list_books(&self, key: &BookListKey, limit: i64) -> Result<BookPage, ClientError>;

    async fn get_book(&self, id: Uuid) -> Result<Book, ClientError>;

    async fn create_book(&self, payload: &BookPayload) -> Result<Book, ClientError>;

    async fn update_book(&self, id: Uuid, payload: &BookPayload) -> Result<Book, ClientError>;

    async fn delete_book(&self, id: Uuid) -> Result<(), ClientError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// `reqwest`-backed implementation of [`BookGateway`]
#[derive(Clone)]
pub struct BookApi {
    client: Client,
    base_url: String,
}

impl BookApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.api_url.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn books_url(&self) -> String {
        format!("{}/api/books", self.base_url)
    }

    fn book_url(&self, id: Uuid) -> String {
        format!("{}/api/books/{}", self.base_url, id)
    }

    /// Send a request, turning any non-2xx answer into `ClientError::Api`
    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.error)
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

        tracing::debug!(status = status.as_u16(), %message, "Book API request failed");
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl BookGateway for BookApi {
    async fn list_books(&self, key: &BookListKey, limit: i64) -> Result<BookPage, ClientError> {
        let mut params = vec![
            ("page", key.page.to_string()),
            ("limit", limit.to_string()),
        ];
        for (name, value) in [
            ("search", &key.search),
            ("genre", &key.genre),
            ("status", &key.status),
        ] {
            if !value.is_empty() {
                params.push((name, value.clone()));
            }
        }

        let response = self
            .send(self.client.get(self.books_url()).query(&params))
            .await?;
        Ok(response.json().await?)
    }

    async fn get_book(&self, id: Uuid) -> Result<Book, ClientError> {
        let response = self.send(self.client.get(self.book_url(id))).await?;
        Ok(response.json().await?)
    }

    async fn create_book(&self, payload: &BookPayload) -> Result<Book, ClientError> {
        let response = self
            .send(self.client.post(self.books_url()).json(payload))
            .await?;
        Ok(response.json().await?)
    }

    async fn update_book(&self, id: Uuid, payload: &BookPayload) -> Result<Book, ClientError> {
        let response = self
            .send(self.client.put(self.book_url(id)).json(payload))
            .await?;
        Ok(response.json().await?)
    }

    async fn delete_book(&self, id: Uuid) -> Result<(), ClientError> {
        self.send(self.client.delete(self.book_url(id))).await?;
        Ok(())
    }
}
