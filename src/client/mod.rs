//! Catalog browser client.
//!
//! [`state`] owns the UI state and its reducer, [`sync`] keeps list reads
//! cached and fresh across mutations, and [`controller`] wires both to the
//! REST API through [`http::BookApi`].

pub mod controller;
pub mod http;
pub mod pagination;
pub mod state;
pub mod sync;

use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use thiserror::Error;

pub use controller::{BookListController, ListView, Notification, NotificationLevel, RefreshOutcome};
pub use http::{BookApi, BookGateway};
pub use state::{Action, FilterPatch, Filters, StateStore, UiState};
pub use sync::{BookListKey, BookQueryCache, BookSync, CachedRead, PageResult, Resource};

/// Local development endpoint used when no API URL is configured
pub const DEFAULT_API_URL: &str = "http://localhost:7700";

/// Books shown per page by the catalog browser
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Client-side errors; cloneable so a single in-flight result can be shared
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("{0}")]
    Transport(String),

    /// Non-2xx answer; `message` comes from the body `error` field
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Transport(e.to_string())
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST API, without the `/api` suffix
    pub api_url: String,
    pub page_size: i64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ClientConfig {
    /// Read `BOOKSHELF_API_URL` / `BOOKSHELF_PAGE_SIZE`, falling back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::environment())
    }

    fn environment() -> Environment {
        Environment::with_prefix("BOOKSHELF")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn load_from(environment: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("api_url", DEFAULT_API_URL)?
            .set_default("page_size", DEFAULT_PAGE_SIZE)?
            .add_source(environment)
            .build()?
            .try_deserialize()
    }
}
