//! Bookshelf Book Catalog
//!
//! A REST JSON API for managing a catalog of books, plus the client-side
//! state controller and data-sync layer that drive a catalog browser.

use std::sync::Arc;

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

use repository::Repository;
use services::Services;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<Services>,
}

impl AppState {
    pub fn new(config: AppConfig, repository: Repository) -> Self {
        let services = Services::new(repository, config.pagination);
        Self {
            config: Arc::new(config),
            services: Arc::new(services),
        }
    }

    /// State over an empty process-local store with default configuration
    pub fn in_memory() -> Self {
        Self::new(AppConfig::default(), Repository::memory())
    }
}
