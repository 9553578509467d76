//! Business logic services

pub mod book_commands;
pub mod book_queries;

use crate::{config::PaginationConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub queries: book_queries::BookQueryService,
    pub commands: book_commands::BookCommandService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, pagination: PaginationConfig) -> Self {
        Self {
            queries: book_queries::BookQueryService::new(repository.clone(), pagination),
            commands: book_commands::BookCommandService::new(repository),
        }
    }
}
