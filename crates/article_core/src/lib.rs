//! Persistence core for the articles resource.
//! This crate is the single writer of article state and owns its invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod seed;
pub mod service;

pub use config::{ConfigError, DatabaseLocation, StoreConfig, DATABASE_URL_ENV};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::article::{Article, ArticleId, ArticlePatch, ArticleValidationError, NewArticle};
pub use repo::article_repo::{
    ArticleRepository, RepoError, RepoResult, SqliteArticleRepository, UpsertOutcome,
};
pub use seed::{sample_articles, seed_articles, SeedReport};
pub use service::article_service::{ArticleService, ArticleServiceError, ErrorKind, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
