//! Article use-case service.
//!
//! # Responsibility
//! - Provide the create/list/get/update/delete entry points for callers.
//! - Validate input before any storage access.
//! - Collapse repository errors into client-visible kinds.
//!
//! # Invariants
//! - Service APIs never bypass repository persistence contracts.
//! - Service layer remains storage-agnostic.
//! - Log events carry ids and error codes only, never article text.

use crate::model::article::{
    Article, ArticleId, ArticlePatch, ArticleValidationError, NewArticle,
};
use crate::repo::article_repo::{ArticleRepository, RepoError};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Client-visible outcome class of a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or blank required field; detected before storage access.
    Validation,
    NotFound,
    /// Title collision.
    Conflict,
    /// Storage or data-integrity failure.
    Internal,
}

impl ErrorKind {
    /// HTTP status used by the articles REST contract.
    pub fn http_status(self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::Internal => 500,
        }
    }

    /// Stable lowercase code for logs and error envelopes.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Internal => "internal",
        }
    }

    /// `true` for errors caused by the request rather than the store.
    pub fn is_client_error(self) -> bool {
        !matches!(self, Self::Internal)
    }
}

/// Service error for article use-cases.
#[derive(Debug)]
pub enum ArticleServiceError {
    Validation(ArticleValidationError),
    NotFound(ArticleId),
    Conflict { title: String },
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl ArticleServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Repo(_) => ErrorKind::Internal,
        }
    }
}

impl Display for ArticleServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "article not found: {id}"),
            Self::Conflict { title } => write!(f, "article title already exists: `{title}`"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ArticleServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ArticleValidationError> for ArticleServiceError {
    fn from(value: ArticleValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ArticleServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Conflict { title } => Self::Conflict { title },
            other => Self::Repo(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ArticleServiceError>;

/// Article service facade over repository implementations.
pub struct ArticleService<R: ArticleRepository> {
    repo: R,
}

impl<R: ArticleRepository> ArticleService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one article; `published` defaults to `false`.
    ///
    /// # Errors
    /// - `Validation` for blank `title` or `body`.
    /// - `Conflict` when the title is taken.
    pub fn create(&mut self, input: &NewArticle) -> ServiceResult<Article> {
        let result = input
            .validate()
            .map_err(ArticleServiceError::from)
            .and_then(|()| self.repo.create_article(input).map_err(Into::into));
        log_outcome("create", None, &result);
        result
    }

    /// Lists published articles ordered by id. Empty store yields `[]`.
    pub fn list_published(&self) -> ServiceResult<Vec<Article>> {
        let items = self.repo.list_articles(true)?;
        debug!(
            "event=article_list module=service status=ok filter=published count={}",
            items.len()
        );
        Ok(items)
    }

    /// Lists draft (unpublished) articles ordered by id.
    pub fn list_drafts(&self) -> ServiceResult<Vec<Article>> {
        let items = self.repo.list_articles(false)?;
        debug!(
            "event=article_list module=service status=ok filter=drafts count={}",
            items.len()
        );
        Ok(items)
    }

    /// Gets one article by id, failing with `NotFound` when absent.
    pub fn get_by_id(&self, id: ArticleId) -> ServiceResult<Article> {
        self.repo
            .get_article(id)?
            .ok_or(ArticleServiceError::NotFound(id))
    }

    /// Applies a partial update.
    ///
    /// Only supplied fields change; `updated_at` is refreshed even for an
    /// empty patch. See [`ArticlePatch`] for `description` null semantics.
    pub fn update(&mut self, id: ArticleId, patch: &ArticlePatch) -> ServiceResult<Article> {
        let result = patch
            .validate()
            .map_err(ArticleServiceError::from)
            .and_then(|()| self.repo.update_article(id, patch).map_err(Into::into));
        log_outcome("update", Some(id), &result);
        result
    }

    /// Hard-deletes one article and returns the removed record.
    pub fn delete(&mut self, id: ArticleId) -> ServiceResult<Article> {
        let result = self.repo.delete_article(id).map_err(Into::into);
        log_outcome("delete", Some(id), &result);
        result
    }
}

fn log_outcome(op: &str, id: Option<ArticleId>, result: &ServiceResult<Article>) {
    match result {
        Ok(article) => info!(
            "event=article_{op} module=service status=ok id={} published={}",
            article.id, article.published
        ),
        Err(err) if err.kind().is_client_error() => warn!(
            "event=article_{op} module=service status=rejected id={} error_code={}",
            id.map_or_else(|| "-".to_string(), |value| value.to_string()),
            err.kind().as_str()
        ),
        Err(err) => error!(
            "event=article_{op} module=service status=error id={} error_code={} error={}",
            id.map_or_else(|| "-".to_string(), |value| value.to_string()),
            err.kind().as_str(),
            err
        ),
    }
}
