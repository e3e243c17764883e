//! Article domain model.
//!
//! # Responsibility
//! - Define the persisted `Article` record and its write inputs.
//! - Validate required fields before any storage access.
//!
//! # Invariants
//! - `id` is assigned by storage and never reused for another article.
//! - `created_at` is set once; `updated_at >= created_at`.
//! - `title` and `body` are never blank.

use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned article identifier.
pub type ArticleId = i64;

/// Canonical persisted article.
///
/// Serialized with camelCase keys to match the HTTP contract
/// (`createdAt`, `updatedAt`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: ArticleId,
    /// Globally unique headline.
    pub title: String,
    pub description: Option<String>,
    pub body: String,
    /// `false` means draft.
    pub published: bool,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds. Strictly increases on every update.
    pub updated_at: i64,
}

/// Input for creating one article.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewArticle {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Defaults to `false` when omitted.
    #[serde(default)]
    pub published: Option<bool>,
}

impl NewArticle {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            description: None,
            published: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_published(mut self, published: bool) -> Self {
        self.published = Some(published);
        self
    }

    /// Validates required fields.
    ///
    /// # Errors
    /// - `BlankTitle` when `title` is empty after trim.
    /// - `BlankBody` when `body` is empty after trim.
    pub fn validate(&self) -> Result<(), ArticleValidationError> {
        ensure_not_blank(&self.title, ArticleValidationError::BlankTitle)?;
        ensure_not_blank(&self.body, ArticleValidationError::BlankBody)?;
        Ok(())
    }
}

/// Partial update input.
///
/// Absent fields leave the stored value unchanged. `description` has three
/// states: `None` (absent, unchanged), `Some(None)` (explicit null, cleared)
/// and `Some(Some(_))` (set).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArticlePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}

impl ArticlePatch {
    /// Validates supplied fields; absent fields are not checked.
    pub fn validate(&self) -> Result<(), ArticleValidationError> {
        if let Some(title) = self.title.as_deref() {
            ensure_not_blank(title, ArticleValidationError::BlankTitle)?;
        }
        if let Some(body) = self.body.as_deref() {
            ensure_not_blank(body, ArticleValidationError::BlankBody)?;
        }
        Ok(())
    }

    /// Merges supplied fields into `article`, leaving timestamps untouched.
    pub fn apply_to(&self, article: &mut Article) {
        if let Some(title) = &self.title {
            article.title = title.clone();
        }
        if let Some(description) = &self.description {
            article.description = description.clone();
        }
        if let Some(body) = &self.body {
            article.body = body.clone();
        }
        if let Some(published) = self.published {
            article.published = published;
        }
    }
}

// A key that is present (even as `null`) always yields `Some(_)`; a missing
// key falls back to `#[serde(default)]`.
fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Required-field violations detected before storage access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleValidationError {
    BlankTitle,
    BlankBody,
}

impl ArticleValidationError {
    /// Name of the offending field.
    pub fn field(self) -> &'static str {
        match self {
            Self::BlankTitle => "title",
            Self::BlankBody => "body",
        }
    }
}

impl Display for ArticleValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "`{}` is required and must not be blank", self.field())
    }
}

impl Error for ArticleValidationError {}

fn ensure_not_blank(
    value: &str,
    err: ArticleValidationError,
) -> Result<(), ArticleValidationError> {
    if value.trim().is_empty() {
        return Err(err);
    }
    Ok(())
}
