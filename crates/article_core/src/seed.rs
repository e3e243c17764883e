//! Sample data for local development.
//!
//! Seeding is an upsert keyed by title: missing rows are inserted, rows whose
//! title already exists are left exactly as they are, so running it twice is
//! harmless.

use crate::model::article::NewArticle;
use crate::repo::article_repo::{ArticleRepository, RepoResult, UpsertOutcome};
use log::info;
use serde::Serialize;

/// Per-run counts returned by [`seed_articles`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub inserted: usize,
    pub unchanged: usize,
}

/// Returns the fixed sample set: one published article and one draft.
pub fn sample_articles() -> Vec<NewArticle> {
    vec![
        NewArticle::new(
            "SQLite Adds Support for STRICT Tables",
            "Version 3.37.0 introduces STRICT tables, which enforce declared column types on every insert and update.",
        )
        .with_description("Column types are finally enforced when you ask for it.")
        .with_published(true),
        NewArticle::new(
            "What's new in the article store (Q1)",
            "This quarter brings partial updates with explicit null handling, draft listings and an idempotent seed command.",
        )
        .with_description("A roundup of recent store features.")
        .with_published(false),
    ]
}

/// Upserts [`sample_articles`] through `repo`.
pub fn seed_articles<R: ArticleRepository>(repo: &mut R) -> RepoResult<SeedReport> {
    let mut report = SeedReport::default();
    for input in sample_articles() {
        let (article, outcome) = repo.upsert_by_title(&input)?;
        match outcome {
            UpsertOutcome::Inserted => report.inserted += 1,
            UpsertOutcome::Unchanged => report.unchanged += 1,
        }
        info!(
            "event=seed_article module=seed status=ok id={} outcome={:?}",
            article.id, outcome
        );
    }

    Ok(report)
}
