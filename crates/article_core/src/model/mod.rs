//! Domain model for the article store.
//!
//! # Responsibility
//! - Define the persisted article shape and its create/patch inputs.
//!
//! # Invariants
//! - Every article is identified by a storage-assigned `ArticleId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod article;
