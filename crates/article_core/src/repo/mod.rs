//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the data access contract for the articles collection.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes enforce input validation before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `Conflict`) in
//!   addition to DB transport errors.

pub mod article_repo;
