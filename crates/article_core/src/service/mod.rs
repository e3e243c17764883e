//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep CLI and transport layers decoupled from storage details.

pub mod article_service;
