//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository and storage calls into use-case level APIs.
//! - Keep command-line and embedding layers decoupled from storage details.

pub mod post_service;
