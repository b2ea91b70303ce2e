//! Core of postdesk: an ordered, soft-deletable post store behind one
//! repository contract with three interchangeable SQLite backends.
//! This crate is the single source of truth for post invariants.

pub mod config;
pub mod db;
pub mod export;
pub mod logging;
pub mod model;
pub mod registry;
pub mod repo;
pub mod service;
pub mod storage;

pub use config::{ConfigError, RepositoryConfig, RepositoryMode};
pub use export::{export_posts_csv, ExportError};
pub use logging::{
    default_log_level, init_logging, init_stderr_logging, logging_status, LogTarget, LoggingError,
};
pub use model::page::{PageRequest, PagedResult, ParentIdentifier, SortOrder};
pub use model::post::{NewPost, Post, PostId};
pub use registry::build_repository;
pub use repo::mapped_repo::MappedPostRepository;
pub use repo::orm_repo::OrmPostRepository;
pub use repo::statement_repo::StatementPostRepository;
pub use repo::{MoveDirection, PostRepository, RepoError, RepoResult};
pub use service::post_service::{PostService, ServiceError, ServiceResult};
pub use storage::{LocalPostStorage, PostStorage, StorageError, StorageResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
