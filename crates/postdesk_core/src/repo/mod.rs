//! Post repository contract and its three persistence backends.
//!
//! # Responsibility
//! - Define the one data-access contract every backend satisfies.
//! - Normalize driver faults into one store-fault kind at the boundary.
//! - Host the shared listing and reorder rules the backends render natively.
//!
//! # Invariants
//! - Every operation acts only on live rows (`is_deleted = 0`).
//! - Not-found is a value (`None` / `false`), never an error.
//! - No driver error type appears in `RepoError`'s public shape.

use crate::config::{ConfigError, RepositoryMode};
use crate::db::DbError;
use crate::model::page::{PageRequest, PagedResult};
use crate::model::post::{NewPost, Post, PostId};
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod mapped_repo;
pub mod orm_entity;
pub mod orm_repo;
pub(crate) mod query;
pub mod reorder;
pub mod statement_repo;

pub use reorder::MoveDirection;

pub type RepoResult<T> = Result<T, RepoError>;

type BoxedSource = Box<dyn Error + Send + Sync + 'static>;

/// Repository error shared by all backends.
#[derive(Debug)]
pub enum RepoError {
    /// The backing store failed. The driver error is kept only as `source`.
    Store {
        backend: RepositoryMode,
        source: BoxedSource,
    },
    /// The store accepted an insert but returned no key.
    MissingGeneratedKey,
    /// A reorder update did not touch exactly one live row; the swap was
    /// rolled back.
    SwapConflict(PostId),
    InvalidRequest(String),
    InvalidData(String),
}

impl RepoError {
    pub fn store(backend: RepositoryMode, source: impl Error + Send + Sync + 'static) -> Self {
        Self::Store {
            backend,
            source: Box::new(source),
        }
    }

    /// True for every failure that originates in the store rather than in
    /// the caller's input.
    pub fn is_store_fault(&self) -> bool {
        matches!(
            self,
            Self::Store { .. } | Self::MissingGeneratedKey | Self::SwapConflict(_)
        )
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store { backend, source } => {
                write!(f, "post store failure ({}): {source}", backend.short_name())
            }
            Self::MissingGeneratedKey => write!(f, "post insert returned no generated id"),
            Self::SwapConflict(id) => {
                write!(f, "display order swap for post {id} did not apply cleanly")
            }
            Self::InvalidRequest(message) => write!(f, "invalid repository request: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted post data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store { source, .. } => Some(source.as_ref()),
            Self::MissingGeneratedKey
            | Self::SwapConflict(_)
            | Self::InvalidRequest(_)
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::store(RepositoryMode::DirectStatement, value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::store(RepositoryMode::DirectStatement, value)
    }
}

impl From<sqlx::Error> for RepoError {
    fn from(value: sqlx::Error) -> Self {
        Self::store(RepositoryMode::LightweightMapping, value)
    }
}

impl From<sea_orm::DbErr> for RepoError {
    fn from(value: sea_orm::DbErr) -> Self {
        match value {
            sea_orm::DbErr::RecordNotInserted => Self::MissingGeneratedKey,
            other => Self::store(RepositoryMode::FullMapping, other),
        }
    }
}

impl From<ConfigError> for RepoError {
    fn from(value: ConfigError) -> Self {
        Self::InvalidRequest(value.to_string())
    }
}

/// Data-access contract for posts.
///
/// Implementations are interchangeable: identical inputs against identical
/// store state give identical results, ids and timestamps aside.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Backend answering this repository.
    fn backend(&self) -> RepositoryMode;

    /// Inserts a post at the end of the manual order.
    ///
    /// Assigns `created = now`, `is_deleted = false` and
    /// `display_order = 1 + max(live display_order)` in one atomic step.
    async fn add(&self, post: &NewPost) -> RepoResult<Post>;

    /// Lists all live posts by display order.
    async fn get_all(&self) -> RepoResult<Vec<Post>>;

    /// Loads one live post.
    async fn get_by_id(&self, id: PostId) -> RepoResult<Option<Post>>;

    /// Writes `active`, `name` and `category` of a live post.
    ///
    /// Returns `false` when no live post has `post.id`.
    async fn update(&self, post: &Post) -> RepoResult<bool>;

    /// Soft-deletes a live post. Returns `false` if it was absent or
    /// already deleted.
    async fn delete(&self, id: PostId) -> RepoResult<bool>;

    /// Lists one filtered, sorted page plus the total match count.
    async fn get_all_paged(&self, request: &PageRequest) -> RepoResult<PagedResult<Post>>;

    /// Swaps a post's display order with its neighbor in `direction`.
    ///
    /// Returns `false` without side effects when the post is absent or has
    /// no neighbor in that direction.
    async fn reorder(&self, id: PostId, direction: MoveDirection) -> RepoResult<bool>;

    async fn move_up(&self, id: PostId) -> RepoResult<bool> {
        self.reorder(id, MoveDirection::Up).await
    }

    async fn move_down(&self, id: PostId) -> RepoResult<bool> {
        self.reorder(id, MoveDirection::Down).await
    }
}

#[cfg(test)]
mod tests {
    use super::RepoError;
    use crate::config::{ConfigError, RepositoryMode};
    use std::error::Error;

    #[test]
    fn store_faults_are_classified() {
        let store = RepoError::from(rusqlite::Error::InvalidQuery);
        assert!(store.is_store_fault());
        assert!(store.source().is_some());
        assert!(RepoError::MissingGeneratedKey.is_store_fault());
        assert!(RepoError::SwapConflict(4).is_store_fault());
        assert!(!RepoError::InvalidRequest("page".to_string()).is_store_fault());
    }

    #[test]
    fn driver_errors_keep_backend_label() {
        let err = RepoError::from(sqlx::Error::RowNotFound);
        match &err {
            RepoError::Store { backend, .. } => {
                assert_eq!(*backend, RepositoryMode::LightweightMapping)
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("mapped"));
    }

    #[test]
    fn orm_insert_without_key_is_missing_key() {
        let err = RepoError::from(sea_orm::DbErr::RecordNotInserted);
        assert!(matches!(err, RepoError::MissingGeneratedKey));
    }

    #[test]
    fn config_errors_become_invalid_requests() {
        let err = RepoError::from(ConfigError::MissingConnectionString);
        assert!(matches!(err, RepoError::InvalidRequest(_)));
    }
}
