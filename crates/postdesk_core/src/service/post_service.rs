//! Post use-case service.
//!
//! # Responsibility
//! - Provide stable entry points for post management callers.
//! - Keep attachment cleanup in step with soft deletion.
//!
//! # Invariants
//! - Persistence always goes through the repository contract.
//! - An attachment is removed before its post is soft-deleted; a failed
//!   removal leaves the post untouched.

use crate::model::page::{PageRequest, PagedResult};
use crate::model::post::{NewPost, Post, PostId};
use crate::repo::{PostRepository, RepoError, RepoResult};
use crate::storage::{PostStorage, StorageError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    Repo(RepoError),
    Storage(StorageError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<StorageError> for ServiceError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// Use-case wrapper around one repository and an optional attachment store.
#[derive(Clone)]
pub struct PostService {
    repo: Arc<dyn PostRepository>,
    storage: Option<Arc<dyn PostStorage>>,
}

impl PostService {
    pub fn new(repo: Arc<dyn PostRepository>) -> Self {
        Self {
            repo,
            storage: None,
        }
    }

    pub fn with_storage(mut self, storage: Arc<dyn PostStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn repository(&self) -> &Arc<dyn PostRepository> {
        &self.repo
    }

    pub async fn create(&self, post: &NewPost) -> RepoResult<Post> {
        self.repo.add(post).await
    }

    pub async fn page(&self, request: &PageRequest) -> RepoResult<PagedResult<Post>> {
        self.repo.get_all_paged(request).await
    }

    pub async fn get(&self, id: PostId) -> RepoResult<Option<Post>> {
        self.repo.get_by_id(id).await
    }

    pub async fn update(&self, post: &Post) -> RepoResult<bool> {
        self.repo.update(post).await
    }

    /// Flips the post's enablement and persists it.
    ///
    /// Returns the new state, or `None` when no live post has `id`.
    pub async fn toggle_active(&self, id: PostId) -> RepoResult<Option<bool>> {
        let Some(mut post) = self.repo.get_by_id(id).await? else {
            return Ok(None);
        };
        let next = !post.is_active();
        post.active = Some(next);
        if !self.repo.update(&post).await? {
            return Ok(None);
        }
        Ok(Some(next))
    }

    /// Soft-deletes a post, removing its attachment first when storage is
    /// configured.
    pub async fn delete(&self, id: PostId) -> ServiceResult<bool> {
        let Some(post) = self.repo.get_by_id(id).await? else {
            return Ok(false);
        };
        if let (Some(storage), Some(file_name)) = (&self.storage, post.file_name.as_deref()) {
            if !file_name.trim().is_empty() {
                storage.delete(file_name).await?;
                info!("event=post_attachment_delete module=service status=ok id={id}");
            }
        }
        Ok(self.repo.delete(id).await?)
    }

    pub async fn move_up(&self, id: PostId) -> RepoResult<bool> {
        self.repo.move_up(id).await
    }

    pub async fn move_down(&self, id: PostId) -> RepoResult<bool> {
        self.repo.move_down(id).await
    }
}
