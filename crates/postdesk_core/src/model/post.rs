//! Post domain model.
//!
//! # Responsibility
//! - Define the canonical post record shared by all repository backends.
//! - Define the creation input, which carries no store-assigned fields.
//!
//! # Invariants
//! - `id` is assigned once by the store and never reused.
//! - `created` is set at insert time and never modified.
//! - `display_order` changes only through reorder operations.
//! - `is_deleted` is the source of truth for tombstone state.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned surrogate key.
pub type PostId = i64;

/// Canonical post record as persisted in the `posts` table.
///
/// Column names match field names, so the lightweight-mapping backend maps
/// rows straight into this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: PostId,
    /// Tri-state enablement flag. `None` reads as active.
    pub active: Option<bool>,
    /// UTC insert timestamp, microsecond precision.
    pub created: DateTime<Utc>,
    pub created_by: Option<String>,
    /// Primary search target for paged listing.
    pub name: Option<String>,
    pub title: Option<String>,
    /// Exact-match filter for paged listing.
    pub category: Option<String>,
    /// Manual rank among live posts.
    pub display_order: i32,
    pub is_deleted: bool,
    /// Reference to a file held by the storage collaborator.
    pub file_name: Option<String>,
}

impl Post {
    /// Returns whether this post is enabled. Unset reads as enabled.
    pub fn is_active(&self) -> bool {
        self.active.unwrap_or(true)
    }

    /// Returns whether this post is still visible to repository operations.
    pub fn is_live(&self) -> bool {
        !self.is_deleted
    }
}

/// Input for `PostRepository::add`.
///
/// Id, creation time, display order and tombstone state are always assigned
/// by the repository, so they are absent here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub active: Option<bool>,
    pub created_by: Option<String>,
    pub name: Option<String>,
    pub title: Option<String>,
    pub category: Option<String>,
    pub file_name: Option<String>,
}

impl NewPost {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn created_by(mut self, author: impl Into<String>) -> Self {
        self.created_by = Some(author.into());
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Value persisted for `active`; unset becomes `true`.
    pub(crate) fn stored_active(&self) -> bool {
        self.active.unwrap_or(true)
    }
}

/// Current UTC time truncated to what every backend round-trips losslessly.
pub(crate) fn now_utc() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

#[cfg(test)]
mod tests {
    use super::{now_utc, NewPost, Post};
    use chrono::Timelike;

    fn sample() -> Post {
        Post {
            id: 7,
            active: None,
            created: now_utc(),
            created_by: None,
            name: Some("alpha".to_string()),
            title: None,
            category: None,
            display_order: 1,
            is_deleted: false,
            file_name: None,
        }
    }

    #[test]
    fn unset_active_reads_as_active() {
        let mut post = sample();
        assert!(post.is_active());
        post.active = Some(false);
        assert!(!post.is_active());
    }

    #[test]
    fn new_post_defaults_to_active_when_stored() {
        assert!(NewPost::named("a").stored_active());
        let disabled = NewPost {
            active: Some(false),
            ..NewPost::default()
        };
        assert!(!disabled.stored_active());
    }

    #[test]
    fn now_utc_has_microsecond_precision() {
        assert_eq!(now_utc().nanosecond() % 1_000, 0);
    }
}
