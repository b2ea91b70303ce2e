#![allow(dead_code)]

use postdesk_core::{
    build_repository, NewPost, Post, PostId, PostRepository, RepositoryConfig, RepositoryMode,
};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// One freshly bootstrapped database behind one backend.
pub struct Harness {
    pub mode: RepositoryMode,
    pub repo: Arc<dyn PostRepository>,
    pub db_path: PathBuf,
    _dir: TempDir,
}

pub async fn harness(mode: RepositoryMode) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join(format!("{}.db", mode.short_name()));
    let config = RepositoryConfig::new(mode, db_path.to_str().unwrap());
    let repo = build_repository(&config).await.unwrap();
    assert_eq!(repo.backend(), mode);
    Harness {
        mode,
        repo,
        db_path,
        _dir: dir,
    }
}

impl Harness {
    pub async fn seed(&self, names: &[&str]) -> Vec<Post> {
        let mut posts = Vec::with_capacity(names.len());
        for name in names {
            posts.push(self.repo.add(&NewPost::named(*name)).await.unwrap());
        }
        posts
    }

    /// Names of all live posts in listing order.
    pub async fn names(&self) -> Vec<String> {
        self.repo
            .get_all()
            .await
            .unwrap()
            .into_iter()
            .map(|post| post.name.unwrap_or_default())
            .collect()
    }

    pub async fn order_of(&self, id: PostId) -> i32 {
        self.repo
            .get_by_id(id)
            .await
            .unwrap()
            .unwrap()
            .display_order
    }

    /// Out-of-band connection for arranging state the contract cannot.
    pub fn raw(&self) -> Connection {
        raw_connection(&self.db_path)
    }

    pub fn set_display_order(&self, id: PostId, display_order: i32) {
        self.raw()
            .execute(
                "UPDATE posts SET display_order = ?1 WHERE id = ?2;",
                rusqlite::params![display_order, id],
            )
            .unwrap();
    }

    /// Makes any `display_order` write to `id` abort.
    pub fn fail_order_writes_to(&self, id: PostId) {
        self.raw()
            .execute_batch(&format!(
                "CREATE TRIGGER fail_order_write
                 BEFORE UPDATE OF display_order ON posts
                 WHEN NEW.id = {id}
                 BEGIN
                    SELECT RAISE(ABORT, 'injected order write failure');
                 END;"
            ))
            .unwrap();
    }
}

pub fn raw_connection(path: &Path) -> Connection {
    let conn = Connection::open(path).unwrap();
    conn.busy_timeout(std::time::Duration::from_secs(5)).unwrap();
    conn
}

/// Strips store-assigned identity so posts from different stores compare.
pub fn comparable(post: &Post) -> (Option<bool>, Option<String>, Option<String>, i32, bool) {
    (
        post.active,
        post.name.clone(),
        post.category.clone(),
        post.display_order,
        post.is_deleted,
    )
}
