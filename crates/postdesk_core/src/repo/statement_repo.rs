//! Direct-statement post repository over `rusqlite`.
//!
//! # Responsibility
//! - Implement `PostRepository` with hand-written statements and positional
//!   column reads.
//! - Run each call on a blocking worker with its own connection.
//!
//! # Invariants
//! - The connection is opened inside the call and dropped on every exit path.
//! - Reorder runs in one `IMMEDIATE` transaction; dropping it uncommitted
//!   rolls both writes back.

use crate::config::RepositoryMode;
use crate::db::connect_existing;
use crate::model::page::{PageRequest, PagedResult};
use crate::model::post::{now_utc, NewPost, Post, PostId};
use crate::repo::query::{
    count_from_sql, neighbor_sql, order_by_sql, order_overflow, page_window, PostFilter,
    NEXT_ORDER_SOURCE, POST_COLUMNS,
};
use crate::repo::reorder::{
    ensure_single_row, log_outcome, MoveDirection, OrderSlot, ReorderPlan,
};
use crate::repo::{PostRepository, RepoError, RepoResult};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const BACKEND: RepositoryMode = RepositoryMode::DirectStatement;

/// `rusqlite`-backed post repository.
#[derive(Debug, Clone)]
pub struct StatementPostRepository {
    db_path: Arc<PathBuf>,
}

impl StatementPostRepository {
    /// Creates a repository over an already bootstrapped database file.
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: Arc::new(db_path.into()),
        }
    }

    pub fn db_path(&self) -> &Path {
        self.db_path.as_path()
    }

    async fn with_connection<T, F>(&self, work: F) -> RepoResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> RepoResult<T> + Send + 'static,
    {
        let db_path = Arc::clone(&self.db_path);
        tokio::task::spawn_blocking(move || {
            let mut conn = connect_existing(db_path.as_path())?;
            work(&mut conn)
        })
        .await
        .map_err(|err| RepoError::store(BACKEND, err))?
    }
}

#[async_trait]
impl PostRepository for StatementPostRepository {
    fn backend(&self) -> RepositoryMode {
        BACKEND
    }

    async fn add(&self, post: &NewPost) -> RepoResult<Post> {
        let post = post.clone();
        let created = self
            .with_connection(move |conn| insert_post(conn, post))
            .await?;
        info!(
            "event=post_add module=repo backend={} status=ok id={} display_order={}",
            BACKEND.short_name(),
            created.id,
            created.display_order
        );
        Ok(created)
    }

    async fn get_all(&self) -> RepoResult<Vec<Post>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {POST_COLUMNS}
                 FROM posts
                 WHERE is_deleted = 0
                 ORDER BY display_order ASC, id ASC;"
            ))?;
            let rows = stmt.query_map([], read_post)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
    }

    async fn get_by_id(&self, id: PostId) -> RepoResult<Option<Post>> {
        self.with_connection(move |conn| {
            let post = conn
                .query_row(
                    &format!(
                        "SELECT {POST_COLUMNS}
                         FROM posts
                         WHERE id = ?1
                           AND is_deleted = 0;"
                    ),
                    [id],
                    read_post,
                )
                .optional()?;
            Ok(post)
        })
        .await
    }

    async fn update(&self, post: &Post) -> RepoResult<bool> {
        let (id, active, name, category) = (
            post.id,
            post.is_active(),
            post.name.clone(),
            post.category.clone(),
        );
        let changed = self
            .with_connection(move |conn| {
                Ok(conn.execute(
                    "UPDATE posts
                     SET
                        active = ?1,
                        name = ?2,
                        category = ?3
                     WHERE id = ?4
                       AND is_deleted = 0;",
                    params![active, name, category, id],
                )?)
            })
            .await?;
        debug!(
            "event=post_update module=repo backend={} id={} changed={}",
            BACKEND.short_name(),
            id,
            changed
        );
        Ok(changed > 0)
    }

    async fn delete(&self, id: PostId) -> RepoResult<bool> {
        let changed = self
            .with_connection(move |conn| {
                Ok(conn.execute(
                    "UPDATE posts
                     SET is_deleted = 1
                     WHERE id = ?1
                       AND is_deleted = 0;",
                    [id],
                )?)
            })
            .await?;
        if changed > 0 {
            info!(
                "event=post_delete module=repo backend={} status=ok id={}",
                BACKEND.short_name(),
                id
            );
        }
        Ok(changed > 0)
    }

    async fn get_all_paged(&self, request: &PageRequest) -> RepoResult<PagedResult<Post>> {
        let (limit, offset) = page_window(request)?;
        let filter = PostFilter::from_request(request);
        let order_by = order_by_sql(request.sort_order);

        self.with_connection(move |conn| {
            let (where_sql, binds) = filter.where_sql();
            let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;

            let total: i64 = tx.query_row(
                &format!("SELECT COUNT(*) FROM posts WHERE {where_sql};"),
                params_from_iter(binds.iter()),
                |row| row.get(0),
            )?;

            let mut page_binds: Vec<Value> = binds.into_iter().map(Value::Text).collect();
            page_binds.push(Value::Integer(limit));
            page_binds.push(Value::Integer(offset));

            let items = {
                let mut stmt = tx.prepare(&format!(
                    "SELECT {POST_COLUMNS}
                     FROM posts
                     WHERE {where_sql}
                     {order_by}
                     LIMIT ? OFFSET ?;"
                ))?;
                let rows = stmt.query_map(params_from_iter(page_binds), read_post)?;
                rows.collect::<Result<Vec<_>, _>>()?
            };
            tx.commit()?;

            Ok(PagedResult::new(items, count_from_sql(total)?))
        })
        .await
    }

    async fn reorder(&self, id: PostId, direction: MoveDirection) -> RepoResult<bool> {
        let outcome = self
            .with_connection(move |conn| swap_with_neighbor(conn, id, direction))
            .await;
        log_outcome(BACKEND, id, direction, &outcome);
        Ok(matches!(outcome?, ReorderPlan::Swap { .. }))
    }
}

fn insert_post(conn: &mut Connection, post: NewPost) -> RepoResult<Post> {
    let created = now_utc();
    let inserted: Option<(PostId, i32)> = conn
        .query_row(
            &format!(
                "INSERT INTO posts (
                    active,
                    created,
                    created_by,
                    name,
                    title,
                    category,
                    display_order,
                    file_name,
                    is_deleted
                 )
                 SELECT ?1, ?2, ?3, ?4, ?5, ?6, live.top + 1, ?7, 0
                 FROM {NEXT_ORDER_SOURCE}
                 RETURNING id, display_order;"
            ),
            params![
                post.stored_active(),
                created_to_sql(&created),
                post.created_by.as_deref(),
                post.name.as_deref(),
                post.title.as_deref(),
                post.category.as_deref(),
                post.file_name.as_deref(),
            ],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let (id, display_order) = inserted.ok_or_else(order_overflow)?;
    Ok(Post {
        id,
        active: Some(post.stored_active()),
        created,
        created_by: post.created_by,
        name: post.name,
        title: post.title,
        category: post.category,
        display_order,
        is_deleted: false,
        file_name: post.file_name,
    })
}

fn swap_with_neighbor(
    conn: &mut Connection,
    id: PostId,
    direction: MoveDirection,
) -> RepoResult<ReorderPlan> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let current = tx
        .query_row(
            "SELECT id, display_order
             FROM posts
             WHERE id = ?1
               AND is_deleted = 0;",
            [id],
            read_slot,
        )
        .optional()?;
    let neighbor = match current {
        Some(current) => tx
            .query_row(neighbor_sql(direction), [current.display_order], read_slot)
            .optional()?,
        None => None,
    };

    let plan = ReorderPlan::locate(direction, current, neighbor)?;
    if let Some(assignments) = plan.assignments() {
        for assignment in assignments {
            let changed = tx.execute(
                "UPDATE posts
                 SET display_order = ?2
                 WHERE id = ?1
                   AND is_deleted = 0;",
                params![assignment.id, assignment.display_order],
            )?;
            ensure_single_row(assignment, changed as u64)?;
        }
        tx.commit()?;
    }
    Ok(plan)
}

fn read_post(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        active: row.get(1)?,
        created: row.get(2)?,
        created_by: row.get(3)?,
        name: row.get(4)?,
        title: row.get(5)?,
        category: row.get(6)?,
        display_order: row.get(7)?,
        is_deleted: row.get(8)?,
        file_name: row.get(9)?,
    })
}

fn read_slot(row: &Row<'_>) -> rusqlite::Result<OrderSlot> {
    Ok(OrderSlot {
        id: row.get(0)?,
        display_order: row.get(1)?,
    })
}

fn created_to_sql(created: &DateTime<Utc>) -> String {
    created.to_rfc3339_opts(SecondsFormat::Micros, true)
}
