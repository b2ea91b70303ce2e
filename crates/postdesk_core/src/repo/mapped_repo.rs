//! Lightweight-mapping post repository over `sqlx`.
//!
//! # Responsibility
//! - Implement `PostRepository` with hand-written SQL whose rows map into
//!   `Post` by column name.
//!
//! # Invariants
//! - Every call borrows a pooled connection or transaction and returns it on
//!   drop.
//! - Reorder takes the write lock with its first statement, so concurrent
//!   moves wait on the busy timeout instead of failing a lock upgrade.
//! - A failed reorder is rolled back explicitly before the error surfaces.

use crate::config::RepositoryMode;
use crate::db::connect_pool;
use crate::model::page::{PageRequest, PagedResult};
use crate::model::post::{now_utc, NewPost, Post, PostId};
use crate::repo::query::{
    count_from_sql, neighbor_sql, order_by_sql, order_overflow, page_window, PostFilter,
    CLAIM_WRITE_SQL, NEXT_ORDER_SOURCE, POST_COLUMNS,
};
use crate::repo::reorder::{
    ensure_single_row, log_outcome, MoveDirection, OrderSlot, ReorderPlan,
};
use crate::repo::{PostRepository, RepoResult};
use async_trait::async_trait;
use log::{debug, info, warn};
use sqlx::sqlite::{SqliteConnection, SqlitePool};
use std::path::Path;

const BACKEND: RepositoryMode = RepositoryMode::LightweightMapping;

/// `sqlx`-backed post repository.
#[derive(Debug, Clone)]
pub struct MappedPostRepository {
    pool: SqlitePool,
}

impl MappedPostRepository {
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connects a pool to an already bootstrapped database file.
    pub async fn connect(db_path: &Path) -> RepoResult<Self> {
        Ok(Self::from_pool(connect_pool(db_path).await?))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl PostRepository for MappedPostRepository {
    fn backend(&self) -> RepositoryMode {
        BACKEND
    }

    async fn add(&self, post: &NewPost) -> RepoResult<Post> {
        let sql = format!(
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
             SELECT ?, ?, ?, ?, ?, ?, live.top + 1, ?, 0
             FROM {NEXT_ORDER_SOURCE}
             RETURNING {POST_COLUMNS};"
        );
        let created = sqlx::query_as::<_, Post>(&sql)
            .bind(post.stored_active())
            .bind(now_utc())
            .bind(post.created_by.as_deref())
            .bind(post.name.as_deref())
            .bind(post.title.as_deref())
            .bind(post.category.as_deref())
            .bind(post.file_name.as_deref())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(order_overflow)?;

        info!(
            "event=post_add module=repo backend={} status=ok id={} display_order={}",
            BACKEND.short_name(),
            created.id,
            created.display_order
        );
        Ok(created)
    }

    async fn get_all(&self) -> RepoResult<Vec<Post>> {
        let sql = format!(
            "SELECT {POST_COLUMNS}
             FROM posts
             WHERE is_deleted = 0
             ORDER BY display_order ASC, id ASC;"
        );
        Ok(sqlx::query_as::<_, Post>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_by_id(&self, id: PostId) -> RepoResult<Option<Post>> {
        let sql = format!(
            "SELECT {POST_COLUMNS}
             FROM posts
             WHERE id = ?
               AND is_deleted = 0;"
        );
        Ok(sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update(&self, post: &Post) -> RepoResult<bool> {
        let changed = sqlx::query(
            "UPDATE posts
             SET
                active = ?,
                name = ?,
                category = ?
             WHERE id = ?
               AND is_deleted = 0;",
        )
        .bind(post.is_active())
        .bind(post.name.as_deref())
        .bind(post.category.as_deref())
        .bind(post.id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        debug!(
            "event=post_update module=repo backend={} id={} changed={}",
            BACKEND.short_name(),
            post.id,
            changed
        );
        Ok(changed > 0)
    }

    async fn delete(&self, id: PostId) -> RepoResult<bool> {
        let changed = sqlx::query(
            "UPDATE posts
             SET is_deleted = 1
             WHERE id = ?
               AND is_deleted = 0;",
        )
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

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
        let (where_sql, binds) = PostFilter::from_request(request).where_sql();
        let count_sql = format!("SELECT COUNT(*) FROM posts WHERE {where_sql};");
        let page_sql = format!(
            "SELECT {POST_COLUMNS}
             FROM posts
             WHERE {where_sql}
             {}
             LIMIT ? OFFSET ?;",
            order_by_sql(request.sort_order)
        );

        let mut tx = self.pool.begin().await?;

        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        for value in &binds {
            count_query = count_query.bind(value);
        }
        let total = count_query.fetch_one(&mut *tx).await?;

        let mut page_query = sqlx::query_as::<_, Post>(&page_sql);
        for value in &binds {
            page_query = page_query.bind(value);
        }
        let items = page_query
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(PagedResult::new(items, count_from_sql(total)?))
    }

    async fn reorder(&self, id: PostId, direction: MoveDirection) -> RepoResult<bool> {
        let outcome = self.reorder_in_transaction(id, direction).await;
        log_outcome(BACKEND, id, direction, &outcome);
        Ok(matches!(outcome?, ReorderPlan::Swap { .. }))
    }
}

impl MappedPostRepository {
    async fn reorder_in_transaction(
        &self,
        id: PostId,
        direction: MoveDirection,
    ) -> RepoResult<ReorderPlan> {
        let mut tx = self.pool.begin().await?;
        match swap_with_neighbor(&mut *tx, id, direction).await {
            Ok(plan @ ReorderPlan::Swap { .. }) => {
                tx.commit().await?;
                Ok(plan)
            }
            Ok(plan) => {
                tx.rollback().await?;
                Ok(plan)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(
                        "event=post_reorder module=repo backend={} status=rollback_failed id={} error={}",
                        BACKEND.short_name(),
                        id,
                        rollback_err
                    );
                }
                Err(err)
            }
        }
    }
}

async fn swap_with_neighbor(
    conn: &mut SqliteConnection,
    id: PostId,
    direction: MoveDirection,
) -> RepoResult<ReorderPlan> {
    sqlx::query(CLAIM_WRITE_SQL)
        .bind(id)
        .execute(&mut *conn)
        .await?;

    let current = sqlx::query_as::<_, (PostId, i32)>(
        "SELECT id, display_order
         FROM posts
         WHERE id = ?
           AND is_deleted = 0;",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .map(OrderSlot::from);

    let neighbor = match current {
        Some(current) => sqlx::query_as::<_, (PostId, i32)>(neighbor_sql(direction))
            .bind(current.display_order)
            .fetch_optional(&mut *conn)
            .await?
            .map(OrderSlot::from),
        None => None,
    };

    let plan = ReorderPlan::locate(direction, current, neighbor)?;
    if let Some(assignments) = plan.assignments() {
        for assignment in assignments {
            let changed = sqlx::query(
                "UPDATE posts
                 SET display_order = ?
                 WHERE id = ?
                   AND is_deleted = 0;",
            )
            .bind(assignment.display_order)
            .bind(assignment.id)
            .execute(&mut *conn)
            .await?
            .rows_affected();
            ensure_single_row(assignment, changed)?;
        }
    }
    Ok(plan)
}
