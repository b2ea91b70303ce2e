//! Full-mapping post repository over `sea-orm`.
//!
//! # Responsibility
//! - Implement `PostRepository` through the `posts` entity and the query
//!   builder. No SQL text is written here.
//!
//! # Invariants
//! - Every read starts from `live()`, the one soft-delete scope.
//! - `add` is one `INSERT ... SELECT`, so the max order is read under the
//!   write lock.
//! - Reorder opens with a write, so concurrent moves wait on the busy
//!   timeout instead of failing a lock upgrade.
//! - A failed reorder is rolled back explicitly before the error surfaces.

use crate::config::RepositoryMode;
use crate::db::connect_pool;
use crate::model::page::{PageRequest, PagedResult, SortOrder};
use crate::model::post::{now_utc, NewPost, Post, PostId};
use crate::repo::orm_entity::{Column, Entity};
use crate::repo::query::{order_overflow, page_window, PostFilter, LIKE_ESCAPE, MAX_DISPLAY_ORDER};
use crate::repo::reorder::{
    ensure_single_row, log_outcome, MoveDirection, OrderAssignment, OrderSlot, ReorderPlan,
};
use crate::repo::{PostRepository, RepoError, RepoResult};
use async_trait::async_trait;
use log::{debug, info, warn};
use sea_orm::sea_query::{Alias, Expr, Func, InsertStatement, LikeExpr, Query};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait, Select,
    SqlxSqliteConnector, TransactionTrait,
};
use sqlx::sqlite::SqlitePool;
use std::path::Path;

const BACKEND: RepositoryMode = RepositoryMode::FullMapping;

/// `sea-orm`-backed post repository.
#[derive(Debug, Clone)]
pub struct OrmPostRepository {
    db: DatabaseConnection,
}

impl OrmPostRepository {
    pub fn from_connection(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self::from_connection(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// Connects to an already bootstrapped database file.
    pub async fn connect(db_path: &Path) -> RepoResult<Self> {
        let pool = connect_pool(db_path)
            .await
            .map_err(|err| RepoError::store(BACKEND, err))?;
        Ok(Self::from_pool(pool))
    }
}

/// Every live post; the base of all queries in this backend.
fn live() -> Select<Entity> {
    Entity::find().filter(Column::IsDeleted.eq(false))
}

fn sorted(query: Select<Entity>, sort_order: SortOrder) -> Select<Entity> {
    let query = match sort_order {
        SortOrder::Name => query.order_by_asc(Column::Name),
        SortOrder::NameDesc => query.order_by_desc(Column::Name),
        SortOrder::DisplayOrder => query.order_by_asc(Column::DisplayOrder),
    };
    query.order_by_asc(Column::Id)
}

/// `INSERT ... SELECT` appending `post` after the live maximum order in one
/// statement. Yields no row when the maximum is already `MAX_DISPLAY_ORDER`.
fn append_statement(post: &NewPost) -> RepoResult<InsertStatement> {
    let top = Alias::new("top");
    let latest = Alias::new("latest");

    let live_max = Query::select()
        .expr_as(
            Func::coalesce([Expr::col(Column::DisplayOrder).max(), Expr::val(0).into()]),
            top.clone(),
        )
        .from(Entity)
        .and_where(Expr::col(Column::IsDeleted).eq(false))
        .to_owned();
    let source = Query::select()
        .expr(Expr::val(post.stored_active()))
        .expr(Expr::val(now_utc()))
        .expr(Expr::val(post.created_by.clone()))
        .expr(Expr::val(post.name.clone()))
        .expr(Expr::val(post.title.clone()))
        .expr(Expr::val(post.category.clone()))
        .expr(Expr::col((latest.clone(), top.clone())).add(1))
        .expr(Expr::val(post.file_name.clone()))
        .expr(Expr::val(false))
        .from_subquery(live_max, latest.clone())
        .and_where(Expr::col((latest, top)).lt(MAX_DISPLAY_ORDER))
        .to_owned();

    let mut insert = Query::insert();
    insert
        .into_table(Entity)
        .columns([
            Column::Active,
            Column::Created,
            Column::CreatedBy,
            Column::Name,
            Column::Title,
            Column::Category,
            Column::DisplayOrder,
            Column::FileName,
            Column::IsDeleted,
        ])
        .select_from(source)
        .map_err(|err| RepoError::store(BACKEND, err))?
        .returning_col(Column::Id);
    Ok(insert)
}

#[async_trait]
impl PostRepository for OrmPostRepository {
    fn backend(&self) -> RepositoryMode {
        BACKEND
    }

    async fn add(&self, post: &NewPost) -> RepoResult<Post> {
        let insert = append_statement(post)?;
        let txn = self.db.begin().await?;

        let id: PostId = txn
            .query_one(txn.get_database_backend().build(&insert))
            .await?
            .ok_or_else(order_overflow)?
            .try_get("", "id")?;
        let inserted = Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(RepoError::MissingGeneratedKey)?;
        txn.commit().await?;

        info!(
            "event=post_add module=repo backend={} status=ok id={} display_order={}",
            BACKEND.short_name(),
            inserted.id,
            inserted.display_order
        );
        Ok(inserted.into())
    }

    async fn get_all(&self) -> RepoResult<Vec<Post>> {
        let models = sorted(live(), SortOrder::DisplayOrder).all(&self.db).await?;
        Ok(models.into_iter().map(Post::from).collect())
    }

    async fn get_by_id(&self, id: PostId) -> RepoResult<Option<Post>> {
        let model = live().filter(Column::Id.eq(id)).one(&self.db).await?;
        Ok(model.map(Post::from))
    }

    async fn update(&self, post: &Post) -> RepoResult<bool> {
        let changed = Entity::update_many()
            .col_expr(Column::Active, Expr::value(post.is_active()))
            .col_expr(Column::Name, Expr::value(post.name.clone()))
            .col_expr(Column::Category, Expr::value(post.category.clone()))
            .filter(Column::Id.eq(post.id))
            .filter(Column::IsDeleted.eq(false))
            .exec(&self.db)
            .await?
            .rows_affected;

        debug!(
            "event=post_update module=repo backend={} id={} changed={}",
            BACKEND.short_name(),
            post.id,
            changed
        );
        Ok(changed > 0)
    }

    async fn delete(&self, id: PostId) -> RepoResult<bool> {
        let changed = Entity::update_many()
            .col_expr(Column::IsDeleted, Expr::value(true))
            .filter(Column::Id.eq(id))
            .filter(Column::IsDeleted.eq(false))
            .exec(&self.db)
            .await?
            .rows_affected;

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
        page_window(request)?;
        let filter = PostFilter::from_request(request);
        let query = live()
            .apply_if(filter.category, |query, category| {
                query.filter(Column::Category.eq(category))
            })
            .apply_if(filter.name_pattern, |query, pattern| {
                query.filter(Column::Name.like(LikeExpr::new(pattern).escape(LIKE_ESCAPE)))
            });

        let txn = self.db.begin().await?;
        let total_count = query.clone().count(&txn).await?;
        let models = sorted(query, request.sort_order)
            .offset(request.offset())
            .limit(u64::from(request.page_size))
            .all(&txn)
            .await?;
        txn.commit().await?;

        Ok(PagedResult::new(
            models.into_iter().map(Post::from).collect(),
            total_count,
        ))
    }

    async fn reorder(&self, id: PostId, direction: MoveDirection) -> RepoResult<bool> {
        let outcome = self.reorder_in_transaction(id, direction).await;
        log_outcome(BACKEND, id, direction, &outcome);
        Ok(matches!(outcome?, ReorderPlan::Swap { .. }))
    }
}

impl OrmPostRepository {
    async fn reorder_in_transaction(
        &self,
        id: PostId,
        direction: MoveDirection,
    ) -> RepoResult<ReorderPlan> {
        let txn = self.db.begin().await?;
        match swap_with_neighbor(&txn, id, direction).await {
            Ok(plan @ ReorderPlan::Swap { .. }) => {
                txn.commit().await?;
                Ok(plan)
            }
            Ok(plan) => {
                txn.rollback().await?;
                Ok(plan)
            }
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
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
    txn: &DatabaseTransaction,
    id: PostId,
    direction: MoveDirection,
) -> RepoResult<ReorderPlan> {
    // Takes the write lock before the first read.
    Entity::update_many()
        .col_expr(Column::DisplayOrder, Expr::col(Column::DisplayOrder).into())
        .filter(Column::Id.eq(id))
        .exec(txn)
        .await?;

    let current = order_slot(live().filter(Column::Id.eq(id)), txn).await?;
    let neighbor = match current {
        Some(current) => {
            let candidates = match direction {
                MoveDirection::Up => live()
                    .filter(Column::DisplayOrder.lt(current.display_order))
                    .order_by_desc(Column::DisplayOrder)
                    .order_by_desc(Column::Id),
                MoveDirection::Down => live()
                    .filter(Column::DisplayOrder.gt(current.display_order))
                    .order_by_asc(Column::DisplayOrder)
                    .order_by_asc(Column::Id),
            };
            order_slot(candidates, txn).await?
        }
        None => None,
    };

    let plan = ReorderPlan::locate(direction, current, neighbor)?;
    if let Some(assignments) = plan.assignments() {
        for assignment in assignments {
            assign_order(txn, assignment).await?;
        }
    }
    Ok(plan)
}

async fn order_slot(
    query: Select<Entity>,
    txn: &DatabaseTransaction,
) -> RepoResult<Option<OrderSlot>> {
    let slot = query
        .select_only()
        .column(Column::Id)
        .column(Column::DisplayOrder)
        .into_tuple::<(PostId, i32)>()
        .one(txn)
        .await?;
    Ok(slot.map(OrderSlot::from))
}

async fn assign_order(conn: &impl ConnectionTrait, assignment: OrderAssignment) -> RepoResult<()> {
    let changed = Entity::update_many()
        .col_expr(Column::DisplayOrder, Expr::value(assignment.display_order))
        .filter(Column::Id.eq(assignment.id))
        .filter(Column::IsDeleted.eq(false))
        .exec(conn)
        .await?
        .rows_affected;
    ensure_single_row(assignment, changed)
}
