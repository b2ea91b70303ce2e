//! Listing and lookup rules shared by the SQL-speaking backends.
//!
//! The ORM backend builds the same predicates through its query builder from
//! `PostFilter`; only the rendering differs.

use crate::model::page::{PageRequest, SortOrder};
use crate::repo::reorder::MoveDirection;
use crate::repo::{RepoError, RepoResult};

/// Soft-delete predicate every read and write is scoped by.
pub(crate) const LIVE_PREDICATE: &str = "is_deleted = 0";

/// Escape character used in `LIKE` patterns.
pub(crate) const LIKE_ESCAPE: char = '!';

pub(crate) const POST_COLUMNS: &str = "id,
    active,
    created,
    created_by,
    name,
    title,
    category,
    display_order,
    is_deleted,
    file_name";

/// Largest display order a post can hold.
pub(crate) const MAX_DISPLAY_ORDER: i32 = i32::MAX;

/// `FROM` body for `INSERT ... SELECT`: one row whose `top` is the live
/// maximum order, or no row when `top + 1` would not fit `display_order`.
pub(crate) const NEXT_ORDER_SOURCE: &str = "(
                SELECT COALESCE(MAX(display_order), 0) AS top
                FROM posts
                WHERE is_deleted = 0
             ) AS live
             WHERE live.top < 2147483647";

/// No-op write on the row being moved. Issued first in a deferred
/// transaction so the write lock is taken before any read.
pub(crate) const CLAIM_WRITE_SQL: &str = "UPDATE posts
     SET display_order = display_order
     WHERE id = ?;";

/// Error for an append past `MAX_DISPLAY_ORDER`.
pub(crate) fn order_overflow() -> RepoError {
    RepoError::InvalidData(format!(
        "display order is already at its maximum ({MAX_DISPLAY_ORDER})"
    ))
}

/// Normalized filter of one paged listing request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct PostFilter {
    /// Exact category match, present only for non-blank input.
    pub category: Option<String>,
    /// Escaped `%query%` pattern, present only for non-blank input.
    pub name_pattern: Option<String>,
}

impl PostFilter {
    pub(crate) fn from_request(request: &PageRequest) -> Self {
        Self {
            category: non_blank(&request.category).map(str::to_string),
            name_pattern: non_blank(&request.search_query).map(like_pattern),
        }
    }

    /// Renders the `WHERE` body with `?` placeholders and their values in
    /// placeholder order.
    pub(crate) fn where_sql(&self) -> (String, Vec<String>) {
        let mut clauses = vec![LIVE_PREDICATE.to_string()];
        let mut binds = Vec::new();

        if let Some(category) = &self.category {
            clauses.push("category = ?".to_string());
            binds.push(category.clone());
        }
        if let Some(pattern) = &self.name_pattern {
            clauses.push(format!("name LIKE ? ESCAPE '{LIKE_ESCAPE}'"));
            binds.push(pattern.clone());
        }

        (clauses.join(" AND "), binds)
    }
}

/// Builds a `LIKE` pattern matching `query` literally anywhere in the value.
pub(crate) fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

pub(crate) fn order_by_sql(sort_order: SortOrder) -> &'static str {
    match sort_order {
        SortOrder::Name => "ORDER BY name ASC, id ASC",
        SortOrder::NameDesc => "ORDER BY name DESC, id ASC",
        SortOrder::DisplayOrder => "ORDER BY display_order ASC, id ASC",
    }
}

/// Query for the live neighbor of a row whose order is bound to `?`.
pub(crate) fn neighbor_sql(direction: MoveDirection) -> &'static str {
    match direction {
        MoveDirection::Up => {
            "SELECT id, display_order
             FROM posts
             WHERE is_deleted = 0
               AND display_order < ?
             ORDER BY display_order DESC, id DESC
             LIMIT 1"
        }
        MoveDirection::Down => {
            "SELECT id, display_order
             FROM posts
             WHERE is_deleted = 0
               AND display_order > ?
             ORDER BY display_order ASC, id ASC
             LIMIT 1"
        }
    }
}

/// `LIMIT`/`OFFSET` pair for a validated request.
pub(crate) fn page_window(request: &PageRequest) -> RepoResult<(i64, i64)> {
    if request.page_size == 0 {
        return Err(RepoError::InvalidRequest(
            "page_size must be greater than zero".to_string(),
        ));
    }
    let offset = i64::try_from(request.offset()).map_err(|_| {
        RepoError::InvalidRequest(format!(
            "page {} of size {} is out of range",
            request.page_index, request.page_size
        ))
    })?;
    Ok((i64::from(request.page_size), offset))
}

/// Converts a SQL `COUNT(*)` into the result envelope's count type.
pub(crate) fn count_from_sql(count: i64) -> RepoResult<u64> {
    u64::try_from(count)
        .map_err(|_| RepoError::InvalidData(format!("negative row count {count}")))
}

fn non_blank(value: &str) -> Option<&str> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
