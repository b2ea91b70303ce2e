//! SQLite migration registry and executor.
//!
//! # Responsibility
//! - Register schema migrations in strictly increasing order.
//! - Apply pending migrations atomically.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - Every backend adapter reads the schema this module writes; none of
//!   them creates tables on its own.
//! - A database reported at the latest version carries every `posts` column
//!   the adapters map; this is checked on every bootstrap.

use crate::db::{DbError, DbResult};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("0001_posts.sql"),
}];

/// Columns of `posts` mapped by every repository backend.
const POST_COLUMNS: &[&str] = &[
    "id",
    "active",
    "created",
    "created_by",
    "name",
    "title",
    "category",
    "display_order",
    "is_deleted",
    "file_name",
];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies all pending migrations on the provided connection.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return verify_post_columns(conn);
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS
        .iter()
        .filter(|migration| migration.version > current_version)
    {
        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    }
    verify_post_columns(&tx)?;
    tx.commit()?;

    Ok(())
}

/// Fails with `DbError::IncompleteSchema` unless `posts` has every mapped
/// column.
pub fn verify_post_columns(conn: &Connection) -> DbResult<()> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('posts');")?;
    let present = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    match POST_COLUMNS
        .iter()
        .find(|column| !present.iter().any(|name| name == *column))
    {
        Some(column) => Err(DbError::IncompleteSchema {
            table: "posts",
            missing_column: (*column).to_string(),
        }),
        None => Ok(()),
    }
}

/// Reads the schema version mirrored in `PRAGMA user_version`.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
