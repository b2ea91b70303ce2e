//! Pooled async connections for the mapped and ORM backends.
//!
//! The pool never creates or migrates the database; `open_db` must have run
//! against the same file first.

use super::BUSY_TIMEOUT;
use log::info;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;

const MAX_CONNECTIONS: u32 = 4;

/// Connects a small pool to an already bootstrapped database file.
pub async fn connect_pool(path: &Path) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(false)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(BUSY_TIMEOUT)
        .connect_with(options)
        .await?;

    info!(
        "event=db_pool_open module=db status=ok max_connections={}",
        MAX_CONNECTIONS
    );
    Ok(pool)
}
