//! Backend selection.
//!
//! # Responsibility
//! - Bootstrap the database file named by a `RepositoryConfig`.
//! - Construct exactly one repository adapter for the selected mode.
//!
//! # Invariants
//! - Migrations are applied before any adapter is constructed.
//! - Callers only ever see `dyn PostRepository`.

use crate::config::{RepositoryConfig, RepositoryMode};
use crate::db::open_db;
use crate::repo::mapped_repo::MappedPostRepository;
use crate::repo::orm_repo::OrmPostRepository;
use crate::repo::statement_repo::StatementPostRepository;
use crate::repo::{PostRepository, RepoError, RepoResult};
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Bootstraps the store and returns the configured repository.
pub async fn build_repository(config: &RepositoryConfig) -> RepoResult<Arc<dyn PostRepository>> {
    let started_at = Instant::now();
    let mode = config.mode;
    let db_path = config.database_path()?;

    let result = async {
        bootstrap(mode, db_path.clone()).await?;
        let repo: Arc<dyn PostRepository> = match mode {
            RepositoryMode::DirectStatement => Arc::new(StatementPostRepository::new(db_path)),
            RepositoryMode::LightweightMapping => {
                Arc::new(MappedPostRepository::connect(&db_path).await?)
            }
            RepositoryMode::FullMapping => Arc::new(OrmPostRepository::connect(&db_path).await?),
        };
        Ok(repo)
    }
    .await;

    match &result {
        Ok(_) => info!(
            "event=repo_select module=registry status=ok backend={} duration_ms={}",
            mode.short_name(),
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=repo_select module=registry status=error backend={} duration_ms={} error={}",
            mode.short_name(),
            started_at.elapsed().as_millis(),
            err
        ),
    }
    result
}

async fn bootstrap(mode: RepositoryMode, db_path: PathBuf) -> RepoResult<()> {
    tokio::task::spawn_blocking(move || open_db(&db_path).map(drop))
        .await
        .map_err(|err| RepoError::store(mode, err))?
        .map_err(|err| RepoError::store(mode, err))
}
