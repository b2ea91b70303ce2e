//! Spreadsheet export of the live post list.
//!
//! # Responsibility
//! - Render `get_all()` as CSV with one header row.
//!
//! # Invariants
//! - Row order is the repository's display order.
//! - Nothing is written when there are no live posts.

use crate::model::post::{Post, PostId};
use crate::repo::{PostRepository, RepoError};
use chrono::FixedOffset;
use log::info;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Write;

/// `Created` column format, rendered in the caller's offset.
pub const CREATED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug)]
pub enum ExportError {
    /// There are no live posts to export.
    Empty,
    Repo(RepoError),
    Csv(csv::Error),
    Io(std::io::Error),
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "no post records found"),
            Self::Repo(err) => write!(f, "export read failed: {err}"),
            Self::Csv(err) => write!(f, "export encode failed: {err}"),
            Self::Io(err) => write!(f, "export write failed: {err}"),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Empty => None,
            Self::Repo(err) => Some(err),
            Self::Csv(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<RepoError> for ExportError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<csv::Error> for ExportError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<std::io::Error> for ExportError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ExportRow<'a> {
    id: PostId,
    name: &'a str,
    title: &'a str,
    category: &'a str,
    created: String,
    created_by: &'a str,
}

impl<'a> ExportRow<'a> {
    fn new(post: &'a Post, offset: &FixedOffset) -> Self {
        Self {
            id: post.id,
            name: post.name.as_deref().unwrap_or_default(),
            title: post.title.as_deref().unwrap_or_default(),
            category: post.category.as_deref().unwrap_or_default(),
            created: post
                .created
                .with_timezone(offset)
                .format(CREATED_FORMAT)
                .to_string(),
            created_by: post.created_by.as_deref().unwrap_or_default(),
        }
    }
}

/// Writes every live post as CSV and returns the number of data rows.
///
/// Columns: `Id,Name,Title,Category,Created,CreatedBy`.
pub async fn export_posts_csv<W: Write>(
    repo: &dyn PostRepository,
    writer: W,
    offset: FixedOffset,
) -> Result<usize, ExportError> {
    let posts = repo.get_all().await?;
    if posts.is_empty() {
        return Err(ExportError::Empty);
    }

    let mut csv_writer = csv::Writer::from_writer(writer);
    for post in &posts {
        csv_writer.serialize(ExportRow::new(post, &offset))?;
    }
    csv_writer.flush()?;

    info!(
        "event=post_export module=export status=ok backend={} rows={}",
        repo.backend().short_name(),
        posts.len()
    );
    Ok(posts.len())
}
