//! Attachment storage for posts.
//!
//! # Responsibility
//! - Define the upload/download/delete contract for files referenced by
//!   `Post::file_name`.
//! - Validate and uniquify file names before they reach a backend.
//!
//! # Invariants
//! - A stored name is a single path component; it never escapes the root.
//! - Uploads never overwrite an existing file.
//! - Deleting a missing file succeeds.

use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use tokio::io::AsyncRead;

mod local;

pub use local::LocalPostStorage;

/// Public path prefix returned for uploaded files.
pub const PUBLIC_PREFIX: &str = "/files/posts/";

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug)]
pub enum StorageError {
    InvalidName(String),
    NotFound(String),
    Io(std::io::Error),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(name) => write!(f, "invalid attachment name `{name}`"),
            Self::NotFound(name) => write!(f, "attachment not found: {name}"),
            Self::Io(err) => write!(f, "attachment io error: {err}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::InvalidName(_) | Self::NotFound(_) => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// File side-channel used next to the post repository.
#[async_trait]
pub trait PostStorage: Send + Sync {
    /// Stores the reader's bytes under a free variant of `file_name` and
    /// returns the public reference (`/files/posts/<stored name>`).
    async fn upload(
        &self,
        reader: &mut (dyn AsyncRead + Unpin + Send),
        file_name: &str,
    ) -> StorageResult<String>;

    /// Reads a stored file by name or public reference.
    async fn download(&self, file_name: &str) -> StorageResult<Vec<u8>>;

    /// Removes a stored file by name or public reference.
    async fn delete(&self, file_name: &str) -> StorageResult<()>;
}

/// Returns the stored name for a bare name or a public reference.
///
/// Rejects blank names, `.`/`..`, and anything containing a path separator.
pub fn resolve_name(file_name: &str) -> StorageResult<&str> {
    let name = file_name.strip_prefix(PUBLIC_PREFIX).unwrap_or(file_name);
    let invalid = name.trim().is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if invalid {
        return Err(StorageError::InvalidName(file_name.to_string()));
    }
    Ok(name)
}

pub fn public_reference(stored_name: &str) -> String {
    format!("{PUBLIC_PREFIX}{stored_name}")
}

/// The `attempt`-th candidate for `name`: `report.pdf`, `report(1).pdf`, ...
pub(crate) fn candidate_name(name: &str, attempt: u32) -> String {
    if attempt == 0 {
        return name.to_string();
    }
    let path = Path::new(name);
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(name);
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => format!("{stem}({attempt}).{ext}"),
        None => format!("{stem}({attempt})"),
    }
}
