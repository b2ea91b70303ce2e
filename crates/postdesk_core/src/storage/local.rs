//! Local-filesystem attachment storage.

use super::{candidate_name, public_reference, resolve_name, PostStorage, StorageError, StorageResult};
use async_trait::async_trait;
use log::{info, warn};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncRead, AsyncWriteExt};

/// Upper bound on `name(n).ext` candidates tried for one upload.
const MAX_NAME_ATTEMPTS: u32 = 10_000;

/// Stores attachments as plain files under one root directory.
#[derive(Debug, Clone)]
pub struct LocalPostStorage {
    root: PathBuf,
}

impl LocalPostStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the first free candidate file, so concurrent uploads of the
    /// same name never share a file.
    async fn claim(&self, name: &str) -> StorageResult<(String, File)> {
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let candidate = candidate_name(name, attempt);
            let opened = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(self.root.join(&candidate))
                .await;
            match opened {
                Ok(file) => return Ok((candidate, file)),
                Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Err(StorageError::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free name after {MAX_NAME_ATTEMPTS} attempts"),
        )))
    }
}

#[async_trait]
impl PostStorage for LocalPostStorage {
    async fn upload(
        &self,
        reader: &mut (dyn AsyncRead + Unpin + Send),
        file_name: &str,
    ) -> StorageResult<String> {
        let name = resolve_name(file_name)?;
        fs::create_dir_all(&self.root).await?;

        let (stored_name, mut file) = self.claim(name).await?;
        let written = match tokio::io::copy(reader, &mut file).await {
            Ok(written) => written,
            Err(err) => {
                drop(file);
                if let Err(cleanup_err) = fs::remove_file(self.root.join(&stored_name)).await {
                    warn!(
                        "event=file_upload module=storage status=cleanup_failed error={}",
                        cleanup_err
                    );
                }
                return Err(err.into());
            }
        };
        file.flush().await?;

        info!(
            "event=file_upload module=storage status=ok bytes={} renamed={}",
            written,
            stored_name != name
        );
        Ok(public_reference(&stored_name))
    }

    async fn download(&self, file_name: &str) -> StorageResult<Vec<u8>> {
        let name = resolve_name(file_name)?;
        match fs::read(self.root.join(name)).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(name.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn delete(&self, file_name: &str) -> StorageResult<()> {
        let name = resolve_name(file_name)?;
        match fs::remove_file(self.root.join(name)).await {
            Ok(()) => {
                info!("event=file_delete module=storage status=ok");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
