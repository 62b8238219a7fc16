use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::Local;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempPath;
use tokio::io::{AsyncRead, AsyncWriteExt};

/// Sortable, second-resolution prefix of every stored name
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Collision suffixes tried before giving up on a name
const MAX_NAME_ATTEMPTS: u32 = 1000;

pub struct StoredFile {
    pub path: PathBuf,
    pub size: u64,
}

#[async_trait]
pub trait StorageService: Send + Sync {
    /// Writes the whole stream under a unique name derived from `file_name`.
    /// The file only becomes visible once every byte is on disk.
    async fn save_stream<'a>(
        &self,
        file_name: &str,
        reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> Result<StoredFile>;

    async fn is_writable(&self) -> bool;

    fn root(&self) -> &Path;
}

pub struct LocalStorageService {
    root: PathBuf,
    write_timeout: Duration,
}

impl LocalStorageService {
    pub fn new(root: impl Into<PathBuf>, write_timeout: Duration) -> Self {
        Self {
            root: root.into(),
            write_timeout,
        }
    }

    pub async fn ensure_root(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("failed to create upload dir {}", self.root.display()))
    }
}

#[async_trait]
impl StorageService for LocalStorageService {
    async fn save_stream<'a>(
        &self,
        file_name: &str,
        mut reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> Result<StoredFile> {
        // Named after when the upload arrived, not when the last byte landed
        let stamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        self.ensure_root().await?;

        let root = self.root.clone();
        let staged = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix(".upload-")
                .suffix(".part")
                .tempfile_in(&root)
        })
        .await
        .context("staging task failed")?
        .with_context(|| format!("failed to create temp file in {}", self.root.display()))?;

        // Dropping `temp_path` on any early return removes the partial file
        let (file, temp_path) = staged.into_parts();
        let mut file = tokio::fs::File::from_std(file);

        let write = async {
            let size = tokio::io::copy(&mut reader, &mut file).await?;
            file.flush().await?;
            file.sync_all().await?;
            Ok::<u64, io::Error>(size)
        };
        let size = tokio::time::timeout(self.write_timeout, write)
            .await
            .map_err(|_| anyhow!("write timed out after {:?}", self.write_timeout))?
            .context("failed to write upload")?;
        drop(file);

        let root = self.root.clone();
        let name = file_name.to_string();
        let path = tokio::task::spawn_blocking(move || persist_unique(temp_path, &root, &stamp, &name))
            .await
            .context("persist task failed")??;

        tracing::debug!("Stored {} bytes at {}", size, path.display());
        Ok(StoredFile { path, size })
    }

    async fn is_writable(&self) -> bool {
        match tokio::fs::metadata(&self.root).await {
            Ok(meta) => meta.is_dir() && !meta.permissions().readonly(),
            Err(_) => false,
        }
    }

    fn root(&self) -> &Path {
        &self.root
    }
}

/// `<stamp>-<name>` for the first attempt, `<stamp>-<n>-<name>` afterwards.
pub fn stored_name(stamp: &str, attempt: u32, file_name: &str) -> String {
    if attempt == 0 {
        format!("{}-{}", stamp, file_name)
    } else {
        format!("{}-{}-{}", stamp, attempt, file_name)
    }
}

/// Links the temp file to the first free candidate name without ever
/// replacing an existing file.
fn persist_unique(
    mut temp_path: TempPath,
    root: &Path,
    stamp: &str,
    file_name: &str,
) -> Result<PathBuf> {
    for attempt in 0..MAX_NAME_ATTEMPTS {
        let target = root.join(stored_name(stamp, attempt, file_name));
        match temp_path.persist_noclobber(&target) {
            Ok(()) => return Ok(target),
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                temp_path = e.path;
            }
            Err(e) => {
                return Err(e.error)
                    .with_context(|| format!("failed to persist upload to {}", target.display()));
            }
        }
    }
    Err(anyhow!(
        "no free name for {} after {} attempts",
        file_name,
        MAX_NAME_ATTEMPTS
    ))
}
