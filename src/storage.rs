use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use crate::constants::PARTIAL_SUFFIX;
use crate::error::{AppError, Result};

/// Directory holding raw model bytes, addressed by storage name alone
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: Arc<PathBuf>,
}

impl ContentStore {
    /// Open the content area, creating the directory if needed
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        tracing::info!("Content area ready at: {:?}", root);
        Ok(Self {
            root: Arc::new(root),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        // Storage names are generated server-side; anything path-like is a bug
        if name.is_empty()
            || name.starts_with('.')
            || name.contains(['/', '\\'])
            || name.ends_with(PARTIAL_SUFFIX)
        {
            return Err(AppError::InvalidInput(format!(
                "Invalid storage name: {}",
                name
            )));
        }
        Ok(self.root.join(name))
    }

    /// Stream `content` into the area under `name`
    ///
    /// Bytes land in a hidden partial file which is synced and then renamed,
    /// so `name` either holds the complete upload or does not exist. The
    /// partial file is removed on any failure, including when this future is
    /// dropped mid-stream. A stream longer than `max_bytes` fails with
    /// `PayloadTooLarge`. Returns the number of bytes written.
    pub async fn write<S>(&self, name: &str, content: S, max_bytes: u64) -> Result<u64>
    where
        S: Stream<Item = Result<Bytes>>,
    {
        let final_path = self.path_for(name)?;
        let partial = PartialFile {
            path: self.root.join(format!(".{}{}", name, PARTIAL_SUFFIX)),
            renamed: false,
        };

        let written = write_partial(&partial.path, content, max_bytes).await?;
        fs::rename(&partial.path, &final_path).await?;
        partial.disarm();

        Ok(written)
    }

    /// Open stored bytes for reading, returning the file and its length
    ///
    /// A missing file is `FileNotFound`.
    pub async fn open_file(&self, name: &str) -> Result<(File, u64)> {
        let path = self.path_for(name)?;
        let file = match File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::error!("Stored bytes missing for: {}", name);
                return Err(AppError::FileNotFound);
            }
            Err(e) => return Err(e.into()),
        };
        let len = file.metadata().await?.len();
        Ok((file, len))
    }

    /// Delete stored bytes; deleting a missing name is not an error
    pub async fn remove(&self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Total size of all completed files in the area
    pub async fn usage_bytes(&self) -> Result<u64> {
        let mut total = 0;
        let mut entries = fs::read_dir(self.root.as_path()).await?;
        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if metadata.is_file() && !entry.file_name().to_string_lossy().starts_with('.') {
                total += metadata.len();
            }
        }
        Ok(total)
    }
}

async fn write_partial<S>(path: &Path, content: S, max_bytes: u64) -> Result<u64>
where
    S: Stream<Item = Result<Bytes>>,
{
    let mut file = File::create(path).await?;
    let mut content = std::pin::pin!(content);
    let mut written: u64 = 0;

    while let Some(chunk) = content.next().await {
        let chunk = chunk?;
        written += chunk.len() as u64;
        if written > max_bytes {
            return Err(AppError::PayloadTooLarge);
        }
        file.write_all(&chunk).await?;
    }

    file.flush().await?;
    file.sync_all().await?;
    Ok(written)
}

/// In-flight upload file, deleted on drop unless it was renamed into place
struct PartialFile {
    path: PathBuf,
    renamed: bool,
}

impl PartialFile {
    fn disarm(mut self) {
        self.renamed = true;
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.renamed {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path)
            && e.kind() != ErrorKind::NotFound
        {
            tracing::warn!("Failed to remove partial upload {:?}: {}", self.path, e);
        }
    }
}
