//! Local persistence of inbound media.
//!
//! Files are named `<md5(sender)>-<random hex><ext>` inside the download
//! directory, so concurrent messages never collide.

use std::path::{Path, PathBuf};

use md5::{Digest, Md5};
use tokio::fs;
use uuid::Uuid;

use crate::common::error::{MediaError, MediaResult};

/// Writes media attachments into a download directory.
#[derive(Debug, Clone)]
pub struct MediaStore {
    download_dir: PathBuf,
}

impl MediaStore {
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            download_dir: download_dir.into(),
        }
    }

    #[cfg(test)]
    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Create the download directory if it does not exist yet.
    pub async fn ensure_dir(&self) -> MediaResult<()> {
        fs::create_dir_all(&self.download_dir)
            .await
            .map_err(|source| MediaError::CreateDir {
                path: self.download_dir.display().to_string(),
                source,
            })
    }

    /// Compute a fresh destination path for media sent by `sender`.
    pub fn unique_path(&self, sender: &str, extension: &str) -> PathBuf {
        self.download_dir.join(unique_filename(sender, extension))
    }

    /// Write `data` verbatim to `path`.
    pub async fn write(&self, path: &Path, data: &[u8]) -> MediaResult<()> {
        fs::write(path, data)
            .await
            .map_err(|source| MediaError::Write {
                path: path.display().to_string(),
                source,
            })
    }
}

/// `<md5(sender)>-<random hex><ext>`
pub fn unique_filename(sender: &str, extension: &str) -> String {
    let digest = Md5::digest(sender.as_bytes());
    format!(
        "{}-{}{}",
        hex::encode(digest),
        Uuid::new_v4().simple(),
        extension
    )
}
