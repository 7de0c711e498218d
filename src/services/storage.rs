use std::path::{Path, PathBuf};

use rand::Rng;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::io::AsyncWriteExt;

use crate::core::config::Settings;

/// URL prefix the upload directory is served under.
pub(crate) const PUBLIC_PREFIX: &str = "/uploads";

#[derive(Debug, Error)]
pub(crate) enum StorageError {
    #[error("upload directory unavailable: {0}")]
    Directory(std::io::Error),
    #[error("failed to write upload: {0}")]
    Write(std::io::Error),
    #[error("invalid upload field or extension")]
    InvalidName,
}

/// Files stored under the upload directory with generated names, addressable
/// through `PUBLIC_BASE_URL` + `/uploads/<name>`.
#[derive(Debug, Clone)]
pub(crate) struct UploadStore {
    root: PathBuf,
    public_base_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StoredFile {
    pub(crate) file_name: String,
    pub(crate) url: String,
}

impl UploadStore {
    pub(crate) async fn from_settings(settings: &Settings) -> Result<Self, StorageError> {
        let uploads = settings.uploads();
        Self::open(PathBuf::from(&uploads.dir), uploads.public_base_url.clone()).await
    }

    pub(crate) async fn open(root: PathBuf, public_base_url: String) -> Result<Self, StorageError> {
        tokio::fs::create_dir_all(&root).await.map_err(StorageError::Directory)?;
        Ok(Self { root, public_base_url: public_base_url.trim_end_matches('/').to_string() })
    }

    pub(crate) fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) async fn save(
        &self,
        field: &str,
        extension: &str,
        bytes: &[u8],
    ) -> Result<StoredFile, StorageError> {
        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        let nonce = rand::thread_rng().gen_range(0..1_000_000_000u32);
        let file_name = generated_name(field, extension, millis, nonce)?;

        let path = self.root.join(&file_name);
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(StorageError::Write)?;
        file.write_all(bytes).await.map_err(StorageError::Write)?;
        file.flush().await.map_err(StorageError::Write)?;

        tracing::debug!(file = %file_name, size = bytes.len(), "stored upload");
        let url = self.public_url(&file_name);
        Ok(StoredFile { file_name, url })
    }

    pub(crate) fn public_url(&self, file_name: &str) -> String {
        format!("{}{PUBLIC_PREFIX}/{file_name}", self.public_base_url)
    }

    /// Best effort cleanup for a file whose database row was never written.
    pub(crate) async fn discard(&self, stored: &StoredFile) {
        if let Err(err) = tokio::fs::remove_file(self.root.join(&stored.file_name)).await {
            tracing::warn!(error = %err, file = %stored.file_name, "failed to remove orphaned upload");
        }
    }
}

/// `<field>-<unix millis>-<nonce>.<ext>`
fn generated_name(
    field: &str,
    extension: &str,
    millis: i128,
    nonce: u32,
) -> Result<String, StorageError> {
    let safe = |value: &str| {
        !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    };
    if !safe(field) || !safe(extension) {
        return Err(StorageError::InvalidName);
    }

    Ok(format!("{field}-{millis}-{nonce}.{}", extension.to_ascii_lowercase()))
}
