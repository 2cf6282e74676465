//! Download folder inspection.

use album_proto::protocol::OracleReading;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
#[error("cannot read download folder {path}: {source}")]
pub struct FolderError {
    path: PathBuf,
    #[source]
    source: std::io::Error,
}

/// Watches one folder the browser downloads into.
#[derive(Debug, Clone)]
pub struct DownloadFolder {
    dir: PathBuf,
    partial_suffixes: Vec<String>,
}

impl DownloadFolder {
    pub fn new(dir: PathBuf, partial_suffixes: Vec<String>) -> Self {
        Self {
            dir,
            partial_suffixes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `InProgress` while any partial download exists, otherwise the number
    /// of regular files.
    pub async fn reading(&self) -> Result<OracleReading, FolderError> {
        let wrap = |source: std::io::Error| FolderError {
            path: self.dir.clone(),
            source,
        };

        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(wrap)?;
        let mut files = 0u64;
        while let Some(entry) = entries.next_entry().await.map_err(wrap)? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if self.is_partial(&name) {
                return Ok(OracleReading::InProgress);
            }
            // Follows symlinks; a dangling link is not a file.
            if matches!(tokio::fs::metadata(entry.path()).await, Ok(meta) if meta.is_file()) {
                files += 1;
            }
        }
        Ok(OracleReading::Files(files))
    }

    fn is_partial(&self, name: &str) -> bool {
        self.partial_suffixes
            .iter()
            .any(|suffix| name.ends_with(suffix.as_str()))
    }
}
