//! Local file holding the id of the job being followed.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tubedeck_core::types::JobId;

#[derive(Debug, Clone)]
pub struct JobCache {
    path: PathBuf,
}

impl JobCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The cached job id, if the file exists and is not blank.
    pub async fn load(&self) -> std::io::Result<Option<JobId>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let job_id = contents.trim();
                Ok((!job_id.is_empty()).then(|| job_id.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn store(&self, job_id: &str) -> std::io::Result<()> {
        tokio::fs::write(&self.path, job_id).await
    }

    /// Remove the cache file. A missing file is not an error.
    pub async fn clear(&self) -> std::io::Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}
