use std::{env, path::PathBuf};
use tokio::fs;
use tracing::warn;

use crate::util::random::generate_30_alphanumeric;

/// Scratch directory for one request, removed with `clean_up`.
#[derive(Debug)]
pub struct TempJobFileProvider {
    job_directory: PathBuf,
}

impl TempJobFileProvider {
    pub async fn build(job_id: &str) -> Result<TempJobFileProvider, &'static str> {
        let dir = env::temp_dir().join(format!("{}-{}", job_id, generate_30_alphanumeric()));
        fs::create_dir_all(&dir).await.map_err(|_| "could not create temp directory")?;
        Ok(TempJobFileProvider { job_directory: dir })
    }

    pub async fn clean_up(&self) {
        if let Err(err) = fs::remove_dir_all(&self.job_directory).await {
            warn!("Error occured, while deleting temp job files for {}: {}", &self.job_directory.to_str().unwrap_or("<none>"), &err)
        }
    }

    pub fn get_path(&self) -> PathBuf {
        self.job_directory.join(generate_30_alphanumeric())
    }

    pub fn get_named_path(&self, file_name: &str) -> PathBuf {
        self.job_directory.join(file_name)
    }
}
