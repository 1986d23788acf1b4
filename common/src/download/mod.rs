use std::{path::Path, time::Duration};

use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::models::JobError;

#[async_trait::async_trait]
pub trait IDownloadService: Send + Sync {
    /// Streams `source_uri` into `path` and returns the number of bytes written.
    async fn download_to(&self, source_uri: &str, path: &Path) -> Result<u64, JobError>;
}

pub struct DownloadService {
    client: reqwest::Client,
    timeout: Duration,
}

impl DownloadService {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        DownloadService { client, timeout }
    }
}

#[async_trait::async_trait]
impl IDownloadService for DownloadService {
    async fn download_to(&self, source_uri: &str, path: &Path) -> Result<u64, JobError> {
        let mut response = self.client.get(source_uri).timeout(self.timeout).send().await.map_err(JobError::from_transport)?;
        if let Some(err) = JobError::from_status(response.status()) {
            return Err(err);
        }
        let mut file = tokio::fs::File::create(path).await.map_err(|_| JobError::Io("Could not create file."))?;
        let mut written = 0u64;
        while let Some(mut item) = response.chunk().await.map_err(JobError::from_transport)? {
            written += item.len() as u64;
            file.write_all_buf(&mut item).await.map_err(|_| JobError::Io("Could not write to file."))?;
        }
        file.flush().await.map_err(|_| JobError::Io("Could not write to file."))?;
        info!("Downloaded {} bytes from {}", written, source_uri);
        Ok(written)
    }
}
