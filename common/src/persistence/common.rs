use std::path::Path;

#[async_trait::async_trait]
pub trait IFileStorage: Send + Sync {
    /// Uploads the file at `source` under `name`, overwriting any previous
    /// object. Returns the download URL, or `None` when the upload failed.
    async fn store_result_file_path(&self, name: &str, mime_type: Option<&str>, source: &Path) -> Option<String>;
}
