use std::path::{Path, PathBuf};

use base64::{
    alphabet,
    engine::{general_purpose::GeneralPurpose, DecodePaddingMode, GeneralPurposeConfig},
    Engine,
};
use serde_json::Value;
use tracing::{info, warn};

use crate::{download::IDownloadService, models::JobError, util::random::generate_30_alphanumeric};

const DATA_URI: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent));

fn non_empty(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|value| !value.is_empty())
}

/// Picks the artifact reference out of a completed job's output: `image_url`,
/// then `image`, then a bare string, then the first element of a list.
pub fn extract_output(output: Option<&Value>) -> Result<String, JobError> {
    let found = match output {
        Some(Value::Object(fields)) => non_empty(fields.get("image_url")).or_else(|| non_empty(fields.get("image"))),
        Some(value @ Value::String(_)) => non_empty(Some(value)),
        Some(Value::Array(items)) => non_empty(items.first()),
        _ => None,
    };
    found.map(str::to_string).ok_or_else(|| JobError::Malformed("image_url not found in output.".to_string()))
}

fn part_path(destination: &Path) -> PathBuf {
    let mut name = destination.file_name().map(|name| name.to_os_string()).unwrap_or_default();
    name.push(format!(".{}.part", generate_30_alphanumeric()));
    destination.with_file_name(name)
}

async fn write_part(output: &str, part: &Path, download: &dyn IDownloadService) -> Result<u64, JobError> {
    if let Some(payload) = output.strip_prefix("data:") {
        let (_, data) = payload.split_once(',').ok_or_else(|| JobError::Malformed("data uri without payload".to_string()))?;
        let bytes = DATA_URI.decode(data.trim()).map_err(|_| JobError::Malformed("data uri payload is not valid base64".to_string()))?;
        tokio::fs::write(part, &bytes).await.map_err(|_| JobError::Io("Could not write to file."))?;
        Ok(bytes.len() as u64)
    } else if output.starts_with("http") {
        download.download_to(output, part).await
    } else {
        Err(JobError::Malformed("Unrecognized image_url format!".to_string()))
    }
}

/// Turns an output reference into a file at `destination`. Data URIs are
/// decoded in place; http(s) URLs are fetched once. Nothing is left at the
/// destination when this fails.
pub async fn decode_output(output: &str, destination: &Path, download: &dyn IDownloadService) -> Result<u64, JobError> {
    let part = part_path(destination);
    match write_part(output, &part, download).await {
        Ok(written) => {
            tokio::fs::rename(&part, destination).await.map_err(|_| JobError::Io("Could not move file."))?;
            info!("Wrote {} bytes to {}", written, destination.display());
            Ok(written)
        }
        Err(err) => {
            if let Err(remove_err) = tokio::fs::remove_file(&part).await {
                if remove_err.kind() != std::io::ErrorKind::NotFound {
                    warn!("Could not remove partial file {}: {}", part.display(), remove_err);
                }
            }
            Err(err)
        }
    }
}
