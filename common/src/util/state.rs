use std::{path::PathBuf, sync::Arc, time::Duration};

use crate::{
    generation::{api::HttpGenerationApi, poller::JobPoller},
    download::DownloadService,
    persistence::{s3::S3FileStorage, IFileStorage},
};

pub struct GenerationSettings {
    pub api_url: String,
    pub api_token: String,
    pub poll_interval: Duration,
    pub max_wait: Duration,
    pub submit_timeout: Duration,
    pub poll_timeout: Duration,
    pub download_timeout: Duration,
}

pub struct S3BaseSettings {
    pub endpoint: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket: String,
    pub public_url: Option<String>,
    pub expire_seconds: u32,
}

pub struct Settings {
    pub generation: GenerationSettings,
    pub s3: S3BaseSettings,
    pub output_dir: PathBuf,
    pub soffice_path: PathBuf,
    pub render_timeout: Duration,
}

fn is_missing(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || (value.starts_with("your_") && value.ends_with("_here"))
}

impl Settings {
    /// Names of required settings that are absent or still placeholders.
    pub fn missing_configuration(&self) -> Vec<&'static str> {
        let required = [
            ("GENERATION_API_URL", &self.generation.api_url),
            ("GENERATION_API_TOKEN", &self.generation.api_token),
            ("S3_ACCESS_KEY_ID", &self.s3.access_key_id),
            ("S3_SECRET_ACCESS_KEY", &self.s3.secret_access_key),
        ];
        required.into_iter().filter(|(_, value)| is_missing(value)).map(|(name, _)| name).collect()
    }
}

pub struct GenerationServiceCollection {
    pub poller: Arc<JobPoller>,
    pub file_storage: Arc<dyn IFileStorage>,
}

impl GenerationServiceCollection {
    pub fn build(settings: &Settings) -> Result<Self, &'static str> {
        let generation = &settings.generation;
        let client = reqwest::Client::builder().build().map_err(|_| "could not build http client")?;
        let api = HttpGenerationApi::new(client.clone(), generation.api_url.clone(), generation.api_token.clone(), generation.submit_timeout, generation.poll_timeout);
        let download = DownloadService::new(client, generation.download_timeout);
        let poller = JobPoller::new(Arc::new(api), Arc::new(download), generation.poll_interval);
        let s3 = &settings.s3;
        let file_storage = S3FileStorage::build(
            s3.endpoint.clone(),
            s3.region.clone(),
            s3.access_key_id.clone(),
            s3.secret_access_key.clone(),
            s3.bucket.clone(),
            s3.public_url.clone(),
            s3.expire_seconds,
        )?;
        Ok(GenerationServiceCollection {
            poller: Arc::new(poller),
            file_storage: Arc::new(file_storage),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(token: &str, access_key: &str) -> Settings {
        Settings {
            generation: GenerationSettings {
                api_url: "http://api".to_string(),
                api_token: token.to_string(),
                poll_interval: Duration::from_secs(2),
                max_wait: Duration::from_secs(120),
                submit_timeout: Duration::from_secs(60),
                poll_timeout: Duration::from_secs(30),
                download_timeout: Duration::from_secs(20),
            },
            s3: S3BaseSettings {
                endpoint: "http://localhost:9000".to_string(),
                region: "us-east-1".to_string(),
                access_key_id: access_key.to_string(),
                secret_access_key: "secret".to_string(),
                bucket: "images".to_string(),
                public_url: None,
                expire_seconds: 60,
            },
            output_dir: PathBuf::from("static/generated_images"),
            soffice_path: PathBuf::from("/usr/bin/soffice"),
            render_timeout: Duration::from_secs(30),
        }
    }

    #[test]
    fn placeholders_count_as_missing() {
        assert!(settings("token", "key").missing_configuration().is_empty());
        assert_eq!(settings("your_bearer_token_here", "").missing_configuration(), vec!["GENERATION_API_TOKEN", "S3_ACCESS_KEY_ID"]);
    }
}
