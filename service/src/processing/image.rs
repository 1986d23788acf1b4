use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::http::StatusCode;
use common::{
    dtos::ErrorDto,
    generation::poller::JobPoller,
    metrics::Metrics,
    models::{GenerateInput, GenerateResult, JobError, JobRequest, JobResult, DEFAULT_DIMENSION},
    persistence::IFileStorage,
    util::{mime::sniff_image_type, validation::validate_request},
};
use tokio::time::Instant;
use tracing::{error, info};

use super::ProcessingError;

const SNIFF_BYTES: usize = 32;

pub struct ImageService {
    poller: Arc<JobPoller>,
    file_storage: Arc<dyn IFileStorage>,
    metrics: Arc<Metrics>,
    missing_config: Vec<&'static str>,
    output_dir: PathBuf,
    max_wait: Duration,
}

impl ImageService {
    pub fn new(
        poller: Arc<JobPoller>,
        file_storage: Arc<dyn IFileStorage>,
        metrics: Arc<Metrics>,
        missing_config: Vec<&'static str>,
        output_dir: PathBuf,
        max_wait: Duration,
    ) -> Self {
        ImageService {
            poller,
            file_storage,
            metrics,
            missing_config,
            output_dir,
            max_wait,
        }
    }

    #[tracing::instrument(skip(self, input), fields(request_id = ?input.request_id))]
    pub async fn generate(&self, input: &GenerateInput) -> Result<GenerateResult, ProcessingError> {
        let request_id = validate_request(&input.request_id, &input.prompt, "Missing request_id or prompt").map_err(ProcessingError::validation)?;
        if !self.missing_config.is_empty() {
            error!("Refusing generation, missing configuration: {:?}", &self.missing_config);
            self.metrics.record_error("CONFIG_MISSING");
            return Err(ProcessingError {
                status: StatusCode::SERVICE_UNAVAILABLE,
                error: ErrorDto::config_missing(self.missing_config.clone(), request_id),
            });
        }

        self.metrics.record_request();
        let started = Instant::now();
        let result = self.generate_image(request_id, input).await;
        self.metrics.record_response_time(started.elapsed(), result.is_ok());
        result.map_err(|err| {
            error!("Generation failed: {}", &err);
            self.metrics.record_error(err.error_code());
            ProcessingError::from_job_error(&err, request_id)
        })
    }

    async fn generate_image(&self, request_id: &str, input: &GenerateInput) -> Result<GenerateResult, JobError> {
        let request = JobRequest {
            request_id: request_id.to_string(),
            prompt: input.prompt.clone().unwrap_or_default(),
            width: input.width.unwrap_or(DEFAULT_DIMENSION),
            height: input.height.unwrap_or(DEFAULT_DIMENSION),
        };
        let handle = self.poller.submit(&request).await?;
        let output = match self.poller.await_result(handle, self.max_wait).await? {
            JobResult::Completed(output) => output,
            JobResult::Failed(reason) => return Err(JobError::Failed(reason)),
            JobResult::Cancelled(reason) => return Err(JobError::Cancelled(reason)),
            JobResult::TimedOut => return Err(JobError::TimedOut),
        };

        tokio::fs::create_dir_all(&self.output_dir).await.map_err(|_| JobError::Io("Could not create output directory."))?;
        let file_name = format!("{}.png", request_id);
        let path = self.output_dir.join(&file_name);
        self.poller.decode_output(&output, &path).await?;

        let bytes = tokio::fs::read(&path).await.map_err(|_| JobError::Io("Could not read generated image."))?;
        let mime = sniff_image_type(&bytes[..bytes.len().min(SNIFF_BYTES)], &file_name);
        let blob_url = self.file_storage.store_result_file_path(&file_name, Some(mime.as_ref()), &path).await;
        info!("Generated {} ({}), blob url present: {}", &file_name, &mime, blob_url.is_some());

        Ok(GenerateResult {
            status: "success",
            image_url: format!("/generated_images/{}", file_name),
            blob_url,
        })
    }
}
