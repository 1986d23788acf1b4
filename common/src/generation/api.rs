//! Client for the hosted generation API (`/run` and `/status/{id}`).

use std::time::Duration;

use tracing::info;

use crate::models::{JobError, JobHandle, JobRequest, RunResponse, StatusResponse};

#[async_trait::async_trait]
pub trait IGenerationApi: Send + Sync {
    async fn run(&self, request: &JobRequest) -> Result<JobHandle, JobError>;
    async fn status(&self, handle: &JobHandle) -> Result<StatusResponse, JobError>;
}

pub struct HttpGenerationApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
    submit_timeout: Duration,
    poll_timeout: Duration,
}

impl HttpGenerationApi {
    pub fn new(client: reqwest::Client, base_url: String, token: String, submit_timeout: Duration, poll_timeout: Duration) -> Self {
        HttpGenerationApi {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            submit_timeout,
            poll_timeout,
        }
    }

    fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, JobError> {
        match JobError::from_status(response.status()) {
            Some(err) => Err(err),
            None => Ok(response),
        }
    }
}

#[async_trait::async_trait]
impl IGenerationApi for HttpGenerationApi {
    async fn run(&self, request: &JobRequest) -> Result<JobHandle, JobError> {
        info!("Submitting job to /run for request {}", &request.request_id);
        let response = self
            .client
            .post(format!("{}/run", self.base_url))
            .bearer_auth(&self.token)
            .timeout(self.submit_timeout)
            .json(&request.to_run_body())
            .send()
            .await
            .map_err(JobError::from_transport)?;
        let response = Self::ensure_success(response)?;
        let body: RunResponse = response.json().await.map_err(|_| JobError::Malformed("/run response is not valid json".to_string()))?;
        match body.id.filter(|id| !id.is_empty()) {
            Some(id) => Ok(JobHandle::new(id, request.request_id.clone())),
            None => Err(JobError::Malformed("Job ID not found in /run response.".to_string())),
        }
    }

    async fn status(&self, handle: &JobHandle) -> Result<StatusResponse, JobError> {
        let response = self
            .client
            .get(format!("{}/status/{}", self.base_url, handle.id()))
            .bearer_auth(&self.token)
            .timeout(self.poll_timeout)
            .send()
            .await
            .map_err(JobError::from_transport)?;
        let response = Self::ensure_success(response)?;
        response.json().await.map_err(|_| JobError::Malformed("/status response is not valid json".to_string()))
    }
}
