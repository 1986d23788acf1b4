use std::{path::Path, sync::Arc, time::Duration};

use tokio::time::{sleep_until, timeout, Instant};
use tracing::{info, warn};

use crate::{
    download::IDownloadService,
    models::{JobError, JobHandle, JobRequest, JobResult, JobStatus, StatusResponse},
};

use super::{
    api::IGenerationApi,
    output::{decode_output, extract_output},
};

/// Submits jobs to the generation API and waits for them on a fixed tick.
pub struct JobPoller {
    api: Arc<dyn IGenerationApi>,
    download: Arc<dyn IDownloadService>,
    poll_interval: Duration,
}

fn terminal(status: StatusResponse) -> Result<Option<JobResult>, JobError> {
    match status.status {
        JobStatus::Completed => Ok(Some(JobResult::Completed(extract_output(status.output.as_ref())?))),
        JobStatus::Failed => Ok(Some(JobResult::Failed(status.reason()))),
        JobStatus::Cancelled => Ok(Some(JobResult::Cancelled(status.reason()))),
        JobStatus::InQueue | JobStatus::InProgress | JobStatus::Unknown => Ok(None),
    }
}

impl JobPoller {
    pub fn new(api: Arc<dyn IGenerationApi>, download: Arc<dyn IDownloadService>, poll_interval: Duration) -> Self {
        JobPoller { api, download, poll_interval }
    }

    #[tracing::instrument(skip(self, request), fields(request_id = %request.request_id))]
    pub async fn submit(&self, request: &JobRequest) -> Result<JobHandle, JobError> {
        let handle = self.api.run(request).await?;
        info!("Submitted job {}", handle.id());
        Ok(handle)
    }

    /// Polls until the job is terminal or `max_wait` has passed since the
    /// first poll. No request is issued once the deadline is reached, and a
    /// request still in flight at the deadline is abandoned.
    #[tracing::instrument(skip(self, handle), fields(request_id = %handle.request_id(), job_id = %handle.id()))]
    pub async fn await_result(&self, handle: JobHandle, max_wait: Duration) -> Result<JobResult, JobError> {
        let deadline = Instant::now() + max_wait;
        let mut polls = 0u32;
        loop {
            polls += 1;
            let remaining = deadline.saturating_duration_since(Instant::now());
            let status = match timeout(remaining, self.api.status(&handle)).await {
                Ok(status) => status,
                Err(_) => {
                    warn!("Deadline reached while poll {} was in flight", polls);
                    return Ok(JobResult::TimedOut);
                }
            };
            match status {
                Ok(status) => {
                    if let Some(result) = terminal(status)? {
                        info!("Job finished after {} polls: {:?}", polls, &result);
                        return Ok(result);
                    }
                }
                Err(err) if err.is_transient() => warn!("Poll {} failed, retrying on next tick: {}", polls, err),
                Err(err) => return Err(err),
            }

            let next = Instant::now() + self.poll_interval;
            if next >= deadline {
                sleep_until(deadline).await;
                warn!("Timed out waiting for completed job after {} polls", polls);
                return Ok(JobResult::TimedOut);
            }
            sleep_until(next).await;
        }
    }

    pub async fn decode_output(&self, output: &str, destination: &Path) -> Result<u64, JobError> {
        decode_output(output, destination, self.download.as_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::{
        collections::VecDeque,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Mutex,
        },
    };

    const MAX_WAIT: Duration = Duration::from_secs(120);

    /// Replays scripted status answers; the last one repeats forever.
    struct ScriptedApi {
        answers: Mutex<VecDeque<Result<StatusResponse, JobError>>>,
        polls: Mutex<Vec<Instant>>,
        in_flight: AtomicUsize,
        status_delay: Duration,
    }

    impl ScriptedApi {
        fn new(answers: Vec<Result<serde_json::Value, JobError>>) -> Self {
            let answers = answers
                .into_iter()
                .map(|answer| answer.map(|value| serde_json::from_value(value).unwrap()))
                .collect();
            ScriptedApi {
                answers: Mutex::new(answers),
                polls: Mutex::new(vec![]),
                in_flight: AtomicUsize::new(0),
                status_delay: Duration::ZERO,
            }
        }

        fn poll_times(&self) -> Vec<Instant> {
            self.polls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl IGenerationApi for ScriptedApi {
        async fn run(&self, request: &JobRequest) -> Result<JobHandle, JobError> {
            Ok(JobHandle::new("job-1".to_string(), request.request_id.clone()))
        }

        async fn status(&self, _handle: &JobHandle) -> Result<StatusResponse, JobError> {
            assert_eq!(self.in_flight.fetch_add(1, Ordering::SeqCst), 0, "concurrent polls");
            self.polls.lock().unwrap().push(Instant::now());
            if !self.status_delay.is_zero() {
                tokio::time::sleep(self.status_delay).await;
            }
            let answer = {
                let mut answers = self.answers.lock().unwrap();
                if answers.len() > 1 {
                    answers.pop_front().unwrap()
                } else {
                    answers.front().cloned().unwrap()
                }
            };
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            answer
        }
    }

    #[derive(Default)]
    struct NoDownload {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl IDownloadService for NoDownload {
        async fn download_to(&self, _source_uri: &str, _path: &Path) -> Result<u64, JobError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(JobError::ServiceError("unexpected fetch".to_string()))
        }
    }

    fn poller(api: Arc<ScriptedApi>, download: Arc<NoDownload>) -> JobPoller {
        JobPoller::new(api, download, Duration::from_secs(2))
    }

    fn request() -> JobRequest {
        JobRequest {
            request_id: "550e8400-e29b-41d4-a716-446655440000".to_string(),
            prompt: "x".to_string(),
            width: 256,
            height: 256,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn completes_after_progress_and_decodes_data_uri() {
        let api = Arc::new(ScriptedApi::new(vec![
            Ok(json!({"status": "IN_PROGRESS"})),
            Ok(json!({"status": "IN_PROGRESS"})),
            Ok(json!({"status": "COMPLETED", "output": "data:image/png;base64,AAAA"})),
        ]));
        let download = Arc::new(NoDownload::default());
        let poller = poller(api.clone(), download.clone());
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.png");

        let handle = poller.submit(&request()).await.unwrap();
        let result = poller.await_result(handle, MAX_WAIT).await.unwrap();
        let JobResult::Completed(output) = result else { panic!("{result:?}") };
        let written = poller.decode_output(&output, &target).await.unwrap();

        assert_eq!(written, 3);
        assert_eq!(std::fs::read(&target).unwrap().len(), 3);
        assert_eq!(download.calls.load(Ordering::SeqCst), 0);
        let polls = api.poll_times();
        assert_eq!(polls.len(), 3);
        assert_eq!(polls[1] - polls[0], Duration::from_secs(2));
        assert_eq!(polls[2] - polls[1], Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_on_first_poll_carries_reason() {
        let api = Arc::new(ScriptedApi::new(vec![Ok(json!({"status": "FAILED", "error": "oom"}))]));
        let poller = poller(api.clone(), Arc::new(NoDownload::default()));

        let handle = poller.submit(&request()).await.unwrap();
        let result = poller.await_result(handle, MAX_WAIT).await.unwrap();

        assert_eq!(result, JobResult::Failed("oom".to_string()));
        assert_eq!(api.poll_times().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_is_terminal() {
        let api = Arc::new(ScriptedApi::new(vec![Ok(json!({"status": "IN_QUEUE"})), Ok(json!({"status": "CANCELLED"}))]));
        let poller = poller(api.clone(), Arc::new(NoDownload::default()));

        let result = poller.await_result(JobHandle::new("job-1".into(), "rid".into()), MAX_WAIT).await.unwrap();

        assert_eq!(result, JobResult::Cancelled(String::new()));
        assert_eq!(api.poll_times().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_without_polling_past_deadline() {
        let api = Arc::new(ScriptedApi::new(vec![Ok(json!({"status": "IN_PROGRESS"}))]));
        let poller = poller(api.clone(), Arc::new(NoDownload::default()));
        let started = Instant::now();

        let result = poller.await_result(JobHandle::new("job-1".into(), "rid".into()), MAX_WAIT).await.unwrap();

        assert_eq!(result, JobResult::TimedOut);
        let polls = api.poll_times();
        assert_eq!(polls.len(), 60);
        assert!(polls.iter().all(|poll| *poll < started + MAX_WAIT));
        assert_eq!(Instant::now() - started, MAX_WAIT);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(api.poll_times().len(), 60);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_poll_at_deadline_is_abandoned() {
        let mut api = ScriptedApi::new(vec![Ok(json!({"status": "IN_PROGRESS"}))]);
        api.status_delay = Duration::from_secs(50);
        let api = Arc::new(api);
        let poller = poller(api.clone(), Arc::new(NoDownload::default()));
        let started = Instant::now();

        let result = poller.await_result(JobHandle::new("job-1".into(), "rid".into()), MAX_WAIT).await.unwrap();

        assert_eq!(result, JobResult::TimedOut);
        assert_eq!(Instant::now() - started, MAX_WAIT);
        assert!(api.poll_times().iter().all(|poll| *poll < started + MAX_WAIT));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_poll_errors_wait_for_next_tick() {
        let api = Arc::new(ScriptedApi::new(vec![
            Err(JobError::ServiceError("status 502".to_string())),
            Err(JobError::RateLimited),
            Ok(json!({"status": "COMPLETED", "output": {"image_url": "https://cdn/a.png"}})),
        ]));
        let poller = poller(api.clone(), Arc::new(NoDownload::default()));

        let result = poller.await_result(JobHandle::new("job-1".into(), "rid".into()), MAX_WAIT).await.unwrap();

        assert_eq!(result, JobResult::Completed("https://cdn/a.png".to_string()));
        let polls = api.poll_times();
        assert_eq!(polls.len(), 3);
        assert_eq!(polls[2] - polls[0], Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn auth_failure_stops_polling() {
        let api = Arc::new(ScriptedApi::new(vec![Err(JobError::AuthFailed), Ok(json!({"status": "COMPLETED", "output": "x"}))]));
        let poller = poller(api.clone(), Arc::new(NoDownload::default()));

        let result = poller.await_result(JobHandle::new("job-1".into(), "rid".into()), MAX_WAIT).await;

        assert_eq!(result, Err(JobError::AuthFailed));
        assert_eq!(api.poll_times().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeat_without_status_keeps_polling() {
        let api = Arc::new(ScriptedApi::new(vec![
            Ok(json!({"delayTime": 10})),
            Ok(json!({"status": "COMPLETED", "output": "https://cdn/a.png"})),
        ]));
        let poller = poller(api.clone(), Arc::new(NoDownload::default()));

        let result = poller.await_result(JobHandle::new("job-1".into(), "rid".into()), MAX_WAIT).await.unwrap();

        assert_eq!(result, JobResult::Completed("https://cdn/a.png".to_string()));
        assert_eq!(api.poll_times().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn structured_failure_reason_is_kept() {
        let api = Arc::new(ScriptedApi::new(vec![Ok(json!({"status": "FAILED", "error": {"message": "oom"}}))]));
        let poller = poller(api.clone(), Arc::new(NoDownload::default()));

        let result = poller.await_result(JobHandle::new("job-1".into(), "rid".into()), MAX_WAIT).await.unwrap();

        assert_eq!(result, JobResult::Failed(r#"{"message":"oom"}"#.to_string()));
        assert_eq!(api.poll_times().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn completed_without_output_is_malformed() {
        let api = Arc::new(ScriptedApi::new(vec![Ok(json!({"status": "COMPLETED", "output": {"seed": 4}}))]));
        let poller = poller(api, Arc::new(NoDownload::default()));

        let result = poller.await_result(JobHandle::new("job-1".into(), "rid".into()), MAX_WAIT).await;

        assert!(matches!(result, Err(JobError::Malformed(_))));
    }
}
