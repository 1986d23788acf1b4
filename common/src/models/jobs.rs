use serde::{Deserialize, Serialize};

/// Work submitted to the generation API. `request_id` is the caller's
/// correlation id and is only used for tracking.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub request_id: String,
    pub prompt: String,
    pub width: u32,
    pub height: u32,
}

impl JobRequest {
    pub fn to_run_body(&self) -> RunBody<'_> {
        RunBody {
            input: RunInput {
                prompt: &self.prompt,
                width: self.width,
                height: self.height,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RunBody<'a> {
    pub input: RunInput<'a>,
}

#[derive(Debug, Serialize)]
pub struct RunInput<'a> {
    pub prompt: &'a str,
    pub width: u32,
    pub height: u32,
}

/// Identifier of an in-flight remote job. Deliberately not `Clone`: whoever
/// awaits the handle owns it.
#[derive(Debug, PartialEq, Eq)]
pub struct JobHandle {
    id: String,
    request_id: String,
}

impl JobHandle {
    pub fn new(id: String, request_id: String) -> Self {
        JobHandle { id, request_id }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

#[derive(Debug, Deserialize)]
pub struct RunResponse {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    InQueue,
    InProgress,
    Completed,
    Failed,
    Cancelled,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Body of `/status/{id}`. A body without `status` (queue heartbeats) reads as `Unknown`.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub output: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

impl StatusResponse {
    /// Server supplied reason; strings as they are, anything else as JSON text.
    pub fn reason(&self) -> String {
        match &self.error {
            None | Some(serde_json::Value::Null) => String::new(),
            Some(serde_json::Value::String(reason)) => reason.clone(),
            Some(other) => other.to_string(),
        }
    }
}

/// Terminal outcome of polling one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobResult {
    Completed(String),
    Failed(String),
    Cancelled(String),
    TimedOut,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn heartbeat_without_status_is_unknown() {
        let status: StatusResponse = serde_json::from_value(json!({"delayTime": 10})).unwrap();
        assert_eq!(status.status, JobStatus::Unknown);
        assert_eq!(status.reason(), "");
    }

    #[test]
    fn structured_error_is_rendered_as_json() {
        let status: StatusResponse = serde_json::from_value(json!({"status": "FAILED", "error": {"message": "oom"}})).unwrap();
        assert_eq!(status.status, JobStatus::Failed);
        assert_eq!(status.reason(), r#"{"message":"oom"}"#);

        let status: StatusResponse = serde_json::from_value(json!({"status": "FAILED", "error": "oom"})).unwrap();
        assert_eq!(status.reason(), "oom");
    }
}
