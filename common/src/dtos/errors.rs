use serde::Serialize;

use crate::models::JobError;

/// Error body shared by every surface: a code for machines, a technical
/// message and a message meant for end users.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDto {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_config: Option<Vec<&'static str>>,
}

impl ErrorDto {
    pub fn message(message: impl Into<String>) -> Self {
        ErrorDto {
            status: "error",
            message: message.into(),
            user_message: None,
            error_code: None,
            request_id: None,
            missing_config: None,
        }
    }

    pub fn from_job_error(err: &JobError, request_id: &str) -> Self {
        ErrorDto {
            status: "error",
            message: err.to_string(),
            user_message: Some(err.user_message().to_string()),
            error_code: Some(err.error_code()),
            request_id: Some(request_id.to_string()),
            missing_config: None,
        }
    }

    pub fn config_missing(missing: Vec<&'static str>, request_id: &str) -> Self {
        ErrorDto {
            status: "error",
            message: "Service configuration incomplete".to_string(),
            user_message: Some(format!("The service is not properly configured. Missing: {}", missing.join(", "))),
            error_code: Some("CONFIG_MISSING"),
            request_id: Some(request_id.to_string()),
            missing_config: Some(missing),
        }
    }
}
