use reqwest::StatusCode;

/// Everything that can go wrong between submitting a job and holding its
/// artifact on disk.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobError {
    #[error("API authentication failed")]
    AuthFailed,
    #[error("API access forbidden - insufficient permissions")]
    Forbidden,
    #[error("API rate limit exceeded")]
    RateLimited,
    #[error("External API service error: {0}")]
    ServiceError(String),
    #[error("External API answered with unexpected status {0}")]
    UnexpectedStatus(u16),
    #[error("Malformed response: {0}")]
    Malformed(String),
    #[error("Generation FAILED: {0}")]
    Failed(String),
    #[error("Generation CANCELLED: {0}")]
    Cancelled(String),
    #[error("Timed out waiting for completed job")]
    TimedOut,
    #[error("Could not store artifact: {0}")]
    Io(&'static str),
}

impl JobError {
    /// Classifies a non-success status. Returns `None` for 2xx.
    pub fn from_status(status: StatusCode) -> Option<JobError> {
        if status.is_success() {
            return None;
        }
        Some(match status.as_u16() {
            401 => JobError::AuthFailed,
            403 => JobError::Forbidden,
            429 => JobError::RateLimited,
            500..=599 => JobError::ServiceError(format!("status {}", status.as_u16())),
            other => JobError::UnexpectedStatus(other),
        })
    }

    pub fn from_transport(err: reqwest::Error) -> JobError {
        match err.status().and_then(JobError::from_status) {
            Some(classified) => classified,
            None => JobError::ServiceError(err.to_string()),
        }
    }

    /// Errors worth another poll tick.
    pub fn is_transient(&self) -> bool {
        matches!(self, JobError::ServiceError(_) | JobError::RateLimited | JobError::UnexpectedStatus(_))
    }

    /// Raised by the remote API rather than by local processing.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            JobError::AuthFailed | JobError::Forbidden | JobError::RateLimited | JobError::ServiceError(_) | JobError::UnexpectedStatus(_)
        )
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            JobError::AuthFailed => "AUTH_FAILED",
            JobError::Forbidden => "ACCESS_FORBIDDEN",
            JobError::RateLimited => "RATE_LIMITED",
            JobError::ServiceError(_) => "SERVICE_ERROR",
            JobError::UnexpectedStatus(_) => "UNKNOWN_ERROR",
            JobError::Malformed(_) => "MALFORMED_RESPONSE",
            JobError::Failed(_) => "GENERATION_FAILED",
            JobError::Cancelled(_) => "GENERATION_CANCELLED",
            JobError::TimedOut => "TIMED_OUT",
            JobError::Io(_) => "UNKNOWN_ERROR",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            JobError::AuthFailed => "The image generator is not properly configured. Please contact the administrator.",
            JobError::Forbidden => "You don't have permission to use this service.",
            JobError::RateLimited => "Too many requests. Please try again in a few minutes.",
            JobError::ServiceError(_) => "The image generation service is temporarily unavailable. Please try again later.",
            JobError::TimedOut => "The image took too long to generate. Please try again.",
            JobError::Failed(_) | JobError::Cancelled(_) => "The image could not be generated. Please try a different prompt.",
            _ => "Something went wrong. Please try again or contact support.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_is_total() {
        assert_eq!(JobError::from_status(StatusCode::OK), None);
        assert_eq!(JobError::from_status(StatusCode::UNAUTHORIZED), Some(JobError::AuthFailed));
        assert_eq!(JobError::from_status(StatusCode::FORBIDDEN), Some(JobError::Forbidden));
        assert_eq!(JobError::from_status(StatusCode::TOO_MANY_REQUESTS), Some(JobError::RateLimited));
        assert_eq!(JobError::from_status(StatusCode::NOT_FOUND), Some(JobError::UnexpectedStatus(404)));
        for code in 500..=599u16 {
            let status = StatusCode::from_u16(code).unwrap();
            assert!(matches!(JobError::from_status(status), Some(JobError::ServiceError(_))), "{code}");
        }
    }

    #[test]
    fn only_remote_service_errors_are_transient() {
        assert!(JobError::RateLimited.is_transient());
        assert!(JobError::ServiceError("boom".into()).is_transient());
        assert!(!JobError::AuthFailed.is_transient());
        assert!(!JobError::Forbidden.is_transient());
        assert!(!JobError::Malformed("x".into()).is_transient());
    }

    #[test]
    fn codes_distinguish_remote_failures() {
        assert_eq!(JobError::Forbidden.error_code(), "ACCESS_FORBIDDEN");
        assert_eq!(JobError::TimedOut.error_code(), "TIMED_OUT");
        assert_ne!(JobError::AuthFailed.user_message(), JobError::AuthFailed.to_string());
    }
}
