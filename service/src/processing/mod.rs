mod image;
pub use image::*;

mod pdf;
pub use pdf::*;

use axum::http::StatusCode;
use common::{dtos::ErrorDto, models::JobError};

/// A failed request: the status to answer with and the error body.
#[derive(Debug)]
pub struct ProcessingError {
    pub status: StatusCode,
    pub error: ErrorDto,
}

impl ProcessingError {
    pub fn validation(message: &'static str) -> Self {
        ProcessingError {
            status: StatusCode::BAD_REQUEST,
            error: ErrorDto::message(message),
        }
    }

    pub fn from_job_error(err: &JobError, request_id: &str) -> Self {
        let status = if err.is_remote() { StatusCode::BAD_REQUEST } else { StatusCode::INTERNAL_SERVER_ERROR };
        ProcessingError {
            status,
            error: ErrorDto::from_job_error(err, request_id),
        }
    }

    /// Rejected before any work was attempted.
    pub fn is_validation(&self) -> bool {
        self.status == StatusCode::BAD_REQUEST && self.error.error_code.is_none()
    }
}
