use axum::{
    body::StreamBody,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{AppendHeaders, IntoResponse},
    routing::get,
    Router,
};
use common::util::mime::get_content_type;
use tokio_util::io::ReaderStream;

use crate::state::Services;

pub fn create_route(services: Services) -> Router {
    Router::new().route("/generated_images/:file", get(file)).with_state(services)
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && !name.starts_with('.') && !name.contains(['/', '\\'])
}

#[tracing::instrument(skip(services))]
pub async fn file(Path(file): Path<String>, State(services): State<Services>) -> impl IntoResponse {
    if !is_plain_file_name(&file) {
        return Err((StatusCode::NOT_FOUND, ()));
    }
    match tokio::fs::File::open(services.output_dir.join(&file)).await {
        Ok(handle) => {
            let body = StreamBody::new(ReaderStream::new(handle));
            let headers = AppendHeaders([(header::CONTENT_TYPE, get_content_type(None, &file).to_string())]);
            Ok((headers, body))
        }
        Err(_) => Err((StatusCode::NOT_FOUND, ())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traversal_is_rejected() {
        assert!(is_plain_file_name("550e8400-e29b-41d4-a716-446655440000.png"));
        assert!(!is_plain_file_name("../secret"));
        assert!(!is_plain_file_name("..\\secret"));
        assert!(!is_plain_file_name(".env"));
        assert!(!is_plain_file_name(""));
    }
}
