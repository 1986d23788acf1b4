use axum::extract::{Host, State};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use common::models::PdfInput;

use super::base_url;
use crate::state::Services;

pub fn create_route(services: Services) -> Router {
    Router::new().route("/convert_html_to_pdf", post(convert_html_to_pdf)).with_state(services)
}

#[tracing::instrument(skip(services, host, input), fields(request_id = ?input.request_id))]
pub async fn convert_html_to_pdf(State(services): State<Services>, host: Option<Host>, Json(input): Json<PdfInput>) -> impl IntoResponse {
    match services.pdf_service.convert(&input, &base_url(host)).await {
        Ok(result) => Ok(Json(result)),
        Err(e) => Err((e.status, Json(e.error))),
    }
}
