use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use common::models::GenerateInput;

use crate::state::Services;

pub fn create_route(services: Services) -> Router {
    Router::new().route("/generate", post(generate)).with_state(services)
}

#[tracing::instrument(skip(services, input), fields(request_id = ?input.request_id))]
pub async fn generate(State(services): State<Services>, Json(input): Json<GenerateInput>) -> impl IntoResponse {
    match services.image_service.generate(&input).await {
        Ok(result) => Ok(Json(result)),
        Err(e) => Err((e.status, Json(e.error))),
    }
}
