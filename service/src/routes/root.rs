use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use common::dtos::{HealthConfiguration, HealthDto, HealthEndpoints, RootDto, RootLinks};
use common::util::consts::{NAME, SERVICE_NAME, VERSION};

use crate::state::Services;

pub fn create_route(services: Services) -> Router {
    Router::new()
        .route("/", get(root_links))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(services)
}

pub async fn root_links() -> Json<RootDto> {
    Json(RootDto {
        version: VERSION,
        name: NAME,
        _links: RootLinks {
            generate: "/generate",
            convert_html_to_pdf: "/convert_html_to_pdf",
            health: "/health",
            metrics: "/metrics",
            tools: "/mcp/tools",
        },
    })
}

#[tracing::instrument(skip(services))]
pub async fn health(State(services): State<Services>) -> impl IntoResponse {
    let healthy = services.missing_config.is_empty();
    let timestamp = chrono::Utc::now().timestamp_millis() as f64 / 1000.0;
    let dto = HealthDto {
        service: SERVICE_NAME,
        status: if healthy { "healthy" } else { "degraded" },
        timestamp,
        configuration: HealthConfiguration {
            api_configured: healthy,
            missing_config: services.missing_config.clone(),
            endpoints: HealthEndpoints {
                generate: "/generate",
                pdf_convert: "/convert_html_to_pdf",
                health: "/health",
            },
        },
        metrics: services.metrics.snapshot(),
    };
    let status = if healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(dto))
}

#[tracing::instrument(skip(services))]
pub async fn metrics(State(services): State<Services>) -> impl IntoResponse {
    match services.metrics.encode() {
        Ok(text) => Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], text)),
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e)),
    }
}
