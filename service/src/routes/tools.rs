use axum::extract::{Host, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;

use super::base_url;
use crate::state::Services;
use crate::tools::{list_resources, list_tools, ToolResponse};

pub fn create_route(services: Services) -> Router {
    Router::new()
        .route("/mcp/tools", get(tools))
        .route("/mcp/tools/:name", post(call_tool))
        .route("/mcp/resources", get(resources))
        .route("/mcp/resources/:name", get(read_resource))
        .route("/mcp/metrics", post(metrics_shortcut))
        .route("/mcp/validate", post(validate_shortcut))
        .route("/mcp/image", post(image_shortcut))
        .route("/mcp/pdf", post(pdf_shortcut))
        .route("/mcp/integration", post(integration_shortcut))
        .with_state(services)
}

pub async fn tools() -> impl IntoResponse {
    Json(list_tools())
}

pub async fn resources() -> impl IntoResponse {
    Json(list_resources())
}

#[tracing::instrument(skip(services))]
pub async fn read_resource(State(services): State<Services>, Path(name): Path<String>) -> impl IntoResponse {
    let (status, response) = services.read_resource(&name);
    (status, Json(response))
}

async fn run(services: &Services, name: &str, args: Value, host: Option<Host>) -> (StatusCode, Json<ToolResponse>) {
    let (status, response) = services.call_tool(name, args, &base_url(host)).await;
    (status, Json(response))
}

#[tracing::instrument(skip(services, host, args))]
pub async fn call_tool(State(services): State<Services>, Path(name): Path<String>, host: Option<Host>, args: Option<Json<Value>>) -> impl IntoResponse {
    let args = args.map(|Json(args)| args).unwrap_or(Value::Object(Default::default()));
    run(&services, &name, args, host).await
}

pub async fn metrics_shortcut(State(services): State<Services>) -> impl IntoResponse {
    run(&services, "get_system_metrics", Value::Object(Default::default()), None).await
}

pub async fn validate_shortcut(State(services): State<Services>, Json(args): Json<Value>) -> impl IntoResponse {
    run(&services, "validate_request", args, None).await
}

pub async fn image_shortcut(State(services): State<Services>, Json(args): Json<Value>) -> impl IntoResponse {
    run(&services, "process_image_generation", args, None).await
}

pub async fn pdf_shortcut(State(services): State<Services>, host: Option<Host>, Json(args): Json<Value>) -> impl IntoResponse {
    run(&services, "process_pdf_conversion", args, host).await
}

pub async fn integration_shortcut(State(services): State<Services>, host: Option<Host>, Json(args): Json<Value>) -> impl IntoResponse {
    run(&services, "run_integration_test", args, host).await
}
