//! Tool-calling surface: every tool answers with the same [`ToolResponse`]
//! envelope and delegates the actual work to the processing services.

use std::time::Instant;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{
    metrics::MetricsDto,
    models::{GenerateInput, PdfInput},
    util::{consts::{NAME, SERVICE_NAME}, validation::validate_any_request},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::{processing::ProcessingError, state::ServiceCollection};

const VALID_MESSAGE: &str = "Request data is valid";

#[derive(Debug, Serialize)]
pub struct ToolResponse {
    pub request_id: String,
    pub status: &'static str,
    pub message: String,
    pub data: Value,
    pub metrics: Option<MetricsDto>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ToolDescription {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

#[derive(Debug, Serialize)]
pub struct ResourceDescription {
    pub uri: String,
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "mimeType")]
    pub mime_type: &'static str,
}

#[derive(Debug, Default, Deserialize)]
struct ValidateArgs {
    request_id: Option<String>,
    prompt: Option<String>,
    html: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct IntegrationArgs {
    test_type: Option<String>,
    request_id: Option<String>,
    prompt: Option<String>,
    html: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

pub fn list_tools() -> Vec<ToolDescription> {
    vec![
        ToolDescription {
            name: "validate_request",
            description: "Validate request data structure and format",
            input_schema: json!({
                "type": "object",
                "properties": {"request_data": {"type": "object", "description": "Request data to validate"}},
                "required": ["request_data"]
            }),
        },
        ToolDescription {
            name: "process_image_generation",
            description: "Process image generation request",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "request_id": {"type": "string"},
                    "prompt": {"type": "string"},
                    "width": {"type": "integer", "default": 512},
                    "height": {"type": "integer", "default": 512}
                },
                "required": ["request_id", "prompt"]
            }),
        },
        ToolDescription {
            name: "process_pdf_conversion",
            description: "Process HTML to PDF conversion request",
            input_schema: json!({
                "type": "object",
                "properties": {"request_id": {"type": "string"}, "html": {"type": "string"}},
                "required": ["request_id", "html"]
            }),
        },
        ToolDescription {
            name: "get_system_metrics",
            description: "Get current system performance metrics",
            input_schema: json!({"type": "object", "properties": {}, "required": []}),
        },
        ToolDescription {
            name: "run_integration_test",
            description: "Run full integration test with validation, processing, and metrics",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "test_type": {"type": "string", "enum": ["image", "pdf", "both"], "description": "Type of test to run"},
                    "request_id": {"type": "string"},
                    "prompt": {"type": "string"},
                    "html": {"type": "string"}
                },
                "required": ["test_type"]
            }),
        },
    ]
}

const RESOURCES: [(&str, &str, &str); 3] = [
    ("metrics", "System Metrics", "Current application performance metrics"),
    ("health", "Health Status", "Current system health and configuration status"),
    ("test-examples", "Test Examples", "Sample test requests for validation"),
];

fn resource_uri(key: &str) -> String {
    format!("{}://{}", NAME, key)
}

pub fn list_resources() -> Vec<ResourceDescription> {
    RESOURCES
        .iter()
        .map(|&(key, name, description)| ResourceDescription {
            uri: resource_uri(key),
            name,
            description,
            mime_type: "application/json",
        })
        .collect()
}

fn test_examples() -> Value {
    json!({
        "image_generation_test": {
            "request_id": "550e8400-e29b-41d4-a716-446655440000",
            "action": "generate_image",
            "payload": {"prompt": "A mystical forest with glowing trees", "width": 512, "height": 512}
        },
        "pdf_conversion_test": {
            "request_id": "550e8400-e29b-41d4-a716-446655440001",
            "action": "convert_pdf",
            "payload": {"html": "<h1>Test Story</h1><p>Once upon a time in Whisperwynd...</p>"}
        },
        "integration_test": {
            "request_id": "550e8400-e29b-41d4-a716-446655440002",
            "action": "integration_test",
            "payload": {
                "test_type": "both",
                "prompt": "A dragon in the clouds",
                "html": "<h1>Dragon Story</h1><p>The dragon soared through the misty clouds...</p>"
            }
        }
    })
}

fn request_id_of(args: &Value) -> String {
    args.get("request_id").and_then(Value::as_str).unwrap_or("unknown").to_string()
}

fn format_duration(started: Instant) -> String {
    format!("{:.3}s", started.elapsed().as_secs_f64())
}

impl ServiceCollection {
    fn respond(&self, request_id: String, status: &'static str, message: impl Into<String>, data: Value) -> ToolResponse {
        ToolResponse {
            request_id,
            status,
            message: message.into(),
            data,
            metrics: Some(self.metrics.snapshot()),
            timestamp: Utc::now(),
        }
    }

    fn processing_failure(&self, request_id: String, err: ProcessingError) -> (StatusCode, ToolResponse) {
        let status = if err.is_validation() { "validation_failed" } else { "error" };
        let message = err.error.message.clone();
        let data = serde_json::to_value(&err.error).unwrap_or(Value::Null);
        (err.status, self.respond(request_id, status, message, data))
    }

    /// Runs the named tool. Arguments that do not fit the tool's schema are
    /// answered as failed validation.
    #[tracing::instrument(skip(self, args, base_url))]
    pub async fn call_tool(&self, name: &str, args: Value, base_url: &str) -> (StatusCode, ToolResponse) {
        let started = Instant::now();
        let (status, response) = match name {
            "validate_request" => self.validate_tool(args),
            "process_image_generation" => self.image_tool(args).await,
            "process_pdf_conversion" => self.pdf_tool(args, base_url).await,
            "get_system_metrics" => self.metrics_tool(),
            "run_integration_test" => self.integration_tool(args, base_url).await,
            unknown => {
                warn!("Unknown tool {}", unknown);
                self.metrics.record_error("MCP_ERROR");
                let response = ToolResponse {
                    request_id: "unknown".to_string(),
                    status: "error",
                    message: format!("Unknown tool: {}", unknown),
                    data: json!({}),
                    metrics: None,
                    timestamp: Utc::now(),
                };
                (StatusCode::NOT_FOUND, response)
            }
        };
        info!("Tool {} answered {} in {}", name, response.status, format_duration(started));
        (status, response)
    }

    /// Reads a resource by key (`metrics`) or full uri (`whisperwynd://metrics`).
    #[tracing::instrument(skip(self))]
    pub fn read_resource(&self, name: &str) -> (StatusCode, ToolResponse) {
        let prefix = resource_uri("");
        let key = name.strip_prefix(prefix.as_str()).unwrap_or(name);
        let data = match key {
            "metrics" => json!(self.metrics.snapshot()),
            "health" => {
                let snapshot = self.metrics.snapshot();
                json!({
                    "service": SERVICE_NAME,
                    "status": if self.missing_config.is_empty() { "healthy" } else { "degraded" },
                    "timestamp": Utc::now(),
                    "metrics_summary": {
                        "total_requests": snapshot.total_requests,
                        "success_rate": snapshot.success_rate,
                    },
                })
            }
            "test-examples" => test_examples(),
            _ => {
                warn!("Unknown resource {}", name);
                self.metrics.record_error("MCP_ERROR");
                let response = ToolResponse {
                    request_id: "resource_request".to_string(),
                    status: "error",
                    message: format!("Unknown resource: {}", name),
                    data: json!({}),
                    metrics: None,
                    timestamp: Utc::now(),
                };
                return (StatusCode::NOT_FOUND, response);
            }
        };
        let message = format!("Resource {} read successfully", resource_uri(key));
        (StatusCode::OK, self.respond("resource_request".to_string(), "success", message, data))
    }

    fn validate_tool(&self, args: Value) -> (StatusCode, ToolResponse) {
        let args = match args.get("request_data") {
            Some(request_data) if request_data.is_object() => request_data.clone(),
            _ => args,
        };
        let request_id = request_id_of(&args);
        let validated = serde_json::from_value::<ValidateArgs>(args)
            .map_err(|_| "Request data has invalid field types")
            .and_then(|args| validate_any_request(&args.request_id, &args.prompt, &args.html));
        let (status, message) = match validated {
            Ok(()) => ("success", VALID_MESSAGE),
            Err(message) => ("validation_failed", message),
        };
        let data = json!({"is_valid": validated.is_ok(), "validation_details": message});
        (StatusCode::OK, self.respond(request_id, status, message, data))
    }

    async fn image_tool(&self, args: Value) -> (StatusCode, ToolResponse) {
        let request_id = request_id_of(&args);
        let Ok(input) = serde_json::from_value::<GenerateInput>(args) else {
            return (StatusCode::BAD_REQUEST, self.respond(request_id, "validation_failed", "Arguments do not match the tool schema", json!({})));
        };
        match self.image_service.generate(&input).await {
            Ok(result) => (StatusCode::OK, self.respond(request_id, "success", "Image generated successfully", json!(result))),
            Err(err) => self.processing_failure(request_id, err),
        }
    }

    async fn pdf_tool(&self, args: Value, base_url: &str) -> (StatusCode, ToolResponse) {
        let request_id = request_id_of(&args);
        let Ok(input) = serde_json::from_value::<PdfInput>(args) else {
            return (StatusCode::BAD_REQUEST, self.respond(request_id, "validation_failed", "Arguments do not match the tool schema", json!({})));
        };
        match self.pdf_service.convert(&input, base_url).await {
            Ok(result) => (StatusCode::OK, self.respond(request_id, "success", "PDF generated successfully", json!(result))),
            Err(err) => self.processing_failure(request_id, err),
        }
    }

    fn metrics_tool(&self) -> (StatusCode, ToolResponse) {
        let snapshot = self.metrics.snapshot();
        let data = json!(snapshot);
        (StatusCode::OK, self.respond("metrics_request".to_string(), "success", "Metrics retrieved successfully", data))
    }

    async fn integration_tool(&self, args: Value, base_url: &str) -> (StatusCode, ToolResponse) {
        let started = Instant::now();
        let Ok(args) = serde_json::from_value::<IntegrationArgs>(args) else {
            return (StatusCode::BAD_REQUEST, self.respond("unknown".to_string(), "validation_failed", "Arguments do not match the tool schema", json!({})));
        };
        let test_type = args.test_type.as_deref().unwrap_or("both");
        let request_id = args.request_id.clone().unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        if !matches!(test_type, "image" | "pdf" | "both") {
            return (StatusCode::BAD_REQUEST, self.respond(request_id, "validation_failed", "test_type must be one of image, pdf, both", json!({})));
        }

        let mut results = vec![];
        let step = Instant::now();
        let validated = validate_any_request(&Some(request_id.clone()), &args.prompt, &args.html);
        results.push(json!({
            "test": "validation",
            "status": if validated.is_ok() { "passed" } else { "failed" },
            "message": validated.err().unwrap_or(VALID_MESSAGE),
            "duration": format_duration(step),
        }));

        if validated.is_ok() {
            if matches!(test_type, "image" | "both") && args.prompt.is_some() {
                let step = Instant::now();
                let input = GenerateInput {
                    request_id: Some(request_id.clone()),
                    prompt: args.prompt.clone(),
                    width: args.width,
                    height: args.height,
                };
                let outcome = self.image_service.generate(&input).await.map(|result| json!(result));
                results.push(step_result("image_processing", "Image generated successfully", outcome, step));
            }
            if matches!(test_type, "pdf" | "both") && args.html.is_some() {
                let step = Instant::now();
                let input = PdfInput {
                    request_id: Some(request_id.clone()),
                    html: args.html.clone(),
                };
                let outcome = self.pdf_service.convert(&input, base_url).await.map(|result| json!(result));
                results.push(step_result("pdf_processing", "PDF generated successfully", outcome, step));
            }
        }

        let total = results.len();
        let passed = results.iter().filter(|result| result["status"] == "passed").count();
        let all_passed = passed == total;
        let data = json!({
            "test_results": results,
            "overall_status": if all_passed { "passed" } else { "failed" },
            "total_duration": format_duration(started),
            "test_summary": {
                "passed": passed,
                "total": total,
                "success_rate": format!("{:.1}%", passed as f64 / total as f64 * 100.0),
            },
        });
        let message = format!("Integration test completed - {}/{} tests passed", passed, total);
        let status = if all_passed { "success" } else { "partial_failure" };
        (StatusCode::OK, self.respond(request_id, status, message, data))
    }
}

fn step_result(test: &str, success_message: &str, outcome: Result<Value, ProcessingError>, started: Instant) -> Value {
    match outcome {
        Ok(data) => json!({"test": test, "status": "passed", "message": success_message, "duration": format_duration(started), "data": data}),
        Err(err) => json!({"test": test, "status": "failed", "message": err.error.message, "duration": format_duration(started), "data": err.error}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tool_has_an_object_schema() {
        let tools = list_tools();
        let names: Vec<_> = tools.iter().map(|tool| tool.name).collect();
        assert_eq!(names, vec!["validate_request", "process_image_generation", "process_pdf_conversion", "get_system_metrics", "run_integration_test"]);
        assert!(tools.iter().all(|tool| tool.input_schema["type"] == "object"));
    }

    #[test]
    fn resources_use_the_service_scheme() {
        let uris: Vec<_> = list_resources().into_iter().map(|resource| resource.uri).collect();
        assert_eq!(uris, vec!["whisperwynd://metrics", "whisperwynd://health", "whisperwynd://test-examples"]);
    }

    #[test]
    fn test_examples_carry_valid_request_ids() {
        let examples = test_examples();
        for (_, example) in examples.as_object().unwrap() {
            assert!(common::util::validation::is_guid(example["request_id"].as_str().unwrap()));
        }
    }

    #[test]
    fn request_id_falls_back_to_unknown() {
        assert_eq!(request_id_of(&json!({"request_id": "abc"})), "abc");
        assert_eq!(request_id_of(&json!({"request_id": 4})), "unknown");
        assert_eq!(request_id_of(&json!(null)), "unknown");
    }
}
