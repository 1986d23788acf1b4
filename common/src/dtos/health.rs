use serde::Serialize;

use crate::metrics::MetricsDto;

#[derive(Debug, Serialize)]
pub struct HealthDto {
    pub service: &'static str,
    pub status: &'static str,
    pub timestamp: f64,
    pub configuration: HealthConfiguration,
    pub metrics: MetricsDto,
}

#[derive(Debug, Serialize)]
pub struct HealthConfiguration {
    pub api_configured: bool,
    pub missing_config: Vec<&'static str>,
    pub endpoints: HealthEndpoints,
}

#[derive(Debug, Serialize)]
pub struct HealthEndpoints {
    pub generate: &'static str,
    pub pdf_convert: &'static str,
    pub health: &'static str,
}
