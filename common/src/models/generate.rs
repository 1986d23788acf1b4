use serde::{Deserialize, Serialize};

pub const DEFAULT_DIMENSION: u32 = 512;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateInput {
    pub request_id: Option<String>,
    pub prompt: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateResult {
    pub status: &'static str,
    pub image_url: String,
    pub blob_url: Option<String>,
}
