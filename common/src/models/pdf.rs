use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PdfInput {
    pub request_id: Option<String>,
    pub html: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PdfResult {
    pub status: &'static str,
    pub pdf_blob_url: Option<String>,
}
