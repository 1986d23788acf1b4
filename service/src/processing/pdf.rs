use std::{path::PathBuf, sync::Arc};

use axum::http::StatusCode;
use common::{
    dtos::ErrorDto,
    metrics::Metrics,
    models::{PdfInput, PdfResult},
    persistence::IFileStorage,
    render::IPdfRenderer,
    util::validation::validate_request,
};
use tokio::time::Instant;
use tracing::{error, info};

use super::ProcessingError;

pub struct PdfService {
    renderer: Arc<dyn IPdfRenderer>,
    file_storage: Arc<dyn IFileStorage>,
    metrics: Arc<Metrics>,
    output_dir: PathBuf,
}

impl PdfService {
    pub fn new(renderer: Arc<dyn IPdfRenderer>, file_storage: Arc<dyn IFileStorage>, metrics: Arc<Metrics>, output_dir: PathBuf) -> Self {
        PdfService {
            renderer,
            file_storage,
            metrics,
            output_dir,
        }
    }

    /// Renders the document with relative links resolved against `base_url`
    /// and uploads the result.
    #[tracing::instrument(skip(self, input), fields(request_id = ?input.request_id))]
    pub async fn convert(&self, input: &PdfInput, base_url: &str) -> Result<PdfResult, ProcessingError> {
        let request_id = validate_request(&input.request_id, &input.html, "Missing request_id or html").map_err(ProcessingError::validation)?;
        let html = input.html.as_deref().unwrap_or_default();

        self.metrics.record_request();
        let started = Instant::now();
        let result = self.convert_html(request_id, html, base_url).await;
        self.metrics.record_response_time(started.elapsed(), result.is_ok());
        match result {
            Ok(pdf_blob_url) => Ok(PdfResult { status: "success", pdf_blob_url }),
            Err(message) => {
                error!("Conversion failed: {}", message);
                self.metrics.record_error("PDF_ERROR");
                let mut error = ErrorDto::message(message);
                error.error_code = Some("PDF_ERROR");
                error.request_id = Some(request_id.to_string());
                Err(ProcessingError {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    error,
                })
            }
        }
    }

    async fn convert_html(&self, request_id: &str, html: &str, base_url: &str) -> Result<Option<String>, &'static str> {
        let pdf = self.renderer.render(html, base_url).await?;
        tokio::fs::create_dir_all(&self.output_dir).await.map_err(|_| "Could not create output directory.")?;
        let file_name = format!("{}.pdf", request_id);
        let path = self.output_dir.join(&file_name);
        tokio::fs::write(&path, &pdf).await.map_err(|_| "Could not write pdf.")?;
        info!("Wrote {} bytes to {}", pdf.len(), path.display());
        Ok(self.file_storage.store_result_file_path(&file_name, Some(mime::APPLICATION_PDF.as_ref()), &path).await)
    }
}
