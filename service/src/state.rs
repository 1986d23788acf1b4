use std::{path::PathBuf, sync::Arc};

use common::{
    metrics::Metrics,
    render::LibreOfficeRenderer,
    util::state::{GenerationServiceCollection, Settings},
};

use crate::processing::{ImageService, PdfService};

pub type Services = Arc<ServiceCollection>;

pub struct ServiceCollection {
    pub image_service: Arc<ImageService>,
    pub pdf_service: Arc<PdfService>,
    pub metrics: Arc<Metrics>,
    pub missing_config: Vec<&'static str>,
    pub output_dir: PathBuf,
}

impl ServiceCollection {
    pub fn build(settings: Settings) -> Result<Services, &'static str> {
        let base = GenerationServiceCollection::build(&settings)?;
        let metrics = Arc::new(Metrics::new()?);
        let missing_config = settings.missing_configuration();
        let renderer = LibreOfficeRenderer {
            binary: settings.soffice_path.clone(),
            timeout: settings.render_timeout,
        };
        Ok(Arc::new(ServiceCollection {
            image_service: Arc::new(ImageService::new(
                base.poller,
                base.file_storage.clone(),
                metrics.clone(),
                missing_config.clone(),
                settings.output_dir.clone(),
                settings.generation.max_wait,
            )),
            pdf_service: Arc::new(PdfService::new(Arc::new(renderer), base.file_storage, metrics.clone(), settings.output_dir.clone())),
            metrics,
            missing_config,
            output_dir: settings.output_dir,
        }))
    }
}
