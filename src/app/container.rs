use std::sync::Arc;

use crate::adapters::{FfmpegCutAdapter, FfprobeAdapter, ProbeBackend, Settings};
use crate::app::export_interactor::{ExportOptions, ExportPipeline};
use crate::error::TrimResult;
use crate::ports::{CutPort, ProbePort};

pub trait AppContainer: Send + Sync {
    fn probe_port(&self) -> Arc<dyn ProbePort>;
    fn export_pipeline(&self) -> ExportPipeline;
}

/// Adapters wired from a `Settings` value
pub struct DefaultAppContainer {
    probe_port: Arc<dyn ProbePort>,
    export_pipeline: ExportPipeline,
}

impl DefaultAppContainer {
    pub fn new(settings: &Settings) -> TrimResult<Self> {
        let probe_port = probe_adapter(settings)?;
        let cut_port: Arc<dyn CutPort> = Arc::new(FfmpegCutAdapter::new(&settings.tools.ffmpeg));

        let export_pipeline = ExportPipeline::new(
            Arc::clone(&probe_port),
            cut_port,
            ExportOptions {
                crop_suffix: settings.export.crop_suffix.clone(),
                comment: settings.export.comment.clone(),
            },
        );

        Ok(Self {
            probe_port,
            export_pipeline,
        })
    }
}

impl AppContainer for DefaultAppContainer {
    fn probe_port(&self) -> Arc<dyn ProbePort> {
        Arc::clone(&self.probe_port)
    }

    fn export_pipeline(&self) -> ExportPipeline {
        self.export_pipeline.clone()
    }
}

fn probe_adapter(settings: &Settings) -> TrimResult<Arc<dyn ProbePort>> {
    match settings.tools.probe_backend {
        ProbeBackend::Ffprobe => Ok(Arc::new(FfprobeAdapter::new(&settings.tools.ffprobe))),
        #[cfg(feature = "libav")]
        ProbeBackend::Libav => Ok(Arc::new(crate::adapters::LibavProbeAdapter::new()?)),
        #[cfg(not(feature = "libav"))]
        ProbeBackend::Libav => Err(crate::error::TrimError::Config {
            message: "probe_backend = \"libav\" requires building with the `libav` feature".to_string(),
        }),
    }
}
