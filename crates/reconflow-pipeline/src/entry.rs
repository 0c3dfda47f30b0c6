//! Entry point
//!
//! Turns raw startup parameters into a validated configuration, builds the
//! pipeline and hands the task to it.

use crate::dispatcher::RunStatus;
use crate::pipeline::{PipelineError, ReconstructionPipeline};
use crate::toolchain::Toolchain;
use reconflow_core::{DescriberMethod, ExportFormat, Filesystem, PipelineConfig};
use std::path::PathBuf;
use tracing::error;

/// Unvalidated parameters as supplied by the caller
#[derive(Debug, Clone)]
pub struct EntryParams {
    pub images_dir: PathBuf,
    pub calibration: String,
    pub describer: String,
    pub export_format: String,
    pub task: i64,
    pub refine_with_known_poses: bool,
}

impl EntryParams {
    /// Parse and check everything except the task selector
    pub fn to_config(&self, fs: &dyn Filesystem) -> Result<PipelineConfig, PipelineError> {
        let describer: DescriberMethod = self.describer.parse()?;
        let export_format: ExportFormat = self.export_format.parse()?;

        let config = PipelineConfig::new(&self.images_dir, self.calibration.clone())
            .with_describer(describer)
            .with_export_format(export_format)
            .with_pose_refinement(self.refine_with_known_poses);
        config.validate(fs)?;
        Ok(config)
    }
}

/// Validate, build and run. Every failure ends up as [`RunStatus::Failure`].
pub fn start(
    params: EntryParams,
    fs: impl Filesystem + 'static,
    tools: impl Toolchain + 'static,
) -> RunStatus {
    let pipeline = params
        .to_config(&fs)
        .and_then(|config| ReconstructionPipeline::new(config, fs, tools));

    match pipeline {
        Ok(pipeline) => pipeline.execute(params.task),
        Err(e) => {
            error!("Startup failed: {}", e);
            RunStatus::Failure
        }
    }
}
