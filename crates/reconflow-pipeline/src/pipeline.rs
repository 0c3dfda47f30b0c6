//! Pipeline controller
//!
//! Owns the layout, the configuration and the two capabilities; lends them
//! to the dispatcher for the duration of one task.

use crate::dispatcher::{DispatchError, DispatchReport, RunStatus, TaskDispatcher};
use crate::stage::StageContext;
use crate::toolchain::Toolchain;
use reconflow_core::{ConfigError, Filesystem, FsError, PathLayout, PipelineConfig, ensure_dir};
use thiserror::Error;
use tracing::info;

/// Pipeline construction errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Filesystem(#[from] FsError),
}

/// A reconstruction pipeline bound to one images directory
pub struct ReconstructionPipeline {
    layout: PathLayout,
    config: PipelineConfig,
    fs: Box<dyn Filesystem>,
    tools: Box<dyn Toolchain>,
}

impl ReconstructionPipeline {
    /// Create the pipeline and its `Output` root directory
    pub fn new(
        config: PipelineConfig,
        fs: impl Filesystem + 'static,
        tools: impl Toolchain + 'static,
    ) -> Result<Self, PipelineError> {
        let layout = PathLayout::new(&config.images_dir);
        ensure_dir(&fs, layout.output_root())?;

        info!(
            output = %layout.output_root().display(),
            describer = %config.describer,
            export_format = %config.export_format,
            "Building reconstruction pipeline"
        );

        Ok(Self {
            layout,
            config,
            fs: Box::new(fs),
            tools: Box::new(tools),
        })
    }

    pub fn layout(&self) -> &PathLayout {
        &self.layout
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn context(&self) -> StageContext<'_> {
        StageContext::new(
            &self.layout,
            &self.config,
            self.fs.as_ref(),
            self.tools.as_ref(),
        )
    }

    pub fn dispatcher(&self) -> TaskDispatcher<'_> {
        TaskDispatcher::new(self.context())
    }

    /// Run a task and return its report or fault
    pub fn dispatch(&self, task: i64) -> Result<DispatchReport, DispatchError> {
        self.dispatcher().dispatch(task)
    }

    /// Run a task and return the process status
    pub fn execute(&self, task: i64) -> RunStatus {
        self.dispatcher().run(task)
    }
}
