//! Run command

use reconflow_core::{LocalFilesystem, ToolConfig};
use reconflow_pipeline::{EntryParams, ProcessToolchain, start};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

pub struct RunArgs {
    pub images_dir: PathBuf,
    pub calibration: String,
    pub describer: String,
    pub export_format: String,
    pub task: i64,
    pub tools: Option<PathBuf>,
    pub pose_refinement: bool,
}

pub fn run(args: RunArgs) -> ExitCode {
    let tool_config = match ToolConfig::resolve(args.tools.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load tool configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!(
        "Running task {} on {}",
        args.task,
        args.images_dir.display()
    );

    let params = EntryParams {
        images_dir: args.images_dir,
        calibration: args.calibration,
        describer: args.describer,
        export_format: args.export_format,
        task: args.task,
        refine_with_known_poses: args.pose_refinement,
    };

    start(params, LocalFilesystem, ProcessToolchain::new(tool_config)).into()
}
