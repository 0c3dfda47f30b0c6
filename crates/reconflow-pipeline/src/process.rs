//! External process toolchain

use crate::toolchain::{MvsOperation, ToolCall, ToolError, Toolchain};
use reconflow_core::ToolConfig;
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info};

/// Runs each delegated operation as a child process and waits for it
pub struct ProcessToolchain {
    config: ToolConfig,
}

impl ProcessToolchain {
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }

    /// Executable configured for a call
    pub fn executable(&self, call: &ToolCall) -> PathBuf {
        let c = &self.config;
        let name = match call {
            ToolCall::ListImages { .. } => &c.list_images,
            ToolCall::ComputeFeatures { .. } => &c.compute_features,
            ToolCall::ComputeMatches { .. } => &c.compute_matches,
            ToolCall::ReconstructSfm { .. } => &c.reconstruct_sfm,
            ToolCall::ColorizeStructure { .. } => &c.colorize_structure,
            ToolCall::StructureFromKnownPoses { .. } => &c.structure_from_known_poses,
            ToolCall::ExportToMvs { .. } => &c.export_to_mvs,
            ToolCall::Mvs(mvs) => match mvs.operation {
                MvsOperation::Densify => &c.densify,
                MvsOperation::ReconstructMesh => &c.reconstruct_mesh,
                MvsOperation::RefineMesh => &c.refine_mesh,
                MvsOperation::TextureMesh => &c.texture_mesh,
            },
        };
        c.executable(name)
    }
}

impl Default for ProcessToolchain {
    fn default() -> Self {
        Self::new(ToolConfig::default())
    }
}

impl Toolchain for ProcessToolchain {
    fn run(&self, call: &ToolCall) -> Result<(), ToolError> {
        let program = self.executable(call);
        let tool = program.display().to_string();
        let args = call.args();

        debug!(tool = %tool, args = ?args, "Spawning");

        let status = Command::new(&program)
            .args(&args)
            .envs(&self.config.env)
            .status()
            .map_err(|source| ToolError::Spawn {
                tool: tool.clone(),
                source,
            })?;

        if !status.success() {
            return Err(ToolError::Failed {
                tool,
                code: status.code(),
            });
        }

        info!(operation = call.name(), "Tool finished");
        Ok(())
    }
}
