//! Delegated reconstruction operations
//!
//! Every piece of vision work (features, matching, SfM, MVS) happens in an
//! external tool. The pipeline only describes *what* to run as a [`ToolCall`]
//! built from layout paths, and looks at whether it succeeded.

use reconflow_core::DescriberMethod;
use std::ffi::OsString;
use std::path::PathBuf;
use thiserror::Error;

/// Tool invocation errors
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Failed to start '{tool}': {source}")]
    Spawn {
        tool: String,
        source: std::io::Error,
    },

    #[error("'{tool}' exited with {}", exit_code_label(*code))]
    Failed { tool: String, code: Option<i32> },
}

fn exit_code_label(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Executes delegated operations
pub trait Toolchain: Send + Sync {
    /// Run one operation to completion
    fn run(&self, call: &ToolCall) -> Result<(), ToolError>;
}

/// The four multi-view stereo operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MvsOperation {
    Densify,
    ReconstructMesh,
    RefineMesh,
    TextureMesh,
}

impl MvsOperation {
    /// Operation token placed first in the argument list
    pub fn token(self) -> &'static str {
        match self {
            MvsOperation::Densify => "Densify",
            MvsOperation::ReconstructMesh => "ReconstructMesh",
            MvsOperation::RefineMesh => "RefineMesh",
            MvsOperation::TextureMesh => "TextureMesh",
        }
    }
}

/// A path-only MVS invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MvsCall {
    pub operation: MvsOperation,
    pub input: PathBuf,
    pub output: PathBuf,
    pub working_dir: PathBuf,
}

impl MvsCall {
    /// `[token, -i, input, -o, output, -w, working_dir]`
    pub fn argv(&self) -> Vec<OsString> {
        vec![
            self.operation.token().into(),
            "-i".into(),
            self.input.clone().into(),
            "-o".into(),
            self.output.clone().into(),
            "-w".into(),
            self.working_dir.clone().into(),
        ]
    }
}

/// One delegated operation with all of its path arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    /// Register the image set with its camera calibration
    ListImages {
        images_dir: PathBuf,
        calibration: String,
        output_dir: PathBuf,
    },
    ComputeFeatures {
        listing: PathBuf,
        output_dir: PathBuf,
        method: DescriberMethod,
    },
    ComputeMatches {
        listing: PathBuf,
        output_dir: PathBuf,
    },
    ReconstructSfm {
        listing: PathBuf,
        matches_dir: PathBuf,
        output_dir: PathBuf,
    },
    /// Move the solution to its origin and attach point colors
    ColorizeStructure { sfm_data: PathBuf, output: PathBuf },
    StructureFromKnownPoses {
        sfm_data: PathBuf,
        matches_dir: PathBuf,
        output: PathBuf,
    },
    ExportToMvs {
        sfm_data: PathBuf,
        output: PathBuf,
        undistorted_dir: PathBuf,
    },
    Mvs(MvsCall),
}

impl ToolCall {
    /// Stable name used in logs and tool lookup
    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::ListImages { .. } => "list_images",
            ToolCall::ComputeFeatures { .. } => "compute_features",
            ToolCall::ComputeMatches { .. } => "compute_matches",
            ToolCall::ReconstructSfm { .. } => "reconstruct_sfm",
            ToolCall::ColorizeStructure { .. } => "colorize_structure",
            ToolCall::StructureFromKnownPoses { .. } => "structure_from_known_poses",
            ToolCall::ExportToMvs { .. } => "export_to_mvs",
            ToolCall::Mvs(call) => match call.operation {
                MvsOperation::Densify => "densify",
                MvsOperation::ReconstructMesh => "reconstruct_mesh",
                MvsOperation::RefineMesh => "refine_mesh",
                MvsOperation::TextureMesh => "texture_mesh",
            },
        }
    }

    /// Command line arguments, excluding the program itself
    pub fn args(&self) -> Vec<OsString> {
        match self {
            ToolCall::ListImages {
                images_dir,
                calibration,
                output_dir,
            } => vec![
                "-i".into(),
                images_dir.into(),
                "-o".into(),
                output_dir.into(),
                "-k".into(),
                calibration.into(),
            ],
            ToolCall::ComputeFeatures {
                listing,
                output_dir,
                method,
            } => vec![
                "-i".into(),
                listing.into(),
                "-o".into(),
                output_dir.into(),
                "-m".into(),
                method.as_str().into(),
            ],
            ToolCall::ComputeMatches {
                listing,
                output_dir,
            } => vec!["-i".into(), listing.into(), "-o".into(), output_dir.into()],
            ToolCall::ReconstructSfm {
                listing,
                matches_dir,
                output_dir,
            } => vec![
                "-i".into(),
                listing.into(),
                "-m".into(),
                matches_dir.into(),
                "-o".into(),
                output_dir.into(),
            ],
            ToolCall::ColorizeStructure { sfm_data, output } => {
                vec!["-i".into(), sfm_data.into(), "-o".into(), output.into()]
            }
            ToolCall::StructureFromKnownPoses {
                sfm_data,
                matches_dir,
                output,
            } => vec![
                "-i".into(),
                sfm_data.into(),
                "-m".into(),
                matches_dir.into(),
                "-o".into(),
                output.into(),
            ],
            ToolCall::ExportToMvs {
                sfm_data,
                output,
                undistorted_dir,
            } => vec![
                "-i".into(),
                sfm_data.into(),
                "-o".into(),
                output.into(),
                "-d".into(),
                undistorted_dir.into(),
            ],
            // The token stands in for the program name
            ToolCall::Mvs(call) => call.argv().into_iter().skip(1).collect(),
        }
    }
}
