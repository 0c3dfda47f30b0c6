//! reconflow Pipeline - Reconstruction stage orchestration
//!
//! Sequences the delegated reconstruction tools over the layout defined in
//! `reconflow-core`, and dispatches a single task to completion or failure.
//!
//! # Task Table
//!
//! ```text
//! 0  LoadImages → ExtractFeatures → MatchFeatures
//!      → ReconstructStructure → ProcessPointCloud → RefineWithKnownPoses → ExportToMvs
//! 1  Densify
//! 2  ReconstructMesh
//! 3  RefineMesh
//! 4  TextureMesh → gather FinalExport
//! ```
//!
//! Chains stop at the first failing step. Partial outputs are left on disk.

pub mod dispatcher;
pub mod entry;
pub mod feature;
pub mod mvs;
pub mod pipeline;
pub mod process;
pub mod sfm;
pub mod stage;
pub mod toolchain;

// Re-export commonly used types
pub use dispatcher::{DispatchError, DispatchReport, RunStatus, TaskDispatcher};
pub use entry::{EntryParams, start};
pub use feature::FeatureStage;
pub use mvs::MvsStage;
pub use pipeline::{PipelineError, ReconstructionPipeline};
pub use process::ProcessToolchain;
pub use sfm::SfmStage;
pub use stage::{ChainFailure, ChainReport, FaultKind, StageContext, StageError, Step, StepChain};
pub use toolchain::{MvsCall, MvsOperation, ToolCall, ToolError, Toolchain};
