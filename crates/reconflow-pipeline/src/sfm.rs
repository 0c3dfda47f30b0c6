//! Structure-from-motion stage
//!
//! Consumes the matches directory and leaves `MVS_Output/sfm_scene.mvs`
//! behind for densification.

use crate::stage::{StageContext, StageError, Step, StepChain};
use crate::toolchain::ToolCall;

/// The four SfM steps, in order
pub struct SfmStage;

impl SfmStage {
    pub fn chain() -> StepChain {
        StepChain::new()
            .step(ReconstructStructure)
            .step(ProcessPointCloud)
            .step(RefineWithKnownPoses)
            .step(ExportToMvs)
    }
}

/// Solve cameras and sparse points into `SfM_Output/sfm_data.bin`
pub struct ReconstructStructure;

impl Step for ReconstructStructure {
    fn name(&self) -> &'static str {
        "reconstruct_structure"
    }

    fn run(&self, ctx: &StageContext<'_>) -> Result<(), StageError> {
        let sfm_dir = ctx.layout.sfm_dir();
        ctx.ensure_dir(&sfm_dir)?;

        let listing = ctx.layout.image_listing_path();
        ctx.require("image listing", &listing)?;

        ctx.invoke(ToolCall::ReconstructSfm {
            listing,
            matches_dir: ctx.layout.matches_dir(),
            output_dir: sfm_dir,
        })
    }
}

/// Normalize the coordinate frame and attach point colors
pub struct ProcessPointCloud;

impl Step for ProcessPointCloud {
    fn name(&self) -> &'static str {
        "process_point_cloud"
    }

    fn run(&self, ctx: &StageContext<'_>) -> Result<(), StageError> {
        let sfm_data = ctx.layout.sfm_data_path();
        ctx.require("structure-from-motion scene", &sfm_data)?;

        ctx.invoke(ToolCall::ColorizeStructure {
            sfm_data,
            output: ctx.layout.colorized_cloud_path(),
        })
    }
}

/// Re-triangulate structure with the solved poses held fixed
pub struct RefineWithKnownPoses;

impl Step for RefineWithKnownPoses {
    fn name(&self) -> &'static str {
        "refine_with_known_poses"
    }

    fn run(&self, ctx: &StageContext<'_>) -> Result<(), StageError> {
        let sfm_data = ctx.layout.sfm_data_path();
        ctx.require("structure-from-motion scene", &sfm_data)?;

        ctx.invoke(ToolCall::StructureFromKnownPoses {
            sfm_data,
            matches_dir: ctx.layout.matches_dir(),
            output: ctx.layout.refined_sfm_data_path(),
        })
    }

    fn can_skip(&self, ctx: &StageContext<'_>) -> bool {
        !ctx.config.refine_with_known_poses
    }
}

/// Write the interchange scene and undistorted images for the MVS tools.
///
/// Exports the pose-refined scene when refinement is enabled, otherwise the
/// scene straight out of reconstruction.
pub struct ExportToMvs;

impl Step for ExportToMvs {
    fn name(&self) -> &'static str {
        "export_to_mvs"
    }

    fn run(&self, ctx: &StageContext<'_>) -> Result<(), StageError> {
        let sfm_data = if ctx.config.refine_with_known_poses {
            let refined = ctx.layout.refined_sfm_data_path();
            ctx.require("refined structure-from-motion scene", &refined)?;
            refined
        } else {
            let sfm_data = ctx.layout.sfm_data_path();
            ctx.require("structure-from-motion scene", &sfm_data)?;
            sfm_data
        };
        ctx.ensure_dir(&ctx.layout.mvs_dir())?;

        ctx.invoke(ToolCall::ExportToMvs {
            sfm_data,
            output: ctx.layout.densify_input_path(),
            undistorted_dir: ctx.layout.undistorted_images_dir(),
        })
    }
}
