//! Dense reconstruction and mesh stage
//!
//! Four independently dispatchable operations. Each one creates its own
//! working directory, checks that its upstream artifact exists, then hands
//! the paths to the toolchain. None of them triggers the next.

use crate::stage::{StageContext, StageError};
use crate::toolchain::{MvsCall, MvsOperation, ToolCall};
use reconflow_core::{copy_by_extensions, copy_dir_recursive};
use std::path::PathBuf;
use tracing::{info, warn};

/// Extensions always gathered into the final export, besides the mesh format
pub const EXPORT_EXTENSIONS: [&str; 3] = ["mtl", "jpg", "png"];

pub struct MvsStage;

impl MvsStage {
    /// Stage the undistorted images and build the dense point cloud
    pub fn densify(ctx: &StageContext<'_>) -> Result<(), StageError> {
        let layout = ctx.layout;
        let working_dir = layout.densify_dir();
        ctx.ensure_dir(&working_dir)?;

        let input = layout.densify_input_path();
        ctx.require("MVS scene", &input)?;

        let staged = copy_dir_recursive(
            ctx.fs,
            &layout.undistorted_images_dir(),
            &layout.densify_images_dir(),
        )?;
        info!(images = staged, "Staged undistorted images");

        ctx.invoke(ToolCall::Mvs(MvsCall {
            operation: MvsOperation::Densify,
            input,
            output: layout.densify_output_path(),
            working_dir,
        }))
    }

    pub fn reconstruct_mesh(ctx: &StageContext<'_>) -> Result<(), StageError> {
        let layout = ctx.layout;
        let working_dir = layout.mesh_dir();
        ctx.ensure_dir(&working_dir)?;

        let input = layout.densify_output_path();
        ctx.require("dense scene", &input)?;

        ctx.invoke(ToolCall::Mvs(MvsCall {
            operation: MvsOperation::ReconstructMesh,
            input,
            output: layout.mesh_output_path(),
            working_dir,
        }))
    }

    pub fn refine_mesh(ctx: &StageContext<'_>) -> Result<(), StageError> {
        let layout = ctx.layout;
        let working_dir = layout.refine_mesh_dir();
        ctx.ensure_dir(&working_dir)?;

        let input = layout.mesh_output_path();
        ctx.require("mesh scene", &input)?;

        ctx.invoke(ToolCall::Mvs(MvsCall {
            operation: MvsOperation::RefineMesh,
            input,
            output: layout.refine_output_path(),
            working_dir,
        }))
    }

    /// Texture the mesh, then gather the results into `FinalExport`.
    ///
    /// Textures `scene_mesh_refine.mvs` whenever that file exists, otherwise
    /// `scene_mesh.mvs`. File age is not compared, so after re-running mesh
    /// reconstruction the refine task must run again before texturing, or the
    /// earlier refined mesh is used. Returns the gathered files.
    pub fn texture_mesh(ctx: &StageContext<'_>) -> Result<Vec<PathBuf>, StageError> {
        let layout = ctx.layout;
        let working_dir = layout.texture_mesh_dir();
        ctx.ensure_dir(&working_dir)?;

        let input = Self::texture_input(ctx)?;

        ctx.invoke(ToolCall::Mvs(MvsCall {
            operation: MvsOperation::TextureMesh,
            input,
            output: layout.texture_output_path(),
            working_dir: working_dir.clone(),
        }))?;

        let format = ctx.config.export_format.as_str();
        let mut allowed: Vec<&str> = EXPORT_EXTENSIONS.to_vec();
        if !allowed.contains(&format) {
            allowed.push(format);
        }

        let gathered =
            copy_by_extensions(ctx.fs, &working_dir, &layout.final_export_dir(), &allowed)?;
        if gathered.is_empty() {
            warn!(dir = %working_dir.display(), "No exportable files produced");
        } else {
            info!(files = gathered.len(), "Gathered final export");
        }
        Ok(gathered)
    }

    fn texture_input(ctx: &StageContext<'_>) -> Result<PathBuf, StageError> {
        let refined = ctx.layout.refine_output_path();
        if ctx.fs.exists(&refined) {
            return Ok(refined);
        }
        let mesh = ctx.layout.mesh_output_path();
        ctx.require("mesh scene", &mesh)?;
        Ok(mesh)
    }
}
