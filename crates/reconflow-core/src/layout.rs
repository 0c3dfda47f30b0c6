//! Output directory layout
//!
//! Pure path arithmetic over the images directory. Nothing here touches the
//! disk; stages call [`crate::fs::ensure_dir`] on the paths they need.

use std::path::{Path, PathBuf};

/// Name of the output root created next to the input images
pub const OUTPUT_DIR: &str = "Output";
pub const MATCHES_DIR: &str = "Describers&Matches";
pub const SFM_DIR: &str = "SfM_Output";
pub const MVS_DIR: &str = "MVS_Output";
pub const DENSIFY_DIR: &str = "Densify";
pub const MESH_DIR: &str = "Mesh";
pub const REFINE_MESH_DIR: &str = "RefineMesh";
pub const TEXTURE_MESH_DIR: &str = "TextureMesh";
pub const FINAL_EXPORT_DIR: &str = "FinalExport";

pub const IMAGE_LISTING_FILE: &str = "sfm_data.json";
pub const SFM_DATA_FILE: &str = "sfm_data.bin";
pub const REFINED_SFM_DATA_FILE: &str = "sfm_data_refined.bin";
pub const COLORIZED_CLOUD_FILE: &str = "colorized.ply";
pub const MVS_SCENE_FILE: &str = "sfm_scene.mvs";
pub const DENSE_SCENE_FILE: &str = "scene_dense.mvs";
pub const MESH_SCENE_FILE: &str = "scene_mesh.mvs";
pub const REFINED_MESH_SCENE_FILE: &str = "scene_mesh_refine.mvs";
pub const TEXTURED_SCENE_FILE: &str = "scene_texture.mvs";
pub const UNDISTORTED_IMAGES_DIR: &str = "undistorted_images";

/// Every directory and file the pipeline reads or writes, rooted at one
/// images directory.
///
/// The root is fixed at construction and never changes; stages only borrow
/// the layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathLayout {
    images_dir: PathBuf,
    output_root: PathBuf,
}

impl PathLayout {
    /// Create a layout for the given images directory
    pub fn new(images_dir: impl Into<PathBuf>) -> Self {
        let images_dir = images_dir.into();
        let output_root = images_dir.join(OUTPUT_DIR);
        Self {
            images_dir,
            output_root,
        }
    }

    /// The input images directory the layout was derived from
    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    /// `<images>/Output`
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn matches_dir(&self) -> PathBuf {
        self.output_root.join(MATCHES_DIR)
    }

    /// Image listing written by the load step and read by every later
    /// feature/SfM tool
    pub fn image_listing_path(&self) -> PathBuf {
        self.matches_dir().join(IMAGE_LISTING_FILE)
    }

    pub fn sfm_dir(&self) -> PathBuf {
        self.output_root.join(SFM_DIR)
    }

    /// Serialized structure-from-motion scene
    pub fn sfm_data_path(&self) -> PathBuf {
        self.sfm_dir().join(SFM_DATA_FILE)
    }

    pub fn refined_sfm_data_path(&self) -> PathBuf {
        self.sfm_dir().join(REFINED_SFM_DATA_FILE)
    }

    pub fn colorized_cloud_path(&self) -> PathBuf {
        self.sfm_dir().join(COLORIZED_CLOUD_FILE)
    }

    pub fn mvs_dir(&self) -> PathBuf {
        self.output_root.join(MVS_DIR)
    }

    /// Undistorted images produced alongside the MVS export
    pub fn undistorted_images_dir(&self) -> PathBuf {
        self.mvs_dir().join(UNDISTORTED_IMAGES_DIR)
    }

    pub fn densify_dir(&self) -> PathBuf {
        self.mvs_dir().join(DENSIFY_DIR)
    }

    /// Copy of the undistorted images staged for densification
    pub fn densify_images_dir(&self) -> PathBuf {
        self.densify_dir().join(UNDISTORTED_IMAGES_DIR)
    }

    /// Interchange scene consumed by densification (`MVS_Output/sfm_scene.mvs`)
    pub fn densify_input_path(&self) -> PathBuf {
        self.mvs_dir().join(MVS_SCENE_FILE)
    }

    pub fn densify_output_path(&self) -> PathBuf {
        self.densify_dir().join(DENSE_SCENE_FILE)
    }

    pub fn mesh_dir(&self) -> PathBuf {
        self.mvs_dir().join(MESH_DIR)
    }

    pub fn mesh_output_path(&self) -> PathBuf {
        self.mesh_dir().join(MESH_SCENE_FILE)
    }

    pub fn refine_mesh_dir(&self) -> PathBuf {
        self.mvs_dir().join(REFINE_MESH_DIR)
    }

    pub fn refine_output_path(&self) -> PathBuf {
        self.refine_mesh_dir().join(REFINED_MESH_SCENE_FILE)
    }

    pub fn texture_mesh_dir(&self) -> PathBuf {
        self.mvs_dir().join(TEXTURE_MESH_DIR)
    }

    pub fn texture_output_path(&self) -> PathBuf {
        self.texture_mesh_dir().join(TEXTURED_SCENE_FILE)
    }

    pub fn final_export_dir(&self) -> PathBuf {
        self.output_root.join(FINAL_EXPORT_DIR)
    }

    /// All named directories with a short label, in pipeline order
    pub fn directories(&self) -> Vec<(&'static str, PathBuf)> {
        vec![
            ("output", self.output_root.clone()),
            ("matches", self.matches_dir()),
            ("sfm", self.sfm_dir()),
            ("mvs", self.mvs_dir()),
            ("densify", self.densify_dir()),
            ("mesh", self.mesh_dir()),
            ("refine_mesh", self.refine_mesh_dir()),
            ("texture_mesh", self.texture_mesh_dir()),
            ("final_export", self.final_export_dir()),
        ]
    }

    /// All named artifact files with a short label, in pipeline order
    pub fn artifacts(&self) -> Vec<(&'static str, PathBuf)> {
        vec![
            ("image_listing", self.image_listing_path()),
            ("sfm_data", self.sfm_data_path()),
            ("colorized_cloud", self.colorized_cloud_path()),
            ("refined_sfm_data", self.refined_sfm_data_path()),
            ("mvs_scene", self.densify_input_path()),
            ("dense_scene", self.densify_output_path()),
            ("mesh_scene", self.mesh_output_path()),
            ("refined_mesh_scene", self.refine_output_path()),
            ("textured_scene", self.texture_output_path()),
        ]
    }
}
