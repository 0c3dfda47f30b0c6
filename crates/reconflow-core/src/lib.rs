//! reconflow Core - Layout, configuration and filesystem types
//!
//! reconflow drives an image-based 3D reconstruction from a folder of photos
//! to a textured mesh by delegating each step to external tools. This crate
//! holds everything those steps agree on before any tool runs.
//!
//! # Output Layout
//!
//! ```text
//! <images>/Output/
//! ├── Describers&Matches/       features, matches, image listing
//! ├── SfM_Output/sfm_data.bin   solved cameras + sparse points
//! ├── MVS_Output/sfm_scene.mvs  interchange scene for the MVS tools
//! │   ├── Densify/scene_dense.mvs
//! │   ├── Mesh/
//! │   ├── RefineMesh/
//! │   └── TextureMesh/
//! └── FinalExport/              gathered meshes, materials, textures
//! ```
//!
//! Every path is derived from the images directory alone, so two runs over
//! the same input always agree on where an artifact lives.

pub mod config;
pub mod fs;
pub mod layout;
pub mod task;

// Re-export commonly used types
pub use config::{ConfigError, DescriberMethod, ExportFormat, PipelineConfig, ToolConfig};
pub use fs::{
    DirEntry, Filesystem, FsError, LocalFilesystem, MemoryFilesystem, copy_by_extensions,
    copy_dir_recursive, ensure_dir, extension_of,
};
pub use layout::PathLayout;
pub use task::{TaskError, TaskSelector};
