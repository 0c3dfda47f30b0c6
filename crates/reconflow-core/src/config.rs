//! Pipeline configuration
//!
//! [`PipelineConfig`] is captured once at startup and only ever borrowed.
//! [`ToolConfig`] names the external executables and is loaded from JSON.

use crate::fs::Filesystem;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Images directory not found: {0}")]
    ImagesDirNotFound(PathBuf),

    #[error("Missing camera calibration")]
    MissingCalibration,

    #[error("Unknown describer method: {0}")]
    UnknownDescriber(String),

    #[error("Invalid export format: '{0}'")]
    InvalidExportFormat(String),

    #[error("Tool config not found: {0}")]
    ToolConfigNotFound(PathBuf),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Feature descriptor method passed to the feature extraction tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DescriberMethod {
    #[default]
    Sift,
    SiftAnatomy,
    AkazeFloat,
    AkazeMldb,
}

impl DescriberMethod {
    pub const ALL: [DescriberMethod; 4] = [
        DescriberMethod::Sift,
        DescriberMethod::SiftAnatomy,
        DescriberMethod::AkazeFloat,
        DescriberMethod::AkazeMldb,
    ];

    /// Identifier understood by the feature extraction tool
    pub fn as_str(self) -> &'static str {
        match self {
            DescriberMethod::Sift => "SIFT",
            DescriberMethod::SiftAnatomy => "SIFT_ANATOMY",
            DescriberMethod::AkazeFloat => "AKAZE_FLOAT",
            DescriberMethod::AkazeMldb => "AKAZE_MLDB",
        }
    }
}

impl FromStr for DescriberMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DescriberMethod::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownDescriber(s.to_string()))
    }
}

impl fmt::Display for DescriberMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mesh export extension (lowercase, no leading dot)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExportFormat(String);

impl ExportFormat {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ExportFormat {
    fn default() -> Self {
        Self("obj".to_string())
    }
}

impl FromStr for ExportFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ext = s.trim().trim_start_matches('.').to_ascii_lowercase();
        if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::InvalidExportFormat(s.to_string()));
        }
        Ok(Self(ext))
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Startup parameters shared read-only with every stage
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory holding the input images
    pub images_dir: PathBuf,
    /// Camera intrinsics ("f;0;ppx;0;f;ppy;0;0;1") or a sensor database path
    pub calibration: String,
    /// Feature descriptor method
    pub describer: DescriberMethod,
    /// Extension of the exported mesh
    pub export_format: ExportFormat,
    /// Run the structure-from-known-poses refinement after SfM
    pub refine_with_known_poses: bool,
}

impl PipelineConfig {
    /// Create a configuration with default describer and export format
    pub fn new(images_dir: impl Into<PathBuf>, calibration: impl Into<String>) -> Self {
        Self {
            images_dir: images_dir.into(),
            calibration: calibration.into(),
            describer: DescriberMethod::default(),
            export_format: ExportFormat::default(),
            refine_with_known_poses: true,
        }
    }

    /// Set the describer method
    pub fn with_describer(mut self, describer: DescriberMethod) -> Self {
        self.describer = describer;
        self
    }

    /// Set the export format
    pub fn with_export_format(mut self, format: ExportFormat) -> Self {
        self.export_format = format;
        self
    }

    /// Enable/disable pose-based structure refinement
    pub fn with_pose_refinement(mut self, enabled: bool) -> Self {
        self.refine_with_known_poses = enabled;
        self
    }

    /// Check the parameters before any stage runs
    pub fn validate(&self, fs: &dyn Filesystem) -> Result<(), ConfigError> {
        if !fs.is_dir(&self.images_dir) {
            return Err(ConfigError::ImagesDirNotFound(self.images_dir.clone()));
        }
        if self.calibration.trim().is_empty() {
            return Err(ConfigError::MissingCalibration);
        }
        Ok(())
    }
}

/// External executables used for each delegated operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Directory prepended to every executable name, if set
    pub bin_dir: Option<PathBuf>,
    pub list_images: String,
    pub compute_features: String,
    pub compute_matches: String,
    pub reconstruct_sfm: String,
    pub colorize_structure: String,
    pub structure_from_known_poses: String,
    pub export_to_mvs: String,
    pub densify: String,
    pub reconstruct_mesh: String,
    pub refine_mesh: String,
    pub texture_mesh: String,
    /// Extra environment passed to every tool
    pub env: BTreeMap<String, String>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            bin_dir: None,
            list_images: "openMVG_main_SfMInit_ImageListing".to_string(),
            compute_features: "openMVG_main_ComputeFeatures".to_string(),
            compute_matches: "openMVG_main_ComputeMatches".to_string(),
            reconstruct_sfm: "openMVG_main_IncrementalSfM".to_string(),
            colorize_structure: "openMVG_main_ComputeSfM_DataColor".to_string(),
            structure_from_known_poses: "openMVG_main_ComputeStructureFromKnownPoses"
                .to_string(),
            export_to_mvs: "openMVG_main_openMVG2openMVS".to_string(),
            densify: "DensifyPointCloud".to_string(),
            reconstruct_mesh: "ReconstructMesh".to_string(),
            refine_mesh: "RefineMesh".to_string(),
            texture_mesh: "TextureMesh".to_string(),
            env: BTreeMap::new(),
        }
    }
}

impl ToolConfig {
    /// Load from a JSON file; missing fields fall back to defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::ToolConfigNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Default per-user location: `<config_dir>/reconflow/tools.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("reconflow").join("tools.json"))
    }

    /// Load from `path` if given, else from the per-user file if present,
    /// else use built-in defaults
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load(path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Full path of an executable, honouring `bin_dir`
    pub fn executable(&self, name: &str) -> PathBuf {
        match &self.bin_dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::LocalFilesystem;
    use tempfile::TempDir;

    #[test]
    fn test_describer_parsing() {
        assert_eq!(
            "sift".parse::<DescriberMethod>().unwrap(),
            DescriberMethod::Sift
        );
        assert_eq!(
            "AKAZE_MLDB".parse::<DescriberMethod>().unwrap(),
            DescriberMethod::AkazeMldb
        );
        assert!(matches!(
            "ORB".parse::<DescriberMethod>(),
            Err(ConfigError::UnknownDescriber(_))
        ));
    }

    #[test]
    fn test_export_format_normalised() {
        assert_eq!(".OBJ".parse::<ExportFormat>().unwrap().as_str(), "obj");
        assert_eq!("ply".parse::<ExportFormat>().unwrap().as_str(), "ply");
        assert!("".parse::<ExportFormat>().is_err());
        assert!("o/bj".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_validate() {
        let temp_dir = TempDir::new().unwrap();

        let config = PipelineConfig::new(temp_dir.path(), "2905;0;1416;0;2905;1064;0;0;1");
        assert!(config.validate(&LocalFilesystem).is_ok());

        let config = PipelineConfig::new(temp_dir.path(), "  ");
        assert!(matches!(
            config.validate(&LocalFilesystem),
            Err(ConfigError::MissingCalibration)
        ));

        let config = PipelineConfig::new(temp_dir.path().join("missing"), "k");
        assert!(matches!(
            config.validate(&LocalFilesystem),
            Err(ConfigError::ImagesDirNotFound(_))
        ));
    }

    #[test]
    fn test_tool_config_partial_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tools.json");
        std::fs::write(&path, r#"{ "bin_dir": "/opt/mvs/bin", "densify": "Densify" }"#).unwrap();

        let tools = ToolConfig::load(&path).unwrap();
        assert_eq!(tools.densify, "Densify");
        assert_eq!(tools.refine_mesh, "RefineMesh");
        assert_eq!(
            tools.executable(&tools.densify),
            PathBuf::from("/opt/mvs/bin/Densify")
        );
    }

    #[test]
    fn test_tool_config_errors() {
        let temp_dir = TempDir::new().unwrap();

        let missing = temp_dir.path().join("nope.json");
        assert!(matches!(
            ToolConfig::load(&missing),
            Err(ConfigError::ToolConfigNotFound(_))
        ));

        let broken = temp_dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(ToolConfig::load(&broken), Err(ConfigError::Parse(_))));
    }
}
