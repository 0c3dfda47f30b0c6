//! Task selection
//!
//! Maps the externally supplied integer selector onto the five runnable
//! actions.

use std::fmt;
use thiserror::Error;

/// Task selector errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("Invalid task number: {0} (expected 0-4)")]
    Unrecognized(i64),
}

/// One runnable action of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskSelector {
    /// Feature extraction, matching and structure-from-motion, in one chain
    FrontEnd,
    /// Dense point cloud reconstruction
    Densify,
    /// Mesh reconstruction from the dense cloud
    ReconstructMesh,
    /// Mesh refinement
    RefineMesh,
    /// Mesh texturing and final export
    TextureMesh,
}

impl TaskSelector {
    /// All selectors in numeric order
    pub const ALL: [TaskSelector; 5] = [
        TaskSelector::FrontEnd,
        TaskSelector::Densify,
        TaskSelector::ReconstructMesh,
        TaskSelector::RefineMesh,
        TaskSelector::TextureMesh,
    ];

    /// Numeric value accepted on the command line
    pub fn number(self) -> i64 {
        match self {
            TaskSelector::FrontEnd => 0,
            TaskSelector::Densify => 1,
            TaskSelector::ReconstructMesh => 2,
            TaskSelector::RefineMesh => 3,
            TaskSelector::TextureMesh => 4,
        }
    }

    /// Stable short name used in logs
    pub fn name(self) -> &'static str {
        match self {
            TaskSelector::FrontEnd => "front_end",
            TaskSelector::Densify => "densify",
            TaskSelector::ReconstructMesh => "reconstruct_mesh",
            TaskSelector::RefineMesh => "refine_mesh",
            TaskSelector::TextureMesh => "texture_mesh",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            TaskSelector::FrontEnd => "Load images, extract and match features, solve structure-from-motion, export to MVS",
            TaskSelector::Densify => "Densify the sparse point cloud",
            TaskSelector::ReconstructMesh => "Reconstruct a mesh from the dense point cloud",
            TaskSelector::RefineMesh => "Refine the reconstructed mesh",
            TaskSelector::TextureMesh => "Texture the mesh and gather the final export",
        }
    }
}

impl TryFrom<i64> for TaskSelector {
    type Error = TaskError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        TaskSelector::ALL
            .into_iter()
            .find(|task| task.number() == value)
            .ok_or(TaskError::Unrecognized(value))
    }
}

impl fmt::Display for TaskSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.number(), self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_selectors() {
        for n in 0..=4 {
            let task = TaskSelector::try_from(n).unwrap();
            assert_eq!(task.number(), n);
        }
        assert_eq!(TaskSelector::try_from(1), Ok(TaskSelector::Densify));
        assert_eq!(TaskSelector::try_from(4), Ok(TaskSelector::TextureMesh));
    }

    #[test]
    fn test_unknown_selectors() {
        for n in [-1, 5, 7, i64::MAX] {
            assert_eq!(TaskSelector::try_from(n), Err(TaskError::Unrecognized(n)));
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(TaskSelector::FrontEnd.to_string(), "0 (front_end)");
    }
}
