//! Shared fixtures for pipeline integration tests

#![allow(dead_code)]

use reconflow_core::{Filesystem, MemoryFilesystem, PathLayout, ensure_dir};
use reconflow_pipeline::{MvsOperation, ToolCall, ToolError, Toolchain};
use std::path::Path;
use std::sync::{Arc, Mutex};

pub const ROOT: &str = "/data/proj";

/// Where the fake tools write their outputs
#[derive(Clone)]
pub enum Sink {
    Memory(MemoryFilesystem),
    Disk,
}

impl Sink {
    fn touch(&self, path: &Path) {
        match self {
            Sink::Memory(fs) => fs.touch(path).unwrap(),
            Sink::Disk => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).unwrap();
                }
                std::fs::write(path, b"").unwrap();
            }
        }
    }
}

/// Fake toolchain that writes the files each real tool would produce,
/// records every call, and can be told to fail one operation.
#[derive(Clone)]
pub struct ScriptedToolchain {
    sink: Sink,
    calls: Arc<Mutex<Vec<ToolCall>>>,
    fail_on: Option<&'static str>,
}

impl ScriptedToolchain {
    pub fn new(sink: Sink) -> Self {
        Self {
            sink,
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_on: None,
        }
    }

    pub fn failing_on(mut self, operation: &'static str) -> Self {
        self.fail_on = Some(operation);
        self
    }

    pub fn calls(&self) -> Vec<ToolCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_names(&self) -> Vec<&'static str> {
        self.calls().iter().map(|c| c.name()).collect()
    }
}

impl Toolchain for ScriptedToolchain {
    fn run(&self, call: &ToolCall) -> Result<(), ToolError> {
        self.calls.lock().unwrap().push(call.clone());

        if self.fail_on == Some(call.name()) {
            return Err(ToolError::Failed {
                tool: call.name().to_string(),
                code: Some(1),
            });
        }

        match call {
            ToolCall::ListImages { output_dir, .. } => {
                self.sink.touch(&output_dir.join("sfm_data.json"))
            }
            ToolCall::ComputeFeatures { output_dir, .. } => {
                self.sink.touch(&output_dir.join("image_describer.json"))
            }
            ToolCall::ComputeMatches { output_dir, .. } => {
                self.sink.touch(&output_dir.join("matches.putative.bin"))
            }
            ToolCall::ReconstructSfm { output_dir, .. } => {
                self.sink.touch(&output_dir.join("sfm_data.bin"))
            }
            ToolCall::ColorizeStructure { output, .. }
            | ToolCall::StructureFromKnownPoses { output, .. } => self.sink.touch(output),
            ToolCall::ExportToMvs {
                output,
                undistorted_dir,
                ..
            } => {
                self.sink.touch(output);
                self.sink.touch(&undistorted_dir.join("00000.png"));
                self.sink.touch(&undistorted_dir.join("00001.png"));
            }
            ToolCall::Mvs(mvs) => {
                self.sink.touch(&mvs.output);
                if mvs.operation == MvsOperation::TextureMesh {
                    for name in [
                        "scene_texture.obj",
                        "scene_texture.mtl",
                        "scene_texture_material_0_map_Kd.jpg",
                        "scene_texture.log",
                    ] {
                        self.sink.touch(&mvs.working_dir.join(name));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Memory filesystem with the images directory already present
pub fn memory_fs() -> MemoryFilesystem {
    let fs = MemoryFilesystem::new();
    ensure_dir(&fs, Path::new(ROOT)).unwrap();
    fs.touch(Path::new(ROOT).join("IMG_0001.JPG")).unwrap();
    fs
}

pub fn layout() -> PathLayout {
    PathLayout::new(ROOT)
}

/// Files anywhere below `dir`
pub fn files_under(fs: &MemoryFilesystem, dir: &Path) -> Vec<std::path::PathBuf> {
    fs.files()
        .into_iter()
        .filter(|f| f.starts_with(dir))
        .collect()
}

pub fn is_dir(fs: &MemoryFilesystem, path: &Path) -> bool {
    fs.is_dir(path)
}
