//! Pipeline step abstraction
//!
//! A [`Step`] is one delegated operation plus the filesystem preparation
//! around it. Steps are composed into a [`StepChain`] that runs them in
//! order and stops at the first failure.

use crate::toolchain::{ToolCall, ToolError, Toolchain};
use reconflow_core::{Filesystem, FsError, PathLayout, PipelineConfig, ensure_dir};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

/// Fault categories reported to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Bad input: unknown task, missing source directory
    Validation,
    /// A required upstream artifact is absent
    Precondition,
    /// Directory or file creation/copy failed
    Filesystem,
    /// The external tool reported failure
    Delegated,
}

/// Step processing error
#[derive(Debug, Error)]
pub enum StageError {
    #[error("Missing {what}: {} not found", path.display())]
    Precondition { what: &'static str, path: PathBuf },

    #[error(transparent)]
    Filesystem(#[from] FsError),

    #[error(transparent)]
    Tool(#[from] ToolError),
}

impl StageError {
    pub fn kind(&self) -> FaultKind {
        match self {
            StageError::Precondition { .. } => FaultKind::Precondition,
            StageError::Filesystem(FsError::MissingSource(_)) => FaultKind::Validation,
            StageError::Filesystem(_) => FaultKind::Filesystem,
            StageError::Tool(_) => FaultKind::Delegated,
        }
    }
}

/// Everything a step may read. Borrowed from the pipeline controller.
#[derive(Clone, Copy)]
pub struct StageContext<'a> {
    pub layout: &'a PathLayout,
    pub config: &'a PipelineConfig,
    pub fs: &'a dyn Filesystem,
    pub tools: &'a dyn Toolchain,
}

impl<'a> StageContext<'a> {
    pub fn new(
        layout: &'a PathLayout,
        config: &'a PipelineConfig,
        fs: &'a dyn Filesystem,
        tools: &'a dyn Toolchain,
    ) -> Self {
        Self {
            layout,
            config,
            fs,
            tools,
        }
    }

    /// Create a working directory if it does not exist yet
    pub fn ensure_dir(&self, path: &Path) -> Result<(), StageError> {
        Ok(ensure_dir(self.fs, path)?)
    }

    /// Fail with a precondition fault unless `path` exists
    pub fn require(&self, what: &'static str, path: &Path) -> Result<(), StageError> {
        if self.fs.exists(path) {
            Ok(())
        } else {
            Err(StageError::Precondition {
                what,
                path: path.to_path_buf(),
            })
        }
    }

    /// Hand an operation to the toolchain
    pub fn invoke(&self, call: ToolCall) -> Result<(), StageError> {
        debug!(operation = call.name(), "Invoking tool");
        Ok(self.tools.run(&call)?)
    }
}

/// A single step in a stage chain
pub trait Step {
    fn name(&self) -> &'static str;

    fn run(&self, ctx: &StageContext<'_>) -> Result<(), StageError>;

    /// Whether this step is disabled by configuration
    fn can_skip(&self, _ctx: &StageContext<'_>) -> bool {
        false
    }
}

/// Chain failure: which step failed and what had already completed
#[derive(Debug, Error)]
#[error("Step '{step}' failed: {source}")]
pub struct ChainFailure {
    pub step: &'static str,
    pub completed: Vec<&'static str>,
    #[source]
    pub source: StageError,
}

/// Timings of the steps a chain ran
#[derive(Debug, Clone, Default)]
pub struct ChainReport {
    pub steps: Vec<(&'static str, Duration)>,
    pub skipped: Vec<&'static str>,
}

impl ChainReport {
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|(name, _)| *name).collect()
    }
}

/// Ordered, fail-fast sequence of steps
#[derive(Default)]
pub struct StepChain {
    steps: Vec<Box<dyn Step>>,
}

impl StepChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step
    pub fn step(mut self, step: impl Step + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Append every step of another chain
    pub fn then(mut self, other: StepChain) -> Self {
        self.steps.extend(other.steps);
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run steps left to right; nothing after a failing step runs
    pub fn run(&self, ctx: &StageContext<'_>) -> Result<ChainReport, ChainFailure> {
        let mut report = ChainReport::default();

        for step in &self.steps {
            let name = step.name();

            if step.can_skip(ctx) {
                info!(step = name, "Skipping step");
                report.skipped.push(name);
                continue;
            }

            info!(step = name, "Running step");
            let start = Instant::now();

            step.run(ctx).map_err(|source| ChainFailure {
                step: name,
                completed: report.step_names(),
                source,
            })?;

            let duration = start.elapsed();
            debug!(
                step = name,
                duration_ms = duration.as_secs_f64() * 1000.0,
                "Step completed"
            );
            report.steps.push((name, duration));
        }

        Ok(report)
    }
}
