//! Task dispatch
//!
//! Maps a task selector to exactly one action, times it, and turns every
//! fault into a logged failure status. Nothing raised by a stage gets past
//! [`TaskDispatcher::run`].

use crate::feature::FeatureStage;
use crate::mvs::MvsStage;
use crate::sfm::SfmStage;
use crate::stage::{FaultKind, StageContext, StageError, StepChain};
use reconflow_core::{TaskError, TaskSelector};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{Level, error, info, span};

/// Dispatch errors
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    InvalidTask(#[from] TaskError),

    #[error("Task {task} failed at '{step}' after {:.2}s: {source}", elapsed.as_secs_f64())]
    Failed {
        task: TaskSelector,
        step: &'static str,
        elapsed: Duration,
        #[source]
        source: StageError,
    },
}

impl DispatchError {
    pub fn kind(&self) -> FaultKind {
        match self {
            DispatchError::InvalidTask(_) => FaultKind::Validation,
            DispatchError::Failed { source, .. } => source.kind(),
        }
    }
}

/// Outcome of a successful dispatch
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub task: TaskSelector,
    pub elapsed: Duration,
    /// Steps that ran, with their durations
    pub steps: Vec<(&'static str, Duration)>,
    /// Steps disabled by configuration (front end only)
    pub skipped: Vec<&'static str>,
    /// Files gathered into the final export (texture task only)
    pub exported: Vec<PathBuf>,
}

struct Completed {
    steps: Vec<(&'static str, Duration)>,
    skipped: Vec<&'static str>,
    exported: Vec<PathBuf>,
}

/// Process-level result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    Failure,
}

impl RunStatus {
    pub fn code(self) -> u8 {
        match self {
            RunStatus::Success => 0,
            RunStatus::Failure => 1,
        }
    }
}

impl From<RunStatus> for ExitCode {
    fn from(status: RunStatus) -> Self {
        ExitCode::from(status.code())
    }
}

/// Runs one selected task against a borrowed stage context
pub struct TaskDispatcher<'a> {
    ctx: StageContext<'a>,
}

impl<'a> TaskDispatcher<'a> {
    pub fn new(ctx: StageContext<'a>) -> Self {
        Self { ctx }
    }

    /// Feature extraction followed by SfM, fail-fast across both
    pub fn front_end_chain() -> StepChain {
        FeatureStage::chain().then(SfmStage::chain())
    }

    /// Run the task for `selector`. Unknown selectors run nothing.
    pub fn dispatch(&self, selector: i64) -> Result<DispatchReport, DispatchError> {
        let task = TaskSelector::try_from(selector)?;

        let span = span!(Level::INFO, "task", task = task.name());
        let _enter = span.enter();
        info!("Starting task {}: {}", task, task.description());

        let start = Instant::now();
        let outcome = self.run_task(task);
        let elapsed = start.elapsed();

        match outcome {
            Ok(completed) => Ok(DispatchReport {
                task,
                elapsed,
                steps: completed.steps,
                skipped: completed.skipped,
                exported: completed.exported,
            }),
            Err((step, source)) => Err(DispatchError::Failed {
                task,
                step,
                elapsed,
                source,
            }),
        }
    }

    /// Dispatch and convert the outcome into a status, logging one line
    pub fn run(&self, selector: i64) -> RunStatus {
        match self.dispatch(selector) {
            Ok(report) => {
                info!(
                    task = report.task.name(),
                    "Total time: {:.2}s",
                    report.elapsed.as_secs_f64()
                );
                RunStatus::Success
            }
            Err(e) => {
                error!(kind = ?e.kind(), "Execution failed: {}", e);
                RunStatus::Failure
            }
        }
    }

    fn run_task(&self, task: TaskSelector) -> Result<Completed, (&'static str, StageError)> {
        let ctx = &self.ctx;
        let start = Instant::now();
        let single = |result: Result<Vec<PathBuf>, StageError>| {
            result
                .map(|exported| Completed {
                    steps: vec![(task.name(), start.elapsed())],
                    skipped: Vec::new(),
                    exported,
                })
                .map_err(|e| (task.name(), e))
        };

        match task {
            TaskSelector::FrontEnd => Self::front_end_chain()
                .run(ctx)
                .map(|report| Completed {
                    steps: report.steps,
                    skipped: report.skipped,
                    exported: Vec::new(),
                })
                .map_err(|failure| (failure.step, failure.source)),
            TaskSelector::Densify => single(MvsStage::densify(ctx).map(|()| Vec::new())),
            TaskSelector::ReconstructMesh => {
                single(MvsStage::reconstruct_mesh(ctx).map(|()| Vec::new()))
            }
            TaskSelector::RefineMesh => single(MvsStage::refine_mesh(ctx).map(|()| Vec::new())),
            TaskSelector::TextureMesh => single(MvsStage::texture_mesh(ctx)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_front_end_order() {
        assert_eq!(
            TaskDispatcher::front_end_chain().step_names(),
            vec![
                "load_images",
                "extract_features",
                "match_features",
                "reconstruct_structure",
                "process_point_cloud",
                "refine_with_known_poses",
                "export_to_mvs",
            ]
        );
    }

    #[test]
    fn test_run_status_codes() {
        assert_eq!(RunStatus::Success.code(), 0);
        assert_eq!(RunStatus::Failure.code(), 1);
    }

    #[test]
    fn test_invalid_task_kind() {
        let err = DispatchError::from(TaskError::Unrecognized(7));
        assert_eq!(err.kind(), FaultKind::Validation);
        assert!(err.to_string().contains('7'));
    }
}
