mod common;

use common::{ROOT, ScriptedToolchain, Sink, files_under, is_dir, layout, memory_fs};
use reconflow_core::{Filesystem, MemoryFilesystem, PipelineConfig, TaskError};
use reconflow_pipeline::{
    DispatchError, FaultKind, MvsOperation, ReconstructionPipeline, RunStatus, StageError,
    ToolCall,
};
use std::path::{Path, PathBuf};
use std::time::Instant;

const FRONT_END_CALLS: [&str; 7] = [
    "list_images",
    "compute_features",
    "compute_matches",
    "reconstruct_sfm",
    "colorize_structure",
    "structure_from_known_poses",
    "export_to_mvs",
];

fn pipeline_with(
    fs: &MemoryFilesystem,
    tools: &ScriptedToolchain,
    config: PipelineConfig,
) -> ReconstructionPipeline {
    ReconstructionPipeline::new(config, fs.clone(), tools.clone()).unwrap()
}

fn pipeline(fs: &MemoryFilesystem, tools: &ScriptedToolchain) -> ReconstructionPipeline {
    pipeline_with(fs, tools, PipelineConfig::new(ROOT, "2905;0;1416;0;2905;1064;0;0;1"))
}

#[test]
fn test_densify_without_mvs_scene() {
    let fs = memory_fs();
    let tools = ScriptedToolchain::new(Sink::Memory(fs.clone()));
    let pipeline = pipeline(&fs, &tools);

    let err = pipeline.dispatch(1).unwrap_err();
    assert_eq!(err.kind(), FaultKind::Precondition);
    assert!(matches!(
        err,
        DispatchError::Failed {
            source: StageError::Precondition { .. },
            ..
        }
    ));

    assert_eq!(pipeline.execute(1), RunStatus::Failure);
    let densify = layout().densify_dir();
    assert!(is_dir(&fs, &densify));
    assert!(files_under(&fs, &densify).is_empty());
    assert!(tools.calls().is_empty());
}

#[test]
fn test_front_end_success() {
    let fs = memory_fs();
    let tools = ScriptedToolchain::new(Sink::Memory(fs.clone()));
    let pipeline = pipeline(&fs, &tools);

    let report = pipeline.dispatch(0).unwrap();

    assert_eq!(report.steps.len(), 7);
    assert_eq!(tools.call_names(), FRONT_END_CALLS);
    assert!(fs.exists(&layout().sfm_data_path()));
    assert!(fs.exists(&layout().densify_input_path()));
    assert!(fs.is_dir(&layout().undistorted_images_dir()));
}

#[test]
fn test_front_end_exit_status() {
    let fs = memory_fs();
    let tools = ScriptedToolchain::new(Sink::Memory(fs.clone()));

    assert_eq!(pipeline(&fs, &tools).execute(0), RunStatus::Success);
}

#[test]
fn test_invalid_selector_runs_nothing() {
    let fs = memory_fs();
    let tools = ScriptedToolchain::new(Sink::Memory(fs.clone()));
    let pipeline = pipeline(&fs, &tools);
    let dirs_before = fs.dirs();

    let err = pipeline.dispatch(7).unwrap_err();
    assert!(matches!(
        err,
        DispatchError::InvalidTask(TaskError::Unrecognized(7))
    ));
    assert_eq!(err.kind(), FaultKind::Validation);
    assert_eq!(pipeline.execute(7), RunStatus::Failure);

    assert_eq!(fs.dirs(), dirs_before);
    let output_children: Vec<PathBuf> = fs
        .dirs()
        .into_iter()
        .filter(|d| d.starts_with(layout().output_root()) && d != layout().output_root())
        .collect();
    assert!(output_children.is_empty());
    assert!(tools.calls().is_empty());
}

#[test]
fn test_every_unknown_selector_is_rejected() {
    let fs = memory_fs();
    let tools = ScriptedToolchain::new(Sink::Memory(fs.clone()));
    let pipeline = pipeline(&fs, &tools);

    for selector in [-1, 5, 6, 42, i64::MIN, i64::MAX] {
        assert!(matches!(
            pipeline.dispatch(selector),
            Err(DispatchError::InvalidTask(_))
        ));
    }
    assert!(tools.calls().is_empty());
}

#[test]
fn test_each_selector_runs_one_action() {
    let expected: [(i64, &[&str]); 5] = [
        (0, &FRONT_END_CALLS),
        (1, &["densify"]),
        (2, &["reconstruct_mesh"]),
        (3, &["refine_mesh"]),
        (4, &["texture_mesh"]),
    ];

    // Run the whole pipeline once so every upstream artifact exists
    let fs = memory_fs();
    let warmup = ScriptedToolchain::new(Sink::Memory(fs.clone()));
    let warm = pipeline(&fs, &warmup);
    for selector in 0..=4 {
        warm.dispatch(selector).unwrap();
    }

    for (selector, calls) in expected {
        let tools = ScriptedToolchain::new(Sink::Memory(fs.clone()));
        let pipeline = pipeline(&fs, &tools);

        let report = pipeline.dispatch(selector).unwrap();

        assert_eq!(report.task.number(), selector);
        assert_eq!(tools.call_names(), calls, "selector {}", selector);
    }
}

#[test]
fn test_feature_failure_stops_chain() {
    let fs = memory_fs();
    let tools =
        ScriptedToolchain::new(Sink::Memory(fs.clone())).failing_on("compute_matches");
    let pipeline = pipeline(&fs, &tools);

    let err = pipeline.dispatch(0).unwrap_err();

    match &err {
        DispatchError::Failed { step, source, .. } => {
            assert_eq!(*step, "match_features");
            assert_eq!(source.kind(), FaultKind::Delegated);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(
        tools.call_names(),
        vec!["list_images", "compute_features", "compute_matches"]
    );
    assert!(!fs.exists(&layout().sfm_dir()));
}

#[test]
fn test_failure_crosses_stage_boundary() {
    let fs = memory_fs();
    let tools =
        ScriptedToolchain::new(Sink::Memory(fs.clone())).failing_on("reconstruct_sfm");
    let pipeline = pipeline(&fs, &tools);

    assert_eq!(pipeline.execute(0), RunStatus::Failure);
    assert_eq!(tools.call_names(), FRONT_END_CALLS[..4].to_vec());
    // Partial outputs stay for diagnosis
    assert!(fs.is_dir(&layout().sfm_dir()));
    assert!(fs.exists(&layout().image_listing_path()));
    assert!(!fs.exists(&layout().mvs_dir()));
}

#[test]
fn test_pose_refinement_can_be_disabled() {
    let fs = memory_fs();
    let tools = ScriptedToolchain::new(Sink::Memory(fs.clone()));
    let config = PipelineConfig::new(ROOT, "k").with_pose_refinement(false);
    let pipeline = pipeline_with(&fs, &tools, config);

    let report = pipeline.dispatch(0).unwrap();

    assert_eq!(report.steps.len(), 6);
    assert_eq!(report.skipped, vec!["refine_with_known_poses"]);
    assert!(!tools.call_names().contains(&"structure_from_known_poses"));
    assert!(fs.exists(&layout().densify_input_path()));
}

fn exported_structure(tools: &ScriptedToolchain) -> PathBuf {
    tools
        .calls()
        .into_iter()
        .find_map(|call| match call {
            ToolCall::ExportToMvs { sfm_data, .. } => Some(sfm_data),
            _ => None,
        })
        .expect("no export call")
}

#[test]
fn test_export_uses_refined_structure() {
    let fs = memory_fs();
    let tools = ScriptedToolchain::new(Sink::Memory(fs.clone()));
    let report = pipeline(&fs, &tools).dispatch(0).unwrap();

    assert!(report.skipped.is_empty());
    assert_eq!(exported_structure(&tools), layout().refined_sfm_data_path());
}

#[test]
fn test_export_uses_raw_structure_without_refinement() {
    let fs = memory_fs();
    let tools = ScriptedToolchain::new(Sink::Memory(fs.clone()));
    let config = PipelineConfig::new(ROOT, "k").with_pose_refinement(false);
    pipeline_with(&fs, &tools, config).dispatch(0).unwrap();

    assert_eq!(exported_structure(&tools), layout().sfm_data_path());
}

#[test]
fn test_failure_reports_elapsed_time() {
    let fs = memory_fs();
    let tools =
        ScriptedToolchain::new(Sink::Memory(fs.clone())).failing_on("colorize_structure");
    let pipeline = pipeline(&fs, &tools);

    let start = Instant::now();
    let err = pipeline.dispatch(0).unwrap_err();
    let outer = start.elapsed();

    let DispatchError::Failed { step, elapsed, .. } = &err else {
        panic!("unexpected error: {:?}", err);
    };
    assert_eq!(*step, "process_point_cloud");
    assert!(*elapsed <= outer);
    let message = err.to_string();
    assert!(
        message.contains(&format!("after {:.2}s", elapsed.as_secs_f64())),
        "{}",
        message
    );
}

#[test]
fn test_filesystem_fault_surfaces() {
    let fs = memory_fs();
    fs.set_read_only(layout().sfm_dir());
    let tools = ScriptedToolchain::new(Sink::Memory(fs.clone()));
    let pipeline = pipeline(&fs, &tools);

    let err = pipeline.dispatch(0).unwrap_err();

    assert_eq!(err.kind(), FaultKind::Filesystem);
    assert!(!tools.call_names().contains(&"reconstruct_sfm"));
}

#[test]
fn test_full_run_gathers_export() {
    let fs = memory_fs();
    let tools = ScriptedToolchain::new(Sink::Memory(fs.clone()));
    let pipeline = pipeline(&fs, &tools);

    for selector in 0..=3 {
        assert_eq!(pipeline.execute(selector), RunStatus::Success);
    }
    let report = pipeline.dispatch(4).unwrap();

    let export = layout().final_export_dir();
    let mut names: Vec<String> = report
        .exported
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "scene_texture.mtl",
            "scene_texture.obj",
            "scene_texture_material_0_map_Kd.jpg",
        ]
    );
    assert!(!fs.exists(&export.join("scene_texture.log")));
    assert!(!fs.exists(&export.join("scene_texture.mvs")));

    let densify_images = layout().densify_images_dir();
    assert!(fs.exists(&densify_images.join("00000.png")));
    assert!(fs.exists(&densify_images.join("00001.png")));
}

#[test]
fn test_densify_rerun_after_partial_failure() {
    let fs = memory_fs();
    fs.touch(layout().densify_input_path()).unwrap();
    let tools = ScriptedToolchain::new(Sink::Memory(fs.clone()));
    let pipeline = pipeline(&fs, &tools);

    // No undistorted images yet
    let err = pipeline.dispatch(1).unwrap_err();
    assert_eq!(err.kind(), FaultKind::Validation);

    fs.touch(layout().undistorted_images_dir().join("00000.png"))
        .unwrap();
    let report = pipeline.dispatch(1).unwrap();

    assert_eq!(report.steps[0].0, "densify");
    assert!(fs.exists(&layout().densify_output_path()));
}

#[test]
fn test_mvs_calls_use_layout_paths() {
    let fs = memory_fs();
    let tools = ScriptedToolchain::new(Sink::Memory(fs.clone()));
    let pipeline = pipeline(&fs, &tools);
    pipeline.dispatch(0).unwrap();
    pipeline.dispatch(1).unwrap();

    let calls = tools.calls();
    let Some(ToolCall::Mvs(densify)) = calls.last() else {
        panic!("last call was not an MVS call");
    };
    assert_eq!(densify.operation, MvsOperation::Densify);
    assert_eq!(
        densify.input,
        Path::new(ROOT).join("Output/MVS_Output/sfm_scene.mvs")
    );
    assert_eq!(
        densify.output,
        Path::new(ROOT).join("Output/MVS_Output/Densify/scene_dense.mvs")
    );
    assert_eq!(
        densify.working_dir,
        Path::new(ROOT).join("Output/MVS_Output/Densify")
    );
}
