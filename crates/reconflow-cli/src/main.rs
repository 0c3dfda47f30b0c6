//! reconflow CLI - Photogrammetry pipeline runner
//!
//! Runs one task of the image-to-textured-mesh pipeline over a folder of
//! photos, delegating the vision work to openMVG / OpenMVS executables.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod commands;

/// reconflow - multi-stage 3D reconstruction runner
#[derive(Parser)]
#[command(name = "reconflow")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one pipeline task
    Run {
        /// Directory containing the input images
        images_dir: PathBuf,

        /// Camera intrinsics "f;0;ppx;0;f;ppy;0;0;1"
        #[arg(short = 'k', long)]
        calibration: String,

        /// Feature describer (SIFT, SIFT_ANATOMY, AKAZE_FLOAT, AKAZE_MLDB)
        #[arg(short, long, default_value = "SIFT")]
        describer: String,

        /// Extension of the exported mesh
        #[arg(short, long, default_value = "obj")]
        export_format: String,

        /// Task number (0 = features + SfM, 1 = densify, 2 = mesh, 3 = refine, 4 = texture)
        #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
        task: i64,

        /// Tool configuration file (JSON)
        #[arg(long)]
        tools: Option<PathBuf>,

        /// Skip structure refinement from known poses
        #[arg(long)]
        no_pose_refinement: bool,
    },

    /// Print the output layout for an images directory
    Layout {
        /// Directory containing the input images
        images_dir: PathBuf,
    },

    /// List the available tasks
    Tasks,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_ansi(!cli.no_color)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install logger: {}", e);
        return ExitCode::FAILURE;
    }

    match cli.command {
        Commands::Run {
            images_dir,
            calibration,
            describer,
            export_format,
            task,
            tools,
            no_pose_refinement,
        } => commands::run::run(commands::run::RunArgs {
            images_dir,
            calibration,
            describer,
            export_format,
            task,
            tools,
            pose_refinement: !no_pose_refinement,
        }),

        Commands::Layout { images_dir } => {
            commands::layout::run(&images_dir);
            ExitCode::SUCCESS
        }

        Commands::Tasks => {
            commands::tasks::run();
            ExitCode::SUCCESS
        }
    }
}
