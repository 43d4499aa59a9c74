//! Video assembly binary.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mythoreel_media::{check_ffmpeg, check_ffprobe, MotionEffect, MotionSetting};
use mythoreel_models::BuildManifest;
use mythoreel_pipeline::{AssemblyOptions, PipelineConfig, VideoAssemblyPipeline};

#[derive(Parser)]
#[command(name = "mythoreel", about = "Assemble short mythology videos from build manifests")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Assemble a build directory into a final video
    Assemble {
        /// Build directory containing manifest.json and raw/ assets
        build_dir: PathBuf,

        /// Burn subtitles into the video (requires a cached forced alignment)
        #[arg(long)]
        subtitles: bool,

        /// Motion effect for still images: "static", "random", or an effect name
        #[arg(long, default_value = "static")]
        motion: String,

        /// Final video path (defaults to <build_dir>/final.mp4)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print a summary of a build's manifest
    Inspect {
        /// Build directory containing manifest.json
        build_dir: PathBuf,
    },
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mythoreel=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

fn parse_motion(value: &str) -> Result<MotionSetting, String> {
    match value {
        "static" | "none" => Ok(MotionSetting::Static),
        "random" => Ok(MotionSetting::Random),
        other => {
            let effect: MotionEffect = serde_json::from_value(serde_json::json!(other))
                .map_err(|_| format!("unknown motion effect '{other}'"))?;
            Ok(MotionSetting::Fixed(effect))
        }
    }
}

async fn run_assemble(
    build_dir: PathBuf,
    subtitles: bool,
    motion: String,
    output: Option<PathBuf>,
) -> Result<(), String> {
    check_ffmpeg().map_err(|e| e.to_string())?;
    check_ffprobe().map_err(|e| e.to_string())?;

    let motion = parse_motion(&motion)?;

    let config = PipelineConfig::from_env();
    let pipeline = VideoAssemblyPipeline::new(config);
    let options = AssemblyOptions {
        subtitles,
        motion,
        output,
    };

    let final_path = pipeline
        .assemble(&build_dir, &options)
        .await
        .map_err(|e| e.to_string())?;
    info!(output = %final_path.display(), "Assembly complete");
    Ok(())
}

fn run_inspect(build_dir: PathBuf) -> Result<(), String> {
    let manifest = BuildManifest::load(&build_dir).map_err(|e| e.to_string())?;
    println!("Title:       {}", manifest.story.title);
    println!("Description: {}", manifest.story.description);
    println!("Chapters:    {}", manifest.story.outline.len());
    println!("Scripts:     {}", manifest.scripts.scripts.len());
    println!("Images:      {}", manifest.image_paths.len());
    println!("Audio clips: {}", manifest.audio_paths.len());
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Assemble {
            build_dir,
            subtitles,
            motion,
            output,
        } => run_assemble(build_dir, subtitles, motion, output).await,
        Command::Inspect { build_dir } => run_inspect(build_dir),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
