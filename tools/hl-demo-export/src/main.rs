//! hl-demo-export - GoldSrc demo camera exporter
//!
//! Converts the player's view in a demo (.dem) into BVH camera motion.

use anyhow::Result;
use clap::{Parser, Subcommand};
use hl_demo::DecodeOptions;
use std::path::PathBuf;

use hl_demo_export::export::DEFAULT_FPS;
use hl_demo_export::{DemoSummary, ExportOptions, export_bvh, open_demo};

#[derive(Parser)]
#[command(name = "hl-demo-export")]
#[command(about = "GoldSrc demo camera exporter")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export the camera track as BVH motion
    Bvh {
        /// Input demo file (.dem)
        input: PathBuf,

        /// Target frame rate
        #[arg(long, default_value_t = DEFAULT_FPS)]
        fps: f32,

        /// Output .bvh file (default: <stem>_camera.bvh)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Reject segments without an end-of-segment record
        #[arg(long)]
        strict: bool,
    },

    /// Print header and directory information
    Info {
        /// Input demo file (.dem)
        input: PathBuf,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn decode_options(strict: bool) -> DecodeOptions {
    if strict {
        DecodeOptions::strict()
    } else {
        DecodeOptions::default()
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Bvh {
            input,
            fps,
            output,
            strict,
        } => {
            let options = ExportOptions {
                fps,
                output,
                decode: decode_options(strict),
            };
            tracing::info!("Exporting camera track of {:?}", input);
            let report = export_bvh(&input, &options)?;
            tracing::info!(
                "{} of {} frames usable, source {:.3} fps",
                report.usable_frames,
                report.frame_count,
                report.source_fps
            );
            tracing::info!(
                "Wrote {} frames at {} fps to {:?}",
                report.written_frames,
                report.target_fps,
                report.output
            );
        }

        Commands::Info { input, json } => {
            let demo = open_demo(&input, DecodeOptions::default())?;
            let summary = DemoSummary::from_demo(&demo);
            if json {
                println!("{}", summary.to_json()?);
            } else {
                println!("{}", summary);
            }
        }
    }

    Ok(())
}
