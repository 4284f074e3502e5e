//! Demo -> BVH camera export
//!
//! Collects the player's view per playback frame, converts the track to
//! the requested frame rate and writes it as BVH motion.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use hl_demo::{DecodeOptions, Demo};

use crate::bvh::save_bvh;
use crate::resample::{CameraSample, needs_resample, resample};

/// Default output frame rate
pub const DEFAULT_FPS: f32 = 30.0;

/// Highest accepted output frame rate
pub const MAX_FPS: f32 = 1000.0;

/// Frame interval assumed when no frame carries a usable length
pub const FALLBACK_FRAME_TIME: f32 = 1.0 / 60.0;

/// Settings for one export run
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub fps: f32,
    /// Output path; defaults to `<stem>_camera.bvh` next to the input
    pub output: Option<PathBuf>,
    pub decode: DecodeOptions,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            output: None,
            decode: DecodeOptions::default(),
        }
    }
}

/// What an export produced
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub output: PathBuf,
    /// Playback frames in the demo
    pub frame_count: usize,
    /// Frames that had both a frame length and player data
    pub usable_frames: usize,
    pub source_fps: f32,
    pub target_fps: f32,
    pub written_frames: usize,
}

/// Open a demo, keeping its error code in the error chain
pub fn open_demo(path: &Path, options: DecodeOptions) -> Result<Demo> {
    Demo::open_with_options(path, options).map_err(|err| {
        let code = err.code();
        anyhow::Error::new(err).context(format!(
            "Failed to open demo {:?} (error code {} {:?})",
            path,
            code.as_u8(),
            code
        ))
    })
}

/// `<dir>/<stem>_camera.bvh` for `input`
pub fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "demo".to_string());
    input.with_file_name(format!("{}_camera.bvh", stem))
}

/// First positive frame length in the playback segment
pub fn source_frame_time(demo: &Demo) -> Option<f32> {
    (0..demo.frame_count())
        .filter_map(|frame| demo.frame_length(frame).ok())
        .find(|&length| length > 0.0)
}

/// Player pose of every frame that has a frame length and player data
pub fn collect_samples(demo: &Demo) -> Vec<CameraSample> {
    (0..demo.frame_count())
        .filter_map(|frame| {
            demo.frame_length(frame).ok()?;
            let player = demo.player_data(frame).ok()?;
            Some(CameraSample {
                position: player.position,
                rotation: player.orientation,
            })
        })
        .collect()
}

/// Export the camera track of `input` as BVH
pub fn export_bvh(input: &Path, options: &ExportOptions) -> Result<ExportReport> {
    if !(options.fps.is_finite() && options.fps > 0.0 && options.fps <= MAX_FPS) {
        bail!(
            "Target frame rate must be in (0, {}], got {}",
            MAX_FPS,
            options.fps
        );
    }
    let is_dem = input
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("dem"));
    if !is_dem {
        tracing::warn!("{:?} does not have a .dem extension", input);
    }

    let demo = open_demo(input, options.decode)?;
    let frame_count = demo.frame_count();
    tracing::info!("{} playback frames on {}", frame_count, demo.map_name());
    if frame_count == 0 {
        bail!("No frames found in {:?}", input);
    }

    let frame_time = source_frame_time(&demo).unwrap_or_else(|| {
        tracing::warn!(
            "No frame length found, assuming {:.6} s per frame",
            FALLBACK_FRAME_TIME
        );
        FALLBACK_FRAME_TIME
    });
    let source_fps = 1.0 / frame_time;

    let samples = collect_samples(&demo);
    if samples.is_empty() {
        bail!("No frame in {:?} carries player data", input);
    }

    let track = if needs_resample(source_fps, options.fps) {
        tracing::info!("Resampling {:.3} fps -> {:.3} fps", source_fps, options.fps);
        resample(&samples, source_fps, options.fps)
    } else {
        samples.clone()
    };

    let output = options
        .output
        .clone()
        .unwrap_or_else(|| default_output(input));
    save_bvh(&output, &track, 1.0 / options.fps)
        .with_context(|| format!("Failed to export camera track of {:?}", input))?;

    Ok(ExportReport {
        output,
        frame_count,
        usable_frames: samples.len(),
        source_fps,
        target_fps: options.fps,
        written_frames: track.len(),
    })
}
