//! Frame-rate conversion for camera tracks
//!
//! Positions are interpolated linearly. Angles are first unwrapped so that
//! a turn across the ±180° seam interpolates the short way round, then
//! folded back into `[0, 360)`.

use glam::Vec3;

/// Two rates closer than this are treated as equal
pub const RATE_EPSILON: f32 = 0.001;

/// One camera pose of the exported track
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraSample {
    pub position: Vec3,
    /// Pitch, yaw, roll in degrees
    pub rotation: Vec3,
}

/// Whether converting between the two rates needs resampling at all
pub fn needs_resample(source_fps: f32, target_fps: f32) -> bool {
    (source_fps - target_fps).abs() > RATE_EPSILON
}

/// Remove 360° jumps between consecutive angles.
///
/// Every time the step between neighbours exceeds 180° in magnitude, the
/// rest of the sequence is shifted by a full turn against it.
pub fn unwrap_angles(angles: &[f32]) -> Vec<f32> {
    let mut out = Vec::with_capacity(angles.len());
    let mut offset = 0.0f32;
    for (i, &angle) in angles.iter().enumerate() {
        if i > 0 {
            let diff = angle - angles[i - 1];
            if diff > 180.0 {
                offset -= 360.0;
            } else if diff < -180.0 {
                offset += 360.0;
            }
        }
        out.push(angle + offset);
    }
    out
}

/// Fold an angle into `[0, 360)`
pub fn normalize_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Sample the piecewise-linear curve `(times, values)` at `at`.
///
/// `times` must be ascending and non-empty; past the last knot the last
/// value is held.
fn interpolate(times: &[f32], values: &[f32], at: &[f32]) -> Vec<f32> {
    let last = times.len() - 1;
    let mut j = 0;
    at.iter()
        .map(|&t| {
            while j < last && times[j + 1] < t {
                j += 1;
            }
            if j >= last {
                values[last]
            } else {
                let span = times[j + 1] - times[j];
                let f = (t - times[j]) / span;
                values[j] + f * (values[j + 1] - values[j])
            }
        })
        .collect()
}

/// Resample a track recorded at `source_fps` to `target_fps`.
///
/// Output samples sit at `k / target_fps` for every such time before the
/// end of the source track (`len / source_fps`). Returns the input
/// unchanged when the rates match or the track is empty.
pub fn resample(samples: &[CameraSample], source_fps: f32, target_fps: f32) -> Vec<CameraSample> {
    if samples.is_empty() || !needs_resample(source_fps, target_fps) {
        return samples.to_vec();
    }

    let times: Vec<f32> = (0..samples.len())
        .map(|i| i as f32 / source_fps)
        .collect();
    let total = samples.len() as f32 / source_fps;
    // one spare slot absorbs rounding in the product
    let count = (total * target_fps).ceil() as usize + 1;
    let targets: Vec<f32> = (0..count)
        .map(|k| k as f32 / target_fps)
        .take_while(|&t| t < total)
        .collect();

    let mut out = vec![CameraSample::default(); targets.len()];
    for axis in 0..3 {
        let positions: Vec<f32> = samples.iter().map(|s| s.position[axis]).collect();
        for (sample, value) in out.iter_mut().zip(interpolate(&times, &positions, &targets)) {
            sample.position[axis] = value;
        }

        let angles: Vec<f32> = samples.iter().map(|s| s.rotation[axis]).collect();
        let unwrapped = unwrap_angles(&angles);
        for (sample, value) in out.iter_mut().zip(interpolate(&times, &unwrapped, &targets)) {
            sample.rotation[axis] = normalize_angle(value);
        }
    }

    tracing::debug!(
        "resampled {} frames at {:.3} fps into {} frames at {:.3} fps",
        samples.len(),
        source_fps,
        out.len(),
        target_fps
    );
    out
}
