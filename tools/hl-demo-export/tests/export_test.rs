//! Integration tests for hl-demo-export
//!
//! Builds demos in memory, writes them to a temp dir, exports and checks the
//! BVH output.

use std::path::Path;

use glam::Vec3;
use hl_demo::GameData;
use hl_demo::fixtures::{DemoBuilder, SegmentBuilder};
use hl_demo_export::{ExportOptions, export_bvh};
use tempfile::tempdir;

/// Playback segment with `frames` frames at `frame_length` seconds each,
/// the player walking along +x and turning across the yaw seam
fn walking_demo(frames: u32, frame_length: f32) -> Vec<u8> {
    let mut loading = SegmentBuilder::new("LOADING");
    loading.load_data(0, 0.0).end_of_segment(0, 0.0);

    let mut playback = SegmentBuilder::new("Playback");
    for i in 0..frames {
        let time = i as f32 * frame_length;
        let game = GameData {
            frame_length,
            ..GameData::default()
        };
        let yaw = (350.0 + 5.0 * i as f32) % 360.0;
        playback
            .game_data(i, time, &game, b"")
            .client_data(i, time, Vec3::new(i as f32, 0.0, 0.0), Vec3::new(0.0, yaw, 0.0), 0);
    }
    playback.end_of_segment(frames, frames as f32 * frame_length);

    let mut demo = DemoBuilder::new();
    demo.segment(loading).segment(playback);
    demo.build()
}

fn write_demo(dir: &Path, name: &str, data: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).expect("Failed to write demo");
    path
}

/// Distance between two angles on the circle, in degrees
fn angle_distance(a: f32, b: f32) -> f32 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

fn motion_rows(text: &str) -> Vec<Vec<f32>> {
    text.lines()
        .skip_while(|l| !l.starts_with("Frame Time:"))
        .skip(1)
        .map(|l| l.split(' ').map(|v| v.parse().unwrap()).collect())
        .collect()
}

#[test]
fn test_export_at_source_rate() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_demo(dir.path(), "walk.dem", &walking_demo(4, 1.0 / 30.0));

    let report = export_bvh(&input, &ExportOptions::default()).expect("export failed");
    assert_eq!(report.output, dir.path().join("walk_camera.bvh"));
    assert_eq!(report.frame_count, 4);
    assert_eq!(report.usable_frames, 4);
    assert_eq!(report.written_frames, 4);

    let text = std::fs::read_to_string(&report.output).unwrap();
    assert!(text.contains("Frames: 4\n"));
    assert!(text.contains("Frame Time: 0.033333\n"));
    let rows = motion_rows(&text);
    assert_eq!(rows.len(), 4);
    // -y, z + 16, -x, 0, 360 - pitch, yaw
    assert_eq!(rows[2], vec![0.0, 16.0, -2.0, 0.0, 360.0, 0.0]);
}

#[test]
fn test_export_resamples_to_target_rate() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_demo(dir.path(), "walk.dem", &walking_demo(7, 1.0 / 60.0));
    let output = dir.path().join("out.bvh");

    let options = ExportOptions {
        fps: 30.0,
        output: Some(output.clone()),
        ..ExportOptions::default()
    };
    let report = export_bvh(&input, &options).expect("export failed");
    assert_eq!(report.output, output);
    assert_eq!(report.written_frames, 4);

    let rows = motion_rows(&std::fs::read_to_string(&output).unwrap());
    assert_eq!(rows.len(), 4);
    for (k, row) in rows.iter().enumerate() {
        assert!((row[2] + 2.0 * k as f32).abs() < 1e-3, "row {k}: {row:?}");
        assert!((0.0..360.0).contains(&row[5]), "row {k}: {row:?}");
    }
    // yaw 350 -> 0 -> 10 -> 20 every other source frame
    assert!(angle_distance(rows[1][5], 0.0) < 1e-3);
    assert!(angle_distance(rows[3][5], 20.0) < 1e-3);
}

#[test]
fn test_export_fails_for_garbage() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_demo(dir.path(), "bad.dem", b"not a demo at all");

    let err = export_bvh(&input, &ExportOptions::default()).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("error code 2"), "{message}");
    assert!(!dir.path().join("bad_camera.bvh").exists());
}

#[test]
fn test_export_without_player_data_fails() {
    let mut playback = SegmentBuilder::new("Playback");
    playback.unused(0, 0.0).end_of_segment(0, 0.0);
    let mut demo = DemoBuilder::new();
    demo.segment(playback);

    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_demo(dir.path(), "empty.dem", &demo.build());
    let err = export_bvh(&input, &ExportOptions::default()).unwrap_err();
    assert!(err.to_string().contains("player data"));
}
