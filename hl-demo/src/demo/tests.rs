use glam::Vec3;
use tempfile::TempDir;

use super::*;
use crate::error::ErrorCode;
use crate::fixtures::{DemoBuilder, SegmentBuilder};
use crate::{DIRECTORY_ENTRY_SIZE, HEADER_SIZE};

fn game(frame_length: f32, camera: Vec3) -> GameData {
    let mut game = GameData::default();
    game.frame_length = frame_length;
    game.camera.position = camera;
    game.camera.orientation = Vec3::new(0.0, 90.0, 0.0);
    game.player_velocity = Vec3::new(250.0, 0.0, 0.0);
    game.sky_name = "cx".to_string();
    game.screen = ScreenResolution {
        width: 1920,
        height: 1080,
        depth: 32,
    };
    game
}

/// LOADING segment followed by a three-frame playback segment
fn sample() -> DemoBuilder {
    let mut loading = SegmentBuilder::new("LOADING");
    loading.load_data(0, 0.0).end_of_segment(0, 0.0);

    let mut playback = SegmentBuilder::new("Playback");
    playback
        .game_data(0, 0.0, &game(0.01, Vec3::ZERO), b"msg0")
        .client_data(0, 0.0, Vec3::new(1.0, 2.0, 3.0), Vec3::new(5.0, 6.0, 0.0), 0x01)
        .client_command(0, 0.0, "+jump")
        .client_command(0, 0.0, "-jump")
        .client_command(0, 0.0, "+duck")
        .game_data(1, 0.01, &game(0.01, Vec3::X), b"")
        .client_data(1, 0.01, Vec3::new(2.0, 2.0, 3.0), Vec3::ZERO, 0)
        .demo_buffer(1, 0.01, &[7, 7])
        .demo_buffer(1, 0.01, &[8])
        .unused(2, 0.02)
        .end_of_segment(2, 0.02);

    let mut demo = DemoBuilder::new();
    demo.segment(loading).segment(playback);
    demo
}

fn open_sample() -> Demo {
    Demo::from_bytes(sample().build()).unwrap()
}

#[test]
fn test_minimal_single_entry_round_trip() {
    let mut records = SegmentBuilder::new("Playback");
    records
        .game_data(0, 0.0, &game(0.02, Vec3::new(4.0, 5.0, 6.0)), b"")
        .end_of_segment(0, 0.0);
    let mut builder = DemoBuilder::new();
    builder.segment(records);

    let demo = Demo::from_bytes(builder.build()).unwrap();
    assert_eq!(demo.demo_protocol(), 5);
    assert_eq!(demo.network_protocol(), 48);
    assert_eq!(demo.map_name(), "maps/kz_longjumps2.bsp");
    assert_eq!(demo.game_dll(), "cstrike");
    assert_eq!(demo.directory().len(), 1);
    assert_eq!(demo.frame_count(), 1);
    assert_eq!(demo.camera_position(0).unwrap(), Vec3::new(4.0, 5.0, 6.0));
    assert_eq!(demo.frame_length(0).unwrap(), 0.02);
    assert_eq!(demo.playback_entry().unwrap().title, "Playback");
}

#[test]
fn test_header_and_directory() {
    let demo = open_sample();
    assert_eq!(demo.map_crc(), 0x1234_5678);
    assert_eq!(demo.header().directory_offset as usize, HEADER_SIZE);
    assert_eq!(demo.segments().len(), 2);
    assert_eq!(demo.directory()[0].title, "LOADING");
    assert_eq!(demo.playback().unwrap().entry_index(), 1);
    assert_eq!(demo.frame_count(), 3);
    assert_eq!(demo.last_error().code, ErrorCode::Success);
}

#[test]
fn test_wrong_magic_is_not_a_demo() {
    let mut builder = sample();
    builder.magic = *b"HLDEMX\0\0";
    let err = Demo::from_bytes(builder.build()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotADemo);
}

#[test]
fn test_old_protocol_checked_before_directory() {
    let mut builder = sample();
    builder.network_protocol = 47;
    builder.directory_offset = Some(u32::MAX);
    let err = Demo::from_bytes(builder.build()).unwrap_err();
    assert!(matches!(
        err,
        DemoError::OldProtocol {
            demo_protocol: 5,
            network_protocol: 47
        }
    ));

    let mut builder = sample();
    builder.demo_protocol = 4;
    let err = Demo::from_bytes(builder.build()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::OldProtocol);
}

#[test]
fn test_missing_and_empty_files() {
    let dir = TempDir::new().unwrap();

    let err = Demo::open(dir.path().join("missing.dem")).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NoFile);

    let empty = dir.path().join("empty.dem");
    std::fs::write(&empty, b"").unwrap();
    let err = Demo::open(&empty).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NoFile);

    let err = Demo::from_bytes(Vec::new()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NoFile);
}

#[test]
fn test_open_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sample.dem");
    std::fs::write(&path, sample().build()).unwrap();

    let demo = Demo::open(&path).unwrap();
    assert_eq!(demo.frame_count(), 3);
    assert_eq!(demo.bytes().len(), sample().build().len());
}

#[test]
fn test_truncated_file_reports_truncation_point() {
    let builder = sample();
    let mut data = builder.build();
    // cut into the middle of the first game-data record
    let cut = builder.segment_offset(1) + 100;
    data.truncate(cut);

    let err = Demo::from_bytes(data).unwrap_err();
    assert_eq!(err.code(), ErrorCode::CorruptFile);
    let info = err.info();
    assert_eq!(info.offset, Some(cut));
    assert_eq!(info.record_kind, Some(MacroKind::GameData as u8));
    assert!(matches!(err, DemoError::CorruptFile { segment: Some(1), .. }));
}

#[test]
fn test_truncation_inside_record_header_reports_record_start() {
    let builder = sample();
    let mut data = builder.build();
    let record_start = builder.segment_offset(1);
    data.truncate(record_start + 4);

    // a partial header has no kind yet; the offset is where it begins
    let err = Demo::from_bytes(data).unwrap_err();
    let info = err.info();
    assert_eq!(info.code, ErrorCode::CorruptFile);
    assert_eq!(info.offset, Some(record_start));
    assert_eq!(info.record_kind, None);
}

#[test]
fn test_directory_entry_size_in_layout() {
    let builder = sample();
    assert_eq!(
        builder.segment_offset(0),
        HEADER_SIZE + 4 + 2 * DIRECTORY_ENTRY_SIZE
    );
}

#[test]
fn test_frame_out_of_range() {
    let demo = open_sample();
    let err = demo.camera(3).unwrap_err();
    assert!(matches!(
        err,
        DemoError::NoFrame {
            frame: 3,
            frame_count: 3
        }
    ));
    assert_eq!(demo.last_error().code, ErrorCode::NoFrame);
    assert!(demo.command_count(usize::MAX).is_err());
}

#[test]
fn test_frame_without_record_kind() {
    let demo = open_sample();
    let err = demo.camera_position(2).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NoMacro);
    let info = demo.last_error();
    assert_eq!(info.code, ErrorCode::NoMacro);
    assert_eq!(info.record_kind, Some(MacroKind::GameData as u8));

    assert_eq!(
        demo.player_position(2).unwrap_err().code(),
        ErrorCode::NoMacro
    );
    assert_eq!(
        demo.last_error().record_kind,
        Some(MacroKind::ClientData as u8)
    );
}

#[test]
fn test_last_error_keeps_most_recent_failure() {
    let demo = open_sample();
    let _ = demo.camera(99);
    assert_eq!(demo.last_error().code, ErrorCode::NoFrame);

    // success leaves the slot alone
    assert!(demo.camera(0).is_ok());
    assert_eq!(demo.last_error().code, ErrorCode::NoFrame);

    let _ = demo.server_time(2);
    assert_eq!(demo.last_error().code, ErrorCode::NoMacro);
}

#[test]
fn test_game_data_accessors() {
    let demo = open_sample();
    assert_eq!(demo.camera_position(1).unwrap(), Vec3::X);
    assert_eq!(
        demo.camera_orientation(0).unwrap(),
        Vec3::new(0.0, 90.0, 0.0)
    );
    assert_eq!(demo.player_velocity(0).unwrap(), Vec3::new(250.0, 0.0, 0.0));
    assert_eq!(demo.sky_name(0).unwrap(), "cx");
    assert_eq!(demo.screen_resolution(0).unwrap().width, 1920);
    assert_eq!(demo.frame_time(1).unwrap(), 0.01);
    assert_eq!(demo.network_message(0).unwrap(), b"msg0");
    assert!(demo.network_message(1).unwrap().is_empty());
}

#[test]
fn test_player_data_combines_records() {
    let demo = open_sample();
    let player = demo.player_data(0).unwrap();
    assert_eq!(player.position, Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(player.orientation, Vec3::new(5.0, 6.0, 0.0));
    assert_eq!(player.velocity, Vec3::new(250.0, 0.0, 0.0));
    assert_eq!(demo.player_orientation(0).unwrap(), player.orientation);
}

#[test]
fn test_commands_in_chain_order() {
    let demo = open_sample();
    assert_eq!(demo.command_count(0).unwrap(), 3);
    assert_eq!(demo.commands(0).unwrap(), vec!["+jump", "-jump", "+duck"]);
    assert_eq!(demo.command_count(1).unwrap(), 0);
    assert!(demo.commands(2).unwrap().is_empty());
}

#[test]
fn test_commands_into_respects_capacity() {
    let demo = open_sample();

    let mut two = vec![String::new(); 2];
    assert_eq!(demo.commands_into(0, &mut two).unwrap(), 2);
    assert_eq!(two, ["+jump", "-jump"]);

    let mut five = vec!["stale".to_string(); 5];
    assert_eq!(demo.commands_into(0, &mut five).unwrap(), 3);
    assert_eq!(five[2], "+duck");
    assert_eq!(five[3], "stale");
}

#[test]
fn test_demo_buffers_and_buttons() {
    let demo = open_sample();
    assert_eq!(demo.demo_buffers(1).unwrap(), vec![&[7u8, 7][..], &[8u8][..]]);
    assert!(demo.demo_buffers(0).unwrap().is_empty());

    assert_eq!(demo.button_flags(0).unwrap(), ButtonFlags::JUMP);
    assert_eq!(demo.button_flags(2).unwrap(), ButtonFlags::empty());
    assert!(demo.button_flags(3).is_err());
}

#[test]
fn test_strict_options_reject_unterminated_segment() {
    let mut records = SegmentBuilder::new("Playback");
    records.unused(0, 0.0);
    let mut builder = DemoBuilder::new();
    builder.segment(records);

    assert!(Demo::from_bytes(builder.build()).is_ok());
    let err = Demo::from_bytes_with_options(builder.build(), DecodeOptions::strict()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::CorruptFile);
}

#[test]
fn test_empty_directory_has_no_frames() {
    let demo = Demo::from_bytes(DemoBuilder::new().build()).unwrap();
    assert!(demo.directory().is_empty());
    assert!(demo.playback().is_none());
    assert!(demo.playback_entry().is_none());
    assert_eq!(demo.frame_count(), 0);
    assert!(matches!(
        demo.frame_time(0),
        Err(DemoError::NoFrame {
            frame: 0,
            frame_count: 0
        })
    ));
}
