//! hl-demo: decoder for GoldSrc demo recordings (`.dem`)
//!
//! A demo file is a capture of a client's network session: camera and
//! player state, console commands, sound and event triggers, and raw
//! protocol buffers. This crate turns one into a frame-indexed, read-only
//! [`Demo`] that consumers query by playback frame without knowing the
//! byte layout.
//!
//! # File Layout
//!
//! ```text
//! [Header: 544 bytes]
//! - magic: [u8; 8]            "HLDEMO\0\0"
//! - demo_protocol: u32        (>= 5)
//! - network_protocol: u32     (>= 48)
//! - map_name: [u8; 260]
//! - game_dll: [u8; 260]
//! - map_crc: u32
//! - directory_offset: u32
//!
//! [Directory @ directory_offset]
//! - count: u32
//! - entries: count x 92 bytes (number, title[64], flags, play, time,
//!   frames, offset, length)
//!
//! [Segments @ entry.offset, entry.length bytes each]
//! - records: 9-byte header (kind: u8, time: f32, frame: u32) + payload
//! ```
//!
//! All integers are little-endian and nothing is padded.
//!
//! # Usage
//!
//! ```ignore
//! use hl_demo::Demo;
//!
//! let demo = Demo::open("bhop.dem")?;
//! println!("Map: {}", demo.map_name());
//!
//! for frame in 0..demo.frame_count() {
//!     if let Ok(player) = demo.player_data(frame) {
//!         println!("{frame}: {:?}", player.position);
//!     }
//! }
//! ```

mod demo;
mod directory;
mod error;
mod layout;
mod reader;
mod record;
mod segment;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use demo::Demo;
pub use error::{DemoError, ErrorCode, ErrorInfo};
pub use layout::{DemoHeader, DirectoryEntry, MacroHeader, MacroKind};
pub use record::{
    ButtonFlags, CameraData, ClientData, EventData, GameData, Macro, Payload, PlayerData,
    PlaySound, ScreenResolution, Settings, WeaponAnim,
};
pub use segment::{DecodeOptions, Segment};

// =============================================================================
// Constants
// =============================================================================

/// Magic tag at the start of every demo file
pub const DEMO_MAGIC: &[u8; 8] = b"HLDEMO\0\0";

/// Oldest demo protocol we can decode
pub const DEMO_PROTOCOL_MIN: u32 = 5;

/// Oldest network protocol we can decode
pub const NETWORK_PROTOCOL_MIN: u32 = 48;

/// Size of the file header in bytes
pub const HEADER_SIZE: usize = 544;

/// Size of one directory entry in bytes
pub const DIRECTORY_ENTRY_SIZE: usize = 92;

/// Size of the header shared by every record in bytes
pub const MACRO_HEADER_SIZE: usize = 9;

/// Directory index of the segment consumers query by frame
pub const PLAYBACK_SEGMENT: usize = 1;
