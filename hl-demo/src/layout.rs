//! Byte-exact layout of the header, directory and record headers

use core::fmt;

use serde::Serialize;

use crate::reader::{ByteReader, Overrun};

/// File header (544 bytes at offset 0)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemoHeader {
    pub magic: [u8; 8],
    pub demo_protocol: u32,
    pub network_protocol: u32,
    /// Map name (260-byte field)
    pub map_name: String,
    /// Game module directory, e.g. "cstrike" (260-byte field)
    pub game_dll: String,
    pub map_crc: u32,
    /// Absolute offset of the directory table
    pub directory_offset: u32,
}

impl DemoHeader {
    pub(crate) fn read(r: &mut ByteReader<'_>) -> Result<Self, Overrun> {
        Ok(Self {
            magic: r.read_array()?,
            demo_protocol: r.read_u32()?,
            network_protocol: r.read_u32()?,
            map_name: r.read_fixed_string(260)?,
            game_dll: r.read_fixed_string(260)?,
            map_crc: r.read_u32()?,
            directory_offset: r.read_u32()?,
        })
    }
}

/// Directory entry describing one segment (92 bytes)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectoryEntry {
    pub number: u32,
    /// Segment title, e.g. "LOADING" or "Playback" (64-byte field)
    pub title: String,
    pub flags: u32,
    pub play: i32,
    /// Playback duration in seconds
    pub time: f32,
    /// Frame count as declared by the recorder
    pub frames: u32,
    /// Absolute offset of the segment's first record
    pub offset: u32,
    /// Length of the segment in bytes
    pub length: u32,
}

impl DirectoryEntry {
    pub(crate) fn read(r: &mut ByteReader<'_>) -> Result<Self, Overrun> {
        Ok(Self {
            number: r.read_u32()?,
            title: r.read_fixed_string(64)?,
            flags: r.read_u32()?,
            play: r.read_i32()?,
            time: r.read_f32()?,
            frames: r.read_u32()?,
            offset: r.read_u32()?,
            length: r.read_u32()?,
        })
    }
}

/// Header shared by every record (9 bytes)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacroHeader {
    pub kind: MacroKind,
    /// Timestamp in seconds
    pub time: f32,
    /// Frame number as recorded; not necessarily zero-based
    pub frame: u32,
}

/// Record kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MacroKind {
    LoadData = 0,
    GameData = 1,
    Unused = 2,
    ClientCommand = 3,
    ClientData = 4,
    EndOfSegment = 5,
    Event = 6,
    WeaponAnim = 7,
    PlaySound = 8,
    DemoBuffer = 9,
}

impl MacroKind {
    pub const ALL: [MacroKind; 10] = [
        MacroKind::LoadData,
        MacroKind::GameData,
        MacroKind::Unused,
        MacroKind::ClientCommand,
        MacroKind::ClientData,
        MacroKind::EndOfSegment,
        MacroKind::Event,
        MacroKind::WeaponAnim,
        MacroKind::PlaySound,
        MacroKind::DemoBuffer,
    ];

    /// Payload bytes after the record header, excluding any variable tail.
    ///
    /// For play-sound this counts the length field and the trailing block
    /// that follows the name.
    pub fn fixed_size(self) -> usize {
        match self {
            MacroKind::LoadData | MacroKind::Unused | MacroKind::EndOfSegment => 0,
            MacroKind::GameData => 468,
            MacroKind::ClientCommand => 64,
            MacroKind::ClientData => 32,
            MacroKind::Event => 84,
            MacroKind::WeaponAnim => 8,
            MacroKind::PlaySound => 8 + 16,
            MacroKind::DemoBuffer => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MacroKind::LoadData => "load-data",
            MacroKind::GameData => "game-data",
            MacroKind::Unused => "unused",
            MacroKind::ClientCommand => "client-command",
            MacroKind::ClientData => "client-data",
            MacroKind::EndOfSegment => "end-of-segment",
            MacroKind::Event => "event",
            MacroKind::WeaponAnim => "weapon-animation",
            MacroKind::PlaySound => "play-sound",
            MacroKind::DemoBuffer => "demo-buffer",
        }
    }
}

impl TryFrom<u8> for MacroKind {
    type Error = u8;

    fn try_from(tag: u8) -> Result<Self, u8> {
        MacroKind::ALL.get(tag as usize).copied().ok_or(tag)
    }
}

impl fmt::Display for MacroKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
