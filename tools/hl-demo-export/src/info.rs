//! Human- and machine-readable demo summaries

use std::fmt;

use hl_demo::{Demo, DirectoryEntry};
use serde::Serialize;

/// Header, directory and frame count of a decoded demo
#[derive(Debug, Clone, Serialize)]
pub struct DemoSummary {
    pub demo_protocol: u32,
    pub network_protocol: u32,
    pub map_name: String,
    pub game_dll: String,
    pub map_crc: u32,
    pub entries: Vec<DirectoryEntry>,
    /// Frames in the playback segment
    pub frame_count: usize,
}

impl DemoSummary {
    pub fn from_demo(demo: &Demo) -> Self {
        Self {
            demo_protocol: demo.demo_protocol(),
            network_protocol: demo.network_protocol(),
            map_name: demo.map_name().to_string(),
            game_dll: demo.game_dll().to_string(),
            map_crc: demo.map_crc(),
            entries: demo.directory().to_vec(),
            frame_count: demo.frame_count(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for DemoSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Protocol: demo {}, network {}",
            self.demo_protocol, self.network_protocol
        )?;
        writeln!(f, "Map: {} (crc {:#010x})", self.map_name, self.map_crc)?;
        writeln!(f, "Game: {}", self.game_dll)?;
        writeln!(f, "Entries: {}", self.entries.len())?;
        for entry in &self.entries {
            writeln!(
                f,
                "  [{}] {:<16} frames {:>6}  time {:>9.3}s  offset {:#010x}  length {}",
                entry.number, entry.title, entry.frames, entry.time, entry.offset, entry.length
            )?;
        }
        write!(f, "Playback frames: {}", self.frame_count)
    }
}
