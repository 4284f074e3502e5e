//! Frame query facade over a decoded demo

use std::path::Path;
use std::sync::{Mutex, PoisonError};

use glam::Vec3;

use crate::PLAYBACK_SEGMENT;
use crate::directory;
use crate::error::{DemoError, ErrorInfo};
use crate::layout::{DemoHeader, DirectoryEntry, MacroKind};
use crate::record::{
    ButtonFlags, CameraData, ClientData, GameData, Macro, Payload, PlayerData, ScreenResolution,
    Settings,
};
use crate::segment::{DecodeOptions, Segment};

/// A fully decoded demo.
///
/// Only a successful decode produces a `Demo`; after that it is read-only.
/// Every per-frame accessor takes a zero-based index into the playback
/// segment and returns the value or the reason it is unavailable. Failed
/// accessor calls are also recorded in [`Demo::last_error`].
#[derive(Debug)]
pub struct Demo {
    data: Vec<u8>,
    header: DemoHeader,
    directory: Vec<DirectoryEntry>,
    segments: Vec<Segment>,
    last_error: Mutex<ErrorInfo>,
}

impl Demo {
    /// Open and decode the demo at `path` with default options
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DemoError> {
        Self::open_with_options(path, DecodeOptions::default())
    }

    pub fn open_with_options(
        path: impl AsRef<Path>,
        options: DecodeOptions,
    ) -> Result<Self, DemoError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| DemoError::NoFile {
            path: path.to_path_buf(),
            source,
        })?;
        if data.is_empty() {
            return Err(DemoError::NoFile {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "file is empty"),
            });
        }
        tracing::debug!("decoding {:?} ({} bytes)", path, data.len());
        Self::from_bytes_with_options(data, options)
    }

    /// Decode a demo already held in memory
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, DemoError> {
        Self::from_bytes_with_options(data, DecodeOptions::default())
    }

    pub fn from_bytes_with_options(
        data: Vec<u8>,
        options: DecodeOptions,
    ) -> Result<Self, DemoError> {
        if data.is_empty() {
            return Err(DemoError::NoFile {
                path: "<memory>".into(),
                source: std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "buffer is empty"),
            });
        }

        let decoded = directory::decode(&data, &options)?;
        Ok(Self {
            data,
            header: decoded.header,
            directory: decoded.directory,
            segments: decoded.segments,
            last_error: Mutex::new(ErrorInfo::default()),
        })
    }

    // =========================================================================
    // Header and structure
    // =========================================================================

    pub fn header(&self) -> &DemoHeader {
        &self.header
    }

    pub fn demo_protocol(&self) -> u32 {
        self.header.demo_protocol
    }

    pub fn network_protocol(&self) -> u32 {
        self.header.network_protocol
    }

    pub fn map_name(&self) -> &str {
        &self.header.map_name
    }

    pub fn game_dll(&self) -> &str {
        &self.header.game_dll
    }

    pub fn map_crc(&self) -> u32 {
        self.header.map_crc
    }

    pub fn directory(&self) -> &[DirectoryEntry] {
        &self.directory
    }

    /// All decoded segments in directory order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The segment frame indices refer to.
    ///
    /// This is directory entry 1; files with a single entry fall back to it.
    pub fn playback(&self) -> Option<&Segment> {
        self.segments
            .get(PLAYBACK_SEGMENT)
            .or_else(|| self.segments.last())
    }

    /// Directory entry of the playback segment
    pub fn playback_entry(&self) -> Option<&DirectoryEntry> {
        self.directory.get(self.playback()?.entry_index())
    }

    pub fn frame_count(&self) -> usize {
        self.playback().map_or(0, Segment::frame_count)
    }

    /// Most recent accessor failure; `Success` until one fails
    pub fn last_error(&self) -> ErrorInfo {
        *self
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Bytes of the file this demo was decoded from
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    // =========================================================================
    // Per-frame accessors
    // =========================================================================

    /// Timestamp of the frame's first record, in seconds
    pub fn frame_time(&self, frame: usize) -> Result<f32, DemoError> {
        self.track(self.frame_run(frame).map(|run| run[0].header.time))
    }

    pub fn camera(&self, frame: usize) -> Result<CameraData, DemoError> {
        self.track(self.game_data(frame).map(|g| g.camera))
    }

    pub fn camera_position(&self, frame: usize) -> Result<Vec3, DemoError> {
        self.track(self.game_data(frame).map(|g| g.camera.position))
    }

    pub fn camera_orientation(&self, frame: usize) -> Result<Vec3, DemoError> {
        self.track(self.game_data(frame).map(|g| g.camera.orientation))
    }

    pub fn frame_length(&self, frame: usize) -> Result<f32, DemoError> {
        self.track(self.game_data(frame).map(|g| g.frame_length))
    }

    pub fn server_time(&self, frame: usize) -> Result<f32, DemoError> {
        self.track(self.game_data(frame).map(|g| g.server_time))
    }

    pub fn ground_flag(&self, frame: usize) -> Result<u32, DemoError> {
        self.track(self.game_data(frame).map(|g| g.ground_flag))
    }

    pub fn player_velocity(&self, frame: usize) -> Result<Vec3, DemoError> {
        self.track(self.game_data(frame).map(|g| g.player_velocity))
    }

    pub fn player_position(&self, frame: usize) -> Result<Vec3, DemoError> {
        self.track(self.client_data(frame).map(|c| c.position))
    }

    pub fn player_orientation(&self, frame: usize) -> Result<Vec3, DemoError> {
        self.track(self.client_data(frame).map(|c| c.orientation))
    }

    /// Position and orientation from client-data, velocity from game-data
    pub fn player_data(&self, frame: usize) -> Result<PlayerData, DemoError> {
        let result = self.client_data(frame).and_then(|client| {
            let game = self.game_data(frame)?;
            Ok(PlayerData {
                position: client.position,
                velocity: game.player_velocity,
                orientation: client.orientation,
            })
        });
        self.track(result)
    }

    pub fn screen_resolution(&self, frame: usize) -> Result<ScreenResolution, DemoError> {
        self.track(self.game_data(frame).map(|g| g.screen))
    }

    pub fn engine_frame_length(&self, frame: usize) -> Result<i16, DemoError> {
        self.track(self.game_data(frame).map(|g| g.engine_frame_length))
    }

    pub fn forward_move(&self, frame: usize) -> Result<f32, DemoError> {
        self.track(self.game_data(frame).map(|g| g.forward_move))
    }

    pub fn side_move(&self, frame: usize) -> Result<f32, DemoError> {
        self.track(self.game_data(frame).map(|g| g.side_move))
    }

    pub fn settings(&self, frame: usize) -> Result<Settings, DemoError> {
        self.track(self.game_data(frame).map(|g| g.settings))
    }

    pub fn sky_name(&self, frame: usize) -> Result<&str, DemoError> {
        self.track(self.game_data(frame).map(|g| g.sky_name.as_str()))
    }

    /// Raw network message carried by the frame's game-data record
    pub fn network_message(&self, frame: usize) -> Result<&[u8], DemoError> {
        self.track(
            self.game_data(frame)
                .map(|g| &self.data[g.message.clone()]),
        )
    }

    /// Every demo-buffer payload in the frame, in chain order
    pub fn demo_buffers(&self, frame: usize) -> Result<Vec<&[u8]>, DemoError> {
        let result = self.frame_run(frame).map(|run| {
            run.iter()
                .filter_map(|m| match &m.payload {
                    Payload::DemoBuffer(range) => Some(&self.data[range.clone()]),
                    _ => None,
                })
                .collect()
        });
        self.track(result)
    }

    /// Number of console commands recorded in the frame (may be zero)
    pub fn command_count(&self, frame: usize) -> Result<usize, DemoError> {
        self.track(self.frame_run(frame).map(|run| commands_in(run).count()))
    }

    /// Console commands of the frame in chain order
    pub fn commands(&self, frame: usize) -> Result<Vec<&str>, DemoError> {
        self.track(self.frame_run(frame).map(|run| commands_in(run).collect()))
    }

    /// Copy the frame's commands into `out`, up to its length.
    ///
    /// Returns how many slots were filled; query [`Demo::command_count`]
    /// first to size `out`.
    pub fn commands_into(&self, frame: usize, out: &mut [String]) -> Result<usize, DemoError> {
        let result = self.frame_run(frame).map(|run| {
            let mut written = 0;
            for (slot, command) in out.iter_mut().zip(commands_in(run)) {
                slot.clear();
                slot.push_str(command);
                written += 1;
            }
            written
        });
        self.track(result)
    }

    /// Buttons held during the frame, from its client-data records
    pub fn button_flags(&self, frame: usize) -> Result<ButtonFlags, DemoError> {
        let result = self.frame_run(frame).map(|_| {
            self.playback()
                .and_then(|s| s.button_flags(frame))
                .unwrap_or_default()
        });
        self.track(result)
    }

    // =========================================================================
    // Lookup helpers
    // =========================================================================

    /// Records of `frame`; never empty
    fn frame_run(&self, frame: usize) -> Result<&[Macro], DemoError> {
        self.playback()
            .and_then(|segment| segment.frame(frame))
            .filter(|run| !run.is_empty())
            .ok_or(DemoError::NoFrame {
                frame,
                frame_count: self.frame_count(),
            })
    }

    fn game_data(&self, frame: usize) -> Result<&GameData, DemoError> {
        self.frame_run(frame)?
            .iter()
            .find_map(|m| match &m.payload {
                Payload::GameData(game) => Some(game.as_ref()),
                _ => None,
            })
            .ok_or(DemoError::NoMacro {
                frame,
                kind: MacroKind::GameData,
            })
    }

    fn client_data(&self, frame: usize) -> Result<&ClientData, DemoError> {
        self.frame_run(frame)?
            .iter()
            .find_map(|m| match &m.payload {
                Payload::ClientData(client) => Some(client),
                _ => None,
            })
            .ok_or(DemoError::NoMacro {
                frame,
                kind: MacroKind::ClientData,
            })
    }

    /// Record a failure in the last-error slot and pass the result through
    fn track<T>(&self, result: Result<T, DemoError>) -> Result<T, DemoError> {
        if let Err(err) = &result {
            *self
                .last_error
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = err.info();
        }
        result
    }
}

fn commands_in(run: &[Macro]) -> impl Iterator<Item = &str> {
    run.iter().filter_map(|m| match &m.payload {
        Payload::ClientCommand(command) => Some(command.as_str()),
        _ => None,
    })
}

#[cfg(test)]
mod tests;
