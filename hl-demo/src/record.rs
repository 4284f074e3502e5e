//! Decoded record payloads
//!
//! Each record is decoded field by field through a bounded [`ByteReader`];
//! nothing is reinterpreted in place. Variable-length tails (network
//! messages, demo buffers) stay in the demo's buffer and are referenced
//! by byte range.

use std::ops::Range;

use glam::Vec3;

use crate::layout::{MacroHeader, MacroKind};
use crate::reader::{ByteReader, Overrun, read_string};

bitflags::bitflags! {
    /// Input buttons held during a frame
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ButtonFlags: u8 {
        const JUMP = 0x01;
        const DUCK = 0x02;
        const FORWARD = 0x04;
        const BACK = 0x08;
        const MOVELEFT = 0x10;
        const MOVERIGHT = 0x20;
        const JUMP_SCROLL = 0x40;
        const DUCK_SCROLL = 0x80;
        const SCROLLS = Self::JUMP_SCROLL.bits() | Self::DUCK_SCROLL.bits();
    }
}

/// Camera pose
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CameraData {
    pub position: Vec3,
    /// Pitch, yaw, roll in degrees
    pub orientation: Vec3,
}

/// Player state assembled from a frame's client-data and game-data records
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlayerData {
    pub position: Vec3,
    pub velocity: Vec3,
    pub orientation: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScreenResolution {
    pub width: i16,
    pub height: i16,
    pub depth: i16,
}

/// Server movement variables (`sv_*` cvars) in effect for a frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Settings {
    pub gravity: f32,
    pub stop_speed: f32,
    pub max_speed: f32,
    pub max_spectator_speed: f32,
    pub accelerate: f32,
    pub air_accelerate: f32,
    pub water_accelerate: f32,
    pub friction: f32,
    pub edge_friction: f32,
    pub water_friction: f32,
    pub ent_gravity: f32,
    pub bounce: f32,
    pub step_size: f32,
    pub max_velocity: f32,
    pub z_max: f32,
    pub wave_height: f32,
    pub footsteps: i32,
}

impl Settings {
    fn read(r: &mut ByteReader<'_>) -> Result<Self, Overrun> {
        Ok(Self {
            gravity: r.read_f32()?,
            stop_speed: r.read_f32()?,
            max_speed: r.read_f32()?,
            max_spectator_speed: r.read_f32()?,
            accelerate: r.read_f32()?,
            air_accelerate: r.read_f32()?,
            water_accelerate: r.read_f32()?,
            friction: r.read_f32()?,
            edge_friction: r.read_f32()?,
            water_friction: r.read_f32()?,
            ent_gravity: r.read_f32()?,
            bounce: r.read_f32()?,
            step_size: r.read_f32()?,
            max_velocity: r.read_f32()?,
            z_max: r.read_f32()?,
            wave_height: r.read_f32()?,
            footsteps: r.read_i32()?,
        })
    }
}

/// Game-data record: the per-frame view and movement snapshot
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GameData {
    pub camera: CameraData,
    /// Client frame duration in seconds
    pub frame_length: f32,
    pub server_time: f32,
    /// Non-zero while the player touches the ground
    pub ground_flag: u32,
    pub player_velocity: Vec3,
    pub player_position: Vec3,
    pub screen: ScreenResolution,
    /// Frame duration in milliseconds, as the engine sends it
    pub engine_frame_length: i16,
    pub forward_move: f32,
    pub side_move: f32,
    pub settings: Settings,
    pub sky_name: String,
    pub player_position_2: Vec3,
    /// Raw network message following the fixed payload
    pub message: Range<usize>,
}

impl GameData {
    fn read(r: &mut ByteReader<'_>) -> Result<Self, Overrun> {
        r.skip(4)?;
        let camera = CameraData {
            position: r.read_vec3()?,
            orientation: r.read_vec3()?,
        };
        r.skip(36)?;
        let frame_length = r.read_f32()?;
        let server_time = r.read_f32()?;
        r.skip(12)?;
        let ground_flag = r.read_u32()?;
        r.skip(4)?;
        let player_velocity = r.read_vec3()?;
        let player_position = r.read_vec3()?;
        r.skip(104)?;
        let screen = ScreenResolution {
            width: r.read_i16()?,
            height: r.read_i16()?,
            depth: r.read_i16()?,
        };
        r.skip(12)?;
        let engine_frame_length = r.read_i16()?;
        r.skip(12)?;
        let forward_move = r.read_f32()?;
        let side_move = r.read_f32()?;
        r.skip(28)?;
        let settings = Settings::read(r)?;
        let sky_name = r.read_fixed_string(40)?;
        let player_position_2 = r.read_vec3()?;
        r.skip(56)?;
        let message = read_tail(r)?;

        Ok(Self {
            camera,
            frame_length,
            server_time,
            ground_flag,
            player_velocity,
            player_position,
            screen,
            engine_frame_length,
            forward_move,
            side_move,
            settings,
            sky_name,
            player_position_2,
            message,
        })
    }
}

/// Client-data record: the local player's view origin and angles
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClientData {
    pub position: Vec3,
    pub orientation: Vec3,
    /// Auxiliary block; byte 0 holds the button bits
    pub aux: [u8; 8],
}

impl ClientData {
    pub fn buttons(&self) -> ButtonFlags {
        ButtonFlags::from_bits_truncate(self.aux[0])
    }
}

/// Event record
#[derive(Debug, Clone, PartialEq)]
pub struct EventData {
    pub flags: u32,
    pub index: u32,
    pub delay: f32,
    pub args: [u8; 72],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeaponAnim {
    pub anim: u32,
    pub body: u32,
}

/// Play-sound record
#[derive(Debug, Clone, PartialEq)]
pub struct PlaySound {
    pub channel: u32,
    pub name: String,
    pub attenuation: f32,
    pub volume: f32,
    pub flags: u32,
    pub pitch: u32,
}

/// One record of a segment's chain
#[derive(Debug, Clone, PartialEq)]
pub struct Macro {
    pub header: MacroHeader,
    /// Absolute offset of the record header in the file
    pub offset: usize,
    pub payload: Payload,
}

impl Macro {
    pub fn kind(&self) -> MacroKind {
        self.header.kind
    }
}

/// Decoded payload, one variant per record kind
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    LoadData,
    GameData(Box<GameData>),
    Unused,
    ClientCommand(String),
    ClientData(ClientData),
    EndOfSegment,
    Event(Box<EventData>),
    WeaponAnim(WeaponAnim),
    PlaySound(PlaySound),
    /// Raw protocol buffer
    DemoBuffer(Range<usize>),
}

impl Payload {
    /// Decode the payload of a `kind` record starting at the reader's position.
    ///
    /// Every read is bounded by the reader's limit, so a record that runs
    /// past its segment fails with the offset where the data ran out.
    pub(crate) fn read(kind: MacroKind, r: &mut ByteReader<'_>) -> Result<Self, Overrun> {
        Ok(match kind {
            MacroKind::LoadData => Payload::LoadData,
            MacroKind::Unused => Payload::Unused,
            MacroKind::EndOfSegment => Payload::EndOfSegment,
            MacroKind::GameData => Payload::GameData(Box::new(GameData::read(r)?)),
            MacroKind::ClientCommand => Payload::ClientCommand(r.read_fixed_string(64)?),
            MacroKind::ClientData => Payload::ClientData(ClientData {
                position: r.read_vec3()?,
                orientation: r.read_vec3()?,
                aux: r.read_array()?,
            }),
            MacroKind::Event => Payload::Event(Box::new(EventData {
                flags: r.read_u32()?,
                index: r.read_u32()?,
                delay: r.read_f32()?,
                args: r.read_array()?,
            })),
            MacroKind::WeaponAnim => Payload::WeaponAnim(WeaponAnim {
                anim: r.read_u32()?,
                body: r.read_u32()?,
            }),
            MacroKind::PlaySound => {
                let channel = r.read_u32()?;
                let name_length = r.read_u32()? as usize;
                let name = read_string(r.read_bytes(name_length)?);
                Payload::PlaySound(PlaySound {
                    channel,
                    name,
                    attenuation: r.read_f32()?,
                    volume: r.read_f32()?,
                    flags: r.read_u32()?,
                    pitch: r.read_u32()?,
                })
            }
            MacroKind::DemoBuffer => Payload::DemoBuffer(read_tail(r)?),
        })
    }

    pub fn kind(&self) -> MacroKind {
        match self {
            Payload::LoadData => MacroKind::LoadData,
            Payload::GameData(_) => MacroKind::GameData,
            Payload::Unused => MacroKind::Unused,
            Payload::ClientCommand(_) => MacroKind::ClientCommand,
            Payload::ClientData(_) => MacroKind::ClientData,
            Payload::EndOfSegment => MacroKind::EndOfSegment,
            Payload::Event(_) => MacroKind::Event,
            Payload::WeaponAnim(_) => MacroKind::WeaponAnim,
            Payload::PlaySound(_) => MacroKind::PlaySound,
            Payload::DemoBuffer(_) => MacroKind::DemoBuffer,
        }
    }
}

/// Read a u32 length and step over that many bytes, returning their range
fn read_tail(r: &mut ByteReader<'_>) -> Result<Range<usize>, Overrun> {
    let len = r.read_u32()? as usize;
    let start = r.position();
    r.skip(len)?;
    Ok(start..start + len)
}
