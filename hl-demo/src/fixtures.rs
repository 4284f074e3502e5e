//! In-memory demo builder for tests
//!
//! Produces byte-exact demo files without shipping binary fixtures. The
//! directory is written straight after the header and the segments follow
//! in order, so truncating the output cuts into the last segment.

use glam::Vec3;

use crate::layout::MacroKind;
use crate::record::GameData;
use crate::{
    DEMO_MAGIC, DEMO_PROTOCOL_MIN, DIRECTORY_ENTRY_SIZE, HEADER_SIZE, NETWORK_PROTOCOL_MIN,
};

fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_i32(buf: &mut Vec<u8>, v: i32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_i16(buf: &mut Vec<u8>, v: i16) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_f32(buf: &mut Vec<u8>, v: f32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_vec3(buf: &mut Vec<u8>, v: Vec3) {
    for c in v.to_array() {
        put_f32(buf, c);
    }
}

fn put_fixed_str(buf: &mut Vec<u8>, s: &str, width: usize) {
    let mut field = vec![0u8; width];
    let len = s.len().min(width);
    field[..len].copy_from_slice(&s.as_bytes()[..len]);
    buf.extend_from_slice(&field);
}

fn put_zeros(buf: &mut Vec<u8>, n: usize) {
    buf.resize(buf.len() + n, 0);
}

/// Records of one segment, serialized as they are added
#[derive(Debug, Clone, Default)]
pub struct SegmentBuilder {
    title: String,
    bytes: Vec<u8>,
    frames: u32,
    last_frame: Option<u32>,
    time: f32,
    declared_length: Option<u32>,
}

impl SegmentBuilder {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Self::default()
        }
    }

    /// Serialized size of the records so far
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// Write a different length into the directory entry
    pub fn declared_length(&mut self, length: u32) -> &mut Self {
        self.declared_length = Some(length);
        self
    }

    /// Append bytes verbatim
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    fn header(&mut self, kind: MacroKind, frame: u32, time: f32) {
        self.bytes.push(kind as u8);
        put_f32(&mut self.bytes, time);
        put_u32(&mut self.bytes, frame);
        if kind != MacroKind::EndOfSegment && self.last_frame != Some(frame) {
            self.frames += 1;
            self.last_frame = Some(frame);
        }
        self.time = time;
    }

    pub fn load_data(&mut self, frame: u32, time: f32) -> &mut Self {
        self.header(MacroKind::LoadData, frame, time);
        self
    }

    pub fn unused(&mut self, frame: u32, time: f32) -> &mut Self {
        self.header(MacroKind::Unused, frame, time);
        self
    }

    pub fn end_of_segment(&mut self, frame: u32, time: f32) -> &mut Self {
        self.header(MacroKind::EndOfSegment, frame, time);
        self
    }

    /// Game-data record; `game.message` is ignored in favour of `message`
    pub fn game_data(
        &mut self,
        frame: u32,
        time: f32,
        game: &GameData,
        message: &[u8],
    ) -> &mut Self {
        self.header(MacroKind::GameData, frame, time);
        let b = &mut self.bytes;
        put_zeros(b, 4);
        put_vec3(b, game.camera.position);
        put_vec3(b, game.camera.orientation);
        put_zeros(b, 36);
        put_f32(b, game.frame_length);
        put_f32(b, game.server_time);
        put_zeros(b, 12);
        put_u32(b, game.ground_flag);
        put_zeros(b, 4);
        put_vec3(b, game.player_velocity);
        put_vec3(b, game.player_position);
        put_zeros(b, 104);
        put_i16(b, game.screen.width);
        put_i16(b, game.screen.height);
        put_i16(b, game.screen.depth);
        put_zeros(b, 12);
        put_i16(b, game.engine_frame_length);
        put_zeros(b, 12);
        put_f32(b, game.forward_move);
        put_f32(b, game.side_move);
        put_zeros(b, 28);
        let s = &game.settings;
        for v in [
            s.gravity,
            s.stop_speed,
            s.max_speed,
            s.max_spectator_speed,
            s.accelerate,
            s.air_accelerate,
            s.water_accelerate,
            s.friction,
            s.edge_friction,
            s.water_friction,
            s.ent_gravity,
            s.bounce,
            s.step_size,
            s.max_velocity,
            s.z_max,
            s.wave_height,
        ] {
            put_f32(b, v);
        }
        put_i32(b, s.footsteps);
        put_fixed_str(b, &game.sky_name, 40);
        put_vec3(b, game.player_position_2);
        put_zeros(b, 56);
        put_u32(b, message.len() as u32);
        b.extend_from_slice(message);
        self
    }

    pub fn client_command(&mut self, frame: u32, time: f32, command: &str) -> &mut Self {
        self.header(MacroKind::ClientCommand, frame, time);
        put_fixed_str(&mut self.bytes, command, 64);
        self
    }

    pub fn client_data(
        &mut self,
        frame: u32,
        time: f32,
        position: Vec3,
        orientation: Vec3,
        buttons: u8,
    ) -> &mut Self {
        self.header(MacroKind::ClientData, frame, time);
        put_vec3(&mut self.bytes, position);
        put_vec3(&mut self.bytes, orientation);
        self.bytes.push(buttons);
        put_zeros(&mut self.bytes, 7);
        self
    }

    pub fn event(
        &mut self,
        frame: u32,
        time: f32,
        flags: u32,
        index: u32,
        delay: f32,
    ) -> &mut Self {
        self.header(MacroKind::Event, frame, time);
        put_u32(&mut self.bytes, flags);
        put_u32(&mut self.bytes, index);
        put_f32(&mut self.bytes, delay);
        put_zeros(&mut self.bytes, 72);
        self
    }

    pub fn weapon_anim(&mut self, frame: u32, time: f32, anim: u32, body: u32) -> &mut Self {
        self.header(MacroKind::WeaponAnim, frame, time);
        put_u32(&mut self.bytes, anim);
        put_u32(&mut self.bytes, body);
        self
    }

    pub fn play_sound(&mut self, frame: u32, time: f32, channel: u32, name: &str) -> &mut Self {
        self.header(MacroKind::PlaySound, frame, time);
        put_u32(&mut self.bytes, channel);
        put_u32(&mut self.bytes, name.len() as u32);
        self.bytes.extend_from_slice(name.as_bytes());
        put_f32(&mut self.bytes, 0.8);
        put_f32(&mut self.bytes, 1.0);
        put_u32(&mut self.bytes, 0);
        put_u32(&mut self.bytes, 100);
        self
    }

    pub fn demo_buffer(&mut self, frame: u32, time: f32, data: &[u8]) -> &mut Self {
        self.header(MacroKind::DemoBuffer, frame, time);
        put_u32(&mut self.bytes, data.len() as u32);
        self.bytes.extend_from_slice(data);
        self
    }
}

/// Whole-file builder: header, directory, then segments
#[derive(Debug, Clone)]
pub struct DemoBuilder {
    pub magic: [u8; 8],
    pub demo_protocol: u32,
    pub network_protocol: u32,
    pub map_name: String,
    pub game_dll: String,
    pub map_crc: u32,
    /// Overrides the directory offset written into the header
    pub directory_offset: Option<u32>,
    segments: Vec<SegmentBuilder>,
}

impl Default for DemoBuilder {
    fn default() -> Self {
        Self {
            magic: *DEMO_MAGIC,
            demo_protocol: DEMO_PROTOCOL_MIN,
            network_protocol: NETWORK_PROTOCOL_MIN,
            map_name: "maps/kz_longjumps2.bsp".to_string(),
            game_dll: "cstrike".to_string(),
            map_crc: 0x1234_5678,
            directory_offset: None,
            segments: Vec::new(),
        }
    }
}

impl DemoBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segment(&mut self, segment: SegmentBuilder) -> &mut Self {
        self.segments.push(segment);
        self
    }

    /// Absolute offset where segment `index` starts in the built file
    pub fn segment_offset(&self, index: usize) -> usize {
        HEADER_SIZE
            + 4
            + self.segments.len() * DIRECTORY_ENTRY_SIZE
            + self.segments[..index].iter().map(SegmentBuilder::byte_len).sum::<usize>()
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.magic);
        put_u32(&mut out, self.demo_protocol);
        put_u32(&mut out, self.network_protocol);
        put_fixed_str(&mut out, &self.map_name, 260);
        put_fixed_str(&mut out, &self.game_dll, 260);
        put_u32(&mut out, self.map_crc);
        put_u32(&mut out, self.directory_offset.unwrap_or(HEADER_SIZE as u32));

        put_u32(&mut out, self.segments.len() as u32);
        for (i, segment) in self.segments.iter().enumerate() {
            put_u32(&mut out, i as u32);
            put_fixed_str(&mut out, &segment.title, 64);
            put_u32(&mut out, 0);
            put_i32(&mut out, 0);
            put_f32(&mut out, segment.time);
            put_u32(&mut out, segment.frames);
            put_u32(&mut out, self.segment_offset(i) as u32);
            put_u32(
                &mut out,
                segment.declared_length.unwrap_or(segment.byte_len() as u32),
            );
        }

        for segment in &self.segments {
            out.extend_from_slice(&segment.bytes);
        }
        out
    }
}
