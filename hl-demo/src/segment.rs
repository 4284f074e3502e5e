//! Segment decoding: one directory entry's byte range into a record chain
//! plus a frame index

use crate::MACRO_HEADER_SIZE;
use crate::error::DemoError;
use crate::layout::{DirectoryEntry, MacroHeader, MacroKind};
use crate::reader::ByteReader;
use crate::record::{ButtonFlags, Macro, Payload};

/// Decoding policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeOptions {
    /// Reject segments that end without an end-of-segment record.
    ///
    /// Off by default: the sentinel's absence is tolerated because any
    /// truncation is already caught by the bounds checks.
    pub require_end_of_segment: bool,
}

impl DecodeOptions {
    pub fn strict() -> Self {
        Self {
            require_end_of_segment: true,
        }
    }
}

/// A decoded segment: its records in file order and where each frame starts
#[derive(Debug, Clone, Default)]
pub struct Segment {
    entry: usize,
    macros: Vec<Macro>,
    /// Chain index of the first record of each frame
    frames: Vec<usize>,
    /// Buttons held in each frame, parallel to `frames`
    buttons: Vec<ButtonFlags>,
}

impl Segment {
    /// Index of the directory entry this segment was decoded from
    pub fn entry_index(&self) -> usize {
        self.entry
    }

    /// All records in chain order
    pub fn macros(&self) -> &[Macro] {
        &self.macros
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// The run of records belonging to frame `index`
    pub fn frame(&self, index: usize) -> Option<&[Macro]> {
        let start = *self.frames.get(index)?;
        let end = self
            .frames
            .get(index + 1)
            .copied()
            .unwrap_or(self.macros.len());
        Some(&self.macros[start..end])
    }

    pub fn button_flags(&self, index: usize) -> Option<ButtonFlags> {
        self.buttons.get(index).copied()
    }

    /// Decode the records of `entry` from the full file buffer.
    ///
    /// The declared range is authoritative: a range extending past the end
    /// of `data` is read up to the end of `data`, and the first record that
    /// does not fit fails with the offset where the bytes ran out.
    pub(crate) fn decode(
        data: &[u8],
        index: usize,
        entry: &DirectoryEntry,
        options: &DecodeOptions,
    ) -> Result<Self, DemoError> {
        let mut segment = Segment {
            entry: index,
            ..Segment::default()
        };
        if entry.length == 0 {
            return Ok(segment);
        }

        let start = entry.offset as usize;
        let end = start.saturating_add(entry.length as usize);
        if start > data.len() {
            return Err(DemoError::corrupt(data.len(), None));
        }

        let mut reader = ByteReader::with_range(data, start, end);
        let mut current_frame: Option<u32> = None;
        let mut terminated = false;

        while reader.position() < end {
            let offset = reader.position();
            if reader.remaining() < MACRO_HEADER_SIZE {
                return Err(DemoError::corrupt(offset, None));
            }

            let tag = reader
                .read_u8()
                .map_err(|e| DemoError::corrupt(e.offset, None))?;
            let kind =
                MacroKind::try_from(tag).map_err(|_| DemoError::corrupt(offset, Some(tag)))?;
            let time = reader
                .read_f32()
                .map_err(|e| DemoError::corrupt(e.offset, Some(tag)))?;
            let frame = reader
                .read_u32()
                .map_err(|e| DemoError::corrupt(e.offset, Some(tag)))?;

            if reader.remaining() < kind.fixed_size() {
                return Err(DemoError::corrupt(reader.limit(), Some(tag)));
            }
            let payload = Payload::read(kind, &mut reader)
                .map_err(|e| DemoError::corrupt(e.offset, Some(tag)))?;

            if kind != MacroKind::EndOfSegment && current_frame != Some(frame) {
                if let Some(previous) = current_frame.filter(|&previous| frame < previous) {
                    tracing::warn!(
                        offset,
                        previous,
                        frame,
                        "frame number went backwards in segment {}",
                        index
                    );
                }
                segment.frames.push(segment.macros.len());
                segment.buttons.push(ButtonFlags::empty());
                current_frame = Some(frame);
            }

            if let (Payload::ClientData(client), Some(buttons)) =
                (&payload, segment.buttons.last_mut())
            {
                *buttons |= client.buttons();
            }

            segment.macros.push(Macro {
                header: MacroHeader { kind, time, frame },
                offset,
                payload,
            });

            if kind == MacroKind::EndOfSegment {
                terminated = true;
                break;
            }
        }

        if !terminated && options.require_end_of_segment {
            return Err(DemoError::corrupt(reader.position(), None));
        }

        tracing::debug!(
            "decoded segment {} '{}': {} records, {} frames",
            index,
            entry.title,
            segment.macros.len(),
            segment.frames.len()
        );

        Ok(segment)
    }
}
