//! Demo decoding and query error types

use std::io;
use std::path::PathBuf;

use crate::layout::MacroKind;

/// Closed set of error kinds, with the numeric codes older consumers expect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ErrorCode {
    /// No error
    #[default]
    Success = 0,
    /// The source could not be opened or read, or is empty
    NoFile = 1,
    /// Magic tag mismatch
    NotADemo = 2,
    /// Generic open-phase failure
    Loading = 3,
    /// Protocol version below the supported minimum
    OldProtocol = 4,
    /// Bounds violation or unknown record kind
    CorruptFile = 5,
    /// Frame index out of range
    NoFrame = 6,
    /// Requested record kind absent from the frame
    NoMacro = 7,
}

impl ErrorCode {
    /// Numeric value of the code
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Snapshot of the last failure: kind plus where it was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    /// Absolute byte offset in the file, for parse failures
    pub offset: Option<usize>,
    /// Raw record kind tag, when a record was being decoded
    pub record_kind: Option<u8>,
}

/// Errors raised while opening a demo or querying its frames
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error("cannot read demo {path:?}: {source}")]
    NoFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("not a demo file (magic {found:02x?})")]
    NotADemo { found: [u8; 8] },

    #[error("loading failed: {reason}")]
    Loading { reason: String },

    #[error(
        "unsupported protocol (demo {demo_protocol}, network {network_protocol}; need demo >= {}, network >= {})",
        crate::DEMO_PROTOCOL_MIN,
        crate::NETWORK_PROTOCOL_MIN
    )]
    OldProtocol {
        demo_protocol: u32,
        network_protocol: u32,
    },

    #[error("corrupt file at offset {offset:#x}{}{}", fmt_kind(.record_kind), fmt_segment(.segment))]
    CorruptFile {
        offset: usize,
        record_kind: Option<u8>,
        segment: Option<usize>,
    },

    #[error("frame {frame} out of range ({frame_count} frames)")]
    NoFrame { frame: usize, frame_count: usize },

    #[error("frame {frame} has no {kind} record")]
    NoMacro { frame: usize, kind: MacroKind },
}

fn fmt_kind(kind: &Option<u8>) -> String {
    kind.map(|k| format!(" (record kind {k})")).unwrap_or_default()
}

fn fmt_segment(segment: &Option<usize>) -> String {
    segment
        .map(|s| format!(" in segment {s}"))
        .unwrap_or_default()
}

impl DemoError {
    /// The closed error kind
    pub fn code(&self) -> ErrorCode {
        match self {
            DemoError::NoFile { .. } => ErrorCode::NoFile,
            DemoError::NotADemo { .. } => ErrorCode::NotADemo,
            DemoError::Loading { .. } => ErrorCode::Loading,
            DemoError::OldProtocol { .. } => ErrorCode::OldProtocol,
            DemoError::CorruptFile { .. } => ErrorCode::CorruptFile,
            DemoError::NoFrame { .. } => ErrorCode::NoFrame,
            DemoError::NoMacro { .. } => ErrorCode::NoMacro,
        }
    }

    /// Copyable diagnostic record for this error
    pub fn info(&self) -> ErrorInfo {
        let (offset, record_kind) = match self {
            DemoError::CorruptFile {
                offset,
                record_kind,
                ..
            } => (Some(*offset), *record_kind),
            DemoError::NoMacro { kind, .. } => (None, Some(*kind as u8)),
            _ => (None, None),
        };
        ErrorInfo {
            code: self.code(),
            offset,
            record_kind,
        }
    }

    pub(crate) fn corrupt(offset: usize, record_kind: Option<u8>) -> Self {
        DemoError::CorruptFile {
            offset,
            record_kind,
            segment: None,
        }
    }

    /// Tag a segment decode failure with its directory entry index
    pub(crate) fn in_segment(self, index: usize) -> Self {
        match self {
            DemoError::CorruptFile {
                offset,
                record_kind,
                ..
            } => DemoError::CorruptFile {
                offset,
                record_kind,
                segment: Some(index),
            },
            other => other,
        }
    }
}
