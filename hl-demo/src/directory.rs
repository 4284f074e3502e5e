//! Header validation and directory reading

use crate::error::DemoError;
use crate::layout::{DemoHeader, DirectoryEntry};
use crate::reader::ByteReader;
use crate::segment::{DecodeOptions, Segment};
use crate::{
    DEMO_MAGIC, DEMO_PROTOCOL_MIN, DIRECTORY_ENTRY_SIZE, HEADER_SIZE, NETWORK_PROTOCOL_MIN,
};

/// Everything decoded from one file, in construction order
pub(crate) struct Decoded {
    pub header: DemoHeader,
    pub directory: Vec<DirectoryEntry>,
    pub segments: Vec<Segment>,
}

/// Validate the header, read the directory and decode every segment
pub(crate) fn decode(data: &[u8], options: &DecodeOptions) -> Result<Decoded, DemoError> {
    let header = read_header(data)?;
    let directory = read_directory(data, header.directory_offset as usize)?;

    let mut segments = Vec::with_capacity(directory.len());
    for (index, entry) in directory.iter().enumerate() {
        let segment =
            Segment::decode(data, index, entry, options).map_err(|e| e.in_segment(index))?;
        segments.push(segment);
    }

    Ok(Decoded {
        header,
        directory,
        segments,
    })
}

/// Read and validate the fixed header.
///
/// The protocol check happens before anything past the header is touched:
/// older protocols use record layouts we cannot parse safely.
pub(crate) fn read_header(data: &[u8]) -> Result<DemoHeader, DemoError> {
    if data.len() < DEMO_MAGIC.len() || &data[..DEMO_MAGIC.len()] != DEMO_MAGIC {
        let mut found = [0u8; 8];
        let n = data.len().min(found.len());
        found[..n].copy_from_slice(&data[..n]);
        return Err(DemoError::NotADemo { found });
    }

    if data.len() < HEADER_SIZE {
        return Err(DemoError::Loading {
            reason: format!(
                "header truncated ({} of {} bytes)",
                data.len(),
                HEADER_SIZE
            ),
        });
    }

    let header = DemoHeader::read(&mut ByteReader::new(data))
        .map_err(|e| DemoError::corrupt(e.offset, None))?;

    if header.demo_protocol < DEMO_PROTOCOL_MIN
        || header.network_protocol < NETWORK_PROTOCOL_MIN
    {
        return Err(DemoError::OldProtocol {
            demo_protocol: header.demo_protocol,
            network_protocol: header.network_protocol,
        });
    }

    Ok(header)
}

/// Read the entry count and entry table at `offset`
pub(crate) fn read_directory(
    data: &[u8],
    offset: usize,
) -> Result<Vec<DirectoryEntry>, DemoError> {
    if offset >= data.len() {
        return Err(DemoError::corrupt(offset, None));
    }

    let mut reader = ByteReader::new(data);
    reader.seek(offset);
    let count = reader
        .read_u32()
        .map_err(|e| DemoError::corrupt(e.offset, None))? as usize;

    let fits = count
        .checked_mul(DIRECTORY_ENTRY_SIZE)
        .is_some_and(|size| size <= reader.remaining());
    if !fits {
        return Err(DemoError::corrupt(data.len(), None));
    }

    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let entry =
            DirectoryEntry::read(&mut reader).map_err(|e| DemoError::corrupt(e.offset, None))?;
        entries.push(entry);
    }

    tracing::debug!("directory at {:#x}: {} entries", offset, entries.len());
    Ok(entries)
}
