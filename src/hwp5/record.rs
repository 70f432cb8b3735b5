//! Record stream tokenizer for HWP 5.0 section streams.
//!
//! HWP 5.0 uses a TLV (Tag-Length-Value) record format with 4-byte headers.
//! Records whose payload does not fit in a 12-bit size field use an 8-byte
//! header: the size field holds the `0xFFF` sentinel and the real size follows
//! as a second little-endian word.

use crate::error::{Error, Result};
use std::iter::FusedIterator;

/// Tag IDs classified by the structural statistics.
pub mod tag {
    /// Paragraph header
    pub const PARA_HEADER: u16 = 66;
    /// Paragraph text
    pub const PARA_TEXT: u16 = 67;
    /// Table
    pub const TABLE: u16 = 80;
}

/// Record header structure.
///
/// Layout (32 bits little-endian):
/// - Bits 0-9: Tag ID (0-1023)
/// - Bits 10-19: Level (nesting depth)
/// - Bits 20-31: Size (0-4094, or 0xFFF for extended)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Tag ID identifying the record type
    pub tag_id: u16,
    /// Nesting level
    pub level: u16,
    /// Payload size in bytes
    pub size: u32,
    /// Bytes occupied by the header itself (4 or 8)
    pub header_len: usize,
}

impl RecordHeader {
    /// Size of a standard record header in bytes.
    pub const SIZE: usize = 4;
    /// Size of an extended record header in bytes.
    pub const EXTENDED_SIZE: usize = 8;
    /// Extended size sentinel value.
    pub const EXTENDED_SIZE_SENTINEL: u32 = 0xFFF;

    /// Parses the record header starting at `offset`.
    ///
    /// Fails with [`Error::TruncatedRecord`] when the header word, or the
    /// extended length word it announces, is not fully present.
    pub fn parse_at(data: &[u8], offset: usize) -> Result<Self> {
        let header_value =
            read_u32_le(data, offset).ok_or(Error::TruncatedRecord { offset })?;

        let tag_id = (header_value & 0x3FF) as u16;
        let level = ((header_value >> 10) & 0x3FF) as u16;
        let size_field = (header_value >> 20) & 0xFFF;

        let (size, header_len) = if size_field == Self::EXTENDED_SIZE_SENTINEL {
            let extended = read_u32_le(data, offset + Self::SIZE)
                .ok_or(Error::TruncatedRecord { offset })?;
            (extended, Self::EXTENDED_SIZE)
        } else {
            (size_field, Self::SIZE)
        };

        Ok(Self {
            tag_id,
            level,
            size,
            header_len,
        })
    }
}

/// A record borrowed from a section buffer.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    /// Record header
    pub header: RecordHeader,
    /// Record payload
    pub payload: &'a [u8],
    /// Offset in the buffer where this record's header starts
    pub offset: usize,
}

impl<'a> Record<'a> {
    /// Returns the raw tag ID value.
    pub fn tag_id(&self) -> u16 {
        self.header.tag_id
    }

    /// Returns the nesting level.
    pub fn level(&self) -> u16 {
        self.header.level
    }

    /// Returns the payload size.
    pub fn size(&self) -> u32 {
        self.header.size
    }

    /// Returns the record payload.
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// Returns true for PARA_TEXT records.
    pub fn is_para_text(&self) -> bool {
        self.header.tag_id == tag::PARA_TEXT
    }

    /// Returns true for table records.
    pub fn is_table(&self) -> bool {
        self.header.tag_id == tag::TABLE
    }
}

/// Lazy, non-restartable iterator over the records of one section buffer.
///
/// Stop conditions, in order of precedence:
/// - a header word at offset 0 that cannot be read yields a single
///   [`Error::TruncatedRecord`];
/// - a header word that cannot be read anywhere else, or a payload that runs
///   past the end of the buffer, ends the sequence silently;
/// - a zero-sized record (or one that fails to advance the cursor) is emitted
///   and then ends the sequence.
pub struct Records<'a> {
    data: &'a [u8],
    position: usize,
    finished: bool,
}

impl<'a> Records<'a> {
    /// Creates a new record iterator over `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            position: 0,
            finished: false,
        }
    }

    /// Returns the current cursor position in the buffer.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Yields records until the stream ends or becomes unreadable.
    ///
    /// An unreadable header is logged and treated as the end of the section.
    pub fn recovered(self) -> impl Iterator<Item = Record<'a>> {
        self.map_while(|record| match record {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("{}; skipping rest of section", e);
                None
            }
        })
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = Result<Record<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished || self.position >= self.data.len() {
            return None;
        }

        let offset = self.position;

        let header = match RecordHeader::parse_at(self.data, offset) {
            Ok(h) => h,
            Err(e) => {
                self.finished = true;
                if offset == 0 {
                    return Some(Err(e));
                }
                tracing::warn!(offset, "trailing bytes too short for a record header");
                return None;
            }
        };

        let payload_start = offset + header.header_len;
        let payload_end = match payload_start.checked_add(header.size as usize) {
            Some(end) if end <= self.data.len() => end,
            _ => {
                tracing::warn!(
                    offset,
                    size = header.size,
                    available = self.data.len() - payload_start.min(self.data.len()),
                    "record payload exceeds stream bounds"
                );
                self.finished = true;
                return None;
            }
        };

        self.position = payload_end;
        if header.size == 0 || payload_end <= offset {
            self.finished = true;
        }

        Some(Ok(Record {
            header,
            payload: &self.data[payload_start..payload_end],
            offset,
        }))
    }
}

impl FusedIterator for Records<'_> {}

fn read_u32_le(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Builds a raw record (header plus payload) in the on-disk layout.
#[cfg(test)]
pub(crate) fn encode_record(tag_id: u16, level: u16, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 8);
    let base = (tag_id as u32 & 0x3FF) | ((level as u32 & 0x3FF) << 10);
    if payload.len() >= RecordHeader::EXTENDED_SIZE_SENTINEL as usize {
        out.extend_from_slice(&(base | (0xFFF << 20)).to_le_bytes());
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    } else {
        out.extend_from_slice(&(base | ((payload.len() as u32) << 20)).to_le_bytes());
    }
    out.extend_from_slice(payload);
    out
}
