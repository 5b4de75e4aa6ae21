// Per-record decoding.
//
// Each record is a fixed part followed by a variable-length payload.
// The fixed part comes in two layouts; which one applies depends on the
// header version AND, for version 8, on the client build:
//
//   Layout A (24 bytes): signature(4) id(i32) table_hash(u32)
//                        record_id(u32) payload_size(u32) status(u8) pad(3)
//   Layout B (28 bytes): as A, with one reserved u32 between id and
//                        table_hash
//
// Layout A is the version 7 shape. A handful of version 8 builds (the
// 9.1.0 line) shipped with the version 7 record shape; the full client
// version cannot be recovered from the file, so those builds are listed
// explicitly.

use super::{ByteReader, CACHE_MAGIC, DecodeError};

/// Version 8 builds that still emit Layout A records.
pub const LAYOUT_A_V8_BUILDS: [u32; 2] = [39291, 40725];

// ---------------------------------------------------------------------------
// Layout selection
// ---------------------------------------------------------------------------

/// Fixed-part shape of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryLayout {
    /// 24-byte fixed part, no reserved field.
    A,
    /// 28-byte fixed part with a reserved u32 of unknown meaning.
    B,
}

impl EntryLayout {
    /// Pick the layout for a (version, build) pair.
    pub fn select(version: u32, build: u32) -> Self {
        if version == 7 || (version == 8 && LAYOUT_A_V8_BUILDS.contains(&build)) {
            Self::A
        } else {
            Self::B
        }
    }

    /// Size of the fixed part in bytes.
    pub fn fixed_len(self) -> usize {
        match self {
            Self::A => 24,
            Self::B => 28,
        }
    }
}

// ---------------------------------------------------------------------------
// Record status
// ---------------------------------------------------------------------------

/// Record status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum EntryStatus {
    AddUpdate = 1,
    Remove = 2,
    /// Also shows up for server-side tables to signal that something
    /// about them changed.
    RemoveHotfixes = 3,
    NotPublic = 4,
}

impl EntryStatus {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::AddUpdate),
            2 => Some(Self::Remove),
            3 => Some(Self::RemoveHotfixes),
            4 => Some(Self::NotPublic),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::AddUpdate => "Add/Update Record",
            Self::Remove => "Remove Record",
            Self::RemoveHotfixes => "Remove Hotfixes",
            Self::NotPublic => "Not Public",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// Raw record
// ---------------------------------------------------------------------------

/// One decoded record, before table-name resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    /// Push/group identifier; `-1` marks a cache entry.
    pub push_id: i32,
    /// Reserved field carried by Layout B; meaning unknown, preserved
    /// as-is. `None` under Layout A.
    pub reserved: Option<u32>,
    /// Raw 32-bit table identifier, resolved to a name separately.
    pub table_hash: u32,
    pub record_id: u32,
    pub status: EntryStatus,
    /// Verbatim payload bytes; may be empty.
    pub payload: Vec<u8>,
}

impl RawEntry {
    /// True when this record is a cache entry rather than a hotfix.
    #[inline]
    pub fn is_cache(&self) -> bool {
        self.push_id == -1
    }

    /// Decode one record at the cursor, advancing past the fixed part
    /// and the declared payload.
    pub fn decode(r: &mut ByteReader<'_>, layout: EntryLayout) -> Result<Self, DecodeError> {
        r.skip(4)?; // per-record signature, unused
        let push_id = r.i32_le()?;
        let reserved = match layout {
            EntryLayout::A => None,
            EntryLayout::B => Some(r.u32_le()?),
        };
        let table_hash = r.u32_le()?;
        let record_id = r.u32_le()?;
        let payload_size = r.u32_le()?;
        let status_offset = r.offset();
        let status_byte = r.u8()?;
        let status = EntryStatus::from_byte(status_byte).ok_or(DecodeError::UnknownStatus {
            offset: status_offset,
            status: status_byte,
        })?;
        r.skip(3)?; // padding
        let payload = r.take(payload_size as usize)?.to_vec();
        Ok(Self {
            push_id,
            reserved,
            table_hash,
            record_id,
            status,
            payload,
        })
    }

    /// Encode one record (used for fixtures and round-trip checks).
    pub fn encode(&self, layout: EntryLayout, out: &mut Vec<u8>) {
        out.extend_from_slice(&CACHE_MAGIC);
        out.extend_from_slice(&self.push_id.to_le_bytes());
        if layout == EntryLayout::B {
            out.extend_from_slice(&self.reserved.unwrap_or(0).to_le_bytes());
        }
        out.extend_from_slice(&self.table_hash.to_le_bytes());
        out.extend_from_slice(&self.record_id.to_le_bytes());
        out.extend_from_slice(&(self.payload.len() as u32).to_le_bytes());
        out.push(self.status.as_byte());
        out.extend_from_slice(&[0u8; 3]);
        out.extend_from_slice(&self.payload);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
