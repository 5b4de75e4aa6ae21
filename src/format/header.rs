// DBCache.bin file header.
//
// Fixed 44-byte layout, little-endian:
//
//   | Offset | Field             | Size |
//   |--------|-------------------|------|
//   | 0      | magic (`XFTH`)    | 4    |
//   | 4      | version           | 4    |
//   | 8      | build             | 4    |
//   | 12     | verification hash | 32   |
//
// Records follow from offset 44 to the end of the file.

use super::{ByteReader, DecodeError};

/// Magic tag at the start of every DBCache.bin file.
pub const CACHE_MAGIC: [u8; 4] = *b"XFTH";

/// Total header size in bytes.
pub const HEADER_LEN: usize = 44;

/// Format versions this crate knows how to decode.
///
/// Version 9 files exist in the wild but use a wider record layout and
/// are reported as unsupported rather than misparsed.
pub const SUPPORTED_VERSIONS: [u32; 2] = [7, 8];

// ---------------------------------------------------------------------------
// File header
// ---------------------------------------------------------------------------

/// Parsed DBCache.bin header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheHeader {
    /// Magic tag; `XFTH` for well-formed files.
    pub magic: [u8; 4],
    /// Format version.
    pub version: u32,
    /// Client build that produced the file. Keys the per-build snapshots
    /// and selects the record layout for version 8.
    pub build: u32,
    /// Opaque verification hash; carried but not interpreted.
    pub verification_hash: [u8; 32],
}

impl CacheHeader {
    /// Decode the header, advancing the cursor by `HEADER_LEN`.
    pub fn decode(r: &mut ByteReader<'_>) -> Result<Self, DecodeError> {
        let magic = r.array::<4>()?;
        let version = r.u32_le()?;
        let build = r.u32_le()?;
        let verification_hash = r.array::<32>()?;
        Ok(Self {
            magic,
            version,
            build,
            verification_hash,
        })
    }

    /// Encode the header (used for fixtures and round-trip checks).
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.magic);
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&self.build.to_le_bytes());
        out.extend_from_slice(&self.verification_hash);
    }

    /// True iff the magic matches and the version is one this crate decodes.
    ///
    /// Record decoding is skipped entirely for unsupported files; only the
    /// `summary()` string is produced.
    pub fn is_supported(&self) -> bool {
        self.magic == CACHE_MAGIC && SUPPORTED_VERSIONS.contains(&self.version)
    }

    /// One-line header description, e.g. `XFTH v7 12345`.
    pub fn summary(&self) -> String {
        format!(
            "{} v{} {}",
            String::from_utf8_lossy(&self.magic),
            self.version,
            self.build
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
