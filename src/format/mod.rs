// DBCache.bin (XFTH) binary format.
//
// A cache file is a fixed 44-byte header followed by a run of
// variable-length hotfix/cache records until the end of the buffer.
// All integers are little-endian.
//
// # Modules
//
// - `header`: file header decoding and the supported-version check
// - `entry`: per-record decoding (layout selection is build-dependent)

pub mod entry;
pub mod header;

// Re-export key types for convenience.
pub use entry::{EntryLayout, EntryStatus, RawEntry};
pub use header::{CACHE_MAGIC, CacheHeader, HEADER_LEN};

use thiserror::Error;

// ---------------------------------------------------------------------------
// Decode error
// ---------------------------------------------------------------------------

/// Error type for header and record decoding.
///
/// Any decode error is fatal for the current pass: a partially decoded
/// file must not be treated as complete.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The buffer ended before the field being read.
    #[error("truncated input: need {needed} byte(s) at offset {offset}, {remaining} left")]
    Truncated {
        offset: usize,
        needed: usize,
        remaining: usize,
    },
    /// A record carried a status byte outside the known range (1-4).
    #[error("unknown record status {status} at offset {offset}")]
    UnknownStatus { offset: usize, status: u8 },
}

// ---------------------------------------------------------------------------
// Byte reader
// ---------------------------------------------------------------------------

/// Cursor over an in-memory buffer.
///
/// All reads advance the cursor; overrunning the buffer yields
/// `DecodeError::Truncated` with the offending offset.
#[derive(Debug)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current cursor position from the start of the buffer.
    #[inline]
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// True when the cursor sits exactly at the end of the buffer.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pos == self.buf.len()
    }

    /// Take the next `n` bytes as a slice.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::Truncated {
                offset: self.pos,
                needed: n,
                remaining: self.remaining(),
            });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    /// Skip `n` bytes (padding).
    pub fn skip(&mut self, n: usize) -> Result<(), DecodeError> {
        self.take(n).map(|_| ())
    }

    /// Take the next `N` bytes as a fixed-size array.
    pub fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let b = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(b);
        Ok(out)
    }

    pub fn u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    pub fn u16_le(&mut self) -> Result<u16, DecodeError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn u32_le(&mut self) -> Result<u32, DecodeError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn i32_le(&mut self) -> Result<i32, DecodeError> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
