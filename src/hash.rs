// SStrHash table-name hashing and hash -> name resolution.
//
// DBCache records identify tables by a 32-bit SStrHash of the table
// name. The algorithm is the classic Storm string hash: each input byte
// is uppercased (with `/` folded to `\`), then mixed into two u32
// accumulators through a fixed 16-entry constant table. A result of 0
// is reserved and remapped to 1.

use std::borrow::Cow;
use std::collections::HashMap;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Fixed mixing table; indexed by the high and low nibble of each byte.
const HASH_TABLE: [u32; 16] = [
    0x486E_26EE,
    0xDCAA_16B3,
    0xE191_8EEF,
    0x202D_AFDB,
    0x341C_7DC7,
    0x1C36_5303,
    0x40EF_2D37,
    0x65FD_5E49,
    0xD605_7177,
    0x904E_CE93,
    0x1C38_024F,
    0x98FD_323B,
    0xE306_1AE7,
    0xA39B_0FA1,
    0x9797_F25F,
    0xE444_4563,
];

const SEED_INIT: u32 = 0x7FED_7FED;
const SHIFT_INIT: u32 = 0xEEEE_EEEE;

#[inline]
fn normalize(b: u8) -> u8 {
    if b == b'/' {
        b'\\'
    } else {
        b.to_ascii_uppercase()
    }
}

/// Compute the SStrHash of a string.
///
/// Case-insensitive, and `/` hashes identically to `\`. Never returns 0:
/// the zero result is remapped to 1 (0 is the "no hash" sentinel).
pub fn sstr_hash(s: &str) -> u32 {
    let mut seed = SEED_INIT;
    let mut shift = SHIFT_INIT;
    for b in s.bytes() {
        let c = normalize(b) as u32;
        let diff = HASH_TABLE[(c >> 4) as usize].wrapping_sub(HASH_TABLE[(c & 0xF) as usize]);
        seed = diff ^ shift.wrapping_add(seed);
        shift = c
            .wrapping_add(seed)
            .wrapping_add(shift.wrapping_mul(33))
            .wrapping_add(3);
    }
    if seed == 0 { 1 } else { seed }
}

// ---------------------------------------------------------------------------
// Name table
// ---------------------------------------------------------------------------

/// Precomputed hash -> table-name mapping.
///
/// Built once from an externally supplied name list and passed into the
/// pass explicitly. An empty table is valid: every lookup then falls
/// back to the `unk_<hash>` placeholder.
///
/// Known limitation: SStrHash collisions among registered names are not
/// defended against; the last-registered name wins.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    by_hash: HashMap<u32, String>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from an iterator of names.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Self::new();
        for name in names {
            table.insert(name.as_ref());
        }
        table
    }

    /// Load a table from a file with one table name per line.
    /// Blank lines and surrounding whitespace are ignored.
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let reader = BufReader::new(std::fs::File::open(path)?);
        let mut table = Self::new();
        for line in reader.lines() {
            let line = line?;
            let name = line.trim();
            if !name.is_empty() {
                table.insert(name);
            }
        }
        Ok(table)
    }

    /// Register a name, returning its hash.
    pub fn insert(&mut self, name: &str) -> u32 {
        let hash = sstr_hash(name);
        self.by_hash.insert(hash, name.to_string());
        hash
    }

    /// Look up the registered name for a raw hash.
    pub fn get(&self, hash: u32) -> Option<&str> {
        self.by_hash.get(&hash).map(String::as_str)
    }

    /// Resolve a raw hash to a name, falling back to `unk_<decimal>`.
    ///
    /// Unresolved hashes are an expected, non-fatal degraded state, not
    /// an error.
    pub fn resolve(&self, hash: u32) -> Cow<'_, str> {
        match self.by_hash.get(&hash) {
            Some(name) => Cow::Borrowed(name.as_str()),
            None => Cow::Owned(format!("unk_{hash}")),
        }
    }

    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
