// Persisted entry sets.
//
// Four snapshots back the novelty detection: a hotfix set and a cache
// set scoped to the current build, and a global (`all`) pair spanning
// every build ever seen. Each is a deduplicated set of fully resolved
// entries, loaded before a pass and overwritten after a successful one.
//
// On-disk schema (little-endian, explicit version byte so future field
// additions cannot silently break compatibility):
//
//   u8  schema version (currently 1)
//   u32 entry count
//   per entry:
//     i32 push id
//     u8  status
//     u32 record id
//     u16 name length, then UTF-8 name bytes
//     u32 payload length, then payload bytes
//
// Saves replace the whole file via write-to-temp-then-rename so a crash
// mid-write never corrupts a previously valid snapshot.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use thiserror::Error;

use crate::format::{ByteReader, DecodeError, EntryStatus};

/// Schema version written at the start of every snapshot file.
pub const SNAPSHOT_VERSION: u8 = 1;

const SNAPSHOT_EXT: &str = "snap";

// ---------------------------------------------------------------------------
// Entry
// ---------------------------------------------------------------------------

/// A fully resolved record, as tracked across passes.
///
/// Identity is structural over all five fields, payload bytes included.
/// Two records with identical content are the same entry even when
/// decoded in different passes or from different files. The raw table
/// hash is deliberately not part of the identity; the resolved name is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entry {
    /// Push/group identifier; `-1` marks a cache entry.
    pub push_id: i32,
    /// Resolved table name, or the `unk_<hash>` placeholder.
    pub table_name: String,
    pub record_id: u32,
    pub status: EntryStatus,
    /// Opaque payload bytes; compared and hashed verbatim.
    pub payload: Vec<u8>,
}

impl Entry {
    /// True when this entry is a cache entry rather than a hotfix.
    #[inline]
    pub fn is_cache(&self) -> bool {
        self.push_id == -1
    }
}

/// Deduplicated collection of entries.
pub type EntrySet = HashSet<Entry>;

// ---------------------------------------------------------------------------
// Snapshot keys
// ---------------------------------------------------------------------------

/// Which of the two entry classes a snapshot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Hotfix,
    Cache,
}

/// Stable identity of one persisted snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKey {
    /// Scoped to one client build.
    Build { build: u32, kind: EntryKind },
    /// Global, spanning all builds.
    All { kind: EntryKind },
}

impl SnapshotKey {
    /// File name under the state directory.
    pub fn file_name(&self) -> String {
        match self {
            Self::Build {
                build,
                kind: EntryKind::Hotfix,
            } => format!("{build}.{SNAPSHOT_EXT}"),
            Self::Build {
                build,
                kind: EntryKind::Cache,
            } => format!("{build}cache.{SNAPSHOT_EXT}"),
            Self::All {
                kind: EntryKind::Hotfix,
            } => format!("all.{SNAPSHOT_EXT}"),
            Self::All {
                kind: EntryKind::Cache,
            } => format!("allcache.{SNAPSHOT_EXT}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for snapshot load/save.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O error: {0}")]
    Io(#[from] io::Error),
    /// The file exists but its bytes do not decode under the schema.
    /// Never silently treated as an empty set.
    #[error("corrupt snapshot: {0}")]
    Corrupt(String),
    /// An entry's table name does not fit the schema's u16 length field.
    #[error("table name of {len} bytes exceeds the snapshot limit of 65535")]
    NameTooLong { len: usize },
    #[error("unsupported snapshot schema version {found} (expected {SNAPSHOT_VERSION})")]
    UnsupportedVersion { found: u8 },
}

impl From<DecodeError> for SnapshotError {
    fn from(e: DecodeError) -> Self {
        Self::Corrupt(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Set codec
// ---------------------------------------------------------------------------

/// Smallest possible encoded entry: empty name, empty payload.
const MIN_ENTRY_LEN: usize = 15;

/// Serialize a set under the snapshot schema.
///
/// Entries are written in sorted order so byte-identical sets produce
/// byte-identical files. Table names are short identifiers; the schema
/// caps them at u16, and a longer name is an error rather than a
/// silently truncated length field.
pub fn encode_set(set: &EntrySet) -> Result<Vec<u8>, SnapshotError> {
    let mut entries: Vec<&Entry> = set.iter().collect();
    entries.sort();

    let mut out = Vec::new();
    out.push(SNAPSHOT_VERSION);
    out.extend_from_slice(&(entries.len() as u32).to_le_bytes());
    for entry in entries {
        let name_len = entry.table_name.len();
        if name_len > u16::MAX as usize {
            return Err(SnapshotError::NameTooLong { len: name_len });
        }
        out.extend_from_slice(&entry.push_id.to_le_bytes());
        out.push(entry.status.as_byte());
        out.extend_from_slice(&entry.record_id.to_le_bytes());
        out.extend_from_slice(&(name_len as u16).to_le_bytes());
        out.extend_from_slice(entry.table_name.as_bytes());
        out.extend_from_slice(&(entry.payload.len() as u32).to_le_bytes());
        out.extend_from_slice(&entry.payload);
    }
    Ok(out)
}

/// Deserialize a set under the snapshot schema.
pub fn decode_set(buf: &[u8]) -> Result<EntrySet, SnapshotError> {
    let mut r = ByteReader::new(buf);
    let version = r.u8()?;
    if version != SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion { found: version });
    }
    let count = r.u32_le()?;
    // The count is untrusted input; an impossible value must come back
    // as a corruption error, not drive the preallocation below.
    if count as u64 * MIN_ENTRY_LEN as u64 > r.remaining() as u64 {
        return Err(SnapshotError::Corrupt(format!(
            "entry count {count} exceeds the {} remaining byte(s)",
            r.remaining()
        )));
    }
    let mut set = EntrySet::with_capacity(count as usize);
    for _ in 0..count {
        let push_id = r.i32_le()?;
        let status_byte = r.u8()?;
        let status = EntryStatus::from_byte(status_byte)
            .ok_or_else(|| SnapshotError::Corrupt(format!("invalid status byte {status_byte}")))?;
        let record_id = r.u32_le()?;
        let name_len = r.u16_le()? as usize;
        let table_name = std::str::from_utf8(r.take(name_len)?)
            .map_err(|e| SnapshotError::Corrupt(format!("invalid table name: {e}")))?
            .to_string();
        let payload_len = r.u32_le()? as usize;
        let payload = r.take(payload_len)?.to_vec();
        set.insert(Entry {
            push_id,
            table_name,
            record_id,
            status,
            payload,
        });
    }
    if !r.is_empty() {
        return Err(SnapshotError::Corrupt(format!(
            "{} trailing byte(s) after last entry",
            r.remaining()
        )));
    }
    Ok(set)
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Snapshot files rooted at a state directory.
///
/// Single-writer, single-reader per snapshot: the calling driver is
/// responsible for serializing passes over the same state directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the snapshot file for a key.
    pub fn path_for(&self, key: SnapshotKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Load a snapshot; a missing file is the empty set.
    pub fn load(&self, key: SnapshotKey) -> Result<EntrySet, SnapshotError> {
        let path = self.path_for(key);
        let buf = match fs::read(&path) {
            Ok(buf) => buf,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no snapshot at {}, starting empty", path.display());
                return Ok(EntrySet::new());
            }
            Err(e) => return Err(e.into()),
        };
        decode_set(&buf).map_err(|e| {
            warn!("snapshot {} failed to decode: {e}", path.display());
            e
        })
    }

    /// Overwrite a snapshot with the full set.
    ///
    /// Creates the state directory on first save. The bytes go to a
    /// temp file in the same directory first and are renamed over the
    /// target, so the old snapshot survives a crash mid-write.
    pub fn save(&self, key: SnapshotKey, set: &EntrySet) -> Result<(), SnapshotError> {
        let bytes = encode_set(set)?;
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        write_atomic(&path, &bytes)?;
        debug!("saved {} entries to {}", set.len(), path.display());
        Ok(())
    }
}

/// Write `bytes` to `path` via a sibling temp file and rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
