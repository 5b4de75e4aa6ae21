// One full decode pass over a DBCache.bin buffer.
//
// Pipeline: header -> (if supported) record loop -> name resolution ->
// diff engine -> snapshot persistence -> report blocks. The pass is
// single-threaded and fully synchronous; callers serialize passes over
// the same state directory.
//
// Persistence happens only after the whole buffer decoded cleanly. A
// truncated or malformed record stream aborts the pass with no snapshot
// mutation, so a partially written cache file is never mistaken for a
// complete one.

use std::path::Path;

use log::{debug, info, warn};
use thiserror::Error;

use crate::diff::{DiffEngine, DiffSummary};
use crate::format::{ByteReader, CacheHeader, DecodeError, EntryLayout, RawEntry};
use crate::hash::NameTable;
use crate::report;
use crate::snapshot::{Entry, EntryKind, SnapshotError, SnapshotKey, SnapshotStore};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for a decode pass.
///
/// `Decode` aborts only the current pass; the caller (typically a file
/// watcher) logs it and keeps running.
#[derive(Debug, Error)]
pub enum PassError {
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Result of one completed pass.
#[derive(Debug)]
pub enum PassOutcome {
    /// Unknown magic or version: nothing was decoded and no snapshot was
    /// touched. Only the header summary is available.
    Unsupported { header: CacheHeader },
    /// The full buffer decoded; snapshots are persisted and the report
    /// blocks are ready for the notification collaborator.
    Scanned {
        header: CacheHeader,
        messages: Vec<String>,
        summary: DiffSummary,
    },
}

impl PassOutcome {
    pub fn header(&self) -> &CacheHeader {
        match self {
            Self::Unsupported { header } | Self::Scanned { header, .. } => header,
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Scanned { .. })
    }
}

// ---------------------------------------------------------------------------
// Pass
// ---------------------------------------------------------------------------

/// Run one pass over an in-memory cache file.
///
/// With `store = None` the pass runs stateless: every entry in the file
/// counts as new and nothing is persisted.
pub fn run_pass(
    buffer: &[u8],
    names: &NameTable,
    store: Option<&SnapshotStore>,
) -> Result<PassOutcome, PassError> {
    let mut r = ByteReader::new(buffer);
    let header = CacheHeader::decode(&mut r)?;
    if !header.is_supported() {
        warn!("unsupported cache file: {}", header.summary());
        return Ok(PassOutcome::Unsupported { header });
    }
    debug!("decoding {} ({} bytes)", header.summary(), buffer.len());

    let build_hotfix_key = SnapshotKey::Build {
        build: header.build,
        kind: EntryKind::Hotfix,
    };
    let build_cache_key = SnapshotKey::Build {
        build: header.build,
        kind: EntryKind::Cache,
    };
    let all_hotfix_key = SnapshotKey::All {
        kind: EntryKind::Hotfix,
    };
    let all_cache_key = SnapshotKey::All {
        kind: EntryKind::Cache,
    };

    let mut diff = match store {
        Some(store) => DiffEngine::new(
            store.load(build_hotfix_key)?,
            store.load(build_cache_key)?,
            store.load(all_hotfix_key)?,
            store.load(all_cache_key)?,
        ),
        None => DiffEngine::default(),
    };

    let layout = EntryLayout::select(header.version, header.build);
    while !r.is_empty() {
        let raw = RawEntry::decode(&mut r, layout)?;
        let table_name = names.resolve(raw.table_hash).into_owned();
        diff.record(Entry {
            push_id: raw.push_id,
            table_name,
            record_id: raw.record_id,
            status: raw.status,
            payload: raw.payload,
        });
    }

    // The whole buffer decoded; now it is safe to persist.
    if let Some(store) = store {
        store.save(build_hotfix_key, diff.build_hotfix())?;
        store.save(build_cache_key, diff.build_cache())?;
        store.save(all_hotfix_key, diff.all_hotfix())?;
        store.save(all_cache_key, diff.all_cache())?;
    }

    let summary = diff.summary();
    info!(
        "pass complete for build {}: {} new hotfixes in {} pushes, {} new cache entries",
        header.build, summary.new_hotfixes, summary.new_pushes, summary.new_cached
    );

    let messages = report::messages(&diff);
    Ok(PassOutcome::Scanned {
        header,
        messages,
        summary,
    })
}

/// Read a cache file from disk and run one pass over it.
pub fn process_file(
    path: &Path,
    names: &NameTable,
    store: Option<&SnapshotStore>,
) -> Result<PassOutcome, PassError> {
    let buffer = std::fs::read(path)?;
    run_pass(&buffer, names, store)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
