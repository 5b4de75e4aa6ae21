// End-to-end pass tests: decode, diff against persisted snapshots,
// persist, report.
//
// These tests verify:
//   - The report scenarios (new push, cache entry, unsupported version)
//   - Idempotence: a second pass over identical input reports nothing
//   - Monotonicity: global snapshots never shrink
//   - Determinism: identical input and state yield identical text
//   - No snapshot mutation on decode failure

use std::path::Path;

use xfth::engine::{self, PassError, PassOutcome};
use xfth::format::{CACHE_MAGIC, CacheHeader, EntryLayout, EntryStatus, RawEntry};
use xfth::hash::{NameTable, sstr_hash};
use xfth::snapshot::{EntryKind, SnapshotKey, SnapshotStore};

// ===========================================================================
// Helpers
// ===========================================================================

fn build_file(version: u32, build: u32, entries: &[RawEntry]) -> Vec<u8> {
    let header = CacheHeader {
        magic: CACHE_MAGIC,
        version,
        build,
        verification_hash: [0; 32],
    };
    let mut buf = Vec::new();
    header.encode(&mut buf);
    let layout = EntryLayout::select(version, build);
    for e in entries {
        e.encode(layout, &mut buf);
    }
    buf
}

fn raw(push_id: i32, table_hash: u32, record_id: u32, payload: &[u8]) -> RawEntry {
    RawEntry {
        push_id,
        reserved: None,
        table_hash,
        record_id,
        status: EntryStatus::AddUpdate,
        payload: payload.to_vec(),
    }
}

fn scan(buf: &[u8], names: &NameTable, dir: &Path) -> PassOutcome {
    let store = SnapshotStore::new(dir);
    engine::run_pass(buf, names, Some(&store)).unwrap()
}

fn scanned_messages(outcome: PassOutcome) -> Vec<String> {
    match outcome {
        PassOutcome::Scanned { messages, .. } => messages,
        other => panic!("expected a scanned outcome, got {other:?}"),
    }
}

// ===========================================================================
// Report scenarios
// ===========================================================================

#[test]
fn new_hotfix_push_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let names = NameTable::from_names(["ItemSparse"]);
    let hash = sstr_hash("ItemSparse");

    let buf = build_file(7, 12345, &[raw(5, hash, 123, b"")]);
    let messages = scanned_messages(scan(&buf, &names, dir.path()));

    assert_eq!(messages.len(), 2);
    assert!(messages[0].starts_with("Summary"));
    assert!(messages[0].contains("1 new hotfix push with 1 new entry"));
    let push_block = &messages[1];
    assert!(push_block.starts_with("Push ID 5"));
    assert!(push_block.ends_with("ItemSparse 123 (Add/Update Record)"));
}

#[test]
fn cache_entry_reported_only_under_cache_block() {
    let dir = tempfile::tempdir().unwrap();
    let names = NameTable::new();

    let buf = build_file(7, 1, &[raw(-1, 99, 7, b"blob")]);
    let messages = scanned_messages(scan(&buf, &names, dir.path()));

    assert!(messages.iter().any(|m| m.starts_with("Cache Entries")));
    assert!(!messages.iter().any(|m| m.contains("Push ID")));
}

#[test]
fn unsupported_version_produces_header_only() {
    let dir = tempfile::tempdir().unwrap();
    let buf = build_file(99, 54321, &[]);

    let store = SnapshotStore::new(dir.path());
    let outcome = engine::run_pass(&buf, &NameTable::new(), Some(&store)).unwrap();
    match outcome {
        PassOutcome::Unsupported { header } => {
            assert_eq!(header.summary(), "XFTH v99 54321");
        }
        other => panic!("expected unsupported, got {other:?}"),
    }

    // No snapshot files may appear for an unsupported pass.
    assert!(!dir.path().join("all.snap").exists());
    assert!(!dir.path().join("54321.snap").exists());
}

#[test]
fn resolved_and_placeholder_names_mix() {
    let dir = tempfile::tempdir().unwrap();
    let names = NameTable::from_names(["SpellEffect"]);

    let buf = build_file(
        7,
        2,
        &[
            raw(1, sstr_hash("SpellEffect"), 10, b""),
            raw(1, 0xABCDEF, 11, b""),
        ],
    );
    let messages = scanned_messages(scan(&buf, &names, dir.path()));
    let block = messages.iter().find(|m| m.starts_with("Push ID 1")).unwrap();
    assert!(block.contains("SpellEffect 10"));
    assert!(block.contains(&format!("unk_{} 11", 0xABCDEFu32)));
}

// ===========================================================================
// Cross-run semantics
// ===========================================================================

#[test]
fn second_pass_over_identical_input_is_quiet() {
    let dir = tempfile::tempdir().unwrap();
    let names = NameTable::new();
    let buf = build_file(7, 100, &[raw(1, 10, 1, b"a"), raw(-1, 20, 2, b"b")]);

    let first = scanned_messages(scan(&buf, &names, dir.path()));
    assert!(!first.is_empty());

    let second = scanned_messages(scan(&buf, &names, dir.path()));
    assert!(second.is_empty(), "second pass reported: {second:?}");
}

#[test]
fn global_sets_never_shrink() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());
    let names = NameTable::new();
    let all_key = SnapshotKey::All {
        kind: EntryKind::Hotfix,
    };

    let mut sizes = Vec::new();
    for (build, id) in [(100, 1), (101, 2), (100, 1), (102, 3)] {
        let buf = build_file(7, build, &[raw(1, 10, id, b"")]);
        engine::run_pass(&buf, &names, Some(&store)).unwrap();
        sizes.push(store.load(all_key).unwrap().len());
    }

    for w in sizes.windows(2) {
        assert!(w[1] >= w[0], "global set shrank: {sizes:?}");
    }
    assert_eq!(*sizes.last().unwrap(), 3);
}

#[test]
fn recurrence_across_builds_counted_not_reported() {
    let dir = tempfile::tempdir().unwrap();
    let names = NameTable::new();

    // Same hotfix content first seen in build 100, then in build 200.
    let buf_a = build_file(7, 100, &[raw(4, 10, 1, b"same")]);
    scan(&buf_a, &names, dir.path());

    let buf_b = build_file(7, 200, &[raw(4, 10, 1, b"same")]);
    let messages = scanned_messages(scan(&buf_b, &names, dir.path()));

    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("1 hotfix push with 1 entry (old, but new for this build)"));
    assert!(!messages.iter().any(|m| m.starts_with("Push ID")));
}

#[test]
fn reports_are_deterministic() {
    let names = NameTable::from_names(["ItemSparse", "SpellEffect"]);
    let buf = build_file(
        8,
        45000,
        &[
            RawEntry {
                reserved: Some(7),
                ..raw(9, sstr_hash("SpellEffect"), 3, b"zz")
            },
            RawEntry {
                reserved: Some(8),
                ..raw(2, sstr_hash("ItemSparse"), 1, b"")
            },
            RawEntry {
                reserved: Some(9),
                ..raw(-1, 55, 2, b"c")
            },
        ],
    );

    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();
    let first = scanned_messages(scan(&buf, &names, dir_a.path()));
    let second = scanned_messages(scan(&buf, &names, dir_b.path()));
    assert_eq!(first, second);

    // Push blocks ascend by id regardless of decode order.
    let p2 = first.iter().position(|m| m.starts_with("Push ID 2")).unwrap();
    let p9 = first.iter().position(|m| m.starts_with("Push ID 9")).unwrap();
    assert!(p2 < p9);
}

// ===========================================================================
// Failure handling
// ===========================================================================

#[test]
fn decode_error_leaves_snapshots_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());
    let names = NameTable::new();
    let all_key = SnapshotKey::All {
        kind: EntryKind::Hotfix,
    };

    // Seed state with one good pass.
    let good = build_file(7, 100, &[raw(1, 10, 1, b"")]);
    engine::run_pass(&good, &names, Some(&store)).unwrap();
    let before = store.load(all_key).unwrap();

    // A second file truncated mid-record must abort without persisting.
    let mut bad = build_file(7, 100, &[raw(1, 10, 2, b"payload")]);
    bad.truncate(bad.len() - 3);
    let err = engine::run_pass(&bad, &names, Some(&store)).unwrap_err();
    assert!(matches!(err, PassError::Decode(_)));

    assert_eq!(store.load(all_key).unwrap(), before);
}

#[test]
fn snapshot_with_absurd_entry_count_is_an_error_not_an_abort() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());
    // Valid schema byte followed by an entry count of u32::MAX and no
    // entry bytes at all.
    std::fs::write(dir.path().join("all.snap"), [1, 0xFF, 0xFF, 0xFF, 0xFF]).unwrap();

    let buf = build_file(7, 100, &[raw(1, 10, 1, b"")]);
    let err = engine::run_pass(&buf, &NameTable::new(), Some(&store)).unwrap_err();
    assert!(matches!(err, PassError::Snapshot(_)));
}

#[test]
fn corrupt_snapshot_surfaces_as_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());
    std::fs::write(dir.path().join("all.snap"), b"not a snapshot").unwrap();

    let buf = build_file(7, 100, &[raw(1, 10, 1, b"")]);
    let err = engine::run_pass(&buf, &NameTable::new(), Some(&store)).unwrap_err();
    assert!(matches!(err, PassError::Snapshot(_)));
}
