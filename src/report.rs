// Report text assembly.
//
// Turns the diff engine's results into ordered, human-readable blocks:
// an optional Summary block, one block per push id with globally novel
// entries (ascending id order, decode order within a push), and one
// block for novel cache entries. Block order and wording track the
// downstream notification consumers, so changes here are user-visible.

use std::fmt::Write;

use crate::diff::DiffEngine;
use crate::snapshot::Entry;

fn push_word(n: usize) -> &'static str {
    if n == 1 { "push" } else { "pushes" }
}

fn entry_word(n: usize) -> &'static str {
    if n == 1 { "entry" } else { "entries" }
}

fn entry_line(s: &mut String, entry: &Entry) {
    let _ = writeln!(
        s,
        "  {} {} ({})",
        entry.table_name, entry.record_id, entry.status
    );
}

/// Build the ordered message blocks for one completed pass.
///
/// Returns one string per block, trailing whitespace trimmed. Empty when
/// nothing is new for this build.
pub fn messages(diff: &DiffEngine) -> Vec<String> {
    let mut messages = Vec::new();

    for (push_id, entries) in diff.new_hotfix_pushes() {
        let mut s = format!("Push ID {push_id}\n");
        for entry in entries {
            entry_line(&mut s, entry);
        }
        messages.push(s);
    }

    if !diff.new_cache_entries().is_empty() {
        let mut s = String::from("Cache Entries\n");
        for entry in diff.new_cache_entries() {
            entry_line(&mut s, entry);
        }
        messages.push(s);
    }

    let summary = diff.summary();
    let mut meta = String::new();

    if summary.new_pushes > 0 || summary.old_pushes > 0 {
        let _ = writeln!(
            meta,
            "  {}/{} hotfix entries known for this build found in DBCache.bin",
            summary.found, summary.known
        );
    }

    if summary.new_pushes > 0 {
        let _ = writeln!(
            meta,
            "  {} new hotfix {} with {} new {}",
            summary.new_pushes,
            push_word(summary.new_pushes),
            summary.new_hotfixes,
            entry_word(summary.new_hotfixes)
        );
    }

    // No details are emitted for already-known hotfixes, but it is still
    // useful to know when hotfixes from one build show up in another.
    if summary.old_pushes > 0 {
        let _ = writeln!(
            meta,
            "  {} hotfix {} with {} {} (old, but new for this build)",
            summary.old_pushes,
            push_word(summary.old_pushes),
            summary.old_hotfixes,
            entry_word(summary.old_hotfixes)
        );
    }

    if summary.new_cached > 0 {
        let _ = writeln!(
            meta,
            "  {} new cache {}",
            summary.new_cached,
            entry_word(summary.new_cached)
        );
    }

    if !meta.is_empty() {
        messages.insert(0, format!("Summary\n{meta}"));
    }

    for m in &mut messages {
        m.truncate(m.trim_end().len());
    }
    messages
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
