// Cross-run novelty detection.
//
// Every decoded entry lands in four overlapping sets: a hotfix or cache
// set scoped to the current build, and the matching global set. An
// entry absent from the global set before this pass is "new"; an entry
// absent only from the build set recurs from another build and is
// counted but not re-reported.

use std::collections::BTreeMap;

use crate::snapshot::{Entry, EntrySet};

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Feeds decoded entries into the four persisted sets and tracks which
/// are newly seen relative to the pre-pass snapshots.
///
/// Push-indexed novelty lists use `BTreeMap` so report blocks come out
/// in ascending push-id order; within a push, entries keep decode order.
#[derive(Debug, Default)]
pub struct DiffEngine {
    build_hotfix: EntrySet,
    build_cache: EntrySet,
    all_hotfix: EntrySet,
    all_cache: EntrySet,

    // Entries seen during this pass only.
    seen_hotfix: EntrySet,
    seen_cache: EntrySet,

    // Globally novel entries (absent from the all-* snapshots).
    new_hotfix: BTreeMap<i32, Vec<Entry>>,
    new_cache: Vec<Entry>,

    // Entries novel to this build's snapshots (superset of the global
    // lists; the difference is the recurrence accounting).
    new_build_hotfix: BTreeMap<i32, Vec<Entry>>,
    new_build_cache: Vec<Entry>,
}

/// Counts derived after the full buffer has been consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiffSummary {
    /// Hotfix entries decoded from this file (deduplicated).
    pub found: usize,
    /// Hotfix entries known for this build after the pass.
    pub known: usize,
    /// Distinct push ids with at least one globally novel entry.
    pub new_pushes: usize,
    /// Globally novel hotfix entries.
    pub new_hotfixes: usize,
    /// Globally novel cache entries.
    pub new_cached: usize,
    /// Push ids novel to this build but already known from another.
    pub old_pushes: usize,
    /// Hotfix entries novel to this build but already known from another.
    pub old_hotfixes: usize,
}

impl DiffSummary {
    /// True when there is nothing worth reporting.
    pub fn is_quiet(&self) -> bool {
        self.new_pushes == 0 && self.old_pushes == 0 && self.new_cached == 0
    }
}

impl DiffEngine {
    /// Start a pass from the four pre-pass snapshots.
    pub fn new(
        build_hotfix: EntrySet,
        build_cache: EntrySet,
        all_hotfix: EntrySet,
        all_cache: EntrySet,
    ) -> Self {
        Self {
            build_hotfix,
            build_cache,
            all_hotfix,
            all_cache,
            ..Self::default()
        }
    }

    /// Classify and record one decoded entry.
    pub fn record(&mut self, entry: Entry) {
        if entry.is_cache() {
            self.seen_cache.insert(entry.clone());
            if self.all_cache.insert(entry.clone()) {
                self.new_cache.push(entry.clone());
            }
            if self.build_cache.insert(entry.clone()) {
                self.new_build_cache.push(entry);
            }
        } else {
            self.seen_hotfix.insert(entry.clone());
            if self.all_hotfix.insert(entry.clone()) {
                self.new_hotfix
                    .entry(entry.push_id)
                    .or_default()
                    .push(entry.clone());
            }
            if self.build_hotfix.insert(entry.clone()) {
                self.new_build_hotfix
                    .entry(entry.push_id)
                    .or_default()
                    .push(entry);
            }
        }
    }

    /// Globally novel hotfix entries, grouped by push id in ascending order.
    pub fn new_hotfix_pushes(&self) -> &BTreeMap<i32, Vec<Entry>> {
        &self.new_hotfix
    }

    /// Globally novel cache entries, in decode order.
    pub fn new_cache_entries(&self) -> &[Entry] {
        &self.new_cache
    }

    // Post-pass contents of the four sets, for persistence.

    pub fn build_hotfix(&self) -> &EntrySet {
        &self.build_hotfix
    }

    pub fn build_cache(&self) -> &EntrySet {
        &self.build_cache
    }

    pub fn all_hotfix(&self) -> &EntrySet {
        &self.all_hotfix
    }

    pub fn all_cache(&self) -> &EntrySet {
        &self.all_cache
    }

    /// Derive the pass counts.
    pub fn summary(&self) -> DiffSummary {
        let new_pushes = self.new_hotfix.len();
        let new_hotfixes: usize = self.new_hotfix.values().map(Vec::len).sum();
        let build_new_hotfixes: usize = self.new_build_hotfix.values().map(Vec::len).sum();
        DiffSummary {
            found: self.seen_hotfix.len(),
            known: self.build_hotfix.len(),
            new_pushes,
            new_hotfixes,
            new_cached: self.new_cache.len(),
            old_pushes: self.new_build_hotfix.len().saturating_sub(new_pushes),
            old_hotfixes: build_new_hotfixes.saturating_sub(new_hotfixes),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
