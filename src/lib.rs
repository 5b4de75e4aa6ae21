//! Xfth: DBCache.bin (XFTH) hotfix decoder and cross-build change tracker.
//!
//! The crate provides:
//! - A binary decoder for the versioned DBCache record format (`format`)
//! - SStrHash table-name resolution (`hash`)
//! - Persistent novelty detection across runs (`snapshot`, `diff`)
//! - Report text assembly (`report`) and a one-shot pass driver (`engine`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```no_run
//! use xfth::engine::{self, PassOutcome};
//! use xfth::hash::NameTable;
//! use xfth::snapshot::SnapshotStore;
//!
//! let buffer = std::fs::read("DBCache.bin").unwrap();
//! let names = NameTable::from_names(["ItemSparse", "SpellEffect"]);
//! let store = SnapshotStore::new("cache");
//!
//! match engine::run_pass(&buffer, &names, Some(&store)).unwrap() {
//!     PassOutcome::Scanned { messages, .. } => {
//!         for message in messages {
//!             println!("{message}\n");
//!         }
//!     }
//!     PassOutcome::Unsupported { header } => {
//!         eprintln!("unsupported file: {}", header.summary());
//!     }
//! }
//! ```

pub mod diff;
pub mod engine;
pub mod format;
pub mod hash;
pub mod report;
pub mod snapshot;

#[cfg(feature = "cli")]
pub mod cli;
