// Command-line interface for xfth.
//
// Subcommands cover a single scan, archived-build batch processing,
// header inspection, SStrHash computation, and snapshot maintenance.
// Report blocks go to stdout (one blank line between blocks); errors
// and stats go to stderr.

use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use crate::engine::{self, PassOutcome};
use crate::hash::{NameTable, sstr_hash};
use crate::snapshot::{self, SnapshotStore};

/// Default name-list file, one table name per line.
const DEFAULT_NAMES_FILE: &str = "db_files";

/// Default state directory for persisted snapshots.
const DEFAULT_STATE_DIR: &str = "cache";

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// DBCache.bin hotfix decoder and change tracker.
#[derive(Parser, Debug)]
#[command(
    name = "xfth",
    version,
    about = "DBCache.bin (XFTH) hotfix decoder and change tracker",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output pass stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Scan one DBCache.bin file and report new entries.
    Scan(ScanArgs),
    /// Scan archived DBCache.bin files under numeric build directories.
    Batch(BatchArgs),
    /// Print the header of a DBCache.bin file.
    Header(HeaderArgs),
    /// Compute the SStrHash of one or more table names.
    Hash(HashArgs),
    /// Drop malformed entries from persisted snapshots.
    Clean(CleanArgs),
}

#[derive(Args, Debug)]
struct StateArgs {
    /// Directory holding persisted snapshots.
    #[arg(long = "state-dir", value_hint = ValueHint::DirPath, default_value = DEFAULT_STATE_DIR)]
    state_dir: PathBuf,

    /// Table-name list, one name per line (default: ./db_files if present).
    #[arg(long, value_hint = ValueHint::FilePath)]
    names: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// DBCache.bin file to scan.
    #[arg(value_hint = ValueHint::FilePath)]
    file: PathBuf,

    #[command(flatten)]
    state: StateArgs,

    /// Run stateless: do not load or persist snapshots.
    #[arg(long = "no-state")]
    no_state: bool,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// Directory of archived builds (<dir>/<build>/DBCache.bin).
    #[arg(value_hint = ValueHint::DirPath)]
    dir: PathBuf,

    #[command(flatten)]
    state: StateArgs,
}

#[derive(Args, Debug)]
struct HeaderArgs {
    /// DBCache.bin file to inspect.
    #[arg(value_hint = ValueHint::FilePath)]
    file: PathBuf,
}

#[derive(Args, Debug)]
struct HashArgs {
    /// Table names to hash.
    #[arg(required = true)]
    names: Vec<String>,
}

#[derive(Args, Debug)]
struct CleanArgs {
    /// Directory holding persisted snapshots.
    #[arg(long = "state-dir", value_hint = ValueHint::DirPath, default_value = DEFAULT_STATE_DIR)]
    state_dir: PathBuf,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load_name_table(names: Option<&Path>) -> Result<NameTable, String> {
    match names {
        Some(path) => {
            NameTable::from_file(path).map_err(|e| format!("names file {}: {e}", path.display()))
        }
        None => {
            let default = Path::new(DEFAULT_NAMES_FILE);
            if default.exists() {
                NameTable::from_file(default)
                    .map_err(|e| format!("names file {DEFAULT_NAMES_FILE}: {e}"))
            } else {
                Ok(NameTable::new())
            }
        }
    }
}

fn print_outcome(outcome: &PassOutcome, quiet: bool, json_output: bool) {
    match outcome {
        PassOutcome::Unsupported { header } => {
            println!("Unsupported DBCache.bin file: {}", header.summary());
        }
        PassOutcome::Scanned {
            header,
            messages,
            summary,
        } => {
            if !quiet {
                eprintln!("checked {}", header.summary());
            }
            for message in messages {
                println!("{message}\n");
            }
            if json_output {
                let json = serde_json::json!({
                    "header": header.summary(),
                    "build": header.build,
                    "version": header.version,
                    "found": summary.found,
                    "known": summary.known,
                    "new_pushes": summary.new_pushes,
                    "new_hotfixes": summary.new_hotfixes,
                    "new_cached": summary.new_cached,
                    "old_pushes": summary.old_pushes,
                    "old_hotfixes": summary.old_hotfixes,
                });
                eprintln!("{}", serde_json::to_string_pretty(&json).unwrap());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Scan command
// ---------------------------------------------------------------------------

fn cmd_scan(args: &ScanArgs, quiet: bool, json_output: bool) -> i32 {
    let names = match load_name_table(args.state.names.as_deref()) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("xfth: {e}");
            return 1;
        }
    };

    let store;
    let store_ref = if args.no_state {
        None
    } else {
        store = SnapshotStore::new(&args.state.state_dir);
        Some(&store)
    };

    match engine::process_file(&args.file, &names, store_ref) {
        Ok(outcome) => {
            print_outcome(&outcome, quiet, json_output);
            0
        }
        Err(e) => {
            eprintln!("xfth: {}: {e}", args.file.display());
            1
        }
    }
}

// ---------------------------------------------------------------------------
// Batch command
// ---------------------------------------------------------------------------

fn cmd_batch(args: &BatchArgs, quiet: bool, json_output: bool) -> i32 {
    let names = match load_name_table(args.state.names.as_deref()) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("xfth: {e}");
            return 1;
        }
    };
    let store = SnapshotStore::new(&args.state.state_dir);

    let read_dir = match std::fs::read_dir(&args.dir) {
        Ok(rd) => rd,
        Err(e) => {
            eprintln!("xfth: {}: {e}", args.dir.display());
            return 1;
        }
    };

    // Numeric directory names are build numbers; process in build order.
    let mut builds: Vec<u32> = read_dir
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().to_str().and_then(|n| n.parse().ok()))
        .collect();
    builds.sort_unstable();

    if builds.is_empty() {
        eprintln!("xfth: no numeric build directories in {}", args.dir.display());
        return 1;
    }

    let mut failures = 0;
    for build in &builds {
        let path = args.dir.join(build.to_string()).join("DBCache.bin");
        if !quiet {
            eprintln!("checking build {build}");
        }
        match engine::process_file(&path, &names, Some(&store)) {
            Ok(outcome) => print_outcome(&outcome, quiet, json_output),
            Err(e) => {
                eprintln!("xfth: {}: {e}", path.display());
                failures += 1;
            }
        }
    }

    if failures > 0 { 1 } else { 0 }
}

// ---------------------------------------------------------------------------
// Header command
// ---------------------------------------------------------------------------

fn cmd_header(args: &HeaderArgs) -> i32 {
    let buffer = match std::fs::read(&args.file) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("xfth: {}: {e}", args.file.display());
            return 1;
        }
    };

    let mut r = crate::format::ByteReader::new(&buffer);
    match crate::format::CacheHeader::decode(&mut r) {
        Ok(header) => {
            println!("{}", header.summary());
            println!(
                "supported: {}",
                if header.is_supported() { "yes" } else { "no" }
            );
            0
        }
        Err(e) => {
            eprintln!("xfth: {}: {e}", args.file.display());
            1
        }
    }
}

// ---------------------------------------------------------------------------
// Hash command
// ---------------------------------------------------------------------------

fn cmd_hash(args: &HashArgs) -> i32 {
    for name in &args.names {
        println!("{} {name}", sstr_hash(name));
    }
    0
}

// ---------------------------------------------------------------------------
// Clean command
// ---------------------------------------------------------------------------

// Rewrites every snapshot in the state directory, dropping entries whose
// push id is below -1. Generally not needed unless an older tool version
// wrote bad data.
fn cmd_clean(args: &CleanArgs) -> i32 {
    let read_dir = match std::fs::read_dir(&args.state_dir) {
        Ok(rd) => rd,
        Err(e) => {
            eprintln!("xfth: {}: {e}", args.state_dir.display());
            return 1;
        }
    };

    let mut failures = 0;
    for dir_entry in read_dir.filter_map(|e| e.ok()) {
        let path = dir_entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("snap") {
            continue;
        }
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) => {
                eprintln!("xfth: {}: {e}", path.display());
                failures += 1;
                continue;
            }
        };
        let set = match snapshot::decode_set(&bytes) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("xfth: {}: {e}", path.display());
                failures += 1;
                continue;
            }
        };

        let before = set.len();
        let cleaned: snapshot::EntrySet = set.into_iter().filter(|e| e.push_id >= -1).collect();
        if cleaned.len() != before {
            println!(
                "{} {before} Entries -> {} Cleaned Entries",
                path.display(),
                cleaned.len()
            );
            let result = snapshot::encode_set(&cleaned).and_then(|bytes| {
                snapshot::write_atomic(&path, &bytes).map_err(snapshot::SnapshotError::from)
            });
            if let Err(e) = result {
                eprintln!("xfth: {}: {e}", path.display());
                failures += 1;
            }
        }
    }

    if failures > 0 { 1 } else { 0 }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("xfth".to_string())
        .chain(args.iter().cloned())
        .collect();
    let _ = Cli::try_parse_from(argv);
}

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();

    let default_filter = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (_, 0) => "warn",
        (_, 1) => "info",
        (_, _) => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let exit_code = match &cli.command {
        Cmd::Scan(args) => cmd_scan(args, cli.quiet, cli.json_output),
        Cmd::Batch(args) => cmd_batch(args, cli.quiet, cli.json_output),
        Cmd::Header(args) => cmd_header(args),
        Cmd::Hash(args) => cmd_hash(args),
        Cmd::Clean(args) => cmd_clean(args),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
