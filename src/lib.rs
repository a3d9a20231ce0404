//! # rom-bulk-patcher
//!
//! A library for applying a database of translation patches to a ROM set.
//!
//! Fan translations are distributed as BPS or IPS patches against a specific
//! dump of the original game. A catalog lists, for each patch, the CRC32 of
//! the untranslated ROM, of the patch file and of the patched result.
//! `rom-bulk-patcher` walks the catalog, fetches missing patches, locates each
//! base ROM (by name, or by checksum when it was renamed) and writes patched
//! copies, refusing to go on whenever a checksum disagrees.
//!
//! ## Features
//!
//! - **Three checksum gates**: patch, base ROM and output are each verified
//! - **Fuzzy selection**: `--search` picks entries by approximate name
//! - **Renamed ROMs**: similarly named files are checksummed to find a match
//! - **BPS and IPS**: applied in-process, no external tools
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use rom_bulk_patcher::matching::search::all_entries;
//! use rom_bulk_patcher::patching::BuiltinEngine;
//! use rom_bulk_patcher::pipeline::{HttpFetcher, PipelineConfig, RunConfig, RunController};
//! use rom_bulk_patcher::Catalog;
//!
//! let catalog = Catalog::load_for_set(Path::new("database"), "SNES").unwrap();
//! let config = PipelineConfig {
//!     set_id: "SNES".to_string(),
//!     patch_dir: "patches/SNES".into(),
//!     rom_dir: Some("roms".into()),
//!     out_dir: "out".into(),
//!     rom_extension: catalog.rom_extension("SNES"),
//!     ..PipelineConfig::default()
//! };
//!
//! let fetcher = HttpFetcher::new().unwrap();
//! let controller = RunController::new(config, RunConfig::default(), &BuiltinEngine, &fetcher);
//! let report = controller.run(&all_entries(&catalog.entries), |scored, outcome| {
//!     println!("{}: {}", scored.entry.name, outcome.describe());
//! });
//! println!("{} patched, {} failed", report.patched, report.failures.len());
//! ```
//!
//! ## Modules
//!
//! - [`catalog`]: Catalog loading and validation
//! - [`core`]: Catalog entries, checksums and outcomes
//! - [`matching`]: Name similarity, catalog search and ROM candidate search
//! - [`patching`]: BPS and IPS patch engines
//! - [`pipeline`]: Per-entry resolution and the run controller
//! - [`utils`]: Streaming CRC32 and input validation
//! - [`cli`]: Command-line interface implementation

pub mod catalog;
pub mod cli;
pub mod core;
pub mod matching;
pub mod patching;
pub mod pipeline;
pub mod utils;

// Re-export commonly used types for convenience
pub use catalog::store::Catalog;
pub use core::entry::CatalogEntry;
pub use core::outcome::{PipelineError, ResolutionOutcome, RunReport};
pub use core::types::*;
pub use patching::{BuiltinEngine, PatchEngine};
pub use pipeline::{PipelineConfig, ResolutionPipeline, RunConfig, RunController};
