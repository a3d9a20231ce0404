use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::Args;
use tracing::info;

use crate::catalog::store::Catalog;
use crate::cli::report;
use crate::cli::OutputFormat;
use crate::matching::candidates::CrcSearchLimit;
use crate::matching::search::{all_entries, search_catalog, SearchError};
use crate::patching::BuiltinEngine;
use crate::pipeline::fetch::{patch_url, HttpFetcher, DEFAULT_PATCH_BASE_URL};
use crate::pipeline::{PipelineConfig, RunConfig, RunController};

#[derive(Args)]
pub struct RunArgs {
    /// Name of the ROM set, e.g. "SNES" (needs a matching catalog in the database directory)
    pub set_id: String,

    /// ROM set directory containing the original dumps
    #[arg(required_unless_present = "download_only")]
    pub in_dir: Option<PathBuf>,

    /// Target directory for patched ROMs (defaults to IN_DIR)
    pub out_dir: Option<PathBuf>,

    /// Only apply patches whose name fuzzily matches PATTERN
    #[arg(long, value_name = "PATTERN")]
    pub search: Option<String>,

    /// Stop processing the catalog after the first failed patch
    #[arg(long = "stoponerror")]
    pub stop_on_error: bool,

    /// Maximum number of files whose CRC is checked to find a renamed ROM
    /// (0 disables the search, "none" checks every file)
    #[arg(long = "crcsearchlimit", value_name = "N", default_value = "10")]
    pub crc_search_limit: CrcSearchLimit,

    /// Download and verify patches, but do not apply them
    #[arg(long = "downloadonly")]
    pub download_only: bool,

    /// Skip the CRC check of patched ROMs
    #[arg(long)]
    pub no_final_check: bool,

    /// Directory holding the set catalogs (<SET_ID>.xml, <SET_ID>.json or <SET_ID>.json.gz)
    #[arg(long, default_value = "database")]
    pub database_dir: PathBuf,

    /// Directory patches are stored in, one subdirectory per set
    #[arg(long, default_value = "patches")]
    pub patch_dir: PathBuf,

    /// Base URL patches are downloaded from
    #[arg(long, default_value = DEFAULT_PATCH_BASE_URL)]
    pub patch_url: String,
}

/// Execute a patch run
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded, the input directory is
/// missing, or an output directory cannot be created. Failures of individual
/// entries are reported, not returned.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: RunArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let started_at = Utc::now();

    let catalog = Catalog::load_for_set(&args.database_dir, &args.set_id)
        .with_context(|| format!("cannot load the catalog for set \"{}\"", args.set_id))?;

    if let Some(dir) = &args.in_dir {
        if !dir.is_dir() {
            anyhow::bail!("set directory \"{}\" not found", dir.display());
        }
    }

    let out_dir = match (&args.out_dir, &args.in_dir) {
        (Some(out), _) => out.clone(),
        (None, Some(in_dir)) => {
            info!("Using {} as output directory", in_dir.display());
            in_dir.clone()
        }
        (None, None) => PathBuf::from("."),
    };
    let patch_dir = args.patch_dir.join(&args.set_id);

    if !args.download_only {
        fs::create_dir_all(&out_dir)
            .with_context(|| format!("cannot create {}", out_dir.display()))?;
    }
    fs::create_dir_all(&patch_dir)
        .with_context(|| format!("cannot create {}", patch_dir.display()))?;

    if verbose {
        eprintln!(
            "Loaded catalog \"{}\" with {} entries",
            catalog.header.name,
            catalog.len()
        );
    }

    if format == OutputFormat::Text {
        report::print_header(&catalog.header);
    }

    let working_set = match &args.search {
        Some(query) => match search_catalog(&catalog.entries, query) {
            Ok(set) => set,
            Err(SearchError::TooVague {
                query,
                best_score,
                suggestions,
            }) => {
                return report::print_suggestions(&query, best_score, &suggestions, format);
            }
        },
        None => all_entries(&catalog.entries),
    };

    if verbose {
        eprintln!("Working set: {} entries", working_set.len());
    }

    let rom_extension = catalog.rom_extension(&args.set_id);
    let pipeline_config = PipelineConfig {
        rom_extension: rom_extension.clone(),
        set_id: args.set_id.clone(),
        patch_dir: patch_dir.clone(),
        rom_dir: args.in_dir.clone(),
        out_dir: out_dir.clone(),
        patch_base_url: args.patch_url.clone(),
        download_only: args.download_only,
        verify_output: !args.no_final_check,
        crc_search_limit: args.crc_search_limit,
    };
    let run_config = RunConfig {
        stop_on_error: args.stop_on_error,
    };

    let fetcher = HttpFetcher::new()?;
    let controller = RunController::new(pipeline_config, run_config, &BuiltinEngine, &fetcher);

    // Patches missing before the run are the ones fetched from the mirror
    let local_patches: HashSet<&str> = working_set
        .iter()
        .filter(|scored| patch_dir.join(scored.entry.patch_file_name()).is_file())
        .map(|scored| scored.entry.name.as_str())
        .collect();

    let search_active = args.search.is_some();
    let mut entry_values = Vec::new();
    let run_report = controller.run(&working_set, |scored, outcome| {
        let entry = scored.entry;
        let paths = report::EntryPaths {
            patch_file: patch_dir.join(entry.patch_file_name()),
            patch_url: if local_patches.contains(entry.name.as_str()) {
                None
            } else {
                patch_url(&args.patch_url, &args.set_id, &entry.patch_file_name())
                    .ok()
                    .map(|url| url.to_string())
            },
            out_file: (!args.download_only)
                .then(|| out_dir.join(entry.output_file_name(&rom_extension))),
        };
        match format {
            OutputFormat::Text => {
                report::print_entry(scored, outcome, &paths, search_active);
            }
            OutputFormat::Json => {
                entry_values.push(report::entry_json(scored, outcome, &paths));
            }
        }
    });

    match format {
        OutputFormat::Text => {
            if run_report.halted {
                eprintln!("stopped on error");
            }
            report::print_errors(&run_report);
        }
        OutputFormat::Json => {
            let summary = report::RunSummary {
                set_id: &args.set_id,
                header: &catalog.header,
                started_at,
                finished_at: Utc::now(),
            };
            report::print_json_report(&summary, entry_values, &run_report)?;
        }
    }

    Ok(())
}
