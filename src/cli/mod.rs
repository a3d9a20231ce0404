//! Command-line interface for rom-bulk-patcher.
//!
//! A single command patches every catalog entry of a ROM set (or the subset
//! picked by `--search`) and prints one status block per entry, followed by
//! the list of failures.
//!
//! ## Usage
//!
//! ```text
//! # Patch every SNES ROM in ./roms, writing results next to them
//! rom-bulk-patcher SNES ./roms
//!
//! # Only entries whose name starts like "seiken", into ./out
//! rom-bulk-patcher SNES ./roms ./out --search seiken
//!
//! # Fetch and verify patches without touching any ROM
//! rom-bulk-patcher "Gameboy Color" --downloadonly
//!
//! # JSON report for scripting
//! rom-bulk-patcher NES ./roms --format json
//! ```

use clap::Parser;

pub mod report;
pub mod run;

#[derive(Parser)]
#[command(name = "rom-bulk-patcher")]
#[command(author = "sklick, mibro")]
#[command(version)]
#[command(about = "Apply a translation patch database to a ROM set")]
#[command(
    long_about = "rom-bulk-patcher applies the translation patches listed in a set's catalog to the matching ROM dumps.\n\nFor every entry it:\n- Downloads the patch if it is not stored locally\n- Checks the patch, the original ROM and the patched output against the catalog's CRC32 values\n- Finds renamed ROMs by checksumming the most similarly named files"
)]
pub struct Cli {
    #[command(flatten)]
    pub args: run::RunArgs,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::CrcSearchLimit;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["rom-bulk-patcher", "SNES", "roms"]).unwrap();
        assert_eq!(cli.args.set_id, "SNES");
        assert_eq!(cli.args.crc_search_limit, CrcSearchLimit::Limited(10));
        assert!(cli.args.out_dir.is_none());
        assert!(!cli.args.stop_on_error);
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn test_in_dir_required_unless_download_only() {
        assert!(Cli::try_parse_from(["rom-bulk-patcher", "SNES"]).is_err());
        let cli = Cli::try_parse_from(["rom-bulk-patcher", "SNES", "--downloadonly"]).unwrap();
        assert!(cli.args.download_only);
        assert!(cli.args.in_dir.is_none());
    }

    #[test]
    fn test_original_flag_spellings() {
        let cli = Cli::try_parse_from([
            "rom-bulk-patcher",
            "SNES",
            "in",
            "out",
            "--search",
            "mother",
            "--stoponerror",
            "--crcsearchlimit",
            "none",
            "--no-final-check",
            "-f",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.args.search.as_deref(), Some("mother"));
        assert!(cli.args.stop_on_error);
        assert_eq!(cli.args.crc_search_limit, CrcSearchLimit::Unlimited);
        assert!(cli.args.no_final_check);
        assert_eq!(cli.format, OutputFormat::Json);
    }
}
