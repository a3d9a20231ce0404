use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, warn};

use crate::core::types::Crc32;
use crate::matching::scoring::ratio;
use crate::utils::checksum::checksum_of;

/// Default number of files whose CRC is checked when a ROM isn't found by name
pub const DEFAULT_CRC_SEARCH_LIMIT: usize = 10;

/// How many name-ranked files the CRC search may checksum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrcSearchLimit {
    /// Check at most this many files (0 disables the search)
    Limited(usize),
    /// Check every file in the directory
    Unlimited,
}

impl CrcSearchLimit {
    fn cap(self, available: usize) -> usize {
        match self {
            Self::Limited(n) => n.min(available),
            Self::Unlimited => available,
        }
    }
}

impl Default for CrcSearchLimit {
    fn default() -> Self {
        Self::Limited(DEFAULT_CRC_SEARCH_LIMIT)
    }
}

impl fmt::Display for CrcSearchLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limited(n) => write!(f, "{n}"),
            Self::Unlimited => write!(f, "none"),
        }
    }
}

impl FromStr for CrcSearchLimit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "unlimited" => Ok(Self::Unlimited),
            other => other
                .parse::<usize>()
                .map(Self::Limited)
                .map_err(|_| format!("expected a number or 'none', got '{s}'")),
        }
    }
}

/// A file considered during a CRC search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    /// Similarity of the file name to the expected ROM name
    pub score: u8,
}

/// Outcome of a CRC search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrcSearch {
    /// The first candidate whose CRC matched, if any
    pub found: Option<PathBuf>,
    /// How many candidates were checksummed
    pub checked: usize,
}

/// Rank the regular files in `dir` by name similarity to `expected_name`.
///
/// The full file name (extension included) is compared against the bare
/// ROM name. Files are listed in name order first so that equal scores are
/// ranked deterministically.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be read.
pub fn rank_candidates(dir: &Path, expected_name: &str) -> std::io::Result<Vec<Candidate>> {
    let mut files: Vec<(String, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        files.push((name, path));
    }
    files.sort();

    let mut ranked: Vec<Candidate> = files
        .into_iter()
        .map(|(name, path)| Candidate {
            score: ratio(&name, expected_name),
            path,
        })
        .collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    Ok(ranked)
}

/// Find a file in `dir` whose CRC matches `expected`.
///
/// Candidates are checked in similarity order, up to `limit` of them,
/// stopping at the first match. Files that cannot be read are skipped.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be listed.
pub fn find_by_checksum(
    dir: &Path,
    expected_name: &str,
    expected: Crc32,
    limit: CrcSearchLimit,
) -> std::io::Result<CrcSearch> {
    let ranked = rank_candidates(dir, expected_name)?;
    let take = limit.cap(ranked.len());
    debug!(
        "CRC search for '{expected_name}': checking {take} of {} file(s)",
        ranked.len()
    );

    let mut checked = 0;
    for candidate in ranked.into_iter().take(take) {
        checked += 1;
        match checksum_of(&candidate.path) {
            Ok(crc) if crc == expected => {
                debug!(
                    "CRC search matched {} (name score {}%)",
                    candidate.path.display(),
                    candidate.score
                );
                return Ok(CrcSearch {
                    found: Some(candidate.path),
                    checked,
                });
            }
            Ok(_) => {}
            Err(e) => warn!("Skipping CRC search candidate: {e}"),
        }
    }

    Ok(CrcSearch {
        found: None,
        checked,
    })
}
