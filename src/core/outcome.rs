use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::Crc32;
use crate::patching::PatchError;
use crate::pipeline::fetch::FetchError;
use crate::utils::checksum::ChecksumError;

/// Why an entry could not be resolved
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("could not download patch from {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("patch CRC mismatch: expected {expected}, found {actual}")]
    PatchChecksum { expected: Crc32, actual: Crc32 },

    #[error("no ROM directory given")]
    NoRomDirectory,

    #[error("rom not found (expected {}, {checked} file(s) checked by CRC)", .expected.display())]
    RomNotFound { expected: PathBuf, checked: usize },

    #[error("rom CRC mismatch for {}: expected {expected}, found {actual}", .path.display())]
    RomChecksum {
        path: PathBuf,
        expected: Crc32,
        actual: Crc32,
    },

    #[error("unsupported patch type \"{0}\"")]
    UnsupportedFormat(String),

    #[error("patch application failed: {0}")]
    Apply(#[from] PatchError),

    #[error("output CRC mismatch: expected {expected}, found {actual}")]
    OutputChecksum { expected: Crc32, actual: Crc32 },

    #[error(transparent)]
    Checksum(#[from] ChecksumError),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Coarse classification of pipeline failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    ChecksumMismatch,
    FetchError,
    PatchFormatError,
    UnsupportedFormat,
    Io,
}

impl PipelineError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Fetch { .. } => ErrorKind::FetchError,
            Self::PatchChecksum { .. } | Self::RomChecksum { .. } | Self::OutputChecksum { .. } => {
                ErrorKind::ChecksumMismatch
            }
            Self::NoRomDirectory | Self::RomNotFound { .. } => ErrorKind::NotFound,
            Self::Checksum(ChecksumError::NotFound(_)) => ErrorKind::NotFound,
            Self::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            Self::Apply(_) => ErrorKind::PatchFormatError,
            Self::Checksum(ChecksumError::Io { .. }) | Self::Io { .. } => ErrorKind::Io,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Terminal state of one catalog entry
#[derive(Debug)]
pub enum ResolutionOutcome {
    /// The patched ROM was written (and verified, unless disabled)
    PatchedOk { output: PathBuf },
    /// Download-only mode: the patch is present and intact
    DownloadedOk { patch: PathBuf },
    Failed(PipelineError),
}

impl ResolutionOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }

    /// One-line result text
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::PatchedOk { .. } => "patched successfully".to_string(),
            Self::DownloadedOk { .. } => "patch downloaded successfully".to_string(),
            Self::Failed(e) => e.to_string(),
        }
    }
}

/// A failed entry as recorded in the run report
#[derive(Debug)]
pub struct FailedEntry {
    pub name: String,
    pub error: PipelineError,
}

/// Aggregated results of a run
#[derive(Debug, Default)]
pub struct RunReport {
    /// Failures in processing order
    pub failures: Vec<FailedEntry>,

    /// Entries the pipeline ran on
    pub attempted: usize,

    pub patched: usize,

    pub downloaded: usize,

    /// True when the run stopped at a failure before finishing the working set
    pub halted: bool,
}

impl RunReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome for `name`
    pub fn record(&mut self, name: &str, outcome: ResolutionOutcome) {
        self.attempted += 1;
        match outcome {
            ResolutionOutcome::PatchedOk { .. } => self.patched += 1,
            ResolutionOutcome::DownloadedOk { .. } => self.downloaded += 1,
            ResolutionOutcome::Failed(error) => self.failures.push(FailedEntry {
                name: name.to_string(),
                error,
            }),
        }
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}
