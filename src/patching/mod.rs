//! Patch application for the formats found in translation catalogs.
//!
//! The pipeline never branches on patch format itself. It hands the patch and
//! source bytes to a [`PatchEngine`], which dispatches on [`SupportedFormat`]:
//!
//! - [`bps`]: beat patches (`BPS1`), with source/target/patch CRC32 checks
//! - [`ips`]: International Patching System records, including RLE and
//!   the truncation extension
//!
//! ## Example
//!
//! ```rust
//! use rom_bulk_patcher::core::types::SupportedFormat;
//! use rom_bulk_patcher::patching::{BuiltinEngine, PatchEngine};
//!
//! // IPS patch writing 0xFF at offset 1
//! let patch = b"PATCH\x00\x00\x01\x00\x01\xFFEOF";
//! let output = BuiltinEngine.apply(SupportedFormat::Ips, patch, &[0, 0, 0]).unwrap();
//! assert_eq!(output, vec![0, 0xFF, 0]);
//! ```

pub mod bps;
pub mod ips;

use thiserror::Error;

use crate::core::types::{Crc32, SupportedFormat};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    #[error("Invalid {format} header")]
    BadMagic { format: SupportedFormat },

    #[error("Patch data ends unexpectedly at offset {offset}")]
    Truncated { offset: usize },

    #[error("Malformed patch: {0}")]
    Malformed(String),

    #[error("Source is {actual} bytes, patch expects {expected}")]
    SourceSize { expected: u64, actual: u64 },

    #[error("Source checksum {actual} does not match patch ({expected})")]
    SourceChecksum { expected: Crc32, actual: Crc32 },

    #[error("Target checksum {actual} does not match patch ({expected})")]
    TargetChecksum { expected: Crc32, actual: Crc32 },

    #[error("Patch checksum {actual} does not match embedded value ({expected})")]
    PatchChecksum { expected: Crc32, actual: Crc32 },
}

/// Applies a patch of a known format to a source image
pub trait PatchEngine {
    /// Produce the patched bytes
    ///
    /// # Errors
    ///
    /// Returns a `PatchError` if the patch is malformed or does not fit the source.
    fn apply(
        &self,
        format: SupportedFormat,
        patch: &[u8],
        source: &[u8],
    ) -> Result<Vec<u8>, PatchError>;
}

/// Engine backed by the in-crate BPS and IPS implementations
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinEngine;

impl PatchEngine for BuiltinEngine {
    fn apply(
        &self,
        format: SupportedFormat,
        patch: &[u8],
        source: &[u8],
    ) -> Result<Vec<u8>, PatchError> {
        match format {
            SupportedFormat::Bps => bps::apply(patch, source),
            SupportedFormat::Ips => ips::apply(patch, source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_dispatches_on_format() {
        let ips_patch = b"PATCH\x00\x00\x00\x00\x01\x42EOF";

        let out = BuiltinEngine
            .apply(SupportedFormat::Ips, ips_patch, &[0, 1])
            .unwrap();
        assert_eq!(out, vec![0x42, 1]);

        // Same bytes fed to the BPS decoder must be rejected, not misapplied
        let err = BuiltinEngine
            .apply(SupportedFormat::Bps, ips_patch, &[0, 1])
            .unwrap_err();
        assert_eq!(
            err,
            PatchError::BadMagic {
                format: SupportedFormat::Bps
            }
        );
    }
}
