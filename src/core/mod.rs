//! Core data types for catalog resolution.
//!
//! - [`CatalogEntry`](entry::CatalogEntry): one translation patch and its three checksums
//! - [`Crc32`](types::Crc32), [`PatchFormat`](types::PatchFormat): catalog field types
//! - [`ResolutionOutcome`](outcome::ResolutionOutcome), [`RunReport`](outcome::RunReport):
//!   per-entry and per-run results
//!
//! ## Checksums
//!
//! Every entry carries three CRC32 values, each gating one stage:
//!
//! | Field       | Checked against      | Guards                        |
//! |-------------|----------------------|-------------------------------|
//! | `patchCRC`  | the patch file       | corrupt or wrong downloads    |
//! | `baseCRC`   | the untranslated ROM | bad dumps, wrong revisions    |
//! | `finalCRC`  | the patched output   | engine or patch defects       |

pub mod entry;
pub mod outcome;
pub mod types;
