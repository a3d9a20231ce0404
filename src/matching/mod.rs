//! Fuzzy name matching for catalog entries and ROM files.
//!
//! Two things need approximate names:
//!
//! - [`search`]: picking the *working set* of catalog entries for a
//!   `--search` query (prefix-truncated, case-insensitive, above 90% of the
//!   best score)
//! - [`candidates`]: finding a ROM whose file name differs from the catalog,
//!   by checksumming the most similarly named files first
//!
//! Both rank with [`scoring::ratio`], an indel edit-distance similarity in
//! `0..=100`. Name similarity only orders the work; a CRC match is what
//! actually identifies a ROM.
//!
//! ## Example
//!
//! ```rust
//! use rom_bulk_patcher::core::entry::CatalogEntry;
//! use rom_bulk_patcher::core::types::PatchFormat;
//! use rom_bulk_patcher::matching::search::search_catalog;
//!
//! let entries = vec![
//!     CatalogEntry::new("Seiken Densetsu 3", PatchFormat::Bps),
//!     CatalogEntry::new("Star Ocean", PatchFormat::Ips),
//! ];
//!
//! let working_set = search_catalog(&entries, "seiken").unwrap();
//! assert_eq!(working_set[0].entry.name, "Seiken Densetsu 3");
//! assert_eq!(working_set[0].score, 100);
//! ```

pub mod candidates;
pub mod scoring;
pub mod search;

pub use candidates::CrcSearchLimit;
pub use search::{ScoredEntry, SearchError};
