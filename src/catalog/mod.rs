//! Translation patch catalog storage.
//!
//! A catalog lists every known translation patch for one platform ("set"):
//! the patch's name, release, format and the three CRC32 checksums used to
//! verify the patch file, the untranslated ROM and the patched result.
//!
//! Catalogs are RHDB XML databases stored as `<database_dir>/<set_id>.xml`,
//! with a JSON form (`<set_id>.json`, optionally gzip-compressed) read when
//! no XML file exists. Entries are validated once at load time:
//! a missing field, a malformed checksum, a duplicate or unsafe name all
//! surface as a single [`store::CatalogError`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use rom_bulk_patcher::Catalog;
//! use std::path::Path;
//!
//! let catalog = Catalog::load_for_set(Path::new("database"), "SNES").unwrap();
//! println!("{} patches, ROMs end in .{}", catalog.len(), catalog.rom_extension("SNES"));
//!
//! if let Some(entry) = catalog.get("Bahamut Lagoon") {
//!     println!("{} by {}", entry.version, entry.author);
//! }
//! ```

pub mod store;
pub mod xml;
