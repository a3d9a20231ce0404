use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

use flate2::read::GzDecoder;

use crate::catalog::xml;
use crate::core::entry::CatalogEntry;
use crate::core::types::InvalidCrc;
use crate::utils::validation::{
    check_entry_limit, validate_extension, validate_file_stem, ValidationError,
};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read catalog: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse catalog: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Failed to parse XML catalog: {0}")]
    XmlError(#[from] roxmltree::Error),

    #[error("XML catalog has no header element")]
    MissingHeader,

    #[error("Catalog entry '{entry}' has no <{field}>")]
    MissingField { entry: String, field: &'static str },

    #[error("Catalog entry '{entry}' <{field}>: {source}")]
    InvalidChecksum {
        entry: String,
        field: &'static str,
        #[source]
        source: InvalidCrc,
    },

    #[error("Duplicate catalog entry '{0}'")]
    DuplicateEntry(String),

    #[error("Invalid catalog entry '{name}': {source}")]
    InvalidEntry {
        name: String,
        #[source]
        source: ValidationError,
    },

    #[error("Invalid catalog header: {0}")]
    InvalidHeader(#[source] ValidationError),

    #[error("{0}")]
    TooManyEntries(String),
}

/// File extensions for the sets whose catalogs don't declare one
const SET_EXTENSIONS: &[(&str, &str)] = &[
    ("Gameboy", "gb"),
    ("Gameboy Color", "gbc"),
    ("NES", "nes"),
    ("SNES", "sfc"),
    ("Genesis", "smd"),
];

/// Extension used when neither the catalog nor the set id decides
pub const DEFAULT_EXTENSION: &str = "bin";

/// Catalog header record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogHeader {
    /// Platform / set name
    #[serde(default)]
    pub name: String,

    /// ROM file extension override
    #[serde(
        default,
        rename = "fileextension",
        skip_serializing_if = "Option::is_none"
    )]
    pub file_extension: Option<String>,

    /// Any further descriptive fields (author, version, homepage, ...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Serializable catalog format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogData {
    pub header: CatalogHeader,
    #[serde(default)]
    pub games: Vec<CatalogEntry>,
}

/// A patch catalog for one platform
#[derive(Debug, Clone)]
pub struct Catalog {
    pub header: CatalogHeader,

    /// Entries in file order
    pub entries: Vec<CatalogEntry>,

    /// Index: entry name -> index in entries vec
    name_to_index: HashMap<String, usize>,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new(header: CatalogHeader) -> Self {
        Self {
            header,
            entries: Vec::new(),
            name_to_index: HashMap::new(),
        }
    }

    /// Load the catalog for a set from `database_dir`.
    ///
    /// Looks for the RHDB database `<set_id>.xml` first, then
    /// `<set_id>.json` and `<set_id>.json.gz`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` (naming the `.xml` path) if none of
    /// the files exists, or any error from [`Catalog::load`].
    pub fn load_for_set(database_dir: &Path, set_id: &str) -> Result<Self, CatalogError> {
        let candidates = [
            database_dir.join(format!("{set_id}.xml")),
            database_dir.join(format!("{set_id}.json")),
            database_dir.join(format!("{set_id}.json.gz")),
        ];

        match candidates.iter().find(|path| path.is_file()) {
            Some(path) => Self::load(path),
            None => Err(CatalogError::NotFound(candidates[0].clone())),
        }
    }

    /// Load a catalog file.
    ///
    /// `.xml` files are read as RHDB databases, anything else as JSON; a
    /// trailing `.gz` means gzip-compressed.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the file does not exist, a read or
    /// parse error, or a validation error for the first bad entry.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        if !path.is_file() {
            return Err(CatalogError::NotFound(path.to_path_buf()));
        }

        let file = std::fs::File::open(path)?;
        let mut content = String::new();
        if is_gzipped(path) {
            GzDecoder::new(file).read_to_string(&mut content)?;
        } else {
            std::io::BufReader::new(file).read_to_string(&mut content)?;
        }

        if is_xml(path) {
            Self::from_xml(&content)
        } else {
            Self::from_json(&content)
        }
    }

    /// Parse and validate an RHDB XML catalog
    ///
    /// # Errors
    ///
    /// Returns a parse error for malformed XML, missing game fields or bad
    /// checksums, and a validation error for unsafe names or duplicates.
    pub fn from_xml(xml: &str) -> Result<Self, CatalogError> {
        Self::from_data(xml::parse(xml)?)
    }

    /// Parse and validate a catalog from a JSON string
    ///
    /// # Errors
    ///
    /// Returns a parse error for malformed JSON or missing fields, and a
    /// validation error for unsafe names or duplicates.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Self::from_data(serde_json::from_str(json)?)
    }

    fn from_data(data: CatalogData) -> Result<Self, CatalogError> {
        if let Some(ext) = &data.header.file_extension {
            validate_extension(ext).map_err(CatalogError::InvalidHeader)?;
        }

        let mut catalog = Self::new(data.header);
        for entry in data.games {
            catalog.add_entry(entry)?;
        }

        Ok(catalog)
    }

    /// Add an entry, enforcing unique and filesystem-safe names
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateEntry` if the name is taken,
    /// `CatalogError::InvalidEntry` if the name or the output file name built
    /// from it (with version and author) is not a safe file stem, or
    /// `CatalogError::TooManyEntries` past the entry limit.
    pub fn add_entry(&mut self, entry: CatalogEntry) -> Result<(), CatalogError> {
        if let Some(msg) = check_entry_limit(self.entries.len()) {
            return Err(CatalogError::TooManyEntries(msg));
        }

        validate_file_stem(&entry.name).map_err(|source| CatalogError::InvalidEntry {
            name: entry.name.clone(),
            source,
        })?;
        validate_extension(entry.patch_format.extension()).map_err(|source| {
            CatalogError::InvalidEntry {
                name: entry.name.clone(),
                source,
            }
        })?;
        // Version and author end up in the patched ROM's file name
        validate_file_stem(&entry.output_file_stem()).map_err(|source| {
            CatalogError::InvalidEntry {
                name: entry.name.clone(),
                source,
            }
        })?;

        if self.name_to_index.contains_key(&entry.name) {
            return Err(CatalogError::DuplicateEntry(entry.name));
        }

        self.name_to_index
            .insert(entry.name.clone(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    /// Get an entry by name
    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.name_to_index.get(name).map(|&idx| &self.entries[idx])
    }

    /// ROM file extension for this catalog.
    ///
    /// The header's `fileextension` wins; otherwise the well-known set ids
    /// map to their usual extension, and everything else gets `bin`.
    pub fn rom_extension(&self, set_id: &str) -> String {
        if let Some(ext) = &self.header.file_extension {
            return ext.clone();
        }
        SET_EXTENSIONS
            .iter()
            .find(|&&(set, _)| set == set_id)
            .map_or(DEFAULT_EXTENSION, |&(_, ext)| ext)
            .to_string()
    }

    /// Export catalog to JSON
    pub fn to_json(&self) -> Result<String, CatalogError> {
        let data = CatalogData {
            header: self.header.clone(),
            games: self.entries.clone(),
        };
        Ok(serde_json::to_string_pretty(&data)?)
    }

    /// Number of entries in catalog
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if catalog is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
fn is_gzipped(path: &Path) -> bool {
    path.to_string_lossy().to_lowercase().ends_with(".gz")
}

#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
fn is_xml(path: &Path) -> bool {
    let name = path.to_string_lossy().to_lowercase();
    name.ends_with(".xml") || name.ends_with(".xml.gz")
}
