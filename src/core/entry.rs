use serde::{Deserialize, Serialize};

use crate::core::types::{Crc32, PatchFormat};

/// Release tag inserted into every patched output file name
pub const TRANSLATION_TAG: &str = "T-Eng";

/// One translation patch listed in a catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Unique name within the catalog; doubles as the patch file stem
    pub name: String,

    /// Patch release version
    pub version: String,

    /// Short author name
    #[serde(rename = "shortauthor")]
    pub author: String,

    /// Format of the patch file
    #[serde(rename = "patchtype")]
    pub patch_format: PatchFormat,

    /// Expected CRC of the untranslated ROM
    #[serde(rename = "baseCRC")]
    pub base_crc: Crc32,

    /// Expected CRC of the patch file itself
    #[serde(rename = "patchCRC")]
    pub patch_crc: Crc32,

    /// Expected CRC of the patched ROM
    #[serde(rename = "finalCRC")]
    pub final_crc: Crc32,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, patch_format: PatchFormat) -> Self {
        Self {
            name: name.into(),
            version: String::new(),
            author: String::new(),
            patch_format,
            base_crc: Crc32::default(),
            patch_crc: Crc32::default(),
            final_crc: Crc32::default(),
        }
    }

    #[must_use]
    pub fn with_release(mut self, version: impl Into<String>, author: impl Into<String>) -> Self {
        self.version = version.into();
        self.author = author.into();
        self
    }

    #[must_use]
    pub fn with_checksums(mut self, base: Crc32, patch: Crc32, final_crc: Crc32) -> Self {
        self.base_crc = base;
        self.patch_crc = patch;
        self.final_crc = final_crc;
        self
    }

    /// Name of the ROM this patch applies to.
    ///
    /// Several patches may target the same ROM; the catalog tells them apart
    /// with a trailing `_<digits>` suffix, which is dropped here.
    #[must_use]
    pub fn base_rom_name(&self) -> &str {
        strip_numeric_suffix(&self.name)
    }

    /// File name of the patch, e.g. `Some Game.bps`
    #[must_use]
    pub fn patch_file_name(&self) -> String {
        format!("{}.{}", self.name, self.patch_format.extension())
    }

    /// Stem of the patched ROM's file name, e.g. `Some Game (T-Eng 1.0 by Someone)`
    #[must_use]
    pub fn output_file_stem(&self) -> String {
        format!(
            "{} ({} {} by {})",
            self.base_rom_name(),
            TRANSLATION_TAG,
            self.version,
            self.author
        )
    }

    /// File name of the patched ROM, e.g. `Some Game (T-Eng 1.0 by Someone).sfc`
    #[must_use]
    pub fn output_file_name(&self, extension: &str) -> String {
        format!("{}.{extension}", self.output_file_stem())
    }
}

fn strip_numeric_suffix(name: &str) -> &str {
    match name.rfind('_') {
        Some(idx)
            if idx > 0
                && idx + 1 < name.len()
                && name[idx + 1..].bytes().all(|b| b.is_ascii_digit()) =>
        {
            &name[..idx]
        }
        _ => name,
    }
}
