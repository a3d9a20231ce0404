//! Fixtures shared by the pipeline and controller tests.

use std::cell::Cell;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use reqwest::Url;
use tempfile::TempDir;

use crate::core::entry::CatalogEntry;
use crate::core::types::{Crc32, PatchFormat, SupportedFormat};
use crate::patching::{BuiltinEngine, PatchEngine, PatchError};
use crate::pipeline::fetch::{FetchError, PatchFetcher};
use crate::pipeline::resolve::PipelineConfig;

pub fn crc(bytes: &[u8]) -> Crc32 {
    Crc32(crc32fast::hash(bytes))
}

/// IPS patch that overwrites the first byte with `value`
pub fn ips_patch(value: u8) -> Vec<u8> {
    let mut patch = b"PATCH".to_vec();
    patch.extend_from_slice(&[0, 0, 0, 0, 1, value]);
    patch.extend_from_slice(b"EOF");
    patch
}

/// Temporary patch/ROM/output directories for the `SNES` set
pub struct Fixture {
    _dir: TempDir,
    pub config: PipelineConfig,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let patch_dir = dir.path().join("patches").join("SNES");
        let rom_dir = dir.path().join("roms");
        let out_dir = dir.path().join("out");
        for d in [&patch_dir, &rom_dir, &out_dir] {
            fs::create_dir_all(d).unwrap();
        }

        let config = PipelineConfig {
            set_id: "SNES".to_string(),
            patch_dir,
            rom_dir: Some(rom_dir),
            out_dir,
            rom_extension: "sfc".to_string(),
            patch_base_url: "http://mirror.test/patches".to_string(),
            ..PipelineConfig::default()
        };
        Self { _dir: dir, config }
    }

    pub fn rom_path(&self, base_name: &str) -> PathBuf {
        self.config
            .rom_dir
            .as_ref()
            .unwrap()
            .join(format!("{base_name}.{}", self.config.rom_extension))
    }

    /// Store a base ROM and patch; the entry carries their CRCs and `target`'s
    pub fn entry(
        &self,
        name: &str,
        format: PatchFormat,
        source: &[u8],
        patch: &[u8],
        target: &[u8],
    ) -> CatalogEntry {
        let entry = CatalogEntry::new(name, format)
            .with_release("1.0", "DeJap")
            .with_checksums(crc(source), crc(patch), crc(target));
        fs::write(self.rom_path(entry.base_rom_name()), source).unwrap();
        fs::write(self.config.patch_dir.join(entry.patch_file_name()), patch).unwrap();
        entry
    }

    /// A fully consistent IPS entry setting the first byte to 0xFF
    pub fn ips_entry(&self, name: &str, source: &[u8]) -> CatalogEntry {
        let patch = ips_patch(0xFF);
        let target = BuiltinEngine
            .apply(SupportedFormat::Ips, &patch, source)
            .unwrap();
        self.entry(name, PatchFormat::Ips, source, &patch, &target)
    }
}

/// Builtin engine that counts its invocations
#[derive(Default)]
pub struct CountingEngine {
    calls: Cell<usize>,
}

impl CountingEngine {
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl PatchEngine for CountingEngine {
    fn apply(
        &self,
        format: SupportedFormat,
        patch: &[u8],
        source: &[u8],
    ) -> Result<Vec<u8>, PatchError> {
        self.calls.set(self.calls.get() + 1);
        BuiltinEngine.apply(format, patch, source)
    }
}

/// Fetcher serving fixed responses; unknown URLs get a 404
#[derive(Default)]
pub struct MapFetcher {
    files: HashMap<String, Vec<u8>>,
    calls: Cell<usize>,
}

impl MapFetcher {
    pub fn with(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.files.insert(url.to_string(), bytes);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl PatchFetcher for MapFetcher {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        self.calls.set(self.calls.get() + 1);
        self.files
            .get(url.as_str())
            .cloned()
            .ok_or(FetchError::Status { status: 404 })
    }
}

/// Fetcher for tests where every patch is already local
pub struct NoFetcher;

impl PatchFetcher for NoFetcher {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        panic!("unexpected download of {url}");
    }
}
