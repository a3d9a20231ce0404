use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::catalog::store::DEFAULT_EXTENSION;
use crate::core::entry::CatalogEntry;
use crate::core::outcome::{PipelineError, ResolutionOutcome};
use crate::core::types::{Crc32, SupportedFormat};
use crate::matching::candidates::{find_by_checksum, CrcSearchLimit};
use crate::patching::PatchEngine;
use crate::pipeline::fetch::{patch_url, PatchFetcher, DEFAULT_PATCH_BASE_URL};
use crate::utils::checksum::checksum_of;

/// Settings shared by every entry of a run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Set (platform) identifier, used in patch URLs
    pub set_id: String,

    /// Where patches are looked up and downloaded to
    pub patch_dir: PathBuf,

    /// Directory holding the base ROMs; not needed in download-only mode
    pub rom_dir: Option<PathBuf>,

    /// Directory patched ROMs are written to
    pub out_dir: PathBuf,

    /// Extension of base ROMs and patched outputs, without the dot
    pub rom_extension: String,

    /// Base URL of the remote patch archive
    pub patch_base_url: String,

    /// Stop after the patch is present and verified
    pub download_only: bool,

    /// Check the patched output against the catalog's final CRC
    pub verify_output: bool,

    pub crc_search_limit: CrcSearchLimit,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            set_id: String::new(),
            patch_dir: PathBuf::from("patches"),
            rom_dir: None,
            out_dir: PathBuf::from("."),
            rom_extension: DEFAULT_EXTENSION.to_string(),
            patch_base_url: DEFAULT_PATCH_BASE_URL.to_string(),
            download_only: false,
            verify_output: true,
            crc_search_limit: CrcSearchLimit::default(),
        }
    }
}

/// Resolves catalog entries into patched ROMs
pub struct ResolutionPipeline<'a> {
    config: &'a PipelineConfig,
    engine: &'a dyn PatchEngine,
    fetcher: &'a dyn PatchFetcher,
}

impl<'a> ResolutionPipeline<'a> {
    pub fn new(
        config: &'a PipelineConfig,
        engine: &'a dyn PatchEngine,
        fetcher: &'a dyn PatchFetcher,
    ) -> Self {
        Self {
            config,
            engine,
            fetcher,
        }
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        self.config
    }

    /// Local path of the entry's patch file
    #[must_use]
    pub fn patch_path(&self, entry: &CatalogEntry) -> PathBuf {
        self.config.patch_dir.join(entry.patch_file_name())
    }

    /// Path the patched ROM is written to
    #[must_use]
    pub fn output_path(&self, entry: &CatalogEntry) -> PathBuf {
        self.config
            .out_dir
            .join(entry.output_file_name(&self.config.rom_extension))
    }

    /// Run every gate for `entry`; the first failing gate decides the outcome
    pub fn resolve(&self, entry: &CatalogEntry) -> ResolutionOutcome {
        match self.try_resolve(entry) {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!("{}: {e}", entry.name);
                ResolutionOutcome::Failed(e)
            }
        }
    }

    fn try_resolve(&self, entry: &CatalogEntry) -> Result<ResolutionOutcome, PipelineError> {
        let patch = self.acquire_patch(entry)?;
        check_crc(&patch, entry.patch_crc, |expected, actual| {
            PipelineError::PatchChecksum { expected, actual }
        })?;
        debug!("{}: patch verified", entry.name);

        if self.config.download_only {
            return Ok(ResolutionOutcome::DownloadedOk { patch });
        }

        let rom = self.locate_source(entry)?;
        check_crc(&rom, entry.base_crc, |expected, actual| {
            PipelineError::RomChecksum {
                path: rom.clone(),
                expected,
                actual,
            }
        })?;
        debug!("{}: base ROM verified ({})", entry.name, rom.display());

        let format = entry
            .patch_format
            .supported()
            .ok_or_else(|| PipelineError::UnsupportedFormat(entry.patch_format.to_string()))?;

        let output = self.apply(entry, format, &patch, &rom)?;

        if self.config.verify_output {
            check_crc(&output, entry.final_crc, |expected, actual| {
                PipelineError::OutputChecksum { expected, actual }
            })?;
            debug!("{}: output verified", entry.name);
        }

        Ok(ResolutionOutcome::PatchedOk { output })
    }

    /// Use the local patch if present, otherwise download it
    fn acquire_patch(&self, entry: &CatalogEntry) -> Result<PathBuf, PipelineError> {
        let path = self.patch_path(entry);
        if path.is_file() {
            return Ok(path);
        }

        let url = patch_url(
            &self.config.patch_base_url,
            &self.config.set_id,
            &entry.patch_file_name(),
        )
        .map_err(|source| PipelineError::Fetch {
            url: self.config.patch_base_url.clone(),
            source,
        })?;

        info!("Downloading {url}");
        let bytes = self
            .fetcher
            .fetch(&url)
            .map_err(|source| PipelineError::Fetch {
                url: url.to_string(),
                source,
            })?;

        persist(&path, &bytes)?;
        Ok(path)
    }

    /// Expected ROM path, or a CRC match among similarly named files
    fn locate_source(&self, entry: &CatalogEntry) -> Result<PathBuf, PipelineError> {
        let rom_dir = self
            .config
            .rom_dir
            .as_deref()
            .ok_or(PipelineError::NoRomDirectory)?;

        let base_name = entry.base_rom_name();
        let expected = rom_dir.join(format!("{base_name}.{}", self.config.rom_extension));
        if expected.is_file() {
            return Ok(expected);
        }

        debug!(
            "{}: {} not found, searching by CRC",
            entry.name,
            expected.display()
        );
        let search = find_by_checksum(
            rom_dir,
            base_name,
            entry.base_crc,
            self.config.crc_search_limit,
        )
        .map_err(|e| PipelineError::io(rom_dir, e))?;

        search.found.ok_or(PipelineError::RomNotFound {
            expected,
            checked: search.checked,
        })
    }

    fn apply(
        &self,
        entry: &CatalogEntry,
        format: SupportedFormat,
        patch: &Path,
        rom: &Path,
    ) -> Result<PathBuf, PipelineError> {
        let patch_bytes = fs::read(patch).map_err(|e| PipelineError::io(patch, e))?;
        let source_bytes = fs::read(rom).map_err(|e| PipelineError::io(rom, e))?;

        debug!("{}: applying {format} patch", entry.name);
        let patched = self.engine.apply(format, &patch_bytes, &source_bytes)?;

        let output = self.output_path(entry);
        fs::write(&output, patched).map_err(|e| PipelineError::io(&output, e))?;
        Ok(output)
    }
}

fn check_crc(
    path: &Path,
    expected: Crc32,
    mismatch: impl FnOnce(Crc32, Crc32) -> PipelineError,
) -> Result<(), PipelineError> {
    let actual = checksum_of(path)?;
    if actual == expected {
        Ok(())
    } else {
        Err(mismatch(expected, actual))
    }
}

/// Write `bytes` next to `path` and rename into place
fn persist(path: &Path, bytes: &[u8]) -> Result<(), PipelineError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| PipelineError::io(dir, e))?;
    tmp.write_all(bytes).map_err(|e| PipelineError::io(path, e))?;
    tmp.persist(path)
        .map_err(|e| PipelineError::io(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::outcome::ErrorKind;
    use crate::core::types::PatchFormat;
    use crate::patching::bps::test_support::target_read_patch;
    use crate::patching::BuiltinEngine;
    use crate::pipeline::test_support::{
        crc, ips_patch, CountingEngine, Fixture, MapFetcher, NoFetcher,
    };

    const SOURCE: &[u8] = b"untranslated rom image";

    #[test]
    fn test_ips_entry_is_patched_end_to_end() {
        let fixture = Fixture::new();
        let entry = fixture.ips_entry("Tales of Phantasia_2", SOURCE);
        let engine = CountingEngine::default();
        let pipeline = ResolutionPipeline::new(&fixture.config, &engine, &NoFetcher);

        let outcome = pipeline.resolve(&entry);
        let ResolutionOutcome::PatchedOk { output } = outcome else {
            panic!("expected PatchedOk, got {outcome:?}");
        };
        assert_eq!(
            output.file_name().unwrap(),
            "Tales of Phantasia (T-Eng 1.0 by DeJap).sfc"
        );
        let written = fs::read(&output).unwrap();
        assert_eq!(written[0], 0xFF);
        assert_eq!(&written[1..], &SOURCE[1..]);
        assert_eq!(engine.calls(), 1, "IPS patches are applied exactly once");
    }

    #[test]
    fn test_bps_entry_is_patched_end_to_end() {
        let fixture = Fixture::new();
        let target = b"translated rom image, longer".to_vec();
        let patch = target_read_patch(SOURCE, &target);
        let entry = fixture.entry("Bahamut Lagoon", PatchFormat::Bps, SOURCE, &patch, &target);
        let pipeline = ResolutionPipeline::new(&fixture.config, &BuiltinEngine, &NoFetcher);

        let outcome = pipeline.resolve(&entry);
        assert!(outcome.is_success(), "{outcome:?}");
        assert_eq!(fs::read(pipeline.output_path(&entry)).unwrap(), target);
    }

    #[test]
    fn test_corrupted_patch_never_reaches_apply() {
        let fixture = Fixture::new();
        let entry = fixture.ips_entry("Seiken Densetsu 3", SOURCE);

        // Flip one bit in the stored patch
        let patch_path = fixture.config.patch_dir.join(entry.patch_file_name());
        let mut bytes = fs::read(&patch_path).unwrap();
        bytes[6] ^= 0x01;
        fs::write(&patch_path, bytes).unwrap();

        let engine = CountingEngine::default();
        let pipeline = ResolutionPipeline::new(&fixture.config, &engine, &NoFetcher);
        let ResolutionOutcome::Failed(error) = pipeline.resolve(&entry) else {
            panic!("corrupted patch must fail");
        };
        assert!(matches!(error, PipelineError::PatchChecksum { .. }));
        assert_eq!(engine.calls(), 0);
    }

    #[test]
    fn test_wrong_base_rom_never_reaches_apply() {
        let fixture = Fixture::new();
        let entry = fixture.ips_entry("Star Ocean", SOURCE);
        fs::write(fixture.rom_path("Star Ocean"), b"a different dump").unwrap();

        let engine = CountingEngine::default();
        let pipeline = ResolutionPipeline::new(&fixture.config, &engine, &NoFetcher);
        let ResolutionOutcome::Failed(error) = pipeline.resolve(&entry) else {
            panic!("bad dump must fail");
        };
        assert_eq!(error.kind(), ErrorKind::ChecksumMismatch);
        assert!(matches!(error, PipelineError::RomChecksum { .. }));
        assert_eq!(engine.calls(), 0);
        assert!(!pipeline.output_path(&entry).exists());
    }

    #[test]
    fn test_renamed_rom_is_found_by_crc() {
        let fixture = Fixture::new();
        let entry = fixture.ips_entry("Mother 3", SOURCE);
        let rom_dir = fixture.config.rom_dir.clone().unwrap();
        fs::rename(
            fixture.rom_path("Mother 3"),
            rom_dir.join("Mother 3 (Japan) [b1].sfc"),
        )
        .unwrap();
        fs::write(rom_dir.join("Metroid.sfc"), b"other").unwrap();

        let pipeline = ResolutionPipeline::new(&fixture.config, &BuiltinEngine, &NoFetcher);
        let outcome = pipeline.resolve(&entry);
        assert!(outcome.is_success(), "{outcome:?}");
    }

    #[test]
    fn test_missing_rom_reports_not_found() {
        let fixture = Fixture::new();
        let entry = fixture.ips_entry("Mother 3", SOURCE);
        fs::remove_file(fixture.rom_path("Mother 3")).unwrap();
        fs::write(fixture.rom_path("Unrelated"), b"other").unwrap();

        let pipeline = ResolutionPipeline::new(&fixture.config, &BuiltinEngine, &NoFetcher);
        let ResolutionOutcome::Failed(error) = pipeline.resolve(&entry) else {
            panic!("missing ROM must fail");
        };
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert!(matches!(error, PipelineError::RomNotFound { checked: 1, .. }));
    }

    #[test]
    fn test_crc_search_disabled() {
        let mut fixture = Fixture::new();
        fixture.config.crc_search_limit = CrcSearchLimit::Limited(0);
        let entry = fixture.ips_entry("Mother 3", SOURCE);
        let rom_dir = fixture.config.rom_dir.clone().unwrap();
        fs::rename(fixture.rom_path("Mother 3"), rom_dir.join("renamed.sfc")).unwrap();

        let pipeline = ResolutionPipeline::new(&fixture.config, &BuiltinEngine, &NoFetcher);
        assert!(matches!(
            pipeline.resolve(&entry),
            ResolutionOutcome::Failed(PipelineError::RomNotFound { checked: 0, .. })
        ));
    }

    #[test]
    fn test_unsupported_format() {
        let fixture = Fixture::new();
        let patch = b"UPS1 whatever".to_vec();
        let entry = fixture.entry(
            "Some Game",
            PatchFormat::Other("ups".into()),
            SOURCE,
            &patch,
            SOURCE,
        );

        let engine = CountingEngine::default();
        let pipeline = ResolutionPipeline::new(&fixture.config, &engine, &NoFetcher);
        let ResolutionOutcome::Failed(error) = pipeline.resolve(&entry) else {
            panic!("ups is not supported");
        };
        assert_eq!(error.kind(), ErrorKind::UnsupportedFormat);
        assert_eq!(error.to_string(), "unsupported patch type \"ups\"");
        assert_eq!(engine.calls(), 0);
    }

    #[test]
    fn test_output_check_can_be_disabled() {
        let mut fixture = Fixture::new();
        let patch = ips_patch(0xFF);
        let wrong_final = b"not what the patch produces";
        let entry = fixture.entry("Live A Live", PatchFormat::Ips, SOURCE, &patch, wrong_final);

        let pipeline = ResolutionPipeline::new(&fixture.config, &BuiltinEngine, &NoFetcher);
        let ResolutionOutcome::Failed(error) = pipeline.resolve(&entry) else {
            panic!("final CRC differs");
        };
        assert!(matches!(error, PipelineError::OutputChecksum { .. }));
        // The mismatching output stays on disk
        assert!(pipeline.output_path(&entry).exists());

        fixture.config.verify_output = false;
        let pipeline = ResolutionPipeline::new(&fixture.config, &BuiltinEngine, &NoFetcher);
        assert!(matches!(
            pipeline.resolve(&entry),
            ResolutionOutcome::PatchedOk { .. }
        ));
    }

    #[test]
    fn test_engine_failure_is_reported() {
        let fixture = Fixture::new();
        // Valid magic, missing EOF marker
        let patch = b"PATCH\x00\x00\x00".to_vec();
        let entry = fixture.entry("Broken", PatchFormat::Ips, SOURCE, &patch, SOURCE);

        let pipeline = ResolutionPipeline::new(&fixture.config, &BuiltinEngine, &NoFetcher);
        let ResolutionOutcome::Failed(error) = pipeline.resolve(&entry) else {
            panic!("truncated patch must fail");
        };
        assert_eq!(error.kind(), ErrorKind::PatchFormatError);
    }

    #[test]
    fn test_download_only_needs_no_roms() {
        let mut fixture = Fixture::new();
        let entry = fixture.ips_entry("Mother 3", SOURCE);
        fixture.config.download_only = true;
        fixture.config.rom_dir = None;

        let engine = CountingEngine::default();
        let pipeline = ResolutionPipeline::new(&fixture.config, &engine, &NoFetcher);
        let ResolutionOutcome::DownloadedOk { patch } = pipeline.resolve(&entry) else {
            panic!("expected DownloadedOk");
        };
        assert_eq!(patch, pipeline.patch_path(&entry));
        assert_eq!(engine.calls(), 0);
    }

    #[test]
    fn test_missing_patch_is_downloaded_and_kept() {
        let fixture = Fixture::new();
        let entry = fixture.ips_entry("Mother 3", SOURCE);
        let patch_path = fixture.config.patch_dir.join(entry.patch_file_name());
        let patch = fs::read(&patch_path).unwrap();
        fs::remove_file(&patch_path).unwrap();

        let fetcher = MapFetcher::default().with(
            "http://mirror.test/patches/SNES/Mother%203.ips",
            patch.clone(),
        );
        let pipeline = ResolutionPipeline::new(&fixture.config, &BuiltinEngine, &fetcher);
        let outcome = pipeline.resolve(&entry);
        assert!(outcome.is_success(), "{outcome:?}");
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(fs::read(&patch_path).unwrap(), patch);

        // Second run uses the stored copy
        pipeline.resolve(&entry);
        assert_eq!(fetcher.calls(), 1);
    }

    #[test]
    fn test_download_failure() {
        let fixture = Fixture::new();
        let entry = CatalogEntry::new("Nowhere", PatchFormat::Bps)
            .with_checksums(crc(SOURCE), Crc32(1), Crc32(2));

        let fetcher = MapFetcher::default();
        let pipeline = ResolutionPipeline::new(&fixture.config, &BuiltinEngine, &fetcher);
        let ResolutionOutcome::Failed(error) = pipeline.resolve(&entry) else {
            panic!("nothing to download");
        };
        assert_eq!(error.kind(), ErrorKind::FetchError);
        assert!(error.to_string().contains("SNES/Nowhere.bps"));
        assert!(!pipeline.patch_path(&entry).exists());
    }

    #[test]
    fn test_persist_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.bps");
        persist(&path, b"first").unwrap();
        persist(&path, b"second").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"second");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
