use tracing::{debug, warn};

use crate::core::outcome::{ResolutionOutcome, RunReport};
use crate::matching::candidates::{CrcSearchLimit, DEFAULT_CRC_SEARCH_LIMIT};
use crate::matching::search::ScoredEntry;
use crate::patching::PatchEngine;
use crate::pipeline::fetch::PatchFetcher;
use crate::pipeline::resolve::{PipelineConfig, ResolutionPipeline};

/// Working sets larger than this never get an unlimited CRC search
pub const LARGE_RUN_THRESHOLD: usize = 100;

/// Run-level behaviour
#[derive(Debug, Clone, Copy, Default)]
pub struct RunConfig {
    /// Halt at the first failed entry (after recording it)
    pub stop_on_error: bool,
}

/// Drives the resolution pipeline over a working set
pub struct RunController<'a> {
    pipeline_config: PipelineConfig,
    config: RunConfig,
    engine: &'a dyn PatchEngine,
    fetcher: &'a dyn PatchFetcher,
}

impl<'a> RunController<'a> {
    pub fn new(
        pipeline_config: PipelineConfig,
        config: RunConfig,
        engine: &'a dyn PatchEngine,
        fetcher: &'a dyn PatchFetcher,
    ) -> Self {
        Self {
            pipeline_config,
            config,
            engine,
            fetcher,
        }
    }

    /// Resolve each entry in order, passing every outcome to `observe`
    /// before it is recorded.
    pub fn run<'e, F>(&self, working_set: &[ScoredEntry<'e>], mut observe: F) -> RunReport
    where
        F: FnMut(&ScoredEntry<'e>, &ResolutionOutcome),
    {
        let mut pipeline_config = self.pipeline_config.clone();
        pipeline_config.crc_search_limit =
            effective_crc_search_limit(pipeline_config.crc_search_limit, working_set.len());
        let pipeline = ResolutionPipeline::new(&pipeline_config, self.engine, self.fetcher);

        let mut report = RunReport::new();
        for scored in working_set {
            let outcome = pipeline.resolve(scored.entry);
            observe(scored, &outcome);

            let failed = !outcome.is_success();
            report.record(&scored.entry.name, outcome);
            if failed && self.config.stop_on_error {
                debug!("Stopping after failure of {}", scored.entry.name);
                report.halted = true;
                break;
            }
        }
        report
    }
}

/// Cap an unlimited CRC search when the working set is large
#[must_use]
pub fn effective_crc_search_limit(limit: CrcSearchLimit, working_set_len: usize) -> CrcSearchLimit {
    if limit == CrcSearchLimit::Unlimited && working_set_len > LARGE_RUN_THRESHOLD {
        warn!(
            "{working_set_len} entries selected; limiting CRC search to {DEFAULT_CRC_SEARCH_LIMIT} files per ROM"
        );
        CrcSearchLimit::Limited(DEFAULT_CRC_SEARCH_LIMIT)
    } else {
        limit
    }
}
