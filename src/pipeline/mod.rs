//! Per-entry resolution and run orchestration.
//!
//! [`resolve::ResolutionPipeline`] takes one catalog entry through its
//! gates (patch acquisition, the three CRC checks, format dispatch and
//! application) and returns a [`ResolutionOutcome`](crate::core::outcome::ResolutionOutcome).
//! [`controller::RunController`] drives the pipeline over a working set and
//! collects the [`RunReport`](crate::core::outcome::RunReport).
//!
//! Network access sits behind [`fetch::PatchFetcher`] and patch application
//! behind [`PatchEngine`](crate::patching::PatchEngine), so both can be
//! swapped out in tests.

pub mod controller;
pub mod fetch;
pub mod resolve;

#[cfg(test)]
pub(crate) mod test_support;

pub use controller::{RunConfig, RunController};
pub use fetch::{FetchError, HttpFetcher, PatchFetcher};
pub use resolve::{PipelineConfig, ResolutionPipeline};
