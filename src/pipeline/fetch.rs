//! Remote patch retrieval.
//!
//! Patches missing from the local patch directory are fetched from
//! `<base>/<set>/<patch file name>`, with each path segment percent-encoded.

use std::path::Path;
use std::time::Duration;

use reqwest::Url;
use thiserror::Error;

/// Public patch archive used when no other base URL is configured
pub const DEFAULT_PATCH_BASE_URL: &str = "https://romhackdb.com/patches";

/// Per-request timeout for patch downloads
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server responded with status {status}")]
    Status { status: u16 },

    #[error("cannot build a patch URL from base '{0}'")]
    InvalidUrl(String),
}

/// Source of patch files that are not available locally
pub trait PatchFetcher {
    /// Retrieve the bytes at `url`
    ///
    /// # Errors
    ///
    /// Returns a `FetchError` on transport failures and non-success responses.
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError>;
}

/// Blocking HTTP(S) fetcher
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Create a fetcher with the default timeout
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;
        Ok(Self { client })
    }
}

impl PatchFetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url.clone()).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }
        Ok(response.bytes()?.to_vec())
    }
}

/// Build the download URL for a patch file.
///
/// The set id loses any extension (`SNES.xml` -> `SNES`); both segments are
/// percent-encoded.
///
/// # Errors
///
/// Returns `FetchError::InvalidUrl` if `base` is not a URL that can have
/// path segments (e.g. `mailto:` URLs).
pub fn patch_url(base: &str, set_id: &str, patch_file_name: &str) -> Result<Url, FetchError> {
    let invalid = || FetchError::InvalidUrl(base.to_string());
    let mut url = Url::parse(base).map_err(|_| invalid())?;

    let set_stem = Path::new(set_id)
        .file_stem()
        .map_or_else(|| set_id.to_string(), |s| s.to_string_lossy().into_owned());

    url.path_segments_mut()
        .map_err(|()| invalid())?
        .pop_if_empty()
        .push(&set_stem)
        .push(patch_file_name);
    Ok(url)
}
