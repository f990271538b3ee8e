//! Remote acquisition: stream an audio URL into memory.

use crate::error::ExtractError;

/// Download `url` fully, failing on any non-success status.
pub fn fetch_bytes(url: &str) -> Result<Vec<u8>, ExtractError> {
    fn fetch_err(url: &str, source: reqwest::Error) -> ExtractError {
        ExtractError::Fetch {
            url: url.to_string(),
            source,
        }
    }

    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| fetch_err(url, e))?;

    let bytes = response.bytes().map_err(|e| fetch_err(url, e))?;
    log::info!("Fetched {} bytes from {}", bytes.len(), url);

    Ok(bytes.to_vec())
}
