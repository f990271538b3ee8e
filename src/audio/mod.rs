//! Waveform acquisition: decoding local files and fetching remote sources.

pub mod decode;
pub mod fetch;

use std::path::Path;

pub use decode::Waveform;

use crate::error::ExtractError;

/// Resolve a source locator into a decoded waveform.
///
/// `http(s)` locators are fetched into memory first; anything else is
/// treated as a local path.
pub fn acquire(source: &str) -> Result<Waveform, ExtractError> {
    if source.starts_with("http://") || source.starts_with("https://") {
        let bytes = fetch::fetch_bytes(source)?;
        decode::decode_bytes(bytes, url_extension(source).as_deref())
    } else {
        decode::decode_file(Path::new(source))
    }
}

/// File extension of a URL's path component, if any.
fn url_extension(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let name = path.rsplit('/').next()?;
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() || ext.contains('/') {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}
