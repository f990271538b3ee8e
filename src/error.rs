use thiserror::Error;

/// Failures that can occur while acquiring a waveform or extracting features.
///
/// Everything downstream of a valid waveform is absorbed internally via
/// documented fallback values; extraction itself only fails on degenerate
/// input or undecodable audio.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The decoded waveform contains no samples.
    #[error("waveform is empty")]
    EmptyWaveform,

    /// The decoded waveform reports a non-positive sample rate.
    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),

    #[error("failed to read audio source: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode audio: {0}")]
    Decode(String),

    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl From<symphonia::core::errors::Error> for ExtractError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        ExtractError::Decode(err.to_string())
    }
}
