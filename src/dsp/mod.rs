//! Spectral transform primitives shared by the feature pipeline.
//!
//! Everything here operates on plain `f64` buffers: a waveform in, per-frame
//! matrices out. No state is kept between calls.

pub mod chroma;
pub mod contrast;
pub mod mel;
pub mod onset;
pub mod stats;
pub mod stft;

/// STFT window length in samples.
pub const N_FFT: usize = 2048;

/// Hop between consecutive analysis frames in samples.
pub const HOP: usize = 512;

/// Mel bands used for the onset envelope and MFCCs.
pub const N_MELS: usize = 128;

/// MFCC coefficients kept per frame.
pub const N_MFCC: usize = 13;

/// Floor used before taking logarithms of magnitudes or powers.
pub const AMIN: f64 = 1e-10;

/// Dynamic range retained when converting to decibels.
pub const TOP_DB: f64 = 80.0;
