//! Mel filterbank, decibel conversion and MFCCs.

use super::stft::{bin_frequencies, Spectrogram};
use super::{AMIN, TOP_DB};

/// Reference value for decibel conversion.
pub enum DbRef {
    /// Absolute decibels (reference = 1.0).
    Unit,
    /// Relative to the largest value in the input.
    Max,
}

/// Triangular mel filterbank, band-major: `fb[m][k]` weights FFT bin `k`.
///
/// HTK mel scale, full band from 0 Hz to Nyquist.
pub fn filterbank(sample_rate: u32, n_fft: usize, n_mels: usize) -> Vec<Vec<f64>> {
    let freqs = bin_frequencies(n_fft, sample_rate);
    let n_bins = freqs.len();

    let mel_low = hz_to_mel(0.0);
    let mel_high = hz_to_mel(sample_rate as f64 / 2.0);
    let mel_points: Vec<f64> = (0..n_mels + 2)
        .map(|i| mel_low + (mel_high - mel_low) * i as f64 / (n_mels + 1) as f64)
        .collect();

    (0..n_mels)
        .map(|m| {
            let lower = mel_to_hz(mel_points[m]);
            let center = mel_to_hz(mel_points[m + 1]);
            let upper = mel_to_hz(mel_points[m + 2]);

            (0..n_bins)
                .map(|k| {
                    let f = freqs[k];
                    if f <= lower || f >= upper {
                        0.0
                    } else if f <= center {
                        (f - lower) / (center - lower)
                    } else {
                        (upper - f) / (upper - center)
                    }
                })
                .collect()
        })
        .collect()
}

/// Mel power spectrogram, frame-major: `out[t][m]` from squared magnitudes.
pub fn mel_power(spec: &Spectrogram, fb: &[Vec<f64>]) -> Vec<Vec<f64>> {
    spec.frames
        .iter()
        .map(|frame| {
            fb.iter()
                .map(|weights| {
                    weights
                        .iter()
                        .zip(frame.iter())
                        .map(|(&w, &m)| w * m * m)
                        .sum()
                })
                .collect()
        })
        .collect()
}

/// Convert a power matrix to decibels, keeping `TOP_DB` of dynamic range
/// below the matrix maximum.
pub fn power_to_db(frames: &[Vec<f64>], reference: DbRef) -> Vec<Vec<f64>> {
    let ref_db = match reference {
        DbRef::Unit => 0.0,
        DbRef::Max => {
            let max = frames
                .iter()
                .flat_map(|f| f.iter().copied())
                .fold(0.0f64, f64::max);
            10.0 * max.max(AMIN).log10()
        }
    };

    let mut out: Vec<Vec<f64>> = frames
        .iter()
        .map(|f| f.iter().map(|&x| 10.0 * x.max(AMIN).log10() - ref_db).collect())
        .collect();

    let max_db = out
        .iter()
        .flat_map(|f| f.iter().copied())
        .fold(f64::NEG_INFINITY, f64::max);
    let floor = max_db - TOP_DB;
    for frame in &mut out {
        for v in frame.iter_mut() {
            if *v < floor {
                *v = floor;
            }
        }
    }
    out
}

/// Amplitude vector to decibels relative to its maximum, `TOP_DB` floor.
pub fn amplitude_to_db_ref_max(xs: &[f64]) -> Vec<f64> {
    let max = xs.iter().copied().fold(0.0f64, f64::max).max(AMIN);
    xs.iter()
        .map(|&x| (20.0 * (x.max(AMIN) / max).log10()).max(-TOP_DB))
        .collect()
}

/// MFCCs from a mel power spectrogram, frame-major: `out[t][k]`.
///
/// Log-compression in absolute decibels, then an orthonormal DCT-II over
/// the mel axis; only the first `n_mfcc` coefficients are kept.
pub fn mfcc(mel_power: &[Vec<f64>], n_mfcc: usize) -> Vec<Vec<f64>> {
    let log_mel = power_to_db(mel_power, DbRef::Unit);
    let n_mels = log_mel.first().map_or(0, |f| f.len());
    if n_mels == 0 {
        return Vec::new();
    }

    let scale0 = (1.0 / n_mels as f64).sqrt();
    let scale = (2.0 / n_mels as f64).sqrt();

    log_mel
        .iter()
        .map(|frame| {
            (0..n_mfcc)
                .map(|k| {
                    let sum: f64 = frame
                        .iter()
                        .enumerate()
                        .map(|(m, &v)| {
                            v * (std::f64::consts::PI * k as f64 * (2 * m + 1) as f64
                                / (2 * n_mels) as f64)
                                .cos()
                        })
                        .sum();
                    sum * if k == 0 { scale0 } else { scale }
                })
                .collect()
        })
        .collect()
}

fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10.0f64.powf(mel / 2595.0) - 1.0)
}
