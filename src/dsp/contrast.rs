//! Spectral contrast: per-band peak-to-valley spread in decibels.
//!
//! Octave-spaced sub-bands above 200 Hz plus the residual low band. The
//! caller passes either linear magnitudes or powers; the two uses feed
//! different features and stay separate calls.

use super::stft::bin_frequencies;
use super::AMIN;

const FMIN: f64 = 200.0;
const N_BANDS: usize = 6;
const QUANTILE: f64 = 0.02;

/// Contrast per band and frame, band-major: `out[band][frame]`.
/// Always `N_BANDS + 1` rows.
pub fn spectral_contrast(
    frames: &[Vec<f64>],
    sample_rate: u32,
    n_fft: usize,
) -> Vec<Vec<f64>> {
    let freqs = bin_frequencies(n_fft, sample_rate);
    let n_bins = freqs.len();

    // Band edges: [0, 200, 400, ..., 200 * 2^N_BANDS].
    let mut edges = vec![0.0f64];
    for b in 0..=N_BANDS {
        edges.push(FMIN * (1u64 << b) as f64);
    }

    let mut out: Vec<Vec<f64>> = Vec::with_capacity(N_BANDS + 1);

    for band in 0..=N_BANDS {
        let low = edges[band];
        let high = edges[band + 1];

        let mut bins: Vec<usize> = (0..n_bins)
            .filter(|&k| freqs[k] >= low && freqs[k] <= high)
            .collect();
        if let Some(&first) = bins.first() {
            if band > 0 && first > 0 {
                bins.insert(0, first - 1);
            }
        }
        if band == N_BANDS {
            if let Some(&last) = bins.last() {
                bins.extend(last + 1..n_bins);
            }
        }

        if bins.is_empty() {
            out.push(vec![0.0; frames.len()]);
            continue;
        }

        let take = ((QUANTILE * bins.len() as f64).round() as usize).max(1);
        let row = frames
            .iter()
            .map(|frame| {
                let mut band_vals: Vec<f64> = bins.iter().map(|&k| frame[k]).collect();
                band_vals
                    .sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

                let valley: f64 =
                    band_vals[..take].iter().sum::<f64>() / take as f64;
                let peak: f64 =
                    band_vals[band_vals.len() - take..].iter().sum::<f64>() / take as f64;

                10.0 * (peak.max(AMIN).log10() - valley.max(AMIN).log10())
            })
            .collect();
        out.push(row);
    }

    out
}
