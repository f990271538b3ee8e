//! The feature pipeline: one waveform in, one named feature record out.
//!
//! Every value is a closed-form combination of spectral statistics; the
//! scaling constants are part of the output contract, not tunables.

use serde::Serialize;

use crate::audio::Waveform;
use crate::dsp::{chroma, contrast, mel, onset, stats, stft, HOP, N_FFT, N_MELS, N_MFCC};
use crate::error::ExtractError;
use crate::rhythm;

/// The complete descriptor record for one track.
///
/// Field order is the serialization contract. All values except `duration`
/// and `tempo` are bounded to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrackFeatures {
    pub duration: f64,
    pub tempo: f64,
    pub acousticness: f64,
    pub dynamic_range: f64,
    pub energy: f64,
    pub brightness: f64,
    pub fullness: f64,
    pub density: f64,
    pub instrumentalness: f64,
    pub danceability: f64,
    pub valence: f64,
    pub tension: f64,
}

impl TrackFeatures {
    /// The twelve output keys, in serialization order.
    pub const KEYS: [&'static str; 12] = [
        "duration",
        "tempo",
        "acousticness",
        "dynamic_range",
        "energy",
        "brightness",
        "fullness",
        "density",
        "instrumentalness",
        "danceability",
        "valence",
        "tension",
    ];
}

/// Extract the full feature record from a decoded waveform.
///
/// Pure and stateless: byte-identical input produces a bit-identical record.
/// Degenerate sub-statistics (no beats, silent spectrum) fall back to their
/// documented values instead of failing; only an empty waveform or a bad
/// sample rate is an error.
pub fn extract(audio: &Waveform) -> Result<TrackFeatures, ExtractError> {
    if audio.samples.is_empty() {
        return Err(ExtractError::EmptyWaveform);
    }
    if audio.sample_rate == 0 {
        return Err(ExtractError::InvalidSampleRate(audio.sample_rate));
    }

    let sr = audio.sample_rate;
    let y: Vec<f64> = audio.samples.iter().map(|&s| s as f64).collect();
    let duration = y.len() as f64 / sr as f64;

    let spec = stft::magnitude_spectrogram(&y, N_FFT, HOP);
    let freqs = stft::bin_frequencies(N_FFT, sr);

    // Onset envelope and the rhythm pass.
    let fb = mel::filterbank(sr, N_FFT, N_MELS);
    let mel_power = mel::mel_power(&spec, &fb);
    let onset_env = onset::strength(&mel_power);

    let tempo = rhythm::estimate_tempo(&onset_env, sr);
    let beats = rhythm::track_beats(&onset_env, sr, tempo);
    let beat = rhythm::analyze(&onset_env, &beats, tempo);

    // Spectral contrast runs twice: on magnitudes for acousticness, and on
    // powers for the dissonance term of tension. The two must stay separate.
    let contrast_mag = contrast::spectral_contrast(&spec.frames, sr, N_FFT);
    let power_frames: Vec<Vec<f64>> = spec
        .frames
        .iter()
        .map(|f| f.iter().map(|&m| m * m).collect())
        .collect();
    let contrast_pow = contrast::spectral_contrast(&power_frames, sr, N_FFT);

    let acousticness = 1.0 - matrix_mean(&contrast_mag) / 50.0;

    // Dynamic range from per-frame energy in dB relative to the loudest frame.
    let frame_energies: Vec<f64> = power_frames.iter().map(|f| f.iter().sum()).collect();
    let frame_db = mel::amplitude_to_db_ref_max(&frame_energies);
    let spread = stats::percentile(&frame_db, 90.0) - stats::percentile(&frame_db, 10.0);
    let dynamic_range = stats::clamp01((spread / 50.0).min(1.0));

    let energy = stats::mean(&stft::rms_per_frame(&y, N_FFT, HOP));

    let (centroid, bandwidth) = centroid_and_bandwidth(&spec, &freqs);
    let brightness = (centroid / 5000.0).min(1.0);
    let fullness = (bandwidth / 4000.0).min(1.0);

    let density = spectral_density(&spec);

    // Timbral variability in the vocal-range coefficients.
    let vocal_mfcc: Vec<f64> = mel::mfcc(&mel_power, N_MFCC)
        .iter()
        .flat_map(|frame| frame[1..5].iter().copied())
        .collect();
    let instrumentalness = (-0.1 * stats::stddev(&vocal_mfcc)).exp();

    let zcr = stats::mean(&stft::zcr_per_frame(&y, N_FFT, HOP));
    let chroma_mean = chroma::mean_chroma(&spec, sr, N_FFT);
    let dominant = chroma::dominant_pitch_class(&chroma_mean);
    // Root, major third or fifth relative to C reads as major-ish.
    let mode_factor = if matches!(dominant, 0 | 4 | 7) { 0.8 } else { 0.5 };

    let valence = valence_score(mode_factor, tempo, centroid, zcr);

    let dissonance = matrix_mean(&contrast_pow[1..]);
    let tension = tension_score(dissonance, energy, valence);

    Ok(TrackFeatures {
        duration,
        tempo,
        acousticness,
        dynamic_range,
        energy,
        brightness,
        fullness,
        density,
        instrumentalness,
        danceability: beat.danceability,
        valence,
        tension,
    })
}

/// `0.3*mode + 0.3*tempo + 0.2*centroid + 0.2*zcr`, each term normalized.
fn valence_score(mode_factor: f64, tempo: f64, centroid: f64, zcr: f64) -> f64 {
    let tempo_norm = stats::clamp01((tempo - 50.0) / 150.0);
    let centroid_norm = stats::clamp01(centroid / 4000.0);
    let zcr_norm = stats::clamp01(zcr * 10.0);
    0.3 * mode_factor + 0.3 * tempo_norm + 0.2 * centroid_norm + 0.2 * zcr_norm
}

/// Dissonance, energy and inverted valence, capped at 1.
fn tension_score(mean_dissonance: f64, energy: f64, valence: f64) -> f64 {
    (0.5 * (mean_dissonance / 20.0).min(1.0)
        + 0.3 * (energy * 1.2).min(1.0)
        + 0.2 * (1.0 - valence))
        .min(1.0)
}

/// Energy-weighted mean frequency and spread, averaged over frames.
fn centroid_and_bandwidth(spec: &stft::Spectrogram, freqs: &[f64]) -> (f64, f64) {
    let mut centroids = Vec::with_capacity(spec.n_frames());
    let mut bandwidths = Vec::with_capacity(spec.n_frames());

    for frame in &spec.frames {
        let total: f64 = frame.iter().sum();
        if total <= 0.0 {
            centroids.push(0.0);
            bandwidths.push(0.0);
            continue;
        }
        let c: f64 = frame
            .iter()
            .zip(freqs.iter())
            .map(|(&m, &f)| f * m)
            .sum::<f64>()
            / total;
        let bw: f64 = frame
            .iter()
            .zip(freqs.iter())
            .map(|(&m, &f)| (m / total) * (f - c) * (f - c))
            .sum::<f64>()
            .sqrt();
        centroids.push(c);
        bandwidths.push(bw);
    }

    (stats::mean(&centroids), stats::mean(&bandwidths))
}

/// Fraction of bins above 1% of the peak magnitude, scaled by 5 and capped.
/// A silent spectrogram has no peak to compare against and scores 0.
fn spectral_density(spec: &stft::Spectrogram) -> f64 {
    let max = spec.max();
    if max <= 0.0 {
        return 0.0;
    }
    let threshold = 0.01 * max;
    let total = spec.n_frames() * spec.n_bins;
    let above = spec
        .frames
        .iter()
        .flat_map(|f| f.iter())
        .filter(|&&m| m > threshold)
        .count();
    ((above as f64 / total as f64) * 5.0).min(1.0)
}

fn matrix_mean(rows: &[Vec<f64>]) -> f64 {
    let count: usize = rows.iter().map(|r| r.len()).sum();
    if count == 0 {
        return 0.0;
    }
    rows.iter().flat_map(|r| r.iter()).sum::<f64>() / count as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_waveform_is_rejected() {
        let audio = Waveform {
            samples: vec![],
            sample_rate: 44100,
        };
        assert!(matches!(extract(&audio), Err(ExtractError::EmptyWaveform)));
    }

    #[test]
    fn zero_sample_rate_is_rejected() {
        let audio = Waveform {
            samples: vec![0.1; 100],
            sample_rate: 0,
        };
        assert!(matches!(
            extract(&audio),
            Err(ExtractError::InvalidSampleRate(0))
        ));
    }

    #[test]
    fn tension_decreases_as_valence_increases() {
        let mut prev = f64::INFINITY;
        for v in [0.0, 0.25, 0.5, 0.75, 1.0] {
            let t = tension_score(10.0, 0.3, v);
            assert!(t < prev, "tension must strictly decrease with valence");
            prev = t;
        }
    }

    #[test]
    fn tension_is_capped_at_one() {
        assert_eq!(tension_score(1000.0, 1.0, 0.0), 1.0);
    }

    #[test]
    fn valence_terms_are_weighted_and_clamped() {
        // Fast, bright, noisy major track maxes every term.
        assert_relative_eq!(
            valence_score(0.8, 500.0, 10_000.0, 1.0),
            0.3 * 0.8 + 0.3 + 0.2 + 0.2
        );
        // Slow dark minor track keeps only the mode term.
        assert_relative_eq!(valence_score(0.5, 50.0, 0.0, 0.0), 0.15);
    }

    #[test]
    fn valence_tempo_term_saturates_at_200_bpm() {
        assert_relative_eq!(
            valence_score(0.5, 200.0, 0.0, 0.0),
            valence_score(0.5, 300.0, 0.0, 0.0)
        );
    }

    #[test]
    fn matrix_mean_handles_empty_input() {
        assert_eq!(matrix_mean(&[]), 0.0);
        assert_eq!(matrix_mean(&[vec![], vec![]]), 0.0);
        assert_relative_eq!(matrix_mean(&[vec![1.0, 2.0], vec![3.0]]), 2.0);
    }
}
