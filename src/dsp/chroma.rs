//! Pitch-class (chroma) energy profile.

use super::stft::{bin_frequencies, Spectrogram};

/// Reference C0 derived from A4 = 440 Hz.
const C0_HZ: f64 = 16.351597831287414;

/// Mean 12-bin chroma vector over all frames, class 0 = C.
///
/// Each FFT bin's power is assigned to its nearest pitch class; frames are
/// max-normalized before averaging so loud frames do not dominate.
pub fn mean_chroma(spec: &Spectrogram, sample_rate: u32, n_fft: usize) -> [f64; 12] {
    let freqs = bin_frequencies(n_fft, sample_rate);

    // Per-bin pitch class, skipping DC and sub-audible bins.
    let classes: Vec<Option<usize>> = freqs
        .iter()
        .map(|&f| {
            if f < 2.0 * C0_HZ {
                None
            } else {
                let semis = 12.0 * (f / C0_HZ).log2();
                Some((semis.round() as i64).rem_euclid(12) as usize)
            }
        })
        .collect();

    let mut acc = [0.0f64; 12];
    let mut counted = 0usize;

    for frame in &spec.frames {
        let mut pcp = [0.0f64; 12];
        for (k, &mag) in frame.iter().enumerate() {
            if let Some(class) = classes[k] {
                pcp[class] += mag * mag;
            }
        }
        let max = pcp.iter().copied().fold(0.0f64, f64::max);
        if max > 0.0 {
            for (a, p) in acc.iter_mut().zip(pcp.iter()) {
                *a += p / max;
            }
            counted += 1;
        }
    }

    if counted > 0 {
        for a in acc.iter_mut() {
            *a /= counted as f64;
        }
    }
    acc
}

/// Index of the strongest pitch class, 0 = C.
pub fn dominant_pitch_class(chroma: &[f64; 12]) -> usize {
    chroma
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}
