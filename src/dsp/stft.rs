//! Short-time analysis: magnitude spectrogram plus the time-domain
//! per-frame statistics that share its framing (RMS, zero crossings).

use rustfft::{num_complex::Complex, FftPlanner};

/// Magnitude spectrogram, frame-major: `frames[t][k]` with `k` in `0..n_bins`.
pub struct Spectrogram {
    pub frames: Vec<Vec<f64>>,
    pub n_bins: usize,
}

impl Spectrogram {
    pub fn n_frames(&self) -> usize {
        self.frames.len()
    }

    /// Largest magnitude over the whole matrix.
    pub fn max(&self) -> f64 {
        self.frames
            .iter()
            .flat_map(|f| f.iter().copied())
            .fold(0.0f64, f64::max)
    }
}

/// Center frequency of every FFT bin in Hz.
pub fn bin_frequencies(n_fft: usize, sample_rate: u32) -> Vec<f64> {
    let n_bins = n_fft / 2 + 1;
    (0..n_bins)
        .map(|k| k as f64 * sample_rate as f64 / n_fft as f64)
        .collect()
}

/// Compute the centered magnitude spectrogram of `samples`.
///
/// Frames are centered on `t * hop` with reflection padding at the edges,
/// so the frame count is `1 + len / hop` regardless of signal length.
pub fn magnitude_spectrogram(samples: &[f64], n_fft: usize, hop: usize) -> Spectrogram {
    let n_bins = n_fft / 2 + 1;
    let n_frames = samples.len() / hop + 1;
    let hann = hann_window(n_fft);

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n_fft);

    let pad = (n_fft / 2) as isize;
    let mut buffer = vec![Complex::new(0.0, 0.0); n_fft];
    let mut frames = Vec::with_capacity(n_frames);

    for t in 0..n_frames {
        let start = (t * hop) as isize - pad;
        for (i, slot) in buffer.iter_mut().enumerate() {
            let idx = reflect_index(start + i as isize, samples.len());
            *slot = Complex::new(samples[idx] * hann[i], 0.0);
        }
        fft.process(&mut buffer);

        frames.push(buffer[..n_bins].iter().map(|c| c.norm()).collect());
    }

    Spectrogram { frames, n_bins }
}

/// Per-frame root-mean-square energy over zero-padded centered frames.
pub fn rms_per_frame(samples: &[f64], frame_len: usize, hop: usize) -> Vec<f64> {
    let n_frames = samples.len() / hop + 1;
    let pad = (frame_len / 2) as isize;

    (0..n_frames)
        .map(|t| {
            let start = (t * hop) as isize - pad;
            let mut sum_sq = 0.0;
            for i in 0..frame_len {
                let idx = start + i as isize;
                if idx >= 0 && (idx as usize) < samples.len() {
                    let s = samples[idx as usize];
                    sum_sq += s * s;
                }
            }
            (sum_sq / frame_len as f64).sqrt()
        })
        .collect()
}

/// Per-frame zero-crossing rate over centered frames.
pub fn zcr_per_frame(samples: &[f64], frame_len: usize, hop: usize) -> Vec<f64> {
    let n_frames = samples.len() / hop + 1;
    let pad = (frame_len / 2) as isize;

    // Edge padding: out-of-range indices read the nearest real sample, so
    // the padding itself never produces a crossing.
    let at = |idx: isize| -> f64 {
        let clamped = idx.clamp(0, samples.len() as isize - 1);
        samples[clamped as usize]
    };

    (0..n_frames)
        .map(|t| {
            let start = (t * hop) as isize - pad;
            let mut crossings = 0u32;
            for i in 1..frame_len {
                let prev = at(start + i as isize - 1);
                let cur = at(start + i as isize);
                if (cur >= 0.0) != (prev >= 0.0) {
                    crossings += 1;
                }
            }
            crossings as f64 / frame_len as f64
        })
        .collect()
}

fn hann_window(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f64::consts::PI * i as f64 / (size - 1) as f64).cos()))
        .collect()
}

/// Reflect `i` into `[0, len)` without repeating the edge sample.
fn reflect_index(i: isize, len: usize) -> usize {
    debug_assert!(len > 0);
    if len == 1 {
        return 0;
    }
    let len = len as isize;
    let period = 2 * (len - 1);
    let mut j = i % period;
    if j < 0 {
        j += period;
    }
    if j >= len {
        j = period - j;
    }
    j as usize
}
