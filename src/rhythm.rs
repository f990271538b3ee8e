//! Tempo estimation, beat tracking and the beat-derived scores.

use crate::dsp::{stats, HOP};

const DEFAULT_BPM: f64 = 120.0;
const MIN_BPM: f64 = 30.0;
const MAX_BPM: f64 = 300.0;

/// Transition penalty for the dynamic-programming beat tracker.
const TIGHTNESS: f64 = 100.0;

/// Beat-derived scores produced by the rhythm pass.
#[derive(Debug, Clone, Copy)]
pub struct RhythmSummary {
    pub tempo: f64,
    pub beat_regularity: f64,
    pub strength_score: f64,
    pub danceability: f64,
}

/// Estimate the dominant tempo in BPM from the onset envelope.
///
/// Autocorrelation over the beat-period lag range, weighted by a log-normal
/// prior centered at 120 BPM (one octave standard deviation). A flat or
/// too-short envelope falls back to 120 BPM.
pub fn estimate_tempo(onset_env: &[f64], sample_rate: u32) -> f64 {
    let frame_rate = sample_rate as f64 / HOP as f64;
    let min_lag = ((60.0 / MAX_BPM * frame_rate).floor() as usize).max(1);
    let max_lag = ((60.0 / MIN_BPM * frame_rate).ceil() as usize)
        .min(onset_env.len().saturating_sub(1));

    if max_lag < min_lag {
        return DEFAULT_BPM;
    }

    let mut best_bpm = DEFAULT_BPM;
    let mut best_score = 0.0f64;
    for lag in min_lag..=max_lag {
        let ac: f64 = onset_env
            .iter()
            .zip(onset_env[lag..].iter())
            .map(|(&a, &b)| a * b)
            .sum();
        let bpm = 60.0 * frame_rate / lag as f64;
        let prior = (-0.5 * (bpm / DEFAULT_BPM).log2().powi(2)).exp();
        let score = ac * prior;
        if score > best_score {
            best_score = score;
            best_bpm = bpm;
        }
    }

    if best_score > 0.0 {
        best_bpm
    } else {
        DEFAULT_BPM
    }
}

/// Track beat positions as onset-envelope frame indices.
///
/// Dynamic programming over the envelope: each frame's cumulative score is
/// its onset strength plus the best predecessor score one beat period back,
/// penalized by the squared log deviation from the period. Backtracking the
/// winning chain yields the beat sequence.
pub fn track_beats(onset_env: &[f64], sample_rate: u32, tempo: f64) -> Vec<usize> {
    let n = onset_env.len();
    if n < 2 || tempo <= 0.0 {
        return Vec::new();
    }
    let sd = stats::stddev(onset_env);
    if sd == 0.0 {
        // Flat envelope: nothing to synchronize to.
        return Vec::new();
    }
    let local: Vec<f64> = onset_env.iter().map(|&v| v / sd).collect();

    let frame_rate = sample_rate as f64 / HOP as f64;
    let period = ((60.0 / tempo * frame_rate).round() as usize).max(1);
    let half = (period / 2).max(1);

    let mut cumscore = vec![0.0f64; n];
    let mut backlink = vec![-1isize; n];

    for i in 0..n {
        cumscore[i] = local[i];
        if i < half {
            continue;
        }
        let lo = i.saturating_sub(2 * period);
        let hi = i - half;

        let mut best_j = None;
        let mut best_s = f64::NEG_INFINITY;
        for j in lo..=hi {
            let stretch = (i - j) as f64 / period as f64;
            let s = cumscore[j] - TIGHTNESS * stretch.ln().powi(2);
            if s > best_s {
                best_s = s;
                best_j = Some(j);
            }
        }
        if let Some(j) = best_j {
            if best_s > 0.0 {
                cumscore[i] = local[i] + best_s;
                backlink[i] = j as isize;
            }
        }
    }

    let end = cumscore
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);

    let mut beats = Vec::new();
    let mut cur = end as isize;
    while cur >= 0 {
        beats.push(cur as usize);
        cur = backlink[cur as usize];
    }
    beats.reverse();
    beats
}

/// Clip raw beat indices into `[0, n_frames]` and pad with both endpoints,
/// sorted and deduplicated.
fn fix_frames(beats: &[usize], n_frames: usize) -> Vec<usize> {
    let mut fixed: Vec<usize> = beats.iter().copied().filter(|&b| b <= n_frames).collect();
    fixed.push(0);
    fixed.push(n_frames);
    fixed.sort_unstable();
    fixed.dedup();
    fixed
}

/// Derive regularity, beat-aligned strength and danceability.
pub fn analyze(onset_env: &[f64], beats: &[usize], tempo: f64) -> RhythmSummary {
    let n = onset_env.len();
    let frames = fix_frames(beats, n);
    let valid: Vec<usize> = frames.iter().copied().filter(|&f| f < n).collect();

    let beat_regularity = if valid.len() < 2 {
        0.0
    } else {
        let gaps: Vec<f64> = frames.windows(2).map(|w| (w[1] - w[0]) as f64).collect();
        let mean_gap = stats::mean(&gaps);
        if mean_gap > 0.0 {
            stats::clamp01(1.0 - stats::stddev(&gaps) / mean_gap)
        } else {
            0.0
        }
    };

    let strength_score = if valid.is_empty() {
        0.0
    } else {
        let strengths: Vec<f64> = valid.iter().map(|&f| onset_env[f]).collect();
        let avg = stats::mean(&strengths);
        1.0 / (1.0 + (-5.0 * (avg - 0.4)).exp())
    };

    let danceability = stats::clamp01(0.7 * beat_regularity + 0.3 * strength_score);

    RhythmSummary {
        tempo,
        beat_regularity,
        strength_score,
        danceability,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SR: u32 = 44100;

    /// Envelope with an impulse every `period` frames.
    fn click_envelope(n: usize, period: usize) -> Vec<f64> {
        (0..n).map(|i| if i % period == 0 { 1.0 } else { 0.0 }).collect()
    }

    #[test]
    fn flat_envelope_falls_back_to_120() {
        assert_eq!(estimate_tempo(&[0.0; 500], SR), 120.0);
        assert_eq!(estimate_tempo(&[], SR), 120.0);
    }

    #[test]
    fn click_train_tempo_is_recovered() {
        // 43 frames at 44100/512 fps is close to 120 BPM.
        let env = click_envelope(1000, 43);
        let bpm = estimate_tempo(&env, SR);
        let expected = 60.0 * (SR as f64 / 512.0) / 43.0;
        assert_relative_eq!(bpm, expected, max_relative = 1e-9);
    }

    #[test]
    fn beats_follow_the_click_train() {
        let env = click_envelope(1000, 43);
        let tempo = estimate_tempo(&env, SR);
        let beats = track_beats(&env, SR, tempo);
        assert!(beats.len() > 10);
        // Spacing hugs the true period.
        for w in beats.windows(2) {
            let gap = w[1] - w[0];
            assert!((40..=46).contains(&gap), "gap {gap} out of range");
        }
    }

    #[test]
    fn regular_beats_score_high_regularity() {
        let env = click_envelope(1000, 43);
        let beats: Vec<usize> = (0..23).map(|i| i * 43).collect();
        let summary = analyze(&env, &beats, 120.0);
        assert!(summary.beat_regularity > 0.8);
        assert!(summary.danceability > 0.5);
    }

    #[test]
    fn no_beats_yields_zero_regularity() {
        let env = vec![0.0; 200];
        let summary = analyze(&env, &[], 120.0);
        assert_eq!(summary.beat_regularity, 0.0);
        // Only frame 0 is valid; its strength is 0, so the sigmoid sits at
        // sigmoid(-2).
        assert_relative_eq!(
            summary.strength_score,
            1.0 / (1.0 + (2.0f64).exp()),
            max_relative = 1e-12
        );
        assert_relative_eq!(
            summary.danceability,
            0.3 * summary.strength_score,
            max_relative = 1e-12
        );
    }

    #[test]
    fn single_beat_yields_zero_regularity() {
        let env = click_envelope(200, 100);
        let summary = analyze(&env, &[100], 120.0);
        // Valid frames are {0, 100}: two of them, so regularity is defined,
        // but one raw beat alone never produces a NaN.
        assert!(summary.beat_regularity.is_finite());
        assert!(summary.danceability.is_finite());
    }

    #[test]
    fn empty_envelope_is_fully_degenerate() {
        let summary = analyze(&[], &[], 120.0);
        assert_eq!(summary.beat_regularity, 0.0);
        assert_eq!(summary.strength_score, 0.0);
        assert_eq!(summary.danceability, 0.0);
    }

    #[test]
    fn flat_envelope_has_no_beats() {
        assert!(track_beats(&[0.5; 300], SR, 120.0).is_empty());
        assert!(track_beats(&[], SR, 120.0).is_empty());
    }
}
