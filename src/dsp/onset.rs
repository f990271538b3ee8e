//! Onset-strength envelope from a mel power spectrogram.

use super::mel::{power_to_db, DbRef};

/// One scalar per frame: the mean positive frame-to-frame increase of the
/// log-mel spectrum. Frame 0 has no predecessor and is 0.
pub fn strength(mel_power: &[Vec<f64>]) -> Vec<f64> {
    if mel_power.is_empty() {
        return Vec::new();
    }

    let log_mel = power_to_db(mel_power, DbRef::Max);
    let n_mels = log_mel[0].len().max(1);

    let mut env = Vec::with_capacity(log_mel.len());
    env.push(0.0);
    for t in 1..log_mel.len() {
        let rise: f64 = log_mel[t]
            .iter()
            .zip(log_mel[t - 1].iter())
            .map(|(&cur, &prev)| (cur - prev).max(0.0))
            .sum();
        env.push(rise / n_mels as f64);
    }
    env
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_matches_frame_count_and_rectifies() {
        // A quiet frame, a loud frame, then quiet again: only the rise
        // registers, never the fall.
        let quiet = vec![1e-6; 4];
        let loud = vec![1.0; 4];
        let mel = vec![quiet.clone(), loud, quiet];
        let env = strength(&mel);
        assert_eq!(env.len(), 3);
        assert_eq!(env[0], 0.0);
        assert!(env[1] > 0.0);
        assert_eq!(env[2], 0.0);
    }

    #[test]
    fn silence_has_flat_envelope() {
        let mel = vec![vec![0.0; 8]; 10];
        let env = strength(&mel);
        assert!(env.iter().all(|&v| v == 0.0));
    }
}
