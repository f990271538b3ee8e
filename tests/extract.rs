//! End-to-end properties of the feature pipeline on synthetic waveforms.

use approx::assert_relative_eq;
use sonotag::audio::Waveform;
use sonotag::features::{extract, TrackFeatures};

const SR: u32 = 22050;

/// Deterministic pseudo-noise, same sequence on every run.
fn noise(n: usize, amp: f32) -> Vec<f32> {
    let mut state = 0x2545f4914f6cdd1du64;
    (0..n)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let unit = (state >> 11) as f32 / (1u64 << 53) as f32;
            (unit * 2.0 - 1.0) * amp
        })
        .collect()
}

/// Three seconds of tone + noise with a click every half second (120 BPM).
fn musical_track(gain: f32) -> Waveform {
    let n = (SR * 3) as usize;
    let mut samples = noise(n, 0.05);
    for (i, s) in samples.iter_mut().enumerate() {
        *s += 0.2 * (2.0 * std::f32::consts::PI * 220.0 * i as f32 / SR as f32).sin();
    }
    // Clicks: short decaying bursts every 0.5 s.
    let period = SR as usize / 2;
    for start in (0..n).step_by(period) {
        for (k, s) in samples[start..(start + 64).min(n)].iter_mut().enumerate() {
            *s += 0.6 * (1.0 - k as f32 / 64.0);
        }
    }
    for s in samples.iter_mut() {
        *s *= gain;
    }
    Waveform {
        samples,
        sample_rate: SR,
    }
}

fn silence(secs: u32) -> Waveform {
    Waveform {
        samples: vec![0.0; (SR * secs) as usize],
        sample_rate: SR,
    }
}

#[test]
fn record_has_exactly_the_twelve_keys_in_order() {
    let record = extract(&musical_track(1.0)).unwrap();
    let json = serde_json::to_string(&record).unwrap();

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let object = value.as_object().unwrap();
    assert_eq!(object.len(), TrackFeatures::KEYS.len());
    for key in TrackFeatures::KEYS {
        assert!(object.contains_key(key), "missing key {key}");
    }

    // Serialization order follows the declared key order.
    let positions: Vec<usize> = TrackFeatures::KEYS
        .iter()
        .map(|k| json.find(&format!("\"{k}\":")).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn extraction_is_deterministic() {
    let track = musical_track(1.0);
    let a = extract(&track).unwrap();
    let b = extract(&track).unwrap();
    assert_eq!(a, b);
}

#[test]
fn bounded_features_stay_in_unit_range() {
    let r = extract(&musical_track(1.0)).unwrap();
    for (name, value) in [
        ("acousticness", r.acousticness),
        ("dynamic_range", r.dynamic_range),
        ("energy", r.energy),
        ("brightness", r.brightness),
        ("fullness", r.fullness),
        ("density", r.density),
        ("instrumentalness", r.instrumentalness),
        ("danceability", r.danceability),
        ("valence", r.valence),
        ("tension", r.tension),
    ] {
        assert!(
            (0.0..=1.0).contains(&value),
            "{name} = {value} out of range"
        );
    }
    assert_relative_eq!(r.duration, 3.0, max_relative = 1e-9);
    assert!(r.tempo > 0.0);
}

#[test]
fn silence_is_degenerate_but_complete() {
    let r = extract(&silence(1)).unwrap();
    assert_eq!(r.energy, 0.0);
    assert_eq!(r.density, 0.0);
    assert_eq!(r.dynamic_range, 0.0);
    assert_eq!(r.brightness, 0.0);
    assert_eq!(r.fullness, 0.0);
    // No beats can be detected, so danceability reduces to the strength term.
    assert_relative_eq!(r.danceability, 0.3 * (1.0 / (1.0 + (2.0f64).exp())));
    // Every value must still be a finite number.
    let json = serde_json::to_value(&r).unwrap();
    for (key, value) in json.as_object().unwrap() {
        assert!(value.as_f64().unwrap().is_finite(), "{key} not finite");
    }
}

#[test]
fn one_second_of_silence_has_unit_duration() {
    let r = extract(&silence(1)).unwrap();
    assert_relative_eq!(r.duration, 1.0);
}

#[test]
fn amplitude_scaling_leaves_hz_normalized_features_unchanged() {
    // Doubling is exact in floating point, so frequency-normalized
    // features must not move at all.
    let quiet = extract(&musical_track(0.5)).unwrap();
    let loud = extract(&musical_track(1.0)).unwrap();

    assert_relative_eq!(quiet.brightness, loud.brightness, max_relative = 1e-12);
    assert_relative_eq!(quiet.fullness, loud.fullness, max_relative = 1e-12);
    assert_relative_eq!(quiet.tempo, loud.tempo, max_relative = 1e-9);
    assert_relative_eq!(quiet.valence, loud.valence, max_relative = 1e-9);
    assert_relative_eq!(quiet.duration, loud.duration);

    // Energy is amplitude-sensitive by design and doubles with the gain.
    assert_relative_eq!(loud.energy, 2.0 * quiet.energy, max_relative = 1e-9);
}
