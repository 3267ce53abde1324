//! Integration tests of the public tracking API on synthetic detection
//! functions.

use assert2::check;
use beat_tracker::buffers::{estimate_period_into, place_beats_into, PeriodCounts, UsageError};
use beat_tracker::{DetectionFunction, InvalidOnsetError, TempoTracker, TrackerConfig};
use float_cmp::approx_eq;
use itertools::Itertools;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 44.1 kHz audio with a frame increment of 512 samples.
const SAMPLE_RATE: f32 = 44100.0;
const FRAME_INCREMENT: i32 = 512;

fn impulses(len: usize, period: usize, offset: usize) -> Vec<f64> {
    (0..len)
        .map(|frame| {
            if frame >= offset && (frame - offset) % period == 0 {
                1.0
            } else {
                0.0
            }
        })
        .collect()
}

fn random_df(len: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.random_range(0.0..1.0)).collect()
}

fn assert_valid_beats(beats: &[f64], len: usize) {
    check!(beats.len() <= len);
    check!(beats.iter().all(|&beat| beat >= 0.0 && beat < len as f64));
    check!(beats.iter().tuple_windows().all(|(a, b)| a < b));
}

/// Checks that the periods and beats of an impulse train follow `period`.
fn check_periodic_impulses(tracker: &TempoTracker, len: usize, period: usize) {
    let df = impulses(len, period, 7);
    let result = tracker.analyze(&df);

    check!(result.estimate.beat_periods().len() == df.len());
    let matching = result
        .estimate
        .beat_periods()
        .iter()
        .filter(|&&estimated| (estimated - period as f64).abs() <= 1.0)
        .count();
    check!(matching * 10 >= df.len() * 9, "period {period}: {matching} frames match");

    assert_valid_beats(&result.beats, df.len());
    check!(result.beats.len() >= len / period - 2);
    let intervals = result
        .beats
        .iter()
        .tuple_windows()
        .map(|(a, b)| b - a)
        .collect::<Vec<_>>();
    check!(
        intervals.iter().all(|&interval| interval == period as f64),
        "period {period}: {intervals:?}"
    );
}

#[test]
fn periodic_impulses() {
    let tracker = TempoTracker::new(SAMPLE_RATE, FRAME_INCREMENT);
    for period in [35, 43, 50] {
        check_periodic_impulses(&tracker, 3000, period);
    }
}

#[test]
fn periodic_impulses_across_tempo_range() {
    // The default range of 40..=240 BPM covers periods of 22..=126 frames.
    let tracker = TempoTracker::new(SAMPLE_RATE, FRAME_INCREMENT);
    for period in [22, 23, 25, 28, 29, 30, 64, 96, 97, 100, 113, 120, 126] {
        check_periodic_impulses(&tracker, 4000, period);
    }
}

#[test]
fn random_input_gives_valid_output() {
    let tracker = TempoTracker::new(SAMPLE_RATE, FRAME_INCREMENT);
    for (len, seed) in [(100, 1), (700, 2), (4000, 3)] {
        let df = random_df(len, seed);
        let result = tracker.analyze(&df);

        check!(result.estimate.beat_periods().len() == len);
        check!(result
            .estimate
            .beat_periods()
            .iter()
            .all(|period| period.is_finite() && *period >= 1.0));
        check!(result.estimate.tempi().len() <= len);
        assert_valid_beats(&result.beats, len);
    }
}

#[test]
fn analysis_is_idempotent() {
    let tracker = TempoTracker::new(SAMPLE_RATE, FRAME_INCREMENT);
    let df = random_df(2500, 99);
    check!(tracker.analyze(&df) == tracker.analyze(&df));
}

#[test]
fn silent_input() {
    let tracker = TempoTracker::new(SAMPLE_RATE, FRAME_INCREMENT);
    let df = vec![0.0; 2000];
    let result = tracker.analyze(&df);

    check!(result.estimate.beat_periods() == vec![43.0; 2000].as_slice());
    check!(result.estimate.tempi().is_empty());
    check!(result.estimate.median_bpm() == None);
    check!(result.beats.is_empty());
}

#[test]
fn empty_input() {
    let tracker = TempoTracker::new(SAMPLE_RATE, FRAME_INCREMENT);
    let result = tracker.analyze(&[]);
    check!(result.estimate.beat_periods().is_empty());
    check!(result.estimate.tempi().is_empty());
    check!(result.beats.is_empty());
}

#[test]
fn invalid_values_are_treated_as_silence() {
    let tracker = TempoTracker::new(SAMPLE_RATE, FRAME_INCREMENT);
    let mut df = impulses(2000, 43, 0);
    let clean = tracker.analyze(&df);
    for frame in (5..2000).step_by(43) {
        df[frame] = if frame % 2 == 0 { f64::NAN } else { -3.0 };
    }
    check!(tracker.analyze(&df) == clean);

    check!(DetectionFunction::try_new(&df) == Err((5, InvalidOnsetError::Negative(-3.0))));
}

#[test]
fn tempo_change_is_followed() {
    let tracker = TempoTracker::new(SAMPLE_RATE, FRAME_INCREMENT);
    let mut df = impulses(3000, 43, 0);
    df.extend(impulses(3000, 35, 0));
    let result = tracker.analyze(&df);

    let periods = result.estimate.beat_periods();
    check!(periods[..1000].iter().all(|&period| period == 43.0));
    check!(periods[4500..].iter().all(|&period| period == 35.0));

    let tempi = result.estimate.tempi();
    check!(tempi.len() >= 2);
    check!(approx_eq!(f64, tempi[0], 120.185, epsilon = 1.0));
    check!(approx_eq!(f64, *tempi.last().unwrap(), 147.656, epsilon = 1.0));
    assert_valid_beats(&result.beats, df.len());
}

#[test]
fn construction_is_not_validated() {
    let df = impulses(2000, 43, 0);
    for (sample_rate, frame_increment) in [(0.0, 512), (44100.0, 0), (-44100.0, 512), (f32::NAN, 512)] {
        let tracker = TempoTracker::new(sample_rate, frame_increment);
        check!(tracker.frames_per_second() == None);

        let result = tracker.analyze(&df);
        check!(result.estimate.beat_periods().len() == df.len());
        check!(result.estimate.tempi().is_empty());
        check!(tracker.beats_to_seconds(&result.beats) == None);
        assert_valid_beats(&result.beats, df.len());
    }
}

#[test]
fn custom_configuration() {
    let mut config = TrackerConfig::default();
    config.period.window_length = 256;
    config.period.window_step = 64;
    config.period.preferred_bpm = 100.0;
    let tracker = TempoTracker::with_config(48000.0, 480, config.clone()).unwrap();
    check!(tracker.config() == &config);

    // 100 frames per second, one onset every 0.6 seconds.
    let df = impulses(1500, 60, 0);
    let result = tracker.analyze(&df);
    check!(approx_eq!(f64, result.estimate.median_bpm().unwrap(), 100.0, epsilon = 1.0));

    config.beats.alpha = 1.5;
    check!(TempoTracker::with_config(48000.0, 480, config).is_err());
}

#[test]
fn caller_allocated_buffers() {
    let tracker = TempoTracker::new(SAMPLE_RATE, FRAME_INCREMENT);
    let df = impulses(2000, 43, 0);
    let mut beat_periods = vec![0.0; df.len()];
    let mut tempi = vec![0.0; df.len()];

    let counts = estimate_period_into(
        Some(&tracker),
        Some(&df),
        Some(&mut beat_periods),
        Some(&mut tempi),
    )
    .unwrap();
    check!(counts == PeriodCounts { beat_periods: 2000, tempi: 1 });

    let mut beats = vec![-1.0; df.len()];
    let count = place_beats_into(
        Some(&tracker),
        Some(&df),
        Some(&beat_periods),
        Some(&mut beats),
    )
    .unwrap();
    check!(beats[..count] == tracker.place_beats(&df, &beat_periods)[..]);

    let mut untouched = vec![-1.0; df.len()];
    let err = place_beats_into(Some(&tracker), None, Some(&beat_periods), Some(&mut untouched));
    check!(err == Err(UsageError::MissingArgument("df")));
    check!(untouched.iter().all(|&beat| beat == -1.0));
}
