/*
MIT License

Copyright (c) 2024 Philipp Schuster

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/
//! Module for [`TempoTracker`].

use crate::config::{ConfigError, TrackerConfig};
use crate::layer_analysis::beat_placer::BeatPlacer;
use crate::layer_analysis::period_estimator::{PeriodEstimate, PeriodEstimator};
use crate::layer_input_processing::conversion;
use crate::layer_input_processing::onset::DetectionFunction;
use alloc::vec::Vec;

/// Result of [`TempoTracker::analyze`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackingResult {
    /// Beat period per frame and the segments of stable tempo.
    pub estimate: PeriodEstimate,
    /// Beat positions as ascending frame indices.
    pub beats: Vec<f64>,
}

/// Offline tempo and beat tracker following the properties described in the
/// [module description].
///
/// The tracker only holds immutable configuration. Every call works on its own
/// buffers, so one tracker can analyze any number of detection functions, also
/// from multiple threads at once.
///
/// ## Example
/// ```rust
/// use beat_tracker::TempoTracker;
/// // Onset detection function of 44.1 kHz audio with a hop size of 512.
/// let df = (0..1024)
///     .map(|frame| if frame % 43 == 0 { 1.0 } else { 0.0 })
///     .collect::<Vec<f64>>();
/// let tracker = TempoTracker::new(44100.0, 512);
///
/// let result = tracker.analyze(&df);
/// let bpm = result.estimate.median_bpm().unwrap();
/// assert!((bpm - 120.0).abs() < 1.0);
/// let seconds = tracker.beats_to_seconds(&result.beats).unwrap();
/// assert_eq!(seconds.len(), result.beats.len());
/// ```
///
/// [module description]: crate
#[derive(Debug, Clone, PartialEq)]
pub struct TempoTracker {
    sample_rate: f32,
    frame_increment: i32,
    config: TrackerConfig,
}

impl TempoTracker {
    /// Creates a tracker with the default configuration.
    ///
    /// `sample_rate` is the sample rate of the audio in Hz and
    /// `frame_increment` the number of samples between two frames of the
    /// detection function. Neither is validated: non-physical values only
    /// disable the results that need a frame rate, such as the tempo in BPM.
    #[must_use]
    pub fn new(sample_rate: f32, frame_increment: i32) -> Self {
        Self {
            sample_rate,
            frame_increment,
            config: TrackerConfig::default(),
        }
    }

    /// Creates a tracker with a custom configuration.
    pub fn with_config(
        sample_rate: f32,
        frame_increment: i32,
        config: TrackerConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            sample_rate,
            frame_increment,
            config,
        })
    }

    /// Returns a builder to tune individual parameters.
    #[must_use]
    pub fn builder(sample_rate: f32, frame_increment: i32) -> TrackerBuilder {
        TrackerBuilder::new(sample_rate, frame_increment)
    }

    /// Sample rate of the audio in Hz.
    #[must_use]
    pub const fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Samples between two frames of the detection function.
    #[must_use]
    pub const fn frame_increment(&self) -> i32 {
        self.frame_increment
    }

    #[must_use]
    pub const fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Frames of the detection function per second of audio, if the session
    /// describes a physical frame rate.
    #[must_use]
    pub fn frames_per_second(&self) -> Option<f64> {
        conversion::frames_per_second(self.sample_rate, self.frame_increment)
    }

    /// Estimates the beat period of every frame of the detection function
    /// and the tempo of each segment of stable tempo.
    ///
    /// Negative or non-finite onset strengths are treated as zero.
    #[must_use]
    pub fn estimate_period(&self, df: &[f64]) -> PeriodEstimate {
        self.estimate_period_of(&DetectionFunction::new(df))
    }

    /// Places beats on the detection function, guided by one beat period per
    /// frame. The period series may differ in length from the detection
    /// function: frames past its end use its last value.
    #[must_use]
    pub fn place_beats(&self, df: &[f64], beat_periods: &[f64]) -> Vec<f64> {
        self.place_beats_of(&DetectionFunction::new(df), beat_periods)
    }

    /// Runs [`Self::estimate_period`] and [`Self::place_beats`] in sequence.
    #[must_use]
    pub fn analyze(&self, df: &[f64]) -> TrackingResult {
        let df = DetectionFunction::new(df);
        let estimate = self.estimate_period_of(&df);
        let beats = self.place_beats_of(&df, estimate.beat_periods());
        TrackingResult { estimate, beats }
    }

    /// Transforms beat positions (in frames) to seconds. Returns `None` if the
    /// session has no physical frame rate.
    #[must_use]
    pub fn beats_to_seconds(&self, beats: &[f64]) -> Option<Vec<f64>> {
        let fps = self.frames_per_second()?;
        beats
            .iter()
            .map(|&frame| conversion::frame_to_seconds(frame, fps))
            .collect()
    }

    pub(crate) fn estimate_period_of(&self, df: &DetectionFunction) -> PeriodEstimate {
        PeriodEstimator::new(&self.config.period, self.frames_per_second()).estimate(df)
    }

    pub(crate) fn place_beats_of(&self, df: &DetectionFunction, beat_periods: &[f64]) -> Vec<f64> {
        BeatPlacer::new(&self.config.beats).place(df, beat_periods)
    }
}

/// Builder for a [`TempoTracker`] with custom tuning parameters. Created by
/// [`TempoTracker::builder`].
#[derive(Debug, Clone)]
pub struct TrackerBuilder {
    sample_rate: f32,
    frame_increment: i32,
    config: TrackerConfig,
}

impl TrackerBuilder {
    fn new(sample_rate: f32, frame_increment: i32) -> Self {
        Self {
            sample_rate,
            frame_increment,
            config: TrackerConfig::default(),
        }
    }

    /// Replaces all parameters at once.
    #[must_use]
    pub fn config(mut self, config: TrackerConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn window_length(mut self, frames: usize) -> Self {
        self.config.period.window_length = frames;
        self
    }

    #[must_use]
    pub fn window_step(mut self, frames: usize) -> Self {
        self.config.period.window_step = frames;
        self
    }

    #[must_use]
    pub fn lag_count(mut self, count: usize) -> Self {
        self.config.period.lag_count = count;
        self
    }

    #[must_use]
    pub fn comb_elements(mut self, count: usize) -> Self {
        self.config.period.comb_elements = count;
        self
    }

    #[must_use]
    pub fn preferred_bpm(mut self, bpm: f64) -> Self {
        self.config.period.preferred_bpm = bpm;
        self
    }

    /// Only consider tempi close to [`Self::preferred_bpm`].
    #[must_use]
    pub fn constrain_tempo(mut self, constrain: bool) -> Self {
        self.config.period.constrain_tempo = constrain;
        self
    }

    /// Range of tempi to search, in BPM.
    #[must_use]
    pub fn tempo_range(mut self, min_bpm: f64, max_bpm: f64) -> Self {
        self.config.period.min_bpm = min_bpm;
        self.config.period.max_bpm = max_bpm;
        self
    }

    #[must_use]
    pub fn transition_sigma(mut self, sigma: f64) -> Self {
        self.config.period.transition_sigma = sigma;
        self
    }

    #[must_use]
    pub fn segment_tolerance(mut self, tolerance: f64) -> Self {
        self.config.period.segment_tolerance = tolerance;
        self
    }

    /// Low-pass filter the detection function before estimating the period.
    #[must_use]
    pub fn smooth_input(mut self, smooth: bool) -> Self {
        self.config.period.smooth_input = smooth;
        self
    }

    /// Weight of the predecessor score against the onset strength.
    #[must_use]
    pub fn alpha(mut self, alpha: f64) -> Self {
        self.config.beats.alpha = alpha;
        self
    }

    /// How strictly beat gaps must follow the beat period.
    #[must_use]
    pub fn tightness(mut self, tightness: f64) -> Self {
        self.config.beats.tightness = tightness;
        self
    }

    /// Validates the parameters and creates the tracker.
    pub fn build(self) -> Result<TempoTracker, ConfigError> {
        TempoTracker::with_config(self.sample_rate, self.frame_increment, self.config)
    }
}
