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
//! Tuning parameters of the tracking pipeline.
//!
//! The defaults are the well-established values of the two-state tempo model
//! by Davies & Plumbley and the dynamic programming beat tracker by Ellis.
//! They assume detection functions at roughly 86 frames per second
//! (44.1 kHz with a frame increment of 512 samples).

use thiserror::Error;

/// Parameters of the period estimator.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodEstimatorConfig {
    /// Length of one analysis window in frames (roughly 6 seconds).
    pub window_length: usize,
    /// Hop between two analysis windows in frames (roughly 1.5 seconds).
    pub window_step: usize,
    /// Number of candidate periods in the comb filterbank. Candidate `k` is a
    /// period of `k` frames.
    pub lag_count: usize,
    /// Number of harmonics each comb filter sums up.
    pub comb_elements: usize,
    /// The tempo the prior favours. Must be within `min_bpm..=max_bpm`.
    pub preferred_bpm: f64,
    /// Replaces the broad Rayleigh prior by a narrow Gaussian around
    /// [`Self::preferred_bpm`].
    pub constrain_tempo: bool,
    /// Lower bound of the tempo search range.
    pub min_bpm: f64,
    /// Upper bound of the tempo search range.
    pub max_bpm: f64,
    /// Standard deviation (in frames) of the Gaussian transition weights
    /// between the periods of two adjacent windows.
    pub transition_sigma: f64,
    /// Relative deviation of a period from the first period of its tempo
    /// segment that still counts as the same tempo.
    pub segment_tolerance: f64,
    /// Runs a zero-phase lowpass over the detection function first.
    pub smooth_input: bool,
}

impl Default for PeriodEstimatorConfig {
    fn default() -> Self {
        Self {
            window_length: 512,
            window_step: 128,
            lag_count: 128,
            comb_elements: 4,
            preferred_bpm: 120.0,
            constrain_tempo: false,
            min_bpm: 40.0,
            max_bpm: 240.0,
            transition_sigma: 8.0,
            segment_tolerance: 0.03,
            smooth_input: false,
        }
    }
}

/// Parameters of the beat placer.
#[derive(Debug, Clone, PartialEq)]
pub struct BeatPlacerConfig {
    /// Balance between the score of the previous beat and the onset strength
    /// of the current frame.
    pub alpha: f64,
    /// How strictly gaps between beats must follow the beat period.
    pub tightness: f64,
}

impl Default for BeatPlacerConfig {
    fn default() -> Self {
        Self {
            alpha: 0.9,
            tightness: 4.0,
        }
    }
}

/// All tuning parameters of a [`crate::TempoTracker`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackerConfig {
    /// Parameters of the period estimator.
    pub period: PeriodEstimatorConfig,
    /// Parameters of the beat placer.
    pub beats: BeatPlacerConfig,
}

/// Invalid tuning parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("window length must be at least 2 frames, got {0}")]
    WindowLength(usize),
    #[error("window step must be in range 1..={window_length}, got {step}")]
    WindowStep { step: usize, window_length: usize },
    #[error("lag count must be at least 3, got {0}")]
    LagCount(usize),
    #[error("at least one comb element is required")]
    CombElements,
    #[error("preferred tempo must be finite and positive, got {0}")]
    PreferredBpm(f64),
    #[error("invalid tempo range: {min}..={max}")]
    TempoRange { min: f64, max: f64 },
    #[error("preferred tempo {bpm} is outside of the tempo range {min}..={max}")]
    PreferredBpmOutOfRange { bpm: f64, min: f64, max: f64 },
    #[error("transition sigma must be finite and positive, got {0}")]
    TransitionSigma(f64),
    #[error("segment tolerance must be finite and not negative, got {0}")]
    SegmentTolerance(f64),
    #[error("alpha must be in range 0.0..=1.0, got {0}")]
    Alpha(f64),
    #[error("tightness must be finite and positive, got {0}")]
    Tightness(f64),
}

fn is_finite_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

impl PeriodEstimatorConfig {
    /// Checks that all parameters are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_length < 2 {
            return Err(ConfigError::WindowLength(self.window_length));
        }
        if self.window_step == 0 || self.window_step > self.window_length {
            return Err(ConfigError::WindowStep {
                step: self.window_step,
                window_length: self.window_length,
            });
        }
        if self.lag_count < 3 {
            return Err(ConfigError::LagCount(self.lag_count));
        }
        if self.comb_elements == 0 {
            return Err(ConfigError::CombElements);
        }
        if !is_finite_positive(self.preferred_bpm) {
            return Err(ConfigError::PreferredBpm(self.preferred_bpm));
        }
        if !is_finite_positive(self.min_bpm)
            || !is_finite_positive(self.max_bpm)
            || self.min_bpm >= self.max_bpm
        {
            return Err(ConfigError::TempoRange {
                min: self.min_bpm,
                max: self.max_bpm,
            });
        }
        if !(self.min_bpm..=self.max_bpm).contains(&self.preferred_bpm) {
            return Err(ConfigError::PreferredBpmOutOfRange {
                bpm: self.preferred_bpm,
                min: self.min_bpm,
                max: self.max_bpm,
            });
        }
        if !is_finite_positive(self.transition_sigma) {
            return Err(ConfigError::TransitionSigma(self.transition_sigma));
        }
        if !self.segment_tolerance.is_finite() || self.segment_tolerance < 0.0 {
            return Err(ConfigError::SegmentTolerance(self.segment_tolerance));
        }
        Ok(())
    }
}

impl BeatPlacerConfig {
    /// Checks that all parameters are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(ConfigError::Alpha(self.alpha));
        }
        if !is_finite_positive(self.tightness) {
            return Err(ConfigError::Tightness(self.tightness));
        }
        Ok(())
    }
}

impl TrackerConfig {
    /// Checks that all parameters are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.period.validate()?;
        self.beats.validate()
    }
}
