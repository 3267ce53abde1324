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
//! Estimation of the beat period for every frame of a detection function.
//!
//! The detection function is cut into overlapping windows. For each window,
//! the periodicity of the signal is measured with a comb filterbank over its
//! autocorrelation, biased by a tempo prior. The most likely sequence of
//! periods across all windows is decoded with [`decode_period_path`]. Octave
//! errors of the decoded periods are corrected with [`resolve_octave`], and
//! the result is expanded back to one period per frame.
//!
//! References:
//! - Davies & Plumbley, "Context-Dependent Beat Tracking of Musical Audio"
//!   (IEEE TASLP 2007)
//! - Stark, Davies & Plumbley, "Real-Time Beat-Synchronous Analysis of Musical
//!   Audio" (DAFx 2009)

use super::math::{adaptive_threshold, autocorrelation, normalize_sum};
use super::octave::{resolve_octave, salience};
use super::tempo_segments::{find_tempo_segments, median_bpm, TempoSegment};
use super::viterbi::{decode_period_path, LagRange};
use super::EPS;
use crate::config::PeriodEstimatorConfig;
use crate::layer_input_processing::conversion::bpm_to_period;
use crate::layer_input_processing::onset::DetectionFunction;
use crate::layer_input_processing::smoothing::ZeroPhaseLowpass;
use alloc::vec;
use alloc::vec::Vec;
use core::iter;

/// Frame rate the tempo prior falls back to when the session has no physical
/// frame rate: 44.1 kHz with a frame increment of 512 samples.
const REFERENCE_FPS: f64 = 44100.0 / 512.0;

/// Result of the period estimation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodEstimate {
    beat_periods: Vec<f64>,
    segments: Vec<TempoSegment>,
}

impl PeriodEstimate {
    /// Beat period in frames, one per frame of the detection function.
    #[must_use]
    pub fn beat_periods(&self) -> &[f64] {
        &self.beat_periods
    }

    /// Segments of stable tempo.
    #[must_use]
    pub fn segments(&self) -> &[TempoSegment] {
        &self.segments
    }

    /// Tempo in beats per minute, one per segment of stable tempo.
    #[must_use]
    pub fn tempi(&self) -> Vec<f64> {
        self.segments.iter().map(|segment| segment.bpm).collect()
    }

    /// Median tempo over all frames, if any tempo was found.
    #[must_use]
    pub fn median_bpm(&self) -> Option<f64> {
        median_bpm(&self.segments)
    }

    /// Returns the beat periods and the tempo segments.
    #[must_use]
    pub fn into_parts(self) -> (Vec<f64>, Vec<TempoSegment>) {
        (self.beat_periods, self.segments)
    }
}

/// Estimates beat periods according to the [module description].
///
/// [module description]: self
#[derive(Debug)]
pub struct PeriodEstimator<'a> {
    config: &'a PeriodEstimatorConfig,
    fps: Option<f64>,
}

impl<'a> PeriodEstimator<'a> {
    /// Creates a new estimator. `fps` is the frame rate of the detection
    /// function, if it is physical.
    #[must_use]
    pub const fn new(config: &'a PeriodEstimatorConfig, fps: Option<f64>) -> Self {
        Self { config, fps }
    }

    /// Estimates the beat period of every frame.
    ///
    /// Never fails: when the signal carries no usable periodicity, the result
    /// degrades to a constant fallback period.
    #[must_use]
    pub fn estimate(&self, df: &DetectionFunction) -> PeriodEstimate {
        let len = df.len();
        if len == 0 {
            return PeriodEstimate::default();
        }
        if self.fps.is_none() {
            log::warn!("The frame rate is not physical: tempo segments are not reported");
        }

        let lags = LagRange::from_tempo_range(
            self.config.min_bpm,
            self.config.max_bpm,
            self.fps,
            self.config.lag_count,
        );
        let fallback = self.fallback_period(lags);

        if df.is_silent() {
            log::debug!("Silent detection function: using fallback period {fallback}");
            return PeriodEstimate {
                beat_periods: vec![fallback; len],
                segments: Vec::new(),
            };
        }

        let Some(lags) = lags else {
            log::warn!(
                "Tempo range {}..={} BPM is not representable with {} candidate periods: using fallback period {fallback}",
                self.config.min_bpm,
                self.config.max_bpm,
                self.config.lag_count
            );
            return self.constant_estimate(fallback, len);
        };

        let mut df = df.clone();
        if self.config.smooth_input {
            ZeroPhaseLowpass::new().process(df.values_mut());
        }

        let prior = self.tempo_prior();
        let (observations, saliences): (Vec<_>, Vec<_>) = self
            .window_starts(len)
            .map(|start| {
                self.analyze_window(&df.values()[start..start + self.config.window_length], &prior, lags)
            })
            .unzip();

        if observations.is_empty() {
            log::debug!(
                "Detection function shorter than one window ({len} < {} frames): using fallback period {fallback}",
                self.config.window_length
            );
            return self.constant_estimate(fallback, len);
        }

        let decoded = decode_period_path(&observations, &prior, lags, self.config.transition_sigma);
        log::trace!("Beat period per window: {decoded:?}");
        let path = decoded
            .iter()
            .zip(&saliences)
            .map(|(&period, salience)| resolve_octave(salience, period, lags))
            .collect::<Vec<_>>();
        let corrected = path.iter().zip(&decoded).filter(|(a, b)| a != b).count();
        if corrected > 0 {
            log::debug!("Corrected octave errors in {corrected} of {} windows", path.len());
        }

        let beat_periods = expand_path(&path, self.config.window_step, len);
        let segments = find_tempo_segments(&beat_periods, self.fps, self.config.segment_tolerance);
        log::debug!(
            "Estimated beat periods for {len} frames from {} windows: {} tempo segments",
            path.len(),
            segments.len()
        );

        PeriodEstimate {
            beat_periods,
            segments,
        }
    }

    fn constant_estimate(&self, period: f64, len: usize) -> PeriodEstimate {
        let beat_periods = vec![period; len];
        let segments = find_tempo_segments(&beat_periods, self.fps, self.config.segment_tolerance);
        PeriodEstimate {
            beat_periods,
            segments,
        }
    }

    /// Start frames of all complete analysis windows.
    fn window_starts(&self, len: usize) -> impl Iterator<Item = usize> {
        let window_length = self.config.window_length;
        (0..len)
            .step_by(self.config.window_step)
            .take_while(move |start| start + window_length <= len)
    }

    /// Period of the preferred tempo, in frames. Uses the reference frame rate
    /// if there is no physical one.
    fn preferred_period(&self) -> f64 {
        // `None` only for an unvalidated, non-positive preferred tempo.
        bpm_to_period(self.config.preferred_bpm, self.fps.unwrap_or(REFERENCE_FPS)).unwrap_or(1.0)
    }

    /// Period used when the detection function does not reveal one.
    fn fallback_period(&self, lags: Option<LagRange>) -> f64 {
        let period = libm::round(self.preferred_period()).max(1.0);
        match lags {
            Some(lags) if self.fps.is_some() => lags.clamp(period as usize) as f64,
            _ => period,
        }
    }

    /// Weights of all candidate periods, favouring periods close to the
    /// preferred tempo.
    fn tempo_prior(&self) -> Vec<f64> {
        let beta = self.preferred_period();
        (0..self.config.lag_count)
            .map(|lag| {
                let lag = lag as f64;
                if self.config.constrain_tempo {
                    let sigma = beta / 4.0;
                    libm::exp(-((lag - beta) * (lag - beta)) / (2.0 * sigma * sigma))
                } else {
                    // Rayleigh distribution
                    lag / (beta * beta) * libm::exp(-(lag * lag) / (2.0 * beta * beta))
                }
            })
            .collect()
    }

    /// Returns the confidence per candidate period for one window, normalized
    /// to a sum of one, and the salience of its autocorrelation.
    fn analyze_window(&self, window: &[f64], prior: &[f64], lags: LagRange) -> (Vec<f64>, Vec<f64>) {
        let mut window = window.to_vec();
        adaptive_threshold(&mut window);
        let acf = autocorrelation(&window);

        let mut combs = vec![0.0; prior.len()];
        for lag in 1..prior.len() - 1 {
            for element in 1..=self.config.comb_elements {
                // Harmonic `element` spreads over `2 * element - 1` lags.
                let width = 2 * element - 1;
                let sum = acf.iter().skip(element * lag).take(width).sum::<f64>();
                combs[lag] += sum * prior[lag] / width as f64;
            }
        }

        adaptive_threshold(&mut combs);
        for comb in combs.iter_mut() {
            *comb += EPS;
        }
        normalize_sum(&mut combs, EPS);
        (combs, salience(&acf, prior.len(), lags))
    }
}

/// Expands one period per window to one period per frame. Frames after the
/// last window keep its period.
fn expand_path(path: &[usize], window_step: usize, len: usize) -> Vec<f64> {
    let mut periods = path
        .iter()
        .flat_map(|&period| iter::repeat(period as f64).take(window_step))
        .take(len)
        .collect::<Vec<_>>();
    let last = periods.last().copied().unwrap_or_default();
    periods.resize(len, last);
    periods
}
