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
//! Placement of beats with dynamic programming.
//!
//! Every frame gets a cumulative score: its own onset strength plus the best
//! score of a predecessor roughly one beat period earlier, weighted by how
//! well the gap matches the period. The beats are recovered by backtracking
//! from the best frame near the end of the signal.
//!
//! Reference: Ellis, "Beat Tracking by Dynamic Programming" (JNMR 2007)

use super::math::{first_max_index, last_max_index};
use crate::config::BeatPlacerConfig;
use crate::layer_input_processing::onset::DetectionFunction;
use alloc::vec;
use alloc::vec::Vec;

/// Cumulative scores and the best predecessor of every frame.
#[derive(Debug)]
struct ScoreTrellis {
    cumulative: Vec<f64>,
    backlink: Vec<Option<usize>>,
}

/// Places beats according to the [module description].
///
/// [module description]: self
#[derive(Debug)]
pub struct BeatPlacer<'a> {
    config: &'a BeatPlacerConfig,
}

impl<'a> BeatPlacer<'a> {
    #[must_use]
    pub const fn new(config: &'a BeatPlacerConfig) -> Self {
        Self { config }
    }

    /// Returns the beat positions as ascending frame indices.
    ///
    /// Frame `i` uses `beat_periods[min(i, M - 1)]`, so the period series may
    /// be shorter or longer than the detection function. Returns no beats for
    /// empty inputs, a silent detection function, or when no frame has a
    /// usable period.
    #[must_use]
    pub fn place(&self, df: &DetectionFunction, beat_periods: &[f64]) -> Vec<f64> {
        if df.is_empty() || beat_periods.is_empty() {
            return Vec::new();
        }
        if df.is_silent() {
            log::debug!("Silent detection function: no beats");
            return Vec::new();
        }
        if !beat_periods.iter().copied().any(is_usable_period) {
            log::warn!("No usable beat period among {} values: no beats", beat_periods.len());
            return Vec::new();
        }

        let trellis = self.score(df.values(), beat_periods);
        let Some(terminal) = terminal_frame(&trellis.cumulative, beat_periods) else {
            return Vec::new();
        };
        if trellis.cumulative[terminal] <= 0.0 {
            return Vec::new();
        }

        let mut beats = Vec::new();
        let mut frame = Some(terminal);
        while let Some(current) = frame {
            beats.push(current as f64);
            frame = trellis.backlink[current];
        }
        beats.reverse();

        log::debug!(
            "Placed {} beats over {} frames (terminal frame {terminal})",
            beats.len(),
            df.len()
        );
        beats
    }

    fn score(&self, df: &[f64], beat_periods: &[f64]) -> ScoreTrellis {
        let alpha = self.config.alpha;
        let mut cumulative = vec![0.0; df.len()];
        let mut backlink = vec![None; df.len()];
        let mut candidates = Vec::new();

        for (i, &onset) in df.iter().enumerate() {
            let period = period_at(beat_periods, i);
            let mut best = 0.0;

            if is_usable_period(period) {
                let first = i.saturating_sub(libm::trunc(2.0 * period) as usize);
                let closest = libm::round(period / 2.0) as usize;
                if let Some(last) = i.checked_sub(closest) {
                    candidates.clear();
                    candidates.extend((first..=last).map(|c| {
                        self.transition_weight((i - c) as f64, period) * cumulative[c]
                    }));
                    if let Some(index) = first_max_index(&candidates, 0..candidates.len()) {
                        if candidates[index] > 0.0 {
                            best = candidates[index];
                            backlink[i] = Some(first + index);
                        }
                    }
                }
            }

            cumulative[i] = alpha * best + (1.0 - alpha) * onset;
        }

        ScoreTrellis {
            cumulative,
            backlink,
        }
    }

    /// Log-Gaussian weight of a gap between two beats, one for a gap of
    /// exactly one period.
    fn transition_weight(&self, gap: f64, period: f64) -> f64 {
        let deviation = self.config.tightness * libm::log(gap / period);
        libm::exp(-0.5 * deviation * deviation)
    }
}

fn is_usable_period(period: f64) -> bool {
    period.is_finite() && period >= 1.0
}

fn period_at(beat_periods: &[f64], frame: usize) -> f64 {
    beat_periods[frame.min(beat_periods.len() - 1)]
}

/// The latest frame with the maximal cumulative score within the last beat
/// period. Searches the whole signal when the last period is unusable.
fn terminal_frame(cumulative: &[f64], beat_periods: &[f64]) -> Option<usize> {
    let len = cumulative.len();
    let last_period = period_at(beat_periods, beat_periods.len() - 1);
    let first = if is_usable_period(last_period) {
        len.saturating_sub(libm::round(last_period) as usize)
    } else {
        0
    };
    last_max_index(cumulative, first..len)
}
