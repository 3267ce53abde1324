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
//! Viterbi decoding of the most likely beat period path through the analysis
//! windows.
//!
//! Each window contributes an observation: a confidence per candidate period.
//! Adjacent windows are connected by Gaussian transition weights, so that the
//! decoded path prefers slow tempo changes over jumps between unrelated
//! periods (e.g. double or half tempo).

use super::math::{first_max_index, normalize_sum};
use super::EPS;
use alloc::vec;
use alloc::vec::Vec;
use core::ops::RangeInclusive;

/// Inclusive range of candidate beat periods in frames. Never empty and never
/// contains `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LagRange {
    min: usize,
    max: usize,
}

impl LagRange {
    /// Creates a new range. Returns `None` if the range would be empty or
    /// contain a period of zero frames.
    #[must_use]
    pub const fn new(min: usize, max: usize) -> Option<Self> {
        if min == 0 || min > max {
            None
        } else {
            Some(Self { min, max })
        }
    }

    /// Derives the periods that correspond to `min_bpm..=max_bpm` at the given
    /// frame rate. Only periods a comb filterbank with `lag_count` candidates
    /// can represent are included. Without a physical frame rate, all of them
    /// are.
    #[must_use]
    pub fn from_tempo_range(
        min_bpm: f64,
        max_bpm: f64,
        fps: Option<f64>,
        lag_count: usize,
    ) -> Option<Self> {
        // The last candidate of the filterbank is never filled.
        let upper = lag_count.checked_sub(2)?;
        let Some(fps) = fps else {
            return Self::new(1, upper);
        };

        let min = libm::ceil(60.0 * fps / max_bpm);
        let max = libm::floor(60.0 * fps / min_bpm);
        if !(min.is_finite() && max.is_finite()) || max < 1.0 || min > upper as f64 {
            return None;
        }
        Self::new((min as usize).max(1), (max as usize).min(upper))
    }

    /// Returns the shortest period.
    #[must_use]
    pub const fn min(&self) -> usize {
        self.min
    }

    /// Returns the longest period.
    #[must_use]
    pub const fn max(&self) -> usize {
        self.max
    }

    /// Returns the number of periods in the range.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.max - self.min + 1
    }

    /// Always `false`; the range is never empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Returns `true` if `period` is in the range.
    #[must_use]
    pub const fn contains(&self, period: usize) -> bool {
        self.min <= period && period <= self.max
    }

    /// Iterates all periods.
    pub fn iter(&self) -> RangeInclusive<usize> {
        self.min..=self.max
    }

    /// Returns the period in the range that is closest to `period`.
    #[must_use]
    pub fn clamp(&self, period: usize) -> usize {
        period.clamp(self.min, self.max)
    }
}

/// Decodes the best path of beat periods.
///
/// `observations` holds one confidence vector per analysis window, indexed by
/// period. `prior` weights the periods of the first window. Only periods in
/// `lags` are considered as states. Returns one period per window, or an
/// empty path if there are no windows.
#[must_use]
pub fn decode_period_path(
    observations: &[Vec<f64>],
    prior: &[f64],
    lags: LagRange,
    transition_sigma: f64,
) -> Vec<usize> {
    let Some(first) = observations.first() else {
        return Vec::new();
    };
    let states = prior.len();
    debug_assert!(lags.max() < states);
    debug_assert!(observations.iter().all(|o| o.len() == states));

    // Transition weight by distance between two periods.
    let transition = (0..lags.len())
        .map(|distance| {
            let distance = distance as f64;
            libm::exp(-(distance * distance) / (2.0 * transition_sigma * transition_sigma))
        })
        .collect::<Vec<_>>();

    let mut delta = vec![0.0; states];
    for j in lags.iter() {
        delta[j] = prior[j] * first[j];
    }
    normalize_sum(&mut delta, EPS);

    // Back-pointers: `backlinks[t][j]` is the best predecessor (in window
    // `t`) of period `j` in window `t + 1`.
    let mut backlinks = Vec::with_capacity(observations.len() - 1);
    for observation in &observations[1..] {
        let mut next = vec![0.0; states];
        let mut backlink = vec![lags.min(); states];

        for j in lags.iter() {
            let mut best = (lags.min(), delta[lags.min()] * transition[j - lags.min()]);
            for i in lags.iter().skip(1) {
                let score = delta[i] * transition[i.abs_diff(j)];
                if score > best.1 {
                    best = (i, score);
                }
            }
            next[j] = best.1 * observation[j];
            backlink[j] = best.0;
        }

        normalize_sum(&mut next, EPS);
        backlinks.push(backlink);
        delta = next;
    }

    let mut path = vec![0; observations.len()];
    let mut current = first_max_index(&delta, lags.iter()).unwrap_or(lags.min());
    for t in (0..path.len()).rev() {
        path[t] = current;
        if t > 0 {
            current = backlinks[t - 1][current];
        }
    }
    path
}
