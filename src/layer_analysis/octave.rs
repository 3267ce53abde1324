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
//! Resolution of octave errors in the decoded period path.
//!
//! A comb filterbank cannot tell a period from its multiples: the comb of
//! `2 * P` collects the same harmonics as the comb of `P`. The tempo prior
//! then decides, which pulls fast tempi to half and slow tempi to double
//! their actual value. The autocorrelation of the window still shows the
//! difference: only the actual period and its multiples carry energy, its
//! fractions do not.

use super::math::first_max_index;
use super::viterbi::LagRange;
use alloc::vec::Vec;
use core::ops::RangeInclusive;

/// Ratios between periods that are checked for octave errors.
const HARMONICS: [usize; 2] = [2, 3];

/// Fraction of the salience of the current period that a related period
/// needs to be considered supported.
const SUPPORT: f64 = 0.5;

/// Upper bound of corrections per window.
const MAX_STEPS: usize = 4;

/// Autocorrelation above its mean over all candidate periods, indexed by
/// period. The result has `lag_count` entries; missing lags count as zero.
#[must_use]
pub fn salience(acf: &[f64], lag_count: usize, lags: LagRange) -> Vec<f64> {
    let mut salience = acf.iter().copied().take(lag_count).collect::<Vec<_>>();
    salience.resize(lag_count, 0.0);
    let baseline = lags
        .iter()
        .map(|lag| salience.get(lag).copied().unwrap_or_default())
        .sum::<f64>()
        / lags.len() as f64;
    for value in salience.iter_mut() {
        *value -= baseline;
    }
    salience
}

/// Moves `period` to a harmonically related period when the salience shows
/// that the filterbank picked a multiple or a fraction of the actual period.
///
/// Fractions are checked first: if a fraction of `period` is supported by
/// the autocorrelation, `period` is a multiple of it. Otherwise, if `period`
/// itself lacks support compared to one of its multiples, that multiple is
/// taken. The result is always in `lags`.
#[must_use]
pub fn resolve_octave(salience: &[f64], mut period: usize, lags: LagRange) -> usize {
    for _ in 0..MAX_STEPS {
        let next = HARMONICS
            .iter()
            .find_map(|&k| supported_fraction(salience, period, k, lags))
            .or_else(|| {
                HARMONICS
                    .iter()
                    .find_map(|&k| supported_multiple(salience, period, k, lags))
            });
        let Some(next) = next else {
            break;
        };
        log::trace!("Octave correction: {period} -> {next}");
        period = next;
    }
    period
}

/// Salience of `period`, zero outside of the vector.
fn at(salience: &[f64], period: usize) -> f64 {
    salience.get(period).copied().unwrap_or_default()
}

/// Most salient period of `candidates` that is in `lags`.
fn strongest(salience: &[f64], candidates: RangeInclusive<usize>, lags: LagRange) -> Option<usize> {
    first_max_index(
        salience,
        candidates.filter(|&lag| lags.contains(lag) && lag < salience.len()),
    )
}

// The comb of period `p` sums harmonic `k` over `[k * p, k * p + 2k - 2]`,
// so a period picked for harmonic `k` of `q` satisfies
// `k * q <= p <= k * q + 2k - 2`.

fn supported_fraction(salience: &[f64], period: usize, k: usize, lags: LagRange) -> Option<usize> {
    let own = at(salience, period);
    if own <= 0.0 {
        return None;
    }
    let first = period.saturating_sub(2 * k - 2).div_ceil(k);
    let fraction = strongest(salience, first..=period / k, lags)?;
    let support = at(salience, fraction);
    (support > 0.0 && support >= SUPPORT * own).then_some(fraction)
}

fn supported_multiple(salience: &[f64], period: usize, k: usize, lags: LagRange) -> Option<usize> {
    let first = k * period;
    let multiple = strongest(salience, first..=first + 2 * k - 2, lags)?;
    let support = at(salience, multiple);
    (support > 0.0 && at(salience, period) < SUPPORT * support).then_some(multiple)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer_analysis::math::{adaptive_threshold, autocorrelation};
    use crate::test_utils;

    /// Salience of the first analysis window of an impulse train.
    fn window_salience(period: usize, lags: LagRange) -> Vec<f64> {
        let mut window = test_utils::impulse_train(512, period, 0);
        adaptive_threshold(&mut window);
        salience(&autocorrelation(&window), 128, lags)
    }

    fn default_lags() -> LagRange {
        LagRange::new(22, 126).unwrap()
    }

    #[test]
    fn test_salience() {
        let lags = LagRange::new(1, 3).unwrap();
        let salience = salience(&[9.0, 1.0, 2.0, 3.0, 8.0], 6, lags);
        check!(salience == [7.0, -1.0, 0.0, 1.0, 6.0, -2.0]);
    }

    #[test]
    fn test_keeps_actual_period() {
        let lags = default_lags();
        for period in [22, 30, 43, 44, 63, 66, 96, 126] {
            let salience = window_salience(period, lags);
            check!(resolve_octave(&salience, period, lags) == period, "period {period}");
        }
    }

    #[test]
    fn test_double_period_is_halved() {
        let lags = default_lags();
        for period in [23, 25, 28, 29] {
            let salience = window_salience(period, lags);
            check!(resolve_octave(&salience, 2 * period, lags) == period, "period {period}");
        }
    }

    #[test]
    fn test_half_period_is_doubled() {
        let lags = default_lags();
        for (period, picked) in [(97, 48), (100, 49), (100, 50), (113, 56), (126, 62), (126, 63)] {
            let salience = window_salience(period, lags);
            check!(resolve_octave(&salience, picked, lags) == period, "period {period}");
        }
    }

    #[test]
    fn test_flat_salience_is_left_alone() {
        let lags = default_lags();
        let salience = [0.0; 128];
        check!(resolve_octave(&salience, 50, lags) == 50);
        check!(resolve_octave(&salience, 126, lags) == 126);
    }

    #[test]
    fn test_stays_within_lags() {
        // The actual period 25 is excluded by the tempo range.
        let lags = LagRange::new(30, 126).unwrap();
        let salience = window_salience(25, lags);
        check!(resolve_octave(&salience, 50, lags) == 50);
    }
}
