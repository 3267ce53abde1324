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
//! Small numeric building blocks shared by the period estimator and the beat
//! placer.

use alloc::vec;
use alloc::vec::Vec;

/// Frames before the current one that contribute to the moving mean of
/// [`adaptive_threshold`].
const THRESHOLD_PRE: usize = 8;
/// Frames after the current one that contribute to the moving mean of
/// [`adaptive_threshold`].
const THRESHOLD_POST: usize = 7;

/// Removes the local mean from each value and clamps the result at zero.
///
/// The mean is taken over `[i - 8, i + 7]`, clipped at both ends of the
/// slice. What remains are the peaks that stand out of their neighbourhood.
pub fn adaptive_threshold(values: &mut [f64]) {
    let len = values.len();
    if len == 0 {
        return;
    }

    let smoothed = (0..len)
        .map(|i| {
            let first = i.saturating_sub(THRESHOLD_PRE);
            let last = (i + THRESHOLD_POST).min(len - 1);
            let window = &values[first..=last];
            window.iter().sum::<f64>() / window.len() as f64
        })
        .collect::<Vec<_>>();

    for (value, mean) in values.iter_mut().zip(smoothed) {
        *value = (*value - mean).max(0.0);
    }
}

/// Unbiased autocorrelation: the sum of products at each lag is divided by
/// the number of overlapping values.
#[must_use]
pub fn autocorrelation(values: &[f64]) -> Vec<f64> {
    let len = values.len();
    let mut acf = vec![0.0; len];
    for (lag, acf) in acf.iter_mut().enumerate() {
        let sum = values[..len - lag]
            .iter()
            .zip(&values[lag..])
            .map(|(a, b)| a * b)
            .sum::<f64>();
        *acf = sum / (len - lag) as f64;
    }
    acf
}

/// Returns the index of the first maximum among `indices`, or `None` for an
/// empty range.
#[must_use]
pub fn first_max_index(values: &[f64], indices: impl Iterator<Item = usize>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for i in indices {
        let value = values[i];
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((i, value)),
        }
    }
    best.map(|(i, _)| i)
}

/// Returns the index of the last maximum among `indices`, or `None` for an
/// empty range.
#[must_use]
pub fn last_max_index(values: &[f64], indices: impl Iterator<Item = usize>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for i in indices {
        let value = values[i];
        match best {
            Some((_, best_value)) if value < best_value => {}
            _ => best = Some((i, value)),
        }
    }
    best.map(|(i, _)| i)
}

/// Divides all values by their sum (plus `eps`, to survive all-zero input).
pub fn normalize_sum(values: &mut [f64], eps: f64) {
    let sum = values.iter().sum::<f64>() + eps;
    for value in values.iter_mut() {
        *value /= sum;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adaptive_threshold_flat() {
        let mut values = [3.0; 32];
        adaptive_threshold(&mut values);
        check!(values.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_adaptive_threshold_spike() {
        let mut values = [0.0; 32];
        values[16] = 16.0;
        adaptive_threshold(&mut values);
        // The window around index 16 has 16 values.
        check!(values[16] == 15.0);
        check!(values.iter().enumerate().all(|(i, &v)| i == 16 || v == 0.0));
    }

    #[test]
    fn test_adaptive_threshold_short_input() {
        let mut values = [1.0, 3.0];
        adaptive_threshold(&mut values);
        check!(values == [0.0, 1.0]);

        let mut values: [f64; 0] = [];
        adaptive_threshold(&mut values);
    }

    #[test]
    fn test_autocorrelation_is_unbiased() {
        let values = [1.0, 0.0, 1.0, 0.0, 1.0, 0.0];
        let acf = autocorrelation(&values);
        check!(acf.len() == 6);
        check!(acf[0] == 0.5);
        check!(acf[1] == 0.0);
        // Products at lag 2: 1*1 + 0*0 + 1*1 + 0*0 over 4 overlapping values.
        check!(acf[2] == 0.5);
        check!(acf[5] == 0.0);
    }

    #[test]
    fn test_max_index_tie_breaks() {
        let values = [1.0, 3.0, 2.0, 3.0, 0.0];
        check!(first_max_index(&values, 0..values.len()) == Some(1));
        check!(last_max_index(&values, 0..values.len()) == Some(3));
        check!(first_max_index(&values, 2..3) == Some(2));
        check!(first_max_index(&values, 2..2) == None);
        check!(last_max_index(&values, 4..4) == None);
    }

    #[test]
    fn test_normalize_sum() {
        let mut values = [1.0, 3.0];
        normalize_sum(&mut values, 0.0);
        check!(values == [0.25, 0.75]);

        let mut values = [0.0, 0.0];
        normalize_sum(&mut values, 1e-9);
        check!(values == [0.0, 0.0]);
    }
}
