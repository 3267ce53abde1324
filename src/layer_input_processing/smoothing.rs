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
//! Zero-phase lowpass pre-filter for detection functions.

use biquad::{Biquad, Coefficients, DirectForm1};

/// Second-order Butterworth lowpass with a cutoff at `0.4` of the Nyquist
/// frequency of the detection function (`[b, a] = butter(2, 0.4)`).
const BUTTER_2_04: Coefficients<f64> = Coefficients {
    a1: -0.3695,
    a2: 0.1958,
    b0: 0.2066,
    b1: 0.4131,
    b2: 0.2066,
};

/// Lowpass filter that is run forward and backward over a detection function.
///
/// Running the filter twice in opposite directions cancels the group delay of
/// the biquad. Onsets therefore stay at their original frame, which matters
/// because beat positions are reported in frames of the detection function.
#[derive(Debug)]
pub struct ZeroPhaseLowpass {
    filter: DirectForm1<f64>,
}

impl ZeroPhaseLowpass {
    /// Creates a new filter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            filter: DirectForm1::<f64>::new(BUTTER_2_04),
        }
    }

    /// Smooths the values in place. The result is clamped to `>= 0.0`, as
    /// the filter may undershoot next to sharp onsets.
    pub fn process(&mut self, values: &mut [f64]) {
        if values.is_empty() {
            return;
        }

        self.run_pass(values.iter_mut());
        self.run_pass(values.iter_mut().rev());

        for value in values.iter_mut() {
            if *value < 0.0 {
                *value = 0.0;
            }
        }
    }

    fn run_pass<'a>(&mut self, values: impl Iterator<Item = &'a mut f64>) {
        self.filter.reset_state();
        for value in values {
            *value = self.filter.run(*value);
        }
    }
}

impl Default for ZeroPhaseLowpass {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec;
    use std::vec::Vec;

    #[test]
    fn test_unity_dc_gain() {
        let mut values = vec![1.0; 200];
        ZeroPhaseLowpass::new().process(&mut values);
        // Transients at both edges decay quickly; the center is settled.
        check!(approx_eq!(f64, values[100], 1.0, epsilon = 0.001));
    }

    #[test]
    fn test_impulse_stays_in_place() {
        let mut values = vec![0.0; 64];
        values[32] = 1.0;
        ZeroPhaseLowpass::new().process(&mut values);

        let (max_index, _) = values
            .iter()
            .enumerate()
            .fold((0, f64::MIN), |acc, (i, &v)| if v > acc.1 { (i, v) } else { acc });
        check!(max_index == 32);
        // Energy spreads to the neighbours symmetrically.
        check!(approx_eq!(f64, values[31], values[33], epsilon = 1e-9));
        check!(values[31] > 0.0);
        check!(values[32] < 1.0);
    }

    #[test]
    fn test_output_is_non_negative() {
        let mut values = (0..128)
            .map(|i| if i % 7 == 0 { 1.0 } else { 0.0 })
            .collect::<Vec<_>>();
        ZeroPhaseLowpass::new().process(&mut values);
        check!(values.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_empty_input() {
        let mut values: [f64; 0] = [];
        ZeroPhaseLowpass::new().process(&mut values);
    }
}
