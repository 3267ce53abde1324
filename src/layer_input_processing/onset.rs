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
//! Validated onset strength values and the [`DetectionFunction`] that bundles
//! them.
//!
//! The tracking algorithms are only defined for finite, non-negative values.
//! Everything that enters the analysis layer goes through this module.

use alloc::vec::Vec;
use thiserror::Error;

/// A value of a detection function is not a valid onset strength.
#[derive(Debug, Copy, Clone, PartialEq, Error)]
pub enum InvalidOnsetError {
    #[error("the value is NaN")]
    NaN,
    #[error("the value is infinite")]
    Infinite,
    #[error("the value is negative: {0}")]
    Negative(f64),
}

/// An onset strength: a finite value in range `0.0..=f64::MAX`.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
#[repr(transparent)]
pub struct OnsetStrength(f64);

impl OnsetStrength {
    /// Returns the underlying raw value.
    #[must_use]
    pub const fn raw(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for OnsetStrength {
    type Error = InvalidOnsetError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if value.is_nan() {
            Err(InvalidOnsetError::NaN)
        } else if value.is_infinite() {
            Err(InvalidOnsetError::Infinite)
        } else if value < 0.0 {
            Err(InvalidOnsetError::Negative(value))
        } else {
            // Normalizes `-0.0`.
            Ok(Self(value + 0.0))
        }
    }
}

/// Clamps a raw value to a valid onset strength. Everything that is not a
/// finite non-negative number becomes `0.0`.
#[inline]
#[must_use]
pub fn clamp_onset_strength(value: f64) -> OnsetStrength {
    OnsetStrength::try_from(value).unwrap_or(OnsetStrength(0.0))
}

/// A detection function whose values are all valid [`OnsetStrength`]s.
///
/// One value per analysis frame. The frames are uniformly spaced; the
/// distance between two frames is the frame increment of the tracker.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectionFunction {
    values: Vec<f64>,
    clamped: usize,
}

impl DetectionFunction {
    /// Creates a detection function from raw values. Invalid values (NaN,
    /// infinite, negative) are replaced by `0.0`. See
    /// [`Self::clamped_count`].
    #[must_use]
    pub fn new(raw: &[f64]) -> Self {
        let mut clamped = 0;
        let values = raw
            .iter()
            .map(|&value| {
                let strength = clamp_onset_strength(value);
                if strength.raw() != value {
                    clamped += 1;
                }
                strength.raw()
            })
            .collect::<Vec<_>>();

        if clamped > 0 {
            log::warn!(
                "Clamped {clamped} of {} detection function values to 0.0 (NaN, infinite, or negative)",
                values.len()
            );
        }

        Self { values, clamped }
    }

    /// Creates a detection function from raw values and fails on the first
    /// invalid value. The error carries the index of that value.
    pub fn try_new(raw: &[f64]) -> Result<Self, (usize, InvalidOnsetError)> {
        let values = raw
            .iter()
            .enumerate()
            .map(|(index, &value)| {
                OnsetStrength::try_from(value)
                    .map(OnsetStrength::raw)
                    .map_err(|e| (index, e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { values, clamped: 0 })
    }

    /// Returns the values.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Returns the number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether there are no frames at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns whether no frame carries any onset energy.
    #[must_use]
    pub fn is_silent(&self) -> bool {
        self.values.iter().all(|&value| value <= 0.0)
    }

    /// Number of raw values that were replaced by `0.0` during construction.
    #[must_use]
    pub const fn clamped_count(&self) -> usize {
        self.clamped
    }

    pub(crate) fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }
}
