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
//! Splits a per-frame beat period curve into segments of (nearly) constant
//! tempo.

use crate::layer_input_processing::conversion::period_to_bpm;
use alloc::vec::Vec;

/// A run of frames with a stable beat period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoSegment {
    /// First frame of the segment.
    pub start: usize,
    /// Number of frames in the segment.
    pub len: usize,
    /// Mean beat period of the segment in frames.
    pub period: f64,
    /// Tempo of the segment in beats per minute.
    pub bpm: f64,
}

impl TempoSegment {
    /// Returns the frame after the last frame of the segment.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Finds the segments of `periods` in which each period deviates by at most
/// `tolerance` (relative) from the first period of its segment.
///
/// Segments whose tempo is not physical, and all segments if there is no
/// frame rate, are not reported.
#[must_use]
pub fn find_tempo_segments(periods: &[f64], fps: Option<f64>, tolerance: f64) -> Vec<TempoSegment> {
    let Some(fps) = fps else {
        return Vec::new();
    };

    let mut segments = Vec::new();
    let mut start = 0;
    while start < periods.len() {
        let reference = periods[start];
        let len = periods[start..]
            .iter()
            .skip(1)
            .position(|&period| libm::fabs(period - reference) > tolerance * reference)
            .map_or(periods.len() - start, |offset| offset + 1);

        let run = &periods[start..start + len];
        let period = run.iter().sum::<f64>() / len as f64;
        if let Some(bpm) = period_to_bpm(period, fps) {
            segments.push(TempoSegment {
                start,
                len,
                period,
                bpm,
            });
        }
        start += len;
    }
    segments
}

/// Median tempo over all frames covered by `segments`.
#[must_use]
pub fn median_bpm(segments: &[TempoSegment]) -> Option<f64> {
    let total = segments.iter().map(|segment| segment.len).sum::<usize>();
    let mut sorted = segments.to_vec();
    sorted.sort_unstable_by(|a, b| a.bpm.total_cmp(&b.bpm));

    let mut covered = 0;
    sorted.into_iter().find_map(|segment| {
        covered += segment.len;
        (covered > total / 2).then_some(segment.bpm)
    })
}
