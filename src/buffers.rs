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
//! Entry points that write their results into caller-allocated buffers.
//!
//! This is the shape of the library at a foreign-function boundary: every
//! argument may be missing (`None`), and the caller decides how much memory
//! the results may occupy. Arguments are checked before any work is done, so
//! on `Err`, no buffer has been written.

use crate::layer_input_processing::onset::DetectionFunction;
use crate::tempo_tracker::TempoTracker;
use thiserror::Error;

/// Invalid use of the caller-allocated buffer interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("missing argument `{0}`")]
    MissingArgument(&'static str),
    #[error("buffer `{buffer}` holds {provided} values, but {required} are required")]
    BufferTooSmall {
        buffer: &'static str,
        required: usize,
        provided: usize,
    },
}

/// Number of values written by [`estimate_period_into`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeriodCounts {
    /// Beat periods written, always the length of the detection function.
    pub beat_periods: usize,
    /// Tempi written, one per segment of stable tempo.
    pub tempi: usize,
}

fn require<T>(argument: Option<T>, name: &'static str) -> Result<T, UsageError> {
    argument.ok_or(UsageError::MissingArgument(name))
}

fn require_capacity(buffer: &'static str, provided: usize, required: usize) -> Result<(), UsageError> {
    if provided < required {
        return Err(UsageError::BufferTooSmall {
            buffer,
            required,
            provided,
        });
    }
    Ok(())
}

/// Estimates the beat period of every frame of `df` and the tempo of each
/// segment of stable tempo.
///
/// Both output buffers must hold at least `df.len()` values. The beat periods
/// fill the first `df.len()` values of `beat_periods`, the tempi (in BPM) the
/// first values of `tempi`. An empty detection function writes nothing.
pub fn estimate_period_into(
    tracker: Option<&TempoTracker>,
    df: Option<&[f64]>,
    beat_periods: Option<&mut [f64]>,
    tempi: Option<&mut [f64]>,
) -> Result<PeriodCounts, UsageError> {
    let tracker = require(tracker, "tracker")?;
    let df = require(df, "df")?;
    let beat_periods = require(beat_periods, "beat_periods")?;
    let tempi = require(tempi, "tempi")?;
    require_capacity("beat_periods", beat_periods.len(), df.len())?;
    require_capacity("tempi", tempi.len(), df.len())?;

    if df.is_empty() {
        return Ok(PeriodCounts::default());
    }

    let (periods, segments) = tracker
        .estimate_period_of(&DetectionFunction::new(df))
        .into_parts();
    beat_periods[..periods.len()].copy_from_slice(&periods);

    for (tempo, segment) in tempi.iter_mut().zip(&segments) {
        *tempo = segment.bpm;
    }

    Ok(PeriodCounts {
        beat_periods: periods.len(),
        tempi: segments.len(),
    })
}

/// Places beats on `df` guided by `beat_periods` and writes their frame
/// indices into `beats`.
///
/// At most `min(beats.len(), df.len())` beats are written. Beats beyond that
/// are dropped with a warning. Returns the number of written beats.
pub fn place_beats_into(
    tracker: Option<&TempoTracker>,
    df: Option<&[f64]>,
    beat_periods: Option<&[f64]>,
    beats: Option<&mut [f64]>,
) -> Result<usize, UsageError> {
    let tracker = require(tracker, "tracker")?;
    let df = require(df, "df")?;
    let beat_periods = require(beat_periods, "beat_periods")?;
    let beats = require(beats, "beats")?;

    let placed = tracker.place_beats_of(&DetectionFunction::new(df), beat_periods);
    let capacity = beats.len().min(df.len());
    if placed.len() > capacity {
        log::warn!(
            "Dropping {} of {} beats: the output holds only {capacity} values",
            placed.len() - capacity,
            placed.len()
        );
    }

    let count = placed.len().min(capacity);
    beats[..count].copy_from_slice(&placed[..count]);
    Ok(count)
}

/// Releases a tracker. Nothing happens for `None`.
pub fn destroy(tracker: Option<TempoTracker>) {
    if let Some(tracker) = tracker {
        log::trace!("Releasing tracker: {tracker:?}");
    }
}
