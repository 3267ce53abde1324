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
//! Conversions between detection function frames, physical time, and tempo.
//!
//! All functions return `None` when the inputs do not describe a physical
//! quantity, for example for a non-positive frame increment.

/// Seconds per minute.
const SECONDS_PER_MINUTE: f64 = 60.0;

/// Returns the frame rate of a detection function: how many frames describe
/// one second of audio.
#[inline]
#[must_use]
pub fn frames_per_second(sample_rate: f32, frame_increment: i32) -> Option<f64> {
    if frame_increment <= 0 || sample_rate.is_nan() || sample_rate <= 0.0 {
        return None;
    }
    let fps = f64::from(sample_rate) / f64::from(frame_increment);
    fps.is_finite().then_some(fps)
}

/// Transforms a beat period (in frames) to a tempo in beats per minute.
#[inline]
#[must_use]
pub fn period_to_bpm(period: f64, fps: f64) -> Option<f64> {
    let bpm = SECONDS_PER_MINUTE * fps / period;
    (period > 0.0 && bpm.is_finite() && bpm > 0.0).then_some(bpm)
}

/// Transforms a tempo in beats per minute to a beat period (in frames).
#[inline]
#[must_use]
pub fn bpm_to_period(bpm: f64, fps: f64) -> Option<f64> {
    let period = SECONDS_PER_MINUTE * fps / bpm;
    (bpm > 0.0 && period.is_finite() && period > 0.0).then_some(period)
}

/// Transforms a (fractional) frame position to seconds.
#[inline]
#[must_use]
pub fn frame_to_seconds(frame: f64, fps: f64) -> Option<f64> {
    let seconds = frame / fps;
    (fps > 0.0 && seconds.is_finite()).then_some(seconds)
}
