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
//! Offline tempo estimation and beat tracking on an onset detection function.
//!
//! The input is a detection function: one non-negative onset strength per
//! frame of audio, where a frame is `frame_increment` samples long. Peaks
//! mark likely note onsets. From it, this crate derives
//! - the beat period of every frame, with the tempo of each segment of stable
//!   tempo (two-state model after Davies & Plumbley), and
//! - the positions of the beats (dynamic programming after Ellis).
//!
//! Computing the detection function from audio is up to the caller, as is
//! anything real-time: the analysis needs the whole signal at once.
//!
//! ## Example
//! ```rust
//! use beat_tracker::TempoTracker;
//!
//! // Onset detection function of 48 kHz audio with a hop size of 480
//! // samples: 100 frames per second, one onset every half second.
//! let df = (0..3000)
//!     .map(|frame| if frame % 50 == 0 { 1.0 } else { 0.1 })
//!     .collect::<Vec<f64>>();
//!
//! let tracker = TempoTracker::builder(48000.0, 480)
//!     .tempo_range(60.0, 180.0)
//!     .build()
//!     .unwrap();
//! let estimate = tracker.estimate_period(&df);
//! assert_eq!(estimate.beat_periods().len(), df.len());
//! let beats = tracker.place_beats(&df, estimate.beat_periods());
//! assert!(beats.windows(2).all(|pair| pair[0] < pair[1]));
//! ```
//!
//! ## Caller-allocated buffers
//! The [`buffers`] module offers the same operations with output buffers owned
//! by the caller, as needed at a foreign-function boundary.
//!
//! ## Crate features
//! - `std` (default): `std` support for the `log` and `thiserror`
//!   dependencies. Without it, the crate is `no_std` but needs `alloc`.

#![no_std]
#![deny(
    clippy::all,
    missing_debug_implementations,
    rust_2018_idioms,
    rustdoc::broken_intra_doc_links
)]

extern crate alloc;

#[cfg(test)]
#[macro_use]
extern crate assert2;
#[cfg(test)]
#[macro_use]
extern crate float_cmp;
#[cfg(test)]
#[macro_use]
extern crate std;

pub mod buffers;
pub mod config;
pub mod layer_analysis;
pub mod layer_input_processing;
mod tempo_tracker;
#[cfg(test)]
mod test_utils;

pub use config::{BeatPlacerConfig, ConfigError, PeriodEstimatorConfig, TrackerConfig};
pub use layer_analysis::period_estimator::PeriodEstimate;
pub use layer_analysis::tempo_segments::TempoSegment;
pub use layer_input_processing::onset::{DetectionFunction, InvalidOnsetError, OnsetStrength};
pub use tempo_tracker::{TempoTracker, TrackerBuilder, TrackingResult};
