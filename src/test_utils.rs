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
//! Synthetic detection functions and shared assertions for the tests.

use itertools::Itertools;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::vec;
use std::vec::Vec;

/// Routes log output of the code under test to stdout. Can be called from
/// every test.
pub fn init_logger() {
    // Fails if another test already installed the logger.
    let _ = simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Debug)
        .init();
}

/// Returns a detection function with an onset of strength `1.0` every
/// `period` frames, starting at `offset`.
pub fn impulse_train(len: usize, period: usize, offset: usize) -> Vec<f64> {
    let mut df = vec![0.0; len];
    for frame in (offset..len).step_by(period) {
        df[frame] = 1.0;
    }
    df
}

/// Like [`impulse_train`], but every frame additionally carries uniform noise
/// in `0.0..noise`. The noise is reproducible for the same `seed`.
pub fn noisy_impulse_train(
    len: usize,
    period: usize,
    offset: usize,
    noise: f64,
    seed: u64,
) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut df = impulse_train(len, period, offset);
    if noise > 0.0 {
        for value in df.iter_mut() {
            *value += rng.random_range(0.0..noise);
        }
    }
    df
}

/// Returns an impulse train that switches from `first_period` to
/// `second_period` in the middle of the signal.
pub fn tempo_change(len: usize, first_period: usize, second_period: usize) -> Vec<f64> {
    let mut df = vec![0.0; len];
    let mut frame = 0;
    while frame < len {
        df[frame] = 1.0;
        frame += if frame < len / 2 {
            first_period
        } else {
            second_period
        };
    }
    df
}

/// Asserts that `beats` are whole frame indices of a detection function with
/// `len` frames, in strictly ascending order.
pub fn assert_valid_beats(beats: &[f64], len: usize) {
    assert!(beats.len() <= len, "more beats than frames: {}", beats.len());
    for &beat in beats {
        assert!(
            beat >= 0.0 && beat < len as f64 && libm::trunc(beat) == beat,
            "invalid beat position {beat} for {len} frames"
        );
    }
    for (a, b) in beats.iter().tuple_windows() {
        assert!(a < b, "beats out of order: {a} >= {b}");
    }
}

#[test]
fn test_generators() {
    check!(impulse_train(10, 4, 1) == [0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
    check!(tempo_change(12, 4, 2) == [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0]);

    let a = noisy_impulse_train(100, 10, 0, 0.5, 1);
    let b = noisy_impulse_train(100, 10, 0, 0.5, 1);
    check!(a == b);
    check!(a.iter().all(|&value| (0.0..1.5).contains(&value)));
    check!(a.iter().step_by(10).all(|&value| value >= 1.0));
}
