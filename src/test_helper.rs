// Copyright 2025- burgpred developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![allow(clippy::missing_panics_doc)]

use once_cell::sync::Lazy;
use rand::Rng;
use rand::SeedableRng;

#[macro_export]
macro_rules! assert_close {
    ($actual:expr, $expected:expr, rtol = $rtol:expr, atol = $atol:expr) => {{
        #[allow(clippy::cast_lossless, clippy::unnecessary_cast)]
        let (actual, expected, rtol, atol) = (
            ($actual) as f64,
            ($expected) as f64,
            ($rtol) as f64,
            ($atol) as f64,
        );
        let err = (actual - expected).abs();
        #[allow(clippy::suboptimal_flops)]
        let tol = rtol * expected.abs() + atol;
        assert!(
            err < tol,
            "actual={:e}, expected={:e}, tol={:e}",
            actual,
            expected,
            tol
        );
    }};
    ($actual:expr, $expected:expr) => {{
        assert_close!($actual, $expected, rtol = 0.00001, atol = 0.00001);
    }};
}

#[macro_export]
macro_rules! assert_finite {
    ($result:expr) => {{
        for (i, &value) in $result.iter().enumerate() {
            assert!(
                value.is_normal() || value == 0.0,
                "{}-th element in a vector is not finite ({}), x={:?}.",
                i,
                value,
                $result
            );
        }
    }};
}

/// `sin(2π·freq·t/rate)` for `t` in `offset..offset + len`.
pub fn sinusoid(len: usize, freq: f64, rate: f64, offset: usize) -> Vec<f64> {
    (offset..offset + len)
        .map(|t| (2.0 * std::f64::consts::PI * freq * t as f64 / rate).sin())
        .collect()
}

/// Half-amplitude sinusoid with `period` plus uniform noise of width
/// `noise_width`.
pub fn noisy_sinusoid(len: usize, period: f64, noise_width: f64, seed: u64) -> Vec<f64> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    (0..len)
        .map(|t| {
            let u: f64 = rng.gen();
            0.5f64.mul_add(
                (2.0 * std::f64::consts::PI * t as f64 / period).sin(),
                noise_width * (u - 0.5),
            )
        })
        .collect()
}

/// Slowly varying signal riding on a large DC offset.
///
/// The offset makes every sum in the recursion dominated by cancelling
/// terms, so single-precision accumulation loses most of its digits.
pub fn ill_conditioned(len: usize) -> Vec<f64> {
    (0..len)
        .map(|t| {
            let t = t as f64;
            1.0 + 0.01 * (0.05 * t).sin() + 0.001 * (1.3 * t + 0.7).sin() + 0.0005 * (2.9 * t).sin()
        })
        .collect()
}

/// 441 Hz tone sampled at 44.1 kHz: 2048 training samples followed by 2048
/// continuation samples.
static TONE_441: Lazy<(Vec<f64>, Vec<f64>)> = Lazy::new(|| {
    (
        sinusoid(2048, 441.0, 44100.0, 0),
        sinusoid(2048, 441.0, 44100.0, 2048),
    )
});

/// Returns the training part and the continuation of the 441 Hz test tone.
pub fn tone_441() -> (&'static [f64], &'static [f64]) {
    (&TONE_441.0, &TONE_441.1)
}

#[cfg(test)]
mod tests {
    #[test]
    fn assert_close_accepts_mixed_operands() {
        assert_close!(1.0, 1.0);
        assert_close!(0.5f32, 0.5, rtol = 0.0, atol = 1e-9);
        assert_close!(2.0f64.sqrt(), 1.414_213_56, rtol = 1e-8, atol = 0.0);
    }

    #[test]
    #[should_panic(expected = "tol=")]
    fn assert_close_rejects_distant_values() {
        assert_close!(1.0, 1.1, rtol = 0.0, atol = 1e-3);
    }
}
