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

//! Compensated Burg engine with an O(1) denominator recurrence.
//!
//! The exact denominator of step `i` is a sum over `size - i` elements. Once
//! the order is past the switching point it is instead obtained from the
//! previous one,
//!
//! ```text
//! den_i = den_{i-1} (1 - k_{i-1}²) - f[i-1]² - b[size-i]²
//! ```
//!
//! where the two subtracted terms are the elements that drop out of the
//! summation ranges after the previous lattice update. The recurrence trades
//! accuracy for speed: its rounding error accumulates with the order.

use super::super::compensated::two_product_fma;
use super::super::constant::panic_msg;
use super::super::constant::DEFAULT_MIN_SWITCHING_POINT;
use super::super::error::BurgError;
use super::super::real::Real;

use super::compensated::predict;
use super::compensated::Compensating;
use super::exact_denominator;
use super::nonzero_or_epsilon;
use super::verify_max_size;
use super::Arithmetic;
use super::Denominator;
use super::Engine;
use super::Fit;
use super::FitParams;
use super::Workspace;

/// Returns the last order computed with the exact denominator.
///
/// # Examples
///
/// ```
/// # use burgpred::burg::switching_point;
/// assert_eq!(switching_point(32, 8), 8);
/// assert_eq!(switching_point(100, 8), 10);
/// assert_eq!(switching_point(101, 8), 11);
/// ```
pub fn switching_point(order: usize, min_switching_point: usize) -> usize {
    std::cmp::max(ceil_sqrt(order), min_switching_point)
}

/// Smallest `r` such that `r * r >= n`.
fn ceil_sqrt(n: usize) -> usize {
    let mut r = (n as f64).sqrt() as usize;
    while r * r < n {
        r += 1;
    }
    while r > 0 && (r - 1) * (r - 1) >= n {
        r -= 1;
    }
    r
}

/// Denominator that switches to the recurrence above the switching point.
#[derive(Clone, Debug)]
struct RecurrentDenominator<T> {
    min_switching_point: usize,
    switching_point: usize,
    den: T,
}

impl<T: Real> RecurrentDenominator<T> {
    fn new(min_switching_point: usize) -> Self {
        Self {
            min_switching_point,
            switching_point: min_switching_point,
            den: T::zero(),
        }
    }

    fn recurrence(&self, step: usize, f: &[T], b: &[T], prev_k: T) -> T {
        let fo = f[step - 1];
        let bo = b[b.len() - step];
        let decayed = two_product_fma(self.den, Compensating::one_minus_square(prev_k));
        let dropped = two_product_fma(fo, -fo) + two_product_fma(bo, -bo);
        (decayed + dropped).collapse()
    }
}

impl<T: Real> Denominator<T> for RecurrentDenominator<T> {
    fn start(&mut self, energy: T, params: &FitParams) {
        self.switching_point = switching_point(params.order, self.min_switching_point);
        self.den = (T::one() + T::one()) * energy;
        debug!("fit: switching_point={}", self.switching_point);
    }

    fn next<A: Arithmetic<T>>(&mut self, step: usize, f: &[T], b: &[T], prev_k: T) -> T {
        // the recurrence needs an element that left the window; past the
        // window length both sums are empty anyway.
        self.den = if step > self.switching_point && step <= f.len() {
            nonzero_or_epsilon(self.recurrence(step, f, b, prev_k))
        } else {
            exact_denominator::<T, A>(step, f, b)
        };
        self.den
    }
}

/// Compensated Burg engine whose denominator is updated in O(1) per step
/// above the switching point.
///
/// # Examples
///
/// ```
/// # use burgpred::burg::{Engine, OptimizedDenBurg};
/// let signal: Vec<f64> = (0..1024).map(|t| (0.05 * t as f64).cos()).collect();
/// let mut engine = OptimizedDenBurg::new(1024);
/// let fit = engine.fit(&signal, 16).unwrap();
/// assert_eq!(fit.coefs()[0], 1.0);
/// assert_eq!(engine.min_switching_point(), 8);
/// ```
#[derive(Clone, Debug)]
pub struct OptimizedDenBurg<T> {
    workspace: Workspace<T>,
    min_switching_point: usize,
}

impl<T: Real> OptimizedDenBurg<T> {
    /// Constructs an engine with the default minimum switching point.
    ///
    /// # Panics
    ///
    /// Panics if `max_size` is zero.
    pub fn new(max_size: usize) -> Self {
        Self::with_min_switching_point(max_size, DEFAULT_MIN_SWITCHING_POINT)
    }

    /// Constructs an engine with a custom lower bound of the switching point.
    ///
    /// # Panics
    ///
    /// Panics if `max_size` is zero.
    pub fn with_min_switching_point(max_size: usize, min_switching_point: usize) -> Self {
        assert!(max_size > 0, "{}", panic_msg::ZERO_MAX_SIZE);
        Self {
            workspace: Workspace::new(max_size),
            min_switching_point,
        }
    }

    /// Constructs an engine, failing on zero `max_size`.
    ///
    /// # Errors
    ///
    /// Returns `BurgError::InvalidArgument` if `max_size` is zero.
    pub fn try_new(max_size: usize) -> Result<Self, BurgError> {
        verify_max_size(max_size)?;
        Ok(Self::new(max_size))
    }

    /// Returns the lower bound of the switching point.
    pub const fn min_switching_point(&self) -> usize {
        self.min_switching_point
    }
}

impl<T: Real> Engine<T> for OptimizedDenBurg<T> {
    fn max_size(&self) -> usize {
        self.workspace.max_size()
    }

    fn fit(&mut self, samples: &[T], order: usize) -> Result<Fit<T>, BurgError> {
        let mut den = RecurrentDenominator::new(self.min_switching_point);
        self.workspace.fit::<Compensating, _>(samples, order, &mut den)
    }

    fn predict(&self, samples: &[T], coefs: &[T], n: usize) -> Result<Vec<T>, BurgError> {
        predict(samples, coefs, n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::burg::CompensatedBurg;
    use crate::eval;
    use crate::test_helper;

    use rstest::rstest;

    #[test]
    fn ceil_sqrt_boundaries() {
        assert_eq!(ceil_sqrt(0), 0);
        assert_eq!(ceil_sqrt(1), 1);
        assert_eq!(ceil_sqrt(2), 2);
        assert_eq!(ceil_sqrt(64), 8);
        assert_eq!(ceil_sqrt(65), 9);
        assert_eq!(ceil_sqrt(1 << 20), 1 << 10);
    }

    #[test]
    fn switching_point_has_lower_bound() {
        assert_eq!(switching_point(1, 8), 8);
        assert_eq!(switching_point(64, 8), 8);
        assert_eq!(switching_point(65, 8), 9);
        assert_eq!(switching_point(16, 2), 4);
    }

    #[rstest]
    fn identical_to_compensated_below_switching_point(#[values(1, 3, 8)] order: usize) {
        let signal = test_helper::noisy_sinusoid(512, 13.7, 0.2, 21);
        let mut optimized = OptimizedDenBurg::new(512);
        let mut compensated = CompensatedBurg::new(512);
        assert_eq!(
            optimized.fit(&signal, order).unwrap(),
            compensated.fit(&signal, order).unwrap()
        );
    }

    #[rstest]
    fn agrees_with_compensated_above_switching_point(
        #[values(4, 32, 100)] order: usize,
        #[values(2, 8)] min_switching_point: usize,
    ) {
        let signal = test_helper::noisy_sinusoid(1024, 29.3, 0.3, 3);
        let mut optimized = OptimizedDenBurg::with_min_switching_point(1024, min_switching_point);
        let mut compensated = CompensatedBurg::new(1024);
        let o = optimized.fit(&signal, order).unwrap();
        let c = compensated.fit(&signal, order).unwrap();
        assert!(((o.error() - c.error()) / c.error()).abs() < 1e-6);
        for (x, y) in o.coefs().iter().zip(c.coefs()) {
            assert!((x - y).abs() <= 1e-6 * y.abs().max(1.0), "{x} vs {y}");
        }
    }

    #[test]
    fn concrete_sinusoid_scenario() {
        let (signal, future) = test_helper::tone_441();
        let energy: f64 = signal.iter().map(|x| x * x).sum();
        let mut engine = OptimizedDenBurg::new(2048);
        let fit = engine.fit(signal, 64).unwrap();
        assert_eq!(fit.coefs()[0], 1.0);
        assert!(fit.error() < 1e-6 * energy);

        // the model itself matches the exact-denominator fit; only the long
        // extrapolation amplifies the remaining difference.
        let reference = CompensatedBurg::new(2048).fit(signal, 64).unwrap();
        for (x, y) in fit.coefs().iter().zip(reference.coefs()) {
            assert!((x - y).abs() < 1e-6 * y.abs().max(1.0), "{x} vs {y}");
        }
        let pred = engine.predict(signal, fit.coefs(), 2048).unwrap();
        assert!(eval::mae(&pred, future) < 1e-2);
    }

    #[test]
    fn order_beyond_window_is_padded() {
        let signal = test_helper::noisy_sinusoid(12, 5.0, 0.1, 1);
        let mut engine = OptimizedDenBurg::with_min_switching_point(64, 2);
        let fit = engine.fit(&signal, 40).unwrap();
        assert_eq!(fit.order(), 40);
        assert!(fit.coefs()[12..].iter().all(|&c| c == 0.0));
    }
}
