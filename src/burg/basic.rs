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

//! Burg engine with plain floating-point accumulation.

use super::super::compensated::dot_basic;
use super::super::constant::panic_msg;
use super::super::error::BurgError;
use super::super::real::Real;

use super::predict_with;
use super::verify_max_size;
use super::Arithmetic;
use super::Engine;
use super::ExactDenominator;
use super::Fit;
use super::Workspace;

/// Arithmetic without any error tracking.
pub(crate) struct Plain;

impl<T: Real> Arithmetic<T> for Plain {
    #[inline]
    fn dot(x: &[T], y: &[T]) -> T {
        dot_basic(x, y).collapse()
    }

    #[inline]
    fn times_minus_two(x: T) -> T {
        -(T::one() + T::one()) * x
    }

    #[inline]
    fn add(a: T, b: T) -> T {
        a + b
    }

    #[inline]
    fn ratio(num: T, den: T) -> T {
        num / den
    }

    #[inline]
    fn add_scaled(a: T, k: T, x: T) -> T {
        a + k * x
    }

    #[inline]
    fn decay(x: T, k: T) -> T {
        x * (T::one() - k * k)
    }
}

/// Baseline Burg engine.
///
/// # Examples
///
/// ```
/// # use burgpred::burg::{BasicBurg, Engine};
/// let signal: Vec<f64> = (0..256).map(|t| (0.1 * t as f64).sin()).collect();
/// let mut engine = BasicBurg::new(256);
/// let fit = engine.fit(&signal, 2).unwrap();
/// assert_eq!(fit.coefs().len(), 3);
/// let next = engine.predict(&signal, fit.coefs(), 1).unwrap();
/// assert!((next[0] - (25.6f64).sin()).abs() < 1e-3);
/// ```
#[derive(Clone, Debug)]
pub struct BasicBurg<T> {
    workspace: Workspace<T>,
}

impl<T: Real> BasicBurg<T> {
    /// Constructs an engine for windows of up to `max_size` samples.
    ///
    /// # Panics
    ///
    /// Panics if `max_size` is zero. Use [`BasicBurg::try_new`] for
    /// non-literal sizes.
    pub fn new(max_size: usize) -> Self {
        assert!(max_size > 0, "{}", panic_msg::ZERO_MAX_SIZE);
        Self {
            workspace: Workspace::new(max_size),
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
}

impl<T: Real> Engine<T> for BasicBurg<T> {
    fn max_size(&self) -> usize {
        self.workspace.max_size()
    }

    fn fit(&mut self, samples: &[T], order: usize) -> Result<Fit<T>, BurgError> {
        self.workspace.fit::<Plain, _>(samples, order, &mut ExactDenominator)
    }

    fn predict(&self, samples: &[T], coefs: &[T], n: usize) -> Result<Vec<T>, BurgError> {
        predict_with(samples, coefs, n, |x, y| dot_basic(x, y).collapse())
    }
}
