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

//! Burg engine with compensated arithmetic.

use super::super::compensated::dot_2;
use super::super::compensated::two_product_fma;
use super::super::compensated::Compensated;
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

/// Arithmetic that carries the rounding error of every product and sum in a
/// [`Compensated`] pair and collapses it only when a scalar is stored.
pub(crate) struct Compensating;

impl Compensating {
    /// `1 - k²` as a collapsed scalar.
    #[inline]
    pub(crate) fn one_minus_square<T: Real>(k: T) -> T {
        (Compensated::from_value(T::one()) + two_product_fma(k, -k)).collapse()
    }
}

impl<T: Real> Arithmetic<T> for Compensating {
    #[inline]
    fn dot(x: &[T], y: &[T]) -> T {
        dot_2(x, y).collapse()
    }

    #[inline]
    fn times_minus_two(x: T) -> T {
        two_product_fma(x, -(T::one() + T::one())).collapse()
    }

    #[inline]
    fn add(a: T, b: T) -> T {
        (Compensated::from_value(a) + Compensated::from_value(b)).collapse()
    }

    #[inline]
    fn ratio(num: T, den: T) -> T {
        two_product_fma(num, den.recip()).collapse()
    }

    #[inline]
    fn add_scaled(a: T, k: T, x: T) -> T {
        (Compensated::from_value(a) + two_product_fma(k, x)).collapse()
    }

    #[inline]
    fn decay(x: T, k: T) -> T {
        two_product_fma(x, Self::one_minus_square(k)).collapse()
    }
}

/// Burg engine using error-free transformations throughout the recursion.
#[derive(Clone, Debug)]
pub struct CompensatedBurg<T> {
    workspace: Workspace<T>,
}

impl<T: Real> CompensatedBurg<T> {
    /// Constructs an engine for windows of up to `max_size` samples.
    ///
    /// # Panics
    ///
    /// Panics if `max_size` is zero.
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

impl<T: Real> Engine<T> for CompensatedBurg<T> {
    fn max_size(&self) -> usize {
        self.workspace.max_size()
    }

    fn fit(&mut self, samples: &[T], order: usize) -> Result<Fit<T>, BurgError> {
        self.workspace.fit::<Compensating, _>(samples, order, &mut ExactDenominator)
    }

    fn predict(&self, samples: &[T], coefs: &[T], n: usize) -> Result<Vec<T>, BurgError> {
        predict(samples, coefs, n)
    }
}

/// Compensated-engine prediction, shared with the optimized engine.
pub(crate) fn predict<T: Real>(samples: &[T], coefs: &[T], n: usize) -> Result<Vec<T>, BurgError> {
    predict_with(samples, coefs, n, |x, y| dot_2(x, y).collapse())
}
