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

//! Error-free transformations and compensated summations/dot products.
//!
//! Every function here returns a [`Compensated`] pair `(value, error)` where
//! `value` is the floating-point result and `error` approximates the rounding
//! error committed while computing it, so that `value + error` is closer to
//! the exact result than `value` alone.

use std::ops::Add;
use std::ops::Mul;
use std::ops::Neg;

#[cfg(feature = "serde")]
use serde::Deserialize;
#[cfg(feature = "serde")]
use serde::Serialize;

use super::real::Real;

/// Unevaluated sum `value + error` of two floating-point numbers.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Compensated<T> {
    value: T,
    error: T,
}

impl<T: Real> Compensated<T> {
    /// Constructs a pair from the rounded value and its error term.
    #[inline]
    pub const fn new(value: T, error: T) -> Self {
        Self { value, error }
    }

    /// Constructs an exact pair, i.e. one with a zero error term.
    #[inline]
    pub fn from_value(value: T) -> Self {
        Self::new(value, T::zero())
    }

    /// Constructs `0 + 0`.
    #[inline]
    pub fn zero() -> Self {
        Self::new(T::zero(), T::zero())
    }

    /// Returns the rounded value.
    #[inline]
    pub const fn value(&self) -> T {
        self.value
    }

    /// Returns the error term.
    #[inline]
    pub const fn error(&self) -> T {
        self.error
    }

    /// Collapses the pair into a single floating-point number.
    #[inline]
    pub fn collapse(self) -> T {
        self.value + self.error
    }

    /// Multiplies both components by `k` (no error-free transformation).
    #[inline]
    #[must_use]
    pub fn scale(self, k: T) -> Self {
        Self::new(k * self.value, k * self.error)
    }
}

impl<T: Real> From<T> for Compensated<T> {
    fn from(value: T) -> Self {
        Self::from_value(value)
    }
}

/// Sums two pairs by collapsing them first and applying [`two_sum`].
impl<T: Real> Add for Compensated<T> {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        two_sum(self.collapse(), rhs.collapse())
    }
}

impl<T: Real> Neg for Compensated<T> {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.value, -self.error)
    }
}

/// Same as [`Compensated::scale`].
impl<T: Real> Mul<T> for Compensated<T> {
    type Output = Self;

    #[inline]
    fn mul(self, k: T) -> Self {
        self.scale(k)
    }
}

/// Knuth's TwoSum. No requirement on the magnitude of operands.
///
/// # Examples
///
/// ```
/// # use burgpred::compensated::two_sum;
/// let p = two_sum(1.0e16f64, 1.0);
/// assert_eq!(p.value(), 1.0e16);
/// assert_eq!(p.error(), 1.0);
/// ```
#[inline]
pub fn two_sum<T: Real>(a: T, b: T) -> Compensated<T> {
    let r = a + b;
    let z = r - a;
    let e = (a - (r - z)) + (b - z);
    Compensated::new(r, e)
}

/// Dekker's FastTwoSum. Exact only when `|a| >= |b|`.
#[inline]
pub fn fast_two_sum<T: Real>(a: T, b: T) -> Compensated<T> {
    let r = a + b;
    let e = (a - r) + b;
    Compensated::new(r, e)
}

/// [`fast_two_sum`] that swaps the operands when `|a| < |b|`.
#[inline]
pub fn fast_two_sum_safe<T: Real>(a: T, b: T) -> Compensated<T> {
    if a.abs() >= b.abs() {
        fast_two_sum(a, b)
    } else {
        fast_two_sum(b, a)
    }
}

/// Error-free product using a fused multiply-add.
///
/// # Examples
///
/// ```
/// # use burgpred::compensated::two_product_fma;
/// let x = 1.0f64 + 2.0f64.powi(-30);
/// let p = two_product_fma(x, x);
/// assert_eq!(p.value(), 1.0 + 2.0f64.powi(-29));
/// assert_eq!(p.error(), 2.0f64.powi(-60));
/// ```
#[inline]
pub fn two_product_fma<T: Real>(a: T, b: T) -> Compensated<T> {
    let r = a * b;
    let e = a.mul_add(b, -r);
    Compensated::new(r, e)
}

/// Plain summation. The error term is always zero.
pub fn sum_basic<T: Real>(x: &[T]) -> Compensated<T> {
    Compensated::from_value(x.iter().fold(T::zero(), |acc, &v| acc + v))
}

/// Sum2s from Ogita, Rump and Oishi (2005).
pub fn sum_2s<T: Real>(x: &[T]) -> Compensated<T> {
    let Some((&first, rest)) = x.split_first() else {
        return Compensated::zero();
    };
    let mut p = first;
    let mut s = T::zero();
    for &v in rest {
        let t = two_sum(p, v);
        p = t.value;
        s = s + t.error;
    }
    Compensated::new(p, s)
}

/// Doubly compensated summation as done in XBLAS.
pub fn sum_xblas<T: Real>(x: &[T]) -> Compensated<T> {
    let mut s = T::zero();
    let mut t = T::zero();
    for &v in x {
        let t12 = two_sum(s, v);
        let acc = fast_two_sum(t12.value, t12.error + t);
        s = acc.value;
        t = acc.error;
    }
    Compensated::new(s, t)
}

/// Plain dot product. The error term is always zero.
///
/// Only the common prefix of `x` and `y` is used.
pub fn dot_basic<T: Real>(x: &[T], y: &[T]) -> Compensated<T> {
    let dot = x.iter().zip(y).fold(T::zero(), |s, (&a, &b)| s + a * b);
    Compensated::from_value(dot)
}

/// Dot2 from Ogita, Rump and Oishi (2005).
///
/// Only the common prefix of `x` and `y` is used.
///
/// # Examples
///
/// ```
/// # use burgpred::compensated::{dot_2, dot_basic};
/// let x = [1.0e16f64, 1.0, -1.0e16];
/// let y = [1.0f64; 3];
/// assert_eq!(dot_basic(&x, &y).collapse(), 0.0);
/// assert_eq!(dot_2(&x, &y).collapse(), 1.0);
/// ```
pub fn dot_2<T: Real>(x: &[T], y: &[T]) -> Compensated<T> {
    let mut iter = x.iter().zip(y);
    let Some((&x0, &y0)) = iter.next() else {
        return Compensated::zero();
    };
    let first = two_product_fma(x0, y0);
    let mut p = first.value;
    let mut s = first.error;
    for (&a, &b) in iter {
        let hr = two_product_fma(a, b);
        let pq = two_sum(p, hr.value);
        p = pq.value;
        s = s + (pq.error + hr.error);
    }
    Compensated::new(p, s)
}

/// Doubly compensated dot product as done in XBLAS.
///
/// Only the common prefix of `x` and `y` is used.
pub fn dot_xblas<T: Real>(x: &[T], y: &[T]) -> Compensated<T> {
    let mut s = T::zero();
    let mut t = T::zero();
    for (&a, &b) in x.iter().zip(y) {
        let hr = two_product_fma(a, b);
        let s12 = two_sum(s, hr.value);
        let t12 = two_sum(t, hr.error);
        let inner = fast_two_sum(s12.value, s12.error + t12.value);
        let outer = fast_two_sum(inner.value, t12.error + inner.error);
        s = outer.value;
        t = outer.error;
    }
    Compensated::new(s, t)
}

/// Summation algorithms available through [`sum`].
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[non_exhaustive]
pub enum SumMethod {
    /// [`sum_basic`].
    Basic,
    /// [`sum_2s`].
    #[default]
    Sum2s,
    /// [`sum_xblas`].
    Xblas,
}

/// Dot product algorithms available through [`dot`].
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[non_exhaustive]
pub enum DotMethod {
    /// [`dot_basic`].
    Basic,
    /// [`dot_2`].
    #[default]
    Dot2,
    /// [`dot_xblas`].
    Xblas,
}

/// Sums `x` with the selected algorithm.
pub fn sum<T: Real>(x: &[T], method: SumMethod) -> Compensated<T> {
    match method {
        SumMethod::Basic => sum_basic(x),
        SumMethod::Sum2s => sum_2s(x),
        SumMethod::Xblas => sum_xblas(x),
    }
}

/// Computes the dot product of `x` and `y` with the selected algorithm.
pub fn dot<T: Real>(x: &[T], y: &[T], method: DotMethod) -> Compensated<T> {
    match method {
        DotMethod::Basic => dot_basic(x, y),
        DotMethod::Dot2 => dot_2(x, y),
        DotMethod::Xblas => dot_xblas(x, y),
    }
}
