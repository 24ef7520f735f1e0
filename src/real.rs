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

//! Real number abstraction shared by the arithmetic primitives and engines.

use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::LowerExp;

use num_traits::Float;

/// Floating-point type that the Burg engines can operate on.
///
/// This is implemented for `f32` and `f64`. The error-free transformations in
/// [`compensated`] rely on round-to-nearest IEEE-754 arithmetic and a fused
/// multiply-add, so only hardware binary floating-point types qualify.
///
/// [`compensated`]: crate::compensated
pub trait Real: Float + Debug + Display + LowerExp + Default + Send + Sync + 'static {
    /// Short type name used in reports and log lines.
    const NAME: &'static str;

    /// Number of decimal digits required to round-trip a value.
    const SIGNIFICANT_DIGITS: usize;

    /// Converts from `f64`, rounding to the nearest representable value.
    fn from_f64_lossy(x: f64) -> Self;

    /// Widens (or keeps) the value as `f64`.
    fn into_f64(self) -> f64;

    /// Converts from `usize`, rounding when the integer is not representable.
    #[inline]
    fn from_usize_lossy(x: usize) -> Self {
        Self::from_f64_lossy(x as f64)
    }
}

/// Formats a value in scientific notation with [`Real::SIGNIFICANT_DIGITS`]
/// digits, so the printed text parses back to the same value.
#[derive(Clone, Copy, Debug)]
pub struct RoundTrip<T>(pub T);

impl<T: Real> Display for RoundTrip<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.*e}", T::SIGNIFICANT_DIGITS - 1, self.0)
    }
}

impl Real for f32 {
    const NAME: &'static str = "float";
    const SIGNIFICANT_DIGITS: usize = 9;

    #[inline]
    fn from_f64_lossy(x: f64) -> Self {
        x as Self
    }

    #[inline]
    fn into_f64(self) -> f64 {
        f64::from(self)
    }
}

impl Real for f64 {
    const NAME: &'static str = "double";
    const SIGNIFICANT_DIGITS: usize = 17;

    #[inline]
    fn from_f64_lossy(x: f64) -> Self {
        x
    }

    #[inline]
    fn into_f64(self) -> f64 {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_digits() {
        assert_eq!(<f32 as Real>::NAME, "float");
        assert_eq!(<f64 as Real>::NAME, "double");
        assert!(f32::SIGNIFICANT_DIGITS < f64::SIGNIFICANT_DIGITS);
    }

    #[test]
    fn lossy_conversion_rounds_to_nearest() {
        let x = 1.0f64 + f64::EPSILON;
        assert_eq!(f32::from_f64_lossy(x), 1.0f32);
        assert_eq!(f64::from_f64_lossy(x), x);
        assert_eq!(0.5f32.into_f64(), 0.5f64);
        assert_eq!(f32::from_usize_lossy(3), 3.0f32);
    }

    #[test]
    fn round_trip_display_parses_back() {
        let x = 0.1f32 + f32::EPSILON;
        let text = RoundTrip(x).to_string();
        assert_eq!(text.parse::<f32>().expect("Parse failed"), x);
        assert_eq!(text.split('e').next().map(str::len), Some(10));

        let y = -std::f64::consts::PI / 3.0;
        let text = RoundTrip(y).to_string();
        assert_eq!(text.parse::<f64>().expect("Parse failed"), y);
        assert_eq!(text.split('e').next().map(str::len), Some(19));
    }
}
