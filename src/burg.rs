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

//! Burg-method autoregressive modeling.
//!
//! All engines share the same recursion: starting from the forward and
//! backward prediction errors `f = b = x`, each step `i` computes a
//! reflection coefficient
//!
//! ```text
//! k_i = -2 Σ b[j] f[j + i] / (Σ f[j + i]² + Σ b[j]²)
//! ```
//!
//! updates `f` and `b` simultaneously, applies the Levinson-style symmetric
//! update to the coefficient vector, and decays the residual energy by
//! `1 - k_i²`. The engines differ only in the arithmetic used for those
//! steps and in how the denominator is obtained.

use std::fmt;

#[cfg(feature = "serde")]
use serde::Deserialize;
#[cfg(feature = "serde")]
use serde::Serialize;

use super::config;
use super::error::verify_true;
use super::error::BurgError;
use super::error::Verify;
use super::error::VerifyError;
use super::real::Real;

mod basic;
mod compensated;
mod optimized;

pub use basic::BasicBurg;
pub use compensated::CompensatedBurg;
pub use optimized::switching_point;
pub use optimized::OptimizedDenBurg;

/// Common interface of the Burg engines.
///
/// An engine owns working buffers sized for `max_size` samples. `fit` reuses
/// them (hence `&mut self`) while `predict` only reads its arguments.
pub trait Engine<T: Real>: Send {
    /// Returns the capacity of the sample window.
    fn max_size(&self) -> usize;

    /// Returns the largest model order this engine can fit.
    fn max_order(&self) -> usize {
        self.max_size() - 1
    }

    /// Fits an AR model of `order` to the trailing window of `samples`.
    ///
    /// Only the last `max_size` samples are used, and `order` is clipped to
    /// `max_order`.
    ///
    /// # Errors
    ///
    /// Returns `BurgError::InvalidArgument` when `samples` is empty or
    /// `order` is zero.
    fn fit(&mut self, samples: &[T], order: usize) -> Result<Fit<T>, BurgError>;

    /// Extrapolates `n` samples following `samples` using `coefs`.
    ///
    /// # Errors
    ///
    /// Returns `BurgError::InvalidArgument` when `coefs` is empty, when
    /// `coefs[0]` is not one, or when `samples` is shorter than the model
    /// order.
    fn predict(&self, samples: &[T], coefs: &[T], n: usize) -> Result<Vec<T>, BurgError>;
}

/// Event recorded when a reflection coefficient leaves the open unit
/// interval, i.e. the fitted lattice filter is not guaranteed to be stable.
///
/// Both signs are checked: any `|k| >= 1` is reported, including `k = -1`,
/// which a constant (DC) input produces at the first step. Checks that only
/// look at `k >= 1` never report such fits.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Instability<T> {
    /// Recursion step (equal to the model order at that step).
    pub step: usize,
    /// The offending reflection coefficient.
    pub reflection: T,
}

/// Result of [`Engine::fit`].
#[derive(Clone, Debug, PartialEq)]
pub struct Fit<T> {
    coefs: Vec<T>,
    error: T,
    instabilities: Vec<Instability<T>>,
}

impl<T: Real> Fit<T> {
    pub(crate) fn new(coefs: Vec<T>, error: T, instabilities: Vec<Instability<T>>) -> Self {
        Self {
            coefs,
            error,
            instabilities,
        }
    }

    /// Returns the AR coefficients. The first element is always one.
    pub fn coefs(&self) -> &[T] {
        &self.coefs
    }

    /// Returns the estimated residual energy.
    pub const fn error(&self) -> T {
        self.error
    }

    /// Returns the model order actually fitted.
    pub fn order(&self) -> usize {
        self.coefs.len() - 1
    }

    /// Returns the recorded instability events.
    pub fn instabilities(&self) -> &[Instability<T>] {
        &self.instabilities
    }

    /// Returns true if every reflection coefficient satisfied `|k| < 1`.
    pub fn is_stable(&self) -> bool {
        self.instabilities.is_empty()
    }

    /// Decomposes into the coefficient vector and the residual energy.
    pub fn into_parts(self) -> (Vec<T>, T) {
        (self.coefs, self.error)
    }
}

/// Enum for selecting an engine at runtime.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[non_exhaustive]
pub enum EngineKind {
    /// [`BasicBurg`].
    Basic,
    /// [`CompensatedBurg`].
    Compensated,
    /// [`OptimizedDenBurg`].
    #[default]
    OptimizedDenominator,
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic => write!(f, "basic"),
            Self::Compensated => write!(f, "compensated"),
            Self::OptimizedDenominator => write!(f, "optimized-denominator"),
        }
    }
}

/// Engine selected at runtime by [`EngineKind`].
#[derive(Clone, Debug)]
pub enum AnyEngine<T: Real> {
    /// [`BasicBurg`].
    Basic(BasicBurg<T>),
    /// [`CompensatedBurg`].
    Compensated(CompensatedBurg<T>),
    /// [`OptimizedDenBurg`].
    OptimizedDenominator(OptimizedDenBurg<T>),
}

impl<T: Real> AnyEngine<T> {
    /// Constructs an engine of `kind` with the default parameters.
    ///
    /// # Panics
    ///
    /// Panics if `max_size` is zero.
    pub fn new(kind: EngineKind, max_size: usize) -> Self {
        match kind {
            EngineKind::Basic => Self::Basic(BasicBurg::new(max_size)),
            EngineKind::Compensated => Self::Compensated(CompensatedBurg::new(max_size)),
            EngineKind::OptimizedDenominator => {
                Self::OptimizedDenominator(OptimizedDenBurg::new(max_size))
            }
        }
    }

    /// Constructs an engine of `kind`, failing on zero `max_size`.
    ///
    /// # Errors
    ///
    /// Returns `BurgError::InvalidArgument` if `max_size` is zero.
    pub fn try_new(kind: EngineKind, max_size: usize) -> Result<Self, BurgError> {
        verify_max_size(max_size)?;
        Ok(Self::new(kind, max_size))
    }

    /// Constructs an engine from a config.
    ///
    /// # Errors
    ///
    /// Returns `BurgError::InvalidArgument` if the config is not valid.
    ///
    /// # Examples
    ///
    /// ```
    /// # use burgpred::burg::{AnyEngine, Engine, EngineKind};
    /// # use burgpred::config;
    /// let mut conf = config::Engine::default();
    /// conf.kind = EngineKind::Compensated;
    /// conf.max_size = 64;
    /// let engine = AnyEngine::<f64>::from_config(&conf).unwrap();
    /// assert_eq!(engine.kind(), EngineKind::Compensated);
    /// assert_eq!(engine.max_order(), 63);
    /// ```
    pub fn from_config(config: &config::Engine) -> Result<Self, BurgError> {
        config.verify().map_err(|e| e.within("engine"))?;
        let (size, sp) = (config.max_size, config.min_switching_point);
        Ok(match config.kind {
            EngineKind::OptimizedDenominator => {
                Self::OptimizedDenominator(OptimizedDenBurg::with_min_switching_point(size, sp))
            }
            kind => Self::new(kind, size),
        })
    }

    /// Returns the kind of the wrapped engine.
    pub const fn kind(&self) -> EngineKind {
        match self {
            Self::Basic(_) => EngineKind::Basic,
            Self::Compensated(_) => EngineKind::Compensated,
            Self::OptimizedDenominator(_) => EngineKind::OptimizedDenominator,
        }
    }
}

impl<T: Real> Engine<T> for AnyEngine<T> {
    fn max_size(&self) -> usize {
        match self {
            Self::Basic(e) => e.max_size(),
            Self::Compensated(e) => e.max_size(),
            Self::OptimizedDenominator(e) => e.max_size(),
        }
    }

    fn fit(&mut self, samples: &[T], order: usize) -> Result<Fit<T>, BurgError> {
        match self {
            Self::Basic(e) => e.fit(samples, order),
            Self::Compensated(e) => e.fit(samples, order),
            Self::OptimizedDenominator(e) => e.fit(samples, order),
        }
    }

    fn predict(&self, samples: &[T], coefs: &[T], n: usize) -> Result<Vec<T>, BurgError> {
        match self {
            Self::Basic(e) => e.predict(samples, coefs, n),
            Self::Compensated(e) => e.predict(samples, coefs, n),
            Self::OptimizedDenominator(e) => e.predict(samples, coefs, n),
        }
    }
}

/// Scalar operations used in the recursion.
///
/// Implementations decide how much rounding error is tracked; they never
/// change the operation order.
pub(crate) trait Arithmetic<T: Real> {
    /// `Σ x[j]·y[j]` over the common prefix.
    fn dot(x: &[T], y: &[T]) -> T;
    /// `-2·x`.
    fn times_minus_two(x: T) -> T;
    /// `a + b`.
    fn add(a: T, b: T) -> T;
    /// `num / den`.
    fn ratio(num: T, den: T) -> T;
    /// `a + k·x`.
    fn add_scaled(a: T, k: T, x: T) -> T;
    /// `x·(1 - k²)`.
    fn decay(x: T, k: T) -> T;
}

/// Strategy for the denominator of the reflection coefficient.
pub(crate) trait Denominator<T: Real> {
    /// Called once per fit, before the first step.
    fn start(&mut self, energy: T, params: &FitParams);

    /// Returns the (non-zero) denominator of step `step`.
    ///
    /// `f` and `b` are the error sequences trimmed to the window length, as
    /// left by the previous step. `prev_k` is the reflection coefficient of
    /// the previous step (zero for the first step).
    fn next<A: Arithmetic<T>>(&mut self, step: usize, f: &[T], b: &[T], prev_k: T) -> T;
}

/// Denominator computed from the full sums at every step.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ExactDenominator;

impl<T: Real> Denominator<T> for ExactDenominator {
    fn start(&mut self, _energy: T, _params: &FitParams) {}

    fn next<A: Arithmetic<T>>(&mut self, step: usize, f: &[T], b: &[T], _prev_k: T) -> T {
        exact_denominator::<T, A>(step, f, b)
    }
}

/// `Σ f[j + step]² + Σ b[j]²` with the epsilon guard applied.
///
/// Both sums are empty once `step` reaches the window length.
pub(crate) fn exact_denominator<T: Real, A: Arithmetic<T>>(step: usize, f: &[T], b: &[T]) -> T {
    let overlap = f.len().saturating_sub(step);
    let tail = &f[f.len() - overlap..];
    let head = &b[..overlap];
    nonzero_or_epsilon(A::add(A::dot(tail, tail), A::dot(head, head)))
}

/// Replaces an exactly-zero denominator with machine epsilon.
#[inline]
pub(crate) fn nonzero_or_epsilon<T: Real>(den: T) -> T {
    if den == T::zero() {
        T::epsilon()
    } else {
        den
    }
}

/// Effective parameters of a single fit.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct FitParams {
    /// Number of samples actually used.
    pub size: usize,
    /// Offset of the first used sample in the input.
    pub start: usize,
    /// Model order actually fitted.
    pub order: usize,
}

/// Forward/backward error buffers owned by an engine.
#[derive(Clone, Debug)]
pub(crate) struct Workspace<T> {
    f: Vec<T>,
    b: Vec<T>,
}

impl<T: Real> Workspace<T> {
    pub fn new(max_size: usize) -> Self {
        Self {
            f: vec![T::zero(); max_size],
            b: vec![T::zero(); max_size],
        }
    }

    pub fn max_size(&self) -> usize {
        self.f.len()
    }

    /// Copies the trailing window of `samples` into both buffers.
    fn load(&mut self, samples: &[T], order: usize) -> FitParams {
        let size = std::cmp::min(samples.len(), self.max_size());
        let start = samples.len() - size;
        let order = std::cmp::min(order, self.max_size() - 1);
        self.f[..size].copy_from_slice(&samples[start..]);
        self.b[..size].copy_from_slice(&samples[start..]);
        FitParams { size, start, order }
    }

    /// Runs the Burg recursion with the arithmetic `A` and the denominator
    /// strategy `den`.
    pub fn fit<A, D>(
        &mut self,
        samples: &[T],
        order: usize,
        den: &mut D,
    ) -> Result<Fit<T>, BurgError>
    where
        A: Arithmetic<T>,
        D: Denominator<T>,
    {
        verify_fit_args(samples, order)?;
        let params = self.load(samples, order);
        let FitParams { size, start, order } = params;
        debug!(
            "fit: actual_size={}, sample_range=[{}, {}), actual_order={}",
            size,
            start,
            start + size,
            order
        );

        let window = &samples[start..];
        let f = &mut self.f[..size];
        let b = &mut self.b[..size];
        let mut coefs = vec![T::zero(); order + 1];
        coefs[0] = T::one();
        let mut err = A::dot(window, window);
        den.start(err, &params);

        let mut k = T::zero();
        let mut instabilities = vec![];
        for i in 1..=order {
            // empty when the order exceeds the window, which yields k = 0.
            let overlap = size.saturating_sub(i);
            let num = A::times_minus_two(A::dot(&b[..overlap], &f[size - overlap..]));
            let d = den.next::<A>(i, f, b, k);
            k = A::ratio(num, d);

            for j in i..size {
                let bj = b[j - i];
                let fj = f[j];
                b[j - i] = A::add_scaled(bj, k, fj);
                f[j] = A::add_scaled(fj, k, bj);
            }
            for j in 1..=i / 2 {
                let aj = coefs[j];
                let anj = coefs[i - j];
                coefs[j] = A::add_scaled(aj, k, anj);
                coefs[i - j] = A::add_scaled(anj, k, aj);
            }
            coefs[i] = k;
            err = A::decay(err, k);

            observe_step(i, k, err, &mut instabilities);
        }
        Ok(Fit::new(coefs, err, instabilities))
    }
}

/// Logs a recursion step and records an instability if `|k| >= 1`.
fn observe_step<T: Real>(step: usize, k: T, err: T, instabilities: &mut Vec<Instability<T>>) {
    trace!(
        "step {}: k={}, err={}",
        step,
        crate::real::RoundTrip(k),
        crate::real::RoundTrip(err)
    );
    if k.abs() >= T::one() {
        warn!(
            "reflection coefficient out of the unit interval at step {}: k={}",
            step,
            crate::real::RoundTrip(k)
        );
        instabilities.push(Instability {
            step,
            reflection: k,
        });
    }
}

pub(crate) fn verify_max_size(max_size: usize) -> Result<(), BurgError> {
    verify_true!("max_size", max_size > 0, "must be positive")
        .map_err(|e| BurgError::from(e.within("new")))
}

fn verify_fit_args<T: Real>(samples: &[T], order: usize) -> Result<(), BurgError> {
    verify_true!("samples", !samples.is_empty(), "must not be empty")
        .and_then(|()| verify_true!("order", order > 0, "must be positive"))
        .map_err(|e| BurgError::from(e.within("fit")))
}

fn verify_predict_args<T: Real>(samples: &[T], coefs: &[T]) -> Result<(), VerifyError> {
    verify_true!("coefs", !coefs.is_empty(), "must not be empty")?;
    verify_true!("coefs[0]", coefs[0] == T::one(), "must be one")?;
    let order = coefs.len() - 1;
    let len = samples.len();
    verify_true!(
        "samples",
        len >= order,
        "must have at least {order} elements (got {len})"
    )
}

/// Extrapolates `n` samples, computing each prediction with `dot`.
///
/// Prediction `t` is `Σ_{j>=1} -x[t - j]·coefs[j]` where `x` continues
/// `samples` with the predictions made so far.
pub(crate) fn predict_with<T, F>(
    samples: &[T],
    coefs: &[T],
    n: usize,
    dot: F,
) -> Result<Vec<T>, BurgError>
where
    T: Real,
    F: Fn(&[T], &[T]) -> T,
{
    verify_predict_args(samples, coefs).map_err(|e| BurgError::from(e.within("predict")))?;
    let order = coefs.len() - 1;
    let mut history: Vec<T> = Vec::with_capacity(order + n);
    history.extend_from_slice(&samples[samples.len() - order..]);
    let mut lags = vec![T::zero(); order];
    for _t in 0..n {
        let newest = history.len();
        for (j, lag) in lags.iter_mut().enumerate() {
            *lag = -history[newest - 1 - j];
        }
        history.push(dot(&lags, &coefs[1..]));
    }
    Ok(history.split_off(order))
}
