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

//! Prediction benchmark over a single channel.
//!
//! A channel is evaluated at a set of randomly drawn positions. At each
//! position, the preceding `train_size` samples are used for fitting a fresh
//! engine, and the following `test_size` samples are compared against the
//! predictions. Two baselines are recorded for reference: predicting silence
//! (`b0`) and repeating the previous `test_size` samples (`b1`).
//!
//! [`evaluate_tone`] runs a deterministic sweep instead: one synthetic tone,
//! one position, and the full per-sample error of every prediction.

use std::time::Duration;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
#[cfg(feature = "serde")]
use serde::Deserialize;
#[cfg(feature = "serde")]
use serde::Serialize;

use super::burg::AnyEngine;
use super::burg::Engine;
use super::burg::EngineKind;
use super::config;
use super::config::Precision;
use super::error::EvalError;
use super::error::Verify;
use super::error::VerifyError;
use super::real::Real;
use super::sigen::Signal;
use super::sigen::Sine;
use super::source::MemSource;

/// Mean absolute error between `expected` and `actual`.
///
/// Only the common prefix of the two slices is compared. Returns zero for
/// empty input.
///
/// # Examples
///
/// ```
/// # use burgpred::eval::mae;
/// assert_eq!(mae(&[1.0, -1.0], &[0.5, 0.5]), 1.0);
/// ```
pub fn mae<T: Real>(expected: &[T], actual: &[T]) -> T {
    let n = expected.len().min(actual.len());
    if n == 0 {
        return T::zero();
    }
    let total = expected
        .iter()
        .zip(actual)
        .fold(T::zero(), |acc, (&e, &a)| acc + (e - a).abs());
    total / T::from_usize_lossy(n)
}

/// Absolute error of each sample of `actual` against `expected`.
///
/// Only the common prefix of the two slices is compared.
///
/// # Examples
///
/// ```
/// # use burgpred::eval::ae;
/// assert_eq!(ae(&[1.0, -1.0, 2.0], &[0.5, 0.5]), vec![0.5, 1.5]);
/// ```
pub fn ae<T: Real>(expected: &[T], actual: &[T]) -> Vec<T> {
    expected
        .iter()
        .zip(actual)
        .map(|(&e, &a)| (a - e).abs())
        .collect()
}

/// Mean squared error between `expected` and `actual`.
///
/// Same conventions as [`mae`].
pub fn mse<T: Real>(expected: &[T], actual: &[T]) -> T {
    let n = expected.len().min(actual.len());
    if n == 0 {
        return T::zero();
    }
    let total = expected
        .iter()
        .zip(actual)
        .fold(T::zero(), |acc, (&e, &a)| {
            let d = e - a;
            d.mul_add(d, acc)
        });
    total / T::from_usize_lossy(n)
}

/// Root mean squared error between `expected` and `actual`.
pub fn rmse<T: Real>(expected: &[T], actual: &[T]) -> T {
    mse(expected, actual).sqrt()
}

/// Draws `n` distinct positions in `[min, max)` that are multiples of
/// `multiple_of`.
///
/// `min` is first rounded up and `max` rounded down to a multiple of
/// `multiple_of`. A draw that collides with an earlier one is moved to the
/// next free slot, wrapping around at the end of the range. The result is
/// sorted in ascending order.
///
/// # Errors
///
/// Returns an error when `multiple_of` is zero, or when fewer than `n`
/// slots are available after alignment.
///
/// # Examples
///
/// ```
/// # use burgpred::eval::sample_positions;
/// use rand::SeedableRng;
/// let mut rng = rand::rngs::StdRng::seed_from_u64(1);
/// let positions = sample_positions(&mut rng, 100, 1000, 5, 128).unwrap();
/// assert_eq!(positions.len(), 5);
/// assert!(positions.iter().all(|p| p % 128 == 0 && (128..896).contains(p)));
/// ```
pub fn sample_positions<R: Rng>(
    rng: &mut R,
    min: usize,
    max: usize,
    n: usize,
    multiple_of: usize,
) -> Result<Vec<usize>, VerifyError> {
    if multiple_of == 0 {
        return Err(VerifyError::new("multiple_of", "must be positive"));
    }
    let slot_min = min.div_ceil(multiple_of);
    let slot_max = max / multiple_of;
    if slot_max <= slot_min || n > slot_max - slot_min {
        return Err(VerifyError::new(
            "positions",
            &format!(
                "cannot draw {n} positions from range [{min}, {max}) aligned to {multiple_of}"
            ),
        ));
    }
    let slots = slot_max - slot_min;
    let mut taken = vec![false; slots];
    for _i in 0..n {
        let mut slot = rng.gen_range(0..slots);
        while taken[slot] {
            slot = (slot + 1) % slots;
        }
        taken[slot] = true;
    }
    Ok(taken
        .iter()
        .enumerate()
        .filter_map(|(slot, &t)| t.then_some((slot + slot_min) * multiple_of))
        .collect())
}

/// Error metrics of a baseline predictor.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct BaselineReport {
    /// MAE at each position.
    pub mae: Vec<f64>,
    /// RMSE at each position.
    pub rmse: Vec<f64>,
}

impl BaselineReport {
    fn push<T: Real>(&mut self, expected: &[T], actual: &[T]) {
        self.mae.push(mae(expected, actual).into_f64());
        self.rmse.push(rmse(expected, actual).into_f64());
    }
}

/// Results of one `(train_size, order)` pair.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct CaseReport {
    pub train_size: usize,
    pub order: usize,
    /// Prediction MAE at each position.
    pub mae: Vec<f64>,
    /// Prediction RMSE at each position.
    pub rmse: Vec<f64>,
    /// Wall-clock time of `fit` in nanoseconds.
    pub fit_time_ns: Vec<u64>,
    /// Wall-clock time of `predict` in nanoseconds.
    pub predict_time_ns: Vec<u64>,
    /// Number of fits that reported at least one instability.
    pub unstable_count: usize,
    /// Number of evaluated positions.
    pub total_count: usize,
}

/// Results for a channel.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct ChannelReport {
    pub engine: EngineKind,
    /// Name of the sample type the engines ran with.
    pub sample_type: String,
    /// Evaluated positions in ascending order.
    pub positions: Vec<usize>,
    /// Silence predictor.
    pub b0: BaselineReport,
    /// Previous-packet predictor.
    pub b1: BaselineReport,
    /// One entry per `(train_size, order)` in configuration order.
    pub cases: Vec<CaseReport>,
}

/// Evaluation job shared by the sequential and the parallel drivers.
#[derive(Clone, Debug)]
pub(crate) struct Plan {
    pub positions: Vec<usize>,
    pub cases: Vec<(usize, usize)>,
}

impl Plan {
    /// Verifies `config` and draws positions for a channel of `len` samples.
    pub fn new(config: &config::Evaluation, len: usize) -> Result<Self, EvalError> {
        config.verify()?;
        let max = len.checked_sub(config.test_size).ok_or_else(|| {
            VerifyError::new(
                "samples",
                &format!("must be longer than test_size (got {len})"),
            )
        })?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        // The previous-packet baseline also needs `test_size` history.
        let min = config.max_train_size().max(config.test_size);
        let positions = sample_positions(&mut rng, min, max, config.positions, config.test_size)?;
        debug!("eval: positions={:?}", positions);
        let cases = config
            .train_sizes
            .iter()
            .flat_map(|&ts| config.orders.iter().map(move |&order| (ts, order)))
            .collect();
        Ok(Self { positions, cases })
    }

    /// Computes the silence and previous-packet baselines.
    pub fn baselines<T: Real>(
        &self,
        config: &config::Evaluation,
        samples: &[T],
    ) -> (BaselineReport, BaselineReport) {
        let test_size = config.test_size;
        let silence = vec![T::zero(); test_size];
        let mut b0 = BaselineReport::default();
        let mut b1 = BaselineReport::default();
        for &pos in &self.positions {
            let test_set = &samples[pos..pos + test_size];
            b0.push(test_set, &silence);
            b1.push(test_set, &samples[pos - test_size..pos]);
        }
        (b0, b1)
    }

    /// Gathers the results into a report.
    pub fn into_report<T: Real>(
        self,
        config: &config::Evaluation,
        baselines: (BaselineReport, BaselineReport),
        cases: Vec<CaseReport>,
    ) -> ChannelReport {
        ChannelReport {
            engine: config.engine,
            sample_type: T::NAME.to_owned(),
            positions: self.positions,
            b0: baselines.0,
            b1: baselines.1,
            cases,
        }
    }
}

fn elapsed_ns(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

/// Evaluates a `(train_size, order)` pair at every position.
pub(crate) fn evaluate_case<T: Real>(
    config: &config::Evaluation,
    samples: &[T],
    positions: &[usize],
    train_size: usize,
    order: usize,
) -> Result<CaseReport, EvalError> {
    let test_size = config.test_size;
    let engine_config = config.engine_config(train_size);
    let mut report = CaseReport {
        train_size,
        order,
        total_count: positions.len(),
        ..CaseReport::default()
    };
    for &pos in positions {
        let train_set = &samples[pos - train_size..pos];
        let test_set = &samples[pos..pos + test_size];
        let mut engine: AnyEngine<T> = AnyEngine::from_config(&engine_config)?;

        let start = Instant::now();
        let fit = engine.fit(train_set, order)?;
        report.fit_time_ns.push(elapsed_ns(start.elapsed()));

        let start = Instant::now();
        let predictions = engine.predict(train_set, fit.coefs(), test_size)?;
        report.predict_time_ns.push(elapsed_ns(start.elapsed()));

        if !fit.is_stable() {
            report.unstable_count += 1;
        }
        report.mae.push(mae(test_set, &predictions).into_f64());
        report.rmse.push(rmse(test_set, &predictions).into_f64());
    }
    Ok(report)
}

/// Evaluates a channel sequentially.
///
/// # Errors
///
/// Same as [`evaluate_channel`].
pub fn evaluate_channel_st<T: Real>(
    config: &config::Evaluation,
    samples: &[T],
) -> Result<ChannelReport, EvalError> {
    let plan = Plan::new(config, samples.len())?;
    let baselines = plan.baselines(config, samples);
    let cases = plan
        .cases
        .iter()
        .map(|&(train_size, order)| {
            evaluate_case(config, samples, &plan.positions, train_size, order)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(plan.into_report::<T>(config, baselines, cases))
}

/// Evaluates a channel.
///
/// Cases are evaluated in worker threads when `config.multithread` is set
/// and the "par" feature is enabled. Both paths yield the same report.
///
/// # Errors
///
/// Returns `EvalError::Config` when `config` is invalid or the channel is
/// too short for the requested positions, and `EvalError::Engine` when an
/// engine rejects its input.
pub fn evaluate_channel<T: Real>(
    config: &config::Evaluation,
    samples: &[T],
) -> Result<ChannelReport, EvalError> {
    #[cfg(feature = "par")]
    {
        if config.multithread {
            return super::par::evaluate_channel(config, samples);
        }
    }
    evaluate_channel_st(config, samples)
}

/// Evaluates channel `ch` of `src` with the precision set in `config`.
///
/// # Errors
///
/// Returns `EvalError::Source` when the channel does not exist, otherwise
/// same as [`evaluate_channel`].
pub fn evaluate_source(
    config: &config::Evaluation,
    src: &MemSource,
    ch: usize,
) -> Result<ChannelReport, EvalError> {
    let samples = src.channel(ch)?;
    match config.precision {
        Precision::F32 => {
            let samples: Vec<f32> = samples.iter().map(|&x| f32::from_f64_lossy(x)).collect();
            evaluate_channel(config, &samples)
        }
        Precision::F64 => evaluate_channel(config, samples),
    }
}

/// Results of one `(train_size, order)` pair of the tone sweep.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct ToneCaseReport {
    pub train_size: usize,
    pub order: usize,
    /// Absolute error of each predicted sample.
    pub ae: Vec<f64>,
    pub prediction: Vec<f64>,
    /// Peak magnitude of `prediction`.
    pub max: f64,
    /// Whether the fit reported no instability.
    pub stable: bool,
}

/// Results of the tone sweep.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct ToneReport {
    pub engine: EngineKind,
    pub sample_type: String,
    pub frequency: f64,
    pub sample_rate: f64,
    /// Index of the first predicted sample.
    pub position: usize,
    /// One entry per `(train_size, order)` in configuration order.
    pub cases: Vec<ToneCaseReport>,
}

fn tone_cases<T: Real>(
    config: &config::Tone,
    samples: &[T],
) -> Result<Vec<ToneCaseReport>, EvalError> {
    let pos = config.position();
    let test_set = &samples[pos..pos + config.test_size];
    let mut cases = Vec::with_capacity(config.train_sizes.len() * config.orders.len());
    for &train_size in &config.train_sizes {
        let train_set = &samples[pos - train_size..pos];
        let mut engine: AnyEngine<T> = AnyEngine::from_config(&config.engine_config(train_size))?;
        for &order in &config.orders {
            let fit = engine.fit(train_set, order)?;
            let prediction = engine.predict(train_set, fit.coefs(), config.test_size)?;
            let max = prediction.iter().fold(T::zero(), |m, x| m.max(x.abs()));
            trace!(
                "tone: train_size={}, order={}, max={:e}",
                train_size,
                order,
                max
            );
            let errors = ae(test_set, &prediction);
            cases.push(ToneCaseReport {
                train_size,
                order,
                ae: errors.into_iter().map(T::into_f64).collect(),
                prediction: prediction.into_iter().map(T::into_f64).collect(),
                max: max.into_f64(),
                stable: fit.is_stable(),
            });
        }
    }
    Ok(cases)
}

/// Predicts a synthetic tone for every `(train_size, order)` pair.
///
/// The tone is generated with [`Sine`] at unit amplitude and zero phase.
/// Every pair is fitted on the samples right before [`config::Tone::position`]
/// and predicts the following `test_size` samples, so all cases share the
/// same reference signal.
///
/// # Errors
///
/// Returns `EvalError::Config` when `config` is invalid, and
/// `EvalError::Engine` when an engine rejects its input.
///
/// # Examples
///
/// ```
/// # use burgpred::config;
/// # use burgpred::eval::evaluate_tone;
/// let mut config = config::Tone::default();
/// config.train_sizes = vec![512];
/// config.orders = vec![16];
/// config.test_size = 64;
/// let report = evaluate_tone(&config).unwrap();
/// assert_eq!(report.position, 512);
/// assert!(report.cases[0].ae.iter().all(|&e| e < 1e-4));
/// ```
pub fn evaluate_tone(config: &config::Tone) -> Result<ToneReport, EvalError> {
    config.verify()?;
    let position = config.position();
    let signal = Sine::new(config.frequency, config.sample_rate, 1.0);
    let samples = signal.to_vec(position + config.test_size);
    debug!(
        "tone: frequency={}, sample_rate={}, position={}",
        config.frequency,
        config.sample_rate,
        position
    );
    let (sample_type, cases) = match config.precision {
        Precision::F32 => {
            let samples: Vec<f32> = samples.iter().map(|&x| f32::from_f64_lossy(x)).collect();
            (f32::NAME, tone_cases(config, &samples)?)
        }
        Precision::F64 => (f64::NAME, tone_cases(config, &samples)?),
    };
    Ok(ToneReport {
        engine: config.engine,
        sample_type: sample_type.to_owned(),
        frequency: config.frequency,
        sample_rate: config.sample_rate,
        position,
        cases,
    })
}

#[cfg(test)]
#[allow(clippy::field_reassign_with_default)]
mod tests {
    use super::*;
    use crate::assert_close;
    use crate::error::SourceErrorReason;
    use crate::test_helper;

    use rstest::rstest;

    fn small_config() -> config::Evaluation {
        let mut config = config::Evaluation::default();
        config.train_sizes = vec![64, 128];
        config.orders = vec![1, 2, 8];
        config.test_size = 16;
        config.positions = 6;
        config.multithread = false;
        config
    }

    #[test]
    fn error_metrics() {
        let expected = [1.0, 2.0, 3.0, 4.0];
        let actual = [1.0, 0.0, 3.0, 8.0];
        assert_close!(mae(&expected, &actual), 1.5);
        assert_close!(mse(&expected, &actual), 5.0);
        assert_close!(rmse(&expected, &actual), 5.0f64.sqrt());
        assert_eq!(mae::<f64>(&[], &[]), 0.0);
        assert_eq!(rmse::<f32>(&[1.0], &[]), 0.0);
    }

    #[rstest]
    fn positions_are_aligned_distinct_and_sorted(
        #[values(1, 7, 128)] multiple_of: usize,
        #[values(1, 2, 3)] seed: u64,
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let positions =
            sample_positions(&mut rng, 1000, 20000, 50, multiple_of).expect("Sampling failed");
        assert_eq!(positions.len(), 50);
        for w in positions.windows(2) {
            assert!(w[0] < w[1]);
        }
        for &p in &positions {
            assert_eq!(p % multiple_of, 0);
            assert!((1000..20000).contains(&p));
        }
    }

    #[test]
    fn positions_fill_every_slot_when_requested() {
        let mut rng = StdRng::seed_from_u64(1);
        let positions = sample_positions(&mut rng, 10, 50, 4, 10).expect("Sampling failed");
        assert_eq!(positions, vec![10, 20, 30, 40]);
    }

    #[test]
    fn positions_are_reproducible() {
        let a = sample_positions(&mut StdRng::seed_from_u64(5), 0, 4096, 10, 16).unwrap();
        let b = sample_positions(&mut StdRng::seed_from_u64(5), 0, 4096, 10, 16).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn impossible_position_requests_fail() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(sample_positions(&mut rng, 10, 50, 5, 10).is_err());
        assert!(sample_positions(&mut rng, 50, 50, 1, 1).is_err());
        assert!(sample_positions(&mut rng, 60, 50, 1, 1).is_err());
        assert!(sample_positions(&mut rng, 0, 50, 1, 0).is_err());
        // aligning shrinks [15, 29) to [20, 20).
        assert!(sample_positions(&mut rng, 15, 29, 1, 10).is_err());
    }

    #[test]
    fn channel_report_shape() {
        let config = small_config();
        let samples = test_helper::noisy_sinusoid(2048, 29.3, 0.1, 7);
        let report = evaluate_channel_st(&config, &samples).expect("Evaluation failed");

        assert_eq!(report.positions.len(), 6);
        assert_eq!(report.sample_type, "double");
        for &p in &report.positions {
            assert!(p >= 128);
            assert!(p + 16 <= 2048);
            assert_eq!(p % 16, 0);
        }
        assert_eq!(report.b0.mae.len(), 6);
        assert_eq!(report.b1.rmse.len(), 6);
        assert_eq!(report.cases.len(), 6);
        let pairs: Vec<_> = report
            .cases
            .iter()
            .map(|c| (c.train_size, c.order))
            .collect();
        assert_eq!(
            pairs,
            vec![(64, 1), (64, 2), (64, 8), (128, 1), (128, 2), (128, 8)]
        );
        for case in &report.cases {
            assert_eq!(case.total_count, 6);
            assert_eq!(case.mae.len(), 6);
            assert_eq!(case.rmse.len(), 6);
            assert_eq!(case.fit_time_ns.len(), 6);
            assert_eq!(case.predict_time_ns.len(), 6);
            for (&m, &r) in case.mae.iter().zip(&case.rmse) {
                assert!(m.is_finite());
                assert!(m <= r + 1e-12);
            }
        }
    }

    #[test]
    fn prediction_beats_silence_on_tone() {
        let mut config = small_config();
        config.orders = vec![4];
        config.train_sizes = vec![256];
        let samples = test_helper::sinusoid(4096, 441.0, 44100.0, 0);
        let report = evaluate_channel_st(&config, &samples).expect("Evaluation failed");
        let case = &report.cases[0];
        for (ar, b0) in case.mae.iter().zip(&report.b0.mae) {
            assert!(ar < b0, "ar={ar:e}, b0={b0:e}");
        }
    }

    #[test]
    fn baselines_match_definition() {
        let mut config = small_config();
        config.train_sizes = vec![4];
        config.orders = vec![1];
        config.test_size = 2;
        config.positions = 1;
        // Only position 4 is available.
        let samples = [0.0, 0.0, 1.0, -1.0, 2.0, -2.0, 0.0, 0.0];
        let report = evaluate_channel_st(&config, &samples).expect("Evaluation failed");
        assert_eq!(report.positions, vec![4]);
        assert_close!(report.b0.mae[0], 2.0);
        assert_close!(report.b0.rmse[0], 2.0);
        assert_close!(report.b1.mae[0], 1.0);
        assert_close!(report.b1.rmse[0], 1.0);
    }

    #[test]
    fn short_channel_is_config_error() {
        let config = small_config();
        let err = evaluate_channel_st(&config, &[0.0f64; 10]).unwrap_err();
        assert!(matches!(err, EvalError::Config(_)));
        let err = evaluate_channel_st(&config, &[0.0f64; 200]).unwrap_err();
        assert!(matches!(err, EvalError::Config(_)));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = small_config();
        config.orders.clear();
        let err = evaluate_channel_st(&config, &[0.0f64; 4096]).unwrap_err();
        match err {
            EvalError::Config(e) => assert_eq!(e.path(), "orders"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn source_precision_dispatch() {
        let mut config = small_config();
        config.orders = vec![2];
        config.train_sizes = vec![64];
        let samples = test_helper::noisy_sinusoid(1024, 17.0, 0.2, 3);
        let src = MemSource::from_channels(vec![samples], 16000).expect("Construction failed");

        config.precision = Precision::F32;
        let single = evaluate_source(&config, &src, 0).expect("Evaluation failed");
        assert_eq!(single.sample_type, "float");
        config.precision = Precision::F64;
        let double = evaluate_source(&config, &src, 0).expect("Evaluation failed");
        assert_eq!(double.sample_type, "double");
        assert_eq!(single.positions, double.positions);
        for (s, d) in single.cases[0].mae.iter().zip(&double.cases[0].mae) {
            assert_close!(*s, *d, rtol = 1e-2, atol = 1e-4);
        }

        let err = evaluate_source(&config, &src, 1).unwrap_err();
        match err {
            EvalError::Source(e) => {
                assert!(matches!(e.reason(), SourceErrorReason::InvalidChannel));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn absolute_errors() {
        let expected = [1.0, 2.0, 3.0, 4.0];
        let actual = [1.0, 0.0, 3.5, 8.0, 9.0];
        let errors = ae(&expected, &actual);
        assert_eq!(errors, vec![0.0, 2.0, 0.5, 4.0]);
        assert_close!(errors.iter().sum::<f64>() / 4.0, mae(&expected, &actual));
        assert!(ae::<f32>(&[], &[1.0]).is_empty());
    }

    fn small_tone_config() -> config::Tone {
        let mut config = config::Tone::default();
        config.train_sizes = vec![256, 512];
        config.orders = vec![1, 16];
        config.test_size = 128;
        config
    }

    #[test]
    fn tone_sweep_reports_every_pair() {
        let config = small_tone_config();
        let report = evaluate_tone(&config).expect("Evaluation failed");
        assert_eq!(report.engine, config.engine);
        assert_eq!(report.sample_type, "double");
        assert_eq!(report.position, 512);
        let pairs: Vec<(usize, usize)> = report
            .cases
            .iter()
            .map(|c| (c.train_size, c.order))
            .collect();
        assert_eq!(pairs, vec![(256, 1), (256, 16), (512, 1), (512, 16)]);

        let tone = Sine::new(2000.0, 44100.0, 1.0).to_vec(512 + 128);
        let reference = &tone[512..];
        for case in &report.cases {
            assert_eq!(case.ae.len(), 128);
            assert_eq!(case.prediction.len(), 128);
            for ((e, p), x) in case.ae.iter().zip(&case.prediction).zip(reference) {
                assert_eq!(*e, (p - x).abs());
            }
            let peak = case.prediction.iter().fold(0.0f64, |m, p| m.max(p.abs()));
            assert_eq!(case.max, peak);
        }

        let mean = |c: &ToneCaseReport| c.ae.iter().sum::<f64>() / c.ae.len() as f64;
        assert!(mean(&report.cases[3]) < 1e-4, "{}", mean(&report.cases[3]));
        assert!(mean(&report.cases[2]) > 0.1);
    }

    #[test]
    fn tone_sweep_is_deterministic() {
        let mut config = small_tone_config();
        config.precision = Precision::F32;
        let first = evaluate_tone(&config).expect("Evaluation failed");
        let second = evaluate_tone(&config).expect("Evaluation failed");
        assert_eq!(first, second);
        assert_eq!(first.sample_type, "float");
        for case in &first.cases {
            assert!(case.max.is_finite());
            assert!(case.ae.iter().all(|e| e.is_finite()));
        }
    }

    #[test]
    fn tone_sweep_rejects_invalid_config() {
        let mut config = small_tone_config();
        config.orders.push(0);
        let err = evaluate_tone(&config).unwrap_err();
        match err {
            EvalError::Config(e) => assert_eq!(e.path(), "orders[2]"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
