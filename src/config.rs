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

//! Engine and evaluation configuration structs.

use std::num::NonZeroUsize;

#[cfg(feature = "serde")]
use serde::Deserialize;
#[cfg(feature = "serde")]
use serde::Serialize;

use super::burg::EngineKind;
use super::constant::eval as eval_const;
use super::constant::tone as tone_const;
use super::constant::DEFAULT_MAX_SIZE;
use super::constant::DEFAULT_MIN_SWITCHING_POINT;
use super::error::verify_range;
use super::error::verify_true;
use super::error::Verify;
use super::error::VerifyError;

/// Configuration for a single engine.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[non_exhaustive]
pub struct Engine {
    /// Algorithm to use.
    pub kind: EngineKind,
    /// Capacity of the sample window.
    pub max_size: usize,
    /// Lower bound of the switching point. Only used by
    /// [`EngineKind::OptimizedDenominator`].
    pub min_switching_point: usize,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            kind: EngineKind::default(),
            max_size: DEFAULT_MAX_SIZE,
            min_switching_point: DEFAULT_MIN_SWITCHING_POINT,
        }
    }
}

impl Verify for Engine {
    fn verify(&self) -> Result<(), VerifyError> {
        verify_range!("max_size", self.max_size, 1..)?;
        Ok(())
    }
}

/// Floating-point precision used by the engines during evaluation.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[non_exhaustive]
pub enum Precision {
    /// `f32`.
    F32,
    /// `f64`.
    #[default]
    F64,
}

/// Configuration for the prediction benchmark.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[non_exhaustive]
pub struct Evaluation {
    /// Algorithm to evaluate.
    pub engine: EngineKind,
    /// Lower bound of the switching point for the optimized engine.
    pub min_switching_point: usize,
    /// Precision of the engines.
    pub precision: Precision,
    /// Training window lengths. Each one also sets the engine capacity.
    pub train_sizes: Vec<usize>,
    /// Model orders.
    pub orders: Vec<usize>,
    /// Number of samples predicted at each position.
    pub test_size: usize,
    /// Number of evaluated positions per channel.
    pub positions: usize,
    /// Seed for the position sampler.
    pub seed: u64,
    /// If set, cases are evaluated in worker threads (feature "par").
    pub multithread: bool,
    /// Number of worker threads. When unset, the `BURGPRED_WORKERS`
    /// environment variable or the available parallelism is used.
    pub workers: Option<NonZeroUsize>,
}

impl Default for Evaluation {
    fn default() -> Self {
        Self {
            engine: EngineKind::default(),
            min_switching_point: DEFAULT_MIN_SWITCHING_POINT,
            precision: Precision::default(),
            train_sizes: eval_const::DEFAULT_TRAIN_SIZES.to_vec(),
            orders: eval_const::DEFAULT_ORDERS.to_vec(),
            test_size: eval_const::DEFAULT_TEST_SIZE,
            positions: eval_const::DEFAULT_POSITIONS,
            seed: eval_const::DEFAULT_SEED,
            multithread: cfg!(feature = "par"),
            workers: None,
        }
    }
}

impl Evaluation {
    /// Returns the engine config for a training window of `train_size`.
    pub fn engine_config(&self, train_size: usize) -> Engine {
        Engine {
            kind: self.engine,
            max_size: train_size,
            min_switching_point: self.min_switching_point,
        }
    }

    /// Returns the longest training window.
    pub fn max_train_size(&self) -> usize {
        self.train_sizes.iter().copied().max().unwrap_or(0)
    }
}

impl Verify for Evaluation {
    fn verify(&self) -> Result<(), VerifyError> {
        verify_true!(
            "train_sizes",
            !self.train_sizes.is_empty(),
            "must not be empty"
        )?;
        for (i, &size) in self.train_sizes.iter().enumerate() {
            verify_true!("train_sizes[{i}]", size >= 2, "must be at least 2")?;
        }
        verify_true!("orders", !self.orders.is_empty(), "must not be empty")?;
        for (i, &order) in self.orders.iter().enumerate() {
            verify_true!("orders[{i}]", order >= 1, "must be positive")?;
        }
        verify_range!("test_size", self.test_size, 1..)?;
        verify_range!("positions", self.positions, 1..)?;
        Ok(())
    }
}

/// Configuration for the synthetic tone sweep.
///
/// A unit-amplitude sine of `frequency` sampled at `sample_rate` is
/// predicted from one fixed position, the longest training window, for
/// every `(train_size, order)` pair.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[non_exhaustive]
pub struct Tone {
    /// Algorithm to evaluate.
    pub engine: EngineKind,
    /// Lower bound of the switching point for the optimized engine.
    pub min_switching_point: usize,
    /// Precision of the engines.
    pub precision: Precision,
    /// Tone frequency in Hz.
    pub frequency: f64,
    /// Sampling rate in Hz.
    pub sample_rate: f64,
    /// Training window lengths.
    pub train_sizes: Vec<usize>,
    /// Model orders.
    pub orders: Vec<usize>,
    /// Number of samples predicted after the position.
    pub test_size: usize,
}

impl Default for Tone {
    fn default() -> Self {
        Self {
            engine: EngineKind::default(),
            min_switching_point: DEFAULT_MIN_SWITCHING_POINT,
            precision: Precision::default(),
            frequency: tone_const::DEFAULT_FREQUENCY,
            sample_rate: tone_const::DEFAULT_SAMPLE_RATE,
            train_sizes: eval_const::DEFAULT_TRAIN_SIZES.to_vec(),
            orders: eval_const::DEFAULT_ORDERS.to_vec(),
            test_size: tone_const::DEFAULT_TEST_SIZE,
        }
    }
}

impl Tone {
    /// Returns the engine config for a training window of `train_size`.
    pub fn engine_config(&self, train_size: usize) -> Engine {
        Engine {
            kind: self.engine,
            max_size: train_size,
            min_switching_point: self.min_switching_point,
        }
    }

    /// Returns the prediction start, i.e. the longest training window.
    pub fn position(&self) -> usize {
        self.train_sizes.iter().copied().max().unwrap_or(0)
    }
}

impl Verify for Tone {
    fn verify(&self) -> Result<(), VerifyError> {
        verify_true!(
            "sample_rate",
            self.sample_rate.is_finite() && self.sample_rate > 0.0,
            "must be positive"
        )?;
        verify_true!(
            "frequency",
            self.frequency.is_finite() && self.frequency >= 0.0,
            "must be non-negative"
        )?;
        verify_true!(
            "train_sizes",
            !self.train_sizes.is_empty(),
            "must not be empty"
        )?;
        for (i, &size) in self.train_sizes.iter().enumerate() {
            verify_true!("train_sizes[{i}]", size >= 2, "must be at least 2")?;
        }
        verify_true!("orders", !self.orders.is_empty(), "must not be empty")?;
        for (i, &order) in self.orders.iter().enumerate() {
            verify_true!("orders[{i}]", order >= 1, "must be positive")?;
        }
        verify_range!("test_size", self.test_size, 1..)?;
        Ok(())
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn serialization() {
        let config = Evaluation::default();
        assert!(toml::to_string(&config).is_ok());
        let config = Engine::default();
        assert!(toml::to_string(&config).is_ok());
        let config = Tone::default();
        assert!(toml::to_string(&config).is_ok());
    }

    #[test]
    fn tone_defaults_and_overrides() {
        let config: Tone = toml::from_str("").expect("Parse error.");
        assert_eq!(config, Tone::default());
        assert_eq!(config.frequency, 2000.0);
        assert_eq!(config.sample_rate, 44100.0);
        assert_eq!(config.test_size, 2560);
        assert_eq!(config.position(), 8192);

        let src = r#"
engine = "optimized-denominator"
frequency = 440.0
train_sizes = [64, 256, 128]
"#;
        let config: Tone = toml::from_str(src).expect("Parse error.");
        assert_eq!(config.engine, EngineKind::OptimizedDenominator);
        assert_eq!(config.position(), 256);
        assert_eq!(config.engine_config(64).max_size, 64);
        assert!(config.verify().is_ok());
    }

    #[test]
    #[allow(clippy::field_reassign_with_default)]
    fn tone_verification_reports_path() {
        let mut config = Tone::default();
        config.sample_rate = 0.0;
        assert_eq!(config.verify().unwrap_err().path(), "sample_rate");

        let mut config = Tone::default();
        config.frequency = f64::NAN;
        assert_eq!(config.verify().unwrap_err().path(), "frequency");

        let mut config = Tone::default();
        config.train_sizes = vec![512, 1];
        assert_eq!(config.verify().unwrap_err().path(), "train_sizes[1]");
    }

    #[test]
    fn deserialization() {
        let src = r#"
engine = "compensated"
precision = "f32"
orders = [3, 5]
workers = 2
"#;
        let config: Evaluation = toml::from_str(src).expect("Parse error.");
        assert_eq!(config.engine, EngineKind::Compensated);
        assert_eq!(config.precision, Precision::F32);
        assert_eq!(config.orders, vec![3, 5]);
        assert_eq!(config.workers, NonZeroUsize::new(2));

        // Check the rest is default.
        assert_eq!(config.train_sizes, eval_const::DEFAULT_TRAIN_SIZES.to_vec());
        assert_eq!(config.test_size, eval_const::DEFAULT_TEST_SIZE);
        assert_eq!(config.seed, 1);
        assert!(config.verify().is_ok());
    }

    #[test]
    fn engine_kind_names() {
        let src = r#"kind = "optimized-denominator""#;
        let config: Engine = toml::from_str(src).expect("Parse error.");
        assert_eq!(config.kind, EngineKind::OptimizedDenominator);
        let src = r#"kind = "basic""#;
        let config: Engine = toml::from_str(src).expect("Parse error.");
        assert_eq!(config.kind, EngineKind::Basic);
        assert_eq!(config.max_size, DEFAULT_MAX_SIZE);
    }

    #[test]
    fn if_empty_source_yields_default_config() {
        let empty_src = "";
        let config: Evaluation = toml::from_str(empty_src).expect("Parse error.");
        let default_config: Evaluation = Evaluation::default();
        eprintln!(
            "## Current default config\n\n{}",
            toml::to_string(&config).unwrap()
        );
        assert_eq!(config, default_config);
    }

    #[test]
    #[allow(clippy::field_reassign_with_default)]
    fn verification_reports_path() {
        let mut config = Evaluation::default();
        config.orders = vec![4, 0];
        let err = config.verify().unwrap_err();
        assert_eq!(err.path(), "orders[1]");

        let mut config = Evaluation::default();
        config.train_sizes.clear();
        assert_eq!(config.verify().unwrap_err().path(), "train_sizes");

        let mut config = Evaluation::default();
        config.test_size = 0;
        assert_eq!(config.verify().unwrap_err().path(), "test_size");
    }
}
