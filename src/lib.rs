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

#![doc = include_str!("../README.md")]
// Note that clippy attributes should be in sync with those declared in
// "burgpred-bin/src/main.rs"
#![warn(clippy::all, clippy::nursery, clippy::pedantic, clippy::cargo)]
// Some of clippy::pedantic rules are actually useful, so use it with a lot of
// ad-hoc exceptions.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::missing_const_for_fn,
    clippy::multiple_crate_versions,
    clippy::must_use_candidate,
    clippy::wildcard_dependencies
)]
// Some from restriction lint-group
#![warn(
    clippy::clone_on_ref_ptr,
    clippy::create_dir,
    clippy::dbg_macro,
    clippy::empty_structs_with_brackets,
    clippy::exit,
    clippy::if_then_some_else_none,
    clippy::impl_trait_in_params,
    clippy::let_underscore_must_use,
    clippy::lossy_float_literal,
    clippy::multiple_inherent_impl,
    clippy::print_stdout,
    clippy::rc_buffer,
    clippy::rc_mutex,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::separated_literal_suffix,
    clippy::str_to_string,
    clippy::string_add,
    clippy::string_to_string,
    clippy::try_err,
    clippy::unnecessary_self_imports,
    clippy::wildcard_enum_match_arm
)]

#[cfg(feature = "log")]
#[macro_use]
extern crate log;

// Stand-ins for the `log` macros when the feature is disabled.
#[cfg(not(feature = "log"))]
#[macro_use]
mod nolog {
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }
    macro_rules! info {
        ($($arg:tt)*) => {};
    }
    macro_rules! warn {
        ($($arg:tt)*) => {};
    }
}

pub mod burg;
pub mod compensated;
pub mod config;
pub mod constant;
pub mod error;
pub mod eval;
#[cfg(feature = "par")]
pub mod par;
pub mod real;
pub mod sigen;
pub mod source;

#[cfg(test)]
pub(crate) mod test_helper;

#[cfg(feature = "mimalloc")]
use mimalloc::MiMalloc;
#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

// import global entry points
pub use burg::AnyEngine;
pub use burg::BasicBurg;
pub use burg::CompensatedBurg;
pub use burg::Engine;
pub use burg::EngineKind;
pub use burg::Fit;
pub use burg::OptimizedDenBurg;
pub use eval::evaluate_channel;
pub use real::Real;

#[cfg(all(test, feature = "serde"))]
mod test {
    // end-to-end, but transparent test.
    use super::*;
    use crate::sigen::Signal;
    use crate::source::MemSource;
    use rstest::rstest;

    const EVAL_CONFIGS: [&str; 4] = [
        r#"
engine = "basic"
        "#,
        r#"
engine = "compensated"
precision = "f32"
        "#,
        r"
min_switching_point = 2
        ",
        r"
multithread = false
        ",
    ];

    #[rstest]
    fn e2e_with_generated_signals(
        #[values(EVAL_CONFIGS[0], EVAL_CONFIGS[1], EVAL_CONFIGS[2], EVAL_CONFIGS[3])] config: &str,
    ) {
        let common = r"
train_sizes = [256, 512]
orders = [2, 8, 32]
test_size = 64
positions = 8
";
        let config = format!("{common}{config}");
        let config: config::Evaluation = toml::from_str(&config).expect("config parsing error");

        let signal = sigen::Sine::new(441.0, 16000.0, 0.4)
            .mix(sigen::Sine::with_initial_phase(1234.5, 16000.0, 0.2, 0.3))
            .noise_with_seed(42, 0.01)
            .clip();
        let pcm = signal.to_pcm(16, 8000);
        let src = MemSource::from_interleaved_ints(&pcm, 1, 16, 16000).expect("source error");

        let report = eval::evaluate_source(&config, &src, 0).expect("evaluation error");
        assert_eq!(report.engine, config.engine);
        assert_eq!(report.positions.len(), 8);
        assert_eq!(report.cases.len(), 6);

        let b0 = report.b0.mae.iter().sum::<f64>();
        for case in &report.cases {
            assert!(case.mae.iter().all(|x| x.is_finite()));
            if case.order >= 8 {
                // Two tones are captured by an order-4 model, so the
                // prediction is far better than silence.
                assert!(case.mae.iter().sum::<f64>() < 0.5 * b0);
            }
        }
    }
}
