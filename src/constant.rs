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

//! Configuration constants

// Constants sorted in an alphabetical-order.  Top-level constants first, and
// then sub-modules. Constants that are used only in a specific sub-module or
// its caller should be placed in the corresponding submodule.

/// Default lower bound of the switching point of the optimized-denominator
/// engine. Orders up to this value always use the exact denominator.
pub const DEFAULT_MIN_SWITCHING_POINT: usize = 8;

/// Default capacity of an engine built from [`config::Engine`].
///
/// [`config::Engine`]: crate::config::Engine
pub const DEFAULT_MAX_SIZE: usize = 8192;

/// Sub-module containing constants related to build-time information.
pub mod build_info {
    #[allow(dead_code, clippy::doc_markdown, clippy::needless_raw_string_hashes)]
    mod built {
        include!(concat!(env!("OUT_DIR"), "/built.rs"));
    }

    pub use built::FEATURES_LOWERCASE_STR as FEATURES;
    pub use built::PKG_VERSION as CRATE_VERSION;
    pub use built::PROFILE as BUILD_PROFILE;
    pub use built::RUSTC_VERSION;
}

/// Constants related to keys for the environment variables.
pub(crate) mod envvar_key {
    /// Environment variable name for specifying the number of threads.
    #[cfg(feature = "par")]
    pub const DEFAULT_PARALLELISM: &str = "BURGPRED_WORKERS";
}

/// Default parameters of the evaluation protocol.
pub mod eval {
    /// Lengths of the training windows.
    pub const DEFAULT_TRAIN_SIZES: [usize; 5] = [512, 1024, 2048, 4096, 8192];

    /// Model orders evaluated for each training window.
    pub const DEFAULT_ORDERS: [usize; 8] = [1, 2, 4, 8, 16, 32, 64, 128];

    /// Number of predicted samples per position.
    pub const DEFAULT_TEST_SIZE: usize = 128;

    /// Number of evaluated positions per channel.
    pub const DEFAULT_POSITIONS: usize = 100;

    /// Seed of the position sampler.
    pub const DEFAULT_SEED: u64 = 1;
}

/// Default parameters of the synthetic tone sweep.
pub mod tone {
    /// Tone frequency in Hz.
    pub const DEFAULT_FREQUENCY: f64 = 2000.0;

    /// Sampling rate in Hz.
    pub const DEFAULT_SAMPLE_RATE: f64 = 44100.0;

    /// Number of predicted samples after the fixed position.
    pub const DEFAULT_TEST_SIZE: usize = 2560;
}

/// Module for internal error messages.
///
/// Use `panic!` and those messages only for env-related unrecoverable errors.
/// It's okay to use them in tests, but it's not okay to add another variable
/// only for test functions.
#[allow(dead_code)]
pub(crate) mod panic_msg {
    pub const ARC_DESTRUCT_FAILED: &str = "INTERNAL ERROR: Arc destruction failed.";
    pub const DATA_INCONSISTENT: &str = "INTERNAL ERROR: Internal variable inconsistency detected.";
    pub const MPMC_SEND_FAILED: &str =
        "INTERNAL ERROR: Critical error occured in multi-thread communication channel.";
    pub const MPMC_RECV_FAILED: &str =
        "INTERNAL ERROR: Critical error occured in multi-thread communication channel.";
    pub const MUTEX_LOCK_FAILED: &str = "INTERNAL ERROR: Couldn't get lock for mutex.";
    pub const MUTEX_DROP_FAILED: &str = "INTERNAL ERROR: Couldn't discard mutex.";
    pub const THREAD_JOIN_FAILED: &str = "INTERNAL ERROR: Failed to wait thread termination.";
    pub const UNSUPPORTED_BITS_PER_SAMPLE: &str = "`bits_per_sample` must be in 2..=32.";
    pub const ZERO_MAX_SIZE: &str = "Engine capacity `max_size` must be positive.";
}
