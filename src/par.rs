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

//! Parallel evaluation. Only compiled when "par" feature is enabled.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread;

use super::config;
use super::constant::envvar_key;
use super::constant::panic_msg;
use super::error::EvalError;
use super::error::SourceError;
use super::eval;
use super::eval::CaseReport;
use super::eval::ChannelReport;
use super::eval::Plan;
use super::real::Real;

/// `Arc::into_inner` with unwrapping.
///
/// This function is introduced for conditional compilation for lowering MSRV.
/// The race condition described in the document of [`Arc::try_unwrap`] will
/// not happen in the current use cases since all the other owners are joined
/// before this is called.
#[rustversion::since(1.70)]
#[inline]
fn destruct_arc<T: std::fmt::Debug>(ptr: Arc<T>) -> T {
    Arc::into_inner(ptr).expect(panic_msg::ARC_DESTRUCT_FAILED)
}

#[rustversion::before(1.70)]
#[inline]
fn destruct_arc<T: std::fmt::Debug>(ptr: Arc<T>) -> T {
    Arc::try_unwrap(ptr).expect(panic_msg::ARC_DESTRUCT_FAILED)
}

/// Sink object that stores case results.
///
/// This is currently just a `BTreeMap<usize, T>` with some utility functions.
#[derive(Debug)]
struct ParSink<T> {
    data: Mutex<BTreeMap<usize, T>>,
}

impl<T> ParSink<T> {
    /// Creates `ParSink` object.
    pub fn new() -> Self {
        Self {
            data: Mutex::new(BTreeMap::new()),
        }
    }

    /// Stores a computation result `element` with a serial id `idx`.
    pub fn push(&self, idx: usize, element: T) {
        let mut data = self.data.lock().expect(panic_msg::MUTEX_LOCK_FAILED);
        data.insert(idx, element);
    }

    /// Returns the number of stored elements.
    pub fn len(&self) -> usize {
        self.data.lock().expect(panic_msg::MUTEX_LOCK_FAILED).len()
    }

    /// Consumes `self` and calls `f` in the order of the serial id.
    pub fn finalize<F>(self, f: F)
    where
        F: FnMut(T),
    {
        let data = self.data.into_inner().expect(panic_msg::MUTEX_DROP_FAILED);
        data.into_values().for_each(f);
    }
}

/// Determines worker counts considering various cues.
fn determine_worker_count(config: &config::Evaluation) -> Result<usize, SourceError> {
    let default_parallelism = std::thread::available_parallelism()
        .map_err(SourceError::from_io_error)?
        .get();
    let default_parallelism = std::env::var(envvar_key::DEFAULT_PARALLELISM)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(default_parallelism);
    Ok(config
        .workers
        .map_or(default_parallelism, NonZeroUsize::get))
}

/// Parallel version of [`eval::evaluate_channel`].
///
/// This function is internally called by `eval::evaluate_channel` when
/// `config.multithread == true`. However, one can explicitly call this
/// function regardless of the flag. Each `(train_size, order)` pair is a
/// task; the report lists them in configuration order, so the result is
/// identical to the sequential one except for the timings.
///
/// # Errors
///
/// Same as [`eval::evaluate_channel`]. When several cases fail, the error of
/// the earliest case is returned.
///
/// # Panics
///
/// This function panics when an internal error regarding inter-thread
/// communication occurs.
pub fn evaluate_channel<T: Real>(
    config: &config::Evaluation,
    samples: &[T],
) -> Result<ChannelReport, EvalError> {
    let plan = Plan::new(config, samples.len())?;
    let baselines = plan.baselines(config, samples);
    let worker_count = determine_worker_count(config)?.min(plan.cases.len()).max(1);

    let config = Arc::new(config.clone());
    let samples: Arc<[T]> = Arc::from(samples);
    let positions: Arc<[usize]> = Arc::from(plan.positions.as_slice());
    let cases: Arc<[(usize, usize)]> = Arc::from(plan.cases.as_slice());
    let parsink: Arc<ParSink<Result<CaseReport, EvalError>>> = Arc::new(ParSink::new());
    let (sender, receiver) = crossbeam_channel::bounded::<Option<usize>>(worker_count + 1);

    let join_handles: Vec<_> = (0..worker_count)
        .map(|_n| {
            let receiver = receiver.clone();
            let config = Arc::clone(&config);
            let samples = Arc::clone(&samples);
            let positions = Arc::clone(&positions);
            let cases = Arc::clone(&cases);
            let parsink = Arc::clone(&parsink);
            thread::spawn(move || {
                while let Some(idx) = receiver.recv().expect(panic_msg::MPMC_RECV_FAILED) {
                    let (train_size, order) = cases[idx];
                    let result =
                        eval::evaluate_case(&config, &samples, &positions, train_size, order);
                    parsink.push(idx, result);
                }
            })
        })
        .collect();

    let mut worker_starvation_count = 0usize;
    for idx in 0..cases.len() {
        if sender.is_empty() {
            worker_starvation_count += 1;
        }
        sender.send(Some(idx)).expect(panic_msg::MPMC_SEND_FAILED);
    }
    for _i in 0..worker_count {
        sender.send(None).expect(panic_msg::MPMC_SEND_FAILED);
    }

    for h in join_handles {
        h.join().expect(panic_msg::THREAD_JOIN_FAILED);
    }

    info!(
        target: "burgpred::par::jsonl",
        "{{ worker_count: {}, case_count: {}, position_count: {}, worker_starvation_count: {} }}",
        worker_count,
        cases.len(),
        positions.len(),
        worker_starvation_count,
    );

    let parsink = destruct_arc(parsink);
    assert_eq!(
        parsink.len(),
        cases.len(),
        "{}",
        panic_msg::DATA_INCONSISTENT
    );
    let mut results = Vec::with_capacity(cases.len());
    parsink.finalize(|r| results.push(r));
    let case_reports = results.into_iter().collect::<Result<Vec<_>, _>>()?;
    Ok(plan.into_report::<T>(&config, baselines, case_reports))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helper;

    #[test]
    #[allow(clippy::field_reassign_with_default)]
    fn test_determine_worker_count() {
        // manually set by config
        let mut config = config::Evaluation::default();
        config.workers = NonZeroUsize::new(8);
        let result = determine_worker_count(&config);
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), 8);

        // default
        if std::env::var(envvar_key::DEFAULT_PARALLELISM).is_err() {
            let config = config::Evaluation::default();
            let result = determine_worker_count(&config);
            assert!(result.is_ok());
            assert_eq!(
                result.unwrap(),
                std::thread::available_parallelism().unwrap().get()
            );
        }
    }

    #[test]
    fn par_sink_finalization() {
        const REFERENCE: [&str; 5] = ["ParSink", "sorts", "randomly", "ordered", "elems"];
        let sink = Arc::new(ParSink::new());
        let handles = (0..REFERENCE.len()).map(|t| {
            let sink = Arc::clone(&sink);
            thread::spawn(move || sink.push(t, REFERENCE[t]))
        });
        for h in handles {
            h.join().expect(panic_msg::THREAD_JOIN_FAILED);
        }
        let mut result = vec![];
        destruct_arc(sink).finalize(|v| result.push(v));
        assert_eq!(result, REFERENCE);
    }

    #[test]
    #[allow(clippy::field_reassign_with_default)]
    fn parallel_matches_sequential() {
        let mut config = config::Evaluation::default();
        config.train_sizes = vec![64, 256];
        config.orders = vec![1, 3, 16, 40];
        config.test_size = 32;
        config.positions = 5;
        config.workers = NonZeroUsize::new(3);
        let samples = test_helper::noisy_sinusoid(4096, 51.7, 0.2, 11);

        let par = evaluate_channel(&config, &samples).expect("Evaluation failed");
        let st = eval::evaluate_channel_st(&config, &samples).expect("Evaluation failed");

        assert_eq!(par.positions, st.positions);
        assert_eq!(par.b0, st.b0);
        assert_eq!(par.b1, st.b1);
        assert_eq!(par.cases.len(), st.cases.len());
        for (p, s) in par.cases.iter().zip(&st.cases) {
            assert_eq!((p.train_size, p.order), (s.train_size, s.order));
            assert_eq!(p.mae, s.mae);
            assert_eq!(p.rmse, s.rmse);
            assert_eq!(p.unstable_count, s.unstable_count);
        }
    }

    #[test]
    #[allow(clippy::field_reassign_with_default)]
    fn short_channel_is_rejected_before_spawning() {
        let mut config = config::Evaluation::default();
        config.train_sizes = vec![16];
        config.orders = vec![2];
        config.test_size = 4;
        config.positions = 2;
        config.workers = NonZeroUsize::new(2);
        let err = evaluate_channel(&config, &[0.0f64; 8]).unwrap_err();
        assert!(matches!(err, EvalError::Config(_)));
    }
}
