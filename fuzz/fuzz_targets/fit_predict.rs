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

#![no_main]

use arbitrary::Arbitrary;
use arbitrary::Unstructured;
use libfuzzer_sys::fuzz_target;

use burgpred::sigen;
use burgpred::sigen::Signal;
use burgpred::AnyEngine;
use burgpred::Engine;
use burgpred::EngineKind;

const MAX_WINDOW: usize = 4096;
const MAX_ORDER: usize = 160;
const MAX_PREDICTION: usize = 512;

fn unit(u: &mut Unstructured) -> Result<f64, arbitrary::Error> {
    Ok(f64::from(u32::arbitrary(u)?) / f64::from(u32::MAX))
}

fn arbitrary_signal(
    u: &mut Unstructured,
    len: usize,
    depth: usize,
) -> Result<Box<dyn Signal>, arbitrary::Error> {
    let do_clip = bool::arbitrary(u)?;
    let kinds = if depth == 0 { 2 } else { 4 };
    let unclipped: Box<dyn Signal> = match u.int_in_range(0..=kinds)? {
        0 => Box::new(sigen::Dc::new(2.0 * unit(u)? - 1.0)),
        1 => Box::new(sigen::Noise::with_seed(u64::arbitrary(u)?, unit(u)?)),
        2 => {
            let amplitude = unit(u)?;
            let phase = unit(u)? * 2.0 * std::f64::consts::PI;
            // frequency relative to the sample rate, up to Nyquist.
            let freq = unit(u)? * 0.5;
            Box::new(sigen::Sine::with_initial_phase(freq, 1.0, amplitude, phase))
        }
        3 => {
            let mix_fraction = unit(u)?;
            let signal1 = arbitrary_signal(u, len, depth - 1)?;
            let signal2 = arbitrary_signal(u, len, depth - 1)?;
            Box::new(sigen::Mix::new(mix_fraction, signal1, 1.0 - mix_fraction, signal2))
        }
        4 => {
            let time = (len as f64 * unit(u)?) as usize;
            let signal1 = arbitrary_signal(u, time, depth - 1)?;
            let signal2 = arbitrary_signal(u, len - time, depth - 1)?;
            Box::new(sigen::Switch::new(signal1, time, signal2))
        }
        _ => {
            unreachable!();
        }
    };
    if do_clip {
        Ok(Box::new(unclipped.clip()))
    } else {
        Ok(unclipped)
    }
}

#[derive(Debug)]
struct Input {
    kind: EngineKind,
    max_size: usize,
    order: usize,
    predict_len: usize,
    single_precision: bool,
    samples: Vec<f64>,
}

impl<'a> Arbitrary<'a> for Input {
    fn arbitrary(u: &mut Unstructured<'a>) -> Result<Self, arbitrary::Error> {
        let kind = match u.int_in_range(0..=2usize)? {
            0 => EngineKind::Basic,
            1 => EngineKind::Compensated,
            _ => EngineKind::OptimizedDenominator,
        };
        let len = u.int_in_range(1..=MAX_WINDOW)?;
        let max_size = u.int_in_range(1..=MAX_WINDOW)?;
        let order = u.int_in_range(1..=MAX_ORDER)?;
        let predict_len = u.int_in_range(0..=MAX_PREDICTION)?;
        let single_precision = bool::arbitrary(u)?;
        let samples = arbitrary_signal(u, len, 2)?.to_vec(len);
        Ok(Self {
            kind,
            max_size,
            order,
            predict_len,
            single_precision,
            samples,
        })
    }
}

fn check<T: burgpred::Real>(input: &Input, samples: &[T]) {
    let mut engine: AnyEngine<T> = AnyEngine::new(input.kind, input.max_size);
    let fit = engine.fit(samples, input.order).unwrap();
    let expected_order = input.order.min(input.max_size - 1);
    assert_eq!(fit.coefs().len(), expected_order + 1);
    assert_eq!(fit.coefs()[0], T::one());
    if fit.is_stable() {
        assert!(fit.coefs().iter().all(|c| c.is_finite()), "{fit:?}");
        assert!(fit.error() >= T::zero(), "{fit:?}");
    }

    if samples.len() >= fit.order() {
        let predicted = engine
            .predict(samples, fit.coefs(), input.predict_len)
            .unwrap();
        assert_eq!(predicted.len(), input.predict_len);
    } else {
        assert!(engine
            .predict(samples, fit.coefs(), input.predict_len)
            .is_err());
    }
}

fuzz_target!(|input: Input| {
    if input.single_precision {
        let samples: Vec<f32> = input.samples.iter().map(|&x| x as f32).collect();
        check(&input, &samples);
    } else {
        check(&input, &input.samples);
    }
});
