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

//! Signal generator module.
//!
//! The generators drive the synthetic tone sweep in [`eval`], and are also
//! used by the tests, the fuzz target, and the CLI tests.
//!
//! [`eval`]: crate::eval

use std::sync::Arc;

use rand::Rng;
use rand::SeedableRng;

/// Test signal generators.
pub trait Signal: std::fmt::Debug {
    /// Generates a signal from t=`sample_offset` and fills the buffer `dest`.
    fn fill_buffer(&self, sample_offset: usize, dest: &mut [f64]);

    /// Generates `len` samples from t=0.
    fn to_vec(&self, len: usize) -> Vec<f64> {
        let mut ret = vec![0.0; len];
        self.fill_buffer(0, &mut ret);
        ret
    }

    /// Generates `len` samples quantized to signed `bits_per_sample` PCM.
    ///
    /// Values are scaled by `2^(bits_per_sample - 1) - 1`, the inverse of
    /// [`int_to_real`], and saturate outside of `[-1, 1]`.
    ///
    /// [`int_to_real`]: crate::source::int_to_real
    fn to_pcm(&self, bits_per_sample: usize, len: usize) -> Vec<i32> {
        assert!((2..=32).contains(&bits_per_sample));
        let full_scale = ((1i64 << (bits_per_sample - 1)) - 1) as f64;
        self.to_vec(len)
            .into_iter()
            .map(|x| (x * full_scale).round().clamp(-full_scale, full_scale) as i32)
            .collect()
    }

    /// Decorate the signal generator with output clipping.
    fn clip(self) -> Clip<Self>
    where
        Self: Sized,
    {
        Clip::new(self)
    }

    /// Mixes noise
    fn noise_with_seed(self, seed0: u64, amplitude: f64) -> Mix<Self, Noise>
    where
        Self: Sized,
    {
        self.mix(Noise::with_seed(seed0, amplitude))
    }

    /// Mixes signal from the other generator
    fn mix<T: Signal + Sized>(self, other: T) -> Mix<Self, T>
    where
        Self: Sized,
    {
        Mix::new(1.0, self, 1.0, other)
    }

    /// Starts `other` from its own t=0 after `offset_time` samples.
    fn concat<T: Signal + Sized>(self, offset_time: usize, other: T) -> Switch<Self, T>
    where
        Self: Sized,
    {
        Switch::new(self, offset_time, other)
    }
}

macro_rules! impl_signal_for_pointers {
    ($pointertype:ident) => {
        impl<T: Signal + ?Sized> Signal for $pointertype<T> {
            fn fill_buffer(&self, sample_offset: usize, dest: &mut [f64]) {
                <$pointertype<T> as AsRef<T>>::as_ref(self).fill_buffer(sample_offset, dest);
            }
        }
    };
}

impl_signal_for_pointers!(Box);
impl_signal_for_pointers!(Arc);

/// Generator for constant signals.
#[derive(Clone, Debug)]
pub struct Dc {
    offset: f64,
}

impl Dc {
    /// Constructs new `Dc` signal.
    pub fn new(offset: f64) -> Self {
        Self { offset }
    }
}

impl Signal for Dc {
    fn fill_buffer(&self, _offset: usize, dest: &mut [f64]) {
        dest.fill(self.offset);
    }
}

/// Generator for a sinusoidal wave.
#[derive(Clone, Debug)]
pub struct Sine {
    /// Normalized angular frequency in radians per sample.
    omega: f64,
    amplitude: f64,
    initial_phase: f64,
}

impl Sine {
    /// Constructs a tone of `freq` Hz sampled at `sample_rate` Hz.
    pub fn new(freq: f64, sample_rate: f64, amplitude: f64) -> Self {
        Self::with_initial_phase(freq, sample_rate, amplitude, 0.0)
    }

    /// Constructs a tone starting at `initial_phase` radians.
    pub fn with_initial_phase(
        freq: f64,
        sample_rate: f64,
        amplitude: f64,
        initial_phase: f64,
    ) -> Self {
        Self {
            omega: 2.0 * std::f64::consts::PI * freq / sample_rate,
            amplitude,
            initial_phase,
        }
    }
}

impl Signal for Sine {
    fn fill_buffer(&self, offset: usize, dest: &mut [f64]) {
        for (t, p) in dest.iter_mut().enumerate() {
            let t = (t + offset) as f64;
            *p = self.amplitude * self.omega.mul_add(t, self.initial_phase).sin();
        }
    }
}

/// Generator for a uniform random white noise in `[-amplitude, amplitude)`.
#[derive(Clone, Debug)]
pub struct Noise {
    seed0: u64,
    amplitude: f64,
}

impl Noise {
    /// Constructs new noise generator with specifying a seed.
    pub fn with_seed(seed0: u64, amplitude: f64) -> Self {
        Self { seed0, amplitude }
    }
}

impl Signal for Noise {
    /// Fills buffer with the uniform random values.
    ///
    /// # Note
    ///
    /// Reproducible only for the same `(offset, dest.len())` request, e.g.
    /// `noise.fill_buffer(0, &mut dest[..])` generates different results from
    /// `noise.fill_buffer(0, &mut dest[0..10])` and
    /// `noise.fill_buffer(10, &mut dest[10..])`.
    fn fill_buffer(&self, offset: usize, dest: &mut [f64]) {
        let mut rng = rand::rngs::StdRng::seed_from_u64(self.seed0.wrapping_add(offset as u64));
        for p in dest {
            *p = self.amplitude * 2.0 * (rng.gen::<f64>() - 0.5);
        }
    }
}

/// Decorator that mixes outputs from the inner generators.
#[derive(Clone, Debug)]
pub struct Mix<T1: Signal + Sized, T2: Signal + Sized> {
    weight1: f64,
    weight2: f64,
    signal1: T1,
    signal2: T2,
}

impl<T1: Signal + Sized, T2: Signal + Sized> Mix<T1, T2> {
    /// Constructs new two-inputs mixer.
    pub fn new(weight1: f64, signal1: T1, weight2: f64, signal2: T2) -> Self {
        Self {
            weight1,
            weight2,
            signal1,
            signal2,
        }
    }
}

impl<T1: Signal + Sized, T2: Signal + Sized> Signal for Mix<T1, T2> {
    fn fill_buffer(&self, offset: usize, dest: &mut [f64]) {
        let mut buf = vec![0.0; dest.len()];
        self.signal1.fill_buffer(offset, dest);
        self.signal2.fill_buffer(offset, &mut buf);
        for (p, x) in dest.iter_mut().zip(&buf) {
            *p = self.weight1.mul_add(*p, self.weight2 * *x);
        }
    }
}

/// Decorator that clips the output of the inner generator to `[-1, 1]`.
#[derive(Clone, Debug)]
pub struct Clip<T: Signal + Sized> {
    inner: T,
}

impl<T: Signal + Sized> Clip<T> {
    /// Constructs a clipper.
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

impl<T: Signal + Sized> Signal for Clip<T> {
    fn fill_buffer(&self, offset: usize, dest: &mut [f64]) {
        self.inner.fill_buffer(offset, dest);
        for p in dest {
            *p = p.clamp(-1.0, 1.0);
        }
    }
}

/// Decorator that switches from `input1` to `input2` at a fixed time.
#[derive(Clone, Debug)]
pub struct Switch<T1: Signal + Sized, T2: Signal + Sized> {
    input1: T1,
    offset: usize,
    input2: T2,
}

impl<T1: Signal + Sized, T2: Signal + Sized> Switch<T1, T2> {
    /// Cosntructs a switcher.
    pub fn new(input1: T1, offset: usize, input2: T2) -> Self {
        Self {
            input1,
            offset,
            input2,
        }
    }
}

impl<T1: Signal + Sized, T2: Signal + Sized> Signal for Switch<T1, T2> {
    fn fill_buffer(&self, offset: usize, dest: &mut [f64]) {
        let split = self.offset.saturating_sub(offset).min(dest.len());
        self.input1.fill_buffer(offset, &mut dest[..split]);
        if split < dest.len() {
            self.input2
                .fill_buffer(offset + split - self.offset, &mut dest[split..]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_close;

    #[test]
    fn sine_matches_closed_form() {
        let sig = Sine::with_initial_phase(441.0, 44100.0, 0.5, 0.25).to_vec(300);
        for (t, &x) in sig.iter().enumerate() {
            let expected = 0.5 * (0.25 + 2.0 * std::f64::consts::PI * t as f64 / 100.0).sin();
            assert_close!(x, expected, rtol = 1e-12, atol = 1e-12);
        }
    }

    #[test]
    fn switch_starts_second_signal_from_zero() {
        let sig = Dc::new(0.25).concat(3, Sine::new(1.0, 4.0, 1.0)).to_vec(7);
        assert_eq!(&sig[..3], &[0.25; 3]);
        assert_close!(sig[3], 0.0, rtol = 0.0, atol = 1e-12);
        assert_close!(sig[4], 1.0, rtol = 0.0, atol = 1e-12);

        let mut tail = vec![0.0; 2];
        Dc::new(0.25)
            .concat(3, Dc::new(-1.0))
            .fill_buffer(10, &mut tail);
        assert_eq!(tail, vec![-1.0, -1.0]);
    }

    #[test]
    fn noise_is_bounded_and_seeded() {
        let a = Noise::with_seed(3, 0.1).to_vec(1000);
        let b = Noise::with_seed(3, 0.1).to_vec(1000);
        assert_eq!(a, b);
        assert!(a.iter().all(|x| (-0.1..0.1).contains(x)));
    }

    #[test]
    fn pcm_quantization_saturates() {
        let pcm = Dc::new(2.0).to_pcm(16, 4);
        assert_eq!(pcm, vec![32767; 4]);
        let pcm = Dc::new(-1.0).to_pcm(8, 2);
        assert_eq!(pcm, vec![-127; 2]);
        let pcm = Dc::new(0.5).mix(Dc::new(0.25)).clip().to_pcm(24, 1);
        assert_eq!(pcm, vec![6_291_455]);
    }
}
