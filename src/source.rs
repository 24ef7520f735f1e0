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

//! In-memory multi-channel signal source.

use std::ops::RangeInclusive;

use super::constant::panic_msg;
use super::error::SourceError;
use super::error::SourceErrorReason;

/// Integer sample widths accepted by [`int_to_real`].
pub const SUPPORTED_BITS_PER_SAMPLE: RangeInclusive<usize> = 2..=32;

/// Converts a signed PCM integer to a real value in `[-1, 1]`.
///
/// The sample is divided by `2^(bits_per_sample - 1) - 1`, so the most
/// negative code maps slightly below `-1`.
///
/// # Panics
///
/// Panics if `bits_per_sample` is outside [`SUPPORTED_BITS_PER_SAMPLE`].
///
/// # Examples
///
/// ```
/// # use burgpred::source::int_to_real;
/// assert_eq!(int_to_real(32767, 16), 1.0);
/// assert_eq!(int_to_real(0, 16), 0.0);
/// assert_eq!(int_to_real(-127, 8), -1.0);
/// ```
#[inline]
pub fn int_to_real(sample: i32, bits_per_sample: usize) -> f64 {
    assert!(
        SUPPORTED_BITS_PER_SAMPLE.contains(&bits_per_sample),
        "{}",
        panic_msg::UNSUPPORTED_BITS_PER_SAMPLE
    );
    let full_scale = (1i64 << (bits_per_sample - 1)) - 1;
    f64::from(sample) / full_scale as f64
}

/// Splits interleaved samples into per-channel buffers.
fn deinterleave<F>(interleaved: &[i32], channels: usize, mut convert: F) -> Vec<Vec<f64>>
where
    F: FnMut(i32) -> f64,
{
    let len = interleaved.len() / channels;
    let mut dest: Vec<Vec<f64>> = (0..channels).map(|_| Vec::with_capacity(len)).collect();
    for frame in interleaved.chunks_exact(channels) {
        for (ch, &v) in frame.iter().enumerate() {
            dest[ch].push(convert(v));
        }
    }
    dest
}

/// Source with preloaded real-valued samples.
#[derive(Clone, Debug, PartialEq)]
pub struct MemSource {
    channels: Vec<Vec<f64>>,
    sample_rate: usize,
}

impl MemSource {
    /// Constructs `MemSource` from per-channel sample vectors.
    ///
    /// # Errors
    ///
    /// Returns `SourceErrorReason::InvalidFormat` when no channel is given or
    /// the channels differ in length.
    pub fn from_channels(channels: Vec<Vec<f64>>, sample_rate: usize) -> Result<Self, SourceError> {
        let Some(first) = channels.first() else {
            return Err(SourceError::by_reason(SourceErrorReason::InvalidFormat));
        };
        let len = first.len();
        if channels.iter().any(|ch| ch.len() != len) {
            return Err(SourceError::by_reason(SourceErrorReason::InvalidFormat));
        }
        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Constructs `MemSource` from interleaved PCM integers.
    ///
    /// Trailing samples that do not fill a whole inter-channel frame are
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns `SourceErrorReason::InvalidFormat` when `channels` is zero, and
    /// `SourceErrorReason::UnsupportedFormat` when `bits_per_sample` is not in
    /// `2..=32`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use burgpred::source::MemSource;
    /// let src = MemSource::from_interleaved_ints(&[127, -127, 0, 64], 2, 8, 8000).unwrap();
    /// assert_eq!(src.channels(), 2);
    /// assert_eq!(src.len(), 2);
    /// assert_eq!(src.channel(1).unwrap()[0], -1.0);
    /// ```
    pub fn from_interleaved_ints(
        samples: &[i32],
        channels: usize,
        bits_per_sample: usize,
        sample_rate: usize,
    ) -> Result<Self, SourceError> {
        if channels == 0 {
            return Err(SourceError::by_reason(SourceErrorReason::InvalidFormat));
        }
        if !SUPPORTED_BITS_PER_SAMPLE.contains(&bits_per_sample) {
            return Err(SourceError::by_reason(SourceErrorReason::UnsupportedFormat));
        }
        Ok(Self {
            channels: deinterleave(samples, channels, |v| int_to_real(v, bits_per_sample)),
            sample_rate,
        })
    }

    /// Returns the number of channels.
    pub fn channels(&self) -> usize {
        self.channels.len()
    }

    /// Returns sampling rate in Hz.
    pub fn sample_rate(&self) -> usize {
        self.sample_rate
    }

    /// Gets the length in inter-channel samples.
    pub fn len(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Returns `true` if the source contains no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the samples of channel `ch`.
    ///
    /// # Errors
    ///
    /// Returns `SourceErrorReason::InvalidChannel` if `ch` is out of range.
    pub fn channel(&self, ch: usize) -> Result<&[f64], SourceError> {
        self.channels
            .get(ch)
            .map(Vec::as_slice)
            .ok_or_else(|| SourceError::by_reason(SourceErrorReason::InvalidChannel))
    }
}
