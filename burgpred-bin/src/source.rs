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

//! A module for signal sources for "burgpred-bin".

use std::path::Path;

use burgpred::error::SourceError;
use burgpred::error::SourceErrorReason;
use burgpred::source::MemSource;

/// WAV file loaded into a `burgpred::source::MemSource` with `hound`.
///
/// Integer samples (8 to 32 bits) are converted with
/// `burgpred::source::int_to_real`. `hound` already shifts unsigned 8-bit
/// samples to the signed range. 32-bit float samples are used as they are.
#[allow(clippy::module_name_repetitions)]
#[derive(Debug)]
pub struct HoundSource {
    spec: hound::WavSpec,
    file_size: Option<usize>,
    source: MemSource,
}

impl HoundSource {
    /// Constructs `HoundSource` from `path`.
    ///
    /// # Errors
    ///
    /// The function fails when file is not found or has invalid format.
    /// Float WAVs other than 32-bit ones are reported as
    /// `SourceErrorReason::UnsupportedFormat`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let file_size = path.metadata().ok().map(|x| x.len() as usize);
        let reader = hound::WavReader::open(path)
            .map_err(|e| SourceError::from_io_error(e).set_path(path))?;
        let spec = reader.spec();
        let channels = spec.channels as usize;
        let sample_rate = spec.sample_rate as usize;
        let source = match (spec.sample_format, spec.bits_per_sample) {
            (hound::SampleFormat::Int, bits @ 8..=32) => {
                let samples = reader
                    .into_samples::<i32>()
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| SourceError::from_io_error(e).set_path(path))?;
                MemSource::from_interleaved_ints(&samples, channels, bits as usize, sample_rate)
            }
            (hound::SampleFormat::Float, 32) => {
                let samples = reader
                    .into_samples::<f32>()
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| SourceError::from_io_error(e).set_path(path))?;
                let mut dest = vec![Vec::with_capacity(samples.len() / channels.max(1)); channels];
                for frame in samples.chunks_exact(channels.max(1)) {
                    for (ch, &v) in frame.iter().enumerate() {
                        dest[ch].push(f64::from(v));
                    }
                }
                MemSource::from_channels(dest, sample_rate)
            }
            _ => Err(SourceError::by_reason(SourceErrorReason::UnsupportedFormat)),
        }
        .map_err(|e| e.set_path(path))?;
        Ok(Self {
            spec,
            file_size,
            source,
        })
    }

    pub const fn file_size(&self) -> Option<usize> {
        self.file_size
    }

    pub fn duration_as_secs(&self) -> f32 {
        self.source.len() as f32 / self.spec.sample_rate as f32
    }

    pub const fn source(&self) -> &MemSource {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use burgpred::sigen;
    use burgpred::sigen::Signal;
    use rstest::rstest;

    fn write_wav(
        path: &Path,
        spec: hound::WavSpec,
        interleaved_pcm: &[i32],
    ) -> Result<(), hound::Error> {
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &v in interleaved_pcm {
            match spec.bits_per_sample {
                8 => writer.write_sample(v as i8)?,
                16 => writer.write_sample(v as i16)?,
                _ => writer.write_sample(v)?,
            }
        }
        writer.finalize()
    }

    #[rstest]
    fn int_wav_is_loaded(#[values(8, 16, 24, 32)] bits: u16, #[values(1, 2)] channels: u16) {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let path = dir.path().join("tone.wav");
        let pcm = sigen::Sine::new(440.0, 16000.0, 0.5).to_pcm(bits as usize, 1000);
        let interleaved: Vec<i32> = pcm
            .iter()
            .flat_map(|&v| std::iter::repeat(v).take(channels as usize))
            .collect();
        let spec = hound::WavSpec {
            channels,
            sample_rate: 16000,
            bits_per_sample: bits,
            sample_format: hound::SampleFormat::Int,
        };
        write_wav(&path, spec, &interleaved).expect("write failed");

        let src = HoundSource::from_path(&path).expect("load failed");
        assert_eq!(src.source().channels(), channels as usize);
        assert_eq!(src.source().len(), 1000);
        assert_eq!(src.source().sample_rate(), 16000);
        assert!(src.file_size().is_some());
        let loaded = src.source().channel(channels as usize - 1).unwrap();
        for (&x, &v) in loaded.iter().zip(&pcm) {
            assert_eq!(x, burgpred::source::int_to_real(v, bits as usize));
        }
    }

    #[test]
    fn float_wav_is_loaded() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let path = dir.path().join("float.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).expect("create failed");
        for t in 0..100 {
            writer.write_sample(t as f32 / 100.0).expect("write failed");
            writer.write_sample(-0.5f32).expect("write failed");
        }
        writer.finalize().expect("finalize failed");

        let src = HoundSource::from_path(&path).expect("load failed");
        assert_eq!(src.source().len(), 100);
        assert_eq!(src.source().channel(0).unwrap()[50], f64::from(0.5f32));
        assert_eq!(src.source().channel(1).unwrap()[99], -0.5);
        assert!((src.duration_as_secs() - 0.0125).abs() < 1e-6);
    }

    #[test]
    fn missing_file_is_error() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let err = HoundSource::from_path(dir.path().join("missing.wav")).unwrap_err();
        assert!(matches!(err.reason(), SourceErrorReason::IO(_)));
    }
}
