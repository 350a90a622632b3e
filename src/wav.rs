/* ==================================================================================================
 *                           This file is part of the bachelor thesis project
 *                  Implementation and Analysis of Selected Noise Reduction Methods
 *                                Weronika Tarnawska (Index No. 331171)
 *                                  Supervisor:  dr hab. Paweł Woźny
 *                                  University of Wrocław, June 2025
 * ================================================================================================== */
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;
use tracing::debug;

use crate::error::{NoiseError, Result};
use crate::signal::Signal;

/// Source and sink of raw sample streams.
pub trait SampleStore {
    fn read_samples(&self, path: &Path) -> Result<Signal>;
    fn write_samples(&self, path: &Path, signal: &Signal) -> Result<()>;
}

/// Single-channel 16-bit PCM WAV files.
#[derive(Clone, Copy, Debug)]
pub struct WavStore {
    sample_rate: u32,
}

impl WavStore {
    /// `sample_rate` is written into the header of every saved file.
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }
}

impl SampleStore for WavStore {
    fn read_samples(&self, path: &Path) -> Result<Signal> {
        read_wav(path)
    }

    fn write_samples(&self, path: &Path, signal: &Signal) -> Result<()> {
        save_wav(signal, path, self.sample_rate)
    }
}

/// Reads a single-channel 16-bit PCM WAV file.
/// Fails if the file has more than one channel, is not 16-bit, or not PCM Int.
/// Any sample rate is accepted.
pub fn read_wav(path: &Path) -> Result<Signal> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();

    if spec.channels != 1 {
        return Err(NoiseError::InvalidParameter(format!(
            "expected 1 channel in {}, found {}",
            path.display(),
            spec.channels
        )));
    }
    if spec.bits_per_sample != 16 || spec.sample_format != SampleFormat::Int {
        return Err(NoiseError::InvalidParameter(format!(
            "expected 16-bit PCM integer samples in {}, found {}-bit {:?}",
            path.display(),
            spec.bits_per_sample,
            spec.sample_format
        )));
    }

    let samples = reader
        .samples::<i16>()
        .collect::<std::result::Result<Vec<i16>, _>>()?;
    debug!(path = %path.display(), samples = samples.len(), rate = spec.sample_rate, "read wav");
    Ok(Signal::new(samples))
}

/// Writes samples unchanged to a single-channel 16-bit PCM WAV file.
pub fn save_wav(signal: &[i16], path: &Path, sample_rate: u32) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for &s in signal {
        writer.write_sample(s)?;
    }
    writer.finalize()?;
    debug!(path = %path.display(), samples = signal.len(), "wrote wav");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("{}_{}.wav", name, std::process::id()))
    }

    #[test]
    fn test_store_roundtrip() {
        let path = temp_path("noise_reduction_store");
        let store = WavStore::new(19_980);
        let signal: Signal = vec![0, 1, -1, i16::MAX, i16::MIN, 1234].into();
        store.write_samples(&path, &signal).unwrap();
        let back = store.read_samples(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(back, signal);
    }

    #[test]
    fn test_rejects_stereo() {
        let path = temp_path("noise_reduction_stereo");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        writer.write_sample(1i16).unwrap();
        writer.write_sample(2i16).unwrap();
        writer.finalize().unwrap();

        let result = read_wav(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(NoiseError::InvalidParameter(_))));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            read_wav(Path::new("/nonexistent/definitely_missing.wav")),
            Err(NoiseError::Wav(_))
        ));
    }
}
