/* ==================================================================================================
 *                           This file is part of the bachelor thesis project
 *                  Implementation and Analysis of Selected Noise Reduction Methods
 *                                Weronika Tarnawska (Index No. 331171)
 *                                  Supervisor:  dr hab. Paweł Woźny
 *                                  University of Wrocław, June 2025
 * ================================================================================================== */
use rand::{distributions::Uniform, Rng};
use std::f64::consts::PI;

use crate::error::{NoiseError, Result};
use crate::signal::{saturate, Signal};

/// Synthetic noise types
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NoiseKind {
    WhiteNoise,      // White noise
    Sinusoidal(f64), // Sinusoidal signal with given frequency (Hz)
    Siren(f64, f64), // Sinusoidal signal alternating between two tones (f1, f2)
    Chirp(f64, f64), // Linear chirp from f1 to f2
}

impl std::str::FromStr for NoiseKind {
    type Err = NoiseError;

    /// Parses `white`, `sine,440`, `siren,300,600` or `chirp,200,800`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.to_lowercase();
        let mut parts = s.split(',');
        let name = parts.next().unwrap_or("");
        let args = parts
            .map(|p| p.trim().parse::<f64>())
            .collect::<std::result::Result<Vec<f64>, _>>()
            .map_err(|e| NoiseError::InvalidParameter(format!("bad noise argument in '{}': {}", s, e)))?;

        match (name, args.as_slice()) {
            ("white", []) => Ok(NoiseKind::WhiteNoise),
            ("sine", &[f]) => Ok(NoiseKind::Sinusoidal(f)),
            ("siren", &[f1, f2]) => Ok(NoiseKind::Siren(f1, f2)),
            ("chirp", &[f1, f2]) => Ok(NoiseKind::Chirp(f1, f2)),
            _ => Err(NoiseError::InvalidParameter(format!("unknown noise type: {}", s))),
        }
    }
}

/// Generates white noise in [-1, 1)
fn generate_white_noise<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<f64> {
    let uniform = Uniform::from(-1.0..1.0);
    (0..len).map(|_| rng.sample(uniform)).collect()
}

/// Generates a sinusoidal signal at the given frequency
fn generate_sinusoidal(len: usize, frequency: f64, sr: f64) -> Vec<f64> {
    (0..len)
        .map(|i| {
            let t = i as f64 / sr;
            (2.0 * PI * frequency * t).sin()
        })
        .collect()
}

/// Generates a siren-like alternating tones signal, switching every 1/2 second
fn generate_siren(len: usize, f1: f64, f2: f64, sr: f64) -> Vec<f64> {
    let period = ((sr / 2.0) as usize).max(1);
    (0..len)
        .map(|i| {
            let t = i as f64 / sr;
            let freq = if (i / period) % 2 == 0 { f1 } else { f2 };
            (2.0 * PI * freq * t).sin()
        })
        .collect()
}

/// Generates a linear chirp from f1 to f2 over the signal duration
fn generate_chirp(len: usize, f1: f64, f2: f64, sr: f64) -> Vec<f64> {
    let duration = len as f64 / sr;
    let k = (f2 - f1) / duration;

    (0..len)
        .map(|i| {
            let t = i as f64 / sr;
            (2.0 * PI * (f1 * t + 0.5 * k * t * t)).sin()
        })
        .collect()
}

/// Generates a noise clip of given length and type.
///
/// # Arguments
/// * `len`         - number of samples
/// * `kind`        - what to generate
/// * `sample_rate` - samples per second, must be positive
/// * `amplitude`   - peak value in the `i16` domain
/// * `rng`         - random source, only used by white noise
pub fn generate_signal<R: Rng + ?Sized>(
    len: usize,
    kind: NoiseKind,
    sample_rate: f64,
    amplitude: f64,
    rng: &mut R,
) -> Result<Signal> {
    if !(sample_rate > 0.0) || !sample_rate.is_finite() {
        return Err(NoiseError::InvalidParameter(format!(
            "sample rate must be positive, got {}",
            sample_rate
        )));
    }
    let unit = match kind {
        NoiseKind::WhiteNoise => generate_white_noise(len, rng),
        NoiseKind::Sinusoidal(freq) => generate_sinusoidal(len, freq, sample_rate),
        NoiseKind::Siren(f1, f2) => generate_siren(len, f1, f2, sample_rate),
        NoiseKind::Chirp(f1, f2) => generate_chirp(len, f1, f2, sample_rate),
    };
    Ok(unit
        .into_iter()
        .map(|x| saturate((x * amplitude).round() as i64))
        .collect())
}
