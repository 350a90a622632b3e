/* ==================================================================================================
 *                           This file is part of the bachelor thesis project
 *                  Implementation and Analysis of Selected Noise Reduction Methods
 *                                Weronika Tarnawska (Index No. 331171)
 *                                  Supervisor:  dr hab. Paweł Woźny
 *                                  University of Wrocław, June 2025
 * ================================================================================================== */
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{NoiseError, Result};
use crate::signal::{saturate, Signal};

/// How the noise intensity is applied to each sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JitterMode {
    /// Every noise sample is scaled by the same intensity
    #[default]
    Off,
    /// Every noise sample is scaled by `(uniform(0, 1) + 0.5) * intensity`
    PerSample,
}

/// Parameters of one mixing call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MixParameters {
    intensity: f64,
    jitter: JitterMode,
}

impl MixParameters {
    pub fn new(intensity: f64, jitter: JitterMode) -> Result<Self> {
        if !intensity.is_finite() || intensity < 0.0 {
            return Err(NoiseError::InvalidParameter(format!(
                "noise intensity must be a finite value >= 0, got {}",
                intensity
            )));
        }
        Ok(Self { intensity, jitter })
    }

    pub fn intensity(&self) -> f64 {
        self.intensity
    }

    pub fn jitter(&self) -> JitterMode {
        self.jitter
    }
}

/// Synthesizes noisy speech from a clean recording and a noise recording.
#[derive(Clone, Copy, Debug)]
pub struct NoiseMixer {
    params: MixParameters,
}

impl NoiseMixer {
    pub fn new(params: MixParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> MixParameters {
        self.params
    }

    /// Add a randomly placed window of `noise` to `speech`.
    ///
    /// # Arguments
    /// * `speech` - clean speech samples
    /// * `noise`  - noise samples, usually a longer recording than the speech
    /// * `rng`    - random source for the window offset (and jitter, if enabled)
    ///
    /// # Returns
    /// A signal of length `min(speech.len(), noise.len())`. The noise window
    /// starts at an offset drawn uniformly from `[0, noise.len() - len]`. Every
    /// sum is saturated to the `i16` range.
    pub fn mix<R: Rng + ?Sized>(&self, speech: &[i16], noise: &[i16], rng: &mut R) -> Signal {
        let len = speech.len().min(noise.len());
        let offset = rng.gen_range(0..=noise.len() - len);
        debug!(len, offset, intensity = self.params.intensity, "mixing noise into speech");

        let noise = &noise[offset..offset + len];
        speech
            .iter()
            .zip(noise.iter())
            .map(|(&s, &n)| {
                let scale = match self.params.jitter {
                    JitterMode::Off => self.params.intensity,
                    JitterMode::PerSample => (rng.gen::<f64>() + 0.5) * self.params.intensity,
                };
                // truncation toward zero, saturating on overflow
                let scaled = (n as f64 * scale) as i64;
                saturate((s as i64).saturating_add(scaled))
            })
            .collect()
    }
}
