/* ==================================================================================================
 *                           This file is part of the bachelor thesis project
 *                  Implementation and Analysis of Selected Noise Reduction Methods
 *                                Weronika Tarnawska (Index No. 331171)
 *                                  Supervisor:  dr hab. Paweł Woźny
 *                                  University of Wrocław, June 2025
 * ================================================================================================== */
//! Configuration structures

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, NoiseError, Result};
use crate::mixer::{JitterMode, MixParameters};
use crate::network::NetworkDescriptor;
use crate::normalization::Normalization;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub training: TrainingHyperparameters,
    pub controller: ControllerConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> std::result::Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path.display().to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_toml_string(&self) -> std::result::Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}

/// Audio file configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Sample rate written into WAV headers (Hz)
    pub sample_rate: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self { sample_rate: 19_980 }
    }
}

/// Node counts of the network layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerWidths {
    pub input: usize,
    pub hidden: usize,
    /// Zero means the network has a single hidden layer
    pub hidden2: usize,
    pub output: usize,
}

impl Default for LayerWidths {
    fn default() -> Self {
        Self {
            input: 12,
            hidden: 10,
            hidden2: 5,
            output: 1,
        }
    }
}

impl LayerWidths {
    /// Widths as a layer list, input layer first, without an empty second hidden layer.
    pub fn to_vec(&self) -> Vec<usize> {
        let mut widths = vec![self.input, self.hidden];
        if self.hidden2 > 0 {
            widths.push(self.hidden2);
        }
        widths.push(self.output);
        widths
    }

    pub fn from_descriptor(descriptor: &NetworkDescriptor) -> Result<Self> {
        match descriptor.layer_widths.as_slice() {
            &[input, hidden, output] => Ok(Self {
                input,
                hidden,
                hidden2: 0,
                output,
            }),
            &[input, hidden, hidden2, output] => Ok(Self {
                input,
                hidden,
                hidden2,
                output,
            }),
            other => Err(NoiseError::InvalidParameter(format!(
                "unknown network structure: {:?}",
                other
            ))),
        }
    }
}

/// Everything that shapes one training session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingHyperparameters {
    pub layers: LayerWidths,
    /// Steepness of the network activation, only recorded in checkpoint names
    pub alpha: f64,
    /// Learning-rate increase factor, must be > 1
    pub learning_rate_increase: f64,
    /// Learning-rate decrease factor, must lie in (0, 1)
    pub learning_rate_decrease: f64,
    pub input_subtractor: f64,
    pub input_delimiter: f64,
    pub epochs: usize,
    /// Save the network every N epochs (0 disables checkpoints)
    pub checkpoint_interval: usize,
    /// Re-draw the noise every N epochs (0 disables reshuffling)
    pub reshuffle_interval: usize,
    pub noise_intensity: f64,
    pub noise_jitter: JitterMode,
    /// Set when training continues from a previously saved network
    pub further_training: bool,
}

impl Default for TrainingHyperparameters {
    fn default() -> Self {
        Self {
            layers: LayerWidths::default(),
            alpha: 1.0,
            learning_rate_increase: 1.2,
            learning_rate_decrease: 0.5,
            input_subtractor: 0.0,
            input_delimiter: 32768.0,
            epochs: 500,
            checkpoint_interval: 100,
            reshuffle_interval: 20,
            noise_intensity: 0.1,
            noise_jitter: JitterMode::Off,
            further_training: false,
        }
    }
}

impl TrainingHyperparameters {
    /// Adopt the layer widths of a loaded network to keep training it.
    pub fn for_further_training(mut self, descriptor: &NetworkDescriptor) -> Result<Self> {
        self.layers = LayerWidths::from_descriptor(descriptor)?;
        self.further_training = true;
        Ok(self)
    }

    pub fn normalization(&self) -> Normalization {
        Normalization {
            input_subtractor: self.input_subtractor,
            input_delimiter: self.input_delimiter,
        }
    }

    pub fn mix_parameters(&self) -> Result<MixParameters> {
        MixParameters::new(self.noise_intensity, self.noise_jitter)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(NoiseError::InvalidParameter(msg));

        if self.layers.input == 0 || self.layers.hidden == 0 || self.layers.output == 0 {
            return invalid(format!("layer widths must be positive: {:?}", self.layers));
        }
        if !(self.learning_rate_increase > 1.0) || !self.learning_rate_increase.is_finite() {
            return invalid(format!(
                "learning rate increase factor must be > 1, got {}",
                self.learning_rate_increase
            ));
        }
        if !(self.learning_rate_decrease > 0.0 && self.learning_rate_decrease < 1.0) {
            return invalid(format!(
                "learning rate decrease factor must lie in (0, 1), got {}",
                self.learning_rate_decrease
            ));
        }
        if self.epochs == 0 {
            return invalid("epoch count must be positive".to_string());
        }
        if !self.alpha.is_finite() {
            return invalid(format!("alpha must be finite, got {}", self.alpha));
        }
        self.normalization().validate()?;
        self.mix_parameters()?;
        Ok(())
    }
}

/// Training controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Capacity of the reporting channel
    pub channel_capacity: usize,
    /// Emit a recovered-speech buffer after every epoch
    pub emit_recovered_speech: bool,
    /// Directory that receives checkpoint files
    pub checkpoint_dir: PathBuf,
    /// Seed for noise placement (None = seeded from entropy)
    pub seed: Option<u64>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
            emit_recovered_speech: true,
            checkpoint_dir: PathBuf::from("./networks"),
            seed: None,
        }
    }
}
