/* ==================================================================================================
 *                           This file is part of the bachelor thesis project
 *                  Implementation and Analysis of Selected Noise Reduction Methods
 *                                Weronika Tarnawska (Index No. 331171)
 *                                  Supervisor:  dr hab. Paweł Woźny
 *                                  University of Wrocław, June 2025
 * ================================================================================================== */
use serde::{Deserialize, Serialize};

use crate::error::{NoiseError, Result};
use crate::signal::saturate;

/// Offset added to every target sample, shifts `i16::MIN` to zero.
pub const OUTPUT_SUBTRACTOR: f64 = 32768.0;
/// Full width of the `i16` range, maps targets into `[0, 1]`.
pub const OUTPUT_DELIMITER: f64 = 65535.0;

/// Sample transforms applied to network inputs and targets.
///
/// Inputs use `x = (s - input_subtractor) / input_delimiter`, which the caller
/// configures. Targets always use `y = (s + 32768) / 65535` so that network
/// outputs land in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Normalization {
    pub input_subtractor: f64,
    pub input_delimiter: f64,
}

impl Default for Normalization {
    fn default() -> Self {
        Self {
            input_subtractor: 0.0,
            input_delimiter: 32768.0,
        }
    }
}

impl Normalization {
    /// Create an input transform with the given delimiter and zero subtractor.
    pub fn with_delimiter(input_delimiter: f64) -> Result<Self> {
        let normalization = Self {
            input_delimiter,
            ..Self::default()
        };
        normalization.validate()?;
        Ok(normalization)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.input_delimiter.is_finite() || self.input_delimiter == 0.0 {
            return Err(NoiseError::InvalidParameter(format!(
                "input delimiter must be finite and non-zero, got {}",
                self.input_delimiter
            )));
        }
        if !self.input_subtractor.is_finite() {
            return Err(NoiseError::InvalidParameter(format!(
                "input subtractor must be finite, got {}",
                self.input_subtractor
            )));
        }
        Ok(())
    }

    /// Transform a raw sample into a network input value.
    #[inline]
    pub fn input(&self, sample: i16) -> f64 {
        (sample as f64 - self.input_subtractor) / self.input_delimiter
    }

    /// Transform a raw sample into a network target value in `[0, 1]`.
    #[inline]
    pub fn target(&self, sample: i16) -> f64 {
        (sample as f64 + OUTPUT_SUBTRACTOR) / OUTPUT_DELIMITER
    }

    /// Reconstruct a sample from a network output.
    #[inline]
    pub fn inverse(&self, output: f64) -> i16 {
        let raw = (output * OUTPUT_DELIMITER - OUTPUT_SUBTRACTOR).round();
        if raw.is_nan() {
            return 0;
        }
        // float to int casts saturate, so infinities stay inside i64
        saturate(raw as i64)
    }
}
