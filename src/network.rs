/* ==================================================================================================
 *                           This file is part of the bachelor thesis project
 *                  Implementation and Analysis of Selected Noise Reduction Methods
 *                                Weronika Tarnawska (Index No. 331171)
 *                                  Supervisor:  dr hab. Paweł Woźny
 *                                  University of Wrocław, June 2025
 * ================================================================================================== */
//! Contract of the trainable function approximator.
//!
//! The crate never looks inside a network. It hands the network whole input
//! and target matrices, asks it for single forward passes, and asks it to
//! persist itself under checkpoint names.

use std::path::Path;

use crate::error::{NoiseError, Result};

/// Layer widths of a network, input layer first.
///
/// `[input, hidden, output]` for one hidden layer,
/// `[input, hidden, hidden2, output]` for two.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkDescriptor {
    pub layer_widths: Vec<usize>,
}

impl NetworkDescriptor {
    pub fn new(layer_widths: Vec<usize>) -> Result<Self> {
        if !(3..=4).contains(&layer_widths.len()) {
            return Err(NoiseError::InvalidParameter(format!(
                "unknown network structure with {} layers",
                layer_widths.len()
            )));
        }
        if layer_widths.iter().any(|&w| w == 0) {
            return Err(NoiseError::InvalidParameter(format!(
                "layer widths must be positive: {:?}",
                layer_widths
            )));
        }
        Ok(Self { layer_widths })
    }

    pub fn input_width(&self) -> usize {
        self.layer_widths.first().copied().unwrap_or(0)
    }

    pub fn output_width(&self) -> usize {
        self.layer_widths.last().copied().unwrap_or(0)
    }
}

/// A feed-forward network trained one epoch at a time.
pub trait Network: Send {
    /// Run one training epoch over the whole dataset and return its error.
    ///
    /// Implementations report allocation failures as
    /// [`NoiseError::ResourceExhausted`]; the session then ends as failed.
    fn run_epoch(&mut self, inputs: &[Vec<f64>], targets: &[Vec<f64>]) -> Result<f64>;

    /// Forward pass of a single input vector.
    fn compute(&self, input: &[f64]) -> Vec<f64>;

    /// Persist the learned state at `path`.
    fn save(&self, path: &Path) -> Result<()>;

    /// Restore a previously saved network.
    fn load(path: &Path) -> Result<Self>
    where
        Self: Sized;

    fn descriptor(&self) -> NetworkDescriptor;
}
