/* ==================================================================================================
 *                           This file is part of the bachelor thesis project
 *                  Implementation and Analysis of Selected Noise Reduction Methods
 *                                Weronika Tarnawska (Index No. 331171)
 *                                  Supervisor:  dr hab. Paweł Woźny
 *                                  University of Wrocław, June 2025
 * ================================================================================================== */
//! Training pipeline for neural speech noise removal.
//!
//! Clean speech and a noise recording are mixed ([`mixer`]), cut into
//! normalized network rows ([`dataset`]) and fed to a network epoch by epoch
//! on a background thread ([`controller`]). The network itself is supplied by
//! the caller through the [`network::Network`] trait.
pub mod checkpoint;
pub mod config;
pub mod controller;
pub mod dataset;
pub mod error;
pub mod mixer;
pub mod network;
pub mod normalization;
pub mod recovery;
pub mod signal;
pub mod synth;
pub mod utils;
pub mod wav;

pub use checkpoint::CheckpointNamer;
pub use config::{Config, ControllerConfig, LayerWidths, TrainingHyperparameters};
pub use controller::{
    SessionOutcome, SessionState, SessionSummary, TrainingController, TrainingData, TrainingEvent,
};
pub use dataset::{Dataset, DatasetBuilder, WindowLayout, WindowMode};
pub use error::{ConfigError, NoiseError, Result};
pub use mixer::{JitterMode, MixParameters, NoiseMixer};
pub use network::{Network, NetworkDescriptor};
pub use normalization::Normalization;
pub use signal::Signal;
pub use wav::{SampleStore, WavStore};
