/* ==================================================================================================
 *                           This file is part of the bachelor thesis project
 *                  Implementation and Analysis of Selected Noise Reduction Methods
 *                                Weronika Tarnawska (Index No. 331171)
 *                                  Supervisor:  dr hab. Paweł Woźny
 *                                  University of Wrocław, June 2025
 * ================================================================================================== */
//! Error types for mixing, dataset building and training

use thiserror::Error;

/// Main error type of the crate
#[derive(Error, Debug)]
pub enum NoiseError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("A training session is already running")]
    AlreadyRunning,

    #[error("No active training session")]
    NoActiveSession,

    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("Failed to persist checkpoint: {0}")]
    PersistenceFailure(String),

    #[error("Training worker panicked")]
    WorkerPanicked,

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(String),
}

pub type Result<T> = std::result::Result<T, NoiseError>;
