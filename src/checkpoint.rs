/* ==================================================================================================
 *                           This file is part of the bachelor thesis project
 *                  Implementation and Analysis of Selected Noise Reduction Methods
 *                                Weronika Tarnawska (Index No. 331171)
 *                                  Supervisor:  dr hab. Paweł Woźny
 *                                  University of Wrocław, June 2025
 * ================================================================================================== */
use std::path::{Path, PathBuf};

use crate::config::TrainingHyperparameters;

/// File extension of saved networks.
pub const CHECKPOINT_EXTENSION: &str = "bin";

/// Derives checkpoint names for one training session.
///
/// Names list, in order: layer widths, alpha, epoch, input delimiter, both
/// learning-rate factors, noise intensity, the epoch error at full precision
/// and the session id. Networks trained further from a saved file get a
/// trailing `+`.
#[derive(Clone, Debug)]
pub struct CheckpointNamer {
    hyperparameters: TrainingHyperparameters,
    session_id: u64,
}

impl CheckpointNamer {
    pub fn new(hyperparameters: TrainingHyperparameters, session_id: u64) -> Self {
        Self {
            hyperparameters,
            session_id,
        }
    }

    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    /// Name of the checkpoint taken after `epoch` with the given error.
    pub fn name(&self, epoch: usize, error: f64) -> String {
        let h = &self.hyperparameters;
        let layers = h
            .layers
            .to_vec()
            .iter()
            .map(|w| w.to_string())
            .collect::<Vec<_>>()
            .join("-");

        let mut name = format!(
            "prprop_{}_alpha{}_it{}_del{}_lrp{}_lrm{}_noise{}_err{}_s{}",
            layers,
            h.alpha,
            epoch,
            h.input_delimiter,
            h.learning_rate_increase,
            h.learning_rate_decrease,
            h.noise_intensity,
            error,
            self.session_id
        );
        if h.further_training {
            name.push('+');
        }
        name.push('.');
        name.push_str(CHECKPOINT_EXTENSION);
        name
    }

    pub fn path(&self, dir: &Path, epoch: usize, error: f64) -> PathBuf {
        dir.join(self.name(epoch, error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_format() {
        let namer = CheckpointNamer::new(TrainingHyperparameters::default(), 17);
        assert_eq!(
            namer.name(100, 0.25),
            "prprop_12-10-5-1_alpha1_it100_del32768_lrp1.2_lrm0.5_noise0.1_err0.25_s17.bin"
        );
    }

    #[test]
    fn test_name_is_deterministic() {
        let namer = CheckpointNamer::new(TrainingHyperparameters::default(), 3);
        assert_eq!(namer.name(5, 0.123456789), namer.name(5, 0.123456789));
    }

    #[test]
    fn test_error_at_full_precision() {
        let namer = CheckpointNamer::new(TrainingHyperparameters::default(), 3);
        let a = namer.name(200, 0.1 + 0.2);
        let b = namer.name(200, 0.3);
        assert_ne!(a, b);
        assert!(a.contains("err0.30000000000000004"));
    }

    #[test]
    fn test_single_hidden_layer_and_further_training() {
        let mut h = TrainingHyperparameters::default();
        h.layers.hidden2 = 0;
        h.further_training = true;
        let name = CheckpointNamer::new(h, 9).name(1, 2.0);
        assert!(name.starts_with("prprop_12-10-1_"));
        assert!(name.ends_with("_s9+.bin"));
    }

    #[test]
    fn test_sessions_do_not_collide() {
        let h = TrainingHyperparameters::default();
        let a = CheckpointNamer::new(h.clone(), 1).name(100, 0.5);
        let b = CheckpointNamer::new(h, 2).name(100, 0.5);
        assert_ne!(a, b);
    }

    #[test]
    fn test_path_joins_directory() {
        let namer = CheckpointNamer::new(TrainingHyperparameters::default(), 1);
        let path = namer.path(Path::new("networks"), 3, 1.5);
        assert_eq!(path.parent(), Some(Path::new("networks")));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("bin"));
    }
}
