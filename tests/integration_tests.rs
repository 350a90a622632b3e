//! Integration tests for noise_reduction

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::SeedableRng;

use noise_reduction::recovery::{denoise, evaluate, recover_speech};
use noise_reduction::synth::{generate_signal, NoiseKind};
use noise_reduction::{
    Config, ControllerConfig, DatasetBuilder, JitterMode, LayerWidths, MixParameters, Network,
    NetworkDescriptor, NoiseError, NoiseMixer, Normalization, Result, SampleStore, SessionState,
    Signal, TrainingController, TrainingData, TrainingEvent, TrainingHyperparameters, WavStore,
    WindowMode,
};

/// Network that outputs its input samples unchanged, mapped into target space.
struct PassThrough {
    widths: Vec<usize>,
    normalization: Normalization,
    epochs_run: usize,
}

impl PassThrough {
    fn new(widths: Vec<usize>, normalization: Normalization) -> Self {
        Self {
            widths,
            normalization,
            epochs_run: 0,
        }
    }
}

impl Network for PassThrough {
    fn run_epoch(&mut self, _inputs: &[Vec<f64>], _targets: &[Vec<f64>]) -> Result<f64> {
        self.epochs_run += 1;
        Ok(1.0 / self.epochs_run as f64)
    }

    fn compute(&self, input: &[f64]) -> Vec<f64> {
        let output_width = self.widths[self.widths.len() - 1];
        let n = &self.normalization;
        input[input.len() - output_width..]
            .iter()
            .map(|&x| {
                let sample = x * n.input_delimiter + n.input_subtractor;
                (sample + 32768.0) / 65535.0
            })
            .collect()
    }

    fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let widths = self
            .widths
            .iter()
            .map(|w| w.to_string())
            .collect::<Vec<_>>()
            .join(",");
        std::fs::write(path, widths)?;
        Ok(())
    }

    fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let widths = text
            .split(',')
            .map(|w| w.trim().parse::<usize>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| NoiseError::PersistenceFailure(e.to_string()))?;
        Ok(Self::new(widths, Normalization::default()))
    }

    fn descriptor(&self) -> NetworkDescriptor {
        NetworkDescriptor {
            layer_widths: self.widths.clone(),
        }
    }
}

/// Mix of three tones standing in for speech
fn generate_speech(len: usize, sample_rate: f64) -> Signal {
    (0..len)
        .map(|i| {
            let t = i as f64 / sample_rate;
            let x = 0.5 * (2.0 * std::f64::consts::PI * 300.0 * t).sin()
                + 0.3 * (2.0 * std::f64::consts::PI * 1000.0 * t).sin()
                + 0.2 * (2.0 * std::f64::consts::PI * 2500.0 * t).sin();
            (x * 10_000.0).round() as i16
        })
        .collect()
}

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{}_{}", name, std::process::id()))
}

fn aligned_hyperparameters() -> TrainingHyperparameters {
    TrainingHyperparameters {
        layers: LayerWidths {
            input: 4,
            hidden: 6,
            hidden2: 0,
            output: 4,
        },
        epochs: 10,
        checkpoint_interval: 5,
        reshuffle_interval: 3,
        noise_intensity: 0.2,
        ..TrainingHyperparameters::default()
    }
}

#[test]
fn test_config_defaults() {
    let config = Config::default();

    assert_eq!(config.audio.sample_rate, 19_980);
    assert_eq!(config.training.layers.to_vec(), vec![12, 10, 5, 1]);
    assert_eq!(config.training.epochs, 500);
    assert_eq!(config.training.checkpoint_interval, 100);
    assert_eq!(config.training.reshuffle_interval, 20);
    assert_eq!(config.training.noise_jitter, JitterMode::Off);
    assert!(config.training.validate().is_ok());
}

#[test]
fn test_config_from_toml() {
    let toml_str = r#"
        [audio]
        sample_rate = 16000

        [training]
        layers = { input = 8, hidden = 16, hidden2 = 0, output = 8 }
        epochs = 50
        noise_intensity = 0.3
        noise_jitter = "persample"

        [controller]
        emit_recovered_speech = false
        seed = 42
    "#;

    let config: Config = toml::from_str(toml_str).expect("Failed to parse TOML");

    assert_eq!(config.audio.sample_rate, 16000);
    assert_eq!(config.training.layers.to_vec(), vec![8, 16, 8]);
    assert_eq!(config.training.epochs, 50);
    assert_eq!(config.training.noise_jitter, JitterMode::PerSample);
    // unspecified values keep their defaults
    assert_eq!(config.training.learning_rate_increase, 1.2);
    assert_eq!(config.controller.channel_capacity, 64);
    assert!(!config.controller.emit_recovered_speech);
    assert_eq!(config.controller.seed, Some(42));
}

#[test]
fn test_config_file_roundtrip() {
    let dir = temp_dir("noise_reduction_config");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.toml");

    let mut config = Config::default();
    config.training.epochs = 7;
    config.controller.seed = Some(3);
    std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();

    let loaded = Config::from_file(&path).unwrap();
    std::fs::remove_dir_all(&dir).ok();
    assert_eq!(loaded, config);
}

#[test]
fn test_generated_noise_through_wav_and_mixer() {
    let dir = temp_dir("noise_reduction_wav");
    std::fs::create_dir_all(&dir).unwrap();
    let store = WavStore::new(8000);
    let mut rng = StdRng::seed_from_u64(11);

    let speech = generate_speech(400, 8000.0);
    let noise = generate_signal(1000, NoiseKind::WhiteNoise, 8000.0, 5000.0, &mut rng).unwrap();
    store.write_samples(&dir.join("speech.wav"), &speech).unwrap();
    store.write_samples(&dir.join("noise.wav"), &noise).unwrap();

    let speech_back = store.read_samples(&dir.join("speech.wav")).unwrap();
    let noise_back = store.read_samples(&dir.join("noise.wav")).unwrap();
    std::fs::remove_dir_all(&dir).ok();
    assert_eq!(speech_back, speech);
    assert_eq!(noise_back, noise);

    let mixer = NoiseMixer::new(MixParameters::new(0.0, JitterMode::Off).unwrap());
    let mixed = mixer.mix(&speech_back, &noise_back, &mut rng);
    assert_eq!(mixed, speech);
}

#[test]
fn test_sliding_dataset_from_mixture() {
    let mut rng = StdRng::seed_from_u64(5);
    let speech = generate_speech(300, 8000.0);
    let noise = generate_signal(500, NoiseKind::Sinusoidal(50.0), 8000.0, 2000.0, &mut rng).unwrap();
    let mixer = NoiseMixer::new(MixParameters::new(0.5, JitterMode::PerSample).unwrap());
    let mixed = mixer.mix(&speech, &noise, &mut rng);

    let builder = DatasetBuilder::new(12, 1, Normalization::default()).unwrap();
    let dataset = builder.build(&mixed, &speech).unwrap();
    assert_eq!(dataset.layout().mode(), WindowMode::Sliding);
    assert_eq!(dataset.len(), 300 - 12 + 1);

    let network = PassThrough::new(vec![12, 10, 5, 1], Normalization::default());
    let recovered = recover_speech(&network, &dataset);
    assert_eq!(recovered.as_slice(), &mixed[11..]);

    let mut csv = Vec::new();
    dataset.write_csv(&mut csv).unwrap();
    let text = String::from_utf8(csv).unwrap();
    assert_eq!(text.lines().count(), dataset.len() + 1);
}

#[test]
fn test_training_session_end_to_end() {
    let checkpoint_dir = temp_dir("noise_reduction_session");
    let hyperparameters = aligned_hyperparameters();
    let mut rng = StdRng::seed_from_u64(21);

    let speech = generate_speech(800, 8000.0);
    let noise = generate_signal(2000, NoiseKind::WhiteNoise, 8000.0, 8000.0, &mut rng).unwrap();
    let data = TrainingData::prepare(speech.clone(), noise, &hyperparameters, &mut rng).unwrap();
    assert_eq!(data.dataset().len(), 200);

    let controller = TrainingController::new(ControllerConfig {
        checkpoint_dir: checkpoint_dir.clone(),
        seed: Some(9),
        ..ControllerConfig::default()
    });
    let network = PassThrough::new(
        hyperparameters.layers.to_vec(),
        hyperparameters.normalization(),
    );
    let events = controller
        .start(hyperparameters.clone(), data, network)
        .unwrap();

    let mut progress = Vec::new();
    let mut checkpoints = Vec::new();
    let mut recovered = 0;
    let mut summary = None;
    for event in events.iter() {
        match event {
            TrainingEvent::Progress(p) => progress.push(p.epoch),
            TrainingEvent::Checkpoint(c) => checkpoints.push(c),
            TrainingEvent::RecoveredSpeech(r) => {
                assert_eq!(r.signal.len(), 800);
                recovered += 1;
            }
            TrainingEvent::Finished(s) => {
                summary = Some(s);
                break;
            }
        }
    }

    let summary = summary.expect("session did not finish");
    assert_eq!(summary.state, SessionState::Completed);
    assert_eq!(summary.epoch, 10);
    assert_eq!(progress, (1..=10).collect::<Vec<_>>());
    assert_eq!(recovered, 10);
    assert_eq!(
        checkpoints.iter().map(|c| c.epoch).collect::<Vec<_>>(),
        vec![5, 10]
    );
    assert!(checkpoints.iter().all(|c| c.succeeded));
    for checkpoint in &checkpoints {
        let path = checkpoint_dir.join(&checkpoint.name);
        assert!(path.exists());
        let loaded = PassThrough::load(&path).unwrap();
        assert_eq!(loaded.widths, vec![4, 6, 4]);
    }

    let outcome = controller.wait().unwrap();
    std::fs::remove_dir_all(&checkpoint_dir).ok();
    assert_eq!(controller.state(), SessionState::Completed);
    assert_eq!(outcome.network.epochs_run, 10);

    // an identity network leaves exactly the added noise behind
    let mixed = outcome.data.mixed().clone();
    let evaluation = evaluate(
        &outcome.network,
        &mixed,
        Some(&speech),
        hyperparameters.normalization(),
    )
    .unwrap();
    assert_eq!(evaluation.recovered, mixed);
    assert!(evaluation.mean_abs_error.unwrap() > 0.0);

    controller.reset().unwrap();
    assert_eq!(controller.state(), SessionState::Idle);
}

#[test]
fn test_stop_training_early() {
    let mut hyperparameters = aligned_hyperparameters();
    hyperparameters.epochs = 1_000_000;
    hyperparameters.checkpoint_interval = 0;
    let mut rng = StdRng::seed_from_u64(1);

    let speech = generate_speech(64, 8000.0);
    let noise = generate_signal(64, NoiseKind::WhiteNoise, 8000.0, 100.0, &mut rng).unwrap();
    let data = TrainingData::prepare(speech, noise, &hyperparameters, &mut rng).unwrap();

    let controller = TrainingController::new(ControllerConfig {
        emit_recovered_speech: false,
        ..ControllerConfig::default()
    });
    let network = PassThrough::new(
        hyperparameters.layers.to_vec(),
        hyperparameters.normalization(),
    );
    let events = controller.start(hyperparameters, data, network).unwrap();

    // let a few epochs through before stopping
    for _ in 0..3 {
        assert!(matches!(events.recv().unwrap(), TrainingEvent::Progress(_)));
    }
    controller.stop().unwrap();

    let summary = events
        .iter()
        .find_map(|event| match event {
            TrainingEvent::Finished(summary) => Some(summary),
            _ => None,
        })
        .unwrap();
    assert_eq!(summary.state, SessionState::Stopped);
    assert!(summary.epoch >= 3 && summary.epoch < 1_000_000);
    assert!(controller.wait().is_ok());
    assert!(matches!(controller.stop(), Err(NoiseError::NoActiveSession)));
}

#[test]
fn test_denoise_with_loaded_layout() {
    let network = PassThrough::new(vec![5, 3, 1], Normalization::default());
    let noisy: Vec<i16> = (0..10).map(|i| i * 100).collect();
    let clean = denoise(&network, &noisy, Normalization::default()).unwrap();
    assert_eq!(clean.as_slice(), &noisy[4..]);

    assert!(matches!(
        denoise(&network, &noisy[..3], Normalization::default()),
        Err(NoiseError::InsufficientData(_))
    ));
}
