/* ==================================================================================================
 *                           This file is part of the bachelor thesis project
 *                  Implementation and Analysis of Selected Noise Reduction Methods
 *                                Weronika Tarnawska (Index No. 331171)
 *                                  Supervisor:  dr hab. Paweł Woźny
 *                                  University of Wrocław, June 2025
 * ================================================================================================== */
use std::fs::File;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{arg, value_parser, ArgMatches, Command};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use noise_reduction::synth::{generate_signal, NoiseKind};
use noise_reduction::utils::sig_to_noise_ratio_db;
use noise_reduction::{
    Config, DatasetBuilder, JitterMode, MixParameters, NoiseMixer, SampleStore, WavStore,
};

fn cli() -> Command {
    Command::new("Noise Reduction Trainer")
        .version("1.0")
        .about("Training data preparation for neural speech denoising")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            arg!(-C --config <FILE> "Configuration file (TOML)")
                .required(false)
                .global(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(arg!(-v --verbose ... "Verbosity level (-v, -vv, -vvv)").global(true))
        .subcommand(
            Command::new("sig-gen")
                .about("Generate a synthetic noise clip and save to WAV")
                .arg(arg!(-t --"type" <TYPE> "Noise type: white|sine,440.0|siren,300,600|chirp,200,800").required(true))
                .arg(arg!(-d --"duration" <DUR> "Duration in seconds").required(true).value_parser(value_parser!(f64)))
                .arg(arg!(-a --"amplitude" <AMP> "Peak amplitude in sample units").default_value("8000").value_parser(value_parser!(f64)))
                .arg(arg!(-s --"seed" <SEED> "Random seed").required(false).value_parser(value_parser!(u64)))
                .arg(arg!(-o --"out-file" <FILE> "Output WAV path").default_value("noise.wav").value_parser(value_parser!(PathBuf))),
        )
        .subcommand(
            Command::new("mix")
                .about("Mix clean speech with a random window of noise")
                .arg(arg!(-c --"clean" <FILE> "Path to clean speech WAV").required(true).value_parser(value_parser!(PathBuf)))
                .arg(arg!(-n --"noise" <FILE> "Path to noise WAV").required(true).value_parser(value_parser!(PathBuf)))
                .arg(arg!(-l --"noise-level" <VAL> "Noise intensity (defaults to the configured one)").required(false).value_parser(value_parser!(f64)))
                .arg(arg!(-j --"jitter" "Scale every noise sample by a random factor in [0.5, 1.5)"))
                .arg(arg!(-s --"seed" <SEED> "Random seed").required(false).value_parser(value_parser!(u64)))
                .arg(arg!(-o --"out-file" <FILE> "Output WAV path").default_value("mixed.wav").value_parser(value_parser!(PathBuf))),
        )
        .subcommand(
            Command::new("dataset")
                .about("Cut a mixed/clean pair into training rows and export them as CSV")
                .arg(arg!(-x --"mixed" <FILE> "Speech with noise WAV").required(true).value_parser(value_parser!(PathBuf)))
                .arg(arg!(-c --"clean" <FILE> "Clean speech WAV").required(true).value_parser(value_parser!(PathBuf)))
                .arg(arg!(-i --"input-width" <N> "Input vector width").required(false).value_parser(value_parser!(usize)))
                .arg(arg!(-w --"output-width" <N> "Output vector width").required(false).value_parser(value_parser!(usize)))
                .arg(arg!(-o --"out-file" <FILE> "Output CSV path").default_value("dataset.csv").value_parser(value_parser!(PathBuf))),
        )
        .subcommand(Command::new("config").about("Print the effective configuration"))
}

fn main() -> Result<()> {
    let matches = cli().get_matches();

    // quiet by default, use -v for more
    let log_level = match matches.get_count("verbose") {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.into()))
        .init();

    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    match matches.subcommand() {
        Some(("sig-gen", m)) => handle_sig_gen(m, &config),
        Some(("mix", m)) => handle_mix(m, &config),
        Some(("dataset", m)) => handle_dataset(m, &config),
        Some(("config", _)) => handle_config(&config),
        _ => bail!("Unknown command. Use --help."),
    }
}

fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn handle_sig_gen(m: &ArgMatches, config: &Config) -> Result<()> {
    let noise_type = m.get_one::<String>("type").context("missing noise type")?;
    let duration = *m.get_one::<f64>("duration").context("missing duration")?;
    let amplitude = *m.get_one::<f64>("amplitude").context("missing amplitude")?;
    let out_file = m.get_one::<PathBuf>("out-file").context("missing output path")?;
    let kind: NoiseKind = noise_type.parse()?;

    let sample_rate = config.audio.sample_rate;
    let len = (duration * sample_rate as f64).max(0.0) as usize;
    let mut rng = rng_from(m.get_one::<u64>("seed").copied());
    let signal = generate_signal(len, kind, sample_rate as f64, amplitude, &mut rng)?;

    WavStore::new(sample_rate).write_samples(out_file, &signal)?;
    println!("Generated {}-second {} -> {}", duration, noise_type, out_file.display());
    Ok(())
}

fn handle_mix(m: &ArgMatches, config: &Config) -> Result<()> {
    let clean_file = m.get_one::<PathBuf>("clean").context("missing clean file")?;
    let noise_file = m.get_one::<PathBuf>("noise").context("missing noise file")?;
    let out_file = m.get_one::<PathBuf>("out-file").context("missing output path")?;
    let intensity = m
        .get_one::<f64>("noise-level")
        .copied()
        .unwrap_or(config.training.noise_intensity);
    let jitter = if m.get_flag("jitter") {
        JitterMode::PerSample
    } else {
        config.training.noise_jitter
    };
    let seed = m.get_one::<u64>("seed").copied().or(config.controller.seed);

    let store = WavStore::new(config.audio.sample_rate);
    let clean = store
        .read_samples(clean_file)
        .with_context(|| format!("Failed to read {}", clean_file.display()))?;
    let noise = store
        .read_samples(noise_file)
        .with_context(|| format!("Failed to read {}", noise_file.display()))?;

    let mixer = NoiseMixer::new(MixParameters::new(intensity, jitter)?);
    let mixed = mixer.mix(&clean, &noise, &mut rng_from(seed));
    store.write_samples(out_file, &mixed)?;

    let snr = sig_to_noise_ratio_db(&clean[..mixed.len()], &mixed);
    info!(samples = mixed.len(), snr_db = snr, "mixed");
    println!(
        "Mixed {} + {} * {} -> {} ({} samples, SNR {:.2} dB)",
        clean_file.display(),
        noise_file.display(),
        intensity,
        out_file.display(),
        mixed.len(),
        snr
    );
    Ok(())
}

fn handle_dataset(m: &ArgMatches, config: &Config) -> Result<()> {
    let mixed_file = m.get_one::<PathBuf>("mixed").context("missing mixed file")?;
    let clean_file = m.get_one::<PathBuf>("clean").context("missing clean file")?;
    let out_file = m.get_one::<PathBuf>("out-file").context("missing output path")?;
    let input_width = m
        .get_one::<usize>("input-width")
        .copied()
        .unwrap_or(config.training.layers.input);
    let output_width = m
        .get_one::<usize>("output-width")
        .copied()
        .unwrap_or(config.training.layers.output);

    let store = WavStore::new(config.audio.sample_rate);
    let mixed = store.read_samples(mixed_file)?;
    let clean = store.read_samples(clean_file)?;

    let builder = DatasetBuilder::new(input_width, output_width, config.training.normalization())?;
    let dataset = builder.build(&mixed, &clean)?;
    let file = File::create(out_file)
        .with_context(|| format!("Failed to create {}", out_file.display()))?;
    dataset.write_csv(file)?;

    println!(
        "{:?} dataset: {} rows ({} -> {}) -> {}",
        dataset.layout().mode(),
        dataset.len(),
        input_width,
        output_width,
        out_file.display()
    );
    Ok(())
}

fn handle_config(config: &Config) -> Result<()> {
    print!("{}", config.to_toml_string()?);
    Ok(())
}
