/* ==================================================================================================
 *                           This file is part of the bachelor thesis project
 *                  Implementation and Analysis of Selected Noise Reduction Methods
 *                                Weronika Tarnawska (Index No. 331171)
 *                                  Supervisor:  dr hab. Paweł Woźny
 *                                  University of Wrocław, June 2025
 * ================================================================================================== */
//! Training session control.
//!
//! A session runs on its own thread. The caller steers it through
//! [`TrainingController::pause`], [`TrainingController::resume`] and
//! [`TrainingController::stop`], all of which take effect at epoch
//! boundaries, and observes it through the ordered event channel returned by
//! [`TrainingController::start`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{SystemTime, UNIX_EPOCH};

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, error, info, warn};

use crate::checkpoint::CheckpointNamer;
use crate::config::{ControllerConfig, TrainingHyperparameters};
use crate::dataset::{Dataset, DatasetBuilder};
use crate::error::{NoiseError, Result};
use crate::mixer::NoiseMixer;
use crate::network::Network;
use crate::recovery::recover_speech;
use crate::signal::Signal;

/// Lifecycle of a training session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Paused,
    Completed,
    Stopped,
    Failed,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Completed | SessionState::Stopped | SessionState::Failed
        )
    }

    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Running | SessionState::Paused)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProgressEvent {
    pub epoch: usize,
    pub total_epochs: usize,
    pub error: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecoveredSpeechEvent {
    pub epoch: usize,
    pub signal: Signal,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CheckpointEvent {
    pub epoch: usize,
    pub name: String,
    pub succeeded: bool,
}

/// Final report of a session, sent exactly once.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSummary {
    pub state: SessionState,
    pub epoch: usize,
    pub error: f64,
    /// Reason of a failed session
    pub failure: Option<String>,
}

/// Everything a session reports, in the order it happens.
#[derive(Clone, Debug, PartialEq)]
pub enum TrainingEvent {
    Progress(ProgressEvent),
    RecoveredSpeech(RecoveredSpeechEvent),
    Checkpoint(CheckpointEvent),
    Finished(SessionSummary),
}

/// Working set of one session: the sources, the current noisy mix and its dataset.
#[derive(Clone, Debug)]
pub struct TrainingData {
    speech: Signal,
    noise: Signal,
    mixed: Signal,
    dataset: Dataset,
}

impl TrainingData {
    /// Mix `noise` into `speech` and cut the result into training rows.
    pub fn prepare<R: Rng + ?Sized>(
        speech: Signal,
        noise: Signal,
        hyperparameters: &TrainingHyperparameters,
        rng: &mut R,
    ) -> Result<Self> {
        hyperparameters.validate()?;
        let mixer = NoiseMixer::new(hyperparameters.mix_parameters()?);
        let builder = DatasetBuilder::new(
            hyperparameters.layers.input,
            hyperparameters.layers.output,
            hyperparameters.normalization(),
        )?;
        let mixed = mixer.mix(&speech, &noise, rng);
        let dataset = builder.build(&mixed, &speech)?;
        Ok(Self {
            speech,
            noise,
            mixed,
            dataset,
        })
    }

    /// Assemble a working set from a dataset built elsewhere.
    pub fn new(speech: Signal, noise: Signal, mixed: Signal, dataset: Dataset) -> Self {
        Self {
            speech,
            noise,
            mixed,
            dataset,
        }
    }

    pub fn speech(&self) -> &Signal {
        &self.speech
    }

    pub fn noise(&self) -> &Signal {
        &self.noise
    }

    pub fn mixed(&self) -> &Signal {
        &self.mixed
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }
}

/// Snapshot of the running counters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Progress {
    pub epoch: usize,
    pub error: f64,
}

/// What the caller gets back once the worker has finished.
pub struct SessionOutcome<N> {
    pub summary: SessionSummary,
    pub network: N,
    pub data: TrainingData,
}

struct Control {
    state: SessionState,
    pause_requested: bool,
    stop_requested: bool,
    epoch: usize,
    error: f64,
}

impl Control {
    fn idle() -> Self {
        Self {
            state: SessionState::Idle,
            pause_requested: false,
            stop_requested: false,
            epoch: 0,
            error: 0.0,
        }
    }
}

struct Shared {
    control: Mutex<Control>,
    wake: Condvar,
}

/// Owns at most one training session at a time.
pub struct TrainingController<N: Network + 'static> {
    config: ControllerConfig,
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<SessionOutcome<N>>>>,
}

impl<N: Network + 'static> TrainingController<N> {
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            config,
            shared: Arc::new(Shared {
                control: Mutex::new(Control::idle()),
                wake: Condvar::new(),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Start training `network` on `data` in a background thread.
    ///
    /// # Returns
    /// The receiving end of the session's event channel. The channel is
    /// bounded, so the caller has to drain it (or drop it) for training to
    /// keep going.
    pub fn start(
        &self,
        hyperparameters: TrainingHyperparameters,
        data: TrainingData,
        network: N,
    ) -> Result<Receiver<TrainingEvent>> {
        let mut control = self.shared.control.lock();
        if control.state != SessionState::Idle {
            return Err(NoiseError::AlreadyRunning);
        }
        hyperparameters.validate()?;
        check_compatibility(&hyperparameters, &data, &network)?;

        let builder = DatasetBuilder::new(
            hyperparameters.layers.input,
            hyperparameters.layers.output,
            hyperparameters.normalization(),
        )?;
        let mixer = NoiseMixer::new(hyperparameters.mix_parameters()?);
        let rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let session_id = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let (sender, receiver) = bounded(self.config.channel_capacity.max(1));

        let epoch_loop = EpochLoop {
            namer: CheckpointNamer::new(hyperparameters.clone(), session_id),
            hyperparameters,
            data,
            network,
            builder,
            mixer,
            rng,
            checkpoint_dir: self.config.checkpoint_dir.clone(),
            emit_recovered_speech: self.config.emit_recovered_speech,
            events: sender,
            shared: Arc::clone(&self.shared),
        };

        // the worker blocks on the control lock until this function returns
        let handle = thread::Builder::new()
            .name("training".to_string())
            .spawn(move || epoch_loop.run())
            .map_err(|e| {
                NoiseError::ResourceExhausted(format!("cannot spawn training thread: {}", e))
            })?;

        *control = Control::idle();
        control.state = SessionState::Running;
        *self.worker.lock() = Some(handle);
        info!(session_id, "training session started");
        Ok(receiver)
    }

    /// Park the session at the next epoch boundary. A no-op when already paused.
    pub fn pause(&self) -> Result<()> {
        let mut control = self.shared.control.lock();
        match control.state {
            SessionState::Running => {
                control.pause_requested = true;
                control.state = SessionState::Paused;
                debug!(epoch = control.epoch, "training paused");
                Ok(())
            }
            SessionState::Paused => Ok(()),
            _ => Err(NoiseError::NoActiveSession),
        }
    }

    /// Continue a paused session. A no-op when already running.
    pub fn resume(&self) -> Result<()> {
        let mut control = self.shared.control.lock();
        match control.state {
            SessionState::Paused => {
                control.pause_requested = false;
                control.state = SessionState::Running;
                self.shared.wake.notify_all();
                debug!(epoch = control.epoch, "training resumed");
                Ok(())
            }
            SessionState::Running => Ok(()),
            _ => Err(NoiseError::NoActiveSession),
        }
    }

    /// Ask the session to stop once the current epoch has finished.
    ///
    /// A worker blocked on a full event channel only sees the request after
    /// the receiver has been drained or dropped.
    pub fn stop(&self) -> Result<()> {
        let mut control = self.shared.control.lock();
        if !control.state.is_active() {
            return Err(NoiseError::NoActiveSession);
        }
        control.stop_requested = true;
        self.shared.wake.notify_all();
        debug!(epoch = control.epoch, "training stop requested");
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        self.shared.control.lock().state
    }

    pub fn progress(&self) -> Progress {
        let control = self.shared.control.lock();
        Progress {
            epoch: control.epoch,
            error: control.error,
        }
    }

    /// Block until the worker has finished and take back the trained network.
    ///
    /// Drain or drop the event receiver first: with more than
    /// `channel_capacity` undelivered events the worker never finishes.
    /// A panic inside the network ends the session as `Failed` and is
    /// reported on the channel; `WorkerPanicked` is left for a panic outside
    /// the epoch loop.
    pub fn wait(&self) -> Result<SessionOutcome<N>> {
        let handle = self
            .worker
            .lock()
            .take()
            .ok_or(NoiseError::NoActiveSession)?;
        handle.join().map_err(|_| {
            let mut control = self.shared.control.lock();
            control.state = SessionState::Failed;
            error!("training worker panicked");
            NoiseError::WorkerPanicked
        })
    }

    /// Archive a finished session so that a new one can be started.
    pub fn reset(&self) -> Result<()> {
        let mut control = self.shared.control.lock();
        if control.state.is_active() {
            return Err(NoiseError::AlreadyRunning);
        }
        *control = Control::idle();
        self.worker.lock().take();
        Ok(())
    }
}

impl<N: Network + 'static> Drop for TrainingController<N> {
    fn drop(&mut self) {
        let mut control = self.shared.control.lock();
        if control.state.is_active() {
            control.stop_requested = true;
            self.shared.wake.notify_all();
        }
    }
}

fn check_compatibility<N: Network>(
    hyperparameters: &TrainingHyperparameters,
    data: &TrainingData,
    network: &N,
) -> Result<()> {
    let layout = data.dataset.layout();
    let layers = &hyperparameters.layers;
    if layout.input_width != layers.input || layout.output_width != layers.output {
        return Err(NoiseError::InvalidParameter(format!(
            "dataset rows {}/{} do not match layers {}/{}",
            layout.input_width, layout.output_width, layers.input, layers.output
        )));
    }
    if data.dataset.normalization() != hyperparameters.normalization() {
        return Err(NoiseError::InvalidParameter(
            "dataset was normalized with a different input transform".to_string(),
        ));
    }
    let descriptor = network.descriptor();
    if descriptor.input_width() != layers.input || descriptor.output_width() != layers.output {
        return Err(NoiseError::InvalidParameter(format!(
            "network layers {:?} do not match configured layers {:?}",
            descriptor.layer_widths,
            layers.to_vec()
        )));
    }
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// True every `interval` epochs; an interval of zero never fires.
fn interval_elapsed(epoch: usize, interval: usize) -> bool {
    interval > 0 && epoch % interval == 0
}

enum Boundary {
    Continue,
    Completed,
    Stopped,
}

struct EpochLoop<N> {
    hyperparameters: TrainingHyperparameters,
    data: TrainingData,
    network: N,
    builder: DatasetBuilder,
    mixer: NoiseMixer,
    rng: StdRng,
    namer: CheckpointNamer,
    checkpoint_dir: PathBuf,
    emit_recovered_speech: bool,
    events: Sender<TrainingEvent>,
    shared: Arc<Shared>,
}

impl<N: Network> EpochLoop<N> {
    fn run(mut self) -> SessionOutcome<N> {
        let (state, failure) = match panic::catch_unwind(AssertUnwindSafe(|| self.train())) {
            Ok(end) => end,
            Err(payload) => {
                let reason = format!("training worker panicked: {}", panic_message(payload.as_ref()));
                error!("{}", reason);
                (SessionState::Failed, Some(reason))
            }
        };

        // counters of the last completed epoch
        let (epoch, error) = {
            let mut control = self.shared.control.lock();
            control.state = state;
            (control.epoch, control.error)
        };
        let summary = SessionSummary {
            state,
            epoch,
            error,
            failure,
        };
        info!(state = ?summary.state, epoch, error, "training session finished");
        self.emit(TrainingEvent::Finished(summary.clone()));

        SessionOutcome {
            summary,
            network: self.network,
            data: self.data,
        }
    }

    /// Run epochs until the session completes, is stopped or fails.
    fn train(&mut self) -> (SessionState, Option<String>) {
        let total_epochs = self.hyperparameters.epochs;
        let mut epoch = 0;

        loop {
            match self.boundary(epoch, total_epochs) {
                Boundary::Completed => break (SessionState::Completed, None),
                Boundary::Stopped => break (SessionState::Stopped, None),
                Boundary::Continue => {}
            }

            let error = match self
                .network
                .run_epoch(self.data.dataset.inputs(), self.data.dataset.targets())
            {
                Ok(epoch_error) => {
                    epoch += 1;
                    epoch_error
                }
                Err(e) => {
                    error!(epoch, "training epoch failed: {}", e);
                    break (SessionState::Failed, Some(e.to_string()));
                }
            };

            {
                let mut control = self.shared.control.lock();
                control.epoch = epoch;
                control.error = error;
            }
            debug!(epoch, total_epochs, error, "epoch finished");
            self.emit(TrainingEvent::Progress(ProgressEvent {
                epoch,
                total_epochs,
                error,
            }));

            if interval_elapsed(epoch, self.hyperparameters.checkpoint_interval) {
                self.checkpoint(epoch, error);
            }

            if self.emit_recovered_speech {
                let signal = recover_speech(&self.network, &self.data.dataset);
                self.emit(TrainingEvent::RecoveredSpeech(RecoveredSpeechEvent {
                    epoch,
                    signal,
                }));
            }

            if interval_elapsed(epoch, self.hyperparameters.reshuffle_interval) {
                if let Err(e) = self.reshuffle() {
                    warn!(epoch, "keeping previous noise realization: {}", e);
                }
            }
        }
    }

    /// Decide what happens before the next epoch, parking while paused.
    fn boundary(&self, epoch: usize, total_epochs: usize) -> Boundary {
        let mut control = self.shared.control.lock();
        if epoch == total_epochs {
            return Boundary::Completed;
        }
        while control.pause_requested && !control.stop_requested {
            self.shared.wake.wait(&mut control);
        }
        if control.stop_requested {
            return Boundary::Stopped;
        }
        Boundary::Continue
    }

    fn checkpoint(&self, epoch: usize, error: f64) {
        let path = self.namer.path(&self.checkpoint_dir, epoch, error);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let succeeded = match self.network.save(&path) {
            Ok(()) => {
                info!(epoch, checkpoint = %path.display(), "network saved");
                true
            }
            Err(e) => {
                let e = match e {
                    NoiseError::PersistenceFailure(_) => e,
                    other => NoiseError::PersistenceFailure(other.to_string()),
                };
                warn!(epoch, checkpoint = %path.display(), "{}", e);
                false
            }
        };
        self.emit(TrainingEvent::Checkpoint(CheckpointEvent {
            epoch,
            name,
            succeeded,
        }));
    }

    /// Draw a fresh noise window and refill the dataset inputs with it.
    fn reshuffle(&mut self) -> Result<()> {
        let mixed = self
            .mixer
            .mix(&self.data.speech, &self.data.noise, &mut self.rng);
        self.builder.rebuild_inputs(&mut self.data.dataset, &mixed)?;
        self.data.mixed = mixed;
        debug!("training inputs reshuffled with new noise");
        Ok(())
    }

    fn emit(&self, event: TrainingEvent) {
        // a caller that dropped the receiver is not interested in events
        if self.events.send(event).is_err() {
            debug!("event receiver dropped");
        }
    }
}
