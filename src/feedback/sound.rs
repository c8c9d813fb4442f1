//! Sound cues and the volume mixer
//!
//! Each verdict maps to a cue. Cues are played on a dedicated worker
//! thread fed by a bounded crossbeam channel, so a slow audio backend never
//! holds up the dispatch task. Volume hotkeys adjust the shared
//! [`VolumeMixer`] from the capture thread.

use anyhow::Result;
use async_trait::async_trait;
use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

use super::{FeedbackSink, ShotReport};
use crate::config::{SoundConfig, VolumeConfig};
use crate::engine::Label;

/// Capacity of the cue queue
const CUE_QUEUE_CAPACITY: usize = 16;

/// Sound cue played for a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    Good,
    Bad,
    Overlap,
}

impl Cue {
    pub fn for_label(label: Label) -> Cue {
        match label {
            Label::CounterStrafe => Cue::Good,
            Label::Bad => Cue::Bad,
            Label::Overlap => Cue::Overlap,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Cue::Good => "good",
            Cue::Bad => "bad",
            Cue::Overlap => "overlap",
        }
    }
}

/// Master and per-cue volumes, clamped to `[min, max]`
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeMixer {
    master: f32,
    good: f32,
    bad: f32,
    overlap: f32,
    min: f32,
    max: f32,
    step: f32,
}

impl VolumeMixer {
    pub fn from_config(config: &VolumeConfig) -> Self {
        let mut mixer = Self {
            master: config.master,
            good: config.good,
            bad: config.bad,
            overlap: config.overlap,
            min: config.min,
            max: config.max,
            step: config.step,
        };
        mixer.clamp_all();
        mixer
    }

    /// Replace levels and bounds after a config reload
    pub fn apply_config(&mut self, config: &VolumeConfig) {
        *self = Self::from_config(config);
    }

    pub fn master(&self) -> f32 {
        self.master
    }

    pub fn cue(&self, cue: Cue) -> f32 {
        match cue {
            Cue::Good => self.good,
            Cue::Bad => self.bad,
            Cue::Overlap => self.overlap,
        }
    }

    /// Gain a cue is actually played with
    pub fn effective(&self, cue: Cue) -> f32 {
        self.cue(cue) * self.master
    }

    pub fn master_up(&mut self) -> f32 {
        self.master = (self.master + self.step).min(self.max);
        info!("Master volume increased to {:.2}", self.master);
        self.master
    }

    pub fn master_down(&mut self) -> f32 {
        self.master = (self.master - self.step).max(self.min);
        info!("Master volume decreased to {:.2}", self.master);
        self.master
    }

    pub fn cue_up(&mut self, cue: Cue) -> f32 {
        let (step, max) = (self.step, self.max);
        let level = self.level_mut(cue);
        *level = (*level + step).min(max);
        let level = *level;
        info!("The {} volume increased to {:.2}", cue.name(), level);
        level
    }

    pub fn cue_down(&mut self, cue: Cue) -> f32 {
        let (step, min) = (self.step, self.min);
        let level = self.level_mut(cue);
        *level = (*level - step).max(min);
        let level = *level;
        info!("The {} volume decreased to {:.2}", cue.name(), level);
        level
    }

    fn level_mut(&mut self, cue: Cue) -> &mut f32 {
        match cue {
            Cue::Good => &mut self.good,
            Cue::Bad => &mut self.bad,
            Cue::Overlap => &mut self.overlap,
        }
    }

    fn clamp_all(&mut self) {
        let (min, max) = (self.min, self.max);
        for level in [&mut self.master, &mut self.good, &mut self.bad, &mut self.overlap] {
            *level = level.clamp(min, max);
        }
    }
}

/// One cue to play
#[derive(Debug, Clone, PartialEq)]
pub struct CueRequest {
    pub cue: Cue,
    pub path: PathBuf,
    pub volume: f32,
}

/// Audio output used by the cue worker
pub trait CuePlayer: Send + 'static {
    fn play(&mut self, request: &CueRequest) -> Result<()>;
}

/// Backend that only logs the cue it would play
#[derive(Debug, Default)]
pub struct LogPlayer;

impl CuePlayer for LogPlayer {
    fn play(&mut self, request: &CueRequest) -> Result<()> {
        info!(
            "🔊 {} cue ({}) at volume {:.2}",
            request.cue.name(),
            request.path.display(),
            request.volume
        );
        Ok(())
    }
}

/// Sink turning verdicts into cue requests for the worker thread
pub struct SoundCueSink {
    mixer: Arc<Mutex<VolumeMixer>>,
    sounds: SoundConfig,
    tx: Sender<CueRequest>,
}

impl SoundCueSink {
    /// Start the cue worker with the given backend
    ///
    /// The worker exits once the sink is dropped.
    pub fn spawn<P: CuePlayer>(
        mixer: Arc<Mutex<VolumeMixer>>,
        sounds: SoundConfig,
        player: P,
    ) -> Result<(Self, JoinHandle<()>)> {
        for (cue, path) in [
            (Cue::Good, &sounds.good),
            (Cue::Bad, &sounds.bad),
            (Cue::Overlap, &sounds.overlap),
        ] {
            if !Path::new(path).exists() {
                warn!("Sound file for '{}' cue not found: {}", cue.name(), path.display());
            }
        }

        let (tx, rx) = channel::bounded(CUE_QUEUE_CAPACITY);
        let worker = thread::Builder::new()
            .name("cue-worker".to_string())
            .spawn(move || run_worker(rx, player))?;

        Ok((Self { mixer, sounds, tx }, worker))
    }

    fn path_for(&self, cue: Cue) -> &Path {
        match cue {
            Cue::Good => &self.sounds.good,
            Cue::Bad => &self.sounds.bad,
            Cue::Overlap => &self.sounds.overlap,
        }
    }
}

fn run_worker<P: CuePlayer>(rx: Receiver<CueRequest>, mut player: P) {
    for request in rx {
        if let Err(e) = player.play(&request) {
            warn!("Failed to play {} cue: {:#}", request.cue.name(), e);
        }
    }
    debug!("Cue worker stopped");
}

#[async_trait]
impl FeedbackSink for SoundCueSink {
    fn name(&self) -> &str {
        "sound"
    }

    async fn deliver(&self, report: &ShotReport) -> Result<()> {
        let cue = Cue::for_label(report.classification.label);
        let request = CueRequest {
            cue,
            path: self.path_for(cue).to_path_buf(),
            volume: self.mixer.lock().effective(cue),
        };

        match self.tx.try_send(request) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                debug!("Cue queue full, skipping {} cue", cue.name());
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => anyhow::bail!("cue worker is not running"),
        }
    }
}
