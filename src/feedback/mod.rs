//! Delivery of graded shots to the read-only consumers
//!
//! Capture threads hand a [`ShotReport`] to the [`FeedbackDispatcher`]
//! after the engine lock is released. Submission never blocks: when the
//! bounded queue is full or closed the report is dropped and counted. A
//! single async task fans each report out to every registered sink.

pub mod console;
pub mod display;
pub mod sound;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::engine::{FinalClassification, Timestamp};

pub use console::{ConsoleOverlay, OverlayState};
pub use display::HudPayload;
pub use sound::{Cue, SoundCueSink, VolumeMixer};

/// Default capacity of the dispatch queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// A graded shot on its way to the sinks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShotReport {
    pub timestamp: Timestamp,
    pub classification: FinalClassification,
}

/// Consumer of graded shots (overlay, sound, HUD broadcast)
///
/// Sinks run on the dispatch task, never on a capture thread. An error is
/// logged and the report moves on to the next sink.
#[async_trait]
pub trait FeedbackSink: Send + Sync {
    /// Sink name used in logs
    fn name(&self) -> &str;

    /// Deliver one report
    async fn deliver(&self, report: &ShotReport) -> Result<()>;
}

/// Non-blocking handoff from capture threads to the sinks
#[derive(Clone)]
pub struct FeedbackDispatcher {
    tx: mpsc::Sender<ShotReport>,
    dropped: Arc<AtomicU64>,
}

impl FeedbackDispatcher {
    /// Start the fan-out task on the current runtime
    ///
    /// The task ends once every dispatcher clone has been dropped and the
    /// queue is drained.
    pub fn spawn(capacity: usize, sinks: Vec<Arc<dyn FeedbackSink>>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<ShotReport>(capacity.max(1));

        let task = tokio::spawn(async move {
            while let Some(report) = rx.recv().await {
                for sink in &sinks {
                    if let Err(e) = sink.deliver(&report).await {
                        warn!("Sink '{}' failed to deliver shot: {:#}", sink.name(), e);
                    }
                }
            }
            debug!("Feedback dispatcher stopped");
        });

        (
            Self {
                tx,
                dropped: Arc::new(AtomicU64::new(0)),
            },
            task,
        )
    }

    /// Queue a report without blocking; returns false if it was dropped
    pub fn submit(&self, report: ShotReport) -> bool {
        match self.tx.try_send(report) {
            Ok(()) => true,
            Err(e) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Dropping shot report at {}: {}", report.timestamp, e);
                false
            }
        }
    }

    /// Number of reports dropped so far
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
