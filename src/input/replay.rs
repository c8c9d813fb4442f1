//! CSV replay of recorded input
//!
//! A replay file has a `ts_ms,event,key` header and one row per event:
//!
//! ```text
//! ts_ms,event,key
//! 0,press,A
//! 400,press,D
//! 500,release,A
//! 650,click,
//! ```
//!
//! `event` is one of `press`, `release`, `click` (left button) or
//! `rclick`. Timestamps must not decrease.

use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::info;

use super::listener::{Handled, InputListener};
use super::{InputEvent, MouseButton};
use crate::engine::{FinalClassification, Timestamp};

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read replay: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: unknown event '{event}'")]
    UnknownEvent { line: u64, event: String },
    #[error("line {line}: '{event}' needs a key")]
    MissingKey { line: u64, event: String },
    #[error("line {line}: timestamp {ts} is before previous timestamp {previous}")]
    NonMonotonic {
        line: u64,
        ts: Timestamp,
        previous: Timestamp,
    },
}

#[derive(Debug, Deserialize)]
struct ReplayRecord {
    ts_ms: Timestamp,
    event: String,
    #[serde(default)]
    key: Option<String>,
}

/// Read replay events from a CSV file
pub fn read_file(path: &Path) -> Result<Vec<InputEvent>, ReplayError> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    parse(reader)
}

/// Read replay events from any CSV source
pub fn read_from<R: Read>(source: R) -> Result<Vec<InputEvent>, ReplayError> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);
    parse(reader)
}

fn parse<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<InputEvent>, ReplayError> {
    let mut events = Vec::new();
    let mut previous: Option<Timestamp> = None;

    for result in reader.deserialize::<ReplayRecord>() {
        let record = result?;
        // Header is line 1
        let line = events.len() as u64 + 2;

        if let Some(previous) = previous.filter(|&p| record.ts_ms < p) {
            return Err(ReplayError::NonMonotonic {
                line,
                ts: record.ts_ms,
                previous,
            });
        }
        previous = Some(record.ts_ms);

        let key = record.key.filter(|k| !k.is_empty());
        let ts = record.ts_ms;
        let event = match (record.event.to_lowercase().as_str(), key) {
            ("press", Some(key)) => InputEvent::KeyDown { key, ts },
            ("release", Some(key)) => InputEvent::KeyUp { key, ts },
            ("click", _) => InputEvent::Click {
                button: MouseButton::Left,
                pressed: true,
                ts,
            },
            ("rclick", _) => InputEvent::Click {
                button: MouseButton::Right,
                pressed: true,
                ts,
            },
            ("press" | "release", None) => {
                return Err(ReplayError::MissingKey {
                    line,
                    event: record.event,
                })
            }
            _ => {
                return Err(ReplayError::UnknownEvent {
                    line,
                    event: record.event,
                })
            }
        };
        events.push(event);
    }

    Ok(events)
}

/// Feed events through the listener, returning every graded shot in order
pub fn run(listener: &InputListener, events: &[InputEvent]) -> Vec<(Timestamp, FinalClassification)> {
    let mut shots = Vec::new();
    for event in events {
        match listener.handle(event) {
            Handled::Shot(classification) => shots.push((event.ts(), classification)),
            Handled::Terminate => {
                info!("Replay stopped by terminate hotkey at {}", event.ts());
                break;
            }
            _ => {}
        }
    }
    shots
}
