//! Console overlay - prints each graded shot in the terminal
//!
//! Stands in for the on-screen overlay window. The overlay hotkeys toggle
//! visibility and change the scale, which controls how much detail is
//! printed.

use anyhow::Result;
use async_trait::async_trait;
use colored::*;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use tracing::info;

use super::display::overlay_lines;
use super::{FeedbackSink, ShotReport};
use crate::config::OverlayConfig;
use crate::engine::Label;

pub const MIN_SCALE: u8 = 1;
pub const MAX_SCALE: u8 = 4;

/// Visibility and scale shared between the hotkeys and the overlay sink
#[derive(Debug)]
pub struct OverlayState {
    visible: AtomicBool,
    scale: AtomicU8,
}

impl OverlayState {
    pub fn from_config(config: &OverlayConfig) -> Self {
        Self {
            visible: AtomicBool::new(config.enabled),
            scale: AtomicU8::new(config.scale.clamp(MIN_SCALE, MAX_SCALE)),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Relaxed)
    }

    /// Flip visibility, returning the new state
    pub fn toggle(&self) -> bool {
        let visible = !self.visible.fetch_xor(true, Ordering::Relaxed);
        info!("Overlay {}", if visible { "shown" } else { "hidden" });
        visible
    }

    pub fn scale(&self) -> u8 {
        self.scale.load(Ordering::Relaxed)
    }

    pub fn increase(&self) -> u8 {
        self.adjust(|s| s.saturating_add(1))
    }

    pub fn decrease(&self) -> u8 {
        self.adjust(|s| s.saturating_sub(1))
    }

    fn adjust(&self, f: impl Fn(u8) -> u8) -> u8 {
        let mut current = self.scale();
        loop {
            let next = f(current).clamp(MIN_SCALE, MAX_SCALE);
            match self
                .scale
                .compare_exchange(current, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => {
                    info!("Overlay scale set to {}", next);
                    return next;
                }
                Err(actual) => current = actual,
            }
        }
    }
}

impl Default for OverlayState {
    fn default() -> Self {
        Self::from_config(&OverlayConfig::default())
    }
}

/// Overlay sink writing colored lines to stdout
pub struct ConsoleOverlay {
    state: Arc<OverlayState>,
}

impl ConsoleOverlay {
    pub fn new(state: Arc<OverlayState>) -> Self {
        Self { state }
    }

    /// Lines as they would be printed, or None when hidden
    pub fn render(&self, report: &ShotReport) -> Option<Vec<String>> {
        if !self.state.is_visible() {
            return None;
        }

        let c = &report.classification;
        let scale = self.state.scale();
        let mut lines = overlay_lines(c);
        if scale == MIN_SCALE {
            lines = vec![lines.join(" | ")];
        }

        let time = chrono::Local::now().format("%H:%M:%S%.3f");
        let rendered = lines
            .into_iter()
            .enumerate()
            .map(|(i, line)| {
                let text = paint(c.label, &line, scale);
                if i == 0 && scale >= 3 {
                    format!("[{}] {} {}", time, label_tag(c.label), text)
                } else {
                    text
                }
            })
            .collect();
        Some(rendered)
    }
}

fn paint(label: Label, line: &str, scale: u8) -> String {
    let colored = match label {
        Label::CounterStrafe => line.bright_green(),
        Label::Overlap => line.bright_yellow(),
        Label::Bad => line.bright_red(),
    };
    if scale >= 2 {
        colored.bold().to_string()
    } else {
        colored.to_string()
    }
}

fn label_tag(label: Label) -> ColoredString {
    match label {
        Label::CounterStrafe => "[CS]".green(),
        Label::Overlap => "[OV]".yellow(),
        Label::Bad => "[BAD]".red(),
    }
}

#[async_trait]
impl FeedbackSink for ConsoleOverlay {
    fn name(&self) -> &str {
        "overlay"
    }

    async fn deliver(&self, report: &ShotReport) -> Result<()> {
        if let Some(lines) = self.render(report) {
            for line in lines {
                println!("{}", line);
            }
        }
        Ok(())
    }
}
