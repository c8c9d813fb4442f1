//! cStrafe - counter-strafe timing trainer
//!
//! Grades every shot by how cleanly movement was stopped before firing.
//! The [`engine`] is a pure, lock-guarded timing oracle; everything around
//! it (bindings, capture sources, overlay, sound cues, HUD broadcast) lives
//! in the collaborator modules.

pub mod api;
pub mod cli;
pub mod config;
pub mod engine;
pub mod feedback;
pub mod input;
pub mod paths;

pub use engine::{Engine, FinalClassification, Label, MovementKey, ReversalWindow};
