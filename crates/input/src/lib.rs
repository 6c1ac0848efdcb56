//! Touch input: pointer events drive the current model's transform, and short
//! command words map to navigation actions.
//!
//! # Invariants
//! - Gestures only ever change objects whose kind permits manipulation.
//! - Pinch scale always stays within the configured limits.

pub mod action;
pub mod gesture;

pub use action::{Action, ActionParseError};
pub use gesture::{GestureConfig, GestureController, GestureEffect, PointerEvent, PointerPhase};

/// Returns the crate version and name for diagnostics.
pub fn crate_info() -> &'static str {
    "arstep-input v0.1.0"
}
