//! Viewer session: step navigation, asset lifetime and the per-tick loop.
//!
//! # Invariants
//! - At most one step object is attached to the anchor at any time.
//! - Every detached object is disposed before its replacement is attached.
//! - Only the most recent load request can attach; older completions are
//!   disposed on arrival.

pub mod config;
pub mod inspect;
pub mod navigator;
pub mod presentation;
pub mod session;

pub use config::{ConfigError, DefaultTransforms, KindDefault, ViewerConfig};
pub use inspect::{ObjectInfo, SessionInspector, SessionSummary};
pub use navigator::{Completion, NavContext, StepNavigator};
pub use presentation::{Element, Presentation, PresentationError, TextPresentation};
pub use session::{Session, TickReport};

/// Returns the crate version and name for diagnostics.
pub fn crate_info() -> &'static str {
    "arstep-session v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_info_names_crate() {
        assert!(crate_info().contains("session"));
    }
}
