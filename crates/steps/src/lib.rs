//! Step Registry: the ordered, immutable list of tutorial steps.
//!
//! # Invariants
//! - A registry is never empty.
//! - Step indices are contiguous from 0 and match their position.
//! - Every step has a non-empty asset reference.

mod builtin;
mod registry;

pub use builtin::dobot_tutorial;
pub use registry::{RegistryError, StepContent, StepDescriptor, StepRegistry, StepSpec};

pub fn crate_info() -> &'static str {
    "arstep-steps v0.1.0"
}
