//! Tracking: consumes marker events and decides what the anchor does.
//!
//! # Invariants
//! - Under `LockPolicy::OneShot`, the anchor transform never changes after
//!   the first accepted `Found` event until `reset`.
//! - Under `LockPolicy::ContinuousFollow`, the controller is never locked.

mod pose_lock;

pub use pose_lock::{
    LockPolicy, MarkerEvent, MarkerId, MarkerStatus, PoseLockController, PoseLockState,
    TrackingOutcome,
};

pub fn crate_info() -> &'static str {
    "arstep-tracking v0.1.0"
}
