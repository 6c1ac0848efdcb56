//! Shared types used by every arstep crate.
//!
//! # Invariants
//! - `Transform` scale is always finite; gesture code clamps before writing.
//! - `AssetRef` is opaque to everything except the loader that resolves it.

pub mod types;

pub use types::{AssetKind, AssetRef, NodeId, Transform};

pub fn crate_info() -> &'static str {
    "arstep-common v0.1.0"
}
