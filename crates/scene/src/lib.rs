//! Scene: the marker anchor, the step object attached to it, and rendering.
//!
//! # Invariants
//! - Renderers read the scene; they never mutate it.
//! - A draw never references a GPU handle the allocator has released.
//!
//! The GPU backend is external. `DrawListRenderer` produces the draw calls a
//! backend would submit, and `DebugTextRenderer` prints them for the CLI.

mod graph;
mod renderer;

pub use graph::{AnchorControl, AnchorMode, AnchorScene, Rejected, SceneError, SceneGraph};
pub use renderer::{DebugTextRenderer, DrawCall, DrawListRenderer, RenderError, Renderer};

pub fn crate_info() -> &'static str {
    "arstep-scene v0.1.0"
}
