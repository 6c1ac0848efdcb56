use crate::gpu::GpuResources;
use crate::object::SceneObject;
use arstep_common::{AssetKind, AssetRef};
use std::fmt;

/// Identifies one load request. A completion is only accepted by the
/// navigator if its ticket equals the one it is still waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    pub step: usize,
    pub generation: u64,
}

impl fmt::Display for LoadTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} (gen {})", self.step, self.generation)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub ticket: LoadTicket,
    pub asset: AssetRef,
    pub kind: AssetKind,
}

/// Errors from loading a step asset.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("unsupported {kind} format: {extension}")]
    UnsupportedFormat { kind: AssetKind, extension: String },
    #[error("asset not found: {0}")]
    NotFound(AssetRef),
    #[error("asset path escapes the asset root: {0}")]
    InvalidPath(AssetRef),
}

/// Outcome of one request, delivered by [`AssetLoader::poll`].
#[derive(Debug)]
pub struct LoadCompletion {
    pub ticket: LoadTicket,
    pub asset: AssetRef,
    pub result: Result<SceneObject, LoadError>,
}

/// Asynchronous asset source.
///
/// `request` never blocks. Finished loads come back from `poll`, which the
/// session calls once per tick, in any order and possibly many ticks later.
/// There is no cancel: callers discard completions they no longer want.
pub trait AssetLoader {
    fn request(&mut self, request: LoadRequest);

    /// Collect finished loads. GPU resources are allocated here, on the
    /// render thread, so a completed object is ready to draw.
    fn poll(&mut self, gpu: &mut dyn GpuResources) -> Vec<LoadCompletion>;

    /// Requests accepted but not yet returned from `poll`.
    fn in_flight(&self) -> usize;
}
