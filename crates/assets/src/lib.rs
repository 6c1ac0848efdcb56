//! Asset pipeline: loading step assets into scene objects and releasing them.
//!
//! Loads are requested with a [`LoadTicket`] and delivered later through
//! [`AssetLoader::poll`]. Every GPU resource an object holds is allocated
//! through [`GpuResources`] and returned by [`DisposalManager::dispose`].
//!
//! # Invariants
//! - A failed parse allocates nothing.
//! - Disposal releases each distinct handle of an object exactly once.

mod dispose;
mod file_loader;
mod gltf_loader;
mod gpu;
mod image_loader;
mod loader;
mod memory;
mod object;
mod plan;

pub use dispose::{DisposalManager, DisposeStats};
pub use file_loader::{AssetId, FileAssetLoader, LoaderStats};
pub use gpu::{GpuError, GpuHandle, GpuResources, LedgerStats, ResourceKind, ResourceLedger};
pub use loader::{AssetLoader, LoadCompletion, LoadError, LoadRequest, LoadTicket};
pub use memory::{MemoryAsset, MemoryLoader};
pub use object::{Geometry, MaterialPart, MeshPart, SceneNode, SceneObject};
pub use plan::IMAGE_PLANE_SIZE;

pub fn crate_info() -> &'static str {
    "arstep-assets v0.1.0"
}
