use crate::gpu::{GpuError, GpuResources};
use crate::object::SceneObject;

/// What one `dispose` call (or all of them, cumulatively) released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisposeStats {
    pub objects: usize,
    pub nodes: usize,
    pub released: usize,
    pub already_released: usize,
    pub unknown: usize,
}

impl DisposeStats {
    fn absorb(&mut self, other: DisposeStats) {
        self.objects += other.objects;
        self.nodes += other.nodes;
        self.released += other.released;
        self.already_released += other.already_released;
        self.unknown += other.unknown;
    }
}

/// Releases the GPU resources of discarded scene objects.
///
/// `dispose` takes the object by value, so an instance cannot be handed in
/// twice. Handles the allocator has already freed are counted, not fatal.
#[derive(Debug, Default)]
pub struct DisposalManager {
    totals: DisposeStats,
}

impl DisposalManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk the object's subtree and release each distinct handle once.
    /// `None` is a no-op.
    pub fn dispose(
        &mut self,
        object: Option<SceneObject>,
        gpu: &mut dyn GpuResources,
    ) -> DisposeStats {
        let Some(object) = object else {
            return DisposeStats::default();
        };
        let source = object.source().clone();
        let handles = object.gpu_handles();
        let nodes = object.node_count();
        drop(object);

        let mut stats = DisposeStats {
            objects: 1,
            nodes,
            ..DisposeStats::default()
        };
        for handle in handles {
            match gpu.release(handle) {
                Ok(()) => stats.released += 1,
                Err(GpuError::AlreadyReleased(h)) => {
                    tracing::warn!(handle = %h, asset = %source, "resource already released");
                    stats.already_released += 1;
                }
                Err(GpuError::UnknownHandle(h)) => {
                    tracing::warn!(handle = %h, asset = %source, "releasing unknown resource");
                    stats.unknown += 1;
                }
            }
        }
        tracing::debug!(
            asset = %source,
            nodes = stats.nodes,
            released = stats.released,
            "disposed object"
        );
        self.totals.absorb(stats);
        stats
    }

    /// Cumulative counts over the manager's lifetime.
    pub fn totals(&self) -> DisposeStats {
        self.totals
    }
}
