use std::collections::BTreeMap;
use std::fmt;

/// Opaque handle to a GPU-resident resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GpuHandle(pub u64);

impl fmt::Display for GpuHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gpu#{}", self.0)
    }
}

/// What a handle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    VertexBuffer,
    IndexBuffer,
    Texture,
    Program,
}

/// Errors from releasing GPU resources.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GpuError {
    #[error("{0} was already released")]
    AlreadyReleased(GpuHandle),
    #[error("{0} was never allocated")]
    UnknownHandle(GpuHandle),
}

/// The renderer's resource allocator, as seen by loaders and disposal.
pub trait GpuResources {
    /// Allocate a resource and return its handle.
    fn allocate(&mut self, kind: ResourceKind, label: &str) -> GpuHandle;

    /// Release a resource. Releasing twice is an error, not a crash.
    fn release(&mut self, handle: GpuHandle) -> Result<(), GpuError>;

    /// Whether a draw may reference this handle.
    fn is_live(&self, handle: GpuHandle) -> bool;
}

#[derive(Debug, Clone)]
struct LedgerEntry {
    kind: ResourceKind,
    label: String,
}

/// Allocation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerStats {
    pub allocated: usize,
    pub released: usize,
    pub live: usize,
}

/// Bookkeeping allocator that tracks every live handle.
///
/// Stands in for a real GPU device in tools and tests, and lets renderers
/// verify they never draw with a released resource. Handles are issued in
/// sequence, so a released handle is one that was issued and is not live;
/// memory stays proportional to the live set.
#[derive(Debug, Default)]
pub struct ResourceLedger {
    next_handle: u64,
    live: BTreeMap<GpuHandle, LedgerEntry>,
    released: usize,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            allocated: self.live.len() + self.released,
            released: self.released,
            live: self.live.len(),
        }
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Live handles of one kind.
    pub fn live_of_kind(&self, kind: ResourceKind) -> usize {
        self.live.values().filter(|e| e.kind == kind).count()
    }

    pub fn label(&self, handle: GpuHandle) -> Option<&str> {
        self.live.get(&handle).map(|e| e.label.as_str())
    }

    fn was_issued(&self, handle: GpuHandle) -> bool {
        (1..=self.next_handle).contains(&handle.0)
    }
}

impl GpuResources for ResourceLedger {
    fn allocate(&mut self, kind: ResourceKind, label: &str) -> GpuHandle {
        self.next_handle += 1;
        let handle = GpuHandle(self.next_handle);
        self.live.insert(
            handle,
            LedgerEntry {
                kind,
                label: label.to_string(),
            },
        );
        tracing::trace!(%handle, ?kind, label, "allocated");
        handle
    }

    fn release(&mut self, handle: GpuHandle) -> Result<(), GpuError> {
        if self.live.remove(&handle).is_some() {
            self.released += 1;
            tracing::trace!(%handle, "released");
            Ok(())
        } else if self.was_issued(handle) {
            Err(GpuError::AlreadyReleased(handle))
        } else {
            Err(GpuError::UnknownHandle(handle))
        }
    }

    fn is_live(&self, handle: GpuHandle) -> bool {
        self.live.contains_key(&handle)
    }
}
