use arstep_assets::SceneObject;
use arstep_common::NodeId;
use glam::Mat4;

/// How the anchor's world transform is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnchorMode {
    /// The tracker writes the anchor transform every frame.
    #[default]
    Tracked,
    /// The anchor keeps whatever transform was last set; tracking is ignored.
    Manual,
}

/// Errors from scene graph edits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    #[error("unknown parent node {0:?}")]
    UnknownParent(NodeId),
    #[error("node {0:?} is already attached")]
    AlreadyAttached(NodeId),
}

/// An attach the graph refused. The object comes back so it can be disposed.
#[derive(Debug)]
pub struct Rejected {
    pub error: SceneError,
    pub object: SceneObject,
}

/// Attach/detach interface the navigator drives.
///
/// Attached objects are owned by the graph; `detach` hands ownership back so
/// the caller can dispose them.
pub trait SceneGraph {
    /// The node marker-anchored content hangs from.
    fn anchor(&self) -> NodeId;

    fn attach(&mut self, parent: NodeId, object: SceneObject) -> Result<NodeId, Rejected>;

    fn detach(&mut self, parent: NodeId, node: NodeId) -> Option<SceneObject>;

    fn object(&self, node: NodeId) -> Option<&SceneObject>;

    fn object_mut(&mut self, node: NodeId) -> Option<&mut SceneObject>;
}

/// Anchor state the pose-lock controller writes.
pub trait AnchorControl {
    fn anchor_matrix(&self) -> Mat4;
    fn set_anchor_matrix(&mut self, matrix: Mat4);
    fn anchor_mode(&self) -> AnchorMode;
    fn set_anchor_mode(&mut self, mode: AnchorMode);
    fn anchor_visible(&self) -> bool;
    fn set_anchor_visible(&mut self, visible: bool);
}

/// A scene with a single marker anchor and the objects attached to it.
#[derive(Debug)]
pub struct AnchorScene {
    anchor: NodeId,
    matrix: Mat4,
    mode: AnchorMode,
    visible: bool,
    children: Vec<SceneObject>,
}

impl Default for AnchorScene {
    fn default() -> Self {
        Self::new()
    }
}

impl AnchorScene {
    /// A hidden, tracked anchor at the origin with nothing attached.
    pub fn new() -> Self {
        Self {
            anchor: NodeId::new(),
            matrix: Mat4::IDENTITY,
            mode: AnchorMode::Tracked,
            visible: false,
            children: Vec::new(),
        }
    }

    pub fn attached(&self) -> &[SceneObject] {
        &self.children
    }

    pub fn attached_count(&self) -> usize {
        self.children.len()
    }
}

impl SceneGraph for AnchorScene {
    fn anchor(&self) -> NodeId {
        self.anchor
    }

    fn attach(&mut self, parent: NodeId, object: SceneObject) -> Result<NodeId, Rejected> {
        let id = object.id();
        let error = if parent != self.anchor {
            Some(SceneError::UnknownParent(parent))
        } else if self.children.iter().any(|c| c.id() == id) {
            Some(SceneError::AlreadyAttached(id))
        } else {
            None
        };
        if let Some(error) = error {
            return Err(Rejected { error, object });
        }
        tracing::debug!(node = %id.short(), asset = %object.source(), "attached to anchor");
        self.children.push(object);
        Ok(id)
    }

    fn detach(&mut self, parent: NodeId, node: NodeId) -> Option<SceneObject> {
        if parent != self.anchor {
            return None;
        }
        let pos = self.children.iter().position(|c| c.id() == node)?;
        let object = self.children.remove(pos);
        tracing::debug!(node = %node.short(), asset = %object.source(), "detached from anchor");
        Some(object)
    }

    fn object(&self, node: NodeId) -> Option<&SceneObject> {
        self.children.iter().find(|c| c.id() == node)
    }

    fn object_mut(&mut self, node: NodeId) -> Option<&mut SceneObject> {
        self.children.iter_mut().find(|c| c.id() == node)
    }
}

impl AnchorControl for AnchorScene {
    fn anchor_matrix(&self) -> Mat4 {
        self.matrix
    }

    fn set_anchor_matrix(&mut self, matrix: Mat4) {
        self.matrix = matrix;
    }

    fn anchor_mode(&self) -> AnchorMode {
        self.mode
    }

    fn set_anchor_mode(&mut self, mode: AnchorMode) {
        self.mode = mode;
    }

    fn anchor_visible(&self) -> bool {
        self.visible
    }

    fn set_anchor_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}
