use crate::gpu::GpuHandle;
use arstep_common::{AssetKind, AssetRef, NodeId, Transform};
use std::collections::BTreeSet;

/// Vertex and index buffers for one primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub vertex_buffer: GpuHandle,
    pub index_buffer: Option<GpuHandle>,
    pub vertex_count: u32,
    pub index_count: u32,
}

/// Material state for one primitive. The program and texture handles may be
/// shared with other primitives of the same object; the colors are per copy.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialPart {
    pub name: String,
    pub program: GpuHandle,
    pub map: Option<GpuHandle>,
    pub base_color: [f32; 4],
    pub emissive: [f32; 3],
    pub double_sided: bool,
    pub transparent: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshPart {
    pub geometry: Geometry,
    pub material: MaterialPart,
}

impl MeshPart {
    /// Every GPU handle this mesh references.
    pub fn handles(&self) -> impl Iterator<Item = GpuHandle> + '_ {
        std::iter::once(self.geometry.vertex_buffer)
            .chain(self.geometry.index_buffer)
            .chain(std::iter::once(self.material.program))
            .chain(self.material.map)
    }
}

/// A named node with a local transform, zero or more meshes and children.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub id: NodeId,
    pub name: String,
    pub transform: Transform,
    pub meshes: Vec<MeshPart>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            name: name.into(),
            transform: Transform::default(),
            meshes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Depth-first visit of this node and all descendants.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a SceneNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    pub fn walk_mut(&mut self, visit: &mut impl FnMut(&mut SceneNode)) {
        visit(self);
        for child in &mut self.children {
            child.walk_mut(visit);
        }
    }

    pub fn find(&self, name: &str) -> Option<&SceneNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    fn find_mut(&mut self, name: &str) -> Option<&mut SceneNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(name))
    }
}

/// A loaded, renderable step asset: a model hierarchy or an image plane.
#[derive(Debug, PartialEq)]
pub struct SceneObject {
    root: SceneNode,
    kind: AssetKind,
    source: AssetRef,
}

impl SceneObject {
    pub fn new(root: SceneNode, kind: AssetKind, source: AssetRef) -> Self {
        Self { root, kind, source }
    }

    pub fn id(&self) -> NodeId {
        self.root.id
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    pub fn source(&self) -> &AssetRef {
        &self.source
    }

    pub fn root(&self) -> &SceneNode {
        &self.root
    }

    /// Local transform of the object relative to the anchor.
    pub fn transform(&self) -> &Transform {
        &self.root.transform
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.root.transform
    }

    pub fn node_count(&self) -> usize {
        let mut n = 0;
        self.root.walk(&mut |_| n += 1);
        n
    }

    pub fn mesh_count(&self) -> usize {
        let mut n = 0;
        self.root.walk(&mut |node| n += node.meshes.len());
        n
    }

    /// Distinct GPU handles referenced anywhere in the subtree.
    pub fn gpu_handles(&self) -> BTreeSet<GpuHandle> {
        let mut handles = BTreeSet::new();
        self.root.walk(&mut |node| {
            for mesh in &node.meshes {
                handles.extend(mesh.handles());
            }
        });
        handles
    }

    /// Reset every emissive color, then tint the meshes under the named node.
    /// Returns false when no node has that name.
    pub fn highlight(&mut self, part: &str, color: [f32; 3]) -> bool {
        self.clear_highlight();
        let Some(node) = self.root.find_mut(part) else {
            return false;
        };
        node.walk_mut(&mut |n| {
            for mesh in &mut n.meshes {
                mesh.material.emissive = color;
            }
        });
        true
    }

    pub fn clear_highlight(&mut self) {
        self.root.walk_mut(&mut |n| {
            for mesh in &mut n.meshes {
                mesh.material.emissive = [0.0; 3];
            }
        });
    }
}
