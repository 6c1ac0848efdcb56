//! Parsed, not-yet-uploaded asset descriptions.
//!
//! Parsing produces a plan without touching the GPU; `instantiate` allocates
//! every resource in one pass. A parse failure therefore never leaks handles.

use crate::gpu::{GpuHandle, GpuResources, ResourceKind};
use crate::object::{Geometry, MaterialPart, MeshPart, SceneNode, SceneObject};
use arstep_common::{AssetKind, AssetRef, Transform};
use glam::{Vec2, Vec3};

/// Width and height of the plane an instructional image is drawn on.
pub const IMAGE_PLANE_SIZE: Vec2 = Vec2::new(1.2, 0.8);

const DEFAULT_BASE_COLOR: [f32; 4] = [0.8, 0.8, 0.8, 1.0];

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MaterialPlan {
    pub name: String,
    pub base_color: [f32; 4],
    pub emissive: [f32; 3],
    pub texture: Option<usize>,
    pub double_sided: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PrimitivePlan {
    pub vertex_count: u32,
    pub index_count: Option<u32>,
    pub material: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NodePlan {
    pub name: String,
    pub transform: Transform,
    pub primitives: Vec<PrimitivePlan>,
    pub children: Vec<NodePlan>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ModelPlan {
    pub roots: Vec<NodePlan>,
    pub materials: Vec<MaterialPlan>,
    pub texture_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ImagePlan {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AssetPlan {
    Model(ModelPlan),
    Image(ImagePlan),
}

impl AssetPlan {
    pub fn instantiate(&self, gpu: &mut dyn GpuResources, source: &AssetRef) -> SceneObject {
        match self {
            Self::Model(plan) => plan.instantiate(gpu, source),
            Self::Image(plan) => plan.instantiate(gpu, source),
        }
    }
}

/// Handles shared across one model instance, created on first use.
struct SharedHandles {
    textures: Vec<Option<GpuHandle>>,
    programs: Vec<Option<GpuHandle>>,
    default_program: Option<GpuHandle>,
}

impl ModelPlan {
    fn instantiate(&self, gpu: &mut dyn GpuResources, source: &AssetRef) -> SceneObject {
        let mut shared = SharedHandles {
            textures: vec![None; self.texture_count],
            programs: vec![None; self.materials.len()],
            default_program: None,
        };
        let mut root = SceneNode::new(root_name(source));
        for node in &self.roots {
            root.children.push(self.build_node(node, gpu, &mut shared));
        }
        SceneObject::new(root, AssetKind::Model, source.clone())
    }

    fn build_node(
        &self,
        plan: &NodePlan,
        gpu: &mut dyn GpuResources,
        shared: &mut SharedHandles,
    ) -> SceneNode {
        let mut node = SceneNode::new(plan.name.clone());
        node.transform = plan.transform;
        for prim in &plan.primitives {
            let geometry = Geometry {
                vertex_buffer: gpu.allocate(ResourceKind::VertexBuffer, &plan.name),
                index_buffer: prim
                    .index_count
                    .map(|_| gpu.allocate(ResourceKind::IndexBuffer, &plan.name)),
                vertex_count: prim.vertex_count,
                index_count: prim.index_count.unwrap_or(0),
            };
            let material = self.material_part(prim.material, gpu, shared);
            node.meshes.push(MeshPart { geometry, material });
        }
        for child in &plan.children {
            node.children.push(self.build_node(child, gpu, shared));
        }
        node
    }

    fn material_part(
        &self,
        index: Option<usize>,
        gpu: &mut dyn GpuResources,
        shared: &mut SharedHandles,
    ) -> MaterialPart {
        let Some(plan) = index.and_then(|i| self.materials.get(i).map(|m| (i, m))) else {
            let program = *shared
                .default_program
                .get_or_insert_with(|| gpu.allocate(ResourceKind::Program, "default"));
            return MaterialPart {
                name: "default".into(),
                program,
                map: None,
                base_color: DEFAULT_BASE_COLOR,
                emissive: [0.0; 3],
                double_sided: false,
                transparent: false,
            };
        };
        let (i, mat) = plan;
        let program = *shared.programs[i]
            .get_or_insert_with(|| gpu.allocate(ResourceKind::Program, &mat.name));
        let map = mat.texture.and_then(|t| {
            shared
                .textures
                .get_mut(t)
                .map(|slot| *slot.get_or_insert_with(|| gpu.allocate(ResourceKind::Texture, &mat.name)))
        });
        MaterialPart {
            name: mat.name.clone(),
            program,
            map,
            base_color: mat.base_color,
            emissive: mat.emissive,
            double_sided: mat.double_sided,
            transparent: mat.base_color[3] < 1.0,
        }
    }
}

impl ImagePlan {
    fn instantiate(&self, gpu: &mut dyn GpuResources, source: &AssetRef) -> SceneObject {
        let label = source.as_str();
        let mut plane = SceneNode::new("image_plane");
        plane.transform.scale = Vec3::new(IMAGE_PLANE_SIZE.x, IMAGE_PLANE_SIZE.y, 1.0);
        plane.meshes.push(MeshPart {
            geometry: Geometry {
                vertex_buffer: gpu.allocate(ResourceKind::VertexBuffer, label),
                index_buffer: Some(gpu.allocate(ResourceKind::IndexBuffer, label)),
                vertex_count: 4,
                index_count: 6,
            },
            material: MaterialPart {
                name: format!("{}x{}", self.width, self.height),
                program: gpu.allocate(ResourceKind::Program, label),
                map: Some(gpu.allocate(ResourceKind::Texture, label)),
                base_color: [1.0; 4],
                emissive: [0.0; 3],
                double_sided: true,
                transparent: true,
            },
        });
        let mut root = SceneNode::new(root_name(source));
        root.children.push(plane);
        SceneObject::new(root, AssetKind::Image, source.clone())
    }
}

/// File stem of the asset reference, used as the object's root node name.
fn root_name(source: &AssetRef) -> String {
    let file = source.as_str().rsplit('/').next().unwrap_or(source.as_str());
    file.split('.').next().unwrap_or(file).to_string()
}
