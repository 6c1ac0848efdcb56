//! glTF 2.0 import: JSON documents and the binary GLB container.
//!
//! Only the scene structure is read (nodes, meshes, materials, accessor
//! counts). Vertex data stays in the buffers the renderer uploads itself.

use crate::loader::LoadError;
use crate::plan::{MaterialPlan, ModelPlan, NodePlan, PrimitivePlan};
use arstep_common::Transform;
use glam::{Quat, Vec3};
use gltf::{Document, Gltf, Semantic};

const MAX_DEPTH: usize = 64;

/// Parse a `.gltf` or `.glb` model. The container is detected from the
/// leading bytes, so a mislabelled extension still loads.
pub(crate) fn parse_model(data: &[u8]) -> Result<ModelPlan, LoadError> {
    let gltf = Gltf::from_slice(data).map_err(|e| LoadError::Decode(format!("glTF: {e}")))?;
    build_plan(&gltf.document)
}

fn build_plan(doc: &Document) -> Result<ModelPlan, LoadError> {
    let version = &doc.as_json().asset.version;
    if !version.starts_with("2.") {
        return Err(LoadError::Decode(format!(
            "unsupported glTF version {version}"
        )));
    }

    let roots: Vec<gltf::Node<'_>> = match doc.default_scene().or_else(|| doc.scenes().next()) {
        Some(scene) => scene.nodes().collect(),
        // No scenes: every node nobody lists as a child is a root.
        None => {
            let mut is_child = vec![false; doc.nodes().count()];
            for child in doc.nodes().flat_map(|n| n.children()) {
                if let Some(flag) = is_child.get_mut(child.index()) {
                    *flag = true;
                }
            }
            doc.nodes().filter(|n| !is_child[n.index()]).collect()
        }
    };

    let mut visited = vec![false; doc.nodes().count()];
    let roots = roots
        .iter()
        .map(|node| node_plan(node, &mut visited, 0))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ModelPlan {
        roots,
        materials: doc.materials().map(material_plan).collect(),
        texture_count: doc.textures().count(),
    })
}

fn material_plan(m: gltf::Material<'_>) -> MaterialPlan {
    let pbr = m.pbr_metallic_roughness();
    MaterialPlan {
        name: match m.name() {
            Some(name) => name.to_string(),
            None => format!("material_{}", m.index().unwrap_or_default()),
        },
        base_color: pbr.base_color_factor(),
        emissive: m.emissive_factor(),
        texture: pbr.base_color_texture().map(|info| info.texture().index()),
        double_sided: m.double_sided(),
    }
}

/// Walk one node and its subtree. glTF nodes have at most one parent, so a
/// node reached twice (shared child, repeated root, cycle) is rejected.
fn node_plan(
    node: &gltf::Node<'_>,
    visited: &mut [bool],
    depth: usize,
) -> Result<NodePlan, LoadError> {
    let index = node.index();
    if depth > MAX_DEPTH {
        return Err(LoadError::Decode(format!(
            "node hierarchy deeper than {MAX_DEPTH} at node {index}"
        )));
    }
    match visited.get_mut(index) {
        Some(seen) if !*seen => *seen = true,
        Some(_) => {
            return Err(LoadError::Decode(format!(
                "node {index} is reachable more than once"
            )));
        }
        None => return Err(LoadError::Decode(format!("node {index} out of range"))),
    }

    let primitives = match node.mesh() {
        Some(mesh) => mesh
            .primitives()
            .map(|p| primitive_plan(&p))
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    let children = node
        .children()
        .map(|child| node_plan(&child, visited, depth + 1))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(NodePlan {
        name: match node.name() {
            Some(name) => name.to_string(),
            None => format!("node_{index}"),
        },
        transform: node_transform(node),
        primitives,
        children,
    })
}

fn primitive_plan(p: &gltf::Primitive<'_>) -> Result<PrimitivePlan, LoadError> {
    let position = p
        .get(&Semantic::Positions)
        .ok_or_else(|| LoadError::Decode("primitive without POSITION attribute".into()))?;
    Ok(PrimitivePlan {
        vertex_count: accessor_count(&position)?,
        index_count: p.indices().map(|a| accessor_count(&a)).transpose()?,
        material: p.material().index(),
    })
}

fn accessor_count(accessor: &gltf::Accessor<'_>) -> Result<u32, LoadError> {
    u32::try_from(accessor.count()).map_err(|_| {
        LoadError::Decode(format!(
            "accessor {} has {} elements",
            accessor.index(),
            accessor.count()
        ))
    })
}

fn node_transform(node: &gltf::Node<'_>) -> Transform {
    let (translation, rotation, scale) = node.transform().decomposed();
    Transform {
        position: Vec3::from_array(translation),
        rotation: Quat::from_array(rotation),
        scale: Vec3::from_array(scale),
    }
}
