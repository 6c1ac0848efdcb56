use crate::graph::{AnchorControl, AnchorScene};
use arstep_assets::{GpuHandle, GpuResources, SceneNode};
use arstep_common::NodeId;
use glam::Mat4;
use std::fmt::Write as _;

/// One mesh ready for submission to a GPU backend.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub node: NodeId,
    pub name: String,
    pub world: Mat4,
    pub vertex_buffer: GpuHandle,
    pub index_buffer: Option<GpuHandle>,
    pub program: GpuHandle,
    pub texture: Option<GpuHandle>,
    pub emissive: [f32; 3],
}

/// Errors raised while building a frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("node '{node}' references released resource {handle}")]
    DanglingResource { node: String, handle: GpuHandle },
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads the scene and the resource allocator, then produces
/// output. It never mutates the scene.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame.
    fn render(&self, scene: &AnchorScene, resources: &dyn GpuResources) -> Self::Output;
}

/// Flattens the anchored scene into draw calls, checking every handle.
#[derive(Debug, Default)]
pub struct DrawListRenderer;

impl DrawListRenderer {
    pub fn new() -> Self {
        Self
    }
}

fn collect(
    node: &SceneNode,
    parent: Mat4,
    resources: &dyn GpuResources,
    out: &mut Vec<DrawCall>,
) -> Result<(), RenderError> {
    let world = parent * node.transform.to_matrix();
    for mesh in &node.meshes {
        if let Some(handle) = mesh.handles().find(|h| !resources.is_live(*h)) {
            return Err(RenderError::DanglingResource {
                node: node.name.clone(),
                handle,
            });
        }
        out.push(DrawCall {
            node: node.id,
            name: node.name.clone(),
            world,
            vertex_buffer: mesh.geometry.vertex_buffer,
            index_buffer: mesh.geometry.index_buffer,
            program: mesh.material.program,
            texture: mesh.material.map,
            emissive: mesh.material.emissive,
        });
    }
    for child in &node.children {
        collect(child, world, resources, out)?;
    }
    Ok(())
}

impl Renderer for DrawListRenderer {
    type Output = Result<Vec<DrawCall>, RenderError>;

    fn render(&self, scene: &AnchorScene, resources: &dyn GpuResources) -> Self::Output {
        let mut calls = Vec::new();
        if !scene.anchor_visible() {
            return Ok(calls);
        }
        let anchor = scene.anchor_matrix();
        for object in scene.attached() {
            collect(object.root(), anchor, resources, &mut calls)?;
        }
        Ok(calls)
    }
}

/// Debug text renderer for the CLI.
///
/// Produces a human-readable summary of the anchor and every draw call.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &AnchorScene, resources: &dyn GpuResources) -> String {
        let mut out = String::new();
        let t = scene.anchor_matrix().w_axis;
        let _ = writeln!(
            out,
            "=== Anchor (mode={:?}, visible={}) at ({:.2}, {:.2}, {:.2}) ===",
            scene.anchor_mode(),
            scene.anchor_visible(),
            t.x,
            t.y,
            t.z
        );
        let _ = writeln!(out, "Objects: {}", scene.attached_count());
        for object in scene.attached() {
            let tr = object.transform();
            let _ = writeln!(
                out,
                "  [{}] {} ({}) pos=({:.3}, {:.3}, {:.3}) scale={:.4} meshes={}",
                object.id().short(),
                object.source(),
                object.kind(),
                tr.position.x,
                tr.position.y,
                tr.position.z,
                tr.uniform_scale(),
                object.mesh_count()
            );
        }
        match DrawListRenderer.render(scene, resources) {
            Ok(calls) => {
                let _ = writeln!(out, "Draw calls: {}", calls.len());
                for call in calls.iter().filter(|c| c.emissive != [0.0; 3]) {
                    let _ = writeln!(out, "  highlighted: {}", call.name);
                }
            }
            Err(e) => {
                let _ = writeln!(out, "Draw error: {e}");
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::SceneGraph;
    use arstep_assets::{
        AssetLoader, DisposalManager, LoadTicket, LoadRequest, MemoryAsset, MemoryLoader,
        ResourceLedger,
    };
    use arstep_common::{AssetKind, AssetRef};
    use glam::Vec3;

    fn loaded(gpu: &mut ResourceLedger) -> arstep_assets::SceneObject {
        let mut loader = MemoryLoader::new().with_asset(
            "robot.glb",
            MemoryAsset::Model {
                parts: vec!["base".into(), "arm".into()],
            },
        );
        loader.request(LoadRequest {
            ticket: LoadTicket {
                step: 0,
                generation: 1,
            },
            asset: AssetRef::from("robot.glb"),
            kind: AssetKind::Model,
        });
        loader.poll(gpu).remove(0).result.unwrap()
    }

    #[test]
    fn hidden_anchor_draws_nothing() {
        let mut gpu = ResourceLedger::new();
        let mut scene = AnchorScene::new();
        let anchor = scene.anchor();
        scene.attach(anchor, loaded(&mut gpu)).unwrap();
        assert!(DrawListRenderer.render(&scene, &gpu).unwrap().is_empty());
    }

    #[test]
    fn visible_anchor_draws_every_mesh_in_anchor_space() {
        let mut gpu = ResourceLedger::new();
        let mut scene = AnchorScene::new();
        let anchor = scene.anchor();
        scene.attach(anchor, loaded(&mut gpu)).unwrap();
        scene.set_anchor_visible(true);
        scene.set_anchor_matrix(Mat4::from_translation(Vec3::new(0.0, 0.0, -2.0)));

        let calls = DrawListRenderer.render(&scene, &gpu).unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].world.w_axis.z, -2.0);
    }

    #[test]
    fn disposed_object_is_never_drawn() {
        let mut gpu = ResourceLedger::new();
        let mut scene = AnchorScene::new();
        let anchor = scene.anchor();
        let node = scene.attach(anchor, loaded(&mut gpu)).unwrap();
        scene.set_anchor_visible(true);

        let old = scene.detach(anchor, node);
        DisposalManager::new().dispose(old, &mut gpu);
        assert!(DrawListRenderer.render(&scene, &gpu).unwrap().is_empty());
    }

    #[test]
    fn dangling_handle_is_reported() {
        let mut gpu = ResourceLedger::new();
        let mut scene = AnchorScene::new();
        let anchor = scene.anchor();
        let object = loaded(&mut gpu);
        let handle = *object.gpu_handles().iter().next().unwrap();
        scene.attach(anchor, object).unwrap();
        scene.set_anchor_visible(true);
        gpu.release(handle).unwrap();

        assert!(matches!(
            DrawListRenderer.render(&scene, &gpu),
            Err(RenderError::DanglingResource { .. })
        ));
    }

    #[test]
    fn debug_text_mentions_objects() {
        let mut gpu = ResourceLedger::new();
        let mut scene = AnchorScene::new();
        let anchor = scene.anchor();
        scene.attach(anchor, loaded(&mut gpu)).unwrap();
        let text = DebugTextRenderer::new().render(&scene, &gpu);
        assert!(text.contains("Objects: 1"));
        assert!(text.contains("robot.glb"));
        assert!(text.contains("Draw calls: 0"));
    }
}
