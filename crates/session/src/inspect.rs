use crate::presentation::Presentation;
use crate::session::Session;
use arstep_assets::AssetLoader;
use arstep_common::{AssetKind, AssetRef, NodeId};
use arstep_scene::{AnchorControl, SceneGraph};
use std::fmt;

/// Read-only queries over a running session, for the CLI and logs.
pub struct SessionInspector;

impl SessionInspector {
    pub fn summary<L: AssetLoader, P: Presentation>(session: &Session<L, P>) -> SessionSummary {
        let nav = session.navigator();
        let gpu = session.gpu().stats();
        SessionSummary {
            ticks: session.ticks(),
            step: nav.current(),
            step_count: nav.step_count(),
            loading: nav.pending().is_some(),
            attached: nav
                .attached()
                .and_then(|n| session.scene().object(n))
                .map(|o| o.source().clone()),
            last_error: nav.last_error().map(str::to_string),
            locked: session.lock().is_locked(),
            anchor_visible: session.scene().anchor_visible(),
            in_flight: session.loader().in_flight(),
            live_resources: session.gpu().live_count(),
            allocated: gpu.allocated,
            disposed_objects: session.disposal().totals().objects,
        }
    }

    /// The attached step object, if there is one.
    pub fn inspect_object<L: AssetLoader, P: Presentation>(
        session: &Session<L, P>,
    ) -> Option<ObjectInfo> {
        let node = session.navigator().attached()?;
        let object = session.scene().object(node)?;
        let t = object.transform();
        Some(ObjectInfo {
            node,
            source: object.source().clone(),
            kind: object.kind(),
            position: t.position.to_array(),
            yaw: t.yaw(),
            scale: t.uniform_scale(),
            meshes: object.mesh_count(),
            resources: object.gpu_handles().len(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub ticks: u64,
    pub step: usize,
    pub step_count: usize,
    pub loading: bool,
    pub attached: Option<AssetRef>,
    pub last_error: Option<String>,
    pub locked: bool,
    pub anchor_visible: bool,
    pub in_flight: usize,
    pub live_resources: usize,
    pub allocated: usize,
    pub disposed_objects: usize,
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Session: tick={} step={}/{} locked={} visible={} in_flight={} live={} allocated={} disposed={}",
            self.ticks,
            self.step + 1,
            self.step_count,
            self.locked,
            self.anchor_visible,
            self.in_flight,
            self.live_resources,
            self.allocated,
            self.disposed_objects
        )?;
        match (&self.attached, &self.last_error) {
            (Some(asset), _) => write!(f, " attached={asset}"),
            (None, Some(err)) => write!(f, " error=\"{err}\""),
            (None, None) if self.loading => f.write_str(" loading"),
            (None, None) => Ok(()),
        }
    }
}

/// Detailed info about the attached object.
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    pub node: NodeId,
    pub source: AssetRef,
    pub kind: AssetKind,
    pub position: [f32; 3],
    pub yaw: f32,
    pub scale: f32,
    pub meshes: usize,
    pub resources: usize,
}

impl fmt::Display for ObjectInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Object [{}] {} ({}) pos=({:.3}, {:.3}, {:.3}) yaw={:.2} scale={:.4} meshes={} resources={}",
            self.node.short(),
            self.source,
            self.kind,
            self.position[0],
            self.position[1],
            self.position[2],
            self.yaw,
            self.scale,
            self.meshes,
            self.resources
        )
    }
}
