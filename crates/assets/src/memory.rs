use crate::gpu::GpuResources;
use crate::loader::{AssetLoader, LoadCompletion, LoadError, LoadRequest, LoadTicket};
use crate::plan::{AssetPlan, ImagePlan, MaterialPlan, ModelPlan, NodePlan, PrimitivePlan};
use arstep_common::{AssetKind, AssetRef, Transform};
use std::collections::{BTreeMap, VecDeque};

/// An asset served from memory.
#[derive(Debug, Clone, PartialEq)]
pub enum MemoryAsset {
    /// A model with one single-mesh node per named part.
    Model { parts: Vec<String> },
    Image { width: u32, height: u32 },
    /// Every request for this asset fails to decode with this reason.
    Broken(String),
}

impl MemoryAsset {
    /// The kind this asset can be loaded as. `Broken` has none and fails
    /// whatever it is requested as.
    pub fn kind(&self) -> Option<AssetKind> {
        match self {
            Self::Model { .. } => Some(AssetKind::Model),
            Self::Image { .. } => Some(AssetKind::Image),
            Self::Broken(_) => None,
        }
    }

    fn plan(&self, asset: &AssetRef, kind: AssetKind) -> Result<AssetPlan, LoadError> {
        if self.kind().is_some_and(|k| k != kind) {
            return Err(LoadError::UnsupportedFormat {
                kind,
                extension: asset.extension().unwrap_or_default(),
            });
        }
        match self {
            Self::Model { parts } => Ok(AssetPlan::Model(ModelPlan {
                roots: parts
                    .iter()
                    .map(|name| NodePlan {
                        name: name.clone(),
                        transform: Transform::default(),
                        primitives: vec![PrimitivePlan {
                            vertex_count: 24,
                            index_count: Some(36),
                            material: Some(0),
                        }],
                        children: Vec::new(),
                    })
                    .collect(),
                materials: vec![MaterialPlan {
                    name: "memory".into(),
                    base_color: [0.8, 0.8, 0.8, 1.0],
                    emissive: [0.0; 3],
                    texture: None,
                    double_sided: false,
                }],
                texture_count: 0,
            })),
            Self::Image { width, height } => Ok(AssetPlan::Image(ImagePlan {
                width: *width,
                height: *height,
            })),
            Self::Broken(reason) => Err(LoadError::Decode(reason.clone())),
        }
    }
}

/// In-memory loader whose completion order is controlled by the caller.
///
/// In auto mode every request completes on the next `poll`. In manual mode
/// requests wait until [`MemoryLoader::release`] or
/// [`MemoryLoader::release_all`] moves them to the ready queue, which lets
/// callers deliver loads late and out of order.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    assets: BTreeMap<AssetRef, MemoryAsset>,
    waiting: Vec<LoadRequest>,
    ready: VecDeque<LoadRequest>,
    manual: bool,
    requests_seen: usize,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// A loader that holds every request until released.
    pub fn manual() -> Self {
        Self {
            manual: true,
            ..Self::default()
        }
    }

    pub fn with_asset(mut self, asset: impl Into<String>, content: MemoryAsset) -> Self {
        self.insert(asset, content);
        self
    }

    pub fn insert(&mut self, asset: impl Into<String>, content: MemoryAsset) {
        self.assets.insert(AssetRef::new(asset), content);
    }

    /// Requests not yet released, oldest first.
    pub fn waiting(&self) -> &[LoadRequest] {
        &self.waiting
    }

    pub fn requests_seen(&self) -> usize {
        self.requests_seen
    }

    /// Make one waiting request complete on the next poll.
    pub fn release(&mut self, ticket: LoadTicket) -> bool {
        let Some(pos) = self.waiting.iter().position(|r| r.ticket == ticket) else {
            return false;
        };
        let req = self.waiting.remove(pos);
        self.ready.push_back(req);
        true
    }

    pub fn release_all(&mut self) {
        self.ready.extend(self.waiting.drain(..));
    }
}

impl AssetLoader for MemoryLoader {
    fn request(&mut self, request: LoadRequest) {
        self.requests_seen += 1;
        if self.manual {
            self.waiting.push(request);
        } else {
            self.ready.push_back(request);
        }
    }

    fn poll(&mut self, gpu: &mut dyn GpuResources) -> Vec<LoadCompletion> {
        self.ready
            .drain(..)
            .map(|req| {
                let result = match self.assets.get(&req.asset) {
                    Some(content) => content
                        .plan(&req.asset, req.kind)
                        .map(|p| p.instantiate(gpu, &req.asset)),
                    None => Err(LoadError::NotFound(req.asset.clone())),
                };
                LoadCompletion {
                    ticket: req.ticket,
                    asset: req.asset,
                    result,
                }
            })
            .collect()
    }

    fn in_flight(&self) -> usize {
        self.waiting.len() + self.ready.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::ResourceLedger;
    use arstep_common::AssetKind;

    fn req(step: usize, generation: u64, asset: &str) -> LoadRequest {
        let kind = if asset.ends_with(".png") {
            AssetKind::Image
        } else {
            AssetKind::Model
        };
        LoadRequest {
            ticket: LoadTicket { step, generation },
            asset: AssetRef::from(asset),
            kind,
        }
    }

    #[test]
    fn auto_mode_completes_next_poll() {
        let mut loader = MemoryLoader::new().with_asset(
            "a.glb",
            MemoryAsset::Model {
                parts: vec!["base".into(), "arm".into()],
            },
        );
        let mut gpu = ResourceLedger::new();
        loader.request(req(0, 1, "a.glb"));
        let done = loader.poll(&mut gpu);
        assert_eq!(done.len(), 1);
        let obj = done[0].result.as_ref().unwrap();
        assert_eq!(obj.mesh_count(), 2);
        assert!(obj.root().find("arm").is_some());
    }

    #[test]
    fn manual_mode_releases_out_of_order() {
        let mut loader = MemoryLoader::manual()
            .with_asset("a.glb", MemoryAsset::Model { parts: vec![] })
            .with_asset("b.png", MemoryAsset::Image { width: 2, height: 2 });
        let mut gpu = ResourceLedger::new();
        loader.request(req(0, 1, "a.glb"));
        loader.request(req(1, 2, "b.png"));
        assert!(loader.poll(&mut gpu).is_empty());
        assert_eq!(loader.in_flight(), 2);

        assert!(loader.release(LoadTicket { step: 1, generation: 2 }));
        let done = loader.poll(&mut gpu);
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].ticket.step, 1);
        assert_eq!(loader.waiting().len(), 1);
    }

    #[test]
    fn unknown_and_broken_assets_fail() {
        let mut loader =
            MemoryLoader::new().with_asset("bad.glb", MemoryAsset::Broken("corrupt".into()));
        let mut gpu = ResourceLedger::new();
        loader.request(req(0, 1, "bad.glb"));
        loader.request(req(1, 2, "nothing.glb"));
        let done = loader.poll(&mut gpu);
        assert!(matches!(done[0].result, Err(LoadError::Decode(_))));
        assert!(matches!(done[1].result, Err(LoadError::NotFound(_))));
        assert_eq!(gpu.live_count(), 0);
    }

    #[test]
    fn kind_mismatch_is_unsupported_and_allocates_nothing() {
        let mut loader = MemoryLoader::new()
            .with_asset("a.glb", MemoryAsset::Model { parts: vec!["base".into()] })
            .with_asset("b.png", MemoryAsset::Image { width: 2, height: 2 });
        let mut gpu = ResourceLedger::new();
        let mut as_image = req(0, 1, "a.glb");
        as_image.kind = AssetKind::Image;
        let mut as_model = req(1, 2, "b.png");
        as_model.kind = AssetKind::Model;
        loader.request(as_image);
        loader.request(as_model);

        let done = loader.poll(&mut gpu);
        assert!(matches!(
            &done[0].result,
            Err(LoadError::UnsupportedFormat { kind: AssetKind::Image, extension }) if extension == "glb"
        ));
        assert!(matches!(
            done[1].result,
            Err(LoadError::UnsupportedFormat { kind: AssetKind::Model, .. })
        ));
        assert_eq!(gpu.live_count(), 0);
    }
}
