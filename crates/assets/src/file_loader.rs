use crate::gltf_loader;
use crate::gpu::GpuResources;
use crate::image_loader;
use crate::loader::{AssetLoader, LoadCompletion, LoadError, LoadRequest};
use crate::object::SceneObject;
use crate::plan::AssetPlan;
use arstep_common::{AssetKind, AssetRef};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, VecDeque};
use std::path::{Component, Path, PathBuf};

/// Content-addressed id of an asset reference, used as the parse-cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(pub u64);

impl AssetId {
    pub fn for_ref(asset: &AssetRef, kind: AssetKind) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(kind.to_string().as_bytes());
        hasher.update([0u8]);
        hasher.update(asset.as_str().as_bytes());
        let result = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&result[..8]);
        AssetId(u64::from_le_bytes(bytes))
    }
}

/// Loader counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoaderStats {
    pub loaded: usize,
    pub failed: usize,
    pub cache_hits: usize,
}

/// Loads step assets from a directory on disk.
///
/// Requests queue up and are served at most `budget` per `poll`, so one tick
/// never stalls on a long backlog. Parsed plans are cached by [`AssetId`];
/// failures are not cached, so revisiting a step retries the load.
pub struct FileAssetLoader {
    root: PathBuf,
    budget: usize,
    queue: VecDeque<LoadRequest>,
    cache: BTreeMap<AssetId, AssetPlan>,
    stats: LoaderStats,
}

impl FileAssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            budget: 1,
            queue: VecDeque::new(),
            cache: BTreeMap::new(),
            stats: LoaderStats::default(),
        }
    }

    /// Maximum number of requests served per poll (at least one).
    pub fn with_budget(mut self, budget: usize) -> Self {
        self.budget = budget.max(1);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn stats(&self) -> LoaderStats {
        self.stats
    }

    /// Load one asset immediately, bypassing the queue.
    pub fn load_now(
        &mut self,
        asset: &AssetRef,
        kind: AssetKind,
        gpu: &mut dyn GpuResources,
    ) -> Result<SceneObject, LoadError> {
        let id = AssetId::for_ref(asset, kind);
        let object = match self.cache.get(&id) {
            Some(plan) => {
                self.stats.cache_hits += 1;
                plan.instantiate(gpu, asset)
            }
            None => {
                let plan = self.read_plan(asset, kind).inspect_err(|_| {
                    self.stats.failed += 1;
                })?;
                let object = plan.instantiate(gpu, asset);
                self.cache.insert(id, plan);
                object
            }
        };
        self.stats.loaded += 1;
        Ok(object)
    }

    fn resolve(&self, asset: &AssetRef) -> Result<PathBuf, LoadError> {
        let relative = Path::new(asset.as_str());
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(LoadError::InvalidPath(asset.clone()));
        }
        Ok(self.root.join(relative))
    }

    fn read_plan(&self, asset: &AssetRef, kind: AssetKind) -> Result<AssetPlan, LoadError> {
        let path = self.resolve(asset)?;
        let extension = asset.extension().unwrap_or_default();
        let unsupported = || LoadError::UnsupportedFormat {
            kind,
            extension: extension.clone(),
        };
        match (kind, extension.as_str()) {
            (AssetKind::Model, "glb" | "gltf") | (AssetKind::Image, "png") => {}
            _ => return Err(unsupported()),
        }
        let data = std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => LoadError::NotFound(asset.clone()),
            _ => LoadError::Io(e),
        })?;
        tracing::debug!(path = %path.display(), bytes = data.len(), "read asset");
        match (kind, extension.as_str()) {
            (AssetKind::Model, _) => gltf_loader::parse_model(&data).map(AssetPlan::Model),
            (AssetKind::Image, _) => image_loader::parse_png(&data).map(AssetPlan::Image),
        }
    }
}

impl AssetLoader for FileAssetLoader {
    fn request(&mut self, request: LoadRequest) {
        tracing::debug!(ticket = %request.ticket, asset = %request.asset, "queued load");
        self.queue.push_back(request);
    }

    fn poll(&mut self, gpu: &mut dyn GpuResources) -> Vec<LoadCompletion> {
        let _span = tracing::debug_span!("asset_poll", queued = self.queue.len()).entered();
        let take = self.budget.min(self.queue.len());
        let batch: Vec<LoadRequest> = self.queue.drain(..take).collect();
        batch
            .into_iter()
            .map(|req| {
                let result = self.load_now(&req.asset, req.kind, gpu);
                if let Err(e) = &result {
                    tracing::warn!(asset = %req.asset, error = %e, "asset load failed");
                }
                LoadCompletion {
                    ticket: req.ticket,
                    asset: req.asset,
                    result,
                }
            })
            .collect()
    }

    fn in_flight(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gltf_loader::tests::{ROBOT_GLTF, glb};
    use crate::gpu::ResourceLedger;
    use crate::image_loader::tests::png_bytes;
    use crate::loader::LoadTicket;

    fn fixture_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let models = dir.path().join("models");
        std::fs::create_dir_all(&models).unwrap();
        std::fs::write(models.join("robot.glb"), glb(ROBOT_GLTF)).unwrap();
        std::fs::write(models.join("robot.gltf"), ROBOT_GLTF).unwrap();
        std::fs::write(models.join("panel.png"), png_bytes(320, 200)).unwrap();
        std::fs::write(models.join("broken.glb"), b"not a container").unwrap();
        dir
    }

    fn request(step: usize, asset: &str, kind: AssetKind) -> LoadRequest {
        LoadRequest {
            ticket: LoadTicket {
                step,
                generation: step as u64 + 1,
            },
            asset: AssetRef::from(asset),
            kind,
        }
    }

    #[test]
    fn asset_id_depends_on_kind_and_ref() {
        let a = AssetId::for_ref(&AssetRef::from("x.png"), AssetKind::Image);
        let b = AssetId::for_ref(&AssetRef::from("x.png"), AssetKind::Image);
        let c = AssetId::for_ref(&AssetRef::from("y.png"), AssetKind::Image);
        let d = AssetId::for_ref(&AssetRef::from("x.png"), AssetKind::Model);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn loads_glb_gltf_and_png() {
        let dir = fixture_dir();
        let mut loader = FileAssetLoader::new(dir.path()).with_budget(8);
        let mut gpu = ResourceLedger::new();

        loader.request(request(0, "models/robot.glb", AssetKind::Model));
        loader.request(request(1, "models/robot.gltf", AssetKind::Model));
        loader.request(request(2, "models/panel.png", AssetKind::Image));
        let done = loader.poll(&mut gpu);

        assert_eq!(done.len(), 3);
        for c in &done {
            assert!(c.result.is_ok(), "{} failed", c.asset);
        }
        let robot = done[0].result.as_ref().unwrap();
        assert!(robot.root().find("power_button").is_some());
        assert_eq!(done[2].result.as_ref().unwrap().kind(), AssetKind::Image);
        assert_eq!(loader.in_flight(), 0);
    }

    #[test]
    fn budget_limits_each_poll() {
        let dir = fixture_dir();
        let mut loader = FileAssetLoader::new(dir.path()).with_budget(1);
        let mut gpu = ResourceLedger::new();
        loader.request(request(0, "models/robot.glb", AssetKind::Model));
        loader.request(request(1, "models/panel.png", AssetKind::Image));

        assert_eq!(loader.poll(&mut gpu).len(), 1);
        assert_eq!(loader.in_flight(), 1);
        assert_eq!(loader.poll(&mut gpu).len(), 1);
        assert!(loader.poll(&mut gpu).is_empty());
    }

    #[test]
    fn failures_allocate_nothing() {
        let dir = fixture_dir();
        let mut loader = FileAssetLoader::new(dir.path()).with_budget(8);
        let mut gpu = ResourceLedger::new();
        loader.request(request(0, "models/broken.glb", AssetKind::Model));
        loader.request(request(1, "models/missing.png", AssetKind::Image));
        loader.request(request(2, "models/robot.glb", AssetKind::Image));
        loader.request(request(3, "../secrets.png", AssetKind::Image));

        let done = loader.poll(&mut gpu);
        assert!(matches!(done[0].result, Err(LoadError::Decode(_))));
        assert!(matches!(done[1].result, Err(LoadError::NotFound(_))));
        assert!(matches!(done[2].result, Err(LoadError::UnsupportedFormat { .. })));
        assert!(matches!(done[3].result, Err(LoadError::InvalidPath(_))));
        assert_eq!(gpu.live_count(), 0);
        assert_eq!(loader.stats().failed, 4);
    }

    #[test]
    fn second_load_hits_cache_with_fresh_handles() {
        let dir = fixture_dir();
        let mut loader = FileAssetLoader::new(dir.path());
        let mut gpu = ResourceLedger::new();
        let asset = AssetRef::from("models/robot.glb");

        let a = loader.load_now(&asset, AssetKind::Model, &mut gpu).unwrap();
        let b = loader.load_now(&asset, AssetKind::Model, &mut gpu).unwrap();
        assert_eq!(loader.stats().cache_hits, 1);
        assert!(a.gpu_handles().is_disjoint(&b.gpu_handles()));
    }
}
