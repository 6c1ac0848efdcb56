use crate::config::DefaultTransforms;
use crate::presentation::{Element, Presentation, show};
use arstep_assets::{
    AssetLoader, DisposalManager, GpuResources, LoadCompletion, LoadRequest, LoadTicket,
};
use arstep_common::{AssetKind, NodeId, Transform};
use arstep_scene::{Rejected, SceneGraph};
use arstep_steps::{StepDescriptor, StepRegistry};

/// The collaborators one navigation call touches.
pub struct NavContext<'a> {
    pub scene: &'a mut dyn SceneGraph,
    pub loader: &'a mut dyn AssetLoader,
    pub gpu: &'a mut dyn GpuResources,
    pub disposal: &'a mut DisposalManager,
    pub presentation: &'a mut dyn Presentation,
}

/// What happened to a load completion handed to [`StepNavigator::complete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The object is now on the anchor.
    Attached(NodeId),
    /// The current step's load failed; the error text is showing.
    Failed,
    /// The ticket was superseded; any loaded object was disposed.
    Stale,
}

/// Owns the current step index and the lifetime of the step's object.
///
/// Each accepted navigation bumps a generation counter and issues a fresh
/// [`LoadTicket`]. Completions carrying any other ticket are stale: they are
/// disposed on arrival, so rapid navigation can never attach an object for a
/// step the user already left.
#[derive(Debug)]
pub struct StepNavigator {
    registry: StepRegistry,
    defaults: DefaultTransforms,
    highlight_color: [f32; 3],
    current: usize,
    generation: u64,
    pending: Option<LoadTicket>,
    attached: Option<NodeId>,
    last_error: Option<String>,
}

impl StepNavigator {
    pub fn new(registry: StepRegistry, defaults: DefaultTransforms, highlight_color: [f32; 3]) -> Self {
        Self {
            registry,
            defaults,
            highlight_color,
            current: 0,
            generation: 0,
            pending: None,
            attached: None,
            last_error: None,
        }
    }

    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn step_count(&self) -> usize {
        self.registry.len()
    }

    pub fn current_step(&self) -> Option<&StepDescriptor> {
        self.registry.get(self.current)
    }

    /// Ticket of the load still being waited for, if any.
    pub fn pending(&self) -> Option<LoadTicket> {
        self.pending
    }

    /// Scene node of the attached step object.
    pub fn attached(&self) -> Option<NodeId> {
        self.attached
    }

    /// Error text of the current step's failed load.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn default_transform(&self, kind: AssetKind) -> Transform {
        self.defaults.for_kind(kind)
    }

    /// Show step `index`. Out-of-range indices are ignored and return `false`.
    /// Navigating to the current step reloads it.
    pub fn go_to(&mut self, index: usize, cx: &mut NavContext<'_>) -> bool {
        let Some(step) = self.registry.get(index) else {
            tracing::debug!(index, steps = self.registry.len(), "ignoring out-of-range step");
            return false;
        };
        let asset = step.asset().clone();
        let kind = step.kind();
        let title = step.title().unwrap_or_default().to_string();
        let text = step.text().to_string();

        self.detach_current(cx);
        self.current = index;
        self.generation += 1;
        let ticket = LoadTicket {
            step: index,
            generation: self.generation,
        };
        self.pending = Some(ticket);
        self.last_error = None;

        show(cx.presentation, Element::StepTitle, &title);
        show(cx.presentation, Element::StepText, &text);
        show(
            cx.presentation,
            Element::StepCounter,
            &format!("Step {} / {}", index + 1, self.registry.len()),
        );

        tracing::info!(step = index, %asset, %kind, "showing step");
        cx.loader.request(LoadRequest {
            ticket,
            asset,
            kind,
        });
        true
    }

    /// Advance one step. No-op on the last step.
    pub fn next(&mut self, cx: &mut NavContext<'_>) -> bool {
        if self.current >= self.registry.last_index() {
            return false;
        }
        self.go_to(self.current + 1, cx)
    }

    /// Go back one step. No-op on the first step.
    pub fn previous(&mut self, cx: &mut NavContext<'_>) -> bool {
        if self.current == 0 {
            return false;
        }
        self.go_to(self.current - 1, cx)
    }

    /// Accept or discard one finished load.
    pub fn complete(&mut self, completion: LoadCompletion, cx: &mut NavContext<'_>) -> Completion {
        let LoadCompletion {
            ticket,
            asset,
            result,
        } = completion;

        if self.pending != Some(ticket) {
            match result {
                Ok(object) => {
                    tracing::debug!(%ticket, %asset, "disposing stale load");
                    cx.disposal.dispose(Some(object), cx.gpu);
                }
                Err(e) => tracing::debug!(%ticket, %asset, error = %e, "dropping stale failure"),
            }
            return Completion::Stale;
        }
        self.pending = None;

        let mut object = match result {
            Ok(object) => object,
            Err(e) => {
                self.fail(format!("Unable to load asset '{asset}': {e}"), cx);
                return Completion::Failed;
            }
        };

        *object.transform_mut() = self.defaults.for_kind(object.kind());
        if let Some(part) = self.registry.get(ticket.step).and_then(|s| s.content().highlight()) {
            if !object.highlight(part, self.highlight_color) {
                tracing::warn!(%asset, part, "highlight part not found in model");
            }
        }

        self.detach_current(cx);
        let anchor = cx.scene.anchor();
        match cx.scene.attach(anchor, object) {
            Ok(node) => {
                tracing::debug!(%ticket, %asset, node = %node.short(), "step object attached");
                self.attached = Some(node);
                Completion::Attached(node)
            }
            Err(Rejected { error, object }) => {
                cx.disposal.dispose(Some(object), cx.gpu);
                self.fail(format!("Unable to load asset '{asset}': {error}"), cx);
                Completion::Failed
            }
        }
    }

    /// Remove and dispose the step object. A load still in flight becomes
    /// stale.
    pub fn teardown(&mut self, cx: &mut NavContext<'_>) {
        self.detach_current(cx);
        self.pending = None;
    }

    fn detach_current(&mut self, cx: &mut NavContext<'_>) {
        let Some(node) = self.attached.take() else {
            return;
        };
        let anchor = cx.scene.anchor();
        let object = cx.scene.detach(anchor, node);
        if object.is_none() {
            tracing::warn!(node = %node.short(), "attached step object was not on the anchor");
        }
        cx.disposal.dispose(object, cx.gpu);
    }

    fn fail(&mut self, message: String, cx: &mut NavContext<'_>) {
        tracing::warn!(step = self.current, "{message}");
        show(cx.presentation, Element::StepText, &message);
        self.last_error = Some(message);
    }
}
