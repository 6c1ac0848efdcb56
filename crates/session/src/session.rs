use crate::config::ViewerConfig;
use crate::navigator::{Completion, NavContext, StepNavigator};
use crate::presentation::{Element, Presentation, TextPresentation, show};
use arstep_assets::{AssetLoader, DisposalManager, ResourceLedger};
use arstep_input::{Action, GestureController, GestureEffect, PointerEvent};
use arstep_scene::{AnchorScene, DrawCall, DrawListRenderer, RenderError, Renderer, SceneGraph};
use arstep_steps::StepRegistry;
use arstep_tracking::{MarkerEvent, MarkerStatus, PoseLockController, TrackingOutcome};
use std::collections::VecDeque;

/// What one [`Session::tick`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub completions: Vec<Completion>,
    pub marker_outcomes: Vec<TrackingOutcome>,
    pub gestures: Vec<GestureEffect>,
    /// Pointer events dropped because no manipulable object was attached.
    pub pointers_dropped: usize,
}

/// The whole viewer: one explicit context object that owns the navigator,
/// the anchored scene, the GPU ledger and the input controllers.
///
/// Navigation calls act immediately. Everything asynchronous (load
/// completions, marker events, pointer events) is queued and drained by
/// [`Session::tick`] in a fixed order.
pub struct Session<L: AssetLoader, P: Presentation = TextPresentation> {
    config: ViewerConfig,
    navigator: StepNavigator,
    scene: AnchorScene,
    gpu: ResourceLedger,
    disposal: DisposalManager,
    lock: PoseLockController,
    gestures: GestureController,
    loader: L,
    presentation: P,
    markers: VecDeque<MarkerEvent>,
    pointers: VecDeque<PointerEvent>,
    status: Option<MarkerStatus>,
    ticks: u64,
}

impl<L: AssetLoader, P: Presentation> Session<L, P> {
    /// Build a session and show step 0. The anchor starts hidden and
    /// unlocked.
    pub fn new(registry: StepRegistry, config: ViewerConfig, loader: L, presentation: P) -> Self {
        if let Err(e) = config.validate() {
            tracing::warn!(error = %e, "starting with an invalid viewer config");
        }
        let navigator = StepNavigator::new(registry, config.defaults, config.highlight_color);
        let mut session = Self {
            lock: PoseLockController::new(config.lock_policy),
            gestures: GestureController::new(config.gestures),
            config,
            navigator,
            scene: AnchorScene::new(),
            gpu: ResourceLedger::new(),
            disposal: DisposalManager::new(),
            loader,
            presentation,
            markers: VecDeque::new(),
            pointers: VecDeque::new(),
            status: None,
            ticks: 0,
        };
        tracing::info!(
            steps = session.navigator.step_count(),
            policy = ?session.config.lock_policy,
            "session started"
        );
        session.go_to(0);
        session.update_status();
        session
    }

    fn split(&mut self) -> (&mut StepNavigator, NavContext<'_>) {
        (
            &mut self.navigator,
            NavContext {
                scene: &mut self.scene,
                loader: &mut self.loader,
                gpu: &mut self.gpu,
                disposal: &mut self.disposal,
                presentation: &mut self.presentation,
            },
        )
    }

    pub fn go_to(&mut self, index: usize) -> bool {
        let (nav, mut cx) = self.split();
        let moved = nav.go_to(index, &mut cx);
        if moved {
            self.gestures.reset();
        }
        moved
    }

    pub fn next(&mut self) -> bool {
        let (nav, mut cx) = self.split();
        let moved = nav.next(&mut cx);
        if moved {
            self.gestures.reset();
        }
        moved
    }

    pub fn previous(&mut self) -> bool {
        let (nav, mut cx) = self.split();
        let moved = nav.previous(&mut cx);
        if moved {
            self.gestures.reset();
        }
        moved
    }

    /// Run a navigation or object command. Returns whether anything changed.
    pub fn apply(&mut self, action: Action) -> bool {
        tracing::debug!(%action, "apply action");
        match action {
            Action::NextStep => self.next(),
            Action::PreviousStep => self.previous(),
            Action::GoTo(index) => self.go_to(index),
            Action::ResetObject => self.reset_object(),
            Action::Noop => false,
        }
    }

    /// Put the attached model back at its default transform.
    pub fn reset_object(&mut self) -> bool {
        let Some(node) = self.navigator.attached() else {
            return false;
        };
        let Some(object) = self.scene.object_mut(node) else {
            return false;
        };
        if !object.kind().permits_manipulation() {
            return false;
        }
        *object.transform_mut() = self.navigator.default_transform(object.kind());
        self.gestures.reset();
        true
    }

    pub fn push_marker_event(&mut self, event: MarkerEvent) {
        self.markers.push_back(event);
    }

    pub fn push_pointer_event(&mut self, event: PointerEvent) {
        self.pointers.push_back(event);
    }

    /// One frame of work: deliver finished loads, then marker events, then
    /// pointer events.
    pub fn tick(&mut self) -> TickReport {
        self.ticks += 1;
        let _span = tracing::debug_span!("tick", n = self.ticks).entered();
        let mut report = TickReport::default();

        let finished = self.loader.poll(&mut self.gpu);
        let (nav, mut cx) = self.split();
        for completion in finished {
            report.completions.push(nav.complete(completion, &mut cx));
        }

        while let Some(event) = self.markers.pop_front() {
            report
                .marker_outcomes
                .push(self.lock.handle(&event, &mut self.scene));
        }
        self.update_status();

        let target = self
            .navigator
            .attached()
            .filter(|_| self.navigator.current_step().is_some_and(|s| s.kind().permits_manipulation()));
        match target.and_then(|node| self.scene.object_mut(node)) {
            Some(object) => {
                let default_scale = self.navigator.default_transform(object.kind()).scale;
                for event in self.pointers.drain(..) {
                    report.gestures.push(self.gestures.handle(
                        &event,
                        object.transform_mut(),
                        default_scale,
                    ));
                }
            }
            None => {
                report.pointers_dropped = self.pointers.len();
                self.pointers.clear();
            }
        }
        report
    }

    /// Tick, then build this frame's draw list.
    pub fn frame(&mut self) -> Result<Vec<DrawCall>, RenderError> {
        self.tick();
        DrawListRenderer::new().render(&self.scene, &self.gpu)
    }

    pub fn render<R: Renderer>(&self, renderer: &R) -> R::Output {
        renderer.render(&self.scene, &self.gpu)
    }

    /// Unlock the anchor, drop queued input and go back to step 0.
    pub fn reset(&mut self) {
        tracing::info!("session reset");
        self.lock.reset(&mut self.scene);
        self.markers.clear();
        self.pointers.clear();
        self.go_to(0);
        self.update_status();
    }

    /// Dispose the step object. Loads still in flight are disposed when
    /// they arrive.
    pub fn shutdown(&mut self) {
        let (nav, mut cx) = self.split();
        nav.teardown(&mut cx);
        tracing::info!(disposed = self.disposal.totals().objects, "session shut down");
    }

    fn update_status(&mut self) {
        let status = self.lock.status();
        if self.status != Some(status) {
            self.status = Some(status);
            show(&mut self.presentation, Element::MarkerStatus, status.label());
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn navigator(&self) -> &StepNavigator {
        &self.navigator
    }

    pub fn scene(&self) -> &AnchorScene {
        &self.scene
    }

    pub fn gpu(&self) -> &ResourceLedger {
        &self.gpu
    }

    pub fn disposal(&self) -> &DisposalManager {
        &self.disposal
    }

    pub fn lock(&self) -> &PoseLockController {
        &self.lock
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn loader_mut(&mut self) -> &mut L {
        &mut self.loader
    }

    pub fn presentation(&self) -> &P {
        &self.presentation
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
