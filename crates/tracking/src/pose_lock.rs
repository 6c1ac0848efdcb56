use arstep_scene::{AnchorControl, AnchorMode};
use glam::Mat4;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// How marker observations drive the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockPolicy {
    /// Freeze the anchor at the first observed marker pose.
    #[default]
    OneShot,
    /// Follow the marker every frame; hide content when it is lost.
    ContinuousFollow,
}

/// Identifier of a printed marker (pattern name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarkerId(pub String);

impl MarkerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Discrete events from the marker tracker, at most a few per tick.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerEvent {
    /// The marker is visible with this world transform.
    Found { marker: MarkerId, transform: Mat4 },
    Lost { marker: MarkerId },
}

/// What the status label should say.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerStatus {
    Found,
    Searching,
}

impl MarkerStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Found => "Marker Found",
            Self::Searching => "Searching…",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PoseLockState {
    Unlocked,
    Locked { marker: MarkerId, transform: Mat4 },
}

/// What one event did to the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingOutcome {
    /// The anchor was frozen at this event's pose.
    Locked,
    /// The anchor transform was overwritten (continuous follow).
    Followed,
    /// The last visible marker was lost and the anchor hidden.
    Hidden,
    /// The anchor did not change.
    Ignored,
}

/// Decides whether marker observations move the anchor.
#[derive(Debug)]
pub struct PoseLockController {
    policy: LockPolicy,
    state: PoseLockState,
    visible: BTreeSet<MarkerId>,
}

impl PoseLockController {
    pub fn new(policy: LockPolicy) -> Self {
        Self {
            policy,
            state: PoseLockState::Unlocked,
            visible: BTreeSet::new(),
        }
    }

    pub fn policy(&self) -> LockPolicy {
        self.policy
    }

    pub fn state(&self) -> &PoseLockState {
        &self.state
    }

    pub fn is_locked(&self) -> bool {
        matches!(self.state, PoseLockState::Locked { .. })
    }

    pub fn locked_transform(&self) -> Option<Mat4> {
        match &self.state {
            PoseLockState::Locked { transform, .. } => Some(*transform),
            PoseLockState::Unlocked => None,
        }
    }

    /// "Marker Found" while any marker is in view.
    pub fn status(&self) -> MarkerStatus {
        if self.visible.is_empty() {
            MarkerStatus::Searching
        } else {
            MarkerStatus::Found
        }
    }

    pub fn handle(&mut self, event: &MarkerEvent, anchor: &mut dyn AnchorControl) -> TrackingOutcome {
        match event {
            MarkerEvent::Found { marker, transform } => {
                if !transform.is_finite() {
                    tracing::warn!(%marker, "ignoring non-finite marker pose");
                    return TrackingOutcome::Ignored;
                }
                self.visible.insert(marker.clone());
                match self.policy {
                    LockPolicy::OneShot => self.lock_once(marker, *transform, anchor),
                    LockPolicy::ContinuousFollow => {
                        anchor.set_anchor_matrix(*transform);
                        anchor.set_anchor_visible(true);
                        TrackingOutcome::Followed
                    }
                }
            }
            MarkerEvent::Lost { marker } => {
                if !self.visible.remove(marker) {
                    return TrackingOutcome::Ignored;
                }
                tracing::debug!(%marker, remaining = self.visible.len(), "marker lost");
                match self.policy {
                    LockPolicy::OneShot => TrackingOutcome::Ignored,
                    LockPolicy::ContinuousFollow if self.visible.is_empty() => {
                        anchor.set_anchor_visible(false);
                        TrackingOutcome::Hidden
                    }
                    LockPolicy::ContinuousFollow => TrackingOutcome::Ignored,
                }
            }
        }
    }

    fn lock_once(
        &mut self,
        marker: &MarkerId,
        transform: Mat4,
        anchor: &mut dyn AnchorControl,
    ) -> TrackingOutcome {
        if self.is_locked() {
            return TrackingOutcome::Ignored;
        }
        anchor.set_anchor_matrix(transform);
        anchor.set_anchor_mode(AnchorMode::Manual);
        anchor.set_anchor_visible(true);
        self.state = PoseLockState::Locked {
            marker: marker.clone(),
            transform,
        };
        tracing::info!(%marker, "pose locked");
        TrackingOutcome::Locked
    }

    /// Session reset: unlock, forget visible markers, hand the anchor back
    /// to the tracker and hide it.
    pub fn reset(&mut self, anchor: &mut dyn AnchorControl) {
        self.state = PoseLockState::Unlocked;
        self.visible.clear();
        anchor.set_anchor_mode(AnchorMode::Tracked);
        anchor.set_anchor_visible(false);
        tracing::debug!("pose lock reset");
    }
}
