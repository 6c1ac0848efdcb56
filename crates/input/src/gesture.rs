use arstep_common::Transform;
use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Gesture limits and tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub min_scale: f32,
    pub max_scale: f32,
    /// World units per pixel of single-finger drag.
    pub sensitivity: f32,
    pub double_tap_window_ms: u64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.0005,
            max_scale: 0.005,
            sensitivity: 0.005,
            double_tap_window_ms: 300,
        }
    }
}

impl GestureConfig {
    pub fn double_tap_window(&self) -> Duration {
        Duration::from_millis(self.double_tap_window_ms)
    }

    /// Clamp into `[min_scale, max_scale]`. NaN maps to the lower bound.
    /// Inverted bounds are swapped rather than trusted.
    pub fn clamp_scale(&self, scale: f32) -> f32 {
        let (lo, hi) = if self.min_scale <= self.max_scale {
            (self.min_scale, self.max_scale)
        } else {
            (self.max_scale, self.min_scale)
        };
        if scale.is_nan() {
            return lo;
        }
        scale.max(lo).min(hi)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
}

/// One touch sample in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub pointer: u64,
    pub phase: PointerPhase,
    pub position: Vec2,
    /// Time since session start.
    pub timestamp: Duration,
}

impl PointerEvent {
    pub fn new(pointer: u64, phase: PointerPhase, position: Vec2, timestamp: Duration) -> Self {
        Self {
            pointer,
            phase,
            position,
            timestamp,
        }
    }
}

/// What a pointer event did to the transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEffect {
    /// First tap recorded; a second one inside the window resets.
    TapRecorded,
    /// Double tap restored the default transform.
    Reset,
    PinchStarted,
    Dragged,
    Pinched,
    Released,
    /// Unknown pointer, a third finger, or a move with no baseline.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PinchBaseline {
    scale: f32,
    rotation: Quat,
    distance: f32,
    angle: f32,
}

#[derive(Debug, Clone, Copy)]
struct Tracked {
    id: u64,
    position: Vec2,
}

/// Maps one- and two-finger touch input to translate, scale and yaw edits.
#[derive(Debug, Default)]
pub struct GestureController {
    config: GestureConfig,
    pointers: Vec<Tracked>,
    baseline: Option<PinchBaseline>,
    last_tap: Option<Duration>,
}

fn span(a: Vec2, b: Vec2) -> (f32, f32) {
    let d = b - a;
    (d.length(), d.y.atan2(d.x))
}

impl GestureController {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn active_pointers(&self) -> usize {
        self.pointers.len()
    }

    pub fn is_pinching(&self) -> bool {
        self.baseline.is_some()
    }

    /// Forget all pointers, the pinch baseline and the last tap.
    pub fn reset(&mut self) {
        self.pointers.clear();
        self.baseline = None;
        self.last_tap = None;
    }

    /// Apply one event to `transform`. `default_scale` is what a double tap
    /// restores.
    pub fn handle(
        &mut self,
        event: &PointerEvent,
        transform: &mut Transform,
        default_scale: Vec3,
    ) -> GestureEffect {
        match event.phase {
            PointerPhase::Down => self.pointer_down(event, transform, default_scale),
            PointerPhase::Move => self.pointer_move(event, transform),
            PointerPhase::Up | PointerPhase::Cancel => self.pointer_up(event),
        }
    }

    fn pointer_down(
        &mut self,
        event: &PointerEvent,
        transform: &mut Transform,
        default_scale: Vec3,
    ) -> GestureEffect {
        if self.pointers.len() >= 2 || self.pointers.iter().any(|p| p.id == event.pointer) {
            return GestureEffect::Ignored;
        }
        self.pointers.push(Tracked {
            id: event.pointer,
            position: event.position,
        });

        if let [a, b] = self.pointers.as_slice() {
            let (distance, angle) = span(a.position, b.position);
            self.baseline = Some(PinchBaseline {
                scale: transform.uniform_scale(),
                rotation: transform.rotation,
                distance,
                angle,
            });
            return GestureEffect::PinchStarted;
        }

        let window = self.config.double_tap_window();
        let double = self
            .last_tap
            .is_some_and(|t| event.timestamp.saturating_sub(t) < window);
        if double {
            self.last_tap = None;
            transform.position = Vec3::ZERO;
            transform.rotation = Quat::IDENTITY;
            transform.scale = default_scale;
            tracing::debug!("double tap: transform reset");
            GestureEffect::Reset
        } else {
            self.last_tap = Some(event.timestamp);
            GestureEffect::TapRecorded
        }
    }

    fn pointer_move(&mut self, event: &PointerEvent, transform: &mut Transform) -> GestureEffect {
        let Some(tracked) = self.pointers.iter_mut().find(|p| p.id == event.pointer) else {
            return GestureEffect::Ignored;
        };
        let delta = event.position - tracked.position;
        tracked.position = event.position;

        match (self.pointers.as_slice(), self.baseline) {
            ([_], _) => {
                let s = self.config.sensitivity;
                transform.position.x += delta.x * s;
                transform.position.z += delta.y * s;
                GestureEffect::Dragged
            }
            ([a, b], Some(base)) => {
                let (distance, angle) = span(a.position, b.position);
                let ratio = if base.distance > f32::EPSILON {
                    distance / base.distance
                } else {
                    1.0
                };
                let ratio = if ratio.is_finite() { ratio } else { 1.0 };
                transform.scale = Vec3::splat(self.config.clamp_scale(base.scale * ratio));
                // Twist about the model's own up axis, relative to the baseline.
                transform.rotation = base.rotation * Quat::from_rotation_y(angle - base.angle);
                GestureEffect::Pinched
            }
            _ => GestureEffect::Ignored,
        }
    }

    fn pointer_up(&mut self, event: &PointerEvent) -> GestureEffect {
        let before = self.pointers.len();
        self.pointers.retain(|p| p.id != event.pointer);
        if self.pointers.len() == before {
            return GestureEffect::Ignored;
        }
        if self.pointers.is_empty() {
            self.baseline = None;
        }
        GestureEffect::Released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

    const DEFAULT: Vec3 = Vec3::splat(0.001);

    fn ev(pointer: u64, phase: PointerPhase, x: f32, y: f32, ms: u64) -> PointerEvent {
        PointerEvent::new(pointer, phase, Vec2::new(x, y), Duration::from_millis(ms))
    }

    fn model() -> Transform {
        Transform::from_scale_euler(0.001, Vec3::new(FRAC_PI_2, 0.0, 0.0))
    }

    fn pinch(g: &mut GestureController, t: &mut Transform, to: f32) {
        g.handle(&ev(1, PointerPhase::Down, 0.0, 0.0, 0), t, DEFAULT);
        g.handle(&ev(2, PointerPhase::Down, 100.0, 0.0, 10), t, DEFAULT);
        g.handle(&ev(2, PointerPhase::Move, to, 0.0, 20), t, DEFAULT);
    }

    #[test]
    fn drag_moves_x_and_z_only() {
        let mut g = GestureController::default();
        let mut t = model();
        let rotation = t.rotation;
        g.handle(&ev(1, PointerPhase::Down, 10.0, 10.0, 0), &mut t, DEFAULT);
        let effect = g.handle(&ev(1, PointerPhase::Move, 30.0, 50.0, 16), &mut t, DEFAULT);
        assert_eq!(effect, GestureEffect::Dragged);
        assert!((t.position.x - 0.1).abs() < 1e-6);
        assert!((t.position.z - 0.2).abs() < 1e-6);
        assert_eq!(t.position.y, 0.0);
        assert_eq!(t.rotation, rotation);
    }

    #[test]
    fn double_tap_resets_position_and_rotation() {
        let mut g = GestureController::default();
        let mut t = model();
        t.position = Vec3::new(1.0, 0.0, 2.0);
        t.scale = Vec3::splat(0.004);
        g.handle(&ev(1, PointerPhase::Down, 0.0, 0.0, 1000), &mut t, DEFAULT);
        g.handle(&ev(1, PointerPhase::Up, 0.0, 0.0, 1050), &mut t, DEFAULT);
        let effect = g.handle(&ev(1, PointerPhase::Down, 0.0, 0.0, 1200), &mut t, DEFAULT);
        assert_eq!(effect, GestureEffect::Reset);
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, DEFAULT);
    }

    #[test]
    fn slow_taps_do_not_reset() {
        let mut g = GestureController::default();
        let mut t = model();
        t.position.x = 1.0;
        g.handle(&ev(1, PointerPhase::Down, 0.0, 0.0, 0), &mut t, DEFAULT);
        g.handle(&ev(1, PointerPhase::Up, 0.0, 0.0, 50), &mut t, DEFAULT);
        let effect = g.handle(&ev(1, PointerPhase::Down, 0.0, 0.0, 301), &mut t, DEFAULT);
        assert_eq!(effect, GestureEffect::TapRecorded);
        assert_eq!(t.position.x, 1.0);
    }

    #[test]
    fn tap_exactly_at_window_is_not_double() {
        let mut g = GestureController::default();
        let mut t = model();
        t.position.x = 1.0;
        g.handle(&ev(1, PointerPhase::Down, 0.0, 0.0, 0), &mut t, DEFAULT);
        g.handle(&ev(1, PointerPhase::Up, 0.0, 0.0, 50), &mut t, DEFAULT);
        let effect = g.handle(&ev(1, PointerPhase::Down, 0.0, 0.0, 300), &mut t, DEFAULT);
        assert_eq!(effect, GestureEffect::TapRecorded);
        assert_eq!(t.position.x, 1.0);
    }

    #[test]
    fn tap_just_inside_window_is_double() {
        let mut g = GestureController::default();
        let mut t = model();
        g.handle(&ev(1, PointerPhase::Down, 0.0, 0.0, 0), &mut t, DEFAULT);
        g.handle(&ev(1, PointerPhase::Up, 0.0, 0.0, 50), &mut t, DEFAULT);
        let effect = g.handle(&ev(1, PointerPhase::Down, 0.0, 0.0, 299), &mut t, DEFAULT);
        assert_eq!(effect, GestureEffect::Reset);
    }

    #[test]
    fn pinch_scales_proportionally() {
        let mut g = GestureController::default();
        let mut t = model();
        pinch(&mut g, &mut t, 200.0);
        assert!((t.uniform_scale() - 0.002).abs() < 1e-6);
        assert_eq!(t.scale.x, t.scale.y);
        assert_eq!(t.scale.y, t.scale.z);
    }

    #[test]
    fn pinch_scale_is_clamped_at_both_ends() {
        let config = GestureConfig::default();
        for to in [1e9, 1e-9, 0.0] {
            let mut g = GestureController::new(config);
            let mut t = model();
            pinch(&mut g, &mut t, to);
            let s = t.uniform_scale();
            assert!(s.is_finite());
            assert!((config.min_scale..=config.max_scale).contains(&s), "{to} -> {s}");
        }
    }

    #[test]
    fn zero_baseline_distance_keeps_scale() {
        let mut g = GestureController::default();
        let mut t = model();
        g.handle(&ev(1, PointerPhase::Down, 5.0, 5.0, 0), &mut t, DEFAULT);
        g.handle(&ev(2, PointerPhase::Down, 5.0, 5.0, 10), &mut t, DEFAULT);
        g.handle(&ev(2, PointerPhase::Move, 80.0, 5.0, 20), &mut t, DEFAULT);
        assert!((t.uniform_scale() - 0.001).abs() < 1e-7);
    }

    #[test]
    fn twist_changes_yaw() {
        let mut g = GestureController::default();
        let mut t = Transform::from_scale_euler(0.001, Vec3::ZERO);
        g.handle(&ev(1, PointerPhase::Down, 0.0, 0.0, 0), &mut t, DEFAULT);
        g.handle(&ev(2, PointerPhase::Down, 100.0, 0.0, 10), &mut t, DEFAULT);
        g.handle(&ev(2, PointerPhase::Move, 100.0, 100.0, 20), &mut t, DEFAULT);
        assert!((t.yaw() - FRAC_PI_4).abs() < 1e-4);
    }

    fn same_rotation(a: Quat, b: Quat) -> bool {
        a.dot(b).abs() > 1.0 - 1e-5
    }

    /// Second finger on a 100 px circle around the first, at `degrees`.
    fn finger_at(degrees: f32, ms: u64) -> PointerEvent {
        let (sin, cos) = degrees.to_radians().sin_cos();
        ev(2, PointerPhase::Move, 100.0 * cos, 100.0 * sin, ms)
    }

    #[test]
    fn twist_past_quarter_and_half_turn_follows_fingers() {
        let mut g = GestureController::default();
        let mut t = model();
        let start = t.rotation;
        g.handle(&ev(1, PointerPhase::Down, 0.0, 0.0, 0), &mut t, DEFAULT);
        g.handle(&ev(2, PointerPhase::Down, 100.0, 0.0, 10), &mut t, DEFAULT);
        for (i, degrees) in [60.0_f32, 100.0, 110.0, 120.0, 170.0, 200.0, 270.0]
            .into_iter()
            .enumerate()
        {
            g.handle(&finger_at(degrees, 20 + i as u64), &mut t, DEFAULT);
            let expected = start * Quat::from_rotation_y(degrees.to_radians());
            assert!(same_rotation(t.rotation, expected), "twist to {degrees} degrees");
        }
    }

    #[test]
    fn twists_accumulate_across_gestures() {
        let mut g = GestureController::default();
        let mut t = model();
        let start = t.rotation;
        for gesture in 0..3u64 {
            let at = gesture * 1000;
            g.handle(&ev(1, PointerPhase::Down, 0.0, 0.0, at), &mut t, DEFAULT);
            g.handle(&ev(2, PointerPhase::Down, 100.0, 0.0, at + 10), &mut t, DEFAULT);
            g.handle(&finger_at(120.0, at + 20), &mut t, DEFAULT);
            g.handle(&ev(2, PointerPhase::Up, 0.0, 0.0, at + 30), &mut t, DEFAULT);
            g.handle(&ev(1, PointerPhase::Up, 0.0, 0.0, at + 40), &mut t, DEFAULT);
        }
        // Three 120 degree twists make a full turn.
        assert!(same_rotation(t.rotation, start));

        g.handle(&ev(1, PointerPhase::Down, 0.0, 0.0, 5000), &mut t, DEFAULT);
        g.handle(&ev(2, PointerPhase::Down, 100.0, 0.0, 5010), &mut t, DEFAULT);
        g.handle(&finger_at(100.0, 5020), &mut t, DEFAULT);
        let expected = start * Quat::from_rotation_y(100f32.to_radians());
        assert!(same_rotation(t.rotation, expected));
    }

    #[test]
    fn inverted_scale_bounds_do_not_panic() {
        let config = GestureConfig {
            min_scale: 0.005,
            max_scale: 0.0005,
            ..GestureConfig::default()
        };
        assert_eq!(config.clamp_scale(1.0), 0.005);
        assert_eq!(config.clamp_scale(0.0), 0.0005);
        assert_eq!(config.clamp_scale(f32::NAN), 0.0005);

        let mut g = GestureController::new(config);
        let mut t = model();
        pinch(&mut g, &mut t, 1e6);
        assert_eq!(t.uniform_scale(), 0.005);
    }

    #[test]
    fn third_pointer_is_ignored() {
        let mut g = GestureController::default();
        let mut t = model();
        g.handle(&ev(1, PointerPhase::Down, 0.0, 0.0, 0), &mut t, DEFAULT);
        g.handle(&ev(2, PointerPhase::Down, 100.0, 0.0, 10), &mut t, DEFAULT);
        let effect = g.handle(&ev(3, PointerPhase::Down, 50.0, 50.0, 20), &mut t, DEFAULT);
        assert_eq!(effect, GestureEffect::Ignored);
        assert_eq!(g.active_pointers(), 2);
        assert_eq!(
            g.handle(&ev(3, PointerPhase::Move, 90.0, 90.0, 30), &mut t, DEFAULT),
            GestureEffect::Ignored
        );
    }

    #[test]
    fn baseline_cleared_only_when_all_pointers_lift() {
        let mut g = GestureController::default();
        let mut t = model();
        pinch(&mut g, &mut t, 150.0);
        g.handle(&ev(2, PointerPhase::Up, 150.0, 0.0, 30), &mut t, DEFAULT);
        assert!(g.is_pinching());
        g.handle(&ev(1, PointerPhase::Cancel, 0.0, 0.0, 40), &mut t, DEFAULT);
        assert!(!g.is_pinching());
        assert_eq!(g.active_pointers(), 0);
    }

    #[test]
    fn reset_forgets_pending_tap() {
        let mut g = GestureController::default();
        let mut t = model();
        g.handle(&ev(1, PointerPhase::Down, 0.0, 0.0, 0), &mut t, DEFAULT);
        g.reset();
        assert_eq!(
            g.handle(&ev(1, PointerPhase::Down, 0.0, 0.0, 100), &mut t, DEFAULT),
            GestureEffect::TapRecorded
        );
    }

    #[test]
    fn config_defaults_fill_missing_fields() {
        let config: GestureConfig = serde_yaml::from_str("max_scale: 0.01").unwrap();
        assert_eq!(config.max_scale, 0.01);
        assert_eq!(config.double_tap_window_ms, 300);
        assert_eq!(config.clamp_scale(f32::NAN), config.min_scale);
    }
}
