use anyhow::{Context, bail};
use arstep_assets::AssetLoader;
use arstep_input::{Action, PointerEvent, PointerPhase};
use arstep_session::{Presentation, Session, SessionInspector};
use arstep_tracking::{MarkerEvent, MarkerId};
use glam::{Mat4, Vec2, Vec3};
use std::str::FromStr;
use std::time::Duration;

/// Marker pose used by `found:` commands: half a metre in front of the camera.
const MARKER_DISTANCE: f32 = 0.5;
const FRAME: Duration = Duration::from_millis(16);
/// Ticks allowed for outstanding loads after the script ends.
const SETTLE_TICKS: usize = 64;

/// One scripted step of a simulated session.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Tick,
    Found(String),
    Lost(String),
    /// Single-finger drag by this many pixels.
    Drag(f32, f32),
    /// Two-finger pinch; the finger distance is multiplied by the ratio.
    Pinch(f32),
    DoubleTap,
    Summary,
    Reset,
    Action(Action),
}

fn number(value: &str, what: &str) -> anyhow::Result<f32> {
    value
        .parse()
        .with_context(|| format!("invalid {what} '{value}'"))
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut parts = s.split(':');
        let head = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();
        let command = match (head, args.as_slice()) {
            ("tick", []) => Command::Tick,
            ("summary", []) => Command::Summary,
            ("restart", []) => Command::Reset,
            ("doubletap", []) => Command::DoubleTap,
            ("found", [marker]) if !marker.is_empty() => Command::Found(marker.to_string()),
            ("lost", [marker]) if !marker.is_empty() => Command::Lost(marker.to_string()),
            ("drag", [dx, dy]) => Command::Drag(number(dx, "drag dx")?, number(dy, "drag dy")?),
            ("pinch", [ratio]) => {
                let ratio = number(ratio, "pinch ratio")?;
                if !(ratio.is_finite() && ratio >= 0.0) {
                    bail!("pinch ratio must be a non-negative number, got {ratio}");
                }
                Command::Pinch(ratio)
            }
            ("found" | "lost" | "drag" | "pinch", _) => bail!("malformed command '{s}'"),
            _ => Command::Action(s.parse()?),
        };
        Ok(command)
    }
}

/// Drives a session from a command list with a synthetic 60 Hz clock.
#[derive(Debug, Default)]
pub struct ScriptRunner {
    clock: Duration,
}

impl ScriptRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn touch(&self, pointer: u64, phase: PointerPhase, x: f32, y: f32) -> PointerEvent {
        PointerEvent::new(pointer, phase, Vec2::new(x, y), self.clock)
    }

    /// Let the double-tap window lapse so a new gesture's first touch is
    /// never paired with the previous gesture's.
    fn begin_gesture<L: AssetLoader, P: Presentation>(&mut self, session: &Session<L, P>) {
        self.clock += session.config().gestures.double_tap_window() + FRAME;
    }

    fn tick<L: AssetLoader, P: Presentation>(&mut self, session: &mut Session<L, P>) {
        self.clock += FRAME;
        let report = session.tick();
        tracing::debug!(?report, "tick");
    }

    pub fn run<L: AssetLoader, P: Presentation>(
        &mut self,
        session: &mut Session<L, P>,
        commands: &[Command],
    ) {
        for command in commands {
            match command {
                Command::Tick => self.tick(session),
                Command::Found(marker) => session.push_marker_event(MarkerEvent::Found {
                    marker: MarkerId::new(marker.as_str()),
                    transform: Mat4::from_translation(Vec3::new(0.0, 0.0, -MARKER_DISTANCE)),
                }),
                Command::Lost(marker) => session.push_marker_event(MarkerEvent::Lost {
                    marker: MarkerId::new(marker.as_str()),
                }),
                Command::Drag(dx, dy) => {
                    self.begin_gesture(session);
                    session.push_pointer_event(self.touch(1, PointerPhase::Down, 0.0, 0.0));
                    session.push_pointer_event(self.touch(1, PointerPhase::Move, *dx, *dy));
                    session.push_pointer_event(self.touch(1, PointerPhase::Up, *dx, *dy));
                }
                Command::Pinch(ratio) => {
                    let to = 100.0 * ratio;
                    self.begin_gesture(session);
                    session.push_pointer_event(self.touch(1, PointerPhase::Down, 0.0, 0.0));
                    session.push_pointer_event(self.touch(2, PointerPhase::Down, 100.0, 0.0));
                    session.push_pointer_event(self.touch(2, PointerPhase::Move, to, 0.0));
                    session.push_pointer_event(self.touch(2, PointerPhase::Up, to, 0.0));
                    session.push_pointer_event(self.touch(1, PointerPhase::Up, 0.0, 0.0));
                }
                Command::DoubleTap => {
                    self.begin_gesture(session);
                    session.push_pointer_event(self.touch(1, PointerPhase::Down, 0.0, 0.0));
                    session.push_pointer_event(self.touch(1, PointerPhase::Up, 0.0, 0.0));
                    self.clock += Duration::from_millis(100);
                    session.push_pointer_event(self.touch(1, PointerPhase::Down, 0.0, 0.0));
                    session.push_pointer_event(self.touch(1, PointerPhase::Up, 0.0, 0.0));
                }
                Command::Summary => println!("{}", SessionInspector::summary(session)),
                Command::Reset => session.reset(),
                Command::Action(action) => {
                    if !session.apply(*action) {
                        println!("{action}: no change");
                    }
                }
            }
        }
    }

    /// Tick until the loader has nothing in flight.
    pub fn settle<L: AssetLoader, P: Presentation>(&mut self, session: &mut Session<L, P>) {
        for _ in 0..SETTLE_TICKS {
            self.tick(session);
            if session.loader().in_flight() == 0 {
                return;
            }
        }
        tracing::warn!(in_flight = session.loader().in_flight(), "loads still pending");
    }
}
