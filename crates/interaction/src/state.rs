//! Press/move/release/leave state machine.
//!
//! The machine is a pure function over an owned [`InteractionState`]: feed it
//! the current state and one input, get back the next state plus what happened.
//! Hover tracking runs through [`hover_transition`], independently of the
//! press/drag cycle.

use foundation::ids::ObjectId;
use foundation::math::Vec2;
use foundation::time::TimestampMs;

use crate::config::InteractionConfig;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Pressed,
    Dragging,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerSample {
    pub position: Vec2,
    pub timestamp: TimestampMs,
}

impl PointerSample {
    pub fn new(x: f64, y: f64, timestamp_ms: u64) -> Self {
        Self {
            position: Vec2::new(x, y),
            timestamp: TimestampMs(timestamp_ms),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PointerInput {
    Press(PointerSample),
    Move(PointerSample),
    Release(PointerSample),
    Leave(PointerSample),
}

impl PointerInput {
    pub fn sample(&self) -> PointerSample {
        match *self {
            PointerInput::Press(s)
            | PointerInput::Move(s)
            | PointerInput::Release(s)
            | PointerInput::Leave(s) => s,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionState {
    pub phase: Phase,
    pub press_start: Option<PointerSample>,
    pub drag_distance: f64,
    /// Monotonic within one press-release cycle.
    pub crossed_drag_threshold: bool,
    pub hovered: Option<ObjectId>,
    pub last_commit: Option<TimestampMs>,
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.phase == Phase::Dragging
    }

    /// Back to Idle, keeping hover and commit bookkeeping.
    fn end_press(&mut self) {
        self.phase = Phase::Idle;
        self.press_start = None;
        self.drag_distance = 0.0;
        self.crossed_drag_threshold = false;
    }
}

/// How a press-release cycle was classified.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Under the drag threshold and inside the click window. Carries the
    /// hover target at release time.
    Click { target: Option<ObjectId> },
    /// Crossed the threshold or held too long; click semantics suppressed.
    Drag,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HoverChange {
    pub previous: Option<ObjectId>,
    pub current: Option<ObjectId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub state: InteractionState,
    pub entered_dragging: bool,
    /// Set when a release ends the cycle. A leave never resolves.
    pub resolution: Option<Resolution>,
    pub hover: Option<HoverChange>,
}

impl Step {
    fn unchanged(state: &InteractionState) -> Self {
        Self {
            state: state.clone(),
            entered_dragging: false,
            resolution: None,
            hover: None,
        }
    }
}

pub fn transition(
    state: &InteractionState,
    input: PointerInput,
    config: &InteractionConfig,
) -> Step {
    let mut step = Step::unchanged(state);
    let next = &mut step.state;

    match input {
        PointerInput::Press(sample) => {
            next.phase = Phase::Pressed;
            next.press_start = Some(sample);
            next.drag_distance = 0.0;
            next.crossed_drag_threshold = false;
        }
        PointerInput::Move(sample) => {
            let Some(start) = next.press_start else {
                return step;
            };
            if next.phase == Phase::Idle {
                return step;
            }
            next.drag_distance = sample.position.distance(start.position);
            if next.drag_distance > config.drag_threshold_px {
                next.crossed_drag_threshold = true;
            }
            if next.crossed_drag_threshold && next.phase != Phase::Dragging {
                next.phase = Phase::Dragging;
                step.entered_dragging = true;
            }
        }
        PointerInput::Release(sample) => {
            let Some(start) = next.press_start else {
                return step;
            };
            if next.phase == Phase::Idle {
                return step;
            }
            let held_ms = sample.timestamp.since(start.timestamp);
            let was_click =
                !next.crossed_drag_threshold && held_ms < config.click_time_window_ms;
            step.resolution = Some(if was_click {
                Resolution::Click {
                    target: next.hovered.clone(),
                }
            } else {
                Resolution::Drag
            });
            next.end_press();
        }
        PointerInput::Leave(_) => {
            next.end_press();
            if next.hovered.is_some() {
                step.hover = Some(HoverChange {
                    previous: next.hovered.take(),
                    current: None,
                });
            }
        }
    }

    step
}

/// Applies a hover hit-test result. Suppressed while dragging.
pub fn hover_transition(
    state: &InteractionState,
    hit: Option<ObjectId>,
) -> (InteractionState, Option<HoverChange>) {
    if state.is_dragging() || state.hovered == hit {
        return (state.clone(), None);
    }
    let mut next = state.clone();
    let previous = std::mem::replace(&mut next.hovered, hit.clone());
    (
        next,
        Some(HoverChange {
            previous,
            current: hit,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::{
        HoverChange, InteractionState, Phase, PointerInput, PointerSample, Resolution,
        hover_transition, transition,
    };
    use crate::config::InteractionConfig;
    use foundation::ids::ObjectId;

    fn run(inputs: &[PointerInput]) -> (InteractionState, Vec<Resolution>, usize) {
        let cfg = InteractionConfig::default();
        let mut state = InteractionState::new();
        let mut resolutions = Vec::new();
        let mut drags = 0;
        for input in inputs {
            let step = transition(&state, *input, &cfg);
            if step.entered_dragging {
                drags += 1;
            }
            resolutions.extend(step.resolution);
            state = step.state;
        }
        (state, resolutions, drags)
    }

    fn press(x: f64, y: f64, t: u64) -> PointerInput {
        PointerInput::Press(PointerSample::new(x, y, t))
    }
    fn mv(x: f64, y: f64, t: u64) -> PointerInput {
        PointerInput::Move(PointerSample::new(x, y, t))
    }
    fn release(x: f64, y: f64, t: u64) -> PointerInput {
        PointerInput::Release(PointerSample::new(x, y, t))
    }

    #[test]
    fn small_quick_press_is_a_click() {
        let (state, res, drags) = run(&[
            press(100.0, 100.0, 0),
            mv(102.0, 101.0, 50),
            release(102.0, 101.0, 80),
        ]);
        assert_eq!(res, vec![Resolution::Click { target: None }]);
        assert_eq!(drags, 0);
        assert_eq!(state.phase, Phase::Idle);
        assert_eq!(state.press_start, None);
    }

    #[test]
    fn crossing_threshold_enters_dragging_and_suppresses_click() {
        let (state, res, drags) = run(&[press(100.0, 100.0, 0), mv(140.0, 100.0, 50)]);
        assert_eq!(state.phase, Phase::Dragging);
        assert_eq!(drags, 1);
        assert!(res.is_empty());

        let (_, res, _) = run(&[
            press(100.0, 100.0, 0),
            mv(140.0, 100.0, 50),
            release(140.0, 100.0, 400),
        ]);
        assert_eq!(res, vec![Resolution::Drag]);
    }

    #[test]
    fn threshold_flag_is_monotonic_within_a_press() {
        // Out past the threshold and back to the start: still a drag.
        let (state, res, drags) = run(&[
            press(100.0, 100.0, 0),
            mv(110.0, 100.0, 20),
            mv(100.0, 100.0, 40),
            release(100.0, 100.0, 60),
        ]);
        assert_eq!(res, vec![Resolution::Drag]);
        assert_eq!(drags, 1);
        assert!(!state.crossed_drag_threshold);
    }

    #[test]
    fn exactly_at_threshold_is_not_a_drag() {
        let (_, res, drags) = run(&[press(0.0, 0.0, 0), mv(3.0, 4.0, 10), release(3.0, 4.0, 20)]);
        assert_eq!(drags, 0);
        assert_eq!(res, vec![Resolution::Click { target: None }]);
    }

    #[test]
    fn long_press_without_motion_is_not_a_click() {
        let (_, res, drags) = run(&[press(5.0, 5.0, 0), release(5.0, 5.0, 300)]);
        assert_eq!(res, vec![Resolution::Drag]);
        assert_eq!(drags, 0);
    }

    #[test]
    fn click_carries_hover_target() {
        let cfg = InteractionConfig::default();
        let (state, _) = hover_transition(&InteractionState::new(), Some(ObjectId::new("m/1")));
        let state = transition(&state, press(1.0, 1.0, 0), &cfg).state;
        let step = transition(&state, release(1.0, 1.0, 10), &cfg);
        assert_eq!(
            step.resolution,
            Some(Resolution::Click {
                target: Some(ObjectId::new("m/1"))
            })
        );
        assert_eq!(step.state.hovered, Some(ObjectId::new("m/1")));
    }

    #[test]
    fn leave_mid_drag_resets_without_resolution() {
        let cfg = InteractionConfig::default();
        let (state, _) = hover_transition(&InteractionState::new(), Some(ObjectId::new("a")));
        let state = transition(&state, press(0.0, 0.0, 0), &cfg).state;
        let state = transition(&state, mv(50.0, 0.0, 20), &cfg).state;
        let step = transition(&state, PointerInput::Leave(PointerSample::new(60.0, 0.0, 30)), &cfg);
        assert_eq!(step.resolution, None);
        assert_eq!(step.state.phase, Phase::Idle);
        assert_eq!(
            step.hover,
            Some(HoverChange {
                previous: Some(ObjectId::new("a")),
                current: None
            })
        );
    }

    #[test]
    fn release_and_move_while_idle_are_ignored() {
        let (state, res, drags) = run(&[mv(10.0, 10.0, 0), release(10.0, 10.0, 5)]);
        assert_eq!(state, InteractionState::new());
        assert!(res.is_empty());
        assert_eq!(drags, 0);
    }

    #[test]
    fn hover_is_suppressed_while_dragging() {
        let cfg = InteractionConfig::default();
        let state = transition(&InteractionState::new(), press(0.0, 0.0, 0), &cfg).state;
        let state = transition(&state, mv(20.0, 0.0, 16), &cfg).state;
        let (next, change) = hover_transition(&state, Some(ObjectId::new("b")));
        assert!(change.is_none());
        assert_eq!(next.hovered, None);
    }

    #[test]
    fn hover_reports_only_changes() {
        let s0 = InteractionState::new();
        let (s1, c1) = hover_transition(&s0, Some(ObjectId::new("a")));
        assert!(c1.is_some());
        let (_, c2) = hover_transition(&s1, Some(ObjectId::new("a")));
        assert!(c2.is_none());
        let (s3, c3) = hover_transition(&s1, None);
        assert_eq!(
            c3,
            Some(HoverChange {
                previous: Some(ObjectId::new("a")),
                current: None
            })
        );
        assert_eq!(s3.hovered, None);
    }
}
