use foundation::ids::ObjectId;
use foundation::math::{GeoPoint, Vec2};
use foundation::time::TimestampMs;
use runtime::event_bus::EventBus;
use runtime::throttle::ThrottleScheduler;
use scene::picking::HitTester;
use tracing::trace;

use crate::config::InteractionConfig;
use crate::state::{
    HoverChange, InteractionState, Phase, PointerInput, Resolution, hover_transition, transition,
};

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum CursorStyle {
    #[default]
    Default,
    Pointer,
    Grabbing,
}

/// Published view of the interaction state.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionSnapshot {
    pub phase: Phase,
    pub hovered: Option<ObjectId>,
    pub drag_distance: f64,
    pub globe_hover: Option<GeoPoint>,
    pub at: TimestampMs,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InteractionEvent {
    HoverChanged(Option<ObjectId>),
    /// `object` is the hover target, or the model under the release point when
    /// nothing was hovered. `surface` is only set for surface clicks.
    Click {
        object: Option<ObjectId>,
        surface: Option<GeoPoint>,
    },
    CursorChanged(CursorStyle),
    DragStarted,
    /// Pointer delta accumulated since the previous drag sample.
    DragMoved { dx: f64, dy: f64 },
    DragEnded,
    SurfaceHoverChanged(Option<GeoPoint>),
    StateCommitted(InteractionSnapshot),
}

/// Turns raw pointer events on the globe canvas into semantic interaction events.
///
/// Raw position is recorded on every event. Hit testing, drag samples and
/// state publication each run behind their own throttle gate, and a gate is
/// only consumed when its work runs.
#[derive(Debug)]
pub struct GlobeInteraction {
    config: InteractionConfig,
    state: InteractionState,
    throttle: ThrottleScheduler,
    pointer: Option<Vec2>,
    drag_anchor: Option<Vec2>,
    globe_hover: Option<GeoPoint>,
    cursor: CursorStyle,
    bus: EventBus<InteractionEvent>,
}

impl GlobeInteraction {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            throttle: ThrottleScheduler::new(config.throttle_intervals()),
            config,
            state: InteractionState::new(),
            pointer: None,
            drag_anchor: None,
            globe_hover: None,
            cursor: CursorStyle::Default,
            bus: EventBus::new(),
        }
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    /// Latest raw pointer position, `None` after the pointer left the canvas.
    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer
    }

    pub fn globe_hover(&self) -> Option<GeoPoint> {
        self.globe_hover
    }

    pub fn cursor(&self) -> CursorStyle {
        self.cursor
    }

    pub fn events(&self) -> &[InteractionEvent] {
        self.bus.events()
    }

    pub fn drain_events(&mut self) -> Vec<InteractionEvent> {
        self.bus.drain()
    }

    pub fn handle(&mut self, input: PointerInput, picker: &dyn HitTester) {
        let sample = input.sample();
        let now = sample.timestamp;
        let prev_phase = self.state.phase;

        self.pointer = match input {
            PointerInput::Leave(_) => None,
            _ => Some(sample.position),
        };

        let step = transition(&self.state, input, &self.config);
        self.state = step.state;
        if let Some(change) = step.hover {
            self.emit_hover(change);
        }

        match input {
            PointerInput::Press(_) => {
                self.drag_anchor = Some(sample.position);
            }
            PointerInput::Move(_) => {
                if step.entered_dragging {
                    trace!(distance = self.state.drag_distance, "drag started");
                    self.bus.emit(InteractionEvent::DragStarted);
                }
                if self.state.is_dragging() {
                    if self.throttle.drag_sample.try_pass(now) {
                        self.emit_drag_sample(sample.position);
                    }
                } else if self.throttle.hover.try_pass(now) {
                    self.refresh_hover(sample.position, picker);
                }
            }
            PointerInput::Release(_) => {
                if prev_phase == Phase::Dragging {
                    self.emit_drag_sample(sample.position);
                    self.bus.emit(InteractionEvent::DragEnded);
                }
                self.drag_anchor = None;
                if let Some(Resolution::Click { target }) = step.resolution {
                    let (object, surface) = match target {
                        Some(id) => (Some(id), None),
                        None => {
                            let hit = picker.hit_test(sample.position);
                            (hit.object, hit.surface)
                        }
                    };
                    trace!(?object, ?surface, "click");
                    self.bus.emit(InteractionEvent::Click { object, surface });
                }
            }
            PointerInput::Leave(_) => {
                if prev_phase == Phase::Dragging {
                    self.bus.emit(InteractionEvent::DragEnded);
                }
                self.drag_anchor = None;
                self.set_globe_hover(None);
            }
        }

        self.update_cursor();

        // Phase changes always publish; intra-phase updates wait for the gate.
        if self.state.phase != prev_phase {
            self.throttle.commit.mark(now);
            self.commit(now);
        } else if self.throttle.commit.try_pass(now) {
            self.commit(now);
        }
    }

    /// Drops the hover target after the pick targets changed and reopens the
    /// hover gate, so the next move re-tests instead of clicking a stale id.
    pub fn pick_targets_changed(&mut self) {
        self.throttle.hover.reset();
        if let Some(previous) = self.state.hovered.take() {
            self.emit_hover(HoverChange {
                previous: Some(previous),
                current: None,
            });
            self.update_cursor();
        }
    }

    fn refresh_hover(&mut self, position: Vec2, picker: &dyn HitTester) {
        let hit = picker.hit_test(position);
        let (next, change) = hover_transition(&self.state, hit.object);
        self.state = next;
        if let Some(change) = change {
            self.emit_hover(change);
        }
        self.set_globe_hover(hit.surface);
    }

    fn emit_hover(&mut self, change: HoverChange) {
        trace!(previous = ?change.previous, current = ?change.current, "hover");
        self.bus.emit(InteractionEvent::HoverChanged(change.current));
    }

    fn emit_drag_sample(&mut self, position: Vec2) {
        let Some(anchor) = self.drag_anchor else {
            return;
        };
        let delta = position - anchor;
        if delta.x == 0.0 && delta.y == 0.0 {
            return;
        }
        self.drag_anchor = Some(position);
        self.bus.emit(InteractionEvent::DragMoved {
            dx: delta.x,
            dy: delta.y,
        });
    }

    fn set_globe_hover(&mut self, geo: Option<GeoPoint>) {
        if self.globe_hover == geo {
            return;
        }
        self.globe_hover = geo;
        self.bus.emit(InteractionEvent::SurfaceHoverChanged(geo));
    }

    fn update_cursor(&mut self) {
        let desired = match self.state.phase {
            Phase::Dragging => CursorStyle::Grabbing,
            _ if self.state.hovered.is_some() => CursorStyle::Pointer,
            _ => CursorStyle::Default,
        };
        if desired != self.cursor {
            self.cursor = desired;
            self.bus.emit(InteractionEvent::CursorChanged(desired));
        }
    }

    fn commit(&mut self, now: TimestampMs) {
        self.state.last_commit = Some(now);
        self.bus
            .emit(InteractionEvent::StateCommitted(InteractionSnapshot {
                phase: self.state.phase,
                hovered: self.state.hovered.clone(),
                drag_distance: self.state.drag_distance,
                globe_hover: self.globe_hover,
                at: now,
            }));
    }
}
