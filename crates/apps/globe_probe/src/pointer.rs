use std::collections::VecDeque;

use interaction::{PointerInput, PointerSample};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scene::Viewport;

/// Scripted pointer: one random gesture (hover sweep, click or drag) per second.
#[derive(Debug)]
pub struct PointerScript {
    viewport: Viewport,
    rng: StdRng,
    queue: VecDeque<PointerInput>,
    next_gesture_ms: u64,
}

impl PointerScript {
    pub fn new(viewport: Viewport, seed: u64) -> Self {
        Self {
            viewport,
            rng: StdRng::seed_from_u64(seed),
            queue: VecDeque::new(),
            next_gesture_ms: 0,
        }
    }

    /// Inputs due at or before `now_ms`, in time order.
    pub fn due(&mut self, now_ms: u64) -> Vec<PointerInput> {
        if now_ms >= self.next_gesture_ms {
            self.schedule(now_ms);
            self.next_gesture_ms = now_ms + 1_000;
        }
        let mut due = Vec::new();
        while self
            .queue
            .front()
            .is_some_and(|i| i.sample().timestamp.as_millis() <= now_ms)
        {
            due.extend(self.queue.pop_front());
        }
        due
    }

    fn schedule(&mut self, start: u64) {
        let x = self.rng.gen_range(0.3..0.7) * self.viewport.width;
        let y = self.rng.gen_range(0.3..0.7) * self.viewport.height;
        let at = |dx: f64, dy: f64, t: u64| PointerSample::new(x + dx, y + dy, start + t);

        match self.rng.gen_range(0..3) {
            0 => {
                for i in 0..10u64 {
                    let d = i as f64 * 15.0;
                    self.queue.push_back(PointerInput::Move(at(d, d * 0.5, i * 50)));
                }
            }
            1 => {
                self.queue.push_back(PointerInput::Move(at(0.0, 0.0, 0)));
                self.queue.push_back(PointerInput::Press(at(0.0, 0.0, 60)));
                self.queue.push_back(PointerInput::Move(at(1.0, 1.0, 90)));
                self.queue.push_back(PointerInput::Release(at(1.0, 1.0, 120)));
            }
            _ => {
                self.queue.push_back(PointerInput::Move(at(0.0, 0.0, 0)));
                self.queue.push_back(PointerInput::Press(at(0.0, 0.0, 60)));
                for i in 1..=10u64 {
                    let d = i as f64 * 12.0;
                    self.queue.push_back(PointerInput::Move(at(d, 0.0, 60 + i * 20)));
                }
                self.queue.push_back(PointerInput::Release(at(120.0, 0.0, 300)));
            }
        }
    }
}
