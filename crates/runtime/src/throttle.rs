use foundation::time::TimestampMs;

/// Minimum-interval gate.
///
/// A gate passes at most once per `min_interval_ms` on the shared input clock.
/// The first check always passes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Gate {
    min_interval_ms: u64,
    last_run: Option<TimestampMs>,
}

impl Gate {
    pub fn new(min_interval_ms: u64) -> Self {
        Self {
            min_interval_ms,
            last_run: None,
        }
    }

    pub fn min_interval_ms(&self) -> u64 {
        self.min_interval_ms
    }

    pub fn last_run(&self) -> Option<TimestampMs> {
        self.last_run
    }

    /// Would `try_pass(now)` succeed? Does not record a run.
    pub fn is_open(&self, now: TimestampMs) -> bool {
        match self.last_run {
            None => true,
            Some(last) => now.since(last) >= self.min_interval_ms,
        }
    }

    /// Records a run and returns `true` if the gate is open at `now`.
    pub fn try_pass(&mut self, now: TimestampMs) -> bool {
        if !self.is_open(now) {
            return false;
        }
        self.last_run = Some(now);
        true
    }

    /// Records a run unconditionally (used when work was forced through).
    pub fn mark(&mut self, now: TimestampMs) {
        self.last_run = Some(now);
    }

    pub fn reset(&mut self) {
        self.last_run = None;
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ThrottleIntervals {
    pub commit_ms: u64,
    pub hover_ms: u64,
    pub drag_sample_ms: u64,
}

impl Default for ThrottleIntervals {
    fn default() -> Self {
        Self {
            commit_ms: 100,
            hover_ms: 50,
            drag_sample_ms: 16,
        }
    }
}

/// Three independent gates on one clock.
///
/// Callers pass a gate only where its work runs, so an event that does no
/// hit test never spends the hover gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrottleScheduler {
    pub commit: Gate,
    pub hover: Gate,
    pub drag_sample: Gate,
}

impl ThrottleScheduler {
    pub fn new(intervals: ThrottleIntervals) -> Self {
        Self {
            commit: Gate::new(intervals.commit_ms),
            hover: Gate::new(intervals.hover_ms),
            drag_sample: Gate::new(intervals.drag_sample_ms),
        }
    }

    pub fn reset(&mut self) {
        self.commit.reset();
        self.hover.reset();
        self.drag_sample.reset();
    }
}

impl Default for ThrottleScheduler {
    fn default() -> Self {
        Self::new(ThrottleIntervals::default())
    }
}

#[cfg(test)]
mod tests {
    use super::{Gate, ThrottleScheduler};
    use foundation::time::TimestampMs;

    fn t(ms: u64) -> TimestampMs {
        TimestampMs(ms)
    }

    #[test]
    fn gate_passes_once_per_interval() {
        let mut g = Gate::new(50);
        assert!(g.try_pass(t(0)));
        assert!(!g.try_pass(t(49)));
        assert!(g.try_pass(t(50)));
        assert!(!g.try_pass(t(60)));
        assert_eq!(g.last_run(), Some(t(50)));
    }

    #[test]
    fn is_open_does_not_record() {
        let g = Gate::new(10);
        assert!(g.is_open(t(0)));
        assert_eq!(g.last_run(), None);
    }

    #[test]
    fn gates_are_independent() {
        let mut s = ThrottleScheduler::default();
        assert!(s.drag_sample.try_pass(t(0)));
        assert!(s.drag_sample.try_pass(t(16)));
        assert!(s.drag_sample.try_pass(t(32)));

        // Drag samples never touched the other gates.
        assert!(s.hover.try_pass(t(40)));
        assert!(s.commit.try_pass(t(40)));
        assert!(!s.hover.try_pass(t(60)));
        assert!(s.hover.try_pass(t(90)));
        assert!(!s.commit.try_pass(t(139)));
        assert!(s.commit.try_pass(t(140)));
    }

    #[test]
    fn reset_reopens_all_gates() {
        let mut s = ThrottleScheduler::default();
        s.commit.mark(t(0));
        s.hover.mark(t(0));
        s.drag_sample.mark(t(0));
        s.reset();
        assert!(s.commit.is_open(t(1)));
        assert!(s.hover.is_open(t(1)));
        assert!(s.drag_sample.is_open(t(1)));
    }
}
