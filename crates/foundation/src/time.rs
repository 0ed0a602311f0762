/// Milliseconds on the host's monotonic input clock.
///
/// Pointer samples, throttle gates and the interaction state machine all share
/// this single timebase; the absolute origin is irrelevant.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimestampMs(pub u64);

impl TimestampMs {
    pub fn new(ms: u64) -> Self {
        Self(ms)
    }

    pub fn as_millis(self) -> u64 {
        self.0
    }

    /// Milliseconds elapsed since `earlier`; zero if the clock went backwards.
    pub fn since(self, earlier: TimestampMs) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}
