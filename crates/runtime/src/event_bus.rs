/// Ordered, drainable event queue.
///
/// Producers push events synchronously while handling input or applying fetch
/// completions; the host drains them once per loop turn. Emission order is
/// preserved exactly, which is what the observers rely on (e.g. a loading event
/// always precedes the matching update).
#[derive(Debug)]
pub struct EventBus<E> {
    events: Vec<E>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: E) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[E] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn drain(&mut self) -> Vec<E> {
        std::mem::take(&mut self.events)
    }
}
