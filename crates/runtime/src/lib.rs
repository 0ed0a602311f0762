pub mod event_bus;
pub mod throttle;

pub use event_bus::*;
pub use throttle::*;
