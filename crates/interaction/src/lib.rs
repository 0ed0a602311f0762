//! Pointer interaction on the globe canvas: click vs drag disambiguation,
//! throttled hover hit testing, and the surface hover indicator.

pub mod config;
pub mod controller;
pub mod indicator;
pub mod state;

pub use config::*;
pub use controller::*;
pub use indicator::*;
pub use state::*;
