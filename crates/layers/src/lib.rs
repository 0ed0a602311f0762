//! Overlay lifecycle for the globe scene: sources, checksum-gated builds and
//! the registry that owns the built objects.

pub mod builders;
pub mod built;
pub mod checksum;
pub mod error;
pub mod instance;
pub mod mode;
pub mod payload;
pub mod registry;
pub mod source;

pub use built::BuiltObject;
pub use checksum::payload_checksum;
pub use error::*;
pub use instance::*;
pub use mode::VisualizationMode;
pub use payload::*;
pub use registry::*;
pub use source::*;
