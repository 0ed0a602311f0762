pub mod globe;
pub mod precision;
pub mod vec;

pub use globe::*;
pub use precision::*;
pub use vec::*;
