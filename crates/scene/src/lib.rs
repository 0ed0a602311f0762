pub mod backend;
pub mod camera;
pub mod object;
pub mod picking;

pub use backend::*;
pub use camera::*;
pub use object::*;
pub use picking::*;
