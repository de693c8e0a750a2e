//! The orbit controller: spherical pose math, damping, commands and the drag adapter.

pub mod bounds;
pub mod component;
pub mod damping;
pub mod drag;
pub mod fit;
pub mod lens;
pub mod spherical;
