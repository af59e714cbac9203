//! Systems - logic that operates on components

mod lifecycle;
mod mood;

pub use lifecycle::*;
pub use mood::*;
