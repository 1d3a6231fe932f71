//! The rendering pipeline: the periodic mix task and the standing output
//! taps it publishes to.

mod render;
mod tap;

pub use tap::OutputTap;

pub(crate) use render::RenderLoop;
