//! Screen-space sizes shared by the device layer and the renderer.

mod viewport;

pub use viewport::Viewport;
