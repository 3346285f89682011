//! Orrery engine crate.
//!
//! Owns the platform + GPU runtime pieces and the render core: the model slab
//! allocator, pipeline registry, bind-group cache, model entities and the
//! per-frame pass scheduler.

pub mod core;
pub mod coords;
pub mod device;
pub mod logging;
pub mod render;
pub mod time;
pub mod window;

pub use orrery_asset as asset;
