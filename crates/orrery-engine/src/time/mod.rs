//! Time subsystem.
//!
//! One `FrameClock` per render loop; call `tick()` once per presented frame.
//! The elapsed time it reports is what drives time-of-day effects, so those
//! never depend on a global frame counter.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
