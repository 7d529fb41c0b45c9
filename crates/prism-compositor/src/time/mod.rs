//! Frame timing.
//!
//! The host drives the clock through `Compositor::begin_frame(step)`; the
//! clock itself never samples wall time, which keeps it deterministic under
//! test.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime, DEFAULT_TIME_ROLLOVER_SECS};
