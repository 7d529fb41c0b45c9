//! Compositor blit: variants, parameter derivation and device-side caches.
//!
//! Everything here is per device. A `GpuContext` owns one pipeline cache and
//! one descriptor cache; the free functions are pure.

mod descriptors;
mod mode;
mod pipelines;
mod push_constant;
mod stretch;
mod target;

pub use descriptors::DescriptorCache;
pub use mode::{BlitMode, BLIT_MODE_MAX};
pub use pipelines::{BlitPipelineCache, BlitPipelines};
pub use push_constant::{reference_multiplier, BlitPushConstant, ScreenOutput};
pub use stretch::{stretched_screen_rect, SplashStretchMode};
pub use target::{BlitTarget, LensDistortion, MultiView};

/// Two triangles covering the unit quad, matching the shader's corner table.
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// What a composite call did.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BlitOutcome {
    /// The screen could not accept a frame; nothing was touched.
    SurfaceNotReady,
    /// One draw list was recorded.
    Composited {
        drawn: usize,
        /// Targets whose texture was unavailable.
        skipped: usize,
    },
}
