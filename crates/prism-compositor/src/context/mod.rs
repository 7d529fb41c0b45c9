//! GPU contexts: one physical GPU's device plus every subsystem built on it.
//!
//! The compositor owns the primary context directly and secondary ones in a
//! registry keyed by [`GpuIndex`]. Subsystems are only reachable through a
//! [`ContextHandle`] for the bound context, so instances of different GPUs
//! cannot be mixed.

mod blit_state;
mod composite;
mod gpu_context;
mod handle;
mod subsystem_set;
mod tier;

use std::fmt;
use std::num::NonZeroU32;

pub use blit_state::BlitState;
pub use gpu_context::GpuContext;
pub use handle::ContextHandle;
pub use subsystem_set::SubsystemSet;
pub use tier::{select_renderer_tier, RendererTier, MIN_CLUSTERED_TEXTURES_PER_STAGE};

/// Index of a secondary GPU. Zero is reserved for the primary context.
pub type GpuIndex = NonZeroU32;

/// Which context is meant: the implicit primary one or a registered GPU.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum ContextId {
    #[default]
    Primary,
    Secondary(GpuIndex),
}

impl ContextId {
    /// Maps a raw host index; `0` is the primary context.
    pub fn from_index(index: u32) -> Self {
        NonZeroU32::new(index).map_or(ContextId::Primary, ContextId::Secondary)
    }

    pub fn index(self) -> u32 {
        match self {
            ContextId::Primary => 0,
            ContextId::Secondary(index) => index.get(),
        }
    }

    #[inline]
    pub fn is_primary(self) -> bool {
        matches!(self, ContextId::Primary)
    }
}

impl From<GpuIndex> for ContextId {
    fn from(index: GpuIndex) -> Self {
        ContextId::Secondary(index)
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextId::Primary => f.write_str("primary"),
            ContextId::Secondary(index) => write!(f, "gpu{index}"),
        }
    }
}
