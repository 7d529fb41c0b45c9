//! Prism compositor crate.
//!
//! Owns one rendering context per physical GPU, switches which one is bound,
//! and composites offscreen render targets onto display surfaces.

pub mod blit;
pub mod config;
pub mod context;
pub mod coords;
pub mod device;
pub mod error;
pub mod logging;
pub mod shader_cache;
pub mod storage;
pub mod subsystems;
pub mod time;

mod compositor;

#[cfg(test)]
mod test_support;

pub use compositor::Compositor;
pub use config::{CompositorConfig, ShaderCacheConfig};
pub use error::CompositorError;
