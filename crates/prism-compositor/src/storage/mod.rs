//! Texture storage: render targets and image-backed textures of one context.

mod texture_storage;

pub use texture_storage::{RenderTargetId, TextureStorage};
