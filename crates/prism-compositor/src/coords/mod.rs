//! Geometry and color types shared by the compositor and its collaborators.
//!
//! Screen space:
//! - physical pixels
//! - origin top-left, +X right, +Y down
//!
//! Push constants carry rects normalized to `[0, 1]` of the relevant extent.

mod color;
mod rect;
mod vec2;

pub use color::Color;
pub use rect::Rect;
pub use vec2::Vec2;
