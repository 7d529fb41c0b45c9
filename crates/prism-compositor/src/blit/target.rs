use crate::coords::{Rect, Vec2};
use crate::storage::RenderTargetId;

/// Multi-view (stereo/XR) layer selection.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct MultiView {
    pub use_layer: bool,
    pub layer: u32,
}

/// Radial lens-distortion parameters for head-mounted displays.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LensDistortion {
    pub apply: bool,
    /// Eye center in `[-1, 1]` lens space.
    pub eye_center: Vec2,
    pub k1: f32,
    pub k2: f32,
    pub upscale: f32,
    pub aspect_ratio: f32,
}

impl Default for LensDistortion {
    fn default() -> Self {
        Self {
            apply: false,
            eye_center: Vec2::new(0.0, 0.0),
            k1: 0.0,
            k2: 0.0,
            upscale: 1.0,
            aspect_ratio: 1.0,
        }
    }
}

/// One render target to composite onto a screen.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BlitTarget {
    pub render_target: RenderTargetId,

    /// Region of the render target, normalized to its size.
    pub src_rect: Rect,

    /// Region of the screen, in physical pixels.
    pub dst_rect: Rect,

    pub multi_view: MultiView,
    pub lens_distortion: LensDistortion,
}

impl BlitTarget {
    /// Full render target stretched over `dst_rect`.
    pub fn new(render_target: RenderTargetId, dst_rect: Rect) -> Self {
        Self {
            render_target,
            src_rect: Rect::unit(),
            dst_rect,
            multi_view: MultiView::default(),
            lens_distortion: LensDistortion::default(),
        }
    }

    pub fn with_src_rect(mut self, src_rect: Rect) -> Self {
        self.src_rect = src_rect;
        self
    }

    pub fn with_layer(mut self, layer: u32) -> Self {
        self.multi_view = MultiView {
            use_layer: true,
            layer,
        };
        self
    }

    pub fn with_lens_distortion(mut self, lens: LensDistortion) -> Self {
        self.lens_distortion = LensDistortion { apply: true, ..lens };
        self
    }
}
