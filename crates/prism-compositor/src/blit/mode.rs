/// Compositing variant used for one blit draw.
///
/// Discriminants index [`BlitPipelines`](super::BlitPipelines).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(usize)]
pub enum BlitMode {
    Normal = 0,
    /// Samples one layer of a multi-view render target.
    UseLayer = 1,
    /// Multi-view with lens-distortion warp (XR).
    Lens = 2,
    /// Like `Normal` but alpha-blended over the cleared screen.
    NormalAlpha = 3,
}

pub const BLIT_MODE_MAX: usize = 4;

impl BlitMode {
    pub const ALL: [BlitMode; BLIT_MODE_MAX] = [
        BlitMode::Normal,
        BlitMode::UseLayer,
        BlitMode::Lens,
        BlitMode::NormalAlpha,
    ];

    /// Lens distortion wins over multi-view layer, which wins over normal.
    pub fn select(apply_lens_distortion: bool, use_layer: bool) -> Self {
        if apply_lens_distortion {
            BlitMode::Lens
        } else if use_layer {
            BlitMode::UseLayer
        } else {
            BlitMode::Normal
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn uses_alpha_blend(self) -> bool {
        matches!(self, BlitMode::NormalAlpha)
    }

    pub const fn label(self) -> &'static str {
        match self {
            BlitMode::Normal => "blit normal",
            BlitMode::UseLayer => "blit use layer",
            BlitMode::Lens => "blit lens",
            BlitMode::NormalAlpha => "blit normal alpha",
        }
    }

    /// Constants prepended to the blit shader for this variant.
    pub(crate) const fn shader_header(self) -> &'static str {
        match self {
            BlitMode::Normal | BlitMode::NormalAlpha => {
                "const USE_LAYER: bool = false;\nconst APPLY_LENS_DISTORTION: bool = false;\n"
            }
            BlitMode::UseLayer => {
                "const USE_LAYER: bool = true;\nconst APPLY_LENS_DISTORTION: bool = false;\n"
            }
            BlitMode::Lens => {
                "const USE_LAYER: bool = true;\nconst APPLY_LENS_DISTORTION: bool = true;\n"
            }
        }
    }
}
