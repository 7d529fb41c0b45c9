//! Handles and descriptors exchanged with a [`RenderingDevice`](super::RenderingDevice).

macro_rules! resource_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);
    };
}

resource_id!(
    /// Compiled shader module.
    ShaderId
);
resource_id!(
    /// Render pipeline bound to one framebuffer format.
    PipelineId
);
resource_id!(SamplerId);
resource_id!(TextureId);
resource_id!(
    /// Sampler + texture binding set (descriptor set 0 of the blit shader).
    UniformSetId
);
resource_id!(
    /// Index buffer plus the range drawn from it.
    IndexArrayId
);
resource_id!(DrawListId);
resource_id!(
    /// Opaque key describing a render target's attachment layout.
    FramebufferFormatId
);

/// Display surface identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScreenId(pub u32);

impl ScreenId {
    pub const MAIN: ScreenId = ScreenId(0);
}

/// Any resource that can be handed back to [`RenderingDevice::free`](super::RenderingDevice::free).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Resource {
    Shader(ShaderId),
    Pipeline(PipelineId),
    Sampler(SamplerId),
    Texture(TextureId),
    UniformSet(UniformSetId),
    IndexArray(IndexArrayId),
}

/// Result of preparing a screen for drawing.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceStatus {
    /// A frame was acquired; draw lists may target the screen.
    Ready,
    /// No drawable is available (minimized, lost swapchain). Skip the frame.
    NotReady,
}

/// Queried device limits.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DeviceLimit {
    MaxTexturesPerShaderStage,
}

/// Output color space of a screen.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum ColorSpace {
    #[default]
    Rec709NonlinearSrgb,
    Rec709Linear,
    Rec2020NonlinearSt2084,
}

impl ColorSpace {
    /// Tag written into the blit push constant; must match the shader.
    pub const fn push_constant_tag(self) -> u32 {
        match self {
            ColorSpace::Rec709NonlinearSrgb => 0,
            ColorSpace::Rec709Linear => 1,
            ColorSpace::Rec2020NonlinearSt2084 => 2,
        }
    }
}

/// Luminance parameters of a screen's output.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HdrOutput {
    /// Nits that a value of 1.0 in the rendered image should map to.
    pub reference_luminance: f32,

    /// Nits represented by 1.0 in the screen's linear encoding.
    pub linear_luminance_scale: f32,

    /// Largest linear value the screen can show.
    pub output_max_linear_value: f32,
}

impl Default for HdrOutput {
    fn default() -> Self {
        Self {
            reference_luminance: 100.0,
            linear_luminance_scale: 100.0,
            output_max_linear_value: 1.0,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TextureFormat {
    Rgba8Unorm,
    Rgba8UnormSrgb,
    Bgra8Unorm,
    Bgra8UnormSrgb,
    Rgba16Float,
}

impl TextureFormat {
    pub const fn bytes_per_pixel(self) -> u32 {
        match self {
            TextureFormat::Rgba16Float => 8,
            _ => 4,
        }
    }

    pub const fn is_srgb(self) -> bool {
        matches!(self, TextureFormat::Rgba8UnormSrgb | TextureFormat::Bgra8UnormSrgb)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TextureUsage {
    /// Sampled only; contents come from upload.
    Sampled,
    /// Render attachment that is also sampled by the compositor.
    RenderTarget,
}

/// Texture creation parameters. Textures are always 2D arrays so that the
/// single-layer and multi-view blit variants share one binding layout.
#[derive(Debug, Clone)]
pub struct TextureDescriptor<'a> {
    pub label: &'a str,
    pub width: u32,
    pub height: u32,
    pub layers: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum FilterMode {
    #[default]
    Nearest,
    Linear,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SamplerState {
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
    pub max_lod: f32,
}

impl SamplerState {
    /// Sampler with both filters set to `filter` and no mip access.
    pub fn single_level(filter: FilterMode) -> Self {
        Self {
            min_filter: filter,
            mag_filter: filter,
            max_lod: 0.0,
        }
    }
}

impl Default for SamplerState {
    fn default() -> Self {
        Self {
            min_filter: FilterMode::Nearest,
            mag_filter: FilterMode::Nearest,
            max_lod: 1e20,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BlendState {
    Disabled,
    /// Straight-alpha "over" blending.
    Alpha,
}

#[derive(Debug, Clone)]
pub struct ShaderDescriptor<'a> {
    pub label: &'a str,
    /// WGSL source.
    pub source: &'a str,
}

#[derive(Debug, Clone)]
pub struct PipelineDescriptor<'a> {
    pub label: &'a str,
    pub shader: ShaderId,
    pub framebuffer_format: FramebufferFormatId,
    pub blend: BlendState,
}

/// Binding set holding one combined sampler + texture at binding 0.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct UniformSetDescriptor {
    pub shader: ShaderId,
    pub sampler: SamplerId,
    pub texture: TextureId,
}
