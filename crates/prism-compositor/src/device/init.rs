use super::types::HdrOutput;

/// Parameters for opening a [`WgpuDevice`](super::WgpuDevice).
///
/// Keep this minimal; add fields only for concrete platform needs.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Which adapter to ask for. Multi-GPU hosts open one device per preference.
    pub power_preference: wgpu::PowerPreference,

    /// Request the software adapter.
    pub force_fallback_adapter: bool,

    /// Required wgpu features. Favor an empty set for portability.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
        }
    }
}

/// Per-screen surface configuration.
#[derive(Debug, Clone)]
pub struct ScreenConfig {
    /// Prefer a 16-bit float surface, which makes the screen linear (HDR).
    pub prefer_hdr: bool,

    /// Present mode (swap behavior). FIFO is supported everywhere.
    pub present_mode: wgpu::PresentMode,

    /// Preferred alpha mode; replaced by a supported one when unavailable.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Frame latency hint.
    pub desired_maximum_frame_latency: u32,

    /// Luminance parameters reported to the compositor.
    pub hdr: HdrOutput,

    /// Rotation applied by the display on scan-out (mobile panels).
    pub pre_rotation_degrees: i32,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            prefer_hdr: false,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            desired_maximum_frame_latency: 2,
            hdr: HdrOutput::default(),
            pre_rotation_degrees: 0,
        }
    }
}
