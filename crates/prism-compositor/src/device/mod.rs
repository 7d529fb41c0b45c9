//! Rendering device abstraction.
//!
//! The compositor consumes a physical GPU only through [`RenderingDevice`]:
//! - screen queries (readiness, format, size, rotation, color space, HDR)
//! - resource creation and release
//! - an immediate-style draw-list API for screen passes
//!
//! Two implementations are provided: [`WgpuDevice`] for real hardware and
//! [`HeadlessDevice`] which records commands in memory.

mod frame;
mod gpu;
mod headless;
mod init;
mod surface;
mod types;

use anyhow::Result;

use crate::coords::Color;

pub use gpu::WgpuDevice;
pub use headless::{DeviceCommand, HeadlessDevice, HeadlessProbe, HeadlessScreen, RecordedDraw};
pub use init::{GpuInit, ScreenConfig};
pub use types::{
    BlendState, ColorSpace, DeviceLimit, DrawListId, FilterMode, FramebufferFormatId, HdrOutput,
    IndexArrayId, PipelineDescriptor, PipelineId, Resource, SamplerId, SamplerState, ScreenId,
    ShaderDescriptor, ShaderId, SurfaceStatus, TextureDescriptor, TextureFormat, TextureId,
    TextureUsage, UniformSetDescriptor, UniformSetId,
};

/// One physical GPU as seen by the compositor.
///
/// Creation failures are fatal device-layer errors and are returned as
/// `anyhow` errors; the compositor does not retry them. Draw-list recording
/// calls cannot fail individually; errors surface at `draw_list_end`.
pub trait RenderingDevice {
    /// Human-readable adapter name.
    fn name(&self) -> &str;

    fn limit(&self, limit: DeviceLimit) -> u64;

    // ── screens ───────────────────────────────────────────────────────────

    /// Acquires the next drawable for `screen`.
    fn screen_prepare_for_drawing(&mut self, screen: ScreenId) -> SurfaceStatus;

    fn screen_framebuffer_format(&mut self, screen: ScreenId) -> Result<FramebufferFormatId>;

    /// Current drawable size in physical pixels.
    fn screen_size(&self, screen: ScreenId) -> (u32, u32);

    /// Rotation the display applies on scan-out, in degrees.
    fn screen_pre_rotation_degrees(&self, screen: ScreenId) -> i32;

    fn screen_color_space(&self, screen: ScreenId) -> ColorSpace;

    fn screen_hdr_output(&self, screen: ScreenId) -> HdrOutput;

    /// Reconfigures the screen's swapchain. A zero size defers configuration.
    fn screen_resize(&mut self, screen: ScreenId, width: u32, height: u32);

    // ── resources ─────────────────────────────────────────────────────────

    fn shader_create(&mut self, desc: &ShaderDescriptor<'_>) -> Result<ShaderId>;

    fn render_pipeline_create(&mut self, desc: &PipelineDescriptor<'_>) -> Result<PipelineId>;

    fn sampler_create(&mut self, state: &SamplerState) -> Result<SamplerId>;

    /// Creates a 16-bit index buffer drawn in full.
    fn index_array_create(&mut self, indices: &[u16]) -> Result<IndexArrayId>;

    /// Creates a texture, optionally uploading tightly packed layer-0 pixels.
    fn texture_create(
        &mut self,
        desc: &TextureDescriptor<'_>,
        data: Option<&[u8]>,
    ) -> Result<TextureId>;

    /// Clears every layer of a render-target texture.
    fn texture_clear(&mut self, texture: TextureId, color: Color) -> Result<()>;

    fn uniform_set_create(&mut self, desc: &UniformSetDescriptor) -> Result<UniformSetId>;

    /// Whether `set` still exists and every resource it references is alive.
    fn uniform_set_is_valid(&self, set: UniformSetId) -> bool;

    /// Releases a resource. Unknown handles are ignored.
    fn free(&mut self, resource: Resource);

    // ── draw lists ────────────────────────────────────────────────────────

    /// Opens a pass on a prepared screen, clearing it to `clear`.
    fn draw_list_begin_for_screen(&mut self, screen: ScreenId, clear: Color) -> Result<DrawListId>;

    fn draw_list_bind_render_pipeline(&mut self, list: DrawListId, pipeline: PipelineId);

    fn draw_list_bind_index_array(&mut self, list: DrawListId, array: IndexArrayId);

    fn draw_list_bind_uniform_set(&mut self, list: DrawListId, set: UniformSetId, set_index: u32);

    fn draw_list_set_push_constant(&mut self, list: DrawListId, data: &[u8]);

    fn draw_list_draw(&mut self, list: DrawListId, use_indices: bool);

    /// Closes the open draw list and submits it.
    fn draw_list_end(&mut self) -> Result<()>;

    /// Finishes the frame; presents acquired screens when `present` is set.
    fn swap_buffers(&mut self, present: bool) -> Result<()>;
}
