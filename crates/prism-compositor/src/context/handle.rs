use std::any::Any;

use anyhow::Result;
use image::RgbaImage;

use crate::blit::{BlitOutcome, BlitTarget, SplashStretchMode};
use crate::coords::Color;
use crate::device::{RenderingDevice, ScreenId};
use crate::storage::{RenderTargetId, TextureStorage};
use crate::subsystems::{CanvasRenderer, CapabilityKind, SceneRenderer, Subsystem, SubsystemKind};

use super::{ContextId, GpuContext, RendererTier};

/// Exclusive access to the bound context.
///
/// Obtained from [`Compositor::current`](crate::Compositor::current); every
/// subsystem accessor resolves against the same GPU.
pub struct ContextHandle<'a> {
    ctx: &'a mut GpuContext,
}

impl<'a> ContextHandle<'a> {
    pub(super) fn new(ctx: &'a mut GpuContext) -> Self {
        Self { ctx }
    }

    pub fn id(&self) -> ContextId {
        self.ctx.id()
    }

    pub fn tier(&self) -> RendererTier {
        self.ctx.tier()
    }

    pub fn device(&mut self) -> &mut dyn RenderingDevice {
        self.ctx.device.as_mut()
    }

    pub fn texture_storage(&mut self) -> &mut TextureStorage {
        self.ctx.subsystems.texture_storage_mut()
    }

    /// Texture storage together with the device it allocates on.
    pub fn storage_and_device(&mut self) -> (&mut TextureStorage, &mut dyn RenderingDevice) {
        (
            self.ctx.subsystems.texture_storage_mut(),
            self.ctx.device.as_mut(),
        )
    }

    pub fn canvas(&mut self) -> &mut dyn CanvasRenderer {
        self.ctx.subsystems.canvas()
    }

    pub fn scene(&mut self) -> &mut dyn SceneRenderer {
        self.ctx.subsystems.scene()
    }

    pub fn subsystem(&mut self, kind: SubsystemKind) -> &mut dyn Subsystem {
        self.ctx.subsystems.slot_mut(kind)
    }

    /// Downcasts an opaque slot to its concrete host type.
    pub fn subsystem_as<T: Subsystem>(&mut self, kind: SubsystemKind) -> Option<&mut T> {
        self.subsystem(kind).as_any_mut().downcast_mut::<T>()
    }

    /// Helper exposed by this context's scene renderer.
    ///
    /// Clustered-only helpers are `None` on a mobile-tier context.
    pub fn capability(&mut self, kind: CapabilityKind) -> Option<&mut dyn Any> {
        if kind.clustered_only() && self.tier() != RendererTier::Clustered {
            return None;
        }
        self.ctx.subsystems.scene().capability(kind)
    }

    pub fn render_target_create(
        &mut self,
        width: u32,
        height: u32,
        layers: u32,
        use_hdr: bool,
    ) -> Result<RenderTargetId> {
        let (storage, device) = self.storage_and_device();
        storage.render_target_create(device, width, height, layers, use_hdr)
    }

    pub fn render_target_set_size(
        &mut self,
        id: RenderTargetId,
        width: u32,
        height: u32,
    ) -> Result<()> {
        let (storage, device) = self.storage_and_device();
        storage.render_target_set_size(device, id, width, height)
    }

    pub fn render_target_clear(&mut self, id: RenderTargetId, color: Color) -> Result<()> {
        let (storage, device) = self.storage_and_device();
        storage.render_target_clear(device, id, color)
    }

    pub fn render_target_free(&mut self, id: RenderTargetId) {
        let (storage, device) = self.storage_and_device();
        storage.render_target_free(device, id);
    }

    /// Composites `targets` onto `screen` of this context's device.
    pub fn blit_render_targets_to_screen(
        &mut self,
        screen: ScreenId,
        targets: &[BlitTarget],
    ) -> Result<BlitOutcome> {
        self.ctx.blit_render_targets_to_screen(screen, targets)
    }

    pub fn set_boot_image_with_stretch(
        &mut self,
        image: &RgbaImage,
        background: Color,
        stretch_mode: SplashStretchMode,
        use_filter: bool,
    ) -> Result<bool> {
        self.ctx
            .set_boot_image_with_stretch(image, background, stretch_mode, use_filter)
    }
}
