use anyhow::Result;

use crate::device::{DeviceLimit, RenderingDevice};
use crate::subsystems::SubsystemFactory;

use super::{select_renderer_tier, BlitState, ContextHandle, ContextId, RendererTier, SubsystemSet};

/// One physical GPU: its device and every subsystem instance built on it.
///
/// Dropping a context releases its subsystems (scene first) and then its
/// blit resources, all on its own device, before the device itself drops.
pub struct GpuContext {
    id: ContextId,
    pub(super) blit: BlitState,
    pub(super) subsystems: SubsystemSet,
    pub(super) device: Box<dyn RenderingDevice>,
}

impl GpuContext {
    /// Builds a context on `device`.
    ///
    /// Every instance is created and initialized against `device`. The
    /// scene-renderer tier follows `rendering_method` and the device's
    /// texture limit.
    pub(crate) fn create(
        id: ContextId,
        mut device: Box<dyn RenderingDevice>,
        factory: &mut dyn SubsystemFactory,
        rendering_method: &str,
    ) -> Result<Self> {
        let tier = select_renderer_tier(
            rendering_method,
            device.limit(DeviceLimit::MaxTexturesPerShaderStage),
        );

        let mut subsystems = SubsystemSet::create(device.as_mut(), factory, tier)?;
        let blit = match BlitState::new(device.as_mut()) {
            Ok(blit) => blit,
            Err(err) => {
                // A complete set is released before it drops.
                subsystems.release(device.as_mut());
                return Err(err);
            }
        };

        log::debug!("created GPU context {id} on {} ({tier:?})", device.name());

        Ok(Self {
            id,
            blit,
            subsystems,
            device,
        })
    }

    #[inline]
    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn device_name(&self) -> &str {
        self.device.name()
    }

    pub fn device(&self) -> &dyn RenderingDevice {
        self.device.as_ref()
    }

    pub fn tier(&self) -> RendererTier {
        self.subsystems.tier()
    }

    pub fn subsystems(&self) -> &SubsystemSet {
        &self.subsystems
    }

    /// Framebuffer formats with built blit pipelines.
    pub fn cached_blit_formats(&self) -> usize {
        self.blit.pipelines.cached_formats()
    }

    /// Render-target binding sets held by the blit.
    pub fn cached_descriptors(&self) -> usize {
        self.blit.descriptors.len()
    }

    pub(crate) fn handle(&mut self) -> ContextHandle<'_> {
        ContextHandle::new(self)
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        log::debug!("releasing GPU context {} on {}", self.id, self.device.name());
        self.subsystems.release(self.device.as_mut());
        self.blit.release(self.device.as_mut());
    }
}
