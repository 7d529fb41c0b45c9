use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result};

use crate::coords::Color;
use crate::device::{
    RenderingDevice, Resource, TextureDescriptor, TextureFormat, TextureId, TextureUsage,
};
use crate::subsystems::Subsystem;

/// Handle of an offscreen render target. Stable across texture recreation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderTargetId(pub u64);

#[derive(Debug)]
struct RenderTarget {
    width: u32,
    height: u32,
    layers: u32,
    use_hdr: bool,
    use_debanding: bool,

    /// `None` while the target has zero size.
    texture: Option<TextureId>,
}

impl RenderTarget {
    fn format(&self) -> TextureFormat {
        if self.use_hdr {
            TextureFormat::Rgba16Float
        } else {
            TextureFormat::Rgba8Unorm
        }
    }
}

/// Render targets plus the image textures allocated on one device.
///
/// HDR targets hold linear values in a float format; the others hold
/// sRGB-encoded values, which the blit decodes as needed.
#[derive(Debug, Default)]
pub struct TextureStorage {
    next_id: u64,
    render_targets: BTreeMap<RenderTargetId, RenderTarget>,
    images: BTreeSet<TextureId>,
}

impl TextureStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a render target. A zero size leaves it without a texture.
    pub fn render_target_create(
        &mut self,
        device: &mut dyn RenderingDevice,
        width: u32,
        height: u32,
        layers: u32,
        use_hdr: bool,
    ) -> Result<RenderTargetId> {
        let mut target = RenderTarget {
            width,
            height,
            layers: layers.max(1),
            use_hdr,
            use_debanding: false,
            texture: None,
        };
        Self::allocate(device, &mut target)?;

        self.next_id += 1;
        let id = RenderTargetId(self.next_id);
        self.render_targets.insert(id, target);
        Ok(id)
    }

    pub fn render_target_free(&mut self, device: &mut dyn RenderingDevice, id: RenderTargetId) {
        if let Some(mut target) = self.render_targets.remove(&id) {
            Self::deallocate(device, &mut target);
        }
    }

    /// Backing texture, if the target exists and has a non-zero size.
    pub fn render_target_texture(&self, id: RenderTargetId) -> Option<TextureId> {
        self.render_targets.get(&id).and_then(|t| t.texture)
    }

    pub fn render_target_size(&self, id: RenderTargetId) -> Option<(u32, u32)> {
        self.render_targets.get(&id).map(|t| (t.width, t.height))
    }

    /// Resizes the target, recreating its texture.
    pub fn render_target_set_size(
        &mut self,
        device: &mut dyn RenderingDevice,
        id: RenderTargetId,
        width: u32,
        height: u32,
    ) -> Result<()> {
        let target = self.target_mut(id)?;
        if (target.width, target.height) == (width, height) {
            return Ok(());
        }
        target.width = width;
        target.height = height;
        Self::deallocate(device, target);
        Self::allocate(device, target)
    }

    pub fn render_target_is_using_hdr(&self, id: RenderTargetId) -> bool {
        self.render_targets.get(&id).is_some_and(|t| t.use_hdr)
    }

    /// Switches between the 8-bit and float formats, recreating the texture.
    pub fn render_target_set_use_hdr(
        &mut self,
        device: &mut dyn RenderingDevice,
        id: RenderTargetId,
        use_hdr: bool,
    ) -> Result<()> {
        let target = self.target_mut(id)?;
        if target.use_hdr == use_hdr {
            return Ok(());
        }
        target.use_hdr = use_hdr;
        Self::deallocate(device, target);
        Self::allocate(device, target)
    }

    pub fn render_target_is_using_debanding(&self, id: RenderTargetId) -> bool {
        self.render_targets.get(&id).is_some_and(|t| t.use_debanding)
    }

    pub fn render_target_set_use_debanding(&mut self, id: RenderTargetId, use_debanding: bool) {
        if let Some(target) = self.render_targets.get_mut(&id) {
            target.use_debanding = use_debanding;
        }
    }

    /// Clears every layer. Targets without a texture are left alone.
    pub fn render_target_clear(
        &mut self,
        device: &mut dyn RenderingDevice,
        id: RenderTargetId,
        color: Color,
    ) -> Result<()> {
        let target = self.target_mut(id)?;
        match target.texture {
            Some(texture) => device.texture_clear(texture, color),
            None => Ok(()),
        }
    }

    pub fn render_target_count(&self) -> usize {
        self.render_targets.len()
    }

    /// Uploads an RGBA8 image (sRGB-encoded) into a sampled texture.
    pub fn texture_from_image(
        &mut self,
        device: &mut dyn RenderingDevice,
        image: &image::RgbaImage,
    ) -> Result<TextureId> {
        let texture = device
            .texture_create(
                &TextureDescriptor {
                    label: "image texture",
                    width: image.width(),
                    height: image.height(),
                    layers: 1,
                    format: TextureFormat::Rgba8Unorm,
                    usage: TextureUsage::Sampled,
                },
                Some(image.as_raw()),
            )
            .context("uploading image texture")?;
        self.images.insert(texture);
        Ok(texture)
    }

    pub fn texture_free(&mut self, device: &mut dyn RenderingDevice, texture: TextureId) {
        if self.images.remove(&texture) {
            device.free(Resource::Texture(texture));
        }
    }

    fn target_mut(&mut self, id: RenderTargetId) -> Result<&mut RenderTarget> {
        self.render_targets
            .get_mut(&id)
            .with_context(|| format!("unknown render target {id:?}"))
    }

    fn allocate(device: &mut dyn RenderingDevice, target: &mut RenderTarget) -> Result<()> {
        if target.width == 0 || target.height == 0 {
            return Ok(());
        }
        let texture = device
            .texture_create(
                &TextureDescriptor {
                    label: "render target",
                    width: target.width,
                    height: target.height,
                    layers: target.layers,
                    format: target.format(),
                    usage: TextureUsage::RenderTarget,
                },
                None,
            )
            .with_context(|| {
                format!("allocating {}x{} render target", target.width, target.height)
            })?;
        target.texture = Some(texture);
        Ok(())
    }

    fn deallocate(device: &mut dyn RenderingDevice, target: &mut RenderTarget) {
        if let Some(texture) = target.texture.take() {
            device.free(Resource::Texture(texture));
        }
    }
}

impl Subsystem for TextureStorage {
    fn label(&self) -> &'static str {
        "texture storage"
    }

    fn release(&mut self, device: &mut dyn RenderingDevice) {
        for (_, mut target) in std::mem::take(&mut self.render_targets) {
            Self::deallocate(device, &mut target);
        }
        for texture in std::mem::take(&mut self.images) {
            device.free(Resource::Texture(texture));
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HeadlessDevice;

    #[test]
    fn zero_sized_target_has_no_texture() {
        let mut device = HeadlessDevice::new("gpu0");
        let mut storage = TextureStorage::new();

        let rt = storage
            .render_target_create(&mut device, 0, 0, 1, false)
            .unwrap();
        assert_eq!(storage.render_target_texture(rt), None);

        storage
            .render_target_set_size(&mut device, rt, 64, 32)
            .unwrap();
        assert!(storage.render_target_texture(rt).is_some());
    }

    #[test]
    fn resize_recreates_texture() {
        let mut device = HeadlessDevice::new("gpu0");
        let probe = device.probe();
        let mut storage = TextureStorage::new();

        let rt = storage
            .render_target_create(&mut device, 16, 16, 1, false)
            .unwrap();
        let before = storage.render_target_texture(rt).unwrap();
        storage
            .render_target_set_size(&mut device, rt, 32, 16)
            .unwrap();
        let after = storage.render_target_texture(rt).unwrap();

        assert_ne!(before, after);
        assert!(!probe.is_texture_alive(before));
        assert!(probe.is_texture_alive(after));
    }

    #[test]
    fn flags_are_tracked() {
        let mut device = HeadlessDevice::new("gpu0");
        let mut storage = TextureStorage::new();
        let rt = storage
            .render_target_create(&mut device, 8, 8, 1, true)
            .unwrap();

        assert!(storage.render_target_is_using_hdr(rt));
        assert!(!storage.render_target_is_using_debanding(rt));

        storage.render_target_set_use_debanding(rt, true);
        storage
            .render_target_set_use_hdr(&mut device, rt, false)
            .unwrap();
        assert!(storage.render_target_is_using_debanding(rt));
        assert!(!storage.render_target_is_using_hdr(rt));

        // Unknown targets report no flags.
        assert!(!storage.render_target_is_using_hdr(RenderTargetId(99)));
    }

    #[test]
    fn clear_reaches_device() {
        let mut device = HeadlessDevice::new("gpu0");
        let probe = device.probe();
        let mut storage = TextureStorage::new();
        let rt = storage
            .render_target_create(&mut device, 8, 8, 2, false)
            .unwrap();
        let red = Color::new(1.0, 0.0, 0.0, 1.0);

        storage.render_target_clear(&mut device, rt, red).unwrap();
        let texture = storage.render_target_texture(rt).unwrap();
        assert_eq!(probe.texture_clear_color(texture), Some(red));
    }

    #[test]
    fn image_upload_and_release() {
        let mut device = HeadlessDevice::new("gpu0");
        let probe = device.probe();
        let mut storage = TextureStorage::new();

        let image = image::RgbaImage::from_pixel(4, 2, image::Rgba([255, 0, 0, 255]));
        let texture = storage.texture_from_image(&mut device, &image).unwrap();
        assert!(probe.is_texture_alive(texture));

        storage
            .render_target_create(&mut device, 8, 8, 1, false)
            .unwrap();
        storage.release(&mut device);
        assert_eq!(probe.live_resources(), 0);
        assert_eq!(storage.render_target_count(), 0);
    }
}
