use std::collections::HashMap;

use anyhow::Result;

use crate::device::{
    RenderingDevice, Resource, SamplerId, ShaderId, TextureId, UniformSetDescriptor, UniformSetId,
};

/// Sampler + texture binding sets keyed by backing texture.
///
/// A hit is checked with `uniform_set_is_valid` and rebuilt when stale. A
/// miss first evicts every stale entry, so sets whose texture was recreated
/// under a new id (render-target resize, HDR switch) are freed on the next
/// lookup instead of accumulating.
#[derive(Debug, Default)]
pub struct DescriptorCache {
    sets: HashMap<TextureId, UniformSetId>,
}

impl DescriptorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(
        &mut self,
        device: &mut dyn RenderingDevice,
        texture: TextureId,
        sampler: SamplerId,
        shader: ShaderId,
    ) -> Result<UniformSetId> {
        if let Some(&set) = self.sets.get(&texture) {
            if device.uniform_set_is_valid(set) {
                return Ok(set);
            }
        }
        self.evict_stale(device);

        let set = device.uniform_set_create(&UniformSetDescriptor {
            shader,
            sampler,
            texture,
        })?;
        self.sets.insert(texture, set);
        Ok(set)
    }

    /// Frees every set whose texture or sampler is gone.
    pub fn evict_stale(&mut self, device: &mut dyn RenderingDevice) {
        self.sets.retain(|_, set| {
            if device.uniform_set_is_valid(*set) {
                return true;
            }
            device.free(Resource::UniformSet(*set));
            false
        });
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn release(&mut self, device: &mut dyn RenderingDevice) {
        for (_, set) in self.sets.drain() {
            device.free(Resource::UniformSet(set));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{
        DeviceCommand, HeadlessDevice, SamplerState, ShaderDescriptor, TextureDescriptor, TextureFormat,
        TextureUsage,
    };

    fn texture(device: &mut HeadlessDevice) -> TextureId {
        device
            .texture_create(
                &TextureDescriptor {
                    label: "rt",
                    width: 4,
                    height: 4,
                    layers: 1,
                    format: TextureFormat::Rgba8Unorm,
                    usage: TextureUsage::RenderTarget,
                },
                None,
            )
            .unwrap()
    }

    #[test]
    fn valid_entry_is_reused() {
        let mut device = HeadlessDevice::new("gpu0");
        let probe = device.probe();
        let shader = device
            .shader_create(&ShaderDescriptor { label: "s", source: "" })
            .unwrap();
        let sampler = device.sampler_create(&SamplerState::default()).unwrap();
        let tex = texture(&mut device);

        let mut cache = DescriptorCache::new();
        let a = cache.get_or_create(&mut device, tex, sampler, shader).unwrap();
        let b = cache.get_or_create(&mut device, tex, sampler, shader).unwrap();

        assert_eq!(a, b);
        assert_eq!(probe.uniform_sets_created(), 1);
    }

    #[test]
    fn stale_entry_is_rebuilt() {
        let mut device = HeadlessDevice::new("gpu0");
        let probe = device.probe();
        let shader = device
            .shader_create(&ShaderDescriptor { label: "s", source: "" })
            .unwrap();
        let old_sampler = device.sampler_create(&SamplerState::default()).unwrap();
        let tex = texture(&mut device);

        let mut cache = DescriptorCache::new();
        let a = cache
            .get_or_create(&mut device, tex, old_sampler, shader)
            .unwrap();

        // Freeing a referenced resource invalidates the set.
        device.free(Resource::Sampler(old_sampler));
        assert!(!device.uniform_set_is_valid(a));

        let sampler = device.sampler_create(&SamplerState::default()).unwrap();
        let b = cache.get_or_create(&mut device, tex, sampler, shader).unwrap();

        assert_ne!(a, b);
        assert!(device.uniform_set_is_valid(b));
        assert_eq!(probe.uniform_sets_created(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn miss_evicts_sets_of_freed_textures() {
        let mut device = HeadlessDevice::new("gpu0");
        let probe = device.probe();
        let shader = device
            .shader_create(&ShaderDescriptor { label: "s", source: "" })
            .unwrap();
        let sampler = device.sampler_create(&SamplerState::default()).unwrap();

        let mut cache = DescriptorCache::new();
        let mut tex = texture(&mut device);
        let mut set = cache.get_or_create(&mut device, tex, sampler, shader).unwrap();
        let live = probe.live_resources();

        for _ in 0..10 {
            device.free(Resource::Texture(tex));
            tex = texture(&mut device);
            let old = set;
            set = cache.get_or_create(&mut device, tex, sampler, shader).unwrap();
            assert!(probe
                .commands()
                .contains(&DeviceCommand::Freed(Resource::UniformSet(old))));
        }

        assert_eq!(cache.len(), 1);
        assert_eq!(probe.live_resources(), live);
    }
}
