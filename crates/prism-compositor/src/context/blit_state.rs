use anyhow::Result;

use crate::blit::{BlitPipelineCache, DescriptorCache, QUAD_INDICES};
use crate::device::{IndexArrayId, RenderingDevice, Resource, SamplerId, SamplerState};

/// Device-side blit resources of one context.
#[derive(Debug)]
pub struct BlitState {
    pub pipelines: BlitPipelineCache,
    pub descriptors: DescriptorCache,
    pub sampler: SamplerId,
    pub quad: IndexArrayId,
}

impl BlitState {
    /// Builds the shader variants, sampler and quad on `device`.
    ///
    /// Whatever was created before a failure is freed again.
    pub fn new(device: &mut dyn RenderingDevice) -> Result<Self> {
        let mut pipelines = BlitPipelineCache::new(device)?;
        let sampler = match device.sampler_create(&SamplerState::default()) {
            Ok(sampler) => sampler,
            Err(err) => {
                pipelines.release(device);
                return Err(err.context("creating blit sampler"));
            }
        };
        let quad = match device.index_array_create(&QUAD_INDICES) {
            Ok(quad) => quad,
            Err(err) => {
                pipelines.release(device);
                device.free(Resource::Sampler(sampler));
                return Err(err.context("creating blit quad"));
            }
        };

        Ok(Self {
            pipelines,
            descriptors: DescriptorCache::new(),
            sampler,
            quad,
        })
    }

    pub fn release(&mut self, device: &mut dyn RenderingDevice) {
        self.descriptors.release(device);
        self.pipelines.release(device);
        device.free(Resource::IndexArray(self.quad));
        device.free(Resource::Sampler(self.sampler));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HeadlessDevice;

    #[test]
    fn failed_quad_frees_shaders_and_sampler() {
        let mut device = HeadlessDevice::new("gpu0");
        let probe = device.probe();
        probe.set_fail_index_arrays(true);

        assert!(BlitState::new(&mut device).is_err());
        assert_eq!(probe.live_resources(), 0);
    }

    #[test]
    fn release_frees_everything() {
        let mut device = HeadlessDevice::new("gpu0");
        let probe = device.probe();

        let mut blit = BlitState::new(&mut device).unwrap();
        assert!(probe.live_resources() > 0);
        blit.release(&mut device);
        assert_eq!(probe.live_resources(), 0);
    }
}
