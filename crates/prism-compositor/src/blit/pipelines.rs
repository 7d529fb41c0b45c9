use std::collections::HashMap;

use anyhow::Result;

use crate::device::{
    BlendState, FramebufferFormatId, PipelineDescriptor, PipelineId, RenderingDevice, Resource,
    ShaderDescriptor, ShaderId,
};

use super::{BlitMode, BLIT_MODE_MAX};

const BLIT_SHADER: &str = include_str!("shaders/blit.wgsl");

/// One pipeline per [`BlitMode`], all targeting the same framebuffer format.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BlitPipelines {
    pipelines: [PipelineId; BLIT_MODE_MAX],
}

impl BlitPipelines {
    #[inline]
    pub fn get(&self, mode: BlitMode) -> PipelineId {
        self.pipelines[mode.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (BlitMode, PipelineId)> + '_ {
        BlitMode::ALL.into_iter().zip(self.pipelines.iter().copied())
    }
}

/// Format-keyed blit pipeline cache.
///
/// Shader variants are compiled up front; pipelines are built on the first
/// request for a framebuffer format and kept until [`release`](Self::release).
#[derive(Debug)]
pub struct BlitPipelineCache {
    shaders: [ShaderId; BLIT_MODE_MAX],
    by_format: HashMap<FramebufferFormatId, BlitPipelines>,
}

impl BlitPipelineCache {
    /// Compiles the shader variants on `device`.
    pub fn new(device: &mut dyn RenderingDevice) -> Result<Self> {
        let mut shaders = Vec::with_capacity(BLIT_MODE_MAX);

        for mode in BlitMode::ALL {
            let source = format!("{}{}", mode.shader_header(), BLIT_SHADER);
            match device.shader_create(&ShaderDescriptor {
                label: mode.label(),
                source: &source,
            }) {
                Ok(id) => shaders.push(id),
                Err(err) => {
                    for id in shaders {
                        device.free(Resource::Shader(id));
                    }
                    return Err(err.context(format!("compiling {} shader", mode.label())));
                }
            }
        }

        let shaders = [shaders[0], shaders[1], shaders[2], shaders[3]];
        Ok(Self {
            shaders,
            by_format: HashMap::new(),
        })
    }

    /// Shader variant for `mode`.
    #[inline]
    pub fn shader(&self, mode: BlitMode) -> ShaderId {
        self.shaders[mode.index()]
    }

    /// Returns the pipelines for `format`, building all of them on a miss.
    ///
    /// Device failures propagate; a partially built set is freed and nothing
    /// is cached.
    pub fn get_pipelines_for_format(
        &mut self,
        device: &mut dyn RenderingDevice,
        format: FramebufferFormatId,
    ) -> Result<BlitPipelines> {
        if let Some(pipelines) = self.by_format.get(&format) {
            return Ok(*pipelines);
        }

        let mut built = Vec::with_capacity(BLIT_MODE_MAX);
        for mode in BlitMode::ALL {
            let blend = if mode.uses_alpha_blend() {
                BlendState::Alpha
            } else {
                BlendState::Disabled
            };
            let created = device.render_pipeline_create(&PipelineDescriptor {
                label: mode.label(),
                shader: self.shader(mode),
                framebuffer_format: format,
                blend,
            });
            match created {
                Ok(id) => built.push(id),
                Err(err) => {
                    for id in built {
                        device.free(Resource::Pipeline(id));
                    }
                    return Err(err.context(format!(
                        "building {} pipeline for format {format:?}",
                        mode.label()
                    )));
                }
            }
        }

        let pipelines = BlitPipelines {
            pipelines: [built[0], built[1], built[2], built[3]],
        };
        log::debug!("built blit pipelines for framebuffer format {format:?}");
        self.by_format.insert(format, pipelines);
        Ok(pipelines)
    }

    /// Number of formats with built pipelines.
    pub fn cached_formats(&self) -> usize {
        self.by_format.len()
    }

    /// Frees every pipeline and shader variant.
    pub fn release(&mut self, device: &mut dyn RenderingDevice) {
        for (_, pipelines) in self.by_format.drain() {
            for (_, id) in pipelines.iter() {
                device.free(Resource::Pipeline(id));
            }
        }
        for id in self.shaders {
            device.free(Resource::Shader(id));
        }
    }
}
