use std::collections::HashMap;

use anyhow::{Context, Result};
use wgpu::util::DeviceExt;

use crate::coords::Color;

use super::frame::{RecordedCommand, RecordedDrawList};
use super::init::{GpuInit, ScreenConfig};
use super::surface;
use super::types::*;
use super::RenderingDevice;

/// One attached display surface.
struct ScreenEntry {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    size: (u32, u32),
    color_space: ColorSpace,
    hdr: HdrOutput,
    pre_rotation_degrees: i32,

    /// Drawable acquired by `screen_prepare_for_drawing`, presented (or
    /// discarded) by `swap_buffers`.
    frame: Option<wgpu::SurfaceTexture>,
}

struct TextureEntry {
    texture: wgpu::Texture,
    /// 2D-array view covering every layer.
    view: wgpu::TextureView,
}

struct UniformSetEntry {
    bind_group: wgpu::BindGroup,
    texture: TextureId,
    sampler: SamplerId,
}

struct IndexArrayEntry {
    buffer: wgpu::Buffer,
    count: u32,
}

/// [`RenderingDevice`] backed by a wgpu adapter.
///
/// Owns the wgpu core objects and one surface per attached screen. Shaders
/// use a fixed layout: group 0 holds a sampled 2D-array texture and its
/// sampler, group 1 a dynamic-offset uniform standing in for push constants.
pub struct WgpuDevice {
    /// Kept alive for surface creation.
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    name: String,

    texture_layout: wgpu::BindGroupLayout,
    push_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,

    next_id: u64,
    screens: HashMap<ScreenId, ScreenEntry>,
    formats: Vec<wgpu::TextureFormat>,
    shaders: HashMap<ShaderId, wgpu::ShaderModule>,
    pipelines: HashMap<PipelineId, wgpu::RenderPipeline>,
    samplers: HashMap<SamplerId, wgpu::Sampler>,
    textures: HashMap<TextureId, TextureEntry>,
    uniform_sets: HashMap<UniformSetId, UniformSetEntry>,
    index_arrays: HashMap<IndexArrayId, IndexArrayEntry>,

    open: Option<RecordedDrawList>,
}

impl WgpuDevice {
    /// Opens an adapter and device.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(init: GpuInit) -> Result<Self> {
        let GpuInit {
            power_preference,
            force_fallback_adapter,
            required_features,
            required_limits,
        } = init;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: None,
                force_fallback_adapter,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let name = adapter.get_info().name;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("prism device"),
                required_features,
                required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .with_context(|| format!("failed to create wgpu device/queue on {name}"))?;

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("prism texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2Array,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let push_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("prism push constant bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("prism pipeline layout"),
            bind_group_layouts: &[&texture_layout, &push_layout],
            immediate_size: 0,
        });

        log::info!("opened GPU device: {name}");

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            name,
            texture_layout,
            push_layout,
            pipeline_layout,
            next_id: 0,
            screens: HashMap::new(),
            formats: Vec::new(),
            shaders: HashMap::new(),
            pipelines: HashMap::new(),
            samplers: HashMap::new(),
            textures: HashMap::new(),
            uniform_sets: HashMap::new(),
            index_arrays: HashMap::new(),
            open: None,
        })
    }

    /// Creates and configures a surface for `target` and registers it as `screen`.
    pub fn attach_screen(
        &mut self,
        screen: ScreenId,
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        size: (u32, u32),
        config: ScreenConfig,
    ) -> Result<()> {
        let surface = self
            .instance
            .create_surface(target)
            .context("failed to create wgpu surface")?;

        anyhow::ensure!(
            self.adapter.is_surface_supported(&surface),
            "adapter {} cannot present to screen {screen:?}",
            self.name
        );

        let caps = surface.get_capabilities(&self.adapter);
        let format = surface::choose_surface_format(&caps, config.prefer_hdr)
            .context("no supported surface formats")?;
        let alpha_mode = surface::choose_alpha_mode(&caps, config.alpha_mode);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.0.max(1),
            height: size.1.max(1),
            present_mode: config.present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: config.desired_maximum_frame_latency,
        };

        if size.0 > 0 && size.1 > 0 {
            surface.configure(&self.device, &surface_config);
        }

        log::debug!("attached screen {screen:?} ({format:?}, {}x{})", size.0, size.1);

        self.screens.insert(
            screen,
            ScreenEntry {
                surface,
                config: surface_config,
                size,
                color_space: surface::color_space_for(format),
                hdr: config.hdr,
                pre_rotation_degrees: config.pre_rotation_degrees,
                frame: None,
            },
        );
        Ok(())
    }

    /// Removes a screen, discarding any acquired drawable.
    pub fn detach_screen(&mut self, screen: ScreenId) {
        self.screens.remove(&screen);
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn format_id(&mut self, format: wgpu::TextureFormat) -> FramebufferFormatId {
        let index = match self.formats.iter().position(|f| *f == format) {
            Some(i) => i,
            None => {
                self.formats.push(format);
                self.formats.len() - 1
            }
        };
        FramebufferFormatId(index as u64)
    }

    fn open_list(&mut self, list: DrawListId) -> Option<&mut RecordedDrawList> {
        match self.open.as_mut() {
            Some(open) if open.id == list => Some(open),
            _ => {
                log::warn!("command for draw list {list:?} which is not open");
                None
            }
        }
    }

    fn encode_list(&self, list: &RecordedDrawList) -> Result<wgpu::CommandBuffer> {
        let screen = self
            .screens
            .get(&list.screen)
            .with_context(|| format!("screen {:?} detached mid-frame", list.screen))?;
        let frame = screen
            .frame
            .as_ref()
            .with_context(|| format!("screen {:?} has no acquired frame", list.screen))?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let block = list.push_block_size();
        let alignment = self.device.limits().min_uniform_buffer_offset_alignment as usize;
        let stride = block.next_multiple_of(alignment.max(1));

        let push_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("prism push constants"),
                contents: &list.packed_push_constants(stride),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let push_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("prism push constant group"),
            layout: &self.push_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &push_buffer,
                    offset: 0,
                    size: std::num::NonZeroU64::new(block as u64),
                }),
            }],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("prism screen encoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("prism screen pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: list.clear.r as f64,
                            g: list.clear.g as f64,
                            b: list.clear.b as f64,
                            a: list.clear.a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            let mut index_count = 0u32;
            for cmd in &list.commands {
                match cmd {
                    RecordedCommand::Pipeline(id) => {
                        if let Some(pipeline) = self.pipelines.get(id) {
                            rpass.set_pipeline(pipeline);
                        }
                    }
                    RecordedCommand::IndexArray(id) => {
                        if let Some(array) = self.index_arrays.get(id) {
                            rpass.set_index_buffer(array.buffer.slice(..), wgpu::IndexFormat::Uint16);
                            index_count = array.count;
                        }
                    }
                    RecordedCommand::UniformSet { set, set_index } => {
                        if let Some(entry) = self.uniform_sets.get(set) {
                            rpass.set_bind_group(*set_index, &entry.bind_group, &[]);
                        }
                    }
                    RecordedCommand::PushConstant(slot) => {
                        let offset = (*slot * stride) as u32;
                        rpass.set_bind_group(1, &push_group, &[offset]);
                    }
                    RecordedCommand::Draw { use_indices: true } => {
                        rpass.draw_indexed(0..index_count, 0, 0..1);
                    }
                    RecordedCommand::Draw { use_indices: false } => {
                        log::warn!("non-indexed screen draws are not supported; skipped");
                    }
                }
            }
        }

        Ok(encoder.finish())
    }
}

impl RenderingDevice for WgpuDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn limit(&self, limit: DeviceLimit) -> u64 {
        match limit {
            DeviceLimit::MaxTexturesPerShaderStage => {
                self.device.limits().max_sampled_textures_per_shader_stage as u64
            }
        }
    }

    fn screen_prepare_for_drawing(&mut self, screen: ScreenId) -> SurfaceStatus {
        let Some(entry) = self.screens.get_mut(&screen) else {
            return SurfaceStatus::NotReady;
        };
        if entry.size.0 == 0 || entry.size.1 == 0 {
            return SurfaceStatus::NotReady;
        }
        if entry.frame.is_some() {
            return SurfaceStatus::Ready;
        }

        match entry.surface.get_current_texture() {
            Ok(frame) => {
                entry.frame = Some(frame);
                SurfaceStatus::Ready
            }
            Err(err) => surface::map_surface_error(
                &entry.surface,
                &self.device,
                &entry.config,
                entry.size,
                err,
            ),
        }
    }

    fn screen_framebuffer_format(&mut self, screen: ScreenId) -> Result<FramebufferFormatId> {
        let format = self
            .screens
            .get(&screen)
            .map(|s| s.config.format)
            .with_context(|| format!("unknown screen {screen:?}"))?;
        Ok(self.format_id(format))
    }

    fn screen_size(&self, screen: ScreenId) -> (u32, u32) {
        self.screens.get(&screen).map_or((0, 0), |s| s.size)
    }

    fn screen_pre_rotation_degrees(&self, screen: ScreenId) -> i32 {
        self.screens
            .get(&screen)
            .map_or(0, |s| s.pre_rotation_degrees)
    }

    fn screen_color_space(&self, screen: ScreenId) -> ColorSpace {
        self.screens
            .get(&screen)
            .map_or(ColorSpace::default(), |s| s.color_space)
    }

    fn screen_hdr_output(&self, screen: ScreenId) -> HdrOutput {
        self.screens
            .get(&screen)
            .map_or(HdrOutput::default(), |s| s.hdr)
    }

    fn screen_resize(&mut self, screen: ScreenId, width: u32, height: u32) {
        let Some(entry) = self.screens.get_mut(&screen) else { return };
        // An acquired drawable has the old size; drop it before reconfiguring.
        entry.frame = None;
        surface::apply_resize(
            &entry.surface,
            &self.device,
            &mut entry.config,
            &mut entry.size,
            (width, height),
        );
    }

    fn shader_create(&mut self, desc: &ShaderDescriptor<'_>) -> Result<ShaderId> {
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(desc.label),
                source: wgpu::ShaderSource::Wgsl(desc.source.into()),
            });
        let id = ShaderId(self.next());
        self.shaders.insert(id, module);
        Ok(id)
    }

    fn render_pipeline_create(&mut self, desc: &PipelineDescriptor<'_>) -> Result<PipelineId> {
        let module = self
            .shaders
            .get(&desc.shader)
            .with_context(|| format!("pipeline '{}' references unknown shader", desc.label))?;
        let format = self
            .formats
            .get(desc.framebuffer_format.0 as usize)
            .copied()
            .with_context(|| {
                format!("pipeline '{}' references unknown framebuffer format", desc.label)
            })?;

        let blend = match desc.blend {
            BlendState::Disabled => None,
            BlendState::Alpha => Some(wgpu::BlendState::ALPHA_BLENDING),
        };

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(desc.label),
                layout: Some(&self.pipeline_layout),

                vertex: wgpu::VertexState {
                    module,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[],
                },

                fragment: Some(wgpu::FragmentState {
                    module,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),

                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },

                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

        let id = PipelineId(self.next());
        self.pipelines.insert(id, pipeline);
        Ok(id)
    }

    fn sampler_create(&mut self, state: &SamplerState) -> Result<SamplerId> {
        let filter = |f: FilterMode| match f {
            FilterMode::Nearest => wgpu::FilterMode::Nearest,
            FilterMode::Linear => wgpu::FilterMode::Linear,
        };
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("prism sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: filter(state.mag_filter),
            min_filter: filter(state.min_filter),
            lod_max_clamp: state.max_lod.clamp(0.0, 32.0),
            ..Default::default()
        });
        let id = SamplerId(self.next());
        self.samplers.insert(id, sampler);
        Ok(id)
    }

    fn index_array_create(&mut self, indices: &[u16]) -> Result<IndexArrayId> {
        anyhow::ensure!(!indices.is_empty(), "empty index array");

        // Buffer writes must be 4-byte aligned; pad odd counts.
        let mut padded = indices.to_vec();
        if padded.len() % 2 == 1 {
            padded.push(0);
        }
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("prism index array"),
                contents: bytemuck::cast_slice(&padded),
                usage: wgpu::BufferUsages::INDEX,
            });

        let id = IndexArrayId(self.next());
        self.index_arrays.insert(
            id,
            IndexArrayEntry {
                buffer,
                count: indices.len() as u32,
            },
        );
        Ok(id)
    }

    fn texture_create(
        &mut self,
        desc: &TextureDescriptor<'_>,
        data: Option<&[u8]>,
    ) -> Result<TextureId> {
        anyhow::ensure!(
            desc.width > 0 && desc.height > 0 && desc.layers > 0,
            "texture '{}' has zero extent",
            desc.label
        );

        let mut usage = wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST;
        if desc.usage == TextureUsage::RenderTarget {
            usage |= wgpu::TextureUsages::RENDER_ATTACHMENT;
        }

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(desc.label),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: desc.layers,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: surface::to_wgpu_format(desc.format),
            usage,
            view_formats: &[],
        });

        if let Some(data) = data {
            let bytes_per_row = desc.width * desc.format.bytes_per_pixel();
            anyhow::ensure!(
                data.len() == (bytes_per_row * desc.height) as usize,
                "texture '{}' upload has {} bytes, expected {}",
                desc.label,
                data.len(),
                bytes_per_row * desc.height
            );
            self.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                data,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(desc.height),
                },
                wgpu::Extent3d {
                    width: desc.width,
                    height: desc.height,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(desc.label),
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            ..Default::default()
        });

        let id = TextureId(self.next());
        self.textures.insert(id, TextureEntry { texture, view });
        Ok(id)
    }

    fn texture_clear(&mut self, texture: TextureId, color: Color) -> Result<()> {
        let entry = self
            .textures
            .get(&texture)
            .with_context(|| format!("clear of unknown texture {texture:?}"))?;

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("prism texture clear"),
            });

        for layer in 0..entry.texture.depth_or_array_layers() {
            let view = entry.texture.create_view(&wgpu::TextureViewDescriptor {
                label: Some("prism clear view"),
                dimension: Some(wgpu::TextureViewDimension::D2),
                base_array_layer: layer,
                array_layer_count: Some(1),
                ..Default::default()
            });
            let _rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("prism texture clear pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: color.r as f64,
                            g: color.g as f64,
                            b: color.b as f64,
                            a: color.a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn uniform_set_create(&mut self, desc: &UniformSetDescriptor) -> Result<UniformSetId> {
        anyhow::ensure!(
            self.shaders.contains_key(&desc.shader),
            "uniform set references unknown shader {:?}",
            desc.shader
        );
        let texture = self
            .textures
            .get(&desc.texture)
            .with_context(|| format!("uniform set references freed texture {:?}", desc.texture))?;
        let sampler = self
            .samplers
            .get(&desc.sampler)
            .with_context(|| format!("uniform set references freed sampler {:?}", desc.sampler))?;

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("prism sampler+texture group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        let id = UniformSetId(self.next());
        self.uniform_sets.insert(
            id,
            UniformSetEntry {
                bind_group,
                texture: desc.texture,
                sampler: desc.sampler,
            },
        );
        Ok(id)
    }

    fn uniform_set_is_valid(&self, set: UniformSetId) -> bool {
        self.uniform_sets.get(&set).is_some_and(|e| {
            self.textures.contains_key(&e.texture) && self.samplers.contains_key(&e.sampler)
        })
    }

    fn free(&mut self, resource: Resource) {
        match resource {
            Resource::Shader(id) => {
                self.shaders.remove(&id);
            }
            Resource::Pipeline(id) => {
                self.pipelines.remove(&id);
            }
            Resource::Sampler(id) => {
                self.samplers.remove(&id);
            }
            Resource::Texture(id) => {
                if let Some(entry) = self.textures.remove(&id) {
                    entry.texture.destroy();
                }
            }
            Resource::UniformSet(id) => {
                self.uniform_sets.remove(&id);
            }
            Resource::IndexArray(id) => {
                if let Some(entry) = self.index_arrays.remove(&id) {
                    entry.buffer.destroy();
                }
            }
        }
    }

    fn draw_list_begin_for_screen(&mut self, screen: ScreenId, clear: Color) -> Result<DrawListId> {
        anyhow::ensure!(self.open.is_none(), "a draw list is already open");
        let prepared = self
            .screens
            .get(&screen)
            .is_some_and(|s| s.frame.is_some());
        anyhow::ensure!(prepared, "screen {screen:?} was not prepared for drawing");

        let id = DrawListId(self.next());
        self.open = Some(RecordedDrawList::new(id, screen, clear));
        Ok(id)
    }

    fn draw_list_bind_render_pipeline(&mut self, list: DrawListId, pipeline: PipelineId) {
        if let Some(open) = self.open_list(list) {
            open.commands.push(RecordedCommand::Pipeline(pipeline));
        }
    }

    fn draw_list_bind_index_array(&mut self, list: DrawListId, array: IndexArrayId) {
        if let Some(open) = self.open_list(list) {
            open.commands.push(RecordedCommand::IndexArray(array));
        }
    }

    fn draw_list_bind_uniform_set(&mut self, list: DrawListId, set: UniformSetId, set_index: u32) {
        if let Some(open) = self.open_list(list) {
            open.commands
                .push(RecordedCommand::UniformSet { set, set_index });
        }
    }

    fn draw_list_set_push_constant(&mut self, list: DrawListId, data: &[u8]) {
        if let Some(open) = self.open_list(list) {
            open.push_constant(data);
        }
    }

    fn draw_list_draw(&mut self, list: DrawListId, use_indices: bool) {
        if let Some(open) = self.open_list(list) {
            open.commands.push(RecordedCommand::Draw { use_indices });
        }
    }

    fn draw_list_end(&mut self) -> Result<()> {
        let list = self.open.take().context("no draw list is open")?;
        let commands = self.encode_list(&list)?;
        self.queue.submit(std::iter::once(commands));
        Ok(())
    }

    fn swap_buffers(&mut self, present: bool) -> Result<()> {
        for entry in self.screens.values_mut() {
            if let Some(frame) = entry.frame.take() {
                if present {
                    frame.present();
                }
            }
        }
        Ok(())
    }
}
