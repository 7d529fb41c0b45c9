use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use anyhow::{bail, Context, Result};

use crate::coords::Color;

use super::types::*;
use super::RenderingDevice;

/// Screen as simulated by [`HeadlessDevice`].
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessScreen {
    pub width: u32,
    pub height: u32,
    /// When false, `screen_prepare_for_drawing` reports `NotReady`.
    pub ready: bool,
    pub format: TextureFormat,
    pub color_space: ColorSpace,
    pub hdr: HdrOutput,
    pub pre_rotation_degrees: i32,
}

impl Default for HeadlessScreen {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            ready: true,
            format: TextureFormat::Bgra8UnormSrgb,
            color_space: ColorSpace::Rec709NonlinearSrgb,
            hdr: HdrOutput::default(),
            pre_rotation_degrees: 0,
        }
    }
}

/// One indexed or non-indexed draw together with the state bound at the time.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    pub list: DrawListId,
    pub pipeline: Option<PipelineId>,
    pub index_array: Option<IndexArrayId>,
    pub uniform_set: Option<UniformSetId>,
    pub push_constant: Vec<u8>,
    pub use_indices: bool,
}

/// Journal entry written by [`HeadlessDevice`].
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    ShaderCreated(ShaderId),
    PipelineCreated {
        id: PipelineId,
        format: FramebufferFormatId,
        blend: BlendState,
    },
    SamplerCreated(SamplerId),
    IndexArrayCreated(IndexArrayId),
    TextureCreated(TextureId),
    TextureCleared { texture: TextureId, color: Color },
    UniformSetCreated { id: UniformSetId, texture: TextureId },
    Freed(Resource),
    DrawListBegin { list: DrawListId, screen: ScreenId, clear: Color },
    Draw(RecordedDraw),
    DrawListEnd(DrawListId),
    SwapBuffers { present: bool },
}

#[derive(Debug, Default)]
struct OpenList {
    id: Option<DrawListId>,
    pipeline: Option<PipelineId>,
    index_array: Option<IndexArrayId>,
    uniform_set: Option<UniformSetId>,
    push_constant: Vec<u8>,
}

#[derive(Debug)]
struct HeadlessState {
    max_textures_per_stage: u64,
    next_id: u64,
    fail_pipelines: bool,
    fail_index_arrays: bool,

    screens: HashMap<ScreenId, HeadlessScreen>,
    prepared: HashSet<ScreenId>,
    formats: Vec<TextureFormat>,

    shaders: HashSet<ShaderId>,
    pipelines: HashSet<PipelineId>,
    samplers: HashSet<SamplerId>,
    index_arrays: HashSet<IndexArrayId>,
    textures: HashMap<TextureId, Option<Color>>,
    uniform_sets: HashMap<UniformSetId, UniformSetDescriptor>,

    open: OpenList,
    journal: Vec<DeviceCommand>,
}

impl HeadlessState {
    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn screen(&self, screen: ScreenId) -> Option<&HeadlessScreen> {
        self.screens.get(&screen)
    }

    fn live_resources(&self) -> usize {
        self.shaders.len()
            + self.pipelines.len()
            + self.samplers.len()
            + self.index_arrays.len()
            + self.textures.len()
            + self.uniform_sets.len()
    }

    fn check_list(&self, list: DrawListId) -> bool {
        if self.open.id == Some(list) {
            true
        } else {
            log::warn!("headless: command for draw list {list:?} which is not open");
            false
        }
    }
}

/// In-memory [`RenderingDevice`].
///
/// Resources are tracked for liveness only; nothing is rasterized. Every call
/// is appended to a journal that a [`HeadlessProbe`] can read after the device
/// has been handed to a compositor.
#[derive(Debug)]
pub struct HeadlessDevice {
    name: String,
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessDevice {
    /// Creates a device with a default main screen and a limit of 64
    /// textures per shader stage.
    pub fn new(name: impl Into<String>) -> Self {
        let mut screens = HashMap::new();
        screens.insert(ScreenId::MAIN, HeadlessScreen::default());

        Self {
            name: name.into(),
            state: Rc::new(RefCell::new(HeadlessState {
                max_textures_per_stage: 64,
                next_id: 0,
                fail_pipelines: false,
                fail_index_arrays: false,
                screens,
                prepared: HashSet::new(),
                formats: Vec::new(),
                shaders: HashSet::new(),
                pipelines: HashSet::new(),
                samplers: HashSet::new(),
                index_arrays: HashSet::new(),
                textures: HashMap::new(),
                uniform_sets: HashMap::new(),
                open: OpenList::default(),
                journal: Vec::new(),
            })),
        }
    }

    pub fn with_max_textures_per_stage(self, limit: u64) -> Self {
        self.state.borrow_mut().max_textures_per_stage = limit;
        self
    }

    pub fn with_screen(self, id: ScreenId, screen: HeadlessScreen) -> Self {
        self.state.borrow_mut().screens.insert(id, screen);
        self
    }

    /// Returns a handle sharing this device's state.
    pub fn probe(&self) -> HeadlessProbe {
        HeadlessProbe {
            state: Rc::clone(&self.state),
        }
    }
}

/// Inspection and fault-injection handle for a [`HeadlessDevice`].
#[derive(Debug, Clone)]
pub struct HeadlessProbe {
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessProbe {
    pub fn commands(&self) -> Vec<DeviceCommand> {
        self.state.borrow().journal.clone()
    }

    pub fn clear_commands(&self) {
        self.state.borrow_mut().journal.clear();
    }

    pub fn draws(&self) -> Vec<RecordedDraw> {
        self.state
            .borrow()
            .journal
            .iter()
            .filter_map(|c| match c {
                DeviceCommand::Draw(d) => Some(d.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn pipelines_created(&self) -> usize {
        self.state
            .borrow()
            .journal
            .iter()
            .filter(|c| matches!(c, DeviceCommand::PipelineCreated { .. }))
            .count()
    }

    pub fn uniform_sets_created(&self) -> usize {
        self.state
            .borrow()
            .journal
            .iter()
            .filter(|c| matches!(c, DeviceCommand::UniformSetCreated { .. }))
            .count()
    }

    /// Number of resources created and not yet freed.
    pub fn live_resources(&self) -> usize {
        self.state.borrow().live_resources()
    }

    pub fn is_texture_alive(&self, texture: TextureId) -> bool {
        self.state.borrow().textures.contains_key(&texture)
    }

    /// Last clear color applied to `texture`, if any.
    pub fn texture_clear_color(&self, texture: TextureId) -> Option<Color> {
        self.state.borrow().textures.get(&texture).copied().flatten()
    }

    pub fn set_screen_ready(&self, screen: ScreenId, ready: bool) {
        if let Some(s) = self.state.borrow_mut().screens.get_mut(&screen) {
            s.ready = ready;
        }
    }

    pub fn set_screen(&self, id: ScreenId, screen: HeadlessScreen) {
        self.state.borrow_mut().screens.insert(id, screen);
    }

    /// Makes every subsequent pipeline creation fail.
    pub fn set_fail_pipelines(&self, fail: bool) {
        self.state.borrow_mut().fail_pipelines = fail;
    }

    /// Makes every subsequent index-array creation fail.
    pub fn set_fail_index_arrays(&self, fail: bool) {
        self.state.borrow_mut().fail_index_arrays = fail;
    }
}

impl RenderingDevice for HeadlessDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn limit(&self, limit: DeviceLimit) -> u64 {
        match limit {
            DeviceLimit::MaxTexturesPerShaderStage => self.state.borrow().max_textures_per_stage,
        }
    }

    fn screen_prepare_for_drawing(&mut self, screen: ScreenId) -> SurfaceStatus {
        let mut state = self.state.borrow_mut();
        let ready = state
            .screen(screen)
            .is_some_and(|s| s.ready && s.width > 0 && s.height > 0);
        if ready {
            state.prepared.insert(screen);
            SurfaceStatus::Ready
        } else {
            SurfaceStatus::NotReady
        }
    }

    fn screen_framebuffer_format(&mut self, screen: ScreenId) -> Result<FramebufferFormatId> {
        let mut state = self.state.borrow_mut();
        let format = state
            .screen(screen)
            .map(|s| s.format)
            .with_context(|| format!("unknown screen {screen:?}"))?;

        let index = match state.formats.iter().position(|f| *f == format) {
            Some(i) => i,
            None => {
                state.formats.push(format);
                state.formats.len() - 1
            }
        };
        Ok(FramebufferFormatId(index as u64))
    }

    fn screen_size(&self, screen: ScreenId) -> (u32, u32) {
        self.state
            .borrow()
            .screen(screen)
            .map_or((0, 0), |s| (s.width, s.height))
    }

    fn screen_pre_rotation_degrees(&self, screen: ScreenId) -> i32 {
        self.state
            .borrow()
            .screen(screen)
            .map_or(0, |s| s.pre_rotation_degrees)
    }

    fn screen_color_space(&self, screen: ScreenId) -> ColorSpace {
        self.state
            .borrow()
            .screen(screen)
            .map_or(ColorSpace::default(), |s| s.color_space)
    }

    fn screen_hdr_output(&self, screen: ScreenId) -> HdrOutput {
        self.state
            .borrow()
            .screen(screen)
            .map_or(HdrOutput::default(), |s| s.hdr)
    }

    fn screen_resize(&mut self, screen: ScreenId, width: u32, height: u32) {
        if let Some(s) = self.state.borrow_mut().screens.get_mut(&screen) {
            s.width = width;
            s.height = height;
        }
    }

    fn shader_create(&mut self, _desc: &ShaderDescriptor<'_>) -> Result<ShaderId> {
        let mut state = self.state.borrow_mut();
        let id = ShaderId(state.next());
        state.shaders.insert(id);
        state.journal.push(DeviceCommand::ShaderCreated(id));
        Ok(id)
    }

    fn render_pipeline_create(&mut self, desc: &PipelineDescriptor<'_>) -> Result<PipelineId> {
        let mut state = self.state.borrow_mut();
        if state.fail_pipelines {
            bail!("pipeline '{}' rejected by device", desc.label);
        }
        anyhow::ensure!(
            state.shaders.contains(&desc.shader),
            "pipeline '{}' references unknown shader {:?}",
            desc.label,
            desc.shader
        );
        let id = PipelineId(state.next());
        state.pipelines.insert(id);
        state.journal.push(DeviceCommand::PipelineCreated {
            id,
            format: desc.framebuffer_format,
            blend: desc.blend,
        });
        Ok(id)
    }

    fn sampler_create(&mut self, _state: &SamplerState) -> Result<SamplerId> {
        let mut state = self.state.borrow_mut();
        let id = SamplerId(state.next());
        state.samplers.insert(id);
        state.journal.push(DeviceCommand::SamplerCreated(id));
        Ok(id)
    }

    fn index_array_create(&mut self, indices: &[u16]) -> Result<IndexArrayId> {
        anyhow::ensure!(!indices.is_empty(), "empty index array");
        let mut state = self.state.borrow_mut();
        if state.fail_index_arrays {
            bail!("index array rejected by device");
        }
        let id = IndexArrayId(state.next());
        state.index_arrays.insert(id);
        state.journal.push(DeviceCommand::IndexArrayCreated(id));
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
        if let Some(data) = data {
            let expected = (desc.width * desc.height * desc.format.bytes_per_pixel()) as usize;
            anyhow::ensure!(
                data.len() == expected,
                "texture '{}' upload is {} bytes, expected {expected}",
                desc.label,
                data.len()
            );
        }
        let mut state = self.state.borrow_mut();
        let id = TextureId(state.next());
        state.textures.insert(id, None);
        state.journal.push(DeviceCommand::TextureCreated(id));
        Ok(id)
    }

    fn texture_clear(&mut self, texture: TextureId, color: Color) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let slot = state
            .textures
            .get_mut(&texture)
            .with_context(|| format!("clear of unknown texture {texture:?}"))?;
        *slot = Some(color);
        state.journal.push(DeviceCommand::TextureCleared { texture, color });
        Ok(())
    }

    fn uniform_set_create(&mut self, desc: &UniformSetDescriptor) -> Result<UniformSetId> {
        let mut state = self.state.borrow_mut();
        anyhow::ensure!(
            state.textures.contains_key(&desc.texture),
            "uniform set references freed texture {:?}",
            desc.texture
        );
        anyhow::ensure!(
            state.samplers.contains(&desc.sampler),
            "uniform set references freed sampler {:?}",
            desc.sampler
        );
        let id = UniformSetId(state.next());
        state.uniform_sets.insert(id, *desc);
        state.journal.push(DeviceCommand::UniformSetCreated {
            id,
            texture: desc.texture,
        });
        Ok(id)
    }

    fn uniform_set_is_valid(&self, set: UniformSetId) -> bool {
        let state = self.state.borrow();
        state.uniform_sets.get(&set).is_some_and(|d| {
            state.textures.contains_key(&d.texture) && state.samplers.contains(&d.sampler)
        })
    }

    fn free(&mut self, resource: Resource) {
        let mut state = self.state.borrow_mut();
        let removed = match resource {
            Resource::Shader(id) => state.shaders.remove(&id),
            Resource::Pipeline(id) => state.pipelines.remove(&id),
            Resource::Sampler(id) => state.samplers.remove(&id),
            Resource::Texture(id) => state.textures.remove(&id).is_some(),
            Resource::UniformSet(id) => state.uniform_sets.remove(&id).is_some(),
            Resource::IndexArray(id) => state.index_arrays.remove(&id),
        };
        if removed {
            state.journal.push(DeviceCommand::Freed(resource));
        }
    }

    fn draw_list_begin_for_screen(&mut self, screen: ScreenId, clear: Color) -> Result<DrawListId> {
        let mut state = self.state.borrow_mut();
        anyhow::ensure!(state.open.id.is_none(), "a draw list is already open");
        anyhow::ensure!(
            state.prepared.contains(&screen),
            "screen {screen:?} was not prepared for drawing"
        );
        let list = DrawListId(state.next());
        state.open = OpenList {
            id: Some(list),
            ..OpenList::default()
        };
        state
            .journal
            .push(DeviceCommand::DrawListBegin { list, screen, clear });
        Ok(list)
    }

    fn draw_list_bind_render_pipeline(&mut self, list: DrawListId, pipeline: PipelineId) {
        let mut state = self.state.borrow_mut();
        if state.check_list(list) {
            state.open.pipeline = Some(pipeline);
        }
    }

    fn draw_list_bind_index_array(&mut self, list: DrawListId, array: IndexArrayId) {
        let mut state = self.state.borrow_mut();
        if state.check_list(list) {
            state.open.index_array = Some(array);
        }
    }

    fn draw_list_bind_uniform_set(&mut self, list: DrawListId, set: UniformSetId, _set_index: u32) {
        let mut state = self.state.borrow_mut();
        if state.check_list(list) {
            state.open.uniform_set = Some(set);
        }
    }

    fn draw_list_set_push_constant(&mut self, list: DrawListId, data: &[u8]) {
        let mut state = self.state.borrow_mut();
        if state.check_list(list) {
            state.open.push_constant = data.to_vec();
        }
    }

    fn draw_list_draw(&mut self, list: DrawListId, use_indices: bool) {
        let mut state = self.state.borrow_mut();
        if !state.check_list(list) {
            return;
        }
        let draw = RecordedDraw {
            list,
            pipeline: state.open.pipeline,
            index_array: state.open.index_array,
            uniform_set: state.open.uniform_set,
            push_constant: state.open.push_constant.clone(),
            use_indices,
        };
        state.journal.push(DeviceCommand::Draw(draw));
    }

    fn draw_list_end(&mut self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let list = state.open.id.take().context("no draw list is open")?;
        state.open = OpenList::default();
        state.journal.push(DeviceCommand::DrawListEnd(list));
        Ok(())
    }

    fn swap_buffers(&mut self, present: bool) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.prepared.clear();
        state.journal.push(DeviceCommand::SwapBuffers { present });
        Ok(())
    }
}
