use anyhow::{Context, Result};

use crate::device::RenderingDevice;
use crate::storage::TextureStorage;
use crate::subsystems::{
    CanvasRenderer, SceneRenderer, Subsystem, SubsystemFactory, SubsystemKind,
};

use super::RendererTier;

/// Every subsystem instance one GPU context owns.
///
/// Construction order is uniform-set cache, framebuffer cache, utilities,
/// texture storage, material, mesh, light, particles, fog, canvas, scene.
/// [`release`](Self::release) walks it backwards, and the fields are
/// declared backwards so that drop follows the same order.
pub struct SubsystemSet {
    scene: Box<dyn SceneRenderer>,
    canvas: Box<dyn CanvasRenderer>,
    fog: Box<dyn Subsystem>,
    particles: Box<dyn Subsystem>,
    light: Box<dyn Subsystem>,
    mesh: Box<dyn Subsystem>,
    material: Box<dyn Subsystem>,
    texture_storage: TextureStorage,
    utilities: Box<dyn Subsystem>,
    framebuffer_cache: Box<dyn Subsystem>,
    uniform_set_cache: Box<dyn Subsystem>,

    tier: RendererTier,
}

fn create_slot(
    factory: &mut dyn SubsystemFactory,
    kind: SubsystemKind,
    device: &mut dyn RenderingDevice,
) -> Result<Box<dyn Subsystem>> {
    factory
        .create(kind, device)
        .with_context(|| format!("creating {}", kind.label()))
}

impl SubsystemSet {
    /// Builds and initializes a full set against `device`.
    ///
    /// On failure the instances built so far are dropped without a release
    /// pass; the caller drops the device with them.
    pub fn create(
        device: &mut dyn RenderingDevice,
        factory: &mut dyn SubsystemFactory,
        tier: RendererTier,
    ) -> Result<Self> {
        let uniform_set_cache = create_slot(factory, SubsystemKind::UniformSetCache, device)?;
        let framebuffer_cache = create_slot(factory, SubsystemKind::FramebufferCache, device)?;
        let utilities = create_slot(factory, SubsystemKind::Utilities, device)?;
        let texture_storage = TextureStorage::new();
        let material = create_slot(factory, SubsystemKind::Material, device)?;
        let mesh = create_slot(factory, SubsystemKind::Mesh, device)?;
        let light = create_slot(factory, SubsystemKind::Light, device)?;
        let particles = create_slot(factory, SubsystemKind::Particles, device)?;
        let fog = create_slot(factory, SubsystemKind::Fog, device)?;

        let canvas = factory
            .canvas_renderer(device)
            .context("creating canvas renderer")?;
        let mut scene = factory
            .scene_renderer(tier, device)
            .context("creating scene renderer")?;
        scene.init(device).context("initializing scene renderer")?;

        Ok(Self {
            scene,
            canvas,
            fog,
            particles,
            light,
            mesh,
            material,
            texture_storage,
            utilities,
            framebuffer_cache,
            uniform_set_cache,
            tier,
        })
    }

    /// Releases device resources of every instance, scene first.
    pub fn release(&mut self, device: &mut dyn RenderingDevice) {
        self.scene.release(device);
        self.canvas.release(device);
        for slot in [
            &mut self.fog,
            &mut self.particles,
            &mut self.light,
            &mut self.mesh,
            &mut self.material,
        ] {
            slot.release(device);
        }
        self.texture_storage.release(device);
        for slot in [
            &mut self.utilities,
            &mut self.framebuffer_cache,
            &mut self.uniform_set_cache,
        ] {
            slot.release(device);
        }
    }

    #[inline]
    pub fn tier(&self) -> RendererTier {
        self.tier
    }

    pub fn texture_storage(&self) -> &TextureStorage {
        &self.texture_storage
    }

    pub fn texture_storage_mut(&mut self) -> &mut TextureStorage {
        &mut self.texture_storage
    }

    pub fn canvas(&mut self) -> &mut dyn CanvasRenderer {
        self.canvas.as_mut()
    }

    pub fn scene(&mut self) -> &mut dyn SceneRenderer {
        self.scene.as_mut()
    }

    pub fn slot(&self, kind: SubsystemKind) -> &dyn Subsystem {
        match kind {
            SubsystemKind::UniformSetCache => self.uniform_set_cache.as_ref(),
            SubsystemKind::FramebufferCache => self.framebuffer_cache.as_ref(),
            SubsystemKind::Utilities => self.utilities.as_ref(),
            SubsystemKind::Material => self.material.as_ref(),
            SubsystemKind::Mesh => self.mesh.as_ref(),
            SubsystemKind::Light => self.light.as_ref(),
            SubsystemKind::Particles => self.particles.as_ref(),
            SubsystemKind::Fog => self.fog.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, kind: SubsystemKind) -> &mut dyn Subsystem {
        match kind {
            SubsystemKind::UniformSetCache => self.uniform_set_cache.as_mut(),
            SubsystemKind::FramebufferCache => self.framebuffer_cache.as_mut(),
            SubsystemKind::Utilities => self.utilities.as_mut(),
            SubsystemKind::Material => self.material.as_mut(),
            SubsystemKind::Mesh => self.mesh.as_mut(),
            SubsystemKind::Light => self.light.as_mut(),
            SubsystemKind::Particles => self.particles.as_mut(),
            SubsystemKind::Fog => self.fog.as_mut(),
        }
    }
}
