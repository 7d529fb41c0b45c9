//! Contracts of the rendering subsystems a GPU context owns.
//!
//! The compositor owns their lifetime and hands them out through
//! [`ContextHandle`](crate::context::ContextHandle); their internals belong
//! to the host. Every instance is created against, and released on, the
//! device of the context that owns it.

use std::any::Any;

use anyhow::Result;

use crate::context::RendererTier;
use crate::device::RenderingDevice;

/// A per-context subsystem instance.
pub trait Subsystem: Any {
    fn label(&self) -> &'static str;

    /// Frees device resources. Called once, on the owning device, before drop.
    fn release(&mut self, _device: &mut dyn RenderingDevice) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// 2D canvas renderer.
pub trait CanvasRenderer: Subsystem {
    fn set_time(&mut self, time: f64);
}

/// 3D scene renderer (forward clustered or forward mobile).
pub trait SceneRenderer: Subsystem {
    /// Device-side setup (shader warm-up, default resources).
    fn init(&mut self, device: &mut dyn RenderingDevice) -> Result<()>;

    fn set_time(&mut self, time: f64, step: f64);

    fn tier(&self) -> RendererTier;

    /// Optional helper object exposed by the renderer.
    fn capability(&mut self, kind: CapabilityKind) -> Option<&mut dyn Any>;
}

/// Helper objects a scene renderer may expose.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum CapabilityKind {
    /// Forward-ID allocator.
    ForwardIds,
    /// Copy/post-effect helper.
    CopyEffects,
    GlobalIllumination,
    /// Clustered scene-shader singleton.
    SceneShader,
    ScreenSpaceEffects,
}

impl CapabilityKind {
    pub const ALL: [CapabilityKind; 5] = [
        CapabilityKind::ForwardIds,
        CapabilityKind::CopyEffects,
        CapabilityKind::GlobalIllumination,
        CapabilityKind::SceneShader,
        CapabilityKind::ScreenSpaceEffects,
    ];

    /// Only meaningful on the clustered tier.
    pub const fn clustered_only(self) -> bool {
        matches!(
            self,
            CapabilityKind::SceneShader | CapabilityKind::ScreenSpaceEffects
        )
    }
}

/// Opaque storage/cache slots of a context.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SubsystemKind {
    UniformSetCache,
    FramebufferCache,
    Utilities,
    Material,
    Mesh,
    Light,
    Particles,
    Fog,
}

impl SubsystemKind {
    pub const fn label(self) -> &'static str {
        match self {
            SubsystemKind::UniformSetCache => "uniform set cache",
            SubsystemKind::FramebufferCache => "framebuffer cache",
            SubsystemKind::Utilities => "utilities",
            SubsystemKind::Material => "material storage",
            SubsystemKind::Mesh => "mesh storage",
            SubsystemKind::Light => "light storage",
            SubsystemKind::Particles => "particles storage",
            SubsystemKind::Fog => "fog",
        }
    }
}

/// Builds subsystem instances for a context being constructed.
///
/// Supplied by the host; the compositor calls it once per context, with
/// that context's device.
pub trait SubsystemFactory {
    fn create(
        &mut self,
        kind: SubsystemKind,
        device: &mut dyn RenderingDevice,
    ) -> Result<Box<dyn Subsystem>>;

    fn canvas_renderer(&mut self, device: &mut dyn RenderingDevice)
        -> Result<Box<dyn CanvasRenderer>>;

    fn scene_renderer(
        &mut self,
        tier: RendererTier,
        device: &mut dyn RenderingDevice,
    ) -> Result<Box<dyn SceneRenderer>>;
}
