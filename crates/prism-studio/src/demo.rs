//! Minimal subsystem implementations for the demo host.
//!
//! They own no device resources; they only trace their lifecycle so the log
//! shows which device each one was created on and released from.

use std::any::Any;

use anyhow::Result;

use prism_compositor::context::RendererTier;
use prism_compositor::device::RenderingDevice;
use prism_compositor::subsystems::{
    CanvasRenderer, CapabilityKind, SceneRenderer, Subsystem, SubsystemFactory, SubsystemKind,
};

struct TracedSubsystem {
    label: &'static str,
}

impl Subsystem for TracedSubsystem {
    fn label(&self) -> &'static str {
        self.label
    }

    fn release(&mut self, device: &mut dyn RenderingDevice) {
        log::trace!("release {} on {}", self.label, device.name());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Default)]
pub struct DemoCanvas {
    time: f64,
}

impl DemoCanvas {
    pub fn time(&self) -> f64 {
        self.time
    }
}

impl Subsystem for DemoCanvas {
    fn label(&self) -> &'static str {
        "canvas renderer"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl CanvasRenderer for DemoCanvas {
    fn set_time(&mut self, time: f64) {
        self.time = time;
    }
}

/// Scene renderer exposing a forward-id counter as its only capability.
pub struct DemoScene {
    tier: RendererTier,
    forward_ids: u32,
}

impl Subsystem for DemoScene {
    fn label(&self) -> &'static str {
        "scene renderer"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl SceneRenderer for DemoScene {
    fn init(&mut self, device: &mut dyn RenderingDevice) -> Result<()> {
        log::debug!("{:?} scene renderer ready on {}", self.tier, device.name());
        Ok(())
    }

    fn set_time(&mut self, time: f64, step: f64) {
        log::trace!("scene time {time:.3} (+{step:.3})");
    }

    fn tier(&self) -> RendererTier {
        self.tier
    }

    fn capability(&mut self, kind: CapabilityKind) -> Option<&mut dyn Any> {
        match kind {
            CapabilityKind::ForwardIds => Some(&mut self.forward_ids),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct DemoFactory;

impl SubsystemFactory for DemoFactory {
    fn create(
        &mut self,
        kind: SubsystemKind,
        device: &mut dyn RenderingDevice,
    ) -> Result<Box<dyn Subsystem>> {
        log::trace!("create {} on {}", kind.label(), device.name());
        Ok(Box::new(TracedSubsystem { label: kind.label() }))
    }

    fn canvas_renderer(
        &mut self,
        _device: &mut dyn RenderingDevice,
    ) -> Result<Box<dyn CanvasRenderer>> {
        Ok(Box::new(DemoCanvas::default()))
    }

    fn scene_renderer(
        &mut self,
        tier: RendererTier,
        _device: &mut dyn RenderingDevice,
    ) -> Result<Box<dyn SceneRenderer>> {
        Ok(Box::new(DemoScene {
            tier,
            forward_ids: 0,
        }))
    }
}
