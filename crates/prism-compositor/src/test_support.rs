//! Recording collaborators for unit tests.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{bail, Result};

use crate::context::RendererTier;
use crate::device::RenderingDevice;
use crate::subsystems::{
    CanvasRenderer, CapabilityKind, SceneRenderer, Subsystem, SubsystemFactory, SubsystemKind,
};

/// Shared, ordered event log.
#[derive(Debug, Clone, Default)]
pub(crate) struct EventLog(Rc<RefCell<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: String) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    /// Events starting with `prefix`, in order.
    pub fn matching(&self, prefix: &str) -> Vec<String> {
        self.0
            .borrow()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

struct RecordingSubsystem {
    label: &'static str,
    device: String,
    log: EventLog,
}

impl Subsystem for RecordingSubsystem {
    fn label(&self) -> &'static str {
        self.label
    }

    fn release(&mut self, device: &mut dyn RenderingDevice) {
        self.log
            .push(format!("release {} @ {}", self.label, device.name()));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Drop for RecordingSubsystem {
    fn drop(&mut self) {
        self.log.push(format!("drop {} @ {}", self.label, self.device));
    }
}

pub(crate) struct RecordingCanvas {
    device: String,
    log: EventLog,
}

impl Subsystem for RecordingCanvas {
    fn label(&self) -> &'static str {
        "canvas renderer"
    }

    fn release(&mut self, device: &mut dyn RenderingDevice) {
        self.log
            .push(format!("release canvas renderer @ {}", device.name()));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Drop for RecordingCanvas {
    fn drop(&mut self) {
        self.log.push(format!("drop canvas renderer @ {}", self.device));
    }
}

impl CanvasRenderer for RecordingCanvas {
    fn set_time(&mut self, time: f64) {
        self.log
            .push(format!("canvas time {time:.3} @ {}", self.device));
    }
}

/// Capability object handed out by [`RecordingScene`].
#[derive(Debug, PartialEq)]
pub(crate) struct CapabilityProbe {
    pub device: String,
    pub kind: CapabilityKind,
}

pub(crate) struct RecordingScene {
    device: String,
    tier: RendererTier,
    log: EventLog,
    capabilities: Vec<CapabilityProbe>,
}

impl Subsystem for RecordingScene {
    fn label(&self) -> &'static str {
        "scene renderer"
    }

    fn release(&mut self, device: &mut dyn RenderingDevice) {
        self.log
            .push(format!("release scene renderer @ {}", device.name()));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Drop for RecordingScene {
    fn drop(&mut self) {
        self.log.push(format!("drop scene renderer @ {}", self.device));
    }
}

impl SceneRenderer for RecordingScene {
    fn init(&mut self, device: &mut dyn RenderingDevice) -> Result<()> {
        self.log
            .push(format!("init scene renderer @ {}", device.name()));
        Ok(())
    }

    fn set_time(&mut self, time: f64, step: f64) {
        self.log
            .push(format!("scene time {time:.3} step {step:.3} @ {}", self.device));
    }

    fn tier(&self) -> RendererTier {
        self.tier
    }

    // Every kind is offered regardless of tier; gating is the handle's job.
    fn capability(&mut self, kind: CapabilityKind) -> Option<&mut dyn Any> {
        self.capabilities
            .iter_mut()
            .find(|c| c.kind == kind)
            .map(|c| c as &mut dyn Any)
    }
}

/// Factory whose instances journal create/release/drop with the device name.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingFactory {
    pub log: EventLog,
    /// Fail when asked for this slot.
    pub fail_on: Option<SubsystemKind>,
}

impl RecordingFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SubsystemFactory for RecordingFactory {
    fn create(
        &mut self,
        kind: SubsystemKind,
        device: &mut dyn RenderingDevice,
    ) -> Result<Box<dyn Subsystem>> {
        if self.fail_on == Some(kind) {
            bail!("{} refused on {}", kind.label(), device.name());
        }
        self.log
            .push(format!("create {} @ {}", kind.label(), device.name()));
        Ok(Box::new(RecordingSubsystem {
            label: kind.label(),
            device: device.name().to_owned(),
            log: self.log.clone(),
        }))
    }

    fn canvas_renderer(
        &mut self,
        device: &mut dyn RenderingDevice,
    ) -> Result<Box<dyn CanvasRenderer>> {
        self.log
            .push(format!("create canvas renderer @ {}", device.name()));
        Ok(Box::new(RecordingCanvas {
            device: device.name().to_owned(),
            log: self.log.clone(),
        }))
    }

    fn scene_renderer(
        &mut self,
        tier: RendererTier,
        device: &mut dyn RenderingDevice,
    ) -> Result<Box<dyn SceneRenderer>> {
        self.log
            .push(format!("create scene renderer {tier:?} @ {}", device.name()));
        let capabilities = CapabilityKind::ALL
            .into_iter()
            .map(|kind| CapabilityProbe {
                device: device.name().to_owned(),
                kind,
            })
            .collect();
        Ok(Box::new(RecordingScene {
            device: device.name().to_owned(),
            tier,
            log: self.log.clone(),
            capabilities,
        }))
    }
}
