//! Windowed host: one window, one wgpu device, two animated render targets.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use prism_compositor::blit::{BlitOutcome, BlitTarget, SplashStretchMode};
use prism_compositor::coords::{Color, Rect};
use prism_compositor::device::{GpuInit, ScreenConfig, ScreenId, WgpuDevice};
use prism_compositor::storage::RenderTargetId;
use prism_compositor::time::FrameTime;
use prism_compositor::{Compositor, CompositorConfig};

use crate::demo::DemoFactory;

const STEP: f64 = 1.0 / 60.0;

#[derive(Debug, Clone)]
pub struct StudioConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub boot_image: Option<PathBuf>,
    pub compositor: CompositorConfig,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            title: "prism studio".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            boot_image: None,
            compositor: CompositorConfig::default(),
        }
    }
}

pub fn run(config: StudioConfig) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
    let mut state = Studio {
        config,
        session: None,
    };

    event_loop
        .run_app(&mut state)
        .context("winit event loop terminated with error")?;

    Ok(())
}

struct Session {
    // Dropped first so every GPU resource is released before the window.
    compositor: Compositor,
    targets: [RenderTargetId; 2],
    window: Arc<Window>,
}

struct Studio {
    config: StudioConfig,
    session: Option<Session>,
}

impl Studio {
    fn open(&self, event_loop: &ActiveEventLoop) -> Result<Session> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );
        let size = window.inner_size();

        let mut device = pollster::block_on(WgpuDevice::new(GpuInit::default()))?;
        device.attach_screen(
            ScreenId::MAIN,
            window.clone(),
            (size.width, size.height),
            ScreenConfig::default(),
        )?;

        let mut compositor = Compositor::new(
            self.config.compositor.clone(),
            Box::new(device),
            Box::new(DemoFactory),
        )?;

        if let Some(path) = &self.config.boot_image {
            show_boot_image(&mut compositor, path);
        }

        let (w, h) = half_extent(size);
        let mut ctx = compositor.current();
        let targets = [
            ctx.render_target_create(w, h, 1, false)?,
            ctx.render_target_create(w, h, 1, false)?,
        ];

        Ok(Session {
            compositor,
            targets,
            window,
        })
    }
}

impl Session {
    fn resize(&mut self, size: PhysicalSize<u32>) {
        let (w, h) = half_extent(size);
        let mut ctx = self.compositor.current();
        ctx.device().screen_resize(ScreenId::MAIN, size.width, size.height);
        for target in self.targets {
            if let Err(err) = ctx.render_target_set_size(target, w, h) {
                log::error!("failed to resize render target {target:?}: {err:#}");
            }
        }
    }

    fn frame(&mut self) -> Result<()> {
        let now = self.compositor.begin_frame(STEP);
        let size = self.window.inner_size();
        let half = size.width as f32 * 0.5;

        let mut ctx = self.compositor.current();
        let mut blits = Vec::with_capacity(self.targets.len());
        for (i, target) in self.targets.into_iter().enumerate() {
            ctx.render_target_clear(target, animated_color(now, i))?;
            blits.push(BlitTarget::new(
                target,
                Rect::new(half * i as f32, 0.0, half, size.height as f32),
            ));
        }

        let outcome = ctx.blit_render_targets_to_screen(ScreenId::MAIN, &blits)?;
        if let BlitOutcome::Composited { skipped, .. } = outcome {
            if skipped > 0 {
                log::warn!("{skipped} render targets were not ready");
            }
        }

        self.compositor.end_frame(true);
        Ok(())
    }
}

impl ApplicationHandler for Studio {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() {
            return;
        }

        match self.open(event_loop) {
            Ok(session) => {
                session.window.request_redraw();
                self.session = Some(session);
            }
            Err(e) => {
                log::error!("failed to start studio: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);

        if let Some(session) = &self.session {
            session.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                self.session = None;
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                session.resize(new_size);
                session.window.request_redraw();
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let new_size = session.window.inner_size();
                session.resize(new_size);
                session.window.request_redraw();
            }

            WindowEvent::RedrawRequested => {
                if let Err(e) = session.frame() {
                    log::error!("frame failed: {e:#}");
                    self.session = None;
                    event_loop.exit();
                }
            }

            _ => {}
        }
    }
}

fn show_boot_image(compositor: &mut Compositor, path: &Path) {
    let image = match image::open(path) {
        Ok(image) => image.to_rgba8(),
        Err(e) => {
            log::warn!("failed to load boot image {}: {e}", path.display());
            return;
        }
    };

    match compositor.set_boot_image_with_stretch(
        &image,
        Color::BLACK,
        SplashStretchMode::Keep,
        true,
    ) {
        Ok(true) => log::debug!("boot image shown"),
        Ok(false) => log::debug!("boot image skipped"),
        Err(e) => log::warn!("failed to show boot image: {e:#}"),
    }
}

fn half_extent(size: PhysicalSize<u32>) -> (u32, u32) {
    ((size.width / 2).max(1), size.height.max(1))
}

fn animated_color(now: FrameTime, index: usize) -> Color {
    let phase = now.time + index as f64 * std::f64::consts::FRAC_PI_2;
    let pulse = (phase.sin() * 0.5 + 0.5) as f32;
    if index == 0 {
        Color::new(pulse, 0.25, 0.45, 1.0)
    } else {
        Color::new(0.15, pulse, 0.35, 1.0)
    }
}
