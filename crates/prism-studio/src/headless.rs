//! Offscreen run over two recording devices.

use anyhow::{Context, Result};

use prism_compositor::blit::{BlitOutcome, BlitTarget};
use prism_compositor::context::ContextId;
use prism_compositor::coords::{Color, Rect};
use prism_compositor::device::{HeadlessDevice, ScreenId};
use prism_compositor::storage::RenderTargetId;
use prism_compositor::subsystems::CapabilityKind;
use prism_compositor::{Compositor, CompositorConfig};

use crate::demo::{DemoCanvas, DemoFactory};

const STEP: f64 = 1.0 / 60.0;

pub fn run(frames: u64, config: CompositorConfig) -> Result<()> {
    let primary = HeadlessDevice::new("headless-0");
    let primary_probe = primary.probe();
    let mut compositor = Compositor::new(config, Box::new(primary), Box::new(DemoFactory))
        .context("failed to create compositor")?;

    let secondary = HeadlessDevice::new("headless-1").with_max_textures_per_stage(16);
    let secondary_probe = secondary.probe();
    compositor.ensure_gpu_context(1, Some(Box::new(secondary)))?;

    let gpu1 = ContextId::from_index(1);
    let left = compositor.current().render_target_create(640, 720, 1, false)?;
    let right = compositor.with_gpu_context(gpu1, |mut ctx| {
        if ctx.capability(CapabilityKind::SceneShader).is_none() {
            log::info!("{} runs the {:?} tier", ctx.id(), ctx.tier());
        }
        ctx.render_target_create(640, 720, 1, true)
    })??;

    for _ in 0..frames {
        let now = compositor.begin_frame(STEP);
        let pulse = (now.time.sin() * 0.5 + 0.5) as f32;

        draw_half(&mut compositor, left, Color::new(pulse, 0.2, 0.4, 1.0), 0.0)?;

        compositor.bind_gpu_context(gpu1)?;
        draw_half(&mut compositor, right, Color::new(0.1, pulse, 0.3, 1.0), 640.0)?;
        compositor.unbind_gpu_context();

        let canvas_time = compositor
            .current()
            .canvas()
            .as_any()
            .downcast_ref::<DemoCanvas>()
            .map(DemoCanvas::time);
        log::debug!("frame {} canvas time {canvas_time:?}", now.frame);

        compositor.end_frame(true);
    }

    log::info!(
        "headless run done: {} draws on primary, {} on gpu1",
        primary_probe.draws().len(),
        secondary_probe.draws().len()
    );
    Ok(())
}

fn draw_half(
    compositor: &mut Compositor,
    target: RenderTargetId,
    color: Color,
    x: f32,
) -> Result<()> {
    let mut ctx = compositor.current();
    ctx.render_target_clear(target, color)?;

    let outcome = ctx.blit_render_targets_to_screen(
        ScreenId::MAIN,
        &[BlitTarget::new(target, Rect::new(x, 0.0, 640.0, 720.0))],
    )?;
    match outcome {
        BlitOutcome::SurfaceNotReady => log::debug!("{}: screen not ready", ctx.id()),
        BlitOutcome::Composited { drawn, skipped } => {
            log::trace!("{}: drew {drawn}, skipped {skipped}", ctx.id())
        }
    }
    Ok(())
}
