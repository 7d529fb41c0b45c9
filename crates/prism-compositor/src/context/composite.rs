use anyhow::{Context, Result};
use image::RgbaImage;

use crate::blit::{
    stretched_screen_rect, BlitMode, BlitOutcome, BlitPipelines, BlitPushConstant, BlitTarget,
    ScreenOutput, SplashStretchMode,
};
use crate::coords::{Color, Rect, Vec2};
use crate::device::{
    ColorSpace, DrawListId, FilterMode, IndexArrayId, RenderingDevice, Resource, SamplerState,
    ScreenId, SurfaceStatus, UniformSetDescriptor, UniformSetId,
};

use super::GpuContext;

impl GpuContext {
    /// Composites `targets`, in order, onto `screen` in one draw list.
    ///
    /// A screen that cannot accept a frame is a silent no-op. Targets whose
    /// texture is unavailable are skipped. Device failures propagate.
    pub(crate) fn blit_render_targets_to_screen(
        &mut self,
        screen: ScreenId,
        targets: &[BlitTarget],
    ) -> Result<BlitOutcome> {
        let device = self.device.as_mut();

        if device.screen_prepare_for_drawing(screen) == SurfaceStatus::NotReady {
            return Ok(BlitOutcome::SurfaceNotReady);
        }

        let format = device.screen_framebuffer_format(screen)?;
        let pipelines = self.blit.pipelines.get_pipelines_for_format(device, format)?;

        let list = device.draw_list_begin_for_screen(screen, Color::BLACK)?;
        let output = ScreenOutput::query(device, screen);

        let recorded = self.record_targets(list, &pipelines, &output, targets);
        // The list is closed even when recording failed part-way.
        let ended = self.device.draw_list_end();
        let (drawn, skipped) = recorded?;
        ended?;

        Ok(BlitOutcome::Composited { drawn, skipped })
    }

    fn record_targets(
        &mut self,
        list: DrawListId,
        pipelines: &BlitPipelines,
        output: &ScreenOutput,
        targets: &[BlitTarget],
    ) -> Result<(usize, usize)> {
        let device = self.device.as_mut();
        let storage = self.subsystems.texture_storage();
        let binding_shader = self.blit.pipelines.shader(BlitMode::Normal);

        let mut drawn = 0;
        let mut skipped = 0;

        for target in targets {
            let rt = target.render_target;
            let Some(texture) = storage.render_target_texture(rt) else {
                skipped += 1;
                continue;
            };

            let set = self.blit.descriptors.get_or_create(
                device,
                texture,
                self.blit.sampler,
                binding_shader,
            )?;

            let mode = BlitMode::select(
                target.lens_distortion.apply,
                target.multi_view.use_layer,
            );
            let push = BlitPushConstant::for_target(
                target,
                output,
                !storage.render_target_is_using_hdr(rt),
                storage.render_target_is_using_debanding(rt),
            );

            draw_quad(device, list, pipelines, mode, self.blit.quad, set, &push);
            drawn += 1;
        }

        Ok((drawn, skipped))
    }

    /// Shows `image` on the main screen and presents immediately.
    ///
    /// Returns `false` without drawing for an empty image or a screen that
    /// cannot accept a frame. The temporary texture, sampler and binding set
    /// are freed before returning.
    pub(crate) fn set_boot_image_with_stretch(
        &mut self,
        image: &RgbaImage,
        background: Color,
        stretch_mode: SplashStretchMode,
        use_filter: bool,
    ) -> Result<bool> {
        if image.width() == 0 || image.height() == 0 {
            return Ok(false);
        }

        let screen = ScreenId::MAIN;
        let device = self.device.as_mut();

        if device.screen_prepare_for_drawing(screen) == SurfaceStatus::NotReady {
            return Ok(false);
        }

        let format = device.screen_framebuffer_format(screen)?;
        let pipelines = self.blit.pipelines.get_pipelines_for_format(device, format)?;

        let storage = self.subsystems.texture_storage_mut();
        let texture = storage.texture_from_image(device, image)?;

        let filter = if use_filter {
            FilterMode::Linear
        } else {
            FilterMode::Nearest
        };
        let sampler = match device.sampler_create(&SamplerState::single_level(filter)) {
            Ok(sampler) => sampler,
            Err(err) => {
                storage.texture_free(device, texture);
                return Err(err.context("creating boot image sampler"));
            }
        };

        let set = device.uniform_set_create(&UniformSetDescriptor {
            shader: self.blit.pipelines.shader(BlitMode::Normal),
            sampler,
            texture,
        });

        let shown = match set {
            Ok(set) => {
                let output = ScreenOutput::query(device, screen);
                let shown = draw_boot_image(
                    device,
                    screen,
                    &pipelines,
                    self.blit.quad,
                    set,
                    &output,
                    Vec2::new(image.width() as f32, image.height() as f32),
                    background,
                    stretch_mode,
                );
                device.free(Resource::UniformSet(set));
                shown
            }
            Err(err) => Err(err.context("binding boot image")),
        };

        storage.texture_free(device, texture);
        device.free(Resource::Sampler(sampler));

        shown.map(|()| true)
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_boot_image(
    device: &mut dyn RenderingDevice,
    screen: ScreenId,
    pipelines: &BlitPipelines,
    quad: IndexArrayId,
    set: UniformSetId,
    output: &ScreenOutput,
    image_size: Vec2,
    background: Color,
    stretch_mode: SplashStretchMode,
) -> Result<()> {
    let dst: Rect = stretched_screen_rect(image_size, output.size, stretch_mode)
        .normalized_by(output.size);

    // Screens that are not nonlinear sRGB take linear, luminance-scaled clears.
    let clear = if output.color_space == ColorSpace::Rec709NonlinearSrgb {
        background
    } else {
        background
            .srgb_to_linear()
            .scaled_rgb(output.reference_multiplier())
    };

    let list = device.draw_list_begin_for_screen(screen, clear)?;
    let push = BlitPushConstant::for_boot_image(dst, output);
    draw_quad(device, list, pipelines, BlitMode::NormalAlpha, quad, set, &push);
    device.draw_list_end()?;

    device
        .swap_buffers(true)
        .context("presenting boot image")
}

fn draw_quad(
    device: &mut dyn RenderingDevice,
    list: DrawListId,
    pipelines: &BlitPipelines,
    mode: BlitMode,
    quad: IndexArrayId,
    set: UniformSetId,
    push: &BlitPushConstant,
) {
    device.draw_list_bind_render_pipeline(list, pipelines.get(mode));
    device.draw_list_bind_index_array(list, quad);
    device.draw_list_bind_uniform_set(list, set, 0);
    device.draw_list_set_push_constant(list, push.as_bytes());
    device.draw_list_draw(list, true);
}
