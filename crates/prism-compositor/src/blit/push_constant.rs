use bytemuck::{Pod, Zeroable};

use crate::coords::{Rect, Vec2};
use crate::device::{ColorSpace, HdrOutput, RenderingDevice, ScreenId};

use super::BlitTarget;

/// Per-draw parameter block of the blit shader.
///
/// Layout matches `BlitData` in `shaders/blit.wgsl` (96 bytes, std140-safe).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct BlitPushConstant {
    pub src_rect: [f32; 4],
    pub dst_rect: [f32; 4],

    pub rotation_sin: f32,
    pub rotation_cos: f32,
    pub eye_center: [f32; 2],

    pub k1: f32,
    pub k2: f32,
    pub upscale: f32,
    pub aspect_ratio: f32,

    pub layer: u32,
    pub source_is_srgb: u32,
    pub use_debanding: u32,
    pub target_color_space: u32,

    pub reference_multiplier: f32,
    pub output_max_value: f32,
    pub _pad: [u32; 2],
}

/// Screen parameters read once per composite call.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScreenOutput {
    /// Physical pixels, as reported by the device (not rotated).
    pub size: Vec2,
    pub pre_rotation_degrees: i32,
    pub color_space: ColorSpace,
    pub hdr: HdrOutput,
}

impl ScreenOutput {
    pub fn query(device: &dyn RenderingDevice, screen: ScreenId) -> Self {
        Self {
            size: device.screen_size(screen).into(),
            pre_rotation_degrees: device.screen_pre_rotation_degrees(screen),
            color_space: device.screen_color_space(screen),
            hdr: device.screen_hdr_output(screen),
        }
    }

    pub fn reference_multiplier(&self) -> f32 {
        reference_multiplier(
            self.color_space,
            self.hdr.reference_luminance,
            self.hdr.linear_luminance_scale,
        )
    }

    /// The compositor undoes the panel's pre-rotation.
    #[inline]
    pub fn counter_rotation_degrees(&self) -> i32 {
        -self.pre_rotation_degrees
    }

    /// `(sin, cos)` of the counter-rotation.
    pub fn rotation(&self) -> (f32, f32) {
        (self.counter_rotation_degrees() as f32).to_radians().sin_cos()
    }

    /// Extent destination rects are normalized against. Width and height
    /// swap when the screen is not in its native orientation.
    pub fn normalization_extent(&self) -> Vec2 {
        if self.counter_rotation_degrees() % 180 != 0 {
            self.size.swapped()
        } else {
            self.size
        }
    }
}

/// Scale from scene-referred 1.0 to the screen's linear encoding.
///
/// Only the linear Rec.709 space is luminance-scaled; every other space
/// gets 1.0 regardless of the luminance inputs.
pub fn reference_multiplier(
    color_space: ColorSpace,
    reference_luminance: f32,
    linear_luminance_scale: f32,
) -> f32 {
    match color_space {
        ColorSpace::Rec709Linear => reference_luminance / linear_luminance_scale,
        _ => 1.0,
    }
}

impl BlitPushConstant {
    /// Parameters for compositing `target`.
    ///
    /// `source_is_srgb` and `use_debanding` come from the render target's
    /// storage flags.
    pub fn for_target(
        target: &BlitTarget,
        output: &ScreenOutput,
        source_is_srgb: bool,
        use_debanding: bool,
    ) -> Self {
        let (rotation_sin, rotation_cos) = output.rotation();
        let lens = &target.lens_distortion;

        Self {
            src_rect: target.src_rect.to_array(),
            dst_rect: target
                .dst_rect
                .normalized_by(output.normalization_extent())
                .to_array(),
            rotation_sin,
            rotation_cos,
            eye_center: lens.eye_center.to_array(),
            k1: lens.k1,
            k2: lens.k2,
            upscale: lens.upscale,
            aspect_ratio: lens.aspect_ratio,
            layer: target.multi_view.layer,
            source_is_srgb: source_is_srgb as u32,
            use_debanding: use_debanding as u32,
            target_color_space: output.color_space.push_constant_tag(),
            reference_multiplier: output.reference_multiplier(),
            output_max_value: output.hdr.output_max_linear_value,
            _pad: [0; 2],
        }
    }

    /// Parameters for the boot splash. `dst_rect` is already normalized.
    pub fn for_boot_image(dst_rect: Rect, output: &ScreenOutput) -> Self {
        let (rotation_sin, rotation_cos) = output.rotation();

        Self {
            src_rect: Rect::unit().to_array(),
            dst_rect: dst_rect.to_array(),
            rotation_sin,
            rotation_cos,
            eye_center: [0.0, 0.0],
            k1: 0.0,
            k2: 0.0,
            upscale: 1.0,
            aspect_ratio: 1.0,
            layer: 0,
            source_is_srgb: 1,
            use_debanding: 0,
            target_color_space: output.color_space.push_constant_tag(),
            reference_multiplier: output.reference_multiplier(),
            output_max_value: output.hdr.output_max_linear_value,
            _pad: [0; 2],
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::RenderTargetId;
    use crate::blit::LensDistortion;

    fn output(w: f32, h: f32, rotation: i32) -> ScreenOutput {
        ScreenOutput {
            size: Vec2::new(w, h),
            pre_rotation_degrees: rotation,
            color_space: ColorSpace::Rec709NonlinearSrgb,
            hdr: HdrOutput::default(),
        }
    }

    #[test]
    fn block_is_96_bytes() {
        assert_eq!(std::mem::size_of::<BlitPushConstant>(), 96);
    }

    #[test]
    fn reference_multiplier_only_scales_linear_rec709() {
        assert_eq!(reference_multiplier(ColorSpace::Rec709Linear, 100.0, 50.0), 2.0);
        assert_eq!(
            reference_multiplier(ColorSpace::Rec709NonlinearSrgb, 100.0, 50.0),
            1.0
        );
        assert_eq!(
            reference_multiplier(ColorSpace::Rec2020NonlinearSt2084, 400.0, 80.0),
            1.0
        );
    }

    #[test]
    fn destination_is_normalized_by_screen_size() {
        let target = BlitTarget::new(RenderTargetId(1), Rect::new(100.0, 50.0, 200.0, 100.0));
        let pc = BlitPushConstant::for_target(&target, &output(800.0, 400.0, 0), true, false);
        assert_eq!(pc.dst_rect, [0.125, 0.125, 0.25, 0.25]);
        assert_eq!(pc.src_rect, [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn quarter_turns_swap_normalization_extent() {
        for deg in [90, 270, -90] {
            assert_eq!(
                output(800.0, 400.0, deg).normalization_extent(),
                Vec2::new(400.0, 800.0),
                "{deg}"
            );
        }
        for deg in [0, 180] {
            assert_eq!(
                output(800.0, 400.0, deg).normalization_extent(),
                Vec2::new(800.0, 400.0),
                "{deg}"
            );
        }
    }

    #[test]
    fn rotation_counters_pre_rotation() {
        let (sin, cos) = output(1.0, 1.0, 90).rotation();
        assert!((sin + 1.0).abs() < 1e-6);
        assert!(cos.abs() < 1e-6);

        let (sin, cos) = output(1.0, 1.0, 0).rotation();
        assert_eq!((sin, cos), (0.0, 1.0));
    }

    #[test]
    fn rotated_destination_uses_swapped_extent() {
        let target = BlitTarget::new(RenderTargetId(1), Rect::new(0.0, 0.0, 400.0, 800.0));
        let pc = BlitPushConstant::for_target(&target, &output(800.0, 400.0, 90), true, false);
        assert_eq!(pc.dst_rect, [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn target_flags_and_lens_are_copied() {
        let lens = LensDistortion {
            eye_center: Vec2::new(0.1, -0.2),
            k1: 0.22,
            k2: 0.24,
            upscale: 1.2,
            aspect_ratio: 0.9,
            ..LensDistortion::default()
        };
        let target = BlitTarget::new(RenderTargetId(3), Rect::new(0.0, 0.0, 10.0, 10.0))
            .with_layer(1)
            .with_lens_distortion(lens);
        let mut out = output(10.0, 10.0, 0);
        out.color_space = ColorSpace::Rec709Linear;
        out.hdr = HdrOutput {
            reference_luminance: 200.0,
            linear_luminance_scale: 80.0,
            output_max_linear_value: 4.0,
        };

        let pc = BlitPushConstant::for_target(&target, &out, false, true);
        assert_eq!(pc.layer, 1);
        assert_eq!(pc.eye_center, [0.1, -0.2]);
        assert_eq!((pc.k1, pc.k2, pc.upscale, pc.aspect_ratio), (0.22, 0.24, 1.2, 0.9));
        assert_eq!(pc.source_is_srgb, 0);
        assert_eq!(pc.use_debanding, 1);
        assert_eq!(pc.target_color_space, 1);
        assert_eq!(pc.reference_multiplier, 2.5);
        assert_eq!(pc.output_max_value, 4.0);
    }

    #[test]
    fn boot_image_block_is_neutral() {
        let pc = BlitPushConstant::for_boot_image(Rect::new(0.25, 0.25, 0.5, 0.5), &output(8.0, 8.0, 0));
        assert_eq!(pc.src_rect, [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(pc.dst_rect, [0.25, 0.25, 0.5, 0.5]);
        assert_eq!(pc.source_is_srgb, 1);
        assert_eq!(pc.use_debanding, 0);
        assert_eq!((pc.upscale, pc.aspect_ratio), (1.0, 1.0));
    }
}
