use std::collections::BTreeMap;

use image::RgbaImage;

use crate::blit::{BlitOutcome, BlitTarget, SplashStretchMode};
use crate::config::CompositorConfig;
use crate::context::{ContextHandle, ContextId, GpuContext, GpuIndex};
use crate::coords::Color;
use crate::device::{RenderingDevice, ScreenId};
use crate::error::{CompositorError, Result};
use crate::shader_cache::ShaderCache;
use crate::subsystems::SubsystemFactory;
use crate::time::{FrameClock, FrameTime};

/// Multi-GPU screen compositor.
///
/// Owns the primary context and a registry of secondary ones. Exactly one
/// context is bound at a time; [`current`](Self::current) hands out its
/// subsystems and every frame operation runs against it.
///
/// Frame loop:
/// - `begin_frame(step)`
/// - per GPU: `bind_gpu_context`, render through `current()`,
///   `blit_render_targets_to_screen`, `unbind_gpu_context`
/// - `end_frame(present)`
pub struct Compositor {
    config: CompositorConfig,
    shader_cache: ShaderCache,
    clock: FrameClock,
    factory: Box<dyn SubsystemFactory>,

    active: ContextId,
    contexts: BTreeMap<GpuIndex, GpuContext>,
    primary: GpuContext,
}

impl Compositor {
    /// Builds the primary context on `device`.
    pub fn new(
        config: CompositorConfig,
        device: Box<dyn RenderingDevice>,
        mut factory: Box<dyn SubsystemFactory>,
    ) -> Result<Self> {
        let shader_cache = ShaderCache::configure(&config.shader_cache);
        let primary = GpuContext::create(
            ContextId::Primary,
            device,
            factory.as_mut(),
            &config.rendering_method,
        )?;

        Ok(Self {
            clock: FrameClock::new(config.time_rollover_secs),
            config,
            shader_cache,
            factory,
            active: ContextId::Primary,
            contexts: BTreeMap::new(),
            primary,
        })
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    pub fn shader_cache(&self) -> &ShaderCache {
        &self.shader_cache
    }

    pub fn frame_clock(&self) -> &FrameClock {
        &self.clock
    }

    // ── registry ──────────────────────────────────────────────────────────

    /// Registers a context for `index` on `device`.
    ///
    /// An index that is already registered is a successful no-op and the
    /// supplied device is dropped. Construction runs entirely against
    /// `device`; the current binding is left as it was.
    pub fn ensure_gpu_context(
        &mut self,
        index: u32,
        device: Option<Box<dyn RenderingDevice>>,
    ) -> Result<()> {
        let ContextId::Secondary(index) = ContextId::from_index(index) else {
            return Err(CompositorError::InvalidGpuIndex);
        };
        let device = device.ok_or(CompositorError::MissingDevice)?;

        if self.contexts.contains_key(&index) {
            return Ok(());
        }

        let context = GpuContext::create(
            ContextId::Secondary(index),
            device,
            self.factory.as_mut(),
            &self.config.rendering_method,
        )?;
        log::debug!(
            "multi-GPU: created GPU context {index} on {}",
            context.device_name()
        );
        self.contexts.insert(index, context);
        Ok(())
    }

    /// Makes `id` the bound context.
    ///
    /// Binding the primary context always succeeds. An unregistered index
    /// fails and keeps the current binding.
    pub fn bind_gpu_context(&mut self, id: ContextId) -> Result<()> {
        match id {
            ContextId::Primary => {
                self.unbind_gpu_context();
                Ok(())
            }
            ContextId::Secondary(index) => {
                if !self.contexts.contains_key(&index) {
                    return Err(CompositorError::UnknownContext(index));
                }
                self.active = id;
                Ok(())
            }
        }
    }

    /// Rebinds the primary context.
    pub fn unbind_gpu_context(&mut self) {
        self.active = ContextId::Primary;
    }

    #[inline]
    pub fn active_context(&self) -> ContextId {
        self.active
    }

    /// Capability token for the bound context.
    pub fn current(&mut self) -> ContextHandle<'_> {
        self.active_mut().handle()
    }

    /// Binds `id`, runs `f` on it, then rebinds the primary context.
    pub fn with_gpu_context<R>(
        &mut self,
        id: ContextId,
        f: impl FnOnce(ContextHandle<'_>) -> R,
    ) -> Result<R> {
        self.bind_gpu_context(id)?;
        let out = f(self.current());
        self.unbind_gpu_context();
        Ok(out)
    }

    pub fn get_gpu_context(&self, index: GpuIndex) -> Option<&GpuContext> {
        self.contexts.get(&index)
    }

    pub fn primary_context(&self) -> &GpuContext {
        &self.primary
    }

    /// Registered secondary indices, ascending.
    pub fn gpu_context_indices(&self) -> Vec<GpuIndex> {
        self.contexts.keys().copied().collect()
    }

    fn active_mut(&mut self) -> &mut GpuContext {
        match self.active {
            ContextId::Primary => &mut self.primary,
            // Binding checks registration and entries are only removed in
            // `Drop`, so a bound secondary is always present.
            ContextId::Secondary(index) => match self.contexts.get_mut(&index) {
                Some(context) => context,
                None => unreachable!("bound GPU context {index} is not registered"),
            },
        }
    }

    // ── frame ─────────────────────────────────────────────────────────────

    /// Advances the frame clock and hands the wrapped time to the bound
    /// context's canvas and scene renderers.
    pub fn begin_frame(&mut self, step: f64) -> FrameTime {
        let now = self.clock.advance(step);

        let mut ctx = self.current();
        ctx.canvas().set_time(now.time);
        ctx.scene().set_time(now.time, step);

        now
    }

    /// Swaps the bound device's buffers. Failures are logged, not returned.
    pub fn end_frame(&mut self, present: bool) {
        let mut ctx = self.current();
        let device = ctx.device();
        if let Err(err) = device.swap_buffers(present) {
            log::warn!("swap_buffers on {} failed: {err:#}", device.name());
        }
    }

    /// Composites `targets` onto `screen` of the bound device.
    pub fn blit_render_targets_to_screen(
        &mut self,
        screen: ScreenId,
        targets: &[BlitTarget],
    ) -> Result<BlitOutcome> {
        Ok(self
            .current()
            .blit_render_targets_to_screen(screen, targets)?)
    }

    /// Shows a splash image on the bound device's main screen and presents.
    ///
    /// Returns whether anything was drawn.
    pub fn set_boot_image_with_stretch(
        &mut self,
        image: &RgbaImage,
        background: Color,
        stretch_mode: SplashStretchMode,
        use_filter: bool,
    ) -> Result<bool> {
        Ok(self
            .current()
            .set_boot_image_with_stretch(image, background, stretch_mode, use_filter)?)
    }
}

impl Drop for Compositor {
    fn drop(&mut self) {
        // Each secondary is bound while it releases; the primary goes last.
        while let Some((index, context)) = self.contexts.pop_first() {
            self.active = ContextId::Secondary(index);
            drop(context);
            self.unbind_gpu_context();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blit::{BlitMode, BlitPushConstant, LensDistortion, BLIT_MODE_MAX};
    use crate::coords::{Rect, Vec2};
    use crate::device::{
        ColorSpace, DeviceCommand, HdrOutput, HeadlessDevice, HeadlessProbe, HeadlessScreen,
        PipelineId, TextureId,
    };
    use crate::context::RendererTier;
    use crate::subsystems::{CapabilityKind, SubsystemKind};
    use crate::test_support::{CapabilityProbe, EventLog, RecordingFactory};

    fn screen(width: u32, height: u32) -> HeadlessScreen {
        HeadlessScreen {
            width,
            height,
            ..HeadlessScreen::default()
        }
    }

    fn device(name: &str) -> (HeadlessDevice, HeadlessProbe) {
        let device = HeadlessDevice::new(name).with_screen(ScreenId::MAIN, screen(800, 400));
        let probe = device.probe();
        (device, probe)
    }

    fn compositor_on(device: HeadlessDevice, factory: RecordingFactory) -> Compositor {
        match Compositor::new(CompositorConfig::default(), Box::new(device), Box::new(factory)) {
            Ok(c) => c,
            Err(err) => panic!("compositor construction failed: {err}"),
        }
    }

    fn compositor() -> (Compositor, HeadlessProbe, EventLog) {
        let (device, probe) = device("gpu0");
        let factory = RecordingFactory::new();
        let log = factory.log.clone();
        (compositor_on(device, factory), probe, log)
    }

    fn gpu(index: u32) -> GpuIndex {
        GpuIndex::new(index).unwrap()
    }

    fn pipelines_in_creation_order(probe: &HeadlessProbe) -> Vec<PipelineId> {
        probe
            .commands()
            .into_iter()
            .filter_map(|c| match c {
                DeviceCommand::PipelineCreated { id, .. } => Some(id),
                _ => None,
            })
            .collect()
    }

    fn push_of(probe: &HeadlessProbe, draw: usize) -> BlitPushConstant {
        bytemuck::pod_read_unaligned(&probe.draws()[draw].push_constant)
    }

    // ── construction / registry ───────────────────────────────────────────

    #[test]
    fn primary_is_built_in_fixed_order() {
        let (_compositor, _probe, log) = compositor();

        assert_eq!(
            log.matching("create"),
            vec![
                "create uniform set cache @ gpu0",
                "create framebuffer cache @ gpu0",
                "create utilities @ gpu0",
                "create material storage @ gpu0",
                "create mesh storage @ gpu0",
                "create light storage @ gpu0",
                "create particles storage @ gpu0",
                "create fog @ gpu0",
                "create canvas renderer @ gpu0",
                "create scene renderer Clustered @ gpu0",
            ]
        );
        assert_eq!(log.matching("init"), vec!["init scene renderer @ gpu0"]);
    }

    #[test]
    fn ensure_rejects_reserved_index_and_missing_device() {
        let (mut compositor, _probe, _log) = compositor();
        let (dev, _) = device("gpu1");

        assert!(matches!(
            compositor.ensure_gpu_context(0, Some(Box::new(dev))),
            Err(CompositorError::InvalidGpuIndex)
        ));
        assert!(matches!(
            compositor.ensure_gpu_context(1, None),
            Err(CompositorError::MissingDevice)
        ));
        assert!(compositor.gpu_context_indices().is_empty());
    }

    #[test]
    fn ensure_is_idempotent() {
        let (mut compositor, _probe, log) = compositor();
        let (first, _) = device("gpu1");
        let (second, _) = device("other");

        compositor.ensure_gpu_context(1, Some(Box::new(first))).unwrap();
        compositor.ensure_gpu_context(1, Some(Box::new(second))).unwrap();

        assert_eq!(compositor.gpu_context_indices(), vec![gpu(1)]);
        assert_eq!(log.matching("create scene renderer").len(), 2);
        assert!(log.matching("create scene renderer Clustered @ other").is_empty());
        assert_eq!(
            compositor.get_gpu_context(gpu(1)).unwrap().device_name(),
            "gpu1"
        );
    }

    #[test]
    fn ensure_builds_on_its_device_and_keeps_binding() {
        let (mut compositor, _probe, log) = compositor();
        let (gpu1, _) = device("gpu1");
        let (gpu2, _) = device("gpu2");

        compositor.ensure_gpu_context(1, Some(Box::new(gpu1))).unwrap();
        compositor.bind_gpu_context(ContextId::from_index(1)).unwrap();
        compositor.ensure_gpu_context(2, Some(Box::new(gpu2))).unwrap();

        assert_eq!(compositor.active_context(), ContextId::Secondary(gpu(1)));
        assert_eq!(log.matching("init scene renderer @ gpu2").len(), 1);
        assert_eq!(
            log.events()
                .iter()
                .filter(|e| e.starts_with("create") && e.ends_with("@ gpu2"))
                .count(),
            10
        );
    }

    #[test]
    fn secondary_tier_follows_its_own_limit() {
        let (mut compositor, _probe, _log) = compositor();
        let (weak, _) = device("weak");
        let weak = weak.with_max_textures_per_stage(16);

        compositor.ensure_gpu_context(1, Some(Box::new(weak))).unwrap();

        assert_eq!(compositor.primary_context().tier(), RendererTier::Clustered);
        assert_eq!(
            compositor.get_gpu_context(gpu(1)).unwrap().tier(),
            RendererTier::Mobile
        );
    }

    #[test]
    fn failed_construction_registers_nothing_and_releases_nothing() {
        let (mut compositor, _probe, log) = compositor();
        let (dev, _) = device("gpu1");

        // The compositor owns its own factory; swap in a failing one.
        let failing = RecordingFactory {
            log: log.clone(),
            fail_on: Some(SubsystemKind::Light),
        };
        compositor.factory = Box::new(failing);

        let result = compositor.ensure_gpu_context(1, Some(Box::new(dev)));
        assert!(matches!(result, Err(CompositorError::Device(_))));
        assert!(compositor.gpu_context_indices().is_empty());

        let gpu1_events: Vec<_> = log
            .events()
            .into_iter()
            .filter(|e| e.ends_with("@ gpu1"))
            .collect();
        assert!(gpu1_events.iter().all(|e| !e.starts_with("release")));
        assert_eq!(
            gpu1_events.iter().filter(|e| e.starts_with("drop")).count(),
            gpu1_events.iter().filter(|e| e.starts_with("create")).count()
        );
    }

    #[test]
    fn failed_blit_setup_releases_built_subsystems() {
        let (mut compositor, _probe, log) = compositor();
        let (dev, probe1) = device("gpu1");
        probe1.set_fail_index_arrays(true);
        log.clear();

        let result = compositor.ensure_gpu_context(1, Some(Box::new(dev)));
        assert!(matches!(result, Err(CompositorError::Device(_))));
        assert!(compositor.gpu_context_indices().is_empty());
        assert_eq!(compositor.active_context(), ContextId::Primary);

        let releases = log.matching("release");
        assert_eq!(releases.len(), 10);
        assert_eq!(releases[0], "release scene renderer @ gpu1");
        assert_eq!(releases[9], "release uniform set cache @ gpu1");
        assert_eq!(probe1.live_resources(), 0);
    }

    #[test]
    fn binding_primary_always_succeeds() {
        let (mut compositor, _probe, _log) = compositor();
        compositor.bind_gpu_context(ContextId::Primary).unwrap();
        assert_eq!(compositor.active_context(), ContextId::Primary);

        let (dev, _) = device("gpu1");
        compositor.ensure_gpu_context(1, Some(Box::new(dev))).unwrap();
        compositor.bind_gpu_context(ContextId::from_index(1)).unwrap();
        assert_eq!(compositor.current().device().name(), "gpu1");

        compositor.bind_gpu_context(ContextId::from_index(0)).unwrap();
        assert_eq!(compositor.active_context(), ContextId::Primary);
        assert_eq!(compositor.current().device().name(), "gpu0");
    }

    #[test]
    fn binding_unknown_index_keeps_current_binding() {
        let (mut compositor, _probe, _log) = compositor();
        let (dev, _) = device("gpu1");
        compositor.ensure_gpu_context(1, Some(Box::new(dev))).unwrap();
        compositor.bind_gpu_context(ContextId::from_index(1)).unwrap();

        let err = compositor.bind_gpu_context(ContextId::from_index(7));
        assert!(matches!(err, Err(CompositorError::UnknownContext(i)) if i.get() == 7));
        assert_eq!(compositor.active_context(), ContextId::Secondary(gpu(1)));
        assert_eq!(compositor.current().device().name(), "gpu1");
    }

    #[test]
    #[should_panic(expected = "is not registered")]
    fn bound_context_must_stay_registered() {
        let (mut compositor, _probe, _log) = compositor();
        compositor.active = ContextId::Secondary(gpu(5));
        let _ = compositor.current();
    }

    #[test]
    fn handle_resolves_every_accessor_on_bound_gpu() {
        let (mut compositor, _probe, _log) = compositor();
        let (dev, _) = device("gpu1");
        compositor.ensure_gpu_context(1, Some(Box::new(dev))).unwrap();
        compositor.bind_gpu_context(ContextId::from_index(1)).unwrap();

        let mut ctx = compositor.current();
        assert_eq!(ctx.id(), ContextId::Secondary(gpu(1)));
        assert_eq!(ctx.subsystem(SubsystemKind::Fog).label(), "fog");

        let gi = ctx
            .capability(CapabilityKind::GlobalIllumination)
            .and_then(|c| c.downcast_mut::<CapabilityProbe>())
            .unwrap();
        assert_eq!(gi.device, "gpu1");
    }

    #[test]
    fn clustered_only_capabilities_follow_context_tier() {
        let (mut compositor, _probe, _log) = compositor();
        let (weak, _) = device("weak");
        compositor
            .ensure_gpu_context(1, Some(Box::new(weak.with_max_textures_per_stage(8))))
            .unwrap();

        let mut primary = compositor.current();
        assert!(primary.capability(CapabilityKind::SceneShader).is_some());
        assert!(primary.capability(CapabilityKind::ScreenSpaceEffects).is_some());

        compositor
            .with_gpu_context(ContextId::from_index(1), |mut ctx| {
                assert_eq!(ctx.tier(), RendererTier::Mobile);
                assert!(ctx.capability(CapabilityKind::SceneShader).is_none());
                assert!(ctx.capability(CapabilityKind::ScreenSpaceEffects).is_none());
                assert!(ctx.capability(CapabilityKind::ForwardIds).is_some());
                assert!(ctx.capability(CapabilityKind::CopyEffects).is_some());
            })
            .unwrap();
        assert_eq!(compositor.active_context(), ContextId::Primary);
    }

    #[test]
    fn with_unknown_context_does_not_run() {
        let (mut compositor, _probe, _log) = compositor();
        let mut ran = false;
        let result = compositor.with_gpu_context(ContextId::from_index(4), |_| ran = true);
        assert!(result.is_err());
        assert!(!ran);
    }

    // ── frame ─────────────────────────────────────────────────────────────

    #[test]
    fn begin_frame_updates_only_bound_context() {
        let (mut compositor, _probe, log) = compositor();
        let (dev, _) = device("gpu1");
        compositor.ensure_gpu_context(1, Some(Box::new(dev))).unwrap();
        compositor.bind_gpu_context(ContextId::from_index(1)).unwrap();
        log.clear();

        let now = compositor.begin_frame(0.5);

        assert_eq!(now.frame, 2);
        assert_eq!(log.matching("canvas time"), vec!["canvas time 0.500 @ gpu1"]);
        assert_eq!(
            log.matching("scene time"),
            vec!["scene time 0.500 step 0.500 @ gpu1"]
        );
    }

    #[test]
    fn frame_time_wraps_at_rollover() {
        let (device, _) = device("gpu0");
        let config = CompositorConfig {
            time_rollover_secs: 1.0,
            ..CompositorConfig::default()
        };
        let mut compositor =
            match Compositor::new(config, Box::new(device), Box::new(RecordingFactory::new())) {
                Ok(c) => c,
                Err(err) => panic!("{err}"),
            };

        compositor.begin_frame(0.75);
        let now = compositor.begin_frame(0.75);

        assert_eq!(now.frame, 3);
        assert!((now.time - 0.5).abs() < 1e-12);
        assert_eq!(now.delta, 0.75);
    }

    #[test]
    fn end_frame_presents_bound_device() {
        let (mut compositor, probe0, _log) = compositor();
        let (dev, probe1) = device("gpu1");
        compositor.ensure_gpu_context(1, Some(Box::new(dev))).unwrap();

        compositor.bind_gpu_context(ContextId::from_index(1)).unwrap();
        compositor.end_frame(true);

        assert!(probe1
            .commands()
            .contains(&DeviceCommand::SwapBuffers { present: true }));
        assert!(!probe0
            .commands()
            .iter()
            .any(|c| matches!(c, DeviceCommand::SwapBuffers { .. })));
    }

    // ── blit ──────────────────────────────────────────────────────────────

    #[test]
    fn not_ready_surface_is_a_silent_no_op() {
        let (mut compositor, probe, _log) = compositor();
        let rt = compositor
            .current()
            .render_target_create(64, 64, 1, false)
            .unwrap();
        probe.set_screen_ready(ScreenId::MAIN, false);

        let outcome = compositor
            .blit_render_targets_to_screen(
                ScreenId::MAIN,
                &[BlitTarget::new(rt, Rect::new(0.0, 0.0, 64.0, 64.0))],
            )
            .unwrap();

        assert_eq!(outcome, BlitOutcome::SurfaceNotReady);
        assert!(probe.draws().is_empty());
        assert_eq!(compositor.primary_context().cached_blit_formats(), 0);
        assert_eq!(compositor.primary_context().cached_descriptors(), 0);
    }

    #[test]
    fn unresolvable_target_is_skipped() {
        let (mut compositor, probe, _log) = compositor();
        let mut ctx = compositor.current();
        let a = ctx.render_target_create(32, 32, 1, false).unwrap();
        let empty = ctx.render_target_create(0, 0, 1, false).unwrap();
        let b = ctx.render_target_create(32, 32, 1, false).unwrap();

        let rect = Rect::new(0.0, 0.0, 32.0, 32.0);
        let outcome = compositor
            .blit_render_targets_to_screen(
                ScreenId::MAIN,
                &[
                    BlitTarget::new(a, rect),
                    BlitTarget::new(empty, rect),
                    BlitTarget::new(b, rect),
                ],
            )
            .unwrap();

        assert_eq!(outcome, BlitOutcome::Composited { drawn: 2, skipped: 1 });
        assert_eq!(probe.draws().len(), 2);
        assert!(probe.draws().iter().all(|d| d.use_indices));
    }

    #[test]
    fn destination_is_normalized_in_recorded_push_constant() {
        let (mut compositor, probe, _log) = compositor();
        let rt = compositor
            .current()
            .render_target_create(200, 100, 1, false)
            .unwrap();

        compositor
            .blit_render_targets_to_screen(
                ScreenId::MAIN,
                &[BlitTarget::new(rt, Rect::new(100.0, 50.0, 200.0, 100.0))],
            )
            .unwrap();

        let push = push_of(&probe, 0);
        assert_eq!(push.dst_rect, [0.125, 0.125, 0.25, 0.25]);
        assert_eq!(push.source_is_srgb, 1);
        assert_eq!(push.reference_multiplier, 1.0);
    }

    #[test]
    fn rotated_screen_normalizes_with_swapped_size() {
        let (device, probe) = device("gpu0");
        device.probe().set_screen(
            ScreenId::MAIN,
            HeadlessScreen {
                pre_rotation_degrees: 90,
                ..screen(800, 400)
            },
        );
        let mut compositor = compositor_on(device, RecordingFactory::new());
        let rt = compositor
            .current()
            .render_target_create(16, 16, 1, false)
            .unwrap();

        compositor
            .blit_render_targets_to_screen(
                ScreenId::MAIN,
                &[
                    BlitTarget::new(rt, Rect::new(100.0, 200.0, 200.0, 400.0)),
                    BlitTarget::new(rt, Rect::new(100.0, 200.0, 200.0, 400.0)),
                ],
            )
            .unwrap();

        // Every target of the batch uses the same swapped extent.
        for i in 0..2 {
            assert_eq!(push_of(&probe, i).dst_rect, [0.25, 0.25, 0.5, 0.5]);
        }
    }

    #[test]
    fn mode_selection_picks_matching_pipeline() {
        let (mut compositor, probe, _log) = compositor();
        let rt = compositor
            .current()
            .render_target_create(16, 16, 2, false)
            .unwrap();
        let rect = Rect::new(0.0, 0.0, 16.0, 16.0);

        compositor
            .blit_render_targets_to_screen(
                ScreenId::MAIN,
                &[
                    BlitTarget::new(rt, rect),
                    BlitTarget::new(rt, rect).with_layer(1),
                    BlitTarget::new(rt, rect)
                        .with_layer(1)
                        .with_lens_distortion(LensDistortion::default()),
                ],
            )
            .unwrap();

        let pipelines = pipelines_in_creation_order(&probe);
        assert_eq!(pipelines.len(), BLIT_MODE_MAX);

        let draws = probe.draws();
        assert_eq!(draws[0].pipeline, Some(pipelines[BlitMode::Normal.index()]));
        assert_eq!(draws[1].pipeline, Some(pipelines[BlitMode::UseLayer.index()]));
        assert_eq!(draws[2].pipeline, Some(pipelines[BlitMode::Lens.index()]));
        assert_eq!(push_of(&probe, 1).layer, 1);
    }

    #[test]
    fn caches_are_reused_across_frames() {
        let (mut compositor, probe, _log) = compositor();
        let rt = compositor
            .current()
            .render_target_create(16, 16, 1, false)
            .unwrap();
        let targets = [BlitTarget::new(rt, Rect::new(0.0, 0.0, 16.0, 16.0))];

        for _ in 0..3 {
            compositor.begin_frame(1.0 / 60.0);
            compositor
                .blit_render_targets_to_screen(ScreenId::MAIN, &targets)
                .unwrap();
            compositor.end_frame(true);
        }

        assert_eq!(probe.pipelines_created(), BLIT_MODE_MAX);
        assert_eq!(probe.uniform_sets_created(), 1);
        assert_eq!(probe.draws().len(), 3);
    }

    #[test]
    fn recreated_texture_rebuilds_descriptor() {
        let (mut compositor, probe, _log) = compositor();
        let rt = compositor
            .current()
            .render_target_create(16, 16, 1, false)
            .unwrap();
        let targets = [BlitTarget::new(rt, Rect::new(0.0, 0.0, 16.0, 16.0))];

        compositor
            .blit_render_targets_to_screen(ScreenId::MAIN, &targets)
            .unwrap();
        compositor.end_frame(true);
        compositor
            .current()
            .render_target_set_size(rt, 32, 32)
            .unwrap();
        compositor
            .blit_render_targets_to_screen(ScreenId::MAIN, &targets)
            .unwrap();

        assert_eq!(probe.uniform_sets_created(), 2);
        let draws = probe.draws();
        assert_ne!(draws[0].uniform_set, draws[1].uniform_set);
    }

    #[test]
    fn repeated_resizes_keep_one_descriptor() {
        let (mut compositor, probe, _log) = compositor();
        let rt = compositor
            .current()
            .render_target_create(16, 16, 1, false)
            .unwrap();
        let targets = [BlitTarget::new(rt, Rect::new(0.0, 0.0, 16.0, 16.0))];

        compositor
            .blit_render_targets_to_screen(ScreenId::MAIN, &targets)
            .unwrap();
        compositor.end_frame(true);
        let live = probe.live_resources();

        for i in 0..50 {
            compositor
                .current()
                .render_target_set_size(rt, 17 + i, 17 + i)
                .unwrap();
            compositor
                .blit_render_targets_to_screen(ScreenId::MAIN, &targets)
                .unwrap();
            compositor.end_frame(true);
        }

        assert_eq!(compositor.primary_context().cached_descriptors(), 1);
        assert_eq!(probe.live_resources(), live);
    }

    #[test]
    fn hdr_target_and_linear_screen_set_color_parameters() {
        let (device, probe) = device("gpu0");
        probe.set_screen(
            ScreenId::MAIN,
            HeadlessScreen {
                color_space: ColorSpace::Rec709Linear,
                hdr: HdrOutput {
                    reference_luminance: 100.0,
                    linear_luminance_scale: 50.0,
                    output_max_linear_value: 6.0,
                },
                ..screen(800, 400)
            },
        );
        let mut compositor = compositor_on(device, RecordingFactory::new());
        let mut ctx = compositor.current();
        let rt = ctx.render_target_create(16, 16, 1, true).unwrap();
        ctx.texture_storage().render_target_set_use_debanding(rt, true);

        compositor
            .blit_render_targets_to_screen(
                ScreenId::MAIN,
                &[BlitTarget::new(rt, Rect::new(0.0, 0.0, 16.0, 16.0))],
            )
            .unwrap();

        let push = push_of(&probe, 0);
        assert_eq!(push.source_is_srgb, 0);
        assert_eq!(push.use_debanding, 1);
        assert_eq!(push.target_color_space, ColorSpace::Rec709Linear.push_constant_tag());
        assert_eq!(push.reference_multiplier, 2.0);
        assert_eq!(push.output_max_value, 6.0);
    }

    #[test]
    fn secondary_blits_on_its_own_device() {
        let (mut compositor, probe0, _log) = compositor();
        let (dev, probe1) = device("gpu1");
        compositor.ensure_gpu_context(1, Some(Box::new(dev))).unwrap();

        compositor
            .with_gpu_context(ContextId::from_index(1), |mut ctx| {
                let rt = ctx.render_target_create(16, 16, 1, false).unwrap();
                ctx.blit_render_targets_to_screen(
                    ScreenId::MAIN,
                    &[BlitTarget::new(rt, Rect::new(0.0, 0.0, 16.0, 16.0))],
                )
                .unwrap()
            })
            .unwrap();

        assert_eq!(probe1.draws().len(), 1);
        assert!(probe0.draws().is_empty());
        assert_eq!(compositor.primary_context().cached_blit_formats(), 0);
        assert_eq!(
            compositor.get_gpu_context(gpu(1)).unwrap().cached_blit_formats(),
            1
        );
    }

    // ── boot image ────────────────────────────────────────────────────────

    fn boot_image() -> RgbaImage {
        RgbaImage::from_pixel(100, 100, image::Rgba([255, 255, 255, 128]))
    }

    #[test]
    fn boot_image_draws_one_blended_quad_and_frees_temporaries() {
        let (mut compositor, probe, _log) = compositor();
        let live_before = probe.live_resources();

        let shown = compositor
            .set_boot_image_with_stretch(
                &boot_image(),
                Color::new(0.2, 0.2, 0.2, 1.0),
                SplashStretchMode::Keep,
                true,
            )
            .unwrap();
        assert!(shown);

        let draws = probe.draws();
        assert_eq!(draws.len(), 1);
        let pipelines = pipelines_in_creation_order(&probe);
        assert_eq!(
            draws[0].pipeline,
            Some(pipelines[BlitMode::NormalAlpha.index()])
        );

        let push = push_of(&probe, 0);
        assert_eq!(push.dst_rect, [0.25, 0.0, 0.5, 1.0]);
        assert_eq!(push.source_is_srgb, 1);
        assert_eq!(push.layer, 0);

        assert!(probe
            .commands()
            .contains(&DeviceCommand::SwapBuffers { present: true }));

        let temporary: Vec<TextureId> = probe
            .commands()
            .into_iter()
            .filter_map(|c| match c {
                DeviceCommand::TextureCreated(id) => Some(id),
                _ => None,
            })
            .collect();
        assert_eq!(temporary.len(), 1);
        assert!(!probe.is_texture_alive(temporary[0]));
        assert_eq!(probe.live_resources(), live_before + BLIT_MODE_MAX);
    }

    #[test]
    fn boot_clear_is_linearized_for_linear_screens() {
        let (device, probe) = device("gpu0");
        probe.set_screen(
            ScreenId::MAIN,
            HeadlessScreen {
                color_space: ColorSpace::Rec709Linear,
                hdr: HdrOutput {
                    reference_luminance: 100.0,
                    linear_luminance_scale: 50.0,
                    output_max_linear_value: 4.0,
                },
                ..screen(800, 400)
            },
        );
        let mut compositor = compositor_on(device, RecordingFactory::new());
        let background = Color::new(0.5, 0.5, 0.5, 1.0);

        compositor
            .set_boot_image_with_stretch(&boot_image(), background, SplashStretchMode::Ignore, false)
            .unwrap();

        let clear = probe.commands().into_iter().find_map(|c| match c {
            DeviceCommand::DrawListBegin { clear, .. } => Some(clear),
            _ => None,
        });
        assert_eq!(clear, Some(background.srgb_to_linear().scaled_rgb(2.0)));
    }

    #[test]
    fn boot_clear_is_untouched_for_srgb_screens() {
        let (mut compositor, probe, _log) = compositor();
        let background = Color::new(0.5, 0.25, 0.0, 1.0);

        compositor
            .set_boot_image_with_stretch(&boot_image(), background, SplashStretchMode::Disabled, false)
            .unwrap();

        let clear = probe.commands().into_iter().find_map(|c| match c {
            DeviceCommand::DrawListBegin { clear, .. } => Some(clear),
            _ => None,
        });
        assert_eq!(clear, Some(background));
        let push = push_of(&probe, 0);
        let expected = Rect::new(350.0, 150.0, 100.0, 100.0).normalized_by(Vec2::new(800.0, 400.0));
        assert_eq!(push.dst_rect, expected.to_array());
    }

    #[test]
    fn boot_image_skips_empty_image_and_unready_screen() {
        let (mut compositor, probe, _log) = compositor();

        let empty = RgbaImage::new(0, 0);
        assert!(!compositor
            .set_boot_image_with_stretch(&empty, Color::BLACK, SplashStretchMode::Keep, false)
            .unwrap());

        probe.set_screen_ready(ScreenId::MAIN, false);
        assert!(!compositor
            .set_boot_image_with_stretch(&boot_image(), Color::BLACK, SplashStretchMode::Keep, false)
            .unwrap());

        assert!(probe.draws().is_empty());
    }

    // ── teardown ──────────────────────────────────────────────────────────

    #[test]
    fn teardown_releases_each_context_on_its_device_in_reverse_order() {
        let (mut compositor, probe0, log) = compositor();
        let (dev, probe1) = device("gpu1");
        compositor.ensure_gpu_context(1, Some(Box::new(dev))).unwrap();

        compositor
            .with_gpu_context(ContextId::from_index(1), |mut ctx| {
                ctx.render_target_create(8, 8, 1, false).unwrap();
            })
            .unwrap();
        compositor
            .current()
            .render_target_create(8, 8, 1, false)
            .unwrap();
        log.clear();

        drop(compositor);

        let reverse = [
            "scene renderer",
            "canvas renderer",
            "fog",
            "particles storage",
            "light storage",
            "mesh storage",
            "material storage",
            "utilities",
            "framebuffer cache",
            "uniform set cache",
        ];
        let expected: Vec<String> = ["gpu1", "gpu0"]
            .iter()
            .flat_map(|gpu| reverse.iter().map(move |s| format!("release {s} @ {gpu}")))
            .collect();
        assert_eq!(log.matching("release"), expected);

        let drops: Vec<String> = reverse.iter().map(|s| format!("drop {s} @ gpu1")).collect();
        assert_eq!(&log.matching("drop")[..reverse.len()], &drops[..]);

        assert_eq!(probe0.live_resources(), 0);
        assert_eq!(probe1.live_resources(), 0);
    }
}
