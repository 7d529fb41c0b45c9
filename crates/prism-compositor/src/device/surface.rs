use super::types::{ColorSpace, SurfaceStatus, TextureFormat};

/// Picks the surface format.
///
/// The blit shader writes already-encoded values for nonlinear targets, so
/// `*Srgb` formats are avoided: the hardware would encode a second time.
pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_hdr: bool,
) -> Option<wgpu::TextureFormat> {
    if caps.formats.is_empty() {
        return None;
    }

    if prefer_hdr && caps.formats.contains(&wgpu::TextureFormat::Rgba16Float) {
        return Some(wgpu::TextureFormat::Rgba16Float);
    }

    let preferred = [
        wgpu::TextureFormat::Bgra8Unorm,
        wgpu::TextureFormat::Rgba8Unorm,
    ];
    for f in preferred {
        if caps.formats.contains(&f) {
            return Some(f);
        }
    }

    let fallback = caps.formats[0];
    if fallback.is_srgb() {
        log::warn!("surface only offers {fallback:?}; output will be encoded twice");
    }
    Some(fallback)
}

pub(crate) fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// Color space a surface of `format` is scanned out in.
pub(crate) fn color_space_for(format: wgpu::TextureFormat) -> ColorSpace {
    match format {
        wgpu::TextureFormat::Rgba16Float => ColorSpace::Rec709Linear,
        _ => ColorSpace::Rec709NonlinearSrgb,
    }
}

pub(crate) fn to_wgpu_format(format: TextureFormat) -> wgpu::TextureFormat {
    match format {
        TextureFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
        TextureFormat::Rgba8UnormSrgb => wgpu::TextureFormat::Rgba8UnormSrgb,
        TextureFormat::Bgra8Unorm => wgpu::TextureFormat::Bgra8Unorm,
        TextureFormat::Bgra8UnormSrgb => wgpu::TextureFormat::Bgra8UnormSrgb,
        TextureFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
    }
}

/// Applies a new size. wgpu rejects 0x0 configurations, so those only
/// update the stored size and leave the surface unconfigured.
pub(crate) fn apply_resize(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &mut wgpu::SurfaceConfiguration,
    size: &mut (u32, u32),
    new_size: (u32, u32),
) {
    *size = new_size;
    if new_size.0 == 0 || new_size.1 == 0 {
        return;
    }

    config.width = new_size.0;
    config.height = new_size.1;
    surface.configure(device, config);
}

/// Maps an acquisition failure to readiness, reconfiguring when the
/// swapchain can be recovered. Every failure skips the current frame.
pub(crate) fn map_surface_error(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    size: (u32, u32),
    err: wgpu::SurfaceError,
) -> SurfaceStatus {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
            if size.0 > 0 && size.1 > 0 {
                surface.configure(device, config);
            }
        }
        wgpu::SurfaceError::OutOfMemory => {
            log::error!("surface acquisition ran out of memory");
        }
        _ => {}
    }
    SurfaceStatus::NotReady
}
