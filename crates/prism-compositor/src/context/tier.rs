/// Below this many sampled textures per shader stage the clustered renderer
/// cannot run.
pub const MIN_CLUSTERED_TEXTURES_PER_STAGE: u64 = 48;

/// Scene-renderer implementation tier.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum RendererTier {
    /// Forward+ with clustered lighting.
    Clustered,
    /// Single-pass forward for constrained devices.
    Mobile,
}

/// Picks the scene-renderer tier for a device.
///
/// Applied identically to the primary context and every secondary one.
pub fn select_renderer_tier(rendering_method: &str, max_textures_per_stage: u64) -> RendererTier {
    let below_limit = max_textures_per_stage < MIN_CLUSTERED_TEXTURES_PER_STAGE;

    match rendering_method {
        "mobile" => RendererTier::Mobile,
        "forward_plus" if below_limit => {
            log::warn!(
                "forward_plus needs {MIN_CLUSTERED_TEXTURES_PER_STAGE} textures per shader stage, \
                 device offers {max_textures_per_stage}; using the mobile renderer"
            );
            RendererTier::Mobile
        }
        "forward_plus" => RendererTier::Clustered,
        other => {
            if below_limit {
                return RendererTier::Mobile;
            }
            log::error!("unknown rendering method {other:?}; using forward_plus");
            RendererTier::Clustered
        }
    }
}
