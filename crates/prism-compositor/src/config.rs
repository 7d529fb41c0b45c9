use std::path::PathBuf;

use crate::time::DEFAULT_TIME_ROLLOVER_SECS;

/// Compositor settings read once at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositorConfig {
    /// `"forward_plus"` or `"mobile"`. Unknown values fall back to
    /// `"forward_plus"` with an error log.
    pub rendering_method: String,

    /// Period at which shader-visible time wraps, in seconds.
    pub time_rollover_secs: f64,

    pub shader_cache: ShaderCacheConfig,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            rendering_method: "forward_plus".to_owned(),
            time_rollover_secs: DEFAULT_TIME_ROLLOVER_SECS,
            shader_cache: ShaderCacheConfig::default(),
        }
    }
}

/// On-disk shader cache settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShaderCacheConfig {
    pub enabled: bool,

    /// Set up the cache even when `enabled` is off (tooling builds).
    pub force: bool,

    pub compress: bool,
    pub use_zstd: bool,
    pub strip_debug: bool,

    /// Writable base directory; `shader_cache/` is created under it.
    pub user_dir: Option<PathBuf>,

    /// Read-only cache shipped with the application.
    pub res_dir: Option<PathBuf>,
}
