use std::path::PathBuf;

use clap::Parser;

use prism_compositor::CompositorConfig;

use crate::app::StudioConfig;

/// Demo host for the prism compositor.
#[derive(Parser, Debug)]
#[command(name = "prism-studio", version, about)]
pub struct Cli {
    /// Run this many frames on two in-memory devices instead of opening a window.
    #[arg(long)]
    pub headless: Option<u64>,

    /// Splash image shown before the first frame.
    #[arg(long)]
    pub boot: Option<PathBuf>,

    /// Use the mobile rendering method.
    #[arg(long, default_value_t = false)]
    pub mobile: bool,
}

impl Cli {
    pub fn studio_config(&self) -> StudioConfig {
        let mut compositor = CompositorConfig::default();
        if self.mobile {
            compositor.rendering_method = "mobile".to_owned();
        }

        StudioConfig {
            boot_image: self.boot.clone(),
            compositor,
            ..StudioConfig::default()
        }
    }
}
