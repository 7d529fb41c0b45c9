//! Demo host for the prism compositor.

mod app;
mod cli;
mod demo;
mod headless;

use anyhow::Result;
use clap::Parser;

use prism_compositor::logging::{init_logging, LoggingConfig};

use crate::cli::Cli;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let cli = Cli::parse();
    let studio = cli.studio_config();

    match cli.headless {
        Some(frames) => headless::run(frames, studio.compositor),
        None => app::run(studio),
    }
}
