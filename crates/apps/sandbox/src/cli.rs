use anyhow::Context;
use clap::Parser;
use roomsync_tracking::SessionConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "roomsync-sandbox")]
#[command(about = "Run a roomsync session against a synthetic room", long_about = None)]
pub struct Args {
    /// Session config file (TOML); defaults are used when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Stop after this many render frames
    #[arg(long)]
    pub frames: Option<u64>,

    /// Render callback rate
    #[arg(long, default_value_t = 72.0)]
    pub render_hz: f32,

    /// Number of instanced spheres to drop
    #[arg(long, default_value_t = 100)]
    pub spheres: usize,

    /// Draw origin markers on tracked surfaces
    #[arg(long)]
    pub show_origins: bool,
}

impl Args {
    pub fn load_config(&self) -> anyhow::Result<SessionConfig> {
        if !(self.render_hz.is_finite() && self.render_hz > 0.0) {
            anyhow::bail!("--render-hz must be positive, got {}", self.render_hz);
        }
        match &self.config {
            Some(path) => SessionConfig::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display())),
            None => Ok(SessionConfig::default()),
        }
    }
}
