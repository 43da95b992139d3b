use anyhow::Result;
use chroma_sieve::SieveConfig;
use chroma_sieve::config::DEFAULT_CONFIG_FILE;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod overlay;
mod still;
#[cfg(feature = "video")]
mod video;

#[derive(Parser)]
#[command(name = "visual_tester", version, about = "Run the HSV sieve on a still image or a video")]
struct Cli {
    #[command(subcommand)]
    mode: Mode,

    /// Configuration file (TOML). Defaults are used when it does not exist.
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Undesired color list; overrides `paths.undesired_colors_file`
    #[arg(short, long, global = true)]
    undesired: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Mode {
    /// Classify one image and save a 2x2 mask grid
    #[command(visible_alias = "i")]
    Image(StillArgs),

    /// Classify every frame of a video and save a side-by-side recording
    #[command(visible_alias = "v")]
    Video(VideoArgs),
}

#[derive(clap::Args)]
pub struct StillArgs {
    /// Input image; overrides `paths.image_path`
    pub input: Option<PathBuf>,

    /// Directory for the result image; overrides `paths.output_dir`
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Show the result in a window until `q` is pressed (needs the `video` feature)
    #[arg(long)]
    pub show: bool,
}

#[derive(clap::Args)]
pub struct VideoArgs {
    /// Input video; overrides `paths.video_path`
    pub input: Option<PathBuf>,

    /// Output recording; defaults to `processed_video.mp4` in `paths.output_dir`
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Do not open a preview window
    #[arg(long)]
    pub headless: bool,
}

fn load_config(path: &Path) -> Result<SieveConfig> {
    if path.exists() {
        return Ok(SieveConfig::load(path)?);
    }
    // Logging is not up yet; the warning is replayed once it is.
    Ok(SieveConfig::default())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)?;
    init_logging(&config.log_level);
    if !cli.config.exists() {
        warn!(path = %cli.config.display(), "config file not found, using default configuration");
    }
    if let Some(undesired) = cli.undesired {
        config.paths.undesired_colors_file = undesired;
    }

    match cli.mode {
        Mode::Image(args) => still::run(&config, args),
        Mode::Video(args) => run_video(&config, args),
    }
}

#[cfg(feature = "video")]
fn run_video(config: &SieveConfig, args: VideoArgs) -> Result<()> {
    video::run(config, args)
}

#[cfg(not(feature = "video"))]
fn run_video(_config: &SieveConfig, _args: VideoArgs) -> Result<()> {
    anyhow::bail!("video mode needs opencv; rebuild visual_tester with `--features video`")
}
