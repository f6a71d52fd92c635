use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gallery_web::{BatchDriver, BatchSummary, Capabilities, Config};

#[derive(Parser)]
#[command(
    name = "gallery-web",
    version,
    about = "Convert a gallery of photos and short clips into web-ready files",
    long_about = "Gallery-Web scales photos down to a maximum width, re-encodes them for the web, and turns short MP4 clips into looping GIF animations. Every file in the input directory gets a result line; one bad file never stops the run."
)]
struct Cli {
    /// Directory holding the original photos and clips
    #[arg(short, long, default_value = "Galerie")]
    input: PathBuf,

    /// Directory receiving the web derivatives
    #[arg(short, long, default_value = "Galerie_naweb")]
    output: PathBuf,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum width of still images in pixels
    #[arg(long)]
    max_width: Option<u32>,

    /// JPEG/WebP quality (0-100)
    #[arg(long)]
    quality: Option<u8>,

    /// Maximum width of animations in pixels
    #[arg(long)]
    animation_width: Option<u32>,

    /// Animation frame rate
    #[arg(long)]
    fps: Option<f64>,

    /// Trim clips to this many seconds
    #[arg(long, conflicts_with = "no_max_duration")]
    max_duration: Option<f64>,

    /// Keep clips at full length
    #[arg(long)]
    no_max_duration: bool,

    /// Animation repeats, 0 loops forever
    #[arg(long)]
    loop_count: Option<u16>,

    /// Colors in the animation palette (2-256)
    #[arg(long)]
    palette_size: Option<u16>,

    /// Files converted in parallel
    #[arg(long)]
    workers: Option<usize>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(max_width) = self.max_width {
            config.image.max_width = max_width;
        }
        if let Some(quality) = self.quality {
            config.image.quality = quality;
        }
        if let Some(width) = self.animation_width {
            config.animation.target_width = width;
        }
        if let Some(fps) = self.fps {
            config.animation.fps = fps;
        }
        if self.max_duration.is_some() {
            config.animation.max_duration = self.max_duration;
        }
        if self.no_max_duration {
            config.animation.max_duration = None;
        }
        if let Some(loop_count) = self.loop_count {
            config.animation.loop_count = loop_count;
        }
        if let Some(palette_size) = self.palette_size {
            config.animation.palette_size = palette_size;
        }
        if let Some(workers) = self.workers {
            config.batch.workers = workers;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting Gallery-Web v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)
                .map_err(|e| anyhow::anyhow!(e.user_message()))
                .context("Could not load configuration")?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };
    cli.apply_overrides(&mut config);
    config.validate().context("Invalid configuration")?;

    if cli.print_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    let driver = BatchDriver::new(config, Capabilities::probe())?;
    let results = driver.run(&cli.input, &cli.output)?;

    for result in &results {
        println!("{}", result);
    }
    println!("{}", BatchSummary::from_results(&results));

    Ok(())
}
