use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use clap::{Parser, ValueEnum};
use std::{fs, path::PathBuf, sync::Arc};

use walter_countdown::{
    brand::Brand, raster::load_fonts, remaining::TargetMoment, Countdown, Format, RenderOptions,
};

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Png,
    Svg,
    Html,
    Gif,
}

impl From<OutputFormat> for Format {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Png => Format::Png,
            OutputFormat::Svg => Format::Svg,
            OutputFormat::Html => Format::Html,
            OutputFormat::Gif => Format::Gif,
        }
    }
}

/// Render the launch countdown to a file
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Png)]
    format: OutputFormat,

    /// Canvas width, clamped to 600..=2000
    #[arg(short, long, default_value_t = RenderOptions::DEFAULT_WIDTH)]
    width: u32,

    /// Device scale for raster output, clamped to 1..=3
    #[arg(short, long, default_value_t = RenderOptions::DEFAULT_SCALE)]
    scale: f32,

    /// Defaults to countdown.<format>
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Brand image; the text mark is drawn when missing
    #[arg(short, long, default_value = "assets/walter-text.png")]
    brand: PathBuf,

    /// Pretend it is this moment (RFC 3339)
    #[arg(long)]
    now: Option<DateTime<FixedOffset>>,

    /// Extra directory to load fonts from
    #[arg(long)]
    font_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let format = Format::from(cli.format);
    let options = RenderOptions::new(cli.width, cli.scale);
    let now = cli
        .now
        .map(|now| now.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    let countdown = Countdown::new(
        TargetMoment::launch()?,
        Brand::load(&cli.brand),
        Arc::new(load_fonts(cli.font_dir.as_deref())),
    );
    log::info!("{} until launch", countdown.remaining(now));

    let payload = countdown.render(format, &options, now)?;

    let output = cli
        .output
        .unwrap_or_else(|| PathBuf::from(format!("countdown.{}", format.extension())));
    fs::write(&output, &payload.body)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    log::info!("Wrote {} bytes to {}", payload.body.len(), output.display());

    Ok(())
}
