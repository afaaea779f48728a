//! Command-line argument definitions for tryon-cli.

use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;
use tryon_utils::{ImageFormatHint, RgbaColor, config::EstimationStrategy, parse_hex_color};

/// Composite a product photo onto a model photo at the estimated torso.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct TryOnArgs {
    /// Photo of the person wearing the product.
    #[arg(short, long)]
    pub model: PathBuf,

    /// Product image, ideally with a transparent background.
    #[arg(short, long)]
    pub product: PathBuf,

    /// Where to write the composited result.
    #[arg(short, long, default_value = "virtual-try-on-result.png")]
    pub output: PathBuf,

    /// Pose landmarks for the model image as JSON (array of `{x, y}` or null).
    #[arg(long, value_name = "FILE")]
    pub landmarks: Option<PathBuf>,

    /// Region estimation strategy (defaults to the settings file, then `auto`).
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Fit the model image inside a square of this size before processing.
    ///
    /// The skin heuristic samples every 4th pixel of the canvas, so its grid
    /// depends on the canvas size. `--max-size 512` gives the grid of the
    /// 512px web canvas. Without it the model is used at full size.
    #[arg(long, value_name = "PIXELS")]
    pub max_size: Option<u32>,

    /// Never draw the drop shadow.
    #[arg(long = "no-shadow", action = ArgAction::SetTrue)]
    pub no_shadow: bool,

    /// Drop shadow colour as hex (`#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`).
    #[arg(long, value_name = "HEX", value_parser = parse_shadow_color, conflicts_with = "no_shadow")]
    pub shadow_color: Option<RgbaColor>,

    /// Optional settings JSON. Defaults to `config/tryon_settings.json` when present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write a JSON report of the run to this path.
    #[arg(long, value_name = "FILE")]
    pub json: Option<PathBuf>,

    /// Write a copy of the result with the region and placement outlined.
    #[arg(long, value_name = "FILE")]
    pub annotate: Option<PathBuf>,

    /// Output encoding when the extension does not decide it.
    #[arg(long, value_enum)]
    pub output_format: Option<OutputFormatArg>,

    /// JPEG quality (1-100).
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub jpeg_quality: Option<u8>,

    /// Enable telemetry timing logs (defaults to settings file).
    #[arg(long, action = ArgAction::SetTrue)]
    pub telemetry: bool,

    /// Override telemetry logging level (error, warn, info, debug, trace).
    #[arg(long, value_name = "LEVEL")]
    pub telemetry_level: Option<String>,
}

fn parse_shadow_color(raw: &str) -> Result<RgbaColor, String> {
    parse_hex_color(raw).ok_or_else(|| format!("invalid hex colour '{raw}'"))
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// Landmarks when `--landmarks` is given, then the skin heuristic.
    Auto,
    /// Landmarks only; requires `--landmarks`.
    Landmarks,
    /// Skin-colour heuristic only.
    Skin,
    /// Always use the centred placement.
    Center,
}

impl From<StrategyArg> for EstimationStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Auto => EstimationStrategy::Auto,
            StrategyArg::Landmarks => EstimationStrategy::Landmarks,
            StrategyArg::Skin => EstimationStrategy::Skin,
            StrategyArg::Center => EstimationStrategy::Center,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormatArg {
    Png,
    Jpeg,
    Webp,
}

impl OutputFormatArg {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormatArg::Png => "png",
            OutputFormatArg::Jpeg => "jpeg",
            OutputFormatArg::Webp => "webp",
        }
    }
}

impl From<OutputFormatArg> for ImageFormatHint {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Png => ImageFormatHint::Png,
            OutputFormatArg::Jpeg => ImageFormatHint::Jpeg,
            OutputFormatArg::Webp => ImageFormatHint::Webp,
        }
    }
}
