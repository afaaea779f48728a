//! Shared configuration types consumed across the try-on workspace.
//!
//! Settings serialize to JSON so a run can be reproduced from a file and then
//! tweaked from the command line.

use crate::color::RgbaColor;

use anyhow::{Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

/// Which region estimator(s) a run may use.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum EstimationStrategy {
    /// Landmarks when a provider is configured, then the skin heuristic.
    #[default]
    Auto,
    /// Landmarks only; a missing provider is an error.
    Landmarks,
    /// Skin-colour heuristic only.
    Skin,
    /// Skip estimation and always use the centred placement.
    Center,
}

impl EstimationStrategy {
    pub fn as_label(self) -> &'static str {
        match self {
            EstimationStrategy::Auto => "auto",
            EstimationStrategy::Landmarks => "landmarks",
            EstimationStrategy::Skin => "skin",
            EstimationStrategy::Center => "center",
        }
    }
}

impl fmt::Display for EstimationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

impl FromStr for EstimationStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(EstimationStrategy::Auto),
            "landmarks" | "landmark" | "pose" => Ok(EstimationStrategy::Landmarks),
            "skin" | "heuristic" => Ok(EstimationStrategy::Skin),
            "center" | "centre" => Ok(EstimationStrategy::Center),
            other => Err(format!(
                "invalid strategy '{other}'; expected 'auto', 'landmarks', 'skin' or 'center'"
            )),
        }
    }
}

/// Parameters for region estimation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EstimatorSettings {
    pub strategy: EstimationStrategy,
    /// Sample every Nth pixel on both axes during the skin scan.
    pub sample_stride: u32,
    /// Minimum number of skin samples before a region is reported.
    pub min_skin_samples: usize,
    /// Landmarks reported below this visibility count as missing.
    pub min_landmark_visibility: f32,
}

impl Default for EstimatorSettings {
    fn default() -> Self {
        Self {
            strategy: EstimationStrategy::Auto,
            sample_stride: 4,
            min_skin_samples: 11,
            min_landmark_visibility: 0.0,
        }
    }
}

/// How the overlay is sized and positioned relative to one estimator's region.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProfileSettings {
    /// Overlay width as a multiple of the region width.
    pub expansion: f32,
    /// Fraction of the extra width pushed to the left of the region.
    pub horizontal_bias: f32,
    /// Fraction of the extra height pushed above the region.
    pub vertical_bias: f32,
    /// Draw the drop shadow behind the overlay.
    pub shadow: bool,
}

impl ProfileSettings {
    /// Profile for landmark regions, which already include the 1.2x shoulder margin.
    pub fn landmark() -> Self {
        Self {
            expansion: 1.0,
            horizontal_bias: 0.5,
            vertical_bias: 0.0,
            shadow: false,
        }
    }

    /// Profile for skin-heuristic regions.
    pub fn skin() -> Self {
        Self {
            expansion: 1.1,
            horizontal_bias: 0.5,
            vertical_bias: 1.0 / 3.0,
            shadow: true,
        }
    }
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self::skin()
    }
}

/// Placement profiles per estimator plus the centred fallback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlacementConfig {
    pub landmark: ProfileSettings,
    pub skin: ProfileSettings,
    /// Overlay width as a fraction of the canvas width when no region is found.
    pub center_width_fraction: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            landmark: ProfileSettings::landmark(),
            skin: ProfileSettings::skin(),
            center_width_fraction: 0.6,
        }
    }
}

/// Largest blur radius a drop shadow may use, in pixels.
pub const MAX_SHADOW_BLUR: f32 = 64.0;

/// Largest shadow offset along either axis, in pixels.
pub const MAX_SHADOW_OFFSET: f32 = 1024.0;

/// Clamp a blur radius into `0..=MAX_SHADOW_BLUR`. NaN means no blur.
pub fn clamp_shadow_blur(blur: f32) -> f32 {
    if blur.is_nan() {
        0.0
    } else {
        blur.clamp(0.0, MAX_SHADOW_BLUR)
    }
}

/// Clamp a shadow offset into `±MAX_SHADOW_OFFSET`. NaN means no offset.
pub fn clamp_shadow_offset(offset: f32) -> f32 {
    if offset.is_nan() {
        0.0
    } else {
        offset.clamp(-MAX_SHADOW_OFFSET, MAX_SHADOW_OFFSET)
    }
}

/// Drop shadow drawn behind the overlay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShadowSettings {
    pub color: RgbaColor,
    /// Blur radius in pixels; the Gaussian sigma is half of it.
    pub blur: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            color: RgbaColor::with_alpha_fraction(0, 0, 0, 0.3),
            blur: 8.0,
            offset_x: 0.0,
            offset_y: 4.0,
        }
    }
}

/// Output canvas sizing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct CanvasSettings {
    /// Fit the model image inside a `max_size` square before processing.
    pub max_size: Option<u32>,
}

/// Encoding of the result image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputSettings {
    /// Output format: "png", "jpeg", or "webp".
    pub format: String,
    /// JPEG quality (1-100).
    pub jpeg_quality: u8,
    /// Pick the format from the output file extension when it is recognised.
    pub auto_detect_format: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: "png".to_string(),
            jpeg_quality: 90,
            auto_detect_format: true,
        }
    }
}

/// Settings controlling optional runtime telemetry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySettings {
    /// Whether telemetry timing logs are enabled.
    pub enabled: bool,
    /// Logging level for telemetry output (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "debug".to_string(),
        }
    }
}

impl TelemetrySettings {
    /// Resolve the configured level string into a `LevelFilter`.
    pub fn level_filter(&self) -> LevelFilter {
        match self.level.trim().to_ascii_lowercase().as_str() {
            "off" => LevelFilter::Off,
            "error" => LevelFilter::Error,
            "warn" | "warning" => LevelFilter::Warn,
            "info" => LevelFilter::Info,
            "trace" => LevelFilter::Trace,
            _ => LevelFilter::Debug,
        }
    }
}

/// Persistent settings consumed by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppSettings {
    pub estimator: EstimatorSettings,
    pub placement: PlacementConfig,
    pub shadow: ShadowSettings,
    pub canvas: CanvasSettings,
    pub output: OutputSettings,
    pub telemetry: TelemetrySettings,
}

impl AppSettings {
    /// Clamp values to ranges the pipeline can work with.
    pub fn sanitize(&mut self) {
        self.estimator.sample_stride = self.estimator.sample_stride.max(1);
        self.estimator.min_skin_samples = self.estimator.min_skin_samples.max(1);
        let visibility = self.estimator.min_landmark_visibility;
        self.estimator.min_landmark_visibility = if visibility.is_finite() {
            visibility.clamp(0.0, 1.0)
        } else {
            0.0
        };
        for profile in [&mut self.placement.landmark, &mut self.placement.skin] {
            if !profile.expansion.is_finite() || profile.expansion <= 0.0 {
                profile.expansion = 1.0;
            }
        }
        if !self.placement.center_width_fraction.is_finite()
            || self.placement.center_width_fraction <= 0.0
        {
            self.placement.center_width_fraction = PlacementConfig::default().center_width_fraction;
        }
        self.shadow.blur = clamp_shadow_blur(self.shadow.blur);
        self.shadow.offset_x = clamp_shadow_offset(self.shadow.offset_x);
        self.shadow.offset_y = clamp_shadow_offset(self.shadow.offset_y);
        self.output.jpeg_quality = self.output.jpeg_quality.clamp(1, 100);
        if self.canvas.max_size == Some(0) {
            self.canvas.max_size = None;
        }
    }

    /// Load settings from a JSON file; missing fields take their defaults.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        let mut settings: AppSettings = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse settings JSON at {}", path.display()))?;
        settings.sanitize();
        Ok(settings)
    }

    /// Serialize settings to disk in pretty-printed JSON, overwriting any existing file.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let payload =
            serde_json::to_string_pretty(self).context("failed to serialize settings JSON")?;
        fs::write(path, payload)
            .with_context(|| format!("failed to write settings file {}", path.display()))?;
        Ok(())
    }
}

/// Returns the default path for persisted settings (`config/tryon_settings.json`).
pub fn default_settings_path() -> PathBuf {
    env::current_dir()
        .map(|dir| dir.join("config/tryon_settings.json"))
        .unwrap_or_else(|_| PathBuf::from("config/tryon_settings.json"))
}
