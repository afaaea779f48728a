//! Common helpers shared across the try-on crates.

/// RGBA colours and hex parsing.
pub mod color;
/// Application configuration and settings management.
pub mod config;
/// Image loading and canvas fitting.
pub mod image_utils;
/// Image output helpers (format selection, encoding).
pub mod output;
/// 2D points in normalised or pixel space.
pub mod point;
/// Instrumentation helpers for optional performance tracing.
pub mod telemetry;

use std::path::Path;

use anyhow::Result;
use log::LevelFilter;

pub use color::{RgbaColor, parse_hex_color};
pub use image_utils::{calculate_aspect_ratio_fit, fit_within, load_image};
pub use output::{ImageFormatHint, OutputOptions, save_image};
pub use point::Point;
pub use telemetry::{
    TimingGuard, configure as configure_telemetry, telemetry_allows, telemetry_enabled,
    telemetry_level, timing_guard, timing_guard_if,
};

/// Initialize logging once for the CLI and tests.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` is used.
pub fn init_logging(default_filter: LevelFilter) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter.as_str()),
    );
    builder.filter_module(telemetry::TELEMETRY_TARGET, LevelFilter::Trace);

    if builder.try_init().is_err() {
        // Logger already initialized; nothing to do.
    }
    Ok(())
}

/// Validate that a path exists and resolve it to an absolute path.
pub fn normalize_path<P: AsRef<Path>>(path: P) -> Result<std::path::PathBuf> {
    let path = path.as_ref();
    anyhow::ensure!(path.exists(), "path does not exist: {}", path.display());
    Ok(path.canonicalize()?)
}
