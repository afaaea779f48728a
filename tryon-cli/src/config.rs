//! Configuration loading and CLI override logic.

use std::path::PathBuf;

use anyhow::{Context, Result};
use log::info;
use tryon_utils::{
    config::{AppSettings, default_settings_path},
    normalize_path,
};

use crate::args::TryOnArgs;

/// Load application settings from a file or use defaults.
pub fn load_settings(config_path: Option<&PathBuf>) -> Result<AppSettings> {
    if let Some(path) = config_path {
        let resolved = normalize_path(path)?;
        let settings = AppSettings::load_from_path(&resolved)?;
        info!("Loaded settings from {}", resolved.display());
        Ok(settings)
    } else {
        let default_path = default_settings_path();
        if default_path.exists() {
            let settings = AppSettings::load_from_path(&default_path).with_context(|| {
                format!(
                    "failed to load default settings from {}",
                    default_path.display()
                )
            })?;
            info!("Loaded settings from {}", default_path.display());
            Ok(settings)
        } else {
            Ok(AppSettings::default())
        }
    }
}

/// Apply command-line arguments to override loaded or default settings.
pub fn apply_cli_overrides(settings: &mut AppSettings, args: &TryOnArgs) {
    if args.telemetry {
        settings.telemetry.enabled = true;
    }
    if let Some(level) = args.telemetry_level.as_ref() {
        let normalized = level.trim();
        if !normalized.is_empty() {
            let lower = normalized.to_ascii_lowercase();
            settings.telemetry.level = lower.clone();
            if lower == "off" {
                settings.telemetry.enabled = false;
            }
        }
    }

    if let Some(strategy) = args.strategy {
        settings.estimator.strategy = strategy.into();
    }
    if let Some(max_size) = args.max_size {
        settings.canvas.max_size = (max_size > 0).then_some(max_size);
    }
    if args.no_shadow {
        settings.placement.landmark.shadow = false;
        settings.placement.skin.shadow = false;
    }
    if let Some(color) = args.shadow_color {
        settings.shadow.color = color;
    }

    if let Some(format) = args.output_format {
        settings.output.format = format.as_str().to_string();
        settings.output.auto_detect_format = false;
    }
    if let Some(quality) = args.jpeg_quality {
        settings.output.jpeg_quality = quality;
    }

    settings.sanitize();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tryon_utils::config::EstimationStrategy;

    fn parse(extra: &[&str]) -> TryOnArgs {
        let mut argv = vec!["tryon-cli", "--model", "m.png", "--product", "p.png"];
        argv.extend_from_slice(extra);
        TryOnArgs::try_parse_from(argv).expect("parse")
    }

    #[test]
    fn overrides_replace_settings_values() {
        let mut settings = AppSettings::default();
        let args = parse(&[
            "--strategy",
            "center",
            "--max-size",
            "512",
            "--no-shadow",
            "--output-format",
            "jpeg",
            "--jpeg-quality",
            "75",
            "--telemetry-level",
            "TRACE",
        ]);
        apply_cli_overrides(&mut settings, &args);

        assert_eq!(settings.estimator.strategy, EstimationStrategy::Center);
        assert_eq!(settings.canvas.max_size, Some(512));
        assert!(!settings.placement.skin.shadow);
        assert!(!settings.placement.landmark.shadow);
        assert_eq!(settings.output.format, "jpeg");
        assert!(!settings.output.auto_detect_format);
        assert_eq!(settings.output.jpeg_quality, 75);
        assert_eq!(settings.telemetry.level, "trace");
    }

    #[test]
    fn absent_flags_keep_loaded_values() {
        let mut settings = AppSettings::default();
        settings.estimator.strategy = EstimationStrategy::Skin;
        settings.canvas.max_size = Some(300);
        apply_cli_overrides(&mut settings, &parse(&[]));

        assert_eq!(settings.estimator.strategy, EstimationStrategy::Skin);
        assert_eq!(settings.canvas.max_size, Some(300));
        assert!(settings.placement.skin.shadow);
        assert!(settings.output.auto_detect_format);
        assert!(!settings.telemetry.enabled);
    }

    #[test]
    fn shadow_color_override() {
        let mut settings = AppSettings::default();
        apply_cli_overrides(&mut settings, &parse(&["--shadow-color", "#336699"]));
        assert_eq!(settings.shadow.color.to_array(), [0x33, 0x66, 0x99, 0xff]);
    }

    #[test]
    fn telemetry_off_level_disables_telemetry() {
        let mut settings = AppSettings::default();
        apply_cli_overrides(&mut settings, &parse(&["--telemetry", "--telemetry-level", "off"]));
        assert!(!settings.telemetry.enabled);
    }

    #[test]
    fn explicit_config_file_is_loaded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "canvas": { "max_size": 256 } }"#).expect("write");
        let settings = load_settings(Some(&path)).expect("load");
        assert_eq!(settings.canvas.max_size, Some(256));

        assert!(load_settings(Some(&dir.path().join("missing.json"))).is_err());
    }
}
