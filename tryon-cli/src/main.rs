mod annotate;
mod args;
mod config;
mod types;

use std::fs::{self, File};

use anyhow::{Context, Result};
use clap::Parser;
use image::DynamicImage;
use log::{info, warn};
use tryon_core::{JsonLandmarkFile, TryOnConfig, TryOnOutcome, TryOnSession};
use tryon_utils::{
    OutputOptions, configure_telemetry, init_logging, load_image, normalize_path, save_image,
};

use crate::{
    annotate::save_annotated,
    args::TryOnArgs,
    config::{apply_cli_overrides, load_settings},
    types::TryOnReport,
};

fn main() -> Result<()> {
    init_logging(log::LevelFilter::Info)?;
    let args = TryOnArgs::parse();

    let mut settings = load_settings(args.config.as_ref())?;
    apply_cli_overrides(&mut settings, &args);
    configure_telemetry(
        settings.telemetry.enabled,
        settings.telemetry.level_filter(),
    );

    let model_path = normalize_path(&args.model)?;
    let product_path = normalize_path(&args.product)?;
    let model = load_image(&model_path)?;
    let product = load_image(&product_path)?;
    info!(
        "Loaded model {}x{} and product {}x{}",
        model.width(),
        model.height(),
        product.width(),
        product.height()
    );

    let strategy = settings.estimator.strategy;
    let session =
        TryOnSession::new(TryOnConfig::from(&settings)).with_images(&model, &product);
    let outcome = run_session(&session, &args)?;
    log_outcome(&outcome);

    let output_options = OutputOptions::from_output_settings(&settings.output);
    let mut report = TryOnReport::new(&model_path, &product_path, &args.output, strategy, &outcome);
    let TryOnOutcome {
        image,
        region,
        placement,
        ..
    } = outcome;

    if let Some(path) = args.annotate.as_ref() {
        match save_annotated(&image, region.as_ref(), &placement, path) {
            Ok(()) => {
                info!("Annotated image saved to {}", path.display());
                report.annotated = Some(path.display().to_string());
            }
            Err(err) => warn!("Failed to annotate result: {err:#}"),
        }
    }

    let result = DynamicImage::ImageRgba8(image);
    save_image(&result, &args.output, &output_options)?;
    info!("Saved try-on result to {}", args.output.display());

    if let Some(json_path) = args.json.as_ref() {
        if let Some(dir) = json_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create directory {}", dir.display()))?;
        }
        let file = File::create(json_path)
            .with_context(|| format!("failed to create {}", json_path.display()))?;
        serde_json::to_writer_pretty(file, &report)
            .with_context(|| format!("failed to write report JSON to {}", json_path.display()))?;
        info!("Wrote report to {}", json_path.display());
    }

    Ok(())
}

fn run_session(session: &TryOnSession, args: &TryOnArgs) -> Result<TryOnOutcome> {
    let outcome = match args.landmarks.as_ref() {
        Some(path) => {
            let provider = JsonLandmarkFile::new(normalize_path(path)?);
            pollster::block_on(session.process_with_provider(&provider))
        }
        None => session.process(),
    };
    outcome.context("try-on failed")
}

fn log_outcome(outcome: &TryOnOutcome) {
    let rect = outcome.placement.pixel_rect();
    match (outcome.estimator, outcome.fallback_reason.as_ref()) {
        (Some(kind), _) => info!(
            "Placed product from {kind} region at ({}, {}) size {}x{}",
            rect.x, rect.y, rect.width, rect.height
        ),
        (None, Some(reason)) => warn!(
            "No body region found ({reason}); product centred at ({}, {}) size {}x{}",
            rect.x, rect.y, rect.width, rect.height
        ),
        (None, None) => info!(
            "Product centred at ({}, {}) size {}x{}",
            rect.x, rect.y, rect.width, rect.height
        ),
    }
}
