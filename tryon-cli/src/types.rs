//! Serializable run report for tryon-cli.

use std::path::Path;

use serde::Serialize;
use tryon_core::{EstimatorKind, PixelRect, PlacementResult, Region, TryOnOutcome};
use tryon_utils::config::EstimationStrategy;

/// JSON summary of one try-on run.
#[derive(Debug, Serialize)]
pub struct TryOnReport {
    pub model: String,
    pub product: String,
    pub output: String,
    pub strategy: EstimationStrategy,
    /// Estimator whose region was used; absent for the centred placement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimator: Option<EstimatorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
    pub placement: PlacementResult,
    pub pixel_rect: PixelRect,
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    pub shadow: bool,
    pub canvas: [u32; 2],
    pub overlay: [u32; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotated: Option<String>,
}

impl TryOnReport {
    pub fn new(
        model: &Path,
        product: &Path,
        output: &Path,
        strategy: EstimationStrategy,
        outcome: &TryOnOutcome,
    ) -> Self {
        Self {
            model: model.display().to_string(),
            product: product.display().to_string(),
            output: output.display().to_string(),
            strategy,
            estimator: outcome.estimator,
            region: outcome.region,
            placement: outcome.placement,
            pixel_rect: outcome.placement.pixel_rect(),
            fallback: outcome.used_fallback(),
            fallback_reason: outcome.fallback_reason.as_ref().map(ToString::to_string),
            shadow: outcome.shadow,
            canvas: [outcome.canvas_size.0, outcome.canvas_size.1],
            overlay: [outcome.overlay_size.0, outcome.overlay_size.1],
            annotated: None,
        }
    }
}
