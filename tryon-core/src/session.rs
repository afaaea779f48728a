//! One try-on context: the two input images plus the settings for a run.
//!
//! A [`TryOnSession`] owns everything a run needs, so there is no ambient
//! state. Runs are serialised by a processing flag: a second call while one
//! is in flight fails with [`TryOnError::Busy`] instead of waiting.

use std::sync::atomic::{AtomicBool, Ordering};

use image::{DynamicImage, RgbaImage};
use log::{Level, debug, info};
use tryon_utils::{
    config::{
        AppSettings, CanvasSettings, EstimationStrategy, EstimatorSettings, PlacementConfig,
        ShadowSettings,
    },
    fit_within,
    telemetry::timing_guard,
};

use crate::{
    compositor::draw_overlay,
    error::{EstimateError, Result, TryOnError},
    estimator::{ChainedEstimator, Estimate, LandmarkEstimator, SkinHeuristicEstimator},
    landmarks::{LandmarkProvider, PoseLandmarks},
    placement::{PlacementResult, PlacementSettings, center_placement, place_in_region},
    region::{EstimatorKind, Region},
};

/// Everything that shapes a run apart from the images.
#[derive(Debug, Clone, Default)]
pub struct TryOnConfig {
    pub estimator: EstimatorSettings,
    pub placement: PlacementConfig,
    pub shadow: ShadowSettings,
    pub canvas: CanvasSettings,
}

impl TryOnConfig {
    pub fn strategy(&self) -> EstimationStrategy {
        self.estimator.strategy
    }

    pub fn with_strategy(mut self, strategy: EstimationStrategy) -> Self {
        self.estimator.strategy = strategy;
        self
    }
}

impl From<&AppSettings> for TryOnConfig {
    fn from(settings: &AppSettings) -> Self {
        Self {
            estimator: settings.estimator.clone(),
            placement: settings.placement.clone(),
            shadow: settings.shadow.clone(),
            canvas: settings.canvas,
        }
    }
}

/// Result of one run.
#[derive(Debug, Clone)]
pub struct TryOnOutcome {
    /// The model image with the product drawn on it.
    pub image: RgbaImage,
    /// Estimator whose region was used; `None` for the centred placement.
    pub estimator: Option<EstimatorKind>,
    pub region: Option<Region>,
    pub placement: PlacementResult,
    pub shadow: bool,
    /// Why estimation fell back to the centred placement, when it did.
    pub fallback_reason: Option<EstimateError>,
    pub canvas_size: (u32, u32),
    pub overlay_size: (u32, u32),
}

impl TryOnOutcome {
    pub fn used_fallback(&self) -> bool {
        self.estimator.is_none()
    }
}

/// Clears the processing flag however the run ends.
struct ProcessingGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Product and model images plus the settings to composite them with.
#[derive(Debug, Default)]
pub struct TryOnSession {
    config: TryOnConfig,
    product: Option<RgbaImage>,
    model: Option<RgbaImage>,
    processing: AtomicBool,
}

impl TryOnSession {
    pub fn new(config: TryOnConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &TryOnConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut TryOnConfig {
        &mut self.config
    }

    pub fn set_product(&mut self, image: &DynamicImage) {
        self.product = Some(image.to_rgba8());
    }

    pub fn set_model(&mut self, image: &DynamicImage) {
        self.model = Some(image.to_rgba8());
    }

    pub fn with_images(mut self, model: &DynamicImage, product: &DynamicImage) -> Self {
        self.set_model(model);
        self.set_product(product);
        self
    }

    /// Both images are present.
    pub fn is_ready(&self) -> bool {
        self.product.is_some() && self.model.is_some()
    }

    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::Acquire)
    }

    /// Run without a landmark provider.
    ///
    /// `Auto` goes straight to the skin heuristic; `Landmarks` fails with
    /// [`TryOnError::DependencyUnavailable`].
    pub fn process(&self) -> Result<TryOnOutcome> {
        let _busy = self.begin()?;
        let (model, product) = self.inputs()?;
        if self.config.strategy() == EstimationStrategy::Landmarks {
            return Err(TryOnError::DependencyUnavailable(
                "no landmark provider configured".to_string(),
            ));
        }
        let canvas = self.prepare_canvas(model)?;
        self.render(canvas, product, None)
    }

    /// Run with `provider` supplying pose landmarks.
    ///
    /// The provider is awaited once, before any pixel work. Under `Auto` an
    /// unavailable provider only skips the landmark stage; under `Landmarks`
    /// it aborts the run. The session stays usable either way.
    pub async fn process_with_provider<P: LandmarkProvider>(
        &self,
        provider: &P,
    ) -> Result<TryOnOutcome> {
        let _busy = self.begin()?;
        let (model, product) = self.inputs()?;
        let canvas = self.prepare_canvas(model)?;

        let strategy = self.config.strategy();
        let landmarks = match strategy {
            EstimationStrategy::Auto | EstimationStrategy::Landmarks => {
                let _guard = timing_guard("tryon_core::session::detect_landmarks", Level::Debug);
                match provider.detect(&canvas).await {
                    Ok(found) => Some(found.unwrap_or_default()),
                    Err(TryOnError::DependencyUnavailable(reason))
                        if strategy == EstimationStrategy::Auto =>
                    {
                        debug!("Skipping landmark estimation: {reason}");
                        None
                    }
                    Err(err) => return Err(err),
                }
            }
            EstimationStrategy::Skin | EstimationStrategy::Center => None,
        };

        self.render(canvas, product, landmarks)
    }

    fn begin(&self) -> Result<ProcessingGuard<'_>> {
        self.processing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| TryOnError::Busy)?;
        Ok(ProcessingGuard {
            flag: &self.processing,
        })
    }

    fn inputs(&self) -> Result<(&RgbaImage, &RgbaImage)> {
        let model = self.model.as_ref().ok_or(TryOnError::MissingImage("model"))?;
        let product = self
            .product
            .as_ref()
            .ok_or(TryOnError::MissingImage("product"))?;
        for (name, image) in [("model", model), ("product", product)] {
            if image.width() == 0 || image.height() == 0 {
                return Err(TryOnError::InvalidImage(format!(
                    "{name} image is {}x{}",
                    image.width(),
                    image.height()
                )));
            }
        }
        Ok((model, product))
    }

    fn prepare_canvas(&self, model: &RgbaImage) -> Result<RgbaImage> {
        let Some(max_size) = self.config.canvas.max_size.filter(|&size| size > 0) else {
            return Ok(model.clone());
        };
        let _guard = timing_guard("tryon_core::session::fit_canvas", Level::Debug);
        let fitted = fit_within(&DynamicImage::ImageRgba8(model.clone()), max_size)
            .map_err(|err| TryOnError::InvalidImage(format!("{err:#}")))?;
        debug!(
            "Canvas fitted from {}x{} to {}x{}",
            model.width(),
            model.height(),
            fitted.width(),
            fitted.height()
        );
        Ok(fitted.to_rgba8())
    }

    fn estimator_chain(&self, landmarks: Option<PoseLandmarks>) -> Option<ChainedEstimator> {
        let skin = SkinHeuristicEstimator::from(&self.config.estimator);
        let pose = |landmarks: PoseLandmarks| {
            LandmarkEstimator::new(landmarks)
                .with_min_visibility(self.config.estimator.min_landmark_visibility)
        };
        match (self.config.strategy(), landmarks) {
            (EstimationStrategy::Center, _) => None,
            (EstimationStrategy::Skin, _) => Some(ChainedEstimator::new(skin)),
            (EstimationStrategy::Landmarks, landmarks) => {
                Some(ChainedEstimator::new(pose(landmarks.unwrap_or_default())))
            }
            (EstimationStrategy::Auto, Some(landmarks)) => {
                Some(ChainedEstimator::new(pose(landmarks)).then(skin))
            }
            (EstimationStrategy::Auto, None) => Some(ChainedEstimator::new(skin)),
        }
    }

    fn render(
        &self,
        mut canvas: RgbaImage,
        product: &RgbaImage,
        landmarks: Option<PoseLandmarks>,
    ) -> Result<TryOnOutcome> {
        let _guard = timing_guard("tryon_core::session::render", Level::Debug);
        let (cw, ch) = canvas.dimensions();
        let (ow, oh) = product.dimensions();

        let (estimate, fallback_reason) = match self.estimator_chain(landmarks) {
            Some(chain) => {
                let _guard = timing_guard("tryon_core::session::estimate", Level::Debug);
                match chain.estimate(&canvas) {
                    Ok(estimate) => (Some(estimate), None),
                    Err(err) => (None, Some(err)),
                }
            }
            None => (None, None),
        };

        let (placement, settings) = match estimate {
            Some(Estimate { kind, region }) => {
                let settings = PlacementSettings::for_estimator(
                    kind,
                    &self.config.placement,
                    &self.config.shadow,
                );
                (place_in_region(&region, ow, oh, &settings)?, Some(settings))
            }
            None => {
                if let Some(reason) = &fallback_reason {
                    info!("No body region found ({reason}); using centred placement");
                }
                let placement =
                    center_placement(cw, ch, ow, oh, self.config.placement.center_width_fraction)?;
                (placement, None)
            }
        };

        let shadow = settings.and_then(|s| s.shadow);
        draw_overlay(&mut canvas, product, &placement, shadow.as_ref());

        Ok(TryOnOutcome {
            image: canvas,
            estimator: estimate.map(|e| e.kind),
            region: estimate.map(|e| e.region),
            placement,
            shadow: shadow.is_some(),
            fallback_reason,
            canvas_size: (cw, ch),
            overlay_size: (ow, oh),
        })
    }
}
