//! Where the overlay goes on the canvas.
//!
//! Placement is pure geometry: given a region (or none) and the overlay's
//! intrinsic size it returns a destination rectangle whose height/width ratio
//! always equals the overlay's. Nothing here is clamped to the canvas; the
//! compositor clips while drawing.

use serde::Serialize;
use tryon_utils::{
    color::RgbaColor,
    config::{
        PlacementConfig, ProfileSettings, ShadowSettings, clamp_shadow_blur, clamp_shadow_offset,
    },
};

use crate::{
    error::TryOnError,
    region::{EstimatorKind, Region},
};

/// Soft shadow drawn under the overlay for one draw call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropShadow {
    pub color: RgbaColor,
    /// Blur radius in pixels; the Gaussian sigma is half of it.
    pub blur: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl DropShadow {
    /// Gaussian sigma, with the blur bounded by [`MAX_SHADOW_BLUR`].
    ///
    /// [`MAX_SHADOW_BLUR`]: tryon_utils::config::MAX_SHADOW_BLUR
    pub fn sigma(&self) -> f32 {
        clamp_shadow_blur(self.blur) / 2.0
    }

    /// How far the blurred shadow spreads past the overlay on each side.
    pub fn margin(&self) -> u32 {
        (3.0 * self.sigma()).ceil() as u32
    }

    /// Offset rounded to whole pixels, bounded by [`MAX_SHADOW_OFFSET`].
    ///
    /// [`MAX_SHADOW_OFFSET`]: tryon_utils::config::MAX_SHADOW_OFFSET
    pub fn pixel_offset(&self) -> (i64, i64) {
        let px = |v: f32| clamp_shadow_offset(v).round() as i64;
        (px(self.offset_x), px(self.offset_y))
    }
}

impl Default for DropShadow {
    fn default() -> Self {
        Self::from(&ShadowSettings::default())
    }
}

impl From<&ShadowSettings> for DropShadow {
    fn from(settings: &ShadowSettings) -> Self {
        Self {
            color: settings.color,
            blur: clamp_shadow_blur(settings.blur),
            offset_x: clamp_shadow_offset(settings.offset_x),
            offset_y: clamp_shadow_offset(settings.offset_y),
        }
    }
}

/// Sizing and positioning rules for placing the overlay over a region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementSettings {
    /// Overlay width as a multiple of the region width.
    pub expansion: f32,
    /// Share of the extra width that goes left of the region (0.5 centres it).
    pub horizontal_bias: f32,
    /// Share of the extra height that goes above the region top.
    pub vertical_bias: f32,
    /// Shadow drawn with this placement, if any.
    pub shadow: Option<DropShadow>,
}

impl PlacementSettings {
    pub fn from_profile(profile: &ProfileSettings, shadow: &ShadowSettings) -> Self {
        Self {
            expansion: profile.expansion,
            horizontal_bias: profile.horizontal_bias,
            vertical_bias: profile.vertical_bias,
            shadow: profile.shadow.then(|| DropShadow::from(shadow)),
        }
    }

    /// Profile for regions produced by `kind`.
    pub fn for_estimator(
        kind: EstimatorKind,
        placement: &PlacementConfig,
        shadow: &ShadowSettings,
    ) -> Self {
        match kind {
            EstimatorKind::Landmarks => Self::from_profile(&placement.landmark, shadow),
            EstimatorKind::SkinHeuristic => Self::from_profile(&placement.skin, shadow),
        }
    }
}

impl Default for PlacementSettings {
    fn default() -> Self {
        Self::from_profile(&ProfileSettings::default(), &ShadowSettings::default())
    }
}

/// Destination rectangle for the overlay in canvas pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlacementResult {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Integer rectangle actually drawn; may extend past any canvas edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl PlacementResult {
    /// Round each component to the nearest pixel.
    pub fn pixel_rect(&self) -> PixelRect {
        PixelRect {
            x: self.x.round() as i32,
            y: self.y.round() as i32,
            width: self.width.round().max(0.0) as u32,
            height: self.height.round().max(0.0) as u32,
        }
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.height / self.width
    }
}

fn overlay_aspect(overlay_width: u32, overlay_height: u32) -> Result<f32, TryOnError> {
    if overlay_width == 0 || overlay_height == 0 {
        return Err(TryOnError::InvalidImage(format!(
            "overlay has no pixels ({overlay_width}x{overlay_height})"
        )));
    }
    Ok(overlay_height as f32 / overlay_width as f32)
}

/// Place the overlay over an estimated region.
///
/// The overlay is `expansion` times as wide as the region, keeps its own
/// aspect ratio, and the extra width and height are split around the region
/// according to the biases.
///
/// # Examples
///
/// ```rust
/// # use tryon_core::placement::{place_in_region, PlacementSettings};
/// # use tryon_core::region::Region;
/// let settings = PlacementSettings {
///     expansion: 1.1,
///     horizontal_bias: 0.5,
///     vertical_bias: 1.0 / 3.0,
///     shadow: None,
/// };
/// let region = Region::new(100.0, 50.0, 200.0, 300.0);
/// let placed = place_in_region(&region, 400, 600, &settings).unwrap();
/// assert!((placed.width - 220.0).abs() < 1e-3);
/// assert!((placed.height - 330.0).abs() < 1e-3);
/// assert!((placed.x - 90.0).abs() < 1e-3);
/// assert!((placed.y - 40.0).abs() < 1e-3);
/// ```
pub fn place_in_region(
    region: &Region,
    overlay_width: u32,
    overlay_height: u32,
    settings: &PlacementSettings,
) -> Result<PlacementResult, TryOnError> {
    let aspect = overlay_aspect(overlay_width, overlay_height)?;
    let width = region.width * settings.expansion;
    let height = width * aspect;
    Ok(PlacementResult {
        x: region.x - (width - region.width) * settings.horizontal_bias,
        y: region.y - (height - region.height) * settings.vertical_bias,
        width,
        height,
    })
}

/// Centred fallback used when no region is available.
///
/// The overlay takes `width_fraction` of the canvas width and is centred on
/// both axes. Tall overlays get a negative `y`; that is expected and left
/// unclamped.
///
/// ```rust
/// # use tryon_core::placement::center_placement;
/// let placed = center_placement(512, 512, 100, 200, 0.6).unwrap();
/// let rect = placed.pixel_rect();
/// assert_eq!((rect.x, rect.y, rect.width, rect.height), (102, -51, 307, 614));
/// ```
pub fn center_placement(
    canvas_width: u32,
    canvas_height: u32,
    overlay_width: u32,
    overlay_height: u32,
    width_fraction: f32,
) -> Result<PlacementResult, TryOnError> {
    let aspect = overlay_aspect(overlay_width, overlay_height)?;
    let width = canvas_width as f32 * width_fraction;
    let height = width * aspect;
    Ok(PlacementResult {
        x: (canvas_width as f32 - width) / 2.0,
        y: (canvas_height as f32 - height) / 2.0,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    #[test]
    fn center_fallback_matches_reference_numbers() {
        let placed = center_placement(512, 512, 100, 200, 0.6).expect("placement");
        assert!((placed.width - 307.2).abs() < EPS);
        assert!((placed.height - 614.4).abs() < EPS);
        assert_eq!(
            placed.pixel_rect(),
            PixelRect {
                x: 102,
                y: -51,
                width: 307,
                height: 614
            }
        );
    }

    #[test]
    fn aspect_ratio_is_preserved_for_any_region() {
        let settings = PlacementSettings::default();
        let overlays = [(100, 200), (640, 480), (1, 1), (37, 999)];
        let regions = [
            Region::new(0.0, 0.0, 10.0, 10.0),
            Region::new(-40.0, 12.5, 480.0, 400.0),
            Region::new(3.0, 700.0, 0.5, 2000.0),
        ];
        for (ow, oh) in overlays {
            for region in &regions {
                let placed = place_in_region(region, ow, oh, &settings).expect("placement");
                let expected = oh as f32 / ow as f32;
                assert!(
                    (placed.aspect_ratio() - expected).abs() < 1e-4 * expected.max(1.0),
                    "{ow}x{oh} over {region:?}: {}",
                    placed.aspect_ratio()
                );
            }
        }
    }

    #[test]
    fn landmark_profile_uses_region_as_is() {
        let settings = PlacementSettings::from_profile(
            &ProfileSettings::landmark(),
            &ShadowSettings::default(),
        );
        assert!(settings.shadow.is_none());
        let region = Region::new(260.0, 200.0, 480.0, 400.0);
        let placed = place_in_region(&region, 300, 400, &settings).expect("placement");
        assert!((placed.x - 260.0).abs() < EPS);
        assert!((placed.y - 200.0).abs() < EPS);
        assert!((placed.width - 480.0).abs() < EPS);
        assert!((placed.height - 640.0).abs() < EPS);
    }

    #[test]
    fn skin_profile_widens_and_lifts() {
        let settings = PlacementSettings::for_estimator(
            EstimatorKind::SkinHeuristic,
            &PlacementConfig::default(),
            &ShadowSettings::default(),
        );
        let shadow = settings.shadow.expect("skin profile draws a shadow");
        assert_eq!(shadow.color.alpha, 77);
        assert_eq!(shadow.sigma(), 4.0);

        let region = Region::new(70.0, 40.0, 60.0, 80.0);
        let placed = place_in_region(&region, 100, 100, &settings).expect("placement");
        assert!((placed.width - 66.0).abs() < EPS);
        assert!((placed.x - 67.0).abs() < EPS);
        assert!((placed.y - (40.0 - (66.0 - 80.0) / 3.0)).abs() < EPS);
    }

    #[test]
    fn placement_is_not_clamped() {
        let settings = PlacementSettings {
            expansion: 2.0,
            horizontal_bias: 0.5,
            vertical_bias: 0.5,
            shadow: None,
        };
        let placed = place_in_region(&Region::new(0.0, 0.0, 50.0, 50.0), 10, 10, &settings)
            .expect("placement");
        assert!((placed.x + 25.0).abs() < EPS);
        assert!((placed.y + 25.0).abs() < EPS);
        assert_eq!(placed.pixel_rect().x, -25);
    }

    #[test]
    fn zero_sized_overlay_is_invalid() {
        assert!(matches!(
            center_placement(100, 100, 0, 10, 0.6),
            Err(TryOnError::InvalidImage(_))
        ));
        assert!(matches!(
            place_in_region(
                &Region::new(0.0, 0.0, 1.0, 1.0),
                10,
                0,
                &PlacementSettings::default()
            ),
            Err(TryOnError::InvalidImage(_))
        ));
    }
}
