//! Debug overlay showing where the estimator and placement landed.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};
use tryon_core::{PlacementResult, Region};

const REGION_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);
const PLACEMENT_COLOR: Rgba<u8> = Rgba([0, 255, 0, 255]);

/// Outline `region` in red and `placement` in green on a copy of `image`.
pub fn annotate_outcome(
    image: &RgbaImage,
    region: Option<&Region>,
    placement: &PlacementResult,
) -> RgbaImage {
    let mut annotated = image.clone();
    let (img_w, img_h) = annotated.dimensions();
    if img_w == 0 || img_h == 0 {
        return annotated;
    }

    if let Some(region) = region
        && let Some(rect) = clamped_rect(region.x, region.y, region.width, region.height, img_w, img_h)
    {
        draw_hollow_rect_mut(&mut annotated, rect, REGION_COLOR);
    }
    if let Some(rect) = clamped_rect(
        placement.x,
        placement.y,
        placement.width,
        placement.height,
        img_w,
        img_h,
    ) {
        draw_hollow_rect_mut(&mut annotated, rect, PLACEMENT_COLOR);
    }
    annotated
}

/// Write an annotated copy of `image` to `output_path`.
pub fn save_annotated(
    image: &RgbaImage,
    region: Option<&Region>,
    placement: &PlacementResult,
    output_path: &Path,
) -> Result<()> {
    let annotated = annotate_outcome(image, region, placement);
    if let Some(parent) = output_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    annotated
        .save(output_path)
        .with_context(|| format!("failed to save annotated image {}", output_path.display()))
}

/// Clip a floating-point rectangle to the image, `None` when nothing is visible.
fn clamped_rect(x: f32, y: f32, width: f32, height: f32, img_w: u32, img_h: u32) -> Option<Rect> {
    let max_x = (img_w - 1) as f32;
    let max_y = (img_h - 1) as f32;

    if x > max_x || y > max_y || x + width < 0.0 || y + height < 0.0 {
        return None;
    }
    let x1 = x.clamp(0.0, max_x);
    let y1 = y.clamp(0.0, max_y);
    let x2 = (x + width).clamp(0.0, max_x);
    let y2 = (y + height).clamp(0.0, max_y);

    let w = (x2 - x1).max(1.0).round() as u32;
    let h = (y2 - y1).max(1.0).round() as u32;
    Some(Rect::at(x1.round() as i32, y1.round() as i32).of_size(w, h))
}
