use std::path::Path;

use anyhow::{Context, Result};
use image::{DynamicImage, imageops::FilterType};

/// Load an image from disk into memory.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
    let path_ref = path.as_ref();
    image::open(path_ref).with_context(|| format!("failed to open image {}", path_ref.display()))
}

/// Scale `(src_width, src_height)` so it fits inside `max_width` x `max_height`
/// while keeping its aspect ratio.
///
/// Small images are scaled up as well as large ones scaled down, so the result
/// always touches at least one of the bounds. Components are rounded to the
/// nearest pixel and never drop below 1.
pub fn calculate_aspect_ratio_fit(
    src_width: u32,
    src_height: u32,
    max_width: u32,
    max_height: u32,
) -> Result<(u32, u32)> {
    anyhow::ensure!(
        src_width > 0 && src_height > 0,
        "source dimensions must be non-zero"
    );
    anyhow::ensure!(
        max_width > 0 && max_height > 0,
        "bounding dimensions must be non-zero"
    );
    let ratio = (max_width as f64 / src_width as f64).min(max_height as f64 / src_height as f64);
    let width = (src_width as f64 * ratio).round().max(1.0) as u32;
    let height = (src_height as f64 * ratio).round().max(1.0) as u32;
    Ok((width, height))
}

/// Resize `image` so it fits in a `max_size` square, preserving aspect ratio.
pub fn fit_within(image: &DynamicImage, max_size: u32) -> Result<DynamicImage> {
    let (width, height) =
        calculate_aspect_ratio_fit(image.width(), image.height(), max_size, max_size)?;
    if (width, height) == (image.width(), image.height()) {
        return Ok(image.clone());
    }
    Ok(image.resize_exact(width, height, FilterType::Triangle))
}
