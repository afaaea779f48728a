//! Drawing the overlay onto the canvas.
//!
//! The overlay is resampled to the placement's pixel rectangle and
//! source-over composited with straight alpha. Only the part of the rectangle
//! that can reach the canvas is resampled; the rest is clipped. A [`DropShadow`] applies to a single draw call only.

use image::{GrayImage, Luma, Rgba, RgbaImage, imageops};
use imageproc::{
    filter::gaussian_blur_f32,
    geometric_transformations::{Interpolation, warp_into_with},
};
use log::Level;
use tryon_utils::telemetry::timing_guard;

use crate::placement::{DropShadow, PixelRect, PlacementResult};

/// Source-over blend of `src` onto `dst`, both with straight (unpremultiplied) alpha.
#[inline]
pub fn blend_over(dst: &mut Rgba<u8>, src: [u8; 4]) {
    let src_a = f32::from(src[3]) / 255.0;
    if src_a <= 0.0 {
        return;
    }
    if src_a >= 1.0 {
        *dst = Rgba(src);
        return;
    }
    let dst_a = f32::from(dst[3]) / 255.0;
    let inv = 1.0 - src_a;
    let out_a = src_a + dst_a * inv;
    let mut out = [0u8; 4];
    for c in 0..3 {
        let value = (f32::from(src[c]) * src_a + f32::from(dst[c]) * dst_a * inv) / out_a;
        out[c] = value.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    *dst = Rgba(out);
}

/// Source pixels the Lanczos3 kernel reads on each side of a sample.
const LANCZOS_SUPPORT: f64 = 3.0;

/// Lanczos output size above which the visible window is sampled directly.
const MIN_RESAMPLE_BUDGET: u64 = 1 << 24;

/// Blend `layer` onto `canvas` with its top-left corner at (`left`, `top`),
/// skipping pixels that fall outside the canvas.
fn blit(canvas: &mut RgbaImage, layer: &RgbaImage, left: i64, top: i64) {
    let (cw, ch) = (i64::from(canvas.width()), i64::from(canvas.height()));
    let x0 = left.max(0);
    let y0 = top.max(0);
    let x1 = left.saturating_add(i64::from(layer.width())).min(cw);
    let y1 = top.saturating_add(i64::from(layer.height())).min(ch);
    if x0 >= x1 || y0 >= y1 {
        return;
    }
    for y in y0..y1 {
        for x in x0..x1 {
            let src = layer.get_pixel((x - left) as u32, (y - top) as u32).0;
            blend_over(canvas.get_pixel_mut(x as u32, y as u32), src);
        }
    }
}

/// Build the shadow layer for an already resized overlay.
///
/// Returns the layer and how far it extends past the overlay on each side.
fn shadow_layer(overlay: &RgbaImage, shadow: &DropShadow) -> (RgbaImage, u32) {
    let sigma = shadow.sigma();
    let margin = shadow.margin();
    let pad = margin.saturating_mul(2);
    let (w, h) = (
        overlay.width().saturating_add(pad),
        overlay.height().saturating_add(pad),
    );

    let mut mask = GrayImage::new(w, h);
    for (x, y, px) in overlay.enumerate_pixels() {
        mask.put_pixel(x + margin, y + margin, Luma([px[3]]));
    }
    // The blur panics for a non-positive sigma.
    if sigma > 0.0 {
        mask = gaussian_blur_f32(&mask, sigma);
    }

    let color = shadow.color;
    let tint = f32::from(color.alpha) / 255.0;
    let layer = RgbaImage::from_fn(w, h, |x, y| {
        let coverage = f32::from(mask.get_pixel(x, y)[0]) / 255.0;
        let alpha = (coverage * tint * 255.0).round() as u8;
        Rgba([color.red, color.green, color.blue, alpha])
    });
    (layer, margin)
}

/// Draw `overlay` into `canvas` at `placement`, optionally with a drop shadow.
///
/// Zero-area placements draw nothing. Only the part of the placement that can
/// reach the canvas is resampled.
pub fn draw_overlay(
    canvas: &mut RgbaImage,
    overlay: &RgbaImage,
    placement: &PlacementResult,
    shadow: Option<&DropShadow>,
) {
    let _guard = timing_guard("tryon_core::compositor::draw_overlay", Level::Debug);
    let rect = placement.pixel_rect();
    if rect.is_empty() || overlay.width() == 0 || overlay.height() == 0 {
        return;
    }

    let shadow = shadow.filter(|s| s.color.alpha > 0);
    let reach = shadow.map_or(0, |s| {
        let (dx, dy) = s.pixel_offset();
        i64::from(s.margin()) + dx.abs().max(dy.abs())
    });
    let Some(visible) = resample_visible(overlay, &rect, canvas.dimensions(), reach) else {
        return;
    };

    if let Some(shadow) = shadow {
        let (layer, margin) = shadow_layer(&visible.image, shadow);
        let (dx, dy) = shadow.pixel_offset();
        let left = visible.left + dx - i64::from(margin);
        let top = visible.top + dy - i64::from(margin);
        blit(canvas, &layer, left, top);
    }

    blit(canvas, &visible.image, visible.left, visible.top);
}

/// Resampled overlay pixels and where their top-left corner lands on the canvas.
struct VisibleOverlay {
    image: RgbaImage,
    left: i64,
    top: i64,
}

/// Target span `[start, end)` of a placement axis starting at `origin` with
/// length `len` that lies within `reach` pixels of a canvas axis of `canvas_len`.
fn visible_span(origin: i64, len: u32, canvas_len: u32, reach: i64) -> Option<(u32, u32)> {
    let len = i64::from(len);
    let start = (-origin).saturating_sub(reach).clamp(0, len);
    let end = (i64::from(canvas_len) - origin)
        .saturating_add(reach)
        .clamp(0, len);
    (start < end).then_some((start as u32, end as u32))
}

/// Source range covering the target span, padded by the filter support, and
/// the target range it maps back to.
fn source_span(start: u32, end: u32, src_len: u32, dst_len: u32) -> Option<(u32, u32, u32, u32)> {
    let scale = f64::from(src_len) / f64::from(dst_len);
    let pad = (LANCZOS_SUPPORT * scale.max(1.0)).ceil();
    let s0 = ((f64::from(start) * scale).floor() - pad).max(0.0) as u32;
    let s1 = ((f64::from(end) * scale).ceil() + pad).min(f64::from(src_len)) as u32;
    let t0 = (f64::from(s0) / scale).round() as u32;
    let t1 = if s1 == src_len {
        dst_len
    } else {
        ((f64::from(s1) / scale).round() as u32).min(dst_len)
    };
    (s0 < s1 && t0 < t1).then_some((s0, s1, t0, t1))
}

/// Resample the part of `overlay` that lands within `reach` pixels of the
/// canvas when scaled to `rect`. `None` when nothing of it can be seen.
fn resample_visible(
    overlay: &RgbaImage,
    rect: &PixelRect,
    (canvas_w, canvas_h): (u32, u32),
    reach: i64,
) -> Option<VisibleOverlay> {
    let (left, top) = (i64::from(rect.x), i64::from(rect.y));
    let (x_start, x_end) = visible_span(left, rect.width, canvas_w, reach)?;
    let (y_start, y_end) = visible_span(top, rect.height, canvas_h, reach)?;
    let (sx0, sx1, tx0, tx1) = source_span(x_start, x_end, overlay.width(), rect.width)?;
    let (sy0, sy1, ty0, ty1) = source_span(y_start, y_end, overlay.height(), rect.height)?;

    let window = (x_end - x_start, y_end - y_start);
    let budget = MIN_RESAMPLE_BUDGET.max(4 * u64::from(window.0) * u64::from(window.1));
    if u64::from(tx1 - tx0) * u64::from(ty1 - ty0) > budget {
        // One source pixel covers more than the canvas here.
        let image = sample_window(overlay, rect, (x_start, y_start), window);
        return Some(VisibleOverlay {
            image,
            left: left + i64::from(x_start),
            top: top + i64::from(y_start),
        });
    }

    let full_source = (sx0, sy0, sx1, sy1) == (0, 0, overlay.width(), overlay.height());
    let image = if full_source {
        resize_overlay(overlay, tx1 - tx0, ty1 - ty0)
    } else {
        let crop = imageops::crop_imm(overlay, sx0, sy0, sx1 - sx0, sy1 - sy0).to_image();
        resize_overlay(&crop, tx1 - tx0, ty1 - ty0)
    };
    Some(VisibleOverlay {
        image,
        left: left + i64::from(tx0),
        top: top + i64::from(ty0),
    })
}

/// Nearest-neighbour sample of the window at `(x_start, y_start)` of
/// `overlay` scaled to `rect`.
fn sample_window(
    overlay: &RgbaImage,
    rect: &PixelRect,
    (x_start, y_start): (u32, u32),
    (width, height): (u32, u32),
) -> RgbaImage {
    let sx = overlay.width() as f32 / rect.width as f32;
    let sy = overlay.height() as f32 / rect.height as f32;
    let (x0, y0) = (x_start as f32, y_start as f32);
    let (max_x, max_y) = ((overlay.width() - 1) as f32, (overlay.height() - 1) as f32);
    let mut out = RgbaImage::new(width, height);
    warp_into_with(
        overlay,
        move |x, y| {
            (
                ((x + x0 + 0.5) * sx - 0.5).clamp(0.0, max_x),
                ((y + y0 + 0.5) * sy - 0.5).clamp(0.0, max_y),
            )
        },
        Interpolation::Nearest,
        Rgba([0, 0, 0, 0]),
        &mut out,
    );
    out
}

fn resize_overlay(overlay: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if overlay.dimensions() == (width, height) {
        return overlay.clone();
    }
    imageops::resize(overlay, width, height, imageops::FilterType::Lanczos3)
}

/// Copy `model` and draw `overlay` onto the copy. The inputs are untouched,
/// so repeated calls with the same arguments give identical buffers.
pub fn compose(
    model: &RgbaImage,
    overlay: &RgbaImage,
    placement: &PlacementResult,
    shadow: Option<&DropShadow>,
) -> RgbaImage {
    let mut canvas = model.clone();
    draw_overlay(&mut canvas, overlay, placement, shadow);
    canvas
}
