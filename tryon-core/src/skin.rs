//! Fixed RGB skin classifier and the strided pixel scan built on it.

use image::RgbaImage;
use tryon_utils::Point;

/// Classic RGB skin rule: reddish, not too dark, with visible chroma.
///
/// ```rust
/// # use tryon_core::skin::is_skin_color;
/// assert!(is_skin_color(200, 120, 90));
/// assert!(!is_skin_color(90, 90, 90));
/// ```
#[inline]
pub fn is_skin_color(r: u8, g: u8, b: u8) -> bool {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    r > 95 && g > 40 && b > 20 && max - min > 15 && r.abs_diff(g) > 15 && r > g && r > b
}

/// Accumulated skin samples from one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SkinScan {
    pub count: usize,
    pub sum_x: f64,
    pub sum_y: f64,
}

impl SkinScan {
    /// Centre of mass of the skin samples, `None` when nothing matched.
    pub fn centroid(&self) -> Option<Point> {
        (self.count > 0).then(|| {
            let n = self.count as f64;
            Point::new((self.sum_x / n) as f32, (self.sum_y / n) as f32)
        })
    }
}

/// Visit every `stride`-th pixel on both axes, starting at (0, 0).
pub fn scan_skin(image: &RgbaImage, stride: u32) -> SkinScan {
    let step = stride.max(1) as usize;
    let mut scan = SkinScan::default();
    for y in (0..image.height()).step_by(step) {
        for x in (0..image.width()).step_by(step) {
            let [r, g, b, _] = image.get_pixel(x, y).0;
            if is_skin_color(r, g, b) {
                scan.count += 1;
                scan.sum_x += f64::from(x);
                scan.sum_y += f64::from(y);
            }
        }
    }
    scan
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn classifier_thresholds() {
        assert!(is_skin_color(224, 172, 105));
        // Red too low.
        assert!(!is_skin_color(95, 41, 21));
        // Blue channel dominates red.
        assert!(!is_skin_color(120, 60, 130));
        // Red and green too close.
        assert!(!is_skin_color(150, 140, 60));
        // Flat grey has no chroma.
        assert!(!is_skin_color(200, 200, 200));
        assert!(!is_skin_color(0, 0, 0));
    }

    #[test]
    fn scan_only_reads_stride_grid() {
        let mut image = RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 255]));
        // Off-grid pixels are ignored.
        image.put_pixel(1, 1, Rgba([200, 120, 90, 255]));
        image.put_pixel(5, 6, Rgba([200, 120, 90, 255]));
        image.put_pixel(8, 4, Rgba([200, 120, 90, 255]));
        image.put_pixel(12, 12, Rgba([200, 120, 90, 255]));

        let scan = scan_skin(&image, 4);
        assert_eq!(scan.count, 2);
        assert_eq!(scan.centroid(), Some(Point::new(10.0, 8.0)));
    }

    #[test]
    fn empty_scan_has_no_centroid() {
        let image = RgbaImage::from_pixel(8, 8, Rgba([10, 10, 10, 255]));
        let scan = scan_skin(&image, 0);
        assert_eq!(scan.count, 0);
        assert!(scan.centroid().is_none());
    }
}
