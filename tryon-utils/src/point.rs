use serde::{Deserialize, Serialize};

/// Single 2D point.
///
/// Landmark points are normalised to `[0, 1]` of the image size; scan points
/// are absolute pixels. [`Point::to_pixels`] converts the former into the latter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Scale a normalised point into pixel space for an image of `width` x `height`.
    pub fn to_pixels(self, width: u32, height: u32) -> Point {
        Point {
            x: self.x * width as f32,
            y: self.y * height as f32,
        }
    }
}
