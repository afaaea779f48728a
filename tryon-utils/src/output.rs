//! Encoding and writing the composited result.
//!
//! Format selection follows the output path's extension when auto-detection
//! is on, otherwise the configured format.

use crate::config::OutputSettings;

use anyhow::{Context, Result};
use image::{
    DynamicImage, ExtendedColorType, ImageEncoder,
    codecs::{
        jpeg::JpegEncoder,
        png::{CompressionType, FilterType, PngEncoder},
        webp::WebPEncoder,
    },
};
use log::debug;
use std::{fs, path::Path};

/// Canonical image formats supported by the exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormatHint {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl ImageFormatHint {
    /// Determine format from a filesystem extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        ext.parse().ok()
    }
}

impl std::str::FromStr for ImageFormatHint {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "webp" => Ok(Self::Webp),
            other => Err(format!("unknown image format '{other}'")),
        }
    }
}

/// Resolved encoder configuration.
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format: Option<ImageFormatHint>,
    pub auto_detect: bool,
    pub jpeg_quality: u8,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self::from_output_settings(&OutputSettings::default())
    }
}

impl OutputOptions {
    pub fn from_output_settings(settings: &OutputSettings) -> Self {
        Self {
            format: settings.format.parse().ok(),
            auto_detect: settings.auto_detect_format,
            jpeg_quality: settings.jpeg_quality.clamp(1, 100),
        }
    }

    /// The format that will be used for `destination`.
    pub fn format_for(&self, destination: &Path) -> ImageFormatHint {
        if self.auto_detect
            && let Some(fmt) = destination
                .extension()
                .and_then(|e| e.to_str())
                .and_then(ImageFormatHint::from_extension)
        {
            return fmt;
        }
        self.format.unwrap_or_default()
    }
}

/// Encode `image` and write it to `destination`, creating parent directories.
pub fn save_image(image: &DynamicImage, destination: &Path, options: &OutputOptions) -> Result<()> {
    if let Some(parent) = destination
        .parent()
        .filter(|p| !p.as_os_str().is_empty() && !p.exists())
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let format = options.format_for(destination);
    debug!(
        "Saving result to {} using {:?} format",
        destination.display(),
        format
    );

    let encoded = match format {
        ImageFormatHint::Png => encode_png(image)?,
        ImageFormatHint::Jpeg => encode_jpeg(image, options.jpeg_quality)?,
        ImageFormatHint::Webp => encode_webp(image)?,
    };

    fs::write(destination, encoded)
        .with_context(|| format!("failed to write {}", destination.display()))
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let rgba = image.to_rgba8();
    let mut buffer = Vec::new();
    PngEncoder::new_with_quality(&mut buffer, CompressionType::Default, FilterType::Adaptive)
        .write_image(
            rgba.as_raw(),
            rgba.width(),
            rgba.height(),
            ExtendedColorType::Rgba8,
        )
        .context("failed to encode PNG")?;
    Ok(buffer)
}

fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    // JPEG has no alpha channel.
    let rgb = image.to_rgb8();
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality)
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            ExtendedColorType::Rgb8,
        )
        .context("failed to encode JPEG")?;
    Ok(buffer)
}

fn encode_webp(image: &DynamicImage) -> Result<Vec<u8>> {
    let rgba = image.to_rgba8();
    let mut buffer = Vec::new();
    WebPEncoder::new_lossless(&mut buffer)
        .write_image(
            rgba.as_raw(),
            rgba.width(),
            rgba.height(),
            ExtendedColorType::Rgba8,
        )
        .context("failed to encode WebP")?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba, RgbaImage};

    fn sample_image() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 6, Rgba([200, 120, 90, 255])))
    }

    #[test]
    fn extension_overrides_configured_format() {
        let options = OutputOptions::default();
        assert_eq!(
            options.format_for(Path::new("out/result.JPG")),
            ImageFormatHint::Jpeg
        );
        assert_eq!(
            options.format_for(Path::new("out/result.unknown")),
            ImageFormatHint::Png
        );

        let fixed = OutputOptions {
            format: Some(ImageFormatHint::Webp),
            auto_detect: false,
            jpeg_quality: 90,
        };
        assert_eq!(
            fixed.format_for(Path::new("result.png")),
            ImageFormatHint::Webp
        );
    }

    #[test]
    fn saves_png_and_jpeg_into_new_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let options = OutputOptions::default();
        for name in ["nested/result.png", "nested/result.jpg"] {
            let path = dir.path().join(name);
            save_image(&sample_image(), &path, &options).expect("save");
            let decoded = image::open(&path).expect("decode");
            assert_eq!(decoded.dimensions(), (8, 6));
        }
    }
}
