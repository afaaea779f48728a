//! Basic color utilities shared by the compositor and the CLI.

use serde::{Deserialize, Serialize};

/// Simple RGBA color stored in 8-bit channels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RgbaColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl RgbaColor {
    /// Constructs an opaque RGB color.
    pub const fn opaque(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha: 255,
        }
    }

    /// Constructs a color whose alpha is given as a fraction in `0.0..=1.0`,
    /// the way CSS `rgba()` expresses it.
    pub fn with_alpha_fraction(red: u8, green: u8, blue: u8, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha: (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
        }
    }

    /// Alpha as a fraction in `0.0..=1.0`.
    pub fn alpha_fraction(self) -> f32 {
        self.alpha as f32 / 255.0
    }

    /// True when the color contributes nothing when drawn.
    pub fn is_transparent(self) -> bool {
        self.alpha == 0
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.red, self.green, self.blue, self.alpha]
    }
}

impl Default for RgbaColor {
    fn default() -> Self {
        Self::opaque(0, 0, 0)
    }
}

/// Parse a hexadecimal color string. Accepts `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`, with or without `#`.
pub fn parse_hex_color(input: &str) -> Option<RgbaColor> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let hex = trimmed
        .strip_prefix('#')
        .or_else(|| trimmed.strip_prefix("0x"))
        .unwrap_or(trimmed);
    match hex.len() {
        3 | 4 => {
            let mut channels = [255u8; 4];
            for (idx, slot) in channels.iter_mut().take(hex.len()).enumerate() {
                *slot = replicate_nibble(hex.get(idx..idx + 1)?)?;
            }
            Some(RgbaColor {
                red: channels[0],
                green: channels[1],
                blue: channels[2],
                alpha: channels[3],
            })
        }
        6 | 8 => {
            let mut channels = [255u8; 4];
            for (idx, slot) in channels.iter_mut().take(hex.len() / 2).enumerate() {
                *slot = parse_byte(hex.get(idx * 2..idx * 2 + 2)?)?;
            }
            Some(RgbaColor {
                red: channels[0],
                green: channels[1],
                blue: channels[2],
                alpha: channels[3],
            })
        }
        _ => None,
    }
}

fn parse_byte(slice: &str) -> Option<u8> {
    u8::from_str_radix(slice, 16).ok()
}

fn replicate_nibble(slice: &str) -> Option<u8> {
    let nib = u8::from_str_radix(slice, 16).ok()?;
    Some((nib << 4) | nib)
}
