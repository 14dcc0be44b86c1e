//! Integer HSL color used for theme variables.

use palette::{FromColor, Srgb};
use serde::{Deserialize, Serialize};

/// Hue in degrees (0..=359), saturation and lightness in percent (0..=100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hsl {
    /// Hue in degrees.
    pub h: u16,
    /// Saturation in percent.
    pub s: u8,
    /// Lightness in percent.
    pub l: u8,
}

impl Hsl {
    /// Creates an HSL value, wrapping the hue and capping percentages at 100.
    pub fn new(h: u16, s: u8, l: u8) -> Self {
        Self {
            h: h % 360,
            s: s.min(100),
            l: l.min(100),
        }
    }

    /// Converts an 8-bit sRGB color with the piecewise hue formula.
    ///
    /// Each component is rounded to the nearest integer; a hue that rounds
    /// to 360 wraps to 0.
    pub fn from_rgb(rgb: Srgb<u8>) -> Self {
        let r = f64::from(rgb.red) / 255.0;
        let g = f64::from(rgb.green) / 255.0;
        let b = f64::from(rgb.blue) / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;

        let (h, s) = if max == min {
            (0.0, 0.0)
        } else {
            let d = max - min;
            let s = if l > 0.5 {
                d / (2.0 - max - min)
            } else {
                d / (max + min)
            };
            let h = if max == r {
                ((g - b) / d + if g < b { 6.0 } else { 0.0 }) / 6.0
            } else if max == g {
                ((b - r) / d + 2.0) / 6.0
            } else {
                ((r - g) / d + 4.0) / 6.0
            };
            (h, s)
        };

        Self::new(
            (h * 360.0).round() as u16,
            (s * 100.0).round() as u8,
            (l * 100.0).round() as u8,
        )
    }

    /// Converts back to 8-bit sRGB.
    pub fn to_rgb(&self) -> Srgb<u8> {
        let hsl = palette::Hsl::new_srgb(
            f32::from(self.h),
            f32::from(self.s) / 100.0,
            f32::from(self.l) / 100.0,
        );
        let rgb: Srgb<f32> = Srgb::from_color(hsl);
        rgb.into_format()
    }

    /// `#rrggbb` form of this color.
    pub fn to_hex(&self) -> String {
        let rgb = self.to_rgb();
        format!("#{:02x}{:02x}{:02x}", rgb.red, rgb.green, rgb.blue)
    }

    /// Space-separated form used by CSS custom properties, e.g. `20 100% 60%`.
    pub fn css_value(&self) -> String {
        format!("{} {}% {}%", self.h, self.s, self.l)
    }
}

impl std::fmt::Display for Hsl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "hsl({}, {}%, {}%)", self.h, self.s, self.l)
    }
}

impl From<Srgb<u8>> for Hsl {
    fn from(rgb: Srgb<u8>) -> Self {
        Self::from_rgb(rgb)
    }
}
