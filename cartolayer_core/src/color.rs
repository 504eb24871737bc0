// Copyright 2026 the Cartolayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! RGB colors and evenly sampled linear color scales.

use core::fmt;
use core::str::FromStr;

/// An opaque sRGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Black, used when a configured color cannot be parsed.
    pub const BLACK: Self = Self::new(0, 0, 0);

    /// Creates a color from channel values.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rgb` or `#rrggbb`, falling back to black.
    ///
    /// Configuration colors come from user input, so a typo degrades the
    /// style instead of failing the update.
    #[must_use]
    pub fn parse_or_black(s: &str) -> Self {
        s.parse().unwrap_or_else(|_| {
            tracing::warn!(color = s, "unparsable color, using black");
            Self::BLACK
        })
    }

    /// Linear interpolation in RGB space, `t` clamped to `[0, 1]`.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "interpolated channels stay within 0..=255 after clamping t"
    )]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
        Self::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

/// Error returned when a string is not a hex color.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("`{0}` is not a #rgb or #rrggbb color")]
pub struct ParseColorError(String);

impl FromStr for Rgb {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseColorError(s.to_owned());
        let hex = s.trim().strip_prefix('#').ok_or_else(err)?;
        if !hex.is_ascii() {
            return Err(err());
        }
        let channel = |h: &str| u8::from_str_radix(h, 16).map_err(|_| err());
        match hex.len() {
            3 => {
                let short = |i: usize| channel(&hex[i..=i]).map(|v| v * 17);
                Ok(Self::new(short(0)?, short(1)?, short(2)?))
            }
            6 => Ok(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            _ => Err(err()),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// A piecewise-linear scale through evenly spaced anchor colors.
///
/// A two-color scale `[min, max]` maps `0.0` to `min` and `1.0` to `max`; a
/// three-color scale puts its middle color at `0.5`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorScale {
    anchors: Vec<Rgb>,
}

impl ColorScale {
    /// Creates a scale from hex color strings. Unparsable entries become
    /// black.
    #[must_use]
    pub fn new<S: AsRef<str>>(colors: &[S]) -> Self {
        Self {
            anchors: colors.iter().map(|c| Rgb::parse_or_black(c.as_ref())).collect(),
        }
    }

    /// Evaluates the scale at `t` in `[0, 1]`.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "segment index is bounded by the anchor count"
    )]
    pub fn at(&self, t: f64) -> Rgb {
        match self.anchors.as_slice() {
            [] => Rgb::BLACK,
            [only] => *only,
            anchors => {
                let segments = (anchors.len() - 1) as f64;
                let pos = t.clamp(0.0, 1.0) * segments;
                let i = (pos.floor() as usize).min(anchors.len() - 2);
                anchors[i].lerp(anchors[i + 1], pos - i as f64)
            }
        }
    }

    /// Samples `n` evenly spaced colors, first at `0.0` and last at `1.0`.
    ///
    /// A single sample is the first anchor color.
    #[must_use]
    pub fn colors(&self, n: usize) -> Vec<String> {
        match n {
            0 => Vec::new(),
            1 => vec![self.at(0.0).to_string()],
            _ => {
                let last = (n - 1) as f64;
                (0..n).map(|i| self.at(i as f64 / last).to_string()).collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_hex() {
        assert_eq!("#fff".parse::<Rgb>(), Ok(Rgb::new(255, 255, 255)));
        assert_eq!("#2c7fb8".parse::<Rgb>(), Ok(Rgb::new(0x2c, 0x7f, 0xb8)));
        assert!("2c7fb8".parse::<Rgb>().is_err(), "missing #");
        assert!("#2c7fb".parse::<Rgb>().is_err(), "five digits");
        assert!("#ééé".parse::<Rgb>().is_err(), "non-ascii");
    }

    #[test]
    fn unparsable_color_degrades_to_black() {
        assert_eq!(Rgb::parse_or_black("teal-ish"), Rgb::BLACK);
    }

    #[test]
    fn two_color_scale_samples_endpoints() {
        let scale = ColorScale::new(&["#000000", "#ffffff"]);
        let colors = scale.colors(3);
        assert_eq!(colors, ["#000000", "#808080", "#ffffff"]);
    }

    #[test]
    fn three_color_scale_hits_middle_anchor() {
        let scale = ColorScale::new(&["#ff0000", "#00ff00", "#0000ff"]);
        assert_eq!(scale.at(0.5), Rgb::new(0, 255, 0));
        assert_eq!(scale.at(0.25), Rgb::new(128, 128, 0));
        assert_eq!(scale.at(1.0), Rgb::new(0, 0, 255));
    }

    #[test]
    fn single_sample_is_first_color() {
        let scale = ColorScale::new(&["#123456", "#abcdef"]);
        assert_eq!(scale.colors(1), ["#123456"]);
        assert!(scale.colors(0).is_empty(), "no samples");
    }
}
