//! CSS color strings as stored in shape records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// RGBA color handed to the renderer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 128, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);

    /// Anchor handle marker.
    pub const ANCHOR: Color = Color::rgb(255, 255, 255);
    /// Midpoint handle marker.
    pub const MID_ANCHOR: Color = Color::new(255, 255, 255, 128);
    /// Floating anchor while drawing.
    pub const FLOATING: Color = Color::rgb(2, 179, 252);

    pub fn alpha_f32(self) -> f32 {
        f32::from(self.a) / 255.0
    }
}

/// Failure to parse a CSS color string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid css color: {0:?}")]
pub struct ColorError(pub String);

/// A CSS color string together with its parsed value.
///
/// The original text is what gets persisted, so `"#02B3FC"` stays
/// `"#02B3FC"` through a save/load cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CssColor {
    raw: String,
    rgba: Color,
}

impl CssColor {
    pub fn parse(raw: &str) -> Result<Self, ColorError> {
        let rgba = parse_css(raw.trim()).ok_or_else(|| ColorError(raw.to_string()))?;
        Ok(Self {
            raw: raw.to_string(),
            rgba,
        })
    }

    pub(crate) fn builtin(raw: &str, rgba: Color) -> Self {
        Self {
            raw: raw.to_string(),
            rgba,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn rgba(&self) -> Color {
        self.rgba
    }
}

impl FromStr for CssColor {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CssColor {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CssColor> for String {
    fn from(value: CssColor) -> Self {
        value.raw
    }
}

impl fmt::Display for CssColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_css(s: &str) -> Option<Color> {
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }

    let lower = s.to_ascii_lowercase();
    if let Some(body) = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return parse_functional(body);
    }

    match lower.as_str() {
        "white" => Some(Color::WHITE),
        "black" => Some(Color::BLACK),
        "red" => Some(Color::RED),
        "green" => Some(Color::GREEN),
        "blue" => Some(Color::BLUE),
        "yellow" => Some(Color::YELLOW),
        "transparent" => Some(Color::TRANSPARENT),
        _ => None,
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();

    match hex.len() {
        3 => Some(Color::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
        4 => Some(Color::new(nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?)),
        6 => Some(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Color::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

fn parse_functional(body: &str) -> Option<Color> {
    let parts: Vec<&str> = body.split(',').map(str::trim).collect();
    let channel = |s: &str| -> Option<u8> {
        let v: f64 = s.parse().ok()?;
        (0.0..=255.0).contains(&v).then(|| v.round() as u8)
    };

    match parts.as_slice() {
        [r, g, b] => Some(Color::rgb(channel(r)?, channel(g)?, channel(b)?)),
        [r, g, b, a] => {
            let alpha: f64 = a.parse().ok()?;
            if !(0.0..=1.0).contains(&alpha) {
                return None;
            }
            Some(Color::new(
                channel(r)?,
                channel(g)?,
                channel(b)?,
                (alpha * 255.0).round() as u8,
            ))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(CssColor::parse("#02B3FC").unwrap().rgba(), Color::rgb(2, 179, 252));
        assert_eq!(CssColor::parse("#fff").unwrap().rgba(), Color::WHITE);
        assert_eq!(
            CssColor::parse("#00000080").unwrap().rgba(),
            Color::new(0, 0, 0, 128)
        );
    }

    #[test]
    fn test_parse_rgba() {
        let c = CssColor::parse("rgba(255, 126, 126, 0.43)").unwrap();
        assert_eq!(c.rgba(), Color::new(255, 126, 126, 110));
        assert_eq!(CssColor::parse("rgb(1,2,3)").unwrap().rgba(), Color::rgb(1, 2, 3));
    }

    #[test]
    fn test_invalid_colors_rejected() {
        assert!(CssColor::parse("#12").is_err());
        assert!(CssColor::parse("rgba(300, 0, 0, 1)").is_err());
        assert!(CssColor::parse("rgba(0, 0, 0, 2)").is_err());
        assert!(CssColor::parse("chartreuse-ish").is_err());
    }

    #[test]
    fn test_raw_text_preserved_through_serde() {
        let c = CssColor::parse("rgba(0, 0, 0, 0.5)").unwrap();
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(json, "\"rgba(0, 0, 0, 0.5)\"");
        let back: CssColor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
        assert!(serde_json::from_str::<CssColor>("\"nope\"").is_err());
    }
}
