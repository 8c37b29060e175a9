//! Shape style record.

use serde::{Deserialize, Serialize};

use crate::color::{Color, ColorError, CssColor};

pub const DEFAULT_LINE_COLOR: &str = "#02B3FC";
pub const DEFAULT_FILL_COLOR: &str = "rgba(255, 126, 126, 0.43)";
pub const DEFAULT_EDGE_COLOR: &str = "rgba(247, 255, 3, 1)";
pub const DEFAULT_TEXT_COLOR: &str = "rgba(255, 255, 255, 1)";
pub const DEFAULT_BG_COLOR: &str = "rgba(0, 0, 0, 0.5)";

/// One color slot of a [`Style`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StyleField {
    LineColor,
    FillColor,
    EdgeColor,
    TextColor,
    BgColor,
}

impl StyleField {
    pub const ALL: [StyleField; 5] = [
        StyleField::LineColor,
        StyleField::FillColor,
        StyleField::EdgeColor,
        StyleField::TextColor,
        StyleField::BgColor,
    ];

    /// Key used in persisted records.
    pub fn key(self) -> &'static str {
        match self {
            StyleField::LineColor => "lineColor",
            StyleField::FillColor => "fillColor",
            StyleField::EdgeColor => "edgeColor",
            StyleField::TextColor => "textColor",
            StyleField::BgColor => "bgColor",
        }
    }

    pub fn default_color(self) -> CssColor {
        match self {
            StyleField::LineColor => CssColor::builtin(DEFAULT_LINE_COLOR, Color::rgb(2, 179, 252)),
            StyleField::FillColor => {
                CssColor::builtin(DEFAULT_FILL_COLOR, Color::new(255, 126, 126, 110))
            }
            StyleField::EdgeColor => CssColor::builtin(DEFAULT_EDGE_COLOR, Color::rgb(247, 255, 3)),
            StyleField::TextColor => CssColor::builtin(DEFAULT_TEXT_COLOR, Color::WHITE),
            StyleField::BgColor => CssColor::builtin(DEFAULT_BG_COLOR, Color::new(0, 0, 0, 128)),
        }
    }
}

/// Colors of a shape. Which slots a kind actually uses is decided by
/// [`KindSpec::style_fields`](crate::kind::KindSpec::style_fields).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    pub line_color: CssColor,
    pub fill_color: CssColor,
    pub edge_color: CssColor,
    pub text_color: CssColor,
    pub bg_color: CssColor,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            line_color: StyleField::LineColor.default_color(),
            fill_color: StyleField::FillColor.default_color(),
            edge_color: StyleField::EdgeColor.default_color(),
            text_color: StyleField::TextColor.default_color(),
            bg_color: StyleField::BgColor.default_color(),
        }
    }
}

impl Style {
    pub fn get(&self, field: StyleField) -> &CssColor {
        match field {
            StyleField::LineColor => &self.line_color,
            StyleField::FillColor => &self.fill_color,
            StyleField::EdgeColor => &self.edge_color,
            StyleField::TextColor => &self.text_color,
            StyleField::BgColor => &self.bg_color,
        }
    }

    pub fn set(&mut self, field: StyleField, color: CssColor) {
        match field {
            StyleField::LineColor => self.line_color = color,
            StyleField::FillColor => self.fill_color = color,
            StyleField::EdgeColor => self.edge_color = color,
            StyleField::TextColor => self.text_color = color,
            StyleField::BgColor => self.bg_color = color,
        }
    }

    pub fn set_css(&mut self, field: StyleField, css: &str) -> Result<(), ColorError> {
        self.set(field, CssColor::parse(css)?);
        Ok(())
    }

    /// Apply every slot present in `overrides`.
    pub fn apply(&mut self, overrides: &StyleOverrides) {
        for field in StyleField::ALL {
            if let Some(color) = overrides.get(field) {
                self.set(field, color.clone());
            }
        }
    }
}

/// Partial style, as found in records and creation options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_color: Option<CssColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<CssColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_color: Option<CssColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<CssColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<CssColor>,
}

impl StyleOverrides {
    pub fn get(&self, field: StyleField) -> Option<&CssColor> {
        match field {
            StyleField::LineColor => self.line_color.as_ref(),
            StyleField::FillColor => self.fill_color.as_ref(),
            StyleField::EdgeColor => self.edge_color.as_ref(),
            StyleField::TextColor => self.text_color.as_ref(),
            StyleField::BgColor => self.bg_color.as_ref(),
        }
    }

    pub fn set(&mut self, field: StyleField, color: Option<CssColor>) {
        match field {
            StyleField::LineColor => self.line_color = color,
            StyleField::FillColor => self.fill_color = color,
            StyleField::EdgeColor => self.edge_color = color,
            StyleField::TextColor => self.text_color = color,
            StyleField::BgColor => self.bg_color = color,
        }
    }

    /// Keep only `fields`, taking each value from `style`.
    pub fn project(style: &Style, fields: &[StyleField]) -> Self {
        let mut out = Self::default();
        for &field in fields {
            out.set(field, Some(style.get(field).clone()));
        }
        out
    }

    /// Drop every slot not listed in `fields`.
    pub fn restricted(&self, fields: &[StyleField]) -> Self {
        let mut out = Self::default();
        for &field in fields {
            out.set(field, self.get(field).cloned());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let style = Style::default();
        assert_eq!(style.line_color.as_str(), "#02B3FC");
        assert_eq!(style.bg_color.as_str(), "rgba(0, 0, 0, 0.5)");
    }

    #[test]
    fn test_builtin_defaults_match_parser() {
        for field in StyleField::ALL {
            let builtin = field.default_color();
            assert_eq!(CssColor::parse(builtin.as_str()).unwrap(), builtin);
        }
    }

    #[test]
    fn test_apply_overrides() {
        let mut style = Style::default();
        let overrides = StyleOverrides {
            fill_color: Some(CssColor::parse("#ff0000").unwrap()),
            ..Default::default()
        };
        style.apply(&overrides);
        assert_eq!(style.fill_color.as_str(), "#ff0000");
        assert_eq!(style.edge_color.as_str(), DEFAULT_EDGE_COLOR);
    }

    #[test]
    fn test_project_keeps_requested_fields() {
        let style = Style::default();
        let projected = StyleOverrides::project(&style, &[StyleField::LineColor, StyleField::TextColor]);
        assert!(projected.line_color.is_some());
        assert!(projected.text_color.is_some());
        assert!(projected.fill_color.is_none());

        let json = serde_json::to_value(&projected).unwrap();
        assert!(json.get("lineColor").is_some());
        assert!(json.get("fillColor").is_none());
    }

    #[test]
    fn test_set_css_rejects_garbage() {
        let mut style = Style::default();
        assert!(style.set_css(StyleField::LineColor, "not a color").is_err());
        assert_eq!(style.line_color.as_str(), DEFAULT_LINE_COLOR);
    }
}
