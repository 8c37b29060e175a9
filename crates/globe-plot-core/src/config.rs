//! Tunable constants for geometry, rendering and tooltip text.

use serde::{Deserialize, Serialize};

use crate::kind::DrawPrompt;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub geometry: GeometryConfig,
    pub render: RenderConfig,
    pub hints: HintText,
    pub measure: MeasureText,
}

impl PlotConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Geometry kernel parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Angular step between circle ring vertices, in degrees.
    pub circle_granularity_deg: f64,
    /// Fraction of the shaft at which straight-arrow heads start.
    pub arrow_head_fraction: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            circle_granularity_deg: 2.0,
            arrow_head_fraction: 0.96,
        }
    }
}

/// Stroke widths and label placement, in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub line_width: f32,
    pub measure_line_width: f32,
    pub edge_width: f32,
    pub arrow_shaft_width: f32,
    pub arrow_head_width: f32,
    pub arrow_line_width: f32,
    pub label_pixel_offset: [f32; 2],
    pub marker_pixel_size: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            line_width: 3.0,
            measure_line_width: 8.0,
            edge_width: 3.0,
            arrow_shaft_width: 4.0,
            arrow_head_width: 20.0,
            arrow_line_width: 10.0,
            label_pixel_offset: [0.0, -25.0],
            marker_pixel_size: 10.0,
        }
    }
}

/// Tooltip text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HintText {
    pub choose_position: String,
    pub choose_start: String,
    pub choose_end: String,
    pub next_point: String,
    pub finish_suffix: String,
    pub major_axis_start: String,
    pub major_axis_end: String,
    pub minor_axis: String,
    pub move_control_point: String,
    pub split_segment: String,
}

impl Default for HintText {
    fn default() -> Self {
        Self {
            choose_position: "Choose a position".to_string(),
            choose_start: "Choose start point".to_string(),
            choose_end: "Choose end point".to_string(),
            next_point: "Click to add the next point".to_string(),
            finish_suffix: "Right-click to finish".to_string(),
            major_axis_start: "Major axis: choose the first point".to_string(),
            major_axis_end: "Major axis: choose the second point".to_string(),
            minor_axis: "Minor axis: choose a point".to_string(),
            move_control_point: "Drag to move the control point".to_string(),
            split_segment: "Drag to create a new control point".to_string(),
        }
    }
}

impl HintText {
    /// Tooltip html for a drawing prompt.
    pub fn for_prompt(&self, prompt: DrawPrompt) -> String {
        match prompt {
            DrawPrompt::Position => self.choose_position.clone(),
            DrawPrompt::StartPoint => self.choose_start.clone(),
            DrawPrompt::EndPoint => self.choose_end.clone(),
            DrawPrompt::NextPoint => self.next_point.clone(),
            DrawPrompt::NextPointOrFinish => format!("{}<br>{}", self.next_point, self.finish_suffix),
            DrawPrompt::MajorAxisStart => self.major_axis_start.clone(),
            DrawPrompt::MajorAxisEnd => self.major_axis_end.clone(),
            DrawPrompt::MinorAxis => self.minor_axis.clone(),
        }
    }
}

/// Measurement label wording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasureText {
    pub distance: String,
    pub area: String,
    pub perimeter: String,
    pub length_unit: String,
    pub area_unit: String,
}

impl Default for MeasureText {
    fn default() -> Self {
        Self {
            distance: "Distance".to_string(),
            area: "Area".to_string(),
            perimeter: "Perimeter".to_string(),
            length_unit: "km".to_string(),
            area_unit: "km²".to_string(),
        }
    }
}

impl MeasureText {
    pub fn distance_label(&self, km: f64) -> String {
        format!("{}: {km:.3} {}", self.distance, self.length_unit)
    }

    pub fn area_label(&self, km2: f64, perimeter_km: f64) -> String {
        format!(
            "{}: {km2:.3} {}\n{}: {perimeter_km:.3} {}",
            self.area, self.area_unit, self.perimeter, self.length_unit
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = PlotConfig::from_json(r#"{"geometry":{"circle_granularity_deg":5.0}}"#).unwrap();
        assert_eq!(config.geometry.circle_granularity_deg, 5.0);
        assert_eq!(config.geometry.arrow_head_fraction, 0.96);
        assert_eq!(config.render, RenderConfig::default());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = PlotConfig::default();
        let json = config.to_json().unwrap();
        assert_eq!(PlotConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_measure_labels() {
        let text = MeasureText::default();
        assert_eq!(text.distance_label(1.23456), "Distance: 1.235 km");
        assert_eq!(text.area_label(2.0, 5.5), "Area: 2.000 km²\nPerimeter: 5.500 km");
    }

    #[test]
    fn test_finish_hint() {
        let hints = HintText::default();
        let html = hints.for_prompt(DrawPrompt::NextPointOrFinish);
        assert!(html.starts_with(&hints.next_point));
        assert!(html.ends_with(&hints.finish_suffix));
    }
}
