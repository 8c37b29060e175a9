//! Persisted shape records.
//!
//! ```json
//! { "shape": "polyline-measure",
//!   "positions": [{"x": 1.0, "y": 2.0, "z": 3.0}],
//!   "lineColor": "#02B3FC", "textColor": "rgba(255, 255, 255, 1)" }
//! ```

use serde::{Deserialize, Serialize};

use crate::kind::ShapeKind;
use crate::position::Position;
use crate::style::{Style, StyleOverrides};

/// Why a record was rejected.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("malformed shape record: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{kind} needs at least {expected} positions, found {found}")]
    TooFewPositions {
        kind: ShapeKind,
        expected: usize,
        found: usize,
    },
    #[error("{kind} takes exactly {expected} positions, found {found}")]
    TooManyPositions {
        kind: ShapeKind,
        expected: usize,
        found: usize,
    },
    #[error("position {index} has a non-finite coordinate")]
    NonFinitePosition { index: usize },
    #[error("label record has no label text")]
    MissingLabel,
    #[error("record {index}: {source}")]
    InList {
        index: usize,
        #[source]
        source: Box<RecordError>,
    },
}

/// Serialized form of one shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeRecord {
    pub shape: ShapeKind,
    pub positions: Vec<Position>,
    #[serde(flatten)]
    pub style: StyleOverrides,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ShapeRecord {
    /// Record for `kind`, carrying only the style fields the kind persists.
    pub fn new(kind: ShapeKind, positions: Vec<Position>, style: &Style, label: Option<&str>) -> Self {
        let spec = kind.spec();
        Self {
            shape: kind,
            positions,
            style: StyleOverrides::project(style, spec.style_fields),
            label: spec
                .has_label_text
                .then(|| label.unwrap_or_default().to_string()),
        }
    }

    pub fn validate(&self) -> Result<(), RecordError> {
        let spec = self.shape.spec();
        let found = self.positions.len();

        if found < spec.min_arity {
            return Err(RecordError::TooFewPositions {
                kind: self.shape,
                expected: spec.min_arity,
                found,
            });
        }
        if let Some(expected) = spec.fixed_arity
            && found > expected
        {
            return Err(RecordError::TooManyPositions {
                kind: self.shape,
                expected,
                found,
            });
        }
        if let Some(index) = self.positions.iter().position(|p| !p.is_finite()) {
            return Err(RecordError::NonFinitePosition { index });
        }
        if spec.has_label_text && self.label.is_none() {
            return Err(RecordError::MissingLabel);
        }
        Ok(())
    }

    /// Parse and validate a single record.
    pub fn from_json(json: &str) -> Result<Self, RecordError> {
        let record: Self = serde_json::from_str(json)?;
        record.validate()?;
        Ok(record)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, RecordError> {
        let record: Self = serde_json::from_value(value)?;
        record.validate()?;
        Ok(record)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a JSON array of records. Fails on the first invalid entry.
    pub fn list_from_json(json: &str) -> Result<Vec<Self>, RecordError> {
        let records: Vec<Self> = serde_json::from_str(json)?;
        validate_all(&records)?;
        Ok(records)
    }

    /// Defaults overlaid with the fields this kind persists.
    pub fn resolved_style(&self) -> Style {
        let spec = self.shape.spec();
        let mut style = Style::default();
        style.apply(&self.style.restricted(spec.style_fields));
        style
    }
}

/// Validate every record, reporting the index of the first bad one.
pub fn validate_all(records: &[ShapeRecord]) -> Result<(), RecordError> {
    for (index, record) in records.iter().enumerate() {
        record.validate().map_err(|e| RecordError::InList {
            index,
            source: Box::new(e),
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::CssColor;
    use crate::style::StyleField;

    fn positions(n: usize) -> Vec<Position> {
        (0..n)
            .map(|i| Position::new(6_378_137.0, 1000.0 * i as f64, 500.0 * i as f64))
            .collect()
    }

    fn styled() -> Style {
        let mut style = Style::default();
        style.set(StyleField::LineColor, CssColor::parse("#123456").unwrap());
        style.set(StyleField::FillColor, CssColor::parse("rgba(1, 2, 3, 0.25)").unwrap());
        style.set(StyleField::EdgeColor, CssColor::parse("red").unwrap());
        style.set(StyleField::TextColor, CssColor::parse("#fff").unwrap());
        style.set(StyleField::BgColor, CssColor::parse("#00000040").unwrap());
        style
    }

    #[test]
    fn test_roundtrip_every_kind() {
        let style = styled();
        for kind in ShapeKind::ALL {
            let spec = kind.spec();
            let n = spec.fixed_arity.unwrap_or(spec.cancel_arity + 1);
            let record = ShapeRecord::new(kind, positions(n), &style, Some("hill 203"));

            let json = record.to_json().unwrap();
            let parsed = ShapeRecord::from_json(&json).unwrap();
            assert_eq!(parsed, record, "{kind}");

            let resolved = parsed.resolved_style();
            for &field in spec.style_fields {
                assert_eq!(resolved.get(field), style.get(field), "{kind} {field:?}");
            }
            assert_eq!(parsed.label.is_some(), spec.has_label_text);
        }
    }

    #[test]
    fn test_only_kind_fields_serialized() {
        let record = ShapeRecord::new(ShapeKind::Polyline, positions(2), &Style::default(), None);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["shape"], "polyline");
        assert_eq!(value["lineColor"], "#02B3FC");
        assert!(value.get("fillColor").is_none());
        assert!(value.get("label").is_none());
        assert_eq!(value["positions"][1]["y"], 1000.0);
    }

    #[test]
    fn test_missing_style_fields_use_defaults() {
        let record = ShapeRecord::from_json(
            r#"{"shape":"circle","positions":[{"x":1,"y":2,"z":3},{"x":4,"y":5,"z":6}]}"#,
        )
        .unwrap();
        assert_eq!(record.resolved_style(), Style::default());
    }

    #[test]
    fn test_rejects_too_few_positions() {
        let err = ShapeRecord::from_json(
            r#"{"shape":"ellipse","positions":[{"x":1,"y":2,"z":3},{"x":4,"y":5,"z":6}]}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RecordError::TooFewPositions {
                kind: ShapeKind::Ellipse,
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            ShapeRecord::from_json(r#"{"positions":[]}"#),
            Err(RecordError::Json(_))
        ));
        assert!(matches!(
            ShapeRecord::from_json(r#"{"shape":"hexagon","positions":[]}"#),
            Err(RecordError::Json(_))
        ));
        assert!(matches!(
            ShapeRecord::from_json(r#"{"shape":"point","positions":[{"x":1,"y":2}]}"#),
            Err(RecordError::Json(_))
        ));
        assert!(matches!(
            ShapeRecord::from_json(
                r#"{"shape":"point","positions":[{"x":1,"y":2,"z":3}],"lineColor":"bogus"}"#
            ),
            Err(RecordError::Json(_))
        ));
    }

    #[test]
    fn test_rejects_label_without_text() {
        let err =
            ShapeRecord::from_json(r#"{"shape":"label","positions":[{"x":1,"y":2,"z":3}]}"#)
                .unwrap_err();
        assert!(matches!(err, RecordError::MissingLabel));
    }

    #[test]
    fn test_rejects_extra_positions_for_fixed_kind() {
        let mut record = ShapeRecord::new(ShapeKind::Circle, positions(2), &Style::default(), None);
        record.positions.push(Position::new(1.0, 1.0, 1.0));
        assert!(matches!(
            record.validate(),
            Err(RecordError::TooManyPositions { expected: 2, found: 3, .. })
        ));
    }

    #[test]
    fn test_list_reports_bad_index() {
        let good = ShapeRecord::new(ShapeKind::Point, positions(1), &Style::default(), None);
        let bad = ShapeRecord {
            positions: vec![],
            ..good.clone()
        };
        let json = serde_json::to_string(&vec![good, bad]).unwrap();
        let err = ShapeRecord::list_from_json(&json).unwrap_err();
        assert!(matches!(err, RecordError::InList { index: 1, .. }));
    }
}
