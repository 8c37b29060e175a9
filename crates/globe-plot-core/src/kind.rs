//! Shape kinds and the per-kind strategy table the generic editor runs on.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::style::StyleField;

/// Every kind of shape the editor can author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShapeKind {
    #[serde(rename = "point")]
    Point,
    #[serde(rename = "polyline")]
    Polyline,
    #[serde(rename = "polyline-measure")]
    PolylineMeasure,
    #[serde(rename = "rectangle")]
    Rectangle,
    #[serde(rename = "circle")]
    Circle,
    #[serde(rename = "circle-measure")]
    CircleMeasure,
    #[serde(rename = "polygon")]
    Polygon,
    #[serde(rename = "polygon-measure")]
    PolygonMeasure,
    #[serde(rename = "label")]
    Label,
    /// Thick arrow drawn as a filled outline.
    #[serde(rename = "straight-arrow")]
    StraightArrow,
    /// Thin arrow, one line with an arrow-head material.
    #[serde(rename = "straight-arrow-2")]
    StraightArrow2,
    /// Thin arrow, solid shaft and separate head.
    #[serde(rename = "straight-arrow-3")]
    StraightArrow3,
    /// Thin arrow, dashed shaft and separate head.
    #[serde(rename = "straight-arrow-4")]
    StraightArrow4,
    #[serde(rename = "attack-arrow")]
    AttackArrow,
    #[serde(rename = "ellipse")]
    Ellipse,
}

/// How the edit session lays out draggable handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleLayout {
    /// One handle per control point.
    Vertices,
    /// Control points interleaved with segment midpoints.
    VerticesWithMidpoints,
}

/// One rendered part of a shape. Each layer becomes its own primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeLayer {
    Fill,
    Edge,
    Head,
    Label,
    Marker,
}

/// Context hint shown while collecting anchors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawPrompt {
    Position,
    StartPoint,
    EndPoint,
    NextPoint,
    NextPointOrFinish,
    MajorAxisStart,
    MajorAxisEnd,
    MinorAxis,
}

/// Strategy record for a [`ShapeKind`].
#[derive(Debug, Clone, Copy)]
pub struct KindSpec {
    /// Fewest control points a persisted shape may have.
    pub min_arity: usize,
    /// Clicks needed for a cancel gesture to finish the shape instead of aborting it.
    pub cancel_arity: usize,
    /// Drawing ends by itself after this many clicks.
    pub fixed_arity: Option<usize>,
    pub handles: HandleLayout,
    pub style_fields: &'static [StyleField],
    pub layers: &'static [ShapeLayer],
    pub has_label_text: bool,
}

const LINE: &[StyleField] = &[StyleField::LineColor];
const LINE_TEXT: &[StyleField] = &[StyleField::LineColor, StyleField::TextColor];
const AREA: &[StyleField] = &[StyleField::FillColor, StyleField::EdgeColor];
const AREA_TEXT: &[StyleField] = &[
    StyleField::FillColor,
    StyleField::EdgeColor,
    StyleField::TextColor,
];
const TEXT_BG: &[StyleField] = &[StyleField::TextColor, StyleField::BgColor];

const fn fixed(
    arity: usize,
    style_fields: &'static [StyleField],
    layers: &'static [ShapeLayer],
) -> KindSpec {
    KindSpec {
        min_arity: arity,
        cancel_arity: arity,
        fixed_arity: Some(arity),
        handles: HandleLayout::Vertices,
        style_fields,
        layers,
        has_label_text: false,
    }
}

const fn open(
    min_arity: usize,
    cancel_arity: usize,
    handles: HandleLayout,
    style_fields: &'static [StyleField],
    layers: &'static [ShapeLayer],
) -> KindSpec {
    KindSpec {
        min_arity,
        cancel_arity,
        fixed_arity: None,
        handles,
        style_fields,
        layers,
        has_label_text: false,
    }
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 15] = [
        ShapeKind::Point,
        ShapeKind::Polyline,
        ShapeKind::PolylineMeasure,
        ShapeKind::Rectangle,
        ShapeKind::Circle,
        ShapeKind::CircleMeasure,
        ShapeKind::Polygon,
        ShapeKind::PolygonMeasure,
        ShapeKind::Label,
        ShapeKind::StraightArrow,
        ShapeKind::StraightArrow2,
        ShapeKind::StraightArrow3,
        ShapeKind::StraightArrow4,
        ShapeKind::AttackArrow,
        ShapeKind::Ellipse,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ShapeKind::Point => "point",
            ShapeKind::Polyline => "polyline",
            ShapeKind::PolylineMeasure => "polyline-measure",
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Circle => "circle",
            ShapeKind::CircleMeasure => "circle-measure",
            ShapeKind::Polygon => "polygon",
            ShapeKind::PolygonMeasure => "polygon-measure",
            ShapeKind::Label => "label",
            ShapeKind::StraightArrow => "straight-arrow",
            ShapeKind::StraightArrow2 => "straight-arrow-2",
            ShapeKind::StraightArrow3 => "straight-arrow-3",
            ShapeKind::StraightArrow4 => "straight-arrow-4",
            ShapeKind::AttackArrow => "attack-arrow",
            ShapeKind::Ellipse => "ellipse",
        }
    }

    pub fn spec(self) -> KindSpec {
        use HandleLayout::{Vertices, VerticesWithMidpoints};
        use ShapeLayer::{Edge, Fill, Head, Label, Marker};

        match self {
            ShapeKind::Point => fixed(1, LINE, &[Marker]),
            ShapeKind::Label => KindSpec {
                has_label_text: true,
                ..fixed(1, TEXT_BG, &[Label])
            },
            ShapeKind::Polyline => open(2, 3, VerticesWithMidpoints, LINE, &[Edge]),
            ShapeKind::PolylineMeasure => {
                open(2, 3, VerticesWithMidpoints, LINE_TEXT, &[Edge, Label])
            }
            ShapeKind::Polygon => open(2, 3, VerticesWithMidpoints, AREA, &[Fill, Edge]),
            ShapeKind::PolygonMeasure => {
                open(2, 3, VerticesWithMidpoints, AREA_TEXT, &[Fill, Edge, Label])
            }
            ShapeKind::AttackArrow => open(4, 4, Vertices, AREA, &[Fill, Edge]),
            ShapeKind::Rectangle | ShapeKind::Circle | ShapeKind::StraightArrow => {
                fixed(2, AREA, &[Fill, Edge])
            }
            ShapeKind::CircleMeasure => fixed(2, AREA_TEXT, &[Fill, Edge, Label]),
            ShapeKind::StraightArrow2 => fixed(2, LINE, &[Edge]),
            ShapeKind::StraightArrow3 | ShapeKind::StraightArrow4 => fixed(2, LINE, &[Edge, Head]),
            ShapeKind::Ellipse => fixed(3, AREA, &[Fill]),
        }
    }

    pub fn is_line_like(self) -> bool {
        self.spec().handles == HandleLayout::VerticesWithMidpoints
    }

    /// Hint for the next click, given how many anchors are already placed.
    pub fn draw_prompt(self, placed: usize) -> DrawPrompt {
        let spec = self.spec();
        match (self, spec.fixed_arity, placed) {
            (_, Some(1), _) => DrawPrompt::Position,
            (ShapeKind::Ellipse, _, 0) => DrawPrompt::MajorAxisStart,
            (ShapeKind::Ellipse, _, 1) => DrawPrompt::MajorAxisEnd,
            (ShapeKind::Ellipse, _, _) => DrawPrompt::MinorAxis,
            (_, _, 0) => DrawPrompt::StartPoint,
            (_, Some(_), _) => DrawPrompt::EndPoint,
            (_, None, n) if n >= spec.cancel_arity => DrawPrompt::NextPointOrFinish,
            (_, None, _) => DrawPrompt::NextPoint,
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized shape kind name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown shape kind: {0}")]
pub struct UnknownKind(pub String);

impl FromStr for ShapeKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShapeKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_match_serde() {
        for kind in ShapeKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
            assert_eq!(kind.as_str().parse::<ShapeKind>().unwrap(), kind);
        }
        assert!("hexagon".parse::<ShapeKind>().is_err());
    }

    #[test]
    fn test_arity_table() {
        assert_eq!(ShapeKind::Point.spec().min_arity, 1);
        assert_eq!(ShapeKind::Label.spec().min_arity, 1);
        assert_eq!(ShapeKind::Circle.spec().fixed_arity, Some(2));
        assert_eq!(ShapeKind::StraightArrow4.spec().fixed_arity, Some(2));
        assert_eq!(ShapeKind::Ellipse.spec().fixed_arity, Some(3));
        assert_eq!(ShapeKind::AttackArrow.spec().min_arity, 4);
        assert_eq!(ShapeKind::AttackArrow.spec().fixed_arity, None);

        let polyline = ShapeKind::Polyline.spec();
        assert_eq!(polyline.min_arity, 2);
        assert_eq!(polyline.cancel_arity, 3);
        assert_eq!(polyline.fixed_arity, None);
    }

    #[test]
    fn test_line_like_kinds() {
        let line_like: Vec<_> = ShapeKind::ALL.into_iter().filter(|k| k.is_line_like()).collect();
        assert_eq!(
            line_like,
            vec![
                ShapeKind::Polyline,
                ShapeKind::PolylineMeasure,
                ShapeKind::Polygon,
                ShapeKind::PolygonMeasure,
            ]
        );
    }

    #[test]
    fn test_draw_prompts() {
        assert_eq!(ShapeKind::Label.draw_prompt(0), DrawPrompt::Position);
        assert_eq!(ShapeKind::Circle.draw_prompt(0), DrawPrompt::StartPoint);
        assert_eq!(ShapeKind::Circle.draw_prompt(1), DrawPrompt::EndPoint);
        assert_eq!(ShapeKind::Ellipse.draw_prompt(2), DrawPrompt::MinorAxis);
        assert_eq!(ShapeKind::Polyline.draw_prompt(2), DrawPrompt::NextPoint);
        assert_eq!(ShapeKind::Polyline.draw_prompt(3), DrawPrompt::NextPointOrFinish);
    }
}
