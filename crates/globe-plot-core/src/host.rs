//! Interfaces to the host scene.
//!
//! The editor never talks to a concrete renderer. It adds and removes tagged
//! primitives through [`Renderer`], receives pick results through
//! [`Picker`], and writes hints to a [`Tooltip`].

use std::fmt;
use std::sync::Arc;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::geometry::GeoRectangle;
use crate::kind::ShapeKind;
use crate::position::Position;

/// Renderer-assigned primitive handle.
pub type PrimitiveId = u64;

/// Screen position in pixels.
pub type ScreenPos = DVec2;

/// Shape instance identifier.
pub type ShapeId = uuid::Uuid;

/// Registry key of a shape instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShapeKey {
    pub kind: ShapeKind,
    pub id: ShapeId,
}

impl fmt::Display for ShapeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// Role of a primitive within its shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleFlag {
    /// Draggable control point.
    Anchor,
    /// Draggable segment midpoint.
    MidAnchor,
    /// Shape body, labels and drawing aids.
    None,
}

/// Tag carried by every primitive the editor adds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrimitiveTag {
    pub kind: ShapeKind,
    pub instance_id: ShapeId,
    pub flag: HandleFlag,
}

impl PrimitiveTag {
    pub fn key(&self) -> ShapeKey {
        ShapeKey {
            kind: self.kind,
            id: self.instance_id,
        }
    }

    pub fn is_handle(&self) -> bool {
        self.flag != HandleFlag::None
    }
}

/// Line material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineMaterial {
    Solid(Color),
    Dashed(Color),
    ArrowHead(Color),
}

impl LineMaterial {
    pub fn color(&self) -> Color {
        match *self {
            LineMaterial::Solid(c) | LineMaterial::Dashed(c) | LineMaterial::ArrowHead(c) => c,
        }
    }
}

/// Visual style of a point marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerStyle {
    Anchor,
    MidAnchor,
    Floating,
    /// Body of a `point` shape.
    Point(Color),
}

/// Renderable geometry of one primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Polyline {
        positions: Vec<Position>,
        width: f32,
        material: LineMaterial,
    },
    Polygon {
        hierarchy: Vec<Position>,
        fill: Color,
    },
    Rectangle {
        bounds: GeoRectangle,
        fill: Color,
    },
    Ellipse {
        center: Position,
        semi_major_axis: f64,
        semi_minor_axis: f64,
        rotation: f64,
        fill: Color,
        outline: Color,
    },
    Label {
        position: Position,
        text: String,
        fill: Color,
        background: Option<Color>,
        pixel_offset: [f32; 2],
    },
    Marker {
        position: Position,
        style: MarkerStyle,
        pixel_size: f32,
    },
}

impl Geometry {
    /// Position a marker sits at.
    pub fn marker_position(&self) -> Option<Position> {
        match self {
            Geometry::Marker { position, .. } => Some(*position),
            _ => None,
        }
    }
}

/// Pull callback re-evaluated every frame. `None` renders nothing that frame.
pub type LiveGeometry = Arc<dyn Fn() -> Option<Geometry> + Send + Sync>;

/// What to draw for a primitive.
#[derive(Clone)]
pub enum PrimitiveDescription {
    Static(Geometry),
    Live(LiveGeometry),
}

impl PrimitiveDescription {
    /// Geometry for the current frame.
    pub fn evaluate(&self) -> Option<Geometry> {
        match self {
            PrimitiveDescription::Static(geometry) => Some(geometry.clone()),
            PrimitiveDescription::Live(callback) => callback(),
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, PrimitiveDescription::Live(_))
    }
}

impl fmt::Debug for PrimitiveDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveDescription::Static(geometry) => f.debug_tuple("Static").field(geometry).finish(),
            PrimitiveDescription::Live(_) => f.write_str("Live(..)"),
        }
    }
}

/// Scene renderer.
pub trait Renderer {
    fn add_primitive(&mut self, tag: PrimitiveTag, description: PrimitiveDescription) -> PrimitiveId;

    /// Removing an unknown id is a no-op.
    fn remove_primitive(&mut self, id: PrimitiveId);

    /// Move a marker primitive in place.
    fn move_marker(&mut self, id: PrimitiveId, position: Position);

    /// Enable or suspend camera navigation (disabled while dragging handles).
    fn set_camera_navigation(&mut self, enabled: bool);
}

/// A hit returned by [`Picker::pick_entity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickedEntity {
    pub id: PrimitiveId,
    pub tag: PrimitiveTag,
}

/// Screen-space picking.
pub trait Picker {
    fn pick_entity(&self, screen: ScreenPos) -> Option<PickedEntity>;

    fn pick_terrain(&self, screen: ScreenPos) -> Option<Position>;
}

/// Hint bubble following the pointer.
pub trait Tooltip {
    fn show_at(&mut self, screen: ScreenPos, html: &str);

    fn set_visible(&mut self, visible: bool);
}
