//! Globe Plot Core Library
//!
//! Interactive authoring of geo-referenced shapes on a 3D globe: points,
//! labels, lines, areas, measurements and military-style arrows.
//!
//! Each shape instance is a [`ShapeEditor`] that goes through drawing,
//! editing and commit. A [`ShapeRegistry`] owns the instances of one surface
//! and routes pointer input to them. Rendering, picking and tooltips are
//! reached only through the traits in [`host`].

#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod color;
pub mod config;
pub mod editor;
pub mod geodesy;
pub mod geometry;
pub mod headless;
pub mod host;
pub mod kind;
pub mod position;
pub mod record;
pub mod registry;
pub mod selection;
pub mod style;
pub mod topology;

#[cfg(test)]
pub(crate) mod test_utils;

pub use color::{Color, ColorError, CssColor};
pub use config::{GeometryConfig, HintText, MeasureText, PlotConfig, RenderConfig};
pub use editor::{CreateOptions, EditorError, EditorResponse, EditorState, PlotEvent, ShapeEditor};
pub use geodesy::{Geodesy, Wgs84};
pub use geometry::{ArrowProvider, GeometryKernel, PlotArrows};
pub use headless::{HeadlessScene, HeadlessTooltip, ScreenProjection};
pub use host::{
    Geometry, HandleFlag, PickedEntity, Picker, PrimitiveDescription, PrimitiveId, PrimitiveTag, Renderer,
    ScreenPos, ShapeId, ShapeKey, Tooltip,
};
pub use kind::{ShapeKind, UnknownKind};
pub use position::{Cartographic, Position};
pub use record::{RecordError, ShapeRecord};
pub use registry::{InputEvent, RegistryError, ShapeRegistry};
pub use selection::SelectionStore;
pub use style::{Style, StyleField, StyleOverrides};
pub use topology::AnchorTopology;
