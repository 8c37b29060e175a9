//! Per-kind layer geometry.

use std::sync::Arc;

use crate::config::PlotConfig;
use crate::geometry::GeometryKernel;
use crate::host::{Geometry, LineMaterial, LiveGeometry, MarkerStyle};
use crate::kind::{ShapeKind, ShapeLayer};
use crate::position::Position;
use crate::style::Style;

use super::model::SharedModel;

/// Everything needed to turn points into geometry for one kind.
#[derive(Clone)]
pub(crate) struct LayerPainter {
    pub kind: ShapeKind,
    pub kernel: GeometryKernel,
    pub config: Arc<PlotConfig>,
}

impl LayerPainter {
    pub fn geometry(
        &self,
        layer: ShapeLayer,
        points: &[Position],
        style: &Style,
        label: &str,
    ) -> Option<Geometry> {
        use ShapeKind as K;
        use ShapeLayer as L;

        let render = &self.config.render;
        let kernel = &self.kernel;

        match (self.kind, layer) {
            (K::Point, L::Marker) => Some(Geometry::Marker {
                position: *points.first()?,
                style: MarkerStyle::Point(style.line_color.rgba()),
                pixel_size: render.marker_pixel_size,
            }),
            (K::Label, L::Label) => Some(Geometry::Label {
                position: *points.first()?,
                text: label.to_string(),
                fill: style.text_color.rgba(),
                background: Some(style.bg_color.rgba()),
                pixel_offset: render.label_pixel_offset,
            }),

            (K::Polyline, L::Edge) => polyline(
                points.to_vec(),
                render.line_width,
                LineMaterial::Solid(style.line_color.rgba()),
            ),
            (K::PolylineMeasure, L::Edge) => polyline(
                points.to_vec(),
                render.measure_line_width,
                LineMaterial::Solid(style.line_color.rgba()),
            ),
            (K::PolylineMeasure, L::Label) => {
                if points.len() < 2 {
                    return None;
                }
                let km = kernel.polyline_length(points);
                self.label(points[0], self.config.measure.distance_label(km), style)
            }

            (K::Polygon | K::PolygonMeasure, L::Fill) => (points.len() >= 3).then(|| Geometry::Polygon {
                hierarchy: points.to_vec(),
                fill: style.fill_color.rgba(),
            }),
            (K::Polygon | K::PolygonMeasure, L::Edge) => polyline(
                closed(points),
                render.edge_width,
                LineMaterial::Solid(style.edge_color.rgba()),
            ),
            (K::PolygonMeasure, L::Label) => {
                let area = kernel.polygon_area(points)?;
                let perimeter = kernel.polygon_perimeter(points)?;
                let anchor = kernel.surface_centroid(points)?;
                self.label(anchor, self.config.measure.area_label(area, perimeter), style)
            }

            (K::Rectangle, L::Fill) => {
                let rect = kernel.rectangle_from_two_points(points)?;
                Some(Geometry::Rectangle {
                    bounds: rect.bounds,
                    fill: style.fill_color.rgba(),
                })
            }
            (K::Rectangle, L::Edge) => {
                let rect = kernel.rectangle_from_two_points(points)?;
                polyline(
                    rect.edge.to_vec(),
                    render.edge_width,
                    LineMaterial::Solid(style.edge_color.rgba()),
                )
            }

            (K::Circle | K::CircleMeasure, L::Fill) => Some(Geometry::Polygon {
                hierarchy: kernel.circle_from_two_points(points)?,
                fill: style.fill_color.rgba(),
            }),
            (K::Circle | K::CircleMeasure, L::Edge) => polyline(
                kernel.circle_from_two_points(points)?,
                render.edge_width,
                LineMaterial::Solid(style.edge_color.rgba()),
            ),
            (K::CircleMeasure, L::Label) => {
                let area = kernel.circle_area(points)?;
                let perimeter = kernel.circle_perimeter(points)?;
                self.label(points[0], self.config.measure.area_label(area, perimeter), style)
            }

            (K::StraightArrow, L::Fill) => Some(Geometry::Polygon {
                hierarchy: kernel.fine_arrow(points)?,
                fill: style.fill_color.rgba(),
            }),
            (K::StraightArrow, L::Edge) => polyline(
                kernel.fine_arrow(points)?,
                render.edge_width,
                LineMaterial::Solid(style.edge_color.rgba()),
            ),
            (K::AttackArrow, L::Fill) => Some(Geometry::Polygon {
                hierarchy: kernel.tailed_arrow(points)?,
                fill: style.fill_color.rgba(),
            }),
            (K::AttackArrow, L::Edge) => polyline(
                kernel.tailed_arrow(points)?,
                render.edge_width,
                LineMaterial::Solid(style.edge_color.rgba()),
            ),

            (K::StraightArrow2, L::Edge) => {
                let parts = kernel.straight_arrow_head(points)?;
                polyline(
                    vec![parts.shaft[0], parts.head[1]],
                    render.arrow_line_width,
                    LineMaterial::ArrowHead(style.line_color.rgba()),
                )
            }
            (K::StraightArrow3, L::Edge) => polyline(
                kernel.straight_arrow_head(points)?.shaft.to_vec(),
                render.arrow_shaft_width,
                LineMaterial::Solid(style.line_color.rgba()),
            ),
            (K::StraightArrow4, L::Edge) => polyline(
                kernel.straight_arrow_head(points)?.shaft.to_vec(),
                render.arrow_shaft_width,
                LineMaterial::Dashed(style.line_color.rgba()),
            ),
            (K::StraightArrow3 | K::StraightArrow4, L::Head) => polyline(
                kernel.straight_arrow_head(points)?.head.to_vec(),
                render.arrow_head_width,
                LineMaterial::ArrowHead(style.line_color.rgba()),
            ),

            (K::Ellipse, L::Fill) => {
                let ellipse = kernel.ellipse_from_three_points(points)?;
                Some(Geometry::Ellipse {
                    center: ellipse.center,
                    semi_major_axis: ellipse.semi_major_axis,
                    semi_minor_axis: ellipse.semi_minor_axis,
                    rotation: ellipse.rotation,
                    fill: style.fill_color.rgba(),
                    outline: style.edge_color.rgba(),
                })
            }

            _ => None,
        }
    }

    /// Callback that rebuilds `layer` from the shared model each frame.
    pub fn live(&self, layer: ShapeLayer, model: SharedModel) -> LiveGeometry {
        let painter = self.clone();
        Arc::new(move || {
            let model = model.read();
            let points = model.outline_points();
            painter.geometry(layer, &points, &model.style, &model.label)
        })
    }

    fn label(&self, position: Position, text: String, style: &Style) -> Option<Geometry> {
        Some(Geometry::Label {
            position,
            text,
            fill: style.text_color.rgba(),
            background: None,
            pixel_offset: self.config.render.label_pixel_offset,
        })
    }
}

fn polyline(positions: Vec<Position>, width: f32, material: LineMaterial) -> Option<Geometry> {
    (positions.len() >= 2).then_some(Geometry::Polyline {
        positions,
        width,
        material,
    })
}

fn closed(points: &[Position]) -> Vec<Position> {
    let mut ring = points.to_vec();
    if points.len() > 2 {
        ring.push(points[0]);
    }
    ring
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::{Geodesy, Wgs84};
    use crate::host::Geometry;
    use crate::position::Cartographic;

    fn at(lon: f64, lat: f64) -> Position {
        Wgs84.to_cartesian(Cartographic::from_degrees(lon, lat, 0.0))
    }

    fn painter(kind: ShapeKind) -> LayerPainter {
        LayerPainter {
            kind,
            kernel: GeometryKernel::default(),
            config: Arc::new(PlotConfig::default()),
        }
    }

    #[test]
    fn test_every_kind_renders_every_layer_at_arity() {
        let points = [at(0.0, 0.0), at(0.1, 0.1), at(0.25, 0.05), at(0.4, 0.1), at(0.5, 0.2)];
        for kind in ShapeKind::ALL {
            let spec = kind.spec();
            let n = spec.fixed_arity.unwrap_or(spec.cancel_arity);
            let p = painter(kind);
            for &layer in spec.layers {
                assert!(
                    p.geometry(layer, &points[..n], &Style::default(), "txt").is_some(),
                    "{kind} {layer:?}"
                );
            }
        }
    }

    #[test]
    fn test_insufficient_points_render_nothing() {
        let p = painter(ShapeKind::Polyline);
        assert!(p.geometry(ShapeLayer::Edge, &[at(0.0, 0.0)], &Style::default(), "").is_none());
        let p = painter(ShapeKind::Ellipse);
        assert!(p
            .geometry(ShapeLayer::Fill, &[at(0.0, 0.0), at(1.0, 0.0)], &Style::default(), "")
            .is_none());
    }

    #[test]
    fn test_measure_label_anchored_at_first_point() {
        let points = [at(0.0, 0.0), at(0.1, 0.0), at(0.1, 0.1)];
        let p = painter(ShapeKind::PolylineMeasure);
        let Some(Geometry::Label { position, text, .. }) =
            p.geometry(ShapeLayer::Label, &points, &Style::default(), "")
        else {
            panic!("expected a label");
        };
        assert_eq!(position, points[0]);
        let km = (points[0].distance(points[1]) + points[1].distance(points[2])) / 1000.0;
        assert_eq!(text, format!("Distance: {km:.3} km"));
    }

    #[test]
    fn test_polygon_edge_is_closed() {
        let points = [at(0.0, 0.0), at(0.1, 0.0), at(0.1, 0.1)];
        let p = painter(ShapeKind::Polygon);
        let Some(Geometry::Polyline { positions, .. }) =
            p.geometry(ShapeLayer::Edge, &points, &Style::default(), "")
        else {
            panic!("expected an edge");
        };
        assert_eq!(positions.len(), 4);
        assert_eq!(positions[0], positions[3]);
    }

    #[test]
    fn test_arrow_four_has_dashed_shaft() {
        let points = [at(0.0, 0.0), at(0.1, 0.0)];
        let p = painter(ShapeKind::StraightArrow4);
        let shaft = p.geometry(ShapeLayer::Edge, &points, &Style::default(), "");
        let head = p.geometry(ShapeLayer::Head, &points, &Style::default(), "");
        assert!(matches!(
            shaft,
            Some(Geometry::Polyline { material: LineMaterial::Dashed(_), .. })
        ));
        let Some(Geometry::Polyline { width, material, .. }) = head else {
            panic!("expected a head");
        };
        assert!(matches!(material, LineMaterial::ArrowHead(_)));
        assert!(width > PlotConfig::default().render.arrow_shaft_width);
    }
}
