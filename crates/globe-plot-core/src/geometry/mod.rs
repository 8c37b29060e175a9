//! Geometry kernel.
//!
//! Turns a handful of anchor positions into renderable outlines. Every
//! function returns `None` when the input is insufficient or degenerate;
//! callers skip that frame and try again on the next change.

mod arrow;

pub use arrow::*;

use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::sync::Arc;

use crate::config::GeometryConfig;
use crate::geodesy::{Geodesy, Wgs84};
use crate::position::{Cartographic, Position};

/// Geographic bounds in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoRectangle {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipseOutline {
    pub center: Position,
    pub semi_major_axis: f64,
    pub semi_minor_axis: f64,
    /// Radians, counter-clockwise from east.
    pub rotation: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RectangleOutline {
    pub bounds: GeoRectangle,
    /// NW, NE, SE, SW, NW.
    pub edge: [Position; 5],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StraightArrowParts {
    pub shaft: [Position; 2],
    pub head: [Position; 2],
}

/// Stateless outline generator bound to a geodesy and arrow provider.
#[derive(Clone)]
pub struct GeometryKernel {
    geodesy: Arc<dyn Geodesy>,
    arrows: Arc<dyn ArrowProvider>,
    config: GeometryConfig,
}

impl Default for GeometryKernel {
    fn default() -> Self {
        Self::new(Arc::new(Wgs84), Arc::new(PlotArrows::default()), GeometryConfig::default())
    }
}

impl std::fmt::Debug for GeometryKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeometryKernel")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GeometryKernel {
    pub fn new(
        geodesy: Arc<dyn Geodesy>,
        arrows: Arc<dyn ArrowProvider>,
        config: GeometryConfig,
    ) -> Self {
        Self {
            geodesy,
            arrows,
            config,
        }
    }

    pub fn geodesy(&self) -> &dyn Geodesy {
        self.geodesy.as_ref()
    }

    pub fn config(&self) -> &GeometryConfig {
        &self.config
    }

    /// Circle ring around `points[0]` through `points[1]`, first vertex repeated last.
    pub fn circle_from_two_points(&self, points: &[Position]) -> Option<Vec<Position>> {
        let (center, radius) = self.circle_radius(points)?;
        let [east, north, _] = self.geodesy.east_north_up(center);
        let origin = center.as_dvec3();

        let granularity = self.config.circle_granularity_deg.clamp(0.1, 45.0);
        let segments = ((360.0 / granularity).round() as usize).max(8);

        let mut ring: Vec<Position> = (0..segments)
            .map(|i| {
                let theta = TAU * i as f64 / segments as f64;
                Position::from(origin + radius * (theta.cos() * east + theta.sin() * north))
            })
            .collect();
        ring.push(ring[0]);
        Some(ring)
    }

    /// Center and radius in metres. `None` for fewer than two points or zero radius.
    pub fn circle_radius(&self, points: &[Position]) -> Option<(Position, f64)> {
        let [center, edge, ..] = points else {
            return None;
        };
        let radius = self.geodesy.distance(*center, *edge);
        (radius > 0.0).then_some((*center, radius))
    }

    pub fn ellipse_from_three_points(&self, points: &[Position]) -> Option<EllipseOutline> {
        let [p0, p1, p2, ..] = points else {
            return None;
        };
        let semi_major_axis = self.geodesy.distance(*p0, *p1) / 2.0;
        if semi_major_axis <= 0.0 {
            return None;
        }
        let semi_minor_axis = self
            .geodesy
            .point_to_line_distance(*p2, *p0, *p1)
            .min(semi_major_axis);
        let bearing = self.geodesy.bearing(*p0, *p1).to_radians();

        Some(EllipseOutline {
            center: self.geodesy.midpoint(*p0, *p1),
            semi_major_axis,
            semi_minor_axis,
            rotation: -bearing + FRAC_PI_2,
        })
    }

    pub fn rectangle_from_two_points(&self, points: &[Position]) -> Option<RectangleOutline> {
        let [p0, p1, ..] = points else {
            return None;
        };
        let a = self.geodesy.to_geographic(*p0);
        let b = self.geodesy.to_geographic(*p1);
        let bounds = GeoRectangle {
            west: a.longitude.min(b.longitude),
            south: a.latitude.min(b.latitude),
            east: a.longitude.max(b.longitude),
            north: a.latitude.max(b.latitude),
        };
        if bounds.west == bounds.east || bounds.south == bounds.north {
            return None;
        }

        let corner = |lon, lat| self.geodesy.to_cartesian(Cartographic::new(lon, lat, 0.0));
        let nw = corner(bounds.west, bounds.north);
        Some(RectangleOutline {
            bounds,
            edge: [
                nw,
                corner(bounds.east, bounds.north),
                corner(bounds.east, bounds.south),
                corner(bounds.west, bounds.south),
                nw,
            ],
        })
    }

    /// Thick straight arrow outline, closed.
    pub fn fine_arrow(&self, points: &[Position]) -> Option<Vec<Position>> {
        let [tail, head, ..] = points else {
            return None;
        };
        let ring = self
            .arrows
            .fine_arrow(self.lon_lat(*tail), self.lon_lat(*head))?;
        self.surface_ring(&ring)
    }

    /// Tailed attack arrow outline, closed.
    pub fn tailed_arrow(&self, points: &[Position]) -> Option<Vec<Position>> {
        if points.len() < 3 {
            return None;
        }
        let lon_lats: Vec<LonLat> = points.iter().map(|p| self.lon_lat(*p)).collect();
        let ring = self.arrows.tailed_attack_arrow(&lon_lats)?;
        self.surface_ring(&ring)
    }

    /// Shaft and head segments of a thin straight arrow.
    pub fn straight_arrow_head(&self, points: &[Position]) -> Option<StraightArrowParts> {
        let [tail, tip, ..] = points else {
            return None;
        };
        if self.geodesy.distance(*tail, *tip) <= 0.0 {
            return None;
        }
        let neck = self
            .geodesy
            .interpolate(*tail, *tip, self.config.arrow_head_fraction);
        Some(StraightArrowParts {
            shaft: [*tail, neck],
            head: [neck, *tip],
        })
    }

    /// Sum of consecutive straight-line distances, in kilometres.
    pub fn polyline_length(&self, points: &[Position]) -> f64 {
        points
            .windows(2)
            .map(|w| self.geodesy.distance(w[0], w[1]))
            .sum::<f64>()
            / 1000.0
    }

    /// Circle area in square kilometres.
    pub fn circle_area(&self, points: &[Position]) -> Option<f64> {
        let (_, radius) = self.circle_radius(points)?;
        Some(PI * radius * radius / 1_000_000.0)
    }

    /// Circle circumference in kilometres.
    pub fn circle_perimeter(&self, points: &[Position]) -> Option<f64> {
        let (_, radius) = self.circle_radius(points)?;
        Some(TAU * radius / 1000.0)
    }

    /// Polygon area in square kilometres.
    pub fn polygon_area(&self, points: &[Position]) -> Option<f64> {
        (points.len() >= 3).then(|| self.geodesy.ring_area(points) / 1_000_000.0)
    }

    /// Closed polygon perimeter in kilometres.
    pub fn polygon_perimeter(&self, points: &[Position]) -> Option<f64> {
        let (first, last) = (points.first()?, points.last()?);
        if points.len() < 3 {
            return None;
        }
        Some(self.polyline_length(points) + self.geodesy.distance(*last, *first) / 1000.0)
    }

    /// Surface point at the mean longitude/latitude/height of `points`.
    pub fn surface_centroid(&self, points: &[Position]) -> Option<Position> {
        if points.is_empty() {
            return None;
        }
        let n = points.len() as f64;
        let (lon, lat, height) = points
            .iter()
            .map(|p| self.geodesy.to_geographic(*p))
            .fold((0.0, 0.0, 0.0), |acc, c| {
                (acc.0 + c.longitude, acc.1 + c.latitude, acc.2 + c.height)
            });
        Some(
            self.geodesy
                .to_cartesian(Cartographic::new(lon / n, lat / n, height / n)),
        )
    }

    fn lon_lat(&self, p: Position) -> LonLat {
        self.geodesy.to_geographic(p).lon_lat_degrees()
    }

    fn surface_ring(&self, ring: &[LonLat]) -> Option<Vec<Position>> {
        if ring.len() < 3 {
            return None;
        }
        let mut out: Vec<Position> = ring
            .iter()
            .map(|[lon, lat]| {
                self.geodesy
                    .to_cartesian(Cartographic::from_degrees(*lon, *lat, 0.0))
            })
            .collect();
        if ring.first() != ring.last() {
            out.push(out[0]);
        }
        Some(out)
    }
}

/// Kilometres to three decimals.
pub fn format_km(km: f64) -> String {
    format!("{km:.3}")
}
