//! Geodesy provider.
//!
//! Everything the editor knows about the shape of the earth goes through
//! [`Geodesy`]. [`Wgs84`] is the default provider; hosts with their own
//! ellipsoid math can plug theirs in instead.

use std::f64::consts::FRAC_PI_2;

use glam::DVec3;

use crate::position::{Cartographic, Position};

/// WGS84 semi-major axis in metres.
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 first eccentricity squared.
pub const WGS84_E2: f64 = 0.006_694_379_990_141_316;
/// Mean earth radius used by great-circle distances, in metres.
pub const MEAN_EARTH_RADIUS: f64 = 6_371_008.8;

/// Host-supplied geodesy operations over [`Position`].
pub trait Geodesy: Send + Sync {
    fn to_geographic(&self, position: Position) -> Cartographic;

    fn to_cartesian(&self, cartographic: Cartographic) -> Position;

    /// Straight-line 3D distance in metres.
    fn distance(&self, a: Position, b: Position) -> f64 {
        a.distance(b)
    }

    /// Point at `fraction` of the surface path from `a` to `b`.
    fn interpolate(&self, a: Position, b: Position, fraction: f64) -> Position;

    fn midpoint(&self, a: Position, b: Position) -> Position {
        self.interpolate(a, b, 0.5)
    }

    /// Initial bearing from `a` to `b` in degrees, clockwise from north, in `[-180, 180]`.
    fn bearing(&self, a: Position, b: Position) -> f64;

    /// Distance in metres from `p` to the line through `a` and `b`.
    fn point_to_line_distance(&self, p: Position, a: Position, b: Position) -> f64;

    /// Area enclosed by `ring` in square metres. The ring may or may not repeat its first vertex.
    fn ring_area(&self, ring: &[Position]) -> f64;

    /// Local east/north/up unit vectors at `origin`.
    fn east_north_up(&self, origin: Position) -> [DVec3; 3] {
        let c = self.to_geographic(origin);
        let (sin_lon, cos_lon) = c.longitude.sin_cos();
        let (sin_lat, cos_lat) = c.latitude.sin_cos();
        let east = DVec3::new(-sin_lon, cos_lon, 0.0);
        let north = DVec3::new(-sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat);
        let up = DVec3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat);
        [east, north, up]
    }
}

/// WGS84 ellipsoid provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct Wgs84;

impl Wgs84 {
    fn normal(c: Cartographic) -> DVec3 {
        let (sin_lon, cos_lon) = c.longitude.sin_cos();
        let (sin_lat, cos_lat) = c.latitude.sin_cos();
        DVec3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat)
    }

    fn haversine(a: [f64; 2], b: [f64; 2]) -> f64 {
        let (lon1, lat1) = (a[0].to_radians(), a[1].to_radians());
        let (lon2, lat2) = (b[0].to_radians(), b[1].to_radians());
        let d_lat = lat2 - lat1;
        let d_lon = lon2 - lon1;
        let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * MEAN_EARTH_RADIUS * h.sqrt().atan2((1.0 - h).sqrt())
    }
}

impl Geodesy for Wgs84 {
    fn to_geographic(&self, position: Position) -> Cartographic {
        let v = position.as_dvec3();
        let p = v.x.hypot(v.y);
        let longitude = v.y.atan2(v.x);
        let b = WGS84_A * (1.0 - WGS84_E2).sqrt();

        if p < 1e-9 {
            let latitude = if v.z >= 0.0 { FRAC_PI_2 } else { -FRAC_PI_2 };
            return Cartographic::new(0.0, latitude, v.z.abs() - b);
        }

        let mut latitude = v.z.atan2(p * (1.0 - WGS84_E2));
        let mut height = 0.0;
        for _ in 0..6 {
            let sin_lat = latitude.sin();
            let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
            height = p / latitude.cos() - n;
            latitude = v.z.atan2(p * (1.0 - WGS84_E2 * n / (n + height)));
        }
        Cartographic::new(longitude, latitude, height)
    }

    fn to_cartesian(&self, c: Cartographic) -> Position {
        let (sin_lat, cos_lat) = c.latitude.sin_cos();
        let (sin_lon, cos_lon) = c.longitude.sin_cos();
        let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        Position::new(
            (n + c.height) * cos_lat * cos_lon,
            (n + c.height) * cos_lat * sin_lon,
            (n * (1.0 - WGS84_E2) + c.height) * sin_lat,
        )
    }

    fn interpolate(&self, a: Position, b: Position, fraction: f64) -> Position {
        let ca = self.to_geographic(a);
        let cb = self.to_geographic(b);
        let na = Self::normal(ca);
        let nb = Self::normal(cb);
        let angle = na.cross(nb).length().atan2(na.dot(nb));

        let n = if angle.sin().abs() < 1e-12 {
            let n = na.lerp(nb, fraction);
            if n.length_squared() > 0.0 { n.normalize() } else { na }
        } else {
            let wa = ((1.0 - fraction) * angle).sin() / angle.sin();
            let wb = (fraction * angle).sin() / angle.sin();
            (na * wa + nb * wb).normalize()
        };

        let latitude = n.z.atan2(n.x.hypot(n.y));
        let longitude = n.y.atan2(n.x);
        let height = ca.height + (cb.height - ca.height) * fraction;
        self.to_cartesian(Cartographic::new(longitude, latitude, height))
    }

    fn bearing(&self, a: Position, b: Position) -> f64 {
        let ca = self.to_geographic(a);
        let cb = self.to_geographic(b);
        let d_lon = cb.longitude - ca.longitude;
        let y = d_lon.sin() * cb.latitude.cos();
        let x = ca.latitude.cos() * cb.latitude.sin()
            - ca.latitude.sin() * cb.latitude.cos() * d_lon.cos();
        y.atan2(x).to_degrees()
    }

    fn point_to_line_distance(&self, p: Position, a: Position, b: Position) -> f64 {
        let p = self.to_geographic(p).lon_lat_degrees();
        let a = self.to_geographic(a).lon_lat_degrees();
        let b = self.to_geographic(b).lon_lat_degrees();

        let v = [b[0] - a[0], b[1] - a[1]];
        let w = [p[0] - a[0], p[1] - a[1]];
        let vv = v[0] * v[0] + v[1] * v[1];
        if vv <= f64::EPSILON {
            return Self::haversine(p, a);
        }
        let t = (w[0] * v[0] + w[1] * v[1]) / vv;
        let foot = [a[0] + t * v[0], a[1] + t * v[1]];
        Self::haversine(p, foot)
    }

    fn ring_area(&self, ring: &[Position]) -> f64 {
        let mut coords: Vec<Cartographic> = ring.iter().map(|p| self.to_geographic(*p)).collect();
        if coords.len() > 1 && ring.first() == ring.last() {
            coords.pop();
        }
        let n = coords.len();
        if n < 3 {
            return 0.0;
        }

        let mut total = 0.0;
        for i in 0..n {
            let lower = coords[i];
            let middle = coords[(i + 1) % n];
            let upper = coords[(i + 2) % n];
            total += (upper.longitude - lower.longitude) * middle.latitude.sin();
        }
        (total * WGS84_A * WGS84_A / 2.0).abs()
    }
}
