//! World-space positions and their geographic counterpart.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Cartesian position in the host scene (earth-centered, metres).
///
/// Persisted as `{x, y, z}`; arithmetic goes through [`DVec3`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn as_dvec3(self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }

    /// Straight-line distance in metres.
    pub fn distance(self, other: Position) -> f64 {
        self.as_dvec3().distance(other.as_dvec3())
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<DVec3> for Position {
    fn from(v: DVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<Position> for DVec3 {
    fn from(p: Position) -> Self {
        p.as_dvec3()
    }
}

/// Geographic coordinate. Angles are radians, height is metres above the ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Cartographic {
    pub longitude: f64,
    pub latitude: f64,
    pub height: f64,
}

impl Cartographic {
    pub const fn new(longitude: f64, latitude: f64, height: f64) -> Self {
        Self {
            longitude,
            latitude,
            height,
        }
    }

    pub fn from_degrees(longitude: f64, latitude: f64, height: f64) -> Self {
        Self::new(longitude.to_radians(), latitude.to_radians(), height)
    }

    /// `[longitude, latitude]` in degrees.
    pub fn lon_lat_degrees(self) -> [f64; 2] {
        [self.longitude.to_degrees(), self.latitude.to_degrees()]
    }
}
