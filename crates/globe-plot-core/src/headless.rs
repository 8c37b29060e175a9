//! In-memory host used by tests and the command-line tool.
//!
//! The screen is a flat window onto the ellipsoid surface: each pixel spans a
//! fixed number of degrees, `y` grows southwards.

use std::collections::BTreeMap;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::geodesy::{Geodesy, Wgs84};
use crate::host::{
    Geometry, HandleFlag, PickedEntity, Picker, PrimitiveDescription, PrimitiveId, PrimitiveTag,
    Renderer, ScreenPos, ShapeKey, Tooltip,
};
use crate::position::{Cartographic, Position};

/// Linear mapping between screen pixels and longitude/latitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenProjection {
    /// Longitude and latitude at screen (0, 0), degrees.
    pub origin: [f64; 2],
    pub degrees_per_pixel: f64,
    /// Hit tolerance in pixels.
    pub pick_radius: f64,
}

impl Default for ScreenProjection {
    fn default() -> Self {
        Self {
            origin: [0.0, 0.0],
            degrees_per_pixel: 1.0e-4,
            pick_radius: 6.0,
        }
    }
}

impl ScreenProjection {
    pub fn to_lon_lat(&self, screen: ScreenPos) -> [f64; 2] {
        [
            self.origin[0] + screen.x * self.degrees_per_pixel,
            self.origin[1] - screen.y * self.degrees_per_pixel,
        ]
    }

    pub fn from_lon_lat(&self, lon: f64, lat: f64) -> ScreenPos {
        DVec2::new(
            (lon - self.origin[0]) / self.degrees_per_pixel,
            (self.origin[1] - lat) / self.degrees_per_pixel,
        )
    }

    /// Surface point under `screen`. `None` beyond the poles.
    pub fn to_world(&self, screen: ScreenPos) -> Option<Position> {
        let [lon, lat] = self.to_lon_lat(screen);
        if !lat.is_finite() || lat.abs() > 90.0 {
            return None;
        }
        Some(Wgs84.to_cartesian(Cartographic::from_degrees(lon, lat, 0.0)))
    }

    pub fn to_screen(&self, position: Position) -> ScreenPos {
        let [lon, lat] = Wgs84.to_geographic(position).lon_lat_degrees();
        self.from_lon_lat(lon, lat)
    }
}

struct Entry {
    tag: PrimitiveTag,
    description: PrimitiveDescription,
}

/// Renderer and picker that keep primitives in memory.
pub struct HeadlessScene {
    projection: ScreenProjection,
    primitives: BTreeMap<PrimitiveId, Entry>,
    next_id: PrimitiveId,
    camera_navigation: bool,
    frame: BTreeMap<PrimitiveId, Geometry>,
    frames_rendered: u64,
}

impl Default for HeadlessScene {
    fn default() -> Self {
        Self::new(ScreenProjection::default())
    }
}

impl std::fmt::Debug for HeadlessScene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlessScene")
            .field("projection", &self.projection)
            .field("primitives", &self.primitives.len())
            .field("camera_navigation", &self.camera_navigation)
            .finish_non_exhaustive()
    }
}

impl HeadlessScene {
    pub fn new(projection: ScreenProjection) -> Self {
        Self {
            projection,
            primitives: BTreeMap::new(),
            next_id: 1,
            camera_navigation: true,
            frame: BTreeMap::new(),
            frames_rendered: 0,
        }
    }

    pub fn projection(&self) -> &ScreenProjection {
        &self.projection
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn camera_navigation(&self) -> bool {
        self.camera_navigation
    }

    /// Evaluate every primitive once, as a render tick would.
    ///
    /// Returns the number of primitives that produced geometry.
    pub fn render_frame(&mut self) -> usize {
        self.frame = self
            .primitives
            .iter()
            .filter_map(|(&id, entry)| Some((id, entry.description.evaluate()?)))
            .collect();
        self.frames_rendered += 1;
        self.frame.len()
    }

    /// Geometry produced by the last [`render_frame`](Self::render_frame).
    pub fn frame(&self) -> &BTreeMap<PrimitiveId, Geometry> {
        &self.frame
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn tag(&self, id: PrimitiveId) -> Option<PrimitiveTag> {
        self.primitives.get(&id).map(|entry| entry.tag)
    }

    /// Current geometry of one primitive.
    pub fn geometry(&self, id: PrimitiveId) -> Option<Geometry> {
        self.primitives.get(&id)?.description.evaluate()
    }

    pub fn is_live(&self, id: PrimitiveId) -> bool {
        self.primitives
            .get(&id)
            .is_some_and(|entry| entry.description.is_live())
    }

    pub fn ids_of(&self, key: ShapeKey) -> Vec<PrimitiveId> {
        self.primitives
            .iter()
            .filter(|(_, entry)| entry.tag.key() == key)
            .map(|(&id, _)| id)
            .collect()
    }

    /// Primitives of `key` carrying `flag`.
    pub fn count(&self, key: ShapeKey, flag: HandleFlag) -> usize {
        self.primitives
            .values()
            .filter(|entry| entry.tag.key() == key && entry.tag.flag == flag)
            .count()
    }

    pub fn marker_positions(&self, key: ShapeKey, flag: HandleFlag) -> Vec<Position> {
        self.primitives
            .values()
            .filter(|entry| entry.tag.key() == key && entry.tag.flag == flag)
            .filter_map(|entry| entry.description.evaluate()?.marker_position())
            .collect()
    }

    /// Current geometry of every primitive of `key`.
    pub fn geometries_of(&self, key: ShapeKey) -> Vec<Geometry> {
        self.primitives
            .values()
            .filter(|entry| entry.tag.key() == key)
            .filter_map(|entry| entry.description.evaluate())
            .collect()
    }

    /// Handle of `key` sitting exactly at `position`.
    pub fn handle_at(&self, key: ShapeKey, position: Position) -> Option<PickedEntity> {
        self.primitives.iter().find_map(|(&id, entry)| {
            let is_match = entry.tag.key() == key
                && entry.tag.is_handle()
                && entry.description.evaluate()?.marker_position() == Some(position);
            is_match.then_some(PickedEntity { id, tag: entry.tag })
        })
    }

    /// Forget every primitive, as a renderer reset would.
    pub fn drop_all(&mut self) {
        self.primitives.clear();
        self.frame.clear();
    }

    /// Hit rank of `geometry` at `screen`; lower ranks sit on top.
    fn hit_rank(&self, geometry: &Geometry, screen: ScreenPos) -> Option<u8> {
        let radius = self.projection.pick_radius;
        match geometry {
            Geometry::Marker {
                position,
                pixel_size,
                ..
            } => {
                let reach = radius.max(f64::from(*pixel_size) / 2.0);
                (self.projection.to_screen(*position).distance(screen) <= reach).then_some(0)
            }
            Geometry::Label {
                position,
                pixel_offset,
                ..
            } => {
                let anchor = self.projection.to_screen(*position)
                    + DVec2::new(f64::from(pixel_offset[0]), f64::from(pixel_offset[1]));
                (anchor.distance(screen) <= radius * 3.0).then_some(1)
            }
            Geometry::Polyline {
                positions, width, ..
            } => {
                let reach = radius.max(f64::from(*width) / 2.0);
                let points: Vec<ScreenPos> = positions
                    .iter()
                    .map(|p| self.projection.to_screen(*p))
                    .collect();
                points
                    .windows(2)
                    .any(|w| segment_distance(screen, w[0], w[1]) <= reach)
                    .then_some(2)
            }
            Geometry::Polygon { hierarchy, .. } => {
                let ring: Vec<ScreenPos> = hierarchy
                    .iter()
                    .map(|p| self.projection.to_screen(*p))
                    .collect();
                contains(&ring, screen).then_some(3)
            }
            Geometry::Rectangle { bounds, .. } => {
                let [lon, lat] = self.projection.to_lon_lat(screen);
                let (lon, lat) = (lon.to_radians(), lat.to_radians());
                (lon >= bounds.west && lon <= bounds.east && lat >= bounds.south && lat <= bounds.north)
                    .then_some(3)
            }
            Geometry::Ellipse {
                center,
                semi_major_axis,
                semi_minor_axis,
                rotation,
                ..
            } => {
                let point = self.projection.to_world(screen)?;
                let [east, north, _] = Wgs84.east_north_up(*center);
                let d = point.as_dvec3() - center.as_dvec3();
                let (e, n) = (d.dot(east), d.dot(north));
                let (sin, cos) = rotation.sin_cos();
                let u = e * cos + n * sin;
                let v = -e * sin + n * cos;
                if *semi_major_axis <= 0.0 || *semi_minor_axis <= 0.0 {
                    return None;
                }
                let r = (u / semi_major_axis).powi(2) + (v / semi_minor_axis).powi(2);
                (r <= 1.0).then_some(3)
            }
        }
    }
}

fn segment_distance(p: DVec2, a: DVec2, b: DVec2) -> f64 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + t * ab)
}

/// Even-odd point in polygon.
fn contains(ring: &[DVec2], p: DVec2) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

impl Renderer for HeadlessScene {
    fn add_primitive(&mut self, tag: PrimitiveTag, description: PrimitiveDescription) -> PrimitiveId {
        let id = self.next_id;
        self.next_id += 1;
        self.primitives.insert(id, Entry { tag, description });
        id
    }

    fn remove_primitive(&mut self, id: PrimitiveId) {
        self.primitives.remove(&id);
        self.frame.remove(&id);
    }

    fn move_marker(&mut self, id: PrimitiveId, position: Position) {
        if let Some(Entry {
            description: PrimitiveDescription::Static(Geometry::Marker { position: at, .. }),
            ..
        }) = self.primitives.get_mut(&id)
        {
            *at = position;
        }
    }

    fn set_camera_navigation(&mut self, enabled: bool) {
        self.camera_navigation = enabled;
    }
}

impl Picker for HeadlessScene {
    /// Topmost hit: markers over labels over lines over areas, newest first.
    fn pick_entity(&self, screen: ScreenPos) -> Option<PickedEntity> {
        let mut best: Option<(u8, PickedEntity)> = None;
        for (&id, entry) in self.primitives.iter().rev() {
            let Some(geometry) = entry.description.evaluate() else {
                continue;
            };
            let Some(rank) = self.hit_rank(&geometry, screen) else {
                continue;
            };
            if best.is_none_or(|(r, _)| rank < r) {
                best = Some((rank, PickedEntity { id, tag: entry.tag }));
            }
        }
        best.map(|(_, entity)| entity)
    }

    fn pick_terrain(&self, screen: ScreenPos) -> Option<Position> {
        self.projection.to_world(screen)
    }
}

/// Tooltip that remembers what it was last asked to show.
#[derive(Debug, Clone, Default)]
pub struct HeadlessTooltip {
    visible: bool,
    position: Option<ScreenPos>,
    html: String,
}

impl HeadlessTooltip {
    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn position(&self) -> Option<ScreenPos> {
        self.position
    }

    pub fn html(&self) -> &str {
        &self.html
    }
}

impl Tooltip for HeadlessTooltip {
    fn show_at(&mut self, screen: ScreenPos, html: &str) {
        self.visible = true;
        self.position = Some(screen);
        html.clone_into(&mut self.html);
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::host::MarkerStyle;
    use crate::kind::ShapeKind;
    use std::sync::Arc;

    fn tag(flag: HandleFlag) -> PrimitiveTag {
        PrimitiveTag {
            kind: ShapeKind::Polygon,
            instance_id: uuid::Uuid::nil(),
            flag,
        }
    }

    #[test]
    fn test_projection_roundtrip() {
        let projection = ScreenProjection {
            origin: [116.0, 40.0],
            ..Default::default()
        };
        let screen = DVec2::new(120.0, 80.0);
        let world = projection.to_world(screen).unwrap();
        let back = projection.to_screen(world);
        assert!(back.distance(screen) < 1e-6, "{back:?}");
        assert!(projection.to_world(DVec2::new(0.0, -1.0e7)).is_none());
    }

    #[test]
    fn test_markers_pick_over_areas() {
        let mut scene = HeadlessScene::default();
        let p = scene.projection;
        let ring: Vec<Position> = [(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)]
            .iter()
            .filter_map(|&(x, y)| p.to_world(DVec2::new(x, y)))
            .collect();
        let area = scene.add_primitive(
            tag(HandleFlag::None),
            PrimitiveDescription::Static(Geometry::Polygon {
                hierarchy: ring,
                fill: Color::RED,
            }),
        );
        let handle = scene.add_primitive(
            tag(HandleFlag::Anchor),
            PrimitiveDescription::Static(Geometry::Marker {
                position: p.to_world(DVec2::new(50.0, 50.0)).unwrap(),
                style: MarkerStyle::Anchor,
                pixel_size: 10.0,
            }),
        );

        assert_eq!(scene.pick_entity(DVec2::new(52.0, 51.0)).map(|e| e.id), Some(handle));
        assert_eq!(scene.pick_entity(DVec2::new(20.0, 80.0)).map(|e| e.id), Some(area));
        assert!(scene.pick_entity(DVec2::new(200.0, 200.0)).is_none());

        scene.move_marker(handle, p.to_world(DVec2::new(90.0, 10.0)).unwrap());
        assert_eq!(scene.pick_entity(DVec2::new(52.0, 51.0)).map(|e| e.id), Some(area));
        assert_eq!(scene.pick_entity(DVec2::new(90.0, 10.0)).map(|e| e.id), Some(handle));
    }

    #[test]
    fn test_polyline_and_ellipse_hits() {
        let mut scene = HeadlessScene::default();
        let p = scene.projection;
        let a = p.to_world(DVec2::new(0.0, 0.0)).unwrap();
        let b = p.to_world(DVec2::new(100.0, 0.0)).unwrap();
        let line = scene.add_primitive(
            tag(HandleFlag::None),
            PrimitiveDescription::Static(Geometry::Polyline {
                positions: vec![a, b],
                width: 3.0,
                material: crate::host::LineMaterial::Solid(Color::BLUE),
            }),
        );
        assert_eq!(scene.pick_entity(DVec2::new(50.0, 4.0)).map(|e| e.id), Some(line));
        assert!(scene.pick_entity(DVec2::new(50.0, 20.0)).is_none());

        let center = p.to_world(DVec2::new(500.0, 500.0)).unwrap();
        let ellipse = scene.add_primitive(
            tag(HandleFlag::None),
            PrimitiveDescription::Static(Geometry::Ellipse {
                center,
                semi_major_axis: 1000.0,
                semi_minor_axis: 200.0,
                rotation: 0.0,
                fill: Color::RED,
                outline: Color::WHITE,
            }),
        );
        // About 11 m per pixel at the equator.
        assert_eq!(scene.pick_entity(DVec2::new(580.0, 500.0)).map(|e| e.id), Some(ellipse));
        assert!(scene.pick_entity(DVec2::new(500.0, 540.0)).is_none());
    }

    #[test]
    fn test_live_primitives_evaluate_per_frame() {
        let mut scene = HeadlessScene::default();
        let counter = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let seen = Arc::clone(&counter);
        let id = scene.add_primitive(
            tag(HandleFlag::None),
            PrimitiveDescription::Live(Arc::new(move || {
                seen.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                None
            })),
        );
        assert!(scene.is_live(id));
        assert_eq!(scene.render_frame(), 0);
        assert_eq!(scene.render_frame(), 0);
        assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 2);
        assert_eq!(scene.frames_rendered(), 2);

        scene.remove_primitive(id);
        scene.remove_primitive(id);
        assert!(scene.is_empty());
    }

    #[test]
    fn test_tooltip_records_last_hint() {
        let mut tooltip = HeadlessTooltip::default();
        tooltip.show_at(DVec2::new(3.0, 4.0), "Choose a position");
        assert!(tooltip.visible());
        assert_eq!(tooltip.html(), "Choose a position");
        tooltip.set_visible(false);
        assert!(!tooltip.visible());
        assert_eq!(tooltip.position(), Some(DVec2::new(3.0, 4.0)));
    }
}
