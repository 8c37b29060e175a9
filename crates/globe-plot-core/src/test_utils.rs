//! Test utilities for registry-level tests.
//!
//! Provides `TestApp`, a registry over the in-memory host, with helpers that
//! speak in screen pixels the way a pointer would.

use glam::DVec2;

use crate::editor::CreateOptions;
use crate::geodesy::{Geodesy, Wgs84};
use crate::headless::{HeadlessScene, HeadlessTooltip};
use crate::host::ShapeKey;
use crate::kind::ShapeKind;
use crate::position::{Cartographic, Position};
use crate::registry::{InputEvent, ShapeRegistry};

/// Surface point at `lon`, `lat` degrees.
pub(crate) fn at(lon: f64, lat: f64) -> Position {
    Wgs84.to_cartesian(Cartographic::from_degrees(lon, lat, 0.0))
}

pub(crate) struct TestApp {
    pub registry: ShapeRegistry<HeadlessScene, HeadlessTooltip>,
}

impl TestApp {
    pub fn new() -> Self {
        Self {
            registry: ShapeRegistry::new(HeadlessScene::default(), HeadlessTooltip::default()),
        }
    }

    /// World position under screen `(x, y)`.
    pub fn world(&self, x: f64, y: f64) -> Position {
        self.registry
            .scene()
            .projection()
            .to_world(DVec2::new(x, y))
            .expect("screen point off the globe")
    }

    pub fn click(&mut self, x: f64, y: f64) {
        self.registry.handle_input(InputEvent::LeftClick(DVec2::new(x, y)));
    }

    /// Click where nothing is drawn.
    pub fn click_empty(&mut self) {
        self.click(-5000.0, -5000.0);
    }

    pub fn right_click(&mut self) {
        self.registry.handle_input(InputEvent::RightClick(DVec2::ZERO));
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.registry.handle_input(InputEvent::MouseMove(DVec2::new(x, y)));
    }

    pub fn press(&mut self, x: f64, y: f64) {
        self.registry.handle_input(InputEvent::LeftDown(DVec2::new(x, y)));
    }

    pub fn release(&mut self, x: f64, y: f64) {
        self.registry.handle_input(InputEvent::LeftUp(DVec2::new(x, y)));
    }

    /// Draw `kind` through pointer input and leave it in its edit session.
    pub fn draw(&mut self, kind: ShapeKind, points: &[(f64, f64)]) -> ShapeKey {
        let key = self.registry.create(kind, CreateOptions::default());
        for &(x, y) in points {
            self.move_to(x, y);
            self.click(x, y);
        }
        if kind.spec().fixed_arity.is_none() {
            self.right_click();
        }
        key
    }
}
