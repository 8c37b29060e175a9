use std::sync::Arc;

use parking_lot::RwLock;

use crate::position::Position;
use crate::style::Style;

/// Shape data shared between an editor and its live render callbacks.
///
/// Only the owning editor writes; callbacks read once per frame.
#[derive(Debug, Clone, Default)]
pub(crate) struct ShapeModel {
    /// Control points only.
    pub positions: Vec<Position>,
    /// Provisional anchor following the pointer while drawing.
    pub floating: Option<Position>,
    /// Midpoint being dragged: control insertion index and current position.
    pub preview_split: Option<(usize, Position)>,
    pub style: Style,
    pub label: String,
}

pub(crate) type SharedModel = Arc<RwLock<ShapeModel>>;

impl ShapeModel {
    /// Points the outline is built from this frame.
    pub fn outline_points(&self) -> Vec<Position> {
        let mut points = Vec::with_capacity(self.positions.len() + 2);
        points.extend_from_slice(&self.positions);
        if let Some((index, position)) = self.preview_split {
            points.insert(index.min(points.len()), position);
        }
        if let Some(floating) = self.floating {
            points.push(floating);
        }
        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outline_points_include_previews() {
        let a = Position::new(1.0, 0.0, 0.0);
        let b = Position::new(2.0, 0.0, 0.0);
        let m = Position::new(1.5, 1.0, 0.0);
        let f = Position::new(3.0, 0.0, 0.0);

        let mut model = ShapeModel {
            positions: vec![a, b],
            ..Default::default()
        };
        assert_eq!(model.outline_points(), vec![a, b]);

        model.preview_split = Some((1, m));
        assert_eq!(model.outline_points(), vec![a, m, b]);

        model.preview_split = None;
        model.floating = Some(f);
        assert_eq!(model.outline_points(), vec![a, b, f]);
    }
}
