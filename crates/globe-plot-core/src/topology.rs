//! Control points and the displayed handle set of an edit session.
//!
//! For line-like kinds the handle set interleaves control points with the
//! geodesic midpoints of each segment:
//!
//! ```text
//! control:  c0        c1        c2
//! expanded: c0  m01   c1  m12   c2      len = 2n - 1
//! index:    0   1     2   3     4
//! ```
//!
//! Dragging a control point (even index) moves it and re-derives the
//! midpoints beside it. Releasing a dragged midpoint (odd, interior index)
//! promotes it to a control point and splits the segment.

use std::collections::HashMap;

use crate::geodesy::Geodesy;
use crate::host::{HandleFlag, PrimitiveId};
use crate::kind::HandleLayout;
use crate::position::Position;

/// Result of a successful promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Promotion {
    /// Index of the new control point in the control sequence.
    pub control_index: usize,
    /// Index of the new control point in the expanded sequence.
    pub expanded_index: usize,
}

/// Handle layout of one edit session.
#[derive(Debug, Clone, Default)]
pub struct AnchorTopology {
    expanded: Vec<Position>,
    midpoints: bool,
    handles: HashMap<PrimitiveId, usize>,
}

impl AnchorTopology {
    pub fn build(control: &[Position], layout: HandleLayout, geodesy: &dyn Geodesy) -> Self {
        let midpoints = layout == HandleLayout::VerticesWithMidpoints;
        let mut expanded = Vec::with_capacity(control.len() * 2);
        for (i, &point) in control.iter().enumerate() {
            if midpoints && i > 0 {
                expanded.push(geodesy.midpoint(control[i - 1], point));
            }
            expanded.push(point);
        }
        Self {
            expanded,
            midpoints,
            handles: HashMap::new(),
        }
    }

    pub fn expanded(&self) -> &[Position] {
        &self.expanded
    }

    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }

    pub fn has_midpoints(&self) -> bool {
        self.midpoints
    }

    pub fn is_midpoint(&self, index: usize) -> bool {
        self.midpoints && index % 2 == 1
    }

    pub fn flag(&self, index: usize) -> HandleFlag {
        if self.is_midpoint(index) {
            HandleFlag::MidAnchor
        } else {
            HandleFlag::Anchor
        }
    }

    /// Control index behind expanded `index`, if it is a control point.
    pub fn control_index(&self, index: usize) -> Option<usize> {
        if index >= self.expanded.len() || self.is_midpoint(index) {
            return None;
        }
        Some(if self.midpoints { index / 2 } else { index })
    }

    pub fn bind(&mut self, handle: PrimitiveId, index: usize) {
        self.handles.insert(handle, index);
    }

    pub fn index_of(&self, handle: PrimitiveId) -> Option<usize> {
        self.handles.get(&handle).copied()
    }

    /// Handle bound to expanded `index`.
    pub fn handle_at(&self, index: usize) -> Option<PrimitiveId> {
        self.handles
            .iter()
            .find_map(|(&handle, &i)| (i == index).then_some(handle))
    }

    /// Forget every binding, returning the handles that were bound.
    pub fn unbind_all(&mut self) -> Vec<PrimitiveId> {
        let mut handles: Vec<_> = self.handles.drain().collect();
        handles.sort_by_key(|&(_, index)| index);
        handles.into_iter().map(|(handle, _)| handle).collect()
    }

    /// Move only the displayed handle at `index`.
    pub fn move_handle(&mut self, index: usize, position: Position) {
        if let Some(slot) = self.expanded.get_mut(index) {
            *slot = position;
        }
    }

    /// Move control point at expanded `index` and re-derive its flanking midpoints.
    ///
    /// Returns the indices whose displayed position changed. A midpoint index
    /// only moves the handle and leaves `control` untouched.
    pub fn move_control(
        &mut self,
        control: &mut [Position],
        index: usize,
        position: Position,
        geodesy: &dyn Geodesy,
    ) -> Vec<usize> {
        let Some(ci) = self.control_index(index) else {
            if index < self.expanded.len() {
                self.move_handle(index, position);
                return vec![index];
            }
            return Vec::new();
        };
        let Some(slot) = control.get_mut(ci) else {
            return Vec::new();
        };
        *slot = position;
        self.expanded[index] = position;

        let mut changed = vec![index];
        if self.midpoints {
            let neighbours = [index.checked_sub(1), Some(index + 1)];
            for m in neighbours.into_iter().flatten() {
                if m >= 1 && m + 1 < self.expanded.len() {
                    self.expanded[m] = geodesy.midpoint(self.expanded[m - 1], self.expanded[m + 1]);
                    changed.push(m);
                }
            }
        }
        changed
    }

    /// Promote the midpoint at `index` to a control point at its current position.
    ///
    /// Only interior odd indices qualify; index 0, the last index and control
    /// points are refused.
    pub fn promote(
        &mut self,
        control: &mut Vec<Position>,
        index: usize,
        geodesy: &dyn Geodesy,
    ) -> Option<Promotion> {
        if !self.midpoints || index == 0 || index + 1 >= self.expanded.len() || index % 2 == 0 {
            return None;
        }
        let point = self.expanded[index];
        let left = self.expanded[index - 1];
        let right = self.expanded[index + 1];

        let control_index = (index - 1) / 2 + 1;
        if control_index > control.len() {
            return None;
        }
        control.insert(control_index, point);
        self.expanded.splice(
            index..=index,
            [geodesy.midpoint(left, point), point, geodesy.midpoint(point, right)],
        );

        for i in self.handles.values_mut() {
            if *i > index {
                *i += 2;
            } else if *i == index {
                *i += 1;
            }
        }

        tracing::debug!(
            "[topology] promoted midpoint {index} to control point {control_index}, {} handles",
            self.expanded.len()
        );
        Some(Promotion {
            control_index,
            expanded_index: index + 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::Wgs84;
    use crate::position::Cartographic;

    fn at(lon: f64, lat: f64) -> Position {
        Wgs84.to_cartesian(Cartographic::from_degrees(lon, lat, 0.0))
    }

    fn line() -> Vec<Position> {
        vec![at(0.0, 0.0), at(1.0, 0.0), at(2.0, 1.0), at(3.0, 1.0)]
    }

    fn assert_midpoints_consistent(topology: &AnchorTopology, control: &[Position]) {
        let expanded = topology.expanded();
        assert_eq!(expanded.len(), 2 * control.len() - 1);
        for (i, c) in control.iter().enumerate() {
            assert_eq!(expanded[2 * i], *c);
        }
    }

    #[test]
    fn test_build_interleaves_midpoints() {
        let control = line();
        let topology = AnchorTopology::build(&control, HandleLayout::VerticesWithMidpoints, &Wgs84);
        assert_midpoints_consistent(&topology, &control);
        assert_eq!(topology.expanded()[1], Wgs84.midpoint(control[0], control[1]));
        assert_eq!(topology.flag(1), HandleFlag::MidAnchor);
        assert_eq!(topology.flag(2), HandleFlag::Anchor);
        assert_eq!(topology.control_index(4), Some(2));
        assert_eq!(topology.control_index(3), None);
    }

    #[test]
    fn test_build_without_midpoints() {
        let control = line();
        let topology = AnchorTopology::build(&control, HandleLayout::Vertices, &Wgs84);
        assert_eq!(topology.expanded(), control.as_slice());
        assert!(!topology.is_midpoint(1));
        assert_eq!(topology.control_index(3), Some(3));
    }

    #[test]
    fn test_single_point_line() {
        let control = vec![at(5.0, 5.0)];
        let topology = AnchorTopology::build(&control, HandleLayout::VerticesWithMidpoints, &Wgs84);
        assert_eq!(topology.len(), 1);
    }

    #[test]
    fn test_drag_control_keeps_length_and_recomputes_neighbours() {
        let mut control = line();
        let mut topology = AnchorTopology::build(&control, HandleLayout::VerticesWithMidpoints, &Wgs84);
        let before = topology.expanded().to_vec();

        let moved = at(1.0, 0.5);
        let changed = topology.move_control(&mut control, 2, moved, &Wgs84);

        assert_eq!(changed, vec![2, 1, 3]);
        assert_eq!(control[1], moved);
        assert_midpoints_consistent(&topology, &control);
        let expanded = topology.expanded();
        assert_eq!(expanded[1], Wgs84.midpoint(control[0], moved));
        assert_eq!(expanded[3], Wgs84.midpoint(moved, control[2]));
        assert_eq!(expanded[5], before[5]);
    }

    #[test]
    fn test_drag_endpoints_touch_one_midpoint() {
        let mut control = line();
        let mut topology = AnchorTopology::build(&control, HandleLayout::VerticesWithMidpoints, &Wgs84);
        assert_eq!(topology.move_control(&mut control, 0, at(-1.0, 0.0), &Wgs84), vec![0, 1]);
        assert_eq!(topology.move_control(&mut control, 6, at(4.0, 1.0), &Wgs84), vec![6, 5]);
        assert_midpoints_consistent(&topology, &control);
    }

    #[test]
    fn test_drag_midpoint_moves_only_handle() {
        let mut control = line();
        let original = control.clone();
        let mut topology = AnchorTopology::build(&control, HandleLayout::VerticesWithMidpoints, &Wgs84);
        let changed = topology.move_control(&mut control, 3, at(1.5, 2.0), &Wgs84);
        assert_eq!(changed, vec![3]);
        assert_eq!(control, original);
        assert_eq!(topology.expanded()[3], at(1.5, 2.0));
    }

    #[test]
    fn test_promote_grows_by_one_and_two() {
        let mut control = line();
        let mut topology = AnchorTopology::build(&control, HandleLayout::VerticesWithMidpoints, &Wgs84);
        let dragged = at(1.5, 2.0);
        topology.move_handle(3, dragged);

        let promotion = topology.promote(&mut control, 3, &Wgs84).unwrap();
        assert_eq!(promotion, Promotion { control_index: 2, expanded_index: 4 });
        assert_eq!(control.len(), 5);
        assert_eq!(topology.len(), 9);
        assert_eq!(control[2], dragged);
        assert_midpoints_consistent(&topology, &control);
        assert_eq!(topology.expanded()[3], Wgs84.midpoint(control[1], dragged));
        assert_eq!(topology.expanded()[5], Wgs84.midpoint(dragged, control[3]));
    }

    #[test]
    fn test_promote_refuses_non_interior() {
        let mut control = line();
        let mut topology = AnchorTopology::build(&control, HandleLayout::VerticesWithMidpoints, &Wgs84);
        let last = topology.len() - 1;
        assert!(topology.promote(&mut control, 0, &Wgs84).is_none());
        assert!(topology.promote(&mut control, last, &Wgs84).is_none());
        assert!(topology.promote(&mut control, 2, &Wgs84).is_none());
        assert!(topology.promote(&mut control, 99, &Wgs84).is_none());
        assert_eq!(control.len(), 4);
        assert_eq!(topology.len(), 7);

        let mut plain = AnchorTopology::build(&control, HandleLayout::Vertices, &Wgs84);
        assert!(plain.promote(&mut control, 1, &Wgs84).is_none());
    }

    #[test]
    fn test_promote_then_drag_touches_only_new_flanks() {
        let mut control = line();
        let mut topology = AnchorTopology::build(&control, HandleLayout::VerticesWithMidpoints, &Wgs84);
        topology.move_handle(1, at(0.5, 1.0));
        let promotion = topology.promote(&mut control, 1, &Wgs84).unwrap();
        let before = topology.expanded().to_vec();

        let m = promotion.expanded_index;
        let changed = topology.move_control(&mut control, m, at(0.5, 1.5), &Wgs84);
        assert_eq!(changed, vec![m, m - 1, m + 1]);

        let after = topology.expanded();
        for (i, (a, b)) in before.iter().zip(after).enumerate() {
            if !changed.contains(&i) {
                assert_eq!(a, b, "index {i} should be untouched");
            }
        }
        // The old endpoints A and B kept their other-side midpoints.
        assert_eq!(after[5], before[5]);
    }

    #[test]
    fn test_promote_shifts_handle_bindings() {
        let mut control = line();
        let mut topology = AnchorTopology::build(&control, HandleLayout::VerticesWithMidpoints, &Wgs84);
        for i in 0..topology.len() {
            topology.bind(100 + i as u64, i);
        }
        topology.promote(&mut control, 3, &Wgs84).unwrap();
        assert_eq!(topology.index_of(102), Some(2));
        assert_eq!(topology.index_of(103), Some(4));
        assert_eq!(topology.index_of(104), Some(6));
        assert_eq!(topology.index_of(106), Some(8));
        assert_eq!(topology.handle_at(4), Some(103));

        let unbound = topology.unbind_all();
        assert_eq!(unbound.len(), 7);
        assert_eq!(unbound[0], 100);
        assert_eq!(topology.index_of(100), None);
    }
}
