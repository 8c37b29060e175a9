//! Arrow outline provider.
//!
//! Works on planar longitude/latitude degrees. [`PlotArrows`] implements the
//! usual plotting-symbology outlines: a fine (straight) arrow from two points
//! and a tailed attack arrow from a tail pair plus a path to the head.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// `[longitude, latitude]` in degrees.
pub type LonLat = [f64; 2];

/// Outline generator for arrow kinds. `None` means the input is degenerate.
pub trait ArrowProvider: Send + Sync {
    fn fine_arrow(&self, tail: LonLat, head: LonLat) -> Option<Vec<LonLat>>;

    /// `points[0]` and `points[1]` span the tail, the rest lead to the head.
    fn tailed_attack_arrow(&self, points: &[LonLat]) -> Option<Vec<LonLat>>;
}

/// Shape factors for the fine arrow, relative to the shaft base length.
#[derive(Debug, Clone, PartialEq)]
pub struct FineArrowParams {
    pub tail_width_factor: f64,
    pub neck_width_factor: f64,
    pub head_width_factor: f64,
    pub head_angle: f64,
    pub neck_angle: f64,
}

impl Default for FineArrowParams {
    fn default() -> Self {
        Self {
            tail_width_factor: 0.15,
            neck_width_factor: 0.2,
            head_width_factor: 0.25,
            head_angle: PI / 8.5,
            neck_angle: PI / 13.0,
        }
    }
}

/// Shape factors for the tailed attack arrow.
#[derive(Debug, Clone, PartialEq)]
pub struct AttackArrowParams {
    pub head_height_factor: f64,
    pub head_width_factor: f64,
    pub neck_height_factor: f64,
    pub neck_width_factor: f64,
    pub head_tail_factor: f64,
    pub tail_width_factor: f64,
    pub swallow_tail_factor: f64,
}

impl Default for AttackArrowParams {
    fn default() -> Self {
        Self {
            head_height_factor: 0.18,
            head_width_factor: 0.3,
            neck_height_factor: 0.85,
            neck_width_factor: 0.15,
            head_tail_factor: 0.8,
            tail_width_factor: 0.1,
            swallow_tail_factor: 1.0,
        }
    }
}

/// Default [`ArrowProvider`].
#[derive(Debug, Clone, Default)]
pub struct PlotArrows {
    pub fine: FineArrowParams,
    pub attack: AttackArrowParams,
}

impl ArrowProvider for PlotArrows {
    fn fine_arrow(&self, tail: LonLat, head: LonLat) -> Option<Vec<LonLat>> {
        if distance(tail, head) <= f64::EPSILON {
            return None;
        }
        let p = &self.fine;
        let base = base_length(&[tail, head]);
        let tail_width = base * p.tail_width_factor;
        let neck_width = base * p.neck_width_factor;
        let head_width = base * p.head_width_factor;

        let tail_left = third_point(head, tail, FRAC_PI_2, tail_width, true);
        let tail_right = third_point(head, tail, FRAC_PI_2, tail_width, false);
        let head_left = third_point(tail, head, p.head_angle, head_width, false);
        let head_right = third_point(tail, head, p.head_angle, head_width, true);
        let neck_left = third_point(tail, head, p.neck_angle, neck_width, false);
        let neck_right = third_point(tail, head, p.neck_angle, neck_width, true);

        finite(vec![
            tail_left, neck_left, head_left, head, head_right, neck_right, tail_right, tail,
        ])
    }

    fn tailed_attack_arrow(&self, points: &[LonLat]) -> Option<Vec<LonLat>> {
        let points = dedup(points);
        if points.len() < 3 {
            return None;
        }
        let p = &self.attack;

        let (mut tail_left, mut tail_right) = (points[0], points[1]);
        if is_clockwise(points[0], points[1], points[2]) {
            std::mem::swap(&mut tail_left, &mut tail_right);
        }
        let mut bone = vec![mid(tail_left, tail_right)];
        bone.extend_from_slice(&points[2..]);

        let head = self.attack_head(&bone, tail_left, tail_right);
        let (neck_left, neck_right) = (head[0], head[4]);

        let tail_width = distance(tail_left, tail_right);
        let bone_length = base_length(&bone);
        if bone_length <= f64::EPSILON {
            return None;
        }
        let swallow_len = bone_length * p.tail_width_factor * p.swallow_tail_factor;
        let swallow_tail = third_point(bone[1], bone[0], 0.0, swallow_len, true);

        let body = attack_body(&bone, neck_left, neck_right, tail_width / bone_length);
        let half = body.len() / 2;

        let mut left = vec![tail_left];
        left.extend_from_slice(&body[..half]);
        left.push(neck_left);
        let mut right = vec![tail_right];
        right.extend_from_slice(&body[half..]);
        right.push(neck_right);

        let left = quadratic_bspline(&left);
        let right = quadratic_bspline(&right);

        let mut ring = left.clone();
        ring.extend_from_slice(&head);
        ring.extend(right.into_iter().rev());
        ring.push(swallow_tail);
        ring.push(left[0]);
        finite(ring)
    }
}

impl PlotArrows {
    /// `[neck_left, head_left, peak, head_right, neck_right]`
    fn attack_head(&self, bone: &[LonLat], tail_left: LonLat, tail_right: LonLat) -> [LonLat; 5] {
        let p = &self.attack;
        let peak = bone[bone.len() - 1];
        let before = bone[bone.len() - 2];
        let last_segment = distance(peak, before);
        let tail_width = distance(tail_left, tail_right);

        let mut head_height = base_length(bone) * p.head_height_factor;
        head_height = head_height.min(tail_width * p.head_tail_factor);
        let head_width = head_height * p.head_width_factor;
        let neck_width = head_height * p.neck_width_factor;
        head_height = head_height.min(last_segment);
        let neck_height = head_height * p.neck_height_factor;

        let head_end = third_point(before, peak, 0.0, head_height, true);
        let neck_end = third_point(before, peak, 0.0, neck_height, true);
        [
            third_point(peak, neck_end, FRAC_PI_2, neck_width, false),
            third_point(peak, head_end, FRAC_PI_2, head_width, false),
            peak,
            third_point(peak, head_end, FRAC_PI_2, head_width, true),
            third_point(peak, neck_end, FRAC_PI_2, neck_width, true),
        ]
    }
}

fn attack_body(bone: &[LonLat], neck_left: LonLat, neck_right: LonLat, factor: f64) -> Vec<LonLat> {
    let all_len = whole_distance(bone);
    let tail_width = base_length(bone) * factor;
    let neck_width = distance(neck_left, neck_right);
    let width_dif = (tail_width - neck_width) / 2.0;

    let mut walked = 0.0;
    let mut left = Vec::new();
    let mut right = Vec::new();
    for i in 1..bone.len().saturating_sub(1) {
        let angle = angle_of_three_points(bone[i - 1], bone[i], bone[i + 1]) / 2.0;
        walked += distance(bone[i - 1], bone[i]);
        let w = (tail_width / 2.0 - walked / all_len * width_dif) / angle.sin();
        left.push(third_point(bone[i - 1], bone[i], PI - angle, w, true));
        right.push(third_point(bone[i - 1], bone[i], angle, w, false));
    }
    left.extend(right);
    left
}

fn finite(ring: Vec<LonLat>) -> Option<Vec<LonLat>> {
    ring.iter()
        .all(|p| p[0].is_finite() && p[1].is_finite())
        .then_some(ring)
}

fn dedup(points: &[LonLat]) -> Vec<LonLat> {
    let mut out: Vec<LonLat> = Vec::with_capacity(points.len());
    for &p in points {
        if out.last() != Some(&p) {
            out.push(p);
        }
    }
    out
}

fn distance(a: LonLat, b: LonLat) -> f64 {
    (a[0] - b[0]).hypot(a[1] - b[1])
}

fn whole_distance(points: &[LonLat]) -> f64 {
    points.windows(2).map(|w| distance(w[0], w[1])).sum()
}

fn base_length(points: &[LonLat]) -> f64 {
    whole_distance(points).powf(0.99)
}

fn mid(a: LonLat, b: LonLat) -> LonLat {
    [(a[0] + b[0]) / 2.0, (a[1] + b[1]) / 2.0]
}

/// Direction from `from` to `to`, in the plotting convention (radians, `[0, 2π)`).
fn azimuth(from: LonLat, to: LonLat) -> f64 {
    let angle = ((to[1] - from[1]).abs() / distance(from, to)).asin();
    match (to[1] >= from[1], to[0] >= from[0]) {
        (true, true) => angle + PI,
        (true, false) => TAU - angle,
        (false, false) => angle,
        (false, true) => PI - angle,
    }
}

/// Point at `length` from `end`, turned by `angle` off the `start -> end` azimuth.
fn third_point(start: LonLat, end: LonLat, angle: f64, length: f64, left: bool) -> LonLat {
    let az = azimuth(start, end);
    let alpha = if left { az + angle } else { az - angle };
    [end[0] + length * alpha.cos(), end[1] + length * alpha.sin()]
}

fn angle_of_three_points(a: LonLat, b: LonLat, c: LonLat) -> f64 {
    let angle = azimuth(b, a) - azimuth(b, c);
    if angle < 0.0 { angle + TAU } else { angle }
}

fn is_clockwise(a: LonLat, b: LonLat, c: LonLat) -> bool {
    (c[1] - a[1]) * (b[0] - a[0]) > (b[1] - a[1]) * (c[0] - a[0])
}

fn quadratic_bspline(points: &[LonLat]) -> Vec<LonLat> {
    const STEPS: u32 = 20;
    if points.len() <= 2 {
        return points.to_vec();
    }
    let mut out = vec![points[0]];
    for i in 0..points.len() - 2 {
        for step in 0..=STEPS {
            let t = f64::from(step) / f64::from(STEPS);
            let weights = [(t - 1.0).powi(2) / 2.0, (-2.0 * t * t + 2.0 * t + 1.0) / 2.0, t * t / 2.0];
            let mut x = 0.0;
            let mut y = 0.0;
            for (k, w) in weights.iter().enumerate() {
                x += w * points[i + k][0];
                y += w * points[i + k][1];
            }
            out.push([x, y]);
        }
    }
    out.push(points[points.len() - 1]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fine_arrow_outline() {
        let ring = PlotArrows::default().fine_arrow([0.0, 0.0], [1.0, 0.0]).unwrap();
        assert_eq!(ring.len(), 8);
        assert_eq!(ring[3], [1.0, 0.0]);
        assert_eq!(ring[7], [0.0, 0.0]);
        // Tail corners straddle the shaft symmetrically.
        assert!((ring[0][1] + ring[6][1]).abs() < 1e-12);
        assert!((ring[0][0] - ring[6][0]).abs() < 1e-12);
    }

    #[test]
    fn test_fine_arrow_scales_with_length() {
        let arrows = PlotArrows::default();
        let short = arrows.fine_arrow([0.0, 0.0], [1.0, 0.0]).unwrap();
        let long = arrows.fine_arrow([0.0, 0.0], [4.0, 0.0]).unwrap();
        let width = |r: &[LonLat]| distance(r[0], r[6]);
        let ratio = width(&long) / width(&short);
        assert!((ratio - 4.0_f64.powf(0.99)).abs() < 1e-9);
    }

    #[test]
    fn test_fine_arrow_degenerate() {
        assert!(PlotArrows::default().fine_arrow([2.0, 3.0], [2.0, 3.0]).is_none());
    }

    #[test]
    fn test_attack_arrow_closed_ring_through_peak() {
        let points = [[0.0, 0.0], [0.0, 1.0], [2.0, 0.6], [4.0, 0.5]];
        let ring = PlotArrows::default().tailed_attack_arrow(&points).unwrap();
        assert!(ring.len() > 10);
        assert_eq!(ring.first(), ring.last());
        assert!(ring.contains(&[4.0, 0.5]));
    }

    #[test]
    fn test_attack_arrow_ignores_repeated_points() {
        let arrows = PlotArrows::default();
        let base = [[0.0, 0.0], [0.0, 1.0], [3.0, 0.5]];
        let repeated = [[0.0, 0.0], [0.0, 1.0], [3.0, 0.5], [3.0, 0.5]];
        assert_eq!(
            arrows.tailed_attack_arrow(&base),
            arrows.tailed_attack_arrow(&repeated)
        );
    }

    #[test]
    fn test_attack_arrow_needs_three_distinct_points() {
        let arrows = PlotArrows::default();
        assert!(arrows.tailed_attack_arrow(&[[0.0, 0.0], [1.0, 1.0]]).is_none());
        assert!(arrows
            .tailed_attack_arrow(&[[0.0, 0.0], [1.0, 1.0], [1.0, 1.0]])
            .is_none());
    }

    #[test]
    fn test_azimuth_quadrants() {
        // The plotting convention is rotated half a turn from the math angle.
        assert!((azimuth([0.0, 0.0], [1.0, 0.0]) - PI).abs() < 1e-12);
        assert!((azimuth([0.0, 0.0], [0.0, 1.0]) - 1.5 * PI).abs() < 1e-12);
    }
}
