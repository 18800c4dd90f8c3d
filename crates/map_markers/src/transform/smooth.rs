//! Corner smoothing: each segment becomes a cubic Bézier whose control points follow the
//! neighbouring segments, then is flattened back into line segments.
use glam::DVec2;

use crate::geometry::{SubPath, VertexPath};
use crate::transform::{Stage, StageKind};

const FLATTEN_STEP_PX: f64 = 4.0;
const MAX_STEPS: usize = 32;

#[derive(Debug, Clone)]
pub struct SmoothStage {
    /// Curvature factor in `[0, 1]`.
    pub smooth: f64,
}

impl SmoothStage {
    pub fn new(smooth: f64) -> Self {
        Self {
            smooth: smooth.clamp(0.0, 1.0),
        }
    }

    fn smooth_subpath(&self, subpath: &SubPath) -> SubPath {
        let pts = &subpath.points;
        let n = pts.len();
        if n < 3 {
            return subpath.clone();
        }

        let k = self.smooth * 0.5;
        let segment_count = if subpath.closed { n } else { n - 1 };
        let at = |i: isize| -> DVec2 {
            if subpath.closed {
                pts[i.rem_euclid(n as isize) as usize]
            } else {
                pts[i.clamp(0, n as isize - 1) as usize]
            }
        };

        let mut out = Vec::with_capacity(segment_count * 4 + 1);
        out.push(pts[0]);
        for s in 0..segment_count as isize {
            let (v0, v1, v2, v3) = (at(s - 1), at(s), at(s + 1), at(s + 2));
            let (c1, c2) = control_points(v0, v1, v2, v3, k);
            flatten_cubic(v1, c1, c2, v2, &mut out);
        }
        if subpath.closed {
            out.pop();
        }
        SubPath::new(out, subpath.closed)
    }
}

impl Stage for SmoothStage {
    fn kind(&self) -> StageKind {
        StageKind::Smooth
    }

    fn apply(&self, path: VertexPath) -> VertexPath {
        VertexPath::from_subpaths(
            path.subpaths
                .iter()
                .map(|s| self.smooth_subpath(s))
                .collect(),
        )
    }
}

fn control_points(v0: DVec2, v1: DVec2, v2: DVec2, v3: DVec2, k: f64) -> (DVec2, DVec2) {
    let d1 = v0.distance(v1);
    let d2 = v1.distance(v2);
    let d3 = v2.distance(v3);
    let k1 = if d1 + d2 > 0.0 { d1 / (d1 + d2) } else { 0.0 };
    let k2 = if d2 + d3 > 0.0 { d2 / (d2 + d3) } else { 0.0 };
    let m1 = v0 + (v2 - v0) * k1;
    let m2 = v1 + (v3 - v1) * k2;
    (v1 + (v2 - m1) * k, v2 + (v1 - m2) * k)
}

/// Appends the flattened curve without its start point.
fn flatten_cubic(p0: DVec2, p1: DVec2, p2: DVec2, p3: DVec2, out: &mut Vec<DVec2>) {
    let hull = p0.distance(p1) + p1.distance(p2) + p2.distance(p3);
    let steps = ((hull / FLATTEN_STEP_PX).ceil() as usize).clamp(2, MAX_STEPS);
    for i in 1..=steps {
        let t = i as f64 / steps as f64;
        let u = 1.0 - t;
        let p = p0 * (u * u * u) + p1 * (3.0 * u * u * t) + p2 * (3.0 * u * t * t) + p3 * (t * t * t);
        out.push(p);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_endpoints_of_open_paths() {
        let stage = SmoothStage::new(1.0);
        let out = stage.apply(VertexPath::line_string([[0.0, 0.0], [10.0, 10.0], [20.0, 0.0]]));
        let pts = &out.subpaths[0].points;
        assert_eq!(pts[0], DVec2::new(0.0, 0.0));
        assert_eq!(*pts.last().unwrap(), DVec2::new(20.0, 0.0));
        assert!(pts.len() > 3);
    }

    #[test]
    fn rounds_the_corner() {
        let stage = SmoothStage::new(1.0);
        let out = stage.apply(VertexPath::line_string([[0.0, 0.0], [10.0, 10.0], [20.0, 0.0]]));
        // The apex vertex stays on the curve; the curve is no longer a sharp corner.
        let pts = &out.subpaths[0].points;
        assert!(pts.contains(&DVec2::new(10.0, 10.0)));
        let near_apex = pts
            .iter()
            .filter(|p| p.y > 9.0 && **p != DVec2::new(10.0, 10.0))
            .count();
        assert!(near_apex > 0);
    }

    #[test]
    fn short_paths_pass_through() {
        let stage = SmoothStage::new(0.5);
        let path = VertexPath::line_string([[0.0, 0.0], [5.0, 0.0]]);
        assert_eq!(stage.apply(path.clone()), path);
    }

    #[test]
    fn closed_rings_stay_closed() {
        let stage = SmoothStage::new(0.5);
        let out = stage.apply(VertexPath::polygon([
            [0.0, 0.0],
            [10.0, 0.0],
            [10.0, 10.0],
            [0.0, 10.0],
        ]));
        let ring = &out.subpaths[0];
        assert!(ring.closed);
        assert_ne!(ring.points.first(), ring.points.last());
    }
}
