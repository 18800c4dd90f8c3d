//! Parallel offset: displaces each subpath sideways by a constant device distance.
//!
//! Positive offsets move the path to the left of its direction of travel in y-down device space,
//! negative offsets to the right. Joins are mitered; a miter longer than [`MITER_LIMIT`] times
//! the offset falls back to a bevel.
use glam::DVec2;

use crate::geometry::{SubPath, VertexPath};
use crate::transform::{Stage, StageKind};

pub const MITER_LIMIT: f64 = 4.0;

#[derive(Debug, Clone)]
pub struct OffsetStage {
    /// Offset in device units (already multiplied by the scale factor).
    pub offset: f64,
}

impl OffsetStage {
    pub fn new(offset: f64) -> Self {
        Self { offset }
    }

    fn offset_subpath(&self, subpath: &SubPath) -> SubPath {
        let mut pts = subpath.points.clone();
        pts.dedup();
        if subpath.closed && pts.len() > 1 && pts.first() == pts.last() {
            pts.pop();
        }
        let n = pts.len();
        if n < 2 || (subpath.closed && n < 3) {
            return subpath.clone();
        }

        let segment_count = if subpath.closed { n } else { n - 1 };
        let normals: Vec<DVec2> = (0..segment_count)
            .map(|i| left_normal(pts[i], pts[(i + 1) % n]))
            .collect();

        let mut out = Vec::with_capacity(n + 4);
        for (i, &p) in pts.iter().enumerate() {
            let incoming = if i > 0 {
                Some(normals[i - 1])
            } else if subpath.closed {
                Some(normals[segment_count - 1])
            } else {
                None
            };
            let outgoing = normals.get(i).copied();
            match (incoming, outgoing) {
                (Some(a), Some(b)) => self.join(p, a, b, &mut out),
                (Some(a), None) => out.push(p + a * self.offset),
                (None, Some(b)) => out.push(p + b * self.offset),
                (None, None) => out.push(p),
            }
        }
        SubPath::new(out, subpath.closed)
    }

    fn join(&self, p: DVec2, a: DVec2, b: DVec2, out: &mut Vec<DVec2>) {
        let sum = a + b;
        let cos_half = if sum.length_squared() > 0.0 {
            sum.normalize().dot(a)
        } else {
            0.0
        };
        if cos_half > 1.0 / MITER_LIMIT {
            out.push(p + sum.normalize() * (self.offset / cos_half));
        } else {
            out.push(p + a * self.offset);
            out.push(p + b * self.offset);
        }
    }
}

impl Stage for OffsetStage {
    fn kind(&self) -> StageKind {
        StageKind::Offset
    }

    fn apply(&self, path: VertexPath) -> VertexPath {
        VertexPath::from_subpaths(
            path.subpaths
                .iter()
                .map(|s| self.offset_subpath(s))
                .collect(),
        )
    }
}

fn left_normal(a: DVec2, b: DVec2) -> DVec2 {
    let d = (b - a).normalize_or_zero();
    DVec2::new(d.y, -d.x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_offset_moves_left_of_travel() {
        let stage = OffsetStage::new(2.0);
        let out = stage.apply(VertexPath::line_string([[0.0, 10.0], [10.0, 10.0]]));
        assert_eq!(
            out.subpaths[0].points,
            vec![DVec2::new(0.0, 8.0), DVec2::new(10.0, 8.0)]
        );
    }

    #[test]
    fn negative_offset_moves_right() {
        let stage = OffsetStage::new(-2.0);
        let out = stage.apply(VertexPath::line_string([[0.0, 10.0], [10.0, 10.0]]));
        assert_eq!(out.subpaths[0].points[0], DVec2::new(0.0, 12.0));
    }

    #[test]
    fn right_angle_join_is_mitered() {
        let stage = OffsetStage::new(1.0);
        let out = stage.apply(VertexPath::line_string([
            [0.0, 0.0],
            [10.0, 0.0],
            [10.0, 10.0],
        ]));
        let corner = out.subpaths[0].points[1];
        assert!(corner.abs_diff_eq(DVec2::new(11.0, -1.0), 1e-9));
    }

    #[test]
    fn hairpin_turn_is_beveled() {
        let stage = OffsetStage::new(1.0);
        let out = stage.apply(VertexPath::line_string([
            [0.0, 0.0],
            [10.0, 0.0],
            [0.0, 0.1],
        ]));
        assert_eq!(out.subpaths[0].points.len(), 4);
    }

    #[test]
    fn single_vertex_is_unchanged() {
        let stage = OffsetStage::new(5.0);
        let path = VertexPath::point([3.0, 4.0]);
        assert_eq!(stage.apply(path.clone()), path);
    }
}
