//! Clip stages: restrict geometry to the pass-wide clip box before it is projected.
use glam::DVec2;

use crate::geometry::{BoundingBox, SubPath, VertexPath};
use crate::transform::{Stage, StageKind};

/// Clips closed rings against the box (Sutherland–Hodgman).
///
/// Rings reduced to fewer than three vertices are dropped. Open subpaths are clipped as lines.
#[derive(Debug, Clone)]
pub struct ClipPolygon {
    pub clip_box: BoundingBox,
}

impl ClipPolygon {
    pub fn new(clip_box: BoundingBox) -> Self {
        Self { clip_box }
    }
}

impl Stage for ClipPolygon {
    fn kind(&self) -> StageKind {
        StageKind::ClipPolygon
    }

    fn apply(&self, path: VertexPath) -> VertexPath {
        let mut out = VertexPath::new();
        for subpath in path.subpaths {
            if subpath.closed {
                let ring = clip_ring(&subpath.points, &self.clip_box);
                if ring.len() >= 3 {
                    out.push(SubPath::closed(ring));
                }
            } else {
                clip_polyline(&subpath, &self.clip_box, &mut out);
            }
        }
        out
    }
}

/// Clips polylines against the box (Liang–Barsky per segment).
///
/// A polyline that leaves and re-enters the box is split into several open subpaths. Closed
/// rings are clipped along their outline and come out open.
#[derive(Debug, Clone)]
pub struct ClipLine {
    pub clip_box: BoundingBox,
}

impl ClipLine {
    pub fn new(clip_box: BoundingBox) -> Self {
        Self { clip_box }
    }
}

impl Stage for ClipLine {
    fn kind(&self) -> StageKind {
        StageKind::ClipLine
    }

    fn apply(&self, path: VertexPath) -> VertexPath {
        let mut out = VertexPath::new();
        for subpath in &path.subpaths {
            clip_polyline(subpath, &self.clip_box, &mut out);
        }
        out
    }
}

#[derive(Clone, Copy)]
enum Edge {
    Left,
    Right,
    Bottom,
    Top,
}

impl Edge {
    const ALL: [Edge; 4] = [Edge::Left, Edge::Right, Edge::Bottom, Edge::Top];

    fn inside(self, p: DVec2, b: &BoundingBox) -> bool {
        match self {
            Edge::Left => p.x >= b.min.x,
            Edge::Right => p.x <= b.max.x,
            Edge::Bottom => p.y >= b.min.y,
            Edge::Top => p.y <= b.max.y,
        }
    }

    fn intersect(self, a: DVec2, c: DVec2, b: &BoundingBox) -> DVec2 {
        let d = c - a;
        match self {
            Edge::Left | Edge::Right => {
                let x = if matches!(self, Edge::Left) {
                    b.min.x
                } else {
                    b.max.x
                };
                let t = (x - a.x) / d.x;
                DVec2::new(x, a.y + d.y * t)
            }
            Edge::Bottom | Edge::Top => {
                let y = if matches!(self, Edge::Bottom) {
                    b.min.y
                } else {
                    b.max.y
                };
                let t = (y - a.y) / d.y;
                DVec2::new(a.x + d.x * t, y)
            }
        }
    }
}

pub(crate) fn clip_ring(ring: &[DVec2], b: &BoundingBox) -> Vec<DVec2> {
    let mut output = ring.to_vec();
    for edge in Edge::ALL {
        if output.is_empty() {
            break;
        }
        let input = std::mem::take(&mut output);
        let mut prev = input[input.len() - 1];
        for &cur in &input {
            let cur_in = edge.inside(cur, b);
            let prev_in = edge.inside(prev, b);
            if cur_in {
                if !prev_in {
                    output.push(edge.intersect(prev, cur, b));
                }
                output.push(cur);
            } else if prev_in {
                output.push(edge.intersect(prev, cur, b));
            }
            prev = cur;
        }
    }
    output.dedup();
    output
}

/// Liang–Barsky: parametric range of the segment `a -> c` inside the box.
pub(crate) fn clip_segment(a: DVec2, c: DVec2, b: &BoundingBox) -> Option<(DVec2, DVec2)> {
    let d = c - a;
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;
    let checks = [
        (-d.x, a.x - b.min.x),
        (d.x, b.max.x - a.x),
        (-d.y, a.y - b.min.y),
        (d.y, b.max.y - a.y),
    ];
    for (p, q) in checks {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }
    let start = if t0 > 0.0 { a + d * t0 } else { a };
    let end = if t1 < 1.0 { a + d * t1 } else { c };
    Some((start, end))
}

fn clip_polyline(subpath: &SubPath, b: &BoundingBox, out: &mut VertexPath) {
    if subpath.points.len() == 1 {
        if b.contains(subpath.points[0]) {
            out.push(subpath.clone());
        }
        return;
    }

    let mut run: Vec<DVec2> = Vec::new();
    for (a, c) in subpath.segments() {
        match clip_segment(a, c, b) {
            Some((p, q)) => {
                let continues = run.last() == Some(&p) && p == a;
                if !continues {
                    flush(&mut run, out);
                    run.push(p);
                }
                run.push(q);
                if q != c {
                    flush(&mut run, out);
                }
            }
            None => flush(&mut run, out),
        }
    }
    flush(&mut run, out);
}

fn flush(run: &mut Vec<DVec2>, out: &mut VertexPath) {
    if run.len() >= 2 {
        out.push(SubPath::open(std::mem::take(run)));
    } else {
        run.clear();
    }
}
