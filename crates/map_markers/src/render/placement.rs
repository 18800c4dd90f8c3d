//! Marker positions derived from a device-space path.
//!
//! A placement finder turns one transformed path into [`Slot`]s. Each slot is one marker; its
//! candidates are tried in order until one fits the collision detector. Only line placement
//! produces more than one candidate per slot: it may shift a marker along the line by up to
//! `max_error * spacing`.
use std::fmt;
use std::str::FromStr;

use glam::DVec2;

use crate::error::Error;
use crate::geometry::{SubPath, VertexPath};

/// Where markers go on a geometry.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MarkerPlacement {
    /// One marker at the centroid.
    #[default]
    Point,
    /// One marker guaranteed to lie inside a polygon.
    Interior,
    /// Markers repeated along lines and polygon outlines.
    Line,
    /// One marker on the first vertex.
    VertexFirst,
    /// One marker on the last vertex.
    VertexLast,
}

impl FromStr for MarkerPlacement {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "point" => Ok(MarkerPlacement::Point),
            "interior" => Ok(MarkerPlacement::Interior),
            "line" => Ok(MarkerPlacement::Line),
            "vertex-first" => Ok(MarkerPlacement::VertexFirst),
            "vertex-last" => Ok(MarkerPlacement::VertexLast),
            other => Err(Error::property(
                "placement",
                format!("unknown placement '{other}'"),
            )),
        }
    }
}

impl fmt::Display for MarkerPlacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MarkerPlacement::Point => "point",
            MarkerPlacement::Interior => "interior",
            MarkerPlacement::Line => "line",
            MarkerPlacement::VertexFirst => "vertex-first",
            MarkerPlacement::VertexLast => "vertex-last",
        })
    }
}

/// A marker position and its rotation in radians.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub position: DVec2,
    pub angle: f64,
}

impl Placement {
    pub fn new(position: DVec2, angle: f64) -> Self {
        Self { position, angle }
    }

    pub fn at(position: DVec2) -> Self {
        Self::new(position, 0.0)
    }
}

/// Alternative placements for one marker, best first.
#[derive(Clone, Debug, PartialEq)]
pub struct Slot {
    pub candidates: Vec<Placement>,
}

impl Slot {
    fn single(placement: Placement) -> Self {
        Self {
            candidates: vec![placement],
        }
    }
}

/// Computes marker slots for transformed paths.
#[derive(Clone, Copy, Debug)]
pub struct PlacementFinder {
    pub placement: MarkerPlacement,
    /// Distance between line markers in device units.
    pub spacing: f64,
    /// Allowed shift of a line marker, as a fraction of `spacing`.
    pub max_error: f64,
}

impl PlacementFinder {
    pub fn new(placement: MarkerPlacement, spacing: f64, max_error: f64) -> Self {
        Self {
            placement,
            spacing,
            max_error,
        }
    }

    pub fn find(&self, path: &VertexPath) -> Vec<Slot> {
        if path.is_empty() {
            return Vec::new();
        }
        match self.placement {
            MarkerPlacement::Line => self.along_lines(path),
            MarkerPlacement::Point => single(centroid(path).map(Placement::at)),
            MarkerPlacement::Interior => single(interior(path).map(Placement::at)),
            MarkerPlacement::VertexFirst => single(vertex_first(path)),
            MarkerPlacement::VertexLast => single(vertex_last(path)),
        }
    }

    fn along_lines(&self, path: &VertexPath) -> Vec<Slot> {
        let mut slots = Vec::new();
        for subpath in path.subpaths.iter().filter(|s| s.len() > 1) {
            let length = subpath.length();
            if length.is_nan() || length <= 0.0 {
                continue;
            }
            let spacing = if self.spacing > 0.0 { self.spacing } else { length };
            let shift = (self.max_error.max(0.0) * spacing) * 0.5;

            let mut targets = Vec::new();
            if length < spacing {
                targets.push(length * 0.5);
            } else {
                let count = ((length - spacing * 0.5) / spacing).floor() as usize + 1;
                targets.extend((0..count).map(|k| spacing * (k as f64 + 0.5)));
            }

            for s in targets {
                let candidates = [0.0, shift, -shift, 2.0 * shift, -2.0 * shift]
                    .into_iter()
                    .enumerate()
                    .filter(|&(i, d)| i == 0 || d != 0.0)
                    .map(|(_, d)| s + d)
                    .filter(|d| (0.0..=length).contains(d))
                    .filter_map(|d| point_at(subpath, d))
                    .collect();
                slots.push(Slot { candidates });
            }
        }
        slots
    }
}

fn single(placement: Option<Placement>) -> Vec<Slot> {
    placement.map(Slot::single).into_iter().collect()
}

/// Position and direction at arc length `distance` along `subpath`.
fn point_at(subpath: &SubPath, distance: f64) -> Option<Placement> {
    let mut remaining = distance;
    let mut last = None;
    for (a, b) in subpath.segments() {
        let len = a.distance(b);
        if len == 0.0 {
            continue;
        }
        let angle = (b - a).to_angle();
        if remaining <= len {
            return Some(Placement::new(a.lerp(b, remaining / len), angle));
        }
        remaining -= len;
        last = Some(Placement::new(b, angle));
    }
    last
}

fn closed_rings(path: &VertexPath) -> impl Iterator<Item = &SubPath> {
    path.subpaths.iter().filter(|s| s.closed && s.len() > 2)
}

fn is_polygon(path: &VertexPath) -> bool {
    closed_rings(path).next().is_some()
}

/// Area centroid for polygons, length midpoint for lines, mean position for points.
pub fn centroid(path: &VertexPath) -> Option<DVec2> {
    if is_polygon(path) {
        let mut area = 0.0;
        let mut acc = DVec2::ZERO;
        for ring in closed_rings(path) {
            let origin = ring.points[0];
            for (a, b) in ring.segments() {
                let (a, b) = (a - origin, b - origin);
                let cross = a.perp_dot(b);
                area += cross;
                acc += (a + b) * cross + origin * cross * 3.0;
            }
        }
        if area.abs() > f64::EPSILON {
            return Some(acc / (3.0 * area));
        }
        return mean(path);
    }

    let lines: Vec<&SubPath> = path.subpaths.iter().filter(|s| s.len() > 1).collect();
    let total: f64 = lines.iter().map(|s| s.length()).sum();
    if total > 0.0 {
        let mut remaining = total * 0.5;
        for line in lines {
            let len = line.length();
            if remaining <= len {
                return point_at(line, remaining).map(|p| p.position);
            }
            remaining -= len;
        }
    }
    mean(path)
}

fn mean(path: &VertexPath) -> Option<DVec2> {
    let count = path.vertex_count();
    (count > 0).then(|| path.points().sum::<DVec2>() / count as f64)
}

/// Even-odd point-in-polygon test over every closed ring.
fn inside(path: &VertexPath, p: DVec2) -> bool {
    let mut inside = false;
    for ring in closed_rings(path) {
        for (a, b) in ring.segments() {
            if (a.y > p.y) != (b.y > p.y) && p.x < a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y) {
                inside = !inside;
            }
        }
    }
    inside
}

/// Like [`centroid`], but for polygons the result lies inside.
///
/// Falls back to the middle of the widest horizontal span through the centroid.
pub fn interior(path: &VertexPath) -> Option<DVec2> {
    let c = centroid(path)?;
    if !is_polygon(path) || inside(path, c) {
        return Some(c);
    }

    let mut xs: Vec<f64> = closed_rings(path)
        .flat_map(|ring| ring.segments())
        .filter(|(a, b)| (a.y > c.y) != (b.y > c.y))
        .map(|(a, b)| a.x + (c.y - a.y) * (b.x - a.x) / (b.y - a.y))
        .collect();
    xs.sort_by(f64::total_cmp);

    xs.chunks_exact(2)
        .max_by(|l, r| (l[1] - l[0]).total_cmp(&(r[1] - r[0])))
        .map(|span| DVec2::new((span[0] + span[1]) * 0.5, c.y))
        .or(Some(c))
}

fn vertex_first(path: &VertexPath) -> Option<Placement> {
    let subpath = path.subpaths.iter().find(|s| !s.is_empty())?;
    let first = subpath.points[0];
    let angle = subpath
        .points
        .iter()
        .find(|p| **p != first)
        .map_or(0.0, |next| (*next - first).to_angle());
    Some(Placement::new(first, angle))
}

fn vertex_last(path: &VertexPath) -> Option<Placement> {
    let subpath = path.subpaths.iter().rev().find(|s| !s.is_empty())?;
    let last = *subpath.points.last()?;
    let angle = subpath
        .points
        .iter()
        .rev()
        .find(|p| **p != last)
        .map_or(0.0, |prev| (last - *prev).to_angle());
    Some(Placement::new(last, angle))
}
