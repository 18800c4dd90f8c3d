//! Vertex reduction within a device-space tolerance.
use std::fmt;
use std::str::FromStr;

use glam::DVec2;

use crate::error::Error;
use crate::geometry::{SubPath, VertexPath};
use crate::transform::{Stage, StageKind};

/// Algorithm used by [`SimplifyStage`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SimplifyAlgorithm {
    /// Drops vertices closer than the tolerance to the previously kept vertex.
    #[default]
    RadialDistance,
    /// Keeps the vertices that deviate most from the chord, recursively.
    DouglasPeucker,
}

impl FromStr for SimplifyAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "radial-distance" => Ok(SimplifyAlgorithm::RadialDistance),
            "douglas-peucker" => Ok(SimplifyAlgorithm::DouglasPeucker),
            other => Err(Error::property(
                "simplify-algorithm",
                format!("unknown algorithm '{other}'"),
            )),
        }
    }
}

impl fmt::Display for SimplifyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SimplifyAlgorithm::RadialDistance => "radial-distance",
            SimplifyAlgorithm::DouglasPeucker => "douglas-peucker",
        })
    }
}

#[derive(Debug, Clone)]
pub struct SimplifyStage {
    pub tolerance: f64,
    pub algorithm: SimplifyAlgorithm,
}

impl SimplifyStage {
    pub fn new(tolerance: f64, algorithm: SimplifyAlgorithm) -> Self {
        Self {
            tolerance,
            algorithm,
        }
    }

    fn simplify(&self, points: &[DVec2]) -> Vec<DVec2> {
        if points.len() < 3 {
            return points.to_vec();
        }
        match self.algorithm {
            SimplifyAlgorithm::RadialDistance => radial_distance(points, self.tolerance),
            SimplifyAlgorithm::DouglasPeucker => douglas_peucker(points, self.tolerance),
        }
    }
}

impl Stage for SimplifyStage {
    fn kind(&self) -> StageKind {
        StageKind::Simplify
    }

    fn apply(&self, path: VertexPath) -> VertexPath {
        let subpaths = path
            .subpaths
            .into_iter()
            .map(|subpath| {
                let points = self.simplify(&subpath.points);
                // A collapsed ring keeps its original outline.
                if subpath.closed && points.len() < 3 {
                    subpath
                } else {
                    SubPath::new(points, subpath.closed)
                }
            })
            .collect();
        VertexPath::from_subpaths(subpaths)
    }
}

fn radial_distance(points: &[DVec2], tolerance: f64) -> Vec<DVec2> {
    let tol2 = tolerance * tolerance;
    let last = points[points.len() - 1];
    let mut out = Vec::with_capacity(points.len());
    out.push(points[0]);
    for &p in &points[1..points.len() - 1] {
        let prev = out[out.len() - 1];
        if p.distance_squared(prev) >= tol2 && p.distance_squared(last) >= tol2 {
            out.push(p);
        }
    }
    out.push(last);
    out
}

fn douglas_peucker(points: &[DVec2], tolerance: f64) -> Vec<DVec2> {
    let n = points.len();
    let mut keep = vec![false; n];
    keep[0] = true;
    keep[n - 1] = true;

    let mut stack = vec![(0usize, n - 1)];
    while let Some((first, last)) = stack.pop() {
        if last <= first + 1 {
            continue;
        }
        let (a, b) = (points[first], points[last]);
        let mut max_dist = 0.0;
        let mut index = first;
        for (i, &p) in points.iter().enumerate().take(last).skip(first + 1) {
            let d = segment_distance(p, a, b);
            if d > max_dist {
                max_dist = d;
                index = i;
            }
        }
        if max_dist > tolerance {
            keep[index] = true;
            stack.push((first, index));
            stack.push((index, last));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

fn segment_distance(p: DVec2, a: DVec2, b: DVec2) -> f64 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}
