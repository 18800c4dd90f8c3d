//! Vertex paths: the data that flows through the transform chain.
//!
//! A [`VertexPath`] is an ordered list of [`SubPath`]s. Each subpath is a polyline that may be
//! closed (polygon rings, marker outlines). [`VertexPath::commands`] exposes the same data as a
//! flat `move_to`/`line_to`/`close` command stream.
use glam::{DAffine2, DVec2};
use mint::Vector2;

use crate::geometry::BoundingBox;

/// A drawing command in a flattened vertex stream.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PathCommand {
    MoveTo,
    LineTo,
    Close,
}

/// A single polyline, optionally closed back onto its first vertex.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubPath {
    pub points: Vec<DVec2>,
    pub closed: bool,
}

impl SubPath {
    pub fn new(points: Vec<DVec2>, closed: bool) -> Self {
        Self { points, closed }
    }

    pub fn open(points: Vec<DVec2>) -> Self {
        Self::new(points, false)
    }

    pub fn closed(points: Vec<DVec2>) -> Self {
        Self::new(points, true)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterates the segments of the subpath, including the closing segment of a closed ring.
    pub fn segments(&self) -> impl Iterator<Item = (DVec2, DVec2)> + '_ {
        let closing = if self.closed && self.points.len() > 2 {
            Some((self.points[self.points.len() - 1], self.points[0]))
        } else {
            None
        };
        self.points.windows(2).map(|w| (w[0], w[1])).chain(closing)
    }

    /// Total length of all segments.
    pub fn length(&self) -> f64 {
        self.segments().map(|(a, b)| a.distance(b)).sum()
    }
}

/// An owned sequence of subpaths.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VertexPath {
    pub subpaths: Vec<SubPath>,
}

impl VertexPath {
    pub fn new() -> Self {
        Self {
            subpaths: Vec::new(),
        }
    }

    pub fn from_subpaths(subpaths: Vec<SubPath>) -> Self {
        Self { subpaths }
    }

    /// A single-vertex path.
    pub fn point(p: impl Into<Vector2<f64>>) -> Self {
        Self::from_subpaths(vec![SubPath::open(vec![DVec2::from(p.into())])])
    }

    /// An open polyline.
    pub fn line_string<I, P>(points: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Vector2<f64>>,
    {
        Self::from_subpaths(vec![SubPath::open(collect_points(points))])
    }

    /// A single closed ring. A repeated closing vertex is dropped.
    pub fn polygon<I, P>(ring: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Vector2<f64>>,
    {
        let mut points = collect_points(ring);
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        Self::from_subpaths(vec![SubPath::closed(points)])
    }

    pub fn push(&mut self, subpath: SubPath) {
        self.subpaths.push(subpath);
    }

    /// Appends every subpath of `other`.
    pub fn extend(&mut self, other: VertexPath) {
        self.subpaths.extend(other.subpaths);
    }

    /// Returns `true` if the path has no vertices at all.
    pub fn is_empty(&self) -> bool {
        self.subpaths.iter().all(SubPath::is_empty)
    }

    pub fn vertex_count(&self) -> usize {
        self.subpaths.iter().map(SubPath::len).sum()
    }

    pub fn points(&self) -> impl Iterator<Item = DVec2> + '_ {
        self.subpaths.iter().flat_map(|s| s.points.iter().copied())
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self.points())
    }

    /// Applies `tr` to every vertex in place.
    pub fn transform(&mut self, tr: &DAffine2) {
        for subpath in &mut self.subpaths {
            for p in &mut subpath.points {
                *p = tr.transform_point2(*p);
            }
        }
    }

    pub fn transformed(&self, tr: &DAffine2) -> VertexPath {
        let mut out = self.clone();
        out.transform(tr);
        out
    }

    /// Flattened command stream: `MoveTo` starts each subpath, `Close` ends closed ones.
    pub fn commands(&self) -> impl Iterator<Item = (PathCommand, DVec2)> + '_ {
        self.subpaths
            .iter()
            .filter(|s| !s.is_empty())
            .flat_map(|s| {
                let first = s.points[0];
                let body = s.points.iter().enumerate().map(|(i, p)| {
                    let cmd = if i == 0 {
                        PathCommand::MoveTo
                    } else {
                        PathCommand::LineTo
                    };
                    (cmd, *p)
                });
                body.chain(s.closed.then_some((PathCommand::Close, first)))
            })
    }
}

fn collect_points<I, P>(points: I) -> Vec<DVec2>
where
    I: IntoIterator<Item = P>,
    P: Into<Vector2<f64>>,
{
    points.into_iter().map(|p| DVec2::from(p.into())).collect()
}
