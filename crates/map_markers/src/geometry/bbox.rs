//! Axis-aligned bounding boxes in any 2D coordinate space.
use glam::{DAffine2, DVec2};

/// An axis-aligned box described by its minimum and maximum corners.
///
/// A freshly created [`BoundingBox::EMPTY`] has inverted corners and becomes valid once a point is
/// added. Degenerate boxes (zero width or height) are valid.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: DVec2,
    pub max: DVec2,
}

impl BoundingBox {
    /// A box containing nothing.
    pub const EMPTY: Self = Self {
        min: DVec2::splat(f64::INFINITY),
        max: DVec2::splat(f64::NEG_INFINITY),
    };

    /// Creates a box from two corners in any order.
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            min: DVec2::new(x0.min(x1), y0.min(y1)),
            max: DVec2::new(x0.max(x1), y0.max(y1)),
        }
    }

    /// Smallest box containing all `points`; [`BoundingBox::EMPTY`] if there are none.
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = DVec2>,
    {
        let mut bbox = Self::EMPTY;
        for p in points {
            bbox.expand_to_include(p);
        }
        bbox
    }

    /// Returns `true` once the box contains at least one finite point.
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min.x <= self.max.x && self.min.y <= self.max.y
    }

    pub fn expand_to_include(&mut self, p: DVec2) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn area(&self) -> f64 {
        if self.is_valid() {
            self.width() * self.height()
        } else {
            0.0
        }
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    /// Grows the box by `amount` on every side.
    pub fn padded(&self, amount: f64) -> BoundingBox {
        BoundingBox {
            min: self.min - DVec2::splat(amount),
            max: self.max + DVec2::splat(amount),
        }
    }

    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Returns `true` if the interiors overlap. Boxes that merely touch do not intersect.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    /// Returns `true` if `other` lies entirely inside this box.
    pub fn contains_box(&self, other: &BoundingBox) -> bool {
        self.contains(other.min) && self.contains(other.max)
    }

    /// Box enclosing the four transformed corners.
    pub fn transformed(&self, tr: &DAffine2) -> BoundingBox {
        if !self.is_valid() {
            return *self;
        }
        BoundingBox::from_points([
            tr.transform_point2(self.min),
            tr.transform_point2(DVec2::new(self.max.x, self.min.y)),
            tr.transform_point2(self.max),
            tr.transform_point2(DVec2::new(self.min.x, self.max.y)),
        ])
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::EMPTY
    }
}
