//! Vector marker data: a path in marker-local units plus per-group paint attributes.
use std::ops::Range;

use crate::geometry::{BoundingBox, VertexPath};
use crate::symbolizer::Color;

/// Paint attributes for a contiguous range of subpaths of a [`VectorMarker`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct PathAttributes {
    /// Subpaths of the marker path painted with these attributes.
    pub subpaths: Range<usize>,
    pub fill: Color,
    pub fill_flag: bool,
    pub fill_opacity: f64,
    pub stroke: Color,
    pub stroke_flag: bool,
    pub stroke_width: f64,
    pub stroke_opacity: f64,
    pub opacity: f64,
}

impl PathAttributes {
    /// Attributes with neither fill nor stroke.
    pub fn new(subpaths: Range<usize>) -> Self {
        Self {
            subpaths,
            fill: Color::BLACK,
            fill_flag: false,
            fill_opacity: 1.0,
            stroke: Color::BLACK,
            stroke_flag: false,
            stroke_width: 1.0,
            stroke_opacity: 1.0,
            opacity: 1.0,
        }
    }

    pub fn with_fill(mut self, color: Color) -> Self {
        self.fill = color;
        self.fill_flag = true;
        self
    }

    pub fn with_stroke(mut self, color: Color, width: f64) -> Self {
        self.stroke = color;
        self.stroke_width = width;
        self.stroke_flag = true;
        self
    }

    /// Returns `true` if nothing would be painted.
    pub fn is_invisible(&self) -> bool {
        (!self.fill_flag && !self.stroke_flag) || self.opacity <= 0.0
    }
}

/// A vector marker: outline geometry and its styling. Immutable once cached.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct VectorMarker {
    pub path: VertexPath,
    pub attributes: Vec<PathAttributes>,
}

impl VectorMarker {
    pub fn new(path: VertexPath, attributes: Vec<PathAttributes>) -> Self {
        Self { path, attributes }
    }

    /// A marker painted with a single attribute set covering every subpath.
    pub fn single(path: VertexPath, attributes: PathAttributes) -> Self {
        let count = path.subpaths.len();
        Self::new(
            path,
            vec![PathAttributes {
                subpaths: 0..count,
                ..attributes
            }],
        )
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.path.bounding_box()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_covers_all_subpaths() {
        let mut path = VertexPath::polygon([[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]);
        path.extend(VertexPath::polygon([[2.0, 2.0], [3.0, 2.0], [3.0, 3.0]]));
        let marker = VectorMarker::single(path, PathAttributes::new(0..0).with_fill(Color::BLUE));
        assert_eq!(marker.attributes[0].subpaths, 0..2);
        assert_eq!(marker.bounding_box(), BoundingBox::new(0.0, 0.0, 3.0, 3.0));
    }

    #[test]
    fn unpainted_attributes_are_invisible() {
        assert!(PathAttributes::new(0..1).is_invisible());
        assert!(!PathAttributes::new(0..1)
            .with_stroke(Color::BLACK, 1.0)
            .is_invisible());
    }
}
