//! Built-in marker shapes and the explicit-size ellipse synthesizer.
use std::f64::consts::TAU;

use glam::DVec2;

use crate::geometry::{SubPath, VertexPath};
use crate::marker::vector::{PathAttributes, VectorMarker};
use crate::symbolizer::{Color, SymbolizerParams};

pub const ELLIPSE: &str = "shape://ellipse";
pub const ARROW: &str = "shape://arrow";

/// Natural size of the stock ellipse marker.
pub const DEFAULT_ELLIPSE_SIZE: f64 = 10.0;

/// Upper bound on the synthesized ellipse vertex count.
pub const MAX_ELLIPSE_STEPS: usize = 4096;

/// Closed elliptical ring centered on the origin.
///
/// The vertex count is a multiple of four so the ring touches its bounding box exactly at the
/// axis extremes.
pub fn ellipse_path(width: f64, height: f64) -> VertexPath {
    let rx = width.abs() * 0.5;
    let ry = height.abs() * 0.5;
    let steps = ellipse_steps(rx, ry);
    let quarter = steps / 4;

    let points = (0..steps)
        .map(|i| {
            if i % quarter == 0 {
                match i / quarter {
                    0 => DVec2::new(rx, 0.0),
                    1 => DVec2::new(0.0, ry),
                    2 => DVec2::new(-rx, 0.0),
                    _ => DVec2::new(0.0, -ry),
                }
            } else {
                let a = TAU * i as f64 / steps as f64;
                DVec2::new(rx * a.cos(), ry * a.sin())
            }
        })
        .collect();
    VertexPath::from_subpaths(vec![SubPath::closed(points)])
}

fn ellipse_steps(rx: f64, ry: f64) -> usize {
    let ra = (rx + ry) * 0.5;
    let steps = if ra > 0.0 {
        let da = (ra / (ra + 0.125)).acos() * 2.0;
        if da.is_finite() && da > 0.0 {
            (TAU / da).round().min(MAX_ELLIPSE_STEPS as f64) as usize
        } else {
            MAX_ELLIPSE_STEPS
        }
    } else {
        0
    };
    steps.clamp(8, MAX_ELLIPSE_STEPS).div_ceil(4) * 4
}

/// Ellipse sized from the symbolizer's explicit width/height.
///
/// If only one dimension is set the ellipse is a circle of that diameter.
pub fn build_ellipse(params: &SymbolizerParams) -> VertexPath {
    let (w, h) = match (params.width, params.height) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, w),
        (None, Some(h)) => (h, h),
        (None, None) => (0.0, 0.0),
    };
    ellipse_path(w, h)
}

/// Stock ellipse: 10x10 circle, blue fill, thin black outline.
pub fn default_ellipse() -> VectorMarker {
    VectorMarker::single(
        ellipse_path(DEFAULT_ELLIPSE_SIZE, DEFAULT_ELLIPSE_SIZE),
        default_style(),
    )
}

/// Stock arrow pointing along +x, 10 units long.
pub fn default_arrow() -> VectorMarker {
    let path = VertexPath::polygon([
        [-5.0, -1.5],
        [1.0, -1.5],
        [1.0, -4.0],
        [5.0, 0.0],
        [1.0, 4.0],
        [1.0, 1.5],
        [-5.0, 1.5],
    ]);
    VectorMarker::single(path, default_style())
}

fn default_style() -> PathAttributes {
    PathAttributes::new(0..1)
        .with_fill(Color::BLUE)
        .with_stroke(Color::BLACK, 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoundingBox;

    #[test]
    fn ellipse_bounding_box_is_exact() {
        let path = ellipse_path(10.0, 20.0);
        assert_eq!(path.bounding_box(), BoundingBox::new(-5.0, -10.0, 5.0, 10.0));
        assert_eq!(path.vertex_count() % 4, 0);
    }

    #[test]
    fn larger_ellipses_get_more_vertices() {
        assert!(ellipse_path(100.0, 100.0).vertex_count() > ellipse_path(4.0, 4.0).vertex_count());
    }

    #[test]
    fn huge_sizes_cap_the_vertex_count() {
        for size in [1e13, 1e16, f64::INFINITY] {
            let params = SymbolizerParams::default().with_size(Some(size), None);
            let count = build_ellipse(&params).vertex_count();
            assert!(count <= MAX_ELLIPSE_STEPS, "{size}: {count}");
            assert_eq!(count % 4, 0);
        }
    }

    #[test]
    fn single_dimension_builds_a_circle() {
        let params = SymbolizerParams::default().with_size(None, Some(6.0));
        let bbox = build_ellipse(&params).bounding_box();
        assert_eq!(bbox.width(), 6.0);
        assert_eq!(bbox.height(), 6.0);
    }

    #[test]
    fn arrow_points_along_x() {
        let bbox = default_arrow().bounding_box();
        assert_eq!(bbox.width(), 10.0);
        assert_eq!(bbox.center().y, 0.0);
    }
}
