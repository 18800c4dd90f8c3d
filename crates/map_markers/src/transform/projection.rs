//! Projection stage: source coordinates -> map coordinates -> device pixels.
//!
//! The stage combines a [`Projection`] (source SRS to map SRS) with a [`ViewTransform`]
//! (map extent to the pixel grid). It is always active.
use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

use glam::{DAffine2, DVec2};
use tracing::trace;

use crate::geometry::{BoundingBox, SubPath, VertexPath};
use crate::transform::{Stage, StageKind};

/// Maps coordinates between a source reference system and the map reference system.
pub trait Projection: Send + Sync + fmt::Debug {
    /// Source -> map. Returns `None` if the point cannot be projected.
    fn forward(&self, p: DVec2) -> Option<DVec2>;

    /// Map -> source.
    fn backward(&self, p: DVec2) -> Option<DVec2>;
}

/// Source and map coordinates are the same.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityProjection;

impl Projection for IdentityProjection {
    fn forward(&self, p: DVec2) -> Option<DVec2> {
        p.is_finite().then_some(p)
    }

    fn backward(&self, p: DVec2) -> Option<DVec2> {
        p.is_finite().then_some(p)
    }
}

/// Geographic longitude/latitude in degrees to spherical Web Mercator meters.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercator;

impl WebMercator {
    pub const EARTH_RADIUS: f64 = 6_378_137.0;
    pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;
}

impl Projection for WebMercator {
    fn forward(&self, p: DVec2) -> Option<DVec2> {
        if !p.is_finite() {
            return None;
        }
        let lat = p.y.clamp(-Self::MAX_LATITUDE, Self::MAX_LATITUDE);
        let x = p.x.to_radians() * Self::EARTH_RADIUS;
        let y = (PI / 4.0 + lat.to_radians() / 2.0).tan().ln() * Self::EARTH_RADIUS;
        Some(DVec2::new(x, y))
    }

    fn backward(&self, p: DVec2) -> Option<DVec2> {
        if !p.is_finite() {
            return None;
        }
        let lon = (p.x / Self::EARTH_RADIUS).to_degrees();
        let lat = (2.0 * (p.y / Self::EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
        Some(DVec2::new(lon, lat))
    }
}

/// Maps a map-space extent onto a `width` x `height` pixel grid with y pointing down.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub width: u32,
    pub height: u32,
    pub extent: BoundingBox,
    /// Pixel offset subtracted after scaling, for rendering sub-regions of a larger canvas.
    pub offset: DVec2,
}

impl ViewTransform {
    pub fn new(width: u32, height: u32, extent: BoundingBox) -> Self {
        Self {
            width,
            height,
            extent,
            offset: DVec2::ZERO,
        }
    }

    pub fn with_offset(mut self, offset: DVec2) -> Self {
        self.offset = offset;
        self
    }

    /// Pixels per map unit along x and y. Zero for a degenerate extent.
    pub fn scale(&self) -> DVec2 {
        let sx = if self.extent.width() > 0.0 {
            self.width as f64 / self.extent.width()
        } else {
            0.0
        };
        let sy = if self.extent.height() > 0.0 {
            self.height as f64 / self.extent.height()
        } else {
            0.0
        };
        DVec2::new(sx, sy)
    }

    /// Map -> device as an affine matrix.
    pub fn matrix(&self) -> DAffine2 {
        let s = self.scale();
        DAffine2::from_cols_array(&[
            s.x,
            0.0,
            0.0,
            -s.y,
            -self.extent.min.x * s.x - self.offset.x,
            self.extent.max.y * s.y - self.offset.y,
        ])
    }

    pub fn forward(&self, p: DVec2) -> DVec2 {
        self.matrix().transform_point2(p)
    }

    pub fn backward(&self, p: DVec2) -> DVec2 {
        self.matrix().inverse().transform_point2(p)
    }
}

/// Projects every vertex and maps it to device space. Unprojectable vertices are dropped.
#[derive(Debug, Clone)]
pub struct ProjectionStage {
    projection: Arc<dyn Projection>,
    view: DAffine2,
}

impl ProjectionStage {
    pub fn new(projection: Arc<dyn Projection>, view: &ViewTransform) -> Self {
        Self {
            projection,
            view: view.matrix(),
        }
    }
}

impl Stage for ProjectionStage {
    fn kind(&self) -> StageKind {
        StageKind::Projection
    }

    fn apply(&self, path: VertexPath) -> VertexPath {
        let mut out = VertexPath::new();
        for subpath in path.subpaths {
            let total = subpath.points.len();
            let points: Vec<DVec2> = subpath
                .points
                .into_iter()
                .filter_map(|p| self.projection.forward(p))
                .map(|p| self.view.transform_point2(p))
                .collect();
            if points.len() < total {
                trace!(
                    "Dropped {} unprojectable vertices.",
                    total - points.len()
                );
            }
            if !points.is_empty() {
                out.push(SubPath::new(points, subpath.closed));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_transform_flips_y() {
        let view = ViewTransform::new(100, 50, BoundingBox::new(0.0, 0.0, 200.0, 100.0));
        assert_eq!(view.forward(DVec2::new(0.0, 100.0)), DVec2::new(0.0, 0.0));
        assert_eq!(view.forward(DVec2::new(200.0, 0.0)), DVec2::new(100.0, 50.0));
        let back = view.backward(DVec2::new(50.0, 25.0));
        assert!(back.abs_diff_eq(DVec2::new(100.0, 50.0), 1e-9));
    }

    #[test]
    fn web_mercator_round_trips_known_point() {
        let merc = WebMercator;
        let p = merc.forward(DVec2::new(180.0, 0.0)).unwrap();
        assert!((p.x - 20_037_508.342_789_244).abs() < 1e-6);
        assert!(p.y.abs() < 1e-6);
        let back = merc.backward(merc.forward(DVec2::new(13.4, 52.5)).unwrap()).unwrap();
        assert!(back.abs_diff_eq(DVec2::new(13.4, 52.5), 1e-9));
    }

    #[test]
    fn stage_drops_non_finite_vertices() {
        let view = ViewTransform::new(10, 10, BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        let stage = ProjectionStage::new(Arc::new(IdentityProjection), &view);
        let path = VertexPath::line_string([[1.0, 1.0], [f64::NAN, 2.0], [3.0, 3.0]]);
        let out = stage.apply(path);
        assert_eq!(
            out.subpaths[0].points,
            vec![DVec2::new(1.0, 9.0), DVec2::new(3.0, 7.0)]
        );
    }
}
