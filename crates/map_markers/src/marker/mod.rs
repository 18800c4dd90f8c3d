//! Marker descriptors and the marker cache.
//!
//! A [`Marker`] is the immutable, resolved form of a marker asset: either a [`VectorMarker`] or a
//! [`RasterImage`]. Markers are shared as `Arc<Marker>` between every placement that draws them.
pub mod cache;
pub mod raster;
pub mod shapes;
pub mod vector;

pub use cache::{MarkerCache, MarkerLoader};
pub use raster::RasterImage;
pub use vector::{PathAttributes, VectorMarker};

use crate::geometry::BoundingBox;

/// Type tag of a [`Marker`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    Vector,
    Raster,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MarkerData {
    Vector(VectorMarker),
    Raster(RasterImage),
}

/// A resolved marker asset with its bounding box in local marker units.
#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    data: MarkerData,
    bbox: BoundingBox,
}

impl Marker {
    pub fn vector(marker: VectorMarker) -> Self {
        let bbox = marker.bounding_box();
        Self {
            data: MarkerData::Vector(marker),
            bbox,
        }
    }

    /// Raster markers span `(0, 0)` to `(width, height)`.
    pub fn raster(image: RasterImage) -> Self {
        let bbox = BoundingBox::new(0.0, 0.0, image.width() as f64, image.height() as f64);
        Self {
            data: MarkerData::Raster(image),
            bbox,
        }
    }

    pub fn kind(&self) -> MarkerKind {
        match self.data {
            MarkerData::Vector(_) => MarkerKind::Vector,
            MarkerData::Raster(_) => MarkerKind::Raster,
        }
    }

    pub fn is_vector(&self) -> bool {
        self.kind() == MarkerKind::Vector
    }

    pub fn data(&self) -> &MarkerData {
        &self.data
    }

    pub fn vector_data(&self) -> Option<&VectorMarker> {
        match &self.data {
            MarkerData::Vector(v) => Some(v),
            MarkerData::Raster(_) => None,
        }
    }

    pub fn bitmap_data(&self) -> Option<&RasterImage> {
        match &self.data {
            MarkerData::Raster(r) => Some(r),
            MarkerData::Vector(_) => None,
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }

    /// Natural width in marker units.
    pub fn width(&self) -> f64 {
        self.bbox.width()
    }

    pub fn height(&self) -> f64 {
        self.bbox.height()
    }
}
