//! Marker dispatch: the terminal sink of the transform chain.
//!
//! A dispatch is bound to one resolved marker and one image transform. For every path coming out
//! of the chain it computes placements, checks them against the collision detector and hands the
//! accepted ones to the [`RenderTarget`].
use std::sync::Arc;

use glam::{DAffine2, DVec2};
use tracing::trace;

use crate::geometry::{BoundingBox, VertexPath};
use crate::marker::{Marker, PathAttributes};
use crate::render::collision::CollisionDetector;
use crate::render::placement::{Placement, PlacementFinder};
use crate::render::target::RenderTarget;
use crate::render::VertexSink;

/// Per-pass counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Marker slots found on the transformed geometry.
    pub slots: usize,
    /// Markers handed to the target.
    pub rendered: usize,
    /// Slots dropped because every candidate collided.
    pub collided: usize,
}

impl RenderStats {
    pub fn merge(&mut self, other: RenderStats) {
        self.slots += other.slots;
        self.rendered += other.rendered;
        self.collided += other.collided;
    }
}

/// Placement-related settings shared by both dispatch variants.
#[derive(Debug, Clone, Copy)]
pub struct DispatchOptions {
    pub finder: PlacementFinder,
    pub opacity: f64,
    pub allow_overlap: bool,
    pub ignore_placement: bool,
}

/// Shared output state: the target plus the collision detector.
pub struct DispatchOutput<'a> {
    pub target: &'a mut dyn RenderTarget,
    pub detector: &'a mut dyn CollisionDetector,
}

impl DispatchOutput<'_> {
    /// Tries each slot's candidates in order, renders the first that fits and records the outcome.
    fn place(
        &mut self,
        path: &VertexPath,
        options: &DispatchOptions,
        marker_box: &BoundingBox,
        stats: &mut RenderStats,
        mut matrix_for: impl FnMut(&Placement) -> DAffine2,
        mut render: impl FnMut(&mut dyn RenderTarget, &DAffine2),
    ) {
        for slot in options.finder.find(path) {
            stats.slots += 1;
            let accepted = slot.candidates.iter().find_map(|candidate| {
                let matrix = matrix_for(candidate);
                let bbox = marker_box.transformed(&matrix);
                if !bbox.is_valid() {
                    trace!("Skipping placement with non-finite marker box.");
                    return None;
                }
                (options.allow_overlap || self.detector.has_placement(&bbox))
                    .then_some((matrix, bbox))
            });

            match accepted {
                Some((matrix, bbox)) => {
                    render(&mut *self.target, &matrix);
                    if !options.ignore_placement {
                        self.detector.insert(bbox);
                    }
                    stats.rendered += 1;
                }
                None => stats.collided += 1,
            }
        }
    }
}

/// `translate(position) * rotate(angle) * marker_tr`, with the position optionally rounded.
fn placement_matrix(placement: &Placement, marker_tr: &DAffine2, snap: bool) -> DAffine2 {
    let position = if snap {
        placement.position.round()
    } else {
        placement.position
    };
    DAffine2::from_translation(position) * DAffine2::from_angle(placement.angle) * *marker_tr
}

/// Renders a vector marker at every placement.
pub struct VectorDispatch<'a> {
    path: &'a VertexPath,
    attributes: &'a [PathAttributes],
    bbox: BoundingBox,
    marker_tr: DAffine2,
    snap_to_pixels: bool,
    options: DispatchOptions,
    output: DispatchOutput<'a>,
    stats: RenderStats,
}

impl<'a> VectorDispatch<'a> {
    /// `image_tr` maps marker units to device units around the marker's bbox center.
    pub fn new(
        path: &'a VertexPath,
        attributes: &'a [PathAttributes],
        image_tr: DAffine2,
        snap_to_pixels: bool,
        options: DispatchOptions,
        output: DispatchOutput<'a>,
    ) -> Self {
        let bbox = path.bounding_box();
        let marker_tr = image_tr * DAffine2::from_translation(-bbox.center());
        Self {
            path,
            attributes,
            bbox,
            marker_tr,
            snap_to_pixels,
            options,
            output,
            stats: RenderStats::default(),
        }
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }
}

impl VertexSink for VectorDispatch<'_> {
    fn add_path(&mut self, path: &VertexPath) {
        if !self.bbox.is_valid() || (self.bbox.width() == 0.0 && self.bbox.height() == 0.0) {
            trace!("Skipping vector marker with degenerate bounding box.");
            return;
        }
        let (marker_path, attributes) = (self.path, self.attributes);
        let (marker_tr, snap, opacity) = (self.marker_tr, self.snap_to_pixels, self.options.opacity);
        self.output.place(
            path,
            &self.options,
            &self.bbox,
            &mut self.stats,
            |p| placement_matrix(p, &marker_tr, snap),
            |target, matrix| target.render_vector(marker_path, attributes, matrix, opacity),
        );
    }
}

/// Renders a raster marker at every placement. Positions are never snapped.
pub struct RasterDispatch<'a> {
    marker: Arc<Marker>,
    bbox: BoundingBox,
    marker_tr: DAffine2,
    options: DispatchOptions,
    output: DispatchOutput<'a>,
    stats: RenderStats,
}

impl<'a> RasterDispatch<'a> {
    /// `marker_tr` already includes the recentering on the bitmap center.
    pub fn new(
        marker: Arc<Marker>,
        marker_tr: DAffine2,
        options: DispatchOptions,
        output: DispatchOutput<'a>,
    ) -> Self {
        let bbox = marker.bounding_box();
        Self {
            marker,
            bbox,
            marker_tr,
            options,
            output,
            stats: RenderStats::default(),
        }
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }
}

impl VertexSink for RasterDispatch<'_> {
    fn add_path(&mut self, path: &VertexPath) {
        if self.bbox.area() <= 0.0 {
            trace!("Skipping empty raster marker.");
            return;
        }
        let (marker, marker_tr, opacity) = (&self.marker, self.marker_tr, self.options.opacity);
        self.output.place(
            path,
            &self.options,
            &self.bbox,
            &mut self.stats,
            |p| placement_matrix(p, &marker_tr, false),
            |target, matrix| target.render_raster(marker, matrix, opacity),
        );
    }
}

/// Dispatch bound to one marker variant.
pub enum MarkerDispatch<'a> {
    Vector(VectorDispatch<'a>),
    Raster(RasterDispatch<'a>),
}

impl MarkerDispatch<'_> {
    pub fn stats(&self) -> RenderStats {
        match self {
            MarkerDispatch::Vector(d) => d.stats(),
            MarkerDispatch::Raster(d) => d.stats(),
        }
    }
}

impl VertexSink for MarkerDispatch<'_> {
    fn add_path(&mut self, path: &VertexPath) {
        match self {
            MarkerDispatch::Vector(d) => d.add_path(path),
            MarkerDispatch::Raster(d) => d.add_path(path),
        }
    }
}

/// Device-space center of the marker drawn with `matrix`.
pub fn marker_center(matrix: &DAffine2, marker_box: &BoundingBox) -> DVec2 {
    matrix.transform_point2(marker_box.center())
}
