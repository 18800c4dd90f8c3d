//! Geometry transform chain.
//!
//! A [`TransformChain`] is an ordered list of [`Stage`]s that map a [`VertexPath`] to a new
//! [`VertexPath`]. Stages always run in the canonical [`StageKind`] order:
//!
//! 1. clip (line or polygon, depending on the geometry type)
//! 2. projection + view transform
//! 3. geometry affine transform
//! 4. simplify
//! 5. smooth
//! 6. parallel offset
//!
//! Inactive stages are left out of the chain entirely, so disabling one never reorders the
//! others. The final consumer is a [`VertexSink`], normally a marker dispatch.
pub mod affine;
pub mod clip;
pub mod offset;
pub mod projection;
pub mod simplify;
pub mod smooth;

use std::fmt;
use std::sync::Arc;

use glam::DAffine2;
use tracing::trace;

pub use affine::AffineStage;
pub use clip::{ClipLine, ClipPolygon};
pub use offset::OffsetStage;
pub use projection::{IdentityProjection, Projection, ProjectionStage, ViewTransform, WebMercator};
pub use simplify::{SimplifyAlgorithm, SimplifyStage};
pub use smooth::SmoothStage;

use crate::geometry::{BoundingBox, GeometryType, VertexPath};
use crate::render::VertexSink;
use crate::symbolizer::SymbolizerParams;

/// Stage identity. The derived ordering is the execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StageKind {
    ClipLine,
    ClipPolygon,
    Projection,
    Affine,
    Simplify,
    Smooth,
    Offset,
}

/// One geometric adjustment in a [`TransformChain`].
pub trait Stage: fmt::Debug {
    fn kind(&self) -> StageKind;

    /// Consumes `path` and returns the adjusted path. Degenerate input yields degenerate or empty
    /// output, never a panic.
    fn apply(&self, path: VertexPath) -> VertexPath;
}

/// Everything needed to build the chain for one symbolizer pass, except the params.
#[derive(Clone, Debug)]
pub struct ChainContext<'a> {
    /// Clip region in the coordinate space of the incoming geometry.
    pub clip_box: BoundingBox,
    pub projection: Arc<dyn Projection>,
    pub view: &'a ViewTransform,
    pub scale_factor: f64,
}

/// Ordered, conditionally populated list of stages.
#[derive(Debug, Default)]
pub struct TransformChain {
    stages: Vec<Box<dyn Stage>>,
}

impl TransformChain {
    /// An empty chain that passes paths through unchanged.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Builds the chain for one symbolizer evaluation.
    ///
    /// `geometry_type` is the type of the feature's first geometry; it only selects the clip
    /// variant. Points are never clipped.
    pub fn for_symbolizer(
        ctx: &ChainContext<'_>,
        params: &SymbolizerParams,
        geometry_type: Option<GeometryType>,
    ) -> Self {
        let mut chain = Self::new();

        if params.clip {
            match geometry_type {
                Some(GeometryType::Polygon) => chain.push(ClipPolygon::new(ctx.clip_box)),
                Some(GeometryType::LineString) => chain.push(ClipLine::new(ctx.clip_box)),
                Some(GeometryType::Point) | None => {}
            }
        }

        chain.push(ProjectionStage::new(Arc::clone(&ctx.projection), ctx.view));
        chain.push(AffineStage::new(
            params.geometry_transform.unwrap_or(DAffine2::IDENTITY),
        ));

        if params.simplify_tolerance > 0.0 {
            chain.push(SimplifyStage::new(
                params.simplify_tolerance,
                params.simplify_algorithm,
            ));
        }
        if params.smooth > 0.0 {
            chain.push(SmoothStage::new(params.smooth));
        }
        if params.offset.abs() > 0.0 {
            chain.push(OffsetStage::new(params.offset * ctx.scale_factor));
        }

        chain
    }

    /// Inserts `stage` at its canonical position. A stage of an already present kind runs after it.
    pub fn push(&mut self, stage: impl Stage + 'static) {
        let kind = stage.kind();
        let at = self.stages.partition_point(|s| s.kind() <= kind);
        self.stages.insert(at, Box::new(stage));
    }

    /// Kinds of the active stages in execution order.
    pub fn stage_kinds(&self) -> Vec<StageKind> {
        self.stages.iter().map(|s| s.kind()).collect()
    }

    pub fn is_active(&self, kind: StageKind) -> bool {
        self.stages.iter().any(|s| s.kind() == kind)
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Runs every stage over a copy of `path`.
    pub fn apply(&self, path: &VertexPath) -> VertexPath {
        self.stages
            .iter()
            .fold(path.clone(), |acc, stage| stage.apply(acc))
    }

    /// Runs the chain and hands the result to `sink`. Paths that end up empty are dropped.
    pub fn process(&self, path: &VertexPath, sink: &mut dyn VertexSink) {
        let out = self.apply(path);
        if out.is_empty() {
            trace!("Path emptied by transform chain, nothing to render.");
            return;
        }
        sink.add_path(&out);
    }
}
