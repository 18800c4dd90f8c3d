//! Marker rendering: placement, collision, dispatch and the symbolizer entry point.
//!
//! Modules:
//! - apply: multi-geometry driver feeding a feature through a transform chain
//! - collision: [`CollisionDetector`] and the reference [`BoxDetector`]
//! - dispatch: vector and raster marker sinks
//! - markers: [`RenderConfig`], [`RenderContext`] and [`render_markers_symbolizer`]
//! - placement: marker positions along transformed geometry
//! - target: [`RenderTarget`] output strategies
pub mod apply;
pub mod collision;
pub mod dispatch;
pub mod markers;
pub mod placement;
pub mod target;

pub use apply::{apply_markers_multi, MultiPolicy};
pub use collision::{BoxDetector, CollisionDetector};
pub use dispatch::{
    DispatchOptions, DispatchOutput, MarkerDispatch, RasterDispatch, RenderStats, VectorDispatch,
};
pub use markers::{render_markers_symbolizer, MarkerRenderer, RenderConfig, RenderContext};
pub use placement::{MarkerPlacement, Placement, PlacementFinder, Slot};
pub use target::{RecordingTarget, RenderCommand, RenderTarget};

use crate::geometry::VertexPath;

/// Consumer at the end of a transform chain.
pub trait VertexSink {
    fn add_path(&mut self, path: &VertexPath);
}

/// Forwards every path to a closure.
pub struct FnSink<F>
where
    F: FnMut(&VertexPath),
{
    f: F,
}

impl<F> FnSink<F>
where
    F: FnMut(&VertexPath),
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> VertexSink for FnSink<F>
where
    F: FnMut(&VertexPath),
{
    #[inline]
    fn add_path(&mut self, path: &VertexPath) {
        (self.f)(path);
    }
}

/// Collects copies of every path.
#[derive(Debug, Default)]
pub struct VecSink {
    paths: Vec<VertexPath>,
}

impl VecSink {
    pub fn new() -> Self {
        Self { paths: Vec::new() }
    }

    pub fn into_inner(self) -> Vec<VertexPath> {
        self.paths
    }

    pub fn as_slice(&self) -> &[VertexPath] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl VertexSink for VecSink {
    #[inline]
    fn add_path(&mut self, path: &VertexPath) {
        self.paths.push(path.clone());
    }
}
