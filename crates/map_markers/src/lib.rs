#![forbid(unsafe_code)]
//! map_markers: Marker symbolizer rendering with a configurable geometry transform chain.
//!
//! Modules:
//! - geometry: features, vertex paths and bounding boxes
//! - marker: vector and raster marker descriptors, built-in shapes, the marker cache
//! - symbolizer: property storage, per-feature resolution, colors, transform expressions
//! - transform: clip, projection, affine, simplify, smooth and offset stages
//! - render: placement, collision, dispatch and the symbolizer entry point
pub mod error;
pub mod geometry;
pub mod marker;
pub mod render;
pub mod symbolizer;
pub mod transform;

/// Convenient re-exports for common types. Import with `use map_markers::prelude::*;`.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::geometry::{
        Attributes, BoundingBox, Feature, Geometry, GeometryType, PathCommand, SubPath, Value,
        VertexPath,
    };
    pub use crate::marker::{
        Marker, MarkerCache, MarkerKind, MarkerLoader, PathAttributes, RasterImage, VectorMarker,
    };
    pub use crate::render::{
        apply_markers_multi, render_markers_symbolizer, BoxDetector, CollisionDetector, FnSink,
        MarkerPlacement, MarkerRenderer, MultiPolicy, RecordingTarget, RenderCommand, RenderConfig,
        RenderContext, RenderStats, RenderTarget, VecSink, VertexSink,
    };
    pub use crate::symbolizer::{
        Color, Key, MarkersSymbolizer, PropertyValue, SymbolizerParams, TransformList,
    };
    pub use crate::transform::{
        IdentityProjection, Projection, SimplifyAlgorithm, StageKind, TransformChain,
        ViewTransform, WebMercator,
    };
}
