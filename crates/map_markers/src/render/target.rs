//! Output targets that composite positioned markers.
//!
//! The marker pipeline never rasterizes on its own: every accepted placement is handed to a
//! [`RenderTarget`] together with the full marker-to-device matrix. The target is opaque to the
//! pipeline. [`RecordingTarget`] keeps the calls for inspection.
use std::sync::Arc;

use glam::DAffine2;

use crate::geometry::{BoundingBox, VertexPath};
use crate::marker::{Marker, PathAttributes};

/// Receives positioned markers.
pub trait RenderTarget {
    /// Draws `path` (in marker units) through `matrix`. `attributes` select and style its
    /// subpaths. `opacity` multiplies every paint.
    fn render_vector(
        &mut self,
        path: &VertexPath,
        attributes: &[PathAttributes],
        matrix: &DAffine2,
        opacity: f64,
    );

    /// Draws a raster marker through `matrix`, which maps bitmap pixel coordinates to device
    /// space.
    fn render_raster(&mut self, marker: &Arc<Marker>, matrix: &DAffine2, opacity: f64);
}

/// A no-op target.
impl RenderTarget for () {
    #[inline]
    fn render_vector(&mut self, _: &VertexPath, _: &[PathAttributes], _: &DAffine2, _: f64) {}

    #[inline]
    fn render_raster(&mut self, _: &Arc<Marker>, _: &DAffine2, _: f64) {}
}

/// One recorded target call.
#[derive(Debug, Clone)]
pub enum RenderCommand {
    Vector {
        path: VertexPath,
        attributes: Vec<PathAttributes>,
        matrix: DAffine2,
        opacity: f64,
    },
    Raster {
        marker: Arc<Marker>,
        matrix: DAffine2,
        opacity: f64,
    },
}

impl RenderCommand {
    pub fn matrix(&self) -> DAffine2 {
        match self {
            RenderCommand::Vector { matrix, .. } | RenderCommand::Raster { matrix, .. } => *matrix,
        }
    }

    /// Device-space box covered by the drawn marker.
    pub fn bounding_box(&self) -> BoundingBox {
        match self {
            RenderCommand::Vector { path, matrix, .. } => path.transformed(matrix).bounding_box(),
            RenderCommand::Raster { marker, matrix, .. } => {
                marker.bounding_box().transformed(matrix)
            }
        }
    }
}

/// A target that records every call in a `Vec`.
#[derive(Debug, Default)]
pub struct RecordingTarget {
    commands: Vec<RenderCommand>,
}

impl RecordingTarget {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    pub fn into_inner(self) -> Vec<RenderCommand> {
        self.commands
    }

    pub fn as_slice(&self) -> &[RenderCommand] {
        &self.commands
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl RenderTarget for RecordingTarget {
    fn render_vector(
        &mut self,
        path: &VertexPath,
        attributes: &[PathAttributes],
        matrix: &DAffine2,
        opacity: f64,
    ) {
        self.commands.push(RenderCommand::Vector {
            path: path.clone(),
            attributes: attributes.to_vec(),
            matrix: *matrix,
            opacity,
        });
    }

    fn render_raster(&mut self, marker: &Arc<Marker>, matrix: &DAffine2, opacity: f64) {
        self.commands.push(RenderCommand::Raster {
            marker: Arc::clone(marker),
            matrix: *matrix,
            opacity,
        });
    }
}
