//! Geometry-space affine transform, applied after projection in device units.
use glam::DAffine2;

use crate::geometry::VertexPath;
use crate::transform::{Stage, StageKind};

#[derive(Debug, Clone)]
pub struct AffineStage {
    pub matrix: DAffine2,
}

impl AffineStage {
    pub fn new(matrix: DAffine2) -> Self {
        Self { matrix }
    }
}

impl Stage for AffineStage {
    fn kind(&self) -> StageKind {
        StageKind::Affine
    }

    fn apply(&self, mut path: VertexPath) -> VertexPath {
        if self.matrix != DAffine2::IDENTITY {
            path.transform(&self.matrix);
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use glam::DVec2;

    use super::*;

    #[test]
    fn translates_all_vertices() {
        let stage = AffineStage::new(DAffine2::from_translation(DVec2::new(2.0, -1.0)));
        let out = stage.apply(VertexPath::line_string([[0.0, 0.0], [1.0, 1.0]]));
        assert_eq!(
            out.subpaths[0].points,
            vec![DVec2::new(2.0, -1.0), DVec2::new(3.0, 0.0)]
        );
    }
}
