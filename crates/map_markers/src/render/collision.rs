//! Collision detection for marker placements.
use crate::geometry::BoundingBox;

/// Tracks occupied device space across placements and symbolizers.
pub trait CollisionDetector {
    /// Returns `true` if `bbox` does not overlap anything already inserted.
    fn has_placement(&self, bbox: &BoundingBox) -> bool;

    fn insert(&mut self, bbox: BoundingBox);
}

/// Flat list of occupied boxes. Boxes that only touch do not collide.
#[derive(Debug, Clone, Default)]
pub struct BoxDetector {
    extent: BoundingBox,
    boxes: Vec<BoundingBox>,
}

impl BoxDetector {
    /// A detector for the device-space `extent`. Boxes entirely outside it are not stored.
    pub fn new(extent: BoundingBox) -> Self {
        Self {
            extent,
            boxes: Vec::new(),
        }
    }

    pub fn extent(&self) -> BoundingBox {
        self.extent
    }

    pub fn boxes(&self) -> &[BoundingBox] {
        &self.boxes
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn clear(&mut self) {
        self.boxes.clear();
    }
}

impl CollisionDetector for BoxDetector {
    fn has_placement(&self, bbox: &BoundingBox) -> bool {
        !self.boxes.iter().any(|b| b.intersects(bbox))
    }

    fn insert(&mut self, bbox: BoundingBox) {
        if self.extent.is_valid() && !self.extent.intersects(&bbox) {
            return;
        }
        self.boxes.push(bbox);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_boxes_collide() {
        let mut detector = BoxDetector::new(BoundingBox::new(0.0, 0.0, 100.0, 100.0));
        detector.insert(BoundingBox::new(10.0, 10.0, 20.0, 20.0));
        assert!(!detector.has_placement(&BoundingBox::new(15.0, 15.0, 25.0, 25.0)));
        assert!(detector.has_placement(&BoundingBox::new(20.0, 10.0, 30.0, 20.0)));
    }

    #[test]
    fn boxes_outside_extent_are_ignored() {
        let mut detector = BoxDetector::new(BoundingBox::new(0.0, 0.0, 100.0, 100.0));
        detector.insert(BoundingBox::new(200.0, 200.0, 210.0, 210.0));
        assert!(detector.is_empty());
        detector.insert(BoundingBox::new(95.0, 95.0, 105.0, 105.0));
        assert_eq!(detector.len(), 1);
    }
}
