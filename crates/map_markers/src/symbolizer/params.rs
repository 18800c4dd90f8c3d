//! Resolved symbolizer parameters for one feature.
use glam::DAffine2;

use crate::error::Result;
use crate::geometry::{Attributes, Feature};
use crate::render::{MarkerPlacement, MultiPolicy};
use crate::symbolizer::properties::{Key, MarkersSymbolizer, DEFAULT_MARKER};
use crate::transform::SimplifyAlgorithm;

/// Default distance between markers for line placement, in pixels.
pub const DEFAULT_SPACING: f64 = 100.0;
/// Default tolerance for line placement, as a fraction of the spacing.
pub const DEFAULT_MAX_ERROR: f64 = 0.2;

/// Every symbolizer attribute the marker pipeline reads, evaluated against one feature.
///
/// Invalid numeric values are kept as-is: the transform chain treats anything that fails its
/// activation threshold as an inactive stage.
#[non_exhaustive]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct SymbolizerParams {
    pub file: String,
    pub clip: bool,
    pub offset: f64,
    pub simplify_tolerance: f64,
    pub simplify_algorithm: SimplifyAlgorithm,
    pub smooth: f64,
    /// Evaluated with translations multiplied by the scale factor.
    pub geometry_transform: Option<DAffine2>,
    /// Evaluated without the scale factor.
    pub image_transform: Option<DAffine2>,
    /// `Some` when the key is set on the symbolizer, even if it evaluates to null (then `0`).
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub opacity: f64,
    pub allow_overlap: bool,
    pub ignore_placement: bool,
    pub placement: MarkerPlacement,
    pub spacing: f64,
    pub max_error: f64,
    pub multi_policy: MultiPolicy,
}

impl Default for SymbolizerParams {
    fn default() -> Self {
        Self {
            file: DEFAULT_MARKER.to_string(),
            clip: true,
            offset: 0.0,
            simplify_tolerance: 0.0,
            simplify_algorithm: SimplifyAlgorithm::default(),
            smooth: 0.0,
            geometry_transform: None,
            image_transform: None,
            width: None,
            height: None,
            opacity: 1.0,
            allow_overlap: false,
            ignore_placement: false,
            placement: MarkerPlacement::default(),
            spacing: DEFAULT_SPACING,
            max_error: DEFAULT_MAX_ERROR,
            multi_policy: MultiPolicy::default(),
        }
    }
}

/// Spacings under one pixel fall back to [`DEFAULT_SPACING`].
fn line_spacing(spacing: f64) -> f64 {
    if spacing >= 1.0 {
        spacing
    } else {
        DEFAULT_SPACING
    }
}

impl SymbolizerParams {
    /// Evaluates every key of `sym` against `feature` and `vars`.
    pub fn resolve(
        sym: &MarkersSymbolizer,
        feature: &Feature,
        vars: &Attributes,
        scale_factor: f64,
    ) -> Result<Self> {
        let d = Self::default();
        let size = |key: Key| -> Result<Option<f64>> {
            if sym.has_key(key) {
                Ok(Some(sym.get(key, feature, vars, 0.0)?))
            } else {
                Ok(None)
            }
        };

        Ok(Self {
            file: sym.get(Key::File, feature, vars, d.file)?,
            clip: sym.get(Key::Clip, feature, vars, d.clip)?,
            offset: sym.get(Key::Offset, feature, vars, d.offset)?,
            simplify_tolerance: sym.get(Key::SimplifyTolerance, feature, vars, d.simplify_tolerance)?,
            simplify_algorithm: sym.get(Key::SimplifyAlgorithm, feature, vars, d.simplify_algorithm)?,
            smooth: sym.get(Key::Smooth, feature, vars, d.smooth)?,
            geometry_transform: sym
                .transform(Key::GeometryTransform)
                .map(|t| t.evaluate(feature, vars, scale_factor))
                .transpose()?,
            image_transform: sym
                .transform(Key::ImageTransform)
                .map(|t| t.evaluate(feature, vars, 1.0))
                .transpose()?,
            width: size(Key::Width)?,
            height: size(Key::Height)?,
            opacity: sym.get(Key::Opacity, feature, vars, d.opacity)?,
            allow_overlap: sym.get(Key::AllowOverlap, feature, vars, d.allow_overlap)?,
            ignore_placement: sym.get(Key::IgnorePlacement, feature, vars, d.ignore_placement)?,
            placement: sym.get(Key::Placement, feature, vars, d.placement)?,
            spacing: line_spacing(sym.get(Key::Spacing, feature, vars, d.spacing)?),
            max_error: sym.get(Key::MaxError, feature, vars, d.max_error)?,
            multi_policy: sym.get(Key::MultiPolicy, feature, vars, d.multi_policy)?,
        })
    }

    /// Returns `true` if width or height was set explicitly.
    pub fn has_explicit_size(&self) -> bool {
        self.width.is_some() || self.height.is_some()
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = file.into();
        self
    }

    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_clip(mut self, clip: bool) -> Self {
        self.clip = clip;
        self
    }

    pub fn with_simplify(mut self, tolerance: f64, algorithm: SimplifyAlgorithm) -> Self {
        self.simplify_tolerance = tolerance;
        self.simplify_algorithm = algorithm;
        self
    }

    pub fn with_smooth(mut self, smooth: f64) -> Self {
        self.smooth = smooth;
        self
    }

    pub fn with_size(mut self, width: Option<f64>, height: Option<f64>) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_image_transform(mut self, tr: DAffine2) -> Self {
        self.image_transform = Some(tr);
        self
    }

    pub fn with_geometry_transform(mut self, tr: DAffine2) -> Self {
        self.geometry_transform = Some(tr);
        self
    }

    pub fn with_placement(mut self, placement: MarkerPlacement) -> Self {
        self.placement = placement;
        self
    }

    pub fn with_allow_overlap(mut self, allow: bool) -> Self {
        self.allow_overlap = allow;
        self
    }
}

#[cfg(test)]
mod tests {
    use glam::DVec2;

    use super::*;
    use crate::geometry::VertexPath;
    use crate::render::PlacementFinder;
    use crate::symbolizer::properties::PropertyValue;

    #[test]
    fn defaults_match_unset_symbolizer() {
        let params =
            SymbolizerParams::resolve(&MarkersSymbolizer::new(), &Feature::new(1), &Attributes::new(), 1.0)
                .unwrap();
        assert_eq!(params, SymbolizerParams::default());
        assert!(params.clip);
        assert_eq!(params.file, "shape://ellipse");
        assert!(!params.has_explicit_size());
    }

    #[test]
    fn resolves_explicit_values() {
        let sym = MarkersSymbolizer::new()
            .with(Key::File, "icons/pin.svg")
            .with(Key::Clip, false)
            .with(Key::Offset, -2.5)
            .with(Key::Placement, "line")
            .with(Key::SimplifyAlgorithm, "douglas-peucker")
            .with(Key::Height, PropertyValue::attribute("h"))
            .with_transform(Key::GeometryTransform, "translate(1, 2)")
            .unwrap();
        let feature = Feature::new(7);
        let params = SymbolizerParams::resolve(&sym, &feature, &Attributes::new(), 2.0).unwrap();

        assert_eq!(params.file, "icons/pin.svg");
        assert!(!params.clip);
        assert_eq!(params.offset, -2.5);
        assert_eq!(params.placement, MarkerPlacement::Line);
        assert_eq!(params.simplify_algorithm, SimplifyAlgorithm::DouglasPeucker);
        // Key present but attribute missing: explicit, evaluates to zero.
        assert_eq!(params.height, Some(0.0));
        assert_eq!(params.width, None);
        assert_eq!(
            params.geometry_transform.unwrap().translation,
            DVec2::new(2.0, 4.0)
        );
    }

    #[test]
    fn unparseable_placement_is_fatal() {
        let sym = MarkersSymbolizer::new().with(Key::Placement, "diagonal");
        assert!(SymbolizerParams::resolve(&sym, &Feature::new(1), &Attributes::new(), 1.0).is_err());
    }

    #[test]
    fn sub_pixel_spacing_falls_back_to_default() {
        let sym = MarkersSymbolizer::new()
            .with(Key::Placement, "line")
            .with(Key::Spacing, 0.001);
        let params = SymbolizerParams::resolve(&sym, &Feature::new(1), &Attributes::new(), 1.0).unwrap();
        assert_eq!(params.spacing, DEFAULT_SPACING);

        let line = VertexPath::line_string([[0.0, 0.0], [1000.0, 0.0]]);
        let slots = PlacementFinder::new(params.placement, params.spacing, params.max_error).find(&line);
        assert_eq!(slots.len(), 10);
    }

    #[test]
    fn builders_set_fields() {
        let tr = DAffine2::from_translation(DVec2::new(3.0, 0.0));
        let params = SymbolizerParams::default()
            .with_file("pin.png")
            .with_image_transform(tr)
            .with_geometry_transform(tr)
            .with_allow_overlap(true);
        assert_eq!(params.file, "pin.png");
        assert_eq!(params.image_transform, Some(tr));
        assert_eq!(params.geometry_transform, Some(tr));
        assert!(params.allow_overlap);
    }
}
