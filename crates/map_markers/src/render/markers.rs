//! Markers symbolizer rendering: marker resolution, image transform, chain and dispatch.
//!
//! [`render_markers_symbolizer`] evaluates one symbolizer against one feature:
//! 1. resolve the symbolizer properties into [`SymbolizerParams`]
//! 2. resolve the marker through the [`MarkerCache`] (a miss draws nothing)
//! 3. build the image-space transform and the matching dispatch
//! 4. build the [`TransformChain`] and feed every placement geometry through it
//!
//! [`MarkerRenderer`] wraps a validated [`RenderConfig`] and a [`RenderContext`] for rendering many
//! features in a row.
use std::borrow::Cow;
use std::sync::Arc;

use glam::{DAffine2, DVec2};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::geometry::{Attributes, BoundingBox, Feature};
use crate::marker::{shapes, MarkerCache, MarkerData};
use crate::render::apply::apply_markers_multi;
use crate::render::collision::CollisionDetector;
use crate::render::dispatch::{
    DispatchOptions, DispatchOutput, MarkerDispatch, RasterDispatch, RenderStats, VectorDispatch,
};
use crate::render::placement::PlacementFinder;
use crate::render::target::RenderTarget;
use crate::symbolizer::{push_explicit_style, MarkersSymbolizer, SymbolizerParams};
use crate::transform::{ChainContext, IdentityProjection, Projection, TransformChain, ViewTransform};

/// Edge samples per side when back-projecting the clip box.
const CLIP_EDGE_SAMPLES: usize = 8;

/// Configuration for a rendering pass.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Output size in device pixels.
    pub width: u32,
    pub height: u32,
    /// Visible map extent in map coordinates.
    pub extent: BoundingBox,
    /// Multiplier for marker sizes, offsets and line spacing.
    pub scale_factor: f64,
    /// Extra device pixels around the view that survive clipping.
    pub buffer_size: f64,
    /// Projection from feature coordinates to map coordinates.
    pub projection: Arc<dyn Projection>,
}

impl RenderConfig {
    /// Creates a new [`RenderConfig`] for a `width` x `height` view of `extent`.
    pub fn new(width: u32, height: u32, extent: BoundingBox) -> Self {
        Self {
            width,
            height,
            extent,
            scale_factor: 1.0,
            buffer_size: 0.0,
            projection: Arc::new(IdentityProjection),
        }
    }

    /// Sets the scale factor.
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    /// Sets the clip buffer in device pixels.
    pub fn with_buffer_size(mut self, buffer_size: f64) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Sets the feature projection.
    pub fn with_projection(mut self, projection: Arc<dyn Projection>) -> Self {
        self.projection = projection;
        self
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidConfig(
                "width and height must be > 0".into(),
            ));
        }
        if !self.extent.is_valid() || self.extent.area() <= 0.0 {
            return Err(Error::InvalidConfig(
                "extent must be finite with a positive area".into(),
            ));
        }
        if !self.scale_factor.is_finite() || self.scale_factor <= 0.0 {
            return Err(Error::InvalidConfig("scale_factor must be > 0".into()));
        }
        if !self.buffer_size.is_finite() || self.buffer_size < 0.0 {
            return Err(Error::InvalidConfig("buffer_size must be >= 0".into()));
        }
        Ok(())
    }

    pub fn view(&self) -> ViewTransform {
        ViewTransform::new(self.width, self.height, self.extent)
    }

    /// Clip region in feature coordinates: the map extent grown by the buffer, projected back.
    ///
    /// Falls back to the buffered map extent if the projection cannot invert its edges.
    pub fn clip_box(&self) -> BoundingBox {
        let s = self.view().scale();
        let pad = DVec2::new(
            if s.x > 0.0 { self.buffer_size / s.x } else { 0.0 },
            if s.y > 0.0 { self.buffer_size / s.y } else { 0.0 },
        );
        let map_box = BoundingBox {
            min: self.extent.min - pad,
            max: self.extent.max + pad,
        };

        let n = CLIP_EDGE_SAMPLES;
        let edge_points = (0..=n).flat_map(|i| {
            let t = i as f64 / n as f64;
            let x = map_box.min.x + t * map_box.width();
            let y = map_box.min.y + t * map_box.height();
            [
                DVec2::new(x, map_box.min.y),
                DVec2::new(x, map_box.max.y),
                DVec2::new(map_box.min.x, y),
                DVec2::new(map_box.max.x, y),
            ]
        });
        let projected =
            BoundingBox::from_points(edge_points.filter_map(|p| self.projection.backward(p)));
        if projected.is_valid() {
            projected
        } else {
            map_box
        }
    }
}

/// Caller-owned state shared by every symbolizer evaluation of a pass.
pub struct RenderContext<'a> {
    pub cache: &'a mut MarkerCache,
    pub detector: &'a mut dyn CollisionDetector,
    pub target: &'a mut dyn RenderTarget,
    /// Render-wide variables visible to property expressions.
    pub vars: &'a Attributes,
}

/// Scale that maps the marker's natural box onto the explicit width/height.
///
/// Only positive sizes count. A zero natural dimension leaves the marker unscaled.
fn size_scale(params: &SymbolizerParams, natural: &BoundingBox) -> Option<DVec2> {
    let w = params.width.filter(|w| *w > 0.0);
    let h = params.height.filter(|h| *h > 0.0);
    let (bw, bh) = (natural.width(), natural.height());
    match (w, h) {
        (Some(w), Some(h)) if bw > 0.0 && bh > 0.0 => Some(DVec2::new(w / bw, h / bh)),
        (Some(w), None) if bw > 0.0 => Some(DVec2::splat(w / bw)),
        (None, Some(h)) if bh > 0.0 => Some(DVec2::splat(h / bh)),
        _ => None,
    }
}

/// `user * size * scale(scale_factor)`; the user image transform applies last.
fn image_transform(params: &SymbolizerParams, natural: Option<&BoundingBox>, scale_factor: f64) -> DAffine2 {
    let mut tr = DAffine2::from_scale(DVec2::splat(scale_factor));
    if let Some(scale) = natural.and_then(|bbox| size_scale(params, bbox)) {
        tr = DAffine2::from_scale(scale) * tr;
    }
    if let Some(user) = params.image_transform {
        tr = user * tr;
    }
    tr
}

/// Renders `sym` for `feature` into `ctx`.
///
/// A missing marker is not an error: nothing is drawn and empty stats are returned. Property and
/// asset failures abort the pass.
pub fn render_markers_symbolizer(
    sym: &MarkersSymbolizer,
    feature: &Feature,
    config: &RenderConfig,
    ctx: &mut RenderContext<'_>,
) -> Result<RenderStats> {
    let params = SymbolizerParams::resolve(sym, feature, ctx.vars, config.scale_factor)?;

    if params.file.is_empty() {
        debug!("Feature {} has an empty marker file; skipping.", feature.id);
        return Ok(RenderStats::default());
    }
    let Some(marker) = ctx.cache.find(&params.file, true)? else {
        debug!("Marker '{}' not found; skipping feature {}.", params.file, feature.id);
        return Ok(RenderStats::default());
    };
    let snap_to_pixels = !ctx.cache.is_uri(&params.file);

    let view = config.view();
    let chain = TransformChain::for_symbolizer(
        &ChainContext {
            clip_box: config.clip_box(),
            projection: Arc::clone(&config.projection),
            view: &view,
            scale_factor: config.scale_factor,
        },
        &params,
        feature.geometry_type(),
    );
    let options = DispatchOptions {
        finder: PlacementFinder::new(
            params.placement,
            params.spacing * config.scale_factor,
            params.max_error,
        ),
        opacity: params.opacity,
        allow_overlap: params.allow_overlap,
        ignore_placement: params.ignore_placement,
    };
    let output = DispatchOutput {
        target: &mut *ctx.target,
        detector: &mut *ctx.detector,
    };

    let stats = match marker.data() {
        MarkerData::Vector(vector) => {
            let ellipse_override = params.file == shapes::ELLIPSE && params.has_explicit_size();
            let (path, image_tr) = if ellipse_override {
                (
                    Cow::Owned(shapes::build_ellipse(&params)),
                    image_transform(&params, None, config.scale_factor),
                )
            } else {
                (
                    Cow::Borrowed(&vector.path),
                    image_transform(&params, Some(&marker.bounding_box()), config.scale_factor),
                )
            };

            let mut merged = Vec::new();
            let attributes =
                if push_explicit_style(&vector.attributes, &mut merged, sym, feature, ctx.vars)? {
                    merged.as_slice()
                } else {
                    vector.attributes.as_slice()
                };

            let mut dispatch = MarkerDispatch::Vector(VectorDispatch::new(
                &path,
                attributes,
                image_tr,
                snap_to_pixels,
                options,
                output,
            ));
            apply_markers_multi(feature, &chain, &mut dispatch, params.multi_policy);
            dispatch.stats()
        }
        MarkerData::Raster(_) => {
            let bbox = marker.bounding_box();
            let image_tr = image_transform(&params, Some(&bbox), config.scale_factor);
            let marker_tr = image_tr * DAffine2::from_translation(-bbox.center());

            let mut dispatch = MarkerDispatch::Raster(RasterDispatch::new(
                Arc::clone(&marker),
                marker_tr,
                options,
                output,
            ));
            apply_markers_multi(feature, &chain, &mut dispatch, params.multi_policy);
            dispatch.stats()
        }
    };
    Ok(stats)
}

/// Renders many features against one validated configuration.
pub struct MarkerRenderer<'a> {
    /// Configuration applied to every feature.
    pub config: RenderConfig,
    ctx: RenderContext<'a>,
}

impl<'a> MarkerRenderer<'a> {
    pub fn try_new(config: RenderConfig, ctx: RenderContext<'a>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, ctx })
    }

    /// Renders `sym` for a single feature.
    pub fn render(&mut self, sym: &MarkersSymbolizer, feature: &Feature) -> Result<RenderStats> {
        render_markers_symbolizer(sym, feature, &self.config, &mut self.ctx)
    }

    /// Renders `sym` for every feature, stopping at the first fatal error.
    pub fn render_all<'f>(
        &mut self,
        sym: &MarkersSymbolizer,
        features: impl IntoIterator<Item = &'f Feature>,
    ) -> Result<RenderStats> {
        let mut total = RenderStats::default();
        let mut count = 0usize;
        for feature in features {
            total.merge(self.render(sym, feature)?);
            count += 1;
        }
        info!(
            "Rendered {} markers for {} features ({} slots, {} collided).",
            total.rendered, count, total.slots, total.collided
        );
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use super::*;
    use crate::geometry::Geometry;
    use crate::marker::{Marker, RasterImage};
    use crate::render::collision::BoxDetector;
    use crate::render::target::{RecordingTarget, RenderCommand};
    use crate::symbolizer::{Color, Key, PropertyValue};
    use crate::transform::WebMercator;

    fn config() -> RenderConfig {
        RenderConfig::new(256, 256, BoundingBox::new(0.0, 0.0, 256.0, 256.0))
    }

    fn render(
        sym: &MarkersSymbolizer,
        feature: &Feature,
        config: &RenderConfig,
        cache: &mut MarkerCache,
    ) -> (Result<RenderStats>, Vec<RenderCommand>) {
        let mut target = RecordingTarget::new();
        let mut detector = BoxDetector::default();
        let vars = Attributes::new();
        let mut ctx = RenderContext {
            cache,
            detector: &mut detector,
            target: &mut target,
            vars: &vars,
        };
        let result = render_markers_symbolizer(sym, feature, config, &mut ctx);
        (result, target.into_inner())
    }

    fn point_feature(x: f64, y: f64) -> Feature {
        Feature::new(1).with_geometry(Geometry::point(x, y))
    }

    #[test]
    fn missing_marker_draws_nothing() {
        let mut cache = MarkerCache::new();
        for file in ["", "shape://star", "icons/missing.svg"] {
            let sym = MarkersSymbolizer::new().with(Key::File, file);
            let (result, commands) = render(&sym, &point_feature(10.0, 10.0), &config(), &mut cache);
            assert_eq!(result.unwrap(), RenderStats::default());
            assert!(commands.is_empty(), "'{file}' must not render");
        }
    }

    #[test]
    fn explicit_ellipse_size_ignores_cached_geometry() {
        let sym = MarkersSymbolizer::new()
            .with(Key::Width, 10.0)
            .with(Key::Height, 20.0);
        for scale in [1.0, 2.0, 3.5] {
            let config = config().with_scale_factor(scale);
            let (result, commands) =
                render(&sym, &point_feature(100.0, 100.0), &config, &mut MarkerCache::new());
            assert_eq!(result.unwrap().rendered, 1);
            let bbox = commands[0].bounding_box();
            assert!((bbox.width() - 10.0 * scale).abs() < 1e-9);
            assert!((bbox.height() - 20.0 * scale).abs() < 1e-9);
        }
    }

    #[test]
    fn default_ellipse_uses_natural_size() {
        let config = config().with_scale_factor(2.0);
        let (_, commands) = render(
            &MarkersSymbolizer::new(),
            &point_feature(100.0, 100.0),
            &config,
            &mut MarkerCache::new(),
        );
        let bbox = commands[0].bounding_box();
        assert_eq!((bbox.width(), bbox.height()), (20.0, 20.0));
    }

    #[test]
    fn general_vector_branch_scales_uniformly_from_one_dimension() {
        let sym = MarkersSymbolizer::new()
            .with(Key::File, shapes::ARROW)
            .with(Key::Width, 20.0);
        let (_, commands) = render(&sym, &point_feature(50.0, 50.0), &config(), &mut MarkerCache::new());
        let bbox = commands[0].bounding_box();
        assert!((bbox.width() - 20.0).abs() < 1e-9);
        assert!((bbox.height() - 16.0).abs() < 1e-9);
    }

    #[test]
    fn builtin_shapes_snap_to_pixels() {
        let (_, commands) = render(
            &MarkersSymbolizer::new(),
            &point_feature(10.3, 20.6),
            &config(),
            &mut MarkerCache::new(),
        );
        let center = commands[0].bounding_box().center();
        assert_eq!(center, DVec2::new(10.0, 235.0));
    }

    #[test]
    fn raster_rotation_keeps_center_fixed() {
        let mut cache = MarkerCache::new();
        cache.insert("pin.png", Marker::raster(RasterImage::solid(8, 4, Color::WHITE)));
        let sym = MarkersSymbolizer::new()
            .with(Key::File, "pin.png")
            .with_transform(Key::ImageTransform, "rotate(90)")
            .unwrap();
        let (result, commands) = render(&sym, &point_feature(40.25, 60.75), &config(), &mut cache);
        assert_eq!(result.unwrap().rendered, 1);

        let RenderCommand::Raster { matrix, marker, .. } = &commands[0] else {
            panic!("expected raster command");
        };
        let center = matrix.transform_point2(marker.bounding_box().center());
        assert!(center.abs_diff_eq(DVec2::new(40.25, 256.0 - 60.75), 1e-9));
        let unrotated = DAffine2::from_angle(-FRAC_PI_2) * *matrix;
        assert!(unrotated.matrix2.abs_diff_eq(glam::DMat2::IDENTITY, 1e-9));
    }

    #[test]
    fn style_overrides_reach_the_target() {
        let sym = MarkersSymbolizer::new()
            .with(Key::Fill, PropertyValue::attribute("color"))
            .with(Key::Opacity, 0.5);
        let feature = point_feature(30.0, 30.0).with_attribute("color", "red");
        let (_, commands) = render(&sym, &feature, &config(), &mut MarkerCache::new());
        let RenderCommand::Vector { attributes, opacity, .. } = &commands[0] else {
            panic!("expected vector command");
        };
        assert_eq!(attributes[0].fill, Color::rgb(255, 0, 0));
        assert_eq!(*opacity, 0.5);
    }

    #[test]
    fn property_errors_are_fatal() {
        let sym = MarkersSymbolizer::new().with(Key::Offset, "wide");
        let (result, commands) = render(&sym, &point_feature(1.0, 1.0), &config(), &mut MarkerCache::new());
        assert!(matches!(result, Err(Error::Property { .. })));
        assert!(commands.is_empty());
    }

    #[test]
    fn markers_along_clipped_line() {
        let sym = MarkersSymbolizer::new()
            .with(Key::File, shapes::ARROW)
            .with(Key::Placement, "line")
            .with(Key::Spacing, 50.0);
        let feature = Feature::new(9).with_geometry(Geometry::line_string([[-500.0, 128.0], [500.0, 128.0]]));
        let (result, commands) = render(&sym, &feature, &config(), &mut MarkerCache::new());
        let stats = result.unwrap();
        // Clipped to 256 px: markers at 25, 75, ..., 225.
        assert_eq!(stats.rendered, 5);
        for cmd in &commands {
            let c = cmd.bounding_box().center();
            assert!((0.0..=256.0).contains(&c.x));
        }
    }

    #[test]
    fn config_validation() {
        assert!(config().validate().is_ok());
        assert!(config().with_scale_factor(0.0).validate().is_err());
        assert!(config().with_buffer_size(-1.0).validate().is_err());
        assert!(RenderConfig::new(0, 10, BoundingBox::new(0.0, 0.0, 1.0, 1.0))
            .validate()
            .is_err());
        assert!(RenderConfig::new(10, 10, BoundingBox::new(0.0, 0.0, 0.0, 1.0))
            .validate()
            .is_err());
    }

    #[test]
    fn clip_box_is_back_projected() {
        let half = 20_037_508.342_789_244;
        let mercator = RenderConfig::new(256, 256, BoundingBox::new(-half, -half, half, half))
            .with_projection(Arc::new(WebMercator))
            .with_buffer_size(0.0);
        let clip = mercator.clip_box();
        assert!((clip.min.x + 180.0).abs() < 1e-6);
        assert!((clip.max.x - 180.0).abs() < 1e-6);
        assert!((clip.max.y - WebMercator::MAX_LATITUDE).abs() < 1e-6);

        let buffered = config().with_buffer_size(16.0).clip_box();
        assert_eq!(buffered, BoundingBox::new(-16.0, -16.0, 272.0, 272.0));
    }

    #[test]
    fn renderer_accumulates_collisions_across_features() {
        let mut cache = MarkerCache::new();
        let mut target = RecordingTarget::new();
        let mut detector = BoxDetector::new(BoundingBox::new(0.0, 0.0, 256.0, 256.0));
        let vars = Attributes::new();
        let mut renderer = MarkerRenderer::try_new(
            config(),
            RenderContext {
                cache: &mut cache,
                detector: &mut detector,
                target: &mut target,
                vars: &vars,
            },
        )
        .unwrap();

        let features = [point_feature(50.0, 50.0), point_feature(52.0, 50.0), point_feature(150.0, 50.0)];
        let stats = renderer.render_all(&MarkersSymbolizer::new(), &features).unwrap();
        assert_eq!(stats.rendered, 2);
        assert_eq!(stats.collided, 1);
        assert_eq!(target.len(), 2);
    }

    #[test]
    fn renderer_rejects_invalid_config() {
        let mut cache = MarkerCache::new();
        let mut target = RecordingTarget::new();
        let mut detector = BoxDetector::default();
        let vars = Attributes::new();
        let result = MarkerRenderer::try_new(
            config().with_scale_factor(-1.0),
            RenderContext {
                cache: &mut cache,
                detector: &mut detector,
                target: &mut target,
                vars: &vars,
            },
        );
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }
}
