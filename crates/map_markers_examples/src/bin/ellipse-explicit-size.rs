use std::sync::Arc;

use map_markers::prelude::*;
use map_markers_examples::{init_tracing, PngTarget};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn main() -> anyhow::Result<()> {
    init_tracing();
    let image_size = (1024, 512);

    // Features in lon/lat, rendered through Web Mercator onto the whole world.
    let m = WebMercator::EARTH_RADIUS * std::f64::consts::PI;
    let extent = BoundingBox::new(-m, -m / 2.0, m, m / 2.0);

    let mut rng = StdRng::seed_from_u64(7);
    let features: Vec<Feature> = (0..400)
        .map(|i| {
            let lon = unit(&mut rng) * 360.0 - 180.0;
            let lat = unit(&mut rng) * 120.0 - 60.0;
            let population = unit(&mut rng).powi(3) * 1000.0;
            Feature::new(i)
                .with_geometry(Geometry::point(lon, lat))
                .with_attribute("size", 4.0 + population.sqrt())
        })
        .collect();

    // Only the width is read from each feature, so every marker is a circle of that diameter.
    let sym = MarkersSymbolizer::new()
        .with(Key::File, "shape://ellipse")
        .with(Key::Width, PropertyValue::attribute("size"))
        .with(Key::Fill, Color::rgb(70, 160, 230))
        .with(Key::FillOpacity, 0.6)
        .with(Key::Stroke, Color::WHITE)
        .with(Key::StrokeWidth, 1.0);

    let config = RenderConfig::new(image_size.0, image_size.1, extent)
        .with_projection(Arc::new(WebMercator))
        .with_buffer_size(8.0);
    let mut cache = MarkerCache::new();
    let mut target = PngTarget::new(image_size.0, image_size.1, [18, 18, 22]);
    let mut detector = BoxDetector::new(BoundingBox::new(
        0.0,
        0.0,
        image_size.0 as f64,
        image_size.1 as f64,
    ));
    let vars = Attributes::new();
    let ctx = RenderContext {
        cache: &mut cache,
        detector: &mut detector,
        target: &mut target,
        vars: &vars,
    };
    let mut renderer = MarkerRenderer::try_new(config, ctx)?;
    renderer.render_all(&sym, &features)?;
    drop(renderer);

    target.save_png("ellipse-explicit-size.png")?;
    Ok(())
}

fn unit(rng: &mut StdRng) -> f64 {
    (rng.next_u64() >> 11) as f64 / (1u64 << 53) as f64
}
