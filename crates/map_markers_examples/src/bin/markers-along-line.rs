use glam::DVec2;
use map_markers::prelude::*;
use map_markers_examples::{init_tracing, PngTarget};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn main() -> anyhow::Result<()> {
    init_tracing();
    let image_size = (800, 600);
    let extent = BoundingBox::new(0.0, 0.0, 800.0, 600.0);

    // A few smooth random walks as line features.
    let mut rng = StdRng::seed_from_u64(2025);
    let features: Vec<Feature> = (0..4)
        .map(|i| Feature::new(i).with_geometry(random_walk(&mut rng, 60, &extent)))
        .collect();

    // Arrows every 48px, rotated along the line. Colliding arrows are dropped.
    let sym = MarkersSymbolizer::new()
        .with(Key::File, "shape://arrow")
        .with(Key::Placement, "line")
        .with(Key::Spacing, 48.0)
        .with(Key::Width, 14.0)
        .with(Key::Smooth, 0.5)
        .with(Key::Fill, Color::rgb(240, 170, 40));

    let config = RenderConfig::new(image_size.0, image_size.1, extent).with_buffer_size(16.0);
    let view = config.view();
    let mut target = PngTarget::new(image_size.0, image_size.1, [26, 26, 26]);
    for feature in &features {
        for geometry in feature.geometries() {
            target.draw_path(&geometry.path.transformed(&view.matrix()), [90, 90, 90], 2.0);
        }
    }

    let mut cache = MarkerCache::new();
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

    target.save_png("markers-along-line.png")?;
    Ok(())
}

fn random_walk(rng: &mut StdRng, steps: usize, extent: &BoundingBox) -> Geometry {
    let mut p = DVec2::new(
        extent.min.x + unit(rng) * extent.width(),
        extent.min.y + unit(rng) * extent.height(),
    );
    let mut heading = unit(rng) * std::f64::consts::TAU;
    let mut points = Vec::with_capacity(steps);
    for _ in 0..steps {
        points.push(p);
        heading += (unit(rng) - 0.5) * 0.6;
        p += DVec2::from_angle(heading) * 15.0;
        p = p.clamp(extent.min, extent.max);
    }
    Geometry::line_string(points)
}

fn unit(rng: &mut StdRng) -> f64 {
    (rng.next_u64() >> 11) as f64 / (1u64 << 53) as f64
}
