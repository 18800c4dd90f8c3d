use std::f64::consts::TAU;

use glam::DVec2;
use map_markers::prelude::*;
use map_markers_examples::{init_tracing, load_png_marker, PngTarget};

fn main() -> anyhow::Result<()> {
    init_tracing();
    let image_size = (600, 600);
    let extent = BoundingBox::new(-300.0, -300.0, 300.0, 300.0);

    // An optional PNG path on the command line replaces the generated pointer.
    let file = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "generated://pointer".to_string());

    let mut cache = MarkerCache::with_loader(load_png_marker);
    cache.insert("generated://pointer", Marker::raster(pointer(24, 12)?));

    // Concentric circles; markers follow each ring's direction.
    let features: Vec<Feature> = [80.0, 160.0, 240.0]
        .into_iter()
        .enumerate()
        .map(|(i, r)| {
            let ring: Vec<DVec2> = (0..=96)
                .map(|k| DVec2::from_angle(k as f64 / 96.0 * TAU) * r)
                .collect();
            Feature::new(i as u64).with_geometry(Geometry::line_string(ring))
        })
        .collect();

    let sym = MarkersSymbolizer::new()
        .with(Key::File, file.as_str())
        .with(Key::Placement, "line")
        .with(Key::Spacing, 40.0)
        .with(Key::Opacity, 0.9)
        .with(Key::AllowOverlap, true);

    let config = RenderConfig::new(image_size.0, image_size.1, extent);
    let mut target = PngTarget::new(image_size.0, image_size.1, [20, 24, 32]);
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
    let stats = renderer.render_all(&sym, &features)?;
    drop(renderer);
    anyhow::ensure!(stats.rendered > 0, "marker '{file}' produced no output");

    target.save_png("raster-marker-rotation.png")?;
    Ok(())
}

/// A right-pointing wedge fading from white to orange.
fn pointer(width: u32, height: u32) -> map_markers::error::Result<RasterImage> {
    let mut pixels = Vec::with_capacity((width * height) as usize);
    let half = height as f64 / 2.0;
    for y in 0..height {
        for x in 0..width {
            let t = x as f64 / width as f64;
            let dy = (y as f64 + 0.5 - half).abs();
            let inside = dy <= half * (1.0 - t);
            let g = (255.0 - 120.0 * t) as u8;
            let b = (255.0 - 220.0 * t) as u8;
            pixels.push(if inside { [255, g, b, 255] } else { [0, 0, 0, 0] });
        }
    }
    RasterImage::new(width, height, pixels)
}
