use std::path::Path;
use std::sync::Arc;

use glam::{DAffine2, DVec2};
use image::{Rgba, RgbaImage};
use map_markers::prelude::*;
use tracing::{debug, info};

/// Installs a compact stderr subscriber for the example binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .init();
}

/// Marker loader reading PNG files from disk.
///
/// A missing file is reported as `Ok(None)` so the symbolizer skips the marker.
pub fn load_png_marker(id: &str) -> map_markers::error::Result<Option<Marker>> {
    let path = Path::new(id);
    if !path.is_file() {
        debug!("Marker file '{}' not found", id);
        return Ok(None);
    }
    let img = image::open(path)
        .map_err(|e| e.to_string())?
        .to_rgba8();
    let (w, h) = img.dimensions();
    let raster = RasterImage::from_rgba_bytes(w, h, img.as_raw())?;
    Ok(Some(Marker::raster(raster)))
}

/// Software [`RenderTarget`] painting into an RGBA image.
///
/// Fills use the even-odd rule sampled at pixel centers. Strokes are stamped per segment. Raster
/// markers are resampled with nearest-neighbour lookup through the inverse marker matrix.
pub struct PngTarget {
    image: RgbaImage,
}

impl PngTarget {
    pub fn new(width: u32, height: u32, background: [u8; 3]) -> Self {
        let [r, g, b] = background;
        Self {
            image: RgbaImage::from_pixel(width, height, Rgba([r, g, b, 255])),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Draws a polyline in device space, e.g. to show the geometry markers were placed on.
    pub fn draw_path(&mut self, path: &VertexPath, color: [u8; 3], width: f64) {
        let [r, g, b] = color;
        self.stroke(path, 0..path.subpaths.len(), Color::rgb(r, g, b), width, 1.0);
    }

    pub fn save_png(&self, out: impl AsRef<Path>) -> anyhow::Result<()> {
        let out = out.as_ref();
        self.image.save(out)?;
        info!("Saved {}", out.display());
        Ok(())
    }

    fn blend(&mut self, x: i64, y: i64, color: Color, alpha: f64) {
        if x < 0 || y < 0 || x >= self.image.width() as i64 || y >= self.image.height() as i64 {
            return;
        }
        let a = (color.alpha() * alpha).clamp(0.0, 1.0);
        if a <= 0.0 {
            return;
        }
        let dst = self.image.get_pixel_mut(x as u32, y as u32);
        let src = [color.r, color.g, color.b];
        for (d, s) in dst.0.iter_mut().zip(src) {
            *d = (*d as f64 * (1.0 - a) + s as f64 * a).round() as u8;
        }
        dst.0[3] = 255;
    }

    fn fill(&mut self, path: &VertexPath, range: std::ops::Range<usize>, color: Color, alpha: f64) {
        let Some(subpaths) = path.subpaths.get(range) else {
            return;
        };
        let bbox = BoundingBox::from_points(subpaths.iter().flat_map(|s| s.points.iter().copied()));
        if !bbox.is_valid() {
            return;
        }
        let y0 = bbox.min.y.floor().max(0.0) as i64;
        let y1 = bbox.max.y.ceil().min(self.image.height() as f64) as i64;
        let mut crossings = Vec::new();
        for y in y0..y1 {
            let sy = y as f64 + 0.5;
            crossings.clear();
            for subpath in subpaths.iter().filter(|s| s.len() > 2) {
                let n = subpath.points.len();
                for i in 0..n {
                    let a = subpath.points[i];
                    let b = subpath.points[(i + 1) % n];
                    if (a.y <= sy) != (b.y <= sy) {
                        crossings.push(a.x + (sy - a.y) / (b.y - a.y) * (b.x - a.x));
                    }
                }
            }
            crossings.sort_by(f64::total_cmp);
            for span in crossings.chunks_exact(2) {
                let x0 = (span[0] - 0.5).ceil() as i64;
                let x1 = (span[1] - 0.5).floor() as i64;
                for x in x0..=x1 {
                    self.blend(x, y, color, alpha);
                }
            }
        }
    }

    fn stroke(
        &mut self,
        path: &VertexPath,
        range: std::ops::Range<usize>,
        color: Color,
        width: f64,
        alpha: f64,
    ) {
        let Some(subpaths) = path.subpaths.get(range) else {
            return;
        };
        let half = (width * 0.5).max(0.5);
        for subpath in subpaths {
            for (a, b) in subpath.segments() {
                let lo = a.min(b) - DVec2::splat(half);
                let hi = a.max(b) + DVec2::splat(half);
                for y in lo.y.floor() as i64..=hi.y.ceil() as i64 {
                    for x in lo.x.floor() as i64..=hi.x.ceil() as i64 {
                        let p = DVec2::new(x as f64 + 0.5, y as f64 + 0.5);
                        if segment_distance(p, a, b) <= half {
                            self.blend(x, y, color, alpha);
                        }
                    }
                }
            }
        }
    }
}

fn segment_distance(p: DVec2, a: DVec2, b: DVec2) -> f64 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

impl RenderTarget for PngTarget {
    fn render_vector(
        &mut self,
        path: &VertexPath,
        attributes: &[PathAttributes],
        matrix: &DAffine2,
        opacity: f64,
    ) {
        let device = path.transformed(matrix);
        // Stroke widths follow the marker's average scale.
        let scale = matrix.matrix2.determinant().abs().sqrt();
        for attr in attributes.iter().filter(|a| !a.is_invisible()) {
            let base = attr.opacity * opacity;
            if attr.fill_flag {
                self.fill(&device, attr.subpaths.clone(), attr.fill, base * attr.fill_opacity);
            }
            if attr.stroke_flag && attr.stroke_width > 0.0 {
                self.stroke(
                    &device,
                    attr.subpaths.clone(),
                    attr.stroke,
                    attr.stroke_width * scale,
                    base * attr.stroke_opacity,
                );
            }
        }
    }

    fn render_raster(&mut self, marker: &Arc<Marker>, matrix: &DAffine2, opacity: f64) {
        let Some(bitmap) = marker.bitmap_data() else {
            return;
        };
        if matrix.matrix2.determinant() == 0.0 {
            return;
        }
        let inverse = matrix.inverse();
        let bbox = marker.bounding_box().transformed(matrix);
        let x0 = bbox.min.x.floor().max(0.0) as i64;
        let y0 = bbox.min.y.floor().max(0.0) as i64;
        let x1 = bbox.max.x.ceil().min(self.image.width() as f64) as i64;
        let y1 = bbox.max.y.ceil().min(self.image.height() as f64) as i64;
        for y in y0..y1 {
            for x in x0..x1 {
                let src = inverse.transform_point2(DVec2::new(x as f64 + 0.5, y as f64 + 0.5));
                if let Some([r, g, b, a]) = bitmap.pixel(src.x.floor() as i64, src.y.floor() as i64)
                {
                    self.blend(x, y, Color::rgba(r, g, b, a), opacity);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_square_marker() {
        let mut target = PngTarget::new(8, 8, [0, 0, 0]);
        let path = VertexPath::polygon([[2.0, 2.0], [6.0, 2.0], [6.0, 6.0], [2.0, 6.0]]);
        let attr = PathAttributes::new(0..1).with_fill(Color::WHITE);
        target.render_vector(&path, &[attr], &DAffine2::IDENTITY, 1.0);
        assert_eq!(target.image().get_pixel(3, 3).0, [255, 255, 255, 255]);
        assert_eq!(target.image().get_pixel(7, 7).0, [0, 0, 0, 255]);
    }

    #[test]
    fn blits_raster_through_matrix() {
        let mut target = PngTarget::new(8, 8, [0, 0, 0]);
        let marker = Arc::new(Marker::raster(RasterImage::solid(2, 2, Color::rgb(255, 0, 0))));
        target.render_raster(&marker, &DAffine2::from_translation(DVec2::new(4.0, 4.0)), 1.0);
        assert_eq!(target.image().get_pixel(4, 4).0, [255, 0, 0, 255]);
        assert_eq!(target.image().get_pixel(3, 3).0, [0, 0, 0, 255]);
    }

    #[test]
    fn missing_png_is_not_an_error() {
        assert!(load_png_marker("does/not/exist.png").unwrap().is_none());
    }
}
