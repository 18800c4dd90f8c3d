//! Symbolizer style overrides for vector markers.
use crate::error::Result;
use crate::geometry::{Attributes, Feature};
use crate::marker::PathAttributes;
use crate::symbolizer::properties::{Key, MarkersSymbolizer};
use crate::symbolizer::Color;

/// Copies `src` into `dst`, applying the symbolizer's fill and stroke overrides.
///
/// Returns `false` and leaves `dst` untouched when the symbolizer sets none of `fill`,
/// `fill-opacity`, `stroke`, `stroke-width` or `stroke-opacity`; the caller then renders with the
/// marker's own attributes. Fill overrides only touch subpaths that already have a fill, stroke
/// overrides only those that already have a stroke.
pub fn push_explicit_style(
    src: &[PathAttributes],
    dst: &mut Vec<PathAttributes>,
    sym: &MarkersSymbolizer,
    feature: &Feature,
    vars: &Attributes,
) -> Result<bool> {
    let fill: Option<Color> = sym.get_optional(Key::Fill, feature, vars)?;
    let fill_opacity: Option<f64> = sym.get_optional(Key::FillOpacity, feature, vars)?;
    let stroke: Option<Color> = sym.get_optional(Key::Stroke, feature, vars)?;
    let stroke_width: Option<f64> = sym.get_optional(Key::StrokeWidth, feature, vars)?;
    let stroke_opacity: Option<f64> = sym.get_optional(Key::StrokeOpacity, feature, vars)?;

    if fill.is_none()
        && fill_opacity.is_none()
        && stroke.is_none()
        && stroke_width.is_none()
        && stroke_opacity.is_none()
    {
        return Ok(false);
    }

    dst.extend(src.iter().map(|attr| {
        let mut out = attr.clone();
        if out.fill_flag {
            if let Some(color) = fill {
                out.fill = color;
            }
            if let Some(opacity) = fill_opacity {
                out.fill_opacity = opacity;
            }
        }
        if out.stroke_flag {
            if let Some(color) = stroke {
                out.stroke = color;
            }
            if let Some(width) = stroke_width {
                out.stroke_width = width;
            }
            if let Some(opacity) = stroke_opacity {
                out.stroke_opacity = opacity;
            }
        }
        out
    }));
    Ok(true)
}
