//! Markers symbolizer: property storage, per-feature resolution and style overrides.
pub mod color;
pub mod params;
pub mod properties;
pub mod style;
pub mod transform_expr;

pub use color::Color;
pub use params::{SymbolizerParams, DEFAULT_MAX_ERROR, DEFAULT_SPACING};
pub use properties::{FromValue, Key, MarkersSymbolizer, PropertyValue, DEFAULT_MARKER};
pub use style::push_explicit_style;
pub use transform_expr::{TransformArg, TransformList, TransformNode};
