//! Geometry primitives shared by the transform chain, markers and dispatch.
pub mod bbox;
pub mod feature;
pub mod path;

pub use bbox::BoundingBox;
pub use feature::{Attributes, Feature, Geometry, GeometryType, Value};
pub use path::{PathCommand, SubPath, VertexPath};
