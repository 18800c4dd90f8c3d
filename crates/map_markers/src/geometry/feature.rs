//! Features: geometry plus attributes, as handed to the symbolizer by a datasource.
use std::collections::HashMap;
use std::fmt;

use crate::geometry::{BoundingBox, VertexPath};

/// Declared type of a placement geometry. Only used to choose the clip stage.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GeometryType {
    Point,
    LineString,
    Polygon,
}

/// One placement geometry in projected (map) coordinates.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    pub kind: GeometryType,
    pub path: VertexPath,
}

impl Geometry {
    pub fn new(kind: GeometryType, path: VertexPath) -> Self {
        Self { kind, path }
    }

    pub fn point(x: f64, y: f64) -> Self {
        Self::new(GeometryType::Point, VertexPath::point([x, y]))
    }

    pub fn line_string<I, P>(points: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<mint::Vector2<f64>>,
    {
        Self::new(GeometryType::LineString, VertexPath::line_string(points))
    }

    pub fn polygon<I, P>(ring: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<mint::Vector2<f64>>,
    {
        Self::new(GeometryType::Polygon, VertexPath::polygon(ring))
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.path.bounding_box()
    }
}

/// A dynamically typed attribute or variable value.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value. Strings are parsed; booleans map to 0/1.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Integer(i) => Some(*i as f64),
            Value::Double(d) => Some(*d),
            Value::String(s) => s.trim().parse().ok(),
        }
    }

    pub fn to_bool(&self) -> Option<bool> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(*b),
            Value::Integer(i) => Some(*i != 0),
            Value::Double(d) => Some(*d != 0.0),
            Value::String(s) => match s.trim() {
                "true" | "on" | "yes" | "1" => Some(true),
                "false" | "off" | "no" | "0" => Some(false),
                _ => None,
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Double(d) => write!(f, "{d}"),
            Value::String(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

/// Named values, used both for feature attributes and for render-wide variables.
pub type Attributes = HashMap<String, Value>;

/// A feature: an id, its placement geometries, and its attributes.
#[non_exhaustive]
#[derive(Clone, Debug, Default)]
pub struct Feature {
    pub id: u64,
    pub geometries: Vec<Geometry>,
    pub attributes: Attributes,
}

impl Feature {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            geometries: Vec::new(),
            attributes: Attributes::new(),
        }
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometries.push(geometry);
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn geometries(&self) -> &[Geometry] {
        &self.geometries
    }

    /// Type of the first geometry, which decides the clip variant for the whole feature.
    pub fn geometry_type(&self) -> Option<GeometryType> {
        self.geometries.first().map(|g| g.kind)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_conversions() {
        assert_eq!(Value::from("2.5").to_f64(), Some(2.5));
        assert_eq!(Value::Integer(3).to_f64(), Some(3.0));
        assert_eq!(Value::from("yes").to_bool(), Some(true));
        assert_eq!(Value::from("maybe").to_bool(), None);
        assert_eq!(Value::Null.to_f64(), None);
    }

    #[test]
    fn feature_reports_first_geometry_type() {
        let feature = Feature::new(1)
            .with_geometry(Geometry::line_string([[0.0, 0.0], [1.0, 1.0]]))
            .with_geometry(Geometry::point(0.0, 0.0))
            .with_attribute("name", "river");
        assert_eq!(feature.geometry_type(), Some(GeometryType::LineString));
        assert_eq!(feature.get("name"), Some(&Value::from("river")));
        assert_eq!(Feature::new(2).geometry_type(), None);
    }
}
