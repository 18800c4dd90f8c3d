//! Symbolizer property storage and per-feature resolution.
//!
//! A [`MarkersSymbolizer`] maps [`Key`]s to [`PropertyValue`]s. Values are literals, references to
//! feature attributes, references to render-wide variables, or transform lists. Typed access goes
//! through [`MarkersSymbolizer::get`] and [`MarkersSymbolizer::get_optional`], which evaluate the
//! property against a feature and convert it with [`FromValue`].
use std::collections::HashMap;
use std::fmt;

use crate::error::{Error, Result};
use crate::geometry::{Attributes, Feature, Value};
use crate::render::{MarkerPlacement, MultiPolicy};
use crate::symbolizer::color::Color;
use crate::symbolizer::transform_expr::TransformList;
use crate::transform::SimplifyAlgorithm;

/// Default marker when no `file` is set.
pub const DEFAULT_MARKER: &str = "shape://ellipse";

/// Property keys understood by the markers symbolizer.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    File,
    Clip,
    Offset,
    SimplifyTolerance,
    SimplifyAlgorithm,
    Smooth,
    GeometryTransform,
    ImageTransform,
    Width,
    Height,
    Fill,
    FillOpacity,
    Stroke,
    StrokeWidth,
    StrokeOpacity,
    Opacity,
    AllowOverlap,
    IgnorePlacement,
    Placement,
    Spacing,
    MaxError,
    MultiPolicy,
}

impl Key {
    pub fn name(&self) -> &'static str {
        match self {
            Key::File => "file",
            Key::Clip => "clip",
            Key::Offset => "offset",
            Key::SimplifyTolerance => "simplify-tolerance",
            Key::SimplifyAlgorithm => "simplify-algorithm",
            Key::Smooth => "smooth",
            Key::GeometryTransform => "geometry-transform",
            Key::ImageTransform => "transform",
            Key::Width => "width",
            Key::Height => "height",
            Key::Fill => "fill",
            Key::FillOpacity => "fill-opacity",
            Key::Stroke => "stroke",
            Key::StrokeWidth => "stroke-width",
            Key::StrokeOpacity => "stroke-opacity",
            Key::Opacity => "opacity",
            Key::AllowOverlap => "allow-overlap",
            Key::IgnorePlacement => "ignore-placement",
            Key::Placement => "placement",
            Key::Spacing => "spacing",
            Key::MaxError => "max-error",
            Key::MultiPolicy => "multi-policy",
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An unevaluated property.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Literal(Value),
    /// Reads the named feature attribute.
    Attribute(String),
    /// Reads the named render-wide variable.
    Variable(String),
    Transform(TransformList),
}

impl PropertyValue {
    pub fn attribute(name: impl Into<String>) -> Self {
        PropertyValue::Attribute(name.into())
    }

    pub fn variable(name: impl Into<String>) -> Self {
        PropertyValue::Variable(name.into())
    }

    fn evaluate(&self, feature: &Feature, vars: &Attributes) -> Value {
        match self {
            PropertyValue::Literal(v) => v.clone(),
            PropertyValue::Attribute(name) => feature.get(name).cloned().unwrap_or_default(),
            PropertyValue::Variable(name) => vars.get(name).cloned().unwrap_or_default(),
            PropertyValue::Transform(list) => Value::String(list.to_string()),
        }
    }
}

macro_rules! literal_property {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for PropertyValue {
                fn from(value: $ty) -> Self {
                    PropertyValue::Literal(value.into())
                }
            }
        )*
    };
}

literal_property!(Value, bool, i64, f64, &str, String);

impl From<Color> for PropertyValue {
    fn from(value: Color) -> Self {
        PropertyValue::Literal(Value::String(value.to_string()))
    }
}

impl From<TransformList> for PropertyValue {
    fn from(value: TransformList) -> Self {
        PropertyValue::Transform(value)
    }
}

/// Conversion from a resolved [`Value`]; `None` means the value has the wrong type.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.to_f64()
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        value.to_bool()
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.to_string())
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

macro_rules! from_value_via_str {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::String(s) => s.parse().ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

from_value_via_str!(Color, SimplifyAlgorithm, MarkerPlacement, MultiPolicy);

/// Markers symbolizer: a bag of properties evaluated per feature.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default)]
pub struct MarkersSymbolizer {
    properties: HashMap<Key, PropertyValue>,
}

impl MarkersSymbolizer {
    pub fn new() -> Self {
        Self {
            properties: HashMap::new(),
        }
    }

    /// Builder-style [`MarkersSymbolizer::set`].
    pub fn with(mut self, key: Key, value: impl Into<PropertyValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Parses `expr` as a transform list and stores it under `key`.
    pub fn with_transform(mut self, key: Key, expr: &str) -> Result<Self> {
        let list: TransformList = expr.parse()?;
        self.set(key, list);
        Ok(self)
    }

    pub fn set(&mut self, key: Key, value: impl Into<PropertyValue>) {
        self.properties.insert(key, value.into());
    }

    pub fn remove(&mut self, key: Key) -> Option<PropertyValue> {
        self.properties.remove(&key)
    }

    /// Returns `true` if `key` was set explicitly, whatever it evaluates to.
    pub fn has_key(&self, key: Key) -> bool {
        self.properties.contains_key(&key)
    }

    /// Evaluates `key`, returning `default` when unset or null.
    pub fn get<T: FromValue>(
        &self,
        key: Key,
        feature: &Feature,
        vars: &Attributes,
        default: T,
    ) -> Result<T> {
        Ok(self.get_optional(key, feature, vars)?.unwrap_or(default))
    }

    /// Evaluates `key`, returning `None` when unset or null.
    ///
    /// A value of the wrong type is an error.
    pub fn get_optional<T: FromValue>(
        &self,
        key: Key,
        feature: &Feature,
        vars: &Attributes,
    ) -> Result<Option<T>> {
        let Some(property) = self.properties.get(&key) else {
            return Ok(None);
        };
        if let PropertyValue::Transform(_) = property {
            return Err(Error::property(
                key.name(),
                "transform lists are only valid for transform keys",
            ));
        }
        let value = property.evaluate(feature, vars);
        if value.is_null() {
            return Ok(None);
        }
        T::from_value(&value).map(Some).ok_or_else(|| {
            Error::property(
                key.name(),
                format!("cannot convert '{value}' to {}", std::any::type_name::<T>()),
            )
        })
    }

    /// The transform list stored under `key`, if any.
    pub fn transform(&self, key: Key) -> Option<&TransformList> {
        match self.properties.get(&key) {
            Some(PropertyValue::Transform(list)) => Some(list),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_falls_back_to_default() {
        let sym = MarkersSymbolizer::new();
        let feature = Feature::new(1);
        let vars = Attributes::new();
        assert_eq!(sym.get(Key::Offset, &feature, &vars, 1.5).unwrap(), 1.5);
        assert!(!sym.has_key(Key::Offset));
    }

    #[test]
    fn attribute_and_variable_references_resolve() {
        let sym = MarkersSymbolizer::new()
            .with(Key::Width, PropertyValue::attribute("size"))
            .with(Key::Fill, PropertyValue::variable("accent"));
        let feature = Feature::new(1).with_attribute("size", 12.0);
        let mut vars = Attributes::new();
        vars.insert("accent".into(), "#ff0000".into());

        let width: f64 = sym.get(Key::Width, &feature, &vars, 0.0).unwrap();
        assert_eq!(width, 12.0);
        let fill: Option<Color> = sym.get_optional(Key::Fill, &feature, &vars).unwrap();
        assert_eq!(fill, Some(Color::rgb(255, 0, 0)));
    }

    #[test]
    fn missing_attribute_is_treated_as_unset() {
        let sym = MarkersSymbolizer::new().with(Key::Width, PropertyValue::attribute("size"));
        let width: Option<f64> = sym
            .get_optional(Key::Width, &Feature::new(1), &Attributes::new())
            .unwrap();
        assert_eq!(width, None);
        assert!(sym.has_key(Key::Width));
    }

    #[test]
    fn wrong_type_is_an_error() {
        let sym = MarkersSymbolizer::new().with(Key::Offset, "wide");
        let err = sym
            .get::<f64>(Key::Offset, &Feature::new(1), &Attributes::new(), 0.0)
            .unwrap_err();
        assert!(matches!(err, Error::Property { ref key, .. } if key == "offset"));
    }

    #[test]
    fn transforms_are_stored_parsed() {
        let sym = MarkersSymbolizer::new()
            .with_transform(Key::ImageTransform, "rotate(45)")
            .unwrap();
        assert!(sym.transform(Key::ImageTransform).is_some());
        assert!(sym.transform(Key::GeometryTransform).is_none());
        assert!(MarkersSymbolizer::new()
            .with_transform(Key::ImageTransform, "rotate(")
            .is_err());
    }
}
