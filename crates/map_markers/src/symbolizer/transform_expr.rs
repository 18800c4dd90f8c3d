//! SVG-style transform lists, e.g. `"translate(0, -5) rotate([heading]) scale(2)"`.
//!
//! Arguments are numbers or feature attribute references in square brackets. The list is parsed
//! once when the symbolizer is built and evaluated per feature into a [`DAffine2`].
use std::fmt;
use std::str::FromStr;

use glam::{DAffine2, DVec2};

use crate::error::{Error, Result};
use crate::geometry::{Attributes, Feature};

/// A transform argument: a literal or an attribute of the feature being rendered.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum TransformArg {
    Number(f64),
    Attribute(String),
}

impl TransformArg {
    fn evaluate(&self, feature: &Feature, vars: &Attributes) -> Result<f64> {
        match self {
            TransformArg::Number(n) => Ok(*n),
            TransformArg::Attribute(name) => feature
                .get(name)
                .or_else(|| vars.get(name))
                .and_then(|v| v.to_f64())
                .ok_or_else(|| {
                    Error::Transform(format!("attribute '{name}' is missing or not numeric"))
                }),
        }
    }
}

impl fmt::Display for TransformArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformArg::Number(n) => write!(f, "{n}"),
            TransformArg::Attribute(name) => write!(f, "[{name}]"),
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum TransformNode {
    Matrix([TransformArg; 6]),
    Translate(TransformArg, Option<TransformArg>),
    Scale(TransformArg, Option<TransformArg>),
    /// Angle in degrees, optional rotation center.
    Rotate(TransformArg, Option<(TransformArg, TransformArg)>),
    SkewX(TransformArg),
    SkewY(TransformArg),
}

impl TransformNode {
    /// Evaluates the node. Translations are multiplied by `scale_factor`.
    fn evaluate(&self, feature: &Feature, vars: &Attributes, scale_factor: f64) -> Result<DAffine2> {
        let eval = |a: &TransformArg| a.evaluate(feature, vars);
        let m = match self {
            TransformNode::Matrix(args) => {
                let mut v = [0.0; 6];
                for (slot, arg) in v.iter_mut().zip(args) {
                    *slot = eval(arg)?;
                }
                v[4] *= scale_factor;
                v[5] *= scale_factor;
                DAffine2::from_cols_array(&v)
            }
            TransformNode::Translate(tx, ty) => {
                let tx = eval(tx)?;
                let ty = ty.as_ref().map(eval).transpose()?.unwrap_or(0.0);
                DAffine2::from_translation(DVec2::new(tx, ty) * scale_factor)
            }
            TransformNode::Scale(sx, sy) => {
                let sx = eval(sx)?;
                let sy = sy.as_ref().map(eval).transpose()?.unwrap_or(sx);
                DAffine2::from_scale(DVec2::new(sx, sy))
            }
            TransformNode::Rotate(angle, center) => {
                let rotation = DAffine2::from_angle(eval(angle)?.to_radians());
                match center {
                    Some((cx, cy)) => {
                        let c = DVec2::new(eval(cx)?, eval(cy)?) * scale_factor;
                        DAffine2::from_translation(c) * rotation * DAffine2::from_translation(-c)
                    }
                    None => rotation,
                }
            }
            TransformNode::SkewX(angle) => {
                let t = eval(angle)?.to_radians().tan();
                DAffine2::from_cols(DVec2::X, DVec2::new(t, 1.0), DVec2::ZERO)
            }
            TransformNode::SkewY(angle) => {
                let t = eval(angle)?.to_radians().tan();
                DAffine2::from_cols(DVec2::new(1.0, t), DVec2::Y, DVec2::ZERO)
            }
        };
        Ok(m)
    }
}

/// An ordered transform list. The rightmost node is applied to coordinates first.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransformList {
    pub nodes: Vec<TransformNode>,
}

impl TransformList {
    pub fn new(nodes: Vec<TransformNode>) -> Self {
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn evaluate(&self, feature: &Feature, vars: &Attributes, scale_factor: f64) -> Result<DAffine2> {
        let mut tr = DAffine2::IDENTITY;
        for node in &self.nodes {
            tr = tr * node.evaluate(feature, vars, scale_factor)?;
        }
        Ok(tr)
    }
}

impl FromStr for TransformList {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Parser::new(s).parse()
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn skip_separators(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        self.pos += rest.len() - trimmed.len();
    }

    fn error(&self, what: &str) -> Error {
        Error::Transform(format!("{what} at offset {} in '{}'", self.pos, self.src))
    }

    fn parse(mut self) -> Result<TransformList> {
        let mut nodes = Vec::new();
        loop {
            self.skip_separators();
            if self.rest().is_empty() {
                return Ok(TransformList::new(nodes));
            }
            nodes.push(self.node()?);
        }
    }

    fn node(&mut self) -> Result<TransformNode> {
        let rest = self.rest();
        let name_len = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let name = &rest[..name_len];
        self.pos += name_len;
        self.skip_whitespace();
        if !self.rest().starts_with('(') {
            return Err(self.error("expected '('"));
        }
        self.pos += 1;
        let args = self.args()?;
        let count = args.len();
        let mut it = args.into_iter();
        let node = match (name, count) {
            ("matrix", 6) => {
                let a: Vec<TransformArg> = it.collect();
                TransformNode::Matrix(
                    a.try_into()
                        .map_err(|_| Error::Transform("matrix() needs six arguments".into()))?,
                )
            }
            ("translate", 1 | 2) => TransformNode::Translate(next(&mut it)?, it.next()),
            ("scale", 1 | 2) => TransformNode::Scale(next(&mut it)?, it.next()),
            ("rotate", 1) => TransformNode::Rotate(next(&mut it)?, None),
            ("rotate", 3) => {
                let angle = next(&mut it)?;
                let cx = next(&mut it)?;
                let cy = next(&mut it)?;
                TransformNode::Rotate(angle, Some((cx, cy)))
            }
            ("skewX", 1) => TransformNode::SkewX(next(&mut it)?),
            ("skewY", 1) => TransformNode::SkewY(next(&mut it)?),
            ("matrix" | "translate" | "scale" | "rotate" | "skewX" | "skewY", _) => {
                return Err(Error::Transform(format!(
                    "{name}() does not take {count} arguments"
                )))
            }
            _ => return Err(Error::Transform(format!("unknown transform '{name}'"))),
        };
        Ok(node)
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn args(&mut self) -> Result<Vec<TransformArg>> {
        let mut args = Vec::new();
        loop {
            self.skip_separators();
            let rest = self.rest();
            if let Some(after) = rest.strip_prefix(')') {
                self.pos = self.src.len() - after.len();
                return Ok(args);
            }
            if let Some(attr) = rest.strip_prefix('[') {
                let end = attr.find(']').ok_or_else(|| self.error("unterminated '['"))?;
                args.push(TransformArg::Attribute(attr[..end].to_string()));
                self.pos += end + 2;
                continue;
            }
            let len = rest
                .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E')))
                .unwrap_or(rest.len());
            if len == 0 {
                return Err(self.error("expected a number"));
            }
            let n: f64 = rest[..len]
                .parse()
                .map_err(|_| self.error("invalid number"))?;
            args.push(TransformArg::Number(n));
            self.pos += len;
        }
    }
}

fn next(it: &mut impl Iterator<Item = TransformArg>) -> Result<TransformArg> {
    it.next()
        .ok_or_else(|| Error::Transform("missing argument".into()))
}

impl fmt::Display for TransformList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match node {
                TransformNode::Matrix(a) => write!(
                    f,
                    "matrix({}, {}, {}, {}, {}, {})",
                    a[0], a[1], a[2], a[3], a[4], a[5]
                )?,
                TransformNode::Translate(x, None) => write!(f, "translate({x})")?,
                TransformNode::Translate(x, Some(y)) => write!(f, "translate({x}, {y})")?,
                TransformNode::Scale(x, None) => write!(f, "scale({x})")?,
                TransformNode::Scale(x, Some(y)) => write!(f, "scale({x}, {y})")?,
                TransformNode::Rotate(a, None) => write!(f, "rotate({a})")?,
                TransformNode::Rotate(a, Some((cx, cy))) => write!(f, "rotate({a}, {cx}, {cy})")?,
                TransformNode::SkewX(a) => write!(f, "skewX({a})")?,
                TransformNode::SkewY(a) => write!(f, "skewY({a})")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expr: &str) -> DAffine2 {
        expr.parse::<TransformList>()
            .expect("parses")
            .evaluate(&Feature::new(0), &Attributes::new(), 1.0)
            .expect("evaluates")
    }

    #[test]
    fn parses_and_composes_right_to_left() {
        let tr = eval("translate(10, 0) scale(2)");
        assert_eq!(tr.transform_point2(DVec2::new(1.0, 1.0)), DVec2::new(12.0, 2.0));
    }

    #[test]
    fn rotate_about_center() {
        let tr = eval("rotate(90, 5, 5)");
        assert!(tr
            .transform_point2(DVec2::new(5.0, 5.0))
            .abs_diff_eq(DVec2::new(5.0, 5.0), 1e-9));
        assert!(tr
            .transform_point2(DVec2::new(6.0, 5.0))
            .abs_diff_eq(DVec2::new(5.0, 6.0), 1e-9));
    }

    #[test]
    fn translation_scales_with_scale_factor() {
        let list: TransformList = "translate(3 4)".parse().unwrap();
        let tr = list
            .evaluate(&Feature::new(0), &Attributes::new(), 2.0)
            .unwrap();
        assert_eq!(tr.translation, DVec2::new(6.0, 8.0));
    }

    #[test]
    fn attribute_arguments_read_the_feature() {
        let list: TransformList = "rotate([heading])".parse().unwrap();
        let feature = Feature::new(1).with_attribute("heading", 180.0);
        let tr = list.evaluate(&feature, &Attributes::new(), 1.0).unwrap();
        assert!(tr
            .transform_point2(DVec2::X)
            .abs_diff_eq(DVec2::NEG_X, 1e-9));

        let missing = list.evaluate(&Feature::new(2), &Attributes::new(), 1.0);
        assert!(matches!(missing, Err(Error::Transform(_))));
    }

    #[test]
    fn rejects_bad_input() {
        assert!("rotate(1, 2)".parse::<TransformList>().is_err());
        assert!("spin(3)".parse::<TransformList>().is_err());
        assert!("scale 2".parse::<TransformList>().is_err());
        assert!("translate(1".parse::<TransformList>().is_err());
    }

    #[test]
    fn display_round_trips() {
        let src = "translate(1, 2) rotate(45, [cx], 0) skewX(10)";
        let list: TransformList = src.parse().unwrap();
        assert_eq!(list.to_string().parse::<TransformList>().unwrap(), list);
    }
}
