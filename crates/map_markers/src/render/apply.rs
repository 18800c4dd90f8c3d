//! Runs a transform chain over every placement geometry of a feature.
use std::fmt;
use std::str::FromStr;

use tracing::trace;

use crate::error::Error;
use crate::geometry::{Feature, VertexPath};
use crate::render::VertexSink;
use crate::transform::TransformChain;

/// How features with several geometries are handled.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MultiPolicy {
    /// Every geometry is placed on its own.
    #[default]
    Each,
    /// All geometries are merged into one path.
    Whole,
    /// Only the geometry with the largest bounding box.
    Largest,
}

impl FromStr for MultiPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "each" => Ok(MultiPolicy::Each),
            "whole" => Ok(MultiPolicy::Whole),
            "largest" => Ok(MultiPolicy::Largest),
            other => Err(Error::property(
                "multi-policy",
                format!("unknown multi policy '{other}'"),
            )),
        }
    }
}

impl fmt::Display for MultiPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MultiPolicy::Each => "each",
            MultiPolicy::Whole => "whole",
            MultiPolicy::Largest => "largest",
        })
    }
}

/// Feeds the placement geometries of `feature` through `chain` into `sink`.
pub fn apply_markers_multi(
    feature: &Feature,
    chain: &TransformChain,
    sink: &mut dyn VertexSink,
    policy: MultiPolicy,
) {
    match feature.geometries() {
        [] => trace!("Feature {} has no geometry.", feature.id),
        [single] => chain.process(&single.path, sink),
        many => match policy {
            MultiPolicy::Each => {
                for geometry in many {
                    chain.process(&geometry.path, sink);
                }
            }
            MultiPolicy::Whole => {
                let mut merged = VertexPath::new();
                for geometry in many {
                    merged.extend(geometry.path.clone());
                }
                chain.process(&merged, sink);
            }
            MultiPolicy::Largest => {
                if let Some(largest) = many
                    .iter()
                    .max_by(|a, b| a.bounding_box().area().total_cmp(&b.bounding_box().area()))
                {
                    chain.process(&largest.path, sink);
                }
            }
        },
    }
}
