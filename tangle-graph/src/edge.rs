use serde::{Deserialize, Serialize};

/// Which sides of the two sequences a link joins.
///
/// The first symbol is the strand of the source, the second the strand of
/// the target, as in a GFA `L` line.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum LinkOrientation {
    #[serde(rename = "++")]
    ForwardForward,
    #[serde(rename = "+-")]
    ForwardReverse,
    #[serde(rename = "-+")]
    ReverseForward,
    #[serde(rename = "--")]
    ReverseReverse,
}

/// A directed [`Edge`] between two sequence nodes, referenced by node id.
///
/// Parallel edges and self-loops are allowed.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Edge {
    /// Stable, unique name of the edge within its graph.
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplicity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<LinkOrientation>,
    /// Mean insert distance, for scaffold-style links.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdev: Option<f64>,
}

impl Edge {
    /// Returns a new [`Edge`] from `source` to `target` with no link attributes.
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Edge { id: id.into(), source: source.into(), target: target.into(), ..Default::default() }
    }
}
