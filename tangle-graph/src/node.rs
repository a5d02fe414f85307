use serde::{Deserialize, Serialize};

/// Strand of a sequence [`Node`] in a bidirected assembly graph.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Orientation {
    #[default]
    #[serde(rename = "+")]
    Forward,
    #[serde(rename = "-")]
    Reverse,
}

/// A sequence [`Node`] of an assembly graph.
///
/// Only the `id` is required. The other attributes are read and written
/// back with the graph but play no part in the decomposition.
///
/// ```rust
/// use tangle_graph::{Node, Orientation};
/// let node: Node = serde_json::from_str(r#"{"id": "40", "length": 1200, "orientation": "-"}"#)?;
/// assert_eq!(node.id, "40");
/// assert_eq!(node.length, 1200);
/// assert_eq!(node.orientation, Some(Orientation::Reverse));
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Node {
    /// Stable, unique name of the node within its graph.
    pub id: String,
    /// Sequence length in base pairs.
    #[serde(default)]
    pub length: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gc_content: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_repeat: Option<bool>,
}

impl Node {
    /// Returns a new [`Node`] with `id` and no sequence attributes.
    pub fn new(id: impl Into<String>) -> Self {
        Node { id: id.into(), ..Default::default() }
    }
}
