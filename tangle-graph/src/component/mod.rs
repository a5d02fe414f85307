use crate::{Edge, Node};
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use itertools::Itertools;
use log::debug;
use petgraph::unionfind::UnionFind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;


// ----------------------------------------------------------------------------
// Assembly Graph
// ----------------------------------------------------------------------------

/// A whole assembly graph, as parsed from an input file.
///
/// Nodes are kept in input order, which is the order every later stage uses
/// to break ties.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct AssemblyGraph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl<I, S> From<I> for AssemblyGraph
where
    I: IntoIterator<Item = (S, S)>,
    S: Into<String>,
{
    /// Returns an [`AssemblyGraph`] built from `(source, target)` pairs.
    ///
    /// Nodes are created in the order they are first seen and edges are named `e0`, `e1`, ...
    ///
    /// ```rust
    /// use tangle_graph::AssemblyGraph;
    /// let graph = AssemblyGraph::from([("1", "2"), ("2", "3")]);
    /// assert_eq!(graph.nodes.len(), 3);
    /// assert_eq!(graph.edges[1].id, "e1");
    /// ```
    fn from(pairs: I) -> Self {
        let mut graph = AssemblyGraph::new();
        for (i, (source, target)) in pairs.into_iter().enumerate() {
            let (source, target) = (source.into(), target.into());
            [&source, &target].into_iter().for_each(|id| {
                if !graph.nodes.iter().any(|n| &n.id == id) {
                    graph.nodes.push(Node::new(id.clone()));
                }
            });
            graph.edges.push(Edge::new(format!("e{i}"), source, target));
        }
        graph
    }
}

impl AssemblyGraph {
    /// Returns a new empty [`AssemblyGraph`].
    pub fn new() -> Self {
        AssemblyGraph::default()
    }

    /// Read an [`AssemblyGraph`] from a JSON file.
    pub fn read(path: &Path) -> Result<Self, Report> {
        let input = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read assembly graph: {path:?}."))?;
        let graph = serde_json::from_str(&input)
            .wrap_err_with(|| format!("Failed to parse assembly graph: {path:?}."))
            .suggestion("The graph must be a JSON object with `nodes` and `edges` arrays.")?;
        Ok(graph)
    }

    /// Write the [`AssemblyGraph`] to a JSON file.
    pub fn write(&self, path: &Path) -> Result<(), Report> {
        let output = serde_json::to_string_pretty(self)
            .wrap_err("Failed to serialize assembly graph.")?;
        std::fs::write(path, output).wrap_err(format!("Failed to write assembly graph: {path:?}"))?;
        Ok(())
    }

    /// Split the graph into weakly connected [`Component`]s.
    ///
    /// Components are sorted largest first (by node count, then edge count)
    /// and given a 1-based size rank. An edge that names a missing node stays
    /// with the component of the endpoint that does exist, so that
    /// [`Component::topology`] can report it. Edges with no existing endpoint
    /// at all are gathered into one trailing component without nodes.
    ///
    /// ```rust
    /// use tangle_graph::AssemblyGraph;
    /// let graph = AssemblyGraph::from([("1", "2"), ("3", "4"), ("4", "5")]);
    /// let components = graph.components();
    /// assert_eq!(components.len(), 2);
    /// assert_eq!(components[0].rank, 1);
    /// assert_eq!(components[0].node_count(), 3);
    /// assert_eq!(components[1].nodes[0].id, "1");
    /// ```
    pub fn components(&self) -> Vec<Component> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut uf = UnionFind::new(self.nodes.len());
        for (i, node) in self.nodes.iter().enumerate() {
            // repeated ids share a component so the duplicate is reported there
            let first = *index.entry(node.id.as_str()).or_insert(i);
            uf.union(first, i);
        }

        let mut orphans = Vec::new();
        let mut edge_owner = Vec::with_capacity(self.edges.len());
        for (i, edge) in self.edges.iter().enumerate() {
            let source = index.get(edge.source.as_str()).copied();
            let target = index.get(edge.target.as_str()).copied();
            match (source, target) {
                (Some(s), Some(t)) => {
                    uf.union(s, t);
                    edge_owner.push((i, s));
                }
                (Some(n), None) | (None, Some(n)) => edge_owner.push((i, n)),
                (None, None) => orphans.push(i),
            }
        }

        // component root -> (node indices, edge indices)
        let mut groups: BTreeMap<usize, (Vec<usize>, Vec<usize>)> = BTreeMap::new();
        (0..self.nodes.len()).for_each(|i| groups.entry(uf.find(i)).or_default().0.push(i));
        edge_owner.into_iter().for_each(|(e, n)| groups.entry(uf.find(n)).or_default().1.push(e));

        let mut groups = groups.into_values().collect_vec();
        groups.sort_by(|(n1, e1), (n2, e2)| {
            n2.len().cmp(&n1.len()).then(e2.len().cmp(&e1.len())).then(n1.first().cmp(&n2.first()))
        });
        if !orphans.is_empty() {
            groups.push((Vec::new(), orphans));
        }

        let components = groups
            .into_iter()
            .enumerate()
            .map(|(i, (nodes, edges))| Component {
                rank: i + 1,
                nodes: nodes.into_iter().map(|n| self.nodes[n].clone()).collect(),
                edges: edges.into_iter().map(|e| self.edges[e].clone()).collect(),
            })
            .collect_vec();
        debug!("Found {} weakly connected components.", components.len());
        components
    }
}

// ----------------------------------------------------------------------------
// Component
// ----------------------------------------------------------------------------

/// One weakly connected [`Component`] of an [`AssemblyGraph`].
///
/// Node and edge positions inside the component (`usize`) are the handles
/// used by every decomposition stage.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Component {
    /// 1-based size rank, 1 being the largest component.
    pub rank: usize,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Validated connectivity of a [`Component`], by node and edge position.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Topology {
    /// `(source, target)` node positions of every edge.
    pub endpoints: Vec<(usize, usize)>,
}

impl Component {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns the position of the node named `id`.
    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    /// Check ids and endpoints, and return the [`Topology`] of the component.
    ///
    /// ## Errors
    ///
    /// - A node or edge id that is not unique.
    /// - An edge whose source or target is not a node of this component.
    ///
    /// ```rust
    /// use tangle_graph::{AssemblyGraph, Edge};
    /// let mut graph = AssemblyGraph::from([("1", "2")]);
    /// graph.edges.push(Edge::new("bad", "2", "9"));
    /// let component = &graph.components()[0];
    /// let error = component.topology().unwrap_err().to_string();
    /// assert!(error.contains("bad"));
    /// assert!(error.contains("component 1"));
    /// ```
    pub fn topology(&self) -> Result<Topology, Report> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        for (i, node) in self.nodes.iter().enumerate() {
            if index.insert(node.id.as_str(), i).is_some() {
                return Err(eyre!("Duplicate node {:?} in component {}.", node.id, self.rank));
            }
        }
        if let Some(edge) = self.edges.iter().duplicates_by(|e| e.id.as_str()).next() {
            return Err(eyre!("Duplicate edge {:?} in component {}.", edge.id, self.rank));
        }

        let mut topology = Topology { endpoints: Vec::with_capacity(self.edges.len()) };
        for edge in &self.edges {
            let lookup = |id: &str| {
                index.get(id).copied().ok_or_else(|| {
                    let (edge, rank) = (&edge.id, self.rank);
                    eyre!("Edge {edge:?} in component {rank} references missing node {id:?}.")
                        .suggestion("Every edge source and target must be listed under nodes.")
                })
            };
            let (source, target) = (lookup(&edge.source)?, lookup(&edge.target)?);
            topology.endpoints.push((source, target));
        }
        Ok(topology)
    }
}
