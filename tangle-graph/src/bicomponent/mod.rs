//! Biconnected components of the undirected simple graph underlying a component.

use crate::Topology;
use itertools::Itertools;
use log::debug;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

#[cfg(test)]
mod tests;

// ----------------------------------------------------------------------------
// Simple Graph
// ----------------------------------------------------------------------------

/// The undirected simple graph of a component.
///
/// Self-loops are dropped and parallel or antiparallel edges are merged.
/// Node weights are node positions in the component, edge weights the
/// positions of the original edges a simple edge stands for.
#[derive(Clone, Debug, Default)]
pub struct SimpleGraph {
    pub graph: UnGraph<usize, Vec<usize>>,
}

impl SimpleGraph {
    pub fn new(node_count: usize, topology: &Topology) -> Self {
        let edge_count = topology.endpoints.len();
        let mut graph: UnGraph<usize, Vec<usize>> = UnGraph::with_capacity(node_count, edge_count);
        (0..node_count).for_each(|n| {
            graph.add_node(n);
        });
        for (edge, &(source, target)) in topology.endpoints.iter().enumerate() {
            if source == target {
                continue;
            }
            let (a, b) = (NodeIndex::new(source.min(target)), NodeIndex::new(source.max(target)));
            match graph.find_edge(a, b) {
                Some(ix) => graph[ix].push(edge),
                None => {
                    graph.add_edge(a, b, vec![edge]);
                }
            }
        }
        SimpleGraph { graph }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns the end nodes of simple edge `edge`, smaller first.
    pub fn endpoints(&self, edge: usize) -> (usize, usize) {
        let e = &self.graph.raw_edges()[edge];
        (e.source().index(), e.target().index())
    }

    /// Returns the original edges merged into simple edge `edge`.
    pub fn originals(&self, edge: usize) -> &[usize] {
        &self.graph.raw_edges()[edge].weight
    }

    /// Returns `(neighbor, simple edge)` pairs for every node.
    pub fn adjacency(&self) -> Vec<Vec<(usize, usize)>> {
        let mut adjacency = vec![Vec::new(); self.node_count()];
        for e in self.graph.edge_references() {
            let (u, v, id) = (e.source().index(), e.target().index(), e.id().index());
            adjacency[u].push((v, id));
            adjacency[v].push((u, id));
        }
        adjacency
    }

    /// Split the graph into its biconnected components.
    ///
    /// A bridge is a bicomponent of its own with two nodes and one edge.
    /// Isolated nodes belong to no bicomponent.
    ///
    /// ```rust
    /// use tangle_graph::AssemblyGraph;
    /// use tangle_graph::bicomponent::SimpleGraph;
    /// // two triangles sharing node c
    /// let edges = [("a", "b"), ("b", "c"), ("c", "a"), ("c", "d"), ("d", "e"), ("e", "c")];
    /// let graph = AssemblyGraph::from(edges);
    /// let component = &graph.components()[0];
    /// let simple = SimpleGraph::new(component.node_count(), &component.topology()?);
    /// let block_cut = simple.block_cut();
    /// assert_eq!(block_cut.bicomponents.len(), 2);
    /// assert_eq!(block_cut.articulation_points, [2]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn block_cut(&self) -> BlockCut {
        let blocks = lowpoints(&self.adjacency());
        let mut bicomponents = blocks
            .components
            .into_iter()
            .map(|edges| {
                let nodes = edges
                    .iter()
                    .flat_map(|&e| {
                        let (u, v) = self.endpoints(e);
                        [u, v]
                    })
                    .sorted()
                    .dedup()
                    .collect_vec();
                let edges = edges.into_iter().sorted().collect_vec();
                Bicomponent { id: 0, nodes, edges }
            })
            .collect_vec();
        bicomponents.sort_by(|a, b| b.nodes.len().cmp(&a.nodes.len()).then(a.nodes.cmp(&b.nodes)));
        bicomponents.iter_mut().enumerate().for_each(|(i, b)| b.id = i + 1);
        debug!(
            "Found {} bicomponents and {} articulation points.",
            bicomponents.len(),
            blocks.articulation_points.len()
        );
        BlockCut { bicomponents, articulation_points: blocks.articulation_points }
    }
}

// ----------------------------------------------------------------------------
// Bicomponents
// ----------------------------------------------------------------------------

/// A maximal biconnected subgraph of a [`SimpleGraph`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Bicomponent {
    /// 1-based, largest bicomponent first.
    pub id: usize,
    /// Node positions, sorted.
    pub nodes: Vec<usize>,
    /// Simple edge positions, sorted.
    pub edges: Vec<usize>,
}

impl Bicomponent {
    /// Returns true if the bicomponent is a single edge.
    pub fn is_bridge(&self) -> bool {
        self.edges.len() == 1
    }
}

/// The bicomponents of a graph and the nodes they share.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct BlockCut {
    pub bicomponents: Vec<Bicomponent>,
    /// Nodes whose removal disconnects the graph, sorted.
    pub articulation_points: Vec<usize>,
}

/// Edge groups and cut vertices found by one low-point search.
pub(crate) struct Lowpoints {
    pub components: Vec<Vec<usize>>,
    pub articulation_points: Vec<usize>,
}

const UNSEEN: usize = usize::MAX;

/// Iterative Hopcroft-Tarjan low-point search over `(neighbor, edge)` adjacency lists.
///
/// Edges are grouped into biconnected components with an edge stack, so
/// parallel edges between two nodes land in the same group.
pub(crate) fn lowpoints(adjacency: &[Vec<(usize, usize)>]) -> Lowpoints {
    let n = adjacency.len();
    let mut discovered = vec![UNSEEN; n];
    let mut low = vec![0; n];
    let mut is_cut = vec![false; n];
    let mut time = 0;
    let mut edge_stack: Vec<usize> = Vec::new();
    let mut components = Vec::new();

    for root in 0..n {
        if discovered[root] != UNSEEN {
            continue;
        }
        discovered[root] = time;
        low[root] = time;
        time += 1;
        let mut root_children = 0;
        // (node, edge it was reached by, next adjacency position)
        let mut frames: Vec<(usize, Option<usize>, usize)> = vec![(root, None, 0)];

        while let Some(frame) = frames.last_mut() {
            let (v, parent_edge) = (frame.0, frame.1);
            if let Some(&(w, e)) = adjacency[v].get(frame.2) {
                frame.2 += 1;
                if Some(e) == parent_edge {
                    continue;
                }
                if discovered[w] == UNSEEN {
                    edge_stack.push(e);
                    discovered[w] = time;
                    low[w] = time;
                    time += 1;
                    frames.push((w, Some(e), 0));
                } else if discovered[w] < discovered[v] {
                    edge_stack.push(e);
                    low[v] = low[v].min(discovered[w]);
                }
                continue;
            }

            frames.pop();
            let Some(&(u, _, _)) = frames.last() else { continue };
            low[u] = low[u].min(low[v]);
            if low[v] >= discovered[u] {
                match u == root {
                    true => root_children += 1,
                    false => is_cut[u] = true,
                }
                let mut component = Vec::new();
                while let Some(e) = edge_stack.pop() {
                    component.push(e);
                    if Some(e) == parent_edge {
                        break;
                    }
                }
                components.push(component);
            }
        }
        if root_children >= 2 {
            is_cut[root] = true;
        }
    }

    let articulation_points = is_cut.iter().positions(|c| *c).collect();
    Lowpoints { components, articulation_points }
}
