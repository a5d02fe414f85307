//! Hierarchical decomposition of a component into nested patterns.
//!
//! Detection rounds run on a working copy of the component. After each
//! round every accepted pattern is contracted into a single vertex, and the
//! next round runs on the contracted graph, until a round finds nothing.

use crate::pattern::{self, Neighborhood, PatternKind, Shape, Vertex};
use crate::{Component, ToDot};
use color_eyre::eyre::{eyre, ContextCompat, Report, Result};
use itertools::Itertools;
use log::{debug, info};
use petgraph::dot::{Config, Dot};
use petgraph::stable_graph::{EdgeReference, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt::{Display, Formatter};


// ----------------------------------------------------------------------------
// Working Graph
// ----------------------------------------------------------------------------

/// An edge of the [`WorkingGraph`], standing for one original edge.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Link {
    /// Position of the original edge in its component.
    pub edge: usize,
    /// True once a contraction made this edge parallel to an edge of another member.
    pub duplicate: bool,
}

impl Display for Link {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.duplicate {
            true => write!(f, "e{}*", self.edge),
            false => write!(f, "e{}", self.edge),
        }
    }
}

/// The contracted graph a detection round runs on.
///
/// Starts as a copy of the component and shrinks as patterns are collapsed.
/// Original edges are never lost: an edge between two members of a pattern
/// leaves the graph, every other edge is re-attached to the pattern vertex.
#[derive(Clone, Debug)]
pub struct WorkingGraph {
    graph: StableDiGraph<Vertex, Link>,
    index: HashMap<Vertex, NodeIndex>,
    /// Patterns with an edge running against their own direction.
    sealed: HashSet<Vertex>,
}

impl WorkingGraph {
    /// Returns a [`WorkingGraph`] holding every node and edge of `component`.
    pub fn new(component: &Component) -> Result<Self, Report> {
        let topology = component.topology()?;
        let mut graph =
            StableDiGraph::with_capacity(component.node_count(), component.edge_count());
        let index: HashMap<_, _> = (0..component.node_count())
            .map(|n| (Vertex::Node(n), graph.add_node(Vertex::Node(n))))
            .collect();
        for (edge, (source, target)) in topology.endpoints.into_iter().enumerate() {
            let (source, target) = (index[&Vertex::Node(source)], index[&Vertex::Node(target)]);
            graph.add_edge(source, target, Link { edge, duplicate: false });
        }
        Ok(WorkingGraph { graph, index, sealed: HashSet::new() })
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    fn node_index(&self, v: Vertex) -> Result<NodeIndex, Report> {
        self.index
            .get(&v)
            .copied()
            .wrap_err_with(|| format!("Vertex {v} is not in the working graph."))
    }

    fn neighbors(&self, v: Vertex, direction: Direction) -> Vec<Vertex> {
        let Some(&ix) = self.index.get(&v) else { return Vec::new() };
        self.graph
            .edges_directed(ix, direction)
            .filter(|e| !e.weight().duplicate && e.source() != e.target())
            .map(|e| match direction {
                Direction::Outgoing => self.graph[e.target()],
                Direction::Incoming => self.graph[e.source()],
            })
            .sorted()
            .collect()
    }

    fn is_sealed(&self, v: Vertex) -> usize {
        usize::from(self.sealed.contains(&v))
    }
}

impl Neighborhood for WorkingGraph {
    fn vertices(&self) -> Vec<Vertex> {
        self.index.keys().copied().sorted().collect()
    }
    fn successors(&self, v: Vertex) -> Vec<Vertex> {
        self.neighbors(v, Direction::Outgoing)
    }
    fn predecessors(&self, v: Vertex) -> Vec<Vertex> {
        self.neighbors(v, Direction::Incoming)
    }
    // A sealed pattern keeps its hidden branching visible on both sides.
    fn out_degree(&self, v: Vertex) -> usize {
        self.successors(v).len() + self.is_sealed(v)
    }
    fn in_degree(&self, v: Vertex) -> usize {
        self.predecessors(v).len() + self.is_sealed(v)
    }
}

// ----------------------------------------------------------------------------
// Hierarchy
// ----------------------------------------------------------------------------

/// A collapsed [`Pattern`].
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Pattern {
    /// Direct members. A chain that absorbed child chains lists their members in place of them.
    pub shape: Shape,
    /// 1-based detection round the pattern was found in.
    pub round: usize,
    /// Position of the enclosing pattern.
    pub parent: Option<usize>,
    /// True if the pattern was spliced into an enclosing chain and is no longer reported.
    pub absorbed: bool,
    /// True if an edge between two members runs against the pattern.
    pub sealed: bool,
}

impl Pattern {
    pub fn kind(&self) -> PatternKind {
        self.shape.kind()
    }
}

/// The nested patterns of one component.
///
/// Parents are recorded by position: `node_parents[n]` is the pattern
/// directly containing node `n`, `edge_parents[e]` the pattern containing
/// both ends of edge `e`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Hierarchy {
    pub patterns: Vec<Pattern>,
    pub node_parents: Vec<Option<usize>>,
    pub edge_parents: Vec<Option<usize>>,
    /// Edges that run parallel to an edge of another member of a collapsed pattern.
    pub duplicates: Vec<bool>,
    /// Number of rounds that collapsed something.
    pub rounds: usize,
    /// Vertices left once nothing more collapses.
    pub top: Vec<Vertex>,
}

impl Hierarchy {
    /// Returns the patterns still reported, with their positions.
    pub fn reported(&self) -> impl Iterator<Item = (usize, &Pattern)> {
        self.patterns.iter().enumerate().filter(|(_, p)| !p.absorbed)
    }

    /// Returns the positions of every original node inside pattern `id`, at any depth.
    pub fn nodes_within(&self, id: usize) -> Vec<usize> {
        let mut nodes = Vec::new();
        let mut stack = vec![id];
        while let Some(p) = stack.pop() {
            for member in self.patterns[p].shape.members() {
                match member {
                    Vertex::Node(n) => nodes.push(n),
                    Vertex::Pattern(c) => stack.push(c),
                }
            }
        }
        nodes.sort_unstable();
        nodes
    }

    /// Returns the number of reported patterns of each kind.
    pub fn counts(&self) -> HashMap<PatternKind, usize> {
        self.reported().map(|(_, p)| p.kind()).counts()
    }
}

// ----------------------------------------------------------------------------
// Collapser
// ----------------------------------------------------------------------------

/// Repeatedly detects and contracts patterns until none remain.
///
/// ```rust
/// use tangle_graph::{AssemblyGraph, Collapser, PatternKind};
/// let graph = AssemblyGraph::from([("1", "2"), ("1", "3"), ("2", "4"), ("3", "4")]);
/// let mut collapser = Collapser::new(&graph.components()[0])?;
/// collapser.run()?;
/// let hierarchy = collapser.into_hierarchy();
/// assert_eq!(hierarchy.patterns.len(), 1);
/// assert_eq!(hierarchy.patterns[0].kind(), PatternKind::Bubble);
/// assert_eq!(hierarchy.nodes_within(0), [0, 1, 2, 3]);
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
#[derive(Clone, Debug)]
pub struct Collapser {
    graph: WorkingGraph,
    hierarchy: Hierarchy,
    merge_chains: bool,
}

impl Collapser {
    pub fn new(component: &Component) -> Result<Self, Report> {
        let graph = WorkingGraph::new(component)?;
        let hierarchy = Hierarchy {
            node_parents: vec![None; component.node_count()],
            edge_parents: vec![None; component.edge_count()],
            duplicates: vec![false; component.edge_count()],
            top: graph.vertices(),
            ..Default::default()
        };
        Ok(Collapser { graph, hierarchy, merge_chains: true })
    }

    /// Whether a chain containing a collapsed chain takes over its members.
    pub fn merge_chains(mut self, merge_chains: bool) -> Self {
        self.merge_chains = merge_chains;
        self
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    pub fn into_hierarchy(self) -> Hierarchy {
        self.hierarchy
    }

    /// Run detection rounds until one collapses nothing.
    ///
    /// Returns the number of rounds that collapsed something.
    ///
    /// ## Errors
    ///
    /// A round that does not strictly reduce the number of vertices, which
    /// would otherwise loop forever.
    pub fn run(&mut self) -> Result<usize, Report> {
        let mut rounds = 0;
        loop {
            let shapes = pattern::detect(&self.graph);
            if shapes.is_empty() {
                break;
            }
            let round = self.hierarchy.rounds + 1;
            let before = self.graph.vertex_count();
            let found = shapes.len();
            for shape in shapes {
                self.contract(shape, round)?;
            }
            let after = self.graph.vertex_count();
            if after >= before {
                return Err(eyre!(
                    "Round {round} collapsed {found} patterns but did not shrink the graph: \
                     {before} -> {after} vertices."
                ));
            }
            debug!("Round {round}: collapsed {found} patterns, {before} -> {after} vertices.");
            self.hierarchy.rounds = round;
            rounds += 1;
        }
        self.hierarchy.top = self.graph.vertices();
        info!("Collapsed {} patterns in {rounds} rounds.", self.hierarchy.reported().count());
        Ok(rounds)
    }

    /// Contract the members of `shape` into one new pattern vertex, and return its position.
    fn contract(&mut self, shape: Shape, round: usize) -> Result<usize, Report> {
        let id = self.hierarchy.patterns.len();
        let members = shape.members();
        let member_set: HashSet<Vertex> = members.iter().copied().collect();
        let forward = shape.forward_edges();

        // split the edges touching the members into internal and external
        let mut sealed = false;
        let mut external = Vec::new();
        for &member in &members {
            let ix = self.graph.node_index(member)?;
            for e in self.graph.graph.edges_directed(ix, Direction::Outgoing) {
                let (target, link) = (self.graph.graph[e.target()], *e.weight());
                match member_set.contains(&target) {
                    true => {
                        self.hierarchy.edge_parents[link.edge] = Some(id);
                        let against = !forward.contains(&(member, target));
                        if target != member && !link.duplicate && against {
                            sealed = true;
                        }
                    }
                    false => external.push((Direction::Outgoing, member, target, link)),
                }
            }
            for e in self.graph.graph.edges_directed(ix, Direction::Incoming) {
                let source = self.graph.graph[e.source()];
                if !member_set.contains(&source) {
                    external.push((Direction::Incoming, member, source, *e.weight()));
                }
            }
        }

        for &member in &members {
            let ix = self.graph.node_index(member)?;
            self.graph.graph.remove_node(ix);
            self.graph.index.remove(&member);
            self.graph.sealed.remove(&member);
            let parent = match member {
                Vertex::Node(n) => &mut self.hierarchy.node_parents[n],
                Vertex::Pattern(p) => &mut self.hierarchy.patterns[p].parent,
            };
            if let Some(other) = parent.replace(id) {
                return Err(eyre!("Vertex {member} already belongs to pattern {other}."));
            }
        }

        let vertex = Vertex::Pattern(id);
        let ix = self.graph.graph.add_node(vertex);
        self.graph.index.insert(vertex, ix);
        if sealed {
            self.graph.sealed.insert(vertex);
        }

        // edges to the same neighbor from different members are kept but flagged
        let mut owners: HashMap<(Direction, Vertex), Vertex> = HashMap::new();
        for (direction, member, other, mut link) in external {
            if *owners.entry((direction, other)).or_insert(member) != member {
                link.duplicate = true;
                self.hierarchy.duplicates[link.edge] = true;
            }
            let other = self.graph.node_index(other)?;
            match direction {
                Direction::Outgoing => self.graph.graph.add_edge(ix, other, link),
                Direction::Incoming => self.graph.graph.add_edge(other, ix, link),
            };
        }

        let shape = match self.merge_chains {
            true => self.splice_chains(shape, id),
            false => shape,
        };
        debug!("Collapsed {} {id}: {}", shape.kind(), shape.members().iter().join(", "));
        let pattern = Pattern { shape, round, parent: None, absorbed: false, sealed };
        self.hierarchy.patterns.push(pattern);
        Ok(id)
    }

    /// Replace collapsed chains on the path of a new chain by their own members.
    fn splice_chains(&mut self, shape: Shape, id: usize) -> Shape {
        let path = match &shape {
            Shape::Chain { path } | Shape::CyclicChain { path } => path,
            _ => return shape,
        };
        let mut spliced = Vec::with_capacity(path.len());
        for &v in path {
            let child = match v {
                Vertex::Pattern(c) if self.hierarchy.patterns[c].kind() == PatternKind::Chain => c,
                _ => {
                    spliced.push(v);
                    continue;
                }
            };
            spliced.extend(self.hierarchy.patterns[child].shape.members());
            self.hierarchy.patterns[child].absorbed = true;
            self.adopt(child, id);
            debug!("Chain {id} absorbed chain {child}.");
        }
        match shape {
            Shape::CyclicChain { .. } => Shape::CyclicChain { path: spliced },
            _ => Shape::Chain { path: spliced },
        }
    }

    /// Move everything directly inside pattern `from` into pattern `to`.
    fn adopt(&mut self, from: usize, to: usize) {
        let hierarchy = &mut self.hierarchy;
        let parents = hierarchy.node_parents.iter_mut().chain(hierarchy.edge_parents.iter_mut());
        parents.filter(|p| **p == Some(from)).for_each(|p| *p = Some(to));
        hierarchy
            .patterns
            .iter_mut()
            .enumerate()
            .filter(|(i, p)| *i != from && p.parent == Some(from))
            .for_each(|(_, p)| p.parent = Some(to));
    }
}

impl ToDot for Collapser {
    /// Returns the current contracted graph in DOT format, duplicate edges dashed.
    fn to_dot(&self) -> Result<String, Report> {
        let config = &[Config::NodeNoLabel, Config::EdgeNoLabel];
        let edges = |_, e: EdgeReference<'_, Link>| {
            let style = match e.weight().duplicate {
                true => "dashed",
                false => "solid",
            };
            format!("label=\"{}\" style={style} ", e.weight())
        };
        let nodes = |_, (_, vertex): (NodeIndex, &Vertex)| {
            let shape = match vertex {
                Vertex::Node(_) => "ellipse",
                Vertex::Pattern(_) => "box",
            };
            format!("label=\"{vertex}\" shape={shape} ")
        };
        let dot = Dot::with_attr_getters(&self.graph.graph, config, &edges, &nodes).to_string();
        Ok(dot.replace("digraph {", "digraph {\n    rankdir=\"LR\""))
    }
}
