//! Validators for the structural patterns of an assembly graph.
//!
//! Every validator asks one question: "is there a pattern of this kind
//! starting at vertex `v`?" The answer is a [`Shape`] naming the members
//! and boundary of the candidate. [`detect`] runs the validators over the
//! whole graph in a fixed priority order and keeps only candidates that do
//! not overlap anything accepted before them.

use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use strum::{EnumIter, IntoEnumIterator};

mod bubble;
mod chain;
mod rope;

#[cfg(test)]
mod tests;

// ----------------------------------------------------------------------------
// Vertex
// ----------------------------------------------------------------------------

/// A vertex of the graph being decomposed: either an original sequence node
/// or a pattern that has been collapsed into a single vertex.
///
/// The derived ordering (nodes by input position, then patterns by creation
/// order) is the scan order of every detection pass.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Vertex {
    Node(usize),
    Pattern(usize),
}

impl Display for Vertex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Vertex::Node(i) => write!(f, "n{i}"),
            Vertex::Pattern(i) => write!(f, "p{i}"),
        }
    }
}

// ----------------------------------------------------------------------------
// Pattern Kind
// ----------------------------------------------------------------------------

/// The kinds of structural pattern, declared in detection priority order.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, EnumIter, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PatternKind {
    Bubble,
    FrayedRope,
    Chain,
    CyclicChain,
}

impl PatternKind {
    /// Returns the candidate of this kind rooted at `start`, if there is one.
    ///
    /// The chain validator may answer with a [`Shape::CyclicChain`] when the
    /// walk closes back on its start.
    pub fn validate<G: Neighborhood>(&self, graph: &G, start: Vertex) -> Option<Shape> {
        match self {
            PatternKind::Bubble => bubble::validate(graph, start),
            PatternKind::FrayedRope => rope::validate(graph, start),
            PatternKind::Chain => chain::validate(graph, start),
            PatternKind::CyclicChain => chain::validate_cycle(graph, start),
        }
    }
}

// ----------------------------------------------------------------------------
// Shape
// ----------------------------------------------------------------------------

/// The members and boundary of one detected pattern.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Shape {
    /// Two or more node-disjoint paths from `source` that reconverge at `sink`.
    /// Each path lists its interior vertices, and is empty for a direct edge.
    Bubble { source: Vertex, sink: Vertex, paths: Vec<Vec<Vertex>> },
    /// Several `sources` funnelling through one `middle` vertex into several `sinks`.
    FrayedRope { sources: Vec<Vertex>, middle: Vertex, sinks: Vec<Vertex> },
    /// An unbranched path.
    Chain { path: Vec<Vertex> },
    /// An unbranched cycle, listed from the vertex it was found at.
    CyclicChain { path: Vec<Vertex> },
}

impl Shape {
    pub fn kind(&self) -> PatternKind {
        match self {
            Shape::Bubble { .. } => PatternKind::Bubble,
            Shape::FrayedRope { .. } => PatternKind::FrayedRope,
            Shape::Chain { .. } => PatternKind::Chain,
            Shape::CyclicChain { .. } => PatternKind::CyclicChain,
        }
    }

    /// Returns every member vertex, boundary included, in a stable order.
    pub fn members(&self) -> Vec<Vertex> {
        match self {
            Shape::Bubble { source, sink, paths } => std::iter::once(*source)
                .chain(paths.iter().flatten().copied())
                .chain([*sink])
                .collect(),
            Shape::FrayedRope { sources, middle, sinks } => {
                sources.iter().copied().chain([*middle]).chain(sinks.iter().copied()).collect()
            }
            Shape::Chain { path } | Shape::CyclicChain { path } => path.clone(),
        }
    }

    /// Returns the vertices where the pattern is entered.
    pub fn sources(&self) -> Vec<Vertex> {
        match self {
            Shape::Bubble { source, .. } => vec![*source],
            Shape::FrayedRope { sources, .. } => sources.clone(),
            Shape::Chain { path } | Shape::CyclicChain { path } => {
                path.first().copied().into_iter().collect()
            }
        }
    }

    /// Returns the vertices where the pattern is left.
    pub fn sinks(&self) -> Vec<Vertex> {
        match self {
            Shape::Bubble { sink, .. } => vec![*sink],
            Shape::FrayedRope { sinks, .. } => sinks.clone(),
            Shape::Chain { path } | Shape::CyclicChain { path } => {
                path.last().copied().into_iter().collect()
            }
        }
    }

    /// Returns the `(source, target)` pairs the pattern is made of.
    ///
    /// Any other edge between two members runs against the pattern, like the
    /// closing edge of a cycle or a sink-to-source back-edge of a bubble.
    pub fn forward_edges(&self) -> HashSet<(Vertex, Vertex)> {
        match self {
            Shape::Bubble { source, sink, paths } => paths
                .iter()
                .flat_map(|p| {
                    std::iter::once(*source).chain(p.iter().copied()).chain([*sink]).tuple_windows()
                })
                .collect(),
            Shape::FrayedRope { sources, middle, sinks } => sources
                .iter()
                .map(|s| (*s, *middle))
                .chain(sinks.iter().map(|t| (*middle, *t)))
                .collect(),
            Shape::Chain { path } | Shape::CyclicChain { path } => {
                path.iter().copied().tuple_windows().collect()
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Neighborhood
// ----------------------------------------------------------------------------

/// The view of a directed graph the validators need.
///
/// Degrees ignore self-loops and edges flagged as duplicates of another
/// edge, but do count genuine parallel edges. A vertex may report a degree
/// larger than its neighbor list, when part of its branching is hidden
/// inside it.
pub trait Neighborhood {
    /// All vertices, sorted ascending.
    fn vertices(&self) -> Vec<Vertex>;
    /// Targets of the counted out-edges of `v`, sorted, repeated for parallel edges.
    fn successors(&self, v: Vertex) -> Vec<Vertex>;
    /// Sources of the counted in-edges of `v`, sorted, repeated for parallel edges.
    fn predecessors(&self, v: Vertex) -> Vec<Vertex>;

    fn out_degree(&self, v: Vertex) -> usize {
        self.successors(v).len()
    }
    fn in_degree(&self, v: Vertex) -> usize {
        self.predecessors(v).len()
    }

    /// Returns the one vertex `v` leads to, if its out-degree is exactly one.
    fn sole_successor(&self, v: Vertex) -> Option<Vertex> {
        match self.out_degree(v) {
            1 => self.successors(v).first().copied(),
            _ => None,
        }
    }

    /// Returns the one vertex leading to `v`, if its in-degree is exactly one.
    fn sole_predecessor(&self, v: Vertex) -> Option<Vertex> {
        match self.in_degree(v) {
            1 => self.predecessors(v).first().copied(),
            _ => None,
        }
    }
}

// ----------------------------------------------------------------------------
// Detection
// ----------------------------------------------------------------------------

/// Run one detection round over `graph`.
///
/// Kinds are tried in priority order ([`PatternKind::iter`]) and, within a
/// kind, candidate start vertices are tried in ascending order. A candidate
/// is accepted only if none of its members belongs to a candidate accepted
/// earlier in the round, so the returned shapes are pairwise disjoint.
pub fn detect<G: Neighborhood>(graph: &G) -> Vec<Shape> {
    let vertices = graph.vertices();
    let mut claimed: HashSet<Vertex> = HashSet::new();
    let mut accepted = Vec::new();

    for kind in PatternKind::iter() {
        for &start in &vertices {
            if claimed.contains(&start) {
                continue;
            }
            let Some(shape) = kind.validate(graph, start) else { continue };
            let members = shape.members();
            if let Some(m) = members.iter().find(|m| claimed.contains(m)) {
                debug!("Rejecting {} at {start}: {m} is already claimed.", shape.kind());
                continue;
            }
            debug!("Accepting {} at {start}: {}", shape.kind(), members.iter().join(", "));
            claimed.extend(members);
            accepted.push(shape);
        }
    }
    accepted
}
