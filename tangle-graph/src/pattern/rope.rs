use super::{Neighborhood, Shape, Vertex};
use itertools::Itertools;

/// Returns the frayed rope entered through `start`, if there is one.
///
/// `start` must lead to a single middle vertex. The middle vertex must be fed
/// by at least two sources that lead nowhere else, and feed at least two
/// sinks that are reached from nowhere else. Sources, middle and sinks are
/// all distinct and joined by single edges.
pub fn validate<G: Neighborhood>(graph: &G, start: Vertex) -> Option<Shape> {
    let middle = graph.sole_successor(start)?;

    let sources = graph.predecessors(middle);
    let sinks = graph.successors(middle);
    let single_edges = |vs: &[Vertex], degree: usize| {
        vs.len() >= 2 && degree == vs.len() && vs.iter().all_unique()
    };
    if !single_edges(&sources, graph.in_degree(middle))
        || !single_edges(&sinks, graph.out_degree(middle))
    {
        return None;
    }
    let leaves = sources.iter().any(|&s| graph.out_degree(s) != 1);
    let enters = sinks.iter().any(|&t| graph.in_degree(t) != 1);
    if leaves || enters {
        return None;
    }
    if !sources.iter().chain(&sinks).chain([&middle]).all_unique() {
        return None;
    }
    Some(Shape::FrayedRope { sources, middle, sinks })
}
