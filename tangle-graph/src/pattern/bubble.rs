use super::{Neighborhood, Shape, Vertex};
use std::collections::HashSet;

/// Returns the bubble whose source is `source`, if there is one.
///
/// Every out-edge of the source starts a path that is followed while its
/// vertices have exactly one way in and one way out. All paths must stop at
/// the same sink, and the sink must have no in-edges besides the paths.
/// Parallel source-to-sink edges make zero-length paths, so a bulge is a
/// bubble too. An edge from the sink back to the source is allowed.
pub fn validate<G: Neighborhood>(graph: &G, source: Vertex) -> Option<Shape> {
    let starts = graph.successors(source);
    if starts.len() < 2 || graph.out_degree(source) != starts.len() {
        return None;
    }

    let mut sink = None;
    let mut paths = Vec::with_capacity(starts.len());
    let mut seen: HashSet<Vertex> = HashSet::from([source]);

    for first in starts {
        let mut interior = Vec::new();
        let mut current = first;
        while current != source && graph.in_degree(current) == 1 && graph.out_degree(current) == 1 {
            if !seen.insert(current) {
                return None;
            }
            interior.push(current);
            current = graph.sole_successor(current)?;
        }
        if current == source || *sink.get_or_insert(current) != current {
            return None;
        }
        paths.push(interior);
    }

    let sink = sink?;
    if seen.contains(&sink) || graph.in_degree(sink) != paths.len() {
        return None;
    }
    Some(Shape::Bubble { source, sink, paths })
}
