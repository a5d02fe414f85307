use super::{Neighborhood, Shape, Vertex};

/// Returns the chain through `start`, if there is one.
///
/// The walk goes forward from `start` while the current vertex has a single
/// way out and the next vertex a single way in, then backward while the
/// first vertex has a single way in and its predecessor a single way out.
/// If the last vertex leads straight back to the first one the chain is
/// reported as a [`Shape::CyclicChain`]. A branch that only loops back into
/// the chain ends the chain there instead.
pub fn validate<G: Neighborhood>(graph: &G, start: Vertex) -> Option<Shape> {
    let mut path = vec![start];

    let mut current = start;
    while let Some(next) = graph.sole_successor(current) {
        if path.contains(&next) || graph.in_degree(next) != 1 {
            break;
        }
        path.push(next);
        current = next;
    }

    while let Some(previous) = graph.sole_predecessor(path[0]) {
        if path.contains(&previous) || graph.out_degree(previous) != 1 {
            break;
        }
        path.insert(0, previous);
    }

    if path.len() < 2 {
        return None;
    }
    let (first, last) = (path[0], path[path.len() - 1]);
    match graph.sole_successor(last) == Some(first) {
        true => Some(Shape::CyclicChain { path }),
        false => Some(Shape::Chain { path }),
    }
}

/// Returns the unbranched cycle through `start`, if there is one.
///
/// Every vertex on the cycle has a single way out, and every vertex but
/// `start` a single way in.
pub fn validate_cycle<G: Neighborhood>(graph: &G, start: Vertex) -> Option<Shape> {
    let mut path = vec![start];
    let mut current = graph.sole_successor(start)?;
    while current != start {
        if path.contains(&current) || graph.in_degree(current) != 1 {
            return None;
        }
        path.push(current);
        current = graph.sole_successor(current)?;
    }
    (path.len() >= 2).then_some(Shape::CyclicChain { path })
}
