use crate::bicomponent::{BlockCut, SimpleGraph};
use crate::AssemblyGraph;
use color_eyre::eyre::{Report, Result};
use itertools::Itertools;
use petgraph::unionfind::UnionFind;

fn split(edges: &[(&str, &str)]) -> Result<(SimpleGraph, BlockCut), Report> {
    let component = AssemblyGraph::from(edges.iter().copied()).components().remove(0);
    let simple = SimpleGraph::new(component.node_count(), &component.topology()?);
    let block_cut = simple.block_cut();
    Ok((simple, block_cut))
}

#[test]
fn simplify_merges_parallel_and_drops_loops() -> Result<(), Report> {
    let (simple, _) = split(&[("1", "2"), ("2", "1"), ("1", "2"), ("2", "2")])?;
    assert_eq!(simple.node_count(), 2);
    assert_eq!(simple.edge_count(), 1);
    assert_eq!(simple.endpoints(0), (0, 1));
    assert_eq!(simple.originals(0), [0, 1, 2]);
    Ok(())
}

#[test]
fn path_is_all_bridges() -> Result<(), Report> {
    let (_, block_cut) = split(&[("1", "2"), ("2", "3"), ("3", "4")])?;
    assert_eq!(block_cut.bicomponents.len(), 3);
    assert!(block_cut.bicomponents.iter().all(|b| b.is_bridge()));
    assert_eq!(block_cut.articulation_points, [1, 2]);
    Ok(())
}

#[test]
fn cycle_is_one_bicomponent() -> Result<(), Report> {
    let (_, block_cut) = split(&[("1", "2"), ("2", "3"), ("3", "1")])?;
    assert_eq!(block_cut.bicomponents.len(), 1);
    assert_eq!(block_cut.bicomponents[0].nodes, [0, 1, 2]);
    assert!(block_cut.articulation_points.is_empty());
    Ok(())
}

#[test]
fn partition_and_articulation() -> Result<(), Report> {
    let edges = [
        ("a", "b"), ("b", "c"), ("c", "a"),
        ("c", "d"),
        ("d", "e"), ("e", "f"), ("f", "d"), ("f", "g"), ("g", "d"),
        ("g", "h"), ("h", "i"), ("i", "g"),
        ("a", "j"),
    ];
    let (simple, block_cut) = split(&edges)?;

    // every simple edge sits in exactly one bicomponent
    let edges =
        block_cut.bicomponents.iter().flat_map(|b| b.edges.iter().copied()).sorted().collect_vec();
    assert_eq!(edges, (0..simple.edge_count()).collect_vec());

    // nodes shared by two bicomponents are exactly the articulation points
    let shared = block_cut
        .bicomponents
        .iter()
        .flat_map(|b| b.nodes.iter().copied())
        .counts()
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(node, _)| node)
        .sorted()
        .collect_vec();
    assert_eq!(shared, block_cut.articulation_points);
    assert_eq!(block_cut.bicomponents.len(), 5);

    // ids follow size
    let sizes = block_cut.bicomponents.iter().map(|b| (b.id, b.nodes.len())).collect_vec();
    assert_eq!(sizes, [(1, 4), (2, 3), (3, 3), (4, 2), (5, 2)]);
    Ok(())
}

#[test]
fn isolated_node_has_no_bicomponent() -> Result<(), Report> {
    let component = AssemblyGraph::from([("1", "1")]).components().remove(0);
    let simple = SimpleGraph::new(component.node_count(), &component.topology()?);
    assert_eq!(simple.edge_count(), 0);
    assert_eq!(simple.block_cut(), BlockCut::default());
    Ok(())
}

/// Number of connected pieces left after deleting `removed` from `simple`.
fn pieces_without(simple: &SimpleGraph, removed: usize) -> usize {
    let mut union_find = UnionFind::new(simple.node_count());
    for edge in 0..simple.edge_count() {
        let (a, b) = simple.endpoints(edge);
        if a != removed && b != removed {
            union_find.union(a, b);
        }
    }
    (0..simple.node_count()).filter(|&n| n != removed).map(|n| union_find.find(n)).unique().count()
}

#[test]
fn articulation_points_disconnect() -> Result<(), Report> {
    let edges = [
        ("a", "b"), ("b", "c"), ("c", "a"),
        ("c", "d"),
        ("d", "e"), ("e", "f"), ("f", "d"), ("f", "g"), ("g", "d"),
        ("g", "h"), ("h", "i"), ("i", "g"),
        ("a", "j"),
    ];
    let (simple, block_cut) = split(&edges)?;
    assert_eq!(block_cut.articulation_points.len(), 4);

    for node in 0..simple.node_count() {
        let is_articulation = block_cut.articulation_points.contains(&node);
        assert_eq!(pieces_without(&simple, node) > 1, is_articulation, "node {node}");
        let blocks = block_cut.bicomponents.iter().filter(|b| b.nodes.contains(&node)).count();
        assert_eq!(blocks > 1, is_articulation, "node {node}");
    }
    Ok(())
}
