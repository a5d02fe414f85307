use crate::decompose::WorkingGraph;
use crate::pattern::{detect, Neighborhood, PatternKind, Shape, Vertex};
use crate::{AssemblyGraph, Component};
use color_eyre::eyre::{Report, Result};
use itertools::Itertools;
use std::collections::HashSet;

fn build(edges: &[(&str, &str)]) -> Result<(Component, WorkingGraph), Report> {
    let component = AssemblyGraph::from(edges.iter().copied()).components().remove(0);
    let graph = WorkingGraph::new(&component)?;
    Ok((component, graph))
}

fn names(component: &Component, vertices: &[Vertex]) -> Vec<String> {
    vertices
        .iter()
        .map(|v| match v {
            Vertex::Node(n) => component.nodes[*n].id.clone(),
            Vertex::Pattern(p) => format!("p{p}"),
        })
        .collect()
}

fn vertex(component: &Component, id: &str) -> Vertex {
    Vertex::Node(component.node_index(id).unwrap_or(usize::MAX))
}

#[test]
fn bubble_diamond() -> Result<(), Report> {
    let (component, graph) = build(&[("1", "2"), ("1", "3"), ("2", "4"), ("3", "4")])?;
    let shapes = detect(&graph);
    assert_eq!(shapes.len(), 1);
    let Shape::Bubble { source, sink, paths } = &shapes[0] else {
        panic!("expected a bubble: {shapes:?}")
    };
    assert_eq!(names(&component, &[*source, *sink]), ["1", "4"]);
    assert_eq!(paths.len(), 2);
    assert_eq!(names(&component, &shapes[0].members()), ["1", "2", "3", "4"]);
    Ok(())
}

#[test]
fn bubble_bulge() -> Result<(), Report> {
    let (component, graph) = build(&[("1", "2"), ("1", "2"), ("1", "2")])?;
    let shapes = detect(&graph);
    assert_eq!(shapes.len(), 1);
    assert_eq!(shapes[0].kind(), PatternKind::Bubble);
    assert_eq!(names(&component, &shapes[0].members()), ["1", "2"]);
    let Shape::Bubble { paths, .. } = &shapes[0] else { panic!("expected a bubble") };
    assert!(paths.iter().all(|p| p.is_empty()));
    Ok(())
}

#[test]
fn bubble_with_back_edge() -> Result<(), Report> {
    let (component, graph) = build(&[("1", "2"), ("1", "3"), ("2", "4"), ("3", "4"), ("4", "1")])?;
    let shape = PatternKind::Bubble.validate(&graph, vertex(&component, "1"));
    assert_eq!(shape.map(|s| s.kind()), Some(PatternKind::Bubble));
    Ok(())
}

#[test]
fn bubble_with_leaking_path() -> Result<(), Report> {
    let (component, graph) = build(&[("1", "2"), ("1", "3"), ("2", "4"), ("3", "4"), ("2", "5")])?;
    assert_eq!(PatternKind::Bubble.validate(&graph, vertex(&component, "1")), None);
    assert!(detect(&graph).is_empty());
    Ok(())
}

#[test]
fn bubble_sink_with_extra_input() -> Result<(), Report> {
    let (component, graph) = build(&[("1", "2"), ("1", "3"), ("2", "4"), ("3", "4"), ("5", "4")])?;
    assert_eq!(PatternKind::Bubble.validate(&graph, vertex(&component, "1")), None);
    Ok(())
}

#[test]
fn frayed_rope() -> Result<(), Report> {
    let (component, graph) = build(&[("1", "3"), ("2", "3"), ("3", "4"), ("3", "5")])?;
    let shapes = detect(&graph);
    assert_eq!(shapes.len(), 1);
    let Shape::FrayedRope { sources, middle, sinks } = &shapes[0] else {
        panic!("expected a rope: {shapes:?}")
    };
    assert_eq!(names(&component, sources), ["1", "2"]);
    assert_eq!(names(&component, &[*middle]), ["3"]);
    assert_eq!(names(&component, sinks), ["4", "5"]);
    Ok(())
}

#[test]
fn frayed_rope_needs_two_sinks() -> Result<(), Report> {
    let (component, graph) = build(&[("1", "3"), ("2", "3"), ("3", "4")])?;
    assert_eq!(PatternKind::FrayedRope.validate(&graph, vertex(&component, "1")), None);
    Ok(())
}

#[test]
fn chain_linear() -> Result<(), Report> {
    let (component, graph) = build(&[("1", "2"), ("2", "3"), ("3", "4")])?;
    let shapes = detect(&graph);
    assert_eq!(shapes.len(), 1);
    assert_eq!(shapes[0].kind(), PatternKind::Chain);
    assert_eq!(names(&component, &shapes[0].members()), ["1", "2", "3", "4"]);

    // found from the middle too, by extending backward
    let shape = PatternKind::Chain.validate(&graph, vertex(&component, "3"));
    assert_eq!(shape, Some(shapes[0].clone()));
    Ok(())
}

#[test]
fn chain_ignores_self_loop() -> Result<(), Report> {
    let (component, graph) = build(&[("1", "2"), ("2", "2"), ("2", "3")])?;
    assert_eq!(graph.out_degree(vertex(&component, "2")), 1);
    let shapes = detect(&graph);
    assert_eq!(shapes.len(), 1);
    assert_eq!(names(&component, &shapes[0].members()), ["1", "2", "3"]);
    Ok(())
}

#[test]
fn chain_excludes_node_after_back_edge() -> Result<(), Report> {
    let (component, graph) = build(&[("1", "2"), ("2", "1"), ("2", "3")])?;
    let shapes = detect(&graph);
    assert_eq!(shapes.len(), 1);
    assert_eq!(shapes[0].kind(), PatternKind::Chain);
    assert_eq!(names(&component, &shapes[0].members()), ["1", "2"]);
    Ok(())
}

#[test]
fn cyclic_chain_with_entry() -> Result<(), Report> {
    let (component, graph) = build(&[("1", "2"), ("2", "3"), ("3", "2")])?;
    let shapes = detect(&graph);
    assert_eq!(shapes.len(), 1);
    assert_eq!(shapes[0].kind(), PatternKind::CyclicChain);
    assert_eq!(names(&component, &shapes[0].members()), ["2", "3"]);
    Ok(())
}

#[test]
fn cyclic_chain_from_chain_pass() -> Result<(), Report> {
    let (component, graph) = build(&[("1", "2"), ("2", "3"), ("3", "1")])?;
    let shape = PatternKind::Chain.validate(&graph, vertex(&component, "2"));
    let Some(Shape::CyclicChain { path }) = shape else {
        panic!("expected a cyclic chain: {shape:?}")
    };
    assert_eq!(names(&component, &path), ["2", "3", "1"]);
    Ok(())
}

#[test]
fn cyclic_chain_with_branch() -> Result<(), Report> {
    let (component, graph) = build(&[("1", "2"), ("2", "3"), ("3", "1"), ("3", "4")])?;
    assert_eq!(PatternKind::CyclicChain.validate(&graph, vertex(&component, "1")), None);
    let shapes = detect(&graph);
    assert!(shapes.iter().all(|s| s.kind() != PatternKind::CyclicChain));
    Ok(())
}

#[test]
fn bubble_before_chain() -> Result<(), Report> {
    let (component, graph) = build(&[("0", "1"), ("1", "2"), ("1", "3"), ("2", "4"), ("3", "4")])?;
    let shapes = detect(&graph);
    assert_eq!(shapes.len(), 1);
    assert_eq!(shapes[0].kind(), PatternKind::Bubble);
    assert_eq!(names(&component, &shapes[0].sources()), ["1"]);
    Ok(())
}

#[test]
fn detected_shapes_are_disjoint() -> Result<(), Report> {
    let edges = [
        ("a", "b"), ("a", "c"), ("b", "d"), ("c", "d"),
        ("d", "e"), ("e", "f"), ("f", "g"),
        ("h", "g"), ("g", "i"), ("g", "j"),
        ("j", "k"), ("k", "j"),
    ];
    let (_, graph) = build(&edges)?;
    let shapes = detect(&graph);
    assert!(shapes.len() >= 2);

    let members = shapes.iter().flat_map(|s| s.members()).collect_vec();
    let unique: HashSet<_> = members.iter().collect();
    assert_eq!(members.len(), unique.len());
    Ok(())
}
