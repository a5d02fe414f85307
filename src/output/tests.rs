use super::*;
use color_eyre::eyre::{Report, Result};
use tangle_graph::{analyze, AssemblyGraph, Edge};

fn tables(edges: &[(&str, &str)], config: &DecomposeConfig) -> Result<ComponentTables, Report> {
    let component = AssemblyGraph::from(edges.iter().copied()).components().remove(0);
    let analysis = analyze(&component, config)?;
    ComponentTables::new(&component, &analysis)
}

#[test]
fn nested_pattern_ids() -> Result<(), Report> {
    let edges = [
        ("1", "2"), ("1", "3"), ("2", "4"), ("3", "4"),
        ("4", "5"), ("4", "6"), ("5", "7"), ("6", "7"),
    ];
    let tables = tables(&edges, &DecomposeConfig { spqr: false, ..Default::default() })?;

    let ids = tables.patterns.iter().map(|p| p.id.as_str()).collect_vec();
    assert_eq!(ids, ["c1-bubble-1", "c1-bubble-2"]);
    let inner = &tables.patterns[0];
    let outer = &tables.patterns[1];
    assert_eq!(inner.parent_pattern_id.as_deref(), Some("c1-bubble-2"));
    assert_eq!(outer.parent_pattern_id, None);
    assert_eq!(outer.sources, ["c1-bubble-1"]);
    assert_eq!(outer.node_count, 7);
    assert_eq!(inner.member_count, 4);
    assert!(outer.bounding_box.is_none());

    let node_2 = tables.nodes.iter().find(|n| n.id == "2");
    assert_eq!(node_2.and_then(|n| n.parent_pattern_id.as_deref()), Some("c1-bubble-1"));
    assert_eq!(tables.summary.pattern_counts.get(&PatternKind::Bubble), Some(&2));
    assert_eq!(tables.summary.rounds, 2);

    // nothing from the disabled decomposition
    assert!(tables.bicomponents.is_empty());
    assert!(tables.nodes.iter().all(|n| n.bicomponent_ids.is_empty()));
    Ok(())
}

#[test]
fn metanode_counts() -> Result<(), Report> {
    // two triangles glued along a-b
    let edges = [("a", "b"), ("b", "c"), ("c", "a"), ("b", "d"), ("d", "a")];
    let tables = tables(&edges, &DecomposeConfig { patterns: false, ..Default::default() })?;

    assert!(tables.patterns.is_empty());
    assert!(tables.nodes.iter().all(|n| n.parent_pattern_id.is_none()));

    assert_eq!(tables.bicomponents.len(), 1);
    let bicomponent = &tables.bicomponents[0];
    assert_eq!(bicomponent.id, "c1-bc1");
    assert_eq!(bicomponent.root_metanode_id.as_deref(), Some("c1-bc1-S0"));
    assert_eq!(bicomponent.explicit, Counts { nodes: 3, edges: 2 });
    assert_eq!(bicomponent.implicit, Counts { nodes: 4, edges: 5 });
    assert_eq!(bicomponent.separation_pairs, [("a".to_string(), "b".to_string())]);

    let ids = tables.metanodes.iter().map(|m| m.id.as_str()).collect_vec();
    assert_eq!(ids, ["c1-bc1-S0", "c1-bc1-P0.1", "c1-bc1-S0.1.1"]);

    let root = &tables.metanodes[0];
    assert_eq!(root.explicit, Counts { nodes: 3, edges: 3 });
    assert_eq!(root.implicit, Counts { nodes: 4, edges: 5 });
    assert_eq!(root.descendant_count, 2);
    assert_eq!(root.child_metanode_ids, ["c1-bc1-P0.1"]);

    let bond = &tables.metanodes[1];
    assert_eq!(bond.parent_metanode_id.as_deref(), Some("c1-bc1-S0"));
    assert_eq!(bond.explicit, Counts { nodes: 2, edges: 3 });
    assert_eq!(bond.implicit, Counts { nodes: 3, edges: 3 });
    assert_eq!(bond.real_edge_ids, ["e0"]);
    let targets = bond.virtual_edges.iter().map(|v| v.metanode_id.as_str()).sorted().collect_vec();
    assert_eq!(targets, ["c1-bc1-S0", "c1-bc1-S0.1.1"]);

    let leaf = &tables.metanodes[2];
    assert_eq!(leaf.descendant_count, 0);
    assert_eq!(leaf.implicit, Counts { nodes: 3, edges: 2 });
    Ok(())
}

#[test]
fn node_and_edge_rows() -> Result<(), Report> {
    // a diamond with a tail, and a self-loop on the tail
    let edges = [("1", "2"), ("1", "3"), ("2", "4"), ("3", "4"), ("4", "5"), ("5", "5")];
    let tables = tables(&edges, &DecomposeConfig::default())?;

    let articulation = tables
        .nodes
        .iter()
        .filter(|n| n.is_articulation_point)
        .map(|n| n.id.as_str())
        .collect_vec();
    assert_eq!(articulation, ["4"]);
    assert_eq!(tables.summary.articulation_points, ["4"]);

    let node_4 = tables.nodes.iter().find(|n| n.id == "4");
    assert_eq!(node_4.map(|n| n.bicomponent_ids.len()), Some(2));

    let self_loop = tables.edges.iter().find(|e| e.source == "5" && e.target == "5");
    assert_eq!(self_loop.map(|e| e.bicomponent_id.clone()), Some(None));
    let tail = tables.edges.iter().find(|e| e.source == "4" && e.target == "5");
    assert_eq!(tail.and_then(|e| e.bicomponent_id.as_deref()), Some("c1-bc2"));
    assert!(tables.edges.iter().all(|e| !e.is_duplicate));
    Ok(())
}

#[test]
fn outcomes_are_grouped() -> Result<(), Report> {
    let mut graph = AssemblyGraph::from([("1", "2"), ("2", "3"), ("3", "1"), ("4", "5")]);
    graph.edges.push(Edge::new("broken", "4", "missing"));
    let components = graph.components();
    let config = DecomposeConfig { max_nodes: 2, ..Default::default() };

    let outcomes = components
        .iter()
        .map(|c| match (config.is_too_large(c), analyze(c, &config)) {
            (true, _) => Ok(ComponentOutcome::skipped(c, &config)),
            (false, Ok(analysis)) => {
                Ok(ComponentOutcome::Analyzed(ComponentTables::new(c, &analysis)?))
            }
            (false, Err(e)) => Ok::<_, Report>(ComponentOutcome::failed(c, &e)),
        })
        .collect::<Result<Vec<_>, _>>()?;
    let decomposition = Decomposition::new(outcomes);

    let statuses = decomposition.components.iter().map(|c| c.to_string()).collect_vec();
    assert_eq!(statuses, ["skipped", "failed"]);
    assert!(decomposition.components[0].summary().too_large);
    let ComponentOutcome::Failed { reason, .. } = &decomposition.components[1] else {
        panic!("not failed")
    };
    assert!(reason.contains("broken"));
    assert!(reason.contains("missing"));

    let table = decomposition.summary_table().to_string();
    assert!(table.contains("frayed_rope"));
    assert!(table.contains("over 2 nodes or 7999 edges"));
    Ok(())
}

#[test]
fn write_and_read() -> Result<(), Report> {
    let tables = tables(&[("1", "2"), ("2", "3")], &DecomposeConfig::default())?;
    let decomposition = Decomposition::new(vec![ComponentOutcome::Analyzed(tables)]);

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("decomposition.json");
    decomposition.write(&path)?;
    let json = std::fs::read_to_string(&path)?;
    assert!(json.contains("\"status\": \"analyzed\""));
    assert_eq!(Decomposition::read(&path)?, decomposition);
    Ok(())
}
