use super::*;
use color_eyre::eyre::{Report, Result};
use itertools::Itertools;
use tangle_graph::Edge;

fn write_graph(graph: &AssemblyGraph) -> Result<(tempfile::TempDir, RunArgs), Report> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("graph.json");
    graph.write(&input)?;
    let args = RunArgs { input, output_dir: dir.path().join("output"), ..Default::default() };
    Ok((dir, args))
}

#[test]
fn run_writes_outputs() -> Result<(), Report> {
    let graph = AssemblyGraph::from([("1", "2"), ("1", "3"), ("2", "4"), ("3", "4"), ("4", "5")]);
    let (_dir, args) = write_graph(&graph)?;
    let args = RunArgs { dot: true, threads: 2, ..args };
    let decomposition = run(&args)?;

    assert_eq!(decomposition.analyzed().count(), 1);
    assert_eq!(Decomposition::read(&args.output_dir.join("decomposition.json"))?, decomposition);

    let written = RunArgs::read(&args.output_dir.join("run_args.json"))?;
    assert_eq!(written, RunArgs { threads: 1, ..args.clone() });

    let dot = args.output_dir.join("dot");
    assert!(dot.join("c1-patterns.dot").exists());
    assert!(dot.join("c1-bc1-spqr.dot").exists());
    assert!(dot.join("c1-bc2-spqr.dot").exists());
    Ok(())
}

#[test]
fn large_components_are_skipped() -> Result<(), Report> {
    let graph = AssemblyGraph::from([("1", "2"), ("2", "3"), ("3", "4"), ("5", "6")]);
    let (_dir, args) = write_graph(&graph)?;
    let decomposition = run(&RunArgs { max_edges: 2, ..args })?;

    let statuses =
        decomposition.components.iter().map(|c| (c.summary().rank, c.to_string())).collect_vec();
    assert_eq!(statuses, [(1, "skipped".to_string()), (2, "analyzed".to_string())]);
    let ComponentOutcome::Skipped { summary, max_edges, .. } = &decomposition.components[0] else {
        panic!("not skipped")
    };
    assert_eq!((summary.node_count, summary.edge_count, *max_edges), (4, 3, 2));
    assert!(summary.pattern_counts.is_empty());
    Ok(())
}

#[test]
fn malformed_component_fails_alone() -> Result<(), Report> {
    let mut graph = AssemblyGraph::from([("1", "2"), ("2", "3"), ("4", "5")]);
    graph.edges.push(Edge::new("dangling", "5", "6"));
    let (_dir, args) = write_graph(&graph)?;
    let decomposition = run(&args)?;

    let ComponentOutcome::Failed { summary, reason } = &decomposition.components[1] else {
        panic!("not failed")
    };
    assert_eq!(summary.rank, 2);
    assert!(reason.contains("component 2"));
    assert!(reason.contains("dangling"));
    assert!(matches!(decomposition.components[0], ComponentOutcome::Analyzed(_)));
    Ok(())
}

#[test]
fn nothing_to_run() -> Result<(), Report> {
    let graph = AssemblyGraph::from([("1", "2")]);
    let (_dir, args) = write_graph(&graph)?;
    let result = run(&RunArgs { patterns: false, spqr: false, ..args });
    assert!(result.is_err());
    Ok(())
}

#[test]
fn config_follows_args() {
    let args = RunArgs { max_nodes: 10, merge_chains: false, ..Default::default() };
    let config = args.config();
    assert_eq!(config.max_nodes, 10);
    assert_eq!(config.max_edges, MAX_EDGES);
    assert!(!config.merge_chains);
    assert!(config.patterns && config.spqr);
}
