//! Flat, id-keyed tables assembled from the pattern hierarchy and SPQR trees of each component.
//!
//! Patterns are named `c{rank}-{kind}-{n}`, bicomponents `c{rank}-bc{id}` and
//! metanodes `c{rank}-bc{id}-{S|P|R}{position}`, so nesting can be read back
//! from the tables without running any decomposition again.

use chrono::{DateTime, Local};
use color_eyre::eyre::{ContextCompat, Report, Result, WrapErr};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::path::Path;
use strum::IntoEnumIterator;
use tangle_graph::bicomponent::SimpleGraph;
use tangle_graph::{Analysis, Component, DecomposeConfig, Hierarchy};
use tangle_graph::{MetanodeKind, PatternKind, SpqrTree, Vertex};

#[cfg(test)]
mod tests;

// ----------------------------------------------------------------------------
// Rows
// ----------------------------------------------------------------------------

/// Layout geometry, filled in by whatever lays the graph out.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct BoundingBox {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

/// Node and edge counts of an entity in one SPQR display mode.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Counts {
    pub nodes: usize,
    pub edges: usize,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct NodeRow {
    pub id: String,
    pub length: u64,
    pub parent_pattern_id: Option<String>,
    /// Every bicomponent holding the node, more than one for articulation points.
    pub bicomponent_ids: Vec<String>,
    pub is_articulation_point: bool,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct EdgeRow {
    pub id: String,
    pub source: String,
    pub target: String,
    pub parent_pattern_id: Option<String>,
    /// True if contraction found the edge parallel to another member's edge.
    pub is_duplicate: bool,
    /// Self-loops belong to no bicomponent.
    pub bicomponent_id: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PatternRow {
    pub id: String,
    pub kind: PatternKind,
    pub parent_pattern_id: Option<String>,
    pub round: usize,
    /// Direct members, nodes by id and patterns by pattern id.
    pub members: Vec<String>,
    pub member_count: usize,
    /// Original nodes inside the pattern at any depth.
    pub node_count: usize,
    pub sources: Vec<String>,
    pub sinks: Vec<String>,
    pub bounding_box: Option<BoundingBox>,
}

/// One bicomponent.
///
/// The explicit counts describe the SPQR tree (metanodes and tree edges), the
/// implicit counts the nodes and simple edges it holds once fully expanded.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct BicomponentRow {
    pub id: String,
    pub node_ids: Vec<String>,
    pub edge_ids: Vec<String>,
    pub root_metanode_id: Option<String>,
    pub separation_pairs: Vec<(String, String)>,
    pub explicit: Counts,
    pub implicit: Counts,
    pub explicit_bounding_box: Option<BoundingBox>,
    pub implicit_bounding_box: Option<BoundingBox>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct VirtualEdgeRow {
    pub source: String,
    pub target: String,
    /// Metanode the edge stands for.
    pub metanode_id: String,
}

/// One metanode of an SPQR tree.
///
/// The explicit counts describe its own skeleton, the implicit counts the
/// subgraph its whole subtree stands for.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct MetanodeRow {
    pub id: String,
    pub bicomponent_id: String,
    pub kind: MetanodeKind,
    pub parent_metanode_id: Option<String>,
    pub child_metanode_ids: Vec<String>,
    /// Zero for leaves, which have nothing to expand.
    pub descendant_count: usize,
    pub node_ids: Vec<String>,
    pub real_edge_ids: Vec<String>,
    pub virtual_edges: Vec<VirtualEdgeRow>,
    pub explicit: Counts,
    pub implicit: Counts,
    pub explicit_bounding_box: Option<BoundingBox>,
    pub implicit_bounding_box: Option<BoundingBox>,
}

/// Per-component statistics.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ComponentSummary {
    pub rank: usize,
    pub node_count: usize,
    pub edge_count: usize,
    pub too_large: bool,
    /// Rounds of the collapser that found something.
    pub rounds: usize,
    pub pattern_counts: BTreeMap<PatternKind, usize>,
    pub bicomponent_count: usize,
    pub metanode_count: usize,
    pub articulation_points: Vec<String>,
    pub separation_pairs: Vec<(String, String)>,
}

impl ComponentSummary {
    /// Returns a summary holding only the size of `component`.
    pub fn new(component: &Component) -> Self {
        ComponentSummary {
            rank: component.rank,
            node_count: component.node_count(),
            edge_count: component.edge_count(),
            ..Default::default()
        }
    }
}

// ----------------------------------------------------------------------------
// Component Tables
// ----------------------------------------------------------------------------

/// All rows produced for one analyzed component.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ComponentTables {
    pub summary: ComponentSummary,
    pub nodes: Vec<NodeRow>,
    pub edges: Vec<EdgeRow>,
    pub patterns: Vec<PatternRow>,
    pub bicomponents: Vec<BicomponentRow>,
    pub metanodes: Vec<MetanodeRow>,
}

impl ComponentTables {
    /// Flatten the analysis of `component` into rows.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use tangle::output::ComponentTables;
    /// use tangle_graph::{analyze, AssemblyGraph, DecomposeConfig};
    /// let graph = AssemblyGraph::from([("1", "2"), ("1", "3"), ("2", "4"), ("3", "4")]);
    /// let component = &graph.components()[0];
    /// let analysis = analyze(component, &DecomposeConfig::default())?;
    /// let tables = ComponentTables::new(component, &analysis)?;
    /// assert_eq!(tables.patterns[0].id, "c1-bubble-1");
    /// assert_eq!(tables.nodes[1].parent_pattern_id.as_deref(), Some("c1-bubble-1"));
    /// assert_eq!(tables.metanodes[0].id, "c1-bc1-S0");
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn new(component: &Component, analysis: &Analysis) -> Result<Self, Report> {
        let rank = component.rank;
        let summary = ComponentSummary::new(component);
        let mut tables = ComponentTables { summary, ..Default::default() };

        let ids = match analysis.hierarchy() {
            Some(hierarchy) => pattern_ids(rank, hierarchy),
            None => HashMap::new(),
        };
        let pattern_id = |position: Option<usize>| -> Result<Option<String>, Report> {
            position
                .map(|p| {
                    let error = || format!("Pattern {p} of component {rank} is not reported.");
                    ids.get(&p).cloned().wrap_err_with(error)
                })
                .transpose()
        };

        // Patterns
        if let Some(hierarchy) = analysis.hierarchy() {
            tables.summary.rounds = hierarchy.rounds;
            tables.summary.pattern_counts = hierarchy.counts().into_iter().collect();
            let vertex_id = |v: &Vertex| -> Result<String, Report> {
                match v {
                    Vertex::Node(n) => Ok(component.nodes[*n].id.clone()),
                    Vertex::Pattern(p) => Ok(pattern_id(Some(*p))?.unwrap_or_default()),
                }
            };
            let vertex_ids = |vs: Vec<Vertex>| -> Result<Vec<String>, Report> {
                vs.iter().map(|v| vertex_id(v)).collect()
            };

            for (position, pattern) in hierarchy.reported() {
                let members = vertex_ids(pattern.shape.members())?;
                tables.patterns.push(PatternRow {
                    id: pattern_id(Some(position))?.unwrap_or_default(),
                    kind: pattern.kind(),
                    parent_pattern_id: pattern_id(pattern.parent)?,
                    round: pattern.round,
                    member_count: members.len(),
                    members,
                    node_count: hierarchy.nodes_within(position).len(),
                    sources: vertex_ids(pattern.shape.sources())?,
                    sinks: vertex_ids(pattern.shape.sinks())?,
                    bounding_box: None,
                });
            }
        }

        // Bicomponents and metanodes
        let mut node_bicomponents: Vec<Vec<String>> = vec![Vec::new(); component.node_count()];
        let mut edge_bicomponent: Vec<Option<String>> = vec![None; component.edge_count()];
        let mut articulation = vec![false; component.node_count()];

        if let Some(biconnectivity) = &analysis.biconnectivity {
            let graph = &biconnectivity.graph;
            let block_cut = &biconnectivity.block_cut;
            let node_id = |n: usize| component.nodes[n].id.clone();
            let edge_ids = |simple: &[usize]| -> Vec<String> {
                simple
                    .iter()
                    .flat_map(|e| graph.originals(*e))
                    .map(|o| component.edges[*o].id.clone())
                    .collect()
            };
            let pair_ids = |pairs: Vec<(usize, usize)>| {
                pairs.into_iter().map(|(u, v)| (node_id(u), node_id(v))).collect_vec()
            };

            for &n in &block_cut.articulation_points {
                articulation[n] = true;
            }
            tables.summary.articulation_points =
                block_cut.articulation_points.iter().map(|n| node_id(*n)).collect();
            tables.summary.bicomponent_count = block_cut.bicomponents.len();

            for (bicomponent, tree) in block_cut.bicomponents.iter().zip(&biconnectivity.trees) {
                let bicomponent_id = format!("c{rank}-bc{}", bicomponent.id);
                for &n in &bicomponent.nodes {
                    node_bicomponents[n].push(bicomponent_id.clone());
                }
                for &e in &bicomponent.edges {
                    for &o in graph.originals(e) {
                        edge_bicomponent[o] = Some(bicomponent_id.clone());
                    }
                }

                let metanode_ids = tree
                    .metanodes
                    .iter()
                    .map(|m| format!("{bicomponent_id}-{}{}", m.kind, m.path()))
                    .collect_vec();
                let separation_pairs = pair_ids(tree.separation_pairs());
                tables.summary.metanode_count += tree.metanodes.len();
                tables.summary.separation_pairs.extend(separation_pairs.iter().cloned());

                tables.bicomponents.push(BicomponentRow {
                    id: bicomponent_id.clone(),
                    node_ids: bicomponent.nodes.iter().map(|n| node_id(*n)).collect(),
                    edge_ids: edge_ids(&bicomponent.edges),
                    root_metanode_id: metanode_ids.first().cloned(),
                    separation_pairs,
                    explicit: Counts {
                        nodes: tree.metanodes.len(),
                        edges: tree.metanodes.len().saturating_sub(1),
                    },
                    implicit: Counts {
                        nodes: bicomponent.nodes.len(),
                        edges: bicomponent.edges.len(),
                    },
                    explicit_bounding_box: None,
                    implicit_bounding_box: None,
                });

                let rows = metanode_rows(tree, &bicomponent_id, &metanode_ids, graph, component)?;
                tables.metanodes.extend(rows);
            }
        }

        // Nodes and edges
        let hierarchy = analysis.hierarchy();
        for (n, node) in component.nodes.iter().enumerate() {
            let parent = hierarchy.and_then(|h| h.node_parents.get(n).copied().flatten());
            tables.nodes.push(NodeRow {
                id: node.id.clone(),
                length: node.length,
                parent_pattern_id: pattern_id(parent)?,
                bicomponent_ids: std::mem::take(&mut node_bicomponents[n]),
                is_articulation_point: articulation[n],
            });
        }
        for (e, edge) in component.edges.iter().enumerate() {
            let parent = hierarchy.and_then(|h| h.edge_parents.get(e).copied().flatten());
            tables.edges.push(EdgeRow {
                id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                parent_pattern_id: pattern_id(parent)?,
                is_duplicate: hierarchy.and_then(|h| h.duplicates.get(e).copied()).unwrap_or(false),
                bicomponent_id: edge_bicomponent[e].take(),
            });
        }

        Ok(tables)
    }
}

/// Name every reported pattern `c{rank}-{kind}-{n}`, counting each kind from 1.
fn pattern_ids(rank: usize, hierarchy: &Hierarchy) -> HashMap<usize, String> {
    let mut seen: HashMap<PatternKind, usize> = HashMap::new();
    hierarchy
        .reported()
        .map(|(position, pattern)| {
            let n = seen.entry(pattern.kind()).or_default();
            *n += 1;
            (position, format!("c{rank}-{}-{n}", pattern.kind()))
        })
        .collect()
}

fn metanode_rows(
    tree: &SpqrTree,
    bicomponent_id: &str,
    metanode_ids: &[String],
    graph: &SimpleGraph,
    component: &Component,
) -> Result<Vec<MetanodeRow>, Report> {
    let node_id = |n: usize| component.nodes[n].id.clone();
    let metanode_id = |m: usize| {
        metanode_ids
            .get(m)
            .cloned()
            .wrap_err_with(|| format!("Metanode {m} is missing from bicomponent {bicomponent_id}."))
    };

    tree.metanodes
        .iter()
        .enumerate()
        .map(|(m, metanode)| {
            let virtual_edges = metanode
                .virtual_edges
                .iter()
                .map(|v| {
                    Ok(VirtualEdgeRow {
                        source: node_id(v.u),
                        target: node_id(v.v),
                        metanode_id: metanode_id(v.twin)?,
                    })
                })
                .collect::<Result<Vec<_>, Report>>()?;
            Ok(MetanodeRow {
                id: metanode_id(m)?,
                bicomponent_id: bicomponent_id.to_string(),
                kind: metanode.kind,
                parent_metanode_id: metanode.parent.map(|p| metanode_id(p)).transpose()?,
                child_metanode_ids: metanode
                    .children
                    .iter()
                    .map(|c| metanode_id(*c))
                    .collect::<Result<_, _>>()?,
                descendant_count: metanode.descendant_count,
                node_ids: metanode.nodes.iter().map(|n| node_id(*n)).collect(),
                real_edge_ids: metanode
                    .real_edges
                    .iter()
                    .flat_map(|e| graph.originals(*e))
                    .map(|o| component.edges[*o].id.clone())
                    .collect(),
                virtual_edges,
                explicit: Counts {
                    nodes: metanode.nodes.len(),
                    edges: metanode.skeleton_edge_count(),
                },
                implicit: Counts {
                    nodes: tree.subtree_nodes(m).len(),
                    edges: tree.subtree_edges(m).len(),
                },
                explicit_bounding_box: None,
                implicit_bounding_box: None,
            })
        })
        .collect()
}

// ----------------------------------------------------------------------------
// Outcomes
// ----------------------------------------------------------------------------

/// What happened to one component.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, strum::Display)]
#[serde(tag = "status", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ComponentOutcome {
    Analyzed(ComponentTables),
    /// Over a size limit, never analyzed.
    Skipped { summary: ComponentSummary, max_nodes: usize, max_edges: usize },
    Failed { summary: ComponentSummary, reason: String },
}

impl ComponentOutcome {
    /// Returns the outcome for a component over the limits of `config`.
    pub fn skipped(component: &Component, config: &DecomposeConfig) -> Self {
        let summary = ComponentSummary { too_large: true, ..ComponentSummary::new(component) };
        let (max_nodes, max_edges) = (config.max_nodes, config.max_edges);
        ComponentOutcome::Skipped { summary, max_nodes, max_edges }
    }

    /// Returns the outcome for a component whose analysis returned `error`.
    pub fn failed(component: &Component, error: &Report) -> Self {
        let summary = ComponentSummary::new(component);
        ComponentOutcome::Failed { summary, reason: format!("{error:#}") }
    }

    pub fn summary(&self) -> &ComponentSummary {
        match self {
            ComponentOutcome::Analyzed(tables) => &tables.summary,
            ComponentOutcome::Skipped { summary, .. } => summary,
            ComponentOutcome::Failed { summary, .. } => summary,
        }
    }

    /// Sort key listing analyzed, then skipped, then failed components.
    fn group(&self) -> usize {
        match self {
            ComponentOutcome::Analyzed(_) => 0,
            ComponentOutcome::Skipped { .. } => 1,
            ComponentOutcome::Failed { .. } => 2,
        }
    }
}

// ----------------------------------------------------------------------------
// Decomposition
// ----------------------------------------------------------------------------

/// The outcomes of every component of one input graph, in rank order.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Decomposition {
    pub created: DateTime<Local>,
    pub components: Vec<ComponentOutcome>,
}

impl Decomposition {
    pub fn new(mut components: Vec<ComponentOutcome>) -> Self {
        components.sort_by_key(|c| c.summary().rank);
        Decomposition { created: Local::now(), components }
    }

    /// Returns the tables of every analyzed component, by rank.
    pub fn analyzed(&self) -> impl Iterator<Item = &ComponentTables> {
        self.components.iter().filter_map(|c| match c {
            ComponentOutcome::Analyzed(tables) => Some(tables),
            _ => None,
        })
    }

    /// Reads a [`Decomposition`] from a JSON file.
    pub fn read<P>(path: &P) -> Result<Decomposition, Report>
    where
        P: AsRef<Path> + Debug,
    {
        let input = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read decomposition: {path:?}."))?;
        let decomposition = serde_json::from_str(&input)
            .wrap_err_with(|| format!("Failed to deserialize decomposition: {path:?}"))?;
        Ok(decomposition)
    }

    /// Write [`Decomposition`] to a JSON file.
    pub fn write<P>(&self, path: &P) -> Result<(), Report>
    where
        P: AsRef<Path> + Debug,
    {
        crate::utils::write_json(self, path).wrap_err("Failed to write decomposition.")
    }

    /// Returns one row per component: analyzed first, then skipped, then failed.
    pub fn summary_table(&self) -> tabled::Table {
        let mut builder = tabled::builder::Builder::default();
        let mut headers = ["Rank", "Nodes", "Edges", "Status"].map(String::from).to_vec();
        headers.extend(PatternKind::iter().map(|k| k.to_string()));
        headers.extend(["Bicomponents", "Metanodes", "Reason"].map(String::from));
        builder.push_record(headers);

        for outcome in self.components.iter().sorted_by_key(|c| (c.group(), c.summary().rank)) {
            let summary = outcome.summary();
            let mut row = vec![
                summary.rank.to_string(),
                summary.node_count.to_string(),
                summary.edge_count.to_string(),
                outcome.to_string(),
            ];
            let counts = PatternKind::iter()
                .map(|k| summary.pattern_counts.get(&k).copied().unwrap_or(0).to_string());
            row.extend(counts);
            let reason = match outcome {
                ComponentOutcome::Skipped { max_nodes, max_edges, .. } => {
                    format!("over {max_nodes} nodes or {max_edges} edges")
                }
                ComponentOutcome::Failed { reason, .. } => reason.clone(),
                ComponentOutcome::Analyzed(_) => String::new(),
            };
            row.extend([
                summary.bicomponent_count.to_string(),
                summary.metanode_count.to_string(),
                reason,
            ]);
            builder.push_record(row);
        }

        builder.build()
    }
}
