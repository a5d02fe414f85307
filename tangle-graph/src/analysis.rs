use crate::bicomponent::{BlockCut, SimpleGraph};
use crate::{Collapser, Component, Hierarchy, SpqrTree};
use color_eyre::eyre::{Report, Result, WrapErr};
use itertools::Itertools;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Largest number of nodes a component may have and still be decomposed.
pub const MAX_NODES: usize = 7999;
/// Largest number of edges a component may have and still be decomposed.
pub const MAX_EDGES: usize = 7999;

/// What to compute for each component, and how large a component may be.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct DecomposeConfig {
    pub max_nodes: usize,
    pub max_edges: usize,
    /// Run hierarchical pattern detection.
    pub patterns: bool,
    /// Run the biconnected and SPQR decomposition.
    pub spqr: bool,
    /// Let a chain take over the members of chains collapsed before it.
    pub merge_chains: bool,
}

impl Default for DecomposeConfig {
    fn default() -> Self {
        DecomposeConfig {
            max_nodes: MAX_NODES,
            max_edges: MAX_EDGES,
            patterns: true,
            spqr: true,
            merge_chains: true,
        }
    }
}

impl DecomposeConfig {
    /// Returns true if `component` is over either size limit.
    ///
    /// ```rust
    /// use tangle_graph::{AssemblyGraph, DecomposeConfig};
    /// let component = &AssemblyGraph::from([("1", "2"), ("2", "3")]).components()[0];
    /// let config = DecomposeConfig { max_nodes: 2, ..Default::default() };
    /// assert!(config.is_too_large(component));
    /// assert!(!DecomposeConfig::default().is_too_large(component));
    /// ```
    pub fn is_too_large(&self, component: &Component) -> bool {
        component.node_count() > self.max_nodes || component.edge_count() > self.max_edges
    }
}

/// The biconnected structure of a component.
#[derive(Clone, Debug)]
pub struct Biconnectivity {
    pub graph: SimpleGraph,
    pub block_cut: BlockCut,
    /// One tree per bicomponent, in bicomponent order.
    pub trees: Vec<SpqrTree>,
}

/// Everything computed for one component.
#[derive(Clone, Debug, Default)]
pub struct Analysis {
    /// The collapser after its last round, holding the pattern hierarchy.
    pub collapser: Option<Collapser>,
    pub biconnectivity: Option<Biconnectivity>,
}

impl Analysis {
    pub fn hierarchy(&self) -> Option<&Hierarchy> {
        self.collapser.as_ref().map(|c| c.hierarchy())
    }
}

/// Decompose one component as `config` asks.
///
/// Size limits are not checked here, see [`DecomposeConfig::is_too_large`].
///
/// ## Errors
///
/// Malformed ids or endpoints in the component, or an internal fault of one
/// of the decompositions. The error names the component rank.
pub fn analyze(component: &Component, config: &DecomposeConfig) -> Result<Analysis, Report> {
    let topology = component.topology()?;
    let mut analysis = Analysis::default();

    if config.patterns {
        let mut collapser = Collapser::new(component)?.merge_chains(config.merge_chains);
        let rank = component.rank;
        collapser
            .run()
            .wrap_err_with(|| format!("Failed to collapse the patterns of component {rank}."))?;
        analysis.collapser = Some(collapser);
    }

    if config.spqr {
        let graph = SimpleGraph::new(component.node_count(), &topology);
        let block_cut = graph.block_cut();
        let trees = block_cut
            .bicomponents
            .iter()
            .map(|b| {
                SpqrTree::build(&graph, b).wrap_err_with(|| {
                    let rank = component.rank;
                    format!("Failed to decompose bicomponent {} of component {rank}.", b.id)
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            "Component {}: metanodes per bicomponent: {}",
            component.rank,
            trees.iter().map(|t| t.metanodes.len()).join(", ")
        );
        analysis.biconnectivity = Some(Biconnectivity { graph, block_cut, trees });
    }

    info!(
        "Analyzed component {}: {} nodes, {} edges.",
        component.rank,
        component.node_count(),
        component.edge_count()
    );
    Ok(analysis)
}
