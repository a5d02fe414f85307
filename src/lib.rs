//! `tangle` decomposes genome assembly graphs into nested structural patterns and SPQR trees.
//!
//! Every weakly connected component of the input graph is analyzed on its own:
//!
//! 1. Bubbles, frayed ropes, chains and cyclic chains are found and collapsed
//!    round after round until the graph stops shrinking.
//! 1. Independently, the component is split into biconnected components and
//!    each one is decomposed into an SPQR tree of series, parallel and rigid
//!    metanodes.
//!
//! Both results are flattened into id-keyed [tables](output::ComponentTables)
//! so a viewer can display them without re-running the algorithms. The graph
//! algorithms themselves live in the [`tangle_graph`] crate.
//!
//! ```rust
//! use tangle::output::ComponentTables;
//! use tangle_graph::{analyze, AssemblyGraph, DecomposeConfig};
//! let graph = AssemblyGraph::from([("1", "2"), ("2", "3"), ("3", "4")]);
//! let component = &graph.components()[0];
//! let analysis = analyze(component, &DecomposeConfig::default())?;
//! let tables = ComponentTables::new(component, &analysis)?;
//! assert_eq!(tables.patterns[0].id, "c1-chain-1");
//! assert_eq!(tables.summary.bicomponent_count, 3);
//! # Ok::<(), color_eyre::eyre::Report>(())
//! ```

#[cfg(feature = "cli")]
pub mod cli;
pub mod output;
pub mod run;
pub mod utils;

#[doc(inline)]
#[cfg(feature = "cli")]
pub use crate::cli::Cli;
#[doc(inline)]
pub use crate::output::Decomposition;
#[doc(inline)]
pub use crate::run::{run, RunArgs};
#[doc(inline)]
#[cfg(feature = "cli")]
pub use crate::utils::verbosity::Verbosity;
