//! Decompose every component of an assembly graph and write the results.

use crate::output::{ComponentOutcome, ComponentTables, Decomposition};
use crate::utils;
#[cfg(feature = "cli")]
use clap::{ArgAction, Parser};
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use indicatif::{style::ProgressStyle, ParallelProgressIterator, ProgressBar};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use tangle_graph::{analyze, AssemblyGraph, Component, DecomposeConfig, ToDot, MAX_EDGES, MAX_NODES};

#[cfg(test)]
mod tests;

/// Decompose every component of the input graph.
///
/// Writes `decomposition.json` and `run_args.json` to the output directory,
/// plus DOT files when [`RunArgs::dot`] is set.
///
/// ## Examples
///
/// ```rust
/// use tangle::run::{run, RunArgs};
/// use tangle_graph::AssemblyGraph;
/// let dir = tempfile::tempdir()?;
/// let input = dir.path().join("graph.json");
/// let graph = AssemblyGraph::from([("1", "2"), ("1", "3"), ("2", "4"), ("3", "4"), ("5", "6")]);
/// graph.write(&input)?;
///
/// let args = RunArgs { input, output_dir: dir.path().join("output"), ..Default::default() };
/// let decomposition = run(&args)?;
/// assert_eq!(decomposition.components.len(), 2);
/// assert!(dir.path().join("output").join("decomposition.json").exists());
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn run(args: &RunArgs) -> Result<Decomposition, Report> {
    if !args.patterns && !args.spqr {
        return Err(eyre!("Both decompositions are disabled, there is nothing to run."))
            .suggestion("Enable `--patterns` or `--spqr`.");
    }

    // check how many threads are available on the system
    let max_threads = rayon::current_num_threads();
    let threads = match args.threads {
        0 => 1,
        t if t > max_threads => {
            warn!(
                "The requested {t} threads exceed the {max_threads} available, using {max_threads}."
            );
            max_threads
        }
        t => t,
    };
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .wrap_err_with(|| format!("Failed to create a thread pool of {threads} threads."))?;

    info!("Reading assembly graph: {:?}", args.input);
    let graph = AssemblyGraph::read(&args.input)?;
    let components = graph.components();
    info!("Found {} connected components.", components.len());

    let config = args.config();
    let progress_bar_style = ProgressStyle::with_template(
        "{bar:40} {pos}/{len} ({percent}%) | Components / Second: {per_sec} | \
         Elapsed: {elapsed_precise}",
    )
    .wrap_err("Failed to create progress bar from template.")?;
    let progress_bar = match args.progress {
        true => ProgressBar::new(components.len() as u64),
        false => ProgressBar::hidden(),
    };
    progress_bar.set_style(progress_bar_style);

    let outcomes: Vec<(ComponentOutcome, Option<Dot>)> = pool.install(|| {
        components
            .par_iter()
            .progress_with(progress_bar)
            .map(|component| decompose(component, &config, args.dot))
            .collect()
    });

    let mut components = Vec::with_capacity(outcomes.len());
    for (outcome, dot) in outcomes {
        if let Some(dot) = dot {
            dot.write(&args.output_dir, outcome.summary().rank)?;
        }
        components.push(outcome);
    }
    let decomposition = Decomposition::new(components);

    let path = args.output_dir.join("decomposition.json");
    info!("Writing decomposition: {path:?}");
    decomposition.write(&path)?;
    let path = args.output_dir.join("run_args.json");
    info!("Writing run arguments: {path:?}");
    args.write(&path)?;

    Ok(decomposition)
}

/// DOT renderings of one analyzed component.
struct Dot {
    collapsed: Option<String>,
    trees: Vec<String>,
}

impl Dot {
    fn write(&self, output_dir: &Path, rank: usize) -> Result<(), Report> {
        let dir = output_dir.join("dot");
        if let Some(collapsed) = &self.collapsed {
            utils::write_text(collapsed, &dir.join(format!("c{rank}-patterns.dot")))?;
        }
        for (i, tree) in self.trees.iter().enumerate() {
            utils::write_text(tree, &dir.join(format!("c{rank}-bc{}-spqr.dot", i + 1)))?;
        }
        let count = self.trees.len() + self.collapsed.is_some() as usize;
        debug!("Component {rank}: wrote {count} DOT files to {dir:?}");
        Ok(())
    }
}

/// Run one component from admission to output rows.
///
/// Size limits are checked before any analysis starts. Errors are kept as a
/// failed outcome so the other components are still reported.
fn decompose(
    component: &Component,
    config: &DecomposeConfig,
    dot: bool,
) -> (ComponentOutcome, Option<Dot>) {
    if config.is_too_large(component) {
        info!(
            "Skipping component {}: {} nodes and {} edges exceed the limits of {} nodes and \
             {} edges.",
            component.rank,
            component.node_count(),
            component.edge_count(),
            config.max_nodes,
            config.max_edges
        );
        return (ComponentOutcome::skipped(component, config), None);
    }

    let result = analyze(component, config).and_then(|analysis| {
        let tables = ComponentTables::new(component, &analysis)?;
        let dot = match dot {
            true => Some(Dot {
                collapsed: analysis.collapser.as_ref().map(|c| c.to_dot()).transpose()?,
                trees: analysis
                    .biconnectivity
                    .iter()
                    .flat_map(|b| b.trees.iter().map(|t| t.to_dot()))
                    .collect::<Result<Vec<_>, _>>()?,
            }),
            false => None,
        };
        Ok((ComponentOutcome::Analyzed(tables), dot))
    });

    match result {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("Component {} failed: {e:#}", component.rank);
            (ComponentOutcome::failed(component, &e), None)
        }
    }
}

// ----------------------------------------------------------------------------
// RunArgs
// ----------------------------------------------------------------------------

/// Decompose the connected components of an assembly graph.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[cfg_attr(feature = "cli", derive(Parser))]
pub struct RunArgs {
    /// Input assembly graph (JSON).
    #[cfg_attr(feature = "cli", clap(short = 'i', long, required = true))]
    pub input: PathBuf,

    /// Output directory.
    ///
    /// If the directory does not exist, it will be created.
    #[cfg_attr(feature = "cli", clap(short = 'o', long, required = true))]
    pub output_dir: PathBuf,

    /// Skip components with more nodes than this.
    #[cfg_attr(feature = "cli", arg(long, default_value_t = RunArgs::default().max_nodes))]
    pub max_nodes: usize,

    /// Skip components with more edges than this.
    #[cfg_attr(feature = "cli", arg(long, default_value_t = RunArgs::default().max_edges))]
    pub max_edges: usize,

    /// Detect and collapse nested patterns (bubbles, frayed ropes, chains, cyclic chains).
    #[cfg_attr(
        feature = "cli",
        arg(long, action = ArgAction::Set, default_value_t = RunArgs::default().patterns)
    )]
    pub patterns: bool,

    /// Split components into bicomponents and build their SPQR trees.
    #[cfg_attr(
        feature = "cli",
        arg(long, action = ArgAction::Set, default_value_t = RunArgs::default().spqr)
    )]
    pub spqr: bool,

    /// Splice chains collapsed in earlier rounds into the chains that contain them.
    #[cfg_attr(
        feature = "cli",
        arg(long, action = ArgAction::Set, default_value_t = RunArgs::default().merge_chains)
    )]
    pub merge_chains: bool,

    /// Also write the collapsed graph and every SPQR tree as DOT files.
    #[cfg_attr(feature = "cli", arg(long, default_value_t = RunArgs::default().dot))]
    pub dot: bool,

    /// Show a progress bar over components.
    #[cfg_attr(
        feature = "cli",
        arg(long, action = ArgAction::Set, default_value_t = RunArgs::default().progress)
    )]
    #[serde(skip)]
    pub progress: bool,

    /// Number of CPU threads to use.
    #[cfg_attr(
        feature = "cli",
        clap(short = 't', long, default_value_t = RunArgs::default().threads)
    )]
    #[serde(skip)]
    pub threads: usize,
}

impl Default for RunArgs {
    fn default() -> Self {
        RunArgs {
            input: PathBuf::new(),
            output_dir: PathBuf::new(),
            max_nodes: MAX_NODES,
            max_edges: MAX_EDGES,
            patterns: true,
            spqr: true,
            merge_chains: true,
            dot: false,
            progress: false,
            threads: 1,
        }
    }
}

impl RunArgs {
    /// Returns the analysis switches and size limits.
    pub fn config(&self) -> DecomposeConfig {
        DecomposeConfig {
            max_nodes: self.max_nodes,
            max_edges: self.max_edges,
            patterns: self.patterns,
            spqr: self.spqr,
            merge_chains: self.merge_chains,
        }
    }

    /// Reads [`RunArgs`] from a JSON file.
    pub fn read<P>(path: &P) -> Result<RunArgs, Report>
    where
        P: AsRef<Path> + Debug,
    {
        let input = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read run arguments: {path:?}."))?;
        let mut run_args: RunArgs = serde_json::from_str(&input)
            .wrap_err_with(|| format!("Failed to deserialize run arguments: {input}"))?;
        // skipped fields come back zeroed
        run_args.threads = RunArgs::default().threads;
        Ok(run_args)
    }

    /// Write [`RunArgs`] to a JSON file.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use tangle::run::RunArgs;
    /// let dir = tempfile::tempdir()?;
    /// let path = dir.path().join("run_args.json");
    /// RunArgs::write(&RunArgs::default(), &path)?;
    /// assert_eq!(RunArgs::read(&path)?, RunArgs::default());
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn write<P>(&self, path: &P) -> Result<(), Report>
    where
        P: AsRef<Path> + Debug,
    {
        utils::create_parent_dir(path)?;
        let output = serde_json::to_string_pretty(self)
            .wrap_err(format!("Failed to serialize run arguments: {self:?}"))?;
        std::fs::write(path, output)
            .wrap_err(format!("Failed to write run arguments: {path:?}"))?;
        Ok(())
    }
}
