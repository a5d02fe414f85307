//! [Command-line interface](Cli) (CLI) of the main binary.

use crate::run::RunArgs;
use crate::utils::verbosity::Verbosity;
use clap::{Parser, Subcommand};
use indoc::indoc;
use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// CLI Entry Point
// ----------------------------------------------------------------------------

/// The command-line interface (CLI).
/// ---
/// The CLI is parsed from [`std::env::args`] in the main function:
/// ```no_run
/// use clap::Parser;
/// let args = tangle::Cli::parse();
/// ```
/// Arguments can also be given by hand:
/// ```rust
/// use clap::Parser;
/// use tangle::cli::{Cli, Command};
/// let input = [
///     "tangle", "run", "--input", "graph.json", "--output-dir", "output",
///     "--max-nodes", "500", "-v", "debug",
/// ];
/// let args = Cli::parse_from(input);
/// let Command::Run(run_args) = &args.command;
/// assert_eq!(run_args.max_nodes, 500);
/// assert_eq!(run_args.max_edges, 7999);
/// assert!(run_args.spqr);
/// serde_json::to_string_pretty(&args)?;
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
#[derive(Debug, Deserialize, Parser, Serialize)]
#[clap(name = "tangle", author, version)]
#[clap(about = "tangle decomposes genome assembly graphs into nested patterns and SPQR trees.")]
#[clap(after_help = indoc! {"
    Each weakly connected component of the input graph is analyzed independently.
    Components over the node or edge limit are skipped and listed in the summary."})]
pub struct Cli {
    #[clap(subcommand)]
    /// Pass CLI arguments to a particular [Command].
    #[clap(help = "Set the command.")]
    pub command: Command,

    /// Set the output [Verbosity] level.
    #[clap(short = 'v', long)]
    #[clap(value_enum, default_value_t = Verbosity::default())]
    #[clap(hide_possible_values = false)]
    #[clap(global = true)]
    #[clap(help = "Set the output verbosity level.")]
    pub verbosity: Verbosity,
}

/// CLI [commands](#variants).
#[derive(Debug, Deserialize, Serialize, Subcommand)]
pub enum Command {
    #[clap(about = "Decompose every component of an assembly graph.")]
    Run(RunArgs),
}
