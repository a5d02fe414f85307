#![doc = include_str!("../README.md")]

use color_eyre::eyre::{Report, Result};

mod analysis;
pub mod bicomponent;
mod component;
pub mod decompose;
mod edge;
mod node;
pub mod pattern;
pub mod spqr;

#[doc(inline)]
pub use analysis::{analyze, Analysis, Biconnectivity, DecomposeConfig, MAX_EDGES, MAX_NODES};
#[doc(inline)]
pub use bicomponent::{Bicomponent, BlockCut};
#[doc(inline)]
pub use component::{AssemblyGraph, Component, Topology};
#[doc(inline)]
pub use decompose::{Collapser, Hierarchy, Pattern};
#[doc(inline)]
pub use edge::{Edge, LinkOrientation};
#[doc(inline)]
pub use node::{Node, Orientation};
#[doc(inline)]
pub use pattern::{PatternKind, Shape, Vertex};
#[doc(inline)]
pub use spqr::{Metanode, MetanodeKind, SpqrTree};

// ----------------------------------------------------------------------------
// Traits
// ----------------------------------------------------------------------------

/// Returns a [Dot](https://graphviz.org/doc/info/lang.html) graphviz [`String`]
/// created from an object.
pub trait ToDot {
    fn to_dot(&self) -> Result<String, Report>;
}
