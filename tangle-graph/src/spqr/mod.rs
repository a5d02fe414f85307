//! SPQR-tree decomposition of one bicomponent.
//!
//! The bicomponent is split apart at separation pairs until every piece is
//! a cycle (S), a bond of parallel edges (P) or a triconnected graph (R).
//! Each split adds a virtual edge to both halves. Adjacent S pieces and
//! adjacent P pieces are merged afterwards, which makes the tree unique.

use crate::bicomponent::{lowpoints, Bicomponent, SimpleGraph};
use crate::ToDot;
use color_eyre::eyre::{eyre, ContextCompat, Report, Result};
use itertools::Itertools;
use log::debug;
use petgraph::dot::{Config, Dot};
use petgraph::graph::Graph;
use petgraph::unionfind::UnionFind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};


// ----------------------------------------------------------------------------
// Metanodes
// ----------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize, strum::Display)]
pub enum MetanodeKind {
    /// A cycle.
    #[strum(serialize = "S")]
    Series,
    /// Two nodes joined by three or more edges.
    #[strum(serialize = "P")]
    Parallel,
    /// A triconnected graph.
    #[strum(serialize = "R")]
    Rigid,
}

/// An edge of a skeleton standing for the subgraph held by another metanode.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct VirtualEdge {
    pub u: usize,
    pub v: usize,
    /// Position of the metanode on the other side of the edge.
    pub twin: usize,
}

/// A node of the [`SpqrTree`] and its skeleton graph.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Metanode {
    pub kind: MetanodeKind,
    /// Node positions of the skeleton, sorted.
    pub nodes: Vec<usize>,
    /// Simple edge positions of the skeleton, sorted.
    pub real_edges: Vec<usize>,
    pub virtual_edges: Vec<VirtualEdge>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    /// Number of metanodes below this one.
    pub descendant_count: usize,
    /// Child numbers on the way down from the root, which is `[0]`.
    pub position: Vec<usize>,
}

impl Metanode {
    /// Returns the dotted tree position, `0` for the root, `0.2` for its second child.
    pub fn path(&self) -> String {
        self.position.iter().join(".")
    }

    /// Returns the number of skeleton edges, real and virtual.
    pub fn skeleton_edge_count(&self) -> usize {
        self.real_edges.len() + self.virtual_edges.len()
    }
}

// ----------------------------------------------------------------------------
// SPQR Tree
// ----------------------------------------------------------------------------

/// The SPQR tree of one [`Bicomponent`].
///
/// Metanodes are stored in preorder, so the root is `0` and the subtree of
/// metanode `m` is `m..=m + descendant_count`.
///
/// ```rust
/// use tangle_graph::{AssemblyGraph, SpqrTree, MetanodeKind};
/// use tangle_graph::bicomponent::SimpleGraph;
/// // a square with one diagonal
/// let graph = AssemblyGraph::from([("a", "b"), ("b", "c"), ("c", "d"), ("d", "a"), ("a", "c")]);
/// let component = &graph.components()[0];
/// let simple = SimpleGraph::new(component.node_count(), &component.topology()?);
/// let block_cut = simple.block_cut();
/// let tree = SpqrTree::build(&simple, &block_cut.bicomponents[0])?;
///
/// let kinds: Vec<_> = tree.metanodes.iter().map(|m| m.kind).collect();
/// assert_eq!(kinds, [MetanodeKind::Series, MetanodeKind::Parallel, MetanodeKind::Series]);
/// assert_eq!(tree.separation_pairs(), [(0, 2)]);
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SpqrTree {
    /// Id of the bicomponent the tree decomposes.
    pub bicomponent: usize,
    pub metanodes: Vec<Metanode>,
}

impl SpqrTree {
    /// Decompose `bicomponent` of `graph`.
    ///
    /// A bridge gives a single series metanode holding its one real edge.
    ///
    /// ## Errors
    ///
    /// The bicomponent is empty, or is found not to be biconnected.
    pub fn build(graph: &SimpleGraph, bicomponent: &Bicomponent) -> Result<Self, Report> {
        if bicomponent.edges.is_empty() {
            return Err(eyre!("Bicomponent {} has no edges.", bicomponent.id));
        }
        let piece = bicomponent
            .edges
            .iter()
            .map(|&e| {
                let (u, v) = graph.endpoints(e);
                PieceEdge { u, v, tag: Tag::Real(e) }
            })
            .collect_vec();

        let mut splitter = Splitter::default();
        splitter.split(piece)?;
        let groups = splitter.merge();
        let tree = SpqrTree::assemble(bicomponent.id, groups)?;

        if tree.subtree_edges(0) != bicomponent.edges {
            return Err(eyre!(
                "SPQR tree of bicomponent {} does not hold each of its edges exactly once.",
                bicomponent.id
            ));
        }
        debug!("Bicomponent {}: {} metanodes.", bicomponent.id, tree.metanodes.len());
        Ok(tree)
    }

    pub fn root(&self) -> Option<&Metanode> {
        self.metanodes.first()
    }

    /// Returns the positions of `metanode` and everything below it.
    pub fn subtree(&self, metanode: usize) -> std::ops::RangeInclusive<usize> {
        let descendants = self.metanodes.get(metanode).map(|m| m.descendant_count).unwrap_or(0);
        metanode..=metanode + descendants
    }

    /// Returns every node of the fully expanded subgraph below `metanode`.
    pub fn subtree_nodes(&self, metanode: usize) -> Vec<usize> {
        self.subtree(metanode)
            .flat_map(|m| self.metanodes[m].nodes.iter().copied())
            .sorted()
            .dedup()
            .collect()
    }

    /// Returns every real edge of the fully expanded subgraph below `metanode`.
    pub fn subtree_edges(&self, metanode: usize) -> Vec<usize> {
        self.subtree(metanode)
            .flat_map(|m| self.metanodes[m].real_edges.iter().copied())
            .sorted()
            .collect()
    }

    /// Returns the metanode behind virtual edge number `edge` of `metanode`.
    ///
    /// This is one step of the lazily expanded view. Following every virtual
    /// edge away from the root walks [`SpqrTree::subtree`] in preorder, and
    /// [`SpqrTree::subtree_nodes`] and [`SpqrTree::subtree_edges`] give the
    /// fully expanded result without rebuilding any skeleton.
    pub fn expand(&self, metanode: usize, edge: usize) -> Result<&Metanode, Report> {
        let twin = self
            .metanodes
            .get(metanode)
            .and_then(|m| m.virtual_edges.get(edge))
            .map(|e| e.twin)
            .wrap_err_with(|| format!("Metanode {metanode} has no virtual edge {edge}."))?;
        self.metanodes.get(twin).wrap_err_with(|| format!("Metanode {twin} does not exist."))
    }

    /// Returns the node pairs whose removal splits the bicomponent, sorted.
    pub fn separation_pairs(&self) -> Vec<(usize, usize)> {
        self.metanodes
            .iter()
            .flat_map(|m| m.virtual_edges.iter().map(|e| (e.u, e.v)))
            .sorted()
            .dedup()
            .collect()
    }

    /// Give the merged pieces a root, parents and preorder positions.
    fn assemble(
        bicomponent: usize,
        groups: Vec<(MetanodeKind, Vec<PieceEdge>)>,
    ) -> Result<Self, Report> {
        let node_sets = groups.iter().map(|(_, edges)| nodes_of(edges)).collect_vec();

        // tree edges: virtual id -> the two groups holding it
        let mut holders: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (g, (_, edges)) in groups.iter().enumerate() {
            for id in edges.iter().filter_map(|e| e.tag.virtual_id()) {
                holders.entry(id).or_default().push(g);
            }
        }
        let twin_of = |id: usize, g: usize| -> Result<usize, Report> {
            match holders.get(&id).map(|h| h.as_slice()) {
                Some(&[a, b]) => Ok(if a == g { b } else { a }),
                _ => Err(eyre!(
                    "Virtual edge {id} of bicomponent {bicomponent} is not shared by two metanodes."
                )),
            }
        };

        // largest skeleton first, earliest group on ties
        let root = (0..groups.len())
            .rev()
            .max_by_key(|&g| node_sets[g].len())
            .wrap_err("No metanodes were built.")?;

        let mut order = Vec::with_capacity(groups.len());
        let mut parent: Vec<Option<usize>> = vec![None; groups.len()];
        let mut position: Vec<Vec<usize>> = vec![Vec::new(); groups.len()];
        let mut visited = vec![false; groups.len()];
        let mut stack = vec![root];
        position[root] = vec![0];
        visited[root] = true;
        while let Some(g) = stack.pop() {
            order.push(g);
            let mut children = Vec::new();
            for id in groups[g].1.iter().filter_map(|e| e.tag.virtual_id()) {
                let child = twin_of(id, g)?;
                if !visited[child] {
                    visited[child] = true;
                    parent[child] = Some(g);
                    let number = children.len() + 1;
                    position[child] = position[g].iter().copied().chain([number]).collect();
                    children.push(child);
                }
            }
            stack.extend(children.into_iter().rev());
        }
        if order.len() != groups.len() {
            return Err(eyre!("SPQR tree of bicomponent {bicomponent} is not connected."));
        }

        let new_id: HashMap<usize, usize> =
            order.iter().enumerate().map(|(i, &g)| (g, i)).collect();
        let mut metanodes = Vec::with_capacity(order.len());
        for &g in &order {
            let (kind, edges) = &groups[g];
            let mut virtual_edges = Vec::new();
            for e in edges {
                if let Some(id) = e.tag.virtual_id() {
                    let (u, v) = (e.u.min(e.v), e.u.max(e.v));
                    virtual_edges.push(VirtualEdge { u, v, twin: new_id[&twin_of(id, g)?] });
                }
            }
            let children = virtual_edges
                .iter()
                .map(|e| e.twin)
                .filter(|&t| parent[order[t]] == Some(g))
                .collect();
            metanodes.push(Metanode {
                kind: *kind,
                nodes: node_sets[g].clone(),
                real_edges: edges.iter().filter_map(|e| e.tag.real_id()).sorted().collect(),
                virtual_edges,
                parent: parent[g].map(|p| new_id[&p]),
                children,
                descendant_count: 0,
                position: position[g].clone(),
            });
        }
        for m in (0..metanodes.len()).rev() {
            let below: usize =
                metanodes[m].children.iter().map(|&c| metanodes[c].descendant_count + 1).sum();
            metanodes[m].descendant_count = below;
        }
        Ok(SpqrTree { bicomponent, metanodes })
    }
}

impl ToDot for SpqrTree {
    /// Returns the metanode tree in DOT format.
    fn to_dot(&self) -> Result<String, Report> {
        let mut graph: Graph<String, String> = Graph::new();
        let ix = self
            .metanodes
            .iter()
            .map(|m| graph.add_node(format!("{} {}", m.kind, m.path())))
            .collect_vec();
        for (m, metanode) in self.metanodes.iter().enumerate() {
            for e in metanode.virtual_edges.iter().filter(|e| metanode.children.contains(&e.twin)) {
                graph.add_edge(ix[m], ix[e.twin], format!("{}-{}", e.u, e.v));
            }
        }
        Ok(Dot::with_config(&graph, &[Config::EdgeNoLabel]).to_string())
    }
}

// ----------------------------------------------------------------------------
// Splitting
// ----------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Tag {
    Real(usize),
    Virtual(usize),
}

impl Tag {
    fn real_id(&self) -> Option<usize> {
        match self {
            Tag::Real(e) => Some(*e),
            Tag::Virtual(_) => None,
        }
    }

    fn virtual_id(&self) -> Option<usize> {
        match self {
            Tag::Virtual(v) => Some(*v),
            Tag::Real(_) => None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct PieceEdge {
    u: usize,
    v: usize,
    tag: Tag,
}

impl PieceEdge {
    /// Returns the end nodes, smaller first.
    fn key(&self) -> (usize, usize) {
        (self.u.min(self.v), self.u.max(self.v))
    }

    fn other(&self, n: usize) -> usize {
        if self.u == n {
            self.v
        } else {
            self.u
        }
    }
}

fn nodes_of(edges: &[PieceEdge]) -> Vec<usize> {
    edges.iter().flat_map(|e| [e.u, e.v]).sorted().dedup().collect()
}

enum Step {
    Done(MetanodeKind, Vec<PieceEdge>),
    Split(Vec<PieceEdge>, Vec<PieceEdge>),
}

#[derive(Default)]
struct Splitter {
    next_virtual: usize,
    done: Vec<(MetanodeKind, Vec<PieceEdge>)>,
}

impl Splitter {
    /// Split `piece` down to S, P and R pieces.
    fn split(&mut self, piece: Vec<PieceEdge>) -> Result<(), Report> {
        let mut work = vec![piece];
        while let Some(piece) = work.pop() {
            match self.step(piece)? {
                Step::Done(kind, piece) => self.done.push((kind, piece)),
                Step::Split(first, second) => {
                    work.push(second);
                    work.push(first);
                }
            }
        }
        Ok(())
    }

    /// Split `piece` in two along a fresh virtual edge between `u` and `v`.
    fn cut(&mut self, piece: Vec<PieceEdge>, inside: &HashSet<usize>, u: usize, v: usize) -> Step {
        let tag = Tag::Virtual(self.next_virtual);
        self.next_virtual += 1;
        let (mut first, mut second): (Vec<_>, Vec<_>) =
            piece.into_iter().enumerate().partition_map(|(i, e)| match inside.contains(&i) {
                true => itertools::Either::Left(e),
                false => itertools::Either::Right(e),
            });
        first.push(PieceEdge { u, v, tag });
        second.push(PieceEdge { u, v, tag });
        Step::Split(first, second)
    }

    fn step(&mut self, piece: Vec<PieceEdge>) -> Result<Step, Report> {
        let nodes = nodes_of(&piece);
        if nodes.len() == 2 {
            let kind = match piece.len() {
                1 => MetanodeKind::Series,
                _ => MetanodeKind::Parallel,
            };
            return Ok(Step::Done(kind, piece));
        }

        // a bundle of parallel edges becomes a bond
        let mut bundles: BTreeMap<(usize, usize), HashSet<usize>> = BTreeMap::new();
        piece.iter().enumerate().for_each(|(i, e)| {
            bundles.entry(e.key()).or_default().insert(i);
        });
        if let Some((&(u, v), bundle)) = bundles.iter().find(|(_, b)| b.len() >= 2) {
            let bundle = bundle.clone();
            return Ok(self.cut(piece, &bundle, u, v));
        }

        let mut incident: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (i, e) in piece.iter().enumerate() {
            incident.entry(e.u).or_default().push(i);
            incident.entry(e.v).or_default().push(i);
        }
        if incident.values().all(|edges| edges.len() == 2) {
            return Ok(Step::Done(MetanodeKind::Series, piece));
        }

        // a path through degree-two nodes becomes a cycle closed by a virtual edge
        if let Some(&start) = incident.iter().find(|(_, edges)| edges.len() == 2).map(|(n, _)| n) {
            let mut path = HashSet::new();
            let mut ends = Vec::with_capacity(2);
            for &first in &incident[&start] {
                let (mut node, mut edge) = (start, first);
                loop {
                    path.insert(edge);
                    node = piece[edge].other(node);
                    if node == start {
                        return Err(eyre!("Series path through node {start} never leaves it."));
                    }
                    if incident[&node].len() != 2 {
                        break;
                    }
                    edge = *incident[&node]
                        .iter()
                        .find(|&&e| e != edge)
                        .wrap_err("Broken series path.")?;
                }
                ends.push(node);
            }
            if ends[0] == ends[1] {
                return Err(eyre!("Node {} separates a piece that should be biconnected.", ends[0]));
            }
            return Ok(self.cut(piece, &path, ends[0], ends[1]));
        }

        if let Some((a, b, class)) = separation_pair(&piece, &nodes) {
            return Ok(self.cut(piece, &class, a, b));
        }
        Ok(Step::Done(MetanodeKind::Rigid, piece))
    }

    /// Merge S pieces sharing a virtual edge, and P pieces sharing a virtual edge.
    fn merge(self) -> Vec<(MetanodeKind, Vec<PieceEdge>)> {
        let mut holders: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (p, (_, edges)) in self.done.iter().enumerate() {
            for id in edges.iter().filter_map(|e| e.tag.virtual_id()) {
                holders.entry(id).or_default().push(p);
            }
        }

        let mut uf = UnionFind::new(self.done.len());
        let mut dissolved = HashSet::new();
        for (id, pieces) in &holders {
            if let [p, q] = pieces.as_slice() {
                let (kp, kq) = (self.done[*p].0, self.done[*q].0);
                if kp == kq && kp != MetanodeKind::Rigid {
                    uf.union(*p, *q);
                    dissolved.insert(*id);
                }
            }
        }

        let mut groups: Vec<(MetanodeKind, Vec<PieceEdge>)> = Vec::new();
        let mut group_of: HashMap<usize, usize> = HashMap::new();
        for (p, (kind, edges)) in self.done.into_iter().enumerate() {
            let g = *group_of.entry(uf.find(p)).or_insert_with(|| {
                groups.push((kind, Vec::new()));
                groups.len() - 1
            });
            let kept = edges
                .into_iter()
                .filter(|e| e.tag.virtual_id().map_or(true, |id| !dissolved.contains(&id)));
            groups[g].1.extend(kept);
        }
        groups
    }
}

/// Returns a separation pair `(a, b)` of `piece` and the edges on one side of it.
///
/// The side is the one holding the smallest node other than `a` and `b`.
/// Each candidate `a` reruns the low-point search on the piece without it,
/// so one call is `O(n * m)` and a whole rigid-heavy split is superlinear.
fn separation_pair(piece: &[PieceEdge], nodes: &[usize]) -> Option<(usize, usize, HashSet<usize>)> {
    let local: HashMap<usize, usize> = nodes.iter().enumerate().map(|(i, &n)| (n, i)).collect();
    for &a in nodes {
        let mut adjacency = vec![Vec::new(); nodes.len()];
        for (i, e) in piece.iter().enumerate().filter(|(_, e)| e.u != a && e.v != a) {
            let (x, y) = (local[&e.u], local[&e.v]);
            adjacency[x].push((y, i));
            adjacency[y].push((x, i));
        }
        let Some(&b) = lowpoints(&adjacency).articulation_points.first() else { continue };
        let b = nodes[b];

        // nodes reachable from the smallest other node without crossing a or b
        let start = nodes.iter().copied().find(|&n| n != a && n != b)?;
        let mut side = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(n) = queue.pop_front() {
            for &(m, _) in &adjacency[local[&n]] {
                let m = nodes[m];
                if m != b && side.insert(m) {
                    queue.push_back(m);
                }
            }
        }
        let class =
            piece.iter().positions(|e| side.contains(&e.u) || side.contains(&e.v)).collect();
        return Some((a, b, class));
    }
    None
}
