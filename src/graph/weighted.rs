/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::index::IdIndex;
use crate::rank::pagerank::{PageRank, RankError, RankStats};
use crate::utils::Weight;
use std::collections::btree_map::{BTreeMap, Entry};

/// The per-node data of a [`WeightedGraph`].
///
/// A node stores the sum of the weights of its outgoing arcs and a map from
/// target slots to weights. Before [normalization](WeightedGraph::normalize)
/// the weights are the accumulated raw weights passed to
/// [`link`](WeightedGraph::link); after normalization they are divided by the
/// outbound total, and thus form a probability distribution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node<W> {
    outbound: W,
    succ: BTreeMap<usize, W>,
}

impl<W: Weight> Node<W> {
    /// Returns the sum of the raw weights of the outgoing arcs.
    #[inline(always)]
    pub fn outbound(&self) -> W {
        self.outbound
    }

    /// Returns the number of distinct targets.
    #[inline(always)]
    pub fn outdegree(&self) -> usize {
        self.succ.len()
    }

    /// Returns true if the node has no outgoing weight.
    ///
    /// Such a node has no distribution along which to scatter its rank, so
    /// its rank is redistributed uniformly among all nodes.
    #[inline(always)]
    pub fn is_dangling(&self) -> bool {
        // Negated so that NaN totals are dangling, too
        !(self.outbound > W::ZERO)
    }

    /// Returns an iterator on pairs (target slot, weight) in increasing
    /// target order.
    #[inline(always)]
    pub fn successors(&self) -> impl ExactSizeIterator<Item = (usize, W)> + '_ {
        self.succ.iter().map(|(&t, &w)| (t, w))
    }

    /// Returns the weight of the arc towards `target`, if any.
    pub fn weight(&self, target: usize) -> Option<W> {
        self.succ.get(&target).copied()
    }

    /// Divides the arc weights by the outbound total.
    ///
    /// Dangling nodes are left untouched.
    #[inline]
    pub(crate) fn normalize(&mut self) {
        if !self.is_dangling() {
            let outbound = self.outbound;
            for w in self.succ.values_mut() {
                *w /= outbound;
            }
        }
    }

    /// Multiplies the arc weights by the outbound total, undoing
    /// [`normalize`](Self::normalize) up to rounding.
    #[inline]
    fn denormalize(&mut self) {
        if !self.is_dangling() {
            let outbound = self.outbound;
            for w in self.succ.values_mut() {
                *w *= outbound;
            }
        }
    }
}

/// A mutable weighted directed graph with arbitrary 64-bit node identifiers.
///
/// Nodes are created implicitly by [`link`](Self::link) the first time their
/// identifier appears, either as a source or as a target, and are stored in a
/// vector in order of first appearance. The mapping from identifiers to
/// positions in the vector (_slots_) is kept by an [`IdIndex`].
///
/// Linking twice the same pair of nodes adds up the weights, so the order of
/// calls to [`link`](Self::link) does not matter.
///
/// The graph is consumed by a [`PageRank`] computation, which
/// [normalizes](Self::normalize) the weights in place. Normalization is
/// performed only once: linking new arcs into a normalized graph restores
/// first the raw weights.
///
/// # Examples
///
/// ```
/// use weighted_pagerank::graph::WeightedGraph;
///
/// let mut g = WeightedGraph::<f64>::new();
/// g.link(100, 200, 1.0);
/// g.link(100, 200, 2.0);
/// g.link(200, 300, 0.5);
/// assert_eq!(g.num_nodes(), 3);
/// assert_eq!(g.num_arcs(), 2);
/// assert_eq!(g.node(0).outbound(), 3.0);
/// assert!(g.node(2).is_dangling());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedGraph<W: Weight = f64> {
    index: IdIndex,
    nodes: Vec<Node<W>>,
    num_arcs: usize,
    normalized: bool,
}

impl<W: Weight> core::default::Default for WeightedGraph<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Weight> WeightedGraph<W> {
    /// The capacity used by [`new`](Self::new) and [`reset`](Self::reset).
    pub const DEFAULT_CAPACITY: usize = 8;

    /// Creates a new empty graph.
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Creates a new empty graph that can hold `capacity` nodes without
    /// reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            index: IdIndex::with_capacity(capacity),
            nodes: Vec::with_capacity(capacity),
            num_arcs: 0,
            normalized: false,
        }
    }

    /// Creates a new graph from an iterator of triples (source, target,
    /// weight).
    pub fn from_arcs(arcs: impl IntoIterator<Item = (u64, u64, W)>) -> Self {
        let mut g = Self::new();
        g.add_arcs(arcs);
        g
    }

    /// Links all triples (source, target, weight) returned by an iterator.
    pub fn add_arcs(
        &mut self,
        arcs: impl IntoIterator<Item = (u64, u64, W)>,
    ) -> &mut Self {
        for (source, target, weight) in arcs {
            self.link(source, target, weight);
        }
        self
    }

    /// Adds `weight` to the arc from `source` to `target`, creating the
    /// arc and the nodes if necessary.
    ///
    /// Weights are not validated: negative or non-finite weights do not
    /// cause a panic, but the resulting ranking is meaningless.
    pub fn link(&mut self, source: u64, target: u64, weight: W) {
        if self.normalized {
            self.denormalize();
        }
        let s = self.slot(source);
        let t = self.slot(target);
        let node = &mut self.nodes[s];
        node.outbound += weight;
        match node.succ.entry(t) {
            Entry::Vacant(entry) => {
                entry.insert(weight);
                self.num_arcs += 1;
            }
            Entry::Occupied(mut entry) => *entry.get_mut() += weight,
        }
    }

    /// Returns the slot of `id`, creating a node if necessary.
    #[inline]
    fn slot(&mut self, id: u64) -> usize {
        let slot = self.index.resolve(id);
        if slot == self.nodes.len() {
            self.nodes.push(Node::default());
        }
        slot
    }

    /// Removes all nodes and arcs.
    pub fn reset(&mut self) {
        self.reset_with_capacity(Self::DEFAULT_CAPACITY);
    }

    /// Removes all nodes and arcs, reserving space for `capacity` nodes.
    ///
    /// The storage of the previous graph is released.
    pub fn reset_with_capacity(&mut self, capacity: usize) {
        *self = Self::with_capacity(capacity);
    }

    /// Returns the number of nodes.
    #[inline(always)]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of distinct (source, target) pairs.
    #[inline(always)]
    pub fn num_arcs(&self) -> usize {
        self.num_arcs
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the identifier index.
    pub fn index(&self) -> &IdIndex {
        &self.index
    }

    /// Returns the node at a given slot.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is not smaller than [`num_nodes`](Self::num_nodes).
    #[inline(always)]
    pub fn node(&self, slot: usize) -> &Node<W> {
        &self.nodes[slot]
    }

    /// Returns the nodes in slot order.
    #[inline(always)]
    pub fn nodes(&self) -> &[Node<W>] {
        &self.nodes
    }

    /// Returns the node with a given identifier, if any.
    pub fn node_by_id(&self, id: u64) -> Option<&Node<W>> {
        self.index.get(id).map(|slot| &self.nodes[slot])
    }

    /// Returns true if the arc weights have been normalized.
    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    /// Turns the weights of the arcs leaving each non-dangling node into a
    /// probability distribution by dividing them by the outbound total.
    ///
    /// This method does nothing if the graph is already normalized.
    pub fn normalize(&mut self) {
        if !self.normalized {
            self.nodes.iter_mut().for_each(Node::normalize);
            self.normalized = true;
        }
    }

    fn denormalize(&mut self) {
        self.nodes.iter_mut().for_each(Node::denormalize);
        self.normalized = false;
    }

    /// Gives access to the nodes for normalization by other means, e.g., in
    /// parallel. The graph is marked as normalized.
    pub(crate) fn nodes_to_normalize(&mut self) -> Option<&mut [Node<W>]> {
        if self.normalized {
            None
        } else {
            self.normalized = true;
            Some(&mut self.nodes)
        }
    }

    /// Computes PageRank sequentially with damping factor `alpha` until the
    /// 𝓁₁ norm of the difference between successive approximations is at
    /// most `epsilon`, and then calls `on_result` with each identifier and
    /// its rank.
    ///
    /// The order in which nodes are passed to `on_result` is unspecified. If
    /// the graph is empty, `on_result` is never called.
    ///
    /// If the computation does not converge within
    /// [`PageRank::DEFAULT_MAX_ITER`] iterations an error is returned and
    /// `on_result` is not called; use [`PageRank`] directly to access partial
    /// results or to change the iteration cap.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use weighted_pagerank::graph::WeightedGraph;
    ///
    /// let mut g = WeightedGraph::<f64>::from_arcs([(1, 2, 1.0), (2, 1, 1.0)]);
    /// let mut ranks = HashMap::new();
    /// g.rank(0.85, 1E-9, |id, rank| {
    ///     ranks.insert(id, rank);
    /// })
    /// .unwrap();
    /// assert!((ranks[&1] - 0.5_f64).abs() < 1E-9);
    /// ```
    pub fn rank(
        &mut self,
        alpha: f64,
        epsilon: f64,
        on_result: impl FnMut(u64, W),
    ) -> Result<RankStats, RankError> {
        let mut pr = PageRank::new(self);
        pr.alpha(alpha).threshold(epsilon);
        let stats = pr.run()?;
        pr.for_each_rank(on_result);
        Ok(stats)
    }
}
