/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Weighted PageRank by power iteration.
//!
//! # The formula
//!
//! Let *P* be the row-normalized weighted adjacency matrix of the graph, that
//! is, *pₛₜ* is the weight of the arc *s* → *t* divided by the sum of the
//! weights of the arcs leaving *s* (with zero rows for dangling nodes), let
//! **d** be the characteristic vector of dangling nodes, *n* the number of
//! nodes and α the damping factor. We compute the stationary distribution of
//!
//! > **x** = **x** ( α *P*  +  α **d**ᵀ **1**/*n*  +  (1 − α) **1**ᵀ **1**/*n* ),
//!
//! that is, the _weakly preferential_ PageRank with uniform preference: the
//! rank of dangling nodes (the _leak_) is redistributed uniformly, as is the
//! remaining 1 − α.
//!
//! # The power method
//!
//! Starting from the uniform vector, at each iteration
//!
//! 1. we compute the leak λ = α ∑ *xⱼ* over dangling *j*;
//! 2. every non-dangling node *s* adds α *xₛ* *pₛₜ* to the next
//!    approximation of each successor *t*;
//! 3. every node receives (1 − α) / *n* + λ / *n*.
//!
//! The current and next approximations are kept in two buffers that are
//! swapped at the end of each iteration, so that no node ever reads a value
//! written during the same iteration.
//!
//! # Stopping criteria
//!
//! The [`run`](PageRank::run) method stops when the 𝓁₁ norm of the
//! difference between two successive approximations is at most the
//! [threshold](PageRank::threshold), and fails with
//! [`RankError::NotConverged`] after [`max_iter`](PageRank::max_iter)
//! iterations. The [`run_until`](PageRank::run_until) method accepts instead
//! an arbitrary composable [`Predicate`] from the [`preds`] module that is
//! evaluated after each iteration.
//!
//! # Parallelism
//!
//! With [`Strategy::Parallel`] normalization and iterations are executed on
//! a Rayon thread pool; see the [`par`](super::par) module. The sequential
//! strategy is the reference implementation: its results are deterministic,
//! whereas the parallel strategy accumulates contributions in a nondeterministic
//! order and might differ in the last bits.

pub mod preds {
    //! Predicates implementing stopping conditions.
    //!
    //! The implementation of [PageRank](super::PageRank) requires a
    //! [predicate](Predicate) to stop the algorithm. This module provides a few
    //! such predicates: they evaluate to true if the computation should be
    //! stopped.
    //!
    //! You can combine the predicates using the `and` and `or` methods provided
    //! by the [`Predicate`] trait.
    //!
    //! # Examples
    //! ```
    //! # fn main() -> Result<(), Box<dyn std::error::Error>> {
    //! use predicates::prelude::*;
    //! use weighted_pagerank::rank::pagerank::preds::{L1Norm, MaxIter};
    //!
    //! let mut predicate = L1Norm::try_from(1E-6)?.boxed();
    //! predicate = predicate.or(MaxIter::from(100)).boxed();
    //! #     Ok(())
    //! # }
    //! ```

    use anyhow::ensure;
    use predicates::{reflection::PredicateReflection, Predicate};
    use std::fmt::Display;

    #[doc(hidden)]
    /// This structure is passed to stopping predicates to provide the
    /// information that is needed to evaluate them.
    #[derive(Debug)]
    pub struct PredParams {
        pub iteration: usize,
        pub norm_delta: f64,
    }

    /// Stops after at most the provided number of iterations.
    #[derive(Debug, Clone)]
    pub struct MaxIter {
        max_iter: usize,
    }

    impl MaxIter {
        pub const DEFAULT_MAX_ITER: usize = usize::MAX;
    }

    impl From<usize> for MaxIter {
        fn from(max_iter: usize) -> Self {
            MaxIter { max_iter }
        }
    }

    impl Default for MaxIter {
        fn default() -> Self {
            Self::from(Self::DEFAULT_MAX_ITER)
        }
    }

    impl Display for MaxIter {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_fmt(format_args!("(max iter: {})", self.max_iter))
        }
    }

    impl PredicateReflection for MaxIter {}

    impl Predicate<PredParams> for MaxIter {
        fn eval(&self, pred_params: &PredParams) -> bool {
            pred_params.iteration >= self.max_iter
        }
    }

    /// Stops when the 𝓁₁ norm of the difference between successive
    /// approximations is at most a given threshold.
    #[derive(Debug, Clone)]
    pub struct L1Norm {
        threshold: f64,
    }

    impl L1Norm {
        pub const DEFAULT_THRESHOLD: f64 = 1E-6;

        /// Builds a predicate without checking the threshold.
        pub(super) fn unchecked(threshold: f64) -> Self {
            L1Norm { threshold }
        }
    }

    impl TryFrom<Option<f64>> for L1Norm {
        type Error = anyhow::Error;
        fn try_from(threshold: Option<f64>) -> anyhow::Result<Self> {
            Ok(match threshold {
                Some(threshold) => {
                    ensure!(!threshold.is_nan());
                    ensure!(threshold > 0.0, "The threshold must be positive");
                    L1Norm { threshold }
                }
                None => Self::default(),
            })
        }
    }

    impl TryFrom<f64> for L1Norm {
        type Error = anyhow::Error;
        fn try_from(threshold: f64) -> anyhow::Result<Self> {
            Some(threshold).try_into()
        }
    }

    impl Default for L1Norm {
        fn default() -> Self {
            Self::unchecked(Self::DEFAULT_THRESHOLD)
        }
    }

    impl Display for L1Norm {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_fmt(format_args!("(norm: {})", self.threshold))
        }
    }

    impl PredicateReflection for L1Norm {}
    impl Predicate<PredParams> for L1Norm {
        fn eval(&self, pred_params: &PredParams) -> bool {
            pred_params.norm_delta <= self.threshold
        }
    }
}

use super::par;
use crate::graph::{Node, WeightedGraph};
use crate::utils::Weight;
use dsi_progress_logger::{no_logging, ProgressLog};
use kahan::KahanSum;
use predicates::prelude::*;
use rayon::ThreadPool;
use std::collections::HashMap;

/// Selects how the computation is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Runs on the calling thread. This is the default, and the reference
    /// implementation: results are deterministic.
    #[default]
    Sequential,
    /// Runs on a fixed pool of threads, each processing a contiguous slice
    /// of nodes.
    Parallel,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Sequential => f.write_str("sequential"),
            Strategy::Parallel => f.write_str("parallel"),
        }
    }
}

/// Errors that can occur while computing PageRank.
#[derive(thiserror::Error, Debug)]
pub enum RankError {
    /// The maximum number of iterations was reached before the norm delta
    /// fell below the threshold.
    #[error(
        "No convergence after {iterations} iterations (norm delta: {norm_delta}, threshold: {threshold})"
    )]
    NotConverged {
        iterations: usize,
        norm_delta: f64,
        threshold: f64,
    },
    /// The thread pool of the parallel strategy could not be built.
    #[error("Could not build the thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Summary of a completed computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankStats {
    /// The number of iterations performed.
    pub iterations: usize,
    /// The 𝓁₁ norm of the difference between the last two approximations.
    pub norm_delta: f64,
}

/// Computes the weighted PageRank of a [`WeightedGraph`].
///
/// The struct is configured via setters and then executed via
/// [`run`](Self::run). After completion the rank vector, indexed by slot, is
/// available via the [`rank`](Self::rank) method, and pairs (identifier,
/// rank) can be enumerated with [`for_each_rank`](Self::for_each_rank).
///
/// The computation normalizes the weights of the graph in place.
///
/// # Examples
///
/// ```
/// use weighted_pagerank::graph::WeightedGraph;
/// use weighted_pagerank::rank::pagerank::PageRank;
///
/// let mut g = WeightedGraph::<f64>::from_arcs([
///     (1, 2, 1.0),
///     (1, 3, 2.0),
///     (2, 3, 3.0),
///     (2, 4, 4.0),
///     (3, 1, 5.0),
/// ]);
///
/// let mut pr = PageRank::new(&mut g);
/// pr.alpha(0.85).threshold(1E-9);
/// let stats = pr.run().unwrap();
///
/// assert!(stats.norm_delta <= 1E-9);
/// assert!((pr.rank().iter().sum::<f64>() - 1.0).abs() < 1E-9);
/// assert!(pr.rank_of(1).unwrap() > pr.rank_of(4).unwrap());
/// ```
pub struct PageRank<'a, W: Weight = f64> {
    graph: &'a mut WeightedGraph<W>,
    alpha: f64,
    threshold: f64,
    max_iter: usize,
    strategy: Strategy,
    num_threads: Option<usize>,
    thread_pool: Option<ThreadPool>,

    rank: Box<[W]>,
    iteration: usize,
    norm_delta: f64,
}

impl<W: Weight> std::fmt::Debug for PageRank<'_, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageRank")
            .field("alpha", &self.alpha)
            .field("threshold", &self.threshold)
            .field("max_iter", &self.max_iter)
            .field("strategy", &self.strategy)
            .field("num_threads", &self.num_threads)
            .field("iteration", &self.iteration)
            .field("norm_delta", &self.norm_delta)
            .finish_non_exhaustive()
    }
}

impl<'a, W: Weight> PageRank<'a, W> {
    pub const DEFAULT_ALPHA: f64 = 0.85;
    pub const DEFAULT_THRESHOLD: f64 = preds::L1Norm::DEFAULT_THRESHOLD;
    pub const DEFAULT_MAX_ITER: usize = 10_000;

    /// Creates a new PageRank computation on the given graph.
    pub fn new(graph: &'a mut WeightedGraph<W>) -> Self {
        Self {
            graph,
            alpha: Self::DEFAULT_ALPHA,
            threshold: Self::DEFAULT_THRESHOLD,
            max_iter: Self::DEFAULT_MAX_ITER,
            strategy: Strategy::default(),
            num_threads: None,
            thread_pool: None,
            rank: Box::new([]),
            iteration: 0,
            norm_delta: f64::INFINITY,
        }
    }

    /// Sets the damping factor α.
    ///
    /// The value is not checked: outside of the interval [0 . . 1) the
    /// computation might not converge, or yield meaningless values.
    pub fn alpha(&mut self, alpha: f64) -> &mut Self {
        self.alpha = alpha;
        self
    }

    /// Sets the threshold on the 𝓁₁ norm of the difference between successive
    /// approximations used by [`run`](Self::run).
    pub fn threshold(&mut self, threshold: f64) -> &mut Self {
        self.threshold = threshold;
        self
    }

    /// Sets the maximum number of iterations performed by [`run`](Self::run).
    ///
    /// The stopping criterion is evaluated after each iteration, so at least
    /// one iteration is always performed, even if `max_iter` is zero.
    pub fn max_iter(&mut self, max_iter: usize) -> &mut Self {
        self.max_iter = max_iter;
        self
    }

    /// Sets the execution [strategy](Strategy).
    pub fn strategy(&mut self, strategy: Strategy) -> &mut Self {
        self.strategy = strategy;
        self
    }

    /// Sets the number of threads of the parallel strategy.
    ///
    /// `None` means the number of available cores. The thread pool is built
    /// on the first parallel run and reused by the following ones.
    pub fn num_threads(&mut self, num_threads: Option<usize>) -> &mut Self {
        if num_threads != self.num_threads {
            self.thread_pool = None;
        }
        self.num_threads = num_threads;
        self
    }

    /// Returns the rank vector, indexed by slot.
    ///
    /// After calling [`run`](Self::run), this contains the computed PageRank
    /// values; before, it is empty.
    pub fn rank(&self) -> &[W] {
        &self.rank
    }

    /// Returns the rank of the node with the given identifier.
    pub fn rank_of(&self, id: u64) -> Option<W> {
        self.graph
            .index()
            .get(id)
            .and_then(|slot| self.rank.get(slot).copied())
    }

    /// Calls `on_result` with each identifier and its rank.
    ///
    /// The order of the calls is unspecified. If the computation has not been
    /// run, or the graph is empty, `on_result` is never called.
    pub fn for_each_rank(&self, mut on_result: impl FnMut(u64, W)) {
        for (&id, &rank) in self.graph.index().ids().iter().zip(self.rank.iter()) {
            on_result(id, rank);
        }
    }

    /// Returns a map from identifiers to ranks.
    pub fn ranks(&self) -> HashMap<u64, W> {
        let mut ranks = HashMap::with_capacity(self.rank.len());
        self.for_each_rank(|id, rank| {
            ranks.insert(id, rank);
        });
        ranks
    }

    /// Returns the number of iterations performed by the last call to
    /// [`run`](Self::run).
    pub fn iterations(&self) -> usize {
        self.iteration
    }

    /// Returns the 𝓁₁ norm of the difference between the last two
    /// approximations.
    pub fn norm_delta(&self) -> f64 {
        self.norm_delta
    }

    /// Runs the computation until the norm delta is at most the
    /// [threshold](Self::threshold).
    ///
    /// If this does not happen within [`max_iter`](Self::max_iter) iterations,
    /// [`RankError::NotConverged`] is returned; the last approximation is
    /// nonetheless available via [`rank`](Self::rank).
    pub fn run(&mut self) -> Result<RankStats, RankError> {
        self.run_with_logging(no_logging![])
    }

    /// Runs the computation as [`run`](Self::run), logging progress.
    ///
    /// `pl` is a [`ProgressLog`] that is updated at each iteration. Its options
    /// will be preserved, making thus possible to customize the logs.
    pub fn run_with_logging(
        &mut self,
        pl: &mut impl ProgressLog,
    ) -> Result<RankStats, RankError> {
        if !(self.threshold > 0.0) {
            log::warn!("The threshold should be positive, got {}", self.threshold);
        }
        let predicate =
            preds::L1Norm::unchecked(self.threshold).or(preds::MaxIter::from(self.max_iter));
        let stats = self.run_until_with_logging(predicate, pl)?;

        if stats.norm_delta <= self.threshold || self.rank.is_empty() {
            Ok(stats)
        } else {
            log::warn!(
                "Stopped after {} iterations with norm delta {}",
                stats.iterations,
                stats.norm_delta
            );
            Err(RankError::NotConverged {
                iterations: stats.iterations,
                norm_delta: stats.norm_delta,
                threshold: self.threshold,
            })
        }
    }

    /// Runs the computation until the given predicate is satisfied.
    ///
    /// The [threshold](Self::threshold) and the [maximum number of
    /// iterations](Self::max_iter) are ignored.
    pub fn run_until(
        &mut self,
        predicate: impl Predicate<preds::PredParams>,
    ) -> Result<RankStats, RankError> {
        self.run_until_with_logging(predicate, no_logging![])
    }

    /// Runs the computation as [`run_until`](Self::run_until), logging
    /// progress.
    pub fn run_until_with_logging(
        &mut self,
        predicate: impl Predicate<preds::PredParams>,
        pl: &mut impl ProgressLog,
    ) -> Result<RankStats, RankError> {
        let n = self.graph.num_nodes();
        self.iteration = 0;
        if n == 0 {
            self.rank = Box::new([]);
            self.norm_delta = 0.0;
            return Ok(self.stats());
        }

        if !(0.0..1.0).contains(&self.alpha) {
            log::warn!(
                "The damping factor should be in [0 . . 1), got {}",
                self.alpha
            );
        }
        log::info!("Strategy: {}", self.strategy);
        log::info!("Alpha: {}", self.alpha);
        log::info!("Stopping criterion: {}", predicate);

        let alpha = self.alpha;
        let mut iteration = 0;
        let mut norm_delta = f64::INFINITY;

        pl.item_name("iteration");
        pl.expected_updates(None);
        pl.start(format!(
            "Computing PageRank on {} nodes and {} arcs (alpha={alpha})...",
            n,
            self.graph.num_arcs()
        ));

        let mut stop = |delta: f64| {
            iteration += 1;
            norm_delta = delta;
            log::debug!("Iteration {}: norm delta = {}", iteration, norm_delta);
            pl.update_and_display();
            predicate.eval(&preds::PredParams {
                iteration,
                norm_delta,
            })
        };

        self.rank = match self.strategy {
            Strategy::Sequential => {
                self.graph.normalize();
                iterate(self.graph.nodes(), alpha, &mut stop)
            }
            Strategy::Parallel => {
                let thread_pool = match self.thread_pool.take() {
                    Some(thread_pool) => thread_pool,
                    None => par::thread_pool(self.num_threads)?,
                };
                let thread_pool = &*self.thread_pool.insert(thread_pool);
                par::normalize(thread_pool, self.graph);
                par::iterate(thread_pool, self.graph.nodes(), alpha, &mut stop)
            }
        };

        pl.done();

        self.iteration = iteration;
        self.norm_delta = norm_delta;
        log::info!(
            "Completed {} iterations, norm delta = {}",
            self.iteration,
            self.norm_delta
        );
        Ok(self.stats())
    }

    fn stats(&self) -> RankStats {
        RankStats {
            iterations: self.iteration,
            norm_delta: self.norm_delta,
        }
    }
}

/// Sequential power iteration on normalized nodes.
///
/// `stop` is called after each iteration with the norm delta, and the
/// iteration stops when it returns true. Returns the last approximation.
fn iterate<W: Weight>(
    nodes: &[Node<W>],
    alpha: f64,
    mut stop: impl FnMut(f64) -> bool,
) -> Box<[W]> {
    let n = nodes.len();
    let inv_n = 1.0 / n as f64;
    let damping = W::from_f64(alpha);
    let mut curr = vec![W::from_f64(inv_n); n].into_boxed_slice();
    let mut next = vec![W::ZERO; n].into_boxed_slice();

    loop {
        let mut leak = KahanSum::<f64>::new();
        for (node, &rank) in nodes.iter().zip(curr.iter()) {
            if node.is_dangling() {
                leak += rank.to_f64();
            }
        }
        let leak = alpha * leak.sum();
        let base = W::from_f64((1.0 - alpha) * inv_n + leak * inv_n);

        for (node, &rank) in nodes.iter().zip(curr.iter()) {
            if node.is_dangling() {
                continue;
            }
            let share = damping * rank;
            for (target, weight) in node.successors() {
                next[target] += share * weight;
            }
        }

        let mut norm_delta = KahanSum::<f64>::new();
        for (c, x) in curr.iter_mut().zip(next.iter_mut()) {
            *x += base;
            norm_delta += (*x - *c).abs().to_f64();
            // The current buffer becomes the next one
            *c = W::ZERO;
        }

        std::mem::swap(&mut curr, &mut next);

        if stop(norm_delta.sum()) {
            return curr;
        }
    }
}
