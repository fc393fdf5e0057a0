/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Parallel normalization and power iteration.
//!
//! Both phases run on a [Rayon](rayon) thread pool that is built once and
//! reused for normalization and for every iteration.
//!
//! Normalization is embarrassingly parallel: each node divides its own arc
//! weights by its outbound total, so nodes are simply split among threads.
//!
//! Each iteration is made of two phases, each executed by
//! [broadcasting](rayon::ThreadPool::broadcast) a closure to all threads of
//! the pool; every thread processes a [static contiguous
//! slice](crate::utils::static_slice) of the nodes. The broadcast returns
//! only when all threads are done, which provides the barrier between
//! phases.
//!
//! 1. _Scatter_: each node reads its own rank from the current buffer and
//!    adds its contributions to the accumulators of its successors in the
//!    next buffer. Since several threads may target the same successor, the
//!    accumulators are [atomic](crate::utils::AtomicWeight): the exclusive
//!    access is limited to the single addition.
//! 2. _Update_: each thread adds the uniform contribution to the nodes of
//!    its slice, accumulates locally the norm delta and the rank of dangling
//!    nodes, and clears the current buffer. The local sums are combined in
//!    thread order.
//!
//! The buffers are then swapped. Because of the atomic additions the order
//! in which contributions are summed is nondeterministic, so results might
//! differ from those of the sequential implementation in the last bits.

use crate::graph::{Node, WeightedGraph};
use crate::utils::{static_slice, AtomicWeight, Weight};
use kahan::KahanSum;
use rayon::prelude::*;
use rayon::ThreadPool;
use std::sync::atomic::Ordering;

/// The minimum number of nodes processed by a Rayon task during
/// normalization.
const MIN_LEN: usize = 1024;

/// Builds a thread pool with the given number of threads, or as many
/// threads as available cores if `num_threads` is `None`.
pub fn thread_pool(
    num_threads: Option<usize>,
) -> Result<ThreadPool, rayon::ThreadPoolBuildError> {
    let num_threads = num_threads.unwrap_or_else(num_cpus::get);
    log::info!("Building a thread pool with {} threads", num_threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
}

/// Normalizes the arc weights of a graph in parallel.
///
/// This function does nothing if the graph is already normalized.
pub fn normalize<W: Weight>(thread_pool: &ThreadPool, graph: &mut WeightedGraph<W>) {
    if let Some(nodes) = graph.nodes_to_normalize() {
        thread_pool.install(|| {
            nodes
                .par_iter_mut()
                .with_min_len(MIN_LEN)
                .for_each(Node::normalize)
        });
    }
}

/// Parallel power iteration on normalized nodes.
///
/// `stop` is called after each iteration with the norm delta, and the
/// iteration stops when it returns true. Returns the last approximation.
pub fn iterate<W: Weight>(
    thread_pool: &ThreadPool,
    nodes: &[Node<W>],
    alpha: f64,
    mut stop: impl FnMut(f64) -> bool,
) -> Box<[W]> {
    let n = nodes.len();
    let inv_n = 1.0 / n as f64;
    let damping = W::from_f64(alpha);
    let init = W::from_f64(inv_n);
    let mut curr: Box<[W::Atomic]> = (0..n).map(|_| W::Atomic::new(init)).collect();
    let mut next: Box<[W::Atomic]> = (0..n).map(|_| W::Atomic::new(W::ZERO)).collect();

    let dangling_count = thread_pool.install(|| {
        nodes
            .par_iter()
            .with_min_len(MIN_LEN)
            .filter(|node| node.is_dangling())
            .count()
    });
    log::info!("{} dangling nodes", dangling_count);
    let mut dangling_rank = dangling_count as f64 * init.to_f64();

    loop {
        let base = W::from_f64((1.0 - alpha) * inv_n + alpha * dangling_rank * inv_n);

        // Scatter
        thread_pool.broadcast(|ctx| {
            for s in static_slice(n, ctx.num_threads(), ctx.index()) {
                let node = &nodes[s];
                if node.is_dangling() {
                    continue;
                }
                let share = damping * curr[s].load(Ordering::Relaxed);
                for (target, weight) in node.successors() {
                    next[target].fetch_add(share * weight, Ordering::Relaxed);
                }
            }
        });

        // Update
        let partial_sums = thread_pool.broadcast(|ctx| {
            let mut norm_delta = KahanSum::<f64>::new();
            let mut dangling_rank = KahanSum::<f64>::new();
            for i in static_slice(n, ctx.num_threads(), ctx.index()) {
                let rank = next[i].load(Ordering::Relaxed) + base;
                next[i].store(rank, Ordering::Relaxed);
                norm_delta += (rank - curr[i].load(Ordering::Relaxed)).abs().to_f64();
                if nodes[i].is_dangling() {
                    dangling_rank += rank.to_f64();
                }
                // The current buffer becomes the next one
                curr[i].store(W::ZERO, Ordering::Relaxed);
            }
            (norm_delta, dangling_rank)
        });

        let (norm_delta, dangling) = partial_sums.into_iter().fold(
            (KahanSum::<f64>::new(), KahanSum::<f64>::new()),
            |(norm0, dangling0), (norm1, dangling1)| (norm0 + norm1, dangling0 + dangling1),
        );
        dangling_rank = dangling.sum();

        std::mem::swap(&mut curr, &mut next);

        if stop(norm_delta.sum()) {
            return curr.iter().map(|x| x.load(Ordering::Relaxed)).collect();
        }
    }
}
