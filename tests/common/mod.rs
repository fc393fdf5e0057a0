/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

#![allow(dead_code)]

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

/// Scatters small node numbers over the whole 64-bit space.
pub fn sparse_id(node: usize) -> u64 {
    (node as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Returns the arcs of a random weighted graph on `n` nodes in which each
/// arc is present with probability `p`. About a tenth of the nodes has no
/// outgoing arcs.
pub fn random_arcs(n: usize, p: f64, seed: u64) -> Vec<(u64, u64, f64)> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut arcs = Vec::new();
    for s in 0..n {
        if rng.random_bool(0.1) {
            continue;
        }
        for t in 0..n {
            if rng.random_bool(p) {
                arcs.push((sparse_id(s), sparse_id(t), rng.random_range(0.1..10.0)));
            }
        }
    }
    // Make sure that every node appears
    for s in 0..n {
        arcs.push((sparse_id(s), sparse_id((s + 1) % n), rng.random_range(0.1..10.0)));
    }
    arcs
}

/// Textbook weighted PageRank on a map of maps, used as a reference.
pub fn power_method(arcs: &[(u64, u64, f64)], alpha: f64, threshold: f64) -> HashMap<u64, f64> {
    let mut succ: HashMap<u64, HashMap<u64, f64>> = HashMap::new();
    let mut outbound: HashMap<u64, f64> = HashMap::new();
    for &(s, t, w) in arcs {
        *succ.entry(s).or_default().entry(t).or_default() += w;
        *outbound.entry(s).or_default() += w;
        outbound.entry(t).or_default();
    }
    let n = outbound.len();
    let inv_n = 1.0 / n as f64;
    let mut rank: HashMap<u64, f64> = outbound.keys().map(|&id| (id, inv_n)).collect();

    loop {
        let mut new_rank: HashMap<u64, f64> = outbound.keys().map(|&id| (id, 0.0)).collect();
        let mut dangling_rank = 0.0;
        for (&s, &out) in &outbound {
            if out > 0.0 {
                for (&t, &w) in &succ[&s] {
                    *new_rank.get_mut(&t).unwrap() += alpha * rank[&s] * w / out;
                }
            } else {
                dangling_rank += rank[&s];
            }
        }
        let mut diff = 0.0;
        for (id, r) in new_rank.iter_mut() {
            *r += (1.0 - alpha) * inv_n + alpha * dangling_rank * inv_n;
            diff += (*r - rank[id]).abs();
        }
        rank = new_rank;
        if diff <= threshold {
            return rank;
        }
    }
}

/// Returns the 𝓁-∞ distance (maximum absolute difference) between two
/// rankings on the same identifiers.
pub fn l_inf_distance(a: &HashMap<u64, f64>, b: &HashMap<u64, f64>) -> f64 {
    assert_eq!(a.len(), b.len());
    a.iter()
        .map(|(id, x)| (x - b[id]).abs())
        .fold(0.0, f64::max)
}

/// Checks that a ranking is approximately equal to an expected one.
pub fn assert_ranks(actual: &HashMap<u64, f64>, expected: &[(u64, f64)], tolerance: f64) {
    assert_eq!(actual.len(), expected.len(), "{actual:?}");
    for &(id, rank) in expected {
        let got = actual[&id];
        assert!(
            (got - rank).abs() < tolerance,
            "node {id}: expected {rank}, got {got}"
        );
    }
}
