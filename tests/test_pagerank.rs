/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

mod common;

use common::*;
use dsi_progress_logger::ProgressLogger;
use predicates::prelude::*;
use std::collections::HashMap;
use weighted_pagerank::prelude::*;

fn rank_map(g: &mut WeightedGraph<f64>, alpha: f64, epsilon: f64) -> HashMap<u64, f64> {
    let mut actual = HashMap::new();
    g.rank(alpha, epsilon, |id, rank| {
        assert!(actual.insert(id, rank).is_none(), "node {id} reported twice");
    })
    .unwrap();
    actual
}

fn rank_vec(g: &mut WeightedGraph<f64>) -> Vec<(u64, f64)> {
    let mut actual = Vec::new();
    g.rank(0.85, 1E-6, |id, rank| actual.push((id, rank)))
        .unwrap();
    actual
}

#[test]
fn test_empty() {
    let mut g = WeightedGraph::<f64>::new();
    let mut calls = 0;
    let stats = g.rank(0.85, 1E-6, |_, _| calls += 1).unwrap();
    assert_eq!(calls, 0);
    assert_eq!(stats.iterations, 0);

    let mut pr = PageRank::new(&mut g);
    pr.run().unwrap();
    assert!(pr.rank().is_empty());
    assert!(pr.ranks().is_empty());
}

#[test]
fn test_simple() {
    let mut g = WeightedGraph::new();
    g.link(1, 2, 1.0);
    g.link(1, 3, 1.0);
    g.link(2, 3, 1.0);
    g.link(2, 4, 1.0);
    g.link(3, 1, 1.0);

    let actual = rank_map(&mut g, 0.85, 1E-6);
    assert_ranks(
        &actual,
        &[
            (1, 0.32721836185043207),
            (2, 0.2108699481253495),
            (3, 0.3004897566512289),
            (4, 0.16142193337298952),
        ],
        1E-12,
    );
}

#[test]
fn test_weighted() {
    let mut g = WeightedGraph::new();
    g.link(1, 2, 1.0);
    g.link(1, 3, 2.0);
    g.link(2, 3, 3.0);
    g.link(2, 4, 4.0);
    g.link(3, 1, 5.0);

    let actual = rank_map(&mut g, 0.85, 1E-6);
    assert_ranks(
        &actual,
        &[
            (1, 0.34983779905464363),
            (2, 0.1688733284604475),
            (3, 0.3295121849483849),
            (4, 0.15177668753652385),
        ],
        1E-12,
    );
}

#[test]
fn test_duplicates() {
    let mut g = WeightedGraph::new();
    g.link(1, 2, 1.0);
    g.link(1, 3, 2.0);
    g.link(2, 3, 3.0);
    g.link(2, 4, 4.0);
    g.link(3, 1, 5.0);

    g.link(1, 2, 6.0);
    g.link(1, 3, 7.0);

    let actual = rank_map(&mut g, 0.85, 1E-6);
    assert_ranks(
        &actual,
        &[
            (1, 0.3312334209098247),
            (2, 0.19655848316544225),
            (3, 0.3033555769882879),
            (4, 0.168852518936445),
        ],
        1E-12,
    );
}

#[test]
fn test_duplicates_after_reset() {
    let mut g = WeightedGraph::new();
    g.link(1, 2, 1.0);
    g.link(1, 3, 2.0);
    g.link(2, 3, 3.0);
    g.link(2, 4, 4.0);
    g.link(3, 1, 5.0);

    g.reset();

    g.link(1, 2, 6.0);
    g.link(1, 3, 7.0);

    let actual = rank_map(&mut g, 0.85, 1E-6);
    assert_ranks(
        &actual,
        &[
            (1, 0.25974019022001016),
            (2, 0.36163838837691914),
            (3, 0.37862142140307065),
        ],
        1E-12,
    );
}

#[test]
fn test_reset_matches_fresh_graph() {
    let mut g = WeightedGraph::from_arcs(random_arcs(50, 0.1, 0));
    rank_map(&mut g, 0.85, 1E-6);
    g.reset_with_capacity(100);
    let arcs = random_arcs(100, 0.05, 1);
    g.add_arcs(arcs.iter().copied());

    let mut fresh = WeightedGraph::from_arcs(arcs);
    assert_eq!(rank_vec(&mut g), rank_vec(&mut fresh));
}

#[test]
fn test_two_nodes() {
    // x₂ = (1 − α) / 2 + α x₁ + α x₂ / 2 with x₁ + x₂ = 1
    let mut g = WeightedGraph::new();
    g.link(1, 2, 3.0);
    let actual = rank_map(&mut g, 0.85, 1E-12);
    let expected = 0.925 / 1.425;
    assert_ranks(&actual, &[(1, 1.0 - expected), (2, expected)], 1E-10);
}

#[test]
fn test_self_loop() {
    let mut g = WeightedGraph::new();
    g.link(1, 1, 1.0);
    g.link(1, 2, 1.0);
    g.link(2, 1, 1.0);
    g.link(2, 2, 1.0);
    let actual = rank_map(&mut g, 0.85, 1E-12);
    assert_ranks(&actual, &[(1, 0.5), (2, 0.5)], 1E-12);
}

#[test]
fn test_sum_is_one() {
    for (n, p, seed) in [(10, 0.5, 0), (100, 0.1, 1), (1000, 0.01, 2)] {
        for alpha in [0.25, 0.5, 0.85, 0.99] {
            let mut g = WeightedGraph::from_arcs(random_arcs(n, p, seed));
            let mut sum = 0.0;
            let mut count = 0;
            g.rank(alpha, 1E-9, |_, rank| {
                assert!(rank > 0.0);
                sum += rank;
                count += 1;
            })
            .unwrap();
            assert_eq!(count, g.num_nodes());
            assert!((sum - 1.0).abs() < 1E-9, "n={n} alpha={alpha}: sum={sum}");
        }
    }
}

#[test]
fn test_dangling_mass_is_preserved() {
    // 3 and 4 are dangling
    let arcs = [(1, 2, 1.0), (2, 3, 1.0), (2, 4, 2.0), (1, 4, 1.0)];
    for iterations in 1..20 {
        let mut g = WeightedGraph::<f64>::from_arcs(arcs);
        let mut pr = PageRank::new(&mut g);
        let stats = pr.run_until(preds::MaxIter::from(iterations)).unwrap();
        assert_eq!(stats.iterations, iterations);
        let sum: f64 = pr.rank().iter().sum();
        assert!((sum - 1.0).abs() < 1E-12, "iteration {iterations}: sum={sum}");
    }
}

#[test]
fn test_split_link() {
    let mut whole = WeightedGraph::<f64>::new();
    whole.link(1, 2, 3.0);
    whole.link(2, 3, 1.0);
    whole.link(3, 1, 5.0);

    let mut split = WeightedGraph::<f64>::new();
    split.link(1, 2, 1.5);
    split.link(2, 3, 1.0);
    split.link(1, 2, 1.5);
    split.link(3, 1, 5.0);

    assert_eq!(whole, split);
    assert_eq!(rank_vec(&mut whole), rank_vec(&mut split));
}

#[test]
fn test_deterministic() {
    let arcs = random_arcs(500, 0.02, 3);
    let mut g0 = WeightedGraph::from_arcs(arcs.iter().copied());
    let mut g1 = WeightedGraph::from_arcs(arcs.iter().copied());
    let r0 = rank_vec(&mut g0);
    let r1 = rank_vec(&mut g1);
    // Bit-identical
    assert_eq!(
        r0.iter().map(|(id, r)| (*id, r.to_bits())).collect::<Vec<_>>(),
        r1.iter().map(|(id, r)| (*id, r.to_bits())).collect::<Vec<_>>()
    );
}

#[test]
fn test_rank_twice() {
    let mut g = WeightedGraph::from_arcs(random_arcs(100, 0.05, 4));
    let first = rank_vec(&mut g);
    assert!(g.is_normalized());
    let second = rank_vec(&mut g);
    assert_eq!(first, second);
}

#[test]
fn test_link_after_rank() {
    let arcs = random_arcs(30, 0.2, 5);
    let mut g = WeightedGraph::from_arcs(arcs.iter().copied());
    rank_vec(&mut g);
    g.link(sparse_id(0), sparse_id(1), 2.5);
    g.link(sparse_id(31), sparse_id(0), 1.0);

    let mut fresh = WeightedGraph::from_arcs(arcs);
    fresh.link(sparse_id(0), sparse_id(1), 2.5);
    fresh.link(sparse_id(31), sparse_id(0), 1.0);

    let r0 = rank_map(&mut g, 0.85, 1E-12);
    let r1 = rank_map(&mut fresh, 0.85, 1E-12);
    // Denormalization is exact only up to rounding
    assert!(l_inf_distance(&r0, &r1) < 1E-9);
}

#[test]
fn test_vs_power_method() {
    for (n, p, seed) in [(10, 0.5, 0), (100, 0.1, 1), (1000, 0.01, 2)] {
        let arcs = random_arcs(n, p, seed);
        for alpha in [0.25, 0.5, 0.85] {
            let expected = power_method(&arcs, alpha, 1E-12);
            let mut g = WeightedGraph::from_arcs(arcs.iter().copied());
            let actual = rank_map(&mut g, alpha, 1E-12);
            let dist = l_inf_distance(&expected, &actual);
            assert!(dist < 1E-9, "n={n} alpha={alpha}: L∞={dist}");
        }
    }
}

#[test]
fn test_not_converged() {
    let mut g = WeightedGraph::<f64>::from_arcs(random_arcs(100, 0.1, 6));
    let mut pr = PageRank::new(&mut g);
    pr.threshold(1E-300).max_iter(3);
    match pr.run() {
        Err(RankError::NotConverged {
            iterations,
            norm_delta,
            ..
        }) => {
            assert_eq!(iterations, 3);
            assert!(norm_delta > 1E-300);
        }
        other => panic!("Unexpected result {other:?}"),
    }
    // Partial results are available
    assert_eq!(pr.iterations(), 3);
    assert_eq!(pr.rank().len(), 100);
}

#[test]
fn test_bad_parameters_do_not_panic() {
    let arcs = [(1, 2, 1.0), (2, 3, 1.0), (3, 1, 1.0), (3, 4, 1.0)];
    for (alpha, threshold) in [
        (1.0, 1E-6),
        (1.5, 1E-6),
        (-0.5, 1E-6),
        (0.85, 0.0),
        (0.85, -1.0),
        (0.85, f64::NAN),
    ] {
        let mut g = WeightedGraph::<f64>::from_arcs(arcs);
        let mut pr = PageRank::new(&mut g);
        pr.alpha(alpha).threshold(threshold).max_iter(100);
        let _ = pr.run();
        assert!(pr.iterations() <= 100);
    }
}

#[test]
fn test_max_iter_zero_performs_one_iteration() {
    let mut g = WeightedGraph::<f64>::from_arcs(random_arcs(100, 0.1, 6));
    let mut pr = PageRank::new(&mut g);
    pr.threshold(1E-300).max_iter(0);
    assert!(matches!(
        pr.run(),
        Err(RankError::NotConverged { iterations: 1, .. })
    ));
    assert_eq!(pr.iterations(), 1);
    assert_eq!(pr.rank().len(), 100);
}

#[test]
fn test_run_until() -> anyhow::Result<()> {
    let mut g = WeightedGraph::<f64>::from_arcs(random_arcs(100, 0.1, 7));
    let mut pr = PageRank::new(&mut g);
    pr.alpha(0.5);
    let stats =
        pr.run_until(preds::L1Norm::try_from(1E-10)?.or(preds::MaxIter::from(1000)))?;
    assert!(stats.norm_delta <= 1E-10);
    assert!(stats.iterations < 1000);
    assert_eq!(stats.iterations, pr.iterations());
    assert!(preds::L1Norm::try_from(0.0).is_err());
    assert!(preds::L1Norm::try_from(f64::NAN).is_err());
    Ok(())
}

#[test]
fn test_rank_of() {
    let mut g =
        WeightedGraph::<f64>::from_arcs([(10, 20, 1.0), (20, 10, 1.0), (20, 30, 1.0)]);
    let mut pr = PageRank::new(&mut g);
    assert_eq!(pr.rank_of(10), None);
    pr.run().unwrap();
    let ranks = pr.ranks();
    assert_eq!(ranks.len(), 3);
    for id in [10, 20, 30] {
        assert_eq!(pr.rank_of(id), Some(ranks[&id]));
    }
    assert_eq!(pr.rank_of(40), None);
}

#[test]
fn test_single_precision() {
    let arcs = random_arcs(200, 0.05, 8);
    let mut g64 = WeightedGraph::from_arcs(arcs.iter().copied());
    let mut g32 =
        WeightedGraph::<f32>::from_arcs(arcs.iter().map(|&(s, t, w)| (s, t, w as f32)));
    let r64 = rank_map(&mut g64, 0.85, 1E-6);
    let mut r32 = HashMap::new();
    // Single precision cannot reach the same threshold on all graphs
    g32.rank(0.85, 1E-5, |id, rank| {
        r32.insert(id, rank as f64);
    })
    .unwrap();
    assert!(l_inf_distance(&r64, &r32) < 1E-4);
}

#[test]
fn test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut g = WeightedGraph::<f64>::from_arcs(random_arcs(100, 0.1, 9));
    let mut pl = ProgressLogger::default();
    let mut pr = PageRank::new(&mut g);
    let stats = pr.run_with_logging(&mut pl).unwrap();
    assert!(stats.norm_delta <= PageRank::<f64>::DEFAULT_THRESHOLD);
}
