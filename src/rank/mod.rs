/*
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Ranking algorithms.

pub mod pagerank;
pub mod par;

pub mod prelude {
    pub use super::pagerank::{preds, PageRank, RankError, RankStats, Strategy};
}
