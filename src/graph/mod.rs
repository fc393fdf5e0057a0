/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Weighted graphs with sparse identifiers.

pub mod index;
pub mod weighted;

pub use index::IdIndex;
pub use weighted::{Node, WeightedGraph};

pub mod prelude {
    pub use super::index::IdIndex;
    pub use super::weighted::{Node, WeightedGraph};
}
