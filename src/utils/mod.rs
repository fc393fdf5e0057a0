/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Numeric and parallel support.

mod atomic_float;
pub use atomic_float::*;

mod partition;
pub use partition::*;

mod weight;
pub use weight::*;
