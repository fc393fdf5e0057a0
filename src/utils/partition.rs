/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use core::ops::Range;

/// Static contiguous partitioning of a range of nodes among threads.
///
/// The range `0..len` is split into `parts` contiguous slices whose lengths
/// differ by at most one, the longer slices coming first. A thread that
/// finishes its slice does not steal work from the others: this is adequate
/// when the work per node is roughly uniform.
///
/// # Panics
///
/// This method will panic if `parts` is zero or `index` is not smaller than
/// `parts`.
///
/// # Examples
///
/// ```
/// use weighted_pagerank::utils::static_slice;
///
/// assert_eq!(static_slice(10, 3, 0), 0..4);
/// assert_eq!(static_slice(10, 3, 1), 4..7);
/// assert_eq!(static_slice(10, 3, 2), 7..10);
/// assert_eq!(static_slice(2, 4, 3), 2..2);
/// ```
pub fn static_slice(len: usize, parts: usize, index: usize) -> Range<usize> {
    assert!(parts > 0, "The number of parts must be positive");
    assert!(
        index < parts,
        "Slice index {index} out of range for {parts} parts"
    );
    let base = len / parts;
    let rem = len % parts;
    let start = index * base + index.min(rem);
    let end = start + base + usize::from(index < rem);
    start..end
}
