/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{AtomicF32, AtomicF64, AtomicWeight};
use core::fmt::{Debug, Display};
use core::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Sub};
use sealed::sealed;

/// The floating-point type used for arc weights and ranks.
///
/// This trait is sealed and implemented only for [`f32`] and [`f64`]. Single
/// precision halves the memory used by arcs and rank vectors, at the price of
/// results that differ from the double-precision ones in the low-order
/// digits. Sums over all nodes (leak and norm delta) are always computed in
/// double precision.
#[sealed]
pub trait Weight:
    Copy
    + Default
    + PartialOrd
    + Debug
    + Display
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + AddAssign
    + Sub<Output = Self>
    + Mul<Output = Self>
    + MulAssign
    + Div<Output = Self>
    + DivAssign
{
    /// The atomic counterpart of this type, used as an accumulator by the
    /// parallel strategy.
    type Atomic: AtomicWeight<Self>;

    const ZERO: Self;

    /// Converts from double precision, rounding if necessary.
    fn from_f64(value: f64) -> Self;

    /// Converts to double precision.
    fn to_f64(self) -> f64;

    fn abs(self) -> Self;
}

#[sealed]
impl Weight for f64 {
    type Atomic = AtomicF64;

    const ZERO: Self = 0.0;

    #[inline(always)]
    fn from_f64(value: f64) -> Self {
        value
    }

    #[inline(always)]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline(always)]
    fn abs(self) -> Self {
        f64::abs(self)
    }
}

#[sealed]
impl Weight for f32 {
    type Atomic = AtomicF32;

    const ZERO: Self = 0.0;

    #[inline(always)]
    fn from_f64(value: f64) -> Self {
        value as f32
    }

    #[inline(always)]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline(always)]
    fn abs(self) -> Self {
        f32::abs(self)
    }
}
