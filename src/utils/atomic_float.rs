/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Floating-point values with atomic addition.
//!
//! The standard library does not provide atomic floating-point types, so we
//! store the bit pattern of the value in an atomic integer of the same size
//! and implement [`fetch_add`](AtomicWeight::fetch_add) as a
//! compare-and-swap loop. Exclusive access is thus scoped to the single
//! value being updated.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Operations on an atomic floating-point value of type `W`.
pub trait AtomicWeight<W>: Send + Sync + Sized {
    /// Creates a new atomic value.
    fn new(value: W) -> Self;

    /// Loads the value.
    fn load(&self, order: Ordering) -> W;

    /// Stores a value.
    fn store(&self, value: W, order: Ordering);

    /// Adds `value` to the current value, returning the previous value.
    ///
    /// The ordering applies to the successful exchange; the failing loads
    /// are always relaxed.
    fn fetch_add(&self, value: W, order: Ordering) -> W;

    /// Consumes the atomic and returns the contained value.
    fn into_inner(self) -> W;
}

macro_rules! impl_atomic_float {
    ($name:ident, $float:ty, $atomic:ty) => {
        #[doc = concat!("An [`", stringify!($float), "`] with atomic addition.")]
        #[derive(Debug, Default)]
        #[repr(transparent)]
        pub struct $name($atomic);

        impl AtomicWeight<$float> for $name {
            #[inline(always)]
            fn new(value: $float) -> Self {
                Self(<$atomic>::new(value.to_bits()))
            }

            #[inline(always)]
            fn load(&self, order: Ordering) -> $float {
                <$float>::from_bits(self.0.load(order))
            }

            #[inline(always)]
            fn store(&self, value: $float, order: Ordering) {
                self.0.store(value.to_bits(), order)
            }

            #[inline(always)]
            fn fetch_add(&self, value: $float, order: Ordering) -> $float {
                let mut current = self.0.load(Ordering::Relaxed);
                loop {
                    let new = (<$float>::from_bits(current) + value).to_bits();
                    match self
                        .0
                        .compare_exchange_weak(current, new, order, Ordering::Relaxed)
                    {
                        Ok(previous) => return <$float>::from_bits(previous),
                        Err(actual) => current = actual,
                    }
                }
            }

            #[inline(always)]
            fn into_inner(self) -> $float {
                <$float>::from_bits(self.0.into_inner())
            }
        }
    };
}

impl_atomic_float!(AtomicF64, f64, AtomicU64);
impl_atomic_float!(AtomicF32, f32, AtomicU32);
