//! Fixed-point atomic double array.
//!
//! Rust has no `AtomicF64`. Instead of bit-casting doubles through an
//! `AtomicU64` (which needs a CAS loop even for plain additions), every slot
//! stores `round(value × scale)` in an [`AtomicI64`]. Additions then become a
//! single native `fetch_add`, and reads divide by the scale again.
//!
//! ```text
//! stored = round(value × scale)        value = stored / scale
//! ```
//!
//! Precision is bounded by `1 / scale`; the magnitude is bounded by
//! `i64::MAX / scale`. A scale of `1e9` resolves nano-units and still holds
//! totals up to roughly `9.2e9`.
//!
//! ## Update policies
//!
//! Overflow handling is chosen per call, never implicitly:
//!
//! | Method | On overflow |
//! |--------|-------------|
//! | [`AtomicDoubleArray::add`] | wraps (two's complement) |
//! | [`AtomicDoubleArray::add_exact`] | fails with [`Error::Overflow`] |
//! | [`AtomicDoubleArray::add_capped`] | saturates at the representable bound |
//!
//! Every operation is linearizable per slot. Nothing spans slots.

use crate::error::{Error, Result};
use rayon::prelude::*;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

// 2^63 as f64. `i64::MAX as f64` rounds up to exactly this value.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Shared array of doubles backed by scaled integer atomics.
pub struct AtomicDoubleArray {
    data: Box<[AtomicI64]>,
    scale: f64,
}

impl AtomicDoubleArray {
    /// Scale used by [`AtomicDoubleArray::with_default_scale`].
    pub const DEFAULT_SCALE: f64 = 1e9;

    /// Create a zeroed array of `len` slots.
    ///
    /// Fails if `scale` is not a positive finite number.
    pub fn new(len: usize, scale: f64) -> Result<Self> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(Error::invalid(
                "scale",
                format!("must be positive and finite, got {scale}"),
            ));
        }
        let data = (0..len).map(|_| AtomicI64::new(0)).collect();
        Ok(Self { data, scale })
    }

    /// Create a zeroed array with [`Self::DEFAULT_SCALE`].
    pub fn with_default_scale(len: usize) -> Self {
        let data = (0..len).map(|_| AtomicI64::new(0)).collect();
        Self {
            data,
            scale: Self::DEFAULT_SCALE,
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the array has no slots.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The fixed-point scale factor.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Smallest positive value a slot can distinguish from zero.
    pub fn resolution(&self) -> f64 {
        1.0 / self.scale
    }

    /// Largest value a slot can hold.
    pub fn max_value(&self) -> f64 {
        i64::MAX as f64 / self.scale
    }

    /// Scaled representation, or `None` if it does not fit in an `i64`.
    fn to_fixed(&self, value: f64) -> Option<i64> {
        let scaled = (value * self.scale).round();
        if scaled.is_finite() && (-I64_BOUND..I64_BOUND).contains(&scaled) {
            Some(scaled as i64)
        } else {
            None
        }
    }

    /// Scaled representation, clamped to the `i64` range (NaN maps to 0).
    fn to_fixed_saturating(&self, value: f64) -> i64 {
        (value * self.scale).round() as i64
    }

    fn to_double(&self, raw: i64) -> f64 {
        raw as f64 / self.scale
    }

    /// Read slot `index`.
    pub fn get(&self, index: usize) -> f64 {
        self.to_double(self.data[index].load(Ordering::Acquire))
    }

    /// Overwrite slot `index`. Out-of-range values are clamped.
    pub fn set(&self, index: usize, value: f64) {
        self.data[index].store(self.to_fixed_saturating(value), Ordering::Release);
    }

    /// Add `delta` to slot `index`, wrapping on overflow.
    ///
    /// Only for slots whose magnitude is already known to be bounded.
    pub fn add(&self, index: usize, delta: f64) {
        let _ = self.fetch_add(index, delta);
    }

    /// Add `delta` to slot `index` and return the previous value. Wraps on overflow.
    pub fn fetch_add(&self, index: usize, delta: f64) -> f64 {
        let raw = self.to_fixed_saturating(delta);
        self.to_double(self.data[index].fetch_add(raw, Ordering::AcqRel))
    }

    /// Add `delta` to slot `index`, failing instead of overflowing.
    ///
    /// Returns the new value. The slot is left untouched on error.
    pub fn add_exact(&self, index: usize, delta: f64) -> Result<f64> {
        let slot = &self.data[index];
        let overflow = |current: i64| Error::Overflow {
            index,
            current: self.to_double(current),
            delta,
        };
        let raw = match self.to_fixed(delta) {
            Some(raw) => raw,
            None => return Err(overflow(slot.load(Ordering::Acquire))),
        };

        let mut current = slot.load(Ordering::Acquire);
        loop {
            let next = current.checked_add(raw).ok_or_else(|| overflow(current))?;
            match slot.compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => return Ok(self.to_double(next)),
                Err(actual) => current = actual,
            }
        }
    }

    /// Add `delta` to slot `index`, saturating at the representable bounds.
    ///
    /// Returns the new (possibly saturated) value.
    pub fn add_capped(&self, index: usize, delta: f64) -> f64 {
        let slot = &self.data[index];
        let raw = self.to_fixed_saturating(delta);

        let mut current = slot.load(Ordering::Acquire);
        loop {
            let next = current.saturating_add(raw);
            match slot.compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => return self.to_double(next),
                Err(actual) => current = actual,
            }
        }
    }

    /// Set slot `index` to `value` if it currently holds `expected`.
    ///
    /// Both sides are compared through their scaled representation, so two
    /// doubles closer than [`Self::resolution`] compare equal.
    pub fn compare_and_swap(&self, index: usize, expected: f64, value: f64) -> bool {
        let expected = self.to_fixed_saturating(expected);
        let value = self.to_fixed_saturating(value);
        self.data[index]
            .compare_exchange(expected, value, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Set slot `index` to `value` if it currently holds `expected`, and
    /// return the value held before, whether or not it was replaced.
    ///
    /// The swap happened iff the returned value equals `expected` at this
    /// array's resolution.
    pub fn fetch_compare_and_swap(&self, index: usize, expected: f64, value: f64) -> f64 {
        let expected = self.to_fixed_saturating(expected);
        let value = self.to_fixed_saturating(value);
        match self.data[index].compare_exchange(expected, value, Ordering::AcqRel, Ordering::Acquire) {
            Ok(previous) | Err(previous) => self.to_double(previous),
        }
    }

    /// Atomically replace slot `index` with `f(current)` and return the new value.
    ///
    /// `f` may run more than once under contention.
    pub fn update(&self, index: usize, f: impl Fn(f64) -> f64) -> f64 {
        let slot = &self.data[index];
        let mut current = slot.load(Ordering::Acquire);
        loop {
            let next = self.to_fixed_saturating(f(self.to_double(current)));
            match slot.compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => return self.to_double(next),
                Err(actual) => current = actual,
            }
        }
    }

    /// Reset every slot to zero, in parallel.
    pub fn clear(&self) {
        self.data
            .par_iter()
            .for_each(|slot| slot.store(0, Ordering::Release));
    }

    /// Snapshot of all slots.
    pub fn to_vec(&self) -> Vec<f64> {
        (0..self.len()).map(|i| self.get(i)).collect()
    }
}

impl fmt::Debug for AtomicDoubleArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtomicDoubleArray")
            .field("len", &self.len())
            .field("scale", &self.scale)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;

    #[test]
    fn test_get_set_roundtrip() {
        let arr = AtomicDoubleArray::new(3, 1e6).unwrap();
        arr.set(1, 2.5);
        assert_eq!(arr.get(0), 0.0);
        assert!((arr.get(1) - 2.5).abs() < 1e-6);
        assert_eq!(arr.len(), 3);
    }

    #[test]
    fn test_precision_bounded_by_scale() {
        let arr = AtomicDoubleArray::new(1, 100.0).unwrap();
        arr.set(0, 0.123_456);
        assert!((arr.get(0) - 0.12).abs() < 1e-12);
        assert_eq!(arr.resolution(), 0.01);
    }

    #[test]
    fn test_invalid_scale_rejected() {
        assert!(AtomicDoubleArray::new(1, 0.0).is_err());
        assert!(AtomicDoubleArray::new(1, -1.0).is_err());
        assert!(AtomicDoubleArray::new(1, f64::NAN).is_err());
        assert!(AtomicDoubleArray::new(1, f64::INFINITY).is_err());
    }

    #[test]
    fn test_add_and_fetch_add() {
        let arr = AtomicDoubleArray::with_default_scale(1);
        arr.add(0, 1.5);
        let prev = arr.fetch_add(0, -0.5);
        assert!((prev - 1.5).abs() < 1e-9);
        assert!((arr.get(0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_add_wraps() {
        let arr = AtomicDoubleArray::new(1, 1.0).unwrap();
        arr.set(0, arr.max_value());
        arr.add(0, 1.0);
        assert!(arr.get(0) < 0.0);
    }

    #[test]
    fn test_add_exact_overflow_leaves_slot_untouched() {
        let arr = AtomicDoubleArray::new(1, 1.0).unwrap();
        let max = arr.max_value();
        arr.set(0, max);
        let before = arr.get(0);

        let err = arr.add_exact(0, 1.0).unwrap_err();
        assert!(matches!(err, Error::Overflow { index: 0, .. }));
        assert_eq!(arr.get(0), before);
    }

    #[test]
    fn test_add_exact_rejects_unrepresentable_delta() {
        let arr = AtomicDoubleArray::new(1, 1e9).unwrap();
        assert!(arr.add_exact(0, 1e300).is_err());
        assert!(arr.add_exact(0, f64::NAN).is_err());
    }

    #[test]
    fn test_add_capped_saturates_both_ways() {
        let arr = AtomicDoubleArray::new(2, 1.0).unwrap();
        arr.set(0, arr.max_value());
        assert_eq!(arr.add_capped(0, 10.0), arr.max_value());

        arr.set(1, -arr.max_value());
        let low = arr.add_capped(1, -10.0);
        assert_eq!(low, i64::MIN as f64);
    }

    #[test]
    fn test_compare_and_swap() {
        let arr = AtomicDoubleArray::new(1, 1e6).unwrap();
        arr.set(0, 1.0);
        assert!(!arr.compare_and_swap(0, 2.0, 3.0));
        assert!(arr.compare_and_swap(0, 1.0, 3.0));
        assert!((arr.get(0) - 3.0).abs() < 1e-6);
        // Closer than the resolution compares equal.
        assert!(arr.compare_and_swap(0, 3.000_000_01, 4.0));
    }

    #[test]
    fn test_fetch_compare_and_swap_returns_previous() {
        let arr = AtomicDoubleArray::new(1, 1e3).unwrap();
        arr.set(0, 1.5);

        assert_eq!(arr.fetch_compare_and_swap(0, 2.0, 9.0), 1.5);
        assert_eq!(arr.get(0), 1.5);

        assert_eq!(arr.fetch_compare_and_swap(0, 1.5, 9.0), 1.5);
        assert_eq!(arr.get(0), 9.0);
    }

    #[test]
    fn test_update_and_clear() {
        let arr = AtomicDoubleArray::new(4, 1e6).unwrap();
        for i in 0..4 {
            arr.update(i, |w| w + i as f64);
        }
        assert_eq!(arr.to_vec(), vec![0.0, 1.0, 2.0, 3.0]);
        arr.clear();
        assert!(arr.to_vec().iter().all(|&w| w == 0.0));
    }

    #[test]
    fn test_concurrent_adds_are_not_lost() {
        let arr = Arc::new(AtomicDoubleArray::new(1, 1e6).unwrap());
        (0..10_000).into_par_iter().for_each(|_| arr.add(0, 0.25));
        (0..1_000)
            .into_par_iter()
            .for_each(|_| arr.add_exact(0, 0.5).map(|_| ()).unwrap());
        assert!((arr.get(0) - 3_000.0).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn exact_fails_where_capped_saturates(
            exponent in 0i32..12,
            start in 0.5f64..1.0,
            extra in 0.5f64..1.0,
        ) {
            let scale = 10f64.powi(exponent);
            let arr = AtomicDoubleArray::new(2, scale).unwrap();
            let max = arr.max_value();

            arr.set(0, start * max);
            arr.set(1, start * max);
            let before = arr.get(0);

            let exact = arr.add_exact(0, extra * max);
            let overflowed = matches!(exact, Err(Error::Overflow { .. }));
            prop_assert!(overflowed);
            prop_assert_eq!(arr.get(0), before);

            let capped = arr.add_capped(1, extra * max);
            prop_assert_eq!(capped, max);
            prop_assert_eq!(arr.get(1), max);
        }

        #[test]
        fn exact_and_wrapping_agree_in_range(
            deltas in proptest::collection::vec(-1e3f64..1e3, 1..50),
        ) {
            let arr = AtomicDoubleArray::new(2, 1e6).unwrap();
            for &d in &deltas {
                arr.add(0, d);
                arr.add_exact(1, d).unwrap();
            }
            prop_assert_eq!(arr.get(0), arr.get(1));
        }
    }
}
