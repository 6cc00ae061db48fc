//! Lowest-free priority selection
//!
//! Strict priority: index `i` wins iff every index below it is taken and `i`
//! is free. No rotation, no fairness.

use bitvec::prelude::*;

/// Index of the lowest free bit in `view`, or `None` when all are taken
#[inline]
pub fn lowest_free(view: &BitSlice) -> Option<usize> {
    view.first_zero()
}

/// One-hot form of [`lowest_free`]; all-false when nothing is free
pub fn lowest_free_one_hot(view: &BitSlice) -> BitVec {
    let mut select = BitVec::repeat(false, view.len());
    if let Some(index) = lowest_free(view) {
        select.set(index, true);
    }
    select
}
