//! Deallocation merge and same-step forwarding
//!
//! `kept[i]` is the AND over ports of "not freeing `i`"; `released` is its
//! complement. Freeing a slot from several ports, or freeing one that is
//! already free, is harmless.

use bitvec::prelude::*;

use super::occupancy::OccupancyVector;
use super::step::DeallocRequest;

#[derive(Debug, Clone)]
pub struct MergedRelease {
    pub released: BitVec,
    /// Distinct released slots that were already free
    pub redundant: usize,
}

impl MergedRelease {
    /// Bits that survive the step
    pub fn kept(&self) -> BitVec {
        !self.released.clone()
    }
}

/// Slot 0 requests are dropped when that slot is reserved.
pub fn merge_releases(committed: &OccupancyVector, requests: &[DeallocRequest]) -> MergedRelease {
    let mut released = BitVec::repeat(false, committed.trackable());
    let mut redundant = 0;

    for request in requests.iter().filter(|r| r.active()) {
        let Some(index) = committed.index_of(request.slot()) else {
            continue;
        };
        if !released[index] && !committed.as_bits()[index] {
            redundant += 1;
        }
        released.set(index, true);
    }

    MergedRelease { released, redundant }
}

/// View seen by the cascade and the empty flag
pub fn forwarded_view(committed: &BitSlice, released: &BitSlice, forwarding: bool) -> BitVec {
    if !forwarding {
        return committed.to_bitvec();
    }
    committed.to_bitvec() & !released.to_bitvec()
}

/// True iff every trackable bit of the view is taken
#[inline]
pub fn pool_empty(view: &BitSlice) -> bool {
    view.all()
}
