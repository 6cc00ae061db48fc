//! Occupancy vector - one bit per trackable slot, `true` = taken
//!
//! When slot 0 is reserved the vector starts at slot 1, so bit `i` stands for
//! slot `i + 1`. All slot-facing methods take and return real slot numbers;
//! `as_bits` exposes the raw trackable view used by the combinational logic.

use bitvec::prelude::*;
use serde::Serialize;

use crate::error::{FreeListError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyVector {
    bits: BitVec,
    width: usize,
    reserve_slot_zero: bool,
}

impl OccupancyVector {
    /// All-free vector for a pool of `width` names
    pub fn new(width: usize, reserve_slot_zero: bool) -> Result<Self> {
        let trackable = width.saturating_sub(reserve_slot_zero as usize);
        if trackable == 0 {
            return Err(FreeListError::NoTrackableSlots { width, reserve_slot_zero });
        }

        Ok(Self {
            bits: BitVec::repeat(false, trackable),
            width,
            reserve_slot_zero,
        })
    }

    /// Vector with exactly the given slots taken
    ///
    /// Naming reserved slot 0 is accepted and has no effect.
    pub fn from_taken(width: usize, reserve_slot_zero: bool, taken: &[usize]) -> Result<Self> {
        let mut vector = Self::new(width, reserve_slot_zero)?;
        for &slot in taken {
            if slot >= width {
                return Err(FreeListError::SlotOutOfRange { slot, width });
            }
            if let Some(index) = vector.index_of(slot) {
                vector.bits.set(index, true);
            }
        }
        Ok(vector)
    }

    pub(crate) fn from_bits(bits: BitVec, width: usize, reserve_slot_zero: bool) -> Self {
        debug_assert_eq!(bits.len(), width - reserve_slot_zero as usize);
        Self { bits, width, reserve_slot_zero }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn reserves_slot_zero(&self) -> bool {
        self.reserve_slot_zero
    }

    /// Number of tracked slots (width minus the reserved slot, if any)
    #[inline]
    pub fn trackable(&self) -> usize {
        self.bits.len()
    }

    /// Trackable view, bit `i` is slot `slot_of(i)`
    #[inline]
    pub fn as_bits(&self) -> &BitSlice {
        &self.bits
    }

    /// Bit index for a slot, `None` for reserved slot 0 or out of range
    #[inline]
    pub fn index_of(&self, slot: usize) -> Option<usize> {
        if slot >= self.width {
            return None;
        }
        if self.reserve_slot_zero {
            slot.checked_sub(1)
        } else {
            Some(slot)
        }
    }

    /// Slot number for a bit index
    #[inline]
    pub fn slot_of(&self, index: usize) -> usize {
        index + self.reserve_slot_zero as usize
    }

    /// Reserved slot 0 always reads as taken
    pub fn is_taken(&self, slot: usize) -> bool {
        match self.index_of(slot) {
            Some(index) => self.bits[index],
            None => self.reserve_slot_zero && slot == 0,
        }
    }

    pub fn taken_slots(&self) -> Vec<usize> {
        self.bits.iter_ones().map(|i| self.slot_of(i)).collect()
    }

    pub fn count_taken(&self) -> usize {
        self.bits.count_ones()
    }

    pub fn count_free(&self) -> usize {
        self.bits.count_zeros()
    }

    pub fn is_full(&self) -> bool {
        self.bits.all()
    }

    pub(crate) fn clear(&mut self) {
        self.bits.fill(false);
    }

    pub(crate) fn replace(&mut self, bits: BitVec) {
        debug_assert_eq!(bits.len(), self.bits.len());
        self.bits = bits;
    }

    /// Shift one position toward higher indices, returning the bit pushed out
    pub(crate) fn shift_in(&mut self, bit: bool) -> bool {
        let out = self.bits.last().map_or(false, |b| *b);
        self.bits.shift_right(1);
        self.bits.set(0, bit);
        out
    }
}

/// Serializable view: taken slot numbers, in ascending order
impl Serialize for OccupancyVector {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.taken_slots().serialize(serializer)
    }
}
