//! Occupancy snapshots for checkpoint capture and restore

use bitvec::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::occupancy::OccupancyVector;
use crate::error::{FreeListError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub width: usize,
    pub reserve_slot_zero: bool,
    /// One entry per trackable slot, lowest first
    pub taken: Vec<bool>,
}

impl Snapshot {
    pub fn capture(occupancy: &OccupancyVector) -> Self {
        Self {
            width: occupancy.width(),
            reserve_slot_zero: occupancy.reserves_slot_zero(),
            taken: occupancy.as_bits().iter().by_vals().collect(),
        }
    }

    /// Snapshot with exactly the given slots taken
    pub fn from_taken(width: usize, reserve_slot_zero: bool, taken: &[usize]) -> Result<Self> {
        OccupancyVector::from_taken(width, reserve_slot_zero, taken).map(|v| Self::capture(&v))
    }

    /// Rebuild the occupancy, checking it fits a pool of the given shape
    pub fn to_occupancy(&self, width: usize, reserve_slot_zero: bool) -> Result<OccupancyVector> {
        let trackable = width.saturating_sub(reserve_slot_zero as usize);
        if self.width != width || self.reserve_slot_zero != reserve_slot_zero || self.taken.len() != trackable {
            return Err(FreeListError::SnapshotMismatch {
                expected: (width, reserve_slot_zero),
                found: (self.width, self.reserve_slot_zero),
            });
        }

        let bits: BitVec = self.taken.iter().copied().collect();
        Ok(OccupancyVector::from_bits(bits, width, reserve_slot_zero))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_bytes(&fs::read(path)?)
    }
}
