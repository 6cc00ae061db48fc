//! Per-step request and response types

use serde::Serialize;
use smallvec::SmallVec;
use std::fmt;

use super::occupancy::OccupancyVector;
use super::snapshot::Snapshot;
use crate::error::{FreeListError, Result};

/// Typical rename widths fit without spilling
pub type PortVec<T> = SmallVec<[T; 4]>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AllocRequest {
    pub active: bool,
}

impl AllocRequest {
    pub const IDLE: Self = Self { active: false };
    pub const ACTIVE: Self = Self { active: true };
}

/// `slot` is only meaningful when `valid`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AllocResult {
    pub valid: bool,
    pub slot: usize,
}

impl AllocResult {
    pub const NONE: Self = Self { valid: false, slot: 0 };

    pub fn granted(slot: usize) -> Self {
        Self { valid: true, slot }
    }

    pub fn slot(&self) -> Option<usize> {
        self.valid.then_some(self.slot)
    }
}

/// Range-checked on construction; fields stay private so a request naming a
/// slot outside the pool cannot exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeallocRequest {
    active: bool,
    slot: usize,
}

impl DeallocRequest {
    pub const IDLE: Self = Self { active: false, slot: 0 };

    pub fn new(slot: usize, width: usize) -> Result<Self> {
        if slot >= width {
            return Err(FreeListError::SlotOutOfRange { slot, width });
        }
        Ok(Self { active: true, slot })
    }

    #[inline]
    pub fn active(&self) -> bool {
        self.active
    }

    #[inline]
    pub fn slot(&self) -> usize {
        self.slot
    }
}

/// Everything the embedding system drives into the pool for one step
#[derive(Debug, Clone, Default)]
pub struct StepInput {
    pub alloc: PortVec<AllocRequest>,
    pub dealloc: PortVec<DeallocRequest>,
    pub reset: bool,
    /// Scan enable plus the serial input bit
    pub scan_in: Option<bool>,
    /// Load enable plus the vector to load
    pub load: Option<Snapshot>,
}

impl StepInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// `n` active allocation requests
    pub fn allocate(n: usize) -> Self {
        Self::new().with_alloc((0..n).map(|_| true))
    }

    pub fn with_alloc(mut self, active: impl IntoIterator<Item = bool>) -> Self {
        self.alloc = active.into_iter().map(|active| AllocRequest { active }).collect();
        self
    }

    pub fn with_dealloc(mut self, requests: impl IntoIterator<Item = DeallocRequest>) -> Self {
        self.dealloc = requests.into_iter().collect();
        self
    }

    pub fn with_reset(mut self) -> Self {
        self.reset = true;
        self
    }

    pub fn with_scan(mut self, bit: bool) -> Self {
        self.scan_in = Some(bit);
        self
    }

    pub fn with_load(mut self, snapshot: Snapshot) -> Self {
        self.load = Some(snapshot);
        self
    }
}

/// Which transition the controller applied this step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    Reset,
    Scan,
    Load,
    Update,
}

impl Transition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::Reset => "reset",
            Transition::Scan => "scan",
            Transition::Load => "load",
            Transition::Update => "update",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepOutput {
    pub cycle: u64,
    pub transition: Transition,
    pub results: PortVec<AllocResult>,
    pub pool_empty: bool,
    /// Occupancy committed at the end of this step
    pub occupancy: OccupancyVector,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_out: Option<bool>,
}

impl StepOutput {
    pub fn granted(&self) -> impl Iterator<Item = usize> + '_ {
        self.results.iter().filter_map(AllocResult::slot)
    }
}
