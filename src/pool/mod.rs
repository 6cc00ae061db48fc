//! Multi-port free list - the step controller and its combinational parts
//!
//! Design: every step is a pure function of (committed occupancy, inputs)
//! followed by one atomic commit:
//! 1. Deallocation merge builds the per-slot release mask
//! 2. Forwarding picks the view the cascade and empty flag see
//! 3. The cascade hands each allocation port a distinct lowest free slot
//! 4. The controller commits by priority: reset > scan > load > update
//!
//! Nothing is written to the occupancy until all next-state values exist.

mod cascade;
mod finder;
mod merge;
mod occupancy;
mod snapshot;
mod step;


pub use cascade::{run_cascade, CascadeOutcome};
pub use finder::{lowest_free, lowest_free_one_hot};
pub use merge::{forwarded_view, merge_releases, pool_empty, MergedRelease};
pub use occupancy::OccupancyVector;
pub use snapshot::Snapshot;
pub use step::{
    AllocRequest, AllocResult, DeallocRequest, PortVec, StepInput, StepOutput, Transition,
};

use bitvec::prelude::*;
use std::sync::Arc;
use tracing::debug_span;

use crate::config::PoolConfig;
use crate::error::{FreeListError, PortKind, Result};
use crate::logging;
use crate::metrics::PoolMetrics;

pub struct FreeList {
    config: PoolConfig,
    occupancy: OccupancyVector,
    cycle: u64,
    metrics: Arc<PoolMetrics>,
}

impl FreeList {
    /// All-free pool; fails when the configuration tracks no slots
    pub fn new(config: PoolConfig) -> Result<Self> {
        config.validate()?;
        let occupancy = OccupancyVector::new(config.width, config.reserve_slot_zero)?;

        logging::log_pool_created(
            config.width,
            occupancy.trackable(),
            config.alloc_ports,
            config.dealloc_ports,
        );

        Ok(Self {
            config,
            occupancy,
            cycle: 0,
            metrics: Arc::new(PoolMetrics::new()),
        })
    }

    /// Pool starting from a given occupancy pattern
    pub fn with_snapshot(config: PoolConfig, snapshot: &Snapshot) -> Result<Self> {
        let mut pool = Self::new(config)?;
        pool.restore(snapshot)?;
        Ok(pool)
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn occupancy(&self) -> &OccupancyVector {
        &self.occupancy
    }

    /// Steps committed so far
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn metrics(&self) -> Arc<PoolMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn free_count(&self) -> usize {
        self.occupancy.count_free()
    }

    /// Empty flag against the committed state, ignoring same-step releases
    pub fn is_empty_pool(&self) -> bool {
        pool_empty(self.occupancy.as_bits())
    }

    /// Deallocation request checked against this pool's width
    pub fn dealloc_request(&self, slot: usize) -> Result<DeallocRequest> {
        DeallocRequest::new(slot, self.config.width)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.occupancy)
    }

    /// Overwrite the committed state outside the step flow
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.occupancy = snapshot.to_occupancy(self.config.width, self.config.reserve_slot_zero)?;
        logging::log_snapshot_load(self.occupancy.count_taken());
        Ok(())
    }

    /// Advance one step
    ///
    /// Errors only on contract violations in `input`; the state is untouched
    /// when an error is returned.
    pub fn step(&mut self, input: &StepInput) -> Result<StepOutput> {
        let span = debug_span!("step", cycle = self.cycle);
        let _enter = span.enter();

        self.check_input(input)?;
        let load = match &input.load {
            Some(snapshot) if !input.reset && input.scan_in.is_none() => {
                Some(snapshot.to_occupancy(self.config.width, self.config.reserve_slot_zero)?)
            }
            _ => None,
        };

        let merged = merge_releases(&self.occupancy, &input.dealloc);
        let view = forwarded_view(
            self.occupancy.as_bits(),
            &merged.released,
            self.config.enable_forwarding,
        );
        let cascade = run_cascade(
            &view,
            &input.alloc,
            self.config.alloc_ports,
            self.config.inactive_ports,
        );

        let output = if input.reset {
            self.apply_reset()
        } else if let Some(bit) = input.scan_in {
            self.apply_scan(bit, pool_empty(&view))
        } else if let Some(loaded) = load {
            self.apply_load(loaded, pool_empty(&view))
        } else {
            self.apply_update(input, &view, &merged, &cascade)
        };

        self.metrics.record(|c| c.steps += 1);
        self.cycle += 1;
        Ok(output)
    }

    fn check_input(&self, input: &StepInput) -> Result<()> {
        if input.alloc.len() > self.config.alloc_ports {
            return Err(FreeListError::TooManyRequests {
                kind: PortKind::Alloc,
                given: input.alloc.len(),
                ports: self.config.alloc_ports,
            });
        }
        if input.dealloc.len() > self.config.dealloc_ports {
            return Err(FreeListError::TooManyRequests {
                kind: PortKind::Dealloc,
                given: input.dealloc.len(),
                ports: self.config.dealloc_ports,
            });
        }
        if let Some(bad) = input.dealloc.iter().find(|r| r.slot() >= self.config.width) {
            return Err(FreeListError::SlotOutOfRange {
                slot: bad.slot(),
                width: self.config.width,
            });
        }
        if input.scan_in.is_some() && !input.reset && !self.config.enable_scan_chain {
            return Err(FreeListError::ScanChainDisabled);
        }
        Ok(())
    }

    fn apply_reset(&mut self) -> StepOutput {
        logging::log_reset(self.occupancy.count_taken());
        self.occupancy.clear();
        self.metrics.record(|c| c.resets += 1);

        self.output(Transition::Reset, false, None)
    }

    fn apply_scan(&mut self, bit: bool, empty: bool) -> StepOutput {
        let out = self.occupancy.shift_in(bit);
        logging::log_scan_shift(bit, out);
        self.metrics.record(|c| c.scan_shifts += 1);

        self.output(Transition::Scan, empty, Some(out))
    }

    fn apply_load(&mut self, loaded: OccupancyVector, empty: bool) -> StepOutput {
        self.occupancy = loaded;
        logging::log_snapshot_load(self.occupancy.count_taken());
        self.metrics.record(|c| c.snapshot_loads += 1);

        self.output(Transition::Load, empty, None)
    }

    /// `next = granted | (kept & current)`; a slot granted and released in the
    /// same step stays taken.
    fn apply_update(
        &mut self,
        input: &StepInput,
        view: &BitSlice,
        merged: &MergedRelease,
        cascade: &CascadeOutcome,
    ) -> StepOutput {
        let next: BitVec = cascade.granted.clone() | (merged.kept() & self.occupancy.as_bits());

        let results: PortVec<AllocResult> = cascade
            .results
            .iter()
            .map(|r| match r.slot() {
                Some(index) => AllocResult::granted(self.occupancy.slot_of(index)),
                None => AllocResult::NONE,
            })
            .collect();

        let mut grants = 0u64;
        let mut denials = 0u64;
        for (port, result) in results.iter().enumerate() {
            let requested = input.alloc.get(port).map_or(false, |r| r.active);
            match result.slot() {
                Some(slot) => {
                    grants += 1;
                    logging::log_grant(port, slot);
                }
                None if requested => {
                    denials += 1;
                    logging::log_exhausted(port);
                }
                None => {}
            }
        }

        let released = merged.released.count_ones() - merged.redundant;
        for index in merged.released.iter_ones() {
            logging::log_release(self.occupancy.slot_of(index));
        }
        if merged.redundant > 0 {
            logging::log_redundant_release(merged.redundant);
        }

        let empty = pool_empty(view);
        self.occupancy.replace(next);
        logging::log_step_committed(grants as usize, released, self.occupancy.count_taken(), empty);

        self.metrics.record(|c| {
            c.grants += grants;
            c.denials += denials;
            c.releases += released as u64;
            c.redundant_releases += merged.redundant as u64;
        });

        StepOutput {
            cycle: self.cycle,
            transition: Transition::Update,
            results,
            pool_empty: empty,
            occupancy: self.occupancy.clone(),
            scan_out: None,
        }
    }

    /// Output for steps that commit no allocation
    fn output(&self, transition: Transition, empty: bool, scan_out: Option<bool>) -> StepOutput {
        StepOutput {
            cycle: self.cycle,
            transition,
            results: (0..self.config.alloc_ports).map(|_| AllocResult::NONE).collect(),
            pool_empty: empty,
            occupancy: self.occupancy.clone(),
            scan_out,
        }
    }
}
