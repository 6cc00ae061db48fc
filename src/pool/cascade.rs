//! Allocation cascade - one lowest-free finder per port, chained
//!
//! A left-to-right fold: each port selects against the base view OR the picks
//! accumulated from the ports before it, so grants within a step never collide.

use bitvec::prelude::*;

use super::finder::lowest_free;
use super::step::{AllocRequest, AllocResult, PortVec};
use crate::config::InactivePortPolicy;

/// Cascade outcome, in trackable bit indices
#[derive(Debug, Clone)]
pub struct CascadeOutcome {
    /// Per-port result; `slot` is a bit index, not yet a slot number
    pub results: PortVec<AllocResult>,
    /// Bits granted to active ports this step
    pub granted: BitVec,
}

pub fn run_cascade(
    base: &BitSlice,
    requests: &[AllocRequest],
    ports: usize,
    policy: InactivePortPolicy,
) -> CascadeOutcome {
    let mut mask = base.to_bitvec();
    let mut granted = BitVec::repeat(false, base.len());
    let mut results = PortVec::with_capacity(ports);

    for port in 0..ports {
        let active = requests.get(port).map_or(false, |r| r.active);

        let Some(index) = lowest_free(&mask) else {
            results.push(AllocResult::NONE);
            continue;
        };

        if active {
            granted.set(index, true);
            results.push(AllocResult::granted(index));
        } else {
            results.push(AllocResult::NONE);
        }

        if active || policy == InactivePortPolicy::Reserve {
            mask.set(index, true);
        }
    }

    CascadeOutcome { results, granted }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reqs(active: &[bool]) -> Vec<AllocRequest> {
        active.iter().map(|&active| AllocRequest { active }).collect()
    }

    #[test]
    fn ports_receive_ascending_distinct_bits() {
        let base = bitvec![0, 1, 0, 0];
        let out = run_cascade(&base, &reqs(&[true, true, true]), 3, InactivePortPolicy::Reserve);

        let picked: Vec<_> = out.results.iter().map(|r| r.slot()).collect();
        assert_eq!(picked, vec![Some(0), Some(2), Some(3)]);
        assert_eq!(out.granted, bitvec![1, 0, 1, 1]);
    }

    #[test]
    fn exhaustion_invalidates_trailing_ports() {
        let base = bitvec![1, 0, 1];
        let out = run_cascade(&base, &reqs(&[true, true]), 2, InactivePortPolicy::Reserve);

        assert_eq!(out.results[0].slot(), Some(1));
        assert_eq!(out.results[1], AllocResult::NONE);
    }

    #[test]
    fn inactive_port_reserves_under_reserve_policy() {
        let base = bitvec![0, 0, 0];
        let out = run_cascade(&base, &reqs(&[false, true]), 2, InactivePortPolicy::Reserve);

        assert_eq!(out.results[0], AllocResult::NONE);
        assert_eq!(out.results[1].slot(), Some(1));
        assert_eq!(out.granted, bitvec![0, 1, 0]);
    }

    #[test]
    fn inactive_port_passes_through_under_skip_policy() {
        let base = bitvec![0, 0, 0];
        let out = run_cascade(&base, &reqs(&[false, true]), 2, InactivePortPolicy::Skip);

        assert_eq!(out.results[1].slot(), Some(0));
        assert_eq!(out.granted, bitvec![1, 0, 0]);
    }

    #[test]
    fn missing_requests_count_as_inactive() {
        let base = bitvec![0, 0];
        let out = run_cascade(&base, &reqs(&[true]), 2, InactivePortPolicy::Reserve);

        assert_eq!(out.results.len(), 2);
        assert_eq!(out.results[1], AllocResult::NONE);
    }
}
