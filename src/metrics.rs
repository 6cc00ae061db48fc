//! Pool activity counters
//!
//! Shared through `Arc` so a monitor can read while the model steps.

use parking_lot::RwLock;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolCounters {
    pub steps: u64,
    pub grants: u64,
    /// Active allocation ports that got no slot
    pub denials: u64,
    pub releases: u64,
    /// Deallocations of slots that were already free
    pub redundant_releases: u64,
    pub resets: u64,
    pub scan_shifts: u64,
    pub snapshot_loads: u64,
}

pub struct PoolMetrics {
    counters: RwLock<PoolCounters>,
}

impl PoolMetrics {
    pub fn new() -> Self {
        Self {
            counters: RwLock::new(PoolCounters::default()),
        }
    }

    /// Apply an update under the write lock
    pub fn record(&self, update: impl FnOnce(&mut PoolCounters)) {
        let mut counters = self.counters.write();
        update(&mut counters);
    }

    pub fn snapshot(&self) -> PoolCounters {
        *self.counters.read()
    }

    pub fn reset(&self) {
        *self.counters.write() = PoolCounters::default();
    }

    pub fn summary(&self) -> MetricsSummary {
        let counters = self.snapshot();
        let requested = counters.grants + counters.denials;

        MetricsSummary {
            counters,
            grant_rate: ratio(counters.grants, requested),
            denial_rate: ratio(counters.denials, requested),
            grants_per_step: ratio(counters.grants, counters.steps),
        }
    }
}

impl Default for PoolMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub counters: PoolCounters,
    pub grant_rate: f64,
    pub denial_rate: f64,
    pub grants_per_step: f64,
}

impl MetricsSummary {
    pub fn format(&self) -> String {
        let c = &self.counters;
        let mut output = String::new();

        output.push_str("=== Free List Metrics ===\n");
        output.push_str(&format!("Steps: {}\n", c.steps));
        output.push_str(&format!(
            "Grants: {} ({:.1}% of requests, {:.2}/step)\n",
            c.grants,
            self.grant_rate * 100.0,
            self.grants_per_step
        ));
        output.push_str(&format!("Denials: {} ({:.1}%)\n", c.denials, self.denial_rate * 100.0));
        output.push_str(&format!(
            "Releases: {} ({} redundant)\n",
            c.releases, c.redundant_releases
        ));
        output.push_str(&format!(
            "Resets: {}  Scan shifts: {}  Snapshot loads: {}\n",
            c.resets, c.scan_shifts, c.snapshot_loads
        ));

        output
    }
}
