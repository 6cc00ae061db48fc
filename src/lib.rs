//! freelist - cycle-level model of a multi-port register-rename free list
//!
//! A fixed pool of numbered slots is handed out to several allocation ports
//! per step, lowest free slot first, while several deallocation ports return
//! slots. Each step is computed from the committed state and that step's
//! requests, then committed atomically.
//!
//! ```
//! use freelist::{FreeList, PoolConfig, StepInput};
//!
//! let mut pool = FreeList::new(PoolConfig::new(4).with_ports(2, 1))?;
//! let out = pool.step(&StepInput::allocate(2))?;
//! assert_eq!(out.granted().collect::<Vec<_>>(), vec![0, 1]);
//! # Ok::<(), freelist::FreeListError>(())
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pool;
pub mod stimulus;

pub use config::{InactivePortPolicy, PoolConfig};
pub use error::{FreeListError, PortKind, Result};
pub use logging::{init_with_config, LogConfig, LogFormat, LogOutput};
pub use metrics::{MetricsSummary, PoolCounters, PoolMetrics};
pub use pool::{
    AllocRequest, AllocResult, DeallocRequest, FreeList, OccupancyVector, Snapshot, StepInput,
    StepOutput, Transition,
};
pub use stimulus::{Replay, Stimulus, StimulusStep};
