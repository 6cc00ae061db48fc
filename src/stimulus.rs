//! Scripted per-step stimulus, replayed against a pool
//!
//! ```toml
//! [[step]]
//! alloc = [true, true]
//!
//! [[step]]
//! alloc = [true]
//! dealloc = [0]
//!
//! [[step]]
//! load = [1, 2]
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{FreeListError, Result};
use crate::pool::{FreeList, Snapshot, StepInput, StepOutput};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stimulus {
    #[serde(default, rename = "step")]
    pub steps: Vec<StimulusStep>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StimulusStep {
    /// Active flag per allocation port; missing ports are idle
    #[serde(default)]
    pub alloc: Vec<bool>,

    /// Slots to free, one per deallocation port
    #[serde(default)]
    pub dealloc: Vec<usize>,

    #[serde(default)]
    pub reset: bool,

    #[serde(default)]
    pub scan_in: Option<bool>,

    /// Slots taken after a snapshot load
    #[serde(default)]
    pub load: Option<Vec<usize>>,
}

impl Stimulus {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| FreeListError::Config(format!("Failed to parse stimulus: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::parse(&fs::read_to_string(path)?)
    }

    /// Drive every step in order, stopping at the first contract violation.
    /// Steps committed before the violation keep their outputs.
    pub fn run(&self, pool: &mut FreeList) -> Replay {
        let mut outputs = Vec::with_capacity(self.steps.len());

        for step in &self.steps {
            match step.to_input(pool).and_then(|input| pool.step(&input)) {
                Ok(out) => outputs.push(out),
                Err(error) => {
                    return Replay {
                        outputs,
                        error: Some(error),
                    }
                }
            }
        }

        Replay { outputs, error: None }
    }
}

/// Outcome of a stimulus replay
#[derive(Debug)]
pub struct Replay {
    /// One output per committed step, in order
    pub outputs: Vec<StepOutput>,
    /// Violation that stopped the replay
    pub error: Option<FreeListError>,
}

impl Replay {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// All outputs, or the violation if the replay stopped early
    pub fn into_result(self) -> Result<Vec<StepOutput>> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.outputs),
        }
    }
}

impl StimulusStep {
    pub fn to_input(&self, pool: &FreeList) -> Result<StepInput> {
        let dealloc = self
            .dealloc
            .iter()
            .map(|&slot| pool.dealloc_request(slot))
            .collect::<Result<Vec<_>>>()?;

        let mut input = StepInput::new()
            .with_alloc(self.alloc.iter().copied())
            .with_dealloc(dealloc);
        input.reset = self.reset;
        input.scan_in = self.scan_in;

        if let Some(taken) = &self.load {
            let config = pool.config();
            input.load = Some(Snapshot::from_taken(config.width, config.reserve_slot_zero, taken)?);
        }

        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;

    #[test]
    fn test_parse_and_run() {
        let text = r#"
[[step]]
alloc = [true, true]

[[step]]
dealloc = [0]

[[step]]
alloc = [true]
load = [3]
"#;
        let stimulus = Stimulus::parse(text).unwrap();
        assert_eq!(stimulus.steps.len(), 3);

        let mut pool = FreeList::new(PoolConfig::new(4)).unwrap();
        let replay = stimulus.run(&mut pool);
        assert!(replay.is_complete());
        let outputs = replay.into_result().unwrap();

        assert_eq!(outputs[0].granted().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(outputs[1].occupancy.taken_slots(), vec![1]);
        assert_eq!(outputs[2].occupancy.taken_slots(), vec![3]);
    }

    #[test]
    fn test_out_of_range_slot_stops_replay() {
        let stimulus = Stimulus::parse("[[step]]\ndealloc = [7]\n").unwrap();
        let mut pool = FreeList::new(PoolConfig::new(4)).unwrap();

        assert!(matches!(
            stimulus.run(&mut pool).into_result(),
            Err(FreeListError::SlotOutOfRange { slot: 7, width: 4 })
        ));
    }

    #[test]
    fn test_violation_keeps_committed_outputs() {
        let text = r#"
[[step]]
alloc = [true]

[[step]]
alloc = [true]

[[step]]
dealloc = [9]

[[step]]
alloc = [true]
"#;
        let stimulus = Stimulus::parse(text).unwrap();
        let mut pool = FreeList::new(PoolConfig::new(4)).unwrap();
        let replay = stimulus.run(&mut pool);

        assert!(!replay.is_complete());
        assert!(matches!(
            replay.error,
            Some(FreeListError::SlotOutOfRange { slot: 9, width: 4 })
        ));
        assert_eq!(replay.outputs.len(), 2);
        assert_eq!(replay.outputs[0].granted().collect::<Vec<_>>(), vec![0]);
        assert_eq!(replay.outputs[1].occupancy.taken_slots(), vec![0, 1]);

        // The rejected step and everything after it left the pool alone.
        assert_eq!(pool.cycle(), 2);
        assert_eq!(pool.occupancy().taken_slots(), vec![0, 1]);
    }

    #[test]
    fn test_empty_document() {
        assert!(Stimulus::parse("").unwrap().steps.is_empty());
    }
}
