use std::fmt;

/// Which request array a [`FreeListError::TooManyRequests`] refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    Alloc,
    Dealloc,
}

impl fmt::Display for PortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alloc => write!(f, "allocation"),
            Self::Dealloc => write!(f, "deallocation"),
        }
    }
}

/// Caller contract violations. Pool exhaustion and double-free are not errors.
#[derive(Debug)]
pub enum FreeListError {
    NoTrackableSlots { width: usize, reserve_slot_zero: bool },
    SlotOutOfRange { slot: usize, width: usize },
    TooManyRequests { kind: PortKind, given: usize, ports: usize },
    ScanChainDisabled,
    SnapshotMismatch { expected: (usize, bool), found: (usize, bool) },
    Config(String),
    Io(std::io::Error),
    Codec(String),
}

impl fmt::Display for FreeListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTrackableSlots { width, reserve_slot_zero } => {
                write!(
                    f,
                    "Pool of width {} has no trackable slots (reserve_slot_zero = {})",
                    width, reserve_slot_zero
                )
            }
            Self::SlotOutOfRange { slot, width } => {
                write!(f, "Slot {} is outside the pool range [0, {})", slot, width)
            }
            Self::TooManyRequests { kind, given, ports } => {
                write!(f, "Got {} {} requests but the pool has {} ports", given, kind, ports)
            }
            Self::ScanChainDisabled => {
                write!(f, "Scan shift requested but the scan chain is disabled")
            }
            Self::SnapshotMismatch { expected, found } => {
                write!(
                    f,
                    "Snapshot shape mismatch: expected width {} (reserved zero: {}), found width {} (reserved zero: {})",
                    expected.0, expected.1, found.0, found.1
                )
            }
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Io(err) => write!(f, "I/O error: {}", err),
            Self::Codec(msg) => write!(f, "Snapshot codec error: {}", msg),
        }
    }
}

impl std::error::Error for FreeListError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for FreeListError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<bincode::Error> for FreeListError {
    fn from(err: bincode::Error) -> Self {
        Self::Codec(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FreeListError>;
