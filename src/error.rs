use thiserror::Error;

use crate::species::Species;

/// Spawn requests that cannot be honoured. Callers decide on retry policy.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpawnError {
    #[error("agent capacity reached ({capacity} live agents)")]
    AgentCapacity { capacity: usize },
    #[error("school capacity reached ({capacity} schools)")]
    SchoolCapacity { capacity: usize },
    #[error("{0:?} does not school")]
    NotSchooling(Species),
    #[error("a school needs at least one member")]
    EmptySchool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parse failed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid world dimensions {width}x{depth}")]
    InvalidWorld { width: f32, depth: f32 },
    #[error("{0} must be non-zero")]
    ZeroCapacity(&'static str),
    #[error("invalid fight tuning: {0}")]
    InvalidFightTuning(&'static str),
}
