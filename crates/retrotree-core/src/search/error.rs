use thiserror::Error;

use crate::{chemistry::ChemistryError, search::config::ConfigError, tree::error::TreeError};

/// Error type for planner setup, runs and checkpoints.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// Building-block retrieval returned nothing; the run cannot start.
    #[error("no building-block candidates found for the target")]
    NoSeedCandidates,

    #[error("planner must be seeded before running")]
    NotSeeded,

    /// Template lookup kept failing until the circuit breaker tripped.
    #[error("collaborator failed {failures} iterations in a row")]
    CollaboratorUnavailable {
        failures: usize,
        #[source]
        source: ChemistryError,
    },

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("checkpoint I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("checkpoint encoding failed: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("unsupported planner snapshot version {found}")]
    UnsupportedSnapshot { found: u32 },
}
