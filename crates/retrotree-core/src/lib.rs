mod achieved;
mod chemistry;
mod pool;
mod search;
mod structures;
mod tree;

pub use achieved::{Achieved, AchievedEntry, AchievedRecord, Admission, DEFAULT_CAPACITY};
pub use chemistry::{Chemistry, ChemistryError};
pub use pool::{Collected, WorkerPool};
pub use search::checkpoint::{CheckpointKind, PlannerSnapshot, checkpoint_path};
pub use search::config::{ConfigError, PlannerConfig};
pub use search::error::PlannerError;
pub use search::metrics::{IterationMetrics, RunMetrics, StopReason};
pub use search::paths::{
    PATHWAY_DELIMITER, PRODUCT_DELIMITER, PathStep, ProductPathways, render_pathways,
};
pub use search::planner::{CancelToken, Planner, PlannerAchieved, PlannerTree, SeedOutcome};
pub use structures::{RegistrySnapshot, StructureRegistry};
pub use tree::edges::{EdgeKind, ReactionEdge};
pub use tree::error::TreeError;
pub use tree::evidence::EvidenceSet;
pub use tree::ids::{NodeId, StructureKey};
pub use tree::node::NodeRecord;
pub use tree::search_tree::{Candidate, ExpansionOutcome, SearchTree, TreeParams};
pub use tree::snapshot::{EdgeSnapshot, NodeSnapshot, TreeSnapshot};
