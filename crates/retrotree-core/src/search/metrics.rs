use crate::tree::ids::NodeId;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The iteration budget was used up.
    Budget,
    /// Selection found no candidates anywhere within the depth bound.
    Exhausted,
    /// The cancel token was triggered.
    Cancelled,
    /// Seeding found the target among the building blocks; nothing to search.
    TargetIsBuildingBlock,
}

/// Per-iteration metrics emitted by the planner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationMetrics {
    /// 1-based step number across resumes.
    pub step: usize,
    pub selected: NodeId,
    pub tasks_submitted: usize,
    pub reactions_collected: usize,
    pub tasks_missing: usize,
    pub candidates: usize,
    pub nodes_created: usize,
    pub target_found: bool,
}

impl IterationMetrics {
    pub(crate) fn idle(step: usize, selected: NodeId) -> Self {
        IterationMetrics {
            step,
            selected,
            tasks_submitted: 0,
            reactions_collected: 0,
            tasks_missing: 0,
            candidates: 0,
            nodes_created: 0,
            target_found: false,
        }
    }
}

/// Aggregate metrics for one call to `run`.
#[derive(Debug, Clone, PartialEq)]
pub struct RunMetrics {
    pub iterations_requested: usize,
    pub iterations_completed: usize,
    pub nodes_created: usize,
    pub targets_found: usize,
    pub stop_reason: StopReason,
}

impl RunMetrics {
    pub(crate) fn new(iterations_requested: usize) -> Self {
        RunMetrics {
            iterations_requested,
            iterations_completed: 0,
            nodes_created: 0,
            targets_found: 0,
            stop_reason: StopReason::Budget,
        }
    }

    pub(crate) fn record(&mut self, metrics: &IterationMetrics) {
        self.iterations_completed += 1;
        self.nodes_created += metrics.nodes_created;
        if metrics.target_found {
            self.targets_found += 1;
        }
    }
}
