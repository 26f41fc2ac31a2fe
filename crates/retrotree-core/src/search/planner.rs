use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tracing::{debug, error, info, instrument, warn};

use crate::{
    achieved::{Achieved, AchievedEntry},
    chemistry::{Chemistry, ChemistryError},
    pool::WorkerPool,
    search::{
        checkpoint::CheckpointKind,
        config::{ConfigError, PlannerConfig},
        error::PlannerError,
        metrics::{IterationMetrics, RunMetrics, StopReason},
        paths,
    },
    tree::{
        error::TreeError,
        ids::NodeId,
        search_tree::{Candidate, SearchTree},
    },
};

/// Search tree specialised to one chemistry implementation.
pub type PlannerTree<C> =
    SearchTree<<C as Chemistry>::Molecule, <C as Chemistry>::Reaction, <C as Chemistry>::Template>;

/// Achieved registry specialised to one chemistry implementation.
pub type PlannerAchieved<C> = Achieved<<C as Chemistry>::Reaction, <C as Chemistry>::Template>;

/// Cooperative stop switch, checked once per iteration boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Result of seeding the root with building blocks.
pub enum SeedOutcome {
    /// `nodes` building blocks now hang off the root.
    Seeded { nodes: usize },
    /// The target is itself a building block; `run` will do nothing.
    TargetIsBuildingBlock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arity {
    Single,
    Double,
}

/// What a worker sends back for one template.
struct Produced<C: Chemistry> {
    reaction: C::Reaction,
    template: C::Template,
    arity: Arity,
}

type TaskResult<C> = Result<Option<Produced<C>>, ChemistryError>;

enum StepFailure {
    Tree(TreeError),
    Lookup(ChemistryError),
}

impl From<TreeError> for StepFailure {
    fn from(err: TreeError) -> Self {
        StepFailure::Tree(err)
    }
}

impl From<ChemistryError> for StepFailure {
    fn from(err: ChemistryError) -> Self {
        StepFailure::Lookup(err)
    }
}

/// Drives the MCTS loop for one target.
///
/// The planner owns the tree and both registries and is the only place they
/// are mutated. Worker threads only see chemistry calls and send their results
/// back through the pool.
pub struct Planner<C: Chemistry> {
    pub(crate) chemistry: Arc<C>,
    pub(crate) target: Arc<C::Molecule>,
    pub(crate) target_signature: String,
    pub(crate) target_name: String,
    pub(crate) config: PlannerConfig,
    pub(crate) tree: PlannerTree<C>,
    pub(crate) achieved: PlannerAchieved<C>,
    pub(crate) seeded: bool,
    pub(crate) target_is_building_block: bool,
    pub(crate) steps_completed: usize,
    pub(crate) cancel: CancelToken,
}

impl<C: Chemistry> Planner<C> {
    /// Create an unseeded planner for `target`.
    pub fn new(
        chemistry: Arc<C>,
        target: C::Molecule,
        target_name: impl Into<String>,
        config: PlannerConfig,
    ) -> Result<Self, PlannerError> {
        config.validate()?;
        let target_signature = chemistry.canonicalize(&target);
        let target_name = target_name.into();
        info!(target = %target_name, signature = %target_signature, "planner created");

        Ok(Planner {
            tree: SearchTree::new(target_signature.clone(), config.tree_params()),
            achieved: Achieved::new(config.achieved_capacity),
            chemistry,
            target: Arc::new(target),
            target_signature,
            target_name,
            config,
            seeded: false,
            target_is_building_block: false,
            steps_completed: 0,
            cancel: CancelToken::default(),
        })
    }

    pub fn tree(&self) -> &PlannerTree<C> {
        &self.tree
    }

    pub fn achieved(&self) -> &PlannerAchieved<C> {
        &self.achieved
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn target(&self) -> &C::Molecule {
        &self.target
    }

    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    pub fn target_is_building_block(&self) -> bool {
        self.target_is_building_block
    }

    /// Iterations finished so far, across resumes.
    pub fn steps_completed(&self) -> usize {
        self.steps_completed
    }

    /// Change the total iteration budget, e.g. to continue a resumed run further.
    pub fn set_iterations(&mut self, iterations: usize) -> Result<(), PlannerError> {
        self.update_config(|config| config.iterations = iterations)
    }

    /// Edit the settings of an existing planner, typically after a resume.
    ///
    /// The selection seed and the achieved capacity are part of the saved state
    /// and cannot change.
    pub fn update_config<F>(&mut self, update: F) -> Result<(), PlannerError>
    where
        F: FnOnce(&mut PlannerConfig),
    {
        let mut config = self.config.clone();
        update(&mut config);
        if config.seed != self.config.seed {
            return Err(ConfigError::Invalid("seed is fixed once the planner exists".to_string()).into());
        }
        if config.achieved_capacity != self.config.achieved_capacity {
            return Err(ConfigError::Invalid(
                "achieved_capacity is fixed once the planner exists".to_string(),
            )
            .into());
        }
        config.validate()?;
        self.tree.set_params(config.tree_params());
        self.config = config;
        Ok(())
    }

    /// Handle that stops `run` at the next iteration boundary.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Attach the initial building blocks to the root.
    ///
    /// Node values are the Tversky similarity of each block to the target; the
    /// similarity supplied with the candidate only orders the input.
    pub fn seed<I>(&mut self, candidates: I) -> Result<SeedOutcome, PlannerError>
    where
        I: IntoIterator<Item = (C::Molecule, f64)>,
    {
        let candidates: Vec<(C::Molecule, f64)> = candidates.into_iter().collect();
        if candidates.is_empty() {
            return Err(PlannerError::NoSeedCandidates);
        }

        let signed: Vec<(C::Molecule, String)> = candidates
            .into_iter()
            .map(|(structure, _)| {
                let signature = self.chemistry.canonicalize(&structure);
                (structure, signature)
            })
            .collect();

        if signed
            .iter()
            .any(|(_, signature)| *signature == self.target_signature)
        {
            info!("target already exists in the database of building blocks");
            self.target_is_building_block = true;
            self.seeded = true;
            return Ok(SeedOutcome::TargetIsBuildingBlock);
        }

        let mut nodes = 0;
        for (structure, signature) in signed {
            let value = self.chemistry.tversky(&structure, &self.target);
            if self.tree.add_seed(structure, signature, value)?.is_some() {
                nodes += 1;
            }
        }
        info!(nodes, "seeded building blocks");
        self.seeded = true;
        Ok(SeedOutcome::Seeded { nodes })
    }

    /// Run the remaining iteration budget.
    pub fn run(&mut self) -> Result<RunMetrics, PlannerError> {
        self.run_with_hook(|_| {})
    }

    /// Run the remaining iteration budget, calling `on_iteration` after each step.
    #[instrument(skip_all, fields(target = %self.target_name))]
    pub fn run_with_hook<F>(&mut self, mut on_iteration: F) -> Result<RunMetrics, PlannerError>
    where
        F: FnMut(&IterationMetrics),
    {
        let remaining = self.config.iterations.saturating_sub(self.steps_completed);
        let mut metrics = RunMetrics::new(remaining);

        if self.target_is_building_block {
            metrics.stop_reason = StopReason::TargetIsBuildingBlock;
            return Ok(metrics);
        }
        if !self.seeded {
            return Err(PlannerError::NotSeeded);
        }

        let mut pool = WorkerPool::new(self.config.workers)?;
        let outcome = self.iterate_until_done(&mut pool, &mut metrics, &mut on_iteration);
        pool.shutdown();
        if let Err(err) = outcome {
            match self.checkpoint(CheckpointKind::Final) {
                Ok(path) => warn!(%err, checkpoint = %path.display(), "search aborted"),
                Err(write_err) => {
                    error!(%err, %write_err, "search aborted, final checkpoint not written")
                }
            }
            return Err(err);
        }

        let path = self.checkpoint(CheckpointKind::Final)?;
        info!(
            completed = metrics.iterations_completed,
            reason = ?metrics.stop_reason,
            checkpoint = %path.display(),
            "search finished"
        );
        Ok(metrics)
    }

    fn iterate_until_done<F>(
        &mut self,
        pool: &mut WorkerPool<TaskResult<C>>,
        metrics: &mut RunMetrics,
        on_iteration: &mut F,
    ) -> Result<(), PlannerError>
    where
        F: FnMut(&IterationMetrics),
    {
        let mut consecutive_failures = 0;

        while self.steps_completed < self.config.iterations {
            if self.cancel.is_cancelled() {
                info!("search cancelled");
                metrics.stop_reason = StopReason::Cancelled;
                return Ok(());
            }

            let step = self.steps_completed + 1;
            self.tree.advance_iteration();
            info!("*** step {step} started ***");

            let selected = match self.tree.select() {
                Ok(node_id) => node_id,
                Err(TreeError::NoCandidates { .. }) => {
                    info!("no candidates left anywhere within the depth bound");
                    metrics.stop_reason = StopReason::Exhausted;
                    return Ok(());
                }
                Err(err) => return Err(err.into()),
            };

            let iteration = match self.expand_selected(pool, step, selected) {
                Ok(iteration) => {
                    consecutive_failures = 0;
                    iteration
                }
                Err(StepFailure::Tree(err)) => return Err(err.into()),
                Err(StepFailure::Lookup(err)) => {
                    consecutive_failures += 1;
                    warn!(%err, consecutive_failures, "template lookup failed, skipping iteration");
                    let limit = self.config.max_consecutive_failures;
                    if limit > 0 && consecutive_failures >= limit {
                        return Err(PlannerError::CollaboratorUnavailable {
                            failures: consecutive_failures,
                            source: err,
                        });
                    }
                    IterationMetrics::idle(step, selected)
                }
            };
            self.steps_completed = step;

            if iteration.target_found {
                let path = self.checkpoint(CheckpointKind::WithTarget)?;
                info!("dumped into {}", path.display());
            }

            if let Some(best) = self.achieved.best() {
                info!(
                    "the best yet: {} with {}",
                    best.signature,
                    best.best_similarity()
                );
            }

            let interval = self.config.checkpoint_interval;
            if interval > 0 && step % interval == 0 {
                let path = self.checkpoint(CheckpointKind::Backup)?;
                self.log_similar_paths(100)?;
                info!("backup dumped into {}", path.display());
            }

            metrics.record(&iteration);
            on_iteration(&iteration);
        }
        Ok(())
    }

    /// Generate, expand and back up one selected node.
    fn expand_selected(
        &mut self,
        pool: &mut WorkerPool<TaskResult<C>>,
        step: usize,
        selected: NodeId,
    ) -> Result<IterationMetrics, StepFailure> {
        let Some(structure) = self.tree.structure_of(selected)?.cloned() else {
            debug!("root selected, nothing to react");
            return Ok(IterationMetrics::idle(step, selected));
        };
        {
            let node = self.tree.node(selected)?;
            info!(
                "best selected: {selected}, {structure}, tversky: {}, score: {}",
                node.value(),
                node.score()
            );
        }

        let one_component = self.chemistry.applicable_templates(&structure, true)?;
        let two_component = self.chemistry.applicable_templates(&structure, false)?;
        info!("found 1-c. rules: {}", one_component.len());
        info!("found 2-c. rules: {}", two_component.len());

        pool.begin_batch();
        for template in one_component {
            let chemistry = Arc::clone(&self.chemistry);
            let reactant = Arc::clone(&structure);
            pool.submit(move || {
                chemistry
                    .apply_template(&reactant, &template)
                    .map(|reaction| {
                        reaction.map(|reaction| Produced {
                            reaction,
                            template,
                            arity: Arity::Single,
                        })
                    })
            });
        }
        for template in two_component {
            let chemistry = Arc::clone(&self.chemistry);
            let target = Arc::clone(&self.target);
            let reactant = Arc::clone(&structure);
            pool.submit(move || {
                chemistry
                    .apply_template_two(&target, &reactant, &template)
                    .map(|reaction| {
                        reaction.map(|reaction| Produced {
                            reaction,
                            template,
                            arity: Arity::Double,
                        })
                    })
            });
        }
        let tasks_submitted = pool.pending();
        let collected = pool.collect(self.config.collect_timeout());

        let mut candidates = Vec::new();
        let (mut single_done, mut multi_done) = (0usize, 0usize);
        for result in collected.results.into_iter().flatten() {
            let produced = match result {
                Ok(Some(produced)) => produced,
                Ok(None) => continue,
                Err(err) => {
                    warn!(%err, "template application failed");
                    continue;
                }
            };
            match produced.arity {
                Arity::Single => single_done += 1,
                Arity::Double => multi_done += 1,
            }
            for product in self.chemistry.products(&produced.reaction) {
                candidates.push(Candidate {
                    signature: self.chemistry.canonicalize(&product),
                    tanimoto: self.chemistry.tanimoto(&product, &self.target),
                    tversky: self.chemistry.tversky(&product, &self.target),
                    structure: product,
                    reaction: produced.reaction.clone(),
                    template: produced.template.clone(),
                });
            }
        }
        info!("single done: {single_done}");
        info!("multi done: {multi_done}");
        candidates.sort_by(|a, b| b.tversky.total_cmp(&a.tversky));

        let outcome = self.tree.expand(selected, candidates.iter().cloned())?;
        if outcome.done {
            if let Some(hit) = candidates
                .iter()
                .find(|candidate| candidate.signature == self.target_signature)
            {
                info!("{}", hit.reaction);
            }
        }
        for candidate in &candidates {
            self.achieved.admit(
                &candidate.signature,
                candidate.tanimoto,
                candidate.reaction.clone(),
                candidate.template.clone(),
            );
        }
        self.tree.backup(selected)?;

        Ok(IterationMetrics {
            step,
            selected,
            tasks_submitted,
            reactions_collected: single_done + multi_done,
            tasks_missing: collected.missing,
            candidates: candidates.len(),
            nodes_created: outcome.created.len(),
            target_found: outcome.done,
        })
    }

    /// Highest-scoring expanded node.
    pub fn best_reagent(&self) -> Result<NodeId, TreeError> {
        self.tree.best_reagent()
    }

    /// Top `limit` achieved products, best first.
    pub fn achieved_summary(&self, limit: usize) -> Vec<&AchievedEntry<C::Reaction, C::Template>> {
        self.achieved.ranked().into_iter().take(limit).collect()
    }

    fn log_similar_paths(&self, limit: usize) -> Result<(), PlannerError> {
        let pathways = self.similar_paths(limit)?;
        info!("SIMILAR PATHS");
        for line in paths::render_pathways(&pathways).lines() {
            debug!("{line}");
        }
        info!("------------------------------------------");
        Ok(())
    }
}
