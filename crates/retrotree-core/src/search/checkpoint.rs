use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    achieved::Achieved,
    chemistry::Chemistry,
    search::{
        config::PlannerConfig,
        error::PlannerError,
        planner::{CancelToken, Planner},
    },
    tree::{search_tree::SearchTree, snapshot::TreeSnapshot},
};

pub const PLANNER_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Which checkpoint file to write.
pub enum CheckpointKind {
    /// Written whenever an expansion produced the target.
    WithTarget,
    /// Rolling checkpoint written every `checkpoint_interval` iterations.
    Backup,
    /// Written when `run` returns.
    Final,
}

impl CheckpointKind {
    fn suffix(&self) -> &'static str {
        match self {
            CheckpointKind::WithTarget => "with_target",
            CheckpointKind::Backup => "backup",
            CheckpointKind::Final => "final",
        }
    }
}

/// Everything needed to resume a run: full tree, registries and counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerSnapshot<M, R, T> {
    pub schema_version: u32,
    pub target_name: String,
    pub target: M,
    pub config: PlannerConfig,
    pub seeded: bool,
    pub target_is_building_block: bool,
    pub steps_completed: usize,
    pub tree: TreeSnapshot<M, R, T>,
    pub achieved: Achieved<R, T>,
}

/// Path of a checkpoint file for `target_name` inside `output_dir`.
pub fn checkpoint_path(output_dir: &Path, target_name: &str, kind: CheckpointKind) -> PathBuf {
    output_dir.join(format!("{target_name}_{}.json", kind.suffix()))
}

impl<C: Chemistry> Planner<C> {
    pub fn snapshot(&self) -> PlannerSnapshot<C::Molecule, C::Reaction, C::Template> {
        PlannerSnapshot {
            schema_version: PLANNER_SCHEMA_VERSION,
            target_name: self.target_name.clone(),
            target: self.target.as_ref().clone(),
            config: self.config.clone(),
            seeded: self.seeded,
            target_is_building_block: self.target_is_building_block,
            steps_completed: self.steps_completed,
            tree: self.tree.snapshot(),
            achieved: self.achieved.clone(),
        }
    }

    /// Rebuild a planner that continues exactly where the snapshot left off.
    pub fn from_snapshot(
        chemistry: Arc<C>,
        snapshot: PlannerSnapshot<C::Molecule, C::Reaction, C::Template>,
    ) -> Result<Self, PlannerError> {
        if snapshot.schema_version != PLANNER_SCHEMA_VERSION {
            return Err(PlannerError::UnsupportedSnapshot {
                found: snapshot.schema_version,
            });
        }
        snapshot.config.validate()?;
        let target_signature = chemistry.canonicalize(&snapshot.target);
        let tree = SearchTree::from_snapshot(snapshot.tree, snapshot.config.tree_params())?;

        Ok(Planner {
            chemistry,
            target: Arc::new(snapshot.target),
            target_signature,
            target_name: snapshot.target_name,
            config: snapshot.config,
            tree,
            achieved: snapshot.achieved,
            seeded: snapshot.seeded,
            target_is_building_block: snapshot.target_is_building_block,
            steps_completed: snapshot.steps_completed,
            cancel: CancelToken::default(),
        })
    }

    /// Write a checkpoint into the configured output directory.
    pub fn checkpoint(&self, kind: CheckpointKind) -> Result<PathBuf, PlannerError> {
        fs::create_dir_all(&self.config.output_dir)?;
        let path = checkpoint_path(&self.config.output_dir, &self.target_name, kind);
        self.write_snapshot(&path)?;
        Ok(path)
    }

    /// Serialize the current state to `path`, replacing it atomically.
    pub fn write_snapshot(&self, path: &Path) -> Result<(), PlannerError> {
        let staging = path.with_extension("json.partial");
        {
            let mut writer = BufWriter::new(File::create(&staging)?);
            serde_json::to_writer(&mut writer, &self.snapshot())?;
            writer.flush()?;
        }
        fs::rename(&staging, path)?;
        Ok(())
    }

    /// Load a planner from a checkpoint file written by [`Planner::checkpoint`].
    pub fn load_checkpoint(chemistry: Arc<C>, path: impl AsRef<Path>) -> Result<Self, PlannerError> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let snapshot = serde_json::from_reader(reader)?;
        let planner = Self::from_snapshot(chemistry, snapshot)?;
        info!(
            path = %path.display(),
            steps = planner.steps_completed,
            nodes = planner.tree.node_count(),
            "checkpoint loaded"
        );
        Ok(planner)
    }
}
