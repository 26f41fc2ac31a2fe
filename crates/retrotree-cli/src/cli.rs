use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use retrotree_chem::{DEFAULT_TVERSKY_THRESHOLD, SeedStrategy};
use retrotree_core::PlannerConfig;

#[derive(Parser, Debug)]
#[command(
    name = "retrotree",
    version,
    about = "Monte Carlo tree search for synthesis pathways from building blocks to a target molecule."
)]
pub struct Cli {
    /// Problem file (YAML) with the target, building blocks, groups and templates.
    #[arg(value_name = "PATH")]
    pub problem: PathBuf,

    /// Number of search iterations; overrides the config file.
    #[arg(short = 's', long, value_name = "NUM")]
    pub steps: Option<usize>,

    /// Number of building blocks used to seed the tree.
    #[arg(short = 'r', long, value_name = "NUM", default_value_t = 1000)]
    pub rnum: usize,

    /// How building blocks are retrieved.
    #[arg(long, value_enum, default_value_t = Reagents::Tversky)]
    pub reagents: Reagents,

    /// Minimum Tversky similarity for `--reagents tversky`.
    #[arg(long, value_name = "FLOAT", default_value_t = DEFAULT_TVERSKY_THRESHOLD)]
    pub tversky_threshold: f64,

    /// Worker threads for template application; overrides the config file.
    #[arg(long, value_name = "NUM")]
    pub cpu: Option<usize>,

    /// Depth bound for greedy selection; overrides the config file.
    #[arg(long, value_name = "NUM")]
    pub max_depth: Option<u64>,

    /// Directory for checkpoints, pathways and the log file.
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Planner config in YAML; built-in defaults when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Continue from a checkpoint instead of seeding a new tree. The saved
    /// settings apply; only --steps, --cpu, --max-depth and --output override them.
    #[arg(
        long,
        value_name = "PATH",
        conflicts_with_all = ["config", "rnum", "reagents", "tversky_threshold"]
    )]
    pub resume: Option<PathBuf>,

    /// Number of achieved products written to the pathway file.
    #[arg(long, value_name = "NUM", default_value_t = 100)]
    pub paths: usize,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Do not write `{output}/{name}.log`
    #[arg(long)]
    pub no_log_file: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reagents {
    /// Precomputed Tversky screen over the catalog.
    Tversky,
    /// Tanimoto ranking of the whole catalog.
    Similarity,
}

impl Cli {
    /// Config file (or defaults) with command-line overrides applied.
    pub fn planner_config(&self) -> Result<PlannerConfig> {
        let mut config = match &self.config {
            Some(path) => PlannerConfig::from_yaml_path(path)
                .with_context(|| format!("failed to load planner config {}", path.display()))?,
            None => PlannerConfig::default(),
        };
        self.apply_overrides(&mut config);
        config.validate().context("invalid planner settings")?;
        Ok(config)
    }

    /// Copy the flags that were given onto `config`.
    pub fn apply_overrides(&self, config: &mut PlannerConfig) {
        if let Some(steps) = self.steps {
            config.iterations = steps;
        }
        if let Some(cpu) = self.cpu {
            config.workers = cpu;
        }
        if let Some(max_depth) = self.max_depth {
            config.max_depth = max_depth;
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
    }

    pub fn seed_strategy(&self) -> SeedStrategy {
        match self.reagents {
            Reagents::Tversky => SeedStrategy::Tversky {
                threshold: self.tversky_threshold,
                limit: self.rnum,
            },
            Reagents::Similarity => SeedStrategy::similarity(self.rnum),
        }
    }

    pub fn log_file(&self, output_dir: &Path, name: &str) -> Option<PathBuf> {
        (!self.no_log_file).then(|| output_dir.join(format!("{name}.log")))
    }
}
