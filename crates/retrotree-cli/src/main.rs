mod cli;
mod logging;

use std::{fs, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use retrotree_chem::{ChemLibrary, compile_yaml};
use retrotree_core::{Planner, PlannerError, SeedOutcome};
use tracing::{debug, info};

use crate::cli::Cli;

fn main() {
    if let Err(e) = run_app() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    let problem = compile_yaml(&cli.problem)
        .with_context(|| format!("failed to load problem {}", cli.problem.display()))?;
    let config = cli.planner_config()?;

    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("failed to create output directory {}", config.output_dir.display())
    })?;
    let log_file = cli.log_file(&config.output_dir, &problem.name);
    logging::setup_logging(cli.verbose, cli.quiet, log_file.as_deref())?;

    info!(
        "Program started. Target: {}, {}",
        problem.name, problem.target
    );
    debug!(?cli, "arguments parsed");

    let chemistry = Arc::new(problem.library);
    let mut planner = match &cli.resume {
        Some(path) => {
            let mut planner: Planner<ChemLibrary> = Planner::load_checkpoint(Arc::clone(&chemistry), path)
                .with_context(|| format!("failed to resume from {}", path.display()))?;
            planner
                .update_config(|config| cli.apply_overrides(config))
                .context("invalid settings for the resumed run")?;
            fs::create_dir_all(&planner.config().output_dir)?;
            planner
        }
        None => {
            let seeds = cli
                .seed_strategy()
                .candidates(chemistry.catalog(), &problem.target);
            let mut planner = Planner::new(
                Arc::clone(&chemistry),
                problem.target.clone(),
                problem.name.clone(),
                config,
            )?;
            match planner.seed(seeds) {
                Ok(SeedOutcome::TargetIsBuildingBlock) => {
                    println!("{} is already a building block", problem.target);
                    return Ok(());
                }
                Ok(SeedOutcome::Seeded { nodes }) => info!(nodes, "tree seeded"),
                Err(PlannerError::NoSeedCandidates) => {
                    anyhow::bail!("reagents not found for {}", problem.target)
                }
                Err(err) => return Err(err.into()),
            }
            planner
        }
    };

    let metrics = planner.run_with_hook(|iteration| {
        debug!(
            step = iteration.step,
            selected = %iteration.selected,
            tasks = iteration.tasks_submitted,
            missing = iteration.tasks_missing,
            created = iteration.nodes_created,
            "iteration done"
        );
    })?;
    let paths = planner.export_paths(cli.paths)?;
    info!("Done! Dumped");

    println!(
        "{} iterations, {} nodes, {} target hits, stopped: {:?}",
        metrics.iterations_completed,
        planner.tree().node_count(),
        metrics.targets_found,
        metrics.stop_reason
    );
    for entry in planner.achieved_summary(10) {
        println!("{:.4} {}", entry.best_similarity(), entry.signature);
    }
    println!("pathways written to {}", paths.display());
    Ok(())
}
