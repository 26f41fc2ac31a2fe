use std::{path::PathBuf, sync::Arc};

use retrotree_chem::{SeedStrategy, compile_yaml};
use retrotree_core::{Planner, PlannerConfig};

fn main() {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("crates/retrotree-chem/problems/amide.yaml"));

    let problem = compile_yaml(&path).expect("failed to compile problem YAML");
    let seeds = SeedStrategy::similarity(50).candidates(problem.library.catalog(), &problem.target);
    let output = std::env::temp_dir().join("retrotree-demo");
    let config = PlannerConfig {
        iterations: 50,
        workers: 4,
        output_dir: output,
        ..PlannerConfig::default()
    };

    let mut planner = Planner::new(Arc::new(problem.library), problem.target, problem.name, config)
        .expect("invalid planner config");
    planner.seed(seeds).expect("seeding failed");
    let run = planner.run().expect("search failed");

    println!(
        "iterations={} nodes={} targets_found={} stop={:?}",
        run.iterations_completed,
        planner.tree().node_count(),
        run.targets_found,
        run.stop_reason
    );
    for entry in planner.achieved_summary(5) {
        println!("{:.4} {}", entry.best_similarity(), entry.signature);
    }
}
