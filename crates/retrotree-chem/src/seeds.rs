use tracing::info;

use crate::{catalog::Catalog, molecule::Molecule};

/// Minimum Tversky similarity for the precomputed screen.
pub const DEFAULT_TVERSKY_THRESHOLD: f64 = 0.6;
/// Default number of building blocks handed to the planner.
pub const DEFAULT_SEED_LIMIT: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq)]
/// How initial building blocks are retrieved for a target.
pub enum SeedStrategy {
    /// Screen precomputed catalog fingerprints by Tversky similarity.
    Tversky { threshold: f64, limit: usize },
    /// Rank the whole catalog by Tanimoto similarity.
    Similarity { limit: usize },
}

impl SeedStrategy {
    pub fn tversky(limit: usize) -> Self {
        SeedStrategy::Tversky {
            threshold: DEFAULT_TVERSKY_THRESHOLD,
            limit,
        }
    }

    pub fn similarity(limit: usize) -> Self {
        SeedStrategy::Similarity { limit }
    }

    /// Building blocks with their similarity to `target`, best first.
    pub fn candidates(&self, catalog: &Catalog, target: &Molecule) -> Vec<(Molecule, f64)> {
        let found = match *self {
            SeedStrategy::Tversky { threshold, limit } => {
                catalog.tversky_screen(target, threshold, limit)
            }
            SeedStrategy::Similarity { limit } => catalog.most_similar(target, limit),
        };
        info!(strategy = ?self, found = found.len(), catalog = catalog.len(), "building blocks retrieved");
        found
    }
}

impl Default for SeedStrategy {
    fn default() -> Self {
        SeedStrategy::tversky(DEFAULT_SEED_LIMIT)
    }
}
