use std::cmp::Ordering;

use crate::{
    fingerprint::{self, Fingerprint},
    molecule::Molecule,
};

#[derive(Debug, Clone)]
struct Block {
    molecule: Molecule,
    fingerprint: Fingerprint,
}

/// Building blocks with precomputed fingerprints.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    blocks: Vec<Block>,
}

impl Catalog {
    /// Index `molecules`, skipping repeats of the same canonical molecule.
    pub fn new<I: IntoIterator<Item = Molecule>>(molecules: I) -> Self {
        let mut blocks: Vec<Block> = Vec::new();
        for molecule in molecules {
            if blocks.iter().any(|block| block.molecule == molecule) {
                continue;
            }
            blocks.push(Block {
                fingerprint: Fingerprint::of(&molecule),
                molecule,
            });
        }
        Catalog { blocks }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn molecules(&self) -> impl Iterator<Item = &Molecule> {
        self.blocks.iter().map(|block| &block.molecule)
    }

    pub fn contains(&self, molecule: &Molecule) -> bool {
        self.blocks.iter().any(|block| &block.molecule == molecule)
    }

    /// Blocks whose Tversky similarity towards `target` exceeds `threshold`,
    /// best first, at most `limit` of them.
    pub fn tversky_screen(&self, target: &Molecule, threshold: f64, limit: usize) -> Vec<(Molecule, f64)> {
        let target = Fingerprint::of(target);
        let scored = self.blocks.iter().filter_map(|block| {
            let score = fingerprint::tversky(&block.fingerprint, &target);
            (score > threshold).then(|| (block.molecule.clone(), score))
        });
        top(scored, limit)
    }

    /// The `limit` blocks most Tanimoto-similar to `target`, best first.
    pub fn most_similar(&self, target: &Molecule, limit: usize) -> Vec<(Molecule, f64)> {
        let target = Fingerprint::of(target);
        let scored = self.blocks.iter().map(|block| {
            (
                block.molecule.clone(),
                fingerprint::tanimoto(&block.fingerprint, &target),
            )
        });
        top(scored, limit)
    }

    /// Candidate partners holding `required`, for a query fingerprint.
    ///
    /// Blocks covering every query bit come first. Only when none do are the
    /// remaining blocks offered, ordered by similarity to the query.
    pub fn partners(&self, query: &Fingerprint, required: &Molecule) -> Vec<&Molecule> {
        if query.is_empty() {
            return Vec::new();
        }
        let eligible: Vec<&Block> = self
            .blocks
            .iter()
            .filter(|block| block.molecule.contains(required))
            .collect();

        let covering: Vec<&Block> = eligible
            .iter()
            .copied()
            .filter(|block| block.fingerprint.covers(query))
            .collect();
        let pool = if covering.is_empty() {
            eligible
                .into_iter()
                .filter(|block| block.fingerprint.common(query) > 0)
                .collect()
        } else {
            covering
        };

        let mut ranked: Vec<(&Molecule, f64)> = pool
            .into_iter()
            .map(|block| {
                (
                    &block.molecule,
                    fingerprint::tanimoto(&block.fingerprint, query),
                )
            })
            .collect();
        ranked.sort_by(|a, b| descending(a.1, b.1));
        ranked.into_iter().map(|(molecule, _)| molecule).collect()
    }
}

fn descending(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

fn top(scored: impl Iterator<Item = (Molecule, f64)>, limit: usize) -> Vec<(Molecule, f64)> {
    let mut scored: Vec<(Molecule, f64)> = scored.collect();
    scored.sort_by(|a, b| descending(a.1, b.1));
    scored.truncate(limit);
    scored
}
