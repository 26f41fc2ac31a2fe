use std::fmt;

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

/// Failure reported by a chemistry collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChemistryError {
    /// A lookup service (template index, building-block catalog) could not answer.
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
    /// Applying a template raised an error.
    #[error("reaction failed: {0}")]
    Reaction(String),
}

/// Everything the planner needs from the chemistry side.
///
/// Implementations are shared between the driver and the worker threads,
/// so they must be `Send + Sync` and free of interior mutation that could race.
pub trait Chemistry: Send + Sync + 'static {
    type Molecule: Clone + fmt::Display + Send + Sync + Serialize + DeserializeOwned + 'static;
    type Reaction: Clone + PartialEq + fmt::Display + Send + Serialize + DeserializeOwned + 'static;
    type Template: Clone
        + PartialEq
        + fmt::Display
        + Send
        + Sync
        + Serialize
        + DeserializeOwned
        + 'static;

    /// Stable textual signature used for deduplication.
    fn canonicalize(&self, structure: &Self::Molecule) -> String;

    /// Templates whose functional groups occur in `structure`.
    /// `single` selects one-reactant templates, otherwise two-reactant ones.
    fn applicable_templates(
        &self,
        structure: &Self::Molecule,
        single: bool,
    ) -> Result<Vec<Self::Template>, ChemistryError>;

    fn apply_template(
        &self,
        reactant: &Self::Molecule,
        template: &Self::Template,
    ) -> Result<Option<Self::Reaction>, ChemistryError>;

    /// Two-reactant application; the implementation picks the second reactant itself.
    fn apply_template_two(
        &self,
        target: &Self::Molecule,
        reactant: &Self::Molecule,
        template: &Self::Template,
    ) -> Result<Option<Self::Reaction>, ChemistryError>;

    fn products(&self, reaction: &Self::Reaction) -> Vec<Self::Molecule>;

    fn tanimoto(&self, a: &Self::Molecule, b: &Self::Molecule) -> f64;

    /// Asymmetric similarity of `query` towards `target`.
    fn tversky(&self, query: &Self::Molecule, target: &Self::Molecule) -> f64;
}
