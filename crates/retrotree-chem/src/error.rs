use retrotree_core::ChemistryError;
use thiserror::Error;

#[derive(Debug, Error)]
/// Error type for problem loading, validation and reference chemistry.
pub enum ChemError {
    #[error("failed to read YAML file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid molecule '{text}': {reason}")]
    InvalidMolecule { text: String, reason: String },

    #[error("problem name must not be empty")]
    MissingName,

    #[error("problem declares no building blocks")]
    NoBuildingBlocks,

    #[error("duplicate group id '{id}'")]
    DuplicateGroupId { id: String },

    #[error("group '{id}' lists no fragments")]
    EmptyGroup { id: String },

    #[error("duplicate template id '{id}'")]
    DuplicateTemplateId { id: String },

    #[error("template '{template}' references unknown group '{group}'")]
    UnknownGroup { template: String, group: String },

    #[error("template '{template}' consumes nothing")]
    EmptyConsume { template: String },

    #[error("template '{template}' does not take {reactants} reactant(s)")]
    ArityMismatch { template: String, reactants: usize },
}

impl From<ChemError> for ChemistryError {
    fn from(err: ChemError) -> Self {
        ChemistryError::Reaction(err.to_string())
    }
}
