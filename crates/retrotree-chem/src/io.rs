use std::{fs, path::Path};

use crate::{ChemError, Problem, ProblemSpec};

/// Load a problem spec from YAML on disk.
pub fn load_yaml(path: impl AsRef<Path>) -> Result<ProblemSpec, ChemError> {
    let yaml = fs::read_to_string(path)?;
    let spec: ProblemSpec = serde_yaml::from_str(&yaml)?;
    Ok(spec)
}

/// Load and compile a problem from a YAML file.
pub fn compile_yaml(path: impl AsRef<Path>) -> Result<Problem, ChemError> {
    let spec = load_yaml(path)?;
    spec.compile()
}

/// Serialize and write a problem spec to YAML.
pub fn save_yaml(path: impl AsRef<Path>, spec: &ProblemSpec) -> Result<(), ChemError> {
    let yaml = serde_yaml::to_string(spec)?;
    fs::write(path, yaml)?;
    Ok(())
}
