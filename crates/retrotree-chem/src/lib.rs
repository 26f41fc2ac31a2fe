mod catalog;
mod error;
mod fingerprint;
mod io;
mod library;
mod molecule;
mod seeds;
mod spec;
mod template;

pub use catalog::Catalog;
pub use error::ChemError;
pub use fingerprint::{FINGERPRINT_BITS, Fingerprint, TVERSKY_ALPHA, TVERSKY_BETA, tanimoto, tversky};
pub use io::{compile_yaml, load_yaml, save_yaml};
pub use library::ChemLibrary;
pub use molecule::{COMPONENT_SEPARATOR, FRAGMENT_SEPARATOR, Molecule};
pub use seeds::{DEFAULT_SEED_LIMIT, DEFAULT_TVERSKY_THRESHOLD, SeedStrategy};
pub use spec::{GroupSpec, Problem, ProblemSpec, TemplateSpec};
pub use template::{Group, Reaction, Template};
