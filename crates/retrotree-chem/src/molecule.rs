//! Molecules as multisets of named fragments.
//!
//! Text form lists fragments joined by `-`, e.g. `Ph-COOH`. The canonical
//! form sorts fragments, so `COOH-Ph` and `Ph-COOH` are the same molecule.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ChemError;

pub const FRAGMENT_SEPARATOR: char = '-';
/// Separates molecules on one side of a reaction.
pub const COMPONENT_SEPARATOR: char = '.';

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Molecule {
    fragments: BTreeMap<String, u32>,
}

impl Molecule {
    /// Build a molecule from fragment names, validating each one.
    pub fn from_fragments<I, S>(fragments: I) -> Result<Self, ChemError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut molecule = Molecule::default();
        for fragment in fragments {
            let fragment = fragment.as_ref().trim();
            validate_fragment(fragment)?;
            *molecule.fragments.entry(fragment.to_string()).or_insert(0) += 1;
        }
        Ok(molecule)
    }

    /// Distinct fragments with their multiplicity, in canonical order.
    pub fn fragments(&self) -> impl Iterator<Item = (&str, u32)> {
        self.fragments
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
    }

    pub fn count(&self, fragment: &str) -> u32 {
        self.fragments.get(fragment).copied().unwrap_or(0)
    }

    /// Number of fragments, counting repeats.
    pub fn size(&self) -> u32 {
        self.fragments.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Whether every fragment of `part` occurs here at least as often.
    pub fn contains(&self, part: &Molecule) -> bool {
        part.fragments()
            .all(|(name, count)| self.count(name) >= count)
    }

    /// Remove `part`; `None` when it is not contained.
    pub fn without(&self, part: &Molecule) -> Option<Molecule> {
        if !self.contains(part) {
            return None;
        }
        let mut rest = self.clone();
        for (name, count) in part.fragments() {
            if let Some(held) = rest.fragments.get_mut(name) {
                *held -= count;
                if *held == 0 {
                    rest.fragments.remove(name);
                }
            }
        }
        Some(rest)
    }

    /// Multiset union of both molecules' fragments.
    pub fn merged(&self, other: &Molecule) -> Molecule {
        let mut joined = self.clone();
        for (name, count) in other.fragments() {
            *joined.fragments.entry(name.to_string()).or_insert(0) += count;
        }
        joined
    }

    /// Multiset difference that saturates at zero.
    pub fn saturating_without(&self, part: &Molecule) -> Molecule {
        let mut rest = self.clone();
        for (name, count) in part.fragments() {
            if let Some(held) = rest.fragments.get_mut(name) {
                *held = held.saturating_sub(count);
                if *held == 0 {
                    rest.fragments.remove(name);
                }
            }
        }
        rest
    }
}

fn validate_fragment(fragment: &str) -> Result<(), ChemError> {
    let reason = if fragment.is_empty() {
        Some("empty fragment")
    } else if fragment.chars().any(char::is_whitespace) {
        Some("fragment contains whitespace")
    } else if fragment
        .chars()
        .any(|c| c == FRAGMENT_SEPARATOR || c == COMPONENT_SEPARATOR || c == '>')
    {
        Some("fragment contains a reserved separator")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(ChemError::InvalidMolecule {
            text: fragment.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

impl FromStr for Molecule {
    type Err = ChemError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChemError::InvalidMolecule {
                text: text.to_string(),
                reason: "no fragments".to_string(),
            });
        }
        Molecule::from_fragments(text.split(FRAGMENT_SEPARATOR)).map_err(|err| match err {
            ChemError::InvalidMolecule { reason, .. } => ChemError::InvalidMolecule {
                text: text.to_string(),
                reason,
            },
            other => other,
        })
    }
}

/// The empty string maps to the empty fragment set, so leftovers survive serialization.
impl TryFrom<String> for Molecule {
    type Error = ChemError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim().is_empty() {
            return Ok(Molecule::default());
        }
        value.parse()
    }
}

impl From<Molecule> for String {
    fn from(molecule: Molecule) -> Self {
        molecule.to_string()
    }
}

impl fmt::Display for Molecule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, count) in self.fragments() {
            for _ in 0..count {
                if !first {
                    write!(f, "{FRAGMENT_SEPARATOR}")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mol(text: &str) -> Molecule {
        text.parse().expect("valid molecule")
    }

    #[test]
    fn canonical_form_ignores_fragment_order() {
        assert_eq!(mol("Ph-COOH").to_string(), mol("COOH-Ph").to_string());
        assert_eq!(mol("NH2-Ph-NH2").to_string(), "NH2-NH2-Ph");
    }

    #[test]
    fn containment_respects_multiplicity() {
        let diamine = mol("NH2-Ph-NH2");
        assert!(diamine.contains(&mol("NH2-NH2")));
        assert!(!diamine.contains(&mol("NH2-NH2-NH2")));
        assert_eq!(diamine.without(&mol("NH2")), Some(mol("NH2-Ph")));
        assert_eq!(diamine.without(&mol("OH")), None);
    }

    #[test]
    fn merge_adds_counts() {
        let merged = mol("Ph-COOH").merged(&mol("COOH-CH3"));
        assert_eq!(merged.count("COOH"), 2);
        assert_eq!(merged.size(), 4);
    }

    #[test]
    fn reserved_characters_are_rejected() {
        for text in ["", "Ph--OH", "Ph-O H", "A.B", "A>B"] {
            assert!(text.parse::<Molecule>().is_err(), "{text:?} should not parse");
        }
    }

    #[test]
    fn serializes_as_canonical_text() {
        let yaml = serde_yaml::to_string(&mol("Ph-OH")).unwrap();
        assert!(yaml.contains("OH-Ph"));
        let back: Molecule = serde_yaml::from_str("Ph-OH").unwrap();
        assert_eq!(back, mol("OH-Ph"));
    }
}
