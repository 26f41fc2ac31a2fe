use std::fmt;

use serde::{Deserialize, Serialize};

use crate::molecule::{COMPONENT_SEPARATOR, Molecule};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Named functional group; present when all of its fragments are.
pub struct Group {
    pub id: String,
    pub fragments: Molecule,
}

impl Group {
    pub fn matches(&self, molecule: &Molecule) -> bool {
        molecule.contains(&self.fragments)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Forward reaction rule over fragment multisets.
///
/// The reactant loses `consume` and gains `produce`. Two-reactant rules also
/// take a partner that must hold `partner`; those fragments are removed from
/// the partner and the rest of it is merged into the product.
pub struct Template {
    pub id: String,
    /// Groups whose presence makes this template worth trying.
    pub groups: Vec<String>,
    pub consume: Molecule,
    pub produce: Molecule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner: Option<Molecule>,
}

impl Template {
    pub fn is_single(&self) -> bool {
        self.partner.is_none()
    }

    pub fn triggered_by<'a>(&self, groups: impl IntoIterator<Item = &'a str>) -> bool {
        groups
            .into_iter()
            .any(|group| self.groups.iter().any(|own| own == group))
    }

    /// Product of the one-reactant rewrite, if the reactant fits.
    pub fn apply(&self, reactant: &Molecule) -> Option<Molecule> {
        if !self.is_single() {
            return None;
        }
        let product = reactant.without(&self.consume)?.merged(&self.produce);
        non_trivial(product, reactant)
    }

    /// Product of the two-reactant rewrite, if both reactants fit.
    pub fn apply_with(&self, reactant: &Molecule, partner: &Molecule) -> Option<Molecule> {
        let required = self.partner.as_ref()?;
        let rest = reactant.without(&self.consume)?;
        let partner_rest = partner.without(required)?;
        let product = rest.merged(&partner_rest).merged(&self.produce);
        non_trivial(product, reactant)
    }
}

fn non_trivial(product: Molecule, reactant: &Molecule) -> Option<Molecule> {
    if product.is_empty() || &product == reactant {
        None
    } else {
        Some(product)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One applied template: reactants on the left, products on the right.
pub struct Reaction {
    pub template: String,
    pub reactants: Vec<Molecule>,
    pub products: Vec<Molecule>,
}

impl fmt::Display for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_side(f, &self.reactants)?;
        f.write_str(">>")?;
        write_side(f, &self.products)
    }
}

fn write_side(f: &mut fmt::Formatter<'_>, side: &[Molecule]) -> fmt::Result {
    for (i, molecule) in side.iter().enumerate() {
        if i > 0 {
            write!(f, "{COMPONENT_SEPARATOR}")?;
        }
        write!(f, "{molecule}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mol(text: &str) -> Molecule {
        text.parse().expect("valid molecule")
    }

    fn amide_coupling() -> Template {
        Template {
            id: "amide".into(),
            groups: vec!["carboxyl".into()],
            consume: mol("COOH"),
            produce: mol("CONH"),
            partner: Some(mol("NH2")),
        }
    }

    #[test]
    fn single_rewrite_swaps_fragments() {
        let reduction = Template {
            id: "reduce".into(),
            groups: vec!["nitro".into()],
            consume: mol("NO2"),
            produce: mol("NH2"),
            partner: None,
        };
        assert_eq!(reduction.apply(&mol("Ph-NO2")), Some(mol("Ph-NH2")));
        assert_eq!(reduction.apply(&mol("Ph-OH")), None);
    }

    #[test]
    fn two_reactant_rule_merges_the_partner() {
        let product = amide_coupling().apply_with(&mol("Ph-COOH"), &mol("CH3-NH2"));
        assert_eq!(product, Some(mol("CH3-CONH-Ph")));
        assert_eq!(amide_coupling().apply_with(&mol("Ph-COOH"), &mol("CH3-OH")), None);
        assert_eq!(amide_coupling().apply(&mol("Ph-COOH")), None);
    }

    #[test]
    fn reaction_renders_as_smirks_like_text() {
        let reaction = Reaction {
            template: "amide".into(),
            reactants: vec![mol("Ph-COOH"), mol("CH3-NH2")],
            products: vec![mol("CH3-CONH-Ph")],
        };
        assert_eq!(reaction.to_string(), "COOH-Ph.CH3-NH2>>CH3-CONH-Ph");
    }

    #[test]
    fn trigger_groups_select_templates() {
        assert!(amide_coupling().triggered_by(["amine", "carboxyl"]));
        assert!(!amide_coupling().triggered_by(["amine"]));
    }
}
