use retrotree_core::{Chemistry, ChemistryError};
use tracing::debug;

use crate::{
    catalog::Catalog,
    error::ChemError,
    fingerprint::{self, Fingerprint},
    molecule::Molecule,
    template::{Group, Reaction, Template},
};

/// Reference chemistry: functional-group index, rewrite templates and a
/// building-block catalog used to find second reactants.
#[derive(Debug, Clone)]
pub struct ChemLibrary {
    groups: Vec<Group>,
    templates: Vec<Template>,
    catalog: Catalog,
}

impl ChemLibrary {
    pub fn new(groups: Vec<Group>, templates: Vec<Template>, catalog: Catalog) -> Self {
        ChemLibrary {
            groups,
            templates,
            catalog,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    /// Ids of the functional groups present in `molecule`.
    pub fn groups_of(&self, molecule: &Molecule) -> Vec<&str> {
        self.groups
            .iter()
            .filter(|group| group.matches(molecule))
            .map(|group| group.id.as_str())
            .collect()
    }
}

impl Chemistry for ChemLibrary {
    type Molecule = Molecule;
    type Reaction = Reaction;
    type Template = Template;

    fn canonicalize(&self, structure: &Molecule) -> String {
        structure.to_string()
    }

    fn applicable_templates(&self, structure: &Molecule, single: bool) -> Result<Vec<Template>, ChemistryError> {
        let groups = self.groups_of(structure);
        Ok(self
            .templates
            .iter()
            .filter(|template| template.is_single() == single)
            .filter(|template| template.triggered_by(groups.iter().copied()))
            .cloned()
            .collect())
    }

    fn apply_template(&self, reactant: &Molecule, template: &Template) -> Result<Option<Reaction>, ChemistryError> {
        if !template.is_single() {
            return Err(ChemError::ArityMismatch {
                template: template.id.clone(),
                reactants: 1,
            }
            .into());
        }
        Ok(template.apply(reactant).map(|product| Reaction {
            template: template.id.clone(),
            reactants: vec![reactant.clone()],
            products: vec![product],
        }))
    }

    /// The partner is searched for with the part of the target that neither
    /// the reactant nor the template accounts for.
    fn apply_template_two(
        &self,
        target: &Molecule,
        reactant: &Molecule,
        template: &Template,
    ) -> Result<Option<Reaction>, ChemistryError> {
        let Some(required) = template.partner.as_ref() else {
            return Err(ChemError::ArityMismatch {
                template: template.id.clone(),
                reactants: 2,
            }
            .into());
        };
        let query = Fingerprint::of(target)
            .difference(&Fingerprint::of(reactant))
            .difference(&Fingerprint::of(&template.produce));

        let partners = self.catalog.partners(&query, required);
        debug!(template = %template, partners = partners.len(), "partner search");
        for partner in partners {
            if let Some(product) = template.apply_with(reactant, partner) {
                return Ok(Some(Reaction {
                    template: template.id.clone(),
                    reactants: vec![reactant.clone(), partner.clone()],
                    products: vec![product],
                }));
            }
        }
        Ok(None)
    }

    fn products(&self, reaction: &Reaction) -> Vec<Molecule> {
        reaction.products.clone()
    }

    fn tanimoto(&self, a: &Molecule, b: &Molecule) -> f64 {
        fingerprint::tanimoto(&Fingerprint::of(a), &Fingerprint::of(b))
    }

    fn tversky(&self, query: &Molecule, target: &Molecule) -> f64 {
        fingerprint::tversky(&Fingerprint::of(query), &Fingerprint::of(target))
    }
}
