use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    catalog::Catalog,
    error::ChemError,
    library::ChemLibrary,
    molecule::Molecule,
    template::{Group, Template},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Serializable planning problem used for YAML IO and validation.
pub struct ProblemSpec {
    /// Schema version for future compatibility checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    /// Used to name checkpoint and pathway files.
    pub name: String,
    pub target: String,
    pub building_blocks: Vec<String>,
    #[serde(default)]
    pub groups: Vec<GroupSpec>,
    #[serde(default)]
    pub templates: Vec<TemplateSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSpec {
    pub id: String,
    pub fragments: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// A rewrite rule; declaring `partner` makes it a two-reactant rule.
pub struct TemplateSpec {
    pub id: String,
    pub groups: Vec<String>,
    pub consume: Vec<String>,
    #[serde(default)]
    pub produce: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner: Option<Vec<String>>,
}

/// A validated problem, ready to plan.
#[derive(Debug, Clone)]
pub struct Problem {
    pub name: String,
    pub target: Molecule,
    pub library: ChemLibrary,
}

impl ProblemSpec {
    /// Validate names, molecules and template references.
    pub fn validate(&self) -> Result<(), ChemError> {
        self.compile().map(|_| ())
    }

    /// Parse every molecule and assemble the chemistry library.
    pub fn compile(&self) -> Result<Problem, ChemError> {
        if self.name.trim().is_empty() {
            return Err(ChemError::MissingName);
        }
        let target: Molecule = self.target.parse()?;

        if self.building_blocks.is_empty() {
            return Err(ChemError::NoBuildingBlocks);
        }
        let blocks = self
            .building_blocks
            .iter()
            .map(|text| text.parse::<Molecule>())
            .collect::<Result<Vec<_>, _>>()?;

        let mut group_ids = HashSet::with_capacity(self.groups.len());
        let mut groups = Vec::with_capacity(self.groups.len());
        for group in &self.groups {
            if !group_ids.insert(group.id.as_str()) {
                return Err(ChemError::DuplicateGroupId {
                    id: group.id.clone(),
                });
            }
            if group.fragments.is_empty() {
                return Err(ChemError::EmptyGroup {
                    id: group.id.clone(),
                });
            }
            groups.push(Group {
                id: group.id.clone(),
                fragments: Molecule::from_fragments(&group.fragments)?,
            });
        }

        let mut template_ids = HashSet::with_capacity(self.templates.len());
        let mut templates = Vec::with_capacity(self.templates.len());
        for template in &self.templates {
            if !template_ids.insert(template.id.as_str()) {
                return Err(ChemError::DuplicateTemplateId {
                    id: template.id.clone(),
                });
            }
            if let Some(group) = template
                .groups
                .iter()
                .find(|group| !group_ids.contains(group.as_str()))
            {
                return Err(ChemError::UnknownGroup {
                    template: template.id.clone(),
                    group: group.clone(),
                });
            }
            if template.consume.is_empty() {
                return Err(ChemError::EmptyConsume {
                    template: template.id.clone(),
                });
            }
            templates.push(Template {
                id: template.id.clone(),
                groups: template.groups.clone(),
                consume: Molecule::from_fragments(&template.consume)?,
                produce: Molecule::from_fragments(&template.produce)?,
                partner: template
                    .partner
                    .as_ref()
                    .map(Molecule::from_fragments)
                    .transpose()?,
            });
        }

        Ok(Problem {
            name: self.name.clone(),
            target,
            library: ChemLibrary::new(groups, templates, Catalog::new(blocks)),
        })
    }
}
