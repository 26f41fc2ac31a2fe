//! Reconstruction and text export of synthesis pathways.
//!
//! A pathway block lists one reaction step per line, ends with
//! [`PATHWAY_DELIMITER`], and each product closes with [`PRODUCT_DELIMITER`].

use std::{collections::HashSet, fmt, fs, path::PathBuf};

use tracing::info;

use crate::{
    chemistry::Chemistry,
    search::{error::PlannerError, planner::Planner},
    tree::{error::TreeError, ids::NodeId, search_tree::SearchTree},
};

pub const PATHWAY_DELIMITER: &str = "$$$";
pub const PRODUCT_DELIMITER: &str = "END";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Evidence of one edge along a pathway, rendered to text.
pub struct PathStep {
    pub reactions: Vec<String>,
    pub templates: Vec<String>,
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}]",
            self.reactions.join(" "),
            self.templates.join(", ")
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
/// All known routes from the building blocks to one achieved product.
pub struct ProductPathways {
    pub signature: String,
    pub similarity: f64,
    pub pathways: Vec<Vec<PathStep>>,
}

impl<M, R, T> SearchTree<M, R, T>
where
    R: Clone + PartialEq + fmt::Display,
    T: Clone + PartialEq + fmt::Display,
{
    /// Routes to `node_id`: its own tree path plus one route per cross-linking parent.
    /// The edge from the root to a building block carries no reaction and is skipped.
    pub fn pathways_to(&self, node_id: NodeId) -> Result<Vec<Vec<PathStep>>, TreeError> {
        let mut routes = vec![self.path_to(node_id)?];
        for parent in self.cross_link_parents(node_id) {
            let mut route = self.path_to(parent)?;
            route.push(node_id);
            routes.push(route);
        }

        let mut pathways = Vec::with_capacity(routes.len());
        for route in routes {
            let mut steps = Vec::new();
            for pair in route.windows(2) {
                let (from, to) = (pair[0], pair[1]);
                if from == self.root_id() {
                    continue;
                }
                let edge = self
                    .node(from)?
                    .edge_to(to)
                    .ok_or(TreeError::MissingNode { node_id: to })?;
                steps.push(PathStep {
                    reactions: edge.reactions().iter().map(ToString::to_string).collect(),
                    templates: edge.templates().iter().map(ToString::to_string).collect(),
                });
            }
            if !steps.is_empty() {
                pathways.push(steps);
            }
        }
        Ok(pathways)
    }
}

/// Render pathway blocks.
///
/// Within one product, a pathway whose first reaction was already printed by an
/// earlier pathway is dropped, so shared prefixes are written once.
pub fn render_pathways(products: &[ProductPathways]) -> String {
    let mut out = String::new();
    for product in products {
        out.push_str(&format!("{} {}\n", product.similarity, product.signature));
        let mut seen: HashSet<&str> = HashSet::new();
        for pathway in &product.pathways {
            let repeated = pathway
                .first()
                .and_then(|step| step.reactions.first())
                .is_some_and(|reaction| seen.contains(reaction.as_str()));
            if repeated {
                continue;
            }
            for step in pathway {
                if let Some(reaction) = step.reactions.first() {
                    seen.insert(reaction.as_str());
                }
                out.push_str(&format!("{step}\n"));
            }
            out.push_str(PATHWAY_DELIMITER);
            out.push('\n');
        }
        out.push_str(PRODUCT_DELIMITER);
        out.push_str("\n\n");
    }
    out
}

impl<C: Chemistry> Planner<C> {
    /// Pathways for the top `limit` achieved products.
    pub fn similar_paths(&self, limit: usize) -> Result<Vec<ProductPathways>, TreeError> {
        let mut products = Vec::new();
        for entry in self.achieved.ranked().into_iter().take(limit) {
            let Some(node_id) = self.tree.find_signature(&entry.signature) else {
                continue;
            };
            products.push(ProductPathways {
                signature: entry.signature.clone(),
                similarity: entry.best_similarity(),
                pathways: self.tree.pathways_to(node_id)?,
            });
        }
        Ok(products)
    }

    /// Write pathway blocks for the top `limit` products to `{target_name}_paths.txt`.
    pub fn export_paths(&self, limit: usize) -> Result<PathBuf, PlannerError> {
        let products = self.similar_paths(limit)?;
        fs::create_dir_all(&self.config.output_dir)?;
        let path = self
            .config
            .output_dir
            .join(format!("{}_paths.txt", self.target_name));
        fs::write(&path, render_pathways(&products))?;
        info!(path = %path.display(), products = products.len(), "pathways exported");
        Ok(path)
    }
}
