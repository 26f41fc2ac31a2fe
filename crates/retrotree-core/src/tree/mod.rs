mod arena;
pub mod edges;
pub mod error;
pub mod evidence;
pub mod ids;
pub mod node;
pub mod search_tree;
pub mod snapshot;
pub mod stats;

#[cfg(test)]
mod tests;
