mod angles;
mod model;
mod processor;
mod tree;

pub use angles::Positioning;
pub use model::GraphData;
pub use processor::GraphDataProcessor;
pub use tree::Tree;

#[cfg(test)]
pub(crate) use model::NodeId;
#[cfg(test)]
pub(crate) use tree::{make_tree_from_graph_node, tests};
