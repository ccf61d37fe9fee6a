use std::collections::HashMap;

/// Stable handle into [`GraphData::nodes`], which keeps response order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphNode {
    pub public_key: String,
    pub total_up: f64,
    pub total_down: f64,
    pub score: f64,
    pub total_neighbors: u64,
    pub local_key: usize,
    pub neighbors: Vec<NodeId>,
    pub is_user: bool,
}

impl GraphNode {
    pub fn traffic(&self) -> f64 {
        self.total_up + self.total_down
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub source: Option<NodeId>,
    pub target: Option<NodeId>,
    pub amount: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphLink {
    pub source_key: String,
    pub target_key: String,
    pub source: Option<NodeId>,
    pub target: Option<NodeId>,
    pub amount_up: f64,
    pub amount_down: f64,
    pub ratio: f64,
    pub log_ratio: f64,
}

impl GraphLink {
    pub fn new(forward: &GraphEdge, amount_down: f64) -> Self {
        let amount_up = forward.amount;
        let total = amount_up + amount_down;
        let ratio = if total == 0.0 { 1.0 } else { amount_up / total };

        let log_up = (amount_up + 1.0).ln();
        let log_down = (amount_down + 1.0).ln();
        let log_total = log_up + log_down;
        let log_ratio = if log_total == 0.0 {
            1.0
        } else {
            log_up / log_total
        };

        Self {
            source_key: forward.from.clone(),
            target_key: forward.to.clone(),
            source: forward.source,
            target: forward.target,
            amount_up,
            amount_down,
            ratio,
            log_ratio,
        }
    }

    pub fn total(&self) -> f64 {
        self.amount_up + self.amount_down
    }

    pub fn touches(&self, public_key: &str) -> bool {
        self.source_key == public_key || self.target_key == public_key
    }
}

/// Fully processed neighbor graph for one focus.
#[derive(Clone, Debug, Default)]
pub struct GraphData {
    pub focus_node_public_key: String,
    pub focus_node: Option<NodeId>,
    pub user_node: Option<String>,
    pub neighbor_level: u32,
    pub min_transmission: f64,
    pub max_transmission: f64,
    pub min_traffic: f64,
    pub max_traffic: f64,
    /// `local_keys[local_key] == public_key`.
    pub local_keys: Vec<String>,
    pub nodes: Vec<GraphNode>,
    /// Node handles in ascending traffic order.
    pub sorted: Vec<NodeId>,
    pub edges: Vec<GraphEdge>,
    pub links: Vec<GraphLink>,
    pub index_by_key: HashMap<String, NodeId>,
}

impl GraphData {
    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.get(id.0)
    }

    pub fn node_id(&self, public_key: &str) -> Option<NodeId> {
        self.index_by_key.get(public_key).copied()
    }

    pub fn node_by_key(&self, public_key: &str) -> Option<&GraphNode> {
        self.node_id(public_key).and_then(|id| self.node(id))
    }

    pub fn focus(&self) -> Option<&GraphNode> {
        self.focus_node.and_then(|id| self.node(id))
    }

    pub fn sorted_nodes(&self) -> impl Iterator<Item = &GraphNode> + '_ {
        self.sorted.iter().filter_map(|id| self.node(*id))
    }

    pub fn links_of(&self, id: NodeId) -> impl Iterator<Item = &GraphLink> + '_ {
        self.links
            .iter()
            .filter(move |link| link.source == Some(id) || link.target == Some(id))
    }
}
