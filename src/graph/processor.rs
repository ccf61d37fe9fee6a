use std::collections::HashMap;

use tracing::{debug, trace};

use crate::config::{ProcessorConfig, TransmissionScope};
use crate::network::GraphResponse;

use super::model::{GraphData, GraphEdge, GraphLink, GraphNode, NodeId};

/// Accumulated converter output. A stage only fills the fields it produces;
/// [`Interim::merge`] lets later stages override earlier ones.
#[derive(Clone, Debug, Default)]
pub struct Interim {
    pub nodes: Option<Vec<GraphNode>>,
    pub index_by_key: Option<HashMap<String, NodeId>>,
    pub edges: Option<Vec<GraphEdge>>,
    pub links: Option<Vec<GraphLink>>,
    pub transmission: Option<(f64, f64)>,
    pub traffic: Option<(f64, f64)>,
    pub focus_node: Option<Option<NodeId>>,
    pub sorted: Option<Vec<NodeId>>,
    pub local_keys: Option<Vec<String>>,
}

macro_rules! merge_fields {
    ($target:ident, $patch:ident, $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = $patch.$field {
                $target.$field = Some(value);
            }
        )+
    };
}

impl Interim {
    pub fn merge(&mut self, patch: Interim) {
        merge_fields!(
            self,
            patch,
            nodes,
            index_by_key,
            edges,
            links,
            transmission,
            traffic,
            focus_node,
            sorted,
            local_keys,
        );
    }

    fn nodes(&self) -> &[GraphNode] {
        self.nodes.as_deref().unwrap_or(&[])
    }

    fn edges(&self) -> &[GraphEdge] {
        self.edges.as_deref().unwrap_or(&[])
    }

    fn links(&self) -> &[GraphLink] {
        self.links.as_deref().unwrap_or(&[])
    }

    fn lookup(&self, public_key: &str) -> Option<NodeId> {
        self.index_by_key
            .as_ref()
            .and_then(|index| index.get(public_key).copied())
    }

    fn into_graph_data(self, response: &GraphResponse) -> GraphData {
        let (min_transmission, max_transmission) = self.transmission.unwrap_or((0.0, 0.0));
        let (min_traffic, max_traffic) = self.traffic.unwrap_or((0.0, 0.0));
        let nodes = self.nodes.unwrap_or_default();
        let sorted = self
            .sorted
            .unwrap_or_else(|| (0..nodes.len()).map(NodeId).collect());

        GraphData {
            focus_node_public_key: response.focus_node.clone(),
            focus_node: self.focus_node.flatten(),
            user_node: response.user_node.clone(),
            neighbor_level: response.neighbor_level,
            min_transmission,
            max_transmission,
            min_traffic,
            max_traffic,
            local_keys: self.local_keys.unwrap_or_default(),
            nodes,
            sorted,
            edges: self.edges.unwrap_or_default(),
            links: self.links.unwrap_or_default(),
            index_by_key: self.index_by_key.unwrap_or_default(),
        }
    }
}

pub type Converter = fn(&GraphResponse, &Interim) -> Interim;

#[derive(Clone, Copy)]
pub struct Stage {
    pub name: &'static str,
    convert: Converter,
}

impl Stage {
    const fn new(name: &'static str, convert: Converter) -> Self {
        Self { name, convert }
    }
}

/// Ordered converter pipeline turning a raw response into [`GraphData`].
pub struct GraphDataProcessor {
    stages: Vec<Stage>,
}

impl GraphDataProcessor {
    pub fn new(config: &ProcessorConfig) -> Self {
        let mut stages = vec![
            Stage::new("map_nodes", map_nodes),
            Stage::new("map_edges", map_edges),
            Stage::new("combine_links", combine_links),
        ];

        stages.push(match config.transmission_scope {
            TransmissionScope::All => {
                Stage::new("add_min_max_transmission", add_min_max_transmission)
            }
            TransmissionScope::Focus => Stage::new(
                "add_min_max_focus_transmission",
                add_min_max_focus_transmission,
            ),
        });

        if config.traffic_scaling {
            stages.push(Stage::new("add_traffic_function", add_traffic_function));
        }

        stages.extend([
            Stage::new("focus_node_public_key", focus_node_public_key),
            Stage::new("sort_nodes", sort_nodes),
            Stage::new("make_local_key_map", make_local_key_map),
            Stage::new("add_neighbors_to_nodes", add_neighbors_to_nodes),
        ]);

        let processor = Self { stages };
        debug!(
            stages = ?processor.stage_names().collect::<Vec<_>>(),
            "graph pipeline configured"
        );
        processor
    }

    pub fn stage_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.stages.iter().map(|stage| stage.name)
    }

    pub fn process_data(&self, response: &GraphResponse) -> GraphData {
        let mut interim = Interim::default();
        for stage in &self.stages {
            let patch = (stage.convert)(response, &interim);
            interim.merge(patch);
            trace!(stage = stage.name, "graph converter finished");
        }
        interim.into_graph_data(response)
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values
        .fold(None, |range: Option<(f64, f64)>, value| {
            Some(match range {
                Some((min, max)) => (min.min(value), max.max(value)),
                None => (value, value),
            })
        })
        .unwrap_or((0.0, 0.0))
}

pub fn map_nodes(response: &GraphResponse, _interim: &Interim) -> Interim {
    let user_node = response.user_node.as_deref();
    let mut index_by_key = HashMap::with_capacity(response.nodes.len());

    let nodes = response
        .nodes
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            index_by_key
                .entry(raw.public_key.clone())
                .or_insert(NodeId(index));
            GraphNode {
                public_key: raw.public_key.clone(),
                total_up: raw.total_up,
                total_down: raw.total_down,
                score: raw.score,
                total_neighbors: raw.total_neighbors,
                local_key: index,
                neighbors: Vec::new(),
                is_user: user_node == Some(raw.public_key.as_str()),
            }
        })
        .collect();

    Interim {
        nodes: Some(nodes),
        index_by_key: Some(index_by_key),
        ..Interim::default()
    }
}

pub fn map_edges(response: &GraphResponse, interim: &Interim) -> Interim {
    let edges = response
        .edges
        .iter()
        .map(|raw| {
            let source = interim.lookup(&raw.from);
            let target = interim.lookup(&raw.to);
            if source.is_none() || target.is_none() {
                debug!(from = %raw.from, to = %raw.to, "edge references a node missing from the response");
            }
            GraphEdge {
                from: raw.from.clone(),
                to: raw.to.clone(),
                source,
                target,
                amount: raw.amount,
            }
        })
        .collect();

    Interim {
        edges: Some(edges),
        ..Interim::default()
    }
}

pub fn combine_links(_response: &GraphResponse, interim: &Interim) -> Interim {
    let edges = interim.edges();

    let mut group_by_source: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (index, edge) in edges.iter().enumerate() {
        let slot = *group_by_source.entry(edge.from.as_str()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(index);
    }

    let mut consumed = vec![false; edges.len()];
    let mut links = Vec::with_capacity(edges.len());
    for group in &groups {
        for &forward_index in group {
            if consumed[forward_index] {
                continue;
            }
            consumed[forward_index] = true;

            let forward = &edges[forward_index];
            let reverse = group_by_source
                .get(forward.to.as_str())
                .and_then(|&slot| {
                    groups[slot]
                        .iter()
                        .copied()
                        .find(|&candidate| !consumed[candidate] && edges[candidate].to == forward.from)
                });

            let amount_down = match reverse {
                Some(reverse_index) => {
                    consumed[reverse_index] = true;
                    edges[reverse_index].amount
                }
                None => 0.0,
            };
            links.push(GraphLink::new(forward, amount_down));
        }
    }

    links.sort_by(|a, b| a.total().total_cmp(&b.total()));

    Interim {
        links: Some(links),
        ..Interim::default()
    }
}

pub fn add_min_max_transmission(_response: &GraphResponse, interim: &Interim) -> Interim {
    Interim {
        transmission: Some(min_max(interim.links().iter().map(GraphLink::total))),
        ..Interim::default()
    }
}

pub fn add_min_max_focus_transmission(response: &GraphResponse, interim: &Interim) -> Interim {
    let focus = response.focus_node.as_str();
    let range = min_max(
        interim
            .links()
            .iter()
            .filter(|link| link.touches(focus))
            .map(GraphLink::total),
    );

    Interim {
        transmission: Some(range),
        ..Interim::default()
    }
}

pub fn add_traffic_function(_response: &GraphResponse, interim: &Interim) -> Interim {
    Interim {
        traffic: Some(min_max(interim.nodes().iter().map(GraphNode::traffic))),
        ..Interim::default()
    }
}

pub fn focus_node_public_key(response: &GraphResponse, interim: &Interim) -> Interim {
    Interim {
        focus_node: Some(interim.lookup(&response.focus_node)),
        ..Interim::default()
    }
}

pub fn sort_nodes(_response: &GraphResponse, interim: &Interim) -> Interim {
    let nodes = interim.nodes();
    let mut sorted = (0..nodes.len()).map(NodeId).collect::<Vec<_>>();
    sorted.sort_by(|a, b| nodes[a.0].traffic().total_cmp(&nodes[b.0].traffic()));

    Interim {
        sorted: Some(sorted),
        ..Interim::default()
    }
}

pub fn make_local_key_map(_response: &GraphResponse, interim: &Interim) -> Interim {
    let mut nodes = interim.nodes().to_vec();
    let order = interim
        .sorted
        .clone()
        .unwrap_or_else(|| (0..nodes.len()).map(NodeId).collect());

    let mut local_keys = Vec::with_capacity(order.len());
    for (local_key, id) in order.iter().enumerate() {
        let Some(node) = nodes.get_mut(id.0) else {
            continue;
        };
        node.local_key = local_key;
        local_keys.push(node.public_key.clone());
    }

    Interim {
        nodes: Some(nodes),
        local_keys: Some(local_keys),
        ..Interim::default()
    }
}

pub fn add_neighbors_to_nodes(_response: &GraphResponse, interim: &Interim) -> Interim {
    let mut nodes = interim.nodes().to_vec();
    for node in &mut nodes {
        node.neighbors.clear();
    }

    for link in interim.links() {
        let (Some(source), Some(target)) = (link.source, link.target) else {
            continue;
        };
        if source.0 >= nodes.len() || target.0 >= nodes.len() {
            continue;
        }
        nodes[source.0].neighbors.push(target);
        nodes[target.0].neighbors.push(source);
    }

    Interim {
        nodes: Some(nodes),
        ..Interim::default()
    }
}
