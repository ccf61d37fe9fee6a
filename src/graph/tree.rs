use std::collections::{HashSet, VecDeque};

use super::model::{GraphData, NodeId};

#[derive(Clone, Debug, PartialEq)]
pub struct TreeNode {
    pub graph_node: NodeId,
    pub children: Vec<usize>,
    pub parent: Option<usize>,
    pub depth: usize,
    pub descendants: usize,
    pub alpha: Option<f32>,
    /// Tree index of the pivot the radial force measures this node's angle around.
    pub alpha_reference: Option<usize>,
}

impl TreeNode {
    fn new(graph_node: NodeId, parent: Option<usize>, depth: usize) -> Self {
        Self {
            graph_node,
            children: Vec::new(),
            parent,
            depth,
            descendants: 1,
            alpha: None,
            alpha_reference: None,
        }
    }
}

/// Breadth-first spanning tree over a focus node's neighbors.
///
/// Tree nodes point at graph nodes through [`TreeNode::graph_node`]; the
/// reverse direction is the `graph -> tree` index kept here, so neither side
/// owns the other.
#[derive(Clone, Debug, PartialEq)]
pub struct Tree {
    pub root: usize,
    pub nodes: Vec<TreeNode>,
    tree_by_graph: Vec<Option<usize>>,
}

impl Tree {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn tree_index(&self, id: NodeId) -> Option<usize> {
        self.tree_by_graph.get(id.0).copied().flatten()
    }

    pub fn index_of_key(&self, data: &GraphData, public_key: &str) -> Option<usize> {
        data.node_id(public_key).and_then(|id| self.tree_index(id))
    }

    pub fn public_key<'a>(&self, data: &'a GraphData, index: usize) -> Option<&'a str> {
        let node = self.nodes.get(index)?;
        data.node(node.graph_node)
            .map(|graph_node| graph_node.public_key.as_str())
    }

    /// `index`, its parent, and so on up to the root.
    pub fn ancestors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(
            (index < self.nodes.len()).then_some(index),
            move |&current| self.nodes[current].parent,
        )
    }

    pub fn ancestor_keys(&self, data: &GraphData, index: usize) -> Vec<String> {
        self.ancestors(index)
            .filter_map(|current| self.public_key(data, current))
            .map(str::to_owned)
            .collect()
    }

    /// Keys leading from the root's child down to `index`; empty for the root.
    pub fn path_from_root(&self, data: &GraphData, index: usize) -> Vec<String> {
        let mut path = self
            .ancestors(index)
            .filter(|&current| current != self.root)
            .filter_map(|current| self.public_key(data, current))
            .map(str::to_owned)
            .collect::<Vec<_>>();
        path.reverse();
        path
    }
}

pub fn make_tree_from_graph_node(data: &GraphData, root: NodeId) -> Tree {
    let mut nodes = vec![TreeNode::new(root, None, 0)];
    let mut tree_by_graph = vec![None; data.nodes.len()];
    if let Some(slot) = tree_by_graph.get_mut(root.0) {
        *slot = Some(0);
    }

    let mut visited = HashSet::new();
    if let Some(root_node) = data.node(root) {
        visited.insert(root_node.public_key.as_str());
    }

    let mut queue = VecDeque::from([0usize]);
    while let Some(current) = queue.pop_front() {
        let Some(graph_node) = data.node(nodes[current].graph_node) else {
            continue;
        };
        let depth = nodes[current].depth + 1;

        for &neighbor in &graph_node.neighbors {
            let Some(neighbor_node) = data.node(neighbor) else {
                continue;
            };
            if !visited.insert(neighbor_node.public_key.as_str()) {
                continue;
            }

            let child = nodes.len();
            nodes.push(TreeNode::new(neighbor, Some(current), depth));
            nodes[current].children.push(child);
            if let Some(slot) = tree_by_graph.get_mut(neighbor.0) {
                *slot = Some(child);
            }
            queue.push_back(child);
        }
    }

    // BFS order puts every child after its parent.
    for index in (1..nodes.len()).rev() {
        if let Some(parent) = nodes[index].parent {
            let descendants = nodes[index].descendants;
            nodes[parent].descendants += descendants;
        }
    }

    Tree {
        root: 0,
        nodes,
        tree_by_graph,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::graph::model::GraphNode;

    /// Graph with the given keys and undirected adjacency, bypassing the converter pipeline.
    pub(crate) fn graph(keys: &[&str], pairs: &[(usize, usize)]) -> GraphData {
        let mut data = GraphData {
            focus_node_public_key: keys.first().map(|key| key.to_string()).unwrap_or_default(),
            focus_node: (!keys.is_empty()).then_some(NodeId(0)),
            ..GraphData::default()
        };
        for (index, key) in keys.iter().enumerate() {
            data.nodes.push(GraphNode {
                public_key: key.to_string(),
                local_key: index,
                ..GraphNode::default()
            });
            data.index_by_key.insert(key.to_string(), NodeId(index));
            data.sorted.push(NodeId(index));
        }
        for &(a, b) in pairs {
            data.nodes[a].neighbors.push(NodeId(b));
            data.nodes[b].neighbors.push(NodeId(a));
        }
        data
    }

    #[test]
    fn isolated_node_is_a_single_root() {
        let data = graph(&["solo"], &[]);
        let tree = make_tree_from_graph_node(&data, NodeId(0));

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root, 0);
        let root = &tree.nodes[0];
        assert_eq!(root.descendants, 1);
        assert_eq!(root.depth, 0);
        assert!(root.children.is_empty());
        assert_eq!(root.parent, None);
    }

    #[test]
    fn cyclic_graph_visits_each_node_once() {
        // square with a diagonal: 0-1, 1-2, 2-3, 3-0, 0-2
        let data = graph(&["r", "a", "b", "c"], &[(0, 1), (1, 2), (2, 3), (3, 0), (0, 2)]);
        let tree = make_tree_from_graph_node(&data, NodeId(0));

        assert_eq!(tree.len(), 4);
        assert_eq!(tree.nodes[tree.root].descendants, tree.len());
        for child in &tree.nodes[1..] {
            assert_eq!(child.depth, 1);
            assert_eq!(child.parent, Some(0));
            assert_eq!(child.descendants, 1);
        }
    }

    #[test]
    fn first_discoverer_becomes_parent() {
        // r - a - x, r - b - x: x is reached through a first
        let data = graph(&["r", "a", "b", "x"], &[(0, 1), (0, 2), (1, 3), (2, 3)]);
        let tree = make_tree_from_graph_node(&data, NodeId(0));

        let x = tree.tree_index(NodeId(3)).expect("x in tree");
        let a = tree.tree_index(NodeId(1)).expect("a in tree");
        let b = tree.tree_index(NodeId(2)).expect("b in tree");
        assert_eq!(tree.nodes[x].parent, Some(a));
        assert_eq!(tree.nodes[x].depth, 2);
        assert_eq!(tree.nodes[a].descendants, 2);
        assert_eq!(tree.nodes[b].descendants, 1);
        assert_eq!(tree.nodes[0].descendants, 4);
    }

    #[test]
    fn graph_and_tree_indices_agree() {
        let data = graph(&["r", "a", "b"], &[(0, 2), (2, 1)]);
        let tree = make_tree_from_graph_node(&data, NodeId(0));

        for (index, node) in tree.nodes.iter().enumerate() {
            assert_eq!(tree.tree_index(node.graph_node), Some(index));
        }
        assert_eq!(tree.index_of_key(&data, "a"), Some(2));
    }

    #[test]
    fn ancestor_keys_walk_to_root() {
        let data = graph(&["r", "a", "b"], &[(0, 1), (1, 2)]);
        let tree = make_tree_from_graph_node(&data, NodeId(0));
        let b = tree.index_of_key(&data, "b").expect("b");

        assert_eq!(tree.ancestor_keys(&data, b), ["b", "a", "r"]);
        assert_eq!(tree.path_from_root(&data, b), ["a", "b"]);
        assert!(tree.path_from_root(&data, tree.root).is_empty());
        assert!(tree.ancestor_keys(&data, 99).is_empty());
    }

    #[test]
    fn unreachable_nodes_are_left_out() {
        let data = graph(&["r", "a", "island"], &[(0, 1)]);
        let tree = make_tree_from_graph_node(&data, NodeId(0));

        assert_eq!(tree.len(), 2);
        assert_eq!(tree.tree_index(NodeId(2)), None);
    }
}
