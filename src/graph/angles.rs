use std::collections::HashMap;
use std::f32::consts::{PI, TAU};

use tracing::trace;

use super::model::GraphData;
use super::tree::{Tree, make_tree_from_graph_node};

/// Splits `[alpha0, alpha1]` among `node`'s children proportional to their
/// descendant counts. The returned sectors tile the range in child order.
pub fn child_sectors(tree: &Tree, node: usize, alpha0: f32, alpha1: f32) -> Vec<(usize, f32, f32)> {
    let children = &tree.nodes[node].children;
    let total = children
        .iter()
        .map(|&child| tree.nodes[child].descendants)
        .sum::<usize>();
    if total == 0 {
        return Vec::new();
    }

    let span = alpha1 - alpha0;
    let mut start = alpha0;
    children
        .iter()
        .enumerate()
        .map(|(position, &child)| {
            let end = if position + 1 == children.len() {
                alpha1
            } else {
                start + (tree.nodes[child].descendants as f32 / total as f32) * span
            };
            let sector = (child, start, end);
            start = end;
            sector
        })
        .collect()
}

pub fn apply_recursive_alpha_by_descendants(
    tree: &mut Tree,
    node: usize,
    alpha0: f32,
    alpha1: f32,
    reference: usize,
) {
    for (child, start, end) in child_sectors(tree, node, alpha0, alpha1) {
        let child_node = &mut tree.nodes[child];
        child_node.alpha = Some((start + end) * 0.5);
        child_node.alpha_reference = Some(reference);
        apply_recursive_alpha_by_descendants(tree, child, start, end, reference);
    }
}

/// Rotation that puts the old focus opposite to where the new focus used to sit.
pub fn continuity_correction(previous_alpha_of_new_focus: f32, new_alpha_of_old_focus: f32) -> f32 {
    (previous_alpha_of_new_focus + PI) - new_alpha_of_old_focus
}

pub fn rotate_alphas(tree: &mut Tree, delta: f32) {
    for node in &mut tree.nodes {
        if let Some(alpha) = node.alpha.as_mut() {
            *alpha += delta;
        }
    }
}

struct PreviousLayout {
    focus: String,
    alphas: HashMap<String, f32>,
}

/// Builds the positioned tree for each new [`GraphData`] and carries the
/// previous layout's angles over so the view keeps its orientation.
#[derive(Default)]
pub struct Positioning {
    previous: Option<PreviousLayout>,
}

impl Positioning {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.previous = None;
    }

    pub fn previous_alpha(&self, public_key: &str) -> Option<f32> {
        self.previous
            .as_ref()
            .and_then(|previous| previous.alphas.get(public_key).copied())
    }

    pub fn position(&mut self, data: &GraphData) -> Option<Tree> {
        let focus = data.focus_node?;
        let mut tree = make_tree_from_graph_node(data, focus);
        let root = tree.root;
        apply_recursive_alpha_by_descendants(&mut tree, root, 0.0, TAU, root);

        if let Some(delta) = self.correction(data, &tree) {
            trace!(delta, "rotating layout to keep orientation");
            rotate_alphas(&mut tree, delta);
        }

        self.remember(data, &tree);
        Some(tree)
    }

    fn correction(&self, data: &GraphData, tree: &Tree) -> Option<f32> {
        let previous = self.previous.as_ref()?;
        let previous_alpha = self.previous_alpha(&data.focus_node_public_key)?;
        let old_focus = tree.index_of_key(data, &previous.focus)?;
        let new_alpha = tree.nodes[old_focus].alpha?;
        Some(continuity_correction(previous_alpha, new_alpha))
    }

    fn remember(&mut self, data: &GraphData, tree: &Tree) {
        let alphas = tree
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(index, node)| {
                let alpha = node.alpha?;
                let key = tree.public_key(data, index)?;
                Some((key.to_owned(), alpha.rem_euclid(TAU)))
            })
            .collect();

        self.previous = Some(PreviousLayout {
            focus: data.focus_node_public_key.clone(),
            alphas,
        });
    }
}
