use std::collections::HashMap;

use eframe::egui::{Vec2, vec2};
use tracing::debug;

use crate::config::LayoutConfig;
use crate::graph::{GraphData, Tree};

use super::forces::{CenterForce, DistanceLink, Force, LinkForce};
use super::radial::{RadialForce, RadialTarget};
use super::simulation::{SimNode, Simulation};

const CENTER_FIX_KEY: &str = "<center-fix>";

/// Feeds the positioned tree into the integrator. Simulation node `i` is tree
/// node `i`; one extra pinned node at the origin anchors the ring distances.
pub struct SimulationAdapter {
    simulation: Simulation,
    links: LinkForce,
    center: CenterForce,
    radial: RadialForce,
    radius_step: f32,
}

impl SimulationAdapter {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            simulation: Simulation::new(config),
            links: LinkForce::new(config.link_strength),
            center: CenterForce::new(config.center_strength),
            radial: RadialForce::new(config.radial_strength, config.radial_min_distance),
            radius_step: config.radius_step,
        }
    }

    pub fn configure(&mut self, config: &LayoutConfig) {
        self.links.strength(Some(config.link_strength));
        self.center.strength(Some(config.center_strength));
        self.radial.strength(Some(config.radial_strength));
        self.radial.min_distance(Some(config.radial_min_distance));
        self.simulation.set_velocity_decay(config.velocity_decay);

        if config.radius_step > 0.0 && self.radius_step > 0.0 {
            self.links.scale_distances(config.radius_step / self.radius_step);
        }
        self.radius_step = config.radius_step;
        self.simulation.restart();
    }

    pub fn radius_step(&self) -> f32 {
        self.radius_step
    }

    pub fn update(&mut self, data: &GraphData, tree: &Tree) {
        self.simulation.restart();

        let previous = self
            .simulation
            .replace_nodes(Vec::new())
            .into_iter()
            .filter(|node| node.fixed.is_none())
            .map(|node| (node.key, (node.position, node.velocity)))
            .collect::<HashMap<_, _>>();

        let mut nodes: Vec<SimNode> = Vec::with_capacity(tree.len() + 1);
        let mut carried = 0usize;
        for index in 0..tree.len() {
            let key = tree.public_key(data, index).unwrap_or_default().to_owned();
            let node = match previous.get(&key) {
                Some(&(position, velocity)) => {
                    carried += 1;
                    SimNode {
                        velocity,
                        ..SimNode::new(key, position)
                    }
                }
                None => SimNode::new(key, self.spawn_position(&nodes, tree, index)),
            };
            nodes.push(node);
        }

        let center_fix = nodes.len();
        nodes.push(SimNode::pinned(CENTER_FIX_KEY.to_owned(), Vec2::ZERO));

        let links = tree
            .nodes
            .iter()
            .enumerate()
            .map(|(index, tree_node)| DistanceLink {
                source: center_fix,
                target: index,
                distance: tree_node.depth as f32 * self.radius_step,
            })
            .collect();

        let targets = tree
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(index, tree_node)| {
                Some(RadialTarget {
                    node: index,
                    pivot: tree_node.alpha_reference?,
                    alpha: tree_node.alpha?,
                })
            })
            .collect();

        self.simulation.replace_nodes(nodes);
        self.links.set_links(links);
        self.radial.set_targets(targets);

        let nodes = self.simulation.nodes();
        self.links.initialize(nodes);
        self.center.initialize(nodes);
        self.radial.initialize(nodes);

        debug!(
            nodes = tree.len(),
            carried,
            links = self.links.links().len(),
            targets = self.radial.targets().len(),
            "rebuilt simulation from positioned tree"
        );
    }

    fn spawn_position(&self, placed: &[SimNode], tree: &Tree, index: usize) -> Vec2 {
        let tree_node = &tree.nodes[index];
        let origin = tree_node
            .parent
            .and_then(|parent| placed.get(parent))
            .map(|parent| parent.position)
            .unwrap_or(Vec2::ZERO);

        match tree_node.alpha {
            Some(alpha) => origin + vec2(alpha.cos(), alpha.sin()) * (self.radius_step * 0.5),
            None => origin,
        }
    }

    pub fn tick(&mut self) -> bool {
        self.simulation
            .tick(&mut [&mut self.links, &mut self.center, &mut self.radial])
    }

    pub fn is_active(&self) -> bool {
        self.simulation.is_active()
    }

    pub fn energy(&self) -> f32 {
        self.simulation.alpha()
    }

    /// Position of tree node `index`.
    pub fn position(&self, index: usize) -> Option<Vec2> {
        let nodes = self.simulation.nodes();
        // the last node is the center fix
        if index + 1 >= nodes.len() {
            return None;
        }
        nodes.get(index).map(|node| node.position)
    }

    pub fn positions(&self) -> impl Iterator<Item = (&str, Vec2)> + '_ {
        let nodes = self.simulation.nodes();
        let count = nodes.len().saturating_sub(1);
        nodes[..count]
            .iter()
            .map(|node| (node.key.as_str(), node.position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeId, Positioning};
    use crate::physics::radial::angular_difference;

    fn star(keys: &[&str]) -> GraphData {
        let pairs = (1..keys.len()).map(|leaf| (0, leaf)).collect::<Vec<_>>();
        crate::graph::tests::graph(keys, &pairs)
    }

    fn positioned(data: &GraphData) -> Tree {
        Positioning::new().position(data).expect("focus present")
    }

    #[test]
    fn update_adds_pinned_center_and_ring_links() {
        let config = LayoutConfig::default();
        let data = crate::graph::tests::graph(&["r", "a", "b", "x"], &[(0, 1), (0, 2), (1, 3)]);
        let tree = positioned(&data);
        let mut adapter = SimulationAdapter::new(&config);
        adapter.update(&data, &tree);

        let nodes = adapter.simulation.nodes();
        assert_eq!(nodes.len(), tree.len() + 1);
        let center = nodes.last().expect("center fix");
        assert_eq!(center.fixed, Some(Vec2::ZERO));

        let links = adapter.links.links();
        assert_eq!(links.len(), tree.len());
        for link in links {
            assert_eq!(link.source, tree.len());
            let depth = tree.nodes[link.target].depth as f32;
            assert_eq!(link.distance, depth * config.radius_step);
        }

        assert_eq!(adapter.radial.targets().len(), tree.len() - 1);
        assert_eq!(adapter.positions().count(), tree.len());
        assert_eq!(adapter.position(tree.len()), None);
    }

    #[test]
    fn positions_carry_over_by_key() {
        let config = LayoutConfig::default();
        let data = star(&["r", "a", "b"]);
        let tree = positioned(&data);
        let mut adapter = SimulationAdapter::new(&config);
        adapter.update(&data, &tree);
        for _ in 0..20 {
            adapter.tick();
        }
        let a_before = adapter
            .positions()
            .find(|(key, _)| *key == "a")
            .map(|(_, position)| position)
            .expect("a placed");

        let grown = star(&["r", "a", "b", "c"]);
        let grown_tree = positioned(&grown);
        adapter.update(&grown, &grown_tree);
        let a_after = adapter
            .positions()
            .find(|(key, _)| *key == "a")
            .map(|(_, position)| position)
            .expect("a still placed");

        assert_eq!(a_before, a_after);
        assert_eq!(adapter.energy(), 1.0);
    }

    #[test]
    fn shrinking_tree_drops_stale_targets() {
        let config = LayoutConfig::default();
        let big = star(&["r", "a", "b", "c", "d"]);
        let mut adapter = SimulationAdapter::new(&config);
        adapter.update(&big, &positioned(&big));
        assert_eq!(adapter.radial.targets().len(), 4);

        let small = star(&["r", "a"]);
        adapter.update(&small, &positioned(&small));
        assert_eq!(adapter.radial.targets().len(), 1);
        assert!(adapter.radial.targets().iter().all(|target| target.node < 2));
        assert_eq!(adapter.links.links().len(), 2);
    }

    #[test]
    fn nodes_settle_on_ring_at_target_angle() {
        let config = LayoutConfig::default();
        let data = star(&["r", "a", "b", "c"]);
        let tree = positioned(&data);
        let mut adapter = SimulationAdapter::new(&config);
        adapter.update(&data, &tree);

        // knock one leaf well off its angle
        let a = tree.tree_index(NodeId(1)).expect("a");
        let target = tree.nodes[a].alpha.expect("a alpha");
        let skewed = target + 0.6;
        adapter.simulation.nodes_mut()[a].position =
            vec2(skewed.cos(), skewed.sin()) * config.radius_step;

        for _ in 0..600 {
            adapter.tick();
        }

        for (index, tree_node) in tree.nodes.iter().enumerate().skip(1) {
            let position = adapter.position(index).expect("placed");
            let alpha = tree_node.alpha.expect("alpha");
            assert!(
                angular_difference(position.y.atan2(position.x), alpha).abs() < 0.05,
                "node {index} did not reach its angle"
            );
            let radius = position.length();
            assert!(
                (radius - config.radius_step).abs() < config.radius_step * 0.15,
                "node {index} settled at radius {radius}"
            );
        }
        let root = adapter.position(tree.root).expect("root");
        assert!(root.length() < config.radius_step * 0.15);
    }

    #[test]
    fn configure_rescales_ring_distances() {
        let mut config = LayoutConfig::default();
        let data = star(&["r", "a"]);
        let mut adapter = SimulationAdapter::new(&config);
        adapter.update(&data, &positioned(&data));

        config.radius_step *= 2.0;
        adapter.configure(&config);
        let leaf = adapter
            .links
            .links()
            .iter()
            .find(|link| link.target == 1)
            .expect("leaf link");
        assert_eq!(leaf.distance, config.radius_step);
        assert_eq!(adapter.radius_step(), config.radius_step);
    }
}
