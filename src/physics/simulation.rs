use eframe::egui::Vec2;

use crate::config::LayoutConfig;

use super::forces::Force;

#[derive(Clone, Debug, PartialEq)]
pub struct SimNode {
    pub key: String,
    pub position: Vec2,
    pub velocity: Vec2,
    pub fixed: Option<Vec2>,
}

impl SimNode {
    pub fn new(key: String, position: Vec2) -> Self {
        Self {
            key,
            position,
            velocity: Vec2::ZERO,
            fixed: None,
        }
    }

    pub fn pinned(key: String, position: Vec2) -> Self {
        Self {
            fixed: Some(position),
            ..Self::new(key, position)
        }
    }
}

/// Velocity integrator with a cooling energy level (`alpha`) that scales every force.
pub struct Simulation {
    nodes: Vec<SimNode>,
    alpha: f32,
    alpha_min: f32,
    alpha_decay: f32,
    alpha_target: f32,
    velocity_decay: f32,
}

impl Simulation {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            nodes: Vec::new(),
            alpha: 1.0,
            alpha_min: config.alpha_min,
            alpha_decay: config.alpha_decay.clamp(0.0, 1.0),
            alpha_target: 0.0,
            velocity_decay: config.velocity_decay.clamp(0.0, 1.0),
        }
    }

    pub fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }

    #[cfg(test)]
    pub(super) fn nodes_mut(&mut self) -> &mut [SimNode] {
        &mut self.nodes
    }

    pub fn replace_nodes(&mut self, nodes: Vec<SimNode>) -> Vec<SimNode> {
        std::mem::replace(&mut self.nodes, nodes)
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn restart(&mut self) {
        self.alpha = 1.0;
    }

    pub fn set_velocity_decay(&mut self, value: f32) {
        self.velocity_decay = value.clamp(0.0, 1.0);
    }

    pub fn is_active(&self) -> bool {
        self.alpha >= self.alpha_min
    }

    pub fn tick(&mut self, forces: &mut [&mut dyn Force]) -> bool {
        if !self.is_active() {
            return false;
        }

        self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;
        for force in forces.iter_mut() {
            force.apply(&mut self.nodes, self.alpha);
        }

        let retain = 1.0 - self.velocity_decay;
        for node in &mut self.nodes {
            if let Some(fixed) = node.fixed {
                node.position = fixed;
                node.velocity = Vec2::ZERO;
            } else {
                node.velocity *= retain;
                node.position += node.velocity;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;

    struct Push(Vec2);

    impl Force for Push {
        fn initialize(&mut self, _nodes: &[SimNode]) {}

        fn apply(&mut self, nodes: &mut [SimNode], _alpha: f32) {
            for node in nodes {
                node.velocity += self.0;
            }
        }
    }

    #[test]
    fn pinned_nodes_do_not_move() {
        let mut simulation = Simulation::new(&LayoutConfig::default());
        simulation.replace_nodes(vec![
            SimNode::pinned("fix".to_owned(), Vec2::ZERO),
            SimNode::new("free".to_owned(), vec2(1.0, 1.0)),
        ]);

        let mut push = Push(vec2(1.0, 0.0));
        assert!(simulation.tick(&mut [&mut push]));

        assert_eq!(simulation.nodes()[0].position, Vec2::ZERO);
        assert_eq!(simulation.nodes()[0].velocity, Vec2::ZERO);
        assert!((simulation.nodes()[1].position.x - 1.6).abs() < 1e-5);
    }

    #[test]
    fn energy_cools_until_inactive() {
        let mut simulation = Simulation::new(&LayoutConfig::default());
        simulation.replace_nodes(vec![SimNode::new("a".to_owned(), Vec2::ZERO)]);

        let mut ticks = 0;
        while simulation.tick(&mut []) {
            ticks += 1;
            assert!(ticks < 1000, "simulation never cooled down");
        }
        assert!(ticks > 100);
        assert!(!simulation.is_active());

        simulation.restart();
        assert_eq!(simulation.alpha(), 1.0);
        assert!(simulation.is_active());
    }
}
