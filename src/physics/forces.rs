use eframe::egui::Vec2;

use super::simulation::SimNode;

/// Plugin contract for the integrator: `initialize` is called whenever the
/// node set is replaced, `apply` once per tick with the current energy.
pub trait Force {
    fn initialize(&mut self, nodes: &[SimNode]);
    fn apply(&mut self, nodes: &mut [SimNode], alpha: f32);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistanceLink {
    pub source: usize,
    pub target: usize,
    pub distance: f32,
}

/// Spring constraints holding linked nodes at a target distance.
pub struct LinkForce {
    links: Vec<DistanceLink>,
    bias: Vec<f32>,
    strength: f32,
}

impl LinkForce {
    pub fn new(strength: f32) -> Self {
        Self {
            links: Vec::new(),
            bias: Vec::new(),
            strength,
        }
    }

    pub fn set_links(&mut self, links: Vec<DistanceLink>) {
        self.links = links;
        self.bias.clear();
    }

    pub fn links(&self) -> &[DistanceLink] {
        &self.links
    }

    pub fn scale_distances(&mut self, factor: f32) {
        for link in &mut self.links {
            link.distance *= factor;
        }
    }

    pub fn strength(&mut self, value: Option<f32>) -> f32 {
        if let Some(value) = value {
            self.strength = value;
        }
        self.strength
    }
}

impl Force for LinkForce {
    fn initialize(&mut self, nodes: &[SimNode]) {
        let count = nodes.len();
        self.links
            .retain(|link| link.source < count && link.target < count && link.source != link.target);

        let mut degree = vec![0usize; count];
        for link in &self.links {
            degree[link.source] += 1;
            degree[link.target] += 1;
        }

        // share of the correction applied to the target; busy nodes move less
        self.bias = self
            .links
            .iter()
            .map(|link| {
                let source = degree[link.source] as f32;
                source / (source + degree[link.target] as f32)
            })
            .collect();
    }

    fn apply(&mut self, nodes: &mut [SimNode], alpha: f32) {
        for (link, &bias) in self.links.iter().zip(&self.bias) {
            let (Some(source), Some(target)) = (nodes.get(link.source), nodes.get(link.target)) else {
                continue;
            };

            let delta = (target.position + target.velocity) - (source.position + source.velocity);
            let length = delta.length();
            if length <= 0.0001 {
                continue;
            }

            let correction = delta * ((length - link.distance) / length * alpha * self.strength);
            nodes[link.target].velocity -= correction * bias;
            nodes[link.source].velocity += correction * (1.0 - bias);
        }
    }
}

/// Translates the free nodes so their mean sits on the origin.
pub struct CenterForce {
    strength: f32,
}

impl CenterForce {
    pub fn new(strength: f32) -> Self {
        Self { strength }
    }

    pub fn strength(&mut self, value: Option<f32>) -> f32 {
        if let Some(value) = value {
            self.strength = value;
        }
        self.strength
    }
}

impl Force for CenterForce {
    fn initialize(&mut self, _nodes: &[SimNode]) {}

    fn apply(&mut self, nodes: &mut [SimNode], _alpha: f32) {
        let mut sum = Vec2::ZERO;
        let mut count = 0usize;
        for node in nodes.iter().filter(|node| node.fixed.is_none()) {
            sum += node.position;
            count += 1;
        }
        if count == 0 {
            return;
        }

        let shift = sum / count as f32 * self.strength;
        for node in nodes.iter_mut().filter(|node| node.fixed.is_none()) {
            node.position -= shift;
        }
    }
}
