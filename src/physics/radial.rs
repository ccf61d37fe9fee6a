use std::f32::consts::{PI, TAU};

use eframe::egui::{Vec2, vec2};

use super::forces::Force;
use super::simulation::SimNode;

/// Signed shortest rotation from `alpha` to `beta`, in `(-PI, PI]`.
pub fn angular_difference(alpha: f32, beta: f32) -> f32 {
    let difference = (beta - alpha).rem_euclid(TAU);
    if difference > PI {
        difference - TAU
    } else {
        difference
    }
}

/// Tangential correction steering the offset `(x, y)` toward `alpha_target`.
///
/// The result is perpendicular to the offset, so on its own it never changes
/// the distance from the pivot. Its length grows linearly with the angular
/// error, reaching the offset's length at an error of `PI`.
pub fn radial_force_vector(x: f32, y: f32, alpha_target: f32) -> Vec2 {
    if x == 0.0 && y == 0.0 {
        return Vec2::ZERO;
    }

    let alpha = y.atan2(x);
    let moment = angular_difference(alpha, alpha_target) / PI;
    vec2(-y * moment, x * moment)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadialTarget {
    pub node: usize,
    pub pivot: usize,
    pub alpha: f32,
}

pub struct RadialForce {
    targets: Vec<RadialTarget>,
    strength: f32,
    min_distance: f32,
}

impl RadialForce {
    pub fn new(strength: f32, min_distance: f32) -> Self {
        Self {
            targets: Vec::new(),
            strength,
            min_distance,
        }
    }

    pub fn set_targets(&mut self, targets: Vec<RadialTarget>) {
        self.targets = targets;
    }

    pub fn targets(&self) -> &[RadialTarget] {
        &self.targets
    }

    pub fn strength(&mut self, value: Option<f32>) -> f32 {
        if let Some(value) = value {
            self.strength = value;
        }
        self.strength
    }

    pub fn min_distance(&mut self, value: Option<f32>) -> f32 {
        if let Some(value) = value {
            self.min_distance = value.max(0.0);
        }
        self.min_distance
    }
}

impl Force for RadialForce {
    fn initialize(&mut self, nodes: &[SimNode]) {
        let count = nodes.len();
        self.targets
            .retain(|target| target.node < count && target.pivot < count && target.node != target.pivot);
    }

    fn apply(&mut self, nodes: &mut [SimNode], alpha: f32) {
        let min_distance_sq = self.min_distance * self.min_distance;
        for target in &self.targets {
            let (Some(node), Some(pivot)) = (nodes.get(target.node), nodes.get(target.pivot)) else {
                continue;
            };

            let offset = node.position - pivot.position;
            if offset.length_sq() < min_distance_sq {
                continue;
            }

            let correction =
                radial_force_vector(offset.x, offset.y, target.alpha) * (self.strength * alpha);
            nodes[target.node].velocity += correction;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-5,
            "expected {expected}, got {actual}"
        );
    }

    fn sim_node(key: &str, x: f32, y: f32) -> SimNode {
        SimNode::new(key.to_owned(), vec2(x, y))
    }

    #[test]
    fn opposite_direction_is_positive_pi() {
        assert_eq!(angular_difference(0.0, -PI), PI);
    }

    #[test]
    fn same_angle_has_no_difference() {
        for theta in [-7.0, -PI, -1.0, 0.0, 0.5, PI, 4.0, 12.5] {
            assert_eq!(angular_difference(theta, theta), 0.0);
        }
    }

    #[test]
    fn difference_wraps_the_short_way() {
        assert_close(angular_difference(3.0, -3.0), TAU - 6.0);
        assert_close(angular_difference(-3.0, 3.0), 6.0 - TAU);
        assert_close(angular_difference(0.1, TAU + 0.3), 0.2);
    }

    #[test]
    fn degenerate_offset_has_no_force() {
        for target in [0.0, 1.0, PI, -2.5] {
            assert_eq!(radial_force_vector(0.0, 0.0, target), Vec2::ZERO);
        }
    }

    #[test]
    fn force_is_tangential_and_scaled_by_error() {
        let quarter = radial_force_vector(1.0, 0.0, PI / 2.0);
        assert_close(quarter.x, 0.0);
        assert_close(quarter.y, 0.5);

        let backwards = radial_force_vector(1.0, 0.0, -PI / 2.0);
        assert_close(backwards.y, -0.5);

        let force = radial_force_vector(3.0, 4.0, 0.3);
        assert_close(force.dot(vec2(3.0, 4.0)), 0.0);

        assert_eq!(radial_force_vector(2.0, 0.0, 0.0), Vec2::ZERO);
    }

    #[test]
    fn accessors_get_and_set() {
        let mut force = RadialForce::new(0.5, 2.0);
        assert_eq!(force.strength(None), 0.5);
        assert_eq!(force.strength(Some(0.8)), 0.8);
        assert_eq!(force.strength(None), 0.8);
        assert_eq!(force.min_distance(None), 2.0);
        assert_eq!(force.min_distance(Some(6.0)), 6.0);
        assert_eq!(force.min_distance(Some(-1.0)), 0.0);
    }

    #[test]
    fn nodes_inside_min_distance_are_left_alone() {
        let mut nodes = vec![sim_node("pivot", 0.0, 0.0), sim_node("near", 1.0, 0.0)];
        let mut force = RadialForce::new(1.0, 5.0);
        force.set_targets(vec![RadialTarget {
            node: 1,
            pivot: 0,
            alpha: PI / 2.0,
        }]);
        force.initialize(&nodes);
        force.apply(&mut nodes, 1.0);
        assert_eq!(nodes[1].velocity, Vec2::ZERO);

        force.min_distance(Some(0.0));
        force.apply(&mut nodes, 1.0);
        assert_close(nodes[1].velocity.y, 0.5);
    }

    #[test]
    fn initialize_drops_out_of_range_targets() {
        let nodes = vec![sim_node("pivot", 0.0, 0.0), sim_node("a", 1.0, 0.0)];
        let mut force = RadialForce::new(1.0, 0.0);
        force.set_targets(vec![
            RadialTarget { node: 1, pivot: 0, alpha: 0.0 },
            RadialTarget { node: 4, pivot: 0, alpha: 0.0 },
            RadialTarget { node: 0, pivot: 0, alpha: 0.0 },
        ]);
        force.initialize(&nodes);
        assert_eq!(force.targets().len(), 1);
    }
}
