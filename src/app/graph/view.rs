use eframe::egui::{self, Align2, Color32, FontId, Sense, Stroke, Ui, vec2};

use crate::util::{format_amount, short_key};

use super::super::render_utils::{
    blend_color, circle_visible, dim_color, draw_background, draw_rings, link_width, node_radius,
    ratio_color, segment_visible, traffic_color, world_to_screen,
};
use super::super::{AppState, PeerOrbitApp};

const FOCUS_COLOR: Color32 = Color32::from_rgb(250, 214, 92);
const USER_COLOR: Color32 = Color32::from_rgb(120, 220, 255);
const HIGHLIGHT_COLOR: Color32 = Color32::from_rgb(255, 246, 180);

impl PeerOrbitApp {
    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        draw_background(&painter, rect);

        self.handle_graph_zoom(ui, rect, &response);
        self.handle_graph_pan(&response);

        if self.view.live_physics {
            self.adapter.tick();
        }

        let AppState::Ready(scene) = &self.state else {
            return;
        };
        let data = &scene.data;
        let tree = &scene.tree;
        let pan = self.view.pan;
        let zoom = self.view.zoom;

        draw_rings(
            &painter,
            rect,
            pan,
            zoom,
            self.adapter.radius_step(),
            scene.max_depth(),
        );

        let screen_positions = (0..tree.len())
            .map(|index| {
                self.adapter
                    .position(index)
                    .map(|position| world_to_screen(rect, pan, zoom, position))
            })
            .collect::<Vec<_>>();
        let screen_radii = tree
            .nodes
            .iter()
            .map(|tree_node| {
                let traffic = data
                    .node(tree_node.graph_node)
                    .map(|node| node.traffic())
                    .unwrap_or_default();
                node_radius(traffic, data.min_traffic, data.max_traffic) * zoom.powf(0.4)
            })
            .collect::<Vec<_>>();

        let hovered = Self::hovered_index(ui, rect, &screen_positions, &screen_radii)
            .map(|(index, _distance)| index);
        if hovered.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        // everything fades while the next view is on its way
        let dim = if self.navigation.is_pending() { 0.55 } else { 1.0 };

        for link in &data.links {
            let (Some(source), Some(target)) = (
                link.source.and_then(|id| tree.tree_index(id)),
                link.target.and_then(|id| tree.tree_index(id)),
            ) else {
                continue;
            };
            let (Some(start), Some(end)) = (screen_positions[source], screen_positions[target])
            else {
                continue;
            };
            if !segment_visible(rect, start, end) {
                continue;
            }

            let mut color = ratio_color(link.ratio);
            if !hovered.is_some_and(|index| index == source || index == target) {
                color = color.gamma_multiply(0.55);
            }
            let width = link_width(link.total(), data.min_transmission, data.max_transmission)
                * zoom.sqrt();
            painter.line_segment([start, end], Stroke::new(width, dim_color(color, dim)));
        }

        let focus_key = data.focus_node_public_key.as_str();
        for node in data.sorted_nodes() {
            let Some(index) = tree.index_of_key(data, &node.public_key) else {
                continue;
            };
            let Some(position) = screen_positions[index] else {
                continue;
            };
            let radius = screen_radii[index];
            if !circle_visible(rect, position, radius) {
                continue;
            }

            let mut fill = if node.public_key == focus_key {
                FOCUS_COLOR
            } else if node.is_user {
                USER_COLOR
            } else {
                traffic_color(node.traffic(), data.min_traffic, data.max_traffic)
            };
            if hovered == Some(index) {
                fill = blend_color(fill, Color32::WHITE, 0.35);
            }
            painter.circle_filled(position, radius, dim_color(fill, dim));

            if self.animation.is_highlighted(&node.public_key) {
                painter.circle_stroke(position, radius + 4.0, Stroke::new(2.5, HIGHLIGHT_COLOR));
            }
        }

        let label = |index: usize, text: String| {
            let Some(position) = screen_positions[index] else {
                return;
            };
            painter.text(
                position - vec2(0.0, screen_radii[index] + 6.0),
                Align2::CENTER_BOTTOM,
                text,
                FontId::proportional(13.0),
                Color32::from_gray(230),
            );
        };
        label(tree.root, short_key(focus_key).to_owned());
        if let Some(index) = hovered
            && index != tree.root
            && let Some(node) = data.node(tree.nodes[index].graph_node)
        {
            let links = data.links_of(tree.nodes[index].graph_node).count();
            label(
                index,
                format!(
                    "{}  traffic {}  links {}/{}",
                    short_key(&node.public_key),
                    format_amount(node.traffic()),
                    links,
                    node.total_neighbors
                ),
            );
        }

        let clicked = if response.clicked_by(egui::PointerButton::Primary) {
            hovered
                .and_then(|index| tree.public_key(data, index))
                .map(str::to_owned)
        } else {
            None
        };

        if let Some(public_key) = clicked {
            self.focus_on(&public_key);
        }
    }
}
