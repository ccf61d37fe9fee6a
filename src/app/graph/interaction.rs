use eframe::egui::{self, Pos2, Rect, Ui};

use super::super::PeerOrbitApp;
use super::super::render_utils::{circle_visible, screen_to_world};

impl PeerOrbitApp {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = screen_to_world(rect, self.view.pan, self.view.zoom, pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.view.zoom = (self.view.zoom * zoom_factor).clamp(0.1, 5.0);
        self.view.pan = pointer - rect.center() - (world_before * self.view.zoom);
    }

    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response) {
        if response.dragged() {
            self.view.pan += response.drag_delta();
        }
    }

    /// Closest node under the pointer, as `(tree index, distance)`.
    pub(in crate::app) fn hovered_index(
        ui: &Ui,
        rect: Rect,
        screen_positions: &[Option<Pos2>],
        screen_radii: &[f32],
    ) -> Option<(usize, f32)> {
        let pointer = ui.input(|input| input.pointer.hover_pos())?;
        if !rect.contains(pointer) {
            return None;
        }

        screen_positions
            .iter()
            .zip(screen_radii)
            .enumerate()
            .filter_map(|(index, (position, &radius))| {
                let position = (*position)?;
                if !circle_visible(rect, position, radius) {
                    return None;
                }
                let distance = position.distance(pointer);
                (distance <= radius.max(6.0)).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}
