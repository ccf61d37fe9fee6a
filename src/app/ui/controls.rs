use std::time::Duration;

use eframe::egui::{self, Key, Response, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::util::{format_amount, short_key};

use super::super::{AppState, PeerOrbitApp};

const SEARCH_RESULTS: usize = 8;
const ARROW_BASE_RATE: f32 = 10.0;
const ARROW_ACCEL_PER_SEC: f32 = 6.0;
const ARROW_ACCEL_MAX: f32 = 30.0;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

/// Keys matching `query`, best score first; ties keep input order.
fn rank_matches<'a>(
    keys: impl Iterator<Item = &'a str>,
    query: &str,
    limit: usize,
) -> Vec<&'a str> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default();
    let mut scored = keys
        .filter_map(|key| fuzzy_match_score(&matcher, key, query).map(|score| (score, key)))
        .collect::<Vec<_>>();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().take(limit).map(|(_, key)| key).collect()
}

/// Arrow keys nudge a focused slider, faster the longer they are held.
fn nudge_with_arrows(
    ui: &Ui,
    response: &Response,
    value: &mut f32,
    range: (f32, f32),
    step: f32,
) -> bool {
    let hold_id = response.id.with("arrow_hold_secs");
    if !response.has_focus() {
        ui.ctx().data_mut(|data| data.remove::<f32>(hold_id));
        return false;
    }

    let (delta_time, up, down) = ui.input(|input| {
        (
            input.stable_dt.min(0.1),
            input.key_down(Key::ArrowRight) || input.key_down(Key::ArrowUp),
            input.key_down(Key::ArrowLeft) || input.key_down(Key::ArrowDown),
        )
    });
    let direction = up as i8 - down as i8;
    if direction == 0 {
        ui.ctx().data_mut(|data| data.remove::<f32>(hold_id));
        return false;
    }

    let held = ui
        .ctx()
        .data(|data| data.get_temp::<f32>(hold_id))
        .unwrap_or_default()
        + delta_time;
    ui.ctx().data_mut(|data| data.insert_temp(hold_id, held));

    let ramp = held * ARROW_ACCEL_PER_SEC;
    let speed = ARROW_BASE_RATE * (1.0 + ramp + ramp * ramp * 0.15).min(ARROW_ACCEL_MAX);
    let before = *value;
    *value = (*value + direction as f32 * step * speed * delta_time).clamp(range.0, range.1);
    ui.ctx().request_repaint();
    (*value - before).abs() > f32::EPSILON
}

fn tuning_slider(
    ui: &mut Ui,
    value: &mut f32,
    range: (f32, f32),
    text: &str,
    hover: &str,
) -> bool {
    let response = ui
        .add(egui::Slider::new(value, range.0..=range.1).text(text))
        .on_hover_text(hover);
    if response.hovered() {
        response.request_focus();
    }
    let step = ((range.1 - range.0) / 200.0).max(0.0005);
    response.changed() | nudge_with_arrows(ui, &response, value, range, step)
}

impl PeerOrbitApp {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui, now: Duration) {
        ui.heading("Navigation");
        ui.separator();
        ui.add_space(4.0);

        self.draw_history(ui);

        ui.separator();
        self.draw_search(ui, now);

        ui.separator();
        ui.horizontal(|ui| {
            let playing = self.animation.is_playing();
            if ui
                .add_enabled(playing, egui::Button::new("Stop replay"))
                .on_hover_text("Cancel the running path replay and clear its highlights.")
                .clicked()
            {
                self.animation.stop();
            }
            if playing {
                ui.spinner();
            }
        });

        ui.separator();
        self.draw_limits(ui);

        ui.separator();
        ui.checkbox(&mut self.view.live_physics, "Live physics simulation")
            .on_hover_text("Keep integrating layout forces while the view is open.");
        ui.collapsing("Physics tuning", |ui| self.draw_physics_tuning(ui));
    }

    fn draw_history(&mut self, ui: &mut Ui) {
        let can_go_back = self.navigation.history().len() >= 2 && !self.navigation.is_pending();
        if ui
            .add_enabled(can_go_back, egui::Button::new("Back"))
            .on_hover_text("Return to the previous focus.")
            .clicked()
        {
            self.animation.stop();
            self.navigation.step_back();
        }

        let mut revisit = None;
        egui::ScrollArea::vertical()
            .id_salt("history")
            .max_height(160.0)
            .show(ui, |ui| {
                let focus = self.navigation.focus();
                for (position, key) in self.navigation.history().iter().enumerate().rev() {
                    let current = focus == Some(key.as_str());
                    let clicked = ui
                        .selectable_label(current, format!("{:>2}  {}", position + 1, short_key(key)))
                        .on_hover_text(key.as_str())
                        .clicked();
                    if clicked && !current {
                        revisit = Some(key.clone());
                    }
                }
            });

        if let Some(public_key) = revisit {
            self.focus_on(&public_key);
        }
    }

    fn draw_search(&mut self, ui: &mut Ui, now: Duration) {
        ui.label("Search (public key)")
            .on_hover_text("Fuzzy-match peers in the current view.");
        ui.text_edit_singleline(&mut self.view.search);

        let AppState::Ready(scene) = &self.state else {
            return;
        };
        let data = &scene.data;
        let matches = rank_matches(
            data.sorted
                .iter()
                .rev()
                .filter(|id| scene.tree.tree_index(**id).is_some())
                .filter_map(|id| data.node(*id))
                .map(|node| node.public_key.as_str()),
            &self.view.search,
            SEARCH_RESULTS,
        );

        let mut chosen = None;
        for public_key in matches {
            let traffic = data
                .node_by_key(public_key)
                .map(|node| node.traffic())
                .unwrap_or_default();
            if ui
                .button(format!("{}  {}", short_key(public_key), format_amount(traffic)))
                .on_hover_text("Walk the tree path to this peer one step at a time.")
                .clicked()
            {
                chosen = Some(public_key.to_owned());
            }
        }

        if let Some(public_key) = chosen {
            self.view.search.clear();
            self.replay_path_to(&public_key, now);
        }
    }

    fn draw_limits(&mut self, ui: &mut Ui) {
        let mut neighbor_level = self.config.neighbor_level;
        let mut max_neighbors = self.config.max_neighbors;

        let mut changed = ui
            .add(egui::Slider::new(&mut neighbor_level, 1..=4).text("Neighbor level"))
            .on_hover_text("Hops around the focus requested from the server.")
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut max_neighbors, 1..=64).text("Max neighbors"))
            .on_hover_text("Neighbors kept per node by the server.")
            .changed();

        if changed {
            self.config.neighbor_level = neighbor_level;
            self.config.max_neighbors = max_neighbors;
            self.navigation.set_limits(neighbor_level, max_neighbors);
        }
    }

    fn draw_physics_tuning(&mut self, ui: &mut Ui) {
        let layout = &mut self.config.layout;
        let mut changed = false;

        changed |= tuning_slider(
            ui,
            &mut layout.radius_step,
            (40.0, 400.0),
            "Ring spacing",
            "Distance between consecutive depth rings.",
        );
        changed |= tuning_slider(
            ui,
            &mut layout.radial_strength,
            (0.0, 1.5),
            "Angular pull",
            "How hard nodes are turned toward their assigned angle.",
        );
        changed |= tuning_slider(
            ui,
            &mut layout.link_strength,
            (0.0, 1.5),
            "Ring pull",
            "How hard nodes are held on their ring.",
        );
        changed |= tuning_slider(
            ui,
            &mut layout.center_strength,
            (0.0, 1.0),
            "Centering",
            "How strongly the layout is kept around the origin.",
        );
        changed |= tuning_slider(
            ui,
            &mut layout.velocity_decay,
            (0.05, 0.95),
            "Friction",
            "Share of velocity lost every tick.",
        );

        if changed {
            self.adapter.configure(&self.config.layout);
        }
        ui.label(format!("energy: {:.3}", self.adapter.energy()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_matches_nothing() {
        let keys = ["alpha", "beta"];
        assert!(rank_matches(keys.iter().copied(), "  ", 5).is_empty());
    }

    #[test]
    fn matches_are_limited_and_case_insensitive() {
        let keys = ["02ab9f", "03AB77", "02cd11", "ffab00"];
        let found = rank_matches(keys.iter().copied(), "ab", 2);
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|key| key.to_ascii_lowercase().contains("ab")));

        let none = rank_matches(keys.iter().copied(), "zz", 5);
        assert!(none.is_empty());
    }
}
