use std::time::Duration;

use eframe::egui::{self, Align, Context, Layout};

use crate::util::{format_amount, short_key};

use super::super::{AppState, PeerOrbitApp};

impl PeerOrbitApp {
    pub(in crate::app) fn show(&mut self, ctx: &Context, now: Duration) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("peer-orbit");
                    ui.separator();

                    if let AppState::Ready(scene) = &self.state {
                        let data = &scene.data;
                        ui.label(format!("focus: {}", short_key(&data.focus_node_public_key)));
                        if let Some(focus) = data.focus() {
                            ui.label(format!("traffic: {}", format_amount(focus.traffic())));
                        }
                        if let Some(user) = &data.user_node {
                            ui.label(format!("you: {}", short_key(user)));
                        }
                        ui.label(format!("level: {}", data.neighbor_level));
                        ui.label(format!("nodes: {}", data.nodes.len()));
                        ui.label(format!("links: {}", data.links.len()));
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if let Some(requested) = self.navigation.requested() {
                            ui.label(format!("loading {}", short_key(requested)));
                            ui.spinner();
                        } else if let Some(notice) = &self.view.notice {
                            ui.colored_label(ui.visuals().warn_fg_color, notice.as_str());
                        } else if let Some(update) = &self.last_update
                            && update.returned
                        {
                            ui.label(format!("back at {}", short_key(&update.focus)));
                        }
                        if self.animation.is_playing() {
                            let highlighted = self
                                .animation
                                .highlighted()
                                .iter()
                                .map(|key| short_key(key))
                                .collect::<Vec<_>>()
                                .join(", ");
                            ui.label(format!(
                                "replaying {highlighted}, {} left",
                                self.animation.remaining()
                            ));
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| self.draw_controls(ui, now));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_graph(ui));
    }
}
