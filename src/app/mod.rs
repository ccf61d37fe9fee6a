use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use eframe::egui::{self, Context, Vec2};
use tracing::warn;

use crate::animation::SteppingAnimation;
use crate::config::Config;
use crate::graph::{GraphData, GraphDataProcessor, Positioning, Tree};
use crate::navigation::{NavigationController, NavigationUpdate, TreeNodeRef};
use crate::network::{BackgroundFetcher, GraphResponse};
use crate::physics::SimulationAdapter;
use crate::util::short_key;

mod render_utils;

mod graph {
    mod interaction;
    mod view;
}

mod ui {
    mod controls;
    mod panels;
}

pub struct PeerOrbitApp {
    config: Config,
    navigation: NavigationController<BackgroundFetcher>,
    processor: GraphDataProcessor,
    positioning: Positioning,
    adapter: SimulationAdapter,
    animation: SteppingAnimation,
    updates: Receiver<NavigationUpdate>,
    last_update: Option<NavigationUpdate>,
    initial_focus: String,
    state: AppState,
    view: ViewState,
}

enum AppState {
    Loading,
    Ready(Box<Scene>),
    Error(String),
}

struct Scene {
    data: GraphData,
    tree: Tree,
}

impl Scene {
    fn node_ref(&self, public_key: &str) -> Option<TreeNodeRef<'_>> {
        let index = self.tree.index_of_key(&self.data, public_key)?;
        Some(TreeNodeRef {
            tree: &self.tree,
            data: &self.data,
            index,
        })
    }

    fn max_depth(&self) -> usize {
        self.tree
            .nodes
            .iter()
            .map(|node| node.depth)
            .max()
            .unwrap_or(0)
    }
}

struct ViewState {
    pan: Vec2,
    zoom: f32,
    search: String,
    live_physics: bool,
    notice: Option<String>,
}

impl PeerOrbitApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: Config, initial_focus: String) -> Self {
        let mut app = Self::with_config(config, initial_focus);
        app.start_load();
        app
    }

    fn with_config(config: Config, initial_focus: String) -> Self {
        let mut navigation =
            NavigationController::new(BackgroundFetcher::new(config.endpoint.clone()), &config);

        let (tx, updates) = mpsc::channel();
        navigation.subscribe(move |update| {
            let _ = tx.send(update.clone());
        });

        Self {
            processor: GraphDataProcessor::new(&config.processor),
            positioning: Positioning::new(),
            adapter: SimulationAdapter::new(&config.layout),
            animation: SteppingAnimation::new(config.animation.clone()),
            navigation,
            updates,
            last_update: None,
            initial_focus,
            state: AppState::Loading,
            view: ViewState {
                pan: Vec2::ZERO,
                zoom: 1.0,
                search: String::new(),
                live_physics: true,
                notice: None,
            },
            config,
        }
    }

    fn start_load(&mut self) {
        self.state = AppState::Loading;
        self.positioning.reset();
        let focus = self.initial_focus.clone();
        self.navigation.step(&focus, None);
    }

    fn poll_fetch(&mut self, now: Duration) {
        let Some(result) = self.navigation.transport_mut().poll() else {
            return;
        };

        match result {
            Ok(response) => self.apply_response(&response, now),
            Err(error) => self.fail_load(error),
        }
    }

    /// Keeps the current scene with a notice, or offers Retry if there is none.
    fn fail_load(&mut self, error: String) {
        self.navigation.fail_pending(&error);
        self.animation.stop();
        match self.state {
            AppState::Ready(_) => self.view.notice = Some(error),
            _ => self.state = AppState::Error(error),
        }
    }

    fn apply_response(&mut self, response: &GraphResponse, now: Duration) {
        let data = self.processor.process_data(response);

        // navigation only moves once the response can be drawn
        let Some(tree) = self.positioning.position(&data) else {
            warn!(focus = %response.focus_node, "response does not contain its focus node");
            self.fail_load(format!(
                "focus {} missing from response",
                short_key(&response.focus_node)
            ));
            return;
        };

        self.navigation.on_response(response);
        self.adapter.update(&data, &tree);
        self.animation.on_response(&response.focus_node, now);
        self.view.notice = None;
        self.state = AppState::Ready(Box::new(Scene { data, tree }));
    }

    fn drain_updates(&mut self) {
        while let Ok(update) = self.updates.try_recv() {
            self.last_update = Some(update);
        }
    }

    fn poll_animation(&mut self, now: Duration) {
        let Self {
            animation,
            navigation,
            state,
            ..
        } = self;

        animation.poll(now, |public_key| {
            let node = match state {
                AppState::Ready(scene) => scene.node_ref(public_key),
                _ => None,
            };
            navigation.step(public_key, node)
        });
    }

    /// User-initiated focus change; stops any running path replay first.
    pub(in crate::app) fn focus_on(&mut self, public_key: &str) {
        self.animation.stop();
        let node = match &self.state {
            AppState::Ready(scene) => scene.node_ref(public_key),
            _ => None,
        };
        self.navigation.step(public_key, node);
    }

    pub(in crate::app) fn replay_path_to(&mut self, public_key: &str, now: Duration) {
        let AppState::Ready(scene) = &self.state else {
            return;
        };
        let Some(index) = scene.tree.index_of_key(&scene.data, public_key) else {
            return;
        };

        let path = scene.tree.path_from_root(&scene.data, index);
        self.animation.play(path, now);
    }

    fn schedule_repaint(&self, ctx: &Context, now: Duration) {
        if self.navigation.is_pending() || (self.view.live_physics && self.adapter.is_active()) {
            ctx.request_repaint();
        } else if let Some(due) = self.animation.next_due() {
            ctx.request_repaint_after(due.saturating_sub(now));
        }
    }
}

impl eframe::App for PeerOrbitApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let now = Duration::from_secs_f64(ctx.input(|input| input.time));

        self.poll_fetch(now);
        self.drain_updates();
        self.poll_animation(now);

        if matches!(self.state, AppState::Ready(_)) {
            self.show(ctx, now);
            self.schedule_repaint(ctx, now);
            return;
        }

        let mut retry = false;
        match &self.state {
            AppState::Ready(_) => {}
            AppState::Loading => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Fetching neighbor graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to fetch the neighbor graph");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.label(format!("endpoint: {}", self.config.endpoint));
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        retry = true;
                    }
                });
            }
        }

        if retry {
            self.start_load();
        }
        self.schedule_repaint(ctx, now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::parse_graph_response;

    fn app() -> PeerOrbitApp {
        let config = Config {
            endpoint: "http://127.0.0.1:9".to_owned(),
            ..Config::default()
        };
        PeerOrbitApp::with_config(config, String::new())
    }

    fn response(raw: &str) -> GraphResponse {
        parse_graph_response(raw).expect("fixture parses")
    }

    fn two_nodes() -> GraphResponse {
        response(
            r#"{"user_node": "s", "focus_node": "s",
                "nodes": [{"public_key": "s"}, {"public_key": "a"}],
                "edges": [{"from": "s", "to": "a", "amount": 1}]}"#,
        )
    }

    #[test]
    fn first_response_without_focus_offers_retry() {
        let mut app = app();
        app.apply_response(
            &response(r#"{"focus_node": "x", "nodes": []}"#),
            Duration::ZERO,
        );

        assert!(matches!(app.state, AppState::Error(_)));
        assert!(!app.navigation.is_pending());
        assert_eq!(app.navigation.focus(), None);
        assert!(app.navigation.history().is_empty());
    }

    #[test]
    fn later_response_without_focus_keeps_the_scene() {
        let mut app = app();
        app.apply_response(&two_nodes(), Duration::ZERO);
        assert!(matches!(app.state, AppState::Ready(_)));
        assert_eq!(app.navigation.focus(), Some("s"));

        app.apply_response(
            &response(r#"{"focus_node": "x", "nodes": [{"public_key": "s"}]}"#),
            Duration::ZERO,
        );

        assert!(matches!(app.state, AppState::Ready(_)));
        assert!(app.view.notice.is_some());
        assert_eq!(app.navigation.focus(), Some("s"));
        assert_eq!(app.navigation.history(), ["s"]);
    }

    #[test]
    fn good_response_clears_the_notice() {
        let mut app = app();
        app.view.notice = Some("timeout".to_owned());
        app.apply_response(&two_nodes(), Duration::ZERO);

        assert!(app.view.notice.is_none());
        assert!(matches!(&app.state, AppState::Ready(scene) if scene.data.nodes.len() == 2));
    }
}
