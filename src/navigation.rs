use tracing::{debug, info, warn};

use crate::config::Config;
use crate::graph::{GraphData, Tree};
use crate::network::{FetchRequest, GraphResponse};

/// Outbound side of a focus change. Implementations must eventually answer
/// through [`NavigationController::on_response`] or
/// [`NavigationController::fail_pending`].
pub trait Transport {
    fn request(&mut self, request: FetchRequest);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NavigationState {
    Idle,
    Pending,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavigationUpdate {
    pub focus: String,
    pub history: Vec<String>,
    /// The focus was already in the history and the history was cut back to it.
    pub returned: bool,
}

/// A node of the current tree, used to keep its ancestor chain in the next view.
#[derive(Clone, Copy)]
pub struct TreeNodeRef<'a> {
    pub tree: &'a Tree,
    pub data: &'a GraphData,
    pub index: usize,
}

type Listener = Box<dyn FnMut(&NavigationUpdate)>;

pub struct NavigationController<T> {
    transport: T,
    state: NavigationState,
    focus: Option<String>,
    requested: Option<String>,
    history: Vec<String>,
    /// Entries cut by `step_back`, put back if its fetch fails.
    stepped_back: Vec<String>,
    mandatory_nodes: Vec<String>,
    neighbor_level: u32,
    max_neighbors: u32,
    listeners: Vec<Listener>,
}

impl<T: Transport> NavigationController<T> {
    pub fn new(transport: T, config: &Config) -> Self {
        Self {
            transport,
            state: NavigationState::Idle,
            focus: None,
            requested: None,
            history: Vec::new(),
            stepped_back: Vec::new(),
            mandatory_nodes: Vec::new(),
            neighbor_level: config.neighbor_level,
            max_neighbors: config.max_neighbors,
            listeners: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn is_pending(&self) -> bool {
        self.state == NavigationState::Pending
    }

    pub fn focus(&self) -> Option<&str> {
        self.focus.as_deref()
    }

    pub fn requested(&self) -> Option<&str> {
        self.requested.as_deref()
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn mandatory_nodes(&self) -> &[String] {
        &self.mandatory_nodes
    }

    pub fn set_limits(&mut self, neighbor_level: u32, max_neighbors: u32) {
        self.neighbor_level = neighbor_level;
        self.max_neighbors = max_neighbors;
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&NavigationUpdate) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn step(&mut self, public_key: &str, node: Option<TreeNodeRef<'_>>) -> bool {
        if self.is_pending() {
            debug!(public_key, "navigation already pending; step dropped");
            return false;
        }
        if self.focus.as_deref() == Some(public_key) {
            debug!(public_key, "already focused; step ignored");
            return false;
        }

        if let Some(node) = node {
            self.mandatory_nodes = node.tree.ancestor_keys(node.data, node.index);
        }

        self.state = NavigationState::Pending;
        self.requested = Some(public_key.to_owned());
        self.transport.request(FetchRequest {
            focus_node: public_key.to_owned(),
            neighbor_level: self.neighbor_level,
            max_neighbors: self.max_neighbors,
            mandatory_nodes: self.mandatory_nodes.clone(),
        });
        true
    }

    pub fn on_response(&mut self, response: &GraphResponse) -> NavigationUpdate {
        self.state = NavigationState::Idle;
        self.requested = None;
        self.stepped_back.clear();

        let focus = response.focus_node.clone();
        if response.user_node.as_deref() == Some(focus.as_str()) {
            self.mandatory_nodes.clear();
        }

        let returned = match self.history.iter().position(|key| *key == focus) {
            Some(position) => {
                self.history.truncate(position + 1);
                true
            }
            None => {
                self.history.push(focus.clone());
                false
            }
        };
        self.focus = Some(focus.clone());

        info!(
            focus = %focus,
            history = self.history.len(),
            returned,
            "navigation complete"
        );

        let update = NavigationUpdate {
            focus,
            history: self.history.clone(),
            returned,
        };
        for listener in &mut self.listeners {
            listener(&update);
        }
        update
    }

    /// Clears the pending flag after a failed fetch. Without this call the
    /// controller stays pending and drops every later step.
    pub fn fail_pending(&mut self, error: &str) {
        warn!(
            requested = self.requested.as_deref().unwrap_or_default(),
            error,
            "neighbor graph fetch failed"
        );
        self.state = NavigationState::Idle;
        self.requested = None;
        self.history.append(&mut self.stepped_back);
    }

    /// Drops the current and previous foci from the history and steps back to
    /// the previous one; its response appends it again. If the fetch fails,
    /// [`Self::fail_pending`] puts the dropped entries back.
    pub fn step_back(&mut self) -> bool {
        if self.history.len() < 2 {
            debug!(history = self.history.len(), "nothing to step back to");
            return false;
        }
        if self.is_pending() {
            debug!("navigation already pending; step back dropped");
            return false;
        }

        let len = self.history.len();
        let target = self.history[len - 2].clone();
        let dropped = self.history.split_off(len - 2);
        if !self.step(&target, None) {
            self.history.extend(dropped);
            return false;
        }
        self.stepped_back = dropped;
        true
    }
}
