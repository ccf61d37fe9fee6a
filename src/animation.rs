use std::collections::{BTreeSet, VecDeque};
use std::time::Duration;

use tracing::debug;

use crate::config::AnimationConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AnimationState {
    Stopped,
    Playing,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Action {
    HighlightHead,
    Navigate(String),
    Unhighlight(String),
}

#[derive(Clone, Debug)]
struct Scheduled {
    due: Duration,
    run: u64,
    action: Action,
}

/// Replays a path of focus changes as highlight, navigate, unhighlight.
///
/// Time is supplied by the caller, so the same timeline runs under the UI
/// clock and under tests. Callbacks scheduled by an earlier run never fire in
/// a later one.
pub struct SteppingAnimation {
    config: AnimationConfig,
    state: AnimationState,
    run: u64,
    path: VecDeque<String>,
    timers: Vec<Scheduled>,
    highlighted: BTreeSet<String>,
}

impl SteppingAnimation {
    pub fn new(config: AnimationConfig) -> Self {
        Self {
            config,
            state: AnimationState::Stopped,
            run: 0,
            path: VecDeque::new(),
            timers: Vec::new(),
            highlighted: BTreeSet::new(),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state == AnimationState::Playing
    }

    pub fn is_highlighted(&self, public_key: &str) -> bool {
        self.highlighted.contains(public_key)
    }

    pub fn highlighted(&self) -> &BTreeSet<String> {
        &self.highlighted
    }

    pub fn remaining(&self) -> usize {
        self.path.len()
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.timers.iter().map(|timer| timer.due).min()
    }

    pub fn play(&mut self, path: Vec<String>, now: Duration) -> bool {
        if self.is_playing() {
            debug!("animation already playing; play ignored");
            return false;
        }
        if path.is_empty() {
            return false;
        }

        self.run = self.run.wrapping_add(1);
        self.state = AnimationState::Playing;
        self.path = path.into();
        self.highlight_head(now);
        true
    }

    pub fn stop(&mut self) {
        if self.is_playing() {
            debug!(remaining = self.path.len(), "animation stopped");
        }
        self.state = AnimationState::Stopped;
        self.path.clear();
        self.highlighted.clear();
    }

    pub fn on_response(&mut self, focus: &str, now: Duration) {
        if !self.is_playing() {
            return;
        }

        self.path.pop_front();
        self.schedule(
            now + self.config.unhighlight_after_response(),
            Action::Unhighlight(focus.to_owned()),
        );

        if self.path.is_empty() {
            self.stop();
        } else {
            self.schedule(
                now + self.config.highlight_after_response(),
                Action::HighlightHead,
            );
        }
    }

    /// Fires every callback due at `now`; `step` issues the focus change and
    /// reports whether it was accepted.
    pub fn poll(&mut self, now: Duration, mut step: impl FnMut(&str) -> bool) {
        while let Some(position) = self.earliest_due(now) {
            let timer = self.timers.remove(position);
            if !self.is_playing() || timer.run != self.run {
                continue;
            }

            match timer.action {
                Action::HighlightHead => self.highlight_head(timer.due),
                Action::Navigate(public_key) => {
                    if !step(&public_key) {
                        debug!(public_key, "animation step rejected");
                        self.stop();
                    }
                }
                Action::Unhighlight(public_key) => {
                    self.highlighted.remove(&public_key);
                }
            }
        }
    }

    fn earliest_due(&self, now: Duration) -> Option<usize> {
        self.timers
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.due <= now)
            .min_by_key(|(_, timer)| timer.due)
            .map(|(position, _)| position)
    }

    fn highlight_head(&mut self, now: Duration) {
        let Some(head) = self.path.front().cloned() else {
            self.stop();
            return;
        };

        self.highlighted.insert(head.clone());
        self.schedule(
            now + self.config.step_after_highlight(),
            Action::Navigate(head),
        );
    }

    fn schedule(&mut self, due: Duration, action: Action) {
        self.timers.push(Scheduled {
            due,
            run: self.run,
            action,
        });
    }
}
