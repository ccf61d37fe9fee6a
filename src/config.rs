use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransmissionScope {
    #[default]
    All,
    Focus,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProcessorConfig {
    pub transmission_scope: TransmissionScope,
    pub traffic_scaling: bool,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            transmission_scope: TransmissionScope::All,
            traffic_scaling: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Ring spacing; a node at depth `d` is held `d * radius_step` from the center.
    pub radius_step: f32,
    pub link_strength: f32,
    pub center_strength: f32,
    pub radial_strength: f32,
    pub radial_min_distance: f32,
    pub velocity_decay: f32,
    pub alpha_min: f32,
    pub alpha_decay: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            radius_step: 140.0,
            link_strength: 0.7,
            center_strength: 1.0,
            radial_strength: 0.35,
            radial_min_distance: 4.0,
            velocity_decay: 0.4,
            alpha_min: 0.001,
            alpha_decay: 1.0 - 0.001_f32.powf(1.0 / 300.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub delay_step_after_highlight_ms: u64,
    pub delay_unhighlight_after_response_ms: u64,
    pub delay_highlight_after_response_ms: u64,
}

impl AnimationConfig {
    pub fn step_after_highlight(&self) -> Duration {
        Duration::from_millis(self.delay_step_after_highlight_ms)
    }

    pub fn unhighlight_after_response(&self) -> Duration {
        Duration::from_millis(self.delay_unhighlight_after_response_ms)
    }

    pub fn highlight_after_response(&self) -> Duration {
        Duration::from_millis(self.delay_highlight_after_response_ms)
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            delay_step_after_highlight_ms: 600,
            delay_unhighlight_after_response_ms: 900,
            delay_highlight_after_response_ms: 1200,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub endpoint: String,
    pub neighbor_level: u32,
    pub max_neighbors: u32,
    pub processor: ProcessorConfig,
    pub layout: LayoutConfig,
    pub animation: AnimationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080/api/graph".to_owned(),
            neighbor_level: 2,
            max_neighbors: 12,
            processor: ProcessorConfig::default(),
            layout: LayoutConfig::default(),
            animation: AnimationConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_yields_defaults() {
        let config = Config::load(None).expect("defaults");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("orbit.json");
        fs::write(
            &path,
            r#"{
                "endpoint": "http://trust.example/graph",
                "max_neighbors": 30,
                "processor": {"transmission_scope": "focus"},
                "layout": {"radius_step": 90.0},
                "animation": {"delay_step_after_highlight_ms": 50}
            }"#,
        )
        .expect("write config");

        let config = Config::load(Some(&path)).expect("config loads");
        assert_eq!(config.endpoint, "http://trust.example/graph");
        assert_eq!(config.max_neighbors, 30);
        assert_eq!(config.neighbor_level, 2);
        assert_eq!(config.processor.transmission_scope, TransmissionScope::Focus);
        assert!(config.processor.traffic_scaling);
        assert_eq!(config.layout.radius_step, 90.0);
        assert_eq!(config.layout.velocity_decay, 0.4);
        assert_eq!(
            config.animation.step_after_highlight(),
            Duration::from_millis(50)
        );
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").expect("write config");

        let error = Config::load(Some(&path)).expect_err("must fail");
        assert!(format!("{error:#}").contains("broken.json"));
    }
}
