// src/config.rs
use std::path::Path;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

/// Id of the page element the backdrop mounts into.
pub const MOUNT_ID: &str = "vertexBg";

/// Attribute on the mount element that may carry a JSON `BackdropConfig`.
pub const CONFIG_ATTRIBUTE: &str = "data-backdrop-config";

/// Tunables for the node field. Every field is optional in JSON; missing
/// keys fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BackdropConfig {
    /// Maximum distance (CSS px) at which two nodes get a connecting line.
    pub link_distance: f32,
    /// Line opacity at zero distance; falls off linearly to 0 at `link_distance`.
    pub link_alpha: f32,
    /// Stroke width of links in CSS px.
    pub line_width: f32,
    /// Probability that a generated node is a highlight node.
    pub highlight_chance: f64,
    /// Viewport pixels per node when sizing the field.
    pub px_per_node: f32,
    pub min_nodes: usize,
    pub max_nodes: usize,
    /// How far past an edge a node may drift before it teleports across.
    pub edge_margin: f32,
    /// Halo size around highlight nodes.
    pub glow_radius: f32,
    pub resize_debounce_ms: u64,
    /// Class on `<body>` (or the root element) that marks a dark page.
    pub dark_class: String,
}

impl Default for BackdropConfig {
    fn default() -> Self {
        Self {
            link_distance: 180.0,
            link_alpha: 0.28,
            line_width: 1.2,
            highlight_chance: 0.28,
            px_per_node: 60.0,
            min_nodes: 100,
            max_nodes: 300,
            edge_margin: 10.0,
            glow_radius: 16.0,
            resize_debounce_ms: 120,
            dark_class: "theme-dark".to_string(),
        }
    }
}

impl BackdropConfig {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let config: BackdropConfig =
            serde_json::from_str(json).context("failed to parse backdrop config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.min_nodes > self.max_nodes {
            bail!("minNodes ({}) exceeds maxNodes ({})", self.min_nodes, self.max_nodes);
        }
        if !(self.link_distance > 0.0) {
            bail!("linkDistance must be positive, got {}", self.link_distance);
        }
        if !(self.px_per_node > 0.0) {
            bail!("pxPerNode must be positive, got {}", self.px_per_node);
        }
        if !(0.0..=1.0).contains(&self.link_alpha) {
            bail!("linkAlpha must lie in [0, 1], got {}", self.link_alpha);
        }
        if !(self.line_width > 0.0) {
            bail!("lineWidth must be positive, got {}", self.line_width);
        }
        if !(0.0..=1.0).contains(&self.highlight_chance) {
            bail!("highlightChance must lie in [0, 1], got {}", self.highlight_chance);
        }
        if self.edge_margin < 0.0 || self.glow_radius < 0.0 {
            bail!("edgeMargin and glowRadius must not be negative");
        }
        Ok(())
    }

    pub fn resize_debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.resize_debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config = BackdropConfig::from_json("{}").unwrap();
        assert_eq!(config, BackdropConfig::default());
        assert_eq!(config.link_distance, 180.0);
        assert_eq!(config.resize_debounce_ms, 120);
    }

    #[test]
    fn partial_json_overrides_only_named_keys() {
        let config =
            BackdropConfig::from_json(r#"{ "linkDistance": 120, "darkClass": "night" }"#).unwrap();
        assert_eq!(config.link_distance, 120.0);
        assert_eq!(config.dark_class, "night");
        assert_eq!(config.line_width, 1.2);
        assert_eq!(config.max_nodes, 300);
    }

    #[test]
    fn rejects_inverted_node_bounds() {
        let err = BackdropConfig::from_json(r#"{ "minNodes": 400, "maxNodes": 300 }"#).unwrap_err();
        assert!(err.to_string().contains("minNodes"));
    }

    #[test]
    fn rejects_non_positive_link_distance() {
        assert!(BackdropConfig::from_json(r#"{ "linkDistance": 0 }"#).is_err());
    }

    #[test]
    fn defaults_match_vertex_bg_page() {
        let config = BackdropConfig::default();
        assert_eq!(MOUNT_ID, "vertexBg");
        assert_eq!(config.dark_class, "theme-dark");
        assert_eq!(config.line_width, 1.2);
    }

    #[test]
    fn rejects_link_alpha_outside_unit_range() {
        let err = BackdropConfig::from_json(r#"{ "linkAlpha": -0.1 }"#).unwrap_err();
        assert!(err.to_string().contains("linkAlpha"));
        assert!(BackdropConfig::from_json(r#"{ "linkAlpha": 1.5 }"#).is_err());
        assert!(BackdropConfig::from_json(r#"{ "linkAlpha": 0.0 }"#).is_ok());
        assert!(BackdropConfig::from_json(r#"{ "linkAlpha": 1.0 }"#).is_ok());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(BackdropConfig::from_json("{ linkDistance: }").is_err());
    }
}
