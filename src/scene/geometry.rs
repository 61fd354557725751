use crate::color::Color;
use crate::config::BackdropConfig;
use crate::models::{CircleInstance, LineInstance};
use super::node::Node;

/// Opacity of the link between two nodes `distance` apart, or `None` when
/// no line should be drawn.
pub fn link_alpha(distance: f32, max_distance: f32, max_alpha: f32) -> Option<f32> {
    if distance > max_distance {
        return None;
    }
    let alpha = (1.0 - distance / max_distance) * max_alpha;
    (alpha > 0.0).then_some(alpha)
}

/// Per-frame draw lists. Both vectors are cleared and refilled each frame
/// and keep their capacity, so steady-state frames do not allocate.
#[derive(Debug, Default)]
pub struct FrameGeometry {
    pub line_instances: Vec<LineInstance>,
    pub circle_instances: Vec<CircleInstance>,
}

impl FrameGeometry {
    pub fn with_capacity(max_nodes: usize) -> Self {
        Self {
            line_instances: Vec::new(),
            circle_instances: Vec::with_capacity(max_nodes),
        }
    }

    /// Rebuilds lines (every close pair) and node discs from the current field.
    pub fn rebuild(&mut self, nodes: &[Node], ink: Color, config: &BackdropConfig) {
        self.line_instances.clear();
        self.circle_instances.clear();

        let max_distance = config.link_distance;
        let max_distance_sq = max_distance * max_distance;
        let [r, g, b, _] = ink.into_linear_rgba();

        for (i, a) in nodes.iter().enumerate() {
            for other in &nodes[i + 1..] {
                let dx = a.x - other.x;
                let dy = a.y - other.y;
                let distance_sq = dx * dx + dy * dy;
                if distance_sq > max_distance_sq {
                    continue;
                }
                let Some(alpha) = link_alpha(distance_sq.sqrt(), max_distance, config.link_alpha)
                else {
                    continue;
                };
                self.line_instances.push(LineInstance {
                    start: [a.x, a.y],
                    end: [other.x, other.y],
                    width: config.line_width,
                    color: [r, g, b, alpha],
                });
            }
        }

        self.circle_instances.extend(nodes.iter().map(|node| CircleInstance {
            position: [node.x, node.y],
            radius: node.r,
            glow: if node.highlight { config.glow_radius } else { 0.0 },
            color: [r, g, b, node.fill_alpha()],
        }));
    }

    pub fn line_count(&self) -> usize {
        self.line_instances.len()
    }
}
