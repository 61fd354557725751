use rand::Rng;

use crate::config::BackdropConfig;
use super::node::Node;

/// Number of nodes for a given viewport width. Sampled once at startup;
/// later resizes reuse the same count.
pub fn node_count(viewport_width: f32, config: &BackdropConfig) -> usize {
    let raw = (viewport_width / config.px_per_node).floor().max(0.0) as usize;
    raw.clamp(config.min_nodes, config.max_nodes)
}

/// The full set of nodes plus the surface bounds they live in.
///
/// The node vector is cleared and refilled on regeneration, so its
/// allocation survives resizes.
#[derive(Debug)]
pub struct NodeField {
    nodes: Vec<Node>,
    width: f32,
    height: f32,
    margin: f32,
}

impl NodeField {
    pub fn new(config: &BackdropConfig) -> Self {
        Self {
            nodes: Vec::with_capacity(config.max_nodes),
            width: 0.0,
            height: 0.0,
            margin: config.edge_margin,
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Replaces every node with `count` freshly generated ones spread over
    /// the surface. A zero-sized surface leaves the field empty.
    pub fn regenerate<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        width: f32,
        height: f32,
        count: usize,
        config: &BackdropConfig,
    ) {
        self.width = width;
        self.height = height;
        self.margin = config.edge_margin;
        self.nodes.clear();

        if !(width > 0.0 && height > 0.0) {
            return;
        }

        self.nodes
            .extend((0..count).map(|_| Node::random(rng, width, height, config.highlight_chance)));
        log::info!("Generated {} nodes for {}x{} surface", count, width, height);
    }

    /// Advances every node by `dt` seconds, then wraps.
    pub fn step(&mut self, dt: f32) {
        let ticks = dt * 60.0;
        for node in self.nodes.iter_mut() {
            node.x += node.vx * ticks;
            node.y += node.vy * ticks;
            wrap_node(node, self.width, self.height, self.margin);
        }
    }

    #[cfg(test)]
    pub(crate) fn push(&mut self, node: Node) {
        self.nodes.push(node);
    }

    #[cfg(test)]
    pub(crate) fn with_bounds(width: f32, height: f32, margin: f32) -> Self {
        Self { nodes: Vec::new(), width, height, margin }
    }
}

/// Teleports a node that left the padded surface to the opposite side.
/// Velocity is left untouched.
pub fn wrap_node(node: &mut Node, width: f32, height: f32, margin: f32) {
    node.x = wrap_axis(node.x, width, margin);
    node.y = wrap_axis(node.y, height, margin);
}

fn wrap_axis(value: f32, extent: f32, margin: f32) -> f32 {
    if value < -margin {
        extent + margin
    } else if value > extent + margin {
        -margin
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn still(x: f32, y: f32) -> Node {
        Node { x, y, vx: 0.0, vy: 0.0, r: 2.0, bright: 1.0, highlight: false }
    }

    #[test]
    fn node_count_follows_viewport_width() {
        let config = BackdropConfig::default();
        assert_eq!(node_count(1000.0, &config), 100);
        assert_eq!(node_count(3000.0, &config), 100);
        assert_eq!(node_count(9000.0, &config), 150);
        assert_eq!(node_count(9059.0, &config), 150);
        assert_eq!(node_count(12000.0, &config), 200);
        assert_eq!(node_count(0.0, &config), 100);
    }

    #[test]
    fn node_count_caps_at_max_nodes() {
        let config = BackdropConfig::default();
        assert_eq!(node_count(17999.0, &config), 299);
        assert_eq!(node_count(18000.0, &config), 300);
        assert_eq!(node_count(30000.0, &config), 300);
    }

    #[test]
    fn regenerate_replaces_whole_set() {
        let config = BackdropConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut field = NodeField::new(&config);

        let count = node_count(12000.0, &config);
        field.regenerate(&mut rng, 1200.0, 800.0, count, &config);
        assert_eq!(field.nodes().len(), 200);
        let first = field.nodes()[0];

        // A resize keeps the startup count but redraws every node.
        field.regenerate(&mut rng, 600.0, 400.0, count, &config);
        assert_eq!(field.nodes().len(), 200);
        assert_ne!(field.nodes()[0], first);
        assert!(field.nodes().iter().all(|n| n.x < 600.0 && n.y < 400.0));
    }

    #[test]
    fn regenerate_on_empty_surface_leaves_no_nodes() {
        let config = BackdropConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut field = NodeField::new(&config);
        field.regenerate(&mut rng, 0.0, 600.0, 100, &config);
        assert!(field.nodes().is_empty());
        field.step(0.016);
    }

    #[test]
    fn crossing_right_margin_teleports_to_left_margin() {
        let mut field = NodeField::with_bounds(800.0, 600.0, 10.0);
        field.push(still(800.0 + 15.0, 300.0));
        field.step(0.016);
        let node = field.nodes()[0];
        assert_eq!(node.x, -10.0);
        assert_eq!(node.y, 300.0);
        assert_eq!((node.vx, node.vy), (0.0, 0.0));
    }

    #[test]
    fn inside_margin_is_left_alone() {
        let mut field = NodeField::with_bounds(800.0, 600.0, 10.0);
        field.push(still(805.0, -5.0));
        field.step(0.016);
        assert_eq!(field.nodes()[0].x, 805.0);
        assert_eq!(field.nodes()[0].y, -5.0);
    }

    #[test]
    fn crossing_top_margin_teleports_to_bottom_margin() {
        let mut field = NodeField::with_bounds(800.0, 600.0, 10.0);
        field.push(Node { vy: -0.9, ..still(100.0, -9.9) });
        field.step(1.0 / 60.0);
        let node = field.nodes()[0];
        assert_eq!(node.y, 610.0);
        // Wrapping never flips direction.
        assert_eq!(node.vy, -0.9);
    }

    #[test]
    fn motion_is_frame_rate_independent() {
        let start = Node { vx: 0.3, vy: -0.2, ..still(200.0, 300.0) };

        let mut coarse = NodeField::with_bounds(800.0, 600.0, 10.0);
        coarse.push(start);
        coarse.step(0.5);
        coarse.step(0.5);

        let mut fine = NodeField::with_bounds(800.0, 600.0, 10.0);
        fine.push(start);
        for dt in [0.1, 0.016, 0.3, 0.084, 0.25, 0.25] {
            fine.step(dt);
        }

        let (a, b) = (coarse.nodes()[0], fine.nodes()[0]);
        assert!((a.x - b.x).abs() < 1e-3, "{} vs {}", a.x, b.x);
        assert!((a.y - b.y).abs() < 1e-3, "{} vs {}", a.y, b.y);
        assert!((a.x - 218.0).abs() < 1e-3);
        assert!((a.y - 288.0).abs() < 1e-3);
    }

    #[test]
    fn generated_nodes_stay_bounded_over_time() {
        let config = BackdropConfig::default();
        let mut rng = StdRng::seed_from_u64(99);
        let mut field = NodeField::new(&config);
        field.regenerate(&mut rng, 640.0, 480.0, node_count(640.0, &config), &config);
        for _ in 0..5000 {
            field.step(1.0 / 60.0);
        }
        for node in field.nodes() {
            assert!(node.x >= -10.0 && node.x <= 650.0, "{node:?}");
            assert!(node.y >= -10.0 && node.y <= 490.0, "{node:?}");
        }
    }
}
