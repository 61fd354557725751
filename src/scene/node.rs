use rand::Rng;

pub const HIGHLIGHT_SPEED: f32 = 0.9;
pub const NORMAL_SPEED: f32 = 0.32;

/// A single drifting point. Velocity is in pixels per 1/60 s tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub r: f32,
    pub bright: f32,
    pub highlight: bool,
}

impl Node {
    /// Draws a fresh node somewhere inside `width` x `height`.
    ///
    /// Highlight nodes are faster and larger. Non-highlight nodes draw
    /// brightness from the wider band.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, width: f32, height: f32, highlight_chance: f64) -> Self {
        let highlight = rng.gen_bool(highlight_chance);
        let speed = Self::speed_base(highlight);
        let (r, bright) = if highlight {
            (rng.gen_range(1.8..4.0), rng.gen_range(1.0..2.05))
        } else {
            (rng.gen_range(1.0..3.0), rng.gen_range(1.0..2.25))
        };

        Self {
            x: rng.gen_range(0.0..width),
            y: rng.gen_range(0.0..height),
            vx: rng.gen_range(-0.5..0.5) * speed,
            vy: rng.gen_range(-0.5..0.5) * speed,
            r,
            bright,
            highlight,
        }
    }

    pub fn speed_base(highlight: bool) -> f32 {
        if highlight { HIGHLIGHT_SPEED } else { NORMAL_SPEED }
    }

    /// Fill opacity of the node's disc.
    pub fn fill_alpha(&self) -> f32 {
        self.bright.min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn sample(count: usize) -> Vec<Node> {
        let mut rng = StdRng::seed_from_u64(7);
        (0..count).map(|_| Node::random(&mut rng, 800.0, 600.0, 0.28)).collect()
    }

    #[test]
    fn velocity_stays_within_half_speed_base() {
        for node in sample(2000) {
            let limit = 0.5 * Node::speed_base(node.highlight);
            assert!(node.vx.abs() <= limit, "{node:?}");
            assert!(node.vy.abs() <= limit, "{node:?}");
        }
    }

    #[test]
    fn radius_and_brightness_bands_depend_on_highlight() {
        for node in sample(2000) {
            if node.highlight {
                assert!((1.8..4.0).contains(&node.r));
                assert!((1.0..2.05).contains(&node.bright));
            } else {
                assert!((1.0..3.0).contains(&node.r));
                assert!((1.0..2.25).contains(&node.bright));
            }
            assert_eq!(node.fill_alpha(), 1.0);
        }
    }

    #[test]
    fn positions_start_inside_surface() {
        for node in sample(500) {
            assert!((0.0..800.0).contains(&node.x));
            assert!((0.0..600.0).contains(&node.y));
        }
    }

    #[test]
    fn roughly_28_percent_are_highlighted() {
        let nodes = sample(10_000);
        let share = nodes.iter().filter(|n| n.highlight).count() as f64 / nodes.len() as f64;
        assert!((share - 0.28).abs() < 0.03, "share = {share}");
    }

    #[test]
    fn speed_base_matches_class() {
        assert_eq!(Node::speed_base(true), 0.9);
        assert_eq!(Node::speed_base(false), 0.32);
    }
}
