//! The edges of the screen that particles bounce off.

use glam::Vec2;

/// How much speed a particle keeps when it bounces off an edge.
const RESTITUTION: f32 = 0.5;

/// The screen: a fixed-size rectangle from `[0, 0]` to `[width, height]`.
///
/// There's no top edge. Particles can leave through the top, but gravity normally brings them
/// back.
#[derive(Debug, Clone, Copy, PartialEq)]
#[expect(
    clippy::exhaustive_structs,
    reason = "A rectangle isn't going to grow any more fields"
)]
pub struct Bounds {
    /// Width of the screen
    pub width: f32,
    /// Height of the screen
    pub height: f32,
}

impl Bounds {
    /// Instantiate
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Bounce a position that has crossed the left, right or bottom edge back inside. The
    /// position is mirrored across the edge and the velocity is inverted and halved.
    pub fn reflect(&self, position: &mut Vec2, velocity: &mut Vec2) {
        if position.x < 0.0 {
            velocity.x = -velocity.x * RESTITUTION;
            position.x = -position.x;
        } else if position.x > self.width {
            velocity.x = -velocity.x * RESTITUTION;
            position.x = self.width * 2.0 - position.x;
        }

        if position.y > self.height {
            velocity.y = -velocity.y * RESTITUTION;
            position.y = self.height * 2.0 - position.y;
        }
    }
}

#[cfg(test)]
#[expect(clippy::float_cmp, reason = "Tests aren't so strict")]
mod test {
    use super::*;

    const BOUNDS: Bounds = Bounds::new(800.0, 600.0);

    #[test]
    fn bounce_off_left_edge() {
        let mut position = Vec2::new(-5.0, 100.0);
        let mut velocity = Vec2::new(-4.0, 1.0);
        BOUNDS.reflect(&mut position, &mut velocity);
        assert_eq!(position, Vec2::new(5.0, 100.0));
        assert_eq!(velocity, Vec2::new(2.0, 1.0));
    }

    #[test]
    fn bounce_off_right_edge() {
        let mut position = Vec2::new(810.0, 100.0);
        let mut velocity = Vec2::new(6.0, 0.0);
        BOUNDS.reflect(&mut position, &mut velocity);
        assert_eq!(position, Vec2::new(790.0, 100.0));
        assert_eq!(velocity, Vec2::new(-3.0, 0.0));
    }

    #[test]
    fn bounce_off_bottom_edge() {
        let mut position = Vec2::new(10.0, 603.0);
        let mut velocity = Vec2::new(0.5, 8.0);
        BOUNDS.reflect(&mut position, &mut velocity);
        assert_eq!(position, Vec2::new(10.0, 597.0));
        assert_eq!(velocity, Vec2::new(0.5, -4.0));
    }

    #[test]
    fn no_top_edge() {
        let mut position = Vec2::new(10.0, -50.0);
        let mut velocity = Vec2::new(0.0, -8.0);
        BOUNDS.reflect(&mut position, &mut velocity);
        assert_eq!(position, Vec2::new(10.0, -50.0));
        assert_eq!(velocity, Vec2::new(0.0, -8.0));
    }

    #[test]
    fn corner_bounces_both_axes() {
        let mut position = Vec2::new(-1.0, 601.0);
        let mut velocity = Vec2::new(-2.0, 2.0);
        BOUNDS.reflect(&mut position, &mut velocity);
        assert_eq!(position, Vec2::new(1.0, 599.0));
        assert_eq!(velocity, Vec2::new(1.0, -1.0));
    }

    #[test]
    fn on_the_edge_is_inside() {
        let mut position = Vec2::new(800.0, 600.0);
        let mut velocity = Vec2::new(1.0, 1.0);
        BOUNDS.reflect(&mut position, &mut velocity);
        assert_eq!(position, Vec2::new(800.0, 600.0));
        assert_eq!(velocity, Vec2::new(1.0, 1.0));
    }
}
