//! A single fluid particle.
//!
//! One particle on its own is just a dot falling under gravity. It only starts to behave like a
//! fluid when there are hundreds of them, all trying to get away from each other.

use glam::Vec2;

use crate::bounds::Bounds;
use crate::errors::{
    FluidError, InvalidColourSnafu, InvalidDampingSnafu, InvalidSpeedScaleSnafu,
    NonFiniteGravitySnafu,
};

/// An RGB colour with channels in `0.0..=1.0`. The physics never reads it.
pub type Colour = (f32, f32, f32);

/// Pairs at or closer than this squared distance are effectively on top of each other and exert
/// no force, which also keeps every division below away from zero.
pub const COINCIDENT_SQUARED_DISTANCE: f32 = 1.0;

/// Subtracted from the vertical delta between two particles so that they float slightly upwards
/// rather than settling exactly on top of each other.
const UPWARD_BIAS: f32 = 1.0;

/// Turns the distance term into the divisor for the direct positional nudge.
const OFFSET_FALLOFF: f32 = 0.01;

/// Turns the distance term into the divisor for the velocity change. Applied after
/// `OFFSET_FALLOFF`, so the two multiply together.
const VELOCITY_FALLOFF: f32 = 0.0002;

/// The most that a single neighbour can nudge a particle's position in one frame.
pub const MAX_PAIR_OFFSET: f32 = 0.4;

/// The most that a single neighbour can change a particle's velocity in one frame.
pub const MAX_PAIR_VELOCITY: f32 = 0.2;

/// The most that a point force can change a particle's velocity in one frame.
pub const MAX_POINT_FORCE_VELOCITY: f32 = 0.8;

/// How strongly crowding adds to the damping.
const CROWDING_GAIN: f32 = 20_000.0;

/// The crowding damp is never allowed below this fraction of the damping coefficient.
const EXTRA_DAMP_LIMIT_RATIO: f32 = 0.4;

/// Falloff for the external point forces.
const POINT_FORCE_FALLOFF: f32 = 0.000_001;

/// The immutable attributes of a particle. They're set when the particle is spawned and never
/// change afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub struct Parameters {
    /// Multiplicative velocity decay per frame. A higher value makes the fluid less stiff.
    damping: f32,
    /// Interaction stiffness. A higher value makes the fluid take up more space and become less
    /// dense.
    speed_scale: f32,
    /// Added to the vertical velocity every frame.
    gravity: f32,
    /// Floor for the crowding damp, so that a particle doesn't suddenly stop when another
    /// particle gets really close.
    extra_damp_limit: f32,
    /// Only used for rendering.
    colour: Colour,
}

impl Parameters {
    /// Validate and build the parameters for a particle.
    ///
    /// # Errors
    /// When any of the values would make the simulation degenerate.
    pub fn new(
        damping: f32,
        speed_scale: f32,
        gravity: f32,
        colour: Colour,
    ) -> Result<Self, FluidError> {
        snafu::ensure!(
            damping > 0.0 && damping <= 1.0,
            InvalidDampingSnafu { damping }
        );
        snafu::ensure!(
            speed_scale.is_finite() && speed_scale > 0.0,
            InvalidSpeedScaleSnafu { speed_scale }
        );
        snafu::ensure!(gravity.is_finite(), NonFiniteGravitySnafu { gravity });
        let is_channel_valid = |channel: f32| (0.0..=1.0).contains(&channel);
        snafu::ensure!(
            is_channel_valid(colour.0) && is_channel_valid(colour.1) && is_channel_valid(colour.2),
            InvalidColourSnafu { colour }
        );

        Ok(Self {
            damping,
            speed_scale,
            gravity,
            extra_damp_limit: damping * EXTRA_DAMP_LIMIT_RATIO,
            colour,
        })
    }

    /// Multiplicative velocity decay per frame.
    #[must_use]
    pub const fn damping(&self) -> f32 {
        self.damping
    }

    /// Interaction stiffness.
    #[must_use]
    pub const fn speed_scale(&self) -> f32 {
        self.speed_scale
    }

    /// Added to the vertical velocity every frame.
    #[must_use]
    pub const fn gravity(&self) -> f32 {
        self.gravity
    }

    /// The lowest that the crowding damp can go.
    #[must_use]
    pub const fn extra_damp_limit(&self) -> f32 {
        self.extra_damp_limit
    }

    /// The colour used to draw the particle.
    #[must_use]
    pub const fn colour(&self) -> Colour {
        self.colour
    }

    /// The damping multiplier for a given amount of crowding.
    ///
    /// `reciprocal_sum` is the sum of `1 / distance⁴` over all the neighbours. The more
    /// neighbours there are nearby the harder the particle is damped, which stops crowds from
    /// building up runaway speeds.
    #[must_use]
    pub fn crowding_damp(&self, reciprocal_sum: f32) -> f32 {
        let extra_damp = 1.0 + (self.damping - 1.0) * reciprocal_sum * CROWDING_GAIN;
        if extra_damp < self.extra_damp_limit {
            return self.extra_damp_limit;
        }
        extra_damp
    }
}

/// What one neighbour does to a particle in a single frame.
#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub struct PairContribution {
    /// Direct nudge to the position. It doesn't affect the velocity.
    pub offset: Vec2,
    /// Change to the velocity.
    pub velocity: Vec2,
    /// `1 / distance⁴`, which feeds the crowding damp.
    pub reciprocal_distance_pow4: f32,
}

/// The repulsion from a neighbour at `delta` (this particle's position minus the neighbour's).
///
/// Returns `None` when the two are effectively on top of each other, or when the distance
/// between them isn't a number.
#[expect(
    clippy::neg_cmp_op_on_partial_ord,
    reason = "A NaN distance must fail the check"
)]
#[must_use]
pub fn pair_contribution(delta: Vec2, speed_scale: f32) -> Option<PairContribution> {
    let squared_distance = delta.x * delta.x + delta.y * delta.y;
    if !(squared_distance > COINCIDENT_SQUARED_DISTANCE) {
        return None;
    }

    let biased_dy = delta.y - UPWARD_BIAS;
    let mut distance_pow4 = squared_distance * squared_distance;
    let reciprocal_distance_pow4 = 1.0 / distance_pow4;

    // The speed scale doesn't touch the velocity directly. It shrinks the apparent distance
    // between particles, and closer particles push harder.
    distance_pow4 /= speed_scale;

    let offset_divisor = distance_pow4 * OFFSET_FALLOFF;
    let offset = Vec2::new(
        (delta.x / offset_divisor).clamp(-MAX_PAIR_OFFSET, MAX_PAIR_OFFSET),
        (biased_dy / offset_divisor).clamp(-MAX_PAIR_OFFSET, MAX_PAIR_OFFSET),
    );

    distance_pow4 *= VELOCITY_FALLOFF;
    let velocity = Vec2::new(
        (delta.x / distance_pow4).clamp(-MAX_PAIR_VELOCITY, MAX_PAIR_VELOCITY),
        (biased_dy / distance_pow4).clamp(-MAX_PAIR_VELOCITY, MAX_PAIR_VELOCITY),
    );

    Some(PairContribution {
        offset,
        velocity,
        reciprocal_distance_pow4,
    })
}

/// A single point of fluid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Screen coordinates. [0, 0] is the top-left and y grows downwards.
    position: Vec2,
    /// Change in position per frame.
    velocity: Vec2,
    /// Fixed for the particle's whole life.
    parameters: Parameters,
}

impl Particle {
    /// Instantiate
    #[must_use]
    pub const fn new(position: Vec2, velocity: Vec2, parameters: Parameters) -> Self {
        Self {
            position,
            velocity,
            parameters,
        }
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Current velocity.
    #[must_use]
    pub const fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// The particle's immutable attributes.
    #[must_use]
    pub const fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// The colour to draw the particle with.
    #[must_use]
    pub const fn colour(&self) -> Colour {
        self.parameters.colour
    }

    /// Everything a renderer needs: `(x, y, r, g, b)`.
    #[must_use]
    pub const fn render_data(&self) -> (f32, f32, f32, f32, f32) {
        let (red, green, blue) = self.parameters.colour;
        (self.position.x, self.position.y, red, green, blue)
    }

    /// Advance the particle by one frame.
    ///
    /// `index` is this particle's place in `population`, so that it doesn't act on itself. Every
    /// other particle in `population` pushes on this one, using whatever position it has in the
    /// slice right now. During a sequential tick that means neighbours earlier in the
    /// population have already moved this frame.
    pub fn act(&mut self, index: usize, population: &[Self], bounds: &Bounds) {
        let damping = self.parameters.damping;
        self.velocity.x *= damping;
        self.velocity.y += self.parameters.gravity;
        self.velocity.y *= damping;

        let mut offset = Vec2::ZERO;
        let mut reciprocal_sum = 0.0f32;
        for (other_index, other) in population.iter().enumerate() {
            if other_index == index {
                continue;
            }

            let delta = self.position - other.position;
            if let Some(contribution) = pair_contribution(delta, self.parameters.speed_scale) {
                reciprocal_sum += contribution.reciprocal_distance_pow4;
                offset += contribution.offset;
                self.velocity += contribution.velocity;
            }
        }

        self.velocity *= self.parameters.crowding_damp(reciprocal_sum);

        self.position += offset + self.velocity;
        bounds.reflect(&mut self.position, &mut self.velocity);
    }

    /// The velocity change that pushes this particle away from `point`, if it isn't right on top
    /// of it.
    #[expect(
        clippy::neg_cmp_op_on_partial_ord,
        reason = "A NaN distance must fail the check"
    )]
    fn point_force(&self, point: Vec2) -> Option<Vec2> {
        let delta = self.position - point;
        let squared_distance = delta.x * delta.x + delta.y * delta.y;
        if !(squared_distance > COINCIDENT_SQUARED_DISTANCE) {
            return None;
        }

        let distance_pow4 =
            squared_distance * (squared_distance * POINT_FORCE_FALLOFF / self.parameters.speed_scale);
        Some(Vec2::new(
            (delta.x / distance_pow4).clamp(-MAX_POINT_FORCE_VELOCITY, MAX_POINT_FORCE_VELOCITY),
            (delta.y / distance_pow4).clamp(-MAX_POINT_FORCE_VELOCITY, MAX_POINT_FORCE_VELOCITY),
        ))
    }

    /// Pull the particle towards a point.
    pub fn drain(&mut self, point: Vec2) {
        if let Some(push) = self.point_force(point) {
            self.velocity -= push;
        }
    }

    /// Push the particle away from a point.
    pub fn repel(&mut self, point: Vec2) {
        if let Some(push) = self.point_force(point) {
            self.velocity += push;
        }
    }
}

#[cfg(test)]
#[expect(
    clippy::float_cmp,
    clippy::indexing_slicing,
    clippy::unwrap_used,
    clippy::default_numeric_fallback,
    reason = "Tests aren't so strict"
)]
mod test {
    use rand::{Rng as _, SeedableRng as _};

    use super::*;

    const WATER: Colour = (0.1, 0.8, 0.9);

    fn bounds() -> Bounds {
        Bounds::new(800.0, 600.0)
    }

    fn water() -> Parameters {
        Parameters::new(0.995, 0.85, 0.12, WATER).unwrap()
    }

    fn particle_at(x: f32, y: f32, parameters: Parameters) -> Particle {
        Particle::new(Vec2::new(x, y), Vec2::ZERO, parameters)
    }

    #[test]
    fn extra_damp_limit_is_derived_from_damping() {
        let parameters = Parameters::new(0.95, 0.8, 0.35, (0.9, 0.1, 0.0)).unwrap();
        assert_eq!(parameters.extra_damp_limit(), 0.95 * 0.4);
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(matches!(
            Parameters::new(0.0, 1.0, 0.1, WATER),
            Err(FluidError::InvalidDamping { .. })
        ));
        assert!(matches!(
            Parameters::new(1.01, 1.0, 0.1, WATER),
            Err(FluidError::InvalidDamping { .. })
        ));
        assert!(matches!(
            Parameters::new(0.9, -1.0, 0.1, WATER),
            Err(FluidError::InvalidSpeedScale { .. })
        ));
        assert!(matches!(
            Parameters::new(0.9, 1.0, f32::NAN, WATER),
            Err(FluidError::NonFiniteGravity { .. })
        ));
        assert!(matches!(
            Parameters::new(0.9, 1.0, 0.1, (1.5, 0.0, 0.0)),
            Err(FluidError::InvalidColour { .. })
        ));
        assert!(Parameters::new(1.0, 1.0, 0.0, WATER).is_ok());
    }

    #[test]
    fn coincident_neighbour_only_gets_damping_and_gravity() {
        let population = [
            particle_at(100.0, 100.0, water()),
            particle_at(101.0, 100.0, water()),
        ];
        let mut particle = population[0];
        particle.act(0, &population, &bounds());

        let expected_vy = (0.0 + 0.12f32) * 0.995;
        assert_eq!(particle.velocity(), Vec2::new(0.0, expected_vy));
        assert_eq!(particle.position(), Vec2::new(100.0, 100.0 + expected_vy));
    }

    #[test]
    fn skips_pairs_at_or_below_one_squared_pixel() {
        assert_eq!(pair_contribution(Vec2::new(1.0, 0.0), 1.0), None);
        assert_eq!(pair_contribution(Vec2::new(0.6, 0.6), 1.0), None);
        assert_eq!(pair_contribution(Vec2::ZERO, 1.0), None);
        assert!(pair_contribution(Vec2::new(1.01, 0.0), 1.0).is_some());
    }

    #[test]
    fn pair_contributions_are_always_clamped() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        for _ in 0..10_000 {
            let delta = Vec2::new(rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0));
            let speed_scale = rng.gen_range(0.1..5.0);
            let Some(contribution) = pair_contribution(delta, speed_scale) else {
                continue;
            };
            assert!(contribution.offset.x.abs() <= MAX_PAIR_OFFSET);
            assert!(contribution.offset.y.abs() <= MAX_PAIR_OFFSET);
            assert!(contribution.velocity.x.abs() <= MAX_PAIR_VELOCITY);
            assert!(contribution.velocity.y.abs() <= MAX_PAIR_VELOCITY);
        }
    }

    #[test]
    fn point_forces_are_always_clamped() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        for _ in 0..10_000 {
            let point = Vec2::new(rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0));
            let particle = particle_at(0.0, 0.0, water());
            if let Some(push) = particle.point_force(point) {
                assert!(push.x.abs() <= MAX_POINT_FORCE_VELOCITY);
                assert!(push.y.abs() <= MAX_POINT_FORCE_VELOCITY);
            }
        }
    }

    #[test]
    fn neighbour_below_pushes_upwards() {
        let contribution = pair_contribution(Vec2::new(0.0, -3.0), 1.0).unwrap();
        assert!(contribution.offset.y < 0.0);
        assert!(contribution.velocity.y < 0.0);
        assert_eq!(contribution.offset.x, 0.0);
    }

    #[test]
    fn crowding_damp_never_goes_below_limit() {
        let parameters = water();
        for reciprocal_sum in [0.0, 1e-6, 1e-3, 1.0, 1e6, f32::MAX] {
            assert!(parameters.crowding_damp(reciprocal_sum) >= parameters.extra_damp_limit());
        }
        assert_eq!(parameters.crowding_damp(0.0), 1.0);
        assert_eq!(parameters.crowding_damp(1e6), 0.995 * 0.4);
    }

    #[test]
    fn lonely_particle_comes_to_rest() {
        let parameters = Parameters::new(0.9, 1.0, 0.0, WATER).unwrap();
        let mut particle =
            Particle::new(Vec2::new(400.0, 300.0), Vec2::new(5.0, -3.0), parameters);
        let population = [particle];
        for _ in 0..500 {
            particle.act(0, &population, &bounds());
        }
        let previous = particle.position();
        particle.act(0, &population, &bounds());

        assert!(particle.velocity().length() < 1e-6);
        assert!(particle.position().distance(previous) < 1e-6);
        assert!((particle.position().x - 445.0).abs() < 0.01);
        assert!((particle.position().y - 273.0).abs() < 0.01);
    }

    #[test]
    fn drain_and_repel_are_exact_opposites() {
        let point = Vec2::new(120.0, 80.0);
        let start = Particle::new(Vec2::new(100.0, 100.0), Vec2::new(0.3, -0.2), water());

        let mut drained = start;
        drained.drain(point);
        let mut repelled = start;
        repelled.repel(point);

        let drain_delta = drained.velocity() - start.velocity();
        let repel_delta = repelled.velocity() - start.velocity();
        assert_eq!(drain_delta, -repel_delta);
        assert_ne!(drain_delta, Vec2::ZERO);
        assert_eq!(drained.position(), start.position());
    }

    #[test]
    fn drain_pulls_towards_the_point() {
        let mut particle = particle_at(100.0, 100.0, water());
        particle.drain(Vec2::new(110.0, 100.0));
        assert!(particle.velocity().x > 0.0);
        assert_eq!(particle.velocity().y, 0.0);
    }

    #[test]
    fn point_force_ignores_coincident_point() {
        let mut particle = particle_at(100.0, 100.0, water());
        particle.repel(Vec2::new(100.5, 100.5));
        assert_eq!(particle.velocity(), Vec2::ZERO);
    }

    #[test]
    fn distance_that_is_not_a_number_exerts_no_force() {
        assert_eq!(pair_contribution(Vec2::new(f32::NAN, 3.0), 1.0), None);

        let mut particle = particle_at(100.0, 100.0, water());
        particle.drain(Vec2::new(f32::NAN, 100.0));
        particle.repel(Vec2::new(50.0, f32::NAN));
        assert_eq!(particle.velocity(), Vec2::ZERO);
    }

    #[test]
    fn render_data_is_position_and_colour() {
        let particle = particle_at(12.0, 34.0, water());
        assert_eq!(particle.render_data(), (12.0, 34.0, 0.1, 0.8, 0.9));
    }
}
