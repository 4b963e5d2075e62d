//! A 2D fluid approximated by point particles.
//!
//! The particles repel each other, fall under gravity and can be pushed around by external point
//! forces. Nothing here is physically accurate, the goal is something that looks like a liquid
//! at interactive frame rates once there are a few hundred particles.
//!
//! Spawning, rendering and input all belong to whoever drives the simulation. A frame looks
//! like:
//!   1. Push any new [`particle::Particle`]s onto the [`population::Population`].
//!   2. Call [`population::Population::tick`] with the screen [`bounds::Bounds`] and whatever
//!      [`population::PointForce`]s are active this frame.
//!   3. Read the particles back out for drawing.

pub mod bounds;
pub mod errors;
pub mod particle;
pub mod population;
