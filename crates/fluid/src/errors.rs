//! Errors for this library
//
// The physics itself can't fail. These are only for validating the parameters that a spawner
// hands us, so that a bad config is caught before it turns into NaNs.

/// All the known errors returned by this crate.
#[derive(Debug, snafu::Snafu)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum FluidError {
    #[snafu(display("Damping coefficient must be in the range (0, 1], got: {damping}"))]
    /// Damping of 0 freezes a particle and anything above 1 makes it accelerate forever.
    InvalidDamping {
        /// The rejected damping coefficient
        damping: f32,
    },

    #[snafu(display("Speed scale must be finite and greater than 0, got: {speed_scale}"))]
    /// The speed scale divides the force falloff, so it can't be zero or negative.
    InvalidSpeedScale {
        /// The rejected speed scale
        speed_scale: f32,
    },

    #[snafu(display("Gravity must be a finite number, got: {gravity}"))]
    /// Gravity is added to the velocity every frame.
    NonFiniteGravity {
        /// The rejected gravity
        gravity: f32,
    },

    #[snafu(display("Colour channels must be in the range [0, 1], got: {colour:?}"))]
    /// Colours are only used for rendering, but a renderer shouldn't have to check them.
    InvalidColour {
        /// The rejected colour
        colour: crate::particle::Colour,
    },

    #[snafu(display("Unknown step mode: '{name}', expected 'sequential' or 'snapshot'"))]
    /// When parsing a [`crate::population::StepMode`] from a string.
    UnknownStepMode {
        /// The name that didn't match any step mode
        name: String,
    },
}
