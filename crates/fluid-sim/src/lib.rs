//! Drives the particle fluid one frame at a time.
//!
//! Everything around the physics lives here: presets that pour fluid into the screen, a scripted
//! pointer that drains or repels it, frame pacing, and a software metaball renderer that writes
//! frames out as PNGs.

pub mod cli_args;
/// All the user-configurable settings.
pub mod config {
    pub mod main;
}
pub mod pacer;
pub mod pointer;
pub mod presets;
/// Turning particles into pictures.
pub mod render {
    pub mod metaballs;
    pub mod texture;
}
pub mod run;
pub mod spawner;
