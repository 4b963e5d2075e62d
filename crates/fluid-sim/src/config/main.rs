//! All of the user config.

use color_eyre::eyre::ContextCompat as _;
use color_eyre::eyre::Result;

use fluid::bounds::Bounds;
use fluid::population::{PointForceKind, StepMode};

use crate::cli_args::CliArgs;
use crate::presets::Preset;

/// A copy of the default config file. It's also what's used when no config file is given.
pub static DEFAULT_CONFIG: &str = include_str!("../../default_config.toml");

/// The valid log levels. Based on our `tracing` crate.
#[derive(serde::Deserialize, clap::ValueEnum, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Error
    Error,
    /// Warnings
    Warn,
    /// Info
    Info,
    /// Debug
    Debug,
    /// Trace
    Trace,
    /// No logging
    Off,
}

/// Managing user config.
#[derive(serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
#[non_exhaustive]
pub struct Config {
    /// Width of the screen in pixels
    pub width: u32,
    /// Height of the screen in pixels
    pub height: u32,
    /// Which fluids to pour in
    pub preset: Preset,
    /// How particles see each other during a frame
    pub step_mode: StepMode,
    /// How many frames to simulate
    pub frames: u64,
    /// Target frame rate
    pub frame_rate: u32,
    /// Whether to pace the simulation to the frame rate
    pub realtime: bool,
    /// Seed for the random spawn velocities. `None` seeds from the OS.
    pub seed: Option<u64>,
    /// The maximum log level
    pub log_level: LogLevel,
    /// The location of the log file.
    pub log_path: std::path::PathBuf,
    /// Rendering frames to PNGs
    pub render: Render,
    /// Scripted points that drain or repel the fluid
    pub pointer: Vec<PointerEvent>,
}

impl Default for Config {
    fn default() -> Self {
        let log_directory = match dirs::state_dir() {
            Some(directory) => directory,
            None => std::path::PathBuf::new().join("./"),
        };
        let log_path = log_directory.join("fluid-sim").join("fluid-sim.log");

        Self {
            width: 800,
            height: 600,
            preset: Preset::default(),
            step_mode: StepMode::default(),
            frames: 600,
            frame_rate: 60,
            realtime: false,
            seed: None,
            log_level: LogLevel::Off,
            log_path,
            render: Render::default(),
            pointer: Vec::default(),
        }
    }
}

/// Config for writing metaball frames.
#[derive(serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Render {
    /// Whether to render at all
    pub enabled: bool,
    /// Only every nth frame is rendered
    pub every: u64,
    /// Where the PNGs go
    pub output_directory: std::path::PathBuf,
    /// Half the width of the square sprite drawn for each particle
    pub sprite_half_size: f32,
    /// Resolution of the generated sprite texture
    pub texture_size: u32,
    /// How much the glow around the fluid is darkened
    pub glow_dim: f32,
    /// Pixels with more alpha than this are the fluid's surface
    pub alpha_threshold: f32,
}

impl Default for Render {
    fn default() -> Self {
        Self {
            enabled: true,
            every: 10,
            output_directory: "frames".into(),
            sprite_half_size: 160.0,
            texture_size: 128,
            glow_dim: 0.7,
            alpha_threshold: 0.85,
        }
    }
}

/// A point that drains or repels the fluid over a range of frames. It stands in for holding a
/// mouse button down.
#[derive(serde::Deserialize, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct PointerEvent {
    /// Pull or push
    pub action: PointForceKind,
    /// Horizontal position of the pointer
    pub x: f32,
    /// Vertical position of the pointer
    pub y: f32,
    /// First frame that the pointer is active, inclusive
    pub start_frame: u64,
    /// Last frame that the pointer is active, inclusive
    pub end_frame: u64,
}

impl PointerEvent {
    /// Instantiate
    #[must_use]
    pub const fn new(action: PointForceKind, x: f32, y: f32, frames: (u64, u64)) -> Self {
        Self {
            action,
            x,
            y,
            start_frame: frames.0,
            end_frame: frames.1,
        }
    }

    /// Whether the pointer is held down during the given frame.
    #[must_use]
    pub const fn is_active(&self, frame: u64) -> bool {
        self.start_frame <= frame && frame <= self.end_frame
    }
}

impl Config {
    /// Load config from a TOML file, or use the shipped defaults when there's no file.
    pub fn load(maybe_path: Option<&std::path::Path>) -> Result<Self> {
        let Some(path) = maybe_path else {
            return Self::parse(DEFAULT_CONFIG);
        };

        tracing::info!("Loading config from: {path:?}");
        let result = std::fs::read_to_string(path);
        match result {
            Ok(data) => {
                tracing::trace!("Using config file:\n{data}");
                Self::parse(&data)
            }
            Err(err) => {
                tracing::error!("Loading config: {err:?}");
                color_eyre::eyre::bail!("Couldn't load config at {path:?}: {}", err.to_string());
            }
        }
    }

    /// Parse and validate a TOML config.
    pub fn parse(data: &str) -> Result<Self> {
        let config = toml::from_str::<Self>(data)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the config file named by the CLI and apply the CLI's overrides to it.
    pub fn from_cli_args(cli_args: &CliArgs) -> Result<Self> {
        let mut config = Self::load(cli_args.config.as_deref())?;
        config.apply_cli_args(cli_args);
        config.validate()?;
        Ok(config)
    }

    /// Settings from the CLI take precedence over the config file.
    pub fn apply_cli_args(&mut self, cli_args: &CliArgs) {
        if let Some(preset) = cli_args.preset {
            self.preset = preset;
        }
        if let Some(frames) = cli_args.frames {
            self.frames = frames;
        }
        if let Some(step_mode) = cli_args.step_mode {
            self.step_mode = step_mode;
        }
        if cli_args.seed.is_some() {
            self.seed = cli_args.seed;
        }
        if let Some(output_directory) = &cli_args.output_directory {
            self.render.output_directory.clone_from(output_directory);
        }
        if cli_args.no_render {
            self.render.enabled = false;
        }
        if cli_args.realtime {
            self.realtime = true;
        }
        if let Some(log_level) = &cli_args.log_level {
            self.log_level = log_level.clone();
        }
        if let Some(log_path) = &cli_args.log_path {
            self.log_path.clone_from(log_path);
        }
    }

    /// Catch settings that would break the simulation or the renderer.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            color_eyre::eyre::bail!(
                "Screen size must not be zero, got {}x{}",
                self.width,
                self.height
            );
        }
        if self.frame_rate == 0 {
            color_eyre::eyre::bail!("Frame rate must be at least 1");
        }
        if self.render.every == 0 {
            color_eyre::eyre::bail!("`render.every` must be at least 1");
        }
        if self.render.texture_size == 0 {
            color_eyre::eyre::bail!("`render.texture_size` must be at least 1");
        }
        if !(self.render.sprite_half_size.is_finite() && self.render.sprite_half_size > 0.0) {
            color_eyre::eyre::bail!(
                "`render.sprite_half_size` must be greater than 0, got {}",
                self.render.sprite_half_size
            );
        }
        if !(0.0..=1.0).contains(&self.render.glow_dim) {
            color_eyre::eyre::bail!(
                "`render.glow_dim` must be in the range [0, 1], got {}",
                self.render.glow_dim
            );
        }
        if !(0.0..=1.0).contains(&self.render.alpha_threshold) {
            color_eyre::eyre::bail!(
                "`render.alpha_threshold` must be in the range [0, 1], got {}",
                self.render.alpha_threshold
            );
        }

        let backwards_pointer = self
            .pointer
            .iter()
            .find(|event| event.start_frame > event.end_frame);
        if let Some(event) = backwards_pointer {
            color_eyre::eyre::bail!(
                "Pointer event ends (frame {}) before it starts (frame {})",
                event.end_frame,
                event.start_frame
            );
        }

        let lost_pointer = self
            .pointer
            .iter()
            .find(|event| !(event.x.is_finite() && event.y.is_finite()));
        if let Some(event) = lost_pointer {
            color_eyre::eyre::bail!(
                "Pointer event position must be finite, got ({}, {})",
                event.x,
                event.y
            );
        }

        Ok(())
    }

    /// The screen edges that particles bounce off.
    #[expect(
        clippy::as_conversions,
        clippy::cast_precision_loss,
        reason = "Screen sizes are far smaller than f32's exact integer range"
    )]
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.width as f32, self.height as f32)
    }

    /// The directory that log files are written to.
    pub fn log_directory(&self) -> Result<&std::path::Path> {
        self.log_path
            .parent()
            .context("Couldn't get log path's parent")
    }
}

#[cfg(test)]
#[expect(
    clippy::float_cmp,
    clippy::indexing_slicing,
    clippy::unwrap_used,
    reason = "Tests aren't so strict"
)]
mod test {
    use super::*;

    #[test]
    fn shipped_config_matches_defaults() {
        let shipped = Config::parse(DEFAULT_CONFIG).unwrap();
        assert_eq!(shipped, Config::default());
    }

    #[test]
    fn no_config_file_means_defaults() {
        assert_eq!(Config::load(None).unwrap(), Config::default());
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let config = Config::parse(
            r#"
            preset = "three_fluids"
            step_mode = "snapshot"
            seed = 99

            [render]
            every = 2

            [[pointer]]
            action = "drain"
            x = 400.0
            y = 500.0
            start_frame = 10
            end_frame = 20

            [[pointer]]
            action = "repel"
            x = 100.0
            y = 100.0
            start_frame = 15
            end_frame = 15
            "#,
        )
        .unwrap();

        assert_eq!(config.preset, Preset::ThreeFluids);
        assert_eq!(config.step_mode, StepMode::Snapshot);
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.render.every, 2);
        assert_eq!(config.render.alpha_threshold, 0.85);
        assert_eq!(config.width, 800);
        assert_eq!(config.pointer.len(), 2);
        assert_eq!(
            config.pointer[1],
            PointerEvent::new(PointForceKind::Repel, 100.0, 100.0, (15, 15))
        );
    }

    #[test]
    fn load_from_file() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("fluid.toml");
        std::fs::write(&path, "width = 320\nheight = 240\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.bounds(), Bounds::new(320.0, 240.0));
    }

    #[test]
    fn missing_file_is_an_error() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("nope.toml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Config::parse("width = 0").is_err());
        assert!(Config::parse("frame_rate = 0").is_err());
        assert!(Config::parse("[render]\nevery = 0").is_err());
        assert!(Config::parse("[render]\nalpha_threshold = 1.5").is_err());
        assert!(Config::parse("step_mode = \"double_buffered\"").is_err());
        let backwards = r#"
            [[pointer]]
            action = "repel"
            x = 1.0
            y = 1.0
            start_frame = 20
            end_frame = 10
        "#;
        let error = Config::parse(backwards).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Pointer event ends (frame 10) before it starts (frame 20)"
        );
    }

    #[test]
    fn rejects_pointer_positions_that_are_not_finite() {
        for (x, y) in [("nan", "1.0"), ("1.0", "inf"), ("-inf", "1.0")] {
            let pointer = format!(
                "[[pointer]]\naction = \"drain\"\nx = {x}\ny = {y}\nstart_frame = 1\nend_frame = 2"
            );
            let error = Config::parse(&pointer).unwrap_err();
            assert!(
                error.to_string().starts_with("Pointer event position must be finite"),
                "{error}"
            );
        }
    }

    #[test]
    fn cli_args_override_config() {
        let cli_args = CliArgs {
            preset: Some(Preset::Lava),
            frames: Some(5),
            step_mode: Some(StepMode::Snapshot),
            seed: Some(3),
            output_directory: Some("elsewhere".into()),
            no_render: true,
            realtime: true,
            log_level: Some(LogLevel::Debug),
            log_path: Some("/tmp/fluid.log".into()),
            ..CliArgs::default()
        };
        let mut config = Config::default();
        config.apply_cli_args(&cli_args);

        assert_eq!(config.preset, Preset::Lava);
        assert_eq!(config.frames, 5);
        assert_eq!(config.step_mode, StepMode::Snapshot);
        assert_eq!(config.seed, Some(3));
        assert_eq!(config.render.output_directory, std::path::PathBuf::from("elsewhere"));
        assert!(!config.render.enabled);
        assert!(config.realtime);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.log_path, std::path::PathBuf::from("/tmp/fluid.log"));
    }

    #[test]
    fn pointer_frames_are_inclusive() {
        let event = PointerEvent::new(PointForceKind::Drain, 0.0, 0.0, (3, 5));
        assert!(!event.is_active(2));
        assert!(event.is_active(3));
        assert!(event.is_active(5));
        assert!(!event.is_active(6));
    }
}
