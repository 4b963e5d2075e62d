//! Render particles as a liquid using a software metaball effect.
//!
//! Every particle is drawn as an additively blended glow sprite. Where lots of glows overlap the
//! alpha gets high, and those pixels become the solid surface of the fluid. Everything else is
//! darkened, leaving a faint glow around the fluid.
//!
//! Each pass:
//!   1. Clear to black and add up all the sprites. Channels saturate at 1.0.
//!   2. Keep a copy of that.
//!   3. Darken the whole frame by `glow_dim`.
//!   4. Redraw the copy, but only where its alpha is above `alpha_threshold`.

use color_eyre::eyre::Result;

use fluid::particle::Particle;

use crate::config::main::Config;
use crate::render::texture::SpriteTexture;

/// Additive RGBA, one per pixel, channels in `0.0..=1.0`.
type Accumulated = [f32; 4];

/// Draws particles into an image.
#[derive(Debug, Clone)]
pub struct MetaballRenderer {
    /// Width of the output image
    width: u32,
    /// Height of the output image
    height: u32,
    /// The glow drawn for every particle
    texture: SpriteTexture,
    /// Half the width of the square sprite
    sprite_half_size: f32,
    /// How much the glow is darkened
    glow_dim: f32,
    /// Pixels with more alpha than this are the fluid's surface
    alpha_threshold: f32,
    /// Reused between frames, one entry per pixel in row-major order
    accumulation: Vec<Accumulated>,
}

impl MetaballRenderer {
    /// Instantiate from the user's config.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let pixel_count = usize::try_from(u64::from(config.width) * u64::from(config.height))
            .unwrap_or_default();

        Self {
            width: config.width,
            height: config.height,
            texture: SpriteTexture::new(config.render.texture_size),
            sprite_half_size: config.render.sprite_half_size,
            glow_dim: config.render.glow_dim,
            alpha_threshold: config.render.alpha_threshold,
            accumulation: vec![[0.0; 4]; pixel_count],
        }
    }

    /// Draw all the particles and composite them into a metaball frame.
    pub fn render(&mut self, particles: &[Particle]) -> image::RgbImage {
        self.accumulation.fill([0.0; 4]);
        for particle in particles {
            self.draw_sprite(particle);
        }

        let mut frame = image::RgbImage::new(self.width, self.height);
        for (pixel, accumulated) in frame.pixels_mut().zip(&self.accumulation) {
            *pixel = self.composite(*accumulated);
        }
        frame
    }

    /// Render and save a frame as a PNG.
    pub fn save(
        &mut self,
        particles: &[Particle],
        directory: &std::path::Path,
        frame: u64,
    ) -> Result<std::path::PathBuf> {
        let path = directory.join(format!("frame-{frame:06}.png"));
        self.render(particles).save(&path)?;
        tracing::debug!("Saved frame to {path:?}");
        Ok(path)
    }

    /// The final colour of a single pixel.
    fn composite(&self, accumulated: Accumulated) -> image::Rgb<u8> {
        let [red, green, blue, alpha] = accumulated;
        let multiplier = if alpha > self.alpha_threshold {
            alpha
        } else {
            1.0 - self.glow_dim
        };

        let colour = palette::Srgb::new(red * multiplier, green * multiplier, blue * multiplier)
            .into_format::<u8>();
        image::Rgb([colour.red, colour.green, colour.blue])
    }

    /// Additively draw one particle's glow into the accumulation buffer.
    #[expect(
        clippy::as_conversions,
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "Pixel coordinates are clamped to the screen before casting"
    )]
    fn draw_sprite(&mut self, particle: &Particle) {
        let (x, y, red, green, blue) = particle.render_data();
        let half = self.sprite_half_size;
        let size = half * 2.0;
        let left = x - half;
        let top = y - half;

        let width = self.width as f32;
        let height = self.height as f32;
        let first_column = left.floor().clamp(0.0, width) as usize;
        let last_column = (x + half).ceil().clamp(0.0, width) as usize;
        let first_row = top.floor().clamp(0.0, height) as usize;
        let last_row = (y + half).ceil().clamp(0.0, height) as usize;
        let row_length = self.width as usize;

        for row in first_row..last_row {
            let v = (row as f32 + 0.5 - top) / size;
            for column in first_column..last_column {
                let u = (column as f32 + 0.5 - left) / size;
                let Some(texel) = self.texture.sample(u, v) else {
                    continue;
                };
                if texel <= 0.0 {
                    continue;
                }

                let Some(pixel) = self.accumulation.get_mut(row * row_length + column) else {
                    continue;
                };
                let [pixel_red, pixel_green, pixel_blue, pixel_alpha] = pixel;
                *pixel_red = (*pixel_red + red * texel).min(1.0);
                *pixel_green = (*pixel_green + green * texel).min(1.0);
                *pixel_blue = (*pixel_blue + blue * texel).min(1.0);
                *pixel_alpha = (*pixel_alpha + texel).min(1.0);
            }
        }
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests aren't so strict")]
mod test {
    use fluid::particle::Parameters;
    use glam::Vec2;

    use super::*;

    fn config() -> Config {
        let mut config = Config::default();
        config.width = 64;
        config.height = 48;
        config.render.sprite_half_size = 16.0;
        config.render.texture_size = 32;
        config
    }

    fn particle_at(x: f32, y: f32) -> Particle {
        let magenta = Parameters::new(0.99, 1.0, 0.1, (1.0, 0.0, 1.0)).unwrap();
        Particle::new(Vec2::new(x, y), Vec2::ZERO, magenta)
    }

    #[test]
    fn empty_frame_is_black() {
        let mut renderer = MetaballRenderer::new(&config());
        let frame = renderer.render(&[]);
        assert_eq!(frame.dimensions(), (64, 48));
        assert!(frame.pixels().all(|pixel| *pixel == image::Rgb([0, 0, 0])));
    }

    #[test]
    fn particle_core_is_solid_fluid() {
        let mut renderer = MetaballRenderer::new(&config());
        let frame = renderer.render(&[particle_at(32.0, 24.0)]);
        assert_eq!(*frame.get_pixel(32, 24), image::Rgb([255, 0, 255]));
    }

    #[test]
    fn glow_around_the_core_is_dimmed() {
        let mut renderer = MetaballRenderer::new(&config());
        let frame = renderer.render(&[particle_at(32.0, 24.0)]);
        let image::Rgb([red, green, _]) = *frame.get_pixel(32 + 8, 24);
        assert!(red > 0, "glow should still be visible");
        assert!(red < 255 / 3 + 1, "glow should be darkened, got {red}");
        assert_eq!(green, 0);
        assert_eq!(*frame.get_pixel(0, 0), image::Rgb([0, 0, 0]));
    }

    #[test]
    fn overlapping_glows_merge_into_fluid() {
        let mut renderer = MetaballRenderer::new(&config());
        let single = renderer.render(&[particle_at(29.0, 24.0)]);
        let pair = renderer.render(&[particle_at(29.0, 24.0), particle_at(35.0, 24.0)]);

        assert!(single.get_pixel(32, 24).0[0] < 255);
        assert_eq!(pair.get_pixel(32, 24).0[0], 255);
    }

    #[test]
    fn sprites_are_clipped_to_the_screen() {
        let mut renderer = MetaballRenderer::new(&config());
        let frame = renderer.render(&[particle_at(-5.0, 50.0), particle_at(70.0, -3.0)]);
        assert_eq!(frame.dimensions(), (64, 48));
    }

    #[test]
    fn save_writes_a_png() {
        let directory = tempfile::tempdir().unwrap();
        let mut renderer = MetaballRenderer::new(&config());
        let path = renderer
            .save(&[particle_at(32.0, 24.0)], directory.path(), 7)
            .unwrap();
        assert_eq!(path, directory.path().join("frame-000007.png"));
        let reloaded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(*reloaded.get_pixel(32, 24), image::Rgb([255, 0, 255]));
    }
}
