//! The procedurally generated sprite that every particle is drawn with.
//!
//! It's a circular glow: fully bright in the middle and falling off with the inverse of the
//! distance from the centre. The same value is used for brightness and alpha.

/// How sharply the glow falls off with distance. Scaled by the texture size.
const FALLOFF: f32 = 16.0;

/// Subtracted from every texel so that the glow reaches zero before the edges of the sprite.
const FLOOR: f32 = 32.0;

/// A square greyscale glow sprite.
#[derive(Debug, Clone)]
pub struct SpriteTexture {
    /// One byte per texel
    image: image::GrayImage,
}

impl SpriteTexture {
    /// Generate the sprite at the given resolution.
    #[must_use]
    pub fn new(size: u32) -> Self {
        let image = image::GrayImage::from_fn(size, size, |column, row| {
            image::Luma([Self::texel_value(size, column, row)])
        });
        Self { image }
    }

    /// The brightness of a single texel.
    #[expect(
        clippy::as_conversions,
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "Texture sizes are small and the value is range-checked before the cast"
    )]
    fn texel_value(size: u32, column: u32, row: u32) -> u8 {
        let size_f32 = size as f32;
        let centre = size_f32 / 2.0;
        let dx = column as f32 - centre;
        let dy = row as f32 - centre;
        let distance = (dx * dx + dy * dy).sqrt();

        // The centre texel divides by zero, which is just infinitely bright.
        let value = FALLOFF / distance * size_f32 - FLOOR;
        if value < 0.0 {
            0
        } else if value >= 256.0 {
            u8::MAX
        } else {
            value as u8
        }
    }

    /// The texture's width and height.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.image.width()
    }

    /// Sample the texture at normalised coordinates, where `[0, 0]` is the top-left corner and
    /// `[1, 1]` is the bottom-right. Returns a value in `0.0..=1.0`, or `None` when the
    /// coordinates are outside the texture.
    ///
    /// Samples are bilinearly filtered between texel centres and clamped at the edges, so a
    /// sprite drawn bigger than the texture stays smooth.
    #[expect(
        clippy::as_conversions,
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "The coordinates are range-checked before the cast"
    )]
    #[must_use]
    pub fn sample(&self, u: f32, v: f32) -> Option<f32> {
        if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
            return None;
        }

        let size = self.size();
        let last = size.saturating_sub(1);
        let x = (u * size as f32 - 0.5).max(0.0);
        let y = (v * size as f32 - 0.5).max(0.0);
        let x_weight = x.fract();
        let y_weight = y.fract();

        let column = (x as u32).min(last);
        let row = (y as u32).min(last);
        let next_column = column.saturating_add(1).min(last);
        let next_row = row.saturating_add(1).min(last);

        let top = lerp(
            self.texel(column, row)?,
            self.texel(next_column, row)?,
            x_weight,
        );
        let bottom = lerp(
            self.texel(column, next_row)?,
            self.texel(next_column, next_row)?,
            x_weight,
        );
        Some(lerp(top, bottom, y_weight))
    }

    /// A single texel, in `0.0..=1.0`.
    fn texel(&self, column: u32, row: u32) -> Option<f32> {
        let image::Luma([value]) = *self.image.get_pixel_checked(column, row)?;
        Some(f32::from(value) / f32::from(u8::MAX))
    }
}

/// Linear interpolation from `from` to `to`.
fn lerp(from: f32, to: f32, weight: f32) -> f32 {
    (to - from).mul_add(weight, from)
}

#[cfg(test)]
#[expect(
    clippy::float_cmp,
    clippy::unwrap_used,
    reason = "Tests aren't so strict"
)]
mod test {
    use super::*;

    #[test]
    fn centre_is_fully_bright() {
        let texture = SpriteTexture::new(128);
        assert_eq!(texture.size(), 128);
        assert_eq!(SpriteTexture::texel_value(128, 64, 64), 255);
        assert_eq!(texture.sample(0.5, 0.5).unwrap(), 1.0);
    }

    #[test]
    fn corners_are_dark() {
        let texture = SpriteTexture::new(128);
        assert_eq!(texture.sample(0.0, 0.0).unwrap(), 0.0);
        assert_eq!(texture.sample(0.999, 0.999).unwrap(), 0.0);
    }

    #[test]
    fn falls_off_with_inverse_distance() {
        assert_eq!(SpriteTexture::texel_value(128, 72, 64), 224);
        assert_eq!(SpriteTexture::texel_value(128, 64, 72), 224);
        assert_eq!(SpriteTexture::texel_value(128, 64, 128 - 1), 0);
        assert!(
            SpriteTexture::texel_value(128, 80, 64) < SpriteTexture::texel_value(128, 72, 64)
        );
    }

    #[test]
    fn samples_blend_between_texels() {
        let texture = SpriteTexture::new(16);
        let centre = f32::from(SpriteTexture::texel_value(16, 8, 8)) / 255.0;
        let beside = f32::from(SpriteTexture::texel_value(16, 9, 8)) / 255.0;
        assert_eq!(centre, 1.0);
        assert_eq!(beside, 224.0 / 255.0);

        // Right on a texel's centre is exactly that texel.
        assert_eq!(texture.sample(8.5 / 16.0, 8.5 / 16.0).unwrap(), centre);
        assert_eq!(texture.sample(9.5 / 16.0, 8.5 / 16.0).unwrap(), beside);

        // Halfway between two texel centres is their average.
        let halfway = texture.sample(9.0 / 16.0, 8.5 / 16.0).unwrap();
        assert!((halfway - (centre + beside) / 2.0).abs() < 1e-6, "{halfway}");
    }

    #[test]
    fn outside_the_texture_is_none() {
        let texture = SpriteTexture::new(16);
        assert_eq!(texture.sample(-0.1, 0.5), None);
        assert_eq!(texture.sample(0.5, 1.0), None);
    }
}
