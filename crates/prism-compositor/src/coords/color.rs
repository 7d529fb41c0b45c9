/// RGBA color with straight alpha.
///
/// The encoding (sRGB or linear) is decided by the caller; conversions are
/// explicit.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);

    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates a color from sRGB bytes (`0`–`255`).
    #[inline]
    pub fn from_srgb_u8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, a as f32 / 255.0)
    }

    /// Decodes sRGB-encoded rgb into linear; alpha is untouched.
    pub fn srgb_to_linear(self) -> Self {
        fn channel(c: f32) -> f32 {
            if c < 0.04045 {
                c * (1.0 / 12.92)
            } else {
                ((c + 0.055) * (1.0 / 1.055)).powf(2.4)
            }
        }
        Self::new(channel(self.r), channel(self.g), channel(self.b), self.a)
    }

    /// Multiplies rgb by `factor`, leaving alpha.
    #[inline]
    pub fn scaled_rgb(self, factor: f32) -> Self {
        Self::new(self.r * factor, self.g * factor, self.b * factor, self.a)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}
