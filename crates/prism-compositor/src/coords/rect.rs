use super::Vec2;

/// Axis-aligned rectangle (top-left origin).
///
/// Used both in pixels (destination rects) and in normalized texture space
/// (source rects); the type does not track which.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub position: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub const fn from_position_size(position: Vec2, size: Vec2) -> Self {
        Self { position, size }
    }

    /// The whole of a normalized texture.
    #[inline]
    pub const fn unit() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    /// Divides position and size by `extent`, mapping pixels into `[0, 1]`.
    #[inline]
    pub fn normalized_by(self, extent: Vec2) -> Self {
        Self {
            position: self.position / extent,
            size: self.size / extent,
        }
    }

    /// `[x, y, w, h]`, the layout push constants use.
    #[inline]
    pub const fn to_array(self) -> [f32; 4] {
        [self.position.x, self.position.y, self.size.x, self.size.y]
    }
}
