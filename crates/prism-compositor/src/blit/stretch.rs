use crate::coords::{Rect, Vec2};

/// How the boot image is fitted to the window.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum SplashStretchMode {
    /// Native size, centered on whole pixels.
    Disabled,
    /// Fit inside the window preserving aspect (letterbox/pillarbox).
    #[default]
    Keep,
    /// Match the window width, preserving aspect.
    KeepWidth,
    /// Match the window height, preserving aspect.
    KeepHeight,
    /// Fill the window preserving aspect; overflow is cropped.
    Cover,
    /// Stretch to the full window.
    Ignore,
}

/// Destination rect of an `image_size` image in a `window_size` window,
/// in pixels.
pub fn stretched_screen_rect(image_size: Vec2, window_size: Vec2, mode: SplashStretchMode) -> Rect {
    if image_size.x <= 0.0 || image_size.y <= 0.0 {
        return Rect::default();
    }

    let centered = |size: Vec2| Rect::from_position_size((window_size - size) / 2.0, size);

    match mode {
        SplashStretchMode::Disabled => {
            Rect::from_position_size(((window_size - image_size) / 2.0).floor(), image_size)
        }
        SplashStretchMode::Keep => {
            let scale = (window_size.x / image_size.x).min(window_size.y / image_size.y);
            centered(image_size * scale)
        }
        SplashStretchMode::KeepWidth => {
            centered(image_size * (window_size.x / image_size.x))
        }
        SplashStretchMode::KeepHeight => {
            centered(image_size * (window_size.y / image_size.y))
        }
        SplashStretchMode::Cover => {
            let scale = (window_size.x / image_size.x).max(window_size.y / image_size.y);
            centered(image_size * scale)
        }
        SplashStretchMode::Ignore => Rect::from_position_size(Vec2::splat(0.0), window_size),
    }
}
