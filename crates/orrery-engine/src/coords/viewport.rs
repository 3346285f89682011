/// Drawable size in physical pixels.
///
/// Screen-sized render targets are allocated at exactly this size.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// wgpu rejects zero-sized textures; such a viewport must not be rendered.
    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Width over height; 1.0 for a degenerate viewport.
    #[inline]
    pub fn aspect(self) -> f32 {
        if self.is_valid() {
            self.width as f32 / self.height as f32
        } else {
            1.0
        }
    }

    /// Compute workgroup counts covering the viewport with `tile`×`tile` groups.
    #[inline]
    pub fn workgroups(self, tile: u32) -> (u32, u32) {
        (self.width.div_ceil(tile), self.height.div_ceil(tile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_of_wide_viewport() {
        assert_eq!(Viewport::new(1920, 1080).aspect(), 1920.0 / 1080.0);
    }

    #[test]
    fn zero_sized_is_invalid() {
        assert!(!Viewport::new(0, 720).is_valid());
        assert!(!Viewport::new(1280, 0).is_valid());
        assert_eq!(Viewport::new(0, 0).aspect(), 1.0);
    }

    #[test]
    fn workgroups_round_up() {
        assert_eq!(Viewport::new(1280, 720).workgroups(8), (160, 90));
        assert_eq!(Viewport::new(1281, 721).workgroups(8), (161, 91));
        assert_eq!(Viewport::new(1, 1).workgroups(8), (1, 1));
    }
}
