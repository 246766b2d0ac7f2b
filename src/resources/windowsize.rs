//! Window size resource.
//!
//! Tracks the actual window dimensions in pixels. The main loop refreshes it
//! every frame from raylib; the playlist rescales its states whenever it
//! differs from the viewport they were last scaled for.

use bevy_ecs::prelude::Resource;

/// Current window size in pixels.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    /// Width in pixels.
    pub w: i32,
    /// Height in pixels.
    pub h: i32,
}

impl WindowSize {
    /// The window size as a viewport; negative sizes clamp to zero.
    pub fn viewport(&self) -> (u32, u32) {
        (self.w.max(0) as u32, self.h.max(0) as u32)
    }

    /// Top-left corner that centers a `width` x `height` picture in the window.
    pub fn centered(&self, width: u32, height: u32) -> (i32, i32) {
        ((self.w - width as i32) / 2, (self.h - height as i32) / 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centers_narrow_picture() {
        let window = WindowSize { w: 800, h: 600 };
        assert_eq!(window.centered(300, 600), (250, 0));
        assert_eq!(window.centered(800, 400), (0, 100));
    }

    #[test]
    fn viewport_clamps_negative_sizes() {
        let window = WindowSize { w: -1, h: 10 };
        assert_eq!(window.viewport(), (0, 10));
    }
}
