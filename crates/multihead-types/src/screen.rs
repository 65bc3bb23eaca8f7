//! Screen geometry and the global canvas.

use serde::{Deserialize, Serialize};

/// Placement of one physical display within the global coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenDescriptor {
    /// Position in the screen registry.
    pub index: usize,
    /// X offset of the screen's root window in global coordinates.
    pub origin_x: i32,
    /// Y offset of the screen's root window in global coordinates.
    pub origin_y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ScreenDescriptor {
    #[must_use]
    pub fn new(index: usize, origin_x: i32, origin_y: i32, width: u32, height: u32) -> Self {
        Self {
            index,
            origin_x,
            origin_y,
            width,
            height,
        }
    }

    /// One past the right-most column, in global coordinates.
    #[must_use]
    pub fn right(&self) -> i32 {
        self.origin_x
            .saturating_add(i32::try_from(self.width).unwrap_or(i32::MAX))
    }

    /// One past the bottom-most row, in global coordinates.
    #[must_use]
    pub fn bottom(&self) -> i32 {
        self.origin_y
            .saturating_add(i32::try_from(self.height).unwrap_or(i32::MAX))
    }

    /// Check whether a global coordinate falls on this screen.
    #[must_use]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.origin_x && x < self.right() && y >= self.origin_y && y < self.bottom()
    }

    /// Translate a global coordinate into this screen's local space.
    #[must_use]
    pub fn to_local(&self, x: i32, y: i32) -> (i32, i32) {
        (x - self.origin_x, y - self.origin_y)
    }
}

/// The ordered screen registry plus the extent of the global canvas.
///
/// Registration order matters: when screens overlap, the first one that
/// contains a point owns it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenLayout {
    screens: Vec<ScreenDescriptor>,
    width: i32,
    height: i32,
}

impl ScreenLayout {
    /// Build a layout whose canvas is the bounding box of all screens,
    /// anchored at the global origin.
    #[must_use]
    pub fn new(screens: Vec<ScreenDescriptor>) -> Self {
        let width = screens.iter().map(ScreenDescriptor::right).max().unwrap_or(0);
        let height = screens.iter().map(ScreenDescriptor::bottom).max().unwrap_or(0);
        Self::with_canvas(screens, width, height)
    }

    /// Build a layout with an explicit canvas size.
    #[must_use]
    pub fn with_canvas(screens: Vec<ScreenDescriptor>, width: i32, height: i32) -> Self {
        Self {
            screens,
            width,
            height,
        }
    }

    /// Width of the global canvas.
    #[must_use]
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Height of the global canvas.
    #[must_use]
    pub fn height(&self) -> i32 {
        self.height
    }

    #[must_use]
    pub fn screens(&self) -> &[ScreenDescriptor] {
        &self.screens
    }

    /// Find the first registered screen containing the global point.
    #[must_use]
    pub fn locate(&self, x: i32, y: i32) -> Option<&ScreenDescriptor> {
        self.screens.iter().find(|screen| screen.contains(x, y))
    }
}
