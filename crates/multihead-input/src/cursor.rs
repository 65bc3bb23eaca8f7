//! The single authoritative global cursor position.

/// Global cursor position plus a flag that forces the next core motion
/// through even when the coordinates have not changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalCursor {
    x: i32,
    y: i32,
    valid: bool,
}

impl Default for GlobalCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl GlobalCursor {
    /// A cursor at the origin that has never been placed.
    pub fn new() -> Self {
        Self {
            x: 0,
            y: 0,
            valid: false,
        }
    }

    pub fn read(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Force the next core motion to apply, e.g. after the screen topology
    /// or device bindings changed.
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    /// Whether moving to `(x, y)` would be a no-op.
    pub(crate) fn is_unchanged(&self, x: i32, y: i32) -> bool {
        self.valid && self.x == x && self.y == y
    }

    pub(crate) fn update(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
        self.valid = true;
    }
}
