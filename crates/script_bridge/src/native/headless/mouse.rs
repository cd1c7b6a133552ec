// Cursor state of the headless engine

use crate::foundation::math::Vec2;
use crate::native::MouseBackend;

use super::HeadlessEngine;

/// Snapshot of the headless cursor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseState {
    /// Show counter; the cursor is visible while it is positive
    pub counter: i32,
    /// Desktop position
    pub absolute: Vec2,
    /// Desktop position of the game window's corner
    pub window_origin: Vec2,
    /// Kept inside the game window
    pub confined: bool,
    /// Forced hidden
    pub hidden: bool,
    /// Operating system cursor in use
    pub system_cursor: bool,
}

impl Default for MouseState {
    fn default() -> Self {
        Self {
            counter: 0,
            absolute: Vec2::zeros(),
            window_origin: Vec2::zeros(),
            confined: false,
            hidden: false,
            system_cursor: false,
        }
    }
}

impl HeadlessEngine {
    /// Move the game window on the desktop
    pub fn set_window_origin(&self, origin: Vec2) {
        self.mouse.lock().window_origin = origin;
    }

    /// Current cursor state
    pub fn mouse_state(&self) -> MouseState {
        *self.mouse.lock()
    }
}

impl MouseBackend for HeadlessEngine {
    fn increment_counter(&self) {
        self.mouse.lock().counter += 1;
    }

    fn decrement_counter(&self) {
        self.mouse.lock().counter -= 1;
    }

    fn absolute_position(&self) -> Vec2 {
        self.mouse.lock().absolute
    }

    fn set_absolute_position(&self, position: Vec2) {
        self.mouse.lock().absolute = position;
    }

    fn client_position(&self) -> Vec2 {
        let mouse = self.mouse.lock();
        mouse.absolute - mouse.window_origin
    }

    fn set_client_position(&self, position: Vec2) {
        let mut mouse = self.mouse.lock();
        mouse.absolute = mouse.window_origin + position;
    }

    fn reset(&self, visible_by_default: bool) {
        let mut mouse = self.mouse.lock();
        mouse.counter = i32::from(visible_by_default);
        mouse.hidden = false;
    }

    fn confine_cursor(&self, confine: bool) {
        self.mouse.lock().confined = confine;
    }

    fn hide(&self, hide: bool) {
        self.mouse.lock().hidden = hide;
    }

    fn use_system_cursor(&self, use_system_cursor: bool) {
        self.mouse.lock().system_cursor = use_system_cursor;
    }
}
