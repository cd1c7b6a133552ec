//! Hardware mouse
//!
//! Native code reports every hardware mouse event as a position, an event
//! code and a wheel delta. [`Mouse::on_hardware_event`] decodes them into
//! [`MouseEvent`]s and offers each one to the subscribers in subscription
//! order until one of them consumes it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::events::{HandlerId, HandlerList};
use crate::foundation::math::Vec2;
use crate::native::MouseBackend;

/// Mouse button identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    /// Left mouse button
    Left,
    /// Right mouse button
    Right,
    /// Middle mouse button
    Middle,
}

/// Event codes the engine reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum HardwareMouseEvent {
    /// Cursor moved
    Move = 0,
    /// Left button pressed
    LeftButtonDown = 1,
    /// Left button released
    LeftButtonUp = 2,
    /// Left button double-clicked
    LeftButtonDoubleClick = 3,
    /// Right button pressed
    RightButtonDown = 4,
    /// Right button released
    RightButtonUp = 5,
    /// Right button double-clicked
    RightButtonDoubleClick = 6,
    /// Middle button pressed
    MiddleButtonDown = 7,
    /// Middle button released
    MiddleButtonUp = 8,
    /// Middle button double-clicked
    MiddleButtonDoubleClick = 9,
    /// Wheel turned
    Wheel = 10,
}

impl HardwareMouseEvent {
    /// Event with the native `code`
    pub const fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => Self::Move,
            1 => Self::LeftButtonDown,
            2 => Self::LeftButtonUp,
            3 => Self::LeftButtonDoubleClick,
            4 => Self::RightButtonDown,
            5 => Self::RightButtonUp,
            6 => Self::RightButtonDoubleClick,
            7 => Self::MiddleButtonDown,
            8 => Self::MiddleButtonUp,
            9 => Self::MiddleButtonDoubleClick,
            10 => Self::Wheel,
            _ => return None,
        })
    }
}

/// Decoded mouse event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEvent {
    /// Cursor moved
    Move {
        /// Horizontal position
        x: i32,
        /// Vertical position
        y: i32,
    },
    /// Button pressed
    ButtonDown {
        /// Button
        button: MouseButton,
        /// Horizontal position
        x: i32,
        /// Vertical position
        y: i32,
    },
    /// Button released
    ButtonUp {
        /// Button
        button: MouseButton,
        /// Horizontal position
        x: i32,
        /// Vertical position
        y: i32,
    },
    /// Button double-clicked
    DoubleClick {
        /// Button
        button: MouseButton,
        /// Horizontal position
        x: i32,
        /// Vertical position
        y: i32,
    },
    /// Wheel turned
    Wheel {
        /// Wheel movement
        delta: i32,
    },
}

impl MouseEvent {
    /// Build the event native code described
    pub const fn new(x: i32, y: i32, event: HardwareMouseEvent, wheel_delta: i32) -> Self {
        use HardwareMouseEvent as H;
        use MouseButton::{Left, Middle, Right};

        match event {
            H::Move => Self::Move { x, y },
            H::LeftButtonDown => Self::ButtonDown { button: Left, x, y },
            H::LeftButtonUp => Self::ButtonUp { button: Left, x, y },
            H::LeftButtonDoubleClick => Self::DoubleClick { button: Left, x, y },
            H::RightButtonDown => Self::ButtonDown { button: Right, x, y },
            H::RightButtonUp => Self::ButtonUp { button: Right, x, y },
            H::RightButtonDoubleClick => Self::DoubleClick { button: Right, x, y },
            H::MiddleButtonDown => Self::ButtonDown { button: Middle, x, y },
            H::MiddleButtonUp => Self::ButtonUp { button: Middle, x, y },
            H::MiddleButtonDoubleClick => Self::DoubleClick { button: Middle, x, y },
            H::Wheel => Self::Wheel { delta: wheel_delta },
        }
    }
}

/// Subscriber callback; returns true when it consumed the event
pub type MouseEventHandler = dyn FnMut(&MouseEvent) -> bool;

/// Managed view of the hardware mouse
pub struct Mouse {
    backend: Arc<dyn MouseBackend>,
    handlers: HandlerList<MouseEventHandler>,
}

impl Mouse {
    /// Mouse talking to `backend`
    pub fn new(backend: Arc<dyn MouseBackend>) -> Self {
        Self {
            backend,
            handlers: HandlerList::new(),
        }
    }

    /// Receive mouse events
    pub fn subscribe(&mut self, handler: Box<MouseEventHandler>) -> HandlerId {
        self.handlers.add(handler)
    }

    /// Stop receiving mouse events
    pub fn unsubscribe(&mut self, id: HandlerId) -> bool {
        self.handlers.remove(id)
    }

    /// Native entry point for hardware mouse events
    ///
    /// Unknown codes are ignored. Returns whether a subscriber consumed the event.
    pub fn on_hardware_event(&mut self, x: i32, y: i32, code: i32, wheel_delta: i32) -> bool {
        let Some(kind) = HardwareMouseEvent::from_code(code) else {
            log::trace!("Ignoring hardware mouse event {code}");
            return false;
        };
        let event = MouseEvent::new(x, y, kind, wheel_delta);
        self.handlers.iter_mut().any(|handler| handler(&event))
    }

    /// Show the cursor one more time
    pub fn increment_counter(&self) {
        self.backend.increment_counter();
    }

    /// Take back one request to show the cursor
    pub fn decrement_counter(&self) {
        self.backend.decrement_counter();
    }

    /// Cursor position on the desktop
    pub fn absolute_position(&self) -> Vec2 {
        self.backend.absolute_position()
    }

    /// Move the cursor on the desktop
    pub fn set_absolute_position(&self, position: Vec2) {
        self.backend.set_absolute_position(position);
    }

    /// Cursor position inside the game window
    pub fn client_position(&self) -> Vec2 {
        self.backend.client_position()
    }

    /// Move the cursor inside the game window
    pub fn set_client_position(&self, position: Vec2) {
        self.backend.set_client_position(position);
    }

    /// Reset the show counter
    pub fn reset(&self, visible_by_default: bool) {
        self.backend.reset(visible_by_default);
    }

    /// Keep the cursor inside the game window
    pub fn confine_cursor(&self, confine: bool) {
        self.backend.confine_cursor(confine);
    }

    /// Hide or show the cursor regardless of the counter
    pub fn hide(&self, hide: bool) {
        self.backend.hide(hide);
    }

    /// Use the operating system cursor instead of the engine one
    pub fn use_system_cursor(&self, use_system_cursor: bool) {
        self.backend.use_system_cursor(use_system_cursor);
    }

    /// Drop every subscriber
    pub fn shutdown(&mut self) {
        self.handlers.clear();
    }
}
