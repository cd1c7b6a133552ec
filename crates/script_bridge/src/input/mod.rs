//! Hardware input forwarded from the engine

pub mod mouse;

pub use mouse::{HardwareMouseEvent, Mouse, MouseButton, MouseEvent, MouseEventHandler};
