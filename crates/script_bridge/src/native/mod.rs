//! Native call boundary types
//!
//! Everything the bridge needs from the engine goes through the traits in
//! this module. Native code is shared and internally synchronised, so every
//! collaborator takes `&self`.

use std::fmt;
use std::num::NonZeroU64;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::console::{ConsoleFlags, ConsoleValue};
use crate::entity::registry::EntityClassFlags;
use crate::entity::property::EditablePropertyInfo;
use crate::error::BridgeResult;
use crate::foundation::math::Vec2;
use crate::ui::{UiEventDescription, UiEventDirection, UiValue};

pub mod headless;

pub use crate::mesh::MeshStreamBackend;
pub use crate::physics::GeometryBackend;
pub use crate::render::MaterialBackend;

/// Opaque non-null reference to an engine-owned object
///
/// Only identity comparison is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NativeHandle(NonZeroU64);

impl NativeHandle {
    /// Wrap a raw handle value; `0` is the null handle and yields `None`
    pub const fn new(raw: u64) -> Option<Self> {
        match NonZeroU64::new(raw) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }

    /// Raw handle value as seen by native code
    pub const fn raw(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Stable identifier of an entity in the native world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// The id native code uses for "no entity"
    pub const INVALID: Self = Self(0);

    /// Wrap a raw identifier
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw identifier
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Whether this is not the invalid id
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Native world registry that owns the entities
pub trait EntitySystem: Send + Sync {
    /// Remove an entity from the world, immediately or at the end of the frame
    fn remove_entity(&self, id: EntityId, remove_now: bool);
}

/// Native side of one-time class registration
pub trait ClassRegistrar: Send + Sync {
    /// Declare an entity class and its inspector properties
    fn register_entity_class(
        &self,
        name: &str,
        flags: EntityClassFlags,
        properties: &[EditablePropertyInfo],
    ) -> BridgeResult<()>;

    /// Declare a game rule set
    fn register_game_rules(
        &self,
        name: &str,
        type_name: &str,
        aliases: &[String],
        level_locations: &[String],
    ) -> BridgeResult<()>;

    /// Add an alias to a registered game rule set
    fn add_game_rules_alias(&self, rules: &str, alias: &str);

    /// Add a folder where levels for a game rule set live
    fn add_game_rules_level_location(&self, rules: &str, path: &str);
}

/// Native UI event system
pub trait UiBackend: Send + Sync {
    /// Register an event in an event system, returning its numeric id
    fn register_event(
        &self,
        system: &str,
        direction: UiEventDirection,
        description: &UiEventDescription,
    ) -> i32;

    /// Create or attach to an event system for one direction
    fn register_to_event_system(&self, system: &str, direction: UiEventDirection) -> bool;

    /// Detach from an event system
    fn unregister_from_event_system(&self, system: &str, direction: UiEventDirection);

    /// Raise an event by id
    fn send_event(&self, system: &str, event_id: i32, args: &[UiValue]);

    /// Raise an event by name
    fn send_named_event(&self, system: &str, event_name: &str, args: &[UiValue]);
}

/// Native timer
pub trait TimeBackend: Send + Sync {
    /// Change time dilation
    fn set_time_scale(&self, scale: f32);

    /// Remove time dilation
    fn clear_time_scaling(&self);

    /// Time that is not tied to frame start
    fn async_time(&self) -> Duration;
}

/// Native console: commands and console variables
pub trait ConsoleBackend: Send + Sync {
    /// Add a command whose invocations native code routes back to the managed console
    fn add_command(&self, name: &str, help: &str, flags: ConsoleFlags) -> bool;

    /// Remove a command
    fn remove_command(&self, name: &str);

    /// Run a command line
    fn execute_string(&self, command: &str, silent: bool, deferred: bool);

    /// Register a variable with its initial value
    fn register_variable(
        &self,
        name: &str,
        value: &ConsoleValue,
        flags: ConsoleFlags,
        help: &str,
    ) -> Option<NativeHandle>;

    /// Unregister a variable; `delete` also frees it
    fn unregister_variable(&self, name: &str, delete: bool);

    /// Variable registered under `name`
    fn find_variable(&self, name: &str) -> Option<NativeHandle>;

    /// Name of a variable
    fn variable_name(&self, variable: NativeHandle) -> Option<String>;

    /// Current value of a variable
    fn variable_value(&self, variable: NativeHandle) -> Option<ConsoleValue>;

    /// Change a variable; false when native code refused the value
    fn set_variable_value(&self, variable: NativeHandle, value: &ConsoleValue) -> bool;
}

/// Native level system
pub trait LevelBackend: Send + Sync {
    /// Level that is loaded or being loaded
    fn current_level(&self) -> Option<NativeHandle>;

    /// Name of a level
    fn level_name(&self, level: NativeHandle) -> Option<String>;

    /// Whether a level finished loading
    fn is_level_loaded(&self) -> bool;

    /// Seconds the last level load took
    fn last_level_load_time(&self) -> f32;

    /// Load a level by name
    fn load_level(&self, name: &str) -> Option<NativeHandle>;

    /// Start streaming a level that will be loaded next
    fn prepare_next_level(&self, name: &str);

    /// Unload the current level
    fn unload_level(&self);
}

/// Native hardware mouse
pub trait MouseBackend: Send + Sync {
    /// Show the cursor one more time
    fn increment_counter(&self);

    /// Take back one request to show the cursor
    fn decrement_counter(&self);

    /// Cursor position on the desktop
    fn absolute_position(&self) -> Vec2;

    /// Move the cursor on the desktop
    fn set_absolute_position(&self, position: Vec2);

    /// Cursor position inside the game window
    fn client_position(&self) -> Vec2;

    /// Move the cursor inside the game window
    fn set_client_position(&self, position: Vec2);

    /// Reset the show counter
    fn reset(&self, visible_by_default: bool);

    /// Keep the cursor inside the game window
    fn confine_cursor(&self, confine: bool);

    /// Hide or show the cursor regardless of the counter
    fn hide(&self, hide: bool);

    /// Use the operating system cursor instead of the engine one
    fn use_system_cursor(&self, use_system_cursor: bool);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_handle_is_rejected() {
        assert!(NativeHandle::new(0).is_none());
        assert_eq!(NativeHandle::new(42).map(NativeHandle::raw), Some(42));
    }

    #[test]
    fn test_invalid_entity_id() {
        assert!(!EntityId::INVALID.is_valid());
        assert!(EntityId::new(7).is_valid());
        assert_eq!(EntityId::default(), EntityId::INVALID);
    }
}
