//! Console variables

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, BridgeResult};
use crate::native::{ConsoleBackend, NativeHandle};

bitflags! {
    /// How the console treats a command or variable
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ConsoleFlags: u32 {
        /// Only usable with cheats enabled
        const CHEAT = 0x2;
        /// Cannot be changed from the console
        const READ_ONLY = 0x8;
        /// Takes effect after the level is reloaded
        const REQUIRE_LEVEL_RELOAD = 0x10;
        /// Takes effect after the application restarts
        const REQUIRE_APP_RESTART = 0x20;
        /// Hidden from auto-completion
        const INVISIBLE = 0x1000;
        /// Change callback runs even when the value did not change
        const ALWAYS_ON_CHANGE = 0x2000;
        /// Only available in development builds
        const DEV_ONLY = 0x8_0000;
        /// Only available on dedicated servers
        const DEDICATED_ONLY = 0x10_0000;
        /// Synchronized from server to clients
        const NET_SYNCED = 0x20_0000;
        /// Written to the configuration dump
        const DUMP_TO_DISK = 0x40_0000;
    }
}

/// Type of value a console variable holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsoleValueKind {
    /// `i32`
    Int,
    /// `f32`
    Float,
    /// Text
    String,
}

impl fmt::Display for ConsoleValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
        })
    }
}

/// Value of a console variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConsoleValue {
    /// Integer value
    Int(i32),
    /// Floating point value
    Float(f32),
    /// Text value
    String(String),
}

impl ConsoleValue {
    /// Type of the value
    pub const fn kind(&self) -> ConsoleValueKind {
        match self {
            Self::Int(_) => ConsoleValueKind::Int,
            Self::Float(_) => ConsoleValueKind::Float,
            Self::String(_) => ConsoleValueKind::String,
        }
    }

    /// Parse text typed into the console as a value of `kind`
    pub fn parse(kind: ConsoleValueKind, text: &str) -> BridgeResult<Self> {
        let invalid = || BridgeError::argument("value", format!("`{text}` is not a valid {kind}"));
        match kind {
            ConsoleValueKind::Int => text.trim().parse().map(Self::Int).map_err(|_| invalid()),
            ConsoleValueKind::Float => text.trim().parse().map(Self::Float).map_err(|_| invalid()),
            ConsoleValueKind::String => Ok(Self::String(text.to_string())),
        }
    }
}

impl fmt::Display for ConsoleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::String(value) => f.write_str(value),
        }
    }
}

impl From<i32> for ConsoleValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<f32> for ConsoleValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ConsoleValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ConsoleValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// Reference to a native console variable
///
/// The variable keeps the type it was registered with; values of another
/// type are rejected before they reach native code.
#[derive(Clone)]
pub struct ConsoleVariable {
    handle: NativeHandle,
    name: String,
    kind: ConsoleValueKind,
    backend: Arc<dyn ConsoleBackend>,
}

impl ConsoleVariable {
    pub(crate) fn new(
        backend: Arc<dyn ConsoleBackend>,
        handle: NativeHandle,
        name: impl Into<String>,
        kind: ConsoleValueKind,
    ) -> Self {
        Self {
            handle,
            name: name.into(),
            kind,
            backend,
        }
    }

    /// Native handle
    pub const fn handle(&self) -> NativeHandle {
        self.handle
    }

    /// Registered name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type of the values the variable holds
    pub const fn kind(&self) -> ConsoleValueKind {
        self.kind
    }

    /// Current value
    pub fn value(&self) -> BridgeResult<ConsoleValue> {
        self.backend
            .variable_value(self.handle)
            .ok_or_else(|| self.unregistered())
    }

    /// Change the value
    pub fn set(&self, value: impl Into<ConsoleValue>) -> BridgeResult<()> {
        let value = value.into();
        if value.kind() != self.kind {
            return Err(BridgeError::argument(
                "value",
                format!(
                    "Console variable {} holds {} values, got {}",
                    self.name,
                    self.kind,
                    value.kind()
                ),
            ));
        }
        if !self.backend.set_variable_value(self.handle, &value) {
            return Err(BridgeError::Native(format!(
                "Console variable {} refused the value {value}",
                self.name
            )));
        }
        log::debug!("{} = {value}", self.name);
        Ok(())
    }

    /// Change the value from console text
    pub fn set_text(&self, text: &str) -> BridgeResult<()> {
        self.set(ConsoleValue::parse(self.kind, text)?)
    }

    fn unregistered(&self) -> BridgeError {
        BridgeError::InvalidState(format!("Console variable {} is not registered", self.name))
    }
}

impl fmt::Debug for ConsoleVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleVariable")
            .field("handle", &self.handle)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
