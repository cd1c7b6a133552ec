//! Descriptions and payloads of UI events

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which way an event system carries events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UiEventDirection {
    /// UI -> system
    ToSystem,
    /// System -> UI
    ToUi,
}

impl UiEventDirection {
    /// Value native code uses for this direction
    pub const fn raw(self) -> i32 {
        match self {
            Self::ToSystem => 0,
            Self::ToUi => 1,
        }
    }
}

/// Type of one event parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UiParameterType {
    /// Unknown or unsupported
    Invalid,
    /// Anything
    #[default]
    Any,
    /// Flag
    Bool,
    /// Integer
    Int,
    /// Floating point number
    Float,
    /// Text
    String,
}

impl UiParameterType {
    /// Value native code uses for this type
    pub const fn raw(self) -> i32 {
        match self {
            Self::Invalid => -1,
            Self::Any => 0,
            Self::Bool => 1,
            Self::Int => 2,
            Self::Float => 3,
            Self::String => 4,
        }
    }
}

/// One parameter of a UI event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiParameterDescription {
    /// Parameter type
    pub parameter_type: UiParameterType,
    /// Parameter name
    pub name: String,
    /// Name shown in tools
    pub display_name: String,
    /// Tooltip text
    pub description: String,
}

impl UiParameterDescription {
    /// Describe a parameter
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        description: impl Into<String>,
        parameter_type: UiParameterType,
    ) -> Self {
        Self {
            parameter_type,
            name: name.into(),
            display_name: display_name.into(),
            description: description.into(),
        }
    }
}

impl Default for UiParameterDescription {
    fn default() -> Self {
        Self::new("Undefined", "Undefined", "Undefined", UiParameterType::Any)
    }
}

/// A UI event as declared to native code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiEventDescription {
    /// Event name
    pub name: String,
    /// Name shown in tools
    pub display_name: String,
    /// Tooltip text
    pub description: String,
    /// Fixed parameters
    pub params: Vec<UiParameterDescription>,
    /// Whether a variable-length array follows the fixed parameters
    pub is_dynamic: bool,
    /// Name of the trailing array
    pub dynamic_name: String,
    /// Tooltip of the trailing array
    pub dynamic_desc: String,
}

impl UiEventDescription {
    /// Event without parameters
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            description: description.into(),
            params: Vec::new(),
            is_dynamic: false,
            dynamic_name: "Array".to_string(),
            dynamic_desc: String::new(),
        }
    }

    /// Append a parameter
    #[must_use]
    pub fn with_param(mut self, param: UiParameterDescription) -> Self {
        self.params.push(param);
        self
    }

    /// Accept a trailing array of values
    #[must_use]
    pub fn with_dynamic(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.is_dynamic = true;
        self.dynamic_name = name.into();
        self.dynamic_desc = description.into();
        self
    }
}

impl Default for UiEventDescription {
    fn default() -> Self {
        Self::new("Undefined", "Undefined", "Undefined")
    }
}

/// Loosely typed event argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UiValue {
    /// Flag
    Bool(bool),
    /// Integer
    Int(i32),
    /// Floating point number
    Float(f32),
    /// Text
    String(String),
}

impl UiValue {
    /// Parameter type matching this value
    pub const fn parameter_type(&self) -> UiParameterType {
        match self {
            Self::Bool(_) => UiParameterType::Bool,
            Self::Int(_) => UiParameterType::Int,
            Self::Float(_) => UiParameterType::Float,
            Self::String(_) => UiParameterType::String,
        }
    }

    /// Name of the carried type, for logs
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "Bool",
            Self::Int(_) => "Int",
            Self::Float(_) => "Float",
            Self::String(_) => "String",
        }
    }
}

impl fmt::Display for UiValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::String(value) => f.write_str(value),
        }
    }
}

impl From<bool> for UiValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for UiValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<f32> for UiValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for UiValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for UiValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// An event raised by native code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiEventArgs {
    /// Event system that raised it
    pub system: String,
    /// Event name
    pub event_name: String,
    /// Numeric id assigned at registration
    pub event_id: i32,
    /// Arguments
    pub args: Vec<UiValue>,
}
