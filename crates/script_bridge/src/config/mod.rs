//! Configuration system
//!
//! Bridge settings are plain serde structs that can be loaded from TOML or RON.

pub use serde::{Deserialize, Serialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        Self::parse(path, &contents)
    }

    /// Parse configuration text, picking the format from the file extension
    fn parse(path: &str, contents: &str) -> Result<Self, ConfigError> {
        if path.ends_with(".toml") {
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Semantically invalid value
    #[error("Invalid value for `{0}`: {1}")]
    Invalid(&'static str, String),
}

/// Logger settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `env_logger` filter directive, overridden by `RUST_LOG`
    pub filter: String,
    /// One of `auto`, `always`, `never`
    pub write_style: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            write_style: "auto".to_string(),
        }
    }
}

/// Defaults applied to physical mesh construction when the caller does not specify them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryDefaults {
    /// Tolerance used when checking whether a mesh resembles a primitive
    pub approximation_tolerance: f32,
    /// Minimal number of triangles in a bounding volume tree node
    pub min_triangles_per_node: i32,
    /// Maximal number of triangles in a bounding volume tree node
    pub max_triangles_per_node: i32,
    /// Scale applied to AABB volume when choosing between trees
    pub favor_aabb: f32,
}

impl Default for GeometryDefaults {
    fn default() -> Self {
        Self {
            approximation_tolerance: 0.05,
            min_triangles_per_node: 2,
            max_triangles_per_node: 4,
            favor_aabb: 1.0,
        }
    }
}

/// Timing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// Scale changes smaller than this are not forwarded to the engine
    pub zero_tolerance: f32,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self { zero_tolerance: 1e-6 }
    }
}

/// UI event channel settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Log every argument of incoming UI events
    pub log_event_arguments: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            log_event_arguments: true,
        }
    }
}

/// Console settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Log managed command lines at info level instead of debug
    pub log_commands: bool,
    /// Help text of commands registered without one
    pub default_help: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            log_commands: true,
            default_help: "Managed command".to_string(),
        }
    }
}

/// Top-level bridge configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Logger settings
    pub logging: LoggingConfig,
    /// Physical mesh defaults
    pub geometry: GeometryDefaults,
    /// Timing settings
    pub time: TimeConfig,
    /// UI channel settings
    pub ui: UiConfig,
    /// Console settings
    pub console: ConsoleConfig,
}

impl Config for BridgeConfig {}

impl BridgeConfig {
    /// Check values that serde cannot
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.geometry.min_triangles_per_node <= 0 {
            return Err(ConfigError::Invalid(
                "geometry.min_triangles_per_node",
                "must be greater then 0".to_string(),
            ));
        }
        if self.geometry.max_triangles_per_node <= 0 {
            return Err(ConfigError::Invalid(
                "geometry.max_triangles_per_node",
                "must be greater then 0".to_string(),
            ));
        }
        if self.time.zero_tolerance < 0.0 {
            return Err(ConfigError::Invalid(
                "time.zero_tolerance",
                "cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}
