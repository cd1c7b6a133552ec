//! Error types shared by every part of the bridge

use thiserror::Error;

use crate::config::ConfigError;

/// Result alias used throughout the bridge
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors raised by the bridge before or while crossing the native boundary
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Operation attempted on a disposed shadow, an invalid wrapper or in the wrong lifecycle state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Malformed argument
    #[error("Invalid argument `{argument}`: {message}")]
    Argument {
        /// Name of the offending argument
        argument: &'static str,
        /// What is wrong with it
        message: String,
    },

    /// Argument outside of the accepted range
    #[error("Argument `{argument}` out of range: {message}")]
    OutOfRange {
        /// Name of the offending argument
        argument: &'static str,
        /// What is wrong with it
        message: String,
    },

    /// Class lookup or descriptor construction failure
    #[error("Registration error: {0}")]
    Registration(String),

    /// Operation that the native side does not support
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// Failure reported by a native collaborator
    #[error("Native error: {0}")]
    Native(String),

    /// Configuration failure
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl BridgeError {
    /// Shorthand for [`BridgeError::Argument`]
    pub fn argument(argument: &'static str, message: impl Into<String>) -> Self {
        Self::Argument {
            argument,
            message: message.into(),
        }
    }

    /// Shorthand for [`BridgeError::OutOfRange`]
    pub fn out_of_range(argument: &'static str, message: impl Into<String>) -> Self {
        Self::OutOfRange {
            argument,
            message: message.into(),
        }
    }

    /// The error every handle-backed wrapper reports when its handle is zero
    pub fn invalid_instance() -> Self {
        Self::InvalidState("This instance is not valid.".to_string())
    }

    /// Whether this is an invalid-state error
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState(_))
    }
}
