//! UI event channel
//!
//! Architecture:
//! - events: descriptions and payloads exchanged with native UI
//! - router: event system membership, outgoing events and subscriber fan-out

pub mod events;
pub mod router;

pub use events::{
    UiEventArgs, UiEventDescription, UiEventDirection, UiParameterDescription, UiParameterType,
    UiValue,
};
pub use router::{
    RegisteredUiEvent, UiEventDeclaration, UiEventHandler, UiEventRouter, UiPort, UiPortKind,
};
