//! Entity shadows and everything that drives them
//!
//! Architecture:
//! - shadow: managed proxy of one native entity and its lifecycle fan-out
//! - extension: ordered plug-ins attached to a shadow
//! - host: id -> shadow table behind the native call boundary
//! - registry / game_rules: one-time class registration
//! - property: editor-visible properties of entity classes
//! - spawn / sync / lifecycle: data passed through lifecycle calls

pub mod extension;
pub mod game_rules;
pub mod host;
pub mod lifecycle;
pub mod property;
pub mod registry;
pub mod shadow;
pub mod spawn;
pub mod sync;

#[cfg(test)]
mod tests;

pub use extension::{EntityExtension, ExtensionKey, ExtensionRegistry};
pub use game_rules::{GameRulesCatalog, GameRulesClass};
pub use host::ShadowHost;
pub use lifecycle::{LifecycleEvent, ShadowState};
pub use property::{
    EditableProperty, EditablePropertyInfo, EditablePropertyType, PropertyAttribute,
    PropertyTable, PropertyValue, UiControl,
};
pub use registry::{EntityClass, EntityClassFlags, EntityClassRegistry, EntityFactory};
pub use shadow::{EntityLogic, EntityShadow, ShadowInfo};
pub use spawn::{SpawnFlags, SpawnParameters, UpdateContext};
pub use sync::{MemorySync, SyncContext, SyncDirection};
