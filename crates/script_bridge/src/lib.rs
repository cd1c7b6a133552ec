//! # Script Bridge
//!
//! Managed-side binding layer between gameplay code and a native engine.
//!
//! ## Features
//!
//! - **Entity Shadows**: Managed proxies that receive the native lifecycle and fan it out to extensions
//! - **Editable Properties**: Inspector rows declared once per class and exchanged as text
//! - **UI Channels**: Event system membership, declarations and subscriber fan-out
//! - **Console**: Managed commands and console variables
//! - **Levels and Input**: Level loading notifications and hardware mouse events
//! - **Native Resources**: Geometry, sub-material and mesh stream wrappers with scoped locks
//! - **Headless Engine**: In-process native side for simulations and tests
//!
//! ## Quick Start
//!
//! ```rust
//! use std::any::Any;
//! use std::sync::Arc;
//!
//! use script_bridge::prelude::*;
//!
//! struct Door;
//!
//! impl EntityLogic for Door {
//!     fn as_any(&self) -> &dyn Any {
//!         self
//!     }
//!
//!     fn as_any_mut(&mut self) -> &mut dyn Any {
//!         self
//!     }
//! }
//!
//! fn main() -> Result<(), BridgeError> {
//!     let mut classes = EntityClassRegistry::new();
//!     classes.register(EntityClass::new("Door", |_, _| Ok(Box::new(Door))))?;
//!
//!     let engine = Arc::new(HeadlessEngine::new());
//!     let mut host = ShadowHost::new(Arc::new(classes), engine.clone());
//!
//!     let handle = NativeHandle::new(1).ok_or_else(BridgeError::invalid_instance)?;
//!     let id = host
//!         .create_shadow("Door", EntityId::new(7), handle)
//!         .ok_or_else(BridgeError::invalid_instance)?;
//!     host.initializing(id)?;
//!     host.initialized(id)?;
//!     host.update_all(&mut UpdateContext::new(0.016, 1))?;
//!     host.shutdown();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]
#![forbid(unsafe_code)]

pub mod config;
pub mod console;
pub mod entity;
pub mod error;
pub mod events;
pub mod foundation;
pub mod input;
pub mod level;
pub mod mesh;
pub mod native;
pub mod physics;
pub mod render;
pub mod ui;

pub use error::{BridgeError, BridgeResult};

/// Common imports for bridge users
pub mod prelude {
    pub use crate::{
        config::{BridgeConfig, Config},
        console::{Console, ConsoleFlags, ConsoleValue, ConsoleVariable},
        entity::{
            EditableProperty, EditablePropertyType, EntityClass, EntityClassRegistry,
            EntityExtension, EntityLogic, EntityShadow, GameRulesCatalog, GameRulesClass,
            MemorySync, PropertyAttribute, PropertyTable, ShadowHost, ShadowInfo,
            SpawnParameters, SyncContext, UiControl, UpdateContext,
        },
        error::{BridgeError, BridgeResult},
        foundation::{
            math::{Vec2, Vec3},
            time::FrameTimer,
        },
        input::{Mouse, MouseButton, MouseEvent},
        level::{LevelEvent, LevelSystem},
        mesh::{StaticMesh, TexturePosition},
        native::{headless::HeadlessEngine, EntityId, NativeHandle},
        physics::{BoxPrimitive, GeometryShape, MeshDescription, Primitive},
        render::{Material, SubMaterials},
        ui::{UiEventArgs, UiEventRouter, UiValue},
    };
}
