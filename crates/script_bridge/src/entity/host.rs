//! Native entry points of the entity layer
//!
//! [`ShadowHost`] owns every live shadow and translates the engine's
//! well-known lifecycle calls into calls on the matching shadow. Spawn
//! failures are logged and reported as "no shadow"; every other failure is
//! returned to the caller.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entity::property::PropertyTable;
use crate::entity::registry::EntityClassRegistry;
use crate::entity::shadow::EntityShadow;
use crate::entity::spawn::{SpawnParameters, UpdateContext};
use crate::entity::sync::SyncContext;
use crate::error::{BridgeError, BridgeResult};
use crate::native::{EntityId, EntitySystem, NativeHandle};

/// Owner of all shadows and target of native lifecycle calls
pub struct ShadowHost {
    classes: Arc<EntityClassRegistry>,
    entity_system: Arc<dyn EntitySystem>,
    shadows: HashMap<EntityId, EntityShadow>,
    spawn_order: Vec<EntityId>,
}

impl ShadowHost {
    /// Host resolving classes in `classes` and removing entities through `entity_system`
    pub fn new(classes: Arc<EntityClassRegistry>, entity_system: Arc<dyn EntitySystem>) -> Self {
        Self {
            classes,
            entity_system,
            shadows: HashMap::new(),
            spawn_order: Vec::new(),
        }
    }

    /// Class table shared with the rest of the bridge
    pub fn classes(&self) -> &EntityClassRegistry {
        &self.classes
    }

    /// Native spawn notification
    ///
    /// Unknown classes, duplicate ids and factory failures are logged and
    /// yield `None`; nothing propagates to native code.
    pub fn create_shadow(
        &mut self,
        class_name: &str,
        id: EntityId,
        handle: NativeHandle,
    ) -> Option<EntityId> {
        let Some(class) = self.classes.lookup(class_name) else {
            log::warn!("Cannot create shadow for entity {id}: class {class_name} is not registered");
            return None;
        };
        if self.shadows.contains_key(&id) {
            log::warn!("Cannot create shadow for {class_name} entity {id}: the id already has one");
            return None;
        }

        let logic = match class.create(handle, id) {
            Ok(logic) => logic,
            Err(e) => {
                log::warn!("Factory of {class_name} failed for entity {id}: {e}");
                return None;
            }
        };

        self.shadows
            .insert(id, EntityShadow::new(handle, id, class_name, logic));
        self.spawn_order.push(id);
        log::debug!("Shadow for {class_name} entity {id} created");
        Some(id)
    }

    /// Shadow by id
    pub fn shadow(&self, id: EntityId) -> Option<&EntityShadow> {
        self.shadows.get(&id)
    }

    /// Mutable shadow by id
    pub fn shadow_mut(&mut self, id: EntityId) -> Option<&mut EntityShadow> {
        self.shadows.get_mut(&id)
    }

    /// Ids of live shadows in spawn order
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.spawn_order.iter().copied()
    }

    /// Number of live shadows
    pub fn len(&self) -> usize {
        self.shadows.len()
    }

    /// Whether no shadow exists
    pub fn is_empty(&self) -> bool {
        self.shadows.is_empty()
    }

    /// Native `Initializing` call
    pub fn initializing(&mut self, id: EntityId) -> BridgeResult<()> {
        self.require(id)?.initialize()
    }

    /// Native `Initialized` call
    pub fn initialized(&mut self, id: EntityId) -> BridgeResult<()> {
        self.require(id)?.post_initialize()
    }

    /// Native `Update` call
    pub fn update(&mut self, id: EntityId, context: &mut UpdateContext) -> BridgeResult<()> {
        self.require(id)?.update(context)
    }

    /// Native `PostUpdate` call
    pub fn post_update(&mut self, id: EntityId) -> BridgeResult<()> {
        self.require(id)?.post_update()
    }

    /// Native `Reloading` call; `Ok(false)` is a veto
    pub fn reloading(&mut self, id: EntityId, parameters: &mut SpawnParameters) -> BridgeResult<bool> {
        self.require(id)?.reload(parameters)
    }

    /// Native `Reloaded` call
    pub fn reloaded(&mut self, id: EntityId, parameters: &mut SpawnParameters) -> BridgeResult<()> {
        self.require(id)?.post_reload(parameters)
    }

    /// Native `GetSignature` call
    pub fn get_signature(&mut self, id: EntityId, context: &mut dyn SyncContext) -> BridgeResult<bool> {
        self.require(id)?.pool_signature(context)
    }

    /// Native `Synchronize` call
    pub fn synchronize(&mut self, id: EntityId, context: &mut dyn SyncContext) -> BridgeResult<()> {
        self.require(id)?.synchronize(context)
    }

    /// Native `Dispose` call: the engine already removed the entity
    pub fn dispose(&mut self, id: EntityId) -> BridgeResult<()> {
        let mut shadow = self.take(id)?;
        shadow.release_from_native();
        Ok(())
    }

    /// Managed-side removal: tears the shadow down and asks the engine to remove the entity
    pub fn remove(&mut self, id: EntityId) -> BridgeResult<()> {
        let mut shadow = self.take(id)?;
        shadow.dispose(self.entity_system.as_ref());
        Ok(())
    }

    /// Native `GetEditableProperty` call
    pub fn get_editable_property(&self, id: EntityId, index: usize) -> BridgeResult<String> {
        let shadow = self
            .shadows
            .get(&id)
            .ok_or_else(|| unknown_entity(id))?;
        let class_name = shadow.class_name()?;
        let property = self.property_table(class_name)?.get(index)?;
        property.get(shadow.logic().as_any())
    }

    /// Native `SetEditableProperty` call
    pub fn set_editable_property(&mut self, id: EntityId, index: usize, value: &str) -> BridgeResult<()> {
        let shadow = self
            .shadows
            .get_mut(&id)
            .ok_or_else(|| unknown_entity(id))?;
        let class_name = shadow.class_name()?;
        let property = self
            .classes
            .property_table(class_name)
            .ok_or_else(|| missing_table(class_name))?
            .get(index)?;
        property.set(shadow.logic_any_mut()?, value)
    }

    /// Run `update` on every live shadow in spawn order
    pub fn update_all(&mut self, context: &mut UpdateContext) -> BridgeResult<()> {
        for id in &self.spawn_order {
            if let Some(shadow) = self.shadows.get_mut(id) {
                if shadow.state().is_live() {
                    shadow.update(context)?;
                }
            }
        }
        Ok(())
    }

    /// Run `post_update` on every live shadow in spawn order
    pub fn post_update_all(&mut self) -> BridgeResult<()> {
        for id in &self.spawn_order {
            if let Some(shadow) = self.shadows.get_mut(id) {
                if shadow.state().is_live() {
                    shadow.post_update()?;
                }
            }
        }
        Ok(())
    }

    /// Remove every shadow from the managed side, newest first
    pub fn shutdown(&mut self) {
        while let Some(id) = self.spawn_order.pop() {
            if let Some(mut shadow) = self.shadows.remove(&id) {
                shadow.dispose(self.entity_system.as_ref());
            }
        }
        log::info!("Shadow host shut down");
    }

    fn property_table(&self, class_name: &str) -> BridgeResult<&PropertyTable> {
        self.classes
            .property_table(class_name)
            .ok_or_else(|| missing_table(class_name))
    }

    fn require(&mut self, id: EntityId) -> BridgeResult<&mut EntityShadow> {
        self.shadows.get_mut(&id).ok_or_else(|| unknown_entity(id))
    }

    fn take(&mut self, id: EntityId) -> BridgeResult<EntityShadow> {
        let shadow = self.shadows.remove(&id).ok_or_else(|| unknown_entity(id))?;
        self.spawn_order.retain(|existing| *existing != id);
        Ok(shadow)
    }
}

fn unknown_entity(id: EntityId) -> BridgeError {
    BridgeError::InvalidState(format!("No shadow exists for entity {id}"))
}

fn missing_table(class_name: &str) -> BridgeError {
    BridgeError::Registration(format!("No property table is registered for class {class_name}"))
}
