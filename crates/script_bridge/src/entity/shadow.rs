//! Managed proxy paired 1:1 with a native entity
//!
//! A shadow owns the class-specific [`EntityLogic`], an ordered list of
//! extensions and the externally registered lifecycle handlers. Every
//! lifecycle call runs the logic first, then the extensions in registration
//! order, then the handlers.

use std::any::Any;

use crate::entity::extension::{EntityExtension, ExtensionKey, ExtensionRegistry};
use crate::entity::lifecycle::{LifecycleEvent, ShadowState};
use crate::entity::spawn::{SpawnParameters, UpdateContext};
use crate::entity::sync::SyncContext;
use crate::error::{BridgeError, BridgeResult};
use crate::events::{HandlerId, HandlerList};
use crate::native::{EntityId, EntitySystem, NativeHandle};

/// Identity of a shadow as seen by hooks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowInfo {
    handle: NativeHandle,
    id: EntityId,
    class_name: String,
}

impl ShadowInfo {
    /// Bundle the identity of one native entity
    pub const fn new(handle: NativeHandle, id: EntityId, class_name: String) -> Self {
        Self {
            handle,
            id,
            class_name,
        }
    }

    /// Native handle
    pub const fn handle(&self) -> NativeHandle {
        self.handle
    }

    /// Entity id
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Registered class name
    pub fn class_name(&self) -> &str {
        &self.class_name
    }
}

/// Class-specific behaviour of an entity
///
/// Every hook has a default so a class only overrides what it needs.
pub trait EntityLogic: Any {
    /// First initialization stage
    fn initialize(&mut self, _info: &ShadowInfo) -> BridgeResult<()> {
        Ok(())
    }

    /// Second initialization stage, once every entity in the batch ran `initialize`
    fn post_initialize(&mut self, _info: &ShadowInfo) -> BridgeResult<()> {
        Ok(())
    }

    /// Per-tick update
    fn update(&mut self, _info: &ShadowInfo, _context: &mut UpdateContext) -> BridgeResult<()> {
        Ok(())
    }

    /// Per-tick update after every entity ran `update`
    fn post_update(&mut self, _info: &ShadowInfo) -> BridgeResult<()> {
        Ok(())
    }

    /// Accept or veto recycling this entity with new spawn parameters
    fn reload(
        &mut self,
        _info: &ShadowInfo,
        _parameters: &mut SpawnParameters,
    ) -> BridgeResult<bool> {
        Ok(true)
    }

    /// Finish a reload that every participant accepted
    fn post_reload(
        &mut self,
        _info: &ShadowInfo,
        _parameters: &mut SpawnParameters,
    ) -> BridgeResult<()> {
        Ok(())
    }

    /// Describe the shape of this entity for its pool slot
    fn pool_signature(
        &mut self,
        _info: &ShadowInfo,
        _context: &mut dyn SyncContext,
    ) -> BridgeResult<bool> {
        Ok(true)
    }

    /// Save or load state; must issue the same calls in both directions
    fn synchronize(&mut self, _info: &ShadowInfo, _context: &mut dyn SyncContext) -> BridgeResult<()> {
        Ok(())
    }

    /// Release managed state
    ///
    /// `invoked_from_native` is true when the engine removed the entity itself.
    fn dispose(&mut self, _info: &ShadowInfo, _invoked_from_native: bool) {}

    /// Downcast support
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcast support
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Handler for initialization events
pub type LifecycleHandler = dyn FnMut(&ShadowInfo);

/// Handler that may veto a reload by returning `false`
pub type ReloadHandler = dyn FnMut(&ShadowInfo, &mut SpawnParameters) -> bool;

/// Handler notified once a reload completed
pub type ReloadedHandler = dyn FnMut(&ShadowInfo, &SpawnParameters);

/// Managed counterpart of one native entity
pub struct EntityShadow {
    info: ShadowInfo,
    state: ShadowState,
    logic: Box<dyn EntityLogic>,
    extensions: ExtensionRegistry,
    initializing: HandlerList<LifecycleHandler>,
    initialized: HandlerList<LifecycleHandler>,
    reloading: HandlerList<ReloadHandler>,
    reloaded: HandlerList<ReloadedHandler>,
}

impl EntityShadow {
    /// Pair `logic` with a native entity
    pub fn new(
        handle: NativeHandle,
        id: EntityId,
        class_name: impl Into<String>,
        logic: Box<dyn EntityLogic>,
    ) -> Self {
        let info = ShadowInfo::new(handle, id, class_name.into());
        log::debug!("Shadow created for {} entity {}", info.class_name, info.id);
        Self {
            info,
            state: ShadowState::Constructed,
            logic,
            extensions: ExtensionRegistry::new(),
            initializing: HandlerList::new(),
            initialized: HandlerList::new(),
            reloading: HandlerList::new(),
            reloaded: HandlerList::new(),
        }
    }

    /// Entity id; fails once disposed
    pub fn id(&self) -> BridgeResult<EntityId> {
        self.ensure_alive()?;
        Ok(self.info.id)
    }

    /// Native handle; fails once disposed
    pub fn handle(&self) -> BridgeResult<NativeHandle> {
        self.ensure_alive()?;
        Ok(self.info.handle)
    }

    /// Registered class name; fails once disposed
    pub fn class_name(&self) -> BridgeResult<&str> {
        self.ensure_alive()?;
        Ok(&self.info.class_name)
    }

    /// Identity bundle; fails once disposed
    pub fn info(&self) -> BridgeResult<&ShadowInfo> {
        self.ensure_alive()?;
        Ok(&self.info)
    }

    /// Current lifecycle state
    pub const fn state(&self) -> ShadowState {
        self.state
    }

    /// Whether disposal started; never fails
    pub const fn is_disposed(&self) -> bool {
        self.state.is_disposed()
    }

    /// Attached extensions
    pub const fn extensions(&self) -> &ExtensionRegistry {
        &self.extensions
    }

    /// Attach an extension
    pub fn add_extension(&mut self, extension: Box<dyn EntityExtension>) -> BridgeResult<ExtensionKey> {
        self.ensure_alive()?;
        Ok(self.extensions.add(extension))
    }

    /// Detach an extension without notifying it
    pub fn remove_extension(&mut self, key: ExtensionKey) -> Option<Box<dyn EntityExtension>> {
        self.extensions.remove(key)
    }

    /// Class logic
    pub fn logic(&self) -> &dyn EntityLogic {
        self.logic.as_ref()
    }

    /// Class logic downcast to its concrete type
    pub fn logic_as<T: EntityLogic>(&self) -> Option<&T> {
        self.logic.as_any().downcast_ref::<T>()
    }

    /// Mutable class logic downcast to its concrete type
    pub fn logic_as_mut<T: EntityLogic>(&mut self) -> Option<&mut T> {
        self.logic.as_any_mut().downcast_mut::<T>()
    }

    /// Class logic for type-erased property accessors
    pub fn logic_any_mut(&mut self) -> BridgeResult<&mut dyn Any> {
        self.ensure_alive()?;
        Ok(self.logic.as_any_mut())
    }

    /// Run `handler` after every `initialize` fan-out
    pub fn on_initializing(&mut self, handler: Box<LifecycleHandler>) -> HandlerId {
        self.initializing.add(handler)
    }

    /// Remove an `initializing` handler
    pub fn remove_initializing_handler(&mut self, id: HandlerId) -> bool {
        self.initializing.remove(id)
    }

    /// Run `handler` after every `post_initialize` fan-out
    pub fn on_initialized(&mut self, handler: Box<LifecycleHandler>) -> HandlerId {
        self.initialized.add(handler)
    }

    /// Remove an `initialized` handler
    pub fn remove_initialized_handler(&mut self, id: HandlerId) -> bool {
        self.initialized.remove(id)
    }

    /// Let `handler` vote on every reload after the logic and the extensions
    pub fn on_reloading(&mut self, handler: Box<ReloadHandler>) -> HandlerId {
        self.reloading.add(handler)
    }

    /// Remove a `reloading` handler
    pub fn remove_reloading_handler(&mut self, id: HandlerId) -> bool {
        self.reloading.remove(id)
    }

    /// Run `handler` after every completed reload
    pub fn on_reloaded(&mut self, handler: Box<ReloadedHandler>) -> HandlerId {
        self.reloaded.add(handler)
    }

    /// Remove a `reloaded` handler
    pub fn remove_reloaded_handler(&mut self, id: HandlerId) -> bool {
        self.reloaded.remove(id)
    }

    /// First initialization stage
    pub fn initialize(&mut self) -> BridgeResult<()> {
        self.advance(LifecycleEvent::Initialize)?;

        let info = &self.info;
        self.logic.initialize(info)?;
        self.extensions.for_each(|ext| ext.initialize(info))?;
        self.initializing.iter_mut().for_each(|handler| handler(info));
        Ok(())
    }

    /// Second initialization stage; the shadow is live afterwards
    pub fn post_initialize(&mut self) -> BridgeResult<()> {
        self.advance(LifecycleEvent::PostInitialize)?;

        let info = &self.info;
        self.logic.post_initialize(info)?;
        self.extensions.for_each(|ext| ext.post_initialize(info))?;
        self.initialized.iter_mut().for_each(|handler| handler(info));
        Ok(())
    }

    /// Per-tick update
    pub fn update(&mut self, context: &mut UpdateContext) -> BridgeResult<()> {
        self.ensure_alive()?;
        self.state.require_live("update")?;

        let info = &self.info;
        self.logic.update(info, context)?;
        self.extensions.for_each(|ext| ext.update(info, context))
    }

    /// Per-tick update after every entity ran `update`
    pub fn post_update(&mut self) -> BridgeResult<()> {
        self.ensure_alive()?;
        self.state.require_live("post_update")?;

        let info = &self.info;
        self.logic.post_update(info)?;
        self.extensions.for_each(|ext| ext.post_update(info))
    }

    /// Ask every participant whether the entity may be recycled with `parameters`
    ///
    /// The logic votes first, then each extension, then each reload handler.
    /// The first `false` ends the chain and the shadow stays live; `post_reload`
    /// must follow an accepted reload.
    pub fn reload(&mut self, parameters: &mut SpawnParameters) -> BridgeResult<bool> {
        self.ensure_alive()?;
        self.advance(LifecycleEvent::Reload)?;

        let verdict = self.run_reload_chain(parameters);
        if !matches!(verdict, Ok(true)) {
            self.advance(LifecycleEvent::ReloadVetoed)?;
        }
        verdict
    }

    fn run_reload_chain(&mut self, parameters: &mut SpawnParameters) -> BridgeResult<bool> {
        let info = &self.info;

        if !self.logic.reload(info, parameters)? {
            log::debug!("Reload of {} {} vetoed by its own logic", info.class_name, info.id);
            return Ok(false);
        }

        if let Some(name) = self.extensions.all(|ext| ext.reload(info, parameters))? {
            log::debug!("Reload of {} {} vetoed by extension {name}", info.class_name, info.id);
            return Ok(false);
        }

        for (index, handler) in self.reloading.iter_mut().enumerate() {
            if !handler(info, parameters) {
                log::debug!(
                    "Reload of {} {} vetoed by reload handler #{index}",
                    info.class_name,
                    info.id
                );
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Complete an accepted reload
    pub fn post_reload(&mut self, parameters: &mut SpawnParameters) -> BridgeResult<()> {
        self.ensure_alive()?;
        self.advance(LifecycleEvent::PostReload)?;

        let info = &self.info;
        self.logic.post_reload(info, parameters)?;
        self.extensions
            .for_each(|ext| ext.post_reload(info, parameters))?;
        let parameters = &*parameters;
        self.reloaded
            .iter_mut()
            .for_each(|handler| handler(info, parameters));
        Ok(())
    }

    /// Check that a pooled shadow still fits its slot
    pub fn pool_signature(&mut self, context: &mut dyn SyncContext) -> BridgeResult<bool> {
        self.ensure_alive()?;
        self.logic.pool_signature(&self.info, context)
    }

    /// Save or load the logic and every extension
    pub fn synchronize(&mut self, context: &mut dyn SyncContext) -> BridgeResult<()> {
        self.ensure_alive()?;
        self.state.require_live("synchronize")?;

        let info = &self.info;
        self.logic.synchronize(info, context)?;
        self.extensions
            .for_each(|ext| ext.synchronize(info, &mut *context))
    }

    /// Tear down from the managed side and ask the world to remove the entity
    ///
    /// Only the first call does anything; it returns whether it did.
    pub fn dispose(&mut self, entity_system: &dyn EntitySystem) -> bool {
        if !self.teardown(false) {
            return false;
        }
        entity_system.remove_entity(self.info.id, true);
        self.finish_teardown();
        true
    }

    /// Tear down because native code already removed the entity
    ///
    /// Shares the disposed flag with [`EntityShadow::dispose`].
    pub fn release_from_native(&mut self) -> bool {
        if !self.teardown(true) {
            return false;
        }
        self.finish_teardown();
        true
    }

    fn teardown(&mut self, invoked_from_native: bool) -> bool {
        let Ok(next) = self.state.transition(LifecycleEvent::Dispose) else {
            return false;
        };
        self.state = next;
        log::debug!(
            "Disposing {} entity {} (from native: {invoked_from_native})",
            self.info.class_name,
            self.info.id
        );

        self.extensions.clear(&self.info, true);
        self.logic.dispose(&self.info, invoked_from_native);
        self.initializing.clear();
        self.initialized.clear();
        self.reloading.clear();
        self.reloaded.clear();
        true
    }

    fn finish_teardown(&mut self) {
        match self.state.transition(LifecycleEvent::DisposeComplete) {
            Ok(next) => self.state = next,
            Err(e) => log::error!("{} entity {}: {e}", self.info.class_name, self.info.id),
        }
    }

    fn advance(&mut self, event: LifecycleEvent) -> BridgeResult<()> {
        self.ensure_alive()?;
        self.state = self.state.transition(event)?;
        Ok(())
    }

    fn ensure_alive(&self) -> BridgeResult<()> {
        if self.state.is_disposed() {
            return Err(BridgeError::InvalidState(format!(
                "{} entity {} is disposed",
                self.info.class_name, self.info.id
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for EntityShadow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityShadow")
            .field("info", &self.info)
            .field("state", &self.state)
            .field("extensions", &self.extensions.len())
            .finish_non_exhaustive()
    }
}
