//! Pluggable behaviour attached to a shadow
//!
//! Extensions receive the same lifecycle callbacks as the shadow that owns
//! them, in the order they were added. The registry is mutably borrowed for
//! the whole fan-out, so an extension cannot add or remove extensions from
//! inside its own callback.

use std::any::Any;

use crate::entity::shadow::ShadowInfo;
use crate::entity::spawn::{SpawnParameters, UpdateContext};
use crate::entity::sync::SyncContext;
use crate::error::BridgeResult;
use crate::foundation::collections::{new_key_type, OrderedSlotMap};

new_key_type! {
    /// Stable key of an extension inside its shadow
    pub struct ExtensionKey;
}

/// Unit of behaviour attached to a shadow; every hook defaults to a no-op
pub trait EntityExtension: Any {
    /// Called after the shadow's own `initialize`
    fn initialize(&mut self, _info: &ShadowInfo) -> BridgeResult<()> {
        Ok(())
    }

    /// Called after the shadow's own `post_initialize`
    fn post_initialize(&mut self, _info: &ShadowInfo) -> BridgeResult<()> {
        Ok(())
    }

    /// Called every tick after the shadow's own `update`
    fn update(&mut self, _info: &ShadowInfo, _context: &mut UpdateContext) -> BridgeResult<()> {
        Ok(())
    }

    /// Called every tick after the shadow's own `post_update`
    fn post_update(&mut self, _info: &ShadowInfo) -> BridgeResult<()> {
        Ok(())
    }

    /// Vote on a pool-recycling reload; `false` vetoes it
    fn reload(
        &mut self,
        _info: &ShadowInfo,
        _parameters: &mut SpawnParameters,
    ) -> BridgeResult<bool> {
        Ok(true)
    }

    /// Called once a reload went through
    fn post_reload(
        &mut self,
        _info: &ShadowInfo,
        _parameters: &mut SpawnParameters,
    ) -> BridgeResult<()> {
        Ok(())
    }

    /// Save or load extension state
    fn synchronize(&mut self, _info: &ShadowInfo, _context: &mut dyn SyncContext) -> BridgeResult<()> {
        Ok(())
    }

    /// Release native resources tracked by this extension before it is dropped
    fn release(&mut self, _info: &ShadowInfo) {}

    /// Name used in logs
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Downcast support
    fn as_any(&self) -> &dyn Any;
}

/// Ordered collection of extensions owned by one shadow
#[derive(Default)]
pub struct ExtensionRegistry {
    extensions: OrderedSlotMap<ExtensionKey, Box<dyn EntityExtension>>,
}

impl ExtensionRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an extension
    pub fn add(&mut self, extension: Box<dyn EntityExtension>) -> ExtensionKey {
        log::debug!("Adding extension {}", extension.name());
        self.extensions.insert(extension)
    }

    /// Detach an extension without notifying it
    pub fn remove(&mut self, key: ExtensionKey) -> Option<Box<dyn EntityExtension>> {
        self.extensions.remove(key)
    }

    /// Remove every extension, calling `release` on each first when `notify` is set
    pub fn clear(&mut self, info: &ShadowInfo, notify: bool) {
        for (_, mut extension) in self.extensions.drain() {
            if notify {
                extension.release(info);
            }
        }
    }

    /// Number of extensions
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    /// Whether no extension is attached
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Extension by key
    pub fn get(&self, key: ExtensionKey) -> Option<&dyn EntityExtension> {
        self.extensions.get(key).map(|extension| extension.as_ref())
    }

    /// First extension of type `T`
    pub fn find<T: EntityExtension>(&self) -> Option<&T> {
        self.iter().find_map(|extension| extension.as_any().downcast_ref::<T>())
    }

    /// Extensions in registration order
    pub fn iter(&self) -> impl Iterator<Item = &dyn EntityExtension> + '_ {
        self.extensions.values().map(|extension| extension.as_ref())
    }

    /// Mutable extensions in registration order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn EntityExtension>> + '_ {
        self.extensions.values_mut()
    }

    /// Run `f` on every extension in order, stopping at the first error
    pub fn for_each(
        &mut self,
        mut f: impl FnMut(&mut dyn EntityExtension) -> BridgeResult<()>,
    ) -> BridgeResult<()> {
        self.extensions
            .values_mut()
            .try_for_each(|extension| f(extension.as_mut()))
    }

    /// Run `f` on extensions in order until one returns `false` or fails
    ///
    /// Returns the name of the vetoing extension, if any.
    pub fn all(
        &mut self,
        mut f: impl FnMut(&mut dyn EntityExtension) -> BridgeResult<bool>,
    ) -> BridgeResult<Option<String>> {
        for extension in self.extensions.values_mut() {
            if !f(extension.as_mut())? {
                return Ok(Some(extension.name().to_string()));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::{EntityId, NativeHandle};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder {
        label: &'static str,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl EntityExtension for Recorder {
        fn update(&mut self, _info: &ShadowInfo, _context: &mut UpdateContext) -> BridgeResult<()> {
            self.log.borrow_mut().push(format!("update {}", self.label));
            Ok(())
        }

        fn release(&mut self, _info: &ShadowInfo) {
            self.log.borrow_mut().push(format!("release {}", self.label));
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn info() -> ShadowInfo {
        ShadowInfo::new(
            NativeHandle::new(1).unwrap(),
            EntityId::new(1),
            "Recorder".to_string(),
        )
    }

    fn recorder(label: &'static str, log: &Rc<RefCell<Vec<String>>>) -> Box<dyn EntityExtension> {
        Box::new(Recorder {
            label,
            log: log.clone(),
        })
    }

    #[test]
    fn test_fan_out_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = ExtensionRegistry::new();
        registry.add(recorder("a", &log));
        let b = registry.add(recorder("b", &log));
        registry.add(recorder("c", &log));
        registry.remove(b);
        registry.add(recorder("d", &log));

        let info = info();
        let mut context = UpdateContext::default();
        registry
            .for_each(|ext| ext.update(&info, &mut context))
            .unwrap();

        assert_eq!(*log.borrow(), vec!["update a", "update c", "update d"]);
    }

    #[test]
    fn test_clear_with_and_without_notification() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let info = info();
        let mut registry = ExtensionRegistry::new();
        registry.add(recorder("a", &log));
        registry.clear(&info, false);
        assert!(registry.is_empty());
        assert!(log.borrow().is_empty());

        registry.add(recorder("b", &log));
        registry.add(recorder("c", &log));
        registry.clear(&info, true);
        assert_eq!(*log.borrow(), vec!["release b", "release c"]);
    }

    #[test]
    fn test_find_by_type() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = ExtensionRegistry::new();
        registry.add(recorder("a", &log));
        assert_eq!(registry.find::<Recorder>().map(|p| p.label), Some("a"));
    }

    #[test]
    fn test_empty_fan_out_is_ok() {
        let mut registry = ExtensionRegistry::new();
        assert!(registry.for_each(|_| Ok(())).is_ok());
        assert_eq!(registry.all(|_| Ok(false)).unwrap(), None);
    }
}
