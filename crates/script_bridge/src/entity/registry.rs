//! Explicit name -> factory table of entity classes
//!
//! Populated once during start-up, then shared read-only with the
//! [`ShadowHost`](crate::entity::host::ShadowHost).

use std::collections::HashMap;
use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::entity::property::PropertyTable;
use crate::entity::shadow::EntityLogic;
use crate::error::{BridgeError, BridgeResult};
use crate::native::{ClassRegistrar, EntityId, NativeHandle};

bitflags! {
    /// How the editor and the entity system treat a class
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct EntityClassFlags: u32 {
        /// Not listed in the editor
        const INVISIBLE = 1 << 0;
        /// Built-in class
        const DEFAULT = 1 << 1;
        /// Selected in the editor by its bounding box
        const BBOX_SELECTION = 1 << 2;
        /// Replace an already registered native class of the same name
        const MODIFY_EXISTING = 1 << 3;
    }
}

/// Constructor of the class logic for a freshly spawned native entity
pub type EntityFactory = Box<dyn Fn(NativeHandle, EntityId) -> BridgeResult<Box<dyn EntityLogic>>>;

/// One registered entity class
pub struct EntityClass {
    name: String,
    flags: EntityClassFlags,
    factory: EntityFactory,
    properties: PropertyTable,
}

impl EntityClass {
    /// Class `name` built by `factory`
    pub fn new(
        name: impl Into<String>,
        factory: impl Fn(NativeHandle, EntityId) -> BridgeResult<Box<dyn EntityLogic>> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            flags: EntityClassFlags::empty(),
            factory: Box::new(factory),
            properties: PropertyTable::new(),
        }
    }

    /// Set class flags
    #[must_use]
    pub fn with_flags(mut self, flags: EntityClassFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the editable properties
    #[must_use]
    pub fn with_properties(mut self, properties: PropertyTable) -> Self {
        self.properties = properties;
        self
    }

    /// Class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Class flags
    pub const fn flags(&self) -> EntityClassFlags {
        self.flags
    }

    /// Editable properties
    pub const fn properties(&self) -> &PropertyTable {
        &self.properties
    }

    /// Run the factory
    pub fn create(&self, handle: NativeHandle, id: EntityId) -> BridgeResult<Box<dyn EntityLogic>> {
        (self.factory)(handle, id)
    }
}

impl fmt::Debug for EntityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityClass")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("properties", &self.properties.len())
            .finish_non_exhaustive()
    }
}

/// Registered entity classes in registration order
#[derive(Debug, Default)]
pub struct EntityClassRegistry {
    classes: HashMap<String, EntityClass>,
    order: Vec<String>,
}

impl EntityClassRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class; names must be unique and non-empty
    pub fn register(&mut self, class: EntityClass) -> BridgeResult<()> {
        if class.name.trim().is_empty() {
            return Err(BridgeError::argument("name", "Entity class name cannot be empty."));
        }
        if self.classes.contains_key(&class.name) {
            return Err(BridgeError::Registration(format!(
                "Entity class {} is already registered",
                class.name
            )));
        }

        log::info!(
            "Registered entity class {} with {} editable properties",
            class.name,
            class.properties.len()
        );
        self.order.push(class.name.clone());
        self.classes.insert(class.name.clone(), class);
        Ok(())
    }

    /// Declare every class to native code, in registration order
    pub fn register_with(&self, registrar: &dyn ClassRegistrar) -> BridgeResult<()> {
        for class in self.iter() {
            registrar.register_entity_class(&class.name, class.flags, &class.properties.infos())?;
            log::debug!("Entity class {} declared to native code", class.name);
        }
        Ok(())
    }

    /// Class by name
    pub fn lookup(&self, name: &str) -> Option<&EntityClass> {
        self.classes.get(name)
    }

    /// Cached property table of a class
    pub fn property_table(&self, name: &str) -> Option<&PropertyTable> {
        self.lookup(name).map(EntityClass::properties)
    }

    /// Class names in registration order
    pub fn class_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.order.iter().map(String::as_str)
    }

    /// Classes in registration order
    pub fn iter(&self) -> impl Iterator<Item = &EntityClass> + '_ {
        self.order.iter().filter_map(|name| self.classes.get(name))
    }

    /// Number of classes
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no class is registered
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::property::{EditableProperty, EditablePropertyType, PropertyAttribute, UiControl};
    use crate::native::headless::HeadlessEngine;
    use std::any::Any;

    struct Crate {
        mass: f32,
    }

    impl EntityLogic for Crate {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn crate_class(name: &str) -> EntityClass {
        let mass = EditableProperty::new(
            "mass",
            EditablePropertyType::Float,
            Some(PropertyAttribute::new(UiControl::NumberEdit, "Mass in kg").with_default(10.0f32)),
            |c: &Crate| c.mass,
            |c: &mut Crate, value| c.mass = value,
        )
        .unwrap();

        EntityClass::new(name, |_, _| Ok(Box::new(Crate { mass: 10.0 })))
            .with_flags(EntityClassFlags::DEFAULT)
            .with_properties(PropertyTable::new().with(mass))
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = EntityClassRegistry::new();
        registry.register(crate_class("Crate")).unwrap();
        registry.register(crate_class("Barrel")).unwrap();

        assert_eq!(registry.class_names().collect::<Vec<_>>(), vec!["Crate", "Barrel"]);
        assert_eq!(registry.property_table("Crate").map(PropertyTable::len), Some(1));
        assert!(registry.lookup("Missing").is_none());

        let logic = registry
            .lookup("Crate")
            .unwrap()
            .create(NativeHandle::new(5).unwrap(), EntityId::new(5))
            .unwrap();
        assert!(logic.as_any().is::<Crate>());
    }

    #[test]
    fn test_duplicate_and_empty_names_rejected() {
        let mut registry = EntityClassRegistry::new();
        registry.register(crate_class("Crate")).unwrap();

        assert!(matches!(
            registry.register(crate_class("Crate")),
            Err(BridgeError::Registration(_))
        ));
        assert!(matches!(
            registry.register(crate_class("  ")),
            Err(BridgeError::Argument { .. })
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_with_forwards_every_class() {
        let mut registry = EntityClassRegistry::new();
        registry.register(crate_class("Crate")).unwrap();
        registry.register(crate_class("Barrel")).unwrap();

        let engine = HeadlessEngine::new();
        registry.register_with(&engine).unwrap();

        let declared = engine.registered_classes();
        assert_eq!(declared.len(), 2);
        assert_eq!(declared[0].name, "Crate");
        assert_eq!(declared[0].flags, EntityClassFlags::DEFAULT);
        assert_eq!(declared[0].properties[0].default_value, "10");
    }
}
