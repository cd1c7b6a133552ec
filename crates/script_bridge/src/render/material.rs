//! Materials and their sub-material slots

use std::fmt;
use std::sync::Arc;

use crate::error::{BridgeError, BridgeResult};
use crate::native::NativeHandle;

/// Native material store
pub trait MaterialBackend: Send + Sync {
    /// Material in slot `index` of `material`
    fn get_item(&self, material: NativeHandle, index: usize) -> Option<NativeHandle>;

    /// Replace the material in slot `index` of `material`; `None` empties the slot
    fn set_item(&self, material: NativeHandle, index: usize, item: Option<NativeHandle>);

    /// Number of sub-material slots
    fn get_count(&self, material: NativeHandle) -> usize;

    /// Resize the slot array; new slots are empty
    fn set_count(&self, material: NativeHandle, count: usize);
}

/// Reference to a native material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Material {
    handle: Option<NativeHandle>,
}

impl Material {
    /// Wrap a native material; `None` makes a null material
    pub const fn from_handle(handle: Option<NativeHandle>) -> Self {
        Self { handle }
    }

    /// Whether this refers to a native material
    pub const fn is_valid(&self) -> bool {
        self.handle.is_some()
    }

    /// Native handle, if any
    pub const fn handle(&self) -> Option<NativeHandle> {
        self.handle
    }
}

/// Sub-material slots of a material
///
/// Positions are stable under `insert` and `remove_at`: every other slot
/// keeps its relative order.
#[derive(Clone)]
pub struct SubMaterials {
    handle: Option<NativeHandle>,
    backend: Arc<dyn MaterialBackend>,
}

impl SubMaterials {
    /// Slots of the material behind `handle`
    pub fn new(backend: Arc<dyn MaterialBackend>, handle: Option<NativeHandle>) -> Self {
        Self { handle, backend }
    }

    /// Whether this refers to a native material
    pub const fn is_valid(&self) -> bool {
        self.handle.is_some()
    }

    /// Number of slots
    pub fn len(&self) -> BridgeResult<usize> {
        let handle = self.assert_instance()?;
        Ok(self.backend.get_count(handle))
    }

    /// Whether there are no slots
    pub fn is_empty(&self) -> BridgeResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Resize the slot array; zero drops every slot
    pub fn set_len(&self, count: usize) -> BridgeResult<()> {
        let handle = self.assert_instance()?;
        self.backend.set_count(handle, count);
        Ok(())
    }

    /// Material in slot `index`
    pub fn get(&self, index: usize) -> BridgeResult<Material> {
        let handle = self.checked_slot(index)?;
        Ok(Material::from_handle(self.backend.get_item(handle, index)))
    }

    /// Replace the material in slot `index`
    pub fn set(&self, index: usize, material: Material) -> BridgeResult<()> {
        let handle = self.checked_slot(index)?;
        let item = require_material(material)?;
        self.backend.set_item(handle, index, Some(item));
        Ok(())
    }

    /// Append a slot holding `material`
    pub fn push(&self, material: Material) -> BridgeResult<()> {
        let handle = self.assert_instance()?;
        let item = require_material(material).map_err(|_| {
            BridgeError::argument(
                "material",
                "Cannot add null material to a sub-material slot, try using default material instead.",
            )
        })?;

        let index = self.backend.get_count(handle);
        self.backend.set_count(handle, index + 1);
        self.backend.set_item(handle, index, Some(item));
        Ok(())
    }

    /// Drop every slot
    pub fn clear(&self) -> BridgeResult<()> {
        self.set_len(0)
    }

    /// Put `material` into slot `index`
    ///
    /// Inserting at the end appends, inserting past the end grows the array
    /// with empty slots, and inserting inside moves the following slots up.
    pub fn insert(&self, index: usize, material: Material) -> BridgeResult<()> {
        let handle = self.assert_instance()?;
        let item = require_material(material)?;

        let count = self.backend.get_count(handle);
        if index == count {
            return self.push(material);
        }

        if index > count {
            self.backend.set_count(handle, index + 1);
        } else {
            self.backend.set_count(handle, count + 1);
            for slot in (index..count).rev() {
                let moved = self.backend.get_item(handle, slot);
                self.backend.set_item(handle, slot + 1, moved);
            }
        }
        self.backend.set_item(handle, index, Some(item));
        Ok(())
    }

    /// Remove slot `index`, moving the following slots down
    pub fn remove_at(&self, index: usize) -> BridgeResult<()> {
        let handle = self.checked_slot(index)?;
        let count = self.backend.get_count(handle);

        for slot in index + 1..count {
            let moved = self.backend.get_item(handle, slot);
            self.backend.set_item(handle, slot - 1, moved);
        }
        self.backend.set_count(handle, count - 1);
        Ok(())
    }

    /// Copy every slot into `target` starting at `start`
    pub fn copy_to(&self, target: &mut [Material], start: usize) -> BridgeResult<()> {
        let handle = self.assert_instance()?;
        let count = self.backend.get_count(handle);
        if start > target.len() || target.len() - start < count {
            return Err(BridgeError::argument(
                "target",
                "Cannot fit the sub-materials into the given array.",
            ));
        }

        for (offset, slot) in target[start..start + count].iter_mut().enumerate() {
            *slot = Material::from_handle(self.backend.get_item(handle, offset));
        }
        Ok(())
    }

    /// Every slot in order
    pub fn iter(&self) -> BridgeResult<impl Iterator<Item = Material> + '_> {
        let handle = self.assert_instance()?;
        let count = self.backend.get_count(handle);
        Ok((0..count).map(move |index| Material::from_handle(self.backend.get_item(handle, index))))
    }

    fn checked_slot(&self, index: usize) -> BridgeResult<NativeHandle> {
        let handle = self.assert_instance()?;
        if index >= self.backend.get_count(handle) {
            return Err(BridgeError::out_of_range(
                "index",
                "Index must not be less then zero and must be less then number of sub-materials.",
            ));
        }
        Ok(handle)
    }

    fn assert_instance(&self) -> BridgeResult<NativeHandle> {
        self.handle.ok_or_else(BridgeError::invalid_instance)
    }
}

impl fmt::Debug for SubMaterials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubMaterials")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

fn require_material(material: Material) -> BridgeResult<NativeHandle> {
    material.handle().ok_or_else(|| {
        BridgeError::argument("material", "Cannot insert invalid material into the collection.")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::headless::HeadlessEngine;

    struct Fixture {
        engine: Arc<HeadlessEngine>,
        slots: SubMaterials,
        a: Material,
        b: Material,
        c: Material,
    }

    fn fixture() -> Fixture {
        let engine = Arc::new(HeadlessEngine::new());
        let parent = engine.create_material(0);
        let [a, b, c] = [(); 3].map(|()| Material::from_handle(Some(engine.create_material(0))));
        let slots = SubMaterials::new(engine.clone(), Some(parent));
        for material in [a, b, c] {
            slots.push(material).unwrap();
        }
        Fixture {
            engine,
            slots,
            a,
            b,
            c,
        }
    }

    fn contents(slots: &SubMaterials) -> Vec<Material> {
        slots.iter().unwrap().collect()
    }

    #[test]
    fn test_insert_inside_preserves_order() {
        let f = fixture();
        let x = Material::from_handle(Some(f.engine.create_material(0)));

        f.slots.insert(1, x).unwrap();
        assert_eq!(contents(&f.slots), vec![f.a, x, f.b, f.c]);

        f.slots.remove_at(1).unwrap();
        assert_eq!(contents(&f.slots), vec![f.a, f.b, f.c]);
    }

    #[test]
    fn test_insert_at_front_and_end() {
        let f = fixture();
        let x = Material::from_handle(Some(f.engine.create_material(0)));

        f.slots.insert(0, x).unwrap();
        assert_eq!(contents(&f.slots), vec![x, f.a, f.b, f.c]);

        f.slots.insert(4, x).unwrap();
        assert_eq!(f.slots.len().unwrap(), 5);
        assert_eq!(f.slots.get(4).unwrap(), x);
    }

    #[test]
    fn test_insert_past_end_grows() {
        let f = fixture();
        f.slots.insert(5, f.a).unwrap();
        assert_eq!(f.slots.len().unwrap(), 6);
        assert!(!f.slots.get(4).unwrap().is_valid());
        assert_eq!(f.slots.get(5).unwrap(), f.a);
    }

    #[test]
    fn test_remove_last_and_bounds() {
        let f = fixture();
        f.slots.remove_at(2).unwrap();
        assert_eq!(contents(&f.slots), vec![f.a, f.b]);
        assert!(matches!(f.slots.remove_at(2), Err(BridgeError::OutOfRange { .. })));
        assert!(matches!(f.slots.get(7), Err(BridgeError::OutOfRange { .. })));
        assert!(matches!(f.slots.set(2, f.c), Err(BridgeError::OutOfRange { .. })));
    }

    #[test]
    fn test_null_material_rejected() {
        let f = fixture();
        let null = Material::default();
        assert!(matches!(f.slots.push(null), Err(BridgeError::Argument { .. })));
        assert!(matches!(f.slots.insert(0, null), Err(BridgeError::Argument { .. })));
        assert_eq!(f.slots.len().unwrap(), 3);
    }

    #[test]
    fn test_copy_to() {
        let f = fixture();
        let mut target = [Material::default(); 4];
        f.slots.copy_to(&mut target, 1).unwrap();
        assert_eq!(target, [Material::default(), f.a, f.b, f.c]);
        assert!(f.slots.copy_to(&mut target, 2).is_err());
    }

    #[test]
    fn test_invalid_instance() {
        let engine = Arc::new(HeadlessEngine::new());
        let slots = SubMaterials::new(engine, None);
        assert!(!slots.is_valid());
        assert!(slots.len().unwrap_err().is_invalid_state());
        assert!(slots.iter().is_err());
        assert!(slots.clear().unwrap_err().is_invalid_state());
    }

    #[test]
    fn test_clear() {
        let f = fixture();
        f.slots.clear().unwrap();
        assert!(f.slots.is_empty().unwrap());
        assert_eq!(f.engine.sub_materials(f.slots.handle.unwrap()), Vec::new());
    }
}
