//! Specialized collection types

pub use slotmap::{new_key_type, Key, SlotMap};

/// Keyed collection that preserves insertion order
///
/// Keys come from a slot map, so a key removed once never matches a later
/// entry. Values live in a plain vector in the order they were inserted,
/// which keeps fan-out iteration allocation free.
pub struct OrderedSlotMap<K: Key, V> {
    keys: SlotMap<K, ()>,
    entries: Vec<(K, V)>,
}

impl<K: Key, V> OrderedSlotMap<K, V> {
    /// Create an empty map
    pub fn new() -> Self {
        Self {
            keys: SlotMap::with_key(),
            entries: Vec::new(),
        }
    }

    /// Append a value and return its key
    pub fn insert(&mut self, value: V) -> K {
        let key = self.keys.insert(());
        self.entries.push((key, value));
        key
    }

    /// Remove a value by key, keeping the order of the others
    pub fn remove(&mut self, key: K) -> Option<V> {
        self.keys.remove(key)?;
        let position = self.position(key)?;
        Some(self.entries.remove(position).1)
    }

    /// Get a value by key
    pub fn get(&self, key: K) -> Option<&V> {
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// Get a mutable value by key
    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        self.entries
            .iter_mut()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// Whether the key is still present
    pub fn contains_key(&self, key: K) -> bool {
        self.keys.contains_key(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }

    /// Values in insertion order
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Mutable values in insertion order
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> + '_ {
        self.entries.iter_mut().map(|(_, v)| v)
    }

    /// Remove every entry, yielding them in insertion order
    pub fn drain(&mut self) -> impl Iterator<Item = (K, V)> + '_ {
        self.keys.clear();
        self.entries.drain(..)
    }

    fn position(&self, key: K) -> Option<usize> {
        self.entries.iter().position(|(k, _)| *k == key)
    }
}

impl<K: Key, V> Default for OrderedSlotMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
