//! Per-call data handed to shadows by native code

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::foundation::math::{Quat, Vec3};
use crate::native::EntityId;

bitflags! {
    /// Flags native code attaches to a spawn request
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct SpawnFlags: u32 {
        /// Entity is replicated over the network
        const NETWORKED = 1 << 0;
        /// Entity only exists on the client
        const CLIENT_ONLY = 1 << 1;
        /// Entity only exists on the server
        const SERVER_ONLY = 1 << 2;
        /// Entity is not saved with the level
        const NO_SAVE = 1 << 3;
        /// Entity cannot be removed by gameplay code
        const UNREMOVABLE = 1 << 4;
        /// Entity comes from a pool and is being recycled
        const POOLED = 1 << 5;
    }
}

/// Parameters of a spawn or pool-recycling reload
///
/// Reload participants may rewrite any field in place; later participants
/// see the edits of earlier ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnParameters {
    /// Entity class being spawned
    pub class_name: String,
    /// Entity name
    pub name: String,
    /// World position
    pub position: Vec3,
    /// World orientation
    pub rotation: Quat,
    /// Non-uniform scale
    pub scale: Vec3,
    /// Spawn flags
    pub flags: SpawnFlags,
    /// Id the entity had before it was returned to the pool
    pub previous_id: Option<EntityId>,
    /// Class-specific property overrides as name/value pairs
    pub properties: Vec<(String, String)>,
}

impl SpawnParameters {
    /// Parameters with identity transform for `class_name`
    pub fn new(class_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            name: name.into(),
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            flags: SpawnFlags::empty(),
            previous_id: None,
            properties: Vec::new(),
        }
    }

    /// Value of a property override, if present
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Insert or replace a property override
    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.properties.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value,
            None => self.properties.push((name, value)),
        }
    }
}

/// Data passed with every update tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UpdateContext {
    /// Duration of the previous frame in seconds
    pub frame_time: f32,
    /// Index of the current frame
    pub frame_id: u64,
}

impl UpdateContext {
    /// Context for frame `frame_id` lasting `frame_time` seconds
    pub const fn new(frame_time: f32, frame_id: u64) -> Self {
        Self {
            frame_time,
            frame_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_overrides() {
        let mut params = SpawnParameters::new("Door", "door_01");
        assert_eq!(params.property("locked"), None);

        params.set_property("locked", "true");
        params.set_property("locked", "false");
        params.set_property("speed", "2.5");

        assert_eq!(params.property("locked"), Some("false"));
        assert_eq!(params.properties.len(), 2);
    }

    #[test]
    fn test_default_transform() {
        let params = SpawnParameters::new("Door", "door_01");
        assert_eq!(params.scale, Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(params.rotation, Quat::identity());
        assert!(params.flags.is_empty());
    }
}
