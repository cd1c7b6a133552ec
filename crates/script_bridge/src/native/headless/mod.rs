//! In-process engine used when no native runtime is attached
//!
//! [`HeadlessEngine`] implements every collaborator trait with plain Rust
//! state and records the calls it receives, so the bridge can run in tools,
//! simulations and tests. Geometry queries use bounding-box approximations
//! (see the `geometry` submodule).

mod console;
mod geometry;
mod level;
mod mouse;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::entity::property::EditablePropertyInfo;
use crate::entity::registry::EntityClassFlags;
use crate::error::{BridgeError, BridgeResult};
use crate::mesh::{MeshStream, MeshStreamBackend};
use crate::native::{
    ClassRegistrar, EntityId, EntitySystem, NativeHandle, TimeBackend, UiBackend,
};
use crate::physics::PhysicsMeshFlags;
use crate::render::MaterialBackend;
use crate::ui::{UiEventDescription, UiEventDirection, UiValue};

use self::console::ConsoleState;
use self::geometry::GeometryRecord;
use self::level::LevelState;

pub use self::console::ExecutedCommand;
pub use self::mouse::MouseState;

/// Entity class declared through [`ClassRegistrar::register_entity_class`]
#[derive(Debug, Clone, PartialEq)]
pub struct ClassRecord {
    /// Class name
    pub name: String,
    /// Class flags
    pub flags: EntityClassFlags,
    /// Inspector rows
    pub properties: Vec<EditablePropertyInfo>,
}

/// Game rule set declared through [`ClassRegistrar::register_game_rules`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRulesRecord {
    /// Rule set name
    pub name: String,
    /// Implementing type
    pub type_name: String,
    /// Aliases, including the ones added later
    pub aliases: Vec<String>,
    /// Level folders, including the ones added later
    pub level_locations: Vec<String>,
}

/// How an outgoing UI event was addressed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEventTarget {
    /// By registered id
    Id(i32),
    /// By name
    Name(String),
}

/// UI event raised through [`UiBackend`]
#[derive(Debug, Clone, PartialEq)]
pub struct SentUiEvent {
    /// Event system
    pub system: String,
    /// Event
    pub target: UiEventTarget,
    /// Arguments
    pub args: Vec<UiValue>,
}

/// One lock call on a geometry object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockEvent {
    /// Acquired
    Lock {
        /// Write lock
        write: bool,
    },
    /// Released
    Unlock {
        /// Write lock
        write: bool,
    },
}

#[derive(Default)]
struct UiState {
    attached: Vec<(String, UiEventDirection)>,
    refused: Vec<String>,
    detached: Vec<(String, UiEventDirection)>,
    declared: Vec<(String, UiEventDescription)>,
    sent: Vec<SentUiEvent>,
}

#[derive(Default)]
struct TimeState {
    scale_calls: Vec<f32>,
    clear_calls: usize,
    async_time: Duration,
}

#[derive(Default)]
struct MeshRecord {
    streams: HashMap<MeshStream, Vec<u8>>,
    // bumped on every change to any stream
    generation: u64,
}

#[derive(Default)]
struct GeometryState {
    objects: HashMap<NativeHandle, GeometryRecord>,
    locks: Vec<(NativeHandle, LockEvent)>,
}

/// Engine stand-in that keeps everything in memory
pub struct HeadlessEngine {
    next_handle: AtomicU64,
    removed: Mutex<Vec<(EntityId, bool)>>,
    classes: Mutex<Vec<ClassRecord>>,
    game_rules: Mutex<Vec<GameRulesRecord>>,
    ui: Mutex<UiState>,
    time: Mutex<TimeState>,
    geometry: Mutex<GeometryState>,
    materials: Mutex<HashMap<NativeHandle, Vec<Option<NativeHandle>>>>,
    meshes: Mutex<HashMap<NativeHandle, MeshRecord>>,
    console: Mutex<ConsoleState>,
    levels: Mutex<LevelState>,
    mouse: Mutex<MouseState>,
}

impl Default for HeadlessEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessEngine {
    /// Empty engine
    pub fn new() -> Self {
        Self {
            next_handle: AtomicU64::new(1),
            removed: Mutex::new(Vec::new()),
            classes: Mutex::new(Vec::new()),
            game_rules: Mutex::new(Vec::new()),
            ui: Mutex::new(UiState::default()),
            time: Mutex::new(TimeState::default()),
            geometry: Mutex::new(GeometryState::default()),
            materials: Mutex::new(HashMap::new()),
            meshes: Mutex::new(HashMap::new()),
            console: Mutex::new(ConsoleState::default()),
            levels: Mutex::new(LevelState::default()),
            mouse: Mutex::new(MouseState::default()),
        }
    }

    fn allocate_handle(&self) -> NativeHandle {
        let raw = self.next_handle.fetch_add(1, Ordering::Relaxed);
        // zero only shows up after wrap-around
        NativeHandle::new(raw).unwrap_or_else(|| self.allocate_handle())
    }

    /// Handle for a newly spawned native entity
    pub fn allocate_entity(&self) -> NativeHandle {
        self.allocate_handle()
    }

    /// Entities removed so far, with the `remove_now` flag of each call
    pub fn removed_entities(&self) -> Vec<(EntityId, bool)> {
        self.removed.lock().clone()
    }

    /// Entity classes declared so far, in order
    pub fn registered_classes(&self) -> Vec<ClassRecord> {
        self.classes.lock().clone()
    }

    /// Game rule sets declared so far, in order
    pub fn registered_game_rules(&self) -> Vec<GameRulesRecord> {
        self.game_rules.lock().clone()
    }

    /// Every accepted `register_to_event_system` call
    pub fn attached_event_systems(&self) -> Vec<(String, UiEventDirection)> {
        self.ui.lock().attached.clone()
    }

    /// Make every later attach to `system` fail
    pub fn refuse_event_system(&self, system: &str) {
        self.ui.lock().refused.push(system.to_string());
    }

    /// Every `unregister_from_event_system` call
    pub fn detached_event_systems(&self) -> Vec<(String, UiEventDirection)> {
        self.ui.lock().detached.clone()
    }

    /// Every event registered, with its event system
    pub fn declared_ui_events(&self) -> Vec<(String, UiEventDescription)> {
        self.ui.lock().declared.clone()
    }

    /// Every event raised towards the UI
    pub fn sent_ui_events(&self) -> Vec<SentUiEvent> {
        self.ui.lock().sent.clone()
    }

    /// Every time scale pushed to the engine
    pub fn time_scale_calls(&self) -> Vec<f32> {
        self.time.lock().scale_calls.clone()
    }

    /// Number of times time scaling was cleared
    pub fn time_scale_clears(&self) -> usize {
        self.time.lock().clear_calls
    }

    /// Advance the asynchronous clock
    pub fn advance_async_time(&self, delta: Duration) {
        self.time.lock().async_time += delta;
    }

    /// Number of live geometry objects
    pub fn allocated_geometries(&self) -> usize {
        self.geometry.lock().objects.len()
    }

    /// Every lock and unlock call on geometry, in order
    pub fn lock_log(&self) -> Vec<(NativeHandle, LockEvent)> {
        self.geometry.lock().locks.clone()
    }

    /// Current reference count of a geometry object
    pub fn reference_count(&self, handle: NativeHandle) -> Option<i32> {
        self.geometry
            .lock()
            .objects
            .get(&handle)
            .map(|record| record.ref_count)
    }

    /// Flags a mesh was built with
    pub fn mesh_flags(&self, handle: NativeHandle) -> Option<PhysicsMeshFlags> {
        self.geometry
            .lock()
            .objects
            .get(&handle)
            .and_then(GeometryRecord::mesh_flags)
    }

    /// Create a material with `slots` empty sub-material slots
    pub fn create_material(&self, slots: usize) -> NativeHandle {
        let handle = self.allocate_handle();
        self.materials.lock().insert(handle, vec![None; slots]);
        handle
    }

    /// Sub-material slots of a material
    pub fn sub_materials(&self, material: NativeHandle) -> Vec<Option<NativeHandle>> {
        self.materials
            .lock()
            .get(&material)
            .cloned()
            .unwrap_or_default()
    }

    /// Create a static mesh with empty streams
    pub fn create_static_mesh(&self) -> NativeHandle {
        let handle = self.allocate_handle();
        self.meshes.lock().insert(handle, MeshRecord::default());
        handle
    }
}

impl EntitySystem for HeadlessEngine {
    fn remove_entity(&self, id: EntityId, remove_now: bool) {
        log::debug!("Removing entity {id} (now: {remove_now})");
        self.removed.lock().push((id, remove_now));
    }
}

impl ClassRegistrar for HeadlessEngine {
    fn register_entity_class(
        &self,
        name: &str,
        flags: EntityClassFlags,
        properties: &[EditablePropertyInfo],
    ) -> BridgeResult<()> {
        let mut classes = self.classes.lock();
        if classes.iter().any(|class| class.name == name) {
            return Err(BridgeError::Registration(format!(
                "Entity class {name} is already registered"
            )));
        }
        classes.push(ClassRecord {
            name: name.to_string(),
            flags,
            properties: properties.to_vec(),
        });
        Ok(())
    }

    fn register_game_rules(
        &self,
        name: &str,
        type_name: &str,
        aliases: &[String],
        level_locations: &[String],
    ) -> BridgeResult<()> {
        let mut rules = self.game_rules.lock();
        if rules.iter().any(|record| record.name == name) {
            return Err(BridgeError::Registration(format!(
                "Game rules {name} are already registered"
            )));
        }
        rules.push(GameRulesRecord {
            name: name.to_string(),
            type_name: type_name.to_string(),
            aliases: aliases.to_vec(),
            level_locations: level_locations.to_vec(),
        });
        Ok(())
    }

    fn add_game_rules_alias(&self, rules: &str, alias: &str) {
        if let Some(record) = self.game_rules.lock().iter_mut().find(|r| r.name == rules) {
            record.aliases.push(alias.to_string());
        }
    }

    fn add_game_rules_level_location(&self, rules: &str, path: &str) {
        if let Some(record) = self.game_rules.lock().iter_mut().find(|r| r.name == rules) {
            record.level_locations.push(path.to_string());
        }
    }
}

impl UiBackend for HeadlessEngine {
    fn register_event(
        &self,
        system: &str,
        direction: UiEventDirection,
        description: &UiEventDescription,
    ) -> i32 {
        if description.name.is_empty() {
            log::warn!("Refusing nameless UI event in {system} ({direction:?})");
            return -1;
        }

        let mut ui = self.ui.lock();
        ui.declared
            .push((system.to_string(), description.clone()));
        i32::try_from(ui.declared.len() - 1).unwrap_or(-1)
    }

    fn register_to_event_system(&self, system: &str, direction: UiEventDirection) -> bool {
        let mut ui = self.ui.lock();
        if system.is_empty() || ui.refused.iter().any(|refused| refused == system) {
            return false;
        }
        ui.attached.push((system.to_string(), direction));
        true
    }

    fn unregister_from_event_system(&self, system: &str, direction: UiEventDirection) {
        self.ui
            .lock()
            .detached
            .push((system.to_string(), direction));
    }

    fn send_event(&self, system: &str, event_id: i32, args: &[UiValue]) {
        self.ui.lock().sent.push(SentUiEvent {
            system: system.to_string(),
            target: UiEventTarget::Id(event_id),
            args: args.to_vec(),
        });
    }

    fn send_named_event(&self, system: &str, event_name: &str, args: &[UiValue]) {
        self.ui.lock().sent.push(SentUiEvent {
            system: system.to_string(),
            target: UiEventTarget::Name(event_name.to_string()),
            args: args.to_vec(),
        });
    }
}

impl TimeBackend for HeadlessEngine {
    fn set_time_scale(&self, scale: f32) {
        self.time.lock().scale_calls.push(scale);
    }

    fn clear_time_scaling(&self) {
        self.time.lock().clear_calls += 1;
    }

    fn async_time(&self) -> Duration {
        self.time.lock().async_time
    }
}

impl MaterialBackend for HeadlessEngine {
    fn get_item(&self, material: NativeHandle, index: usize) -> Option<NativeHandle> {
        self.materials
            .lock()
            .get(&material)
            .and_then(|slots| slots.get(index).copied().flatten())
    }

    fn set_item(&self, material: NativeHandle, index: usize, item: Option<NativeHandle>) {
        let mut materials = self.materials.lock();
        match materials.get_mut(&material).and_then(|slots| slots.get_mut(index)) {
            Some(slot) => *slot = item,
            None => log::warn!("Material {material} has no sub-material slot {index}"),
        }
    }

    fn get_count(&self, material: NativeHandle) -> usize {
        self.materials.lock().get(&material).map_or(0, Vec::len)
    }

    fn set_count(&self, material: NativeHandle, count: usize) {
        if let Some(slots) = self.materials.lock().get_mut(&material) {
            slots.resize(count, None);
        }
    }
}

impl MeshStreamBackend for HeadlessEngine {
    fn stream_len(&self, mesh: NativeHandle, stream: MeshStream) -> usize {
        self.meshes
            .lock()
            .get(&mesh)
            .and_then(|record| record.streams.get(&stream))
            .map_or(0, |bytes| bytes.len() / stream.element_size())
    }

    fn stream_generation(&self, mesh: NativeHandle, _stream: MeshStream) -> u64 {
        self.meshes.lock().get(&mesh).map_or(0, |record| record.generation)
    }

    fn reallocate_stream(&self, mesh: NativeHandle, stream: MeshStream, len: usize) {
        if let Some(record) = self.meshes.lock().get_mut(&mesh) {
            if len == 0 {
                record.streams.remove(&stream);
            } else {
                record
                    .streams
                    .entry(stream)
                    .or_default()
                    .resize(len * stream.element_size(), 0);
            }
            record.generation += 1;
        }
    }

    fn read_stream(&self, mesh: NativeHandle, stream: MeshStream) -> Vec<u8> {
        self.meshes
            .lock()
            .get(&mesh)
            .and_then(|record| record.streams.get(&stream))
            .cloned()
            .unwrap_or_default()
    }

    fn write_stream(&self, mesh: NativeHandle, stream: MeshStream, first: usize, bytes: &[u8]) {
        let mut meshes = self.meshes.lock();
        let Some(record) = meshes.get_mut(&mesh) else {
            log::warn!("Mesh {mesh} does not exist");
            return;
        };
        let Some(data) = record.streams.get_mut(&stream) else {
            log::warn!("Mesh {mesh} has no {stream:?} stream");
            return;
        };

        let start = first * stream.element_size();
        match data.get_mut(start..start + bytes.len()) {
            Some(target) => {
                target.copy_from_slice(bytes);
                record.generation += 1;
            }
            None => log::warn!("Write past the end of {stream:?} stream of mesh {mesh}"),
        }
    }

    fn remove_range(&self, mesh: NativeHandle, stream: MeshStream, first: usize, count: usize) {
        let mut meshes = self.meshes.lock();
        let Some(record) = meshes.get_mut(&mesh) else {
            return;
        };
        if let Some(data) = record.streams.get_mut(&stream) {
            let size = stream.element_size();
            let start = (first * size).min(data.len());
            let end = ((first + count) * size).min(data.len());
            data.drain(start..end);
            record.generation += 1;
        }
    }
}
