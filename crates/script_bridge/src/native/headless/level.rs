// Levels known to the headless engine

use crate::native::{LevelBackend, NativeHandle};

use super::HeadlessEngine;

#[derive(Default)]
pub(super) struct LevelState {
    levels: Vec<(NativeHandle, String)>,
    current: Option<NativeHandle>,
    loaded: bool,
    load_seconds: f32,
    prepared: Vec<String>,
}

impl HeadlessEngine {
    /// Make a level available for loading
    pub fn add_level(&self, name: &str) -> NativeHandle {
        let handle = self.allocate_handle();
        self.levels.lock().levels.push((handle, name.to_string()));
        handle
    }

    /// Seconds reported for the last level load
    pub fn set_level_load_time(&self, seconds: f32) {
        self.levels.lock().load_seconds = seconds;
    }

    /// Every level name passed to `prepare_next_level`
    pub fn prepared_levels(&self) -> Vec<String> {
        self.levels.lock().prepared.clone()
    }
}

impl LevelBackend for HeadlessEngine {
    fn current_level(&self) -> Option<NativeHandle> {
        self.levels.lock().current
    }

    fn level_name(&self, level: NativeHandle) -> Option<String> {
        self.levels
            .lock()
            .levels
            .iter()
            .find(|(handle, _)| *handle == level)
            .map(|(_, name)| name.clone())
    }

    fn is_level_loaded(&self) -> bool {
        self.levels.lock().loaded
    }

    fn last_level_load_time(&self) -> f32 {
        self.levels.lock().load_seconds
    }

    fn load_level(&self, name: &str) -> Option<NativeHandle> {
        let mut state = self.levels.lock();
        let Some(handle) = state
            .levels
            .iter()
            .find(|(_, level)| level.eq_ignore_ascii_case(name))
            .map(|(handle, _)| *handle)
        else {
            log::warn!("Level {name} does not exist");
            return None;
        };

        state.current = Some(handle);
        state.loaded = true;
        Some(handle)
    }

    fn prepare_next_level(&self, name: &str) {
        self.levels.lock().prepared.push(name.to_string());
    }

    fn unload_level(&self) {
        let mut state = self.levels.lock();
        state.current = None;
        state.loaded = false;
    }
}
