//! Level loading
//!
//! The engine's level system reports loading progress through the native
//! entry points on [`LevelSystem`], which fans every notification out to
//! its subscribers in subscription order. Loading itself is requested
//! through the [`LevelBackend`].

use std::sync::Arc;
use std::time::Duration;

use crate::error::{BridgeError, BridgeResult};
use crate::events::{HandlerId, HandlerList};
use crate::foundation::time::from_seconds;
use crate::native::{LevelBackend, NativeHandle};

/// A level known to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelInfo {
    /// Native level info
    pub handle: NativeHandle,
    /// Level name
    pub name: String,
}

/// Notification raised by the native level system
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelEvent {
    /// A load was requested for a level that does not exist
    NotFound {
        /// Requested name
        name: String,
    },
    /// Loading started
    LoadingStart(LevelInfo),
    /// Entities of the level started spawning
    LoadingEntitiesStart(LevelInfo),
    /// Loading advanced
    LoadingProgress {
        /// Level being loaded
        level: LevelInfo,
        /// Progress reported by the engine
        progress: i32,
    },
    /// Loading finished
    LoadingComplete(LevelInfo),
    /// Loading failed
    LoadingError {
        /// Level being loaded
        level: LevelInfo,
        /// What went wrong
        message: String,
    },
    /// The level was unloaded
    UnloadComplete(LevelInfo),
}

/// Subscriber callback for level notifications
pub type LevelEventHandler = dyn FnMut(&LevelEvent);

/// Managed view of the engine's level system
pub struct LevelSystem {
    backend: Arc<dyn LevelBackend>,
    handlers: HandlerList<LevelEventHandler>,
}

impl LevelSystem {
    /// Level system talking to `backend`
    pub fn new(backend: Arc<dyn LevelBackend>) -> Self {
        Self {
            backend,
            handlers: HandlerList::new(),
        }
    }

    /// Level that is loaded or being loaded
    pub fn current(&self) -> Option<LevelInfo> {
        self.backend.current_level().map(|handle| self.info(handle))
    }

    /// Whether a level finished loading
    pub fn is_loaded(&self) -> bool {
        self.backend.is_level_loaded()
    }

    /// How long the last level took to load
    pub fn last_load_time(&self) -> BridgeResult<Duration> {
        from_seconds(self.backend.last_level_load_time())
    }

    /// Load a level by name
    pub fn load(&mut self, name: &str) -> BridgeResult<LevelInfo> {
        require_name(name)?;
        log::info!("Loading level {name}");
        let handle = self
            .backend
            .load_level(name)
            .ok_or_else(|| BridgeError::Native(format!("Level {name} could not be loaded")))?;
        Ok(self.info(handle))
    }

    /// Start streaming a level that will be loaded next
    pub fn prepare(&mut self, name: &str) -> BridgeResult<()> {
        require_name(name)?;
        self.backend.prepare_next_level(name);
        Ok(())
    }

    /// Unload the current level
    pub fn unload(&mut self) {
        self.backend.unload_level();
    }

    /// Receive level notifications
    pub fn subscribe(&mut self, handler: Box<LevelEventHandler>) -> HandlerId {
        self.handlers.add(handler)
    }

    /// Stop receiving level notifications
    pub fn unsubscribe(&mut self, id: HandlerId) -> bool {
        self.handlers.remove(id)
    }

    /// Native entry point: a requested level does not exist
    pub fn on_level_not_found(&mut self, name: &str) {
        log::warn!("Level {name} was not found");
        self.raise(&LevelEvent::NotFound {
            name: name.to_string(),
        });
    }

    /// Native entry point: loading started
    pub fn on_loading_start(&mut self, level: NativeHandle) {
        let event = LevelEvent::LoadingStart(self.info(level));
        self.raise(&event);
    }

    /// Native entry point: entities started spawning
    pub fn on_loading_entities_start(&mut self, level: NativeHandle) {
        let event = LevelEvent::LoadingEntitiesStart(self.info(level));
        self.raise(&event);
    }

    /// Native entry point: loading advanced
    pub fn on_loading_progress(&mut self, level: NativeHandle, progress: i32) {
        let event = LevelEvent::LoadingProgress {
            level: self.info(level),
            progress,
        };
        self.raise(&event);
    }

    /// Native entry point: loading finished
    pub fn on_loading_complete(&mut self, level: NativeHandle) {
        let info = self.info(level);
        log::info!("Level {} loaded", info.name);
        self.raise(&LevelEvent::LoadingComplete(info));
    }

    /// Native entry point: loading failed
    pub fn on_loading_error(&mut self, level: NativeHandle, message: &str) {
        let info = self.info(level);
        log::error!("Level {} failed to load: {message}", info.name);
        self.raise(&LevelEvent::LoadingError {
            level: info,
            message: message.to_string(),
        });
    }

    /// Native entry point: the level was unloaded
    pub fn on_unload_complete(&mut self, level: NativeHandle) {
        let event = LevelEvent::UnloadComplete(self.info(level));
        self.raise(&event);
    }

    /// Drop every subscriber
    pub fn shutdown(&mut self) {
        self.handlers.clear();
    }

    fn info(&self, handle: NativeHandle) -> LevelInfo {
        let name = self.backend.level_name(handle).unwrap_or_else(|| {
            log::warn!("Level {handle} has no name");
            String::new()
        });
        LevelInfo { handle, name }
    }

    fn raise(&mut self, event: &LevelEvent) {
        log::debug!("Level event {event:?}");
        for handler in self.handlers.iter_mut() {
            handler(event);
        }
    }
}

fn require_name(name: &str) -> BridgeResult<()> {
    if name.trim().is_empty() {
        return Err(BridgeError::argument("name", "Name of the level cannot be empty."));
    }
    Ok(())
}
