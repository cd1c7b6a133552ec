//! Lifecycle scenarios across shadows, extensions and the host
//!
//! Participants append to a shared journal so the tests can assert the exact
//! order in which native calls fan out.

mod host_scenarios;
mod shadow_scenarios;

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::entity::shadow::{EntityLogic, EntityShadow, ShadowInfo};
use crate::entity::spawn::{SpawnParameters, UpdateContext};
use crate::entity::sync::SyncContext;
use crate::entity::extension::EntityExtension;
use crate::error::BridgeResult;
use crate::native::{EntityId, NativeHandle};

type Journal = Rc<RefCell<Vec<String>>>;

fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

fn entries(journal: &Journal) -> Vec<String> {
    journal.borrow().clone()
}

/// Class logic that records every hook
struct Recorder {
    journal: Journal,
    accept_reload: bool,
    health: i32,
    speed: f32,
}

impl Recorder {
    fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            accept_reload: true,
            health: 100,
            speed: 1.5,
        }
    }

    fn note(&self, event: &str) {
        self.journal.borrow_mut().push(format!("logic:{event}"));
    }
}

impl EntityLogic for Recorder {
    fn initialize(&mut self, _info: &ShadowInfo) -> BridgeResult<()> {
        self.note("initialize");
        Ok(())
    }

    fn post_initialize(&mut self, _info: &ShadowInfo) -> BridgeResult<()> {
        self.note("post_initialize");
        Ok(())
    }

    fn update(&mut self, info: &ShadowInfo, _context: &mut UpdateContext) -> BridgeResult<()> {
        self.note(&format!("update {}", info.id()));
        Ok(())
    }

    fn post_update(&mut self, _info: &ShadowInfo) -> BridgeResult<()> {
        self.note("post_update");
        Ok(())
    }

    fn reload(&mut self, _info: &ShadowInfo, _parameters: &mut SpawnParameters) -> BridgeResult<bool> {
        self.note("reload");
        Ok(self.accept_reload)
    }

    fn post_reload(&mut self, _info: &ShadowInfo, _parameters: &mut SpawnParameters) -> BridgeResult<()> {
        self.note("post_reload");
        Ok(())
    }

    fn synchronize(&mut self, _info: &ShadowInfo, context: &mut dyn SyncContext) -> BridgeResult<()> {
        context.begin_group("recorder")?;
        context.value_i32("health", &mut self.health)?;
        context.value_f32("speed", &mut self.speed)?;
        context.end_group()
    }

    fn dispose(&mut self, _info: &ShadowInfo, invoked_from_native: bool) {
        self.note(&format!("dispose native={invoked_from_native}"));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Extension that records every hook and can veto reloads
struct Tracker {
    label: String,
    journal: Journal,
    accept_reload: bool,
}

impl Tracker {
    fn boxed(label: impl Into<String>, journal: &Journal) -> Box<dyn EntityExtension> {
        Box::new(Self {
            label: label.into(),
            journal: journal.clone(),
            accept_reload: true,
        })
    }

    fn vetoing(label: impl Into<String>, journal: &Journal) -> Box<dyn EntityExtension> {
        Box::new(Self {
            label: label.into(),
            journal: journal.clone(),
            accept_reload: false,
        })
    }

    fn note(&self, event: &str) {
        self.journal
            .borrow_mut()
            .push(format!("{}:{event}", self.label));
    }
}

impl EntityExtension for Tracker {
    fn initialize(&mut self, _info: &ShadowInfo) -> BridgeResult<()> {
        self.note("initialize");
        Ok(())
    }

    fn post_initialize(&mut self, _info: &ShadowInfo) -> BridgeResult<()> {
        self.note("post_initialize");
        Ok(())
    }

    fn update(&mut self, info: &ShadowInfo, _context: &mut UpdateContext) -> BridgeResult<()> {
        self.note(&format!("update {}", info.id()));
        Ok(())
    }

    fn reload(&mut self, _info: &ShadowInfo, _parameters: &mut SpawnParameters) -> BridgeResult<bool> {
        self.note("reload");
        Ok(self.accept_reload)
    }

    fn post_reload(&mut self, _info: &ShadowInfo, _parameters: &mut SpawnParameters) -> BridgeResult<()> {
        self.note("post_reload");
        Ok(())
    }

    fn release(&mut self, _info: &ShadowInfo) {
        self.note("release");
    }

    fn name(&self) -> &str {
        &self.label
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn handle(raw: u64) -> NativeHandle {
    NativeHandle::new(raw).unwrap()
}

fn shadow(id: u32, journal: &Journal) -> EntityShadow {
    EntityShadow::new(
        handle(u64::from(id) + 0x1000),
        EntityId::new(id),
        "Recorder",
        Box::new(Recorder::new(journal)),
    )
}

fn live_shadow(id: u32, journal: &Journal) -> EntityShadow {
    let mut shadow = shadow(id, journal);
    shadow.initialize().unwrap();
    shadow.post_initialize().unwrap();
    journal.borrow_mut().clear();
    shadow
}
