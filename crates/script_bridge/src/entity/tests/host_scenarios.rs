//! Native entry points routed through the shadow host

use std::sync::Arc;

use super::*;
use crate::entity::host::ShadowHost;
use crate::entity::property::{
    EditableProperty, EditablePropertyType, PropertyAttribute, PropertyTable, UiControl,
};
use crate::entity::registry::{EntityClass, EntityClassRegistry};
use crate::entity::sync::MemorySync;
use crate::error::BridgeError;
use crate::native::headless::HeadlessEngine;

fn recorder_properties() -> PropertyTable {
    let health = EditableProperty::new(
        "health",
        EditablePropertyType::Int,
        Some(PropertyAttribute::new(UiControl::IntEdit, "Hit points").with_default(100)),
        |logic: &Recorder| logic.health,
        |logic: &mut Recorder, value| logic.health = value,
    )
    .unwrap();
    let speed = EditableProperty::new(
        "speed",
        EditablePropertyType::Float,
        Some(PropertyAttribute::new(UiControl::NumberEdit, "Meters per second").with_limits(0.0, 10.0)),
        |logic: &Recorder| logic.speed,
        |logic: &mut Recorder, value| logic.speed = value,
    )
    .unwrap();

    PropertyTable::new()
        .begin_folder("Stats")
        .with(health)
        .with(speed)
        .end_folder("Stats")
}

fn host(journal: &Journal) -> (Arc<HeadlessEngine>, ShadowHost) {
    let mut classes = EntityClassRegistry::new();
    let recorder_journal = journal.clone();
    classes
        .register(
            EntityClass::new("Recorder", move |_, _| {
                Ok(Box::new(Recorder::new(&recorder_journal)))
            })
            .with_properties(recorder_properties()),
        )
        .unwrap();
    classes
        .register(EntityClass::new("Broken", |_, id| {
            Err(BridgeError::Native(format!("no logic for {id}")))
        }))
        .unwrap();

    let engine = Arc::new(HeadlessEngine::new());
    let host = ShadowHost::new(Arc::new(classes), engine.clone());
    (engine, host)
}

fn spawn(host: &mut ShadowHost, id: u32) -> EntityId {
    let id = host
        .create_shadow("Recorder", EntityId::new(id), handle(u64::from(id)))
        .unwrap();
    host.initializing(id).unwrap();
    host.initialized(id).unwrap();
    id
}

#[test]
fn test_create_shadow_failures_yield_none() {
    let journal = journal();
    let (_, mut host) = host(&journal);

    assert!(host
        .create_shadow("Missing", EntityId::new(1), handle(1))
        .is_none());
    assert!(host
        .create_shadow("Broken", EntityId::new(2), handle(2))
        .is_none());
    assert!(host.is_empty());

    assert_eq!(
        host.create_shadow("Recorder", EntityId::new(3), handle(3)),
        Some(EntityId::new(3))
    );
    assert!(host
        .create_shadow("Recorder", EntityId::new(3), handle(4))
        .is_none());
    assert_eq!(host.len(), 1);
}

#[test]
fn test_unknown_entity_is_invalid_state() {
    let journal = journal();
    let (_, mut host) = host(&journal);
    assert!(host.initializing(EntityId::new(42)).unwrap_err().is_invalid_state());
    assert!(host.remove(EntityId::new(42)).unwrap_err().is_invalid_state());
}

#[test]
fn test_update_all_in_spawn_order() {
    let journal = journal();
    let (_, mut host) = host(&journal);
    spawn(&mut host, 5);
    spawn(&mut host, 2);
    host.create_shadow("Recorder", EntityId::new(9), handle(9))
        .unwrap();
    journal.borrow_mut().clear();

    host.update_all(&mut UpdateContext::new(0.02, 10)).unwrap();
    host.post_update_all().unwrap();

    assert_eq!(
        entries(&journal),
        vec!["logic:update 5", "logic:update 2", "logic:post_update", "logic:post_update"]
    );
}

#[test]
fn test_editable_properties_through_host() {
    let journal = journal();
    let (_, mut host) = host(&journal);
    let id = spawn(&mut host, 1);

    assert_eq!(host.get_editable_property(id, 1).unwrap(), "100");
    assert_eq!(host.get_editable_property(id, 2).unwrap(), "1.5");

    host.set_editable_property(id, 1, "75").unwrap();
    host.set_editable_property(id, 2, " 3.25 ").unwrap();
    assert_eq!(host.shadow(id).unwrap().logic_as::<Recorder>().unwrap().health, 75);
    assert_eq!(host.get_editable_property(id, 2).unwrap(), "3.25");

    assert!(matches!(
        host.set_editable_property(id, 1, "lots"),
        Err(BridgeError::Argument { .. })
    ));
    assert!(host.get_editable_property(id, 0).is_err());
    assert!(matches!(
        host.get_editable_property(id, 17),
        Err(BridgeError::OutOfRange { .. })
    ));
}

#[test]
fn test_synchronize_through_host() {
    let journal = journal();
    let (_, mut host) = host(&journal);
    let source = spawn(&mut host, 1);
    let target = spawn(&mut host, 2);
    host.set_editable_property(source, 1, "12").unwrap();

    let mut writer = MemorySync::writer();
    host.synchronize(source, &mut writer).unwrap();

    let mut reader = MemorySync::from_snapshot(&writer.snapshot().unwrap()).unwrap();
    host.synchronize(target, &mut reader).unwrap();

    assert!(reader.is_exhausted());
    assert_eq!(host.get_editable_property(target, 1).unwrap(), "12");
}

#[test]
fn test_reload_through_host() {
    let journal = journal();
    let (_, mut host) = host(&journal);
    let id = spawn(&mut host, 1);
    let mut parameters = SpawnParameters::new("Recorder", "pooled");

    assert!(host.reloading(id, &mut parameters).unwrap());
    host.reloaded(id, &mut parameters).unwrap();

    host.shadow_mut(id)
        .unwrap()
        .logic_as_mut::<Recorder>()
        .unwrap()
        .accept_reload = false;
    assert!(!host.reloading(id, &mut parameters).unwrap());
    assert!(host.reloaded(id, &mut parameters).unwrap_err().is_invalid_state());
}

#[test]
fn test_native_dispose_and_managed_removal() {
    let journal = journal();
    let (engine, mut host) = host(&journal);
    let native = spawn(&mut host, 1);
    let managed = spawn(&mut host, 2);
    journal.borrow_mut().clear();

    host.dispose(native).unwrap();
    host.remove(managed).unwrap();

    assert!(host.is_empty());
    assert_eq!(engine.removed_entities(), vec![(managed, true)]);
    assert_eq!(
        entries(&journal),
        vec!["logic:dispose native=true", "logic:dispose native=false"]
    );
    assert!(host.dispose(native).unwrap_err().is_invalid_state());
}

#[test]
fn test_shutdown_removes_newest_first() {
    let journal = journal();
    let (engine, mut host) = host(&journal);
    for id in 1..=3 {
        spawn(&mut host, id);
    }

    host.shutdown();

    assert!(host.is_empty());
    assert_eq!(
        engine.removed_entities(),
        vec![
            (EntityId::new(3), true),
            (EntityId::new(2), true),
            (EntityId::new(1), true),
        ]
    );
}
