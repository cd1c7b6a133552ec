//! Shadow lifecycle fan-out, reload vetoes and disposal

use super::*;
use crate::entity::lifecycle::ShadowState;
use crate::native::headless::HeadlessEngine;

#[test]
fn test_initialization_order() {
    let journal = journal();
    let mut shadow = shadow(1, &journal);
    shadow.add_extension(Tracker::boxed("a", &journal)).unwrap();
    shadow.add_extension(Tracker::boxed("b", &journal)).unwrap();

    let seen = journal.clone();
    shadow.on_initializing(Box::new(move |_| seen.borrow_mut().push("handler:initializing".into())));
    let seen = journal.clone();
    shadow.on_initialized(Box::new(move |_| seen.borrow_mut().push("handler:initialized".into())));

    shadow.initialize().unwrap();
    assert_eq!(shadow.state(), ShadowState::Initializing);
    shadow.post_initialize().unwrap();
    assert_eq!(shadow.state(), ShadowState::Live);

    assert_eq!(
        entries(&journal),
        vec![
            "logic:initialize",
            "a:initialize",
            "b:initialize",
            "handler:initializing",
            "logic:post_initialize",
            "a:post_initialize",
            "b:post_initialize",
            "handler:initialized",
        ]
    );
}

#[test]
fn test_removed_handler_is_not_called() {
    let journal = journal();
    let mut shadow = shadow(1, &journal);

    let seen = journal.clone();
    let first = shadow.on_initializing(Box::new(move |_| seen.borrow_mut().push("first".into())));
    let seen = journal.clone();
    shadow.on_initializing(Box::new(move |_| seen.borrow_mut().push("second".into())));

    assert!(shadow.remove_initializing_handler(first));
    assert!(!shadow.remove_initializing_handler(first));
    shadow.initialize().unwrap();

    assert_eq!(entries(&journal), vec!["logic:initialize", "second"]);
}

#[test]
fn test_update_fans_out_to_every_extension() {
    for count in 0..=3 {
        let journal = journal();
        let mut shadow = live_shadow(7, &journal);
        for index in 0..count {
            shadow
                .add_extension(Tracker::boxed(format!("ext{index}"), &journal))
                .unwrap();
        }

        shadow.update(&mut UpdateContext::new(0.016, 1)).unwrap();

        let mut expected = vec!["logic:update 7".to_string()];
        expected.extend((0..count).map(|index| format!("ext{index}:update 7")));
        assert_eq!(entries(&journal), expected, "with {count} extensions");
    }
}

#[test]
fn test_update_requires_live_shadow() {
    let journal = journal();
    let mut shadow = shadow(1, &journal);
    assert!(shadow
        .update(&mut UpdateContext::default())
        .unwrap_err()
        .is_invalid_state());

    shadow.initialize().unwrap();
    assert!(shadow.post_update().unwrap_err().is_invalid_state());
    assert!(entries(&journal).iter().all(|entry| !entry.contains("update")));
}

#[test]
fn test_accepted_reload() {
    let journal = journal();
    let mut shadow = live_shadow(3, &journal);
    shadow.add_extension(Tracker::boxed("a", &journal)).unwrap();

    let seen = journal.clone();
    shadow.on_reloading(Box::new(move |_, _| {
        seen.borrow_mut().push("handler:reloading".into());
        true
    }));
    let seen = journal.clone();
    shadow.on_reloaded(Box::new(move |_, parameters| {
        seen.borrow_mut()
            .push(format!("handler:reloaded {}", parameters.name));
    }));

    let mut parameters = SpawnParameters::new("Recorder", "recycled");
    assert!(shadow.reload(&mut parameters).unwrap());
    assert_eq!(shadow.state(), ShadowState::Reloading);
    shadow.post_reload(&mut parameters).unwrap();
    assert_eq!(shadow.state(), ShadowState::Live);

    assert_eq!(
        entries(&journal),
        vec![
            "logic:reload",
            "a:reload",
            "handler:reloading",
            "logic:post_reload",
            "a:post_reload",
            "handler:reloaded recycled",
        ]
    );
}

#[test]
fn test_extension_veto_short_circuits() {
    for veto_at in 0..3 {
        let journal = journal();
        let mut shadow = live_shadow(3, &journal);
        for index in 0..3 {
            let label = format!("ext{index}");
            let extension = if index == veto_at {
                Tracker::vetoing(label, &journal)
            } else {
                Tracker::boxed(label, &journal)
            };
            shadow.add_extension(extension).unwrap();
        }
        let seen = journal.clone();
        shadow.on_reloading(Box::new(move |_, _| {
            seen.borrow_mut().push("handler:reloading".into());
            true
        }));

        let mut parameters = SpawnParameters::new("Recorder", "recycled");
        assert!(!shadow.reload(&mut parameters).unwrap());

        let mut expected = vec!["logic:reload".to_string()];
        expected.extend((0..=veto_at).map(|index| format!("ext{index}:reload")));
        assert_eq!(entries(&journal), expected, "veto at {veto_at}");

        assert_eq!(shadow.state(), ShadowState::Live);
        assert!(shadow.post_reload(&mut parameters).unwrap_err().is_invalid_state());
    }
}

#[test]
fn test_logic_veto_skips_extensions() {
    let journal = journal();
    let mut shadow = live_shadow(3, &journal);
    shadow.logic_as_mut::<Recorder>().unwrap().accept_reload = false;
    shadow.add_extension(Tracker::boxed("a", &journal)).unwrap();

    let mut parameters = SpawnParameters::new("Recorder", "recycled");
    assert!(!shadow.reload(&mut parameters).unwrap());
    assert_eq!(entries(&journal), vec!["logic:reload"]);

    shadow.update(&mut UpdateContext::default()).unwrap();
}

#[test]
fn test_handler_veto() {
    let journal = journal();
    let mut shadow = live_shadow(3, &journal);
    shadow.on_reloading(Box::new(|_, _| false));

    let seen = journal.clone();
    shadow.on_reloaded(Box::new(move |_, _| seen.borrow_mut().push("reloaded".into())));

    let mut parameters = SpawnParameters::new("Recorder", "recycled");
    assert!(!shadow.reload(&mut parameters).unwrap());
    assert!(!entries(&journal).contains(&"reloaded".to_string()));
}

#[test]
fn test_managed_dispose_is_idempotent() {
    let engine = HeadlessEngine::new();
    let journal = journal();
    let mut shadow = live_shadow(9, &journal);
    shadow.add_extension(Tracker::boxed("a", &journal)).unwrap();
    shadow.add_extension(Tracker::boxed("b", &journal)).unwrap();

    assert!(shadow.dispose(&engine));
    assert!(!shadow.dispose(&engine));
    assert!(!shadow.release_from_native());

    assert_eq!(engine.removed_entities(), vec![(EntityId::new(9), true)]);
    assert_eq!(
        entries(&journal),
        vec!["a:release", "b:release", "logic:dispose native=false"]
    );
    assert_eq!(shadow.state(), ShadowState::Disposed);
    assert!(shadow.extensions().is_empty());
}

#[test]
fn test_native_release_does_not_call_back() {
    let engine = HeadlessEngine::new();
    let journal = journal();
    let mut shadow = live_shadow(9, &journal);
    shadow.add_extension(Tracker::boxed("a", &journal)).unwrap();

    assert!(shadow.release_from_native());
    assert!(!shadow.dispose(&engine));

    assert!(engine.removed_entities().is_empty());
    assert_eq!(entries(&journal), vec!["a:release", "logic:dispose native=true"]);
}

#[test]
fn test_disposed_shadow_rejects_access() {
    let engine = HeadlessEngine::new();
    let journal = journal();
    let mut shadow = live_shadow(4, &journal);
    assert_eq!(shadow.id().unwrap(), EntityId::new(4));

    shadow.dispose(&engine);

    assert!(shadow.is_disposed());
    assert!(shadow.id().unwrap_err().is_invalid_state());
    assert!(shadow.handle().unwrap_err().is_invalid_state());
    assert!(shadow.class_name().unwrap_err().is_invalid_state());
    assert!(shadow
        .add_extension(Tracker::boxed("late", &journal))
        .unwrap_err()
        .is_invalid_state());
    assert!(shadow
        .update(&mut UpdateContext::default())
        .unwrap_err()
        .is_invalid_state());
}

#[test]
fn test_dispose_during_initialization() {
    let engine = HeadlessEngine::new();
    let journal = journal();
    let mut shadow = shadow(5, &journal);
    shadow.initialize().unwrap();

    assert!(shadow.dispose(&engine));
    assert_eq!(shadow.state(), ShadowState::Disposed);
    assert!(shadow.post_initialize().unwrap_err().is_invalid_state());
}

#[test]
fn test_teardown_passes_through_disposing() {
    let journal = journal();
    for reloading in [false, true] {
        let mut shadow = live_shadow(6, &journal);
        if reloading {
            shadow
                .reload(&mut SpawnParameters::new("Recorder", "pooled"))
                .unwrap();
            assert_eq!(shadow.state(), ShadowState::Reloading);
        }

        assert!(shadow.release_from_native());
        assert_eq!(shadow.state(), ShadowState::Disposed);
        assert!(shadow.state().is_disposed());
        assert!(!shadow.release_from_native());
    }
}
