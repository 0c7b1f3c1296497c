use std::{cell::Cell, collections::HashMap, rc::Rc};

use super::*;
use serde_json::{json, Value};
use shared::{
    domain::{ControllerKind, Coordinates, SetTarget, TapPosition},
    protocol::OutboundMessage,
};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::observer::{ActionObserver, ChannelObserver, Notification, NotificationKind};

const TEST_ACTION: &str = "com.example.test";

fn envelope(value: Value) -> Event {
    Event::from_value(value).expect("event")
}

fn appear_with(context: &str, payload: Value) -> Event {
    envelope(json!({
        "event": "willAppear",
        "action": TEST_ACTION,
        "context": context,
        "device": "dev-1",
        "payload": payload,
    }))
}

fn appear(context: &str) -> Event {
    appear_with(
        context,
        json!({
            "settings": { "count": 2 },
            "state": 1,
            "isInMultiAction": true,
            "coordinates": { "column": 3, "row": 1 },
            "controller": "Encoder",
        }),
    )
}

fn action_event(event: &str, context: &str, payload: Value) -> Event {
    envelope(json!({
        "event": event,
        "action": TEST_ACTION,
        "context": context,
        "device": "dev-1",
        "payload": payload,
    }))
}

fn test_router() -> (
    EventRouter,
    UnboundedReceiver<Notification>,
    UnboundedReceiver<OutboundMessage>,
) {
    let (outbound, outbound_rx) = OutboundSender::channel();
    let (observer, notifications) = ChannelObserver::new();
    let catalog = ActionCatalog::new().with(TEST_ACTION, move |_| observer.clone());
    (EventRouter::new(catalog, outbound), notifications, outbound_rx)
}

fn drain<T>(rx: &mut UnboundedReceiver<T>) -> Vec<T> {
    let mut items = Vec::new();
    while let Ok(item) = rx.try_recv() {
        items.push(item);
    }
    items
}

fn kinds(rx: &mut UnboundedReceiver<Notification>) -> Vec<NotificationKind> {
    drain(rx).iter().map(Notification::kind).collect()
}

fn ctx(raw: &str) -> ContextId {
    ContextId::from(raw)
}

#[test]
fn appear_creates_instance_from_payload() {
    let (mut router, mut notifications, _outbound) = test_router();

    let outcome = router.route(&appear("a")).expect("appear");
    assert_eq!(outcome, RouteOutcome::Created(ctx("a")));

    let action = router.registry().lookup(&ctx("a")).expect("live");
    assert_eq!(action.action_uuid(), TEST_ACTION);
    assert_eq!(action.device_id().as_str(), "dev-1");
    assert_eq!(action.state(), 1);
    assert!(action.is_in_multi_action());
    assert_eq!(action.coordinates(), Coordinates { column: 3, row: 1 });
    assert_eq!(action.controller(), ControllerKind::Encoder);
    assert_eq!(action.setting("count"), Some(&json!(2)));
    assert!(!action.is_pressed());

    assert_eq!(
        kinds(&mut notifications),
        vec![NotificationKind::Initialized, NotificationKind::EventReceived]
    );
}

#[test]
fn appear_with_empty_payload_uses_defaults() {
    let (mut router, _notifications, _outbound) = test_router();
    router
        .route(&appear_with("a", json!({ "controller": "joystick", "coordinates": "bad" })))
        .expect("appear");

    let action = router.registry().lookup(&ctx("a")).expect("live");
    assert_eq!(action.state(), 0);
    assert_eq!(action.controller(), ControllerKind::Unknown);
    assert_eq!(action.coordinates(), Coordinates::default());
    assert!(action.settings().is_empty());
}

#[test]
fn instance_lives_exactly_between_appear_and_disappear() {
    let (mut router, mut notifications, _outbound) = test_router();
    assert!(router.registry().is_empty());

    router.route(&appear("a")).expect("appear");
    assert_eq!(router.registry().len(), 1);
    router
        .route(&action_event("keyDown", "a", json!({ "state": 0 })))
        .expect("key down");
    assert_eq!(router.registry().len(), 1);

    let outcome = router
        .route(&action_event("willDisappear", "a", json!({})))
        .expect("disappear");
    assert_eq!(outcome, RouteOutcome::Destroyed(ctx("a")));
    assert!(router.registry().is_empty());

    let seen = kinds(&mut notifications);
    assert_eq!(
        &seen[seen.len() - 2..],
        &[NotificationKind::WillDisappear, NotificationKind::EventReceived]
    );
}

#[test]
fn disappear_without_appear_is_a_noop() {
    let (mut router, mut notifications, _outbound) = test_router();
    router.route(&appear("a")).expect("appear");
    drain(&mut notifications);

    let outcome = router
        .route(&action_event("willDisappear", "ghost", json!({})))
        .expect("disappear");
    assert_eq!(outcome, RouteOutcome::Dropped);
    assert_eq!(router.registry().len(), 1);
    assert!(drain(&mut notifications).is_empty());
}

#[test]
fn duplicate_appear_fails_and_keeps_existing_instance() {
    let (mut router, mut notifications, _outbound) = test_router();
    router.route(&appear("a")).expect("appear");
    drain(&mut notifications);

    let err = router
        .route(&appear_with("a", json!({ "state": 7, "controller": "keypad" })))
        .expect_err("duplicate");
    assert!(matches!(err, CoreError::DuplicateIdentifier(ref id) if id.as_str() == "a"));

    let action = router.registry().lookup(&ctx("a")).expect("live");
    assert_eq!(action.state(), 1);
    assert_eq!(action.controller(), ControllerKind::Encoder);
    assert_eq!(action.observer_count(), 1);
    assert!(drain(&mut notifications).is_empty());
}

#[test]
fn duplicate_appear_does_not_build_another_observer() {
    let (outbound, _outbound_rx) = OutboundSender::channel();
    let built = Rc::new(Cell::new(0));
    let counter = Rc::clone(&built);
    let catalog = ActionCatalog::new().with(TEST_ACTION, move |_| {
        counter.set(counter.get() + 1);
        Counter::default()
    });
    let mut router = EventRouter::new(catalog, outbound);

    router.route(&appear("a")).expect("appear");
    router.route(&appear("a")).expect_err("duplicate");
    router.route(&appear("b")).expect("appear");

    assert_eq!(built.get(), 2);
    assert_eq!(router.registry().len(), 2);
}

#[test]
fn events_after_disappear_do_not_resurrect_instance() {
    let (mut router, mut notifications, _outbound) = test_router();
    router.route(&appear("a")).expect("appear");
    router
        .route(&action_event("willDisappear", "a", json!({})))
        .expect("disappear");
    drain(&mut notifications);

    let outcome = router
        .route(&action_event("keyDown", "a", json!({ "state": 1 })))
        .expect("key down");
    assert_eq!(outcome, RouteOutcome::Dropped);
    assert!(router.registry().is_empty());
    assert!(drain(&mut notifications).is_empty());
}

#[test]
fn key_events_track_press_state() {
    let (mut router, mut notifications, _outbound) = test_router();
    router.route(&appear("a")).expect("appear");
    drain(&mut notifications);

    router
        .route(&action_event("keyDown", "a", json!({ "state": 0 })))
        .expect("key down");
    assert!(router.registry().lookup(&ctx("a")).expect("live").is_pressed());

    router
        .route(&action_event("keyUp", "a", json!({ "state": 0 })))
        .expect("key up");
    assert!(!router.registry().lookup(&ctx("a")).expect("live").is_pressed());

    assert_eq!(
        kinds(&mut notifications),
        vec![
            NotificationKind::KeyDown,
            NotificationKind::EventReceived,
            NotificationKind::KeyUp,
            NotificationKind::EventReceived,
        ]
    );
}

#[test]
fn dial_press_fans_out_by_pressed_flag() {
    let (mut router, mut notifications, _outbound) = test_router();
    router.route(&appear("a")).expect("appear");
    drain(&mut notifications);

    router
        .route(&action_event("dialPress", "a", json!({ "pressed": true, "state": 1 })))
        .expect("press");
    assert!(router.registry().lookup(&ctx("a")).expect("live").is_pressed());
    assert_eq!(
        kinds(&mut notifications),
        vec![NotificationKind::DialPressed, NotificationKind::EventReceived]
    );

    router
        .route(&action_event("dialPress", "a", json!({ "pressed": false, "state": 1 })))
        .expect("release");
    assert!(!router.registry().lookup(&ctx("a")).expect("live").is_pressed());
    assert_eq!(
        kinds(&mut notifications),
        vec![NotificationKind::DialReleased, NotificationKind::EventReceived]
    );
}

#[test]
fn dial_down_and_up_map_to_press_and_release() {
    let (mut router, mut notifications, _outbound) = test_router();
    router.route(&appear("a")).expect("appear");
    drain(&mut notifications);

    router
        .route(&action_event("dialDown", "a", json!({})))
        .expect("down");
    router
        .route(&action_event("dialUp", "a", json!({})))
        .expect("up");

    assert_eq!(
        kinds(&mut notifications),
        vec![
            NotificationKind::DialPressed,
            NotificationKind::EventReceived,
            NotificationKind::DialReleased,
            NotificationKind::EventReceived,
        ]
    );
}

#[test]
fn touch_tap_carries_position_and_hold() {
    let (mut router, mut notifications, _outbound) = test_router();
    router.route(&appear("a")).expect("appear");
    drain(&mut notifications);

    router
        .route(&action_event("touchTap", "a", json!({ "tapPos": [12, 34], "hold": true })))
        .expect("tap");

    let seen = drain(&mut notifications);
    assert_eq!(seen.len(), 2);
    match &seen[0] {
        Notification::TouchTap {
            position, hold, ..
        } => {
            assert_eq!(*position, TapPosition { x: 12, y: 34 });
            assert!(*hold);
        }
        other => panic!("expected touch tap, got {other:?}"),
    }
    assert_eq!(seen[1].kind(), NotificationKind::EventReceived);
}

#[test]
fn malformed_payload_fields_fall_back_to_defaults() {
    let (mut router, mut notifications, _outbound) = test_router();
    router.route(&appear("a")).expect("appear");
    drain(&mut notifications);

    router
        .route(&action_event("touchTap", "a", json!({ "tapPos": [12], "hold": "yes" })))
        .expect("tap");
    router
        .route(&action_event("dialRotate", "a", json!({ "ticks": "many" })))
        .expect("rotate");

    let seen = drain(&mut notifications);
    assert!(matches!(
        seen[0],
        Notification::TouchTap { position: TapPosition { x: 12, y: 0 }, hold: false, .. }
    ));
    assert!(matches!(seen[2], Notification::DialRotated { delta: 0, .. }));
}

#[test]
fn tap_position_reads_each_slot_independently() {
    let (mut router, mut notifications, _outbound) = test_router();
    router.route(&appear("a")).expect("appear");
    drain(&mut notifications);

    let cases = [
        (json!([12, 34, 5]), TapPosition { x: 12, y: 34 }),
        (json!([12.0, 34.0]), TapPosition { x: 12, y: 34 }),
        (json!([12.7, "34"]), TapPosition { x: 12, y: 0 }),
        (json!("12,34"), TapPosition { x: 0, y: 0 }),
    ];
    for (tap_pos, expected) in cases {
        router
            .route(&action_event("touchTap", "a", json!({ "tapPos": tap_pos })))
            .expect("tap");
        match &drain(&mut notifications)[0] {
            Notification::TouchTap { position, .. } => assert_eq!(*position, expected),
            other => panic!("expected touch tap, got {other:?}"),
        }
    }
}

#[test]
fn dial_rotate_reports_tick_delta() {
    let (mut router, mut notifications, _outbound) = test_router();
    router.route(&appear("a")).expect("appear");
    drain(&mut notifications);

    router
        .route(&action_event("dialRotate", "a", json!({ "ticks": -3, "pressed": false })))
        .expect("rotate");

    let seen = drain(&mut notifications);
    assert!(matches!(seen[0], Notification::DialRotated { delta: -3, .. }));
    assert_eq!(seen[1].kind(), NotificationKind::EventReceived);
}

#[test]
fn state_refresh_keeps_prior_value_when_absent() {
    let (mut router, _notifications, _outbound) = test_router();
    router.route(&appear("a")).expect("appear");

    router
        .route(&action_event("keyUp", "a", json!({ "state": 0 })))
        .expect("key up");
    assert_eq!(router.registry().lookup(&ctx("a")).expect("live").state(), 0);

    router
        .route(&action_event("dialRotate", "a", json!({ "ticks": 1 })))
        .expect("rotate");
    assert_eq!(router.registry().lookup(&ctx("a")).expect("live").state(), 0);

    router
        .route(&action_event("dialRotate", "a", json!({ "ticks": 1, "state": 1 })))
        .expect("rotate");
    assert_eq!(router.registry().lookup(&ctx("a")).expect("live").state(), 1);
}

#[test]
fn unknown_context_is_dropped() {
    let (mut router, mut notifications, _outbound) = test_router();
    let outcome = router
        .route(&action_event("keyDown", "nobody", json!({})))
        .expect("key down");
    assert_eq!(outcome, RouteOutcome::Dropped);
    assert!(drain(&mut notifications).is_empty());

    let outcome = router
        .route(&envelope(json!({ "event": "keyDown", "payload": {} })))
        .expect("no context");
    assert_eq!(outcome, RouteOutcome::Dropped);
}

#[test]
fn unrecognized_event_only_triggers_generic_notification() {
    let (mut router, mut notifications, _outbound) = test_router();
    router.route(&appear("a")).expect("appear");
    drain(&mut notifications);

    let outcome = router
        .route(&action_event("futureEvent", "a", json!({ "state": 1 })))
        .expect("future");
    assert_eq!(outcome, RouteOutcome::Routed(ctx("a")));
    assert_eq!(kinds(&mut notifications), vec![NotificationKind::EventReceived]);
}

#[test]
fn received_settings_replace_cache() {
    let (mut router, mut notifications, _outbound) = test_router();
    router.route(&appear("a")).expect("appear");
    drain(&mut notifications);

    router
        .route(&action_event(
            "didReceiveSettings",
            "a",
            json!({ "settings": { "label": "x" } }),
        ))
        .expect("settings");

    let action = router.registry().lookup(&ctx("a")).expect("live");
    assert_eq!(action.setting("label"), Some(&json!("x")));
    assert_eq!(action.setting("count"), None);
    assert_eq!(
        kinds(&mut notifications),
        vec![NotificationKind::SettingsChanged, NotificationKind::EventReceived]
    );
}

#[test]
fn title_parameters_are_cached() {
    let (mut router, mut notifications, _outbound) = test_router();
    router.route(&appear("a")).expect("appear");
    drain(&mut notifications);

    router
        .route(&action_event(
            "titleParametersDidChange",
            "a",
            json!({
                "title": "Vol",
                "titleParameters": { "fontSize": 12, "showTitle": true, "titleColor": "#ffffff" },
                "state": 0,
            }),
        ))
        .expect("title");

    let action = router.registry().lookup(&ctx("a")).expect("live");
    assert_eq!(action.title(), Some("Vol"));
    assert_eq!(action.title_parameters().font_size, 12);
    assert!(action.title_parameters().show_title);
    assert_eq!(
        kinds(&mut notifications),
        vec![
            NotificationKind::TitleParametersChanged,
            NotificationKind::EventReceived
        ]
    );
}

#[test]
fn property_inspector_messages_are_forwarded() {
    let (mut router, mut notifications, _outbound) = test_router();
    router.route(&appear("a")).expect("appear");
    drain(&mut notifications);

    router
        .route(&action_event("propertyInspectorDidAppear", "a", json!({})))
        .expect("pi appear");
    router
        .route(&action_event("sendToPlugin", "a", json!({ "command": "reset" })))
        .expect("send to plugin");
    router
        .route(&action_event("propertyInspectorDidDisappear", "a", json!({})))
        .expect("pi disappear");

    let seen = drain(&mut notifications);
    assert_eq!(seen[0].kind(), NotificationKind::PropertyInspectorAppeared);
    match &seen[2] {
        Notification::MessageFromPropertyInspector { payload, .. } => {
            assert_eq!(payload.get("command"), Some(&json!("reset")));
        }
        other => panic!("expected property inspector message, got {other:?}"),
    }
    assert_eq!(seen[4].kind(), NotificationKind::PropertyInspectorDisappeared);
}

#[test]
fn every_routed_envelope_yields_one_generic_notification() {
    let (mut router, mut notifications, _outbound) = test_router();
    let contexts = ["a", "b", "c", "d"];
    for context in contexts {
        router.route(&appear(context)).expect("appear");
    }
    drain(&mut notifications);

    let mut expected: HashMap<NotificationKind, usize> = HashMap::new();
    for i in 0..1000usize {
        let context = contexts[i % contexts.len()];
        let (event, kind) = match i % 7 {
            0 => (action_event("keyDown", context, json!({ "state": 0 })), Some(NotificationKind::KeyDown)),
            1 => (action_event("keyUp", context, json!({ "state": 1 })), Some(NotificationKind::KeyUp)),
            2 => (
                action_event("touchTap", context, json!({ "tapPos": [i, i + 1], "hold": i % 2 == 0 })),
                Some(NotificationKind::TouchTap),
            ),
            3 => (
                action_event("dialPress", context, json!({ "pressed": true })),
                Some(NotificationKind::DialPressed),
            ),
            4 => (
                action_event("dialPress", context, json!({ "pressed": false })),
                Some(NotificationKind::DialReleased),
            ),
            5 => (
                action_event("dialRotate", context, json!({ "ticks": (i as i64 % 5) - 2 })),
                Some(NotificationKind::DialRotated),
            ),
            _ => (action_event("somethingElse", context, json!({})), None),
        };
        if let Some(kind) = kind {
            *expected.entry(kind).or_default() += 1;
        }
        router.route(&event).expect("route");
    }

    let mut counted: HashMap<NotificationKind, usize> = HashMap::new();
    let mut last_event: Option<Event> = None;
    for notification in drain(&mut notifications) {
        let kind = notification.kind();
        *counted.entry(kind).or_default() += 1;
        if kind == NotificationKind::EventReceived {
            let generic = notification.event().expect("envelope").clone();
            if let Some(specialized) = last_event.take() {
                assert_eq!(specialized.raw(), generic.raw());
            }
        } else {
            assert!(last_event.is_none(), "two specialized notifications in a row");
            last_event = notification.event().cloned();
        }
    }

    assert_eq!(counted.remove(&NotificationKind::EventReceived), Some(1000));
    assert_eq!(counted, expected);
}

#[derive(Default)]
struct Counter;

impl ActionObserver for Counter {
    fn initialized(&mut self, action: &mut ActionInstance) {
        action.set_setting_default("count", json!(0));
    }

    fn key_down(&mut self, action: &mut ActionInstance, _event: &Event) {
        let count = action.setting("count").and_then(Value::as_i64).unwrap_or_default() + 1;
        action.set_setting("count", json!(count));
        action.set_title(&count.to_string(), None, SetTarget::HardwareAndSoftware);
    }
}

#[test]
fn observers_can_push_commands_while_handling_events() {
    let (outbound, mut outbound_rx) = OutboundSender::channel();
    let (channel, mut notifications) = ChannelObserver::new();
    let catalog = ActionCatalog::new().with("com.example.counter", move |action| {
        let mut observers: Vec<Box<dyn ActionObserver>> = Vec::new();
        observers.push(Box::new(Counter));
        observers.push(Box::new(channel.clone()));
        assert_eq!(action.state(), 0);
        Fanout(observers)
    });
    let mut router = EventRouter::new(catalog, outbound);

    router
        .route(&envelope(json!({
            "event": "willAppear",
            "action": "com.example.counter",
            "context": "k",
            "payload": { "settings": {}, "controller": "Keypad" },
        })))
        .expect("appear");
    router
        .route(&envelope(json!({
            "event": "keyDown",
            "context": "k",
            "payload": { "state": 0 },
        })))
        .expect("key down");

    let sent = drain(&mut outbound_rx);
    let events: Vec<&str> = sent.iter().map(|m| m.event.as_str()).collect();
    assert_eq!(events, vec!["setSettings", "setSettings", "setTitle"]);
    assert_eq!(sent[2].payload.as_ref().map(|p| p["title"].clone()), Some(json!("1")));

    let action = router.registry().lookup(&ctx("k")).expect("live");
    assert_eq!(action.setting("count"), Some(&json!(1)));
    assert_eq!(action.controller(), ControllerKind::Keypad);

    assert_eq!(
        kinds(&mut notifications),
        vec![
            NotificationKind::Initialized,
            NotificationKind::EventReceived,
            NotificationKind::SettingsChanged,
            NotificationKind::KeyDown,
            NotificationKind::EventReceived,
            NotificationKind::SettingsChanged,
        ]
    );
}

struct Fanout(Vec<Box<dyn ActionObserver>>);

impl ActionObserver for Fanout {
    fn initialized(&mut self, action: &mut ActionInstance) {
        for observer in &mut self.0 {
            observer.initialized(action);
        }
    }

    fn settings_changed(&mut self, action: &mut ActionInstance) {
        for observer in &mut self.0 {
            observer.settings_changed(action);
        }
    }

    fn event_received(&mut self, action: &mut ActionInstance, event: &Event) {
        for observer in &mut self.0 {
            observer.event_received(action, event);
        }
    }

    fn key_down(&mut self, action: &mut ActionInstance, event: &Event) {
        for observer in &mut self.0 {
            observer.key_down(action, event);
        }
    }
}

#[test]
fn actions_without_registered_observer_are_still_tracked() {
    let (mut router, _notifications, _outbound) = test_router();
    router
        .route(&envelope(json!({
            "event": "willAppear",
            "action": "com.example.unregistered",
            "context": "x",
            "payload": {},
        })))
        .expect("appear");

    let action = router.registry().lookup(&ctx("x")).expect("live");
    assert_eq!(action.observer_count(), 0);
}

#[test]
fn with_action_reports_unknown_targets() {
    let (mut router, mut notifications, mut outbound) = test_router();
    router.route(&appear("a")).expect("appear");
    drain(&mut notifications);

    router
        .with_action(&ctx("a"), |action| action.set_setting("k", json!(1)))
        .expect("live");
    assert_eq!(drain(&mut outbound).len(), 1);
    assert_eq!(kinds(&mut notifications), vec![NotificationKind::SettingsChanged]);

    let err = router
        .with_action(&ctx("missing"), |_| ())
        .expect_err("missing");
    assert!(matches!(err, CoreError::UnknownTarget(_)));
}

#[test]
fn reset_drops_all_instances() {
    let (mut router, _notifications, _outbound) = test_router();
    router.route(&appear("a")).expect("appear");
    router.route(&appear("b")).expect("appear");
    router.reset();
    assert!(router.registry().is_empty());
    router.route(&appear("a")).expect("appear after reset");
}
