use std::{fmt, mem};

use serde_json::Value;
use shared::{
    domain::{ContextId, ControllerKind, Coordinates, DeviceId, SetTarget},
    protocol::{command, Event, OutboundMessage, Settings, TitleParameters},
};

use crate::{
    image::Image,
    observer::ActionObserver,
    outbound::OutboundSender,
    payload::{field_or_default, read_field},
};

/// Visual state before the first appear event has been seen.
pub const UNKNOWN_STATE: i64 = -1;

/// Identity fields are fixed at creation; the rest caches host-side values.
pub struct ActionInstance {
    context: ContextId,
    action_uuid: String,
    device: DeviceId,
    settings: Settings,
    state: i64,
    is_pressed: bool,
    is_in_multi_action: bool,
    coordinates: Coordinates,
    controller: ControllerKind,
    title: Option<String>,
    title_parameters: TitleParameters,
    observers: Vec<Box<dyn ActionObserver>>,
    settings_dirty: bool,
    outbound: OutboundSender,
}

impl ActionInstance {
    pub fn new(
        context: ContextId,
        action_uuid: impl Into<String>,
        outbound: OutboundSender,
    ) -> Self {
        Self {
            context,
            action_uuid: action_uuid.into(),
            device: DeviceId::default(),
            settings: Settings::new(),
            state: UNKNOWN_STATE,
            is_pressed: false,
            is_in_multi_action: false,
            coordinates: Coordinates::default(),
            controller: ControllerKind::Unknown,
            title: None,
            title_parameters: TitleParameters::default(),
            observers: Vec::new(),
            settings_dirty: false,
            outbound,
        }
    }

    pub(crate) fn from_appear(context: ContextId, event: &Event, outbound: OutboundSender) -> Self {
        let mut action = Self::new(context, event.action().unwrap_or_default(), outbound);
        action.device = event.device().cloned().unwrap_or_default();
        action.settings = field_or_default(event, "settings");
        action.state = field_or_default(event, "state");
        action.is_in_multi_action = field_or_default(event, "isInMultiAction");
        action.coordinates = field_or_default(event, "coordinates");
        action.controller =
            ControllerKind::from_wire(&field_or_default::<String>(event, "controller"));
        action
    }

    pub fn context(&self) -> &ContextId {
        &self.context
    }

    pub fn action_uuid(&self) -> &str {
        &self.action_uuid
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn setting(&self, key: &str) -> Option<&Value> {
        self.settings.get(key)
    }

    pub fn state(&self) -> i64 {
        self.state
    }

    pub fn is_pressed(&self) -> bool {
        self.is_pressed
    }

    pub fn is_in_multi_action(&self) -> bool {
        self.is_in_multi_action
    }

    pub fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    pub fn controller(&self) -> ControllerKind {
        self.controller
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn title_parameters(&self) -> &TitleParameters {
        &self.title_parameters
    }

    pub fn outbound(&self) -> &OutboundSender {
        &self.outbound
    }

    pub fn subscribe(&mut self, observer: impl ActionObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn subscribe_boxed(&mut self, observer: Box<dyn ActionObserver>) {
        self.observers.push(observer);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn set_title(&self, title: &str, state: Option<i64>, target: SetTarget) {
        self.outbound
            .send(OutboundMessage::set_title(&self.context, title, state, target));
    }

    pub fn set_image(&self, image: Image<'_>, state: Option<i64>, target: SetTarget) {
        self.outbound.send(OutboundMessage::set_image(
            &self.context,
            &image.to_wire(),
            state,
            target,
        ));
    }

    pub fn set_state(&mut self, state: i64) {
        self.state = state;
        self.outbound
            .send(OutboundMessage::set_state(&self.context, state));
    }

    pub fn set_feedback(&self, feedback: Settings) {
        self.outbound
            .send(OutboundMessage::set_feedback(&self.context, feedback));
    }

    pub fn set_feedback_layout(&self, layout: &str) {
        self.outbound
            .send(OutboundMessage::set_feedback_layout(&self.context, layout));
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
        self.push_settings();
    }

    pub fn set_setting(&mut self, key: impl Into<String>, value: Value) {
        self.settings.insert(key.into(), value);
        self.push_settings();
    }

    /// Inserts `key` with `default` only when it is missing. Returns whether
    /// anything was written; an existing key sends nothing.
    pub fn set_setting_default(&mut self, key: impl Into<String>, default: Value) -> bool {
        let key = key.into();
        if self.settings.contains_key(&key) {
            return false;
        }
        self.settings.insert(key, default);
        self.push_settings();
        true
    }

    pub fn get_settings(&self) {
        self.send_command(command::GET_SETTINGS);
    }

    pub fn show_alert(&self) {
        self.send_command(command::SHOW_ALERT);
    }

    pub fn show_ok(&self) {
        self.send_command(command::SHOW_OK);
    }

    pub fn send_to_property_inspector(&self, payload: Value) {
        self.outbound.send(
            OutboundMessage::for_context(command::SEND_TO_PROPERTY_INSPECTOR, self.context.as_str())
                .with_action(self.action_uuid.as_str())
                .with_payload(payload),
        );
    }

    pub fn send_message(&self, event: &str, payload: Value) {
        self.outbound.send(
            OutboundMessage::for_context(event, self.context.as_str()).with_payload(payload),
        );
    }

    fn send_command(&self, event: &str) {
        self.outbound
            .send(OutboundMessage::for_context(event, self.context.as_str()));
    }

    fn push_settings(&mut self) {
        self.outbound
            .send(OutboundMessage::set_settings(&self.context, &self.settings));
        self.settings_dirty = true;
    }

    /// Runs `notify` once per observer. Observers subscribed while it runs are
    /// kept but only see later notifications.
    pub(crate) fn dispatch(&mut self, mut notify: impl FnMut(&mut dyn ActionObserver, &mut Self)) {
        let mut observers = mem::take(&mut self.observers);
        for observer in &mut observers {
            notify(observer.as_mut(), self);
        }
        observers.append(&mut self.observers);
        self.observers = observers;
    }

    /// Delivers one `settings_changed` if local commands touched the settings.
    /// Changes made from inside that callback are reported on the next flush.
    pub(crate) fn flush_settings_changed(&mut self) {
        if mem::take(&mut self.settings_dirty) {
            self.dispatch(|observer, action| observer.settings_changed(action));
        }
    }

    pub(crate) fn refresh_state(&mut self, event: &Event) {
        if let Some(state) = read_field(event, "state") {
            self.state = state;
        }
    }

    pub(crate) fn set_pressed(&mut self, pressed: bool) {
        self.is_pressed = pressed;
    }

    pub(crate) fn replace_settings_from_host(&mut self, settings: Settings) {
        self.settings = settings;
    }

    pub(crate) fn update_title(&mut self, title: Option<String>, parameters: TitleParameters) {
        self.title = title;
        self.title_parameters = parameters;
    }
}

impl fmt::Debug for ActionInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionInstance")
            .field("context", &self.context)
            .field("action_uuid", &self.action_uuid)
            .field("device", &self.device)
            .field("state", &self.state)
            .field("is_pressed", &self.is_pressed)
            .field("is_in_multi_action", &self.is_in_multi_action)
            .field("coordinates", &self.coordinates)
            .field("controller", &self.controller)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "tests/action_tests.rs"]
mod tests;
