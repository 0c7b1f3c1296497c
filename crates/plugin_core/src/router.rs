use shared::{
    domain::ContextId,
    protocol::{Event, EventType, Settings, TitleParameters},
};
use tracing::{debug, warn};

use crate::{
    action::ActionInstance,
    catalog::ActionCatalog,
    error::CoreError,
    outbound::OutboundSender,
    payload::{field_or_default, read_field, tap_position},
    registry::ActionRegistry,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    Created(ContextId),
    Routed(ContextId),
    Destroyed(ContextId),
    Handled,
    Dropped,
}

/// Sole writer of the registry. Observers only ever see the target instance.
pub struct EventRouter {
    registry: ActionRegistry,
    catalog: ActionCatalog,
    outbound: OutboundSender,
}

impl EventRouter {
    pub fn new(catalog: ActionCatalog, outbound: OutboundSender) -> Self {
        Self {
            registry: ActionRegistry::new(),
            catalog,
            outbound,
        }
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Routes one envelope. Only a duplicate appear is reported as an error;
    /// events for unknown contexts are logged and dropped.
    pub fn route(&mut self, event: &Event) -> Result<RouteOutcome, CoreError> {
        let Some(context) = event.context().cloned() else {
            warn!(
                event = event.event_type().as_str(),
                "dropping action event without context"
            );
            return Ok(RouteOutcome::Dropped);
        };

        match event.event_type() {
            EventType::WillAppear => self.appear(context, event),
            EventType::WillDisappear => Ok(self.disappear(context, event)),
            _ => Ok(self.deliver(context, event)),
        }
    }

    /// Runs `f` against a live instance outside of event dispatch, then reports
    /// any local settings change to its observers.
    pub fn with_action<R>(
        &mut self,
        context: &ContextId,
        f: impl FnOnce(&mut ActionInstance) -> R,
    ) -> Result<R, CoreError> {
        let action = self
            .registry
            .lookup_mut(context)
            .ok_or_else(|| CoreError::UnknownTarget(context.clone()))?;
        let result = f(action);
        action.flush_settings_changed();
        Ok(result)
    }

    pub fn reset(&mut self) {
        if !self.registry.is_empty() {
            debug!(actions = self.registry.len(), "dropping live actions");
        }
        self.registry.clear();
    }

    fn appear(&mut self, context: ContextId, event: &Event) -> Result<RouteOutcome, CoreError> {
        if self.registry.contains(&context) {
            let err = CoreError::DuplicateIdentifier(context);
            warn!(%err, "host announced a context that is already live");
            return Err(err);
        }

        let mut action = ActionInstance::from_appear(context.clone(), event, self.outbound.clone());
        if let Some(observer) = self.catalog.instantiate(&action) {
            action.subscribe_boxed(observer);
        }

        let action = self.registry.register(action)?;
        debug!(
            context = %context,
            action = action.action_uuid(),
            controller = %action.controller(),
            "action appeared"
        );

        action.dispatch(|observer, action| observer.initialized(action));
        action.dispatch(|observer, action| observer.event_received(action, event));
        action.flush_settings_changed();
        Ok(RouteOutcome::Created(context))
    }

    fn disappear(&mut self, context: ContextId, event: &Event) -> RouteOutcome {
        // Unreachable through the registry before any observer runs.
        let Some(mut action) = self.registry.unregister(&context) else {
            warn!(context = %context, "disappear for a context that is not live");
            return RouteOutcome::Dropped;
        };
        debug!(context = %context, "action disappeared");

        action.refresh_state(event);
        action.dispatch(|observer, action| observer.will_disappear(action, event));
        action.dispatch(|observer, action| observer.event_received(action, event));
        drop(action);
        RouteOutcome::Destroyed(context)
    }

    fn deliver(&mut self, context: ContextId, event: &Event) -> RouteOutcome {
        let Some(action) = self.registry.lookup_mut(&context) else {
            let err = CoreError::UnknownTarget(context);
            warn!(%err, event = event.event_type().as_str(), "dropping event");
            return RouteOutcome::Dropped;
        };

        action.refresh_state(event);

        match event.event_type() {
            EventType::KeyDown => {
                action.set_pressed(true);
                action.dispatch(|observer, action| observer.key_down(action, event));
            }
            EventType::KeyUp => {
                action.set_pressed(false);
                action.dispatch(|observer, action| observer.key_up(action, event));
            }
            EventType::TouchTap => {
                let position = tap_position(event);
                let hold: bool = field_or_default(event, "hold");
                action.dispatch(|observer, action| {
                    observer.touch_tap(action, position, hold, event)
                });
            }
            EventType::DialPress => {
                let pressed: bool = field_or_default(event, "pressed");
                press_dial(action, pressed, event);
            }
            EventType::DialDown => press_dial(action, true, event),
            EventType::DialUp => press_dial(action, false, event),
            EventType::DialRotate => {
                let ticks: i64 = field_or_default(event, "ticks");
                action.dispatch(|observer, action| observer.dial_rotated(action, ticks, event));
            }
            EventType::DidReceiveSettings => {
                let settings: Settings = field_or_default(event, "settings");
                action.replace_settings_from_host(settings);
                action.dispatch(|observer, action| observer.settings_changed(action));
            }
            EventType::TitleParametersDidChange => {
                let title: Option<String> = read_field(event, "title");
                let parameters: TitleParameters = field_or_default(event, "titleParameters");
                action.update_title(title, parameters);
                action.dispatch(|observer, action| {
                    observer.title_parameters_changed(action, event)
                });
            }
            EventType::PropertyInspectorDidAppear => {
                action.dispatch(|observer, action| {
                    observer.property_inspector_appeared(action, event)
                });
            }
            EventType::PropertyInspectorDidDisappear => {
                action.dispatch(|observer, action| {
                    observer.property_inspector_disappeared(action, event)
                });
            }
            EventType::SendToPlugin => {
                action.dispatch(|observer, action| {
                    observer.message_from_property_inspector(action, event.payload(), event)
                });
            }
            other => {
                debug!(event = other.as_str(), context = %context, "no specialized notification");
            }
        }

        action.dispatch(|observer, action| observer.event_received(action, event));
        action.flush_settings_changed();
        RouteOutcome::Routed(context)
    }
}

fn press_dial(action: &mut ActionInstance, pressed: bool, event: &Event) {
    action.set_pressed(pressed);
    if pressed {
        action.dispatch(|observer, action| observer.dial_pressed(action, event));
    } else {
        action.dispatch(|observer, action| observer.dial_released(action, event));
    }
}

#[cfg(test)]
#[path = "tests/router_tests.rs"]
mod tests;
