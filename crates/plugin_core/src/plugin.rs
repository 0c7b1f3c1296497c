use shared::{
    domain::{ContextId, DeviceId, DeviceInfo},
    protocol::{command, Event, EventType, OutboundMessage, RegistrationInfo, Settings},
};
use tracing::{debug, info, warn};

use crate::{
    action::ActionInstance,
    catalog::ActionCatalog,
    device::DeviceRegistry,
    error::CoreError,
    observer::PluginObserver,
    outbound::OutboundSender,
    payload::field_or_default,
    router::{EventRouter, RouteOutcome},
};

/// State for one host connection: live actions, attached devices and the
/// cached global settings. Dropping it tears all of that down.
pub struct Plugin {
    plugin_uuid: String,
    router: EventRouter,
    devices: DeviceRegistry,
    global_settings: Settings,
    observers: Vec<Box<dyn PluginObserver>>,
    outbound: OutboundSender,
}

impl Plugin {
    pub fn new(
        plugin_uuid: impl Into<String>,
        info: &RegistrationInfo,
        catalog: ActionCatalog,
        outbound: OutboundSender,
    ) -> Self {
        let mut devices = DeviceRegistry::new();
        for device in &info.devices {
            devices.connect(device.clone().into());
        }

        Self {
            plugin_uuid: plugin_uuid.into(),
            router: EventRouter::new(catalog, outbound.clone()),
            devices,
            global_settings: Settings::new(),
            observers: Vec::new(),
            outbound,
        }
    }

    pub fn plugin_uuid(&self) -> &str {
        &self.plugin_uuid
    }

    pub fn observe(&mut self, observer: impl PluginObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn outbound(&self) -> &OutboundSender {
        &self.outbound
    }

    /// Parses and handles one raw host message. Never fails: problems are logged.
    pub fn handle_text(&mut self, text: &str) {
        let event = match Event::parse(text) {
            Ok(event) => event,
            Err(err) => {
                warn!(%err, "dropping unparseable host message");
                return;
            }
        };
        if let Err(err) = self.handle_event(&event) {
            warn!(%err, event = event.event_type().as_str(), "host event rejected");
        }
    }

    pub fn handle_event(&mut self, event: &Event) -> Result<RouteOutcome, CoreError> {
        if event.event_type().is_plugin_level() {
            self.handle_plugin_event(event);
            return Ok(RouteOutcome::Handled);
        }
        self.router.route(event)
    }

    pub fn action(&self, context: &ContextId) -> Option<&ActionInstance> {
        self.router.registry().lookup(context)
    }

    pub fn actions(&self) -> impl Iterator<Item = &ActionInstance> {
        self.router.registry().iter()
    }

    pub fn action_count(&self) -> usize {
        self.router.registry().len()
    }

    /// Entry point for [`PluginCommand`](crate::transport::PluginCommand)s
    /// that touch one action.
    pub fn with_action<R>(
        &mut self,
        context: &ContextId,
        f: impl FnOnce(&mut ActionInstance) -> R,
    ) -> Result<R, CoreError> {
        self.router.with_action(context, f)
    }

    pub fn device(&self, device: &DeviceId) -> Option<&DeviceInfo> {
        self.devices.get(device)
    }

    pub fn device_of(&self, context: &ContextId) -> Option<&DeviceInfo> {
        self.action(context)
            .and_then(|action| self.devices.get(action.device_id()))
    }

    pub fn devices(&self) -> &DeviceRegistry {
        &self.devices
    }

    pub fn global_settings(&self) -> &Settings {
        &self.global_settings
    }

    pub fn set_global_settings(&mut self, settings: Settings) {
        self.outbound.send(OutboundMessage::set_global_settings(
            &self.plugin_uuid,
            &settings,
        ));
        self.global_settings = settings;
    }

    /// Answered by a `didReceiveGlobalSettings` event.
    pub fn get_global_settings(&self) {
        self.outbound.send(OutboundMessage::for_context(
            command::GET_GLOBAL_SETTINGS,
            self.plugin_uuid.as_str(),
        ));
    }

    pub fn open_url(&self, url: &str) {
        self.outbound.send(OutboundMessage::open_url(url));
    }

    pub fn log_message(&self, message: &str) {
        self.outbound.send(OutboundMessage::log_message(message));
    }

    pub fn disconnect(&mut self) {
        self.router.reset();
        self.devices.clear();
    }

    fn handle_plugin_event(&mut self, event: &Event) {
        match event.event_type() {
            EventType::DeviceDidConnect => match event.device_info() {
                Ok(Some(device)) => {
                    info!(device = %device.device_id, name = %device.name, "device connected");
                    for observer in &mut self.observers {
                        observer.device_connected(&device);
                    }
                    self.devices.connect(device);
                }
                Ok(None) => warn!("deviceDidConnect without device information"),
                Err(err) => warn!(%err, "ignoring malformed deviceDidConnect"),
            },
            EventType::DeviceDidDisconnect => {
                let Some(device) = event.device().cloned() else {
                    warn!("deviceDidDisconnect without device id");
                    return;
                };
                if self.devices.disconnect(&device).is_none() {
                    debug!(device = %device, "disconnect for unknown device");
                }
                info!(device = %device, "device disconnected");
                for observer in &mut self.observers {
                    observer.device_disconnected(&device);
                }
            }
            EventType::DidReceiveGlobalSettings => {
                self.global_settings = field_or_default(event, "settings");
                for observer in &mut self.observers {
                    observer.global_settings_received(&self.global_settings);
                }
            }
            EventType::ApplicationDidLaunch | EventType::ApplicationDidTerminate => {
                let application: String = field_or_default(event, "application");
                let launched = *event.event_type() == EventType::ApplicationDidLaunch;
                for observer in &mut self.observers {
                    if launched {
                        observer.application_launched(&application);
                    } else {
                        observer.application_terminated(&application);
                    }
                }
            }
            EventType::SystemDidWakeUp => {
                for observer in &mut self.observers {
                    observer.system_woke_up();
                }
            }
            other => debug!(event = other.as_str(), "unhandled plugin event"),
        }
    }
}

#[cfg(test)]
#[path = "tests/plugin_tests.rs"]
mod tests;
