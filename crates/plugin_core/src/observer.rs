use shared::{
    domain::{ContextId, DeviceId, DeviceInfo, TapPosition},
    protocol::{Event, Settings},
};
use tokio::sync::mpsc;

use crate::action::ActionInstance;

/// For each routed envelope the specialized callback runs first and
/// [`ActionObserver::event_received`] runs last, exactly once.
#[allow(unused_variables)]
pub trait ActionObserver {
    fn initialized(&mut self, action: &mut ActionInstance) {}

    /// Settings were replaced by the host, or changed locally through
    /// `set_setting`/`set_settings`/`set_setting_default`.
    fn settings_changed(&mut self, action: &mut ActionInstance) {}

    fn event_received(&mut self, action: &mut ActionInstance, event: &Event) {}

    fn key_down(&mut self, action: &mut ActionInstance, event: &Event) {}

    fn key_up(&mut self, action: &mut ActionInstance, event: &Event) {}

    fn touch_tap(
        &mut self,
        action: &mut ActionInstance,
        position: TapPosition,
        hold: bool,
        event: &Event,
    ) {
    }

    fn dial_pressed(&mut self, action: &mut ActionInstance, event: &Event) {}

    fn dial_released(&mut self, action: &mut ActionInstance, event: &Event) {}

    fn dial_rotated(&mut self, action: &mut ActionInstance, delta: i64, event: &Event) {}

    fn title_parameters_changed(&mut self, action: &mut ActionInstance, event: &Event) {}

    fn property_inspector_appeared(&mut self, action: &mut ActionInstance, event: &Event) {}

    fn property_inspector_disappeared(&mut self, action: &mut ActionInstance, event: &Event) {}

    fn message_from_property_inspector(
        &mut self,
        action: &mut ActionInstance,
        payload: &Settings,
        event: &Event,
    ) {
    }

    /// Last callback before the instance is discarded. The instance is already
    /// unreachable through the registry at this point.
    fn will_disappear(&mut self, action: &mut ActionInstance, event: &Event) {}
}

#[allow(unused_variables)]
pub trait PluginObserver {
    fn device_connected(&mut self, device: &DeviceInfo) {}

    fn device_disconnected(&mut self, device: &DeviceId) {}

    fn global_settings_received(&mut self, settings: &Settings) {}

    fn application_launched(&mut self, application: &str) {}

    fn application_terminated(&mut self, application: &str) {}

    fn system_woke_up(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Initialized,
    SettingsChanged,
    EventReceived,
    KeyDown,
    KeyUp,
    TouchTap,
    DialPressed,
    DialReleased,
    DialRotated,
    TitleParametersChanged,
    PropertyInspectorAppeared,
    PropertyInspectorDisappeared,
    MessageFromPropertyInspector,
    WillDisappear,
}

/// Owned form of an [`ActionObserver`] callback, as delivered by [`ChannelObserver`].
#[derive(Debug, Clone)]
pub enum Notification {
    Initialized {
        context: ContextId,
    },
    SettingsChanged {
        context: ContextId,
        settings: Settings,
    },
    EventReceived(Event),
    KeyDown(Event),
    KeyUp(Event),
    TouchTap {
        position: TapPosition,
        hold: bool,
        event: Event,
    },
    DialPressed(Event),
    DialReleased(Event),
    DialRotated {
        delta: i64,
        event: Event,
    },
    TitleParametersChanged(Event),
    PropertyInspectorAppeared(Event),
    PropertyInspectorDisappeared(Event),
    MessageFromPropertyInspector {
        payload: Settings,
        event: Event,
    },
    WillDisappear(Event),
}

impl Notification {
    pub fn kind(&self) -> NotificationKind {
        match self {
            Self::Initialized { .. } => NotificationKind::Initialized,
            Self::SettingsChanged { .. } => NotificationKind::SettingsChanged,
            Self::EventReceived(_) => NotificationKind::EventReceived,
            Self::KeyDown(_) => NotificationKind::KeyDown,
            Self::KeyUp(_) => NotificationKind::KeyUp,
            Self::TouchTap { .. } => NotificationKind::TouchTap,
            Self::DialPressed(_) => NotificationKind::DialPressed,
            Self::DialReleased(_) => NotificationKind::DialReleased,
            Self::DialRotated { .. } => NotificationKind::DialRotated,
            Self::TitleParametersChanged(_) => NotificationKind::TitleParametersChanged,
            Self::PropertyInspectorAppeared(_) => NotificationKind::PropertyInspectorAppeared,
            Self::PropertyInspectorDisappeared(_) => NotificationKind::PropertyInspectorDisappeared,
            Self::MessageFromPropertyInspector { .. } => {
                NotificationKind::MessageFromPropertyInspector
            }
            Self::WillDisappear(_) => NotificationKind::WillDisappear,
        }
    }

    pub fn event(&self) -> Option<&Event> {
        match self {
            Self::Initialized { .. } | Self::SettingsChanged { .. } => None,
            Self::EventReceived(event)
            | Self::KeyDown(event)
            | Self::KeyUp(event)
            | Self::DialPressed(event)
            | Self::DialReleased(event)
            | Self::TitleParametersChanged(event)
            | Self::PropertyInspectorAppeared(event)
            | Self::PropertyInspectorDisappeared(event)
            | Self::WillDisappear(event) => Some(event),
            Self::TouchTap { event, .. }
            | Self::DialRotated { event, .. }
            | Self::MessageFromPropertyInspector { event, .. } => Some(event),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn emit(&self, notification: Notification) {
        // A dropped receiver only means nobody is listening any more.
        let _ = self.tx.send(notification);
    }
}

impl ActionObserver for ChannelObserver {
    fn initialized(&mut self, action: &mut ActionInstance) {
        self.emit(Notification::Initialized {
            context: action.context().clone(),
        });
    }

    fn settings_changed(&mut self, action: &mut ActionInstance) {
        self.emit(Notification::SettingsChanged {
            context: action.context().clone(),
            settings: action.settings().clone(),
        });
    }

    fn event_received(&mut self, _action: &mut ActionInstance, event: &Event) {
        self.emit(Notification::EventReceived(event.clone()));
    }

    fn key_down(&mut self, _action: &mut ActionInstance, event: &Event) {
        self.emit(Notification::KeyDown(event.clone()));
    }

    fn key_up(&mut self, _action: &mut ActionInstance, event: &Event) {
        self.emit(Notification::KeyUp(event.clone()));
    }

    fn touch_tap(
        &mut self,
        _action: &mut ActionInstance,
        position: TapPosition,
        hold: bool,
        event: &Event,
    ) {
        self.emit(Notification::TouchTap {
            position,
            hold,
            event: event.clone(),
        });
    }

    fn dial_pressed(&mut self, _action: &mut ActionInstance, event: &Event) {
        self.emit(Notification::DialPressed(event.clone()));
    }

    fn dial_released(&mut self, _action: &mut ActionInstance, event: &Event) {
        self.emit(Notification::DialReleased(event.clone()));
    }

    fn dial_rotated(&mut self, _action: &mut ActionInstance, delta: i64, event: &Event) {
        self.emit(Notification::DialRotated {
            delta,
            event: event.clone(),
        });
    }

    fn title_parameters_changed(&mut self, _action: &mut ActionInstance, event: &Event) {
        self.emit(Notification::TitleParametersChanged(event.clone()));
    }

    fn property_inspector_appeared(&mut self, _action: &mut ActionInstance, event: &Event) {
        self.emit(Notification::PropertyInspectorAppeared(event.clone()));
    }

    fn property_inspector_disappeared(&mut self, _action: &mut ActionInstance, event: &Event) {
        self.emit(Notification::PropertyInspectorDisappeared(event.clone()));
    }

    fn message_from_property_inspector(
        &mut self,
        _action: &mut ActionInstance,
        payload: &Settings,
        event: &Event,
    ) {
        self.emit(Notification::MessageFromPropertyInspector {
            payload: payload.clone(),
            event: event.clone(),
        });
    }

    fn will_disappear(&mut self, _action: &mut ActionInstance, event: &Event) {
        self.emit(Notification::WillDisappear(event.clone()));
    }
}
