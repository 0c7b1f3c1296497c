use std::sync::Arc;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::{
    domain::{ContextId, DeviceId, DeviceInfo, DeviceSize, SetTarget},
    error::ProtocolError,
};

pub type Settings = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
    WillAppear,
    WillDisappear,
    KeyDown,
    KeyUp,
    TouchTap,
    DialPress,
    DialDown,
    DialUp,
    DialRotate,
    DidReceiveSettings,
    TitleParametersDidChange,
    PropertyInspectorDidAppear,
    PropertyInspectorDidDisappear,
    SendToPlugin,
    DeviceDidConnect,
    DeviceDidDisconnect,
    DidReceiveGlobalSettings,
    ApplicationDidLaunch,
    ApplicationDidTerminate,
    SystemDidWakeUp,
    Other(String),
}

impl EventType {
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "willAppear" => Self::WillAppear,
            "willDisappear" => Self::WillDisappear,
            "keyDown" => Self::KeyDown,
            "keyUp" => Self::KeyUp,
            "touchTap" => Self::TouchTap,
            "dialPress" => Self::DialPress,
            "dialDown" => Self::DialDown,
            "dialUp" => Self::DialUp,
            "dialRotate" => Self::DialRotate,
            "didReceiveSettings" | "settingsDidChange" => Self::DidReceiveSettings,
            "titleParametersDidChange" => Self::TitleParametersDidChange,
            "propertyInspectorDidAppear" => Self::PropertyInspectorDidAppear,
            "propertyInspectorDidDisappear" => Self::PropertyInspectorDidDisappear,
            "sendToPlugin" => Self::SendToPlugin,
            "deviceDidConnect" => Self::DeviceDidConnect,
            "deviceDidDisconnect" => Self::DeviceDidDisconnect,
            "didReceiveGlobalSettings" => Self::DidReceiveGlobalSettings,
            "applicationDidLaunch" => Self::ApplicationDidLaunch,
            "applicationDidTerminate" => Self::ApplicationDidTerminate,
            "systemDidWakeUp" => Self::SystemDidWakeUp,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::WillAppear => "willAppear",
            Self::WillDisappear => "willDisappear",
            Self::KeyDown => "keyDown",
            Self::KeyUp => "keyUp",
            Self::TouchTap => "touchTap",
            Self::DialPress => "dialPress",
            Self::DialDown => "dialDown",
            Self::DialUp => "dialUp",
            Self::DialRotate => "dialRotate",
            Self::DidReceiveSettings => "didReceiveSettings",
            Self::TitleParametersDidChange => "titleParametersDidChange",
            Self::PropertyInspectorDidAppear => "propertyInspectorDidAppear",
            Self::PropertyInspectorDidDisappear => "propertyInspectorDidDisappear",
            Self::SendToPlugin => "sendToPlugin",
            Self::DeviceDidConnect => "deviceDidConnect",
            Self::DeviceDidDisconnect => "deviceDidDisconnect",
            Self::DidReceiveGlobalSettings => "didReceiveGlobalSettings",
            Self::ApplicationDidLaunch => "applicationDidLaunch",
            Self::ApplicationDidTerminate => "applicationDidTerminate",
            Self::SystemDidWakeUp => "systemDidWakeUp",
            Self::Other(raw) => raw,
        }
    }

    pub fn is_plugin_level(&self) -> bool {
        matches!(
            self,
            Self::DeviceDidConnect
                | Self::DeviceDidDisconnect
                | Self::DidReceiveGlobalSettings
                | Self::ApplicationDidLaunch
                | Self::ApplicationDidTerminate
                | Self::SystemDidWakeUp
        )
    }
}

#[derive(Debug)]
struct EventInner {
    event_type: EventType,
    context: Option<ContextId>,
    device: Option<DeviceId>,
    action: Option<String>,
    payload: Settings,
    raw: Value,
}

/// One inbound host message. Cheap to clone; never mutated after parsing.
#[derive(Debug, Clone)]
pub struct Event(Arc<EventInner>);

impl Event {
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let raw: Value = serde_json::from_str(text)?;
        Self::from_value(raw)
    }

    pub fn from_value(raw: Value) -> Result<Self, ProtocolError> {
        let object = raw.as_object().ok_or(ProtocolError::NotAnObject)?;
        let event_type = object
            .get("event")
            .and_then(Value::as_str)
            .map(EventType::from_wire)
            .ok_or(ProtocolError::MissingEvent)?;
        let context = string_field(object, "context").map(ContextId::from);
        let device = string_field(object, "device").map(DeviceId::from);
        let action = string_field(object, "action");
        let payload = object
            .get("payload")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        Ok(Self(Arc::new(EventInner {
            event_type,
            context,
            device,
            action,
            payload,
            raw,
        })))
    }

    pub fn event_type(&self) -> &EventType {
        &self.0.event_type
    }

    pub fn context(&self) -> Option<&ContextId> {
        self.0.context.as_ref()
    }

    pub fn device(&self) -> Option<&DeviceId> {
        self.0.device.as_ref()
    }

    pub fn action(&self) -> Option<&str> {
        self.0.action.as_deref()
    }

    pub fn payload(&self) -> &Settings {
        &self.0.payload
    }

    pub fn raw(&self) -> &Value {
        &self.0.raw
    }

    /// Reads one payload field. Absent and `null` fields are `Ok(None)`;
    /// fields of the wrong shape are reported as [`ProtocolError::MalformedPayload`].
    pub fn payload_field<T: DeserializeOwned>(
        &self,
        field: &str,
    ) -> Result<Option<T>, ProtocolError> {
        decode_field(self.event_type(), self.0.payload.get(field), field)
    }

    pub fn message_field<T: DeserializeOwned>(
        &self,
        field: &str,
    ) -> Result<Option<T>, ProtocolError> {
        decode_field(self.event_type(), self.0.raw.get(field), field)
    }

    pub fn device_info(&self) -> Result<Option<DeviceInfo>, ProtocolError> {
        let Some(device_id) = self.device().cloned() else {
            return Ok(None);
        };
        let wire: Option<DeviceInfoWire> = self.message_field("deviceInfo")?;
        Ok(wire.map(|wire| DeviceInfo {
            device_id,
            name: wire.name,
            device_type: wire.device_type,
            size: wire.size,
        }))
    }
}

fn string_field(object: &Map<String, Value>, field: &str) -> Option<String> {
    object.get(field).and_then(Value::as_str).map(str::to_owned)
}

fn decode_field<T: DeserializeOwned>(
    event_type: &EventType,
    value: Option<&Value>,
    field: &str,
) -> Result<Option<T>, ProtocolError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => T::deserialize(value)
            .map(Some)
            .map_err(|err| ProtocolError::malformed_payload(event_type.as_str(), field, err)),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct DeviceInfoWire {
    name: String,
    #[serde(rename = "type")]
    device_type: i64,
    size: DeviceSize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TitleParameters {
    pub font_family: String,
    pub font_size: i64,
    pub font_style: String,
    pub font_underline: bool,
    pub show_title: bool,
    pub title_alignment: String,
    pub title_color: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApplicationInfo {
    pub language: String,
    pub platform: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PluginInfo {
    pub uuid: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisteredDevice {
    pub id: DeviceId,
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: i64,
    pub size: DeviceSize,
}

impl From<RegisteredDevice> for DeviceInfo {
    fn from(value: RegisteredDevice) -> Self {
        Self {
            device_id: value.id,
            name: value.name,
            device_type: value.device_type,
            size: value.size,
        }
    }
}

/// The `-info` launch argument.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistrationInfo {
    pub application: ApplicationInfo,
    pub plugin: PluginInfo,
    pub device_pixel_ratio: i64,
    pub devices: Vec<RegisteredDevice>,
}

impl RegistrationInfo {
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterPlugin {
    pub event: String,
    pub uuid: String,
}

pub mod command {
    pub const SET_TITLE: &str = "setTitle";
    pub const SET_IMAGE: &str = "setImage";
    pub const SET_STATE: &str = "setState";
    pub const SET_FEEDBACK: &str = "setFeedback";
    pub const SET_FEEDBACK_LAYOUT: &str = "setFeedbackLayout";
    pub const SET_SETTINGS: &str = "setSettings";
    pub const GET_SETTINGS: &str = "getSettings";
    pub const SET_GLOBAL_SETTINGS: &str = "setGlobalSettings";
    pub const GET_GLOBAL_SETTINGS: &str = "getGlobalSettings";
    pub const SHOW_ALERT: &str = "showAlert";
    pub const SHOW_OK: &str = "showOk";
    pub const SEND_TO_PROPERTY_INSPECTOR: &str = "sendToPropertyInspector";
    pub const OPEN_URL: &str = "openUrl";
    pub const LOG_MESSAGE: &str = "logMessage";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl OutboundMessage {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            context: None,
            action: None,
            payload: None,
        }
    }

    pub fn for_context(event: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            context: Some(context.into()),
            ..Self::new(event)
        }
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn set_title(
        context: &ContextId,
        title: &str,
        state: Option<i64>,
        target: SetTarget,
    ) -> Self {
        Self::for_context(command::SET_TITLE, context.as_str())
            .with_payload(targeted_payload("title", title, state, target))
    }

    pub fn set_image(
        context: &ContextId,
        image: &str,
        state: Option<i64>,
        target: SetTarget,
    ) -> Self {
        Self::for_context(command::SET_IMAGE, context.as_str())
            .with_payload(targeted_payload("image", image, state, target))
    }

    pub fn set_state(context: &ContextId, state: i64) -> Self {
        Self::for_context(command::SET_STATE, context.as_str())
            .with_payload(json!({ "state": state }))
    }

    pub fn set_feedback(context: &ContextId, feedback: Settings) -> Self {
        Self::for_context(command::SET_FEEDBACK, context.as_str())
            .with_payload(Value::Object(feedback))
    }

    pub fn set_feedback_layout(context: &ContextId, layout: &str) -> Self {
        Self::for_context(command::SET_FEEDBACK_LAYOUT, context.as_str())
            .with_payload(json!({ "layout": layout }))
    }

    pub fn set_settings(context: &ContextId, settings: &Settings) -> Self {
        Self::for_context(command::SET_SETTINGS, context.as_str())
            .with_payload(Value::Object(settings.clone()))
    }

    pub fn set_global_settings(plugin_uuid: &str, settings: &Settings) -> Self {
        Self::for_context(command::SET_GLOBAL_SETTINGS, plugin_uuid)
            .with_payload(Value::Object(settings.clone()))
    }

    pub fn open_url(url: &str) -> Self {
        Self::new(command::OPEN_URL).with_payload(json!({ "url": url }))
    }

    pub fn log_message(message: &str) -> Self {
        Self::new(command::LOG_MESSAGE).with_payload(json!({ "message": message }))
    }
}

fn targeted_payload(key: &str, value: &str, state: Option<i64>, target: SetTarget) -> Value {
    let mut payload = Map::new();
    payload.insert(key.to_owned(), Value::String(value.to_owned()));
    payload.insert("target".to_owned(), Value::from(target.code()));
    if let Some(state) = state {
        payload.insert("state".to_owned(), Value::from(state));
    }
    Value::Object(payload)
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
