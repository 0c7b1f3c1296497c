//! Demo action: a key or dial that counts presses and ticks.

use plugin_core::{ActionInstance, ActionObserver};
use serde_json::{json, Value};
use shared::{
    domain::{ControllerKind, SetTarget, TapPosition},
    protocol::{Event, Settings},
};
use tracing::debug;

pub const COUNTER_ACTION: &str = "com.example.deckplugin.counter";

const COUNT_KEY: &str = "count";
const STEP_KEY: &str = "step";
const FEEDBACK_LAYOUT: &str = "$B1";

#[derive(Debug, Default)]
pub struct CounterAction;

impl CounterAction {
    fn count(action: &ActionInstance) -> i64 {
        action
            .setting(COUNT_KEY)
            .and_then(Value::as_i64)
            .unwrap_or_default()
    }

    fn step(action: &ActionInstance) -> i64 {
        action
            .setting(STEP_KEY)
            .and_then(Value::as_i64)
            .unwrap_or(1)
    }

    fn add(action: &mut ActionInstance, delta: i64) {
        let count = Self::count(action).saturating_add(delta);
        action.set_setting(COUNT_KEY, json!(count));
    }

    fn reset(action: &mut ActionInstance) {
        action.set_setting(COUNT_KEY, json!(0));
        action.show_ok();
    }

    fn render(action: &ActionInstance) {
        let count = Self::count(action);
        action.set_title(&count.to_string(), None, SetTarget::HardwareAndSoftware);
        if action.controller() == ControllerKind::Encoder {
            let mut feedback = Settings::new();
            feedback.insert("title".into(), json!("Count"));
            feedback.insert("value".into(), json!(count));
            action.set_feedback(feedback);
        }
    }
}

impl ActionObserver for CounterAction {
    fn initialized(&mut self, action: &mut ActionInstance) {
        if action.controller() == ControllerKind::Encoder {
            action.set_feedback_layout(FEEDBACK_LAYOUT);
        }
        let inserted_count = action.set_setting_default(COUNT_KEY, json!(0));
        let inserted_step = action.set_setting_default(STEP_KEY, json!(1));
        // Otherwise settings_changed renders once the defaults are stored.
        if !inserted_count && !inserted_step {
            Self::render(action);
        }
    }

    fn settings_changed(&mut self, action: &mut ActionInstance) {
        Self::render(action);
    }

    fn key_down(&mut self, action: &mut ActionInstance, _event: &Event) {
        let step = Self::step(action);
        Self::add(action, step);
    }

    fn touch_tap(
        &mut self,
        action: &mut ActionInstance,
        position: TapPosition,
        hold: bool,
        _event: &Event,
    ) {
        debug!(context = %action.context(), x = position.x, y = position.y, hold, "touch tap");
        if hold {
            Self::reset(action);
        } else {
            let step = Self::step(action);
            Self::add(action, step);
        }
    }

    fn dial_pressed(&mut self, action: &mut ActionInstance, _event: &Event) {
        Self::reset(action);
    }

    fn dial_rotated(&mut self, action: &mut ActionInstance, delta: i64, _event: &Event) {
        let step = Self::step(action);
        Self::add(action, delta.saturating_mul(step));
    }

    fn message_from_property_inspector(
        &mut self,
        action: &mut ActionInstance,
        payload: &Settings,
        _event: &Event,
    ) {
        match payload.get("command").and_then(Value::as_str) {
            Some("reset") => Self::reset(action),
            Some("sync") => {
                let settings = Value::Object(action.settings().clone());
                action.send_to_property_inspector(settings);
            }
            other => debug!(command = ?other, "ignoring property inspector message"),
        }
    }
}

#[cfg(test)]
#[path = "tests/counter_tests.rs"]
mod tests;
