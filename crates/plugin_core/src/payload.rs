use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{domain::TapPosition, protocol::Event};
use tracing::debug;

/// Reads a payload field, treating wrong-shaped values like absent ones.
pub(crate) fn read_field<T: DeserializeOwned>(event: &Event, field: &str) -> Option<T> {
    match event.payload_field(field) {
        Ok(value) => value,
        Err(err) => {
            debug!(
                %err,
                context = event.context().map(|c| c.as_str()).unwrap_or_default(),
                "ignoring malformed payload field"
            );
            None
        }
    }
}

pub(crate) fn field_or_default<T: DeserializeOwned + Default>(event: &Event, field: &str) -> T {
    read_field(event, field).unwrap_or_default()
}

/// `tapPos` slots are read one by one; a short or oddly typed array still
/// yields whatever coordinates it carries.
pub(crate) fn tap_position(event: &Event) -> TapPosition {
    let slots: Vec<Value> = field_or_default(event, "tapPos");
    TapPosition {
        x: int_at(&slots, 0),
        y: int_at(&slots, 1),
    }
}

fn int_at(slots: &[Value], index: usize) -> i64 {
    slots
        .get(index)
        .and_then(|slot| slot.as_i64().or_else(|| slot.as_f64().map(|v| v as i64)))
        .unwrap_or_default()
}
