use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

id_newtype!(ContextId);
id_newtype!(DeviceId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ControllerKind {
    #[default]
    Unknown,
    Keypad,
    Encoder,
}

/// Wire names accepted for [`ControllerKind`], matched case-insensitively.
const CONTROLLER_KINDS: &[(&str, ControllerKind)] = &[
    ("keypad", ControllerKind::Keypad),
    ("encoder", ControllerKind::Encoder),
];

/// Used when the host sends a controller name this build does not know.
const CONTROLLER_KIND_FALLBACK: ControllerKind = ControllerKind::Unknown;

impl ControllerKind {
    pub fn from_wire(raw: &str) -> Self {
        let raw = raw.trim();
        CONTROLLER_KINDS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(raw))
            .map(|(_, kind)| *kind)
            .unwrap_or(CONTROLLER_KIND_FALLBACK)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Keypad => "keypad",
            Self::Encoder => "encoder",
        }
    }
}

impl fmt::Display for ControllerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SetTarget {
    #[default]
    HardwareAndSoftware,
    HardwareOnly,
    SoftwareOnly,
}

impl SetTarget {
    pub fn code(self) -> u8 {
        match self {
            Self::HardwareAndSoftware => 0,
            Self::HardwareOnly => 1,
            Self::SoftwareOnly => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Coordinates {
    pub column: i64,
    pub row: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TapPosition {
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSize {
    pub columns: i64,
    pub rows: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub device_id: DeviceId,
    pub name: String,
    pub device_type: i64,
    pub size: DeviceSize,
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
