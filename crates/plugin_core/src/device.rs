use std::collections::HashMap;

use shared::domain::{DeviceId, DeviceInfo};

/// Devices currently attached to the host.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: HashMap<DeviceId, DeviceInfo>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&mut self, device: DeviceInfo) -> Option<DeviceInfo> {
        self.devices.insert(device.device_id.clone(), device)
    }

    pub fn disconnect(&mut self, device: &DeviceId) -> Option<DeviceInfo> {
        self.devices.remove(device)
    }

    pub fn get(&self, device: &DeviceId) -> Option<&DeviceInfo> {
        self.devices.get(device)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceInfo> {
        self.devices.values()
    }

    pub fn clear(&mut self) {
        self.devices.clear();
    }
}
