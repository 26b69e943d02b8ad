use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use frida_core::{Device as _, DeviceManager, DeviceType, Engine, Error};

use crate::{
    MockDevice,
    failure::{FailureConfig, Operation},
    state::{Counters, Shared},
};

/// Version reported by a [`MockEngine`] unless overridden.
pub const DEFAULT_VERSION: &str = "16.5.2";

/// A scripted engine.
///
/// Every device manager created by the engine sees the same devices. Only
/// local devices are visible before the manager enumerated its devices.
#[derive(Debug)]
pub struct MockEngine {
    version: String,
    devices: Vec<MockDevice>,
    latency: Option<Duration>,
    shared: Arc<Shared>,
}

impl MockEngine {
    /// Creates an engine without devices.
    pub fn new() -> Self {
        Self {
            version: DEFAULT_VERSION.into(),
            devices: Vec::new(),
            latency: None,
            shared: Arc::default(),
        }
    }

    /// Sets the reported version string.
    pub fn with_version(self, version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..self
        }
    }

    /// Adds a device.
    pub fn with_device(mut self, mut device: MockDevice) -> Self {
        device.shared = Arc::clone(&self.shared);
        self.devices.push(device);
        self
    }

    /// Makes every engine call block for `latency`.
    pub fn with_latency(self, latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..self
        }
    }

    /// Injects a failure.
    pub fn with_failure(self, op: Operation, config: FailureConfig) -> Self {
        self.fail(op, config);
        self
    }

    /// Injects a failure into an engine that is already in use.
    pub fn fail(&self, op: Operation, config: FailureConfig) {
        self.shared.failures().inject(op, config);
    }

    /// Removes an injected failure.
    pub fn clear_failure(&self, op: &Operation) {
        self.shared.failures().clear(op);
    }

    /// Returns the call counters.
    pub fn counters(&self) -> Arc<Counters> {
        Arc::clone(&self.shared.counters)
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for MockEngine {
    type DeviceManager = MockDeviceManager;

    fn version(&self) -> String {
        self.version.clone()
    }

    fn patch_android_selinux(&self) {
        tracing::info!("patching selinux policy");
        self.shared.counters.selinux_patched();
    }

    fn new_device_manager(&self) -> MockDeviceManager {
        sleep(self.latency);
        self.shared.counters.manager_created();

        MockDeviceManager {
            devices: self.devices.clone(),
            enumerated: AtomicBool::new(false),
            latency: self.latency,
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Device manager created by [`MockEngine`].
#[derive(Debug)]
pub struct MockDeviceManager {
    devices: Vec<MockDevice>,
    enumerated: AtomicBool,
    latency: Option<Duration>,
    shared: Arc<Shared>,
}

impl MockDeviceManager {
    /// Returns `true` once devices were enumerated successfully.
    pub fn is_enumerated(&self) -> bool {
        self.enumerated.load(Ordering::SeqCst)
    }

    fn visible(&self) -> impl Iterator<Item = &MockDevice> {
        let enumerated = self.is_enumerated();
        self.devices
            .iter()
            .filter(move |device| enumerated || !device.kind().requires_enumeration())
    }
}

impl DeviceManager for MockDeviceManager {
    type Device = MockDevice;

    fn enumerate_devices(&self) -> Result<(), Error> {
        sleep(self.latency);
        self.shared.counters.enumerated();
        self.shared.check(&Operation::Enumerate)?;

        self.enumerated.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn device_by_type(&self, kind: DeviceType) -> Result<MockDevice, Error> {
        sleep(self.latency);
        self.shared.counters.looked_up_type(kind);
        self.shared.check(&Operation::DeviceByType(kind))?;

        match self.visible().find(|device| device.kind() == kind) {
            Some(device) => Ok(device.clone()),
            None => Err(Error::device_not_found(kind.as_str())),
        }
    }

    fn device_by_id(&self, id: &str) -> Result<MockDevice, Error> {
        sleep(self.latency);
        self.shared.counters.looked_up_id(id);
        self.shared.check(&Operation::DeviceById(id.to_owned()))?;

        match self.visible().find(|device| device.id() == id) {
            Some(device) => Ok(device.clone()),
            None => Err(Error::device_not_found(id)),
        }
    }
}

fn sleep(latency: Option<Duration>) {
    if let Some(latency) = latency {
        thread::sleep(latency);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> MockEngine {
        MockEngine::new()
            .with_device(MockDevice::local("local"))
            .with_device(MockDevice::usb("usb-1"))
            .with_device(MockDevice::remote("remote-1"))
    }

    #[test]
    fn only_local_devices_before_enumeration() {
        let manager = engine().new_device_manager();

        assert_eq!(manager.device_by_type(DeviceType::Local).unwrap().id(), "local");
        assert!(manager.device_by_type(DeviceType::Usb).unwrap_err().is_not_found());
        assert!(manager.device_by_id("remote-1").unwrap_err().is_not_found());

        manager.enumerate_devices().unwrap();

        assert_eq!(manager.device_by_type(DeviceType::Usb).unwrap().id(), "usb-1");
        assert_eq!(manager.device_by_id("remote-1").unwrap().kind(), DeviceType::Remote);
    }

    #[test]
    fn counts_calls() {
        let engine = engine();
        let counters = engine.counters();

        let manager = engine.new_device_manager();
        manager.enumerate_devices().unwrap();
        let _ = manager.device_by_id("usb-1");
        let _ = manager.device_by_id("usb-1");
        let _ = manager.device_by_type(DeviceType::Local);
        engine.patch_android_selinux();

        assert_eq!(counters.managers_created(), 1);
        assert_eq!(counters.enumerations(), 1);
        assert_eq!(counters.id_lookups("usb-1"), 2);
        assert_eq!(counters.type_lookups(DeviceType::Local), 1);
        assert_eq!(counters.total_lookups(), 3);
        assert_eq!(counters.selinux_patches(), 1);
    }

    #[test]
    fn injected_enumeration_failure_keeps_devices_hidden() {
        let engine = engine().with_failure(
            Operation::Enumerate,
            FailureConfig::error(Error::enumeration("usbmuxd unavailable")).with_fail_count(1),
        );
        let manager = engine.new_device_manager();

        assert_eq!(
            manager.enumerate_devices(),
            Err(Error::enumeration("usbmuxd unavailable"))
        );
        assert!(!manager.is_enumerated());

        manager.enumerate_devices().unwrap();
        assert!(manager.is_enumerated());
    }

    #[test]
    fn cleared_failure_stops_failing() {
        let engine = engine();
        let manager = engine.new_device_manager();

        engine.fail(
            Operation::DeviceByType(DeviceType::Local),
            FailureConfig::error(Error::engine("device lost")),
        );
        assert_eq!(
            manager.device_by_type(DeviceType::Local).unwrap_err(),
            Error::engine("device lost")
        );

        engine.clear_failure(&Operation::DeviceByType(DeviceType::Local));
        assert_eq!(manager.device_by_type(DeviceType::Local).unwrap().id(), "local");
    }

    #[test]
    fn version_is_configurable() {
        assert_eq!(MockEngine::new().version(), DEFAULT_VERSION);
        assert_eq!(MockEngine::new().with_version("17.0.1").version(), "17.0.1");
    }
}
