use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use frida_core::{AttachTarget, Device, DeviceType, Error, Session, SessionOptions};
use indexmap::IndexMap;

use crate::{failure::Operation, state::Shared};

/// A scripted device.
#[derive(Debug, Clone)]
pub struct MockDevice {
    id: String,
    name: String,
    kind: DeviceType,
    processes: IndexMap<u32, String>,
    pub(crate) shared: Arc<Shared>,
}

impl MockDevice {
    /// Creates a device without processes.
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: DeviceType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            processes: IndexMap::new(),
            shared: Arc::default(),
        }
    }

    /// Creates a local device.
    pub fn local(id: impl Into<String>) -> Self {
        Self::new(id, "Local System", DeviceType::Local)
    }

    /// Creates a USB device.
    pub fn usb(id: impl Into<String>) -> Self {
        Self::new(id, "USB Device", DeviceType::Usb)
    }

    /// Creates a remote device.
    pub fn remote(id: impl Into<String>) -> Self {
        Self::new(id, "Remote Device", DeviceType::Remote)
    }

    /// Sets the device name.
    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self
        }
    }

    /// Adds a process that can be attached to.
    pub fn with_process(mut self, pid: u32, name: impl Into<String>) -> Self {
        self.processes.insert(pid, name.into());
        self
    }

    fn find_process(&self, target: &AttachTarget) -> Option<u32> {
        match target {
            AttachTarget::Pid(pid) => self.processes.contains_key(pid).then_some(*pid),
            AttachTarget::Name(name) => self
                .processes
                .iter()
                .find(|(_, process)| *process == name)
                .map(|(pid, _)| *pid),
        }
    }
}

impl Device for MockDevice {
    type Session = MockSession;

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> DeviceType {
        self.kind
    }

    fn attach(&self, target: AttachTarget, options: &SessionOptions) -> Result<MockSession, Error> {
        self.shared.counters.attached();
        self.shared.check(&Operation::Attach)?;

        let pid = match self.find_process(&target) {
            Some(pid) => pid,
            None => return Err(Error::attach(&target, "unable to find process")),
        };

        tracing::debug!(device = %self.id, pid, "attached");
        Ok(MockSession {
            pid,
            device_id: self.id.clone(),
            options: options.clone(),
            detached: AtomicBool::new(false),
        })
    }
}

/// A session created by [`MockDevice::attach`](Device::attach).
#[derive(Debug)]
pub struct MockSession {
    pid: u32,
    device_id: String,
    options: SessionOptions,
    detached: AtomicBool,
}

impl MockSession {
    /// Returns the identifier of the device the session lives on.
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Returns the options the session was created with.
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }
}

impl Session for MockSession {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }

    fn detach(&self) -> Result<(), Error> {
        self.detached.store(true, Ordering::SeqCst);
        Ok(())
    }
}
