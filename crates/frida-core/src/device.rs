//! Device and device manager contracts.
//!
//! These traits describe the part of the instrumentation engine the
//! resolution layer depends on. Implementations wrap the native engine (or a
//! test double) and are expected to block for the duration of each call.

use std::{fmt, str::FromStr};

use crate::{
    Error,
    session::{AttachTarget, Session, SessionOptions},
};

/// Device type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DeviceType {
    /// The machine the engine runs on.
    Local,

    /// A device reachable over the network.
    Remote,

    /// A device connected over USB.
    Usb,
}

impl DeviceType {
    /// Returns the engine's name for the device type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
            Self::Usb => "usb",
        }
    }

    /// Returns `true` if devices of this type only become visible after the
    /// device manager enumerated its devices.
    ///
    /// Local devices are always available without enumeration.
    pub fn requires_enumeration(&self) -> bool {
        !matches!(self, Self::Local)
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Self::Local),
            "remote" => Ok(Self::Remote),
            "usb" => Ok(Self::Usb),
            _ => Err(Error::InvalidArgument(format!("unknown device type {s:?}"))),
        }
    }
}

/// A device exposed by the engine.
pub trait Device: Send + Sync {
    /// The session type produced by [`attach`].
    ///
    /// [`attach`]: Self::attach
    type Session: Session;

    /// Returns the device identifier.
    fn id(&self) -> &str;

    /// Returns the human readable device name.
    fn name(&self) -> &str;

    /// Returns the device type.
    fn kind(&self) -> DeviceType;

    /// Attaches to a process on this device.
    ///
    /// Validation of the target is left entirely to the engine.
    fn attach(
        &self,
        target: AttachTarget,
        options: &SessionOptions,
    ) -> Result<Self::Session, Error>;
}

/// The engine's device enumeration subsystem.
pub trait DeviceManager: Send + Sync {
    /// The device type handed out by this manager.
    type Device: Device;

    /// Enumerates devices, making remote and USB devices visible to
    /// subsequent lookups.
    fn enumerate_devices(&self) -> Result<(), Error>;

    /// Looks up the first device of the given type.
    fn device_by_type(&self, kind: DeviceType) -> Result<Self::Device, Error>;

    /// Looks up a device by its identifier.
    fn device_by_id(&self, id: &str) -> Result<Self::Device, Error>;
}
