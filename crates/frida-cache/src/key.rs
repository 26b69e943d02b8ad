use std::{fmt, sync::Arc};

use frida_core::{Device as _, DeviceManager, DeviceType};

/// Key of a [`ResolutionCache`] entry.
///
/// The reserved keys and device identifiers share one cache, but being
/// distinct variants they can never collide.
///
/// [`ResolutionCache`]: crate::ResolutionCache
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// The device manager.
    Manager,

    /// The local device.
    LocalDevice,

    /// The first USB device.
    UsbDevice,

    /// The first remote device.
    RemoteDevice,

    /// Sentinel recording that devices were enumerated.
    EnumeratedDevices,

    /// A device looked up by identifier.
    Id(String),
}

impl CacheKey {
    /// Returns the key under which the first device of `kind` is cached.
    pub fn for_type(kind: DeviceType) -> Self {
        match kind {
            DeviceType::Local => Self::LocalDevice,
            DeviceType::Remote => Self::RemoteDevice,
            DeviceType::Usb => Self::UsbDevice,
        }
    }

    /// Returns the flat name of the key.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Manager => "mgr",
            Self::LocalDevice => "localDevice",
            Self::UsbDevice => "usbDevice",
            Self::RemoteDevice => "remoteDevice",
            Self::EnumeratedDevices => "enumeratedDevices",
            Self::Id(id) => id,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for CacheKey {
    fn from(id: &str) -> Self {
        Self::Id(id.to_owned())
    }
}

/// Value of a [`ResolutionCache`] entry.
///
/// [`ResolutionCache`]: crate::ResolutionCache
pub enum CacheEntry<M>
where
    M: DeviceManager,
{
    /// A device manager handle.
    Manager(Arc<M>),

    /// A device handle. `None` records a local lookup that failed.
    Device(Option<Arc<M::Device>>),

    /// A boolean sentinel.
    Flag(bool),
}

impl<M> Clone for CacheEntry<M>
where
    M: DeviceManager,
{
    fn clone(&self) -> Self {
        match self {
            Self::Manager(manager) => Self::Manager(Arc::clone(manager)),
            Self::Device(device) => Self::Device(device.clone()),
            Self::Flag(flag) => Self::Flag(*flag),
        }
    }
}

impl<M> fmt::Debug for CacheEntry<M>
where
    M: DeviceManager,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manager(_) => f.write_str("Manager"),
            Self::Device(Some(device)) => f.debug_tuple("Device").field(&device.id()).finish(),
            Self::Device(None) => f.write_str("Device(None)"),
            Self::Flag(flag) => f.debug_tuple("Flag").field(flag).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_keys_keep_their_names() {
        assert_eq!(CacheKey::Manager.as_str(), "mgr");
        assert_eq!(CacheKey::LocalDevice.as_str(), "localDevice");
        assert_eq!(CacheKey::UsbDevice.as_str(), "usbDevice");
        assert_eq!(CacheKey::EnumeratedDevices.as_str(), "enumeratedDevices");
        assert_eq!(CacheKey::from("emulator-5554").to_string(), "emulator-5554");
    }

    #[test]
    fn id_named_like_reserved_key_is_distinct() {
        assert_ne!(CacheKey::from("mgr"), CacheKey::Manager);
        assert_eq!(CacheKey::from("mgr").as_str(), CacheKey::Manager.as_str());
    }

    #[test]
    fn type_keys() {
        assert_eq!(CacheKey::for_type(DeviceType::Local), CacheKey::LocalDevice);
        assert_eq!(CacheKey::for_type(DeviceType::Usb), CacheKey::UsbDevice);
        assert_eq!(CacheKey::for_type(DeviceType::Remote), CacheKey::RemoteDevice);
    }
}
