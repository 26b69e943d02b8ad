use std::sync::Arc;

use frida_cache::{DeviceOf, DeviceResolver, ResolverOptions, SessionOf};
use frida_core::{AttachTarget, Engine, EngineVersion, Error, SessionOptions};

/// Entry point of the bindings.
///
/// Owns an [`Engine`] together with the [`DeviceResolver`] caching its
/// device manager and devices. Create one per process at the application's
/// composition root and share it by reference (or in an [`Arc`]).
pub struct Frida<E>
where
    E: Engine,
{
    resolver: DeviceResolver<E>,
}

impl<E> Frida<E>
where
    E: Engine,
{
    /// Creates the bindings on top of `engine`.
    pub fn new(engine: E) -> Self {
        Self {
            resolver: DeviceResolver::new(engine),
        }
    }

    /// Replaces the resolver options.
    pub fn with_options(self, options: ResolverOptions) -> Self {
        Self {
            resolver: self.resolver.with_options(options),
        }
    }

    /// Returns the resolver.
    pub fn resolver(&self) -> &DeviceResolver<E> {
        &self.resolver
    }

    /// Returns the engine version string.
    pub fn version(&self) -> String {
        self.resolver.engine().version()
    }

    /// Returns the parsed engine version, if the engine reports a
    /// well-formed one.
    pub fn engine_version(&self) -> Option<EngineVersion> {
        let version = self.version();

        match EngineVersion::parse(&version) {
            Some(version) => Some(version),
            None => {
                tracing::warn!(%version, "unrecognized engine version");
                None
            }
        }
    }

    /// Patches the Android SELinux policy. Requires root.
    pub fn patch_android_selinux(&self) {
        tracing::info!("patching android selinux policy");
        self.resolver.engine().patch_android_selinux();
    }

    /// Returns the local device.
    ///
    /// See [`DeviceResolver::local_device`].
    pub fn local_device(&self) -> Option<Arc<DeviceOf<E>>> {
        self.resolver.local_device()
    }

    /// Returns the first USB device.
    ///
    /// See [`DeviceResolver::usb_device`].
    pub fn usb_device(&self) -> Option<Arc<DeviceOf<E>>> {
        self.resolver.usb_device()
    }

    /// Returns the device with the given identifier.
    ///
    /// See [`DeviceResolver::device_by_id`].
    pub fn device_by_id(&self, id: &str) -> Result<Arc<DeviceOf<E>>, Error> {
        self.resolver.device_by_id(id)
    }

    /// Attaches to a process on the local device.
    ///
    /// `target` is either a process id or a process name.
    pub fn attach(&self, target: impl Into<AttachTarget>) -> Result<SessionOf<E>, Error> {
        self.resolver.attach(target)
    }

    /// Attaches to a process on the local device with custom options.
    pub fn attach_with_options(
        &self,
        target: impl Into<AttachTarget>,
        options: &SessionOptions,
    ) -> Result<SessionOf<E>, Error> {
        self.resolver.attach_with_options(target, options)
    }
}
