//! # Memoized device resolution
//!
//! This crate resolves the device manager and the devices it hands out
//! lazily and remembers them, so repeated lookups never go back to the
//! engine. The main component is the [`DeviceResolver`], which owns an
//! [`Engine`] and shares a [`ResolutionCache`].
//!
//! - The device manager is created on the first request, exactly once.
//! - Devices are enumerated at most once, and only before a USB, remote or
//!   by-id lookup. Looking up the local device never enumerates.
//! - Successful lookups are cached for the lifetime of the cache. Failed
//!   lookups are not, so a later call retries.
//!
//! ## Usage
//!
//! ```rust
//! use frida_cache::DeviceResolver;
//! use frida_core::Device as _;
//! use frida_mock::{MockDevice, MockEngine};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = MockEngine::new()
//!     .with_device(MockDevice::local("local").with_process(1234, "cat"))
//!     .with_device(MockDevice::usb("R58M123ABC"));
//!
//! let resolver = DeviceResolver::new(engine);
//!
//! // The local device never needs enumeration.
//! let local = resolver.local_device().expect("local device");
//! assert_eq!(local.id(), "local");
//!
//! // The first by-id lookup enumerates, the second one is served from cache.
//! let device = resolver.device_by_id("R58M123ABC")?;
//! let again = resolver.device_by_id("R58M123ABC")?;
//! assert!(std::sync::Arc::ptr_eq(&device, &again));
//!
//! // Attach to a process on the local device.
//! let session = resolver.attach(1234u32)?;
//! # let _ = session;
//! # Ok(())
//! # }
//! ```
//!
//! Entries never expire. A USB device that was unplugged stays cached until
//! the cache is dropped.

mod cache;
mod key;
mod options;

use std::sync::{Arc, Mutex};

pub use frida_core::{
    AttachTarget, Device, DeviceManager, DeviceType, Engine, Error, SessionOptions,
};

pub use self::{
    cache::ResolutionCache,
    key::{CacheEntry, CacheKey},
    options::{EnumerationPolicy, ResolverOptions},
};
use self::cache::lock;

/// Device manager type of an [`Engine`].
pub type ManagerOf<E> = <E as Engine>::DeviceManager;

/// Device type of an [`Engine`].
pub type DeviceOf<E> = <ManagerOf<E> as DeviceManager>::Device;

/// Session type of an [`Engine`].
pub type SessionOf<E> = <DeviceOf<E> as Device>::Session;

/// Resolves and caches the device manager and devices of an [`Engine`].
///
/// All methods take `&self` and may be called from any number of threads.
pub struct DeviceResolver<E>
where
    E: Engine,
{
    /// The engine creating the device manager.
    engine: E,

    /// Resolved handles, possibly shared with other resolvers.
    cache: Arc<ResolutionCache<ManagerOf<E>>>,

    /// Resolution behavior.
    options: ResolverOptions,
}

impl<E> DeviceResolver<E>
where
    E: Engine,
{
    /// Creates a resolver with an empty cache and default options.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            cache: Arc::new(ResolutionCache::new()),
            options: ResolverOptions::default(),
        }
    }

    /// Replaces the resolver options.
    pub fn with_options(self, options: ResolverOptions) -> Self {
        Self { options, ..self }
    }

    /// Replaces the cache, e.g. with one shared with another resolver.
    pub fn with_cache(self, cache: Arc<ResolutionCache<ManagerOf<E>>>) -> Self {
        Self { cache, ..self }
    }

    /// Returns the engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Returns the cache.
    pub fn cache(&self) -> &Arc<ResolutionCache<ManagerOf<E>>> {
        &self.cache
    }

    /// Returns the resolver options.
    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Returns the device manager, creating it on first use.
    pub fn device_manager(&self) -> Arc<ManagerOf<E>> {
        if let Some(manager) = self.cached_manager() {
            return manager;
        }

        let gate = self.cache.gate(&CacheKey::Manager);
        let guard = lock(&gate);

        let manager = match self.cached_manager() {
            Some(manager) => manager,
            None => {
                tracing::debug!("creating device manager");
                let manager = Arc::new(self.engine.new_device_manager());
                self.cache.store(CacheKey::Manager, CacheEntry::Manager(Arc::clone(&manager)));
                manager
            }
        };

        drop(guard);
        self.cache.release_gate(&CacheKey::Manager, gate);

        manager
    }

    /// Enumerates devices unless that already happened.
    ///
    /// With [`EnumerationPolicy::Ignore`] this never fails.
    pub fn ensure_enumerated(&self, manager: &ManagerOf<E>) -> Result<(), Error> {
        if self.is_enumerated() {
            return Ok(());
        }

        let gate = self.single_flight_gate(&CacheKey::EnumeratedDevices);
        let guard = gate.as_deref().map(lock);

        let result = if gate.is_some() && self.is_enumerated() {
            Ok(())
        } else {
            self.enumerate(manager)
        };

        drop(guard);
        self.release(&CacheKey::EnumeratedDevices, gate);

        result
    }

    /// Returns `true` if devices were enumerated.
    pub fn is_enumerated(&self) -> bool {
        matches!(
            self.cache.load(&CacheKey::EnumeratedDevices),
            Some(CacheEntry::Flag(true))
        )
    }

    /// Returns the local device.
    ///
    /// The lookup is assumed to always succeed. If it doesn't, the error is
    /// logged, `None` is cached and every later call returns `None` too.
    pub fn local_device(&self) -> Option<Arc<DeviceOf<E>>> {
        // A failed local lookup comes back as a cached `None`, never an error.
        self.resolve(CacheKey::LocalDevice, Lookup::Local, |manager| {
            manager.device_by_type(DeviceType::Local)
        })
        .ok()
        .flatten()
    }

    /// Returns the first USB device.
    ///
    /// Returns `None` if there is none. The failure isn't cached, so a
    /// device plugged in later is found by the next call.
    pub fn usb_device(&self) -> Option<Arc<DeviceOf<E>>> {
        let result = self.resolve(CacheKey::UsbDevice, Lookup::Enumerated, |manager| {
            manager.device_by_type(DeviceType::Usb)
        });

        match result {
            Ok(device) => device,
            Err(err) => {
                tracing::debug!(%err, "usb device unavailable");
                None
            }
        }
    }

    /// Returns the device with the given identifier.
    ///
    /// Errors are returned as is and never cached.
    pub fn device_by_id(&self, id: &str) -> Result<Arc<DeviceOf<E>>, Error> {
        self.resolve(CacheKey::from(id), Lookup::Enumerated, |manager| {
            manager.device_by_id(id)
        })?
        .ok_or_else(|| Error::device_not_found(id))
    }

    /// Returns the first device of the given type.
    ///
    /// Shares the cache slots of [`local_device`] and [`usb_device`], but
    /// reports failures instead of collapsing them into `None`.
    ///
    /// [`local_device`]: Self::local_device
    /// [`usb_device`]: Self::usb_device
    pub fn device_by_type(&self, kind: DeviceType) -> Result<Arc<DeviceOf<E>>, Error> {
        let lookup = if kind.requires_enumeration() {
            Lookup::Enumerated
        } else {
            Lookup::Plain
        };

        self.resolve(CacheKey::for_type(kind), lookup, |manager| {
            manager.device_by_type(kind)
        })?
        .ok_or_else(|| Error::device_not_found(kind.as_str()))
    }

    /// Attaches to a process on the local device with default options.
    pub fn attach(&self, target: impl Into<AttachTarget>) -> Result<SessionOf<E>, Error> {
        self.attach_with_options(target, &SessionOptions::default())
    }

    /// Attaches to a process on the local device.
    ///
    /// The session belongs to the caller and is not cached.
    pub fn attach_with_options(
        &self,
        target: impl Into<AttachTarget>,
        options: &SessionOptions,
    ) -> Result<SessionOf<E>, Error> {
        let target = target.into();

        let device = match self.local_device() {
            Some(device) => device,
            None => return Err(Error::device_not_found(DeviceType::Local.as_str())),
        };

        tracing::info!(%target, device = device.id(), "attaching");
        device.attach(target, options)
    }

    fn cached_manager(&self) -> Option<Arc<ManagerOf<E>>> {
        match self.cache.load(&CacheKey::Manager)? {
            CacheEntry::Manager(manager) => Some(manager),
            entry => {
                tracing::warn!(?entry, "unexpected entry under manager key");
                None
            }
        }
    }

    fn cached_device(&self, key: &CacheKey) -> Option<Option<Arc<DeviceOf<E>>>> {
        match self.cache.load(key)? {
            CacheEntry::Device(device) => Some(device),
            entry => {
                tracing::warn!(%key, ?entry, "unexpected entry under device key");
                None
            }
        }
    }

    fn single_flight_gate(&self, key: &CacheKey) -> Option<Arc<Mutex<()>>> {
        self.options.single_flight().then(|| self.cache.gate(key))
    }

    fn release(&self, key: &CacheKey, gate: Option<Arc<Mutex<()>>>) {
        if let Some(gate) = gate {
            self.cache.release_gate(key, gate);
        }
    }

    fn enumerate(&self, manager: &ManagerOf<E>) -> Result<(), Error> {
        tracing::info!("enumerating devices");
        if let Err(err) = manager.enumerate_devices() {
            match self.options.enumeration_policy() {
                EnumerationPolicy::Ignore => {
                    tracing::warn!(%err, "device enumeration failed, continuing");
                }
                EnumerationPolicy::Propagate => {
                    tracing::warn!(%err, "device enumeration failed");
                    return Err(err);
                }
            }
        }

        self.cache.store(CacheKey::EnumeratedDevices, CacheEntry::Flag(true));
        Ok(())
    }

    /// Serves `key` from the cache or resolves it with `lookup_fn`.
    ///
    /// `Ok(None)` is only returned for a cached failed local lookup.
    fn resolve(
        &self,
        key: CacheKey,
        lookup: Lookup,
        lookup_fn: impl FnOnce(&ManagerOf<E>) -> Result<DeviceOf<E>, Error>,
    ) -> Result<Option<Arc<DeviceOf<E>>>, Error> {
        let manager = self.device_manager();

        if let Some(device) = self.cached_device(&key) {
            tracing::debug!(%key, "cache hit");
            return Ok(device);
        }

        let gate = self.single_flight_gate(&key);
        let guard = gate.as_deref().map(lock);

        let result = match gate.is_some().then(|| self.cached_device(&key)).flatten() {
            Some(device) => {
                tracing::debug!(%key, "resolved concurrently");
                Ok(device)
            }
            None => self.resolve_uncached(&key, lookup, &manager, lookup_fn),
        };

        drop(guard);
        self.release(&key, gate);

        result
    }

    fn resolve_uncached(
        &self,
        key: &CacheKey,
        lookup: Lookup,
        manager: &ManagerOf<E>,
        lookup_fn: impl FnOnce(&ManagerOf<E>) -> Result<DeviceOf<E>, Error>,
    ) -> Result<Option<Arc<DeviceOf<E>>>, Error> {
        if let Lookup::Enumerated = lookup {
            self.ensure_enumerated(manager)?;
        }

        tracing::debug!(%key, "resolving device");
        match lookup_fn(manager) {
            Ok(device) => {
                let device = Arc::new(device);
                self.cache.store(key.clone(), CacheEntry::Device(Some(Arc::clone(&device))));
                Ok(Some(device))
            }
            Err(err) if matches!(lookup, Lookup::Local) => {
                tracing::warn!(%key, %err, "caching failed lookup");
                self.cache.store(key.clone(), CacheEntry::Device(None));
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

/// How a device key is resolved on a cache miss.
#[derive(Debug, Clone, Copy)]
enum Lookup {
    /// Query the manager directly, caching failures as `None`.
    Local,

    /// Query the manager directly.
    Plain,

    /// Enumerate devices first.
    Enumerated,
}
